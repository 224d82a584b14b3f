//! Hands-Free Profile audio gateway.
//!
//! [`Headset`] keeps one control block per hands-free link. It routes stack events to the upstream
//! callbacks and turns upstream requests (call state, indicators, AT responses) into AT results.
//! Outgoing connections are serialized through the profile queue: when an attempt this side
//! started reaches an outcome, the queue is advanced through the stack message loop.

pub mod at;
pub mod call_state;
pub mod caller_id;
pub mod control_block;
pub mod events;
pub mod hfp;

use crate::a2dp::CallStateOracle;
use crate::btif::{BtStatus, RawAddress};
use crate::config::AgConfig;
use crate::headset::at::{AgIndicator, AgResult, AudioHandle, BTA_AG_AT_MAX_LEN};
use crate::headset::call_state::{reconcile, PhoneState, ReconcileContext};
use crate::headset::control_block::{ControlBlockTable, BTA_AG_HANDLE_NONE};
use crate::headset::events::{AgEvent, AgStack, AgStatus};
use crate::headset::hfp::{
    AgFeatures, BthfAtResponse, BthfAudioState, BthfCallDirection, BthfCallMode, BthfCallMpty,
    BthfCallState, BthfChldType, BthfConnectionState, BthfNetworkState, BthfNrec, BthfServiceType,
    BthfVolumeType, BthfVrState, BthfWbsConfig, HfpCallbacks, HfpCallbacksDispatcher,
    HfpCodecCapability, HfpCodecId, PeerFeatures, BTHF_CALL_ADDRTYPE_INTERNATIONAL,
};
use crate::profile_queue::QueueActions;
use crate::Message;
use log::{debug, error, info, warn};
use num_traits::cast::FromPrimitive;
use tokio::sync::mpsc::UnboundedSender;

/// `+CME ERROR` code for commands the audio gateway does not implement.
const BTA_AG_ERR_OP_NOT_SUPPORTED: u16 = 4;

/// Requests from the upstream profile service, answered with a [`BtStatus`].
#[derive(Debug, Clone, PartialEq)]
pub enum HeadsetRequest {
    Disconnect(RawAddress),
    ConnectAudio(RawAddress),
    DisconnectAudio(RawAddress),
    StartVoiceRecognition(RawAddress),
    StopVoiceRecognition(RawAddress),
    VolumeControl(BthfVolumeType, i32, RawAddress),
    DeviceStatusNotification {
        network: BthfNetworkState,
        service: BthfServiceType,
        signal: i32,
        battery: i32,
        addr: RawAddress,
    },
    CopsResponse(String, RawAddress),
    CindResponse {
        service: i32,
        num_active: u32,
        num_held: u32,
        call_setup_state: BthfCallState,
        signal: i32,
        roam: i32,
        battery: i32,
        addr: RawAddress,
    },
    FormattedAtResponse(String, RawAddress),
    AtResponse(BthfAtResponse, u16, RawAddress),
    ClccResponse {
        index: u32,
        dir: BthfCallDirection,
        state: BthfCallState,
        mode: BthfCallMode,
        mpty: BthfCallMpty,
        number: Option<String>,
        call_type: u16,
        addr: RawAddress,
    },
    PhoneStateChange(PhoneState, RawAddress),
    SetScoAllowed(bool),
    SendBsir(bool, RawAddress),
    SetActiveDevice(RawAddress),
    Cleanup,
}

/// Characters allowed in a dial string.
fn is_dial_char(c: char) -> bool {
    matches!(c, '0'..='9' | '*' | '+' | '#' | ';' | ',' | 'A'..='C' | 'p' | 'P' | 'w' | 'W')
}

fn callstate_to_callsetup(state: BthfCallState) -> u16 {
    match state {
        BthfCallState::Incoming => 1,
        BthfCallState::Dialing => 2,
        BthfCallState::Alerting => 3,
        _ => 0,
    }
}

/// Parses the leading digits of `s`, ignoring anything after them.
fn leading_number(s: &str) -> Option<u32> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s[..end].parse().ok()
}

pub struct Headset {
    features: AgFeatures,
    local_codecs: HfpCodecCapability,
    blocks: ControlBlockTable,
    active_device: RawAddress,
    callbacks: Option<HfpCallbacksDispatcher>,
    stack: Box<dyn AgStack + Send>,
    tx: UnboundedSender<Message>,
}

impl Headset {
    pub fn new(
        config: &AgConfig,
        stack: Box<dyn AgStack + Send>,
        tx: UnboundedSender<Message>,
    ) -> Self {
        Self {
            features: config.effective_features(),
            local_codecs: config.local_codecs(),
            blocks: ControlBlockTable::new(config.max_hf_clients),
            active_device: RawAddress::EMPTY,
            callbacks: None,
            stack,
            tx,
        }
    }

    pub fn blocks(&self) -> &ControlBlockTable {
        &self.blocks
    }

    pub fn active_device(&self) -> RawAddress {
        self.active_device
    }

    /// Enables the audio gateway and registers one service instance per supported client.
    pub fn init(&mut self, callbacks: HfpCallbacksDispatcher) -> BtStatus {
        info!("Initializing audio gateway for {} clients", self.blocks.capacity());
        self.callbacks = Some(callbacks);
        self.blocks.clear();
        self.stack.enable();
        for app_id in 0..self.blocks.capacity() {
            self.stack.register(app_id as u8, self.features);
        }
        BtStatus::Success
    }

    /// Deregisters from the stack and drops the upstream callbacks.
    pub fn cleanup(&mut self) {
        if self.callbacks.is_none() {
            debug!("Audio gateway not initialized");
            return;
        }
        info!("Cleaning up audio gateway");
        let handles: Vec<u16> = self
            .blocks
            .iter()
            .map(|b| b.handle)
            .filter(|h| *h != BTA_AG_HANDLE_NONE)
            .collect();
        for handle in handles {
            self.stack.deregister(handle);
        }
        self.stack.disable();
        self.blocks.clear();
        self.active_device = RawAddress::EMPTY;
        self.callbacks = None;
    }

    pub fn is_initialized(&self) -> bool {
        if self.callbacks.is_none() {
            warn!("Audio gateway used before initialization");
            return false;
        }
        true
    }

    fn fire(&self, cb: HfpCallbacks) {
        match &self.callbacks {
            Some(callbacks) => (callbacks.dispatch)(cb),
            None => debug!("Dropped callback {:?}", cb),
        }
    }

    fn advance_queue(&self) {
        if let Err(e) = self.tx.send(Message::ProfileQueue(QueueActions::Advance)) {
            error!("Failed to advance the profile queue: {}", e);
        }
    }

    fn send_result(&mut self, idx: usize, result: AgResult) {
        let block = self.blocks.get_mut(idx);
        let handle = block.handle;
        if let AudioHandle::Route(audio_handle) = result.audio_handle() {
            self.stack.route_audio(audio_handle);
        }
        for line in at::format_result(&result, &mut block.indicators) {
            self.stack.send_at(handle, &line);
        }
    }

    /// Starts the outgoing connection at the head of the profile queue.
    pub fn connect_int(&mut self, addr: RawAddress) -> BtStatus {
        if self.blocks.is_connected(Some(&addr)) {
            warn!("[{}]: Already connected", addr);
            return BtStatus::Busy;
        }

        let idx = match self.blocks.allocate() {
            Some(idx) => idx,
            None => {
                warn!("[{}]: All {} control blocks in use", addr, self.blocks.capacity());
                return BtStatus::Busy;
            }
        };

        let block = self.blocks.get_mut(idx);
        block.state = BthfConnectionState::Connecting;
        block.connected_bda = addr;
        block.is_initiator = true;
        let handle = block.handle;
        info!("[{}]: Connecting on handle {}", addr, handle);
        self.stack.open(handle, addr);
        BtStatus::Success
    }

    /// Handles an event from the audio gateway stack.
    pub fn dispatch_ag_event(&mut self, event: AgEvent) {
        let handle = match event {
            AgEvent::Enable | AgEvent::Disable => {
                info!("Audio gateway {:?}", event);
                return;
            }
            AgEvent::Register { handle, status } => {
                if status != AgStatus::Success {
                    error!("Registration of handle {} failed: {:?}", handle, status);
                } else if self.blocks.bind_handle(handle).is_none() {
                    warn!("No control block left for handle {}", handle);
                }
                return;
            }
            ref other => match other.handle() {
                Some(handle) => handle,
                None => return,
            },
        };

        let idx = match self.blocks.find_by_handle(handle) {
            Some(idx) => idx,
            None => {
                warn!("Dropping {:?} for unknown handle {}", event, handle);
                return;
            }
        };
        let addr = self.blocks.get(idx).connected_bda;

        match event {
            AgEvent::Open { addr: open_addr, status, .. } => self.on_open(idx, open_addr, status),
            AgEvent::Conn { peer_feat, chld_feat, .. } => {
                let block = self.blocks.get_mut(idx);
                block.state = BthfConnectionState::SlcConnected;
                block.peer_feat = peer_feat;
                block.chld_feat = chld_feat;
                let is_initiator = block.is_initiator;
                info!("[{}]: Service level connection up, features {:?}", addr, peer_feat);
                self.fire(HfpCallbacks::ConnectionState(BthfConnectionState::SlcConnected, addr));
                if is_initiator {
                    self.advance_queue();
                }
            }
            AgEvent::Close { .. } => {
                let block = self.blocks.get(idx);
                let awaiting_slc = block.is_initiator && !block.is_slc_connected();
                info!("[{}]: Closed in state {:?}", addr, block.state);
                self.blocks.reset(idx);
                self.fire(HfpCallbacks::ConnectionState(BthfConnectionState::Disconnected, addr));
                if awaiting_slc {
                    self.advance_queue();
                }
            }
            AgEvent::AudioOpen { .. } => {
                self.fire(HfpCallbacks::AudioState(BthfAudioState::Connected, addr));
            }
            AgEvent::AudioClose { .. } => {
                self.fire(HfpCallbacks::AudioState(BthfAudioState::Disconnected, addr));
            }
            AgEvent::Spk { volume, .. } => self.fire(HfpCallbacks::VolumeControl(
                BthfVolumeType::Speaker,
                volume as i32,
                addr,
            )),
            AgEvent::Mic { volume, .. } => self.fire(HfpCallbacks::VolumeControl(
                BthfVolumeType::Microphone,
                volume as i32,
                addr,
            )),
            AgEvent::AtA { .. } => self.fire(HfpCallbacks::AnswerCall(addr)),
            AgEvent::AtD { number, .. } => self.fire(HfpCallbacks::DialCall(number, addr)),
            AgEvent::AtBldn { .. } => self.fire(HfpCallbacks::DialCall(String::new(), addr)),
            AgEvent::AtChup { .. } => self.fire(HfpCallbacks::HangupCall(addr)),
            AgEvent::AtCind { .. } => self.fire(HfpCallbacks::AtCind(addr)),
            AgEvent::AtVts { dtmf, .. } => match dtmf.chars().next() {
                Some(c) => self.fire(HfpCallbacks::Dtmf(c, addr)),
                None => warn!("[{}]: Empty DTMF tone", addr),
            },
            AgEvent::AtBvra { value, .. } => {
                let state = if value == 1 { BthfVrState::Started } else { BthfVrState::Stopped };
                self.fire(HfpCallbacks::VoiceRecognition(state, addr));
            }
            AgEvent::AtNrec { value, .. } => {
                let nrec = if value == 1 { BthfNrec::Start } else { BthfNrec::Stop };
                self.fire(HfpCallbacks::NoiseReduction(nrec, addr));
            }
            AgEvent::AtCbc { value, .. } => debug!("[{}]: Battery level {} ignored", addr, value),
            AgEvent::AtCkpd { .. } => self.fire(HfpCallbacks::KeyPressed(addr)),
            AgEvent::Wbs { codec, .. } => {
                let config = match HfpCodecId::from_u16(codec) {
                    Some(HfpCodecId::Cvsd) => BthfWbsConfig::No,
                    Some(HfpCodecId::Msbc) => BthfWbsConfig::Yes,
                    _ => BthfWbsConfig::None,
                };
                self.fire(HfpCallbacks::Wbs(config, addr));
            }
            AgEvent::AtChld { arg, .. } => {
                match leading_number(&arg).and_then(BthfChldType::from_u32) {
                    Some(chld) => self.fire(HfpCallbacks::AtChld(chld, addr)),
                    None => warn!("[{}]: Unsupported AT+CHLD={}", addr, arg),
                }
            }
            AgEvent::AtClcc { .. } => self.fire(HfpCallbacks::AtClcc(addr)),
            AgEvent::AtCops { .. } => self.fire(HfpCallbacks::AtCops(addr)),
            AgEvent::AtCnum { .. } => self.fire(HfpCallbacks::AtCnum(addr)),
            AgEvent::AtUnat { command, .. } => self.fire(HfpCallbacks::UnknownAt(command, addr)),
            AgEvent::AtBinp { .. } | AgEvent::AtBtrh { .. } => {
                self.send_result(idx, AgResult::AtError(BTA_AG_ERR_OP_NOT_SUPPORTED));
            }
            AgEvent::AtBac { codecs, .. } => {
                let common = HfpCodecCapability::from_bits_truncate(codecs) & self.local_codecs;
                let codec = if common.contains(HfpCodecCapability::MSBC) {
                    HfpCodecId::Msbc
                } else {
                    HfpCodecId::Cvsd
                };
                debug!("[{}]: Peer codecs 0x{:x}, selecting {:?}", addr, codecs, codec);
                self.stack.set_codec(handle, codec);
            }
            AgEvent::AtBcs { codec, .. } => {
                let config = if codec == HfpCodecId::Cvsd as u16 {
                    BthfWbsConfig::No
                } else {
                    BthfWbsConfig::Yes
                };
                self.fire(HfpCallbacks::Wbs(config, addr));
            }
            AgEvent::AtBind { status, value, .. } => {
                if status == AgStatus::Success {
                    self.fire(HfpCallbacks::AtBind(value, addr));
                }
            }
            AgEvent::AtBiev { status, ind_id, value, .. } => {
                if status == AgStatus::Success {
                    self.fire(HfpCallbacks::AtBiev(ind_id, value, addr));
                }
            }
            AgEvent::AtBia { status, mask, .. } => {
                if status != AgStatus::Success {
                    return;
                }
                self.blocks.get_mut(idx).indicators.set_bia_mask(mask);
                let enabled = |id: AgIndicator| mask & (1 << (id as u32)) == 0;
                self.fire(HfpCallbacks::AtBia {
                    service: enabled(AgIndicator::Service),
                    roam: enabled(AgIndicator::Roam),
                    signal: enabled(AgIndicator::Signal),
                    battery: enabled(AgIndicator::BattChg),
                    addr,
                });
            }
            AgEvent::Enable | AgEvent::Disable | AgEvent::Register { .. } => {}
        }
    }

    fn on_open(&mut self, idx: usize, addr: RawAddress, status: AgStatus) {
        let block = self.blocks.get_mut(idx);

        if block.is_initiator {
            if block.state != BthfConnectionState::Connecting {
                panic!("[{}]: Opened in state {:?}, expected Connecting", addr, block.state);
            }
            if block.connected_bda != addr {
                panic!("[{}]: Opened while connecting to {}", addr, block.connected_bda);
            }
        }

        if status == AgStatus::Success {
            block.connected_bda = addr;
            block.state = BthfConnectionState::Connected;
            block.peer_feat = PeerFeatures::empty();
            block.call = Default::default();
            info!("[{}]: Connected on handle {}", addr, block.handle);
            self.fire(HfpCallbacks::ConnectionState(BthfConnectionState::Connected, addr));
            return;
        }

        if !block.is_initiator {
            warn!("[{}]: Remote connection failed: {:?}", addr, status);
            return;
        }

        let addr = block.connected_bda;
        warn!("[{}]: Connection failed: {:?}", addr, status);
        self.blocks.reset(idx);
        self.fire(HfpCallbacks::ConnectionState(BthfConnectionState::Disconnected, addr));
        self.advance_queue();
    }

    /// Handles a request from the upstream profile service.
    pub fn handle_request(&mut self, request: HeadsetRequest) -> BtStatus {
        match request {
            HeadsetRequest::Disconnect(addr) => self.disconnect(addr),
            HeadsetRequest::ConnectAudio(addr) => self.connect_audio(addr),
            HeadsetRequest::DisconnectAudio(addr) => self.disconnect_audio(addr),
            HeadsetRequest::StartVoiceRecognition(addr) => self.set_voice_recognition(true, addr),
            HeadsetRequest::StopVoiceRecognition(addr) => self.set_voice_recognition(false, addr),
            HeadsetRequest::VolumeControl(volume_type, volume, addr) => {
                self.volume_control(volume_type, volume, addr)
            }
            HeadsetRequest::DeviceStatusNotification {
                network,
                service,
                signal,
                battery,
                addr,
            } => self.device_status_notification(network, service, signal, battery, addr),
            HeadsetRequest::CopsResponse(cops, addr) => self.cops_response(&cops, addr),
            HeadsetRequest::CindResponse {
                service,
                num_active,
                num_held,
                call_setup_state,
                signal,
                roam,
                battery,
                addr,
            } => self.cind_response(
                service,
                num_active,
                num_held,
                call_setup_state,
                signal,
                roam,
                battery,
                addr,
            ),
            HeadsetRequest::FormattedAtResponse(rsp, addr) => {
                self.formatted_at_response(&rsp, addr)
            }
            HeadsetRequest::AtResponse(code, error, addr) => self.at_response(code, error, addr),
            HeadsetRequest::ClccResponse {
                index,
                dir,
                state,
                mode,
                mpty,
                number,
                call_type,
                addr,
            } => self.clcc_response(
                index,
                dir,
                state,
                mode,
                mpty,
                number.as_deref(),
                call_type,
                addr,
            ),
            HeadsetRequest::PhoneStateChange(state, addr) => self.phone_state_change(state, addr),
            HeadsetRequest::SetScoAllowed(allowed) => self.set_sco_allowed(allowed),
            HeadsetRequest::SendBsir(value, addr) => self.send_bsir(value, addr),
            HeadsetRequest::SetActiveDevice(addr) => self.set_active_device(addr),
            HeadsetRequest::Cleanup => {
                self.cleanup();
                BtStatus::Success
            }
        }
    }

    /// Looks up the control block of `addr` once initialized.
    fn lookup(&self, addr: &RawAddress) -> Result<usize, BtStatus> {
        if !self.is_initialized() {
            return Err(BtStatus::NotReady);
        }
        self.blocks.find_by_address(addr).ok_or_else(|| {
            debug!("[{}]: No control block", addr);
            BtStatus::Fail
        })
    }

    /// Like [`Self::lookup`], but the link must be connected.
    fn lookup_connected(&self, addr: &RawAddress) -> Result<usize, BtStatus> {
        let idx = self.lookup(addr)?;
        if !self.blocks.get(idx).is_connected() {
            warn!("[{}]: Not connected", addr);
            return Err(BtStatus::Fail);
        }
        Ok(idx)
    }

    pub fn disconnect(&mut self, addr: RawAddress) -> BtStatus {
        match self.lookup(&addr) {
            Ok(idx) => {
                self.stack.close(self.blocks.get(idx).handle);
                BtStatus::Success
            }
            Err(status) => status,
        }
    }

    pub fn connect_audio(&mut self, addr: RawAddress) -> BtStatus {
        let idx = match self.lookup(&addr) {
            Ok(idx) => idx,
            Err(status) => return status,
        };
        if !self.blocks.get(idx).is_slc_connected() {
            warn!("[{}]: Audio requested without a service level connection", addr);
            return BtStatus::NotReady;
        }
        self.fire(HfpCallbacks::AudioState(BthfAudioState::Connecting, addr));
        self.stack.audio_open(self.blocks.get(idx).handle);
        BtStatus::Success
    }

    pub fn disconnect_audio(&mut self, addr: RawAddress) -> BtStatus {
        match self.lookup_connected(&addr) {
            Ok(idx) => {
                self.stack.audio_close(self.blocks.get(idx).handle);
                BtStatus::Success
            }
            Err(status) => status,
        }
    }

    fn set_voice_recognition(&mut self, start: bool, addr: RawAddress) -> BtStatus {
        let idx = match self.lookup(&addr) {
            Ok(idx) => idx,
            Err(status) => return status,
        };
        let block = self.blocks.get(idx);
        if !block.is_connected() {
            return BtStatus::NotReady;
        }
        if !block.peer_feat.contains(PeerFeatures::VREC) {
            warn!("[{}]: Peer does not support voice recognition", addr);
            return BtStatus::Unsupported;
        }
        self.send_result(idx, AgResult::Bvra(start));
        BtStatus::Success
    }

    pub fn start_voice_recognition(&mut self, addr: RawAddress) -> BtStatus {
        self.set_voice_recognition(true, addr)
    }

    pub fn stop_voice_recognition(&mut self, addr: RawAddress) -> BtStatus {
        self.set_voice_recognition(false, addr)
    }

    pub fn volume_control(
        &mut self,
        volume_type: BthfVolumeType,
        volume: i32,
        addr: RawAddress,
    ) -> BtStatus {
        match self.lookup_connected(&addr) {
            Ok(idx) => {
                let volume = volume.clamp(0, 15) as u16;
                self.send_result(idx, AgResult::Volume(volume_type, volume));
                BtStatus::Success
            }
            Err(status) => status,
        }
    }

    pub fn device_status_notification(
        &mut self,
        network: BthfNetworkState,
        service: BthfServiceType,
        signal: i32,
        battery: i32,
        addr: RawAddress,
    ) -> BtStatus {
        let idx = match self.lookup_connected(&addr) {
            Ok(idx) => idx,
            Err(status) => return status,
        };
        let updates = [
            (AgIndicator::Service, (network == BthfNetworkState::Available) as u16),
            (AgIndicator::Roam, (service == BthfServiceType::Roaming) as u16),
            (AgIndicator::Signal, signal.clamp(0, 5) as u16),
            (AgIndicator::BattChg, battery.clamp(0, 5) as u16),
        ];
        for (id, value) in updates {
            self.send_result(idx, AgResult::Indicator(id, value));
        }
        BtStatus::Success
    }

    pub fn cops_response(&mut self, cops: &str, addr: RawAddress) -> BtStatus {
        match self.lookup_connected(&addr) {
            Ok(idx) => {
                self.send_result(idx, AgResult::Cops(format!("0,0,\"{:.16}\"", cops)));
                BtStatus::Success
            }
            Err(status) => status,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn cind_response(
        &mut self,
        service: i32,
        num_active: u32,
        num_held: u32,
        call_setup_state: BthfCallState,
        signal: i32,
        roam: i32,
        battery: i32,
        addr: RawAddress,
    ) -> BtStatus {
        let idx = match self.lookup_connected(&addr) {
            Ok(idx) => idx,
            Err(status) => return status,
        };
        let call_held = match (num_held, num_active) {
            (0, _) => 0,
            (_, 0) => 2,
            _ => 1,
        };
        let cind = format!(
            "{},{},{},{},{},{},{}",
            (num_active > 0 || num_held > 0) as u8,
            callstate_to_callsetup(call_setup_state),
            service,
            signal,
            roam,
            battery,
            call_held
        );
        self.send_result(idx, AgResult::Cind(cind));
        BtStatus::Success
    }

    pub fn formatted_at_response(&mut self, rsp: &str, addr: RawAddress) -> BtStatus {
        let idx = match self.lookup_connected(&addr) {
            Ok(idx) => idx,
            Err(status) => return status,
        };
        let mut rsp = rsp.to_string();
        if rsp.len() >= BTA_AG_AT_MAX_LEN {
            let mut len = BTA_AG_AT_MAX_LEN - 1;
            while !rsp.is_char_boundary(len) {
                len -= 1;
            }
            rsp.truncate(len);
        }
        self.send_result(idx, AgResult::Unat(rsp));
        BtStatus::Success
    }

    pub fn at_response(
        &mut self,
        response: BthfAtResponse,
        error_code: u16,
        addr: RawAddress,
    ) -> BtStatus {
        let idx = match self.lookup_connected(&addr) {
            Ok(idx) => idx,
            Err(status) => return status,
        };
        let result = match response {
            BthfAtResponse::Ok => AgResult::AtOk,
            BthfAtResponse::Error => AgResult::AtError(error_code),
        };
        self.send_result(idx, result);
        BtStatus::Success
    }

    /// Sends one `+CLCC` entry. Index 0 terminates the list.
    #[allow(clippy::too_many_arguments)]
    pub fn clcc_response(
        &mut self,
        index: u32,
        dir: BthfCallDirection,
        state: BthfCallState,
        mode: BthfCallMode,
        mpty: BthfCallMpty,
        number: Option<&str>,
        call_type: u16,
        addr: RawAddress,
    ) -> BtStatus {
        let idx = match self.lookup_connected(&addr) {
            Ok(idx) => idx,
            Err(status) => return status,
        };
        if index == 0 {
            self.send_result(idx, AgResult::Clcc(None));
            return BtStatus::Success;
        }

        let mut entry =
            format!("{},{},{},{},{}", index, dir as u32, state as u32, mode as u32, mpty as u32);
        if let Some(number) = number {
            // Room for the quotes, the separator and a three digit type.
            let room = BTA_AG_AT_MAX_LEN.saturating_sub(entry.len() + 6);
            let mut dial = String::new();
            if call_type == BTHF_CALL_ADDRTYPE_INTERNATIONAL && !number.starts_with('+') {
                dial.push('+');
            }
            dial.extend(number.chars().filter(|c| is_dial_char(*c)));
            dial.truncate(room);
            entry.push_str(&format!(",\"{}\",{}", dial, call_type));
        }
        self.send_result(idx, AgResult::Clcc(Some(entry)));
        BtStatus::Success
    }

    /// Applies a telephony call state snapshot to the link of `addr`.
    pub fn phone_state_change(&mut self, state: PhoneState, addr: RawAddress) -> BtStatus {
        let idx = match self.lookup(&addr) {
            Ok(idx) => idx,
            Err(status) => return status,
        };
        let block = self.blocks.get(idx);
        if !block.is_slc_connected() {
            warn!("[{}]: Phone state change without a service level connection", addr);
            return BtStatus::NotReady;
        }
        if state.call_setup_state == BthfCallState::Disconnected {
            debug!("[{}]: Ignoring disconnected call setup state", addr);
            return BtStatus::Success;
        }

        let ctx = ReconcileContext {
            handle: block.handle,
            is_active_device: !self.active_device.is_empty() && self.active_device == addr,
        };
        let reconciled = reconcile(&block.call, &state, &ctx);
        for result in reconciled.results {
            self.send_result(idx, result);
        }
        self.blocks.get_mut(idx).call = reconciled.updated;
        reconciled.status
    }

    pub fn set_sco_allowed(&mut self, allowed: bool) -> BtStatus {
        if !self.is_initialized() {
            return BtStatus::NotReady;
        }
        self.stack.set_sco_allowed(allowed);
        BtStatus::Success
    }

    /// Tells the hands-free unit whether in-band ringing is on.
    pub fn send_bsir(&mut self, value: bool, addr: RawAddress) -> BtStatus {
        match self.lookup_connected(&addr) {
            Ok(idx) => {
                self.send_result(idx, AgResult::Bsir(value));
                BtStatus::Success
            }
            Err(status) => status,
        }
    }

    pub fn set_active_device(&mut self, addr: RawAddress) -> BtStatus {
        if !self.is_initialized() {
            return BtStatus::NotReady;
        }
        info!("[{}]: Active device", addr);
        self.active_device = addr;
        self.stack.set_active_device(addr);
        BtStatus::Success
    }
}

impl CallStateOracle for Headset {
    /// No link has a call in progress or in setup.
    fn is_call_idle(&self) -> bool {
        if self.callbacks.is_none() {
            return true;
        }
        self.blocks.iter().all(|b| b.call.is_idle())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headset::hfp::ChldFeatures;
    use std::sync::{Arc, Mutex};
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    #[derive(Debug, Clone, PartialEq)]
    enum StackCall {
        Enable,
        Disable,
        Register(u8),
        Deregister(u16),
        Open(u16, RawAddress),
        Close(u16),
        AudioOpen(u16),
        AudioClose(u16),
        SetCodec(u16, HfpCodecId),
        SetActiveDevice(RawAddress),
        SetScoAllowed(bool),
        RouteAudio(u16),
        At(u16, String),
    }

    #[derive(Clone, Default)]
    struct FakeStack(Arc<Mutex<Vec<StackCall>>>);

    impl FakeStack {
        fn take(&self) -> Vec<StackCall> {
            std::mem::take(&mut *self.0.lock().unwrap())
        }

        fn push(&self, call: StackCall) {
            self.0.lock().unwrap().push(call);
        }
    }

    impl AgStack for FakeStack {
        fn enable(&mut self) {
            self.push(StackCall::Enable);
        }
        fn disable(&mut self) {
            self.push(StackCall::Disable);
        }
        fn register(&mut self, app_id: u8, _features: AgFeatures) {
            self.push(StackCall::Register(app_id));
        }
        fn deregister(&mut self, handle: u16) {
            self.push(StackCall::Deregister(handle));
        }
        fn open(&mut self, handle: u16, addr: RawAddress) {
            self.push(StackCall::Open(handle, addr));
        }
        fn close(&mut self, handle: u16) {
            self.push(StackCall::Close(handle));
        }
        fn audio_open(&mut self, handle: u16) {
            self.push(StackCall::AudioOpen(handle));
        }
        fn audio_close(&mut self, handle: u16) {
            self.push(StackCall::AudioClose(handle));
        }
        fn set_codec(&mut self, handle: u16, codec: HfpCodecId) {
            self.push(StackCall::SetCodec(handle, codec));
        }
        fn set_active_device(&mut self, addr: RawAddress) {
            self.push(StackCall::SetActiveDevice(addr));
        }
        fn set_sco_allowed(&mut self, allowed: bool) {
            self.push(StackCall::SetScoAllowed(allowed));
        }
        fn route_audio(&mut self, handle: u16) {
            self.push(StackCall::RouteAudio(handle));
        }
        fn send_at(&mut self, handle: u16, data: &str) {
            self.push(StackCall::At(handle, data.trim().to_string()));
        }
    }

    struct Fixture {
        headset: Headset,
        stack: FakeStack,
        callbacks: Arc<Mutex<Vec<HfpCallbacks>>>,
        rx: UnboundedReceiver<Message>,
    }

    impl Fixture {
        fn new(max_hf_clients: usize) -> Self {
            let config = AgConfig { max_hf_clients, ..Default::default() };
            let stack = FakeStack::default();
            let (tx, rx) = mpsc::unbounded_channel();
            let mut headset = Headset::new(&config, Box::new(stack.clone()), tx);

            let callbacks = Arc::new(Mutex::new(Vec::new()));
            let recorder = callbacks.clone();
            headset.init(HfpCallbacksDispatcher::new(Box::new(move |cb| {
                recorder.lock().unwrap().push(cb);
            })));
            for handle in 1..=max_hf_clients as u16 {
                headset.dispatch_ag_event(AgEvent::Register { handle, status: AgStatus::Success });
            }
            stack.take();

            Fixture { headset, stack, callbacks, rx }
        }

        fn callbacks(&self) -> Vec<HfpCallbacks> {
            std::mem::take(&mut *self.callbacks.lock().unwrap())
        }

        fn advanced(&mut self) -> bool {
            matches!(self.rx.try_recv(), Ok(Message::ProfileQueue(QueueActions::Advance)))
        }

        fn at_lines(&self) -> Vec<String> {
            self.stack
                .take()
                .into_iter()
                .filter_map(|c| match c {
                    StackCall::At(_, line) => Some(line),
                    _ => None,
                })
                .collect()
        }

        fn open(&mut self, handle: u16, addr: RawAddress) {
            let status = AgStatus::Success;
            self.headset.dispatch_ag_event(AgEvent::Open { handle, addr, status });
        }

        /// Brings up a service level connection that the remote device initiated.
        fn accept(&mut self, handle: u16, addr: RawAddress, peer_feat: PeerFeatures) {
            self.headset.dispatch_ag_event(AgEvent::Open {
                handle,
                addr,
                status: AgStatus::Success,
            });
            self.headset.dispatch_ag_event(AgEvent::Conn {
                handle,
                peer_feat,
                chld_feat: ChldFeatures::empty(),
            });
            self.callbacks();
            self.stack.take();
        }
    }

    fn addr(last: u8) -> RawAddress {
        RawAddress::new([0x11, 0x22, 0x33, 0x44, 0x55, last])
    }

    #[test]
    fn init_registers_every_client() {
        let config = AgConfig { max_hf_clients: 2, ..Default::default() };
        let stack = FakeStack::default();
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut headset = Headset::new(&config, Box::new(stack.clone()), tx);

        assert_eq!(headset.set_active_device(addr(1)), BtStatus::NotReady);
        headset.init(HfpCallbacksDispatcher::new(Box::new(|_| {})));
        assert_eq!(
            stack.take(),
            vec![StackCall::Enable, StackCall::Register(0), StackCall::Register(1)]
        );

        headset.dispatch_ag_event(AgEvent::Register { handle: 1, status: AgStatus::Success });
        headset.cleanup();
        assert_eq!(stack.take(), vec![StackCall::Deregister(1), StackCall::Disable]);
        assert!(headset.is_call_idle());
    }

    #[test]
    fn outgoing_connection_lifecycle() {
        let mut f = Fixture::new(1);
        assert_eq!(f.headset.connect_int(addr(1)), BtStatus::Success);
        assert_eq!(f.stack.take(), vec![StackCall::Open(1, addr(1))]);

        f.open(1, addr(1));
        assert_eq!(
            f.callbacks(),
            vec![HfpCallbacks::ConnectionState(BthfConnectionState::Connected, addr(1))]
        );
        assert!(!f.advanced());

        f.headset.dispatch_ag_event(AgEvent::Conn {
            handle: 1,
            peer_feat: PeerFeatures::VREC,
            chld_feat: ChldFeatures::REL,
        });
        assert_eq!(
            f.callbacks(),
            vec![HfpCallbacks::ConnectionState(BthfConnectionState::SlcConnected, addr(1))]
        );
        assert!(f.advanced());

        // The only block is in use.
        assert_eq!(f.headset.connect_int(addr(2)), BtStatus::Busy);

        f.headset.dispatch_ag_event(AgEvent::Close { handle: 1 });
        assert_eq!(
            f.callbacks(),
            vec![HfpCallbacks::ConnectionState(BthfConnectionState::Disconnected, addr(1))]
        );
        assert!(!f.advanced());
        assert_eq!(f.headset.blocks().find_by_handle(1), Some(0));
        assert_eq!(f.headset.blocks().find_by_address(&addr(1)), None);
    }

    #[test]
    fn failed_outgoing_connection_advances_queue() {
        let mut f = Fixture::new(1);
        f.headset.connect_int(addr(1));
        f.headset.dispatch_ag_event(AgEvent::Open {
            handle: 1,
            addr: addr(1),
            status: AgStatus::FailRfcomm,
        });
        assert_eq!(
            f.callbacks(),
            vec![HfpCallbacks::ConnectionState(BthfConnectionState::Disconnected, addr(1))]
        );
        assert!(f.advanced());
        assert_eq!(f.headset.blocks().get(0).state, BthfConnectionState::Disconnected);
    }

    #[test]
    fn close_before_slc_advances_queue() {
        let mut f = Fixture::new(1);
        f.headset.connect_int(addr(1));
        f.open(1, addr(1));
        f.headset.dispatch_ag_event(AgEvent::Close { handle: 1 });
        assert!(f.advanced());
    }

    #[test]
    fn remote_open_failure_ignored() {
        let mut f = Fixture::new(1);
        f.headset.dispatch_ag_event(AgEvent::Open {
            handle: 1,
            addr: addr(1),
            status: AgStatus::FailSdp,
        });
        assert!(f.callbacks().is_empty());
        assert!(!f.advanced());
    }

    #[test]
    #[should_panic]
    fn open_for_other_address_panics() {
        let mut f = Fixture::new(1);
        f.headset.connect_int(addr(1));
        f.open(1, addr(2));
    }

    #[test]
    #[should_panic]
    fn failed_open_for_other_address_panics() {
        let mut f = Fixture::new(1);
        f.headset.connect_int(addr(1));
        f.headset.dispatch_ag_event(AgEvent::Open {
            handle: 1,
            addr: addr(2),
            status: AgStatus::FailRfcomm,
        });
    }

    #[test]
    fn connect_to_connected_device_is_busy() {
        let mut f = Fixture::new(2);
        f.accept(1, addr(1), PeerFeatures::empty());

        assert_eq!(f.headset.connect_int(addr(1)), BtStatus::Busy);
        assert!(f.stack.take().is_empty());
        assert_eq!(f.headset.blocks().get(1).state, BthfConnectionState::Disconnected);
        assert!(f.headset.blocks().get(1).connected_bda.is_empty());

        assert_eq!(f.headset.connect_int(addr(2)), BtStatus::Success);
        assert_eq!(f.stack.take(), vec![StackCall::Open(2, addr(2))]);
    }

    #[test]
    fn unknown_handle_dropped() {
        let mut f = Fixture::new(1);
        f.headset.dispatch_ag_event(AgEvent::AtA { handle: 9 });
        assert!(f.callbacks().is_empty());
    }

    #[test]
    fn at_commands_forwarded() {
        let mut f = Fixture::new(1);
        f.accept(1, addr(1), PeerFeatures::empty());

        f.headset.dispatch_ag_event(AgEvent::AtA { handle: 1 });
        f.headset.dispatch_ag_event(AgEvent::AtD { handle: 1, number: "5551234".into() });
        f.headset.dispatch_ag_event(AgEvent::AtBldn { handle: 1 });
        f.headset.dispatch_ag_event(AgEvent::AtVts { handle: 1, dtmf: "7".into() });
        f.headset.dispatch_ag_event(AgEvent::AtBvra { handle: 1, value: 1 });
        f.headset.dispatch_ag_event(AgEvent::AtNrec { handle: 1, value: 0 });
        f.headset.dispatch_ag_event(AgEvent::AtCbc { handle: 1, value: 3 });
        f.headset.dispatch_ag_event(AgEvent::AtChld { handle: 1, arg: "2".into() });
        f.headset.dispatch_ag_event(AgEvent::AtChld { handle: 1, arg: "9".into() });
        f.headset.dispatch_ag_event(AgEvent::Spk { handle: 1, volume: 11 });
        f.headset.dispatch_ag_event(AgEvent::Wbs { handle: 1, codec: 2 });
        f.headset.dispatch_ag_event(AgEvent::AtBcs { handle: 1, codec: 1 });
        f.headset.dispatch_ag_event(AgEvent::AtUnat { handle: 1, command: "AT+XAPL".into() });

        let a = addr(1);
        assert_eq!(
            f.callbacks(),
            vec![
                HfpCallbacks::AnswerCall(a),
                HfpCallbacks::DialCall("5551234".into(), a),
                HfpCallbacks::DialCall(String::new(), a),
                HfpCallbacks::Dtmf('7', a),
                HfpCallbacks::VoiceRecognition(BthfVrState::Started, a),
                HfpCallbacks::NoiseReduction(BthfNrec::Stop, a),
                HfpCallbacks::AtChld(BthfChldType::HoldActiveAcceptHeld, a),
                HfpCallbacks::VolumeControl(BthfVolumeType::Speaker, 11, a),
                HfpCallbacks::Wbs(BthfWbsConfig::Yes, a),
                HfpCallbacks::Wbs(BthfWbsConfig::No, a),
                HfpCallbacks::UnknownAt("AT+XAPL".into(), a),
            ]
        );
    }

    #[test]
    fn unsupported_commands_rejected() {
        let mut f = Fixture::new(1);
        f.accept(1, addr(1), PeerFeatures::empty());
        f.headset.dispatch_ag_event(AgEvent::AtBinp { handle: 1 });
        f.headset.dispatch_ag_event(AgEvent::AtBtrh { handle: 1 });
        assert_eq!(f.at_lines(), vec!["+CME ERROR: 4", "+CME ERROR: 4"]);
        assert!(f.callbacks().is_empty());
    }

    #[test]
    fn codec_negotiation() {
        let mut f = Fixture::new(1);
        f.accept(1, addr(1), PeerFeatures::CODEC);
        f.headset.dispatch_ag_event(AgEvent::AtBac { handle: 1, codecs: 0b11 });
        f.headset.dispatch_ag_event(AgEvent::AtBac { handle: 1, codecs: 0b01 });
        assert_eq!(
            f.stack.take(),
            vec![StackCall::SetCodec(1, HfpCodecId::Msbc), StackCall::SetCodec(1, HfpCodecId::Cvsd)]
        );
    }

    #[test]
    fn hf_indicators_need_success() {
        let mut f = Fixture::new(1);
        f.accept(1, addr(1), PeerFeatures::HF_IND);
        let a = addr(1);

        for status in [AgStatus::FailSdp, AgStatus::Success] {
            f.headset.dispatch_ag_event(AgEvent::AtBind { handle: 1, status, value: "1,2".into() });
        }
        f.headset.dispatch_ag_event(AgEvent::AtBiev {
            handle: 1,
            status: AgStatus::Success,
            ind_id: 2,
            value: 80,
        });
        f.headset.dispatch_ag_event(AgEvent::AtBia {
            handle: 1,
            status: AgStatus::Success,
            mask: 1 << AgIndicator::Roam as u32,
        });
        assert_eq!(
            f.callbacks(),
            vec![
                HfpCallbacks::AtBind("1,2".into(), a),
                HfpCallbacks::AtBiev(2, 80, a),
                HfpCallbacks::AtBia {
                    service: true,
                    roam: false,
                    signal: true,
                    battery: true,
                    addr: a,
                },
            ]
        );

        // Roaming updates are now suppressed.
        f.headset.device_status_notification(
            BthfNetworkState::Available,
            BthfServiceType::Roaming,
            4,
            5,
            a,
        );
        assert_eq!(f.at_lines(), vec!["+CIEV: 3,1", "+CIEV: 4,4", "+CIEV: 6,5"]);
    }

    #[test]
    fn audio_requires_slc() {
        let mut f = Fixture::new(1);
        assert_eq!(f.headset.connect_audio(addr(1)), BtStatus::Fail);

        f.open(1, addr(1));
        f.callbacks();
        assert_eq!(f.headset.connect_audio(addr(1)), BtStatus::NotReady);

        f.headset.dispatch_ag_event(AgEvent::Conn {
            handle: 1,
            peer_feat: PeerFeatures::empty(),
            chld_feat: ChldFeatures::empty(),
        });
        f.callbacks();
        f.stack.take();
        assert_eq!(f.headset.connect_audio(addr(1)), BtStatus::Success);
        assert_eq!(
            f.callbacks(),
            vec![HfpCallbacks::AudioState(BthfAudioState::Connecting, addr(1))]
        );
        assert_eq!(f.stack.take(), vec![StackCall::AudioOpen(1)]);

        f.headset.dispatch_ag_event(AgEvent::AudioOpen { handle: 1 });
        assert_eq!(
            f.callbacks(),
            vec![HfpCallbacks::AudioState(BthfAudioState::Connected, addr(1))]
        );

        assert_eq!(f.headset.disconnect_audio(addr(1)), BtStatus::Success);
        assert_eq!(f.headset.disconnect(addr(1)), BtStatus::Success);
        assert_eq!(f.stack.take(), vec![StackCall::AudioClose(1), StackCall::Close(1)]);
    }

    #[test]
    fn voice_recognition_needs_peer_support() {
        let mut f = Fixture::new(2);
        f.accept(1, addr(1), PeerFeatures::empty());
        f.accept(2, addr(2), PeerFeatures::VREC);

        assert_eq!(f.headset.start_voice_recognition(addr(1)), BtStatus::Unsupported);
        assert_eq!(f.headset.start_voice_recognition(addr(3)), BtStatus::Fail);
        assert_eq!(f.headset.start_voice_recognition(addr(2)), BtStatus::Success);
        assert_eq!(f.headset.stop_voice_recognition(addr(2)), BtStatus::Success);
        assert_eq!(f.at_lines(), vec!["+BVRA: 1", "+BVRA: 0"]);
    }

    #[test]
    fn cind_counts_held_only_call() {
        let mut f = Fixture::new(1);
        f.accept(1, addr(1), PeerFeatures::empty());

        f.headset.cind_response(1, 0, 1, BthfCallState::Idle, 4, 0, 3, addr(1));
        f.headset.cind_response(1, 0, 0, BthfCallState::Idle, 4, 0, 3, addr(1));
        assert_eq!(f.at_lines(), vec!["+CIND: 1,0,1,4,0,3,2", "OK", "+CIND: 0,0,1,4,0,3,0", "OK"]);
    }

    #[test]
    fn responses_formatted() {
        let mut f = Fixture::new(1);
        f.accept(1, addr(1), PeerFeatures::empty());
        let a = addr(1);

        f.headset.cind_response(1, 1, 1, BthfCallState::Incoming, 4, 0, 3, a);
        f.headset.cops_response("A very long operator name", a);
        f.headset.clcc_response(
            1,
            BthfCallDirection::Incoming,
            BthfCallState::Active,
            BthfCallMode::Voice,
            BthfCallMpty::Single,
            Some("1-555-1234"),
            BTHF_CALL_ADDRTYPE_INTERNATIONAL,
            a,
        );
        f.headset.clcc_response(
            0,
            BthfCallDirection::Outgoing,
            BthfCallState::Idle,
            BthfCallMode::Voice,
            BthfCallMpty::Single,
            None,
            0,
            a,
        );
        f.headset.at_response(BthfAtResponse::Ok, 0, a);
        f.headset.at_response(BthfAtResponse::Error, 3, a);
        f.headset.formatted_at_response("+XAPL=iPhone,6", a);
        f.headset.volume_control(BthfVolumeType::Microphone, 20, a);
        f.headset.send_bsir(true, a);

        assert_eq!(
            f.at_lines(),
            vec![
                "+CIND: 1,1,1,4,0,3,1",
                "OK",
                "+COPS: 0,0,\"A very long oper\"",
                "OK",
                "+CLCC: 1,1,0,0,0,\"+15551234\",145",
                "OK",
                "OK",
                "+CME ERROR: 3",
                "+XAPL=iPhone,6",
                "+VGM: 15",
                "+BSIR: 1",
            ]
        );
    }

    #[test]
    fn requests_need_connection() {
        let mut f = Fixture::new(1);
        let a = addr(1);
        assert_eq!(f.headset.at_response(BthfAtResponse::Ok, 0, a), BtStatus::Fail);

        f.headset.connect_int(a);
        assert_eq!(f.headset.at_response(BthfAtResponse::Ok, 0, a), BtStatus::Fail);
        let idle = PhoneState::new(0, 0, BthfCallState::Idle);
        assert_eq!(f.headset.phone_state_change(idle, a), BtStatus::NotReady);

        f.headset.cleanup();
        assert_eq!(f.headset.disconnect(a), BtStatus::NotReady);
    }

    #[test]
    fn phone_state_drives_indicators() {
        let mut f = Fixture::new(1);
        let a = addr(1);
        f.accept(1, a, PeerFeatures::empty());
        f.headset.set_active_device(a);
        f.stack.take();

        let ring = PhoneState::new(0, 0, BthfCallState::Incoming).with_caller("5551234", 129, None);
        assert_eq!(f.headset.phone_state_change(ring, a), BtStatus::Success);
        assert_eq!(
            f.stack.take(),
            vec![
                StackCall::RouteAudio(1),
                StackCall::At(1, "+CIEV: 2,1".into()),
                StackCall::At(1, "RING".into()),
                StackCall::At(1, "+CLIP: \"5551234\",129".into()),
            ]
        );
        assert!(!f.headset.is_call_idle());

        let answered = PhoneState::new(1, 0, BthfCallState::Idle);
        assert_eq!(f.headset.phone_state_change(answered, a), BtStatus::Success);
        assert_eq!(f.at_lines(), vec!["+CIEV: 1,1", "+CIEV: 2,0"]);

        // Disconnected setup state leaves the link untouched.
        let dropped = PhoneState::new(0, 0, BthfCallState::Disconnected);
        assert_eq!(f.headset.phone_state_change(dropped, a), BtStatus::Success);
        assert!(f.stack.take().is_empty());
        assert!(!f.headset.is_call_idle());

        let hung_up = PhoneState::new(0, 0, BthfCallState::Idle);
        assert_eq!(f.headset.phone_state_change(hung_up, a), BtStatus::Success);
        assert_eq!(f.at_lines(), vec!["+CIEV: 1,0"]);
        assert!(f.headset.is_call_idle());
    }

    #[test]
    fn sco_and_active_device() {
        let mut f = Fixture::new(1);
        assert_eq!(f.headset.set_sco_allowed(false), BtStatus::Success);
        assert_eq!(f.headset.set_active_device(addr(4)), BtStatus::Success);
        assert_eq!(f.headset.active_device(), addr(4));
        assert_eq!(
            f.stack.take(),
            vec![StackCall::SetScoAllowed(false), StackCall::SetActiveDevice(addr(4))]
        );
    }

    #[test]
    fn leading_number_parses_prefix() {
        assert_eq!(leading_number("1"), Some(1));
        assert_eq!(leading_number("12"), Some(12));
        assert_eq!(leading_number("1x"), Some(1));
        assert_eq!(leading_number("x"), None);
        assert!(is_dial_char('w') && !is_dial_char('-'));
    }
}
