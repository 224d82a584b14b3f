//! AT result codes sent to the hands-free unit.
//!
//! Call results are expanded into the `+CIEV` indicator updates they imply. Every indicator value
//! sent on a link is cached in [`IndicatorState`] so repeated values are not sent again.

use crate::headset::hfp::BthfVolumeType;
use log::debug;
use num_derive::{FromPrimitive, ToPrimitive};

/// Longest AT line that may be sent, in bytes.
pub const BTA_AG_AT_MAX_LEN: usize = 256;

/// Indicator ids in the order they are listed in the `+CIND` test response.
#[derive(Clone, Copy, Debug, FromPrimitive, ToPrimitive, PartialEq, Eq)]
#[repr(u16)]
pub enum AgIndicator {
    Call = 1,
    CallSetup = 2,
    Service = 3,
    Signal = 4,
    Roam = 5,
    BattChg = 6,
    CallHeld = 7,
}

/// What the audio link should do alongside a call result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AudioHandle {
    /// Leave any audio connection as it is.
    NoChange,
    /// Route audio to the link with this handle.
    Route(u16),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AgResult {
    IncomingCall { audio_handle: AudioHandle, caller_id: Option<String> },
    CallWaiting { caller_id: Option<String> },
    IncomingCallConnected { audio_handle: AudioHandle },
    IncomingCallHeld,
    OutgoingCallOrig { audio_handle: AudioHandle },
    OutgoingCallAlert { audio_handle: AudioHandle },
    OutgoingCallConnected { audio_handle: AudioHandle },
    MultiCall { audio_handle: AudioHandle },
    CallCancel,
    EndCall,
    /// Indicator update, dropped when the value was already sent.
    Indicator(AgIndicator, u16),
    /// Indicator update that is always sent.
    IndicatorOnDemand(AgIndicator, u16),
    Cind(String),
    Cops(String),
    /// One `+CLCC` entry, or the terminating `OK` when `None`.
    Clcc(Option<String>),
    /// Pre-formatted response to an unknown AT command.
    Unat(String),
    AtOk,
    /// `ERROR`, or `+CME ERROR: <code>` for a non-zero code.
    AtError(u16),
    Volume(BthfVolumeType, u16),
    Bvra(bool),
    Bsir(bool),
}

impl AgResult {
    pub fn call_held(value: u16) -> Self {
        AgResult::Indicator(AgIndicator::CallHeld, value)
    }

    /// The audio hint carried by call results.
    pub fn audio_handle(&self) -> AudioHandle {
        match self {
            AgResult::IncomingCall { audio_handle, .. }
            | AgResult::IncomingCallConnected { audio_handle }
            | AgResult::OutgoingCallOrig { audio_handle }
            | AgResult::OutgoingCallAlert { audio_handle }
            | AgResult::OutgoingCallConnected { audio_handle }
            | AgResult::MultiCall { audio_handle } => *audio_handle,
            _ => AudioHandle::NoChange,
        }
    }
}

/// Last indicator values sent on one link, plus the `AT+BIA` activation mask.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndicatorState {
    values: [u16; 8],
    /// Bit n set means indicator n was deactivated by the peer.
    bia_masked_out: u32,
}

impl IndicatorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self, id: AgIndicator) -> u16 {
        self.values[id as usize]
    }

    pub fn set_bia_mask(&mut self, masked_out: u32) {
        self.bia_masked_out = masked_out;
    }

    fn is_masked(&self, id: AgIndicator) -> bool {
        match id {
            AgIndicator::Call | AgIndicator::CallSetup | AgIndicator::CallHeld => false,
            _ => self.bia_masked_out & (1 << (id as u32)) != 0,
        }
    }

    /// Returns the `+CIEV` line for an update, or `None` if nothing needs to be sent.
    pub fn update(&mut self, id: AgIndicator, value: u16, on_demand: bool) -> Option<String> {
        if self.is_masked(id) {
            debug!("Indicator {:?} deactivated by peer", id);
            return None;
        }

        let cached = self.values[id as usize];
        // A repeated callheld=1 means the held and active calls were swapped.
        let repeatable = id == AgIndicator::CallHeld && value == 1;
        if !on_demand && !repeatable && cached == value {
            return None;
        }

        self.values[id as usize] = value;
        Some(format!("+CIEV: {},{}", id as u16, value))
    }

    /// Records the values reported in a `+CIND` read response.
    fn load_cind(&mut self, cind: &str) {
        let order = [
            AgIndicator::Call,
            AgIndicator::CallSetup,
            AgIndicator::Service,
            AgIndicator::Signal,
            AgIndicator::Roam,
            AgIndicator::BattChg,
            AgIndicator::CallHeld,
        ];
        for (id, value) in order.iter().zip(cind.split(',')) {
            if let Ok(v) = value.trim().parse::<u16>() {
                self.values[*id as usize] = v;
            }
        }
    }
}

/// Wraps a response line the way it goes on the wire.
pub fn frame(line: &str) -> String {
    format!("\r\n{}\r\n", line)
}

/// Builds the framed lines for `result` and updates the indicator cache.
pub fn format_result(result: &AgResult, inds: &mut IndicatorState) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let call_inds = |inds: &mut IndicatorState, call: Option<u16>, setup: u16| {
        let mut out = Vec::new();
        if let Some(call) = call {
            out.extend(inds.update(AgIndicator::Call, call, false));
        }
        out.extend(inds.update(AgIndicator::CallSetup, setup, false));
        out
    };

    match result {
        AgResult::IncomingCall { caller_id, .. } => {
            lines.extend(call_inds(inds, None, 1));
            lines.push("RING".to_string());
            if let Some(id) = caller_id {
                lines.push(format!("+CLIP: {}", id));
            }
        }
        AgResult::CallWaiting { caller_id } => {
            if let Some(id) = caller_id {
                lines.push(format!("+CCWA: {}", id));
            }
            lines.extend(call_inds(inds, None, 1));
        }
        AgResult::IncomingCallConnected { .. }
        | AgResult::IncomingCallHeld
        | AgResult::OutgoingCallConnected { .. } => {
            lines.extend(call_inds(inds, Some(1), 0));
        }
        AgResult::OutgoingCallOrig { .. } => lines.extend(call_inds(inds, None, 2)),
        AgResult::OutgoingCallAlert { .. } => lines.extend(call_inds(inds, None, 3)),
        AgResult::CallCancel => lines.extend(call_inds(inds, None, 0)),
        AgResult::EndCall => lines.extend(call_inds(inds, Some(0), 0)),
        AgResult::MultiCall { .. } => {}
        AgResult::Indicator(id, value) => lines.extend(inds.update(*id, *value, false)),
        AgResult::IndicatorOnDemand(id, value) => lines.extend(inds.update(*id, *value, true)),
        AgResult::Cind(cind) => {
            inds.load_cind(cind);
            lines.push(format!("+CIND: {}", cind));
            lines.push("OK".to_string());
        }
        AgResult::Cops(cops) => {
            lines.push(format!("+COPS: {}", cops));
            lines.push("OK".to_string());
        }
        AgResult::Clcc(Some(entry)) => lines.push(format!("+CLCC: {}", entry)),
        AgResult::Clcc(None) => lines.push("OK".to_string()),
        AgResult::Unat(rsp) => lines.push(rsp.clone()),
        AgResult::AtOk => lines.push("OK".to_string()),
        AgResult::AtError(0) => lines.push("ERROR".to_string()),
        AgResult::AtError(code) => lines.push(format!("+CME ERROR: {}", code)),
        AgResult::Volume(BthfVolumeType::Speaker, v) => lines.push(format!("+VGS: {}", v)),
        AgResult::Volume(BthfVolumeType::Microphone, v) => lines.push(format!("+VGM: {}", v)),
        AgResult::Bvra(on) => lines.push(format!("+BVRA: {}", *on as u8)),
        AgResult::Bsir(on) => lines.push(format!("+BSIR: {}", *on as u8)),
    }

    lines.iter().map(|l| frame(l)).collect()
}
