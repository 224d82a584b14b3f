//! Hands-Free types shared with the upstream profile service.

use crate::btif::RawAddress;
use bitflags::bitflags;
use num_derive::{FromPrimitive, ToPrimitive};

#[derive(Clone, Copy, Debug, FromPrimitive, ToPrimitive, PartialEq, Eq, PartialOrd)]
#[repr(u32)]
pub enum BthfConnectionState {
    Disconnected = 0,
    Connecting,
    Connected,
    SlcConnected,
    Disconnecting,
}

#[derive(Clone, Copy, Debug, FromPrimitive, ToPrimitive, PartialEq, Eq)]
#[repr(u32)]
pub enum BthfAudioState {
    Disconnected = 0,
    Connecting,
    Connected,
    Disconnecting,
}

/// Call state as reported by telephony. The discriminants are the values used in `+CLCC`.
#[derive(Clone, Copy, Debug, FromPrimitive, ToPrimitive, PartialEq, Eq)]
#[repr(u32)]
pub enum BthfCallState {
    Active = 0,
    Held,
    Dialing,
    Alerting,
    Incoming,
    Waiting,
    Idle,
    Disconnected,
}

#[derive(Clone, Copy, Debug, FromPrimitive, ToPrimitive, PartialEq, Eq)]
#[repr(u32)]
pub enum BthfVolumeType {
    Speaker = 0,
    Microphone,
}

#[derive(Clone, Copy, Debug, FromPrimitive, ToPrimitive, PartialEq, Eq)]
#[repr(u32)]
pub enum BthfVrState {
    Stopped = 0,
    Started,
}

#[derive(Clone, Copy, Debug, FromPrimitive, ToPrimitive, PartialEq, Eq)]
#[repr(u32)]
pub enum BthfNrec {
    Stop = 0,
    Start,
}

#[derive(Clone, Copy, Debug, FromPrimitive, ToPrimitive, PartialEq, Eq)]
#[repr(u32)]
pub enum BthfWbsConfig {
    None = 0,
    No,
    Yes,
}

#[derive(Clone, Copy, Debug, FromPrimitive, ToPrimitive, PartialEq, Eq)]
#[repr(u32)]
pub enum BthfChldType {
    ReleaseHeld = 0,
    ReleaseActiveAcceptHeld,
    HoldActiveAcceptHeld,
    AddHeldToConf,
}

#[derive(Clone, Copy, Debug, FromPrimitive, ToPrimitive, PartialEq, Eq)]
#[repr(u32)]
pub enum BthfAtResponse {
    Error = 0,
    Ok,
}

#[derive(Clone, Copy, Debug, FromPrimitive, ToPrimitive, PartialEq, Eq)]
#[repr(u32)]
pub enum BthfNetworkState {
    NotAvailable = 0,
    Available,
}

#[derive(Clone, Copy, Debug, FromPrimitive, ToPrimitive, PartialEq, Eq)]
#[repr(u32)]
pub enum BthfServiceType {
    Home = 0,
    Roaming,
}

#[derive(Clone, Copy, Debug, FromPrimitive, ToPrimitive, PartialEq, Eq)]
#[repr(u32)]
pub enum BthfCallDirection {
    Outgoing = 0,
    Incoming,
}

#[derive(Clone, Copy, Debug, FromPrimitive, ToPrimitive, PartialEq, Eq)]
#[repr(u32)]
pub enum BthfCallMode {
    Voice = 0,
    Data,
    Fax,
}

#[derive(Clone, Copy, Debug, FromPrimitive, ToPrimitive, PartialEq, Eq)]
#[repr(u32)]
pub enum BthfCallMpty {
    Single = 0,
    Multi,
}

/// Number type for a national or unknown numbering plan.
pub const BTHF_CALL_ADDRTYPE_UNKNOWN: u16 = 0x81;
/// Number type for an international number; such numbers are prefixed with '+'.
pub const BTHF_CALL_ADDRTYPE_INTERNATIONAL: u16 = 0x91;

/// Codec identifiers as negotiated with `AT+BAC`/`AT+BCS`.
#[derive(Clone, Copy, Debug, FromPrimitive, ToPrimitive, PartialEq, Eq)]
#[repr(u16)]
pub enum HfpCodecId {
    None = 0,
    Cvsd = 1,
    Msbc = 2,
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct HfpCodecCapability: u16 {
        const UNSUPPORTED = 0b00;
        const CVSD = 0b01;
        const MSBC = 0b10;
    }
}

bitflags! {
    /// Features advertised by the local audio gateway.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct AgFeatures: u32 {
        const THREE_WAY = 0x0001;
        const ECNR = 0x0002;
        const VREC = 0x0004;
        const INBAND = 0x0008;
        const VTAG = 0x0010;
        const REJECT = 0x0020;
        const ECS = 0x0040;
        const ECC = 0x0080;
        const EXTERR = 0x0100;
        const CODEC = 0x0200;
        const HF_IND = 0x0400;
        const ESCO_S4 = 0x0800;
        const UNAT = 0x1000;
    }
}

bitflags! {
    /// Features reported by the hands-free unit in `AT+BRSF`.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct PeerFeatures: u16 {
        const ECNR = 0x0001;
        const THREE_WAY = 0x0002;
        const CLI = 0x0004;
        const VREC = 0x0008;
        const VOL = 0x0010;
        const ECS = 0x0020;
        const ECC = 0x0040;
        const CODEC = 0x0080;
        const HF_IND = 0x0100;
        const ESCO_S4 = 0x0200;
    }
}

bitflags! {
    /// Call hold operations supported by the hands-free unit.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct ChldFeatures: u16 {
        const REL = 0x0001;
        const REL_ACC = 0x0002;
        const REL_X = 0x0004;
        const HOLD_ACC = 0x0008;
        const PRIV_X = 0x0010;
        const MERGE = 0x0020;
        const MERGE_DETACH = 0x0040;
    }
}

/// Notifications delivered to the upstream profile service.
#[derive(Debug, Clone, PartialEq)]
pub enum HfpCallbacks {
    ConnectionState(BthfConnectionState, RawAddress),
    AudioState(BthfAudioState, RawAddress),
    VoiceRecognition(BthfVrState, RawAddress),
    AnswerCall(RawAddress),
    HangupCall(RawAddress),
    VolumeControl(BthfVolumeType, i32, RawAddress),
    DialCall(String, RawAddress),
    Dtmf(char, RawAddress),
    NoiseReduction(BthfNrec, RawAddress),
    Wbs(BthfWbsConfig, RawAddress),
    AtChld(BthfChldType, RawAddress),
    AtCnum(RawAddress),
    AtCind(RawAddress),
    AtCops(RawAddress),
    AtClcc(RawAddress),
    UnknownAt(String, RawAddress),
    KeyPressed(RawAddress),
    AtBind(String, RawAddress),
    AtBiev(u16, i32, RawAddress),
    AtBia { service: bool, roam: bool, signal: bool, battery: bool, addr: RawAddress },
}

pub struct HfpCallbacksDispatcher {
    pub dispatch: Box<dyn Fn(HfpCallbacks) + Send>,
}

impl HfpCallbacksDispatcher {
    pub fn new(dispatch: Box<dyn Fn(HfpCallbacks) + Send>) -> Self {
        Self { dispatch }
    }
}
