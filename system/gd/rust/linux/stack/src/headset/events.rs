//! Events reported by the audio gateway stack.

use crate::btif::RawAddress;
use crate::headset::hfp::{AgFeatures, ChldFeatures, HfpCodecId, PeerFeatures};
use num_derive::{FromPrimitive, ToPrimitive};

#[derive(Clone, Copy, Debug, FromPrimitive, ToPrimitive, PartialEq, Eq)]
#[repr(u8)]
pub enum AgStatus {
    Success = 0,
    FailSdp,
    FailRfcomm,
    FailResources,
}

/// One event per stack callback. Every event but enable/disable targets the link `handle`.
#[derive(Clone, Debug, PartialEq)]
pub enum AgEvent {
    Enable,
    Disable,
    Register { handle: u16, status: AgStatus },
    Open { handle: u16, addr: RawAddress, status: AgStatus },
    Close { handle: u16 },
    /// Service level connection established.
    Conn { handle: u16, peer_feat: PeerFeatures, chld_feat: ChldFeatures },
    AudioOpen { handle: u16 },
    AudioClose { handle: u16 },
    Spk { handle: u16, volume: u16 },
    Mic { handle: u16, volume: u16 },
    AtA { handle: u16 },
    AtD { handle: u16, number: String },
    AtBldn { handle: u16 },
    AtChup { handle: u16 },
    AtCind { handle: u16 },
    AtVts { handle: u16, dtmf: String },
    AtBvra { handle: u16, value: u16 },
    AtNrec { handle: u16, value: u16 },
    AtCbc { handle: u16, value: u16 },
    AtCkpd { handle: u16 },
    Wbs { handle: u16, codec: u16 },
    AtChld { handle: u16, arg: String },
    AtClcc { handle: u16 },
    AtCops { handle: u16 },
    AtUnat { handle: u16, command: String },
    AtCnum { handle: u16 },
    AtBinp { handle: u16 },
    AtBtrh { handle: u16 },
    AtBac { handle: u16, codecs: u16 },
    AtBcs { handle: u16, codec: u16 },
    AtBind { handle: u16, status: AgStatus, value: String },
    AtBiev { handle: u16, status: AgStatus, ind_id: u16, value: i32 },
    AtBia { handle: u16, status: AgStatus, mask: u32 },
}

impl AgEvent {
    pub fn handle(&self) -> Option<u16> {
        match self {
            AgEvent::Enable | AgEvent::Disable => None,
            AgEvent::Register { handle, .. }
            | AgEvent::Open { handle, .. }
            | AgEvent::Close { handle }
            | AgEvent::Conn { handle, .. }
            | AgEvent::AudioOpen { handle }
            | AgEvent::AudioClose { handle }
            | AgEvent::Spk { handle, .. }
            | AgEvent::Mic { handle, .. }
            | AgEvent::AtA { handle }
            | AgEvent::AtD { handle, .. }
            | AgEvent::AtBldn { handle }
            | AgEvent::AtChup { handle }
            | AgEvent::AtCind { handle }
            | AgEvent::AtVts { handle, .. }
            | AgEvent::AtBvra { handle, .. }
            | AgEvent::AtNrec { handle, .. }
            | AgEvent::AtCbc { handle, .. }
            | AgEvent::AtCkpd { handle }
            | AgEvent::Wbs { handle, .. }
            | AgEvent::AtChld { handle, .. }
            | AgEvent::AtClcc { handle }
            | AgEvent::AtCops { handle }
            | AgEvent::AtUnat { handle, .. }
            | AgEvent::AtCnum { handle }
            | AgEvent::AtBinp { handle }
            | AgEvent::AtBtrh { handle }
            | AgEvent::AtBac { handle, .. }
            | AgEvent::AtBcs { handle, .. }
            | AgEvent::AtBind { handle, .. }
            | AgEvent::AtBiev { handle, .. }
            | AgEvent::AtBia { handle, .. } => Some(*handle),
        }
    }
}

/// Requests made of the audio gateway stack.
pub trait AgStack {
    fn enable(&mut self);
    fn disable(&mut self);
    /// Registers one service instance; the stack answers with [`AgEvent::Register`].
    fn register(&mut self, app_id: u8, features: AgFeatures);
    fn deregister(&mut self, handle: u16);
    fn open(&mut self, handle: u16, addr: RawAddress);
    fn close(&mut self, handle: u16);
    fn audio_open(&mut self, handle: u16);
    fn audio_close(&mut self, handle: u16);
    fn set_codec(&mut self, handle: u16, codec: HfpCodecId);
    fn set_active_device(&mut self, addr: RawAddress);
    fn set_sco_allowed(&mut self, allowed: bool);
    /// Moves the audio link to `handle` alongside a call result.
    fn route_audio(&mut self, handle: u16);
    /// Writes a framed AT response on the link.
    fn send_at(&mut self, handle: u16, data: &str);
}
