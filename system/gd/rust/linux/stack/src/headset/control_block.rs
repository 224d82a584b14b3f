//! Per-link state of the audio gateway.

use crate::btif::RawAddress;
use crate::headset::at::IndicatorState;
use crate::headset::call_state::CallState;
use crate::headset::hfp::{BthfConnectionState, ChldFeatures, PeerFeatures};
use log::debug;

/// Most hands-free links the audio gateway can serve at once.
pub const BTA_AG_MAX_NUM_CLIENTS: usize = 6;

/// Handle value of a slot that has not been registered with the stack.
pub const BTA_AG_HANDLE_NONE: u16 = 0;

#[derive(Clone, Debug)]
pub struct DeviceControlBlock {
    /// Stack handle bound at registration. Survives [`ControlBlockTable::reset`].
    pub handle: u16,
    pub is_initiator: bool,
    pub connected_bda: RawAddress,
    pub state: BthfConnectionState,
    pub peer_feat: PeerFeatures,
    pub chld_feat: ChldFeatures,
    pub call: CallState,
    pub indicators: IndicatorState,
}

impl DeviceControlBlock {
    fn new() -> Self {
        Self {
            handle: BTA_AG_HANDLE_NONE,
            is_initiator: false,
            connected_bda: RawAddress::EMPTY,
            state: BthfConnectionState::Disconnected,
            peer_feat: PeerFeatures::empty(),
            chld_feat: ChldFeatures::empty(),
            call: CallState::default(),
            indicators: IndicatorState::new(),
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, BthfConnectionState::Connected | BthfConnectionState::SlcConnected)
    }

    pub fn is_slc_connected(&self) -> bool {
        self.state == BthfConnectionState::SlcConnected
    }
}

/// Fixed set of control blocks, addressed by slot index.
pub struct ControlBlockTable {
    blocks: Vec<DeviceControlBlock>,
}

impl ControlBlockTable {
    /// Creates a table of `capacity` slots.
    ///
    /// Panics if `capacity` exceeds [`BTA_AG_MAX_NUM_CLIENTS`].
    pub fn new(capacity: usize) -> Self {
        if capacity > BTA_AG_MAX_NUM_CLIENTS {
            panic!("{} control blocks requested, at most {}", capacity, BTA_AG_MAX_NUM_CLIENTS);
        }
        Self { blocks: (0..capacity).map(|_| DeviceControlBlock::new()).collect() }
    }

    pub fn capacity(&self) -> usize {
        self.blocks.len()
    }

    pub fn get(&self, idx: usize) -> &DeviceControlBlock {
        &self.blocks[idx]
    }

    pub fn get_mut(&mut self, idx: usize) -> &mut DeviceControlBlock {
        &mut self.blocks[idx]
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeviceControlBlock> {
        self.blocks.iter()
    }

    /// Returns a free slot for a new outgoing connection.
    ///
    /// Panics if a slot is still connecting: only one outgoing connection is attempted at a time.
    pub fn allocate(&self) -> Option<usize> {
        for (idx, block) in self.blocks.iter().enumerate() {
            match block.state {
                BthfConnectionState::Connecting => {
                    panic!("[{}]: Control block {} is already connecting", block.connected_bda, idx)
                }
                BthfConnectionState::Disconnected => return Some(idx),
                _ => {}
            }
        }
        None
    }

    pub fn find_by_address(&self, addr: &RawAddress) -> Option<usize> {
        if addr.is_empty() {
            return None;
        }
        self.blocks.iter().position(|b| b.connected_bda == *addr)
    }

    pub fn find_by_handle(&self, handle: u16) -> Option<usize> {
        if handle == BTA_AG_HANDLE_NONE {
            return None;
        }
        self.blocks.iter().position(|b| b.handle == handle)
    }

    /// Binds a newly registered stack handle to the first unbound slot.
    pub fn bind_handle(&mut self, handle: u16) -> Option<usize> {
        let idx = self.blocks.iter().position(|b| b.handle == BTA_AG_HANDLE_NONE)?;
        debug!("Bound handle {} to control block {}", handle, idx);
        self.blocks[idx].handle = handle;
        Some(idx)
    }

    /// Returns every slot to its initial state except for the bound handle.
    pub fn reset(&mut self, idx: usize) {
        let handle = self.blocks[idx].handle;
        self.blocks[idx] = DeviceControlBlock { handle, ..DeviceControlBlock::new() };
    }

    /// Unbinds and resets every slot.
    pub fn clear(&mut self) {
        for block in self.blocks.iter_mut() {
            *block = DeviceControlBlock::new();
        }
    }

    /// Whether `addr` (or, with `None`, any device) has a connected link.
    pub fn is_connected(&self, addr: Option<&RawAddress>) -> bool {
        match addr {
            Some(addr) => {
                self.find_by_address(addr).map_or(false, |i| self.blocks[i].is_connected())
            }
            None => self.blocks.iter().any(|b| b.is_connected()),
        }
    }
}
