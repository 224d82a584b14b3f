//! Serializes outgoing profile connections.
//!
//! Only the head of the queue may have a connection attempt in flight. A profile advances the
//! queue once its attempt has reached a final outcome (connected, or failed), which lets the next
//! request start. The queue is owned by the stack dispatch task; other tasks post
//! [`QueueActions`] instead of touching it directly.

use crate::btif::{BtStatus, RawAddress};
use log::{debug, info, warn};
use std::collections::VecDeque;

/// Invoked with the owning context when a request reaches the head of the queue.
pub type ConnectCallback<C> = Box<dyn FnMut(&mut C, RawAddress, u16) -> BtStatus + Send>;

/// Queue operations that can be posted to the dispatch task.
#[derive(Debug, PartialEq)]
pub enum QueueActions {
    /// The head request has completed; start the next one.
    Advance,
    /// Start the head request if it is not already in flight.
    ConnectNext,
    /// Drop every request of the given profile.
    Cleanup(u16),
    /// Drop every request.
    Release,
}

struct ConnectNode<C> {
    uuid: u16,
    address: RawAddress,
    busy: bool,
    connect_cb: ConnectCallback<C>,
}

pub struct ProfileQueue<C> {
    queue: VecDeque<ConnectNode<C>>,
}

impl<C> Default for ProfileQueue<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> ProfileQueue<C> {
    pub fn new() -> Self {
        Self { queue: VecDeque::new() }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Returns true if a request for `uuid` and `address` is queued.
    pub fn contains(&self, uuid: u16, address: &RawAddress) -> bool {
        self.queue.iter().any(|n| n.uuid == uuid && n.address == *address)
    }

    pub(crate) fn handle_action(&mut self, ctx: &mut C, action: QueueActions) {
        match action {
            QueueActions::Advance => self.advance(ctx),
            QueueActions::ConnectNext => {
                let _ = self.connect_next(ctx);
            }
            QueueActions::Cleanup(uuid) => self.cleanup(uuid),
            QueueActions::Release => self.release(),
        }
    }

    /// Enqueues a connection request.
    ///
    /// The returned status only says the request was accepted; the outcome of the connection is
    /// reported by the profile later. A request identical to one already queued is dropped.
    pub fn connect(
        &mut self,
        ctx: &mut C,
        uuid: u16,
        address: RawAddress,
        connect_cb: ConnectCallback<C>,
    ) -> BtStatus {
        if self.contains(uuid, &address) {
            warn!("[{}]: Dropping duplicate connect request for uuid 0x{:04x}", address, uuid);
            return BtStatus::Success;
        }

        debug!("[{}]: Queueing connect request for uuid 0x{:04x}", address, uuid);
        self.queue.push_back(ConnectNode { uuid, address, busy: false, connect_cb });
        if self.queue.len() == 1 {
            let _ = self.connect_next(ctx);
        }
        BtStatus::Success
    }

    /// Removes the head request and starts the next one, if any.
    pub fn advance(&mut self, ctx: &mut C) {
        if self.queue.pop_front().is_none() {
            debug!("Advance on empty connect queue");
            return;
        }
        let _ = self.connect_next(ctx);
    }

    /// Removes every request of profile `uuid` without starting another one.
    pub fn cleanup(&mut self, uuid: u16) {
        self.queue.retain(|n| n.uuid != uuid);
    }

    pub fn release(&mut self) {
        self.queue.clear();
    }

    /// Starts the head request.
    ///
    /// A head whose callback fails is removed and the next request is tried, until one succeeds
    /// or the queue runs empty.
    pub fn connect_next(&mut self, ctx: &mut C) -> BtStatus {
        loop {
            let head = match self.queue.front_mut() {
                Some(head) => head,
                None => return BtStatus::Fail,
            };
            if head.busy {
                return BtStatus::Busy;
            }

            head.busy = true;
            let (uuid, address) = (head.uuid, head.address);
            let status = (head.connect_cb)(&mut *ctx, address, uuid);
            if status == BtStatus::Success {
                return status;
            }

            info!("[{}]: Connect for uuid 0x{:04x} failed with {:?}", address, uuid, status);
            self.queue.pop_front();
        }
    }
}
