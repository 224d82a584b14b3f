//! Hands-Free Profile audio gateway control plane.
//!
//! All profile state is owned by [`Stack`], which runs as a single task and handles one
//! [`Message`] at a time. Other tasks talk to it through a [`StackHandle`].

pub mod a2dp;
pub mod btif;
pub mod config;
pub mod headset;
pub mod profile_queue;
pub mod utils;

use crate::a2dp::{A2dpActions, A2dpCtrlAck, A2dpTransportArbiter};
use crate::btif::{BtStatus, RawAddress, UUID_SERVCLASS_AG_HANDSFREE};
use crate::headset::events::AgEvent;
use crate::headset::hfp::HfpCallbacksDispatcher;
use crate::headset::{Headset, HeadsetRequest};
use crate::profile_queue::{ProfileQueue, QueueActions};
use log::{debug, info, warn};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;

/// Reply channel for a request.
pub type Responder<T> = oneshot::Sender<T>;

/// Message for the stack dispatch task.
pub enum Message {
    /// Event from the audio gateway stack.
    Ag(AgEvent),
    HeadsetInit(HfpCallbacksDispatcher, Responder<BtStatus>),
    /// Outgoing connection, serialized through the profile queue.
    HeadsetConnect(RawAddress, Responder<BtStatus>),
    Headset(HeadsetRequest, Responder<BtStatus>),
    ProfileQueue(QueueActions),
    A2dpStartRequest(Responder<A2dpCtrlAck>),
    A2dpSuspendRequest(Responder<A2dpCtrlAck>),
    A2dp(A2dpActions),
}

/// Profiles reachable from profile queue callbacks.
pub struct Profiles {
    pub headset: Headset,
    pub a2dp: A2dpTransportArbiter,
}

pub struct Stack {
    queue: ProfileQueue<Profiles>,
    profiles: Profiles,
}

impl Stack {
    /// Creates the channel feeding [`Stack::dispatch`].
    pub fn create_channel() -> (UnboundedSender<Message>, UnboundedReceiver<Message>) {
        mpsc::unbounded_channel()
    }

    pub fn new(headset: Headset, a2dp: A2dpTransportArbiter) -> Self {
        Self { queue: ProfileQueue::new(), profiles: Profiles { headset, a2dp } }
    }

    pub fn profiles(&self) -> &Profiles {
        &self.profiles
    }

    fn reply<T>(resp: Responder<T>, value: T) {
        if resp.send(value).is_err() {
            debug!("Requester went away before the reply");
        }
    }

    pub fn handle_message(&mut self, message: Message) {
        match message {
            Message::Ag(event) => self.profiles.headset.dispatch_ag_event(event),
            Message::HeadsetInit(callbacks, resp) => {
                Self::reply(resp, self.profiles.headset.init(callbacks));
            }
            Message::HeadsetConnect(addr, resp) => {
                if !self.profiles.headset.is_initialized() {
                    Self::reply(resp, BtStatus::NotReady);
                    return;
                }
                let status = self.queue.connect(
                    &mut self.profiles,
                    UUID_SERVCLASS_AG_HANDSFREE,
                    addr,
                    Box::new(|p: &mut Profiles, addr: RawAddress, _uuid: u16| {
                        p.headset.connect_int(addr)
                    }),
                );
                Self::reply(resp, status);
            }
            Message::Headset(HeadsetRequest::Cleanup, resp) => {
                self.queue.cleanup(UUID_SERVCLASS_AG_HANDSFREE);
                Self::reply(resp, self.profiles.headset.handle_request(HeadsetRequest::Cleanup));
            }
            Message::Headset(request, resp) => {
                Self::reply(resp, self.profiles.headset.handle_request(request));
            }
            Message::ProfileQueue(action) => self.queue.handle_action(&mut self.profiles, action),
            Message::A2dpStartRequest(resp) => {
                let ack = self.profiles.a2dp.start_request(&self.profiles.headset);
                Self::reply(resp, ack);
            }
            Message::A2dpSuspendRequest(resp) => {
                Self::reply(resp, self.profiles.a2dp.suspend_request());
            }
            Message::A2dp(action) => self.profiles.a2dp.handle_action(action),
        }
    }

    /// Runs until every sender is dropped.
    pub async fn dispatch(mut self, mut rx: UnboundedReceiver<Message>) {
        info!("Stack dispatch started");
        while let Some(message) = rx.recv().await {
            self.handle_message(message);
        }
        info!("Stack dispatch stopped");
    }
}

/// Cloneable front end of the dispatch task.
#[derive(Clone)]
pub struct StackHandle {
    tx: UnboundedSender<Message>,
}

impl StackHandle {
    pub fn new(tx: UnboundedSender<Message>) -> Self {
        Self { tx }
    }

    fn post(&self, message: Message) {
        if self.tx.send(message).is_err() {
            warn!("Stack dispatch is gone, message dropped");
        }
    }

    /// Sends a request and waits for its reply, or returns `closed` if the task is gone.
    async fn call<T>(&self, make: impl FnOnce(Responder<T>) -> Message, closed: T) -> T {
        let (tx, rx) = oneshot::channel();
        if self.tx.send(make(tx)).is_err() {
            warn!("Stack dispatch is gone");
            return closed;
        }
        rx.await.unwrap_or(closed)
    }

    pub fn post_ag_event(&self, event: AgEvent) {
        self.post(Message::Ag(event));
    }

    pub fn post_a2dp_action(&self, action: A2dpActions) {
        self.post(Message::A2dp(action));
    }

    pub async fn init_headset(&self, callbacks: HfpCallbacksDispatcher) -> BtStatus {
        self.call(|r| Message::HeadsetInit(callbacks, r), BtStatus::NotReady).await
    }

    /// Queues an outgoing connection. The outcome arrives as a connection state callback.
    pub async fn connect(&self, addr: RawAddress) -> BtStatus {
        self.call(|r| Message::HeadsetConnect(addr, r), BtStatus::NotReady).await
    }

    pub async fn headset_request(&self, request: HeadsetRequest) -> BtStatus {
        self.call(|r| Message::Headset(request, r), BtStatus::NotReady).await
    }

    pub async fn a2dp_start_request(&self) -> A2dpCtrlAck {
        self.call(Message::A2dpStartRequest, A2dpCtrlAck::Failure).await
    }

    pub async fn a2dp_suspend_request(&self) -> A2dpCtrlAck {
        self.call(Message::A2dpSuspendRequest, A2dpCtrlAck::Failure).await
    }
}
