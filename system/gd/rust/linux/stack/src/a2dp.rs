//! Arbitrates A2DP stream control between the audio HAL and the AV stream.
//!
//! The audio HAL asks for the stream to start, suspend or stop; the AV stream acknowledges later.
//! Only one command may be outstanding at a time. Streaming is refused while a voice call is in
//! progress.

use log::{debug, info, warn};
use num_derive::{FromPrimitive, ToPrimitive};

#[derive(Clone, Copy, Debug, FromPrimitive, ToPrimitive, PartialEq, Eq)]
#[repr(u8)]
pub enum A2dpCtrlCmd {
    None = 0,
    Start,
    Suspend,
    Stop,
}

#[derive(Clone, Copy, Debug, FromPrimitive, ToPrimitive, PartialEq, Eq)]
#[repr(u8)]
pub enum A2dpCtrlAck {
    Success = 0,
    Failure,
    IncallFailure,
    Unsupported,
    Pending,
    DisconnectInProgress,
    Busy,
}

impl A2dpCtrlAck {
    /// Whether the ack concludes the command it answers.
    pub fn is_terminal(&self) -> bool {
        *self != A2dpCtrlAck::Pending
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum A2dpChannelMode {
    Mono,
    Stereo,
}

/// PCM format exchanged with the audio HAL.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct A2dpAudioConfig {
    pub sample_rate: u32,
    pub bits_per_sample: u8,
    pub channel_mode: A2dpChannelMode,
}

/// Reports whether the audio gateway has a call in progress.
pub trait CallStateOracle {
    fn is_call_idle(&self) -> bool;
}

/// The A2DP stream state machine.
pub trait AvStream {
    fn stream_ready(&self) -> bool;
    fn stream_started_ready(&self) -> bool;
    /// Whether the remote device is the audio source, making the local side a sink.
    fn peer_is_source(&self) -> bool;
    /// Whether the local source is already feeding audio to the stream.
    fn source_is_streaming(&self) -> bool;
    fn stream_start(&mut self);
    fn stream_suspend(&mut self);
    fn stream_stop(&mut self);
    fn clear_remote_suspend_flag(&mut self);
}

/// Session with the audio HAL.
pub trait AudioHalClient {
    fn start_session(&mut self) -> bool;
    fn end_session(&mut self);
    fn stream_started(&mut self, ack: A2dpCtrlAck);
    fn stream_suspended(&mut self, ack: A2dpCtrlAck);
    /// Fills `buf` with PCM data, returning the number of bytes written.
    fn read_audio_data(&mut self, buf: &mut [u8]) -> usize;
    fn update_audio_config(&mut self, config: &A2dpAudioConfig) -> bool;
}

/// Operations posted to the dispatch task.
#[derive(Debug, PartialEq)]
pub enum A2dpActions {
    StopRequest,
    AckStreamStarted(A2dpCtrlAck),
    AckStreamSuspended(A2dpCtrlAck),
    StartSession,
    EndSession,
}

pub struct A2dpTransportArbiter {
    pending_cmd: A2dpCtrlCmd,
    session_started: bool,
    av: Box<dyn AvStream + Send>,
    hal: Box<dyn AudioHalClient + Send>,
}

impl A2dpTransportArbiter {
    pub fn new(av: Box<dyn AvStream + Send>, hal: Box<dyn AudioHalClient + Send>) -> Self {
        Self { pending_cmd: A2dpCtrlCmd::None, session_started: false, av, hal }
    }

    pub fn pending_cmd(&self) -> A2dpCtrlCmd {
        self.pending_cmd
    }

    pub fn is_session_started(&self) -> bool {
        self.session_started
    }

    pub(crate) fn handle_action(&mut self, action: A2dpActions) {
        match action {
            A2dpActions::StopRequest => self.stop_request(),
            A2dpActions::AckStreamStarted(ack) => self.ack_stream_started(ack),
            A2dpActions::AckStreamSuspended(ack) => self.ack_stream_suspended(ack),
            A2dpActions::StartSession => {
                self.start_session();
            }
            A2dpActions::EndSession => self.end_session(),
        }
    }

    fn reset_pending(&mut self) {
        self.pending_cmd = A2dpCtrlCmd::None;
    }

    /// Handles a start request from the audio HAL.
    pub fn start_request(&mut self, calls: &dyn CallStateOracle) -> A2dpCtrlAck {
        match self.pending_cmd {
            A2dpCtrlCmd::Start => {
                info!("A2DP start request pending");
                return A2dpCtrlAck::Pending;
            }
            A2dpCtrlCmd::None => {}
            other => {
                warn!("A2DP start request while {:?} is pending", other);
                return A2dpCtrlAck::Busy;
            }
        }

        if !calls.is_call_idle() {
            warn!("A2DP start request during a call");
            return A2dpCtrlAck::IncallFailure;
        }

        if self.av.source_is_streaming() {
            warn!("A2DP start request while the source is streaming");
            return A2dpCtrlAck::Failure;
        }

        if self.av.stream_started_ready() {
            debug!("A2DP stream already started");
            return A2dpCtrlAck::Success;
        }

        if self.av.stream_ready() {
            self.pending_cmd = A2dpCtrlCmd::Start;
            self.av.stream_start();

            // A sink has nothing to wait for: the remote source starts streaming on its own.
            if self.av.peer_is_source() {
                self.reset_pending();
                return A2dpCtrlAck::Success;
            }
            return A2dpCtrlAck::Pending;
        }

        warn!("A2DP start request while the stream is not ready");
        A2dpCtrlAck::Failure
    }

    /// Handles a suspend request from the audio HAL.
    pub fn suspend_request(&mut self) -> A2dpCtrlAck {
        match self.pending_cmd {
            A2dpCtrlCmd::Suspend => {
                info!("A2DP suspend request pending");
                return A2dpCtrlAck::Pending;
            }
            A2dpCtrlCmd::None => {}
            other => {
                warn!("A2DP suspend request while {:?} is pending", other);
                return A2dpCtrlAck::Busy;
            }
        }

        if self.av.stream_started_ready() {
            self.pending_cmd = A2dpCtrlCmd::Suspend;
            self.av.stream_suspend();
            return A2dpCtrlAck::Pending;
        }

        // Already suspended; a later start must not be held back by a remote suspend.
        self.av.clear_remote_suspend_flag();
        A2dpCtrlAck::Success
    }

    /// Handles a stop request from the audio HAL. There is no ack to report.
    pub fn stop_request(&mut self) {
        if !self.av.peer_is_source() && !self.av.stream_started_ready() {
            debug!("A2DP stop request while not streaming");
            return;
        }
        self.pending_cmd = A2dpCtrlCmd::Stop;
        self.av.stream_stop();
    }

    /// Forwards the AV stream's answer to a start command.
    pub fn ack_stream_started(&mut self, ack: A2dpCtrlAck) {
        if self.pending_cmd != A2dpCtrlCmd::Start {
            warn!("A2DP start ack {:?} while {:?} is pending, dropped", ack, self.pending_cmd);
            return;
        }
        self.hal.stream_started(ack);
        if ack.is_terminal() {
            self.reset_pending();
        }
    }

    /// Forwards the AV stream's answer to a suspend or stop command.
    pub fn ack_stream_suspended(&mut self, ack: A2dpCtrlAck) {
        match self.pending_cmd {
            A2dpCtrlCmd::Suspend => self.hal.stream_suspended(ack),
            A2dpCtrlCmd::Stop => info!("A2DP stream stopped: {:?}", ack),
            other => {
                warn!("A2DP suspend ack {:?} while {:?} is pending, dropped", ack, other);
                return;
            }
        }
        if ack.is_terminal() {
            self.reset_pending();
        }
    }

    pub fn start_session(&mut self) -> bool {
        if self.session_started {
            debug!("A2DP session already started");
            return true;
        }
        self.session_started = self.hal.start_session();
        info!("A2DP session start: {}", self.session_started);
        self.session_started
    }

    pub fn end_session(&mut self) {
        self.hal.end_session();
        self.session_started = false;
        self.reset_pending();
    }

    pub fn read_audio_data(&mut self, buf: &mut [u8]) -> usize {
        self.hal.read_audio_data(buf)
    }

    pub fn update_audio_config(&mut self, config: &A2dpAudioConfig) -> bool {
        if !self.session_started {
            warn!("A2DP audio config update without a session");
            return false;
        }
        self.hal.update_audio_config(config)
    }
}
