//! Turns telephony call state snapshots into AT results.
//!
//! Telephony reports the full call state (active calls, held calls, call setup) after every
//! change. The hands-free unit instead expects incremental results and `+CIEV` indicators, so each
//! snapshot is compared against the previous one stored for the link.

use crate::btif::BtStatus;
use crate::headset::at::{AgIndicator, AgResult, AudioHandle};
use crate::headset::caller_id;
use crate::headset::hfp::{BthfCallState, BTHF_CALL_ADDRTYPE_UNKNOWN};
use log::{debug, error};

/// Call counters tracked per link.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallState {
    pub num_active: u32,
    pub num_held: u32,
    pub call_setup_state: BthfCallState,
}

impl Default for CallState {
    fn default() -> Self {
        Self { num_active: 0, num_held: 0, call_setup_state: BthfCallState::Idle }
    }
}

impl CallState {
    pub fn new(num_active: u32, num_held: u32, call_setup_state: BthfCallState) -> Self {
        Self { num_active, num_held, call_setup_state }
    }

    /// No call in progress and none being set up.
    pub fn is_idle(&self) -> bool {
        self.call_setup_state == BthfCallState::Idle && self.num_active == 0 && self.num_held == 0
    }
}

/// A snapshot reported by telephony.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhoneState {
    pub num_active: u32,
    pub num_held: u32,
    pub call_setup_state: BthfCallState,
    /// Number of the call being set up. `None` sends no caller id; an empty number still does.
    pub number: Option<String>,
    pub call_type: u16,
    pub name: Option<String>,
}

impl PhoneState {
    pub fn new(num_active: u32, num_held: u32, call_setup_state: BthfCallState) -> Self {
        Self {
            num_active,
            num_held,
            call_setup_state,
            number: None,
            call_type: BTHF_CALL_ADDRTYPE_UNKNOWN,
            name: None,
        }
    }

    pub fn with_caller(mut self, number: &str, call_type: u16, name: Option<&str>) -> Self {
        self.number = Some(number.to_string());
        self.call_type = call_type;
        self.name = name.map(|n| n.to_string());
        self
    }

    pub fn call_state(&self) -> CallState {
        CallState::new(self.num_active, self.num_held, self.call_setup_state)
    }
}

/// The link a snapshot is reconciled for.
#[derive(Clone, Copy, Debug)]
pub struct ReconcileContext {
    pub handle: u16,
    /// Whether the link belongs to the active device, which is the only one that gets audio.
    pub is_active_device: bool,
}

impl ReconcileContext {
    fn route_audio(&self) -> AudioHandle {
        if self.is_active_device {
            AudioHandle::Route(self.handle)
        } else {
            AudioHandle::NoChange
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reconciliation {
    pub results: Vec<AgResult>,
    pub status: BtStatus,
    /// The call state to store for the link.
    pub updated: CallState,
}

/// Computes the results that move the hands-free unit from `prev` to `next`.
pub fn reconcile(prev: &CallState, next: &PhoneState, ctx: &ReconcileContext) -> Reconciliation {
    let mut results = Vec::new();
    let mut status = BtStatus::Success;
    let updated = next.call_state();
    let (num_active, num_held) = (next.num_active, next.num_held);
    let num_calls = num_active.saturating_add(num_held);
    let prev_calls = prev.num_active.saturating_add(prev.num_held);

    debug!(
        "[{}]: {}A {}H {:?} -> {}A {}H {:?}",
        ctx.handle,
        prev.num_active,
        prev.num_held,
        prev.call_setup_state,
        num_active,
        num_held,
        next.call_setup_state
    );

    if updated.is_idle() {
        results.push(AgResult::EndCall);
        if prev.num_held > 0 {
            results.push(AgResult::call_held(0));
        }
        return Reconciliation { results, status, updated };
    }

    // Calls appeared without any call setup being reported first.
    let mut active_call_updated = false;
    if num_calls > 0 && prev.is_idle() {
        let audio_handle = AudioHandle::NoChange;
        if next.call_setup_state != BthfCallState::Idle {
            results.push(AgResult::MultiCall { audio_handle });
        } else {
            results.push(AgResult::OutgoingCallConnected { audio_handle });
        }
        active_call_updated = true;
    }

    if next.call_setup_state != prev.call_setup_state {
        match next.call_setup_state {
            BthfCallState::Idle => match prev.call_setup_state {
                BthfCallState::Incoming => {
                    if num_active > prev.num_active {
                        results.push(AgResult::IncomingCallConnected {
                            audio_handle: ctx.route_audio(),
                        });
                    } else if num_held > prev.num_held {
                        results.push(AgResult::IncomingCallHeld);
                    } else {
                        results.push(AgResult::CallCancel);
                    }
                }
                BthfCallState::Dialing | BthfCallState::Alerting => {
                    if num_active > prev.num_active {
                        results.push(AgResult::OutgoingCallConnected {
                            audio_handle: AudioHandle::NoChange,
                        });
                    } else {
                        results.push(AgResult::CallCancel);
                    }
                }
                other => {
                    error!("[{}]: Unexpected transition from {:?} to Idle", ctx.handle, other);
                    status = BtStatus::ParmInvalid;
                }
            },
            BthfCallState::Incoming => {
                let caller_id = next.number.as_deref().map(|number| {
                    caller_id::format(number, next.call_type, next.name.as_deref(), num_calls > 0)
                });
                if num_calls > 0 {
                    results.push(AgResult::CallWaiting { caller_id });
                } else {
                    results.push(AgResult::IncomingCall {
                        audio_handle: ctx.route_audio(),
                        caller_id,
                    });
                }
            }
            BthfCallState::Dialing => {
                let audio_handle =
                    if num_calls == 0 { ctx.route_audio() } else { AudioHandle::NoChange };
                results.push(AgResult::OutgoingCallOrig { audio_handle });
            }
            BthfCallState::Alerting => {
                let audio_handle =
                    if prev.call_setup_state == BthfCallState::Idle && num_calls == 0 {
                        ctx.route_audio()
                    } else {
                        AudioHandle::NoChange
                    };
                results.push(AgResult::OutgoingCallAlert { audio_handle });
            }
            other => {
                error!("[{}]: Unexpected call setup state {:?}", ctx.handle, other);
                status = BtStatus::ParmInvalid;
            }
        }

        // The call indicator was already updated with the setup result.
        if next.call_setup_state == BthfCallState::Idle {
            if num_held > 0 && num_active > 0 {
                results.push(AgResult::call_held(1));
            }
            return Reconciliation { results, status, updated };
        }
    }

    if !active_call_updated && num_calls != prev_calls {
        results.push(AgResult::Indicator(AgIndicator::Call, (num_calls > 0) as u16));
    }

    let held_total = num_held.saturating_add(prev.num_held);
    if num_held != prev.num_held || (num_active == 0 && held_total > 1) {
        let value = match (num_held, num_active) {
            (0, _) => 0,
            (_, 0) => 2,
            _ => 1,
        };
        results.push(AgResult::call_held(value));
    }

    // Active and held calls swapped places.
    if next.call_setup_state == prev.call_setup_state
        && num_active > 0
        && num_held > 0
        && num_active == prev.num_active
        && num_held == prev.num_held
    {
        results.push(AgResult::call_held(1));
    }

    // A held call ended while the active one stays; some units only resync on a call update.
    if prev.num_active == num_active
        && num_active != 0
        && prev.num_held != num_held
        && num_held == 0
    {
        let value = u16::try_from(num_active).unwrap_or(u16::MAX);
        results.push(AgResult::IndicatorOnDemand(AgIndicator::Call, value));
    }

    Reconciliation { results, status, updated }
}
