//! The breaker state machine.
//!
//! State lives behind a mutex held only across counter updates; an atomic
//! mirror allows lock-free state inspection. The breaker gates entry only —
//! it never cancels a call already in flight.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::config::BreakerConfig;
use crate::events::BreakerEvent;
#[cfg(feature = "metrics")]
use metrics::counter;

/// The three breaker states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CircuitState {
    /// Calls flow; consecutive failures are counted.
    Closed = 0,
    /// Calls are rejected until the open timeout elapses.
    Open = 1,
    /// A bounded number of probes test recovery.
    HalfOpen = 2,
}

impl CircuitState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => CircuitState::Open,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Closed,
        }
    }
}

/// Outcome of asking the breaker for admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Admission {
    /// Admitted through a closed circuit.
    Allowed,
    /// Admitted as a half-open probe; the slot must be released.
    Probe,
    /// Rejected; the circuit is open or probe slots are exhausted.
    Rejected,
}

struct Circuit {
    state: CircuitState,
    consecutive_failures: u32,
    /// Probe successes since entering half-open.
    probe_successes: u32,
    /// Probes currently in flight.
    probes_in_flight: u32,
    /// Stamped on the failure that opened the circuit.
    opened_at: Option<Instant>,
}

/// Shared breaker state: one instance per middleware, shared by every call
/// through it. Protecting a specific backend means placing one breaker per
/// backend.
#[derive(Clone)]
pub(crate) struct SharedCircuit {
    inner: Arc<Mutex<Circuit>>,
    state_mirror: Arc<AtomicU8>,
}

impl SharedCircuit {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Circuit {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                probe_successes: 0,
                probes_in_flight: 0,
                opened_at: None,
            })),
            state_mirror: Arc::new(AtomicU8::new(CircuitState::Closed as u8)),
        }
    }

    /// Lock-free view of the current state.
    pub(crate) fn state(&self) -> CircuitState {
        CircuitState::from_u8(self.state_mirror.load(Ordering::Acquire))
    }

    pub(crate) fn try_acquire(&self, config: &BreakerConfig) -> Admission {
        let mut circuit = self.inner.lock().unwrap();
        match circuit.state {
            CircuitState::Closed => Admission::Allowed,
            CircuitState::Open => {
                let expired = circuit
                    .opened_at
                    .map(|at| at.elapsed() >= config.open_timeout)
                    .unwrap_or(true);
                if expired {
                    self.transition(&mut circuit, CircuitState::HalfOpen, config);
                    circuit.probes_in_flight = 1;
                    config.event_listeners.emit(&BreakerEvent::ProbeAdmitted {
                        component: config.name.clone(),
                        timestamp: Instant::now(),
                    });
                    Admission::Probe
                } else {
                    self.emit_rejected(config);
                    Admission::Rejected
                }
            }
            CircuitState::HalfOpen => {
                if circuit.probes_in_flight < config.half_open_max_probes {
                    circuit.probes_in_flight += 1;
                    config.event_listeners.emit(&BreakerEvent::ProbeAdmitted {
                        component: config.name.clone(),
                        timestamp: Instant::now(),
                    });
                    Admission::Probe
                } else {
                    self.emit_rejected(config);
                    Admission::Rejected
                }
            }
        }
    }

    pub(crate) fn record_success(&self, probe: bool, config: &BreakerConfig) {
        let mut circuit = self.inner.lock().unwrap();
        if probe {
            circuit.probes_in_flight = circuit.probes_in_flight.saturating_sub(1);
        }
        config.event_listeners.emit(&BreakerEvent::SuccessRecorded {
            component: config.name.clone(),
            timestamp: Instant::now(),
            state: circuit.state,
        });
        match circuit.state {
            CircuitState::Closed => {
                circuit.consecutive_failures = 0;
            }
            CircuitState::HalfOpen => {
                circuit.probe_successes += 1;
                if circuit.probe_successes >= config.success_threshold() {
                    self.transition(&mut circuit, CircuitState::Closed, config);
                }
            }
            // A straggler from before the circuit opened; admission gating
            // already happened, nothing to update.
            CircuitState::Open => {}
        }
    }

    pub(crate) fn record_failure(&self, probe: bool, config: &BreakerConfig) {
        let mut circuit = self.inner.lock().unwrap();
        if probe {
            circuit.probes_in_flight = circuit.probes_in_flight.saturating_sub(1);
        }
        config.event_listeners.emit(&BreakerEvent::FailureRecorded {
            component: config.name.clone(),
            timestamp: Instant::now(),
            state: circuit.state,
        });
        match circuit.state {
            CircuitState::Closed => {
                circuit.consecutive_failures += 1;
                if circuit.consecutive_failures >= config.failure_threshold {
                    self.transition(&mut circuit, CircuitState::Open, config);
                    circuit.opened_at = Some(Instant::now());
                }
            }
            CircuitState::HalfOpen => {
                let previous = circuit.opened_at;
                self.transition(&mut circuit, CircuitState::Open, config);
                circuit.opened_at = if config.reset_timer_on_half_open_failure {
                    Some(Instant::now())
                } else {
                    previous
                };
            }
            CircuitState::Open => {}
        }
    }

    /// Releases a probe slot whose outcome was never recorded (the call
    /// future was dropped mid-flight).
    pub(crate) fn abandon_probe(&self) {
        let mut circuit = self.inner.lock().unwrap();
        circuit.probes_in_flight = circuit.probes_in_flight.saturating_sub(1);
    }

    fn transition(&self, circuit: &mut Circuit, to: CircuitState, config: &BreakerConfig) {
        if circuit.state == to {
            return;
        }
        let from = circuit.state;
        circuit.state = to;
        self.state_mirror.store(to as u8, Ordering::Release);
        circuit.consecutive_failures = 0;
        circuit.probe_successes = 0;
        if to != CircuitState::HalfOpen {
            circuit.probes_in_flight = 0;
        }
        if to == CircuitState::Closed {
            circuit.opened_at = None;
        }

        config.event_listeners.emit(&BreakerEvent::Transition {
            component: config.name.clone(),
            timestamp: Instant::now(),
            from,
            to,
        });

        #[cfg(feature = "tracing")]
        tracing::info!(breaker = %config.name, ?from, ?to, "circuit state transition");

        #[cfg(feature = "metrics")]
        counter!(
            "circuitbreaker_transitions_total",
            "circuitbreaker" => config.name.clone(),
            "to" => match to {
                CircuitState::Closed => "closed",
                CircuitState::Open => "open",
                CircuitState::HalfOpen => "half_open",
            }
        )
        .increment(1);
    }

    fn emit_rejected(&self, config: &BreakerConfig) {
        config.event_listeners.emit(&BreakerEvent::Rejected {
            component: config.name.clone(),
            timestamp: Instant::now(),
        });
        #[cfg(feature = "metrics")]
        counter!("circuitbreaker_rejections_total", "circuitbreaker" => config.name.clone())
            .increment(1);
    }
}
