//! Activation gate: the window during which the transfer cache is used.
//!
//! The gate starts [`GateState::Active`] and moves to
//! [`GateState::Inactive`] exactly once, on whichever trigger comes first:
//! production mode being off, the application reporting stable, or the
//! host disposing of the render pass. It never reactivates.

use std::sync::OnceLock;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::config::TransferCacheConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Active,
    Inactive,
}

/// Which trigger closed the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeactivationReason {
    NotProductionMode,
    /// The application finished its initial render.
    Stable,
    /// The host called `dispose` on the interceptor.
    Disposed,
}

/// Host-side half of the stability channel.
#[derive(Debug)]
pub struct StabilityNotifier(watch::Sender<bool>);

impl StabilityNotifier {
    /// Reports that the application finished its initial render.
    pub fn mark_stable(&self) {
        self.0.send_replace(true);
    }
}

/// Gate-side half of the stability channel.
#[derive(Debug, Clone)]
pub struct StabilitySignal(watch::Receiver<bool>);

impl StabilitySignal {
    pub fn is_stable(&self) -> bool {
        *self.0.borrow()
    }
}

/// Creates a one-shot "application is stable" channel.
///
/// # Examples
///
/// ```
/// use rttp_handoff::cache::stability_channel;
///
/// let (notifier, signal) = stability_channel();
/// assert!(!signal.is_stable());
/// notifier.mark_stable();
/// assert!(signal.is_stable());
/// ```
pub fn stability_channel() -> (StabilityNotifier, StabilitySignal) {
    let (tx, rx) = watch::channel(false);
    (StabilityNotifier(tx), StabilitySignal(rx))
}

/// One-way `Active -> Inactive` switch.
///
/// # Examples
///
/// ```
/// use rttp_handoff::cache::{ActivationGate, DeactivationReason, GateState, stability_channel};
///
/// let (notifier, signal) = stability_channel();
/// let gate = ActivationGate::new();
/// gate.watch(signal);
/// assert_eq!(gate.state(), GateState::Active);
///
/// notifier.mark_stable();
/// assert_eq!(gate.state(), GateState::Inactive);
/// assert_eq!(gate.reason(), Some(DeactivationReason::Stable));
///
/// // First trigger wins; later ones are ignored.
/// assert!(!gate.deactivate(DeactivationReason::Disposed));
/// ```
#[derive(Debug, Default)]
pub struct ActivationGate {
    reason: OnceLock<DeactivationReason>,
    // Dropped as soon as it reports stable.
    signal: Mutex<Option<StabilitySignal>>,
}

impl ActivationGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a gate that closes immediately when production mode is off.
    pub fn from_config(config: &TransferCacheConfig) -> Self {
        let gate = Self::new();
        if !config.production_mode {
            gate.deactivate(DeactivationReason::NotProductionMode);
        }
        gate
    }

    /// Subscribes the gate to `signal`. Ignored once the gate is inactive.
    pub fn watch(&self, signal: StabilitySignal) {
        if self.reason.get().is_some() {
            return;
        }
        *self.signal.lock() = Some(signal);
    }

    /// Current state. Observes the stability signal, closing the gate and
    /// releasing the subscription if the application has become stable.
    pub fn state(&self) -> GateState {
        if self.reason.get().is_some() {
            return GateState::Inactive;
        }

        let mut signal = self.signal.lock();
        if signal.as_ref().is_some_and(StabilitySignal::is_stable) {
            signal.take();
            drop(signal);
            self.deactivate(DeactivationReason::Stable);
            return GateState::Inactive;
        }

        GateState::Active
    }

    pub fn is_active(&self) -> bool {
        self.state() == GateState::Active
    }

    pub fn reason(&self) -> Option<DeactivationReason> {
        self.reason.get().copied()
    }

    /// Closes the gate. Returns `true` only for the call that performed the
    /// transition.
    pub fn deactivate(&self, reason: DeactivationReason) -> bool {
        if self.reason.set(reason).is_err() {
            return false;
        }
        self.signal.lock().take();

        match reason {
            DeactivationReason::NotProductionMode => tracing::info!(
                "transfer cache is in development mode; enable production mode with server side rendering"
            ),
            _ => tracing::debug!(reason = ?reason, "transfer cache deactivated"),
        }
        true
    }
}
