//! Height-driven layout for the host-side frame container.
//!
//! `NotReady -> Ready` happens once per mounted guest: on the first applied
//! height, or when the grace period runs out. Heights are coalesced per window
//! and applied on the trailing edge only.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutPolicy {
    pub debounce: Duration,
    pub grace_period: Duration,
    pub placeholder_height: f64,
    /// Height used once the grace period reveals a guest that never reported one.
    pub reveal_height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    NotReady,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyCause {
    Height,
    GracePeriod,
}

/// What a [`LayoutController::poll`] changed
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutChange {
    Height(f64),
    Ready(ReadyCause),
}

#[derive(Debug, Clone, Copy)]
struct PendingHeight {
    value: f64,
    apply_at: Instant,
}

#[derive(Debug, Clone)]
pub struct LayoutController {
    policy: LayoutPolicy,
    readiness: Readiness,
    height: Option<f64>,
    pending: Option<PendingHeight>,
    grace_deadline: Instant,
}

impl LayoutController {
    pub fn new(policy: LayoutPolicy, mounted_at: Instant) -> Self {
        let grace_deadline = mounted_at + policy.grace_period;
        Self {
            policy,
            readiness: Readiness::NotReady,
            height: None,
            pending: None,
            grace_deadline,
        }
    }

    /// Queue an accepted height. The first value opens a window; later values
    /// inside it only replace the pending value.
    pub fn offer(&mut self, height: f64, now: Instant) {
        match self.pending.as_mut() {
            Some(pending) => pending.value = height,
            None => {
                self.pending = Some(PendingHeight {
                    value: height,
                    apply_at: now + self.policy.debounce,
                })
            }
        }
    }

    /// Fire whatever timers are due at `now`.
    pub fn poll(&mut self, now: Instant) -> Vec<LayoutChange> {
        let mut changes = Vec::new();

        if let Some(pending) = self.pending {
            if pending.apply_at <= now {
                self.pending = None;
                if self.height != Some(pending.value) {
                    self.height = Some(pending.value);
                    changes.push(LayoutChange::Height(pending.value));
                }
                if self.readiness == Readiness::NotReady {
                    self.readiness = Readiness::Ready;
                    changes.push(LayoutChange::Ready(ReadyCause::Height));
                }
            }
        }

        if self.readiness == Readiness::NotReady && self.grace_deadline <= now {
            self.readiness = Readiness::Ready;
            changes.push(LayoutChange::Ready(ReadyCause::GracePeriod));
        }

        changes
    }

    /// Earliest instant at which [`poll`](Self::poll) has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        let grace = (self.readiness == Readiness::NotReady).then_some(self.grace_deadline);
        match (self.pending.map(|p| p.apply_at), grace) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Start over for a freshly mounted guest.
    pub fn remount(&mut self, now: Instant) {
        *self = Self::new(self.policy.clone(), now);
    }

    pub fn readiness(&self) -> Readiness {
        self.readiness
    }

    pub fn is_ready(&self) -> bool {
        self.readiness == Readiness::Ready
    }

    /// Last applied height, if any.
    pub fn height(&self) -> Option<f64> {
        self.height
    }

    /// Height the container should render at right now.
    pub fn rendered_height(&self) -> f64 {
        match (self.readiness, self.height) {
            (Readiness::Ready, Some(h)) => h,
            (Readiness::Ready, None) => self.policy.reveal_height,
            (Readiness::NotReady, _) => self.policy.placeholder_height,
        }
    }
}
