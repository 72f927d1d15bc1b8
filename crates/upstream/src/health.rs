use std::sync::RwLock;

/// Number of consecutive successful probes required before an upstream is
/// considered healthy.
pub const REQUIRED_SUCCESSFUL_PROBES: u32 = 2;

/// Health probe interval per upstream.
pub const PROBE_INTERVAL_SECONDS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    Unknown,
    Healthy,
    Syncing,
    Failed,
}

#[derive(Debug)]
struct StatusInner {
    health: Health,
    consecutive_successes: u32,
    head_slot: u64,
}

/// Snapshot of an upstream's last observed health classification.
#[derive(Debug)]
pub struct Status {
    inner: RwLock<StatusInner>,
}

impl Status {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StatusInner {
                health: Health::Unknown,
                consecutive_successes: 0,
                head_slot: 0,
            }),
        }
    }

    pub fn health(&self) -> Health {
        self.inner.read().expect("status lock poisoned").health
    }

    pub fn healthy(&self) -> bool {
        matches!(self.health(), Health::Healthy | Health::Syncing)
    }

    pub fn syncing(&self) -> bool {
        self.health() == Health::Syncing
    }

    pub fn head_slot(&self) -> u64 {
        self.inner.read().expect("status lock poisoned").head_slot
    }

    /// Records a successful probe. The upstream only turns healthy after
    /// `REQUIRED_SUCCESSFUL_PROBES` successes in a row.
    pub fn observe_success(&self, is_syncing: bool, head_slot: u64) {
        let mut inner = self.inner.write().expect("status lock poisoned");

        inner.consecutive_successes = inner
            .consecutive_successes
            .saturating_add(1)
            .min(REQUIRED_SUCCESSFUL_PROBES);
        inner.head_slot = head_slot;

        if inner.consecutive_successes < REQUIRED_SUCCESSFUL_PROBES {
            return;
        }

        inner.health = if is_syncing {
            Health::Syncing
        } else {
            Health::Healthy
        };
    }

    pub fn observe_failure(&self) {
        let mut inner = self.inner.write().expect("status lock poisoned");

        inner.consecutive_successes = 0;
        inner.health = Health::Failed;
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::new()
    }
}
