//! Full vs. partial refresh policy
//!
//! Partial refreshes are fast but leave residual ink behind. After
//! `full_refresh_interval` of them, or whenever someone asks for it,
//! the next refresh has to be a full one.

/// Counts partial refreshes and remembers pending full refresh requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshScheduler {
    full_refresh_interval: u32,
    partial_count: u32,
    force_full_pending: bool,
}

impl RefreshScheduler {
    /// Nothing pending, no partial refresh counted yet
    pub const fn new(full_refresh_interval: u32) -> Self {
        RefreshScheduler {
            full_refresh_interval,
            partial_count: 0,
            force_full_pending: false,
        }
    }

    /// Whether the next refresh must use the full waveform
    pub fn should_force_full(&self) -> bool {
        self.force_full_pending || self.partial_count >= self.full_refresh_interval
    }

    /// Forces the next refresh to be full, e.g. after a structural UI change
    pub fn request_full_refresh(&mut self) {
        self.force_full_pending = true;
    }

    pub fn record_partial(&mut self) {
        self.partial_count = self.partial_count.saturating_add(1);
    }

    pub fn record_full(&mut self) {
        self.partial_count = 0;
        self.force_full_pending = false;
    }

    pub fn partial_count(&self) -> u32 {
        self.partial_count
    }

    pub fn force_full_pending(&self) -> bool {
        self.force_full_pending
    }

    pub fn full_refresh_interval(&self) -> u32 {
        self.full_refresh_interval
    }

    pub fn set_full_refresh_interval(&mut self, interval: u32) {
        self.full_refresh_interval = interval;
    }
}
