//! Per-panel tuning: refresh policy and busy-wait budgets
//!
//! Every panel module exports a `PROFILE` constant. Drivers can be built with a
//! different one through `with_profile` when a specific glass needs other timings.

use core::fmt::{Display, Formatter};

/// The operation a busy-wait belongs to. Each one has its own timeout budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BusyOp {
    /// Reset and register init
    Init,
    /// Analog/clock power-on sequence
    PowerOn,
    /// Power-down sequence
    PowerOff,
    /// Full refresh with the full waveform
    FullRefresh,
    /// Partial refresh, LUT upload included
    PartialRefresh,
}

impl Display for BusyOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            BusyOp::Init => "init",
            BusyOp::PowerOn => "power on",
            BusyOp::PowerOff => "power off",
            BusyOp::FullRefresh => "full refresh",
            BusyOp::PartialRefresh => "partial refresh",
        };
        f.write_str(name)
    }
}

/// Maximum time in ms the BUSY line may stay asserted per operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusyTimeouts {
    pub init_ms: u32,
    pub power_on_ms: u32,
    pub power_off_ms: u32,
    pub full_refresh_ms: u32,
    pub partial_refresh_ms: u32,
}

impl BusyTimeouts {
    /// Budget for `op`
    pub const fn for_op(&self, op: BusyOp) -> u32 {
        match op {
            BusyOp::Init => self.init_ms,
            BusyOp::PowerOn => self.power_on_ms,
            BusyOp::PowerOff => self.power_off_ms,
            BusyOp::FullRefresh => self.full_refresh_ms,
            BusyOp::PartialRefresh => self.partial_refresh_ms,
        }
    }
}

/// Static description of how a panel family should be driven
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelProfile {
    /// Number of partial refreshes tolerated before a full refresh is forced
    pub full_refresh_interval: u32,
    /// Whether the controller offers a faster full-refresh waveform
    pub fast_full_update: bool,
    pub busy_timeouts: BusyTimeouts,
}
