//! Admission control subsystem.
//!
//! # Data Flow
//! ```text
//! Caller tick:
//!     → file.rs (lock shared state file)
//!     → window.rs (fixed-window admit on the decoded state)
//!     → file.rs (persist + fsync if admitted, unlock)
//!
//! Callee request:
//!     → memory.rs (in-process mutex)
//!     → window.rs (same admit transition)
//! ```
//!
//! # Design Decisions
//! - One pure state transition shared by both layers
//! - The two layers never share state
//! - Every failure inside a controller denies (fail-closed)
//! - Time comes from a `Clock` so window arithmetic is testable

pub mod clock;
pub mod file;
pub mod memory;
pub mod window;

pub use clock::{Clock, ManualClock, SystemClock};
pub use file::LocalAdmissionController;
pub use memory::RemoteAdmissionController;
pub use window::{RateLimiterConfig, WindowCounter, WindowState, STATE_LEN};

/// A component that decides whether one unit of work may proceed now.
///
/// Implementations never fail loudly: any internal error is reported as a denial.
pub trait AdmissionController: Send + Sync {
    /// Try to take one slot in the current window.
    fn try_acquire(&self) -> bool;
}
