//! Rate limiting subsystem.
//!
//! # Data Flow
//! ```text
//! ClientKey + RoutePolicy
//!     → limiter.rs (key = scope:client, fixed window)
//!     → store.rs (atomic reset-or-increment)
//!     → Decision (admitted, limit, remaining, reset_at, retry_after)
//!
//! Background:
//!     sweeper.rs → store.rs (drop expired windows)
//! ```
//!
//! # Design Decisions
//! - Fixed windows: O(1) state per key, bounded memory
//! - Never fails; callers map rejections to 429
//! - Clock and store are injected, state is per process

pub mod clock;
pub mod limiter;
pub mod store;
pub mod sweeper;

pub use clock::{Clock, ManualClock, SystemClock};
pub use limiter::{Decision, WindowRateLimiter};
pub use store::{MemoryWindowStore, RateLimitEntry, WindowStore};
pub use sweeper::spawn_sweeper;
