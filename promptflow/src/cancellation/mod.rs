//! Cooperative cancellation for pipeline runs.
//!
//! The relay owns one [`CancellationToken`] per run and cancels it when the
//! client disconnects or the run fails; the run observes it between stages
//! and while a stage is in flight.

mod token;

pub use token::CancellationToken;
