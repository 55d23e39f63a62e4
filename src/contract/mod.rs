//! Contract checks for the Books API backend.
//!
//! Includes:
//! - `checks`: check definitions, the smoke suite and pure evaluation.
//! - `runner`: sequential execution against a live backend.
//! - `lifecycle`: the authenticated create/read/update/delete walk.
//! - `live_test`: the same contract against a real backend (feature `integration-tests`).

mod checks;
mod lifecycle;
mod runner;

pub use checks::*;
pub use lifecycle::*;
pub use runner::*;
