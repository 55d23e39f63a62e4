//! Defines the data structures and models used throughout the application.
//!
//! These are the JSON shapes the Books API backend sends and accepts, plus the
//! raw response type the contract checks are evaluated against.

mod books;

pub use books::*;
