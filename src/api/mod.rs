//! Provides the HTTP client for the Books API backend.
//!
//! Includes:
//! - `books`: `BooksClient`, raw and typed access to every backend route.

mod books;

pub use books::*;
