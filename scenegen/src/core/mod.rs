//! Deterministic, pure logic shared by the generator.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! strings and values and return deterministic outputs suitable for tests.

pub mod cleaner;
pub mod types;
