//! Topic-to-animation generator.
//!
//! Turns a free-text topic into Manim scene code by asking a hosted chat
//! model, strips the conversational noise from the answer, writes the code to
//! a scene file and renders it. The architecture enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (response cleaning, shared types).
//!   No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (HTTP completion, config files,
//!   process execution). Behind traits so tests can script them.
//!
//! [`generate`] sequences core logic with I/O to implement `scenegen generate`.

pub mod core;
pub mod exit_codes;
pub mod generate;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
