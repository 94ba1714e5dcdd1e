//! # Hyperion Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── harness.rs        # Service wired over the in-memory adapters
//! └── integration/      # End-to-end bridge flows
//! tests/benches/        # Criterion benchmarks
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p hyperion-tests
//! cargo test -p hyperion-tests integration::
//!
//! # Benchmarks
//! cargo bench -p hyperion-tests
//! ```

pub mod harness;
pub mod integration;
