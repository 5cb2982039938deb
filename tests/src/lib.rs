//! # Ether-Bus Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/      # Multi-participant scenarios
//!     ├── end_to_end.rs
//!     └── resilience.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p ether-bus-tests
//! cargo test -p ether-bus-tests integration::resilience::
//! ```

#![allow(dead_code)]

pub mod integration;
