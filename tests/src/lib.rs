//! # Wallet Mediator Test Suite
//!
//! End-to-end flows through a fully wired [`mediator_runtime::Mediator`].
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/
//! │   └── dispatch_benchmarks.rs   # Pipeline and cache throughput
//! └── src/
//!     ├── harness.rs               # Wire-level client for a mediator
//!     └── integration/
//!         ├── pipeline.rs          # Step ordering and short-circuits
//!         ├── consent.rs           # Parked calls, approve / reject
//!         ├── wallet.rs            # Vaults, networks, builtin protection
//!         └── wire.rs              # JSON envelope and property tests
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p wm-tests
//! cargo test -p wm-tests integration::consent::
//! cargo bench -p wm-tests
//! ```

pub mod harness;
pub mod integration;
