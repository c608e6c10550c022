//! Integration test crate for the mesh map.
//!
//! This crate has no library code. It only contains tests that wire several
//! nodes together over in-process broadcast media and check the flood,
//! ledger and routing behaviour end to end.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p meshmap-integration-tests
//! ```
