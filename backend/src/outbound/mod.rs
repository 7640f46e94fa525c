//! Outbound adapters implementing domain ports for local infrastructure.
//!
//! - **storage**: session persistence mirrors (in-memory and file-backed)
//! - **directory**: the known principal set, seeded from a JSON fixture
//!
//! Adapters are thin translators that convert between domain types and
//! their stored representations. They contain no session logic.

pub mod directory;
pub mod storage;
