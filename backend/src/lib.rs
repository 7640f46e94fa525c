//! Local session management for the wellness clinic dashboard.
//!
//! The crate is laid out hexagonally: [`domain`] owns the session rules and
//! port traits, [`outbound`] provides storage and directory adapters, and
//! [`settings`] loads runtime configuration.

pub mod domain;
pub mod outbound;
pub mod settings;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
