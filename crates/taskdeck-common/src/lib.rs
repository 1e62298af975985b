//! Shared data types for the TaskDeck notification subsystem.
//!
//! Everything here is plain data: serde-serializable types passed between
//! the dispatcher, its delivery channels, and the API layer that triggers
//! notifications. No I/O lives in this crate.

pub mod types;
