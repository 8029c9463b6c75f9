//! Testing utilities
//!
//! Doubles for the collaborators a [`crate::history::HistoryStore`] is built with.

pub mod mocks;

pub use mocks::{FlakySnapshotStore, ManualClock, RecordingNotifier};
