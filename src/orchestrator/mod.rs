//! Multi-project orchestration
//!
//! Turns discovered projects into backend lifecycle calls.

pub mod options;
pub mod up;

pub use options::{translate, LifecycleOptions, UpFlags};
pub use up::{FailurePolicy, ProjectFailure, ProjectState, UpOrchestrator, UpReport};
