// Unquirk Core Library
//
// Provides rule-driven dialect translation with per-line profile detection.
// Main interface for translating stylized "quirked" text back to plain text.

pub mod types;
pub mod storage;
pub mod loader;
pub mod engine;
pub mod postprocess;
pub mod detector;
pub mod processor;

// Re-export main types and functions for easy use
pub use types::*;
pub use storage::{FileStore, MemoryStore, ProfileStore};
pub use loader::{ProfileError, ProfileLoader, ValidationIssue};
pub use engine::SubstitutionEngine;
pub use postprocess::{PostProcessor, PostStep};
pub use detector::ProfileDetector;
pub use processor::Translator;
