// Public modules
pub mod deploy;
pub mod error;
pub mod executor;
pub mod git;
pub mod host;
pub mod npm;
pub mod output;
pub mod project;
pub mod server;
pub mod ssh;

// Internal modules - not part of public API
pub(crate) mod config;
pub(crate) mod local_files;
pub mod paths;

// Re-export common types for convenience
pub use error::{Error, ErrorCode, Result};
