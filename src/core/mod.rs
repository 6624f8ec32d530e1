// Public modules
pub mod deploy;
pub mod error;
pub mod project;
pub mod runner;
pub mod scm;
pub mod service;
pub mod template;
pub mod transfer;

// Internal modules - not part of public API
pub(crate) mod config;
pub(crate) mod local_files;
pub(crate) mod paths;

// Re-export common types for convenience
pub use error::{Error, ErrorCode, Result};
