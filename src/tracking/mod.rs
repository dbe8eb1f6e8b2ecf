//! Tracking system: which project paths get pushed to the sandbox.
//!
//! # Architecture
//!
//! - [`crate::tracking::TrackedList`] - The persisted list of tracked paths
//! - [`crate::tracking::ExcludePatterns`] - Patterns never eligible for tracking
//! - [`crate::tracking::TrackedScanner`] - Expands tracked directories into files
//!
//! # Usage
//!
//! ```no_run
//! use vmsync::tracking::{ExcludePatterns, TrackedList};
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let root = Path::new("/home/user/project");
//! let mut list = TrackedList::load(&root.join(".vmsync/tracked_files"))?;
//! list.add("src".into());
//! list.normalize(root, &ExcludePatterns::parse(".git target"));
//! list.save(&root.join(".vmsync/tracked_files"))?;
//! # Ok(())
//! # }
//! ```

pub mod manifest;
pub mod patterns;
pub mod scanner;

pub use manifest::{NormalizeReport, TrackedList};
pub use patterns::ExcludePatterns;
pub use scanner::TrackedScanner;
