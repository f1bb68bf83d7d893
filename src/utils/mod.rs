//! Utility Module
//!
//! - [`interner`]: global interner for render-pass names
//! - [`file_watcher`]: background directory watch feeding a shared change set
//!
//! ```rust,ignore
//! use ibl_baker::utils::interner;
//!
//! let a = interner::intern("opaque");
//! let b = interner::intern("opaque");
//! assert_eq!(a, b); // O(1) comparison
//! ```

pub mod file_watcher;
pub mod interner;

pub use file_watcher::{ChangeSet, FileWatcher};
pub use interner::Symbol;
