//! Small helpers shared by the feed and content modules.
//!
//! - **Text**: Unicode-aware width measurement and label truncation
//!
//! # Examples
//!
//! ```
//! use feedhub::util::{display_width, truncate_to_width};
//!
//! assert_eq!(display_width("Channel"), 7);
//! assert_eq!(truncate_to_width("A very long channel label", 10), "A very ...");
//! ```

mod text;

pub use text::{display_width, truncate_to_width};
