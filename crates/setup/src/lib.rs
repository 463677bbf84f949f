//! Bulk block setup.
//!
//! Administrators describe block placements as text, one item per line:
//!
//! ```text
//! side-pre||3,7||search_forums||-10||1||0||||0||0||0||course-view-*
//! ```
//!
//! [`SetupItem::parse`] validates a line and expands its categories to all
//! descendants. [`SetupItemProcessor`] then applies the item to every
//! course filed under those categories (or to every module page of a
//! course when the page type pattern starts with `mod-<type>-`), adding,
//! moving or updating block instances through the host's widget manager.
//! [`SetupJob`] ties the two together for a whole submission.
//!
//! # Example
//!
//! ```no_run
//! use host::TracingLogger;
//! use setup::SetupJob;
//! use storage::SiteStore;
//!
//! let store = SiteStore::open("site.db")?;
//! let report = SetupJob::new(&store, TracingLogger).run("side-pre||1||search_forums||-10")?;
//! println!("{} items applied, {} rejected", report.processed, report.invalid);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod item;
mod job;
mod processor;
pub mod schema;

pub use error::{Error, InvalidSetupItem, Result};
pub use item::{ItemMode, SetupItem, DATA_DELIMITER, PAGE_TYPE_PATTERN_DEFAULT};
pub use job::{parse_batch, Batch, BatchReport, InvalidLine, SetupJob};
pub use processor::SetupItemProcessor;
