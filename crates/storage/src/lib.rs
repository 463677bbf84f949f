//! SQLite-backed site storage for blockgate.
//!
//! [`SiteStore`] keeps everything the locking manager and the setup job
//! need from a site in one database:
//!
//! - the category tree and the containers (courses) inside it
//! - installed module types and their instances
//! - widget (block) types, default widgets and placed widget instances
//! - the region and block locking rules
//!
//! It implements the host collaborator traits from the `host` crate, so it
//! can be handed directly to [`policy::LockingManager`] and to the setup
//! processor.
//!
//! # Example
//!
//! ```no_run
//! use host::FixedAuthorizer;
//! use policy::{LockingManager, RegionRule};
//! use storage::SiteStore;
//!
//! let store = SiteStore::open("site.db")?;
//! let science = store.add_category("Science", None)?;
//! store.create_region_rule(&RegionRule::new("side-pre", vec![science.id]))?;
//!
//! let locking = LockingManager::new(
//!     Some(&science),
//!     store.load_rules()?,
//!     &store,
//!     FixedAuthorizer::restricted(),
//! )?;
//! assert!(!locking.can_move("search_forums", "side-pre"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod rules;
mod site;
mod store;

pub use error::{Error, Result};
pub use rules::{RuleId, RuleKind, RuleRecord};
pub use store::{SiteStore, LOCKING_WIDGET_MANAGER, WIDGET_MANAGER_SETTING};
