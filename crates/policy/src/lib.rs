//! Block and region locking rules.
//!
//! Core principle: **a page in a locked category only allows the edit
//! actions its matching rule grants.**
//!
//! Two kinds of rule exist. A [`RegionRule`] locks every block in a region,
//! a [`BlockRule`] locks one block type in one region (or in all regions
//! via [`ALL_REGIONS`]) and takes precedence over region rules. Both list
//! the categories they apply to; a rule applies to those categories and
//! all of their descendants, see [`expand_categories`].
//!
//! # Example
//!
//! ```no_run
//! use host::{CategoryStore, FixedAuthorizer};
//! use policy::{LockingManager, RegionActions, RegionRule, RuleSet};
//!
//! # fn example(store: &impl CategoryStore) -> policy::Result<()> {
//! let rules = RuleSet::new()
//!     .with(RegionRule::new("side-pre", vec![1.into()]).with_actions(RegionActions::locked()));
//!
//! let category = store.category(2.into())?;
//! let locking = LockingManager::new(category.as_ref(), rules, store, FixedAuthorizer::restricted())?;
//! if !locking.can_move("search_forums", "side-pre") {
//!     println!("side-pre is locked here");
//! }
//! # Ok(())
//! # }
//! ```

mod action;
mod closure;
mod error;
mod locking;
mod rule;
mod ruleset;
mod validate;

pub use action::Action;
pub use closure::expand_categories;
pub use error::{Error, Result};
pub use locking::LockingManager;
pub use rule::{
    format_category_list, parse_category_list, same_categories, BlockActions, BlockRule,
    LockRule, RegionActions, RegionRule, RegionScope, Rule, ALL_REGIONS,
};
pub use ruleset::RuleSet;
pub use validate::{validate_block_rule, validate_region_rule};
