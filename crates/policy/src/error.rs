//! Policy error types.

use crate::Action;
use thiserror::Error;

/// Policy errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// An action name outside the known set was requested.
    ///
    /// This is a defect in the caller, not a denial.
    #[error("invalid action {0}")]
    UnknownAction(String),

    /// A rule was submitted without a region.
    #[error("region is required")]
    EmptyRegion,

    /// A block rule was submitted without a block name.
    #[error("block name is required")]
    EmptyBlock,

    /// A rule with the same scope already exists.
    #[error("a rule with the same region, block and categories already exists")]
    DuplicateRule,

    /// An "all regions" rule collides with a specific-region rule.
    #[error("cannot use all regions: a rule for a specific region exists for this block and categories")]
    CannotUseAllRegions,

    /// A specific-region rule collides with an "all regions" rule.
    #[error("cannot use a specific region: an all regions rule exists for this block and categories")]
    CannotUseSpecificRegion,

    /// The action has no flag on this kind of rule.
    #[error("block rules have no {0} flag")]
    NotApplicable(Action),

    /// Failed to parse a rule file.
    #[error("failed to parse rules: {0}")]
    Parse(String),

    /// An I/O error occurred while reading rules.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The category store failed while expanding rule categories.
    #[error(transparent)]
    Host(#[from] host::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
