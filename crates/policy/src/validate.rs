//! Uniqueness checks applied before a rule is stored.
//!
//! Names are compared without surrounding whitespace, matching how the
//! rules are stored.

use crate::rule::same_categories;
use crate::{BlockRule, Error, RegionRule, RegionScope, Result};

/// Check a region rule against the other stored region rules.
///
/// `others` must not include the record being updated.
pub fn validate_region_rule<'a>(
    candidate: &RegionRule,
    others: impl IntoIterator<Item = &'a RegionRule>,
) -> Result<()> {
    if candidate.region.trim().is_empty() {
        return Err(Error::EmptyRegion);
    }

    let duplicate = others.into_iter().any(|other| {
        other.region.trim() == candidate.region.trim()
            && same_categories(&other.categories, &candidate.categories)
    });
    if duplicate {
        return Err(Error::DuplicateRule);
    }
    Ok(())
}

/// Check a block rule against the other stored block rules.
///
/// An "all regions" rule and a specific-region rule cannot coexist for the
/// same block and categories.
pub fn validate_block_rule<'a>(
    candidate: &BlockRule,
    others: impl IntoIterator<Item = &'a BlockRule>,
) -> Result<()> {
    if matches!(&candidate.region, RegionScope::Named(name) if name.trim().is_empty()) {
        return Err(Error::EmptyRegion);
    }
    let candidate = candidate.normalized();
    if candidate.block.is_empty() {
        return Err(Error::EmptyBlock);
    }

    let same_target: Vec<&BlockRule> = others
        .into_iter()
        .filter(|other| {
            other.block.trim() == candidate.block
                && same_categories(&other.categories, &candidate.categories)
        })
        .collect();

    if same_target
        .iter()
        .any(|other| other.region.as_str().trim() == candidate.region.as_str())
    {
        return Err(Error::DuplicateRule);
    }

    match candidate.region {
        RegionScope::All if same_target.iter().any(|other| !other.region.is_all()) => {
            Err(Error::CannotUseAllRegions)
        }
        RegionScope::Named(_) if same_target.iter().any(|other| other.region.is_all()) => {
            Err(Error::CannotUseSpecificRegion)
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ALL_REGIONS;
    use host::CategoryId;

    fn cats(ids: &[i64]) -> Vec<CategoryId> {
        ids.iter().copied().map(CategoryId).collect()
    }

    #[test]
    fn region_rule_requires_region() {
        let rule = RegionRule::new("  ", cats(&[1]));
        assert!(matches!(validate_region_rule(&rule, []), Err(Error::EmptyRegion)));
    }

    #[test]
    fn padded_region_is_a_duplicate() {
        let existing = RegionRule::new("side-pre", cats(&[1]));
        let candidate = RegionRule::new("side-pre ", cats(&[1]));
        assert!(matches!(
            validate_region_rule(&candidate, [&existing]),
            Err(Error::DuplicateRule)
        ));
    }

    #[test]
    fn block_rule_requires_block_name() {
        let rule = BlockRule::new("side-pre", " ", cats(&[1]));
        assert!(matches!(validate_block_rule(&rule, []), Err(Error::EmptyBlock)));
    }

    #[test]
    fn padded_block_name_is_a_duplicate() {
        let existing = BlockRule::new("side-pre", "html", cats(&[1]));
        let candidate = BlockRule::new("side-pre", " html", cats(&[1]));
        assert!(matches!(
            validate_block_rule(&candidate, [&existing]),
            Err(Error::DuplicateRule)
        ));
    }

    #[test]
    fn region_rule_duplicate_is_rejected_regardless_of_category_order() {
        let existing = RegionRule::new("side-pre", cats(&[1, 2]));
        let candidate = RegionRule::new("side-pre", cats(&[2, 1]));
        assert!(matches!(
            validate_region_rule(&candidate, [&existing]),
            Err(Error::DuplicateRule)
        ));
    }

    #[test]
    fn region_rule_for_other_categories_is_fine() {
        let existing = RegionRule::new("side-pre", cats(&[1]));
        let candidate = RegionRule::new("side-pre", cats(&[2]));
        assert!(validate_region_rule(&candidate, [&existing]).is_ok());
    }

    #[test]
    fn all_regions_conflicts_with_specific_region() {
        let existing = BlockRule::new("side-pre", "search_forums", cats(&[1]));
        let candidate = BlockRule::new(ALL_REGIONS, "search_forums", cats(&[1]));
        assert!(matches!(
            validate_block_rule(&candidate, [&existing]),
            Err(Error::CannotUseAllRegions)
        ));
    }

    #[test]
    fn specific_region_conflicts_with_all_regions() {
        let existing = BlockRule::new(ALL_REGIONS, "search_forums", cats(&[1]));
        let candidate = BlockRule::new("side-post", "search_forums", cats(&[1]));
        assert!(matches!(
            validate_block_rule(&candidate, [&existing]),
            Err(Error::CannotUseSpecificRegion)
        ));
    }

    #[test]
    fn duplicate_block_rule_is_rejected() {
        let existing = BlockRule::new("side-pre", "search_forums", cats(&[1]));
        let candidate = BlockRule::new("side-pre", "search_forums", cats(&[1]));
        assert!(matches!(
            validate_block_rule(&candidate, [&existing]),
            Err(Error::DuplicateRule)
        ));
    }

    #[test]
    fn different_block_or_categories_do_not_conflict() {
        let existing = BlockRule::new(ALL_REGIONS, "search_forums", cats(&[1]));
        let other_block = BlockRule::new("side-pre", "calendar_month", cats(&[1]));
        let other_cats = BlockRule::new("side-pre", "search_forums", cats(&[2]));
        assert!(validate_block_rule(&other_block, [&existing]).is_ok());
        assert!(validate_block_rule(&other_cats, [&existing]).is_ok());
    }

    #[test]
    fn two_specific_regions_can_coexist() {
        let existing = BlockRule::new("side-pre", "search_forums", cats(&[1]));
        let candidate = BlockRule::new("side-post", "search_forums", cats(&[1]));
        assert!(validate_block_rule(&candidate, [&existing]).is_ok());
    }
}
