//! Locking evaluation for widget edit actions.

use crate::closure::expand_categories;
use crate::{Action, BlockRule, LockRule, RegionRule, Result, Rule, RuleSet};
use host::{Authorizer, Category, CategoryId, CategoryStore};
use std::collections::BTreeSet;

/// A rule together with its expanded category closure.
#[derive(Debug, Clone)]
struct Scoped<R> {
    rule: R,
    categories: BTreeSet<CategoryId>,
}

impl<R: LockRule> Scoped<R> {
    fn matches(&self, block_name: &str, region: &str, category: CategoryId) -> bool {
        self.rule.applies_to(block_name, region) && self.categories.contains(&category)
    }
}

/// Decides which edit actions are allowed on a page.
///
/// Built once per page render from the page's category and a snapshot of
/// the stored rules. Rules changed after construction are not observed.
///
/// Block rules are consulted before region rules, and within each kind the
/// first rule in declaration order that matches decides. A more specific
/// category further down the list never overrides an earlier match.
#[derive(Debug)]
pub struct LockingManager<A> {
    category: Option<CategoryId>,
    block_rules: Vec<Scoped<BlockRule>>,
    region_rules: Vec<Scoped<RegionRule>>,
    authorizer: A,
}

impl<A: Authorizer> LockingManager<A> {
    /// Create a manager for a page in `category`.
    ///
    /// Pages outside any category are never locked.
    pub fn new<S>(
        category: Option<&Category>,
        rules: RuleSet,
        store: &S,
        authorizer: A,
    ) -> Result<Self>
    where
        S: CategoryStore + ?Sized,
    {
        let mut block_rules = Vec::new();
        let mut region_rules = Vec::new();

        if category.is_some() {
            for rule in rules.into_rules() {
                let categories = expand_categories(store, rule.categories().iter().copied())?;
                match rule {
                    Rule::Block(rule) => block_rules.push(Scoped { rule, categories }),
                    Rule::Region(rule) => region_rules.push(Scoped { rule, categories }),
                }
            }
        }

        tracing::debug!(
            category = ?category.map(|c| c.id),
            block_rules = block_rules.len(),
            region_rules = region_rules.len(),
            "loaded locking rules"
        );

        Ok(Self {
            category: category.map(|c| c.id),
            block_rules,
            region_rules,
            authorizer,
        })
    }

    /// The category locking is evaluated for.
    pub fn category(&self) -> Option<CategoryId> {
        self.category
    }

    pub fn can_configure(&self, block_name: &str, region: &str) -> bool {
        self.can(Action::Config, block_name, region)
    }

    pub fn can_remove(&self, block_name: &str, region: &str) -> bool {
        self.can(Action::Remove, block_name, region)
    }

    pub fn can_hide(&self, block_name: &str, region: &str) -> bool {
        self.can(Action::Hide, block_name, region)
    }

    pub fn can_move(&self, block_name: &str, region: &str) -> bool {
        self.can(Action::Move, block_name, region)
    }

    /// Whether a block may be moved into `region`.
    ///
    /// Block rules have no move-in flag and answer with their `move` flag.
    pub fn can_move_in(&self, block_name: &str, region: &str) -> bool {
        self.can(Action::MoveIn, block_name, region)
    }

    /// Whether a block may be moved out of `region`.
    ///
    /// Leaving a region counts as removing the block from it, so this is
    /// the remove permission.
    pub fn can_move_out(&self, block_name: &str, region: &str) -> bool {
        self.can_remove(block_name, region)
    }

    /// Evaluate an action given by name.
    ///
    /// Unknown names are a caller defect and come back as
    /// [`Error::UnknownAction`](crate::Error::UnknownAction).
    pub fn can_named(&self, action: &str, block_name: &str, region: &str) -> Result<bool> {
        let action = action.parse()?;
        Ok(self.can(action, block_name, region))
    }

    /// Evaluate `action` for `block_name` in `region`.
    pub fn can(&self, action: Action, block_name: &str, region: &str) -> bool {
        if self.authorizer.has_bypass_capability() {
            return true;
        }

        let Some(category) = self.category else {
            return true;
        };

        if let Some(scoped) = self
            .block_rules
            .iter()
            .find(|scoped| scoped.matches(block_name, region, category))
        {
            return scoped.rule.value_for(action);
        }

        if let Some(scoped) = self
            .region_rules
            .iter()
            .find(|scoped| scoped.matches(block_name, region, category))
        {
            return scoped.rule.value_for(action);
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::closure::tests::{tree, TreeStore};
    use crate::{BlockActions, Error, RegionActions, ALL_REGIONS};
    use host::FixedAuthorizer;
    use std::cell::Cell;

    fn cats(ids: &[i64]) -> Vec<CategoryId> {
        ids.iter().copied().map(CategoryId).collect()
    }

    fn locked_region(region: &str, categories: &[i64]) -> RegionRule {
        RegionRule::new(region, cats(categories)).with_actions(RegionActions::locked())
    }

    fn manager(store: &TreeStore, category: i64, rules: RuleSet) -> LockingManager<FixedAuthorizer> {
        let category = store.get(category);
        LockingManager::new(Some(&category), rules, store, FixedAuthorizer::restricted()).unwrap()
    }

    fn assert_all(locking: &LockingManager<impl Authorizer>, block: &str, region: &str, expected: bool) {
        assert_eq!(locking.can_move(block, region), expected, "move");
        assert_eq!(locking.can_hide(block, region), expected, "hide");
        assert_eq!(locking.can_remove(block, region), expected, "remove");
        assert_eq!(locking.can_move_out(block, region), expected, "move out");
        assert_eq!(locking.can_move_in(block, region), expected, "move in");
        assert_eq!(locking.can_configure(block, region), expected, "configure");
    }

    #[test]
    fn no_rules_allows_everything() {
        let store = tree();
        assert_all(&manager(&store, 1, RuleSet::new()), "block", "region1", true);
    }

    #[test]
    fn locked_region_denies_in_its_category() {
        let store = tree();
        let rules = RuleSet::new().with(locked_region("region1", &[1]));
        let locking = manager(&store, 1, rules);
        assert_all(&locking, "anyblock", "region1", false);
        assert_all(&locking, "anyblock", "region2", true);
    }

    #[test]
    fn unrelated_category_is_unrestricted() {
        let store = tree();
        let rules = RuleSet::new().with(locked_region("region1", &[1]));
        assert_all(&manager(&store, 10, rules), "anyblock", "region1", true);
    }

    #[test]
    fn locking_reaches_child_categories() {
        let store = tree();
        let rules = RuleSet::new().with(locked_region("region1", &[1]));
        assert_all(&manager(&store, 2, rules.clone()), "block", "region1", false);
        assert_all(&manager(&store, 3, rules), "block", "region1", false);
    }

    #[test]
    fn locking_does_not_reach_parent_categories() {
        let store = tree();
        let rules = RuleSet::new().with(locked_region("region1", &[2]));
        assert_all(&manager(&store, 1, rules), "block", "region1", true);
    }

    #[test]
    fn block_rule_overrides_region_rule() {
        let store = tree();
        let region = locked_region("region1", &[1]);
        let block = BlockRule::new("region1", "block1", cats(&[1]));

        // Block rules win whichever kind was declared first.
        for rules in [
            RuleSet::new().with(region.clone()).with(block.clone()),
            RuleSet::new().with(block).with(region),
        ] {
            let locking = manager(&store, 1, rules);
            assert!(locking.can_move("block1", "region1"));
            assert!(locking.can_hide("block1", "region1"));
            assert!(locking.can_remove("block1", "region1"));
            assert!(locking.can_configure("block1", "region1"));
            assert!(locking.can_move_in("block1", "region1"));
            assert_all(&locking, "block", "region1", false);
        }
    }

    #[test]
    fn move_in_falls_back_to_region_movein_flag() {
        let store = tree();
        let mut actions = RegionActions::locked();
        actions.move_in = true;
        let rules = RuleSet::new().with(RegionRule::new("region1", cats(&[1])).with_actions(actions));
        let locking = manager(&store, 1, rules);
        assert!(locking.can_move_in("block", "region1"));
        assert!(!locking.can_move("block", "region1"));
    }

    #[test]
    fn move_out_follows_remove_flag() {
        let store = tree();
        let actions = BlockActions {
            remove: false,
            ..BlockActions::default()
        };
        let rules = RuleSet::new()
            .with(BlockRule::new("region1", "block1", cats(&[1])).with_actions(actions));
        let locking = manager(&store, 1, rules);
        assert!(!locking.can_move_out("block1", "region1"));
        assert!(locking.can_move("block1", "region1"));
    }

    #[test]
    fn all_regions_block_rule_matches_queried_region() {
        let store = tree();
        let rules = RuleSet::new()
            .with(BlockRule::new(ALL_REGIONS, "block1", cats(&[1])).with_actions(BlockActions::locked()));
        let locking = manager(&store, 2, rules);
        assert!(!locking.can_configure("block1", "side-pre"));
        assert!(!locking.can_move_in("block1", "content"));
        assert!(locking.can_configure("block2", "side-pre"));
    }

    #[test]
    fn first_matching_block_rule_wins() {
        let store = tree();
        let rules = RuleSet::new()
            .with(BlockRule::new("region1", "block1", cats(&[1])).with_actions(BlockActions::locked()))
            .with(BlockRule::new("region1", "block1", cats(&[3])));
        // Category 3 is matched by both; the earlier, broader rule shadows the later one.
        let locking = manager(&store, 3, rules);
        assert!(!locking.can_configure("block1", "region1"));
    }

    #[test]
    fn first_matching_region_rule_wins() {
        let store = tree();
        let rules = RuleSet::new()
            .with(RegionRule::new("region1", cats(&[2])).with_actions(RegionActions::locked()))
            .with(RegionRule::new("region1", cats(&[3])));
        let locking = manager(&store, 3, rules);
        assert!(!locking.can_configure("block", "region1"));
    }

    #[test]
    fn bypass_capability_allows_everything() {
        let store = tree();
        let category = store.get(1);
        let rules = RuleSet::new().with(locked_region("region1", &[1]));
        let locking =
            LockingManager::new(Some(&category), rules, &store, FixedAuthorizer::bypass()).unwrap();
        assert_all(&locking, "block", "region1", true);
    }

    #[test]
    fn bypass_is_checked_on_every_call() {
        struct Switch(Cell<bool>);
        impl Authorizer for Switch {
            fn has_bypass_capability(&self) -> bool {
                self.0.get()
            }
        }

        let store = tree();
        let category = store.get(1);
        let switch = Switch(Cell::new(false));
        let rules = RuleSet::new().with(locked_region("region1", &[1]));
        let locking = LockingManager::new(Some(&category), rules, &store, &switch).unwrap();

        assert_all(&locking, "block", "region1", false);
        switch.0.set(true);
        assert_all(&locking, "block", "region1", true);
    }

    #[test]
    fn pages_without_category_are_unlocked() {
        let store = tree();
        let rules = RuleSet::new().with(locked_region("region1", &[1]));
        let locking = LockingManager::new(None, rules, &store, FixedAuthorizer::restricted()).unwrap();
        assert_eq!(locking.category(), None);
        assert_all(&locking, "block", "region1", true);
    }

    #[test]
    fn rules_with_unknown_categories_never_match() {
        let store = tree();
        let rules = RuleSet::new().with(locked_region("region1", &[999]));
        assert_all(&manager(&store, 1, rules), "block", "region1", true);
    }

    #[test]
    fn named_actions_are_validated() {
        let store = tree();
        let rules = RuleSet::new().with(locked_region("region1", &[1]));
        let locking = manager(&store, 1, rules);
        assert!(!locking.can_named("movein", "block", "region1").unwrap());
        assert!(matches!(
            locking.can_named("fly", "block", "region1"),
            Err(Error::UnknownAction(name)) if name == "fly"
        ));
    }
}
