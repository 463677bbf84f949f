//! Locking rule records.

use crate::{Action, Error, Result};
use host::CategoryId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Region value that makes a block rule apply in every region.
pub const ALL_REGIONS: &str = "*";

/// Region a block rule targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RegionScope {
    All,
    Named(String),
}

impl RegionScope {
    pub fn matches(&self, region: &str) -> bool {
        match self {
            RegionScope::All => true,
            RegionScope::Named(name) => name == region,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, RegionScope::All)
    }

    pub fn as_str(&self) -> &str {
        match self {
            RegionScope::All => ALL_REGIONS,
            RegionScope::Named(name) => name,
        }
    }
}

impl From<String> for RegionScope {
    fn from(region: String) -> Self {
        if region.trim() == ALL_REGIONS {
            RegionScope::All
        } else {
            RegionScope::Named(region.trim().to_string())
        }
    }
}

impl From<&str> for RegionScope {
    fn from(region: &str) -> Self {
        Self::from(region.to_string())
    }
}

impl From<RegionScope> for String {
    fn from(scope: RegionScope) -> Self {
        scope.as_str().to_string()
    }
}

impl fmt::Display for RegionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action flags of a region rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionActions {
    pub config: bool,
    pub remove: bool,
    pub hide: bool,
    #[serde(rename = "movein")]
    pub move_in: bool,
    pub r#move: bool,
}

impl Default for RegionActions {
    fn default() -> Self {
        Self {
            config: true,
            remove: false,
            hide: true,
            move_in: false,
            r#move: false,
        }
    }
}

impl RegionActions {
    /// Every action denied.
    pub fn locked() -> Self {
        Self {
            config: false,
            remove: false,
            hide: false,
            move_in: false,
            r#move: false,
        }
    }

    pub fn get(&self, action: Action) -> bool {
        match action {
            Action::Config => self.config,
            Action::Remove => self.remove,
            Action::Hide => self.hide,
            Action::MoveIn => self.move_in,
            Action::Move => self.r#move,
        }
    }

    pub fn set(&mut self, action: Action, value: bool) {
        match action {
            Action::Config => self.config = value,
            Action::Remove => self.remove = value,
            Action::Hide => self.hide = value,
            Action::MoveIn => self.move_in = value,
            Action::Move => self.r#move = value,
        }
    }
}

/// Action flags of a block rule.
///
/// There is no separate move-in flag: moving a block into a region is
/// governed by `move`, and moving it out by `remove`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockActions {
    pub config: bool,
    pub remove: bool,
    pub hide: bool,
    pub r#move: bool,
}

impl Default for BlockActions {
    fn default() -> Self {
        Self {
            config: true,
            remove: true,
            hide: true,
            r#move: true,
        }
    }
}

impl BlockActions {
    pub fn locked() -> Self {
        Self {
            config: false,
            remove: false,
            hide: false,
            r#move: false,
        }
    }

    pub fn get(&self, action: Action) -> bool {
        match action {
            Action::Config => self.config,
            Action::Remove => self.remove,
            Action::Hide => self.hide,
            Action::MoveIn | Action::Move => self.r#move,
        }
    }

    pub fn set(&mut self, action: Action, value: bool) -> Result<()> {
        match action {
            Action::Config => self.config = value,
            Action::Remove => self.remove = value,
            Action::Hide => self.hide = value,
            Action::Move => self.r#move = value,
            Action::MoveIn => return Err(Error::NotApplicable(action)),
        }
        Ok(())
    }
}

/// Locks a whole region for the given categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionRule {
    pub region: String,
    #[serde(default)]
    pub categories: Vec<CategoryId>,
    #[serde(flatten)]
    pub actions: RegionActions,
}

impl RegionRule {
    pub fn new(region: impl Into<String>, categories: Vec<CategoryId>) -> Self {
        Self {
            region: region.into(),
            categories,
            actions: RegionActions::default(),
        }
    }

    pub fn with_actions(mut self, actions: RegionActions) -> Self {
        self.actions = actions;
        self
    }

    /// The rule with surrounding whitespace stripped from its region, as it
    /// is stored and compared.
    pub fn normalized(&self) -> Self {
        Self {
            region: self.region.trim().to_string(),
            ..self.clone()
        }
    }
}

/// Locks one block type, in one region or in all of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRule {
    pub region: RegionScope,
    pub block: String,
    #[serde(default)]
    pub categories: Vec<CategoryId>,
    #[serde(flatten)]
    pub actions: BlockActions,
}

impl BlockRule {
    pub fn new(
        region: impl Into<RegionScope>,
        block: impl Into<String>,
        categories: Vec<CategoryId>,
    ) -> Self {
        Self {
            region: region.into(),
            block: block.into(),
            categories,
            actions: BlockActions::default(),
        }
    }

    pub fn with_actions(mut self, actions: BlockActions) -> Self {
        self.actions = actions;
        self
    }

    /// The rule with surrounding whitespace stripped from its region and
    /// block name.
    pub fn normalized(&self) -> Self {
        Self {
            region: RegionScope::from(self.region.as_str()),
            block: self.block.trim().to_string(),
            ..self.clone()
        }
    }
}

/// Behaviour shared by both rule kinds.
///
/// Category matching is not part of this trait: a rule's categories must
/// first be expanded to their descendants, which needs the category store.
pub trait LockRule {
    /// Whether the rule targets `block_name` placed in `region`.
    fn applies_to(&self, block_name: &str, region: &str) -> bool;

    /// Categories as declared, before descendant expansion.
    fn categories(&self) -> &[CategoryId];

    /// The rule's verdict for `action`.
    fn value_for(&self, action: Action) -> bool;
}

impl LockRule for RegionRule {
    fn applies_to(&self, _block_name: &str, region: &str) -> bool {
        self.region == region
    }

    fn categories(&self) -> &[CategoryId] {
        &self.categories
    }

    fn value_for(&self, action: Action) -> bool {
        self.actions.get(action)
    }
}

impl LockRule for BlockRule {
    fn applies_to(&self, block_name: &str, region: &str) -> bool {
        self.block == block_name && self.region.matches(region)
    }

    fn categories(&self) -> &[CategoryId] {
        &self.categories
    }

    fn value_for(&self, action: Action) -> bool {
        self.actions.get(action)
    }
}

/// Either kind of locking rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    Block(BlockRule),
    Region(RegionRule),
}

impl LockRule for Rule {
    fn applies_to(&self, block_name: &str, region: &str) -> bool {
        match self {
            Rule::Block(rule) => rule.applies_to(block_name, region),
            Rule::Region(rule) => rule.applies_to(block_name, region),
        }
    }

    fn categories(&self) -> &[CategoryId] {
        match self {
            Rule::Block(rule) => rule.categories(),
            Rule::Region(rule) => rule.categories(),
        }
    }

    fn value_for(&self, action: Action) -> bool {
        match self {
            Rule::Block(rule) => rule.value_for(action),
            Rule::Region(rule) => rule.value_for(action),
        }
    }
}

impl From<BlockRule> for Rule {
    fn from(rule: BlockRule) -> Self {
        Rule::Block(rule)
    }
}

impl From<RegionRule> for Rule {
    fn from(rule: RegionRule) -> Self {
        Rule::Region(rule)
    }
}

/// Parse a stored comma-separated category list.
///
/// Tokens that are not ids are dropped; they could never resolve.
pub fn parse_category_list(raw: &str) -> Vec<CategoryId> {
    raw.split(',')
        .filter_map(|token| token.parse().ok())
        .collect()
}

/// Render categories in their stored comma-separated form.
pub fn format_category_list(categories: &[CategoryId]) -> String {
    categories
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Whether two category lists name the same set.
pub fn same_categories(a: &[CategoryId], b: &[CategoryId]) -> bool {
    a.iter().collect::<BTreeSet<_>>() == b.iter().collect::<BTreeSet<_>>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_scope_matches_any_region() {
        let scope = RegionScope::from("*");
        assert!(scope.is_all());
        assert!(scope.matches("side-pre"));
        assert!(!RegionScope::from("side-pre").matches("side-post"));
    }

    #[test]
    fn defaults_differ_by_kind() {
        let region = RegionActions::default();
        assert!(region.config && region.hide);
        assert!(!region.remove && !region.move_in && !region.r#move);

        let block = BlockActions::default();
        assert!(block.config && block.remove && block.hide && block.r#move);
    }

    #[test]
    fn block_move_in_reads_move_flag() {
        let actions = BlockActions {
            r#move: false,
            ..BlockActions::default()
        };
        assert!(!actions.get(Action::MoveIn));
        assert!(actions.get(Action::Remove));
    }

    #[test]
    fn block_rule_rejects_move_in_flag() {
        let mut actions = BlockActions::default();
        assert!(matches!(
            actions.set(Action::MoveIn, false),
            Err(Error::NotApplicable(Action::MoveIn))
        ));
    }

    #[test]
    fn block_rule_matches_name_and_region() {
        let rule = BlockRule::new("side-pre", "search_forums", vec![CategoryId(1)]);
        assert!(rule.applies_to("search_forums", "side-pre"));
        assert!(!rule.applies_to("search_forums", "side-post"));
        assert!(!rule.applies_to("calendar", "side-pre"));

        let everywhere = BlockRule::new(ALL_REGIONS, "search_forums", vec![]);
        assert!(everywhere.applies_to("search_forums", "content"));
    }

    #[test]
    fn region_rule_ignores_block_name() {
        let rule = RegionRule::new("side-pre", vec![CategoryId(1)]);
        assert!(rule.applies_to("anything", "side-pre"));
        assert!(!rule.applies_to("anything", "side-post"));
    }

    #[test]
    fn normalized_rules_drop_padding() {
        let region = RegionRule::new(" side-pre ", vec![CategoryId(1)]).normalized();
        assert_eq!(region.region, "side-pre");

        let block = BlockRule {
            region: RegionScope::Named("side-pre\t".to_string()),
            ..BlockRule::new("side-pre", " html ", vec![CategoryId(1)])
        }
        .normalized();
        assert_eq!(block.region, RegionScope::Named("side-pre".to_string()));
        assert_eq!(block.block, "html");
        assert_eq!(block.categories, vec![CategoryId(1)]);
    }

    #[test]
    fn category_lists_round_trip_and_compare_as_sets() {
        let parsed = parse_category_list("3, 1,x,2");
        assert_eq!(parsed, vec![CategoryId(3), CategoryId(1), CategoryId(2)]);
        assert_eq!(format_category_list(&parsed), "3,1,2");
        assert!(same_categories(&parsed, &[CategoryId(1), CategoryId(2), CategoryId(3)]));
        assert!(!same_categories(&parsed, &[CategoryId(1)]));
    }

    #[test]
    fn region_rule_flags_deserialize_with_defaults() {
        let rule: RegionRule =
            serde_json::from_str(r#"{"region":"side-pre","categories":[1],"movein":true}"#)
                .unwrap();
        assert!(rule.actions.move_in);
        assert!(rule.actions.config);
        assert!(!rule.actions.r#move);
    }
}
