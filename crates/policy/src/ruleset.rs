//! Ordered rule collections and TOML import.

use crate::{BlockRule, Error, RegionRule, Result, Rule};
use serde::Deserialize;
use std::path::Path;

/// Rules in declaration order.
///
/// Evaluation is first-match in this order, so the order rules are pushed
/// in is significant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

/// On-disk layout of a rule file.
#[derive(Debug, Default, Deserialize)]
struct RuleFile {
    #[serde(default)]
    region: Vec<RegionRule>,
    #[serde(default)]
    block: Vec<BlockRule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a rule set from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse a rule set from a TOML string with `[[region]]` and `[[block]]`
    /// tables.
    pub fn parse(toml: &str) -> Result<Self> {
        let file: RuleFile = toml::from_str(toml).map_err(|e| Error::Parse(e.to_string()))?;
        let mut rules = Self::new();
        for rule in file.region {
            rules.push(rule);
        }
        for rule in file.block {
            rules.push(rule);
        }
        Ok(rules)
    }

    pub fn push(&mut self, rule: impl Into<Rule>) {
        self.rules.push(rule.into());
    }

    pub fn with(mut self, rule: impl Into<Rule>) -> Self {
        self.push(rule);
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn into_rules(self) -> Vec<Rule> {
        self.rules
    }

    pub fn block_rules(&self) -> impl Iterator<Item = &BlockRule> {
        self.rules.iter().filter_map(|rule| match rule {
            Rule::Block(rule) => Some(rule),
            Rule::Region(_) => None,
        })
    }

    pub fn region_rules(&self) -> impl Iterator<Item = &RegionRule> {
        self.rules.iter().filter_map(|rule| match rule {
            Rule::Region(rule) => Some(rule),
            Rule::Block(_) => None,
        })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RegionScope;
    use host::CategoryId;
    use std::io::Write;

    const RULES: &str = r#"
[[region]]
region = "side-pre"
categories = [1, 2]
config = false

[[block]]
region = "*"
block = "search_forums"
categories = [3]
move = false

[[block]]
region = "side-post"
block = "calendar_month"
"#;

    #[test]
    fn parses_both_rule_kinds() {
        let rules = RuleSet::parse(RULES).unwrap();
        assert_eq!(rules.len(), 3);

        let region: Vec<_> = rules.region_rules().collect();
        assert_eq!(region.len(), 1);
        assert_eq!(region[0].region, "side-pre");
        assert_eq!(region[0].categories, vec![CategoryId(1), CategoryId(2)]);
        assert!(!region[0].actions.config);
        assert!(region[0].actions.hide);

        let blocks: Vec<_> = rules.block_rules().collect();
        assert_eq!(blocks[0].region, RegionScope::All);
        assert!(!blocks[0].actions.r#move);
        assert!(blocks[0].actions.remove);
        assert_eq!(blocks[1].block, "calendar_month");
        assert!(blocks[1].categories.is_empty());
    }

    #[test]
    fn block_rules_keep_declaration_order() {
        let rules = RuleSet::parse(RULES).unwrap();
        let names: Vec<_> = rules.block_rules().map(|r| r.block.as_str()).collect();
        assert_eq!(names, vec!["search_forums", "calendar_month"]);
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let err = RuleSet::parse("[[region]]\nregion = 5").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(RULES.as_bytes()).unwrap();
        let rules = RuleSet::load(file.path()).unwrap();
        assert_eq!(rules.len(), 3);
    }
}
