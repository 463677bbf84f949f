//! Persistence of locking rules.

use crate::{Error, Result, SiteStore};
use chrono::{DateTime, Utc};
use policy::{
    format_category_list, parse_category_list, validate_block_rule, validate_region_rule,
    BlockActions, BlockRule, RegionActions, RegionRule, RuleSet,
};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;

/// Row id of a stored rule.
pub type RuleId = i64;

/// A stored rule with its bookkeeping columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleRecord<R> {
    pub id: RuleId,
    #[serde(flatten)]
    pub rule: R,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Which table a rule lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Region,
    Block,
}

impl RuleKind {
    fn table(self) -> &'static str {
        match self {
            RuleKind::Region => "region_rules",
            RuleKind::Block => "block_rules",
        }
    }
}

fn timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn region_record(row: &Row<'_>) -> rusqlite::Result<RuleRecord<RegionRule>> {
    let categories: String = row.get(2)?;
    Ok(RuleRecord {
        id: row.get(0)?,
        rule: RegionRule {
            region: row.get(1)?,
            categories: parse_category_list(&categories),
            actions: RegionActions {
                config: row.get(3)?,
                remove: row.get(4)?,
                hide: row.get(5)?,
                move_in: row.get(6)?,
                r#move: row.get(7)?,
            },
        },
        created_at: timestamp(row, 8)?,
        updated_at: timestamp(row, 9)?,
    })
}

fn block_record(row: &Row<'_>) -> rusqlite::Result<RuleRecord<BlockRule>> {
    let region: String = row.get(1)?;
    let categories: String = row.get(3)?;
    Ok(RuleRecord {
        id: row.get(0)?,
        rule: BlockRule {
            region: region.into(),
            block: row.get(2)?,
            categories: parse_category_list(&categories),
            actions: BlockActions {
                config: row.get(4)?,
                remove: row.get(5)?,
                hide: row.get(6)?,
                r#move: row.get(7)?,
            },
        },
        created_at: timestamp(row, 8)?,
        updated_at: timestamp(row, 9)?,
    })
}

const REGION_COLUMNS: &str =
    "id, region, categories, config, remove, hide, movein, move, created_at, updated_at";
const BLOCK_COLUMNS: &str =
    "id, region, block, categories, config, remove, hide, move, created_at, updated_at";

impl SiteStore {
    /// All region rules, oldest first.
    pub fn region_rules(&self) -> Result<Vec<RuleRecord<RegionRule>>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {REGION_COLUMNS} FROM region_rules ORDER BY id"))?;
        let rules = stmt
            .query_map([], region_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rules)
    }

    /// All block rules, oldest first.
    pub fn block_rules(&self) -> Result<Vec<RuleRecord<BlockRule>>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {BLOCK_COLUMNS} FROM block_rules ORDER BY id"))?;
        let rules = stmt
            .query_map([], block_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rules)
    }

    pub fn region_rule(&self, id: RuleId) -> Result<RuleRecord<RegionRule>> {
        self.conn
            .query_row(
                &format!("SELECT {REGION_COLUMNS} FROM region_rules WHERE id = ?1"),
                [id],
                region_record,
            )
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("region rule {id}")))
    }

    pub fn block_rule(&self, id: RuleId) -> Result<RuleRecord<BlockRule>> {
        self.conn
            .query_row(
                &format!("SELECT {BLOCK_COLUMNS} FROM block_rules WHERE id = ?1"),
                [id],
                block_record,
            )
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("block rule {id}")))
    }

    /// Store a new region rule after checking it against the existing ones.
    pub fn create_region_rule(&self, rule: &RegionRule) -> Result<RuleRecord<RegionRule>> {
        let rule = &rule.normalized();
        let existing = self.region_rules()?;
        validate_region_rule(rule, existing.iter().map(|r| &r.rule))?;

        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO region_rules (region, categories, config, remove, hide, movein, move,
                 created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            params![
                rule.region,
                format_category_list(&rule.categories),
                rule.actions.config,
                rule.actions.remove,
                rule.actions.hide,
                rule.actions.move_in,
                rule.actions.r#move,
                now,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::info!(id, region = %rule.region, "created region rule");
        self.region_rule(id)
    }

    /// Store a new block rule after checking it against the existing ones.
    pub fn create_block_rule(&self, rule: &BlockRule) -> Result<RuleRecord<BlockRule>> {
        let rule = &rule.normalized();
        let existing = self.block_rules()?;
        validate_block_rule(rule, existing.iter().map(|r| &r.rule))?;

        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO block_rules (region, block, categories, config, remove, hide, move,
                 created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            params![
                rule.region.as_str(),
                rule.block,
                format_category_list(&rule.categories),
                rule.actions.config,
                rule.actions.remove,
                rule.actions.hide,
                rule.actions.r#move,
                now,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::info!(id, block = %rule.block, region = %rule.region, "created block rule");
        self.block_rule(id)
    }

    /// Replace a stored region rule. Uniqueness is checked against every
    /// other record.
    pub fn update_region_rule(
        &self,
        id: RuleId,
        rule: &RegionRule,
    ) -> Result<RuleRecord<RegionRule>> {
        self.region_rule(id)?;
        let rule = &rule.normalized();
        let others = self.region_rules()?;
        validate_region_rule(rule, others.iter().filter(|r| r.id != id).map(|r| &r.rule))?;

        self.conn.execute(
            "UPDATE region_rules SET region = ?1, categories = ?2, config = ?3, remove = ?4,
                 hide = ?5, movein = ?6, move = ?7, updated_at = ?8
             WHERE id = ?9",
            params![
                rule.region,
                format_category_list(&rule.categories),
                rule.actions.config,
                rule.actions.remove,
                rule.actions.hide,
                rule.actions.move_in,
                rule.actions.r#move,
                Utc::now().to_rfc3339(),
                id,
            ],
        )?;
        self.region_rule(id)
    }

    /// Replace a stored block rule. Uniqueness is checked against every
    /// other record.
    pub fn update_block_rule(&self, id: RuleId, rule: &BlockRule) -> Result<RuleRecord<BlockRule>> {
        self.block_rule(id)?;
        let rule = &rule.normalized();
        let others = self.block_rules()?;
        validate_block_rule(rule, others.iter().filter(|r| r.id != id).map(|r| &r.rule))?;

        self.conn.execute(
            "UPDATE block_rules SET region = ?1, block = ?2, categories = ?3, config = ?4,
                 remove = ?5, hide = ?6, move = ?7, updated_at = ?8
             WHERE id = ?9",
            params![
                rule.region.as_str(),
                rule.block,
                format_category_list(&rule.categories),
                rule.actions.config,
                rule.actions.remove,
                rule.actions.hide,
                rule.actions.r#move,
                Utc::now().to_rfc3339(),
                id,
            ],
        )?;
        self.block_rule(id)
    }

    pub fn delete_rule(&self, kind: RuleKind, id: RuleId) -> Result<()> {
        let deleted = self
            .conn
            .execute(&format!("DELETE FROM {} WHERE id = ?1", kind.table()), [id])?;
        if deleted == 0 {
            return Err(Error::NotFound(format!("{} {id}", kind.table())));
        }
        tracing::info!(id, table = kind.table(), "deleted rule");
        Ok(())
    }

    /// Snapshot of every stored rule in evaluation order: region rules
    /// then block rules, each oldest first.
    pub fn load_rules(&self) -> Result<RuleSet> {
        let mut rules = RuleSet::new();
        for record in self.region_rules()? {
            rules.push(record.rule);
        }
        for record in self.block_rules()? {
            rules.push(record.rule);
        }
        Ok(rules)
    }

    /// Store every rule of `rules`, stopping at the first one rejected.
    ///
    /// Returns the number of rules stored.
    pub fn import_rules(&self, rules: &RuleSet) -> Result<usize> {
        for rule in rules.region_rules() {
            self.create_region_rule(rule)?;
        }
        for rule in rules.block_rules() {
            self.create_block_rule(rule)?;
        }
        Ok(rules.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use host::CategoryId;
    use policy::{LockRule, RegionScope, ALL_REGIONS};

    fn cats(ids: &[i64]) -> Vec<CategoryId> {
        ids.iter().copied().map(CategoryId).collect()
    }

    #[test]
    fn region_rule_round_trips() {
        let store = SiteStore::in_memory().unwrap();
        let rule = RegionRule::new("side-pre", cats(&[3, 1])).with_actions(RegionActions {
            move_in: true,
            ..RegionActions::locked()
        });

        let record = store.create_region_rule(&rule).unwrap();
        assert_eq!(record.rule, rule);
        assert_eq!(record.created_at, record.updated_at);
        assert_eq!(store.region_rule(record.id).unwrap(), record);
    }

    #[test]
    fn block_rule_round_trips_all_regions() {
        let store = SiteStore::in_memory().unwrap();
        let rule = BlockRule::new(ALL_REGIONS, "search_forums", cats(&[2]));
        let record = store.create_block_rule(&rule).unwrap();
        assert_eq!(record.rule.region, RegionScope::All);
        assert!(record.rule.actions.remove);
    }

    #[test]
    fn duplicate_region_rule_is_rejected() {
        let store = SiteStore::in_memory().unwrap();
        store
            .create_region_rule(&RegionRule::new("side-pre", cats(&[1, 2])))
            .unwrap();
        let err = store
            .create_region_rule(&RegionRule::new("side-pre", cats(&[2, 1])))
            .unwrap_err();
        assert!(matches!(err, Error::Policy(policy::Error::DuplicateRule)));
    }

    #[test]
    fn padded_names_cannot_duplicate_a_rule() {
        let store = SiteStore::in_memory().unwrap();
        store
            .create_region_rule(&RegionRule::new("side-pre", cats(&[1])))
            .unwrap();
        let err = store
            .create_region_rule(&RegionRule::new("side-pre ", cats(&[1])))
            .unwrap_err();
        assert!(matches!(err, Error::Policy(policy::Error::DuplicateRule)));

        store
            .create_block_rule(&BlockRule::new("side-pre", "html", cats(&[1])))
            .unwrap();
        let err = store
            .create_block_rule(&BlockRule::new("side-pre", " html", cats(&[1])))
            .unwrap_err();
        assert!(matches!(err, Error::Policy(policy::Error::DuplicateRule)));

        let regions: Vec<_> = store
            .region_rules()
            .unwrap()
            .into_iter()
            .map(|r| r.rule.region)
            .collect();
        let blocks: Vec<_> = store
            .block_rules()
            .unwrap()
            .into_iter()
            .map(|r| r.rule.block)
            .collect();
        assert_eq!(regions, vec!["side-pre"]);
        assert_eq!(blocks, vec!["html"]);
    }

    #[test]
    fn update_stores_trimmed_names() {
        let store = SiteStore::in_memory().unwrap();
        let record = store
            .create_block_rule(&BlockRule::new("side-pre", "html", cats(&[1])))
            .unwrap();
        let padded = BlockRule::new("side-post ", " calendar_month ", cats(&[1]));
        let updated = store.update_block_rule(record.id, &padded).unwrap();
        assert_eq!(updated.rule.block, "calendar_month");
        assert_eq!(updated.rule.region.as_str(), "side-post");
    }

    #[test]
    fn block_rule_without_name_is_rejected() {
        let store = SiteStore::in_memory().unwrap();
        let err = store
            .create_block_rule(&BlockRule::new("side-pre", "", cats(&[1])))
            .unwrap_err();
        assert!(matches!(err, Error::Policy(policy::Error::EmptyBlock)));
        assert!(store.block_rules().unwrap().is_empty());
    }

    #[test]
    fn conflicting_block_scope_is_rejected() {
        let store = SiteStore::in_memory().unwrap();
        store
            .create_block_rule(&BlockRule::new("side-pre", "search_forums", cats(&[1])))
            .unwrap();
        let err = store
            .create_block_rule(&BlockRule::new(ALL_REGIONS, "search_forums", cats(&[1])))
            .unwrap_err();
        assert!(matches!(err, Error::Policy(policy::Error::CannotUseAllRegions)));
    }

    #[test]
    fn update_may_keep_its_own_scope() {
        let store = SiteStore::in_memory().unwrap();
        let record = store
            .create_block_rule(&BlockRule::new("side-pre", "search_forums", cats(&[1])))
            .unwrap();

        let changed = record.rule.clone().with_actions(BlockActions::locked());
        let updated = store.update_block_rule(record.id, &changed).unwrap();
        assert_eq!(updated.rule.actions, BlockActions::locked());
        assert_eq!(updated.created_at, record.created_at);
    }

    #[test]
    fn update_into_another_rules_scope_is_rejected() {
        let store = SiteStore::in_memory().unwrap();
        store
            .create_region_rule(&RegionRule::new("side-pre", cats(&[1])))
            .unwrap();
        let second = store
            .create_region_rule(&RegionRule::new("side-post", cats(&[1])))
            .unwrap();
        let err = store
            .update_region_rule(second.id, &RegionRule::new("side-pre", cats(&[1])))
            .unwrap_err();
        assert!(matches!(err, Error::Policy(policy::Error::DuplicateRule)));
    }

    #[test]
    fn missing_rules_are_not_found() {
        let store = SiteStore::in_memory().unwrap();
        assert!(matches!(store.region_rule(7), Err(Error::NotFound(_))));
        assert!(matches!(
            store.update_block_rule(7, &BlockRule::new("side-pre", "html", vec![])),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            store.delete_rule(RuleKind::Block, 7),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn delete_removes_rule() {
        let store = SiteStore::in_memory().unwrap();
        let record = store
            .create_region_rule(&RegionRule::new("side-pre", cats(&[1])))
            .unwrap();
        store.delete_rule(RuleKind::Region, record.id).unwrap();
        assert!(store.region_rules().unwrap().is_empty());
    }

    #[test]
    fn load_rules_keeps_storage_order() {
        let store = SiteStore::in_memory().unwrap();
        store
            .create_block_rule(&BlockRule::new("side-pre", "html", cats(&[1])))
            .unwrap();
        store
            .create_region_rule(&RegionRule::new("side-pre", cats(&[1])))
            .unwrap();
        store
            .create_block_rule(&BlockRule::new("side-pre", "calendar_month", cats(&[1])))
            .unwrap();

        let rules = store.load_rules().unwrap();
        assert_eq!(rules.len(), 3);
        let blocks: Vec<_> = rules.block_rules().map(|r| r.block.as_str()).collect();
        assert_eq!(blocks, vec!["html", "calendar_month"]);
        assert_eq!(rules.rules()[0].categories(), &cats(&[1])[..]);
    }

    #[test]
    fn import_stops_at_first_rejected_rule() {
        let store = SiteStore::in_memory().unwrap();
        let rules = RuleSet::new()
            .with(RegionRule::new("side-pre", cats(&[1])))
            .with(RegionRule::new("side-pre", cats(&[1])));
        assert!(store.import_rules(&rules).is_err());
        assert_eq!(store.region_rules().unwrap().len(), 1);
    }
}
