//! Setup items parsed from `||`-delimited text lines.

use crate::schema::{Field, Schema, REQUIRED_FIELDS};
use crate::{InvalidSetupItem, Result};
use host::{CategoryId, CategoryStore};
use policy::expand_categories;
use std::collections::BTreeSet;

/// Separator between the fields of a setup line.
pub const DATA_DELIMITER: &str = "||";

/// Page type pattern used when a line does not name one.
pub const PAGE_TYPE_PATTERN_DEFAULT: &str = "course-view-*";

/// What to do with a block that already exists on a target page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemMode {
    /// Move every existing instance to the second region and weight.
    Reposition,
    /// Create one more instance if the page allows it.
    AddAnother,
    /// Rewrite subcontext visibility, page type pattern, config and
    /// visibility of every existing instance.
    Update,
    /// Leave the page alone.
    Skip,
}

/// One validated setup line.
///
/// Categories are already expanded to include every descendant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupItem {
    region: String,
    categories: BTreeSet<CategoryId>,
    block_name: String,
    weight: i64,
    visible: bool,
    reposition: bool,
    config_data: String,
    add: bool,
    update: bool,
    second_region: String,
    second_weight: i64,
    show_in_subcontexts: bool,
    page_type_pattern: String,
}

/// Field values of a split line, looked up through a [`Schema`].
struct Values<'a> {
    values: Vec<&'a str>,
    schema: Schema,
}

impl<'a> Values<'a> {
    fn raw(&self, field: Field) -> Option<&'a str> {
        let position = self.schema.position(field)?;
        self.values.get(position).copied()
    }

    fn int(&self, field: Field) -> Option<i64> {
        self.raw(field)?.trim().parse().ok()
    }

    fn flag(&self, field: Field) -> Option<bool> {
        self.int(field).map(|value| value != 0)
    }

    fn text(&self, field: Field) -> Option<&'a str> {
        self.raw(field)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

/// A line that passed validation, before category expansion.
#[derive(Debug)]
struct ParsedLine {
    item: SetupItem,
    category_ids: Vec<CategoryId>,
}

fn parse_category_ids(raw: &str) -> std::result::Result<Vec<CategoryId>, InvalidSetupItem> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(InvalidSetupItem::IncorrectCategory);
    }
    raw.split(',')
        .map(|token| {
            token
                .parse::<CategoryId>()
                .map_err(|_| InvalidSetupItem::IncorrectCategory)
        })
        .collect()
}

fn parse_line(line: &str) -> std::result::Result<ParsedLine, InvalidSetupItem> {
    let values: Vec<&str> = line.trim().split(DATA_DELIMITER).collect();
    if values.len() < REQUIRED_FIELDS {
        return Err(InvalidSetupItem::NotAllRequired);
    }

    let mut values = Values {
        values,
        schema: Schema::for_reposition(false),
    };

    let region = values
        .text(Field::Region)
        .ok_or(InvalidSetupItem::EmptyRegion)?;
    let category_ids = parse_category_ids(values.raw(Field::Categories).unwrap_or_default())?;
    let block_name = values
        .text(Field::BlockName)
        .ok_or(InvalidSetupItem::EmptyBlockName)?;

    let reposition = values.flag(Field::Reposition).unwrap_or(false);
    values.schema = Schema::for_reposition(reposition);

    let add = values.flag(Field::Add).unwrap_or(false);
    let second_region = values.text(Field::SecondRegion).unwrap_or_default();
    let page_type_pattern = values.raw(Field::PageTypePattern).map(str::trim);

    if reposition && second_region.is_empty() {
        return Err(InvalidSetupItem::EmptySecondRegion);
    }
    if reposition && add {
        return Err(InvalidSetupItem::ConflictReposition);
    }
    if page_type_pattern.is_some_and(str::is_empty) {
        return Err(InvalidSetupItem::EmptyPageTypePattern);
    }

    // Config data is an opaque payload and is kept untrimmed.
    let config_data = values
        .raw(Field::ConfigData)
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_default();

    let item = SetupItem {
        region: region.to_string(),
        categories: BTreeSet::new(),
        block_name: block_name.to_string(),
        weight: values.int(Field::Weight).unwrap_or(0),
        visible: values.flag(Field::Visible).unwrap_or(true),
        reposition,
        config_data: config_data.to_string(),
        add,
        update: values.flag(Field::Update).unwrap_or(false),
        second_region: second_region.to_string(),
        second_weight: values.int(Field::SecondWeight).unwrap_or(0),
        show_in_subcontexts: values.flag(Field::ShowInSubcontexts).unwrap_or(false),
        page_type_pattern: page_type_pattern
            .unwrap_or(PAGE_TYPE_PATTERN_DEFAULT)
            .to_string(),
    };

    Ok(ParsedLine { item, category_ids })
}

impl SetupItem {
    /// Parse and validate one setup line.
    ///
    /// Category ids are expanded against `store`; ids that do not resolve
    /// are dropped, which may leave the item with no categories at all.
    pub fn parse<S>(line: &str, store: &S) -> Result<Self>
    where
        S: CategoryStore + ?Sized,
    {
        let ParsedLine {
            mut item,
            category_ids,
        } = parse_line(line)?;
        item.categories = expand_categories(store, category_ids)?;
        Ok(item)
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn categories(&self) -> &BTreeSet<CategoryId> {
        &self.categories
    }

    pub fn block_name(&self) -> &str {
        &self.block_name
    }

    pub fn weight(&self) -> i64 {
        self.weight
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn reposition(&self) -> bool {
        self.reposition
    }

    /// Empty when the line carries none.
    pub fn config_data(&self) -> &str {
        &self.config_data
    }

    pub fn add(&self) -> bool {
        self.add
    }

    pub fn update(&self) -> bool {
        self.update
    }

    pub fn second_region(&self) -> &str {
        &self.second_region
    }

    pub fn second_weight(&self) -> i64 {
        self.second_weight
    }

    pub fn show_in_subcontexts(&self) -> bool {
        self.show_in_subcontexts
    }

    pub fn page_type_pattern(&self) -> &str {
        &self.page_type_pattern
    }

    /// Module type targeted by a `mod-<type>-...` pattern.
    ///
    /// `None` means the item targets the course page itself.
    pub fn module_type(&self) -> Option<&str> {
        let mut segments = self.page_type_pattern.split('-');
        match segments.next() {
            Some("mod") => Some(segments.next().unwrap_or_default()),
            _ => None,
        }
    }

    /// How an already present block is handled. Repositioning wins over
    /// adding, and adding over updating.
    pub fn mode(&self) -> ItemMode {
        if self.reposition {
            ItemMode::Reposition
        } else if self.add {
            ItemMode::AddAnother
        } else if self.update {
            ItemMode::Update
        } else {
            ItemMode::Skip
        }
    }
}
