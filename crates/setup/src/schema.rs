//! Positional layout of a setup line.
//!
//! ```text
//! region||categories||blockname||weight||visible||reposition||configdata||add||update||[secondregion||secondweight||]showinsubcontexts||pagetypepattern
//! ```
//!
//! The bracketed pair is only present when `reposition` is set, which
//! shifts the two trailing fields by two slots.

/// A field of a setup line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Region,
    Categories,
    BlockName,
    Weight,
    Visible,
    Reposition,
    ConfigData,
    Add,
    Update,
    SecondRegion,
    SecondWeight,
    ShowInSubcontexts,
    PageTypePattern,
}

const STANDARD: [Field; 11] = [
    Field::Region,
    Field::Categories,
    Field::BlockName,
    Field::Weight,
    Field::Visible,
    Field::Reposition,
    Field::ConfigData,
    Field::Add,
    Field::Update,
    Field::ShowInSubcontexts,
    Field::PageTypePattern,
];

const REPOSITIONING: [Field; 13] = [
    Field::Region,
    Field::Categories,
    Field::BlockName,
    Field::Weight,
    Field::Visible,
    Field::Reposition,
    Field::ConfigData,
    Field::Add,
    Field::Update,
    Field::SecondRegion,
    Field::SecondWeight,
    Field::ShowInSubcontexts,
    Field::PageTypePattern,
];

/// Number of fields every line must carry.
pub const REQUIRED_FIELDS: usize = 3;

/// Ordered field table for one value of the `reposition` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    fields: &'static [Field],
}

impl Schema {
    /// Layout of a line whose `reposition` flag is `reposition`.
    ///
    /// Everything up to and including `reposition` sits at the same slot in
    /// both layouts, so the flag can be read with either one first.
    pub fn for_reposition(reposition: bool) -> Self {
        let fields: &'static [Field] = if reposition {
            &REPOSITIONING
        } else {
            &STANDARD
        };
        Self { fields }
    }

    /// Slot of `field`, if this layout has it.
    pub fn position(&self, field: Field) -> Option<usize> {
        self.fields.iter().position(|f| *f == field)
    }

    pub fn fields(&self) -> &'static [Field] {
        self.fields
    }
}
