//! Category closure expansion.

use host::{CategoryId, CategoryStore};
use std::collections::BTreeSet;

/// Expand `ids` to themselves plus every descendant.
///
/// Ids that do not resolve to a category are dropped. The category tree
/// cannot contain cycles, so each lookup costs one descent.
pub fn expand_categories<S>(
    store: &S,
    ids: impl IntoIterator<Item = CategoryId>,
) -> host::Result<BTreeSet<CategoryId>>
where
    S: CategoryStore + ?Sized,
{
    let mut expanded = BTreeSet::new();
    for id in ids {
        if expanded.contains(&id) {
            continue;
        }
        let Some(category) = store.category(id)? else {
            continue;
        };
        expanded.insert(category.id);
        expanded.extend(store.descendant_ids(&category)?);
    }
    Ok(expanded)
}
