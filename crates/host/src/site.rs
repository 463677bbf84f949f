//! Collaborator traits implemented by a site backend.

use crate::model::{
    Category, CategoryId, Container, ModuleInstance, ModuleInstanceId, NewWidget, PageContext,
    RawFields, WidgetInstance,
};
use crate::Result;
use std::collections::{BTreeMap, BTreeSet};

/// Read access to the category tree.
pub trait CategoryStore {
    /// Resolve a category by id. Unknown ids yield `Ok(None)`.
    fn category(&self, id: CategoryId) -> Result<Option<Category>>;

    /// Every id below `category`, at any depth.
    fn descendant_ids(&self, category: &Category) -> Result<Vec<CategoryId>>;

    /// Whether any container is filed directly under `category`.
    fn has_containers(&self, category: &Category) -> Result<bool>;

    /// Containers filed directly under `category`.
    fn containers_of(&self, category: &Category) -> Result<Vec<Container>>;
}

/// Installed module types and their instances.
pub trait ModuleCatalogue {
    fn installed_module_types(&self) -> Result<BTreeSet<String>>;

    fn module_instances_of(
        &self,
        module_type: &str,
        container: &Container,
    ) -> Result<BTreeMap<ModuleInstanceId, ModuleInstance>>;
}

/// The widget manager of a page.
///
/// Every call receives the page it acts on explicitly.
pub trait WidgetHost {
    /// Whether the page's widget manager enforces locking rules.
    ///
    /// The setup pipeline refuses to run against a manager that does not.
    fn supports_locking(&self, page: &PageContext) -> Result<bool>;

    fn add_region(&self, page: &PageContext, region: &str) -> Result<()>;

    /// Create the page's default widgets if that has not happened yet.
    fn ensure_default_widgets(&self, page: &PageContext) -> Result<()>;

    fn is_widget_present(&self, page: &PageContext, block_name: &str) -> Result<bool>;

    fn addable_widget_types(&self, page: &PageContext) -> Result<BTreeSet<String>>;

    fn create_widget(&self, page: &PageContext, widget: &NewWidget<'_>) -> Result<WidgetInstance>;

    fn set_visibility(
        &self,
        page: &PageContext,
        widget: &WidgetInstance,
        visible: bool,
    ) -> Result<()>;

    fn set_config_data(&self, widget: &WidgetInstance, config_data: &str) -> Result<()>;

    fn reposition(
        &self,
        page: &PageContext,
        widget: &WidgetInstance,
        region: &str,
        weight: i64,
    ) -> Result<()>;

    fn widgets_by_type(&self, page: &PageContext, block_name: &str)
        -> Result<Vec<WidgetInstance>>;

    /// Overwrite fields the widget manager exposes no setter for.
    fn update_raw_fields(&self, widget: &WidgetInstance, fields: &RawFields) -> Result<()>;
}

/// Everything the setup pipeline needs from a site.
pub trait Site: CategoryStore + ModuleCatalogue + WidgetHost {}

impl<T: CategoryStore + ModuleCatalogue + WidgetHost + ?Sized> Site for T {}

/// Capability checks for the acting user, evaluated against the system scope.
pub trait Authorizer {
    fn has_bypass_capability(&self) -> bool;
}

impl<A: Authorizer + ?Sized> Authorizer for &A {
    fn has_bypass_capability(&self) -> bool {
        (**self).has_bypass_capability()
    }
}

/// An authorizer with a fixed answer, e.g. taken from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixedAuthorizer {
    bypass: bool,
}

impl FixedAuthorizer {
    pub fn new(bypass: bool) -> Self {
        Self { bypass }
    }

    /// A user holding the bypass capability.
    pub fn bypass() -> Self {
        Self::new(true)
    }

    /// A user without any locking capability.
    pub fn restricted() -> Self {
        Self::new(false)
    }
}

impl Authorizer for FixedAuthorizer {
    fn has_bypass_capability(&self) -> bool {
        self.bypass
    }
}
