//! Applies setup items to every page they target.

use crate::item::{ItemMode, SetupItem};
use crate::{Error, Result};
use host::{
    Category, CategoryId, Container, ContainerId, Logger, ModuleInstance, NewWidget, PageContext,
    RawFields, Site, WidgetInstance,
};
use std::collections::BTreeSet;
use std::fmt;

/// A page an item is applied to, as named in log lines.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target<'a> {
    Category(CategoryId),
    Course(ContainerId),
    Module {
        module_type: &'a str,
        instance: &'a ModuleInstance,
        container: ContainerId,
    },
}

impl fmt::Display for Target<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Category(category) => write!(f, "category {category}"),
            Target::Course(container) => write!(f, "course {container}"),
            Target::Module {
                module_type,
                instance,
                container,
            } => write!(f, "{module_type} {} in course {container}", instance.id),
        }
    }
}

/// Places, moves and updates blocks as described by setup items.
///
/// Every outcome is reported through the logger. Only a site whose widget
/// manager does not enforce locking stops processing, see
/// [`Error::ManagerNotConfigured`].
pub struct SetupItemProcessor<'a, H: ?Sized, L> {
    site: &'a H,
    logger: L,
}

impl<'a, H, L> SetupItemProcessor<'a, H, L>
where
    H: Site + ?Sized,
    L: Logger,
{
    pub fn new(site: &'a H, logger: L) -> Self {
        Self { site, logger }
    }

    /// Process items in order.
    ///
    /// A failing item is logged and the next one is processed. A
    /// misconfigured widget manager aborts the whole run.
    pub fn process_bulk<'i>(&self, items: impl IntoIterator<Item = &'i SetupItem>) -> Result<()> {
        for item in items {
            match self.process(item) {
                Ok(()) => {}
                Err(err @ Error::ManagerNotConfigured(_)) => return Err(err),
                Err(err) => self.logger.log_message(&format!(
                    "Error processing block {}. Error: {err}",
                    item.block_name()
                )),
            }
        }
        Ok(())
    }

    /// Apply one item to every course page, or every module page, it targets.
    ///
    /// A host failure on one category or container is logged and the
    /// remaining ones are still visited.
    pub fn process(&self, item: &SetupItem) -> Result<()> {
        let containers = self.containers(item)?;

        let Some(module_type) = item.module_type() else {
            for container in &containers {
                let page = PageContext::course(container);
                self.apply(item, &page, &Target::Course(container.id))?;
            }
            return Ok(());
        };

        if !self.site.installed_module_types()?.contains(module_type) {
            self.logger
                .log_message(&format!("Module type {module_type} was not found, skipping"));
            return Ok(());
        }

        for container in &containers {
            let instances = match self.site.module_instances_of(module_type, container) {
                Ok(instances) => instances,
                Err(err) => {
                    self.report(item, &Target::Course(container.id), &err.into());
                    continue;
                }
            };
            if instances.is_empty() {
                self.logger.log_message(&format!(
                    "No {module_type} instances found in course {}, skipping",
                    container.id
                ));
                continue;
            }

            for instance in instances.values() {
                let page = PageContext::module(container, instance);
                let target = Target::Module {
                    module_type,
                    instance,
                    container: container.id,
                };
                self.apply(item, &page, &target)?;
            }
        }
        Ok(())
    }

    /// Containers filed under the item's categories, each once.
    fn containers(&self, item: &SetupItem) -> Result<Vec<Container>> {
        let mut seen = BTreeSet::new();
        let mut containers = Vec::new();
        for id in item.categories() {
            let Some(category) = self.site.category(*id)? else {
                continue;
            };
            match self.containers_of(&category) {
                Ok(found) => {
                    for container in found {
                        if seen.insert(container.id) {
                            containers.push(container);
                        }
                    }
                }
                Err(err) => self.report(item, &Target::Category(category.id), &err.into()),
            }
        }
        Ok(containers)
    }

    fn containers_of(&self, category: &Category) -> host::Result<Vec<Container>> {
        if !self.site.has_containers(category)? {
            return Ok(Vec::new());
        }
        self.site.containers_of(category)
    }

    fn apply(&self, item: &SetupItem, page: &PageContext, target: &Target<'_>) -> Result<()> {
        if !self.site.supports_locking(page)? {
            return Err(Error::ManagerNotConfigured(page.page_type.clone()));
        }

        if let Err(err) = self.place(item, page, target) {
            self.report(item, target, &err);
        }
        Ok(())
    }

    fn report(&self, item: &SetupItem, target: &Target<'_>, err: &Error) {
        tracing::warn!(block = item.block_name(), %target, error = %err, "setup item failed");
        self.logger.log_message(&format!(
            "Error processing block {} for {target}. Error: {err}",
            item.block_name()
        ));
    }

    fn place(&self, item: &SetupItem, page: &PageContext, target: &Target<'_>) -> Result<()> {
        let block = item.block_name();
        self.site.add_region(page, item.region())?;
        self.site.ensure_default_widgets(page)?;

        if !self.site.is_widget_present(page, block)? {
            if !self.is_addable(page, block)? {
                self.logger.log_message(&format!(
                    "Skipped adding new instance of {block}. The block is not addable for {target}"
                ));
                return Ok(());
            }
            self.add_widget(page, item)?;
            self.logger
                .log_message(&format!("Added a new instance of {block} to {target}"));
            return Ok(());
        }

        match item.mode() {
            ItemMode::Reposition => {
                for widget in self.site.widgets_by_type(page, block)? {
                    self.site.reposition(
                        page,
                        &widget,
                        item.second_region(),
                        item.second_weight(),
                    )?;
                    self.logger
                        .log_message(&format!("Changed position of {block} in {target}"));
                }
            }
            ItemMode::AddAnother => {
                if self.is_addable(page, block)? {
                    self.add_widget(page, item)?;
                    self.logger
                        .log_message(&format!("Added another instance of {block} to {target}"));
                } else {
                    self.logger.log_message(&format!(
                        "Skipped adding another instance of {block}. The block is not addable for {target}"
                    ));
                }
            }
            ItemMode::Update => {
                for widget in self.site.widgets_by_type(page, block)? {
                    self.update_widget(page, &widget, item)?;
                    self.logger
                        .log_message(&format!("Updated instance of {block} in {target}"));
                }
            }
            ItemMode::Skip => {
                self.logger.log_message(&format!(
                    "Skipped adding another instance of {block}. The block already exists in {target}"
                ));
            }
        }
        Ok(())
    }

    fn is_addable(&self, page: &PageContext, block: &str) -> Result<bool> {
        Ok(self.site.addable_widget_types(page)?.contains(block))
    }

    fn add_widget(&self, page: &PageContext, item: &SetupItem) -> Result<WidgetInstance> {
        let widget = self.site.create_widget(
            page,
            &NewWidget {
                block_name: item.block_name(),
                region: item.region(),
                weight: item.weight(),
                show_in_subcontexts: item.show_in_subcontexts(),
                page_type_pattern: item.page_type_pattern(),
                sub_page_pattern: None,
            },
        )?;
        self.site.set_visibility(page, &widget, item.visible())?;
        if !item.config_data().is_empty() {
            self.site.set_config_data(&widget, item.config_data())?;
        }
        Ok(widget)
    }

    fn update_widget(
        &self,
        page: &PageContext,
        widget: &WidgetInstance,
        item: &SetupItem,
    ) -> Result<()> {
        self.site.update_raw_fields(
            widget,
            &RawFields {
                show_in_subcontexts: item.show_in_subcontexts(),
                page_type_pattern: item.page_type_pattern().to_string(),
            },
        )?;
        if !item.config_data().is_empty() {
            self.site.set_config_data(widget, item.config_data())?;
        }
        self.site.set_visibility(page, widget, item.visible())?;
        Ok(())
    }
}
