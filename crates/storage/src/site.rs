//! Host collaborator implementations for [`SiteStore`].

use crate::store::{module_key, widget_from_row, WIDGET_COLUMNS};
use crate::{Result, SiteStore, LOCKING_WIDGET_MANAGER, WIDGET_MANAGER_SETTING};
use host::{
    Category, CategoryId, CategoryStore, Container, ContainerId, ModuleCatalogue,
    ModuleInstance, ModuleInstanceId, NewWidget, PageContext, RawFields, WidgetHost,
    WidgetInstance, WidgetId,
};
use rusqlite::{params, OptionalExtension, Row};
use std::collections::{BTreeMap, BTreeSet};

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: CategoryId(row.get(0)?),
        parent: row.get::<_, Option<i64>>(1)?.map(CategoryId),
        name: row.get(2)?,
    })
}

fn container_from_row(row: &Row<'_>) -> rusqlite::Result<Container> {
    Ok(Container {
        id: ContainerId(row.get(0)?),
        category: CategoryId(row.get(1)?),
        name: row.get(2)?,
        format: row.get(3)?,
    })
}

impl SiteStore {
    fn find_category(&self, id: CategoryId) -> Result<Option<Category>> {
        let category = self
            .conn
            .query_row(
                "SELECT id, parent, name FROM categories WHERE id = ?1",
                [id.0],
                category_from_row,
            )
            .optional()?;
        Ok(category)
    }

    fn find_descendants(&self, category: &Category) -> Result<Vec<CategoryId>> {
        let mut stmt = self.conn.prepare(
            "WITH RECURSIVE below(id) AS (
                 SELECT id FROM categories WHERE parent = ?1
                 UNION ALL
                 SELECT c.id FROM categories c JOIN below ON c.parent = below.id
             )
             SELECT id FROM below",
        )?;
        let ids = stmt
            .query_map([category.id.0], |row| row.get(0).map(CategoryId))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids)
    }

    fn count_containers(&self, category: &Category) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM containers WHERE category = ?1",
            [category.id.0],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn find_containers(&self, category: &Category) -> Result<Vec<Container>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, category, name, format FROM containers WHERE category = ?1 ORDER BY id",
        )?;
        let containers = stmt
            .query_map([category.id.0], container_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(containers)
    }

    fn find_module_types(&self) -> Result<BTreeSet<String>> {
        let mut stmt = self.conn.prepare("SELECT name FROM module_types")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<BTreeSet<String>>>()?;
        Ok(names)
    }

    fn find_module_instances(
        &self,
        module_type: &str,
        container: &Container,
    ) -> Result<BTreeMap<ModuleInstanceId, ModuleInstance>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, container, module_type FROM module_instances
             WHERE module_type = ?1 AND container = ?2 ORDER BY id",
        )?;
        let instances = stmt
            .query_map(params![module_type, container.id.0], |row| {
                Ok(ModuleInstance {
                    id: ModuleInstanceId(row.get(0)?),
                    container: ContainerId(row.get(1)?),
                    module_type: row.get(2)?,
                })
            })?
            .map(|instance| instance.map(|i| (i.id, i)))
            .collect::<rusqlite::Result<BTreeMap<_, _>>>()?;
        Ok(instances)
    }

    fn locking_installed(&self) -> Result<bool> {
        Ok(self.setting(WIDGET_MANAGER_SETTING)?.as_deref() == Some(LOCKING_WIDGET_MANAGER))
    }

    fn insert_region(&self, page: &PageContext, region: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO page_regions (container, module, region) VALUES (?1, ?2, ?3)",
            params![page.container.0, module_key(page), region],
        )?;
        Ok(())
    }

    fn create_default_widgets(&self, page: &PageContext) -> Result<()> {
        let created = self.conn.execute(
            "INSERT OR IGNORE INTO pages (container, module, page_type) VALUES (?1, ?2, ?3)",
            params![page.container.0, module_key(page), page.page_type],
        )?;
        if created == 0 {
            return Ok(());
        }

        let inserted = self.conn.execute(
            "INSERT INTO widget_instances (block_name, container, module, default_region,
                 default_weight, region, weight, page_type_pattern)
             SELECT block_name, ?1, ?2, region, weight, region, weight, ?3
             FROM default_widgets ORDER BY rowid",
            params![page.container.0, module_key(page), page.page_type],
        )?;
        tracing::debug!(page = %page.page_type, container = %page.container, inserted, "created default widgets");
        Ok(())
    }

    fn widget_present(&self, page: &PageContext, block_name: &str) -> Result<bool> {
        let present = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM widget_instances
                 WHERE container = ?1 AND module = ?2 AND block_name = ?3)",
            params![page.container.0, module_key(page), block_name],
            |row| row.get(0),
        )?;
        Ok(present)
    }

    fn find_addable(&self, page: &PageContext) -> Result<BTreeSet<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM widget_types
             WHERE allow_multiple = 1
                OR name NOT IN (SELECT block_name FROM widget_instances
                                WHERE container = ?1 AND module = ?2)",
        )?;
        let names = stmt
            .query_map(params![page.container.0, module_key(page)], |row| row.get(0))?
            .collect::<rusqlite::Result<BTreeSet<String>>>()?;
        Ok(names)
    }

    fn insert_widget(&self, page: &PageContext, widget: &NewWidget<'_>) -> Result<WidgetInstance> {
        self.conn.execute(
            "INSERT INTO widget_instances (block_name, container, module, default_region,
                 default_weight, region, weight, show_in_subcontexts, page_type_pattern,
                 sub_page_pattern)
             VALUES (?1, ?2, ?3, ?4, ?5, ?4, ?5, ?6, ?7, ?8)",
            params![
                widget.block_name,
                page.container.0,
                module_key(page),
                widget.region,
                widget.weight,
                widget.show_in_subcontexts,
                widget.page_type_pattern,
                widget.sub_page_pattern,
            ],
        )?;
        self.widget(WidgetId(self.conn.last_insert_rowid()))
    }

    fn find_widgets(&self, page: &PageContext, block_name: &str) -> Result<Vec<WidgetInstance>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {WIDGET_COLUMNS} FROM widget_instances
             WHERE container = ?1 AND module = ?2 AND block_name = ?3 ORDER BY id"
        ))?;
        let widgets = stmt
            .query_map(
                params![page.container.0, module_key(page), block_name],
                widget_from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(widgets)
    }

    fn update_widget(&self, sql: &str, widget: &WidgetInstance, values: impl rusqlite::Params) -> Result<()> {
        let updated = self.conn.execute(sql, values)?;
        if updated == 0 {
            return Err(crate::Error::NotFound(format!("widget instance {}", widget.id)));
        }
        Ok(())
    }
}

impl CategoryStore for SiteStore {
    fn category(&self, id: CategoryId) -> host::Result<Option<Category>> {
        Ok(self.find_category(id)?)
    }

    fn descendant_ids(&self, category: &Category) -> host::Result<Vec<CategoryId>> {
        Ok(self.find_descendants(category)?)
    }

    fn has_containers(&self, category: &Category) -> host::Result<bool> {
        Ok(self.count_containers(category)? > 0)
    }

    fn containers_of(&self, category: &Category) -> host::Result<Vec<Container>> {
        Ok(self.find_containers(category)?)
    }
}

impl ModuleCatalogue for SiteStore {
    fn installed_module_types(&self) -> host::Result<BTreeSet<String>> {
        Ok(self.find_module_types()?)
    }

    fn module_instances_of(
        &self,
        module_type: &str,
        container: &Container,
    ) -> host::Result<BTreeMap<ModuleInstanceId, ModuleInstance>> {
        Ok(self.find_module_instances(module_type, container)?)
    }
}

impl WidgetHost for SiteStore {
    fn supports_locking(&self, _page: &PageContext) -> host::Result<bool> {
        Ok(self.locking_installed()?)
    }

    fn add_region(&self, page: &PageContext, region: &str) -> host::Result<()> {
        Ok(self.insert_region(page, region)?)
    }

    fn ensure_default_widgets(&self, page: &PageContext) -> host::Result<()> {
        Ok(self.create_default_widgets(page)?)
    }

    fn is_widget_present(&self, page: &PageContext, block_name: &str) -> host::Result<bool> {
        Ok(self.widget_present(page, block_name)?)
    }

    fn addable_widget_types(&self, page: &PageContext) -> host::Result<BTreeSet<String>> {
        Ok(self.find_addable(page)?)
    }

    fn create_widget(
        &self,
        page: &PageContext,
        widget: &NewWidget<'_>,
    ) -> host::Result<WidgetInstance> {
        Ok(self.insert_widget(page, widget)?)
    }

    fn set_visibility(
        &self,
        _page: &PageContext,
        widget: &WidgetInstance,
        visible: bool,
    ) -> host::Result<()> {
        Ok(self.update_widget(
            "UPDATE widget_instances SET visible = ?1 WHERE id = ?2",
            widget,
            params![visible, widget.id.0],
        )?)
    }

    fn set_config_data(&self, widget: &WidgetInstance, config_data: &str) -> host::Result<()> {
        Ok(self.update_widget(
            "UPDATE widget_instances SET config_data = ?1 WHERE id = ?2",
            widget,
            params![config_data, widget.id.0],
        )?)
    }

    fn reposition(
        &self,
        _page: &PageContext,
        widget: &WidgetInstance,
        region: &str,
        weight: i64,
    ) -> host::Result<()> {
        Ok(self.update_widget(
            "UPDATE widget_instances SET region = ?1, weight = ?2 WHERE id = ?3",
            widget,
            params![region, weight, widget.id.0],
        )?)
    }

    fn widgets_by_type(
        &self,
        page: &PageContext,
        block_name: &str,
    ) -> host::Result<Vec<WidgetInstance>> {
        Ok(self.find_widgets(page, block_name)?)
    }

    fn update_raw_fields(&self, widget: &WidgetInstance, fields: &RawFields) -> host::Result<()> {
        Ok(self.update_widget(
            "UPDATE widget_instances SET show_in_subcontexts = ?1, page_type_pattern = ?2
             WHERE id = ?3",
            widget,
            params![fields.show_in_subcontexts, fields.page_type_pattern, widget.id.0],
        )?)
    }
}
