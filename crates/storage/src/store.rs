//! SQLite site store: schema, seeding and inspection.

use crate::{Error, Result};
use host::{
    Category, CategoryId, Container, ContainerId, ModuleInstance, ModuleInstanceId,
    PageContext, WidgetId, WidgetInstance,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// Setting naming the widget manager the site runs.
pub const WIDGET_MANAGER_SETTING: &str = "widget_manager";

/// Value of [`WIDGET_MANAGER_SETTING`] for the locking-aware manager.
pub const LOCKING_WIDGET_MANAGER: &str = "locking";

pub(crate) const WIDGET_COLUMNS: &str = "id, block_name, container, module, default_region, \
     default_weight, region, weight, visible, show_in_subcontexts, page_type_pattern, \
     sub_page_pattern, config_data";

/// SQLite-backed site.
///
/// Holds the category tree, containers, module instances and widget
/// placements, plus the locking rule tables.
pub struct SiteStore {
    pub(crate) conn: Connection,
}

impl SiteStore {
    /// Open or create a site database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory site (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                name TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                parent INTEGER REFERENCES categories(id),
                name TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_categories_parent
                ON categories(parent);
            CREATE TABLE IF NOT EXISTS containers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                category INTEGER NOT NULL REFERENCES categories(id),
                name TEXT NOT NULL,
                format TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_containers_category
                ON containers(category);
            CREATE TABLE IF NOT EXISTS module_types (
                name TEXT PRIMARY KEY
            );
            CREATE TABLE IF NOT EXISTS module_instances (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                container INTEGER NOT NULL REFERENCES containers(id),
                module_type TEXT NOT NULL REFERENCES module_types(name)
            );
            CREATE TABLE IF NOT EXISTS widget_types (
                name TEXT PRIMARY KEY,
                allow_multiple INTEGER NOT NULL DEFAULT 0
            );
            CREATE TABLE IF NOT EXISTS default_widgets (
                block_name TEXT NOT NULL,
                region TEXT NOT NULL,
                weight INTEGER NOT NULL DEFAULT 0
            );
            -- module = 0 is the container's main page
            CREATE TABLE IF NOT EXISTS pages (
                container INTEGER NOT NULL,
                module INTEGER NOT NULL DEFAULT 0,
                page_type TEXT NOT NULL,
                PRIMARY KEY (container, module)
            );
            CREATE TABLE IF NOT EXISTS page_regions (
                container INTEGER NOT NULL,
                module INTEGER NOT NULL DEFAULT 0,
                region TEXT NOT NULL,
                PRIMARY KEY (container, module, region)
            );
            CREATE TABLE IF NOT EXISTS widget_instances (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                block_name TEXT NOT NULL,
                container INTEGER NOT NULL,
                module INTEGER NOT NULL DEFAULT 0,
                default_region TEXT NOT NULL,
                default_weight INTEGER NOT NULL,
                region TEXT NOT NULL,
                weight INTEGER NOT NULL,
                visible INTEGER NOT NULL DEFAULT 1,
                show_in_subcontexts INTEGER NOT NULL DEFAULT 0,
                page_type_pattern TEXT NOT NULL,
                sub_page_pattern TEXT,
                config_data TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_widget_instances_page
                ON widget_instances(container, module, block_name);
            CREATE TABLE IF NOT EXISTS region_rules (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                region TEXT NOT NULL,
                categories TEXT NOT NULL,
                config INTEGER NOT NULL,
                remove INTEGER NOT NULL,
                hide INTEGER NOT NULL,
                movein INTEGER NOT NULL,
                move INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS block_rules (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                region TEXT NOT NULL,
                block TEXT NOT NULL,
                categories TEXT NOT NULL,
                config INTEGER NOT NULL,
                remove INTEGER NOT NULL,
                hide INTEGER NOT NULL,
                move INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_block_rules_block
                ON block_rules(block);
            "#,
        )?;
        Ok(())
    }

    /// Read a site setting.
    pub fn setting(&self, name: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE name = ?1",
                [name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Write a site setting.
    pub fn set_setting(&self, name: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO settings (name, value) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET value = excluded.value",
            params![name, value],
        )?;
        Ok(())
    }

    /// Install the locking-aware widget manager.
    pub fn enable_locking(&self) -> Result<()> {
        self.set_setting(WIDGET_MANAGER_SETTING, LOCKING_WIDGET_MANAGER)
    }

    pub fn add_category(&self, name: &str, parent: Option<CategoryId>) -> Result<Category> {
        self.conn.execute(
            "INSERT INTO categories (parent, name) VALUES (?1, ?2)",
            params![parent.map(|p| p.0), name],
        )?;
        Ok(Category {
            id: CategoryId(self.conn.last_insert_rowid()),
            parent,
            name: name.to_string(),
        })
    }

    pub fn add_container(
        &self,
        category: CategoryId,
        name: &str,
        format: &str,
    ) -> Result<Container> {
        self.conn.execute(
            "INSERT INTO containers (category, name, format) VALUES (?1, ?2, ?3)",
            params![category.0, name, format],
        )?;
        Ok(Container {
            id: ContainerId(self.conn.last_insert_rowid()),
            category,
            name: name.to_string(),
            format: format.to_string(),
        })
    }

    pub fn install_module(&self, module_type: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO module_types (name) VALUES (?1)",
            [module_type],
        )?;
        Ok(())
    }

    pub fn add_module_instance(
        &self,
        container: ContainerId,
        module_type: &str,
    ) -> Result<ModuleInstance> {
        self.conn.execute(
            "INSERT INTO module_instances (container, module_type) VALUES (?1, ?2)",
            params![container.0, module_type],
        )?;
        Ok(ModuleInstance {
            id: ModuleInstanceId(self.conn.last_insert_rowid()),
            container,
            module_type: module_type.to_string(),
        })
    }

    /// Install a widget type. Unless `allow_multiple` is set, a page can
    /// hold at most one instance of it.
    pub fn install_widget_type(&self, name: &str, allow_multiple: bool) -> Result<()> {
        self.conn.execute(
            "INSERT INTO widget_types (name, allow_multiple) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET allow_multiple = excluded.allow_multiple",
            params![name, allow_multiple],
        )?;
        Ok(())
    }

    /// Register a widget every page receives when it is first set up.
    pub fn add_default_widget(&self, block_name: &str, region: &str, weight: i64) -> Result<()> {
        self.conn.execute(
            "INSERT INTO default_widgets (block_name, region, weight) VALUES (?1, ?2, ?3)",
            params![block_name, region, weight],
        )?;
        Ok(())
    }

    /// Fetch a widget instance by id.
    pub fn widget(&self, id: WidgetId) -> Result<WidgetInstance> {
        self.conn
            .query_row(
                &format!("SELECT {WIDGET_COLUMNS} FROM widget_instances WHERE id = ?1"),
                [id.0],
                widget_from_row,
            )
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("widget instance {id}")))
    }

    /// All instances of a widget type across every page, oldest first.
    pub fn widgets(&self, block_name: &str) -> Result<Vec<WidgetInstance>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {WIDGET_COLUMNS} FROM widget_instances WHERE block_name = ?1 ORDER BY id"
        ))?;
        let widgets = stmt
            .query_map([block_name], widget_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(widgets)
    }

    /// Regions declared on a page, in name order.
    pub fn page_regions(&self, page: &PageContext) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT region FROM page_regions WHERE container = ?1 AND module = ?2 ORDER BY region",
        )?;
        let regions = stmt
            .query_map(params![page.container.0, module_key(page)], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(regions)
    }
}

/// Key of a page in the `module` columns.
pub(crate) fn module_key(page: &PageContext) -> i64 {
    page.module.map_or(0, |m| m.0)
}

pub(crate) fn widget_from_row(row: &Row<'_>) -> rusqlite::Result<WidgetInstance> {
    let module: i64 = row.get(3)?;
    Ok(WidgetInstance {
        id: WidgetId(row.get(0)?),
        block_name: row.get(1)?,
        container: ContainerId(row.get(2)?),
        module: (module != 0).then_some(ModuleInstanceId(module)),
        default_region: row.get(4)?,
        default_weight: row.get(5)?,
        region: row.get(6)?,
        weight: row.get(7)?,
        visible: row.get(8)?,
        show_in_subcontexts: row.get(9)?,
        page_type_pattern: row.get(10)?,
        sub_page_pattern: row.get(11)?,
        config_data: row.get(12)?,
    })
}
