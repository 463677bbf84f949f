//! Site model types shared by the host traits.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }
    };
}

id_type!(
    /// Identifier of a node in the category tree.
    CategoryId
);
id_type!(
    /// Identifier of a container (a course).
    ContainerId
);
id_type!(
    /// Identifier of a module instance inside a container.
    ModuleInstanceId
);
id_type!(
    /// Identifier of a placed widget instance.
    WidgetId
);

/// A node in the category tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub parent: Option<CategoryId>,
    pub name: String,
}

/// A top-level content unit that hosts widget placements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub id: ContainerId,
    pub category: CategoryId,
    pub name: String,
    /// Layout format; the main page type is `course-view-<format>`.
    pub format: String,
}

/// An activity or resource instance inside a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleInstance {
    pub id: ModuleInstanceId,
    pub container: ContainerId,
    pub module_type: String,
}

/// A widget placed on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetInstance {
    pub id: WidgetId,
    pub block_name: String,
    pub container: ContainerId,
    pub module: Option<ModuleInstanceId>,
    pub default_region: String,
    pub default_weight: i64,
    /// Current position; differs from the defaults once repositioned.
    pub region: String,
    pub weight: i64,
    pub visible: bool,
    pub show_in_subcontexts: bool,
    pub page_type_pattern: String,
    pub sub_page_pattern: Option<String>,
    pub config_data: Option<String>,
}

/// Placement of a widget that is about to be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewWidget<'a> {
    pub block_name: &'a str,
    pub region: &'a str,
    pub weight: i64,
    pub show_in_subcontexts: bool,
    pub page_type_pattern: &'a str,
    pub sub_page_pattern: Option<&'a str>,
}

/// Instance fields that have no higher-level setter on the widget manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFields {
    pub show_in_subcontexts: bool,
    pub page_type_pattern: String,
}

/// The page a widget operation applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageContext {
    pub container: ContainerId,
    pub module: Option<ModuleInstanceId>,
    pub page_type: String,
}

impl PageContext {
    /// The main page of a container.
    pub fn course(container: &Container) -> Self {
        Self {
            container: container.id,
            module: None,
            page_type: format!("course-view-{}", container.format),
        }
    }

    /// The view page of a module instance.
    pub fn module(container: &Container, instance: &ModuleInstance) -> Self {
        Self {
            container: container.id,
            module: Some(instance.id),
            page_type: format!("mod-{}-view", instance.module_type),
        }
    }
}
