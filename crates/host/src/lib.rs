//! Host collaborator contracts for blockgate.
//!
//! The locking engine and the setup pipeline never talk to a concrete
//! content-management platform. Everything they need from the surrounding
//! site goes through the traits in this crate:
//!
//! - [`CategoryStore`] resolves categories, their descendants and the
//!   containers (courses) filed directly under them.
//! - [`ModuleCatalogue`] lists installed module types and their instances
//!   inside a container.
//! - [`WidgetHost`] is the page-level widget manager: regions, default
//!   widgets, creation, visibility, configuration and positioning.
//! - [`Authorizer`] answers whether the acting user may bypass locking.
//! - [`Logger`] receives the human-readable outcome of every setup step.
//!
//! Page state is never ambient: every [`WidgetHost`] call receives the
//! [`PageContext`] it operates on.

mod error;
mod logger;
mod model;
mod site;

pub use error::{Error, Result};
pub use logger::{Logger, MemoryLogger, TracingLogger};
pub use model::{
    Category, CategoryId, Container, ContainerId, ModuleInstance, ModuleInstanceId, NewWidget,
    PageContext, RawFields, WidgetId, WidgetInstance,
};
pub use site::{Authorizer, CategoryStore, FixedAuthorizer, ModuleCatalogue, Site, WidgetHost};
