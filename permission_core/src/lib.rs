//! # Permission Core
//!
//! Object-level permission resolution. Applications attach *permission
//! logics* to their model types so that a check such as
//! `"blog.change_article"` can depend on the state of the article being
//! changed (is the user its author? a collaborator? staff?) instead of only
//! on static grants.
//!
//! The moving parts:
//!
//! 1. **Field lookup**: walks `__`-delimited relation paths on an object
//!    graph and reports what it found as a [`Lookup`].
//!
//! 2. **Permission logics**: rules implementing [`PermissionLogic`], such as
//!    [`AuthorPermissionLogic`] or [`GroupInPermissionLogic`].
//!
//! 3. **Handlers**: an ordered set of logics bound to one model type. The
//!    first logic that grants wins.
//!
//! 4. **Registry**: maps model types to handlers, falling back along the
//!    declared type hierarchy and finally to a default handler.
//!
//! 5. **Backend**: the entry point an authorization dispatcher calls.
//!
//! The authentication system and the object store are external; they are
//! reached through the [`Subject`], [`Model`] and [`Relation`] traits. The
//! [`memory`] module provides in-memory implementations of both.

pub mod backend;
pub mod config;
pub mod error;
pub mod guard;
pub mod handler;
pub mod logic;
pub mod lookup;
pub mod memory;
pub mod model;
pub mod permission;
pub mod registry;
pub mod subject;

// Re-export key types and traits for convenience
pub use backend::PermissionBackend;
pub use config::PermissionSettings;
pub use error::{Error, LookupError};
pub use guard::{permission_required, Guard};
pub use handler::PermissionHandler;
pub use logic::{
    ActionFlags, AuthorPermissionLogic, CollaboratorsPermissionLogic, GlobalPermissionLogic,
    GroupInPermissionLogic, OneselfPermissionLogic, PermissionCheck, PermissionLogic,
    PermissionScope, StaffPermissionLogic,
};
pub use lookup::{field_lookup, Lookup};
pub use memory::{MemoryStore, Record, RecordSet};
pub use model::{Attribute, Model, ModelType, ObjectKey, ObjectRef, ObjectSource, Relation, RelationRef};
pub use permission::Permission;
pub use registry::{HandlerRegistry, Registration, RegistrationPolicy, RegistryGuard, RegistrySnapshot};
pub use subject::{Subject, User};

/// A type alias for Result with our error types
pub type Result<T, E = error::Error> = std::result::Result<T, E>;
