//! Handler registry.
//!
//! Maps model types to their [`PermissionHandler`]. Lookups fall back along
//! an explicit type hierarchy table (nearest registered ancestor first) and
//! finally to a default handler.
//!
//! A registry is populated once at start-up and read concurrently
//! afterwards. The process-wide instance is available through [`global`];
//! tests that change it should hold a [`RegistryGuard`] so the previous
//! state comes back when the test ends.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::Arc;

use lazy_static::lazy_static;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::PermissionSettings;
use crate::handler::PermissionHandler;
use crate::logic::PermissionLogic;
use crate::model::{Model, ModelType};
use crate::permission::Permission;
use crate::Result;

lazy_static! {
    static ref GLOBAL_REGISTRY: Arc<HandlerRegistry> = Arc::new(HandlerRegistry::new());
}

/// The process-wide registry.
pub fn global() -> Arc<HandlerRegistry> {
    GLOBAL_REGISTRY.clone()
}

/// What registering a type that already has a handler does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationPolicy {
    /// Append the new logics to the existing handler.
    #[default]
    Merge,

    /// Drop the existing handler.
    Replace,
}

/// Something that can be registered for a model type.
#[derive(Debug, Clone)]
pub enum Registration {
    /// A complete handler.
    Handler(PermissionHandler),

    /// Logics to put in a handler.
    Logics(Vec<Arc<dyn PermissionLogic>>),
}

impl Registration {
    fn into_handler(self) -> PermissionHandler {
        match self {
            Self::Handler(handler) => handler,
            Self::Logics(logics) => {
                let mut handler = PermissionHandler::new();
                for logic in logics {
                    handler.add(logic);
                }
                handler
            }
        }
    }
}

impl From<PermissionHandler> for Registration {
    fn from(handler: PermissionHandler) -> Self {
        Self::Handler(handler)
    }
}

impl From<Arc<dyn PermissionLogic>> for Registration {
    fn from(logic: Arc<dyn PermissionLogic>) -> Self {
        Self::Logics(vec![logic])
    }
}

impl From<Vec<Arc<dyn PermissionLogic>>> for Registration {
    fn from(logics: Vec<Arc<dyn PermissionLogic>>) -> Self {
        Self::Logics(logics)
    }
}

#[derive(Debug, Clone, Default)]
struct RegistryState {
    handlers: HashMap<ModelType, Arc<PermissionHandler>>,
    parents: HashMap<ModelType, Vec<ModelType>>,
    custom_permissions: HashMap<ModelType, BTreeSet<Permission>>,
    default_handler: Arc<PermissionHandler>,
}

/// A saved copy of a registry's state.
#[derive(Debug, Clone)]
pub struct RegistrySnapshot {
    state: RegistryState,
}

/// Registry of permission handlers.
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    state: RwLock<RegistryState>,
    policy: RegistrationPolicy,
}

impl HandlerRegistry {
    /// Create a new, empty registry that merges re-registrations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new, empty registry with the given re-registration policy.
    pub fn with_policy(policy: RegistrationPolicy) -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            policy,
        }
    }

    /// Create a new, empty registry configured from settings.
    pub fn from_settings(settings: &PermissionSettings) -> Self {
        Self::with_policy(settings.registration_policy)
    }

    /// The default re-registration policy of this registry.
    pub fn policy(&self) -> RegistrationPolicy {
        self.policy
    }

    /// Register a handler or logics for a model type, using the registry's
    /// policy when the type is already registered.
    pub fn register(&self, model: ModelType, registration: impl Into<Registration>) {
        self.register_with(model, registration, self.policy);
    }

    /// Register a handler or logics for a model type with an explicit
    /// policy.
    pub fn register_with(
        &self,
        model: ModelType,
        registration: impl Into<Registration>,
        policy: RegistrationPolicy,
    ) {
        let mut incoming = registration.into().into_handler();
        if let Some(bound) = incoming.model() {
            if bound != &model {
                warn!("Handler bound to {} is registered for {}", bound, model);
            }
        }
        incoming.bind(model.clone());

        let mut state = self.state.write();
        let handler = match (state.handlers.get(&model), policy) {
            (Some(existing), RegistrationPolicy::Merge) => {
                let mut merged = existing.as_ref().clone();
                merged.merge(&incoming);
                debug!("Merged {} logic(s) into handler for {}", incoming.len(), model);
                merged
            }
            (Some(_), RegistrationPolicy::Replace) => {
                debug!("Replaced handler for {}", model);
                incoming
            }
            (None, _) => {
                debug!("Registered handler for {} with {} logic(s)", model, incoming.len());
                incoming
            }
        };
        state.handlers.insert(model, Arc::new(handler));
    }

    /// Attach one logic to a model type, merging with any existing handler.
    pub fn add_permission_logic(&self, model: ModelType, logic: impl PermissionLogic + 'static) {
        let logic: Arc<dyn PermissionLogic> = Arc::new(logic);
        self.register_with(model, logic, RegistrationPolicy::Merge);
    }

    /// Remove the handler of a model type. Returns the removed handler.
    pub fn unregister(&self, model: &ModelType) -> Option<Arc<PermissionHandler>> {
        let removed = self.state.write().handlers.remove(model);
        if removed.is_some() {
            debug!("Unregistered handler for {}", model);
        }
        removed
    }

    /// Whether a model type has a handler of its own.
    pub fn is_registered(&self, model: &ModelType) -> bool {
        self.state.read().handlers.contains_key(model)
    }

    /// All model types with a handler, sorted.
    pub fn registered_types(&self) -> Vec<ModelType> {
        let mut types: Vec<ModelType> = self.state.read().handlers.keys().cloned().collect();
        types.sort();
        types
    }

    /// The handler registered for exactly this model type.
    pub fn get_registered_handler(&self, model: &ModelType) -> Option<Arc<PermissionHandler>> {
        self.state.read().handlers.get(model).cloned()
    }

    /// The handler for a model type: its own, else the nearest registered
    /// ancestor's, else the default handler.
    pub fn get_handler(&self, model: &ModelType) -> Arc<PermissionHandler> {
        let state = self.state.read();
        if let Some(handler) = state.handlers.get(model) {
            return handler.clone();
        }

        // Breadth-first over declared parents, so nearer ancestors win.
        let mut queue: VecDeque<&ModelType> = VecDeque::new();
        let mut seen: HashSet<&ModelType> = HashSet::new();
        seen.insert(model);
        queue.extend(state.parents.get(model).into_iter().flatten());

        while let Some(ancestor) = queue.pop_front() {
            if !seen.insert(ancestor) {
                continue;
            }
            if let Some(handler) = state.handlers.get(ancestor) {
                debug!("Resolved handler for {} through ancestor {}", model, ancestor);
                return handler.clone();
            }
            queue.extend(state.parents.get(ancestor).into_iter().flatten());
        }

        state.default_handler.clone()
    }

    /// The handler for an object's model type.
    pub fn get_handler_for(&self, object: &dyn Model) -> Arc<PermissionHandler> {
        self.get_handler(object.model_type())
    }

    /// Declare that `child` derives from `parent`. Parents declared first
    /// are searched first.
    pub fn declare_parent(&self, child: ModelType, parent: ModelType) {
        let mut state = self.state.write();
        let parents = state.parents.entry(child).or_default();
        if !parents.contains(&parent) {
            parents.push(parent);
        }
    }

    /// The declared parents of a model type.
    pub fn parents(&self, model: &ModelType) -> Vec<ModelType> {
        self.state.read().parents.get(model).cloned().unwrap_or_default()
    }

    /// Declare custom permission codenames for a model type, e.g.
    /// `publish_article`.
    pub fn declare_permissions<I, S>(&self, model: ModelType, codenames: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let permissions = codenames
            .into_iter()
            .map(|codename| Permission::from_codename(model.app_label(), codename.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        self.state
            .write()
            .custom_permissions
            .entry(model)
            .or_default()
            .extend(permissions);
        Ok(())
    }

    /// The custom permissions declared for a model type.
    pub fn declared_permissions(&self, model: &ModelType) -> BTreeSet<Permission> {
        self.state
            .read()
            .custom_permissions
            .get(model)
            .cloned()
            .unwrap_or_default()
    }

    /// Whether the registry knows anything about a model type: a handler,
    /// a place in the type hierarchy, or declared permissions.
    pub fn knows(&self, model: &ModelType) -> bool {
        let state = self.state.read();
        state.handlers.contains_key(model)
            || state.parents.contains_key(model)
            || state.parents.values().flatten().any(|parent| parent == model)
            || state.custom_permissions.contains_key(model)
    }

    /// Replace the default handler used for unregistered types.
    pub fn set_default_handler(&self, handler: PermissionHandler) {
        self.state.write().default_handler = Arc::new(handler);
    }

    /// The default handler used for unregistered types.
    pub fn default_handler(&self) -> Arc<PermissionHandler> {
        self.state.read().default_handler.clone()
    }

    /// Remove every handler, declaration and the default handler's logics.
    pub fn clear(&self) {
        *self.state.write() = RegistryState::default();
    }

    /// Save the current state.
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            state: self.state.read().clone(),
        }
    }

    /// Put back a saved state.
    pub fn restore(&self, snapshot: RegistrySnapshot) {
        *self.state.write() = snapshot.state;
    }

    /// Snapshot the registry and restore it when the guard is dropped.
    pub fn guard(&self) -> RegistryGuard<'_> {
        RegistryGuard {
            registry: self,
            snapshot: Some(self.snapshot()),
        }
    }
}

/// Restores a registry to a saved state when dropped.
pub struct RegistryGuard<'a> {
    registry: &'a HandlerRegistry,
    snapshot: Option<RegistrySnapshot>,
}

impl Drop for RegistryGuard<'_> {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            self.registry.restore(snapshot);
        }
    }
}
