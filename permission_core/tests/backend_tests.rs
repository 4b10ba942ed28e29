//! Integration tests for the permission backend.

use std::sync::Arc;

use parking_lot::Mutex;
use permission_core::*;
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

// Tests touching the global registry run one at a time.
static GLOBAL_REGISTRY_LOCK: Mutex<()> = parking_lot::const_mutex(());

// Initialize tracing for tests
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(Level::DEBUG.to_string()));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn article() -> ModelType {
    ModelType::new("app", "article")
}

struct Fixture {
    backend: PermissionBackend,
    tony: User,
    john: User,
    record: Record,
}

fn fixture(registry: Arc<HandlerRegistry>) -> Fixture {
    let tony = User::new("tony");
    let john = User::new("john");
    let author: ObjectRef = Arc::new(tony.clone());
    let record = Record::new(article()).with_object("author", author);
    Fixture {
        backend: PermissionBackend::new(registry),
        tony,
        john,
        record,
    }
}

#[test]
fn test_author_defaults() {
    init_tracing();

    let registry = Arc::new(HandlerRegistry::new());
    registry.add_permission_logic(article(), AuthorPermissionLogic::new());
    let f = fixture(registry);

    // Type-level: the author cannot be known yet.
    for permission in ["app.add_article", "app.change_article", "app.delete_article"] {
        assert!(f.backend.has_perm(&f.john, Some(permission), None).unwrap());
    }

    // Object-level: only the author.
    for permission in ["app.change_article", "app.delete_article"] {
        assert!(f.backend.has_perm(&f.tony, Some(permission), Some(&f.record)).unwrap());
        assert!(!f.backend.has_perm(&f.john, Some(permission), Some(&f.record)).unwrap());
    }
}

#[test]
fn test_author_without_any_permission() {
    init_tracing();

    let registry = Arc::new(HandlerRegistry::new());
    registry.add_permission_logic(
        article(),
        AuthorPermissionLogic::new()
            .with_any_permission(false)
            .with_delete_permission(false),
    );
    let f = fixture(registry);

    assert!(f.backend.has_perm(&f.john, Some("app.add_article"), None).unwrap());
    assert!(f.backend.has_perm(&f.john, Some("app.change_article"), None).unwrap());
    assert!(!f.backend.has_perm(&f.john, Some("app.delete_article"), None).unwrap());

    assert!(f.backend.has_perm(&f.tony, Some("app.change_article"), Some(&f.record)).unwrap());
    assert!(!f.backend.has_perm(&f.tony, Some("app.delete_article"), Some(&f.record)).unwrap());
}

#[test]
fn test_superuser_and_anonymous() {
    init_tracing();

    let registry = Arc::new(HandlerRegistry::new());
    registry.add_permission_logic(article(), AuthorPermissionLogic::new());
    registry.add_permission_logic(article(), StaffPermissionLogic::new());
    registry.add_permission_logic(article(), GlobalPermissionLogic::new());
    let f = fixture(registry);

    let root = User::new("root").with_superuser(true).with_active(false);
    let anonymous = User::anonymous().with_permission("app.view_article");

    for permission in ["app.add_article", "app.change_article", "app.view_article"] {
        assert!(f.backend.has_perm(&root, Some(permission), Some(&f.record)).unwrap());
        assert!(f.backend.has_perm(&root, Some(permission), None).unwrap());
        assert!(!f.backend.has_perm(&anonymous, Some(permission), Some(&f.record)).unwrap());
        assert!(!f.backend.has_perm(&anonymous, Some(permission), None).unwrap());
    }
}

#[test]
fn test_null_author_denies_and_unknown_field_errors() {
    init_tracing();

    let registry = Arc::new(HandlerRegistry::new());
    registry.add_permission_logic(article(), AuthorPermissionLogic::new().with_field_name("editor"));
    let f = fixture(registry.clone());

    // The record has no "editor" attribute at all.
    let result = f.backend.has_perm(&f.tony, Some("app.change_article"), Some(&f.record));
    assert!(matches!(result, Err(ref error) if error.is_attribute_resolution()));

    let record = Record::new(article()).with_null("editor");
    assert!(!f.backend.has_perm(&f.tony, Some("app.change_article"), Some(&record)).unwrap());
}

#[test]
fn test_collaborators_and_groups() {
    init_tracing();

    let registry = Arc::new(HandlerRegistry::new());
    registry.add_permission_logic(article(), CollaboratorsPermissionLogic::new().with_field_name("editors"));
    registry.add_permission_logic(article(), GroupInPermissionLogic::new(["reviewers"]).with_delete_permission(false));
    let backend = PermissionBackend::new(registry);

    let editor = User::new("editor");
    let reviewer = User::new("reviewer").with_group("reviewers");
    let editors = RecordSet::new();
    editors.add(Arc::new(editor.clone()));
    let record = Record::new(article()).with_related("editors", editors);

    assert!(backend.has_perm(&editor, Some("app.change_article"), Some(&record)).unwrap());
    assert!(!backend.has_perm(&editor, Some("app.delete_article"), Some(&record)).unwrap());
    assert!(backend.has_perm(&reviewer, Some("app.change_article"), Some(&record)).unwrap());
    assert!(!backend.has_perm(&reviewer, Some("app.delete_article"), Some(&record)).unwrap());
    assert!(!backend.has_perm(&User::new("other"), Some("app.change_article"), Some(&record)).unwrap());
}

#[test]
fn test_oneself() {
    init_tracing();

    let registry = Arc::new(HandlerRegistry::new());
    registry.add_permission_logic(User::model(), OneselfPermissionLogic::new());
    let backend = PermissionBackend::new(registry);

    let tony = User::new("tony");
    let john = User::new("john");
    assert!(backend.has_perm(&tony, Some("auth.change_user"), Some(&tony)).unwrap());
    assert!(!backend.has_perm(&john, Some("auth.change_user"), Some(&tony)).unwrap());
}

#[test]
fn test_registration_is_idempotent_under_replace() {
    init_tracing();

    let registry = Arc::new(HandlerRegistry::with_policy(RegistrationPolicy::Replace));
    for _ in 0..2 {
        registry.register(article(), Arc::new(AuthorPermissionLogic::new()) as Arc<dyn PermissionLogic>);
    }
    assert_eq!(registry.get_handler(&article()).len(), 1);

    let f = fixture(registry);
    assert!(f.backend.has_perm(&f.tony, Some("app.change_article"), Some(&f.record)).unwrap());
    assert!(!f.backend.has_perm(&f.john, Some("app.change_article"), Some(&f.record)).unwrap());
}

#[test]
fn test_duplicate_registration_under_merge_changes_nothing() {
    init_tracing();

    let configurations = [
        AuthorPermissionLogic::new(),
        AuthorPermissionLogic::new()
            .with_any_permission(false)
            .with_delete_permission(false),
    ];

    for logic in configurations {
        let once = Arc::new(HandlerRegistry::new());
        once.add_permission_logic(article(), logic.clone());

        let twice = Arc::new(HandlerRegistry::new());
        assert_eq!(twice.policy(), RegistrationPolicy::Merge);
        twice.register(article(), Arc::new(logic.clone()) as Arc<dyn PermissionLogic>);
        twice.register(article(), Arc::new(logic) as Arc<dyn PermissionLogic>);
        assert_eq!(twice.get_handler(&article()).len(), 2);

        let f = fixture(twice);
        let reference = PermissionBackend::new(once);
        let anonymous = User::anonymous();
        let subjects: [&dyn Subject; 3] = [&f.tony, &f.john, &anonymous];
        let objects: [Option<&dyn Model>; 2] = [None, Some(&f.record)];

        for subject in subjects {
            for object in objects {
                for permission in ["app.add_article", "app.change_article", "app.delete_article"] {
                    assert_eq!(
                        f.backend.has_perm(subject, Some(permission), object).unwrap(),
                        reference.has_perm(subject, Some(permission), object).unwrap(),
                        "{} for {}",
                        permission,
                        subject.key()
                    );
                }
            }
        }
    }
}

#[derive(Debug)]
struct UnreachableRelation;

impl Relation for UnreachableRelation {
    fn objects(&self) -> std::result::Result<Vec<ObjectRef>, LookupError> {
        Err(LookupError::Relation("store down".to_string()))
    }
}

#[derive(Debug)]
struct DetachedArticle {
    key: ObjectKey,
}

impl Model for DetachedArticle {
    fn key(&self) -> &ObjectKey {
        &self.key
    }

    fn get(&self, attribute: &str) -> std::result::Result<Attribute, LookupError> {
        match attribute {
            "editors" => Ok(Attribute::Related(Arc::new(UnreachableRelation))),
            _ => Err(LookupError::AttributeResolution {
                target: self.key.model().to_string(),
                attribute: attribute.to_string(),
            }),
        }
    }
}

#[test]
fn test_store_failure_reaches_caller() {
    init_tracing();

    let registry = Arc::new(HandlerRegistry::new());
    registry.add_permission_logic(article(), CollaboratorsPermissionLogic::new().with_field_name("editors"));
    let backend = PermissionBackend::new(registry);
    let record = DetachedArticle {
        key: ObjectKey::new(article(), "1"),
    };

    match backend.has_perm(&User::new("john"), Some("app.change_article"), Some(&record)) {
        Err(Error::Lookup(LookupError::Relation(message))) => assert_eq!(message, "store down"),
        other => panic!("Expected a relation error, got {:?}", other),
    }
}

#[test]
fn test_merge_and_replace() {
    init_tracing();

    let registry = Arc::new(HandlerRegistry::new());
    registry.register(article(), Arc::new(AuthorPermissionLogic::new()) as Arc<dyn PermissionLogic>);
    registry.register(article(), Arc::new(StaffPermissionLogic::new()) as Arc<dyn PermissionLogic>);
    assert_eq!(registry.get_handler(&article()).len(), 2);

    registry.register_with(
        article(),
        Arc::new(StaffPermissionLogic::new()) as Arc<dyn PermissionLogic>,
        RegistrationPolicy::Replace,
    );
    assert_eq!(registry.get_handler(&article()).len(), 1);

    let f = fixture(registry);
    // The author logic is gone.
    assert!(!f.backend.has_perm(&f.tony, Some("app.change_article"), Some(&f.record)).unwrap());
}

#[test]
fn test_subclass_falls_back_to_parent_handler() {
    init_tracing();

    let news = ModelType::new("app", "newsarticle");
    let registry = Arc::new(HandlerRegistry::new());
    registry.add_permission_logic(article(), AuthorPermissionLogic::new());
    registry.declare_parent(news.clone(), article());
    let f = fixture(registry);

    let author: ObjectRef = Arc::new(f.tony.clone());
    let record = Record::new(news).with_object("author", author);

    assert!(f.backend.has_perm(&f.tony, Some("app.change_newsarticle"), Some(&record)).unwrap());
    assert!(!f.backend.has_perm(&f.john, Some("app.change_newsarticle"), Some(&record)).unwrap());
}

#[test]
fn test_module_perms() {
    init_tracing();

    let registry = Arc::new(HandlerRegistry::new());
    registry.add_permission_logic(article(), StaffPermissionLogic::new());
    let backend = PermissionBackend::new(registry);

    let staff = User::new("staff").with_staff(true);
    assert!(backend.has_module_perms(&staff, "app").unwrap());
    assert!(!backend.has_module_perms(&User::new("john"), "app").unwrap());
    assert!(!backend.has_module_perms(&staff, "auth").unwrap());
}

#[test]
fn test_settings_drive_backend_and_logics() {
    init_tracing();

    let settings = PermissionSettings::from_toml_str(
        r#"
        check_permission_presence = true

        [author]
        field_name = "owner"
        any_permission = false
        delete_permission = false
        "#,
    )
    .unwrap();

    let registry = Arc::new(HandlerRegistry::new());
    registry.add_permission_logic(article(), AuthorPermissionLogic::from_settings(&settings));
    let backend = PermissionBackend::with_settings(registry, &settings);

    let tony = User::new("tony");
    let owner: ObjectRef = Arc::new(tony.clone());
    let record = Record::new(article()).with_object("owner", owner);

    assert!(backend.has_perm(&tony, Some("app.change_article"), Some(&record)).unwrap());
    assert!(!backend.has_perm(&tony, Some("app.delete_article"), Some(&record)).unwrap());
    assert!(matches!(
        backend.has_perm(&tony, Some("app.change_comment"), None),
        Err(Error::Configuration(_))
    ));
}

#[test]
fn test_global_registry_is_restored() {
    init_tracing();
    let _lock = GLOBAL_REGISTRY_LOCK.lock();

    let registry = registry::global();
    {
        let _guard = registry.guard();
        registry.add_permission_logic(article(), AuthorPermissionLogic::new());

        let f = fixture(registry.clone());
        info!("Checking against the global registry");
        assert!(f.backend.has_perm(&f.tony, Some("app.change_article"), Some(&f.record)).unwrap());
        assert!(PermissionBackend::default().registry().is_registered(&article()));
    }

    assert!(!registry.is_registered(&article()));
}

#[test]
fn test_guard_against_store() {
    init_tracing();

    let registry = Arc::new(HandlerRegistry::new());
    registry.add_permission_logic(article(), AuthorPermissionLogic::new());
    let f = fixture(registry);

    let key = f.record.key().clone();
    let store = MemoryStore::new();
    store.insert(Arc::new(f.record.clone()));

    let guard = Guard::new(["app.change_article"]).raise_exception(true);
    assert!(guard.check_key(&f.backend, &f.tony, &store, &key).unwrap());
    assert!(matches!(
        guard.check_key(&f.backend, &f.john, &store, &key),
        Err(Error::PermissionDenied { .. })
    ));
    assert!(permission_required(&f.backend, &f.tony, "app.delete_article", Some(&f.record)).is_ok());
}
