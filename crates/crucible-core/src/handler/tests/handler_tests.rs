use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::component::{
    ActivationPolicy, ComponentModel, Instance, Lifestyle, ServiceKey,
};
use crate::factory::ConcernSet;
use crate::handler::{Handler, HandlerError, HandlerState};

struct Engine {
    power: u32,
}

struct Radio;

struct Car {
    power: u32,
}

fn new_handler(model: ComponentModel) -> Arc<Handler> {
    Arc::new(Handler::new(model, Arc::new(ConcernSet::default())).unwrap())
}

/// Handler initialized against an empty kernel.
fn isolated_handler(model: ComponentModel) -> Arc<Handler> {
    let handler = new_handler(model);
    handler.init(&HashMap::new());
    handler
}

fn engine_model() -> ComponentModel {
    ComponentModel::builder::<Engine>("engine")
        .constructor(|_| Ok(Engine { power: 240 }))
        .build()
        .unwrap()
}

fn car_model() -> ComponentModel {
    ComponentModel::builder::<Car>("car")
        .depends_on::<Engine>("engine")
        .constructor(|args| {
            let engine = args.get::<Engine>("engine")?;
            Ok(Car { power: engine.power })
        })
        .build()
        .unwrap()
}

#[test]
fn test_handler_without_dependencies_is_valid() {
    let handler = isolated_handler(engine_model());
    assert_eq!(handler.state(), HandlerState::Valid);
    assert!(handler.is_valid());
    assert!(handler.missing_dependencies().is_empty());

    let instance = handler.resolve().unwrap();
    assert_eq!(instance.downcast_ref::<Engine>().unwrap().power, 240);
}

#[test]
fn test_unsatisfied_required_dependency_blocks_resolution() {
    let handler = new_handler(car_model());
    let subscriptions = handler.init(&HashMap::new());

    assert_eq!(handler.state(), HandlerState::WaitingDependency);
    assert_eq!(subscriptions, vec![ServiceKey::of::<Engine>()]);
    assert_eq!(
        handler.missing_dependencies(),
        vec![ServiceKey::of::<Engine>().type_name().to_string()]
    );

    let err = handler.resolve().unwrap_err();
    assert!(matches!(
        err,
        HandlerError::AwaitingDependencies { ref component, ref missing }
            if component == "car" && missing.len() == 1
    ));
}

#[test]
fn test_known_provider_satisfies_at_init() {
    let engine = isolated_handler(engine_model());
    let known = HashMap::from([(ServiceKey::of::<Engine>(), engine)]);

    let handler = new_handler(car_model());
    let subscriptions = handler.init(&known);

    assert!(subscriptions.is_empty());
    assert_eq!(handler.state(), HandlerState::Valid);
    let instance = handler.resolve().unwrap();
    assert_eq!(instance.downcast_ref::<Car>().unwrap().power, 240);
}

#[test]
fn test_dependency_satisfied_promotes_to_valid() {
    let handler = new_handler(car_model());
    handler.init(&HashMap::new());
    assert_eq!(handler.state(), HandlerState::WaitingDependency);

    let engine = isolated_handler(engine_model());
    handler.dependency_satisfied(ServiceKey::of::<Engine>(), engine);

    assert_eq!(handler.state(), HandlerState::Valid);
    assert!(handler.missing_dependencies().is_empty());
    assert!(handler.resolve().is_ok());
}

#[test]
fn test_missing_optional_dependency_does_not_block() {
    let model = ComponentModel::builder::<Car>("car")
        .optionally_depends_on::<Radio>("radio")
        .constructor(|_| Ok(Car { power: 0 }))
        .build()
        .unwrap();
    let handler = new_handler(model);
    let subscriptions = handler.init(&HashMap::new());

    // Still subscribed, so a late radio is picked up, but valid now.
    assert_eq!(subscriptions, vec![ServiceKey::of::<Radio>()]);
    assert_eq!(handler.state(), HandlerState::Valid);
    assert!(handler.resolve().is_ok());
}

#[test]
fn test_duplicate_service_subscriptions_are_deduped() {
    let model = ComponentModel::builder::<Car>("car")
        .depends_on::<Engine>("primary")
        .depends_on::<Engine>("secondary")
        .constructor(|_| Ok(Car { power: 0 }))
        .build()
        .unwrap();
    let handler = new_handler(model);
    let subscriptions = handler.init(&HashMap::new());
    assert_eq!(subscriptions, vec![ServiceKey::of::<Engine>()]);
}

#[test]
fn test_release_of_foreign_instance_is_ignored() {
    let dropped = Arc::new(AtomicUsize::new(0));
    let hook_dropped = dropped.clone();
    let model = ComponentModel::builder::<Engine>("engine")
        .lifestyle(Lifestyle::Transient)
        .constructor(|_| Ok(Engine { power: 240 }))
        .on_decommission(move |_: &Engine| {
            hook_dropped.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .unwrap();
    let handler = isolated_handler(model);

    let owned = handler.resolve().unwrap();
    let foreign: Instance = Arc::new(Engine { power: 1 });

    handler.release(&foreign);
    assert_eq!(dropped.load(Ordering::SeqCst), 0);

    handler.release(&owned);
    assert_eq!(dropped.load(Ordering::SeqCst), 1);
    // The instance is no longer owned; a second release does nothing.
    handler.release(&owned);
    assert_eq!(dropped.load(Ordering::SeqCst), 1);
}

#[test]
fn test_eager_commission_activates_once() {
    let built = Arc::new(AtomicUsize::new(0));
    let counting = built.clone();
    let model = ComponentModel::builder::<Engine>("engine")
        .activation(ActivationPolicy::Eager)
        .constructor(move |_| {
            counting.fetch_add(1, Ordering::SeqCst);
            Ok(Engine { power: 240 })
        })
        .build()
        .unwrap();
    let handler = isolated_handler(model);

    handler.commission().unwrap();
    assert_eq!(built.load(Ordering::SeqCst), 1);

    // The eager singleton is already live; callers share it.
    handler.resolve().unwrap();
    assert_eq!(built.load(Ordering::SeqCst), 1);
}

#[test]
fn test_decommission_invalidates_and_releases_instances() {
    let dropped = Arc::new(AtomicUsize::new(0));
    let hook_dropped = dropped.clone();
    let model = ComponentModel::builder::<Engine>("engine")
        .lifestyle(Lifestyle::Transient)
        .constructor(|_| Ok(Engine { power: 240 }))
        .on_decommission(move |_: &Engine| {
            hook_dropped.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .unwrap();
    let handler = isolated_handler(model);

    handler.resolve().unwrap();
    handler.resolve().unwrap();
    handler.decommission();

    assert_eq!(handler.state(), HandlerState::Invalid);
    assert_eq!(dropped.load(Ordering::SeqCst), 2);
    assert!(matches!(
        handler.resolve(),
        Err(HandlerError::InvalidState { ref component }) if component == "engine"
    ));
}

#[test]
fn test_creation_failure_preserves_cause() {
    let model = ComponentModel::builder::<Engine>("engine")
        .constructor::<Engine, _>(|_| Err("no spark".into()))
        .build()
        .unwrap();
    let handler = isolated_handler(model);

    let err = handler.resolve().unwrap_err();
    match err {
        HandlerError::CreationFailed { component, source } => {
            assert_eq!(component, "engine");
            assert!(source.to_string().contains("engine"));
        }
        other => panic!("expected creation failure, got {other:?}"),
    }
}
