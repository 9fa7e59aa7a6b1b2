use std::sync::Arc;
use std::thread;

use serde_json::json;

use crate::component::{ComponentModel, Lifestyle};
use crate::config::MemoryConfiguration;
use crate::handler::HandlerState;
use crate::kernel::Kernel;
use crate::tests::integration::common::{
    engine_model, gearbox_model, radio_model, vehicle_model, Engine, LifecycleProbe,
    ProbeConcern, Radio, Vehicle,
};

fn configured_kernel(probe: &Arc<LifecycleProbe>) -> Kernel {
    let config = MemoryConfiguration::new()
        .set("engine", json!({"power": 240}))
        .unwrap();
    let kernel = Kernel::with_configuration(Arc::new(config));
    kernel.add_concern(Arc::new(ProbeConcern::new(probe.clone())));
    kernel
}

#[test]
fn test_vehicle_assembly_end_to_end() {
    let probe = LifecycleProbe::new();
    let kernel = configured_kernel(&probe);

    // Register the dependent first; it must wait for its parts.
    let vehicle = kernel.add_component(vehicle_model(probe.clone())).unwrap();
    assert_eq!(vehicle.state(), HandlerState::WaitingDependency);

    kernel.add_component(gearbox_model(probe.clone())).unwrap();
    assert_eq!(vehicle.state(), HandlerState::WaitingDependency);
    assert_eq!(
        vehicle.missing_dependencies(),
        vec![std::any::type_name::<Engine>().to_string()]
    );

    kernel.add_component(engine_model(probe.clone())).unwrap();
    assert_eq!(vehicle.state(), HandlerState::Valid);

    // Nothing has been built yet; activation is part of commission.
    assert!(probe.events().is_empty());
    kernel.commission_all().unwrap();
    assert_eq!(
        probe.events(),
        vec![
            "build:engine",
            "stage-up:engine power=240",
            "build:gearbox",
            "stage-up:gearbox",
            "build:vehicle",
            "stage-up:vehicle",
        ]
    );

    let vehicle = kernel.resolve_as::<Vehicle>("vehicle").unwrap();
    assert_eq!(vehicle.power, 240);
    assert_eq!(vehicle.ratio, 3.5);
    assert_eq!(vehicle.station, None);

    // The engine is a shared singleton.
    let first = kernel.resolve("engine").unwrap();
    let second: crate::component::Instance = kernel.resolve_service::<Engine>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_dispose_unwinds_the_object_graph() {
    let probe = LifecycleProbe::new();
    let kernel = configured_kernel(&probe);
    kernel.add_component(vehicle_model(probe.clone())).unwrap();
    kernel.add_component(gearbox_model(probe.clone())).unwrap();
    kernel.add_component(engine_model(probe.clone())).unwrap();
    kernel.commission_all().unwrap();
    probe.clear();

    kernel.dispose();
    assert_eq!(
        probe.events(),
        vec![
            "drop:vehicle",
            "stage-down:vehicle",
            "drop:gearbox",
            "stage-down:gearbox",
            "drop:engine",
            "stage-down:engine",
        ]
    );
}

#[test]
fn test_every_build_is_matched_by_a_drop() {
    let probe = LifecycleProbe::new();
    let kernel = configured_kernel(&probe);
    kernel.add_component(vehicle_model(probe.clone())).unwrap();
    kernel.add_component(gearbox_model(probe.clone())).unwrap();
    kernel.add_component(engine_model(probe.clone())).unwrap();
    kernel.commission_all().unwrap();
    kernel.dispose();

    let events = probe.events();
    for part in ["engine", "gearbox", "vehicle"] {
        let builds = events.iter().filter(|e| *e == &format!("build:{part}")).count();
        let drops = events.iter().filter(|e| *e == &format!("drop:{part}")).count();
        assert_eq!(builds, drops, "unbalanced lifecycle for {part}");
    }
}

#[test]
fn test_late_optional_dependency_is_picked_up() {
    let probe = LifecycleProbe::new();
    let kernel = configured_kernel(&probe);
    kernel.add_component(vehicle_model(probe.clone())).unwrap();
    kernel.add_component(gearbox_model(probe.clone())).unwrap();
    kernel.add_component(engine_model(probe.clone())).unwrap();

    // The vehicle is already valid; the radio arrives afterwards and
    // is wired into constructions from then on.
    kernel.add_component(radio_model(probe.clone())).unwrap();

    let vehicle = kernel.resolve_as::<Vehicle>("vehicle").unwrap();
    assert_eq!(vehicle.station.as_deref(), Some("fm4"));
}

#[test]
fn test_vehicle_without_radio_still_drives() {
    let probe = LifecycleProbe::new();
    let kernel = configured_kernel(&probe);
    kernel.add_component(vehicle_model(probe.clone())).unwrap();
    kernel.add_component(gearbox_model(probe.clone())).unwrap();
    kernel.add_component(engine_model(probe.clone())).unwrap();

    let vehicle = kernel.resolve_as::<Vehicle>("vehicle").unwrap();
    assert_eq!(vehicle.station, None);
}

#[test]
fn test_rig_with_required_radio_waits_for_it() {
    struct Rig {
        engine: Arc<Engine>,
        radio: Arc<Radio>,
    }

    let probe = LifecycleProbe::new();
    let kernel = configured_kernel(&probe);
    kernel.add_component(engine_model(probe.clone())).unwrap();

    let model = ComponentModel::builder::<Rig>("rig")
        .depends_on::<Engine>("engine")
        .depends_on::<Radio>("radio")
        .constructor(|args| {
            Ok(Rig {
                engine: args.get::<Engine>("engine")?,
                radio: args.get::<Radio>("radio")?,
            })
        })
        .build()
        .unwrap();
    let rig = kernel.add_component(model).unwrap();
    assert_eq!(rig.state(), HandlerState::WaitingDependency);

    kernel.add_component(radio_model(probe.clone())).unwrap();
    assert_eq!(rig.state(), HandlerState::Valid);

    // Both parts are wired and reference-match what their own
    // handlers hand out.
    let rig = kernel.resolve_as::<Rig>("rig").unwrap();
    assert_eq!(rig.engine.power, 240);
    assert_eq!(rig.radio.station, "fm4");
    assert!(Arc::ptr_eq(
        &rig.engine,
        &kernel.resolve_as::<Engine>("engine").unwrap()
    ));
    assert!(Arc::ptr_eq(
        &rig.radio,
        &kernel.resolve_as::<Radio>("radio").unwrap()
    ));
}

#[test]
fn test_per_thread_components_through_the_kernel() {
    struct Session {
        id: std::thread::ThreadId,
    }

    let kernel = Arc::new(Kernel::new());
    let model = ComponentModel::builder::<Session>("session")
        .lifestyle(Lifestyle::PerThread)
        .constructor(|_| {
            Ok(Session {
                id: thread::current().id(),
            })
        })
        .build()
        .unwrap();
    kernel.add_component(model).unwrap();

    let local = kernel.resolve_as::<Session>("session").unwrap();
    assert_eq!(local.id, thread::current().id());
    assert!(Arc::ptr_eq(
        &local,
        &kernel.resolve_as::<Session>("session").unwrap()
    ));

    let remote = {
        let kernel = kernel.clone();
        thread::spawn(move || kernel.resolve_as::<Session>("session").unwrap())
            .join()
            .unwrap()
    };
    assert_ne!(local.id, remote.id);
}
