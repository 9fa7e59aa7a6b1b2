//! Shared fixtures for container integration tests: a small vehicle
//! domain plus a probe recording lifecycle events in order.

use std::sync::{Arc, Mutex};

use crate::component::{
    ActivationPolicy, ComponentModel, ConstructionError, Instance, Lifestyle,
};
use crate::factory::ComponentConcern;

pub struct Engine {
    pub power: u32,
}

pub struct Gearbox {
    pub ratio: f64,
}

pub struct Radio {
    pub station: String,
}

pub struct Vehicle {
    pub power: u32,
    pub ratio: f64,
    pub station: Option<String>,
}

/// Records lifecycle events in the order they happen.
#[derive(Default)]
pub struct LifecycleProbe {
    events: Mutex<Vec<String>>,
}

impl LifecycleProbe {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

/// Kernel-wide concern tracing commission and decommission stages,
/// including the configured power of engines it sees.
pub struct ProbeConcern {
    probe: Arc<LifecycleProbe>,
}

impl ProbeConcern {
    pub fn new(probe: Arc<LifecycleProbe>) -> Self {
        Self { probe }
    }
}

impl ComponentConcern for ProbeConcern {
    fn commission(
        &self,
        _instance: &Instance,
        model: &ComponentModel,
    ) -> Result<(), ConstructionError> {
        match model.configuration().get_i64("power") {
            Some(power) => self
                .probe
                .record(format!("stage-up:{} power={}", model.name(), power)),
            None => self.probe.record(format!("stage-up:{}", model.name())),
        }
        Ok(())
    }

    fn decommission(
        &self,
        _instance: &Instance,
        model: &ComponentModel,
    ) -> Result<(), ConstructionError> {
        self.probe.record(format!("stage-down:{}", model.name()));
        Ok(())
    }
}

pub fn engine_model(probe: Arc<LifecycleProbe>) -> ComponentModel {
    let built = probe.clone();
    ComponentModel::builder::<Engine>("engine")
        .activation(ActivationPolicy::Eager)
        .constructor(move |_| {
            built.record("build:engine");
            Ok(Engine { power: 240 })
        })
        .on_decommission(move |_: &Engine| probe.record("drop:engine"))
        .build()
        .unwrap()
}

pub fn gearbox_model(probe: Arc<LifecycleProbe>) -> ComponentModel {
    let built = probe.clone();
    ComponentModel::builder::<Gearbox>("gearbox")
        .lifestyle(Lifestyle::Transient)
        .constructor(move |_| {
            built.record("build:gearbox");
            Ok(Gearbox { ratio: 3.5 })
        })
        .on_decommission(move |_: &Gearbox| probe.record("drop:gearbox"))
        .build()
        .unwrap()
}

pub fn radio_model(probe: Arc<LifecycleProbe>) -> ComponentModel {
    let built = probe.clone();
    ComponentModel::builder::<Radio>("radio")
        .constructor(move |_| {
            built.record("build:radio");
            Ok(Radio {
                station: "fm4".to_string(),
            })
        })
        .on_decommission(move |_: &Radio| probe.record("drop:radio"))
        .build()
        .unwrap()
}

pub fn vehicle_model(probe: Arc<LifecycleProbe>) -> ComponentModel {
    let built = probe.clone();
    ComponentModel::builder::<Vehicle>("vehicle")
        .activation(ActivationPolicy::Eager)
        .depends_on::<Engine>("engine")
        .depends_on::<Gearbox>("gearbox")
        .optionally_depends_on::<Radio>("radio")
        .constructor(move |args| {
            built.record("build:vehicle");
            let engine = args.get::<Engine>("engine")?;
            let gearbox = args.get::<Gearbox>("gearbox")?;
            Ok(Vehicle {
                power: engine.power,
                ratio: gearbox.ratio,
                station: args
                    .get_optional::<Radio>("radio")
                    .map(|radio| radio.station.clone()),
            })
        })
        .on_decommission(move |_: &Vehicle| probe.record("drop:vehicle"))
        .build()
        .unwrap()
}
