//! # minibacd — minibac daemon
//!
//! Composition root that wires the virtual adapter to the application
//! services and runs the intrinsic-reporting loops.
//!
//! ## Responsibilities
//! - Parse configuration (env vars, config file)
//! - Initialise the tracing subscriber
//! - Construct adapters (virtual network, output, settings store)
//! - Build notification classes and monitored points, apply initial commands
//! - Run the evaluation tick and the address-resolution sweep
//! - Handle graceful shutdown (Ctrl-C)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

use minibac_adapter_virtual::{InMemorySettingsStore, LoggingOutput, VirtualNetwork};
use minibac_app::dispatcher::Dispatcher;
use minibac_app::event_bus::InProcessEventBus;
use minibac_app::event_engine::EventEngine;
use minibac_app::point_manager::PointManager;
use minibac_app::ports::SystemClock;
use minibac_app::registry::NotificationClassRegistry;
use minibac_app::reporting::{IntrinsicReporting, ObjectTable};
use minibac_app::services::alarm_service::AlarmService;
use minibac_app::services::notification_class_service::NotificationClassService;
use minibac_app::services::point_service::PointService;
use minibac_domain::id::{DeviceInstance, ObjectType};
use minibac_domain::value::WriteValue;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    let filter = EnvFilter::try_new(&config.logging.filter)
        .with_context(|| format!("invalid log filter {:?}", config.logging.filter))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let device = DeviceInstance(config.device.instance);
    tracing::info!(%device, name = %config.device.name, "starting minibacd");

    // Adapters
    let network = Arc::new(VirtualNetwork::new());
    for peer in &config.peer {
        network.add_peer(DeviceInstance(peer.device), peer.address());
    }
    let output = Arc::new(LoggingOutput::new());
    let store = Arc::new(InMemorySettingsStore::new());
    let bus = Arc::new(InProcessEventBus::new(config.engine.bus_capacity));

    // Notification classes
    let registry = Arc::new(NotificationClassRegistry::new());
    for nc in &config.notification_class {
        registry.insert(nc.class());
    }
    let classes = NotificationClassService::new(
        Arc::clone(&registry),
        Arc::clone(&network),
        Arc::clone(&store),
    );
    for nc in &config.notification_class {
        classes
            .set_recipients(nc.instance, nc.recipients.clone())
            .await
            .with_context(|| format!("notification class {}", nc.instance))?;
    }

    // Points
    let mut managers: BTreeMap<ObjectType, PointManager> = BTreeMap::new();
    for entry in &config.point {
        let point = entry
            .build()
            .with_context(|| format!("point {}", entry.object_id()))?;
        if registry.lookup(point.notification_class).is_none() {
            tracing::warn!(
                object = %point.id,
                class = point.notification_class,
                "notification class not configured, transitions will not be sent"
            );
        }
        managers
            .entry(entry.object_type)
            .or_insert_with(|| PointManager::new(entry.object_type))
            .insert(point)
            .with_context(|| format!("point {}", entry.object_id()))?;
    }
    let managers: Vec<Arc<PointManager>> = managers.into_values().map(Arc::new).collect();

    let points = PointService::new(
        managers.iter().cloned(),
        Arc::clone(&output),
        Arc::clone(&store),
    );
    for entry in &config.point {
        for command in &entry.commands {
            points
                .write(
                    entry.object_id(),
                    command.priority,
                    WriteValue::Value(command.value.into()),
                )
                .await
                .with_context(|| format!("initial command on {}", entry.object_id()))?;
        }
    }

    let table = ObjectTable::new(
        managers
            .iter()
            .map(|manager| Arc::clone(manager) as Arc<dyn IntrinsicReporting>)
            .collect(),
    );
    let alarms = AlarmService::new(table.clone(), Arc::clone(&registry));
    let dispatcher = Dispatcher::new(device, Arc::clone(&network), Arc::clone(&network));
    let engine = EventEngine::new(table, registry, dispatcher, Arc::clone(&bus), SystemClock);

    // Bus logger
    let mut events = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    tracing::info!(object = %event.object, kind = ?event.kind, "bus event");
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "bus logger lagging");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut tick = tokio::time::interval(Duration::from_millis(config.engine.tick_ms));
    let mut sweep = tokio::time::interval(Duration::from_secs(config.engine.sweep_secs));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    tracing::info!(
        tick_ms = config.engine.tick_ms,
        sweep_secs = config.engine.sweep_secs,
        "engine running"
    );
    loop {
        tokio::select! {
            _ = tick.tick() => {
                engine.tick().await;
            }
            _ = sweep.tick() => {
                let unresolved = engine.sweep_addresses().await;
                if unresolved > 0 {
                    tracing::debug!(unresolved, "address sweep done");
                }
            }
            result = &mut shutdown => {
                result.context("failed to listen for shutdown signal")?;
                break;
            }
        }
    }

    let active = alarms.get_alarm_summary();
    tracing::info!(active_alarms = active.len(), "shutting down");
    Ok(())
}
