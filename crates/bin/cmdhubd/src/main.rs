//! # cmdhubd: cmdhub daemon
//!
//! Composition root that wires the command-line integration into the hub and
//! keeps it polling until interrupted.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Initialise logging
//! - Construct the in-memory repository, event bus and application services
//! - Set up the command-line integration, which registers its sensors with
//!   the scheduler
//! - Handle graceful shutdown (Ctrl+C)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer, no domain logic belongs here.

mod config;

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;

use cmdhub_adapter_command_line::CommandLineIntegration;
use cmdhub_app::event_bus::InProcessEventBus;
use cmdhub_app::memory::InMemoryEntityRepository;
use cmdhub_app::ports::Integration;
use cmdhub_app::scheduler::Scheduler;
use cmdhub_app::services::entity_service::EntityService;
use cmdhub_app::services::integration_context::ServiceContext;
use cmdhub_app::services::issue_service::IssueService;
use cmdhub_domain::event::{Event, EventType};

use config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(config.log_filter()?)
        .init();

    let legacy = config.legacy_sensors()?;
    tracing::info!(
        sensors = config.command_line.binary_sensor.len(),
        legacy_sensors = legacy.len(),
        "cmdhubd starting"
    );

    // Event bus
    let event_bus = InProcessEventBus::new(256);
    let event_log = tokio::spawn(log_events(event_bus.subscribe()));

    // Services
    let entity_service = Arc::new(EntityService::new(
        InMemoryEntityRepository::new(),
        event_bus.clone(),
    ));
    let issue_service = Arc::new(IssueService::new(event_bus));
    let scheduler = Arc::new(Scheduler::new(config.scan_interval()));
    let ctx = ServiceContext::new(entity_service, issue_service, Arc::clone(&scheduler));

    // Integrations
    let mut integration = CommandLineIntegration::from_config(config.command_line, legacy);
    integration.setup(&ctx).await?;
    tracing::info!(
        integration = integration.name(),
        polled = scheduler.len(),
        scan_interval_secs = scheduler.scan_interval().as_secs(),
        "integration ready"
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");

    if let Err(err) = integration.teardown().await {
        tracing::warn!(integration = integration.name(), error = %err, "teardown failed");
    }
    scheduler.shutdown().await;
    event_log.abort();

    Ok(())
}

/// Mirror every domain event into the log.
async fn log_events(mut events: tokio::sync::broadcast::Receiver<Event>) {
    loop {
        match events.recv().await {
            Ok(event) => match event.event_type {
                EventType::StateChanged => {
                    tracing::info!(data = %event.data, "state changed");
                }
                EventType::EntityCreated | EventType::IssueCreated => {
                    tracing::debug!(event_type = ?event.event_type, data = %event.data, "event");
                }
            },
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "event log lagging behind");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
