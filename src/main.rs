//! kiosk-assistant: daemon driving a single kiosk session
//!
//! Provides:
//! - Dialogue controller sequencing greeting, onboarding and topic clips
//! - Headless talking/idle surfaces reporting clip completion
//! - IPC server for the chat UI (submit, mute, status, transcript, events)
//! - Optional stdin console for submissions

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use kiosk_assistant::chat::ChatLog;
use kiosk_assistant::config::Config;
use kiosk_assistant::console;
use kiosk_assistant::events::SessionEvent;
use kiosk_assistant::ipc::{KioskStatus, Server};
use kiosk_assistant::lifecycle::ShutdownSignal;
use kiosk_assistant::playback::{MuteSwitch, SimulatedSurface};
use kiosk_assistant::session::{DialogueController, KioskInput};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "kiosk-assistant starting");

    // Load configuration
    let config = Config::load()?;
    config.ensure_dirs()?;
    info!(?config.socket_path, ?config.catalog_path, "configuration loaded");

    let catalog = Arc::new(config.catalog()?);
    info!(topics = catalog.topics.len(), routes = catalog.router.len(), "catalog loaded");

    let shutdown = ShutdownSignal::new();

    // UI / console -> controller
    let (input_tx, input_rx) = mpsc::channel::<KioskInput>(32);
    // Surfaces -> controller (natural end of clip)
    let (ended_tx, ended_rx) = mpsc::unbounded_channel();
    // Controller -> IPC server and subscribers
    let (event_tx, _event_rx) = broadcast::channel::<SessionEvent>(64);

    let mute = MuteSwitch::new(config.start_muted);
    let talking = SimulatedSurface::new("talking", config.clip_length, ended_tx.clone());
    let idle = SimulatedSurface::new("idle", config.clip_length, ended_tx);

    let mut controller = DialogueController::new(
        Arc::clone(&catalog),
        talking,
        idle,
        mute,
        ChatLog::new(),
        event_tx.clone(),
    );

    let server = Server::new(
        &config.socket_path,
        KioskStatus::from(controller.status()),
        input_tx.clone(),
        event_tx.clone(),
    )?;

    if config.console {
        let console_tx = input_tx.clone();
        tokio::spawn(async move {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            if let Err(e) = console::forward_lines(stdin, console_tx).await {
                warn!(?e, "console reader failed");
            }
        });
        info!("console input enabled");
    }

    let mut ipc_event_rx = event_tx.subscribe();

    // Kick off the session
    input_tx.send(KioskInput::Start).await?;

    info!("kiosk initialized, entering main loop");

    // Main event loop
    tokio::select! {
        // Run the dialogue controller (processes inputs and clip completions)
        _ = controller.run(input_rx, ended_rx) => {
            info!("dialogue controller exited");
        }

        // Run the IPC server (accepts client connections)
        result = server.run() => {
            if let Err(e) = result {
                error!(?e, "IPC server error");
            }
        }

        // Mirror session events into the IPC server's view
        _ = async {
            loop {
                match ipc_event_rx.recv().await {
                    Ok(event) => {
                        info!(%event, "session event");
                        server.track(&event).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "session event receiver lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
        } => {
            info!("session event handler exited");
        }

        // Wait for shutdown signal
        _ = shutdown.wait() => {
            info!("shutdown signal received");
        }
    }

    // Cleanup
    info!("shutting down...");

    server.shutdown().await;

    info!("kiosk-assistant stopped");

    Ok(())
}
