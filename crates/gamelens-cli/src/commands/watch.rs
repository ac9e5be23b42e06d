//! Attach to the game and tick the session until Ctrl-C or the game exits.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use gamelens_core::{
    AreaSnapshot, Config, CoreEvent, Error, MemoryReader, OffsetStates, ReadMemory, Session,
};
use tracing::{debug, error, info, warn};

use crate::shutdown::ShutdownSignal;

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

pub fn run(config: &Config, pid: Option<u32>) -> Result<()> {
    let shutdown = ShutdownSignal::on_ctrlc()?;

    if !config.offsets.is_valid() {
        warn!(
            "Offsets for version {:?} are incomplete, game states will not resolve",
            config.offsets.version
        );
    }

    info!("Waiting for {}... (Ctrl-C to quit)", config.process.name);
    while !shutdown.is_shutdown() {
        match crate::open_reader(config, pid) {
            Ok(reader) => {
                observe(config, reader, &shutdown)?;
                if pid.is_some() {
                    break;
                }
                info!("Process disconnected, waiting for reconnect...");
            }
            Err(e) => debug!("{}", e),
        }

        if shutdown.wait(RECONNECT_DELAY) {
            break;
        }
    }

    info!("Shutdown complete");
    Ok(())
}

fn observe(config: &Config, reader: MemoryReader, shutdown: &ShutdownSignal) -> Result<()> {
    let reader = Arc::new(reader);
    let shared: Arc<dyn ReadMemory> = reader.clone();
    let states = OffsetStates::new(Arc::clone(&shared), config.offsets.clone());
    let mut session = Session::new(shared, Arc::new(config.settings.clone()));
    let interval = Duration::from_millis(config.process.tick_interval_ms);
    let summary_every = config.process.summary_every;

    info!("Attached to process {}", reader.process().pid);
    let result = loop {
        if !reader.process().is_running() {
            info!("Game exited");
            break Ok(());
        }
        if let Some(fatal) = session.tick(&states).err().and_then(tick_failed) {
            break Err(fatal);
        }
        if summary_every > 0 && session.frames() % summary_every == 0 {
            log_summary(&session);
        }
        if shutdown.wait(interval) {
            break Ok(());
        }
    };

    session.handle(CoreEvent::SessionClosed)?;
    result
}

/// Contract violations stop the watch loop; anything else skips one frame
fn tick_failed(error: Error) -> Option<anyhow::Error> {
    if error.is_contract_violation() {
        error!("Tick failed: {}", error);
        Some(error.into())
    } else {
        warn!("Skipping frame: {}", error);
        None
    }
}

fn log_summary(session: &Session) {
    let snapshot = AreaSnapshot::capture(session.area());
    let by_type = snapshot
        .count_by_type()
        .iter()
        .map(|(kind, count)| format!("{}={}", kind, count))
        .collect::<Vec<_>>()
        .join(" ");
    info!(
        "{} | area {} level {} | {} awake, {} in bubble | {}",
        session.state(),
        snapshot.area_hash,
        snapshot.monster_level,
        snapshot.entities.len(),
        snapshot.network_bubble_entity_count,
        by_type
    );
}
