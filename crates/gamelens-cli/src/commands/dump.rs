//! Run a few ticks and print what was decoded as JSON.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use gamelens_core::{AreaSnapshot, CacheSnapshot, Config, OffsetStates, ReadMemory, Session};
use serde_json::json;
use tracing::info;

pub fn run(
    config: &Config,
    pid: Option<u32>,
    ticks: u32,
    output: Option<&Path>,
    strings: bool,
) -> Result<()> {
    let reader: Arc<dyn ReadMemory> = Arc::new(crate::open_reader(config, pid)?);
    let states = OffsetStates::new(Arc::clone(&reader), config.offsets.clone());
    let mut session = Session::new(reader, Arc::new(config.settings.clone()));

    for _ in 0..ticks.max(1) {
        session.tick(&states)?;
    }
    info!("Captured after {} ticks in {}", session.frames(), session.state());

    let dump = json!({
        "state": session.state(),
        "area": AreaSnapshot::capture(session.area()),
        "strings": strings.then(|| CacheSnapshot::capture(session.strings())),
    });
    let json = serde_json::to_string_pretty(&dump)?;

    match output {
        Some(path) => {
            std::fs::write(path, json)?;
            println!("Dump saved to: {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
