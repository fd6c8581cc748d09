use std::path::Path;

use colored::Colorize;
use tracing::debug;

use fw_core::{JsonFileStore, MemoryEntity, MemoryWorld, Vec3, load_config};
use fw_runtime::{AdminCommand, Coordinator, RuntimeConfig};

/// Name of the stand-in player used when `--at` is given.
const ACTOR_NAME: &str = "console";

pub fn run(config: &Path, at: Option<Vec3>, words: &[String]) -> Result<(), String> {
    let store = JsonFileStore::new(config);
    // Refuse to run over a corrupt file rather than overwrite it with defaults.
    load_config(&store).map_err(|e| format!("cannot read {}: {e}", config.display()))?;

    let mut world = MemoryWorld::new();
    let actor = match at {
        Some(pos) => Some(
            world
                .add_entity(MemoryEntity::at(ACTOR_NAME, pos))
                .map_err(|e| e.to_string())?,
        ),
        None => None,
    };

    let input = words.join(" ");
    debug!(config = %config.display(), input = %input, "running admin command");
    let mutation = AdminCommand::parse(&input).is_ok_and(|cmd| cmd.is_mutation());
    let mut coordinator = Coordinator::new(world, RuntimeConfig::default(), Box::new(store));
    let outcome = coordinator.run_admin(actor, &input);

    if !outcome.is_success() {
        return Err(outcome.lines.join("; "));
    }
    for line in &outcome.lines {
        if mutation {
            println!("  {}", line.green());
        } else {
            println!("  {line}");
        }
    }
    Ok(())
}
