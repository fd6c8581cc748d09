use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use fw_core::{AdminConfig, BlockPos, EntityId, MemoryEntity, MemoryStore, MemoryWorld, Vec3};
use fw_runtime::{Coordinator, DeviceConfig, RuntimeConfig, RuntimeEventKind, SessionState};

/// Parameters of one headless run.
pub struct Scenario {
    pub ticks: u64,
    pub seed: u64,
    pub jitter: f64,
    pub arming: u64,
    pub fuse: u64,
    pub walkers: usize,
    pub verbose: bool,
}

/// Where the arming player stands, well outside the default region.
const SAPPER_AT: Vec3 = Vec3::new(200.5, 65.0, 0.5);
const LOOK: Vec3 = Vec3::new(0.0, 0.0, -1.0);
const WALKER_STEP: f64 = 0.4;

pub fn run(scenario: &Scenario) -> Result<(), String> {
    if !scenario.jitter.is_finite() || scenario.jitter < 0.0 {
        return Err(format!(
            "jitter must be a non-negative number, got {}",
            scenario.jitter
        ));
    }
    let mut rng = StdRng::seed_from_u64(scenario.seed);
    debug!(
        seed = scenario.seed,
        ticks = scenario.ticks,
        walkers = scenario.walkers,
        "scenario starting"
    );

    let device = DeviceConfig::default()
        .with_arming_ticks(scenario.arming)
        .with_fuse_ticks(scenario.fuse);
    let admin = AdminConfig {
        check_interval_ticks: 5,
        cooldown_ticks: 40,
        ..AdminConfig::default()
    };
    let radius = f64::from(admin.radius);

    let mut world = MemoryWorld::new();
    world.put_block(BlockPos::containing(SAPPER_AT).below(), device.target_block.clone());
    let mut sapper = MemoryEntity::at("sapper", SAPPER_AT);
    sapper.using_item = true;
    let sapper = world.add_entity(sapper).map_err(|e| e.to_string())?;

    let mut walkers = Vec::with_capacity(scenario.walkers);
    for i in 0..scenario.walkers {
        let side = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
        let x = side * (radius + rng.random_range(-8.0..=8.0));
        let z = rng.random_range(-radius / 2.0..=radius / 2.0);
        let id = world
            .add_entity(MemoryEntity::at(format!("walker-{}", i + 1), Vec3::new(x, 64.0, z)))
            .map_err(|e| e.to_string())?;
        walkers.push(id);
    }

    let store = MemoryStore::with_blob(admin.to_json().map_err(|e| e.to_string())?);
    let config = RuntimeConfig::default()
        .with_device(device)
        .with_max_events(0);
    let mut coordinator = Coordinator::new(world, config, Box::new(store));

    let players: Vec<EntityId> = std::iter::once(sapper).chain(walkers.iter().copied()).collect();
    for &player in &players {
        coordinator.on_player_login(player);
    }
    coordinator
        .on_use_started(sapper)
        .map_err(|e| format!("arming rejected: {e}"))?;

    for _ in 0..scenario.ticks {
        if scenario.jitter > 0.0 {
            let j = scenario.jitter;
            let look = LOOK.offset(
                rng.random_range(-j..=j),
                rng.random_range(-j..=j),
                rng.random_range(-j..=j),
            );
            coordinator.host_mut().look(sapper, look);
        }
        for &walker in &walkers {
            let Some(pos) = coordinator.host().entity(walker).map(|e| e.position) else {
                continue;
            };
            let next = pos.offset(
                rng.random_range(-WALKER_STEP..=WALKER_STEP),
                0.0,
                rng.random_range(-WALKER_STEP..=WALKER_STEP),
            );
            coordinator.host_mut().move_to(walker, next);
        }
        coordinator.step();
        for &player in &players {
            coordinator.on_player_tick(player);
        }
    }

    // Header
    println!(
        "  {} {}",
        "Simulation".bold(),
        format!(
            "({} ticks, seed={}, jitter={}, arming={}, fuse={})",
            scenario.ticks, scenario.seed, scenario.jitter, scenario.arming, scenario.fuse
        )
        .dimmed()
    );
    println!(
        "  {} players tracked, {} events logged",
        players.len(),
        coordinator.events().len()
    );
    println!();

    if scenario.verbose {
        println!("  {}", "Event Log".bold().underline());
        println!();
        for event in coordinator.events().events() {
            let tick_label = format!("[tick {:>4}]", event.tick).dimmed();
            let desc = colorize_event(&event.kind, &event.description);
            println!("  {tick_label} {desc}");
        }
        if coordinator.events().is_empty() {
            println!("  {}", "(no events)".dimmed());
        }
        println!();
    }

    print_device_summary(&coordinator, sapper);
    print_region_summary(&coordinator, &players);
    Ok(())
}

fn print_device_summary(coordinator: &Coordinator<MemoryWorld>, sapper: EntityId) {
    let events = coordinator.events();
    let outcome = events
        .events_for_entity(sapper)
        .iter()
        .rev()
        .find_map(|e| match &e.kind {
            RuntimeEventKind::Detonated { .. } => Some("DETONATED".red().bold()),
            RuntimeEventKind::Defused { .. } => Some("DEFUSED".green().bold()),
            RuntimeEventKind::DetonationSkipped { .. } => Some("SKIPPED".yellow()),
            RuntimeEventKind::ArmingInvalidated { .. } => Some("INVALIDATED".yellow().bold()),
            _ => None,
        })
        .unwrap_or_else(|| match coordinator.session_state(sapper) {
            SessionState::Arming => "ARMING".cyan(),
            SessionState::Placed => "COUNTING DOWN".cyan().bold(),
            other => other.name().to_uppercase().normal(),
        });
    let placed = events
        .matching(|k| matches!(k, RuntimeEventKind::DevicePlaced { entity, .. } if *entity == sapper))
        .first()
        .map_or_else(|| "--".to_string(), |e| format!("tick {}", e.tick));
    let invalidation = events
        .events_for_entity(sapper)
        .iter()
        .find_map(|e| match &e.kind {
            RuntimeEventKind::ArmingInvalidated { reason, .. } => Some(reason.to_string()),
            _ => None,
        })
        .unwrap_or_else(|| "--".to_string());
    let broadcasts = events
        .matching(|k| matches!(k, RuntimeEventKind::CountdownBroadcast { .. }))
        .len();

    println!("  {}", "Device".bold().underline());
    println!();
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Outcome", "Placed", "Broadcasts", "Explosions", "Invalidated by"]);
    table.add_row(vec![
        outcome.to_string(),
        placed,
        broadcasts.to_string(),
        coordinator.host().explosions().len().to_string(),
        invalidation,
    ]);
    println!("{table}");
    println!();
}

fn print_region_summary(coordinator: &Coordinator<MemoryWorld>, players: &[EntityId]) {
    println!("  {}", "Region".bold().underline());
    println!();
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Player", "Entered", "Left", "Deferred", "Mode"]);
    let events = coordinator.events();
    for &player in players {
        let count = |pred: fn(&RuntimeEventKind) -> bool| {
            events
                .events_for_entity(player)
                .iter()
                .filter(|e| pred(&e.kind))
                .count()
                .to_string()
        };
        let Some(entity) = coordinator.host().entity(player) else {
            continue;
        };
        table.add_row(vec![
            entity.name.clone(),
            count(|k| matches!(k, RuntimeEventKind::RegionEntered { .. })),
            count(|k| matches!(k, RuntimeEventKind::RegionLeft { .. })),
            count(|k| matches!(k, RuntimeEventKind::RegionCooldown { .. })),
            entity.mode.to_string(),
        ]);
    }
    println!("{table}");
    println!();
}

fn colorize_event(kind: &RuntimeEventKind, description: &str) -> colored::ColoredString {
    match kind {
        RuntimeEventKind::Detonated { .. } => description.red().bold(),
        RuntimeEventKind::ArmingInvalidated { .. } | RuntimeEventKind::DetonationSkipped { .. } => {
            description.yellow()
        }
        RuntimeEventKind::Defused { .. } => description.green().bold(),
        RuntimeEventKind::DevicePlaced { .. } | RuntimeEventKind::ArmingStarted { .. } => {
            description.cyan()
        }
        RuntimeEventKind::CountdownBroadcast { .. } => description.magenta(),
        RuntimeEventKind::RegionEntered { .. } | RuntimeEventKind::RegionLeft { .. } => {
            description.blue()
        }
        RuntimeEventKind::RegionCooldown { .. } => description.dimmed(),
        RuntimeEventKind::Primed | RuntimeEventKind::ConfigChanged { .. } => description.normal(),
    }
}
