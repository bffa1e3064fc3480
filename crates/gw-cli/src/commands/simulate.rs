use std::path::Path;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

use gw_core::{DomainEvent, WorldEventKind};
use gw_simulation::scenario;
use gw_simulation::{InMemoryStore, SimConfig, WorldSimulationService};

pub fn run(ticks: u64, seed: Option<u64>, config: Option<&Path>, verbose: bool) -> Result<(), String> {
    let mut config = match config {
        Some(path) => super::config::load(path)?,
        None => SimConfig::default(),
    };
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }
    let seed = config.seed;

    let arena = scenario::arena().map_err(|e| format!("cannot build arena: {e}"))?;
    let player = arena.player;
    let mut sim = WorldSimulationService::with_transition_rules(config, InMemoryStore::new(arena.state), arena.rules)
        .map_err(|e| format!("simulation init failed: {e}"))?;
    let tick = sim.run(ticks).map_err(|e| format!("simulation error: {e}"))?;
    tracing::info!(ticks, seed, %tick, events = sim.events().len(), "simulation finished");

    // Header
    println!(
        "  {} 'arena' {}",
        "Simulation".bold(),
        format!("({ticks} ticks, seed={seed})").dimmed()
    );
    println!("  {} events committed, world at {tick}", sim.events().len());
    let state = sim.store().read();
    let weather: Vec<String> = state
        .weather_zones()
        .map(|z| format!("{} {}", z.id(), z.current()))
        .collect();
    println!("  Weather: {}", weather.join(", "));
    println!("  Player funds: {}", state.funds(player));
    println!();

    if verbose {
        println!("  {}", "Event Log".bold().underline());
        println!();
        for event in sim.events().events() {
            let tick_label = format!("[{:>5}]", event.tick.to_string()).dimmed();
            println!("  {tick_label} {}", describe(event));
        }
        if sim.events().is_empty() {
            println!("  {}", "(no events)".dimmed());
        }
        println!();
    }

    // Events by type
    let counts = sim.events().count_by_type();
    if !counts.is_empty() {
        println!("  {}", "Events".bold().underline());
        println!();
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["Event", "Count"]);
        for (event_type, count) in &counts {
            table.add_row(vec![format!("{event_type:?}"), count.to_string()]);
        }
        println!("{table}");
        println!();
    }

    // Monster status table
    println!("  {}", "Monsters".bold().underline());
    println!();
    if state.monsters().next().is_none() {
        println!("  {}", "(none spawned)".dimmed());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Monster", "Kind", "Map", "Status", "HP", "Position", "State"]);
    for monster in state.monsters() {
        let kind = state
            .template(monster.template_id())
            .map_or_else(|| monster.template_id().to_string(), |t| t.name.clone());
        let status = if monster.is_alive() {
            "alive".green().to_string()
        } else {
            "dead".red().bold().to_string()
        };
        let body = state
            .map(monster.spot_id())
            .and_then(|m| m.object(monster.object_id()));
        let position = body.map_or_else(|| "--".to_string(), |o| o.coordinate().to_string());
        let behavior = body
            .and_then(|o| o.component.behavior())
            .map_or_else(|| "--".to_string(), |b| b.state.to_string());
        table.add_row(vec![
            monster.id().to_string(),
            kind,
            monster.spot_id().to_string(),
            status,
            format!("{}/{}", monster.hp().current(), monster.hp().max()),
            position,
            behavior,
        ]);
    }
    println!("{table}");
    println!();

    Ok(())
}

fn describe(event: &DomainEvent) -> String {
    match &event.kind {
        WorldEventKind::MonsterSpawned {
            spot_id,
            monster_id,
            coordinate,
            ..
        } => format!("{monster_id} spawned on {spot_id} at {coordinate}").green().to_string(),
        WorldEventKind::MonsterDamaged {
            monster_id,
            attacker_id,
            damage,
            critical,
            remaining_hp,
            ..
        } => {
            let crit = if *critical { " (critical)" } else { "" };
            format!("{monster_id} took {damage}{crit} from {attacker_id}, {remaining_hp} hp left")
                .yellow()
                .to_string()
        }
        WorldEventKind::MonsterDied {
            monster_id,
            killer_id,
            coordinate,
            ..
        } => {
            let killer = killer_id.map_or_else(|| "unknown causes".to_string(), |k| k.to_string());
            format!("{monster_id} was killed by {killer} at {coordinate}")
                .red()
                .bold()
                .to_string()
        }
        WorldEventKind::BehaviorStateChanged { object_id, from, to, .. } => {
            format!("{object_id} {from} -> {to}").cyan().to_string()
        }
        WorldEventKind::WeatherChanged { zone_id, from, to, .. } => {
            format!("{zone_id} weather {from} -> {to}").blue().to_string()
        }
        WorldEventKind::ItemDropped {
            item_id, coordinate, ..
        } => format!("{item_id} dropped at {coordinate}").magenta().to_string(),
        WorldEventKind::ObjectTransferred {
            object_id,
            from_spot_id,
            to_spot_id,
            ..
        } => format!("{object_id} travelled {from_spot_id} -> {to_spot_id}"),
        other => format!("{:?}", other.event_type()).dimmed().to_string(),
    }
}
