use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use tokio_stream::StreamExt;

use mars_recycler::{
    engine::Session,
    events::GameEvent,
    runtime::{self, RuntimeConfig},
    scenario::{Scenario, ScenarioLoader},
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Mars habitat recycling runner")]
struct Cli {
    /// Scenario YAML file (the built-in Mars base when omitted)
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Number of sols to play
    #[arg(long, default_value_t = 10)]
    sols: u64,

    /// Override the scenario seed
    #[arg(long)]
    seed: Option<u64>,

    /// Print the final habitat snapshot as JSON
    #[arg(long)]
    json: bool,

    /// Drive the habitat on the wall clock until Ctrl-C instead of autoplaying
    #[arg(long)]
    realtime: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut scenario = match &cli.scenario {
        Some(path) => ScenarioLoader::new(".").load(path)?,
        None => Scenario::mars_base(),
    };
    if let Some(seed) = cli.seed {
        scenario.seed = seed;
    }
    info!("loaded scenario '{}' (seed {})", scenario.name, scenario.seed);

    if cli.realtime {
        let rt = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;
        return rt.block_on(run_realtime(&scenario));
    }

    let mut session = Session::from_scenario(&scenario)?;
    autoplay(&mut session, cli.sols)?;

    let snapshot = session.snapshot();
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        let made: u64 = snapshot.products.iter().map(|level| level.count).sum();
        println!(
            "Scenario '{}' reached sol {}. Products made: {}. Mission complete: {}. Party supplies: {}/{}.",
            snapshot.scenario,
            snapshot.sol,
            made,
            snapshot.mission_completed,
            snapshot.party.ready_count(),
            snapshot.party.items.len()
        );
    }
    Ok(())
}

/// Greedy crew: after each waste tick run every recipe that is currently
/// eligible, in catalog order, then close the sol.
fn autoplay(session: &mut Session, sols: u64) -> Result<()> {
    for _ in 0..sols {
        session.on_waste_tick()?;
        let ids: Vec<String> = session
            .habitat()
            .catalog()
            .list()
            .iter()
            .map(|recipe| recipe.id().to_string())
            .collect();
        for id in ids {
            if session.can_execute(&id) {
                session.execute(&id)?;
            }
        }
        session.on_day_tick()?;
        for event in session.drain_events() {
            log_event(&event);
            if matches!(event, GameEvent::PartyReady { .. }) {
                session.acknowledge_party();
            }
        }
    }
    Ok(())
}

async fn run_realtime(scenario: &Scenario) -> Result<()> {
    let session = Session::from_scenario(scenario)?;
    let (handle, task) = runtime::spawn(session, RuntimeConfig::from_scenario(scenario));
    let mut events = Box::pin(handle.event_stream());
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    info!("habitat running; press Ctrl-C to stop");

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            event = events.next() => match event {
                Some(event) => log_event(&event),
                None => break,
            },
        }
    }

    let snapshot = handle.snapshot().await?;
    handle.shutdown().await;
    task.await.context("runtime task panicked")??;
    info!(
        "stopped on sol {} with mission complete: {}",
        snapshot.sol, snapshot.mission_completed
    );
    Ok(())
}

fn log_event(event: &GameEvent) {
    match event {
        GameEvent::ResourceWarning { .. } => warn!("{}", describe(event)),
        _ => info!("{}", describe(event)),
    }
}

fn describe(event: &GameEvent) -> String {
    match event {
        GameEvent::ConversionSucceeded {
            recipe_name,
            summary,
            ..
        } => format!("{recipe_name} produced {summary}"),
        GameEvent::ResourceWarning {
            severity,
            resource,
            level,
        } => format!("{severity:?} {resource}: {level}%"),
        GameEvent::MissionCompleted { .. } => "mission accomplished".to_string(),
        GameEvent::PartyReady { items } => {
            let names: Vec<&str> = items.iter().map(|item| item.name.as_str()).collect();
            format!("party ready: {}", names.join(", "))
        }
        GameEvent::MissionStarted => "mission started".to_string(),
        GameEvent::WasteGenerated { sol, amounts } => {
            let total: u64 = amounts.iter().map(|level| level.count).sum();
            format!("sol {sol}: crew produced {total} units of waste")
        }
        GameEvent::WasteCollected { resource, amount } => {
            format!("collected {amount} {resource}")
        }
        GameEvent::SolAdvanced { sol } => format!("sol {sol} begins"),
    }
}

fn init_logging(verbosity: u8) {
    let mut builder = env_logger::Builder::new();
    let base_level = match verbosity {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);
    // RUST_LOG still wins for targeted filtering.
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}
