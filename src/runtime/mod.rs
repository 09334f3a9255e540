//! Real-time driver: owns a [`Session`] inside one task so that commands and
//! timer ticks are applied strictly one after another.

use std::time::Duration;

use anyhow::Result;
use log::{debug, info, warn};
use thiserror::Error;
use tokio::{
    sync::{broadcast, mpsc, oneshot},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};

use crate::{
    conversion::Conversion,
    engine::Session,
    error::ConversionError,
    events::GameEvent,
    habitat::HabitatSnapshot,
    mission::PartyProgress,
    scenario::Scenario,
};

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub waste_interval: Duration,
    pub day_interval: Duration,
    pub command_capacity: usize,
    pub event_capacity: usize,
}

impl RuntimeConfig {
    pub fn from_scenario(scenario: &Scenario) -> Self {
        Self {
            waste_interval: Duration::from_secs(scenario.ticks.waste_interval_secs),
            day_interval: Duration::from_secs(scenario.ticks.day_interval_secs),
            ..Self::default()
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            waste_interval: Duration::from_secs(10),
            day_interval: Duration::from_secs(10),
            command_capacity: 64,
            event_capacity: 256,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuntimeError {
    #[error(transparent)]
    Conversion(#[from] ConversionError),
    #[error("habitat runtime has stopped")]
    Stopped,
}

/// Shortest tick period the driver will run; zero periods are raised to it.
pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

type Reply<T> = oneshot::Sender<T>;

enum Command {
    Execute {
        recipe_id: String,
        reply: Reply<Result<Conversion, ConversionError>>,
    },
    CanExecute {
        recipe_id: String,
        reply: Reply<bool>,
    },
    CollectWaste {
        resource: String,
        reply: Reply<Result<u64, ConversionError>>,
    },
    StartMission {
        reply: Reply<bool>,
    },
    AcknowledgeParty {
        reply: Reply<()>,
    },
    ResetRecipes {
        reply: Reply<()>,
    },
    PartyProgress {
        reply: Reply<PartyProgress>,
    },
    Snapshot {
        reply: Reply<HabitatSnapshot>,
    },
    Shutdown,
}

/// Cheap, cloneable access to a running habitat.
#[derive(Clone)]
pub struct HabitatHandle {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<GameEvent>,
}

impl HabitatHandle {
    pub async fn execute(&self, recipe_id: &str) -> Result<Conversion, RuntimeError> {
        let recipe_id = recipe_id.to_string();
        Ok(self
            .request(|reply| Command::Execute { recipe_id, reply })
            .await??)
    }

    pub async fn can_execute(&self, recipe_id: &str) -> Result<bool, RuntimeError> {
        let recipe_id = recipe_id.to_string();
        self.request(|reply| Command::CanExecute { recipe_id, reply })
            .await
    }

    pub async fn collect_waste(&self, resource: &str) -> Result<u64, RuntimeError> {
        let resource = resource.to_string();
        Ok(self
            .request(|reply| Command::CollectWaste { resource, reply })
            .await??)
    }

    pub async fn start_mission(&self) -> Result<bool, RuntimeError> {
        self.request(|reply| Command::StartMission { reply }).await
    }

    pub async fn acknowledge_party(&self) -> Result<(), RuntimeError> {
        self.request(|reply| Command::AcknowledgeParty { reply })
            .await
    }

    pub async fn reset_recipes(&self) -> Result<(), RuntimeError> {
        self.request(|reply| Command::ResetRecipes { reply }).await
    }

    pub async fn party_progress(&self) -> Result<PartyProgress, RuntimeError> {
        self.request(|reply| Command::PartyProgress { reply }).await
    }

    pub async fn snapshot(&self) -> Result<HabitatSnapshot, RuntimeError> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    pub async fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown).await;
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.events.subscribe()
    }

    /// Event stream that skips over anything a slow consumer missed.
    pub fn event_stream(&self) -> impl Stream<Item = GameEvent> {
        BroadcastStream::new(self.events.subscribe()).filter_map(|msg| match msg {
            Ok(event) => Some(event),
            Err(err) => {
                warn!("event subscriber fell behind: {err}");
                None
            }
        })
    }

    async fn request<T>(&self, build: impl FnOnce(Reply<T>) -> Command) -> Result<T, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(build(tx))
            .await
            .map_err(|_| RuntimeError::Stopped)?;
        rx.await.map_err(|_| RuntimeError::Stopped)
    }
}

/// Moves `session` onto its own task. The task ends on `shutdown`, when
/// every handle is dropped, or when a tick system fails.
pub fn spawn(session: Session, mut config: RuntimeConfig) -> (HabitatHandle, JoinHandle<Result<()>>) {
    for (label, interval) in [
        ("waste", &mut config.waste_interval),
        ("day", &mut config.day_interval),
    ] {
        if *interval < MIN_TICK_INTERVAL {
            warn!("{label} tick interval {interval:?} too short, using {MIN_TICK_INTERVAL:?}");
            *interval = MIN_TICK_INTERVAL;
        }
    }
    let (command_tx, command_rx) = mpsc::channel(config.command_capacity.max(1));
    let (event_tx, _) = broadcast::channel(config.event_capacity.max(1));
    let handle = HabitatHandle {
        commands: command_tx,
        events: event_tx.clone(),
    };
    let task = tokio::spawn(drive(session, command_rx, event_tx, config));
    (handle, task)
}

async fn drive(
    mut session: Session,
    mut commands: mpsc::Receiver<Command>,
    events: broadcast::Sender<GameEvent>,
    config: RuntimeConfig,
) -> Result<()> {
    let start = Instant::now();
    let mut waste_timer = time::interval_at(start + config.waste_interval, config.waste_interval);
    let mut day_timer = time::interval_at(start + config.day_interval, config.day_interval);
    waste_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    day_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!("habitat '{}' runtime started", session.scenario_name());

    loop {
        // Biased so that when a tick and a command are both ready the tick
        // lands first; every branch runs to completion before the next.
        tokio::select! {
            biased;
            _ = waste_timer.tick() => session.on_waste_tick()?,
            _ = day_timer.tick() => session.on_day_tick()?,
            command = commands.recv() => match command {
                Some(Command::Shutdown) | None => break,
                Some(command) => apply(&mut session, command),
            },
        }
        publish(&mut session, &events);
    }

    publish(&mut session, &events);
    info!(
        "habitat '{}' runtime stopped on sol {}",
        session.scenario_name(),
        session.sol()
    );
    Ok(())
}

fn apply(session: &mut Session, command: Command) {
    match command {
        Command::Execute { recipe_id, reply } => {
            let _ = reply.send(session.execute(&recipe_id));
        }
        Command::CanExecute { recipe_id, reply } => {
            let _ = reply.send(session.can_execute(&recipe_id));
        }
        Command::CollectWaste { resource, reply } => {
            let _ = reply.send(session.collect_waste(&resource));
        }
        Command::StartMission { reply } => {
            let _ = reply.send(session.start_mission());
        }
        Command::AcknowledgeParty { reply } => {
            session.acknowledge_party();
            let _ = reply.send(());
        }
        Command::ResetRecipes { reply } => {
            session.reset_recipes();
            let _ = reply.send(());
        }
        Command::PartyProgress { reply } => {
            let _ = reply.send(session.party_progress());
        }
        Command::Snapshot { reply } => {
            let _ = reply.send(session.snapshot());
        }
        Command::Shutdown => {}
    }
}

fn publish(session: &mut Session, events: &broadcast::Sender<GameEvent>) {
    for event in session.drain_events() {
        debug!("event: {event:?}");
        // No subscribers is fine; the UI may not be listening yet.
        let _ = events.send(event);
    }
}
