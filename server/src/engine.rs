//! The simulation engine: fixed-rate tick loop and its control surface.
//!
//! The [`Engine`] owns the world, the spatial index and the AI controller
//! exclusively; it is the single writer of authoritative state. Everything
//! outside the simulation interacts through the [`ArenaHandle`]: intents go
//! in through the inbox, joins/leaves/stop travel over a command channel
//! drained at the start of each tick, and state comes out through the
//! broadcaster. No caller can block the tick, and the tick never waits on a
//! caller.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};
use shared::{EntityId, EntityKind, PlayerAction, PlayerId, Snapshot, TickUpdate, Vec2};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::MissedTickBehavior;

use crate::ai::AiController;
use crate::broadcast::{Broadcaster, StateObserver};
use crate::collision::resolve_collisions;
use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::input::IntentInbox;
use crate::snapshot::{build_snapshot, diff_snapshots};
use crate::spatial::SpatialGrid;
use crate::world::WorldState;

/// Ticks between periodic telemetry lines.
const STATS_INTERVAL: u64 = 100;

/// Lifecycle of the tick scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Stopped,
    Running,
}

/// Requests from the transport layer, drained at the start of each tick.
enum ControlCommand {
    Join {
        player_id: PlayerId,
        respond: oneshot::Sender<Result<EntityId, ArenaError>>,
    },
    Leave {
        player_id: PlayerId,
    },
    Stop,
}

/// The authoritative simulation. Single writer of all world state.
pub struct Engine {
    config: ArenaConfig,
    world: WorldState,
    grid: SpatialGrid,
    ai: AiController,
    inbox: Arc<IntentInbox>,
    broadcaster: Arc<Broadcaster>,
    /// Joined players and the entity each one controls.
    players: HashMap<PlayerId, EntityId>,
    control_rx: mpsc::UnboundedReceiver<ControlCommand>,
    state_tx: watch::Sender<SchedulerState>,
    /// Basis for the next published delta.
    last_snapshot: Snapshot,
}

impl Engine {
    /// Validates the configuration, seeds the initial AI and food
    /// population, and returns the engine paired with its control handle.
    ///
    /// Configuration problems are rejected here, before the first tick;
    /// nothing later in the simulation revalidates.
    pub fn new(config: ArenaConfig) -> Result<(Engine, ArenaHandle), ArenaError> {
        config.validate()?;

        let grid = SpatialGrid::new(config.grid_cell)?;
        let ai = AiController::new(&config);
        let mut world = WorldState::new(config.clone());
        for _ in 0..config.num_ai_players {
            world.spawn(EntityKind::AiPlayer);
        }
        for _ in 0..config.num_food {
            world.spawn(EntityKind::Food);
        }
        info!(
            "arena seeded: {} AI players, {} food, world size {}",
            config.num_ai_players, config.num_food, config.world_size
        );

        let inbox = Arc::new(IntentInbox::new());
        let broadcaster = Arc::new(Broadcaster::new());
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(SchedulerState::Stopped);

        let last_snapshot = build_snapshot(&world);
        let engine = Engine {
            config,
            world,
            grid,
            ai,
            inbox: Arc::clone(&inbox),
            broadcaster: Arc::clone(&broadcaster),
            players: HashMap::new(),
            control_rx,
            state_tx,
            last_snapshot,
        };
        let handle = ArenaHandle {
            inbox,
            broadcaster,
            control_tx,
            state_rx,
        };
        Ok((engine, handle))
    }

    /// Read access to the authoritative world, for inspection between ticks.
    pub fn world(&self) -> &WorldState {
        &self.world
    }

    /// Mutable world access for scripted scenario setup. Only reachable
    /// while the engine is not running, since [`Engine::run`] consumes self.
    pub fn world_mut(&mut self) -> &mut WorldState {
        &mut self.world
    }

    /// Executes exactly one atomic simulation tick.
    ///
    /// Order: drain control commands, drain intents, compute AI intents,
    /// move entities, resolve collisions, drop eliminated entities,
    /// replenish AI and food, advance the tick counter, publish. Returns
    /// false once a stop command has been drained; the tick that drained it
    /// still runs to completion, so the final published state is whole.
    pub fn step(&mut self) -> bool {
        let started = Instant::now();
        let keep_running = self.drain_commands();

        self.ingest_player_intents();

        // AI perceives positions as of the start of this tick.
        self.grid.rebuild(&self.world.collision_entries());
        let ai_intents = self
            .ai
            .compute_intents(&self.world, &self.grid, &self.config);
        for (id, intent) in ai_intents {
            self.world.set_intent(id, intent);
        }

        let dt = self.config.dt();
        let movers: Vec<EntityId> = self
            .world
            .alive_entities()
            .filter(|e| e.kind.is_player())
            .map(|e| e.id)
            .collect();
        for id in movers {
            self.world.apply_movement(id, dt);
        }

        // Collisions are evaluated against post-movement positions.
        self.grid.rebuild(&self.world.collision_entries());
        resolve_collisions(&mut self.world, &self.grid, self.config.consume_ratio);
        self.world.purge_dead();
        self.release_eliminated_players();
        self.replenish();

        self.world.advance_tick();
        let snapshot = build_snapshot(&self.world);
        let delta = diff_snapshots(&self.last_snapshot, &snapshot);
        self.broadcaster.publish(TickUpdate {
            snapshot: snapshot.clone(),
            delta,
        });
        self.last_snapshot = snapshot;

        if self.world.tick() % STATS_INTERVAL == 0 {
            debug!(
                "tick {} ({:?}): {} humans, {} ai, {} food, {} observers",
                self.world.tick(),
                started.elapsed(),
                self.world.count_alive(EntityKind::HumanPlayer),
                self.world.count_alive(EntityKind::AiPlayer),
                self.world.count_alive(EntityKind::Food),
                self.broadcaster.observer_count()
            );
        }

        keep_running
    }

    /// Runs the fixed-rate scheduler until a stop command arrives.
    ///
    /// A tick that overruns the interval delays the next tick by a full
    /// period: simulation time trails wall time rather than multi-stepping
    /// physics to catch up.
    pub async fn run(mut self) {
        self.state_tx.send_replace(SchedulerState::Running);
        info!(
            "scheduler running at {} Hz (dt {:.1} ms)",
            self.config.tick_rate,
            self.config.dt() * 1000.0
        );

        let mut interval = tokio::time::interval(self.config.tick_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of a tokio interval fires immediately.
        interval.tick().await;

        loop {
            interval.tick().await;
            if !self.step() {
                break;
            }
        }

        self.state_tx.send_replace(SchedulerState::Stopped);
        info!("scheduler stopped at tick {}", self.world.tick());
    }

    /// Applies every queued join/leave and reports whether to keep running.
    fn drain_commands(&mut self) -> bool {
        let mut keep_running = true;
        while let Ok(command) = self.control_rx.try_recv() {
            match command {
                ControlCommand::Join { player_id, respond } => {
                    // The requester may have given up; that is not our
                    // problem to handle.
                    let _ = respond.send(self.admit_player(player_id));
                }
                ControlCommand::Leave { player_id } => self.leave_player(player_id),
                ControlCommand::Stop => keep_running = false,
            }
        }
        keep_running
    }

    /// Admits a player synchronously, spawning their entity.
    ///
    /// This is the direct counterpart of [`ArenaHandle::player_join`] for
    /// embedders that drive the engine with [`Engine::step`] themselves.
    pub fn admit_player(&mut self, player_id: PlayerId) -> Result<EntityId, ArenaError> {
        if self.players.contains_key(&player_id) {
            return Err(ArenaError::InvalidInput("player already joined"));
        }
        if self.players.len() >= self.config.max_players {
            return Err(ArenaError::CapacityExceeded {
                limit: self.config.max_players,
            });
        }
        let entity_id = self.world.spawn(EntityKind::HumanPlayer);
        self.players.insert(player_id, entity_id);
        info!("player {} joined as entity {}", player_id, entity_id);
        Ok(entity_id)
    }

    fn leave_player(&mut self, player_id: PlayerId) {
        match self.players.remove(&player_id) {
            Some(entity_id) => {
                self.world.remove(entity_id);
                self.inbox.forget(player_id);
                info!("player {} left, entity {} removed", player_id, entity_id);
            }
            None => warn!("leave requested for unknown player {}", player_id),
        }
    }

    /// Moves each drained intent onto the entity of the player that sent it.
    fn ingest_player_intents(&mut self) {
        for (player_id, intent) in self.inbox.drain_latest() {
            match self.players.get(&player_id) {
                Some(&entity_id) => self.world.set_intent(entity_id, intent),
                // The player left between submit and drain; stale intent.
                None => debug!("dropping intent from unjoined player {}", player_id),
            }
        }
    }

    /// Frees player slots whose entities were eliminated this tick.
    fn release_eliminated_players(&mut self) {
        let eliminated: Vec<(PlayerId, EntityId)> = self
            .players
            .iter()
            .filter(|(_, entity_id)| self.world.get(**entity_id).is_none())
            .map(|(player_id, entity_id)| (*player_id, *entity_id))
            .collect();
        for (player_id, entity_id) in eliminated {
            self.players.remove(&player_id);
            self.inbox.forget(player_id);
            info!(
                "player {} eliminated (entity {} consumed)",
                player_id, entity_id
            );
        }
    }

    /// Respawns AI and food up to the configured targets, never beyond.
    fn replenish(&mut self) {
        while self.world.count_alive(EntityKind::AiPlayer) < self.config.num_ai_players {
            self.world.spawn(EntityKind::AiPlayer);
        }
        while self.world.count_alive(EntityKind::Food) < self.config.num_food {
            self.world.spawn(EntityKind::Food);
        }
    }
}

/// Cloneable control surface handed to the transport layer.
///
/// All methods are safe to call from any task at any time; none of them can
/// stall the simulation.
#[derive(Clone)]
pub struct ArenaHandle {
    inbox: Arc<IntentInbox>,
    broadcaster: Arc<Broadcaster>,
    control_tx: mpsc::UnboundedSender<ControlCommand>,
    state_rx: watch::Receiver<SchedulerState>,
}

impl ArenaHandle {
    /// Records a player's latest movement intent. Directions are clamped
    /// to unit length; non-finite input is rejected without touching any
    /// other player's state.
    pub fn submit_intent(
        &self,
        player_id: PlayerId,
        direction: Vec2,
        action: Option<PlayerAction>,
    ) -> Result<(), ArenaError> {
        self.inbox.submit(player_id, direction, action)
    }

    /// Asks the simulation to admit a player. Resolves after the next tick
    /// drains the command; rejected with `CapacityExceeded` when the arena
    /// is full.
    pub async fn player_join(&self, player_id: PlayerId) -> Result<EntityId, ArenaError> {
        let (respond, reply) = oneshot::channel();
        self.control_tx
            .send(ControlCommand::Join { player_id, respond })
            .map_err(|_| ArenaError::SchedulerUnavailable)?;
        reply.await.map_err(|_| ArenaError::SchedulerUnavailable)?
    }

    /// Removes a player and their entity at the next tick.
    pub fn player_leave(&self, player_id: PlayerId) -> Result<(), ArenaError> {
        self.control_tx
            .send(ControlCommand::Leave { player_id })
            .map_err(|_| ArenaError::SchedulerUnavailable)
    }

    /// Registers a state observer. Dropping the observer unregisters it.
    pub fn subscribe(&self) -> StateObserver {
        self.broadcaster.subscribe()
    }

    /// Current scheduler lifecycle state.
    pub fn scheduler_state(&self) -> SchedulerState {
        *self.state_rx.borrow()
    }

    /// Requests a graceful stop and waits for it to take effect.
    ///
    /// The in-flight tick completes and publishes before the scheduler
    /// reports `Stopped`.
    pub async fn stop(&self) -> Result<(), ArenaError> {
        self.control_tx
            .send(ControlCommand::Stop)
            .map_err(|_| ArenaError::SchedulerUnavailable)?;
        let mut state_rx = self.state_rx.clone();
        state_rx
            .wait_for(|state| *state == SchedulerState::Stopped)
            .await
            .map_err(|_| ArenaError::SchedulerUnavailable)?;
        Ok(())
    }
}
