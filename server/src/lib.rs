//! # Authoritative Arena Simulation Core
//!
//! This library is the authoritative core of a multiplayer "eat to grow"
//! arena game. It owns the single true copy of world state, advances it on
//! a fixed schedule, ingests untrusted player commands concurrently, drives
//! autonomous AI entities, resolves consumption deterministically, and
//! streams consistent state to any number of observers.
//!
//! ## Architecture
//!
//! One simulation task owns all mutable state and is its only writer, which
//! rules out data races on the authoritative world by construction. The
//! outside world touches the core through exactly two synchronized
//! surfaces:
//!
//! - **Write side** ([`input::IntentInbox`]): a last-write-wins slot per
//!   player. Producers never block the tick and stale intents are dropped,
//!   not queued.
//! - **Read side** ([`broadcast::Broadcaster`]): watch-based fan-out of
//!   immutable per-tick snapshots and deltas with at-most-latest delivery.
//!   A slow observer skips states; it cannot stall tick production.
//!
//! Joins, leaves and shutdown travel over a command channel that the
//! scheduler drains at the start of each tick, so every structural change
//! to the world happens inside the tick as well.
//!
//! ## Tick pipeline
//!
//! Each tick is atomic: drain commands, drain intents, compute AI intents,
//! move entities against solid world walls, resolve consumption through the
//! spatial index, replenish AI and food populations, then publish a
//! tick-numbered snapshot plus delta. A tick that overruns its interval
//! delays the next one; physics steps are never skipped to catch up.
//!
//! ## Module organization
//!
//! - [`config`]: tuning constants and startup validation
//! - [`world`]: entity storage, movement, consumption, spawning
//! - [`spatial`]: uniform grid for overlap and perception queries
//! - [`input`]: concurrent intent ingestion
//! - [`ai`]: seek/flee/wander intent computation for AI entities
//! - [`collision`]: deterministic consumption resolution
//! - [`snapshot`]: snapshot building and delta computation
//! - [`broadcast`]: observer registration and state fan-out
//! - [`engine`]: the tick scheduler and the [`engine::ArenaHandle`] facade
//! - [`error`]: the error taxonomy
//!
//! ## Usage
//!
//! ```rust,no_run
//! use server::config::ArenaConfig;
//! use server::engine::Engine;
//! use shared::Vec2;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (engine, handle) = Engine::new(ArenaConfig::default())?;
//!     tokio::spawn(engine.run());
//!
//!     // Transport-side usage: admit a player, feed intents, read state.
//!     let entity_id = handle.player_join(1).await?;
//!     handle.submit_intent(1, Vec2::new(1.0, 0.0), None)?;
//!
//!     let mut observer = handle.subscribe();
//!     if let Some(update) = observer.next_update().await {
//!         println!("tick {}: {} entities", update.snapshot.tick, update.snapshot.entities.len());
//!     }
//!
//!     let _ = entity_id;
//!     handle.stop().await?;
//!     Ok(())
//! }
//! ```

pub mod ai;
pub mod broadcast;
pub mod collision;
pub mod config;
pub mod engine;
pub mod error;
pub mod input;
pub mod snapshot;
pub mod spatial;
pub mod world;

pub use config::ArenaConfig;
pub use engine::{ArenaHandle, Engine, SchedulerState};
pub use error::ArenaError;
