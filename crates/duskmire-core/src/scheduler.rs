//! The shared combat clock and the set of active encounters.
//!
//! One [`Scheduler`] drives every fight in the world. Each [`Scheduler::tick`]
//! advances every active encounter by exactly one round, then evicts the
//! encounters whose rosters emptied. Ticks never overlap: the scheduler is a
//! single-threaded loop that finishes the current batch before the next
//! deadline is considered, so an overrunning tick delays the next tick
//! rather than racing it. This serializes all round advancement and keeps
//! room occupancy and participant health free of fine-grained locking.
//!
//! # Pacing
//!
//! The pacing guarantee — no round narration delivered faster than one round
//! per tick duration — lives here, not in the encounter. [`Scheduler::run_for`]
//! and [`Scheduler::run_until_idle`] compute a deadline per iteration, run
//! the tick, and sleep out the remainder. [`Scheduler::tick`] itself never
//! sleeps, which keeps tests and embedding servers in control of time.
//!
//! # Fault containment
//!
//! A round that fails ([`RoundError`]) is logged with the encounter identity
//! and terminates only that encounter; the remaining encounters in the same
//! tick are unaffected and the loop never crashes.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use crate::encounter::{Encounter, EncounterId};
use crate::error::PreconditionError;
use crate::participant::{lock, PlayerHandle, RoomHandle};

/// Owns the active encounters and the shared tick clock.
pub struct Scheduler {
    fights: Vec<Encounter>,
    tick_duration: Duration,
    master_seed: u64,
    next_encounter: u64,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("fights", &self.fights.len())
            .field("tick_duration", &self.tick_duration)
            .field("master_seed", &self.master_seed)
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    /// Creates a scheduler with the given tick duration and master seed.
    ///
    /// The tick duration is the only externally supplied configuration; the
    /// master seed makes every encounter's target selection reproducible.
    ///
    /// # Errors
    ///
    /// Returns [`PreconditionError::ZeroTickDuration`] if `tick_duration`
    /// is zero.
    pub fn new(tick_duration: Duration, master_seed: u64) -> Result<Self, PreconditionError> {
        if tick_duration.is_zero() {
            return Err(PreconditionError::ZeroTickDuration);
        }
        Ok(Self {
            fights: Vec::new(),
            tick_duration,
            master_seed,
            next_encounter: 0,
        })
    }

    /// Returns the configured tick duration.
    #[must_use]
    pub const fn tick_duration(&self) -> Duration {
        self.tick_duration
    }

    /// Returns the number of currently active encounters.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.fights.len()
    }

    /// Allocates an empty encounter with the next identity and a
    /// deterministic per-encounter RNG seed derived from the master seed.
    pub fn allocate_encounter(&mut self) -> Encounter {
        let id = EncounterId::new(self.next_encounter);
        self.next_encounter += 1;
        Encounter::new(id, self.derive_seed(id))
    }

    /// Starts `encounter` and registers it with the clock.
    ///
    /// Start-then-register: a failed start leaves no half-registered entry
    /// in the active set.
    ///
    /// # Errors
    ///
    /// Propagates the [`PreconditionError`] from [`Encounter::start`] when
    /// either roster is empty.
    pub fn start_fight(&mut self, mut encounter: Encounter) -> Result<(), PreconditionError> {
        encounter.start()?;
        info!(encounter = %encounter.id(), "fight started");
        self.fights.push(encounter);
        Ok(())
    }

    /// Advances every active encounter by exactly one round, then evicts
    /// and ends the encounters that are no longer fighting.
    ///
    /// A faulting encounter is logged with its identity and terminated;
    /// the other encounters in the batch still advance.
    pub fn tick(&mut self) {
        let mut survivors = Vec::with_capacity(self.fights.len());

        for mut fight in self.fights.drain(..) {
            match fight.round() {
                Ok(()) => {
                    if fight.fighting() {
                        survivors.push(fight);
                    } else {
                        debug!(encounter = %fight.id(), "roster emptied, ending fight");
                        fight.end();
                    }
                }
                Err(err) => {
                    error!(
                        encounter = %fight.id(),
                        error = %err,
                        "round failed, terminating encounter"
                    );
                    fight.end();
                }
            }
        }

        self.fights = survivors;
    }

    /// Runs `rounds` paced ticks.
    ///
    /// Each iteration computes a deadline one tick duration away, advances
    /// every encounter, and sleeps out the remainder. An overrunning tick
    /// simply pushes the next deadline back; ticks are never queued or
    /// overlapped.
    pub fn run_for(&mut self, rounds: usize) {
        for _ in 0..rounds {
            self.paced_tick();
        }
    }

    /// Runs paced ticks until no encounter remains active.
    pub fn run_until_idle(&mut self) {
        while !self.fights.is_empty() {
            self.paced_tick();
        }
    }

    fn paced_tick(&mut self) {
        let deadline = Instant::now() + self.tick_duration;
        self.tick();
        let now = Instant::now();
        if now < deadline {
            thread::sleep(deadline - now);
        }
    }

    /// Ambient-aggro trigger for a player entering a room.
    ///
    /// Fires only when the player is the sole occupant, so later entrants
    /// into an already-contested room do not spawn duplicate encounters,
    /// and never for aggression-free players. When an aggressive mob is
    /// found, a new encounter seeds that player and that mob, pulls in
    /// every *other* mob present in the room (compared by id, not name),
    /// and starts the fight.
    ///
    /// Returns `true` if a fight was started.
    ///
    /// # Errors
    ///
    /// Propagates the [`PreconditionError`] from starting the fight.
    pub fn enter_room(
        &mut self,
        player: &PlayerHandle,
        room: &RoomHandle,
    ) -> Result<bool, PreconditionError> {
        if room.players().len() != 1 {
            return Ok(false);
        }
        if lock(player).aggro_immune() {
            return Ok(false);
        }

        let npcs = room.npcs();
        let Some(aggressor) = npcs.iter().find(|npc| lock(npc).aggressive()) else {
            return Ok(false);
        };
        let aggressor_id = lock(aggressor).id();

        let mut encounter = self.allocate_encounter();
        encounter.add_fighter(Arc::clone(player));
        encounter.add_mob(Arc::clone(aggressor));
        for other in npcs.iter().filter(|npc| lock(npc).id() != aggressor_id) {
            encounter.add_mob(Arc::clone(other));
        }

        self.start_fight(encounter)?;
        Ok(true)
    }

    /// Joins `player` as a reinforcing fighter to the first active
    /// encounter whose mob roster matches `mob_key`.
    ///
    /// Returns `true` if a fight was joined.
    pub fn add_to_combat(&mut self, player: &PlayerHandle, mob_key: &str) -> bool {
        for fight in &mut self.fights {
            if fight.has_mob_key(mob_key) {
                debug!(
                    encounter = %fight.id(),
                    participant = %lock(player).id(),
                    "reinforcement joined"
                );
                fight.add_fighter(Arc::clone(player));
                return true;
            }
        }
        false
    }

    /// Derives a per-encounter RNG seed from the master seed and the
    /// encounter identity, so fights replay identically for a fixed
    /// scheduler configuration.
    fn derive_seed(&self, id: EncounterId) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.master_seed.hash(&mut hasher);
        id.as_u64().hash(&mut hasher);
        hasher.finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
