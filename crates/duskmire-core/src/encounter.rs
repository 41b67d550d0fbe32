//! A single fight between a roster of fighters and a roster of mobs.
//!
//! An [`Encounter`] owns the rosters, the aggro-derived swing order, and the
//! per-round hit resolution that fills a [`RoundLedger`]. It never owns the
//! combatants themselves; those are world-layer objects reached through the
//! handles in [`crate::participant`].
//!
//! # Round anatomy
//!
//! One call to [`Encounter::round`] is one atomic unit of advancement:
//! a mob phase and a player phase (ordered by the aggro flag), merged into
//! one ledger, resolved against the combat order, dispatched to each
//! fighter's delivery channel, and broadcast to room bystanders. Pacing is
//! deliberately **not** here: the scheduler owns the clock and honors the
//! one-round-per-tick-duration guarantee (see [`crate::scheduler`]).

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{PreconditionError, RoundError};
use crate::participant::{
    lock, CombatStatus, MobHandle, ParticipantId, PlayerHandle, RoomHandle,
};
use crate::round::{OrderEntry, RoundLedger, TextKind, DEATH_ANNOUNCEMENT};

// =============================================================================
// Identity
// =============================================================================

/// Unique identifier for an encounter, used to correlate log lines and
/// round faults with a specific fight.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EncounterId(u64);

impl EncounterId {
    /// Creates a new `EncounterId` from a raw `u64` value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` value of this identifier.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for EncounterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncounterId({})", self.0)
    }
}

impl fmt::Display for EncounterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EncounterId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

// =============================================================================
// Encounter
// =============================================================================

/// One active fight.
///
/// The combat order is join-ordered and defines how per-viewer narrative is
/// interleaved; the broadcast ignore-list starts equal to the fighter roster
/// and is pruned of the newly dead each round. Target selection draws from a
/// per-encounter seeded RNG, so a fight replays identically for a fixed seed
/// and roster.
pub struct Encounter {
    id: EncounterId,
    fighters: Vec<PlayerHandle>,
    mobs: Vec<MobHandle>,
    combat_order: Vec<PlayerHandle>,
    ignore_list: Vec<PlayerHandle>,
    room: Option<RoomHandle>,
    aggro: bool,
    rng: ChaCha8Rng,
}

impl fmt::Debug for Encounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Encounter")
            .field("id", &self.id)
            .field("fighters", &self.fighters.len())
            .field("mobs", &self.mobs.len())
            .field("aggro", &self.aggro)
            .finish_non_exhaustive()
    }
}

impl Encounter {
    /// Creates an empty encounter with the given identity and RNG seed.
    ///
    /// The seed drives target selection; encounters created by the
    /// scheduler receive a seed derived from its master seed.
    #[must_use]
    pub fn new(id: EncounterId, seed: u64) -> Self {
        Self {
            id,
            fighters: Vec::new(),
            mobs: Vec::new(),
            combat_order: Vec::new(),
            ignore_list: Vec::new(),
            room: None,
            aggro: false,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Returns this encounter's identity.
    #[must_use]
    pub const fn id(&self) -> EncounterId {
        self.id
    }

    /// Appends a fighter to the roster, the combat order, and the broadcast
    /// ignore-list. Legal mid-encounter: reinforcements join the tail of the
    /// narration order.
    pub fn add_fighter(&mut self, player: PlayerHandle) {
        self.fighters.push(Arc::clone(&player));
        self.ignore_list.push(Arc::clone(&player));
        self.combat_order.push(player);
    }

    /// Appends a mob to the roster. Legal mid-encounter.
    pub fn add_mob(&mut self, npc: MobHandle) {
        self.mobs.push(npc);
    }

    /// True while both rosters are non-empty.
    #[must_use]
    pub fn fighting(&self) -> bool {
        !self.fighters.is_empty() && !self.mobs.is_empty()
    }

    /// True if any mob in the roster matches `key`; used to route
    /// reinforcing fighters to the right fight.
    #[must_use]
    pub fn has_mob_key(&self, key: &str) -> bool {
        self.mobs.iter().any(|mob| lock(mob).key() == key)
    }

    /// True if this fight runs mob-phase-first.
    #[must_use]
    pub const fn is_aggro(&self) -> bool {
        self.aggro
    }

    /// Current fighter roster.
    #[must_use]
    pub fn fighters(&self) -> &[PlayerHandle] {
        &self.fighters
    }

    /// Current mob roster.
    #[must_use]
    pub fn mobs(&self) -> &[MobHandle] {
        &self.mobs
    }

    /// Starts the fight.
    ///
    /// Binds the encounter to the room of the first participant (fighters
    /// first, then mobs) with a known location, marks every participant
    /// `Fighting`, and fixes the aggro flag as the OR of the mobs'
    /// aggressive property for the lifetime of the encounter.
    ///
    /// # Errors
    ///
    /// Returns a [`PreconditionError`] if either roster is empty; no
    /// participant state is touched in that case.
    pub fn start(&mut self) -> Result<(), PreconditionError> {
        if self.fighters.is_empty() {
            return Err(PreconditionError::NoFighters);
        }
        if self.mobs.is_empty() {
            return Err(PreconditionError::NoMobs);
        }

        for fighter in &self.fighters {
            let mut player = lock(fighter);
            if self.room.is_none() {
                self.room = player.room();
            }
            player.set_status(CombatStatus::Fighting);
        }

        for mob in &self.mobs {
            let mut npc = lock(mob);
            if self.room.is_none() {
                self.room = npc.room();
            }
            // One aggro mob makes the whole fight aggro: mobs swing first
            // every round.
            if npc.aggressive() {
                self.aggro = true;
            }
            npc.set_status(CombatStatus::Fighting);
        }

        Ok(())
    }

    /// Advances the fight by exactly one round.
    ///
    /// Builds the mob-phase and player-phase ledgers in aggro-determined
    /// order, merges them, resolves against the combat order, prunes the
    /// order of fighters whose health fell to zero or below this round,
    /// dispatches each resolved string, and broadcasts the residual room
    /// text to bystanders excluding the ignore-list (itself pruned of the
    /// newly dead afterwards).
    ///
    /// A failed delivery is logged and skipped; it never blocks the other
    /// recipients of the same round.
    ///
    /// # Errors
    ///
    /// Returns a [`RoundError`] if the encounter has no bound room or a
    /// collaborator's hit/death resolution fails. The caller decides the
    /// encounter's fate; rosters are left as the partial round shaped them.
    pub fn round(&mut self) -> Result<(), RoundError> {
        let room = self
            .room
            .clone()
            .ok_or(RoundError::UnboundRoom { encounter: self.id })?;

        debug!(encounter = %self.id, aggro = self.aggro, "advancing round");

        let ledger = if self.aggro {
            let mob_text = self.mob_phase()?;
            mob_text.merge(self.player_phase()?)
        } else {
            let player_text = self.player_phase()?;
            player_text.merge(self.mob_phase()?)
        };

        // Resolve against the pre-prune order so a fighter who died this
        // round still receives the text addressed to them.
        let order_snapshot: Vec<PlayerHandle> = self.combat_order.clone();
        let entries: Vec<OrderEntry> = order_snapshot
            .iter()
            .map(|handle| {
                let player = lock(handle);
                OrderEntry::new(player.id(), player.hit_points() > 0)
            })
            .collect();
        let resolved = ledger.resolve(&entries);

        self.combat_order.retain(|handle| lock(handle).hit_points() > 0);

        for handle in &order_snapshot {
            let mut player = lock(handle);
            if let Some(text) = resolved.get(&player.id()) {
                if let Err(error) = player.send(text, None, None) {
                    warn!(
                        encounter = %self.id,
                        participant = %player.id(),
                        %error,
                        "round text was not delivered"
                    );
                }
            }
        }

        if !ledger.room_text().is_empty() {
            let exclude: Vec<ParticipantId> =
                self.ignore_list.iter().map(|handle| lock(handle).id()).collect();
            room.send_players(ledger.room_text(), None, None, &exclude);
        }

        self.ignore_list.retain(|handle| lock(handle).hit_points() > 0);

        Ok(())
    }

    /// Ends the fight: every current participant is reset to `Standing`.
    pub fn end(&mut self) {
        for fighter in &self.fighters {
            lock(fighter).set_status(CombatStatus::Standing);
        }
        for mob in &self.mobs {
            lock(mob).set_status(CombatStatus::Standing);
        }
    }

    /// Runs the mob phase: every mob picks a uniformly-random living
    /// fighter and swings. A fighter dropping to zero or below is removed
    /// from the roster immediately (it cannot be targeted again this
    /// phase), dies, and the phase stops early once the roster empties.
    /// Kill announcements are attributed to the victim.
    fn mob_phase(&mut self) -> Result<RoundLedger, RoundError> {
        let mut round = RoundLedger::new();
        let mut killed: Vec<(ParticipantId, String)> = Vec::new();

        let mobs: Vec<MobHandle> = self.mobs.clone();
        for mob in &mobs {
            let living: Vec<PlayerHandle> = self
                .fighters
                .iter()
                .filter(|fighter| lock(fighter).hit_points() > 0)
                .cloned()
                .collect();
            if living.is_empty() {
                break;
            }

            let victim = Arc::clone(&living[self.rng.gen_range(0..living.len())]);

            let attacker_id;
            let fragment = {
                let mut attacker = lock(mob);
                attacker_id = attacker.id();
                let mut target = lock(&victim);
                attacker.hit(&mut *target)
            };
            let fragment = fragment.map_err(|source| RoundError::Resolution {
                encounter: self.id,
                actor: attacker_id,
                source,
            })?;
            round = round.merge(fragment);

            let (victim_id, victim_name, dead) = {
                let target = lock(&victim);
                (target.id(), target.name().to_string(), target.hit_points() <= 0)
            };

            if dead {
                killed.push((victim_id, victim_name));
                self.fighters.retain(|fighter| lock(fighter).id() != victim_id);

                let death = lock(&victim).die().map_err(|source| RoundError::Resolution {
                    encounter: self.id,
                    actor: victim_id,
                    source,
                })?;
                round = round.merge(death);

                if self.fighters.is_empty() {
                    break;
                }
            }
        }

        for (victim_id, victim_name) in killed {
            round.add_text(
                victim_id,
                &format!("{victim_name} {DEATH_ANNOUNCEMENT}\n"),
                TextKind::KillingBlow,
            );
        }

        Ok(round)
    }

    /// Runs the player phase, symmetric to the mob phase over fighters
    /// targeting mobs. Kill announcements are attributed to the killer.
    fn player_phase(&mut self) -> Result<RoundLedger, RoundError> {
        let mut round = RoundLedger::new();
        let mut killed: Vec<(ParticipantId, String)> = Vec::new();

        let fighters: Vec<PlayerHandle> = self.fighters.clone();
        for fighter in &fighters {
            let living: Vec<MobHandle> = self
                .mobs
                .iter()
                .filter(|mob| lock(mob).hit_points() > 0)
                .cloned()
                .collect();
            if living.is_empty() {
                break;
            }

            let target = Arc::clone(&living[self.rng.gen_range(0..living.len())]);

            let attacker_id;
            let fragment = {
                let mut attacker = lock(fighter);
                attacker_id = attacker.id();
                let mut mob = lock(&target);
                attacker.hit(&mut *mob)
            };
            let fragment = fragment.map_err(|source| RoundError::Resolution {
                encounter: self.id,
                actor: attacker_id,
                source,
            })?;
            round = round.merge(fragment);

            let (mob_id, mob_name, dead) = {
                let mob = lock(&target);
                (mob.id(), mob.name().to_string(), mob.hit_points() <= 0)
            };

            if dead {
                killed.push((attacker_id, mob_name));
                // Remove the mob from combat so it cannot be hit any more.
                self.mobs.retain(|mob| lock(mob).id() != mob_id);

                let death = lock(&target).die().map_err(|source| RoundError::Resolution {
                    encounter: self.id,
                    actor: mob_id,
                    source,
                })?;
                round = round.merge(death);

                if self.mobs.is_empty() {
                    break;
                }
            }
        }

        for (killer_id, mob_name) in killed {
            round.add_text(
                killer_id,
                &format!("{mob_name} {DEATH_ANNOUNCEMENT}\n"),
                TextKind::KillingBlow,
            );
        }

        Ok(round)
    }
}

// =============================================================================
// Tests
// =============================================================================
