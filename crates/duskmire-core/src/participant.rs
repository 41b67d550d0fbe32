//! Participant identity and the collaborator trait seams.
//!
//! The engine resolves combat between participants it does not own: players,
//! mobs, and rooms live in the world layer (topology, sessions, persistence)
//! and are consumed here through the narrow contracts below.
//!
//! - [`Combatant`]: anything that can swing and be swung at
//! - [`PlayerCombatant`]: adds a delivery channel and the aggression-free flag
//! - [`MobCombatant`]: adds the aggressive flag and a template key
//! - [`Room`]: broadcast and occupant enumeration
//!
//! Identity is always the stable [`ParticipantId`], never a display name:
//! two goblins named "goblin" must not have their narrative misrouted.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{DeliveryError, ResolutionError};
use crate::round::RoundLedger;

// =============================================================================
// Identity
// =============================================================================

/// Stable opaque identifier for a combat participant.
///
/// Assigned by the world layer and unique for the lifetime of the process.
/// All per-round text maps are keyed by this id, which keeps ledger
/// resolution deterministic and independent of reference identity.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParticipantId(u64);

impl ParticipantId {
    /// Creates a new `ParticipantId` from a raw `u64` value.
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

impl fmt::Debug for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParticipantId({})", self.0)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ParticipantId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<ParticipantId> for u64 {
    fn from(id: ParticipantId) -> Self {
        id.0
    }
}

// =============================================================================
// Status
// =============================================================================

/// Fighting/standing status of a combatant.
///
/// Set to `Fighting` by `Encounter::start` and reset to `Standing` by
/// `Encounter::end`; the world layer uses it to gate movement and rest.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatStatus {
    /// Not engaged in combat.
    Standing,
    /// Engaged in an active encounter.
    Fighting,
}

impl fmt::Display for CombatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standing => write!(f, "Standing"),
            Self::Fighting => write!(f, "Fighting"),
        }
    }
}

// =============================================================================
// Collaborator contracts
// =============================================================================

/// A combat-capable entity, player or mob.
///
/// Hit and death resolution are owned by the implementor: damage formulas,
/// corpse creation and loot drops happen behind `hit` and `die`, which hand
/// back only the narrative fragments the engine weaves into the round.
pub trait Combatant {
    /// Stable identity used to key all per-round text.
    fn id(&self) -> ParticipantId;

    /// Display name used inside narrative text.
    fn name(&self) -> &str;

    /// Signed health; a value of zero or below means dead.
    fn hit_points(&self) -> i32;

    /// Reduces health by `amount`. Called by an attacker's hit resolution.
    fn apply_damage(&mut self, amount: i32);

    /// Current fighting/standing status.
    fn status(&self) -> CombatStatus;

    /// Updates the fighting/standing status.
    fn set_status(&mut self, status: CombatStatus);

    /// The room this combatant currently occupies, if known.
    fn room(&self) -> Option<RoomHandle>;

    /// Resolves one swing against `target`, returning the narrative
    /// fragments tagged per ledger category.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::Hit`] if the implementor's hit resolution
    /// fails; the encounter surfaces it as a round-level fault.
    fn hit(&mut self, target: &mut dyn Combatant) -> Result<RoundLedger, ResolutionError>;

    /// Resolves this combatant's death, returning the narrative fragments.
    /// Externally-owned consequences (corpse, loot) happen here too.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::Death`] if death resolution fails.
    fn die(&mut self) -> Result<RoundLedger, ResolutionError>;
}

/// A player-controlled combatant with a delivery channel.
pub trait PlayerCombatant: Combatant {
    /// Delivers composed round text to the player's session.
    ///
    /// `subject` and `target` allow the transport to expand format tokens;
    /// the engine itself always passes fully composed text with `None`.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] if the session is disconnected or the
    /// transport write fails. The engine logs and continues; one dead
    /// session never blocks the rest of the round's recipients.
    fn send(
        &mut self,
        text: &str,
        subject: Option<ParticipantId>,
        target: Option<ParticipantId>,
    ) -> Result<(), DeliveryError>;

    /// True if ambient aggro must never auto-engage this player.
    fn aggro_immune(&self) -> bool;
}

/// A non-player combatant.
pub trait MobCombatant: Combatant {
    /// True if this mob initiates combat on sight and swings first.
    fn aggressive(&self) -> bool;

    /// Template key (e.g. `"sewer.rat"`) used to join reinforcements to an
    /// encounter already containing this mob.
    fn key(&self) -> &str;
}

/// Room capability consumed for broadcast and ambient-trigger enumeration.
pub trait Room {
    /// Broadcasts `text` to room occupants, skipping ids in `exclude`.
    ///
    /// `subject` and `target` allow the room to expand format tokens; the
    /// engine passes `None` for both.
    fn send_players(
        &self,
        text: &str,
        subject: Option<ParticipantId>,
        target: Option<ParticipantId>,
        exclude: &[ParticipantId],
    );

    /// Players currently in the room.
    fn players(&self) -> Vec<PlayerHandle>;

    /// Mobs currently in the room.
    fn npcs(&self) -> Vec<MobHandle>;
}

// =============================================================================
// Handles
// =============================================================================

/// Shared handle to a player combatant.
pub type PlayerHandle = Arc<Mutex<dyn PlayerCombatant + Send>>;

/// Shared handle to a mob combatant.
pub type MobHandle = Arc<Mutex<dyn MobCombatant + Send>>;

/// Shared handle to a room.
pub type RoomHandle = Arc<dyn Room + Send + Sync>;

/// Locks a participant handle, recovering the inner value from a poisoned
/// lock. A combatant left inconsistent by a panicked writer is still better
/// narrated than a crashed tick loop.
pub(crate) fn lock<T: ?Sized>(handle: &Mutex<T>) -> MutexGuard<'_, T> {
    handle.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Tests
// =============================================================================
