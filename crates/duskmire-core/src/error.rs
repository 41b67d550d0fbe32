//! Error types raised by the combat engine.
//!
//! The taxonomy separates three failure classes with different blast radii:
//!
//! - [`PreconditionError`]: a call was made with invalid inputs (empty
//!   roster, zero tick duration). Fatal to that call only; no degenerate
//!   state is left behind.
//! - [`RoundError`]: a single encounter's round could not be resolved.
//!   Carries the encounter and actor identity so the scheduler can log it
//!   and terminate only the faulting encounter. Never crashes the tick loop.
//! - [`DeliveryError`]: resolved text could not be delivered to one
//!   participant. Logged and skipped; other recipients in the same round
//!   are unaffected.

use thiserror::Error;

use crate::encounter::EncounterId;
use crate::participant::ParticipantId;

/// A call was made with inputs that violate its preconditions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PreconditionError {
    /// `Encounter::start` was invoked with an empty fighter roster.
    #[error("cannot start an encounter with no fighters")]
    NoFighters,

    /// `Encounter::start` was invoked with an empty mob roster.
    #[error("cannot start an encounter with no mobs")]
    NoMobs,

    /// The scheduler was configured with a zero tick duration.
    #[error("tick duration must be positive")]
    ZeroTickDuration,
}

/// A collaborator's hit or death resolution failed.
///
/// Hit and death resolution are owned by the combatant implementations
/// (formulas, corpse creation, loot drops live elsewhere); this is how
/// their failures surface into the engine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolutionError {
    /// Hit resolution against a target failed.
    #[error("hit resolution failed: {0}")]
    Hit(String),

    /// Death resolution for a dying combatant failed.
    #[error("death resolution failed: {0}")]
    Death(String),
}

/// A single encounter's round could not be resolved.
///
/// The original fault is preserved as a `source` where one exists, so the
/// scheduler can log full context without the error being swallowed and
/// rethrown bare.
#[derive(Debug, Error)]
pub enum RoundError {
    /// The encounter never bound a room; round text has no broadcast target.
    #[error("encounter {encounter} is not bound to a room")]
    UnboundRoom {
        /// The faulting encounter.
        encounter: EncounterId,
    },

    /// A combatant's hit or death resolution failed mid-round.
    #[error("encounter {encounter}: resolution failed for {actor}")]
    Resolution {
        /// The faulting encounter.
        encounter: EncounterId,
        /// The combatant whose resolution failed.
        actor: ParticipantId,
        /// The underlying collaborator fault.
        #[source]
        source: ResolutionError,
    },
}

/// Resolved text could not be delivered to a participant.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeliveryError {
    /// The participant's session is gone.
    #[error("participant {0} is disconnected")]
    Disconnected(ParticipantId),

    /// The participant's transport reported a write failure.
    #[error("delivery to {participant} failed: {reason}")]
    Transport {
        /// The unreachable participant.
        participant: ParticipantId,
        /// Transport-level detail.
        reason: String,
    },
}
