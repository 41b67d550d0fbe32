//! Round-based combat resolution engine for the Duskmire text world.
//!
//! The engine advances every active fight in lockstep rounds on a shared
//! tick clock, weaving per-viewer narrative text as it goes. It owns the
//! *resolution* of combat, never the combatants: players, mobs and rooms
//! live in the world layer and are reached through the trait seams in
//! [`participant`].
//!
//! # Architecture
//!
//! - [`round`]: the [`RoundLedger`](round::RoundLedger), a categorized text
//!   accumulator with deterministic per-viewer resolution
//! - [`encounter`]: one fight; rosters, aggro-derived phase order, hit and
//!   death resolution, dispatch and room broadcast
//! - [`scheduler`]: the shared clock; starts, advances, paces and evicts
//!   encounters, and hosts the ambient-aggro and reinforcement triggers
//! - [`participant`]: identity and the collaborator contracts
//! - [`error`]: the precondition / round / delivery fault taxonomy
//!
//! # Determinism
//!
//! For a fixed master seed, roster and join order, every fight replays with
//! bit-identical transcripts: target selection draws from a per-encounter
//! seeded [`ChaCha8Rng`](rand_chacha::ChaCha8Rng) and all per-round text
//! maps iterate in key order.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use duskmire_core::Scheduler;
//!
//! let mut scheduler = Scheduler::new(Duration::from_secs(3), 42)?;
//! let encounter = scheduler.allocate_encounter();
//! // populate rosters from the world layer, then:
//! // scheduler.start_fight(encounter)?;
//! // scheduler.run_until_idle();
//! # let _ = (&mut scheduler, encounter);
//! # Ok::<(), duskmire_core::PreconditionError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod encounter;
pub mod error;
pub mod participant;
pub mod round;
pub mod scheduler;

#[cfg(test)]
mod tests;

pub use encounter::{Encounter, EncounterId};
pub use error::{DeliveryError, PreconditionError, ResolutionError, RoundError};
pub use participant::{
    CombatStatus, Combatant, MobCombatant, MobHandle, ParticipantId, PlayerCombatant,
    PlayerHandle, Room, RoomHandle,
};
pub use round::{OrderEntry, RoundLedger, TextKind, DEATH_ANNOUNCEMENT};
pub use scheduler::Scheduler;
