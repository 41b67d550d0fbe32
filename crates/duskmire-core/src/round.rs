//! Per-round narrative ledger with deterministic per-viewer resolution.
//!
//! A [`RoundLedger`] accumulates the categorized text produced while one
//! combat round resolves, then composes it into a per-participant string via
//! [`RoundLedger::resolve`]. Four buckets exist:
//!
//! - **Personal**: what an actor sees about their own swings ("You hit the rat.")
//! - **Group**: what an actor's co-combatants see ("Brenn hits the rat.")
//! - **Killing blow**: terminal announcements ("the rat is DEAD!!!")
//! - **Room**: unaddressed text broadcast to bystanders
//!
//! # Determinism
//!
//! Buckets are `BTreeMap`s keyed by [`ParticipantId`] and resolution walks
//! the caller-supplied combat order, so for fixed order and contents the
//! output is bit-identical across runs. Appends to an occupied key always
//! concatenate, never replace.

use std::collections::BTreeMap;

use crate::participant::ParticipantId;

/// Terminal announcement marker appended after a victim's name.
///
/// Kill text is stored as `"<name> is DEAD!!!\n"`; resolution strips this
/// marker back out to build the killer's own `You killed <name>!!!` line.
pub const DEATH_ANNOUNCEMENT: &str = "is DEAD!!!";

/// Category tag for text appended to a [`RoundLedger`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TextKind {
    /// Text addressed to the actor themselves.
    Personal,
    /// Text addressed to the actor's co-combatants.
    Group,
    /// Terminal kill announcement attributed to the actor.
    KillingBlow,
    /// Unaddressed text for room bystanders; the actor key is ignored.
    Room,
}

/// Resolve-time view of one fighter in the combat order.
///
/// Resolution needs to know whether a participant is still alive (a dead
/// killer gets no `You killed …` line; death already produced its own
/// notification) without borrowing the combatant itself.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct OrderEntry {
    /// Stable identity of the fighter.
    pub id: ParticipantId,
    /// True if the fighter's health is still positive.
    pub alive: bool,
}

impl OrderEntry {
    /// Creates an order entry.
    #[must_use]
    pub const fn new(id: ParticipantId, alive: bool) -> Self {
        Self { id, alive }
    }
}

/// Accumulated narrative text for one combat round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundLedger {
    personal: BTreeMap<ParticipantId, String>,
    group: BTreeMap<ParticipantId, String>,
    killing_blow: BTreeMap<ParticipantId, String>,
    room: String,
}

impl RoundLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `text` to the bucket selected by `kind`.
    ///
    /// Writing to an occupied key concatenates. For [`TextKind::Room`] the
    /// `actor` key is ignored: room text is unaddressed.
    pub fn add_text(&mut self, actor: ParticipantId, text: &str, kind: TextKind) {
        match kind {
            TextKind::Personal => append(&mut self.personal, actor, text),
            TextKind::Group => append(&mut self.group, actor, text),
            TextKind::KillingBlow => append(&mut self.killing_blow, actor, text),
            TextKind::Room => self.room.push_str(text),
        }
    }

    /// Merges `other` into this ledger by per-category concatenation,
    /// skipping blank values, and returns the combined ledger.
    ///
    /// Merge order affects text ordering within a bucket, never key
    /// presence: every non-blank fragment from both operands survives.
    /// The round uses this to stitch the two phase ledgers together in
    /// aggro-determined order.
    #[must_use]
    pub fn merge(mut self, other: RoundLedger) -> RoundLedger {
        for (actor, text) in other.personal {
            if !text.trim().is_empty() {
                append(&mut self.personal, actor, &text);
            }
        }
        for (actor, text) in other.group {
            if !text.trim().is_empty() {
                append(&mut self.group, actor, &text);
            }
        }
        for (actor, text) in other.killing_blow {
            if !text.trim().is_empty() {
                append(&mut self.killing_blow, actor, &text);
            }
        }
        if !other.room.trim().is_empty() {
            self.room.push_str(&other.room);
        }
        self
    }

    /// Composes the final per-participant text in combat order.
    ///
    /// For each participant P, strictly in `combat_order`:
    ///
    /// 1. P's personal text enters P's own output first, so fighters see
    ///    their own hits in the order they occurred.
    /// 2. For every other participant Q in the same traversal, P's group
    ///    text is injected into Q's output, immediately followed by P's
    ///    kill text, so a kill narrates right after the relevant group line
    ///    for every bystander. Exclusion is by id, never by display name.
    /// 3. If P has kill text and is still alive, P's own output gains a
    ///    `You killed <subject>!!!` line. A dead P gets nothing here; death
    ///    already produced its own notification.
    ///
    /// Output keys are always a subset of the ids in `combat_order`.
    #[must_use]
    pub fn resolve(&self, combat_order: &[OrderEntry]) -> BTreeMap<ParticipantId, String> {
        let mut result = BTreeMap::new();

        for entry in combat_order {
            if let Some(text) = self.personal.get(&entry.id) {
                append(&mut result, entry.id, text);
            }

            let group = self.group.get(&entry.id);
            let kill = self.killing_blow.get(&entry.id);
            if group.is_some() || kill.is_some() {
                for other in combat_order.iter().filter(|o| o.id != entry.id) {
                    if let Some(text) = group {
                        append(&mut result, other.id, text);
                    }
                    if let Some(text) = kill {
                        append(&mut result, other.id, text);
                    }
                }
            }

            if let Some(text) = kill {
                if entry.alive {
                    let subject = text.replace(DEATH_ANNOUNCEMENT, "");
                    let line = format!("You killed {}!!!", subject.trim());
                    append(&mut result, entry.id, &line);
                }
            }
        }

        result
    }

    /// Returns the unaddressed room text accumulated this round.
    #[must_use]
    pub fn room_text(&self) -> &str {
        &self.room
    }

    /// Returns the personal text recorded for `actor`, if any.
    #[must_use]
    pub fn personal_text(&self, actor: ParticipantId) -> Option<&str> {
        self.personal.get(&actor).map(String::as_str)
    }

    /// Returns the group text recorded for `actor`, if any.
    #[must_use]
    pub fn group_text(&self, actor: ParticipantId) -> Option<&str> {
        self.group.get(&actor).map(String::as_str)
    }

    /// Returns the killing-blow text recorded for `actor`, if any.
    #[must_use]
    pub fn killing_blow_text(&self, actor: ParticipantId) -> Option<&str> {
        self.killing_blow.get(&actor).map(String::as_str)
    }

    /// True if no bucket holds any text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.personal.is_empty()
            && self.group.is_empty()
            && self.killing_blow.is_empty()
            && self.room.is_empty()
    }
}

fn append(bucket: &mut BTreeMap<ParticipantId, String>, actor: ParticipantId, text: &str) {
    bucket.entry(actor).or_default().push_str(text);
}

// =============================================================================
// Tests
// =============================================================================
