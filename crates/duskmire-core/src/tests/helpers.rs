//! Recording fakes for the world-layer contracts.
//!
//! The fakes keep combat arithmetic trivially predictable: every hit lands
//! and deals the attacker's fixed `damage`. What they record instead is the
//! engine's observable output: delivered text per player and room broadcasts
//! with their exclusion lists.

use std::sync::{Arc, Mutex};

use crate::error::{DeliveryError, ResolutionError};
use crate::participant::{
    lock, CombatStatus, Combatant, MobCombatant, MobHandle, ParticipantId, PlayerCombatant,
    PlayerHandle, Room, RoomHandle,
};
use crate::round::{RoundLedger, TextKind};

// =============================================================================
// Player fake
// =============================================================================

/// Player fake with a recording delivery channel and switchable faults.
pub struct TestPlayer {
    id: ParticipantId,
    name: String,
    hit_points: i32,
    damage: i32,
    status: CombatStatus,
    room: Option<RoomHandle>,
    sent: Vec<String>,
    fail_delivery: bool,
    fail_hits: bool,
    aggro_immune: bool,
}

impl TestPlayer {
    /// Every string successfully delivered to this player, in order.
    pub fn sent_text(&self) -> Vec<String> {
        self.sent.clone()
    }

    /// Makes every subsequent `send` fail as a disconnected session.
    pub fn fail_delivery(&mut self) {
        self.fail_delivery = true;
    }

    /// Makes every subsequent `hit` fail resolution.
    pub fn fail_hits(&mut self) {
        self.fail_hits = true;
    }

    /// Marks this player as never auto-engaged by ambient aggro.
    pub fn make_aggro_immune(&mut self) {
        self.aggro_immune = true;
    }

    pub fn set_room(&mut self, room: RoomHandle) {
        self.room = Some(room);
    }
}

impl Combatant for TestPlayer {
    fn id(&self) -> ParticipantId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn hit_points(&self) -> i32 {
        self.hit_points
    }

    fn apply_damage(&mut self, amount: i32) {
        self.hit_points -= amount;
    }

    fn status(&self) -> CombatStatus {
        self.status
    }

    fn set_status(&mut self, status: CombatStatus) {
        self.status = status;
    }

    fn room(&self) -> Option<RoomHandle> {
        self.room.clone()
    }

    fn hit(&mut self, target: &mut dyn Combatant) -> Result<RoundLedger, ResolutionError> {
        if self.fail_hits {
            return Err(ResolutionError::Hit(format!("{} cannot swing", self.name)));
        }
        target.apply_damage(self.damage);

        let mut round = RoundLedger::new();
        round.add_text(
            self.id,
            &format!("You hit {} for {}.\n", target.name(), self.damage),
            TextKind::Personal,
        );
        round.add_text(
            self.id,
            &format!("{} hits {}.\n", self.name, target.name()),
            TextKind::Group,
        );
        round.add_text(
            self.id,
            &format!("{} hits {}.\n", self.name, target.name()),
            TextKind::Room,
        );
        Ok(round)
    }

    fn die(&mut self) -> Result<RoundLedger, ResolutionError> {
        let mut round = RoundLedger::new();
        round.add_text(self.id, "You are DEAD!\n", TextKind::Personal);
        round.add_text(
            self.id,
            &format!("{} falls to the ground.\n", self.name),
            TextKind::Group,
        );
        round.add_text(
            self.id,
            &format!("{} falls to the ground.\n", self.name),
            TextKind::Room,
        );
        Ok(round)
    }
}

impl PlayerCombatant for TestPlayer {
    fn send(
        &mut self,
        text: &str,
        _subject: Option<ParticipantId>,
        _target: Option<ParticipantId>,
    ) -> Result<(), DeliveryError> {
        if self.fail_delivery {
            return Err(DeliveryError::Disconnected(self.id));
        }
        self.sent.push(text.to_string());
        Ok(())
    }

    fn aggro_immune(&self) -> bool {
        self.aggro_immune
    }
}

// =============================================================================
// Mob fake
// =============================================================================

/// Mob fake keyed `mob.<id>` with fixed damage.
pub struct TestMob {
    id: ParticipantId,
    name: String,
    key: String,
    hit_points: i32,
    damage: i32,
    aggressive: bool,
    status: CombatStatus,
    room: Option<RoomHandle>,
}

impl TestMob {
    pub fn set_room(&mut self, room: RoomHandle) {
        self.room = Some(room);
    }
}

impl Combatant for TestMob {
    fn id(&self) -> ParticipantId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn hit_points(&self) -> i32 {
        self.hit_points
    }

    fn apply_damage(&mut self, amount: i32) {
        self.hit_points -= amount;
    }

    fn status(&self) -> CombatStatus {
        self.status
    }

    fn set_status(&mut self, status: CombatStatus) {
        self.status = status;
    }

    fn room(&self) -> Option<RoomHandle> {
        self.room.clone()
    }

    // A mob's swing is keyed by the victim: the victim reads it in second
    // person and their co-fighters read the group line.
    fn hit(&mut self, target: &mut dyn Combatant) -> Result<RoundLedger, ResolutionError> {
        target.apply_damage(self.damage);

        let mut round = RoundLedger::new();
        round.add_text(
            target.id(),
            &format!("{} hits you for {}.\n", self.name, self.damage),
            TextKind::Personal,
        );
        round.add_text(
            target.id(),
            &format!("{} hits {}.\n", self.name, target.name()),
            TextKind::Group,
        );
        round.add_text(
            target.id(),
            &format!("{} hits {}.\n", self.name, target.name()),
            TextKind::Room,
        );
        Ok(round)
    }

    fn die(&mut self) -> Result<RoundLedger, ResolutionError> {
        let mut round = RoundLedger::new();
        round.add_text(
            self.id,
            &format!("{} collapses in a heap.\n", self.name),
            TextKind::Room,
        );
        Ok(round)
    }
}

impl MobCombatant for TestMob {
    fn aggressive(&self) -> bool {
        self.aggressive
    }

    fn key(&self) -> &str {
        &self.key
    }
}

// =============================================================================
// Room fake
// =============================================================================

/// Room fake recording every broadcast with its exclusion list.
#[derive(Default)]
pub struct TestRoom {
    players: Mutex<Vec<PlayerHandle>>,
    npcs: Mutex<Vec<MobHandle>>,
    broadcasts: Mutex<Vec<(String, Vec<ParticipantId>)>>,
}

impl TestRoom {
    /// Every `(text, excluded ids)` broadcast so far, in order.
    pub fn broadcasts(&self) -> Vec<(String, Vec<ParticipantId>)> {
        lock(&self.broadcasts).clone()
    }
}

impl Room for TestRoom {
    fn send_players(
        &self,
        text: &str,
        _subject: Option<ParticipantId>,
        _target: Option<ParticipantId>,
        exclude: &[ParticipantId],
    ) {
        lock(&self.broadcasts).push((text.to_string(), exclude.to_vec()));
    }

    fn players(&self) -> Vec<PlayerHandle> {
        lock(&self.players).clone()
    }

    fn npcs(&self) -> Vec<MobHandle> {
        lock(&self.npcs).clone()
    }
}

// =============================================================================
// Constructors
// =============================================================================

pub fn test_player(id: u64, name: &str, hit_points: i32, damage: i32) -> Arc<Mutex<TestPlayer>> {
    Arc::new(Mutex::new(TestPlayer {
        id: ParticipantId::new(id),
        name: name.to_string(),
        hit_points,
        damage,
        status: CombatStatus::Standing,
        room: None,
        sent: Vec::new(),
        fail_delivery: false,
        fail_hits: false,
        aggro_immune: false,
    }))
}

pub fn test_mob(
    id: u64,
    name: &str,
    hit_points: i32,
    damage: i32,
    aggressive: bool,
) -> Arc<Mutex<TestMob>> {
    Arc::new(Mutex::new(TestMob {
        id: ParticipantId::new(id),
        name: name.to_string(),
        key: format!("mob.{id}"),
        hit_points,
        damage,
        aggressive,
        status: CombatStatus::Standing,
        room: None,
    }))
}

pub fn as_player_handle(player: &Arc<Mutex<TestPlayer>>) -> PlayerHandle {
    let handle: PlayerHandle = player.clone();
    handle
}

pub fn as_mob_handle(mob: &Arc<Mutex<TestMob>>) -> MobHandle {
    let handle: MobHandle = mob.clone();
    handle
}

pub fn as_room_handle(room: &Arc<TestRoom>) -> RoomHandle {
    let handle: RoomHandle = room.clone();
    handle
}

/// Builds a room holding the given occupants and points each occupant's
/// `room()` back at it.
pub fn test_room_with(
    players: &[&Arc<Mutex<TestPlayer>>],
    mobs: &[&Arc<Mutex<TestMob>>],
) -> Arc<TestRoom> {
    let room = Arc::new(TestRoom::default());
    let handle = as_room_handle(&room);

    for player in players {
        lock(player).set_room(Arc::clone(&handle));
        lock(&room.players).push(as_player_handle(player));
    }
    for mob in mobs {
        lock(mob).set_room(Arc::clone(&handle));
        lock(&room.npcs).push(as_mob_handle(mob));
    }

    room
}
