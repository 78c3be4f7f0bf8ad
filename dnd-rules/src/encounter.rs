//! Encounter turn engine.
//!
//! An [`Encounter`] moves through `Setup -> Rolling -> Active -> Ended`.
//! While active, turns advance over a fixed turn order, skipping inactive
//! combatants. When every eligible combatant has acted the encounter is
//! round-pending and has no current combatant until
//! [`Encounter::continue_round`] is called.
//!
//! The engine assumes a single writer per encounter.

use crate::armor_class::calculate_ac;
use crate::attack::{hits, AttackResult};
use crate::character::{Ability, Character, CharacterId};
use crate::config::RulesConfig;
use crate::dice::{Advantage, D20Roll, DiceFormula, DiceRoller, RollError};
use crate::effects::DamageType;
use crate::resources::HitPoints;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncounterError {
    #[error("Invalid encounter state: {0}")]
    InvalidState(String),

    #[error("Unknown combatant: {0}")]
    UnknownCombatant(CombatantId),

    #[error(transparent)]
    Roll(#[from] RollError),
}

fn invalid(message: impl Into<String>) -> EncounterError {
    EncounterError::InvalidState(message.into())
}

// ============================================================================
// Combatants
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CombatantId(pub Uuid);

impl CombatantId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CombatantId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Player,
    Monster,
}

/// Side-specific attack data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatantKind {
    /// Attacks are resolved against the full character sheet.
    Player { character_id: CharacterId },
    Monster {
        attack_bonus: i32,
        damage: DiceFormula,
        damage_type: DamageType,
    },
}

/// A lightweight participant record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combatant {
    pub id: CombatantId,
    pub name: String,
    pub kind: CombatantKind,
    pub hit_points: HitPoints,
    pub armor_class: i32,
    pub initiative_modifier: i32,
    pub initiative: Option<i32>,
    /// Eligible to take turns. Cleared at 0 HP but may also be cleared for
    /// other reasons (fled, surrendered).
    pub is_active: bool,
}

impl Combatant {
    /// Snapshot a character's combat numbers.
    pub fn from_character(character: &Character) -> Self {
        let hit_points = character.resources.hit_points;
        Self {
            id: CombatantId::new(),
            name: character.name.clone(),
            kind: CombatantKind::Player {
                character_id: character.id,
            },
            hit_points,
            armor_class: calculate_ac(Some(character)),
            initiative_modifier: character.ability_modifier(Ability::Dexterity),
            initiative: None,
            is_active: hit_points.current > 0,
        }
    }

    pub fn monster(
        name: impl Into<String>,
        max_hp: i32,
        armor_class: i32,
        attack_bonus: i32,
        damage: DiceFormula,
        damage_type: DamageType,
    ) -> Self {
        Self {
            id: CombatantId::new(),
            name: name.into(),
            kind: CombatantKind::Monster {
                attack_bonus,
                damage,
                damage_type,
            },
            hit_points: HitPoints::new(max_hp),
            armor_class,
            initiative_modifier: 0,
            initiative: None,
            is_active: max_hp > 0,
        }
    }

    pub fn with_initiative_modifier(mut self, modifier: i32) -> Self {
        self.initiative_modifier = modifier;
        self
    }

    pub fn side(&self) -> Side {
        match self.kind {
            CombatantKind::Player { .. } => Side::Player,
            CombatantKind::Monster { .. } => Side::Monster,
        }
    }

    pub fn current_hp(&self) -> i32 {
        self.hit_points.current
    }
}

/// Outcome of a monster's attack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterAttack {
    pub attacker: CombatantId,
    pub target: CombatantId,
    pub attack_roll: D20Roll,
    pub attack_total: i32,
    pub hit: bool,
    pub damage: i32,
}

// ============================================================================
// Encounter
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EncounterId(pub Uuid);

impl EncounterId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EncounterId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncounterStatus {
    Setup,
    Rolling,
    Active,
    Ended,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encounter {
    pub id: EncounterId,
    pub status: EncounterStatus,
    pub round: u32,
    /// Index into `turn_order`; `None` while round-pending or when nobody
    /// is eligible.
    pub turn_index: Option<usize>,
    pub turn_order: Vec<CombatantId>,
    /// Combatants in the order they were added.
    pub roster: Vec<CombatantId>,
    pub combatants: HashMap<CombatantId, Combatant>,
    pub round_pending: bool,
    pub log: VecDeque<String>,
    pub log_capacity: usize,
    /// Set once the encounter has ended.
    pub players_won: Option<bool>,
}

impl Default for Encounter {
    fn default() -> Self {
        Self::new(&RulesConfig::default())
    }
}

impl Encounter {
    pub fn new(config: &RulesConfig) -> Self {
        Self {
            id: EncounterId::new(),
            status: EncounterStatus::Setup,
            round: 0,
            turn_index: None,
            turn_order: Vec::new(),
            roster: Vec::new(),
            combatants: HashMap::new(),
            round_pending: false,
            log: VecDeque::new(),
            log_capacity: config.combat_log_capacity.max(1),
            players_won: None,
        }
    }

    fn require(&self, status: EncounterStatus, action: &str) -> Result<(), EncounterError> {
        if self.status == status {
            Ok(())
        } else {
            Err(invalid(format!(
                "cannot {action} while {:?}, expected {:?}",
                self.status, status
            )))
        }
    }

    pub fn combatant(&self, id: CombatantId) -> Result<&Combatant, EncounterError> {
        self.combatants
            .get(&id)
            .ok_or(EncounterError::UnknownCombatant(id))
    }

    fn combatant_mut(&mut self, id: CombatantId) -> Result<&mut Combatant, EncounterError> {
        self.combatants
            .get_mut(&id)
            .ok_or(EncounterError::UnknownCombatant(id))
    }

    fn is_eligible(&self, id: &CombatantId) -> bool {
        self.combatants.get(id).is_some_and(|c| c.is_active)
    }

    fn first_eligible_from(&self, start: usize) -> Option<usize> {
        (start..self.turn_order.len()).find(|&i| self.is_eligible(&self.turn_order[i]))
    }

    // ------------------------------------------------------------------
    // Setup and initiative
    // ------------------------------------------------------------------

    pub fn add_combatant(&mut self, combatant: Combatant) -> Result<CombatantId, EncounterError> {
        self.require(EncounterStatus::Setup, "add combatants")?;
        let id = combatant.id;
        if self.combatants.contains_key(&id) {
            return Err(invalid(format!("combatant {id} already added")));
        }
        debug!(combatant = %combatant.name, side = ?combatant.side(), "combatant added");
        self.roster.push(id);
        self.combatants.insert(id, combatant);
        Ok(id)
    }

    pub fn begin_rolling(&mut self) -> Result<(), EncounterError> {
        self.require(EncounterStatus::Setup, "roll initiative")?;
        self.status = EncounterStatus::Rolling;
        Ok(())
    }

    /// Roll d20 + modifier for everyone and fix the turn order: highest
    /// total first, ties broken by modifier, then by order added.
    pub fn roll_initiative(&mut self, roller: &mut dyn DiceRoller) -> Result<(), EncounterError> {
        self.require(EncounterStatus::Rolling, "roll initiative")?;

        let mut rolled = Vec::with_capacity(self.roster.len());
        for id in &self.roster {
            let combatant = self.combatant(*id)?;
            let roll = roller.roll(1, 20, combatant.initiative_modifier)?;
            rolled.push((*id, roll.total, combatant.initiative_modifier));
        }
        rolled.sort_by(|a, b| b.1.cmp(&a.1).then(b.2.cmp(&a.2)));

        for (id, total, _) in &rolled {
            self.combatant_mut(*id)?.initiative = Some(*total);
        }
        self.turn_order = rolled.into_iter().map(|(id, _, _)| id).collect();
        debug!(order = ?self.turn_order, "initiative rolled");
        Ok(())
    }

    /// Fix the turn order explicitly. Every combatant must appear once.
    pub fn set_turn_order(&mut self, order: Vec<CombatantId>) -> Result<(), EncounterError> {
        self.require(EncounterStatus::Rolling, "set the turn order")?;
        if let Some(unknown) = order.iter().find(|id| !self.combatants.contains_key(id)) {
            return Err(EncounterError::UnknownCombatant(*unknown));
        }
        let unique: HashSet<_> = order.iter().collect();
        if unique.len() != order.len() || order.len() != self.combatants.len() {
            return Err(invalid("turn order must list every combatant exactly once"));
        }
        self.turn_order = order;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Turns and rounds
    // ------------------------------------------------------------------

    /// Begin round 1. Without a rolled or explicit order, combatants act in
    /// the order they were added.
    pub fn start(&mut self) -> Result<Option<CombatantId>, EncounterError> {
        self.require(EncounterStatus::Rolling, "start")?;
        if self.turn_order.is_empty() {
            self.turn_order = self.roster.clone();
        }
        self.status = EncounterStatus::Active;
        self.round = 1;
        self.round_pending = false;
        self.turn_index = self.first_eligible_from(0);
        debug!(encounter = ?self.id, first = ?self.current_id(), "encounter started");
        Ok(self.current_id())
    }

    /// Advance to the next eligible combatant. Returns `None` and marks the
    /// round pending when nobody is left this round.
    pub fn next_turn(&mut self) -> Result<Option<CombatantId>, EncounterError> {
        self.require(EncounterStatus::Active, "advance turns")?;
        if self.round_pending {
            return Err(invalid("round is pending; continue the round first"));
        }
        let start = self.turn_index.map_or(0, |i| i + 1);
        match self.first_eligible_from(start) {
            Some(index) => {
                self.turn_index = Some(index);
                Ok(Some(self.turn_order[index]))
            }
            None => {
                self.turn_index = None;
                self.round_pending = true;
                debug!(round = self.round, "round complete");
                Ok(None)
            }
        }
    }

    /// Leave round-pending: bump the round and restart from the top.
    pub fn continue_round(&mut self) -> Result<Option<CombatantId>, EncounterError> {
        self.require(EncounterStatus::Active, "continue the round")?;
        if !self.round_pending {
            return Err(invalid("round is not pending"));
        }
        self.round += 1;
        self.round_pending = false;
        self.turn_index = self.first_eligible_from(0);
        debug!(round = self.round, "new round");
        Ok(self.current_id())
    }

    fn current_id(&self) -> Option<CombatantId> {
        if self.status != EncounterStatus::Active || self.round_pending {
            return None;
        }
        self.turn_index.map(|i| self.turn_order[i])
    }

    pub fn current_combatant(&self) -> Option<&Combatant> {
        self.current_id().and_then(|id| self.combatants.get(&id))
    }

    /// Returns `(should_end, players_won)`.
    ///
    /// When nobody on either side is active this reports `(false, false)`;
    /// callers decide what a mutual wipe means.
    pub fn check_combat_end(&self) -> (bool, bool) {
        let active_on = |side: Side| {
            self.combatants
                .values()
                .any(|c| c.side() == side && c.is_active)
        };
        match (active_on(Side::Player), active_on(Side::Monster)) {
            (true, false) => (true, true),
            (false, true) => (true, false),
            _ => (false, false),
        }
    }

    pub fn end_combat(&mut self, players_won: bool) -> Result<(), EncounterError> {
        self.require(EncounterStatus::Active, "end combat")?;
        self.status = EncounterStatus::Ended;
        self.turn_index = None;
        self.round_pending = false;
        self.players_won = Some(players_won);
        debug!(encounter = ?self.id, players_won, round = self.round, "encounter ended");
        Ok(())
    }

    pub fn is_ended(&self) -> bool {
        self.status == EncounterStatus::Ended
    }

    // ------------------------------------------------------------------
    // Log
    // ------------------------------------------------------------------

    /// Append `[Round N] text`, dropping the oldest entries past capacity.
    pub fn add_combat_log_entry(&mut self, text: impl AsRef<str>) {
        self.log
            .push_back(format!("[Round {}] {}", self.round, text.as_ref()));
        while self.log.len() > self.log_capacity {
            self.log.pop_front();
        }
    }

    // ------------------------------------------------------------------
    // Hit points
    // ------------------------------------------------------------------

    /// Damage a combatant, temporary HP first. Reaching 0 HP makes it
    /// inactive. Returns the requested amount.
    pub fn apply_damage(&mut self, id: CombatantId, amount: i32) -> Result<i32, EncounterError> {
        let combatant = self.combatant_mut(id)?;
        let dealt = combatant.hit_points.take_damage(amount);
        if combatant.hit_points.current == 0 && combatant.is_active {
            combatant.is_active = false;
            debug!(combatant = %combatant.name, "combatant down");
        }
        Ok(dealt)
    }

    /// Heal a combatant. Any healing above 0 HP makes it active again.
    pub fn heal(&mut self, id: CombatantId, amount: i32) -> Result<i32, EncounterError> {
        let combatant = self.combatant_mut(id)?;
        let healed = combatant.hit_points.heal(amount);
        if combatant.hit_points.current > 0 {
            combatant.is_active = true;
        }
        Ok(healed)
    }

    pub fn set_active(&mut self, id: CombatantId, active: bool) -> Result<(), EncounterError> {
        self.combatant_mut(id)?.is_active = active;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Attacks
    // ------------------------------------------------------------------

    /// Apply a character's resolved strikes to `target`. Only strikes that
    /// beat the target's AC deal damage. Returns the total dealt.
    pub fn apply_attack_results(
        &mut self,
        attacker: CombatantId,
        target: CombatantId,
        results: &[AttackResult],
    ) -> Result<i32, EncounterError> {
        let attacker_name = self.combatant(attacker)?.name.clone();
        let (target_name, target_ac) = {
            let t = self.combatant(target)?;
            (t.name.clone(), t.armor_class)
        };

        let mut total = 0;
        for result in results {
            let hit = result.hit.unwrap_or_else(|| result.hits(target_ac));
            if hit {
                total += self.apply_damage(target, result.damage_total)?;
                self.add_combat_log_entry(format!(
                    "{attacker_name} hits {target_name} with {} for {} {} damage",
                    result.weapon_name, result.damage_total, result.damage_type
                ));
            } else {
                self.add_combat_log_entry(format!(
                    "{attacker_name} misses {target_name} with {}",
                    result.weapon_name
                ));
            }
        }
        Ok(total)
    }

    /// Resolve a monster's attack against `target` and apply the damage.
    pub fn monster_attack(
        &mut self,
        attacker: CombatantId,
        target: CombatantId,
        roller: &mut dyn DiceRoller,
    ) -> Result<MonsterAttack, EncounterError> {
        let (name, attack_bonus, damage, damage_type) = match self.combatant(attacker)? {
            Combatant {
                name,
                kind:
                    CombatantKind::Monster {
                        attack_bonus,
                        damage,
                        damage_type,
                    },
                ..
            } => (name.clone(), *attack_bonus, *damage, *damage_type),
            _ => return Err(invalid("only monsters use monster attacks")),
        };
        let (target_name, target_ac) = {
            let t = self.combatant(target)?;
            (t.name.clone(), t.armor_class)
        };

        let attack_roll = roller.roll_d20(Advantage::Normal)?;
        let attack_total = attack_roll.natural as i32 + attack_bonus;
        let hit = hits(&attack_roll, attack_total, target_ac);

        let damage = if hit {
            let count = if attack_roll.is_critical() {
                damage.count * 2
            } else {
                damage.count
            };
            let roll = roller.roll(count, damage.die.sides(), damage.bonus)?;
            let amount = roll.total.max(0);
            self.apply_damage(target, amount)?;
            self.add_combat_log_entry(format!(
                "{name} hits {target_name} for {amount} {damage_type} damage"
            ));
            amount
        } else {
            self.add_combat_log_entry(format!("{name} misses {target_name}"));
            0
        };

        Ok(MonsterAttack {
            attacker,
            target,
            attack_roll,
            attack_total,
            hit,
            damage,
        })
    }
}
