//! Per-character expendable state.
//!
//! The [`ResourceLedger`] owns everything a character spends during play:
//! hit points, hit dice, spell slots, limited-use abilities and the set of
//! active effects. No value tracked here ever goes negative.

use crate::dice::DieType;
use crate::effects::{self, ActiveEffect, DamageType, DurationType, EffectId, ModifierContext};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, trace};

// ============================================================================
// Hit Points and Hit Dice
// ============================================================================

/// Hit points tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitPoints {
    pub current: i32,
    pub maximum: i32,
    pub temporary: i32,
}

impl HitPoints {
    pub fn new(maximum: i32) -> Self {
        let maximum = maximum.max(0);
        Self {
            current: maximum,
            maximum,
            temporary: 0,
        }
    }

    /// Apply damage, temporary hit points first. Returns the requested amount.
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        if amount <= 0 {
            return 0;
        }

        if self.temporary >= amount {
            self.temporary -= amount;
            return amount;
        }

        let remaining = amount - self.temporary;
        self.temporary = 0;
        self.current = (self.current - remaining).max(0);
        amount
    }

    /// Restore hit points up to the maximum. Returns the amount restored.
    pub fn heal(&mut self, amount: i32) -> i32 {
        if amount <= 0 || self.current >= self.maximum {
            return 0;
        }
        let old = self.current;
        self.current = (self.current + amount).min(self.maximum);
        self.current - old
    }

    /// Temporary hit points don't stack; the higher value wins.
    pub fn add_temporary(&mut self, amount: i32) {
        if amount > self.temporary {
            self.temporary = amount;
        }
    }

    pub fn is_unconscious(&self) -> bool {
        self.current <= 0
    }
}

impl Default for HitPoints {
    fn default() -> Self {
        Self::new(10)
    }
}

/// Hit dice pool for one class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitDice {
    pub die: DieType,
    pub maximum: u8,
    pub remaining: u8,
}

impl HitDice {
    pub fn new(die: DieType, maximum: u8) -> Self {
        Self {
            die,
            maximum,
            remaining: maximum,
        }
    }

    pub fn spend(&mut self) -> bool {
        if self.remaining > 0 {
            self.remaining -= 1;
            true
        } else {
            false
        }
    }

    /// Long rest recovery: half the maximum (at least one), capped.
    pub fn recover_half(&mut self) {
        let to_recover = (self.maximum / 2).max(1);
        self.remaining = self.remaining.saturating_add(to_recover).min(self.maximum);
    }
}

// ============================================================================
// Spell Slots
// ============================================================================

/// Where a spell slot comes from; decides which rest restores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SlotSource {
    #[default]
    Spellcasting,
    PactMagic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellSlot {
    pub maximum: u8,
    pub remaining: u8,
    pub source: SlotSource,
}

impl SpellSlot {
    pub fn new(maximum: u8, source: SlotSource) -> Self {
        Self {
            maximum,
            remaining: maximum,
            source,
        }
    }

    pub fn restore(&mut self) {
        self.remaining = self.maximum;
    }
}

// ============================================================================
// Limited-use Abilities
// ============================================================================

/// Uses of a tracked ability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbilityUses {
    Unlimited,
    Limited { maximum: u8, remaining: u8 },
}

impl AbilityUses {
    pub fn limited(maximum: u8) -> Self {
        AbilityUses::Limited {
            maximum,
            remaining: maximum,
        }
    }

    pub fn available(&self) -> bool {
        match self {
            AbilityUses::Unlimited => true,
            AbilityUses::Limited { remaining, .. } => *remaining > 0,
        }
    }

    fn spend(&mut self) -> bool {
        match self {
            AbilityUses::Unlimited => true,
            AbilityUses::Limited { remaining, .. } => {
                if *remaining > 0 {
                    *remaining -= 1;
                    true
                } else {
                    false
                }
            }
        }
    }

    fn restore(&mut self) {
        if let AbilityUses::Limited { maximum, remaining } = self {
            *remaining = *maximum;
        }
    }
}

/// Action economy cost of using an ability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ActionType {
    #[default]
    Action,
    BonusAction,
    Reaction,
}

/// Which rest brings an ability's uses back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RestRecovery {
    Never,
    ShortRest,
    #[default]
    LongRest,
}

/// A named class or racial ability with limited uses, such as Rage or
/// Second Wind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedAbility {
    pub name: String,
    pub uses: AbilityUses,
    pub action_type: ActionType,
    /// Rounds the ability stays active once used; 0 for instant abilities.
    pub duration_rounds: u32,
    pub rounds_remaining: u32,
    pub active: bool,
    pub recovery: RestRecovery,
}

impl TrackedAbility {
    pub fn new(name: impl Into<String>, uses: AbilityUses, recovery: RestRecovery) -> Self {
        Self {
            name: name.into(),
            uses,
            action_type: ActionType::Action,
            duration_rounds: 0,
            rounds_remaining: 0,
            active: false,
            recovery,
        }
    }

    pub fn with_action_type(mut self, action_type: ActionType) -> Self {
        self.action_type = action_type;
        self
    }

    pub fn with_duration(mut self, rounds: u32) -> Self {
        self.duration_rounds = rounds;
        self
    }

    /// Count down one round; deactivates on reaching zero.
    fn tick(&mut self) {
        if self.active && self.rounds_remaining > 0 {
            self.rounds_remaining -= 1;
            if self.rounds_remaining == 0 {
                self.active = false;
            }
        }
    }

    fn restore(&mut self) {
        self.uses.restore();
        self.active = false;
        self.rounds_remaining = 0;
    }
}

// ============================================================================
// Ledger
// ============================================================================

/// Everything a character can spend and recover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ResourceLedger {
    pub hit_points: HitPoints,
    pub hit_dice: Option<HitDice>,
    /// Keyed by spell level (1-9).
    pub spell_slots: BTreeMap<u8, SpellSlot>,
    /// Keyed by lowercase ability name.
    pub abilities: BTreeMap<String, TrackedAbility>,
    pub effects: Vec<ActiveEffect>,
    /// Set once sneak attack damage has been dealt this turn.
    pub sneak_attack_used: bool,
}

impl ResourceLedger {
    pub fn new(max_hp: i32) -> Self {
        Self {
            hit_points: HitPoints::new(max_hp),
            ..Self::default()
        }
    }

    pub fn with_hit_dice(mut self, die: DieType, count: u8) -> Self {
        self.hit_dice = Some(HitDice::new(die, count));
        self
    }

    pub fn with_spell_slots(mut self, level: u8, count: u8, source: SlotSource) -> Self {
        self.spell_slots.insert(level, SpellSlot::new(count, source));
        self
    }

    pub fn with_ability(mut self, ability: TrackedAbility) -> Self {
        self.add_ability(ability);
        self
    }

    pub fn add_ability(&mut self, ability: TrackedAbility) {
        self.abilities.insert(ability.name.to_lowercase(), ability);
    }

    pub fn ability(&self, name: &str) -> Option<&TrackedAbility> {
        self.abilities.get(&name.to_lowercase())
    }

    // ------------------------------------------------------------------
    // Hit points
    // ------------------------------------------------------------------

    /// Apply damage. Non-positive amounts do nothing. Returns the requested
    /// amount regardless of how much temporary HP absorbed.
    pub fn damage(&mut self, amount: i32) -> i32 {
        let dealt = self.hit_points.take_damage(amount);
        trace!(
            amount,
            current = self.hit_points.current,
            temporary = self.hit_points.temporary,
            "damage applied"
        );
        dealt
    }

    /// Apply damage of a given type after resistances from active effects.
    pub fn damage_typed(&mut self, amount: i32, damage_type: DamageType) -> i32 {
        let amount = effects::apply_resistance(&self.effects, amount, damage_type);
        self.damage(amount)
    }

    /// Heal up to maximum HP. Returns the amount actually restored.
    pub fn heal(&mut self, amount: i32) -> i32 {
        self.hit_points.heal(amount)
    }

    pub fn add_temporary_hp(&mut self, amount: i32) {
        self.hit_points.add_temporary(amount);
    }

    pub fn is_unconscious(&self) -> bool {
        self.hit_points.is_unconscious()
    }

    /// Spend one hit die, returning its size so the caller can roll it.
    pub fn spend_hit_die(&mut self) -> Option<DieType> {
        let dice = self.hit_dice.as_mut()?;
        dice.spend().then_some(dice.die)
    }

    // ------------------------------------------------------------------
    // Spell slots and abilities
    // ------------------------------------------------------------------

    pub fn use_spell_slot(&mut self, level: u8) -> bool {
        match self.spell_slots.get_mut(&level) {
            Some(slot) if slot.remaining > 0 => {
                slot.remaining -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn remaining_slots(&self, level: u8) -> u8 {
        self.spell_slots.get(&level).map_or(0, |s| s.remaining)
    }

    /// Spend one use of an ability. Unlimited abilities always succeed.
    pub fn use_ability(&mut self, name: &str) -> bool {
        match self.abilities.get_mut(&name.to_lowercase()) {
            Some(ability) => ability.uses.spend(),
            None => false,
        }
    }

    /// Spend one use and start the ability's duration.
    pub fn activate_ability(&mut self, name: &str) -> bool {
        let Some(ability) = self.abilities.get_mut(&name.to_lowercase()) else {
            return false;
        };
        if !ability.uses.spend() {
            return false;
        }
        if ability.duration_rounds > 0 {
            ability.active = true;
            ability.rounds_remaining = ability.duration_rounds;
        }
        debug!(ability = %ability.name, rounds = ability.duration_rounds, "ability activated");
        true
    }

    // ------------------------------------------------------------------
    // Rests
    // ------------------------------------------------------------------

    /// Short rest: short-rest abilities and pact magic slots come back.
    pub fn short_rest(&mut self) {
        for ability in self.abilities.values_mut() {
            if ability.recovery == RestRecovery::ShortRest {
                ability.uses.restore();
            }
        }
        for slot in self.spell_slots.values_mut() {
            if slot.source == SlotSource::PactMagic {
                slot.restore();
            }
        }
        debug!("short rest completed");
    }

    /// Long rest: full HP, every ability and slot, half the hit dice, and
    /// effects that last until a rest are dropped.
    pub fn long_rest(&mut self) {
        self.hit_points.current = self.hit_points.maximum;
        self.hit_points.temporary = 0;

        for ability in self.abilities.values_mut() {
            ability.restore();
        }
        for slot in self.spell_slots.values_mut() {
            slot.restore();
        }
        if let Some(dice) = self.hit_dice.as_mut() {
            dice.recover_half();
        }
        self.effects
            .retain(|e| e.duration_type != DurationType::UntilRest);
        self.sneak_attack_used = false;
        debug!(hp = self.hit_points.current, "long rest completed");
    }

    // ------------------------------------------------------------------
    // Effects
    // ------------------------------------------------------------------

    /// Add an effect. A concentration effect replaces any other one.
    pub fn add_effect(&mut self, effect: ActiveEffect) -> EffectId {
        if effect.requires_concentration {
            self.remove_concentration_effects();
        }
        let id = effect.id;
        debug!(effect = %effect.name, "effect added");
        self.effects.push(effect);
        id
    }

    pub fn remove_effect(&mut self, id: EffectId) -> bool {
        let before = self.effects.len();
        self.effects.retain(|e| e.id != id);
        self.effects.len() != before
    }

    /// Drop every concentration effect. Returns how many were removed.
    pub fn remove_concentration_effects(&mut self) -> usize {
        let before = self.effects.len();
        self.effects.retain(|e| !e.requires_concentration);
        before - self.effects.len()
    }

    pub fn is_concentrating(&self) -> bool {
        self.effects.iter().any(|e| e.requires_concentration)
    }

    /// Advance every timed effect and ability by one round.
    pub fn tick_effect_durations(&mut self) {
        self.effects.retain_mut(|effect| {
            let expired = effect.tick();
            if expired {
                debug!(effect = %effect.name, "effect expired");
            }
            !expired
        });
        for ability in self.abilities.values_mut() {
            ability.tick();
        }
    }

    /// Clear per-turn flags.
    pub fn reset_turn(&mut self) {
        self.sneak_attack_used = false;
    }

    /// Turn start bookkeeping: clears per-turn flags and ticks durations.
    pub fn start_new_turn(&mut self) {
        self.reset_turn();
        self.tick_effect_durations();
    }

    pub fn has_effect(&self, name: &str) -> bool {
        self.effects.iter().any(|e| e.name.eq_ignore_ascii_case(name))
    }

    pub fn total_ac_bonus(&self) -> i32 {
        effects::total_ac_bonus(&self.effects)
    }

    pub fn total_attack_bonus(&self, ctx: &ModifierContext) -> i32 {
        effects::total_attack_bonus(&self.effects, ctx)
    }

    pub fn total_damage_bonus(&self, ctx: &ModifierContext) -> i32 {
        effects::total_damage_bonus(&self.effects, ctx)
    }

    pub fn has_resistance(&self, damage_type: DamageType) -> bool {
        effects::has_resistance(&self.effects, damage_type)
    }
}
