//! Status effects: buffs, rage, concentration spells.
//!
//! An effect is a bag of [`Modifier`]s with a duration. Effects have no
//! lifecycle of their own; they live inside a
//! [`ResourceLedger`](crate::resources::ResourceLedger), which decides when
//! they are added, ticked and dropped. The free functions in this module
//! derive aggregate numbers from a set of active effects.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Common D&D damage types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageType {
    Slashing,
    Piercing,
    Bludgeoning,
    Fire,
    Cold,
    Lightning,
    Thunder,
    Acid,
    Poison,
    Necrotic,
    Radiant,
    Force,
    Psychic,
}

impl DamageType {
    pub fn name(&self) -> &'static str {
        match self {
            DamageType::Slashing => "slashing",
            DamageType::Piercing => "piercing",
            DamageType::Bludgeoning => "bludgeoning",
            DamageType::Fire => "fire",
            DamageType::Cold => "cold",
            DamageType::Lightning => "lightning",
            DamageType::Thunder => "thunder",
            DamageType::Acid => "acid",
            DamageType::Poison => "poison",
            DamageType::Necrotic => "necrotic",
            DamageType::Radiant => "radiant",
            DamageType::Force => "force",
            DamageType::Psychic => "psychic",
        }
    }

    /// Slashing, piercing and bludgeoning.
    pub fn is_physical(&self) -> bool {
        matches!(
            self,
            DamageType::Slashing | DamageType::Piercing | DamageType::Bludgeoning
        )
    }
}

impl fmt::Display for DamageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// How an attack is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackKind {
    Melee,
    Ranged,
    Spell,
}

/// Filter used when asking which modifiers apply to a roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModifierContext {
    pub attack_kind: Option<AttackKind>,
    pub damage_type: Option<DamageType>,
}

impl ModifierContext {
    pub fn attack(kind: AttackKind) -> Self {
        Self {
            attack_kind: Some(kind),
            damage_type: None,
        }
    }

    pub fn with_damage_type(mut self, damage_type: DamageType) -> Self {
        self.damage_type = Some(damage_type);
        self
    }
}

/// A single numeric or flag contribution of an effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Modifier {
    AcBonus(i32),
    /// `applies_to: None` applies to every attack.
    AttackBonus {
        amount: i32,
        applies_to: Option<AttackKind>,
    },
    /// Restricted by attack kind and/or damage type when those are set.
    DamageBonus {
        amount: i32,
        applies_to: Option<AttackKind>,
        damage_type: Option<DamageType>,
    },
    Resistance(DamageType),
}

impl Modifier {
    fn matches_kind(filter: Option<AttackKind>, ctx: &ModifierContext) -> bool {
        match filter {
            None => true,
            Some(kind) => ctx.attack_kind == Some(kind),
        }
    }

    /// Whether this modifier affects an attack roll made in `ctx`.
    pub fn applies_to_attack(&self, ctx: &ModifierContext) -> bool {
        match self {
            Modifier::AttackBonus { applies_to, .. } => Self::matches_kind(*applies_to, ctx),
            _ => false,
        }
    }

    /// Whether this modifier affects a damage roll made in `ctx`.
    pub fn applies_to_damage(&self, ctx: &ModifierContext) -> bool {
        match self {
            Modifier::DamageBonus {
                applies_to,
                damage_type,
                ..
            } => {
                let type_matches = match damage_type {
                    None => true,
                    Some(t) => ctx.damage_type == Some(*t),
                };
                Self::matches_kind(*applies_to, ctx) && type_matches
            }
            _ => false,
        }
    }
}

/// How long an effect lasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DurationType {
    Rounds,
    UntilRest,
    Permanent,
    Concentration,
}

/// Identifier of an active effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EffectId(pub Uuid);

impl EffectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EffectId {
    fn default() -> Self {
        Self::new()
    }
}

/// An effect currently applied to a character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub id: EffectId,
    pub name: String,
    pub modifiers: Vec<Modifier>,
    /// Rounds remaining, for effects that count down.
    pub duration: Option<u32>,
    pub duration_type: DurationType,
    pub requires_concentration: bool,
}

impl ActiveEffect {
    pub fn new(name: impl Into<String>, duration_type: DurationType) -> Self {
        Self {
            id: EffectId::new(),
            name: name.into(),
            modifiers: Vec::new(),
            duration: None,
            duration_type,
            requires_concentration: duration_type == DurationType::Concentration,
        }
    }

    /// An effect that expires after the given number of rounds.
    pub fn for_rounds(name: impl Into<String>, rounds: u32) -> Self {
        Self::new(name, DurationType::Rounds).with_duration(rounds)
    }

    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifiers.push(modifier);
        self
    }

    pub fn with_duration(mut self, rounds: u32) -> Self {
        self.duration = Some(rounds);
        self
    }

    pub fn with_concentration(mut self) -> Self {
        self.requires_concentration = true;
        self
    }

    /// Count down one round. Returns true when the effect has expired.
    ///
    /// Effects without a round count never expire by ticking.
    pub fn tick(&mut self) -> bool {
        match self.duration.as_mut() {
            Some(rounds) => {
                *rounds = rounds.saturating_sub(1);
                *rounds == 0
            }
            None => false,
        }
    }

    /// Barbarian rage: melee damage bonus and resistance to physical damage.
    pub fn rage(damage_bonus: i32) -> Self {
        Self::for_rounds("Rage", 10)
            .with_modifier(Modifier::DamageBonus {
                amount: damage_bonus,
                applies_to: Some(AttackKind::Melee),
                damage_type: None,
            })
            .with_modifier(Modifier::Resistance(DamageType::Slashing))
            .with_modifier(Modifier::Resistance(DamageType::Piercing))
            .with_modifier(Modifier::Resistance(DamageType::Bludgeoning))
    }

    /// Shield of Faith: +2 AC while concentrating, up to 10 minutes.
    pub fn shield_of_faith() -> Self {
        Self::new("Shield of Faith", DurationType::Concentration)
            .with_duration(100)
            .with_modifier(Modifier::AcBonus(2))
    }

    /// Bless, simplified to its average: +2 to attack rolls while concentrating.
    pub fn bless() -> Self {
        Self::new("Bless", DurationType::Concentration)
            .with_duration(10)
            .with_modifier(Modifier::AttackBonus {
                amount: 2,
                applies_to: None,
            })
    }

    /// Mage Armor-style ward that lasts until the next rest.
    pub fn ward(name: impl Into<String>, ac_bonus: i32) -> Self {
        Self::new(name, DurationType::UntilRest).with_modifier(Modifier::AcBonus(ac_bonus))
    }

    /// Generic timed buff to every attack and damage roll.
    pub fn stat_buff(
        name: impl Into<String>,
        rounds: u32,
        attack_bonus: i32,
        damage_bonus: i32,
    ) -> Self {
        let mut effect = Self::for_rounds(name, rounds);
        if attack_bonus != 0 {
            effect = effect.with_modifier(Modifier::AttackBonus {
                amount: attack_bonus,
                applies_to: None,
            });
        }
        if damage_bonus != 0 {
            effect = effect.with_modifier(Modifier::DamageBonus {
                amount: damage_bonus,
                applies_to: None,
                damage_type: None,
            });
        }
        effect
    }

    pub fn is_rage(&self) -> bool {
        self.name.eq_ignore_ascii_case("rage")
    }
}

/// Rage damage bonus by barbarian level.
pub fn rage_damage_bonus(level: u8) -> i32 {
    match level {
        0..=8 => 2,
        9..=15 => 3,
        _ => 4,
    }
}

/// Attack modifiers from `effects` that apply in `ctx`.
pub fn attack_modifiers<'a>(
    effects: &'a [ActiveEffect],
    ctx: &ModifierContext,
) -> Vec<&'a Modifier> {
    effects
        .iter()
        .flat_map(|e| e.modifiers.iter())
        .filter(|m| m.applies_to_attack(ctx))
        .collect()
}

/// Damage modifiers from `effects` that apply in `ctx`.
pub fn damage_modifiers<'a>(
    effects: &'a [ActiveEffect],
    ctx: &ModifierContext,
) -> Vec<&'a Modifier> {
    effects
        .iter()
        .flat_map(|e| e.modifiers.iter())
        .filter(|m| m.applies_to_damage(ctx))
        .collect()
}

pub fn total_ac_bonus(effects: &[ActiveEffect]) -> i32 {
    effects
        .iter()
        .flat_map(|e| e.modifiers.iter())
        .map(|m| match m {
            Modifier::AcBonus(amount) => *amount,
            _ => 0,
        })
        .sum()
}

pub fn total_attack_bonus(effects: &[ActiveEffect], ctx: &ModifierContext) -> i32 {
    attack_modifiers(effects, ctx)
        .into_iter()
        .map(|m| match m {
            Modifier::AttackBonus { amount, .. } => *amount,
            _ => 0,
        })
        .sum()
}

pub fn total_damage_bonus(effects: &[ActiveEffect], ctx: &ModifierContext) -> i32 {
    damage_modifiers(effects, ctx)
        .into_iter()
        .map(|m| match m {
            Modifier::DamageBonus { amount, .. } => *amount,
            _ => 0,
        })
        .sum()
}

pub fn has_resistance(effects: &[ActiveEffect], damage_type: DamageType) -> bool {
    effects
        .iter()
        .flat_map(|e| e.modifiers.iter())
        .any(|m| *m == Modifier::Resistance(damage_type))
}

/// Incoming damage after resistances; resisted damage is halved, rounded down.
pub fn apply_resistance(effects: &[ActiveEffect], amount: i32, damage_type: DamageType) -> i32 {
    if amount > 0 && has_resistance(effects, damage_type) {
        amount / 2
    } else {
        amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rage_bonus_is_melee_only() {
        let effects = vec![ActiveEffect::rage(2)];
        let melee = ModifierContext::attack(AttackKind::Melee).with_damage_type(DamageType::Slashing);
        let ranged =
            ModifierContext::attack(AttackKind::Ranged).with_damage_type(DamageType::Piercing);

        assert_eq!(total_damage_bonus(&effects, &melee), 2);
        assert_eq!(total_damage_bonus(&effects, &ranged), 0);
    }

    #[test]
    fn test_rage_halves_only_physical_damage() {
        let effects = vec![ActiveEffect::rage(2)];
        assert_eq!(apply_resistance(&effects, 11, DamageType::Slashing), 5);
        assert_eq!(apply_resistance(&effects, 10, DamageType::Piercing), 5);
        assert_eq!(apply_resistance(&effects, 9, DamageType::Bludgeoning), 4);
        assert_eq!(apply_resistance(&effects, 10, DamageType::Fire), 10);
        assert!(!has_resistance(&effects, DamageType::Psychic));
    }

    #[test]
    fn test_stat_buff() {
        let effects = vec![ActiveEffect::stat_buff("Heroism Draught", 3, 1, 2)];
        let ranged = ModifierContext::attack(AttackKind::Ranged).with_damage_type(DamageType::Piercing);
        assert_eq!(total_attack_bonus(&effects, &ranged), 1);
        assert_eq!(total_damage_bonus(&effects, &ranged), 2);
        assert_eq!(effects[0].duration, Some(3));
        assert!(!effects[0].requires_concentration);
    }

    #[test]
    fn test_damage_bonus_filtered_by_type() {
        let effects = vec![ActiveEffect::new("Flame Tongue", DurationType::Permanent)
            .with_modifier(Modifier::DamageBonus {
                amount: 3,
                applies_to: None,
                damage_type: Some(DamageType::Fire),
            })];
        let fire = ModifierContext::attack(AttackKind::Melee).with_damage_type(DamageType::Fire);
        let cold = ModifierContext::attack(AttackKind::Melee).with_damage_type(DamageType::Cold);
        assert_eq!(total_damage_bonus(&effects, &fire), 3);
        assert_eq!(total_damage_bonus(&effects, &cold), 0);
    }

    #[test]
    fn test_attack_modifiers_filter_by_context() {
        let effects = vec![
            ActiveEffect::bless(),
            ActiveEffect::new("Eagle Eye", DurationType::Permanent).with_modifier(
                Modifier::AttackBonus {
                    amount: 1,
                    applies_to: Some(AttackKind::Ranged),
                },
            ),
        ];
        let melee = ModifierContext::attack(AttackKind::Melee);
        let ranged = ModifierContext::attack(AttackKind::Ranged);
        assert_eq!(attack_modifiers(&effects, &melee).len(), 1);
        assert_eq!(attack_modifiers(&effects, &ranged).len(), 2);
        assert_eq!(total_attack_bonus(&effects, &ranged), 3);
    }

    #[test]
    fn test_total_ac_bonus_sums_effects() {
        let effects = vec![ActiveEffect::shield_of_faith(), ActiveEffect::ward("Ward", 1)];
        assert_eq!(total_ac_bonus(&effects), 3);
        assert_eq!(total_ac_bonus(&[]), 0);
    }

    #[test]
    fn test_tick_expiry() {
        let mut effect = ActiveEffect::for_rounds("Haste", 2);
        assert!(!effect.tick());
        assert!(effect.tick());

        let mut permanent = ActiveEffect::new("Blessing", DurationType::Permanent);
        assert!(!permanent.tick());
    }

    #[test]
    fn test_concentration_flag_defaults_from_duration_type() {
        assert!(ActiveEffect::bless().requires_concentration);
        assert!(!ActiveEffect::rage(2).requires_concentration);
    }

    #[test]
    fn test_rage_damage_bonus_by_level() {
        assert_eq!(rage_damage_bonus(1), 2);
        assert_eq!(rage_damage_bonus(9), 3);
        assert_eq!(rage_damage_bonus(16), 4);
    }
}
