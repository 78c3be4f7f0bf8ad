//! Weapon and unarmed attack resolution.
//!
//! [`resolve_attack`] turns a character's equipped gear into one
//! [`AttackResult`] per strike: one for a single or two-handed weapon or an
//! unarmed strike, two when both hands hold something to attack with.
//!
//! Dice are drawn from the roller in a fixed order per strike: the d20 (two
//! dice with advantage or disadvantage), the weapon damage dice, any Great
//! Weapon Fighting rerolls, then sneak attack dice.

use crate::character::{Ability, Character, Feature, FightingStyle};
use crate::config::RulesConfig;
use crate::dice::{Advantage, D20Roll, DieType, DiceFormula, DiceRoller, Roll, RollError};
use crate::effects::{AttackKind, DamageType, ModifierContext};
use crate::items::{Equipment, Weapon};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Which hand a strike came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Hand {
    MainHand,
    OffHand,
    TwoHanded,
}

/// Per-attack options supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AttackOptions {
    pub advantage: Advantage,
    /// The situation allows sneak attack (advantage or an adjacent ally).
    pub sneak_attack_eligible: bool,
    /// When set, each result records whether it hit, and sneak attack is
    /// only applied on a hit.
    pub target_ac: Option<i32>,
}

impl AttackOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_advantage(mut self, advantage: Advantage) -> Self {
        self.advantage = advantage;
        self
    }

    pub fn with_sneak_attack(mut self) -> Self {
        self.sneak_attack_eligible = true;
        self
    }

    pub fn against(mut self, target_ac: i32) -> Self {
        self.target_ac = Some(target_ac);
        self
    }
}

/// Outcome of a single strike.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackResult {
    pub weapon_name: String,
    pub hand: Hand,
    pub attack_kind: AttackKind,
    pub ability: Ability,
    pub attack_roll: D20Roll,
    pub attack_bonus: i32,
    pub attack_total: i32,
    /// Weapon damage dice only; flat bonuses are in `damage_bonus`.
    pub damage_roll: Roll,
    pub damage_bonus: i32,
    /// Never negative.
    pub damage_total: i32,
    pub damage_type: DamageType,
    pub critical: bool,
    pub sneak_attack: Option<Roll>,
    pub hit: Option<bool>,
}

impl AttackResult {
    /// Natural 1 always misses, natural 20 always hits; otherwise the total
    /// must meet or beat the target's AC.
    pub fn hits(&self, target_ac: i32) -> bool {
        hits(&self.attack_roll, self.attack_total, target_ac)
    }
}

/// Hit check shared by characters and monsters.
pub fn hits(roll: &D20Roll, total: i32, target_ac: i32) -> bool {
    if roll.is_fumble() {
        return false;
    }
    roll.is_critical() || total >= target_ac
}

/// Unarmed damage die for a Martial Arts user of the given level.
pub fn martial_arts_die(level: u8) -> DieType {
    match level {
        0..=4 => DieType::D4,
        5..=10 => DieType::D6,
        11..=16 => DieType::D8,
        _ => DieType::D10,
    }
}

/// Number of sneak attack d6s at the given rogue level.
pub fn sneak_attack_dice(level: u8) -> u32 {
    (level.max(1) as u32).div_ceil(2)
}

// ============================================================================
// Strike planning
// ============================================================================

/// What a strike is made with.
enum Source<'a> {
    Weapon(&'a Weapon),
    /// A non-weapon item swung as an improvised weapon.
    Improvised(&'a str),
    Unarmed,
}

struct Strike<'a> {
    source: Source<'a>,
    hand: Hand,
}

impl Source<'_> {
    fn name(&self) -> &str {
        match self {
            Source::Weapon(w) => &w.name,
            Source::Improvised(name) => name,
            Source::Unarmed => "Unarmed Strike",
        }
    }

    fn weapon(&self) -> Option<&Weapon> {
        match self {
            Source::Weapon(w) => Some(w),
            _ => None,
        }
    }

    fn kind(&self) -> AttackKind {
        match self.weapon() {
            Some(w) if w.is_ranged() => AttackKind::Ranged,
            _ => AttackKind::Melee,
        }
    }
}

fn source_of(item: &Equipment) -> Source<'_> {
    match item {
        Equipment::Weapon(w) => Source::Weapon(w),
        other => Source::Improvised(other.name()),
    }
}

fn plan_strikes(character: &Character) -> Vec<Strike<'_>> {
    let slots = &character.equipment;

    if let Some(Equipment::Weapon(w)) = &slots.two_handed {
        return vec![Strike {
            source: Source::Weapon(w),
            hand: Hand::TwoHanded,
        }];
    }

    let Some(main) = slots.main_hand.as_ref() else {
        return vec![Strike {
            source: Source::Unarmed,
            hand: Hand::MainHand,
        }];
    };

    let mut strikes = vec![Strike {
        source: source_of(main),
        hand: Hand::MainHand,
    }];
    if let Some(Equipment::Weapon(w)) = &slots.off_hand {
        strikes.push(Strike {
            source: Source::Weapon(w),
            hand: Hand::OffHand,
        });
    }
    strikes
}

// ============================================================================
// Rules
// ============================================================================

/// Pick the attack ability: DEX for ranged, STR for melee, the better of
/// the two (ties to STR) for finesse weapons and Martial Arts strikes.
fn select_ability(character: &Character, source: &Source<'_>) -> Ability {
    let martial_arts = character.has_martial_arts();
    let either = match source {
        Source::Weapon(w) if w.is_ranged() => return Ability::Dexterity,
        Source::Weapon(w) => w.is_finesse() || (martial_arts && w.is_monk_weapon()),
        Source::Improvised(_) | Source::Unarmed => martial_arts,
    };

    if either
        && character.ability_modifier(Ability::Dexterity)
            > character.ability_modifier(Ability::Strength)
    {
        Ability::Dexterity
    } else {
        Ability::Strength
    }
}

fn damage_dice(character: &Character, source: &Source<'_>) -> (DiceFormula, DamageType) {
    match source {
        Source::Weapon(w) => (w.damage.dice, w.damage.damage_type),
        Source::Improvised(_) | Source::Unarmed => {
            let die = if character.has_martial_arts() {
                martial_arts_die(character.level)
            } else {
                DieType::D4
            };
            (DiceFormula::new(1, die), DamageType::Bludgeoning)
        }
    }
}

fn is_proficient(character: &Character, source: &Source<'_>) -> bool {
    match source {
        Source::Weapon(w) => character.proficiencies.is_proficient_with(w),
        Source::Unarmed => true,
        Source::Improvised(_) => false,
    }
}

/// Wielded in both hands: a two-handed weapon, or a versatile weapon with
/// nothing in the off hand.
fn is_two_hand_grip(character: &Character, strike: &Strike<'_>) -> bool {
    let Some(weapon) = strike.source.weapon() else {
        return false;
    };
    if weapon.is_ranged() {
        return false;
    }
    match strike.hand {
        Hand::TwoHanded => true,
        Hand::MainHand => {
            weapon.versatile_die().is_some() && character.equipment.off_hand.is_none()
        }
        Hand::OffHand => false,
    }
}

/// Dueling: one melee weapon in the main hand and no weapon in the off hand.
fn dueling_applies(character: &Character, strike: &Strike<'_>) -> bool {
    let melee_weapon = strike.source.weapon().is_some_and(|w| !w.is_ranged());
    let off_hand_weapon = character
        .equipment
        .off_hand
        .as_ref()
        .is_some_and(|item| item.as_weapon().is_some());
    strike.hand == Hand::MainHand && melee_weapon && !off_hand_weapon
}

fn sneak_attack_applies(
    character: &Character,
    source: &Source<'_>,
    options: &AttackOptions,
    config: &RulesConfig,
) -> bool {
    let qualifying_weapon = source
        .weapon()
        .is_some_and(|w| w.is_finesse() || w.is_ranged());
    config.sneak_attack
        && options.sneak_attack_eligible
        && qualifying_weapon
        && !character.resources.sneak_attack_used
        && character.has_feature(&Feature::SneakAttack)
}

fn reroll_low_dice(
    roll: &mut Roll,
    sides: u32,
    roller: &mut dyn DiceRoller,
) -> Result<(), RollError> {
    for face in roll.results.iter_mut() {
        if *face <= 2 {
            let reroll = roller.roll(1, sides, 0)?;
            *face = reroll.results.first().copied().ok_or(RollError::Exhausted)?;
        }
    }
    roll.total = roll.dice_total();
    Ok(())
}

fn resolve_strike(
    character: &mut Character,
    strike: &Strike<'_>,
    options: &AttackOptions,
    config: &RulesConfig,
    roller: &mut dyn DiceRoller,
) -> Result<AttackResult, RollError> {
    let source = &strike.source;
    let kind = source.kind();
    let ability = select_ability(character, source);
    let ability_mod = character.ability_modifier(ability);
    let style = character.fighting_style();
    let (dice, damage_type) = damage_dice(character, source);
    let ctx = ModifierContext::attack(kind).with_damage_type(damage_type);

    // Attack roll
    let proficiency = if is_proficient(character, source) {
        character.proficiency_bonus()
    } else {
        0
    };
    let archery = match style {
        Some(FightingStyle::Archery) if kind == AttackKind::Ranged => 2,
        _ => 0,
    };
    let attack_bonus =
        ability_mod + proficiency + archery + character.resources.total_attack_bonus(&ctx);
    let attack_roll = roller.roll_d20(options.advantage)?;
    let attack_total = attack_roll.natural as i32 + attack_bonus;
    let critical = attack_roll.is_critical();
    let hit = options
        .target_ac
        .map(|ac| hits(&attack_roll, attack_total, ac));

    // Weapon damage dice, doubled on a critical
    let count = if critical { dice.count * 2 } else { dice.count };
    let sides = dice.die.sides();
    let mut damage_roll = roller.roll(count, sides, 0)?;
    if config.great_weapon_fighting_reroll
        && style == Some(FightingStyle::GreatWeaponFighting)
        && is_two_hand_grip(character, strike)
    {
        reroll_low_dice(&mut damage_roll, sides, roller)?;
    }

    // Flat damage, added once
    let ability_damage = match (strike.hand, style) {
        (Hand::OffHand, Some(FightingStyle::TwoWeaponFighting)) => ability_mod,
        (Hand::OffHand, _) => 0,
        _ => ability_mod,
    };
    let dueling = match style {
        Some(FightingStyle::Dueling) if dueling_applies(character, strike) => 2,
        _ => 0,
    };
    let damage_bonus =
        ability_damage + dice.bonus + dueling + character.resources.total_damage_bonus(&ctx);

    // Sneak attack, once per turn
    let sneak_attack = if hit != Some(false)
        && sneak_attack_applies(character, source, options, config)
    {
        let base = sneak_attack_dice(character.level);
        let count = if critical { base * 2 } else { base };
        let roll = roller.roll(count, DieType::D6.sides(), 0)?;
        character.resources.sneak_attack_used = true;
        Some(roll)
    } else {
        None
    };

    let sneak_total = sneak_attack.as_ref().map_or(0, |r| r.total);
    let damage_total = (damage_roll.total + damage_bonus + sneak_total).max(0);

    debug!(
        character = %character.name,
        weapon = source.name(),
        hand = ?strike.hand,
        natural = attack_roll.natural,
        attack_total,
        damage_total,
        critical,
        "strike resolved"
    );

    Ok(AttackResult {
        weapon_name: source.name().to_string(),
        hand: strike.hand,
        attack_kind: kind,
        ability,
        attack_roll,
        attack_bonus,
        attack_total,
        damage_roll,
        damage_bonus,
        damage_total,
        damage_type,
        critical,
        sneak_attack,
        hit,
    })
}

/// Resolve the attack action for `character`.
///
/// Missing data never fails the attack: absent ability scores count as 0
/// and anything that isn't a weapon is swung as an improvised weapon. Only
/// a failing dice source aborts, with its error returned unchanged.
pub fn resolve_attack(
    character: &mut Character,
    options: &AttackOptions,
    config: &RulesConfig,
    roller: &mut dyn DiceRoller,
) -> Result<Vec<AttackResult>, RollError> {
    // Strikes borrow the equipment; resolve against a snapshot so the
    // ledger can be updated in between.
    let snapshot = character.clone();
    let strikes = plan_strikes(&snapshot);

    let mut results = Vec::with_capacity(strikes.len());
    for strike in &strikes {
        let result = resolve_strike(character, strike, options, config, roller)?;
        results.push(result);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::{AbilityScores, Proficiencies};
    use crate::effects::ActiveEffect;
    use crate::items::{get_armor, get_weapon, BasicItem, WeaponCategory};
    use crate::testing::ScriptedRoller;

    fn fighter(str: u8, dex: u8) -> Character {
        Character::new("Fighter")
            .with_ability_scores(AbilityScores::new(str, dex, 10, 10, 10, 10))
            .with_proficiencies(
                Proficiencies::default()
                    .with_weapon_category(WeaponCategory::Simple)
                    .with_weapon_category(WeaponCategory::Martial),
            )
    }

    fn wield(character: &mut Character, name: &str) {
        character.equip(Equipment::Weapon(get_weapon(name).unwrap()));
    }

    fn attack(character: &mut Character, rolls: Vec<u32>) -> Vec<AttackResult> {
        let mut roller = ScriptedRoller::new(rolls);
        resolve_attack(character, &AttackOptions::new(), &RulesConfig::default(), &mut roller)
            .unwrap()
    }

    #[test]
    fn test_finesse_uses_higher_ability() {
        let mut character = fighter(12, 16);
        wield(&mut character, "Rapier");
        let results = attack(&mut character, vec![10, 5]);
        assert_eq!(results[0].ability, Ability::Dexterity);
        assert_eq!(results[0].attack_bonus, 3 + 2);
        assert_eq!(results[0].damage_total, 5 + 3);
    }

    #[test]
    fn test_non_finesse_uses_strength() {
        let mut character = fighter(12, 16);
        wield(&mut character, "Longsword");
        let results = attack(&mut character, vec![10, 5]);
        assert_eq!(results[0].ability, Ability::Strength);
        assert_eq!(results[0].attack_total, 10 + 1 + 2);
    }

    #[test]
    fn test_finesse_tie_prefers_strength() {
        let mut character = fighter(14, 14);
        wield(&mut character, "Dagger");
        let results = attack(&mut character, vec![10, 3]);
        assert_eq!(results[0].ability, Ability::Strength);
    }

    #[test]
    fn test_ranged_uses_dexterity() {
        let mut character = fighter(18, 12);
        wield(&mut character, "Longbow");
        let results = attack(&mut character, vec![10, 4]);
        assert_eq!(results[0].ability, Ability::Dexterity);
        assert_eq!(results[0].attack_kind, AttackKind::Ranged);
        assert_eq!(results[0].hand, Hand::TwoHanded);
    }

    #[test]
    fn test_no_proficiency_no_bonus() {
        let mut character = fighter(14, 10).with_proficiencies(Proficiencies::default());
        wield(&mut character, "Longsword");
        let results = attack(&mut character, vec![10, 5]);
        assert_eq!(results[0].attack_bonus, 2);
    }

    #[test]
    fn test_unarmed_without_martial_arts() {
        let mut character = fighter(14, 18);
        character.level = 17;
        let results = attack(&mut character, vec![10, 3]);
        assert_eq!(results[0].weapon_name, "Unarmed Strike");
        assert_eq!(results[0].ability, Ability::Strength);
        assert_eq!(results[0].damage_roll.results.len(), 1);
        assert_eq!(results[0].damage_type, DamageType::Bludgeoning);
        assert_eq!(results[0].attack_bonus, 2 + 6);
    }

    #[test]
    fn test_martial_arts_die_scales() {
        assert_eq!(martial_arts_die(1), DieType::D4);
        assert_eq!(martial_arts_die(5), DieType::D6);
        assert_eq!(martial_arts_die(11), DieType::D8);
        assert_eq!(martial_arts_die(17), DieType::D10);
    }

    #[test]
    fn test_martial_arts_uses_dex_with_monk_weapon() {
        let mut monk = fighter(10, 16).with_feature(Feature::MartialArts);
        wield(&mut monk, "Quarterstaff");
        let results = attack(&mut monk, vec![10, 4]);
        assert_eq!(results[0].ability, Ability::Dexterity);

        let mut monk = fighter(10, 16).with_feature(Feature::MartialArts);
        wield(&mut monk, "Longsword");
        let results = attack(&mut monk, vec![10, 4]);
        assert_eq!(results[0].ability, Ability::Strength);
    }

    #[test]
    fn test_improvised_item_falls_back_to_unarmed() {
        let mut character = fighter(14, 10);
        character.equip(Equipment::Basic(BasicItem::new("Torch")));
        let results = attack(&mut character, vec![12, 2]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].weapon_name, "Torch");
        assert_eq!(results[0].damage_total, 2 + 2);
        // STR only; improvised weapons get no proficiency bonus
        assert_eq!(results[0].attack_bonus, 2);
    }

    #[test]
    fn test_unarmed_strike_is_proficient() {
        let mut character = fighter(14, 10);
        let results = attack(&mut character, vec![12, 2]);
        assert_eq!(results[0].weapon_name, "Unarmed Strike");
        assert_eq!(results[0].attack_bonus, 2 + 2);
    }

    #[test]
    fn test_critical_doubles_dice_not_bonus() {
        let mut character = fighter(16, 10);
        wield(&mut character, "Greatsword");
        let results = attack(&mut character, vec![20, 3, 4, 5, 6]);
        let result = &results[0];
        assert!(result.critical);
        assert_eq!(result.damage_roll.results.len(), 4);
        assert_eq!(result.damage_total, 18 + 3);
        assert!(result.hits(100));
    }

    #[test]
    fn test_natural_one_misses() {
        let mut character = fighter(16, 10);
        wield(&mut character, "Longsword");
        let results = attack(&mut character, vec![1, 5]);
        assert!(!results[0].hits(1));
    }

    #[test]
    fn test_dual_wield_off_hand_has_no_positive_modifier() {
        let mut character = fighter(16, 10);
        wield(&mut character, "Handaxe");
        wield(&mut character, "Shortsword");
        let results = attack(&mut character, vec![10, 4, 10, 4]);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].hand, Hand::MainHand);
        assert_eq!(results[0].damage_total, 4 + 3);
        assert_eq!(results[1].hand, Hand::OffHand);
        assert_eq!(results[1].damage_total, 4);
    }

    #[test]
    fn test_off_hand_damage_has_no_ability_modifier() {
        let mut character = fighter(6, 6);
        wield(&mut character, "Dagger");
        wield(&mut character, "Dagger");
        let results = attack(&mut character, vec![10, 3, 10, 3]);
        assert_eq!(results[0].damage_bonus, -2);
        assert_eq!(results[0].damage_total, 1);
        assert_eq!(results[1].hand, Hand::OffHand);
        assert_eq!(results[1].damage_bonus, 0);
        assert_eq!(results[1].damage_total, 3);
    }

    #[test]
    fn test_two_weapon_fighting_adds_modifier() {
        let mut character = fighter(16, 10)
            .with_feature(Feature::fighting_style(FightingStyle::TwoWeaponFighting));
        wield(&mut character, "Handaxe");
        wield(&mut character, "Shortsword");
        let results = attack(&mut character, vec![10, 4, 10, 4]);
        assert_eq!(results[1].damage_total, 4 + 3);
    }

    #[test]
    fn test_dueling_with_shield_but_not_second_weapon() {
        let mut character =
            fighter(16, 10).with_feature(Feature::fighting_style(FightingStyle::Dueling));
        wield(&mut character, "Longsword");
        let results = attack(&mut character, vec![10, 5]);
        assert_eq!(results[0].damage_total, 5 + 3 + 2);

        character.equip(Equipment::Armor(get_armor("Shield").unwrap()));
        let results = attack(&mut character, vec![10, 5]);
        assert_eq!(results[0].damage_total, 5 + 3 + 2);

        let mut character =
            fighter(16, 10).with_feature(Feature::fighting_style(FightingStyle::Dueling));
        wield(&mut character, "Dagger");
        wield(&mut character, "Longsword");
        let results = attack(&mut character, vec![10, 5, 10, 2]);
        assert_eq!(results[0].damage_total, 5 + 3);
    }

    #[test]
    fn test_archery_bonus_ranged_only() {
        let mut archer =
            fighter(10, 16).with_feature(Feature::fighting_style(FightingStyle::Archery));
        wield(&mut archer, "Shortbow");
        assert_eq!(attack(&mut archer, vec![10, 3])[0].attack_bonus, 3 + 2 + 2);

        wield(&mut archer, "Rapier");
        assert_eq!(attack(&mut archer, vec![10, 3])[0].attack_bonus, 3 + 2);
    }

    #[test]
    fn test_great_weapon_fighting_off_by_default() {
        let mut character = fighter(16, 10)
            .with_feature(Feature::fighting_style(FightingStyle::GreatWeaponFighting));
        wield(&mut character, "Greatsword");
        let results = attack(&mut character, vec![10, 1, 2]);
        assert_eq!(results[0].damage_roll.results, vec![1, 2]);
        assert_eq!(results[0].damage_total, 3 + 3);
    }

    #[test]
    fn test_great_weapon_fighting_rerolls_when_enabled() {
        let mut character = fighter(16, 10)
            .with_feature(Feature::fighting_style(FightingStyle::GreatWeaponFighting));
        wield(&mut character, "Greatsword");
        let config = RulesConfig::default().with_great_weapon_fighting_reroll(true);
        let mut roller = ScriptedRoller::new(vec![10, 1, 5, 2]);
        let results =
            resolve_attack(&mut character, &AttackOptions::new(), &config, &mut roller).unwrap();
        assert_eq!(results[0].damage_roll.results, vec![2, 5]);
        assert_eq!(results[0].damage_total, 7 + 3);
    }

    #[test]
    fn test_rage_bonus_melee_only() {
        let mut character = fighter(16, 14);
        character.resources.add_effect(ActiveEffect::rage(2));
        wield(&mut character, "Greataxe");
        assert_eq!(attack(&mut character, vec![10, 6])[0].damage_total, 6 + 3 + 2);

        wield(&mut character, "Longbow");
        assert_eq!(attack(&mut character, vec![10, 6])[0].damage_total, 6 + 2);
    }

    #[test]
    fn test_bless_adds_to_attack() {
        let mut character = fighter(16, 10);
        character.resources.add_effect(ActiveEffect::bless());
        wield(&mut character, "Mace");
        assert_eq!(attack(&mut character, vec![10, 3])[0].attack_bonus, 3 + 2 + 2);
    }

    #[test]
    fn test_advantage_takes_higher_die() {
        let mut character = fighter(10, 10);
        let options = AttackOptions::new().with_advantage(Advantage::Advantage);
        let mut roller = ScriptedRoller::new(vec![4, 17, 2]);
        let results =
            resolve_attack(&mut character, &options, &RulesConfig::default(), &mut roller)
                .unwrap();
        assert_eq!(results[0].attack_roll.natural, 17);
        assert_eq!(results[0].attack_roll.rolls, vec![4, 17]);
    }

    #[test]
    fn test_sneak_attack_once_per_turn() {
        let mut rogue = fighter(10, 16).with_feature(Feature::SneakAttack);
        rogue.level = 3;
        wield(&mut rogue, "Shortsword");
        wield(&mut rogue, "Dagger");
        let options = AttackOptions::new().with_sneak_attack();
        let mut roller = ScriptedRoller::new(vec![15, 4, 6, 6, 15, 2]);
        let results =
            resolve_attack(&mut rogue, &options, &RulesConfig::default(), &mut roller).unwrap();

        assert_eq!(results[0].sneak_attack.as_ref().map(|r| r.total), Some(12));
        assert_eq!(results[0].damage_total, 4 + 3 + 12);
        assert!(results[1].sneak_attack.is_none());
        assert!(rogue.resources.sneak_attack_used);

        rogue.start_new_turn();
        assert!(!rogue.resources.sneak_attack_used);
    }

    #[test]
    fn test_sneak_attack_skipped_on_miss() {
        let mut rogue = fighter(10, 16).with_feature(Feature::SneakAttack);
        wield(&mut rogue, "Rapier");
        let options = AttackOptions::new().with_sneak_attack().against(30);
        let mut roller = ScriptedRoller::new(vec![5, 4]);
        let results =
            resolve_attack(&mut rogue, &options, &RulesConfig::default(), &mut roller).unwrap();
        assert_eq!(results[0].hit, Some(false));
        assert!(results[0].sneak_attack.is_none());
        assert!(!rogue.resources.sneak_attack_used);
    }

    #[test]
    fn test_sneak_attack_needs_finesse_or_ranged() {
        let mut rogue = fighter(16, 10).with_feature(Feature::SneakAttack);
        wield(&mut rogue, "Club");
        let options = AttackOptions::new().with_sneak_attack();
        let mut roller = ScriptedRoller::new(vec![15, 3]);
        let results =
            resolve_attack(&mut rogue, &options, &RulesConfig::default(), &mut roller).unwrap();
        assert!(results[0].sneak_attack.is_none());
    }

    #[test]
    fn test_roller_failure_propagates() {
        let mut character = fighter(10, 10);
        let mut roller = ScriptedRoller::new(vec![12]);
        let result = resolve_attack(
            &mut character,
            &AttackOptions::new(),
            &RulesConfig::default(),
            &mut roller,
        );
        assert_eq!(result, Err(RollError::Exhausted));
    }

    #[test]
    fn test_damage_never_negative() {
        let mut character = fighter(3, 10);
        let results = attack(&mut character, vec![10, 1]);
        assert_eq!(results[0].damage_total, 0);
    }
}
