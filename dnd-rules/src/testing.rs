//! Testing utilities.
//!
//! - [`ScriptedRoller`] for deterministic dice
//! - Sample characters and monsters for scenario tests

use crate::character::{
    AbilityScores, Character, CharacterClass, Feature, FightingStyle, Proficiencies, RaceType,
    Skill, UnarmoredDefense,
};
use crate::dice::{DiceFormula, DiceRoller, DieType, Roll, RollError};
use crate::effects::DamageType;
use crate::encounter::Combatant;
use crate::items::{find_equipment, ArmorCategory, WeaponCategory};
use crate::resources::{
    AbilityUses, ActionType, ResourceLedger, RestRecovery, SlotSource, TrackedAbility,
};
use std::collections::VecDeque;

/// A dice source that returns scripted faces in order.
///
/// Each requested die consumes one value. Running out is an error, which
/// makes it easy to test that roll failures propagate.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRoller {
    faces: VecDeque<u32>,
    /// Every face handed out so far.
    pub history: Vec<u32>,
}

impl ScriptedRoller {
    pub fn new(faces: impl IntoIterator<Item = u32>) -> Self {
        Self {
            faces: faces.into_iter().collect(),
            history: Vec::new(),
        }
    }

    pub fn push(&mut self, face: u32) {
        self.faces.push_back(face);
    }

    pub fn remaining(&self) -> usize {
        self.faces.len()
    }
}

impl DiceRoller for ScriptedRoller {
    fn roll(&mut self, count: u32, sides: u32, bonus: i32) -> Result<Roll, RollError> {
        if sides == 0 {
            return Err(RollError::InvalidDieSize(sides));
        }
        if self.faces.len() < count as usize {
            return Err(RollError::Exhausted);
        }
        let results: Vec<u32> = self.faces.drain(..count as usize).collect();
        self.history.extend(&results);
        let total = results.iter().map(|r| *r as i32).sum::<i32>() + bonus;
        Ok(Roll { total, results })
    }
}

fn equip_all(character: &mut Character, items: &[&str]) {
    for name in items {
        if let Some(item) = find_equipment(name) {
            character.equip(item);
        }
    }
    character.refresh_armor_class();
}

/// Level 3 human fighter in chain mail with a longsword and shield.
pub fn sample_fighter() -> Character {
    let mut character = Character::new("Roland")
        .with_race(RaceType::Human)
        .with_class(CharacterClass::Fighter, 3)
        .with_ability_scores(AbilityScores::new(16, 12, 14, 10, 12, 8))
        .with_proficiencies(
            Proficiencies::default()
                .with_weapon_category(WeaponCategory::Simple)
                .with_weapon_category(WeaponCategory::Martial)
                .with_armor(ArmorCategory::Light)
                .with_armor(ArmorCategory::Medium)
                .with_armor(ArmorCategory::Heavy)
                .with_armor(ArmorCategory::Shield)
                .with_skill(Skill::Athletics),
        )
        .with_feature(Feature::fighting_style(FightingStyle::Dueling))
        .with_resources(
            ResourceLedger::new(28)
                .with_hit_dice(DieType::D10, 3)
                .with_ability(
                    TrackedAbility::new(
                        "Second Wind",
                        AbilityUses::limited(1),
                        RestRecovery::ShortRest,
                    )
                    .with_action_type(ActionType::BonusAction),
                ),
        );
    equip_all(&mut character, &["Chain Mail", "Longsword", "Shield"]);
    character
}

/// Level 5 monk with Martial Arts and Unarmored Defense, fighting unarmed.
pub fn sample_monk() -> Character {
    let mut character = Character::new("Mei")
        .with_race(RaceType::Human)
        .with_class(CharacterClass::Monk, 5)
        .with_ability_scores(AbilityScores::new(10, 16, 12, 10, 14, 8))
        .with_proficiencies(
            Proficiencies::default()
                .with_weapon_category(WeaponCategory::Simple)
                .with_weapon("Shortsword"),
        )
        .with_feature(Feature::unarmored_defense(UnarmoredDefense::Monk))
        .with_feature(Feature::MartialArts)
        .with_resources(
            ResourceLedger::new(33)
                .with_hit_dice(DieType::D8, 5)
                .with_ability(TrackedAbility::new(
                    "Ki",
                    AbilityUses::limited(5),
                    RestRecovery::ShortRest,
                )),
        );
    character.refresh_armor_class();
    character
}

/// Level 3 halfling rogue with a rapier and dagger.
pub fn sample_rogue() -> Character {
    let mut character = Character::new("Pip")
        .with_race(RaceType::Halfling)
        .with_class(CharacterClass::Rogue, 3)
        .with_ability_scores(AbilityScores::new(8, 17, 12, 13, 10, 14))
        .with_proficiencies(
            Proficiencies::default()
                .with_weapon_category(WeaponCategory::Simple)
                .with_weapon("Rapier")
                .with_weapon("Shortsword")
                .with_armor(ArmorCategory::Light)
                .with_skill(Skill::Stealth),
        )
        .with_feature(Feature::SneakAttack)
        .with_resources(ResourceLedger::new(21).with_hit_dice(DieType::D8, 3));
    equip_all(&mut character, &["Leather", "Dagger", "Rapier"]);
    character
}

/// Level 5 barbarian with a greataxe and two rages.
pub fn sample_barbarian() -> Character {
    let mut character = Character::new("Grok")
        .with_race(RaceType::HalfOrc)
        .with_class(CharacterClass::Barbarian, 5)
        .with_ability_scores(AbilityScores::new(18, 14, 16, 8, 10, 10))
        .with_proficiencies(
            Proficiencies::default()
                .with_weapon_category(WeaponCategory::Simple)
                .with_weapon_category(WeaponCategory::Martial),
        )
        .with_feature(Feature::Rage)
        .with_feature(Feature::unarmored_defense(UnarmoredDefense::Barbarian))
        .with_resources(
            ResourceLedger::new(55)
                .with_hit_dice(DieType::D12, 5)
                .with_ability(
                    TrackedAbility::new("Rage", AbilityUses::limited(2), RestRecovery::LongRest)
                        .with_action_type(ActionType::BonusAction)
                        .with_duration(10),
                ),
        );
    equip_all(&mut character, &["Greataxe"]);
    character
}

/// Level 3 warlock with two pact magic slots and one spellcasting slot.
pub fn sample_warlock() -> Character {
    let mut character = Character::new("Vex")
        .with_race(RaceType::Tiefling)
        .with_class(CharacterClass::Warlock, 3)
        .with_ability_scores(AbilityScores::new(8, 14, 14, 12, 10, 16))
        .with_resources(
            ResourceLedger::new(24)
                .with_hit_dice(DieType::D8, 3)
                .with_spell_slots(1, 1, SlotSource::Spellcasting)
                .with_spell_slots(2, 2, SlotSource::PactMagic),
        );
    character.refresh_armor_class();
    character
}

/// A goblin: 7 HP, AC 15, +4 to hit, 1d6+2 slashing.
pub fn sample_goblin(name: &str) -> Combatant {
    Combatant::monster(
        name,
        7,
        15,
        4,
        DiceFormula::new(1, DieType::D6).with_bonus(2),
        DamageType::Slashing,
    )
    .with_initiative_modifier(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_roller() {
        let mut roller = ScriptedRoller::new([3, 4, 5]);
        let roll = roller.roll(2, 6, 1).unwrap();
        assert_eq!(roll.results, vec![3, 4]);
        assert_eq!(roll.total, 8);
        assert_eq!(roller.remaining(), 1);
        assert_eq!(roller.roll(2, 6, 0), Err(RollError::Exhausted));
        assert_eq!(roller.history, vec![3, 4]);
    }

    #[test]
    fn test_sample_armor_classes() {
        // Chain mail 16 + shield 2
        assert_eq!(sample_fighter().armor_class, 18);
        // 10 + DEX 3 + WIS 2
        assert_eq!(sample_monk().armor_class, 15);
        // Leather 11 + DEX 3
        assert_eq!(sample_rogue().armor_class, 14);
        // 10 + DEX 2 + CON 3
        assert_eq!(sample_barbarian().armor_class, 15);
    }
}
