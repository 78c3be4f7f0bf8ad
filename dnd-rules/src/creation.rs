//! Character creation draft.
//!
//! A [`CreationDraft`] collects choices step by step. Steps have
//! prerequisites, and undoing an early choice invalidates the later steps
//! that were derived from it.

use crate::character::{
    Ability, AbilityScores, Character, CharacterClass, Feature, FightingStyle, Proficiencies,
    RaceType, Skill, UnarmoredDefense,
};
use crate::items::{find_equipment, ArmorCategory, WeaponCategory};
use crate::resources::{AbilityUses, ActionType, ResourceLedger, RestRecovery, TrackedAbility};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::debug;

/// Standard array values.
pub const STANDARD_ARRAY: [u8; 6] = [15, 14, 13, 12, 10, 8];

/// Total points available for point buy.
pub const POINT_BUY_TOTAL: u8 = 27;

/// Point buy cost of a single score.
pub fn point_buy_cost(score: u8) -> Option<u8> {
    match score {
        8 => Some(0),
        9 => Some(1),
        10 => Some(2),
        11 => Some(3),
        12 => Some(4),
        13 => Some(5),
        14 => Some(7),
        15 => Some(9),
        _ => None,
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CreationError {
    #[error("Invalid creation state: {0}")]
    InvalidState(String),

    #[error("Step not completed: {0:?}")]
    MissingStep(CreationStep),

    #[error("Invalid choice: {0}")]
    InvalidChoice(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CreationStep {
    Race,
    Class,
    AbilityScores,
    Background,
    Skills,
    Equipment,
    Name,
}

impl CreationStep {
    pub fn all() -> [CreationStep; 7] {
        [
            CreationStep::Race,
            CreationStep::Class,
            CreationStep::AbilityScores,
            CreationStep::Background,
            CreationStep::Skills,
            CreationStep::Equipment,
            CreationStep::Name,
        ]
    }

    /// Steps that must be complete first.
    pub fn prerequisites(&self) -> &'static [CreationStep] {
        match self {
            CreationStep::AbilityScores => &[CreationStep::Race, CreationStep::Class],
            CreationStep::Skills => &[CreationStep::Race, CreationStep::Class],
            CreationStep::Equipment => &[CreationStep::Class],
            CreationStep::Race
            | CreationStep::Class
            | CreationStep::Background
            | CreationStep::Name => &[],
        }
    }

    /// Steps whose choices depend on this one.
    pub fn invalidates(&self) -> &'static [CreationStep] {
        match self {
            CreationStep::Race => &[CreationStep::AbilityScores, CreationStep::Skills],
            CreationStep::Class => &[
                CreationStep::Skills,
                CreationStep::Equipment,
                CreationStep::AbilityScores,
            ],
            _ => &[],
        }
    }
}

/// In-progress character.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreationDraft {
    completed: BTreeSet<CreationStep>,
    pub name: Option<String>,
    pub race: Option<RaceType>,
    pub class: Option<CharacterClass>,
    pub background: Option<String>,
    pub ability_scores: Option<AbilityScores>,
    pub skills: Vec<Skill>,
    pub equipment: Vec<String>,
    pub fighting_style: Option<FightingStyle>,
}

impl CreationDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_complete(&self, step: CreationStep) -> bool {
        self.completed.contains(&step)
    }

    pub fn completed_steps(&self) -> impl Iterator<Item = CreationStep> + '_ {
        self.completed.iter().copied()
    }

    /// The first step that is not yet complete.
    pub fn next_step(&self) -> Option<CreationStep> {
        CreationStep::all()
            .into_iter()
            .find(|step| !self.is_complete(*step))
    }

    /// Mark a step complete. Its prerequisites must already be complete.
    pub fn complete(&mut self, step: CreationStep) -> Result<(), CreationError> {
        if let Some(missing) = step
            .prerequisites()
            .iter()
            .find(|prereq| !self.is_complete(**prereq))
        {
            return Err(CreationError::InvalidState(format!(
                "{step:?} requires {missing:?}"
            )));
        }
        self.completed.insert(step);
        debug!(?step, "creation step completed");
        Ok(())
    }

    /// Undo a completed step and every step derived from it.
    pub fn reset(&mut self, step: CreationStep) -> Result<(), CreationError> {
        if !self.completed.remove(&step) {
            return Err(CreationError::InvalidState(format!(
                "{step:?} is not complete"
            )));
        }
        for dependent in step.invalidates() {
            self.completed.remove(dependent);
        }
        debug!(?step, "creation step reset");
        Ok(())
    }

    fn replace(&mut self, step: CreationStep) -> Result<(), CreationError> {
        if self.is_complete(step) {
            self.reset(step)?;
        }
        self.complete(step)
    }

    // ------------------------------------------------------------------
    // Choices
    // ------------------------------------------------------------------

    pub fn choose_race(&mut self, race: RaceType) -> Result<(), CreationError> {
        self.replace(CreationStep::Race)?;
        self.race = Some(race);
        Ok(())
    }

    pub fn choose_class(&mut self, class: CharacterClass) -> Result<(), CreationError> {
        self.replace(CreationStep::Class)?;
        self.class = Some(class);
        if class != CharacterClass::Fighter {
            self.fighting_style = None;
        }
        Ok(())
    }

    pub fn choose_fighting_style(&mut self, style: FightingStyle) -> Result<(), CreationError> {
        if self.class != Some(CharacterClass::Fighter) {
            return Err(CreationError::InvalidChoice(
                "only fighters choose a fighting style at first level".to_string(),
            ));
        }
        self.fighting_style = Some(style);
        Ok(())
    }

    /// Ability scores assigned by point buy. Every score must be 8-15 and
    /// the total cost exactly 27.
    pub fn point_buy(&mut self, scores: AbilityScores) -> Result<(), CreationError> {
        let mut total = 0u8;
        for ability in Ability::all() {
            let score = scores.get(ability);
            let cost = point_buy_cost(score).ok_or_else(|| {
                CreationError::InvalidChoice(format!("{ability} {score} is outside 8-15"))
            })?;
            total += cost;
        }
        if total != POINT_BUY_TOTAL {
            return Err(CreationError::InvalidChoice(format!(
                "point buy spent {total} of {POINT_BUY_TOTAL} points"
            )));
        }
        self.set_ability_scores(scores)
    }

    /// Assign scores directly (standard array or rolled).
    pub fn set_ability_scores(&mut self, scores: AbilityScores) -> Result<(), CreationError> {
        self.replace(CreationStep::AbilityScores)?;
        self.ability_scores = Some(scores);
        Ok(())
    }

    pub fn choose_background(&mut self, background: impl Into<String>) -> Result<(), CreationError> {
        self.replace(CreationStep::Background)?;
        self.background = Some(background.into());
        Ok(())
    }

    pub fn choose_skills(&mut self, skills: Vec<Skill>) -> Result<(), CreationError> {
        self.replace(CreationStep::Skills)?;
        self.skills = skills;
        Ok(())
    }

    pub fn choose_equipment(&mut self, items: Vec<String>) -> Result<(), CreationError> {
        if let Some(unknown) = items.iter().find(|i| find_equipment(i).is_none()) {
            return Err(CreationError::InvalidChoice(format!("unknown item {unknown}")));
        }
        self.replace(CreationStep::Equipment)?;
        self.equipment = items;
        Ok(())
    }

    pub fn choose_name(&mut self, name: impl Into<String>) -> Result<(), CreationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CreationError::InvalidChoice("name is empty".to_string()));
        }
        self.replace(CreationStep::Name)?;
        self.name = Some(name);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Build
    // ------------------------------------------------------------------

    /// Turn a finished draft into a level 1 character.
    pub fn build(&self) -> Result<Character, CreationError> {
        if let Some(missing) = self.next_step() {
            return Err(CreationError::MissingStep(missing));
        }
        let (Some(name), Some(race), Some(class), Some(scores)) = (
            self.name.as_ref(),
            self.race,
            self.class,
            self.ability_scores.as_ref(),
        ) else {
            return Err(CreationError::InvalidState(
                "completed draft is missing a choice".to_string(),
            ));
        };

        let mut proficiencies = class_proficiencies(class);
        for skill in &self.skills {
            proficiencies.skills.insert(*skill);
        }

        let hit_die = class.hit_die();
        let con_mod = scores.modifier(Ability::Constitution);
        let max_hp = (hit_die.sides() as i32 + con_mod).max(1);
        let mut resources = ResourceLedger::new(max_hp).with_hit_dice(hit_die, 1);
        if class == CharacterClass::Barbarian {
            resources.add_ability(
                TrackedAbility::new("Rage", AbilityUses::limited(2), RestRecovery::LongRest)
                    .with_action_type(ActionType::BonusAction)
                    .with_duration(10),
            );
        }

        let mut character = Character::new(name.clone())
            .with_race(race)
            .with_class(class, 1)
            .with_ability_scores(scores.clone())
            .with_proficiencies(proficiencies)
            .with_resources(resources);
        for feature in class_features(class, self.fighting_style) {
            character.features.push(feature);
        }
        for item in self.equipment.iter().filter_map(|i| find_equipment(i)) {
            character.equip(item);
        }
        character.refresh_armor_class();

        debug!(name = %character.name, class = %class, "character created");
        Ok(character)
    }
}

fn class_proficiencies(class: CharacterClass) -> Proficiencies {
    use CharacterClass::*;
    let base = Proficiencies::default().with_weapon_category(WeaponCategory::Simple);
    let base = match class {
        Barbarian | Fighter | Paladin | Ranger => base
            .with_weapon_category(WeaponCategory::Martial)
            .with_armor(ArmorCategory::Light)
            .with_armor(ArmorCategory::Medium)
            .with_armor(ArmorCategory::Shield),
        Rogue | Bard => base
            .with_weapon("hand_crossbow")
            .with_weapon("longsword")
            .with_weapon("rapier")
            .with_weapon("shortsword")
            .with_armor(ArmorCategory::Light),
        Monk => base.with_weapon("shortsword"),
        Cleric | Druid => base
            .with_armor(ArmorCategory::Light)
            .with_armor(ArmorCategory::Medium)
            .with_armor(ArmorCategory::Shield),
        Warlock => base.with_armor(ArmorCategory::Light),
        Sorcerer | Wizard => base,
    };
    let base = match class {
        Fighter | Paladin => base.with_armor(ArmorCategory::Heavy),
        _ => base,
    };
    let (first, second) = match class {
        Barbarian | Fighter => (Ability::Strength, Ability::Constitution),
        Bard => (Ability::Dexterity, Ability::Charisma),
        Cleric | Paladin | Warlock => (Ability::Wisdom, Ability::Charisma),
        Druid | Wizard => (Ability::Intelligence, Ability::Wisdom),
        Monk | Ranger => (Ability::Strength, Ability::Dexterity),
        Rogue => (Ability::Dexterity, Ability::Intelligence),
        Sorcerer => (Ability::Constitution, Ability::Charisma),
    };
    base.with_saving_throw(first).with_saving_throw(second)
}

fn class_features(class: CharacterClass, style: Option<FightingStyle>) -> Vec<Feature> {
    match class {
        CharacterClass::Barbarian => vec![
            Feature::Rage,
            Feature::unarmored_defense(UnarmoredDefense::Barbarian),
        ],
        CharacterClass::Monk => vec![
            Feature::unarmored_defense(UnarmoredDefense::Monk),
            Feature::MartialArts,
        ],
        CharacterClass::Rogue => vec![Feature::SneakAttack],
        CharacterClass::Fighter => style.map(Feature::fighting_style).into_iter().collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finished_draft() -> CreationDraft {
        let mut draft = CreationDraft::new();
        draft.choose_race(RaceType::Human).unwrap();
        draft.choose_class(CharacterClass::Fighter).unwrap();
        draft.choose_fighting_style(FightingStyle::Defense).unwrap();
        draft
            .set_ability_scores(AbilityScores::new(15, 14, 13, 12, 10, 8))
            .unwrap();
        draft.choose_background("Soldier").unwrap();
        draft
            .choose_skills(vec![Skill::Athletics, Skill::Perception])
            .unwrap();
        draft
            .choose_equipment(vec!["Chain Mail".to_string(), "Longsword".to_string()])
            .unwrap();
        draft.choose_name("Roland").unwrap();
        draft
    }

    #[test]
    fn test_prerequisites_enforced() {
        let mut draft = CreationDraft::new();
        assert!(matches!(
            draft.complete(CreationStep::AbilityScores),
            Err(CreationError::InvalidState(_))
        ));
        draft.complete(CreationStep::Race).unwrap();
        assert!(draft.complete(CreationStep::Skills).is_err());
        draft.complete(CreationStep::Class).unwrap();
        assert!(draft.complete(CreationStep::Skills).is_ok());
    }

    #[test]
    fn test_reset_requires_completed_step() {
        let mut draft = CreationDraft::new();
        assert!(matches!(
            draft.reset(CreationStep::Name),
            Err(CreationError::InvalidState(_))
        ));
    }

    #[test]
    fn test_reset_race_invalidates_dependents() {
        let mut draft = finished_draft();
        draft.reset(CreationStep::Race).unwrap();
        assert!(!draft.is_complete(CreationStep::Race));
        assert!(!draft.is_complete(CreationStep::AbilityScores));
        assert!(!draft.is_complete(CreationStep::Skills));
        assert!(draft.is_complete(CreationStep::Class));
        assert!(draft.is_complete(CreationStep::Equipment));
        assert_eq!(draft.next_step(), Some(CreationStep::Race));
    }

    #[test]
    fn test_changing_class_invalidates_dependents() {
        let mut draft = finished_draft();
        draft.choose_class(CharacterClass::Wizard).unwrap();
        assert!(draft.is_complete(CreationStep::Class));
        assert!(!draft.is_complete(CreationStep::Equipment));
        assert!(!draft.is_complete(CreationStep::Skills));
        assert!(!draft.is_complete(CreationStep::AbilityScores));
        assert!(draft.fighting_style.is_none());
        assert_eq!(draft.build(), Err(CreationError::MissingStep(CreationStep::AbilityScores)));
    }

    #[test]
    fn test_point_buy() {
        let mut draft = CreationDraft::new();
        draft.choose_race(RaceType::Elf).unwrap();
        draft.choose_class(CharacterClass::Rogue).unwrap();
        assert!(draft
            .point_buy(AbilityScores::new(15, 15, 15, 8, 8, 8))
            .is_ok());
        assert!(matches!(
            draft.point_buy(AbilityScores::new(16, 15, 15, 8, 8, 8)),
            Err(CreationError::InvalidChoice(_))
        ));
        assert!(matches!(
            draft.point_buy(AbilityScores::default()),
            Err(CreationError::InvalidChoice(_))
        ));
    }

    #[test]
    fn test_unknown_equipment_rejected() {
        let mut draft = CreationDraft::new();
        draft.choose_class(CharacterClass::Fighter).unwrap();
        assert!(matches!(
            draft.choose_equipment(vec!["Vorpal Spoon".to_string()]),
            Err(CreationError::InvalidChoice(_))
        ));
        assert!(!draft.is_complete(CreationStep::Equipment));
    }

    #[test]
    fn test_build_fighter() {
        let character = finished_draft().build().unwrap();
        assert_eq!(character.name, "Roland");
        assert_eq!(character.level, 1);
        assert_eq!(character.resources.hit_points.maximum, 11);
        assert_eq!(character.fighting_style(), Some(FightingStyle::Defense));
        assert!(character.proficiencies.skills.contains(&Skill::Athletics));
        assert!(character.equipment.body.is_some());
        assert!(character.equipment.main_hand.is_some());
        // Chain mail 16 + Defense 1
        assert_eq!(character.armor_class, 17);
    }

    #[test]
    fn test_build_incomplete() {
        let mut draft = finished_draft();
        draft.reset(CreationStep::Name).unwrap();
        assert_eq!(draft.build(), Err(CreationError::MissingStep(CreationStep::Name)));
    }

    #[test]
    fn test_build_barbarian_gets_rage() {
        let mut draft = finished_draft();
        draft.choose_class(CharacterClass::Barbarian).unwrap();
        draft
            .set_ability_scores(AbilityScores::new(15, 14, 13, 12, 10, 8))
            .unwrap();
        draft.choose_skills(vec![Skill::Survival]).unwrap();
        draft.choose_equipment(vec!["Greataxe".to_string()]).unwrap();
        let barbarian = draft.build().unwrap();

        assert!(barbarian.has_feature(&Feature::Rage));
        assert!(barbarian.resources.ability("rage").is_some());
        // 10 + DEX 2 + CON 1
        assert_eq!(barbarian.armor_class, 13);
        assert_eq!(barbarian.resources.hit_points.maximum, 13);
    }
}
