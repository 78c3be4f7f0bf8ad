//! The character aggregate: abilities, proficiencies, features, equipment
//! and resources.

use crate::dice::DieType;
use crate::items::{normalize_key, ArmorCategory, Equipment, Weapon, WeaponCategory};
use crate::resources::ResourceLedger;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

// ============================================================================
// ID Types
// ============================================================================

/// Unique identifier for characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CharacterId(pub Uuid);

impl CharacterId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CharacterId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Ability Scores
// ============================================================================

/// The six ability scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ability {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

impl Ability {
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Ability::Strength => "STR",
            Ability::Dexterity => "DEX",
            Ability::Constitution => "CON",
            Ability::Intelligence => "INT",
            Ability::Wisdom => "WIS",
            Ability::Charisma => "CHA",
        }
    }

    pub fn all() -> [Ability; 6] {
        [
            Ability::Strength,
            Ability::Dexterity,
            Ability::Constitution,
            Ability::Intelligence,
            Ability::Wisdom,
            Ability::Charisma,
        ]
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

/// Modifier for a raw ability score: `floor((score - 10) / 2)`.
pub fn ability_modifier(score: u8) -> i32 {
    (score as i32 - 10).div_euclid(2)
}

/// Ability scores container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores {
    pub strength: u8,
    pub dexterity: u8,
    pub constitution: u8,
    pub intelligence: u8,
    pub wisdom: u8,
    pub charisma: u8,
}

impl AbilityScores {
    pub fn new(str: u8, dex: u8, con: u8, int: u8, wis: u8, cha: u8) -> Self {
        Self {
            strength: str,
            dexterity: dex,
            constitution: con,
            intelligence: int,
            wisdom: wis,
            charisma: cha,
        }
    }

    pub fn standard_array() -> Self {
        Self::new(15, 14, 13, 12, 10, 8)
    }

    pub fn get(&self, ability: Ability) -> u8 {
        match ability {
            Ability::Strength => self.strength,
            Ability::Dexterity => self.dexterity,
            Ability::Constitution => self.constitution,
            Ability::Intelligence => self.intelligence,
            Ability::Wisdom => self.wisdom,
            Ability::Charisma => self.charisma,
        }
    }

    pub fn set(&mut self, ability: Ability, value: u8) {
        match ability {
            Ability::Strength => self.strength = value,
            Ability::Dexterity => self.dexterity = value,
            Ability::Constitution => self.constitution = value,
            Ability::Intelligence => self.intelligence = value,
            Ability::Wisdom => self.wisdom = value,
            Ability::Charisma => self.charisma = value,
        }
    }

    pub fn modifier(&self, ability: Ability) -> i32 {
        ability_modifier(self.get(ability))
    }
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self::new(10, 10, 10, 10, 10, 10)
    }
}

// ============================================================================
// Skills
// ============================================================================

/// D&D 5e skills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Skill {
    Athletics,
    Acrobatics,
    SleightOfHand,
    Stealth,
    Arcana,
    History,
    Investigation,
    Nature,
    Religion,
    AnimalHandling,
    Insight,
    Medicine,
    Perception,
    Survival,
    Deception,
    Intimidation,
    Performance,
    Persuasion,
}

impl Skill {
    pub fn ability(&self) -> Ability {
        match self {
            Skill::Athletics => Ability::Strength,
            Skill::Acrobatics | Skill::SleightOfHand | Skill::Stealth => Ability::Dexterity,
            Skill::Arcana
            | Skill::History
            | Skill::Investigation
            | Skill::Nature
            | Skill::Religion => Ability::Intelligence,
            Skill::AnimalHandling
            | Skill::Insight
            | Skill::Medicine
            | Skill::Perception
            | Skill::Survival => Ability::Wisdom,
            Skill::Deception | Skill::Intimidation | Skill::Performance | Skill::Persuasion => {
                Ability::Charisma
            }
        }
    }
}

// ============================================================================
// Classes and Races
// ============================================================================

/// D&D character classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CharacterClass {
    Barbarian,
    Bard,
    Cleric,
    Druid,
    Fighter,
    Monk,
    Paladin,
    Ranger,
    Rogue,
    Sorcerer,
    Warlock,
    Wizard,
}

impl CharacterClass {
    pub fn hit_die(&self) -> DieType {
        match self {
            CharacterClass::Barbarian => DieType::D12,
            CharacterClass::Fighter | CharacterClass::Paladin | CharacterClass::Ranger => {
                DieType::D10
            }
            CharacterClass::Bard
            | CharacterClass::Cleric
            | CharacterClass::Druid
            | CharacterClass::Monk
            | CharacterClass::Rogue
            | CharacterClass::Warlock => DieType::D8,
            CharacterClass::Sorcerer | CharacterClass::Wizard => DieType::D6,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CharacterClass::Barbarian => "Barbarian",
            CharacterClass::Bard => "Bard",
            CharacterClass::Cleric => "Cleric",
            CharacterClass::Druid => "Druid",
            CharacterClass::Fighter => "Fighter",
            CharacterClass::Monk => "Monk",
            CharacterClass::Paladin => "Paladin",
            CharacterClass::Ranger => "Ranger",
            CharacterClass::Rogue => "Rogue",
            CharacterClass::Sorcerer => "Sorcerer",
            CharacterClass::Warlock => "Warlock",
            CharacterClass::Wizard => "Wizard",
        }
    }
}

impl fmt::Display for CharacterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// D&D 5e playable races.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RaceType {
    Human,
    Elf,
    Dwarf,
    Halfling,
    HalfOrc,
    HalfElf,
    Tiefling,
    Gnome,
    Dragonborn,
}

impl RaceType {
    pub fn name(&self) -> &'static str {
        match self {
            RaceType::Human => "Human",
            RaceType::Elf => "Elf",
            RaceType::Dwarf => "Dwarf",
            RaceType::Halfling => "Halfling",
            RaceType::HalfOrc => "Half-Orc",
            RaceType::HalfElf => "Half-Elf",
            RaceType::Tiefling => "Tiefling",
            RaceType::Gnome => "Gnome",
            RaceType::Dragonborn => "Dragonborn",
        }
    }

    pub fn base_speed(&self) -> u32 {
        match self {
            RaceType::Dwarf | RaceType::Halfling | RaceType::Gnome => 25,
            _ => 30,
        }
    }
}

// ============================================================================
// Features
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FightingStyle {
    Archery,
    Defense,
    Dueling,
    GreatWeaponFighting,
    TwoWeaponFighting,
}

impl FightingStyle {
    /// Parse a style name as it appears in content data.
    pub fn parse(name: &str) -> Option<Self> {
        match normalize_key(name).as_str() {
            "archery" => Some(FightingStyle::Archery),
            "defense" | "defence" => Some(FightingStyle::Defense),
            "dueling" | "duelling" => Some(FightingStyle::Dueling),
            "great_weapon_fighting" | "great_weapon" => Some(FightingStyle::GreatWeaponFighting),
            "two_weapon_fighting" | "two_weapon" => Some(FightingStyle::TwoWeaponFighting),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnarmoredDefense {
    /// 10 + DEX + WIS
    Monk,
    /// 10 + DEX + CON
    Barbarian,
}

/// A granted race, class or background feature.
///
/// Features the engine has rules for get their own variant; everything else
/// loaded from content data is kept as [`Feature::Custom`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "feature", rename_all = "snake_case")]
pub enum Feature {
    FightingStyle { style: FightingStyle },
    UnarmoredDefense { variant: UnarmoredDefense },
    MartialArts,
    SneakAttack,
    Rage,
    Custom {
        key: String,
        #[serde(default)]
        metadata: HashMap<String, serde_json::Value>,
    },
}

impl Feature {
    /// Build a feature from its content key and free-form metadata.
    ///
    /// Recognized keys become typed variants; a fighting style or unarmored
    /// defense whose sub-choice is missing or unknown stays `Custom`.
    pub fn from_key(key: &str, metadata: HashMap<String, serde_json::Value>) -> Self {
        let normalized = normalize_key(key);
        let meta_str = |field: &str| metadata.get(field).and_then(|v| v.as_str());

        let typed = match normalized.as_str() {
            "fighting_style" => meta_str("style")
                .and_then(FightingStyle::parse)
                .map(|style| Feature::FightingStyle { style }),
            "unarmored_defense" => match meta_str("class").map(normalize_key).as_deref() {
                Some("monk") => Some(Feature::UnarmoredDefense {
                    variant: UnarmoredDefense::Monk,
                }),
                Some("barbarian") => Some(Feature::UnarmoredDefense {
                    variant: UnarmoredDefense::Barbarian,
                }),
                _ => None,
            },
            "unarmored_defense_monk" => Some(Feature::UnarmoredDefense {
                variant: UnarmoredDefense::Monk,
            }),
            "unarmored_defense_barbarian" => Some(Feature::UnarmoredDefense {
                variant: UnarmoredDefense::Barbarian,
            }),
            "martial_arts" => Some(Feature::MartialArts),
            "sneak_attack" => Some(Feature::SneakAttack),
            "rage" => Some(Feature::Rage),
            _ => None,
        };

        typed.unwrap_or(Feature::Custom {
            key: normalized,
            metadata,
        })
    }

    pub fn fighting_style(style: FightingStyle) -> Self {
        Feature::FightingStyle { style }
    }

    pub fn unarmored_defense(variant: UnarmoredDefense) -> Self {
        Feature::UnarmoredDefense { variant }
    }

    pub fn key(&self) -> &str {
        match self {
            Feature::FightingStyle { .. } => "fighting_style",
            Feature::UnarmoredDefense { .. } => "unarmored_defense",
            Feature::MartialArts => "martial_arts",
            Feature::SneakAttack => "sneak_attack",
            Feature::Rage => "rage",
            Feature::Custom { key, .. } => key,
        }
    }
}

// ============================================================================
// Proficiencies
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proficiencies {
    /// Normalized weapon keys.
    pub weapons: HashSet<String>,
    pub weapon_categories: HashSet<WeaponCategory>,
    pub armor: HashSet<ArmorCategory>,
    pub saving_throws: HashSet<Ability>,
    pub skills: HashSet<Skill>,
}

impl Proficiencies {
    pub fn with_weapon(mut self, name: &str) -> Self {
        self.weapons.insert(normalize_key(name));
        self
    }

    pub fn with_weapon_category(mut self, category: WeaponCategory) -> Self {
        self.weapon_categories.insert(category);
        self
    }

    pub fn with_armor(mut self, category: ArmorCategory) -> Self {
        self.armor.insert(category);
        self
    }

    pub fn with_saving_throw(mut self, ability: Ability) -> Self {
        self.saving_throws.insert(ability);
        self
    }

    pub fn with_skill(mut self, skill: Skill) -> Self {
        self.skills.insert(skill);
        self
    }

    pub fn is_proficient_with(&self, weapon: &Weapon) -> bool {
        self.weapon_categories.contains(&weapon.category)
            || self.weapons.contains(&weapon.key)
            || self.weapons.contains(&normalize_key(&weapon.name))
    }
}

// ============================================================================
// Equipment Slots
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquipSlot {
    MainHand,
    OffHand,
    TwoHanded,
    Body,
}

/// What a character is actively wielding and wearing.
///
/// `two_handed` is never occupied at the same time as either hand slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquippedSlots {
    pub main_hand: Option<Equipment>,
    pub off_hand: Option<Equipment>,
    pub two_handed: Option<Equipment>,
    pub body: Option<Equipment>,
}

impl EquippedSlots {
    pub fn get(&self, slot: EquipSlot) -> Option<&Equipment> {
        match slot {
            EquipSlot::MainHand => self.main_hand.as_ref(),
            EquipSlot::OffHand => self.off_hand.as_ref(),
            EquipSlot::TwoHanded => self.two_handed.as_ref(),
            EquipSlot::Body => self.body.as_ref(),
        }
    }

    fn slot_mut(&mut self, slot: EquipSlot) -> &mut Option<Equipment> {
        match slot {
            EquipSlot::MainHand => &mut self.main_hand,
            EquipSlot::OffHand => &mut self.off_hand,
            EquipSlot::TwoHanded => &mut self.two_handed,
            EquipSlot::Body => &mut self.body,
        }
    }

    /// Every occupied slot.
    pub fn iter(&self) -> impl Iterator<Item = (EquipSlot, &Equipment)> {
        [
            (EquipSlot::MainHand, self.main_hand.as_ref()),
            (EquipSlot::OffHand, self.off_hand.as_ref()),
            (EquipSlot::TwoHanded, self.two_handed.as_ref()),
            (EquipSlot::Body, self.body.as_ref()),
        ]
        .into_iter()
        .filter_map(|(slot, item)| item.map(|i| (slot, i)))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EquipError {
    #[error("{0} is not in the inventory")]
    NotInInventory(String),
}

// ============================================================================
// Character
// ============================================================================

/// A player character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    pub level: u8,
    pub class: Option<CharacterClass>,
    pub race: Option<RaceType>,

    /// `None` for characters whose scores were never rolled; every modifier
    /// then reads as 0.
    pub ability_scores: Option<AbilityScores>,
    pub proficiencies: Proficiencies,
    pub features: Vec<Feature>,

    pub equipment: EquippedSlots,
    pub inventory: Vec<Equipment>,

    pub resources: ResourceLedger,
    /// Last computed armor class; refresh after equipment or effects change.
    pub armor_class: i32,
}

impl Character {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: CharacterId::new(),
            name: name.into(),
            level: 1,
            class: None,
            race: None,
            ability_scores: Some(AbilityScores::default()),
            proficiencies: Proficiencies::default(),
            features: Vec::new(),
            equipment: EquippedSlots::default(),
            inventory: Vec::new(),
            resources: ResourceLedger::new(10),
            armor_class: 10,
        }
    }

    pub fn with_class(mut self, class: CharacterClass, level: u8) -> Self {
        self.class = Some(class);
        self.level = level.clamp(1, 20);
        self
    }

    pub fn with_race(mut self, race: RaceType) -> Self {
        self.race = Some(race);
        self
    }

    pub fn with_ability_scores(mut self, scores: AbilityScores) -> Self {
        self.ability_scores = Some(scores);
        self
    }

    pub fn with_proficiencies(mut self, proficiencies: Proficiencies) -> Self {
        self.proficiencies = proficiencies;
        self
    }

    pub fn with_feature(mut self, feature: Feature) -> Self {
        self.features.push(feature);
        self
    }

    pub fn with_resources(mut self, resources: ResourceLedger) -> Self {
        self.resources = resources;
        self
    }

    /// `2 + floor((level - 1) / 4)`.
    pub fn proficiency_bonus(&self) -> i32 {
        2 + (self.level.max(1) as i32 - 1) / 4
    }

    pub fn ability_modifier(&self, ability: Ability) -> i32 {
        self.ability_scores
            .as_ref()
            .map_or(0, |scores| scores.modifier(ability))
    }

    pub fn saving_throw_modifier(&self, ability: Ability) -> i32 {
        let ability_mod = self.ability_modifier(ability);
        if self.proficiencies.saving_throws.contains(&ability) {
            ability_mod + self.proficiency_bonus()
        } else {
            ability_mod
        }
    }

    pub fn skill_modifier(&self, skill: Skill) -> i32 {
        let ability_mod = self.ability_modifier(skill.ability());
        if self.proficiencies.skills.contains(&skill) {
            ability_mod + self.proficiency_bonus()
        } else {
            ability_mod
        }
    }

    pub fn has_feature(&self, feature: &Feature) -> bool {
        self.features.contains(feature)
    }

    pub fn has_martial_arts(&self) -> bool {
        self.has_feature(&Feature::MartialArts)
    }

    /// The character's fighting style. Styles are exclusive; the first one
    /// granted wins.
    pub fn fighting_style(&self) -> Option<FightingStyle> {
        self.features.iter().find_map(|f| match f {
            Feature::FightingStyle { style } => Some(*style),
            _ => None,
        })
    }

    pub fn unarmored_defense(&self) -> Option<UnarmoredDefense> {
        self.features.iter().find_map(|f| match f {
            Feature::UnarmoredDefense { variant } => Some(*variant),
            _ => None,
        })
    }

    /// Start of this character's turn in combat.
    pub fn start_new_turn(&mut self) {
        self.resources.start_new_turn();
        self.armor_class = crate::armor_class::calculate_ac(Some(self));
    }

    pub fn is_conscious(&self) -> bool {
        !self.resources.is_unconscious()
    }

    // ------------------------------------------------------------------
    // Equipment
    // ------------------------------------------------------------------

    fn stash(&mut self, item: Option<Equipment>) {
        if let Some(item) = item {
            self.inventory.push(item);
        }
    }

    /// Equip an item, moving displaced items to the inventory.
    ///
    /// Two-handed weapons clear both hands. A shield goes to the off hand.
    /// Body armor goes to the body slot. Any other item goes to the main
    /// hand, demoting the current main-hand item to the off hand.
    pub fn equip(&mut self, item: Equipment) -> EquipSlot {
        let slot = match &item {
            Equipment::Weapon(w) if w.is_two_handed() => {
                let main = self.equipment.main_hand.take();
                let off = self.equipment.off_hand.take();
                let previous = self.equipment.two_handed.replace(item);
                self.stash(main);
                self.stash(off);
                self.stash(previous);
                EquipSlot::TwoHanded
            }
            Equipment::Armor(a) if a.is_shield() => {
                let two_handed = self.equipment.two_handed.take();
                let previous = self.equipment.off_hand.replace(item);
                self.stash(two_handed);
                self.stash(previous);
                EquipSlot::OffHand
            }
            Equipment::Armor(_) => {
                let previous = self.equipment.body.replace(item);
                self.stash(previous);
                EquipSlot::Body
            }
            Equipment::Weapon(_) | Equipment::Basic(_) => {
                let two_handed = self.equipment.two_handed.take();
                self.stash(two_handed);
                if let Some(previous_main) = self.equipment.main_hand.take() {
                    let previous_off = self.equipment.off_hand.replace(previous_main);
                    self.stash(previous_off);
                }
                self.equipment.main_hand = Some(item);
                EquipSlot::MainHand
            }
        };
        debug!(character = %self.name, ?slot, "item equipped");
        slot
    }

    /// Equip an item taken from the inventory by name or key.
    pub fn equip_from_inventory(&mut self, name: &str) -> Result<EquipSlot, EquipError> {
        let index = self
            .inventory
            .iter()
            .position(|i| i.matches(name))
            .ok_or_else(|| EquipError::NotInInventory(name.to_string()))?;
        let item = self.inventory.remove(index);
        Ok(self.equip(item))
    }

    /// Move whatever is in `slot` back to the inventory.
    pub fn unequip(&mut self, slot: EquipSlot) -> bool {
        match self.equipment.slot_mut(slot).take() {
            Some(item) => {
                self.inventory.push(item);
                true
            }
            None => false,
        }
    }

    /// Recompute and store the armor class.
    pub fn refresh_armor_class(&mut self) -> i32 {
        self.armor_class = crate::armor_class::calculate_ac(Some(self));
        self.armor_class
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::{get_armor, get_weapon, BasicItem};

    fn weapon(name: &str) -> Equipment {
        Equipment::Weapon(get_weapon(name).unwrap())
    }

    #[test]
    fn test_ability_modifier_table() {
        assert_eq!(ability_modifier(1), -5);
        assert_eq!(ability_modifier(8), -1);
        assert_eq!(ability_modifier(9), -1);
        assert_eq!(ability_modifier(10), 0);
        assert_eq!(ability_modifier(11), 0);
        assert_eq!(ability_modifier(15), 2);
        assert_eq!(ability_modifier(20), 5);
    }

    #[test]
    fn test_missing_ability_scores_default_to_zero() {
        let mut character = Character::new("Blank");
        character.ability_scores = None;
        for ability in Ability::all() {
            assert_eq!(character.ability_modifier(ability), 0);
        }
    }

    #[test]
    fn test_proficiency_bonus() {
        let mut character = Character::new("Test");
        let expected = [(1, 2), (4, 2), (5, 3), (8, 3), (9, 4), (13, 5), (17, 6), (20, 6)];
        for (level, bonus) in expected {
            character.level = level;
            assert_eq!(character.proficiency_bonus(), bonus, "level {level}");
        }
    }

    #[test]
    fn test_saving_throw_and_skill_modifiers() {
        let character = Character::new("Test")
            .with_ability_scores(AbilityScores::new(16, 14, 12, 10, 8, 6))
            .with_proficiencies(
                Proficiencies::default()
                    .with_saving_throw(Ability::Strength)
                    .with_skill(Skill::Stealth),
            );
        assert_eq!(character.saving_throw_modifier(Ability::Strength), 5);
        assert_eq!(character.saving_throw_modifier(Ability::Wisdom), -1);
        assert_eq!(character.skill_modifier(Skill::Stealth), 4);
        assert_eq!(character.skill_modifier(Skill::Athletics), 3);
    }

    #[test]
    fn test_two_handed_clears_both_hands() {
        let mut character = Character::new("Test");
        character.equip(weapon("Longsword"));
        character.equip(Equipment::Armor(get_armor("Shield").unwrap()));
        assert!(character.equipment.main_hand.is_some());
        assert!(character.equipment.off_hand.is_some());

        assert_eq!(character.equip(weapon("Greatsword")), EquipSlot::TwoHanded);
        assert!(character.equipment.main_hand.is_none());
        assert!(character.equipment.off_hand.is_none());
        assert_eq!(character.inventory.len(), 2);
    }

    #[test]
    fn test_main_hand_demotes_to_off_hand() {
        let mut character = Character::new("Test");
        character.equip(weapon("Dagger"));
        character.equip(weapon("Shortsword"));

        assert_eq!(
            character.equipment.main_hand.as_ref().map(|i| i.name()),
            Some("Shortsword")
        );
        assert_eq!(
            character.equipment.off_hand.as_ref().map(|i| i.name()),
            Some("Dagger")
        );

        character.equip(weapon("Scimitar"));
        assert_eq!(
            character.equipment.off_hand.as_ref().map(|i| i.name()),
            Some("Shortsword")
        );
        assert_eq!(character.inventory.len(), 1);
    }

    #[test]
    fn test_one_handed_item_clears_two_handed_slot() {
        let mut character = Character::new("Test");
        character.equip(weapon("Maul"));
        character.equip(Equipment::Basic(BasicItem::new("Torch")));
        assert!(character.equipment.two_handed.is_none());
        assert_eq!(character.inventory.len(), 1);
    }

    #[test]
    fn test_shield_displaces_two_handed_weapon() {
        let mut character = Character::new("Test");
        character.equip(weapon("Greataxe"));
        assert_eq!(
            character.equip(Equipment::Armor(get_armor("Shield").unwrap())),
            EquipSlot::OffHand
        );
        assert!(character.equipment.two_handed.is_none());
    }

    #[test]
    fn test_equip_from_inventory_and_unequip() {
        let mut character = Character::new("Test");
        character.inventory.push(Equipment::Armor(get_armor("Chain Mail").unwrap()));

        assert_eq!(character.equip_from_inventory("chain mail"), Ok(EquipSlot::Body));
        assert!(character.inventory.is_empty());
        assert_eq!(
            character.equip_from_inventory("Plate"),
            Err(EquipError::NotInInventory("Plate".to_string()))
        );

        assert!(character.unequip(EquipSlot::Body));
        assert!(!character.unequip(EquipSlot::Body));
        assert_eq!(character.inventory.len(), 1);
    }

    #[test]
    fn test_feature_from_key() {
        let mut metadata = HashMap::new();
        metadata.insert("style".to_string(), serde_json::json!("Great Weapon Fighting"));
        assert_eq!(
            Feature::from_key("fighting-style", metadata),
            Feature::fighting_style(FightingStyle::GreatWeaponFighting)
        );

        let mut metadata = HashMap::new();
        metadata.insert("class".to_string(), serde_json::json!("Monk"));
        assert_eq!(
            Feature::from_key("Unarmored Defense", metadata),
            Feature::unarmored_defense(UnarmoredDefense::Monk)
        );

        assert_eq!(
            Feature::from_key("martial_arts", HashMap::new()),
            Feature::MartialArts
        );

        let custom = Feature::from_key("darkvision", HashMap::new());
        assert_eq!(custom.key(), "darkvision");
        assert!(matches!(custom, Feature::Custom { .. }));

        let mut metadata = HashMap::new();
        metadata.insert("style".to_string(), serde_json::json!("blind fighting"));
        assert!(matches!(
            Feature::from_key("fighting_style", metadata),
            Feature::Custom { .. }
        ));
    }

    #[test]
    fn test_fighting_style_lookup() {
        let character = Character::new("Test")
            .with_feature(Feature::Rage)
            .with_feature(Feature::fighting_style(FightingStyle::Dueling));
        assert_eq!(character.fighting_style(), Some(FightingStyle::Dueling));
        assert_eq!(Character::new("None").fighting_style(), None);
    }

    #[test]
    fn test_weapon_proficiency() {
        let proficiencies = Proficiencies::default()
            .with_weapon_category(WeaponCategory::Simple)
            .with_weapon("Longsword");
        assert!(proficiencies.is_proficient_with(&get_weapon("Dagger").unwrap()));
        assert!(proficiencies.is_proficient_with(&get_weapon("Longsword").unwrap()));
        assert!(!proficiencies.is_proficient_with(&get_weapon("Rapier").unwrap()));
    }
}
