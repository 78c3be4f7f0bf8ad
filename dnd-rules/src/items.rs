//! Equipment types and the standard D&D 5e weapon and armor catalogue.
//!
//! Catalogue entries are looked up case-insensitively by name or key, so
//! content data can refer to "Chain Mail", "chain mail" or "chain-mail".

use crate::dice::{DiceFormula, DieType};
use crate::effects::DamageType;
use serde::{Deserialize, Serialize};

/// Normalize an item name or key for lookups: lowercase, with spaces,
/// dashes and apostrophes folded to underscores.
pub fn normalize_key(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            ' ' | '-' | '\'' => '_',
            c => c,
        })
        .collect()
}

// ============================================================================
// Weapons
// ============================================================================

/// Weapon training category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponCategory {
    Simple,
    Martial,
}

/// Melee or ranged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeaponRange {
    Melee,
    Ranged { normal: u32, long: u32 },
}

/// Weapon properties per D&D 5e.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeaponProperty {
    Finesse,
    Light,
    Heavy,
    TwoHanded,
    Versatile(DieType),
    Thrown { normal: u32, long: u32 },
    Ammunition,
    Loading,
    Reach,
}

/// Damage dealt by a weapon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageFormula {
    pub dice: DiceFormula,
    pub damage_type: DamageType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weapon {
    pub key: String,
    pub name: String,
    pub damage: DamageFormula,
    pub range: WeaponRange,
    pub category: WeaponCategory,
    pub properties: Vec<WeaponProperty>,
}

impl Weapon {
    pub fn new(
        name: impl Into<String>,
        dice: DiceFormula,
        damage_type: DamageType,
        category: WeaponCategory,
    ) -> Self {
        let name = name.into();
        Self {
            key: normalize_key(&name),
            name,
            damage: DamageFormula { dice, damage_type },
            range: WeaponRange::Melee,
            category,
            properties: Vec::new(),
        }
    }

    pub fn with_properties(mut self, properties: Vec<WeaponProperty>) -> Self {
        self.properties = properties;
        self
    }

    pub fn ranged(mut self, normal: u32, long: u32) -> Self {
        self.range = WeaponRange::Ranged { normal, long };
        self
    }

    /// Flat magic bonus added to damage (not doubled on a critical hit).
    pub fn with_damage_bonus(mut self, bonus: i32) -> Self {
        self.damage.dice.bonus = bonus;
        self
    }

    pub fn has_property(&self, property: WeaponProperty) -> bool {
        self.properties.contains(&property)
    }

    pub fn is_finesse(&self) -> bool {
        self.has_property(WeaponProperty::Finesse)
    }

    pub fn is_ranged(&self) -> bool {
        matches!(self.range, WeaponRange::Ranged { .. })
    }

    pub fn is_two_handed(&self) -> bool {
        self.has_property(WeaponProperty::TwoHanded)
    }

    pub fn is_heavy(&self) -> bool {
        self.has_property(WeaponProperty::Heavy)
    }

    pub fn versatile_die(&self) -> Option<DieType> {
        self.properties.iter().find_map(|p| match p {
            WeaponProperty::Versatile(die) => Some(*die),
            _ => None,
        })
    }

    /// Monk weapons: shortswords, and simple melee weapons that are
    /// neither two-handed nor heavy.
    pub fn is_monk_weapon(&self) -> bool {
        if self.key == "shortsword" {
            return true;
        }
        self.category == WeaponCategory::Simple
            && !self.is_ranged()
            && !self.is_two_handed()
            && !self.is_heavy()
    }
}

// ============================================================================
// Armor
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArmorCategory {
    Light,
    Medium,
    Heavy,
    Shield,
}

/// How an armor piece computes AC. For shields, `base` is the flat bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcFormula {
    pub base: i32,
    pub dex_applies: bool,
    /// Cap on the DEX contribution; `None` leaves it to the category.
    pub max_dex_bonus: Option<i32>,
}

impl AcFormula {
    pub fn new(base: i32, dex_applies: bool, max_dex_bonus: Option<i32>) -> Self {
        Self {
            base,
            dex_applies,
            max_dex_bonus,
        }
    }

    /// The formula implied by an armor category.
    pub fn for_category(category: ArmorCategory, base: i32) -> Self {
        match category {
            ArmorCategory::Light => Self::new(base, true, None),
            ArmorCategory::Medium => Self::new(base, true, Some(2)),
            ArmorCategory::Heavy | ArmorCategory::Shield => Self::new(base, false, None),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Armor {
    pub key: String,
    pub name: String,
    pub category: ArmorCategory,
    /// Structured AC data; `None` for items loaded without it.
    pub ac: Option<AcFormula>,
    pub strength_requirement: Option<u8>,
    pub stealth_disadvantage: bool,
}

impl Armor {
    pub fn new(name: impl Into<String>, category: ArmorCategory, base_ac: i32) -> Self {
        let name = name.into();
        Self {
            key: normalize_key(&name),
            name,
            category,
            ac: Some(AcFormula::for_category(category, base_ac)),
            strength_requirement: None,
            stealth_disadvantage: false,
        }
    }

    /// Armor known only by key and category, without AC data.
    pub fn without_ac_data(name: impl Into<String>, category: ArmorCategory) -> Self {
        Self {
            ac: None,
            ..Self::new(name, category, 0)
        }
    }

    pub fn with_formula(mut self, formula: AcFormula) -> Self {
        self.ac = Some(formula);
        self
    }

    pub fn with_strength_requirement(mut self, strength: u8) -> Self {
        self.strength_requirement = Some(strength);
        self
    }

    pub fn with_stealth_disadvantage(mut self) -> Self {
        self.stealth_disadvantage = true;
        self
    }

    pub fn is_shield(&self) -> bool {
        self.category == ArmorCategory::Shield
    }
}

// ============================================================================
// Equipment
// ============================================================================

/// Gear without weapon or armor behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicItem {
    pub key: String,
    pub name: String,
}

impl BasicItem {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            key: normalize_key(&name),
            name,
        }
    }
}

/// Anything that can occupy an equipment slot or sit in an inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Equipment {
    Weapon(Weapon),
    Armor(Armor),
    Basic(BasicItem),
}

impl Equipment {
    pub fn name(&self) -> &str {
        match self {
            Equipment::Weapon(w) => &w.name,
            Equipment::Armor(a) => &a.name,
            Equipment::Basic(b) => &b.name,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Equipment::Weapon(w) => &w.key,
            Equipment::Armor(a) => &a.key,
            Equipment::Basic(b) => &b.key,
        }
    }

    pub fn as_weapon(&self) -> Option<&Weapon> {
        match self {
            Equipment::Weapon(w) => Some(w),
            _ => None,
        }
    }

    pub fn as_armor(&self) -> Option<&Armor> {
        match self {
            Equipment::Armor(a) => Some(a),
            _ => None,
        }
    }

    pub fn is_shield(&self) -> bool {
        self.as_armor().is_some_and(Armor::is_shield)
    }

    /// Body armor (anything armor-like that isn't a shield).
    pub fn is_body_armor(&self) -> bool {
        self.as_armor().is_some_and(|a| !a.is_shield())
    }

    pub fn matches(&self, name: &str) -> bool {
        let key = normalize_key(name);
        self.key() == key || normalize_key(self.name()) == key
    }
}

impl From<Weapon> for Equipment {
    fn from(weapon: Weapon) -> Self {
        Equipment::Weapon(weapon)
    }
}

impl From<Armor> for Equipment {
    fn from(armor: Armor) -> Self {
        Equipment::Armor(armor)
    }
}

impl From<BasicItem> for Equipment {
    fn from(item: BasicItem) -> Self {
        Equipment::Basic(item)
    }
}

// ============================================================================
// Catalogue
// ============================================================================

/// Get a standard weapon by name or key.
pub fn get_weapon(name: &str) -> Option<Weapon> {
    let key = normalize_key(name);
    WEAPONS.iter().find(|w| w.key == key).cloned()
}

/// Get a standard armor piece by name or key.
pub fn get_armor(name: &str) -> Option<Armor> {
    let key = normalize_key(name);
    ARMORS.iter().find(|a| a.key == key).cloned()
}

/// Try to find any standard equipment by name.
pub fn find_equipment(name: &str) -> Option<Equipment> {
    get_weapon(name)
        .map(Equipment::Weapon)
        .or_else(|| get_armor(name).map(Equipment::Armor))
}

fn d(count: u32, die: DieType) -> DiceFormula {
    DiceFormula::new(count, die)
}

lazy_static::lazy_static! {
    /// Standard D&D 5e weapons.
    pub static ref WEAPONS: Vec<Weapon> = {
        use DamageType::{Bludgeoning, Piercing, Slashing};
        use DieType::*;
        use WeaponCategory::{Martial, Simple};
        use WeaponProperty::*;
        vec![
            // Simple Melee Weapons
            Weapon::new("Club", d(1, D4), Bludgeoning, Simple)
                .with_properties(vec![Light]),
            Weapon::new("Dagger", d(1, D4), Piercing, Simple)
                .with_properties(vec![Finesse, Light, Thrown { normal: 20, long: 60 }]),
            Weapon::new("Greatclub", d(1, D8), Bludgeoning, Simple)
                .with_properties(vec![TwoHanded]),
            Weapon::new("Handaxe", d(1, D6), Slashing, Simple)
                .with_properties(vec![Light, Thrown { normal: 20, long: 60 }]),
            Weapon::new("Javelin", d(1, D6), Piercing, Simple)
                .with_properties(vec![Thrown { normal: 30, long: 120 }]),
            Weapon::new("Light Hammer", d(1, D4), Bludgeoning, Simple)
                .with_properties(vec![Light, Thrown { normal: 20, long: 60 }]),
            Weapon::new("Mace", d(1, D6), Bludgeoning, Simple),
            Weapon::new("Quarterstaff", d(1, D6), Bludgeoning, Simple)
                .with_properties(vec![Versatile(D8)]),
            Weapon::new("Sickle", d(1, D4), Slashing, Simple)
                .with_properties(vec![Light]),
            Weapon::new("Spear", d(1, D6), Piercing, Simple)
                .with_properties(vec![Thrown { normal: 20, long: 60 }, Versatile(D8)]),

            // Martial Melee Weapons
            Weapon::new("Battleaxe", d(1, D8), Slashing, Martial)
                .with_properties(vec![Versatile(D10)]),
            Weapon::new("Flail", d(1, D8), Bludgeoning, Martial),
            Weapon::new("Glaive", d(1, D10), Slashing, Martial)
                .with_properties(vec![Heavy, Reach, TwoHanded]),
            Weapon::new("Greataxe", d(1, D12), Slashing, Martial)
                .with_properties(vec![Heavy, TwoHanded]),
            Weapon::new("Greatsword", d(2, D6), Slashing, Martial)
                .with_properties(vec![Heavy, TwoHanded]),
            Weapon::new("Halberd", d(1, D10), Slashing, Martial)
                .with_properties(vec![Heavy, Reach, TwoHanded]),
            Weapon::new("Longsword", d(1, D8), Slashing, Martial)
                .with_properties(vec![Versatile(D10)]),
            Weapon::new("Maul", d(2, D6), Bludgeoning, Martial)
                .with_properties(vec![Heavy, TwoHanded]),
            Weapon::new("Morningstar", d(1, D8), Piercing, Martial),
            Weapon::new("Rapier", d(1, D8), Piercing, Martial)
                .with_properties(vec![Finesse]),
            Weapon::new("Scimitar", d(1, D6), Slashing, Martial)
                .with_properties(vec![Finesse, Light]),
            Weapon::new("Shortsword", d(1, D6), Piercing, Martial)
                .with_properties(vec![Finesse, Light]),
            Weapon::new("War Pick", d(1, D8), Piercing, Martial),
            Weapon::new("Warhammer", d(1, D8), Bludgeoning, Martial)
                .with_properties(vec![Versatile(D10)]),
            Weapon::new("Whip", d(1, D4), Slashing, Martial)
                .with_properties(vec![Finesse, Reach]),

            // Simple Ranged Weapons
            Weapon::new("Light Crossbow", d(1, D8), Piercing, Simple)
                .with_properties(vec![Ammunition, Loading, TwoHanded])
                .ranged(80, 320),
            Weapon::new("Shortbow", d(1, D6), Piercing, Simple)
                .with_properties(vec![Ammunition, TwoHanded])
                .ranged(80, 320),

            // Martial Ranged Weapons
            Weapon::new("Hand Crossbow", d(1, D6), Piercing, Martial)
                .with_properties(vec![Ammunition, Light, Loading])
                .ranged(30, 120),
            Weapon::new("Heavy Crossbow", d(1, D10), Piercing, Martial)
                .with_properties(vec![Ammunition, Heavy, Loading, TwoHanded])
                .ranged(100, 400),
            Weapon::new("Longbow", d(1, D8), Piercing, Martial)
                .with_properties(vec![Ammunition, Heavy, TwoHanded])
                .ranged(150, 600),
        ]
    };

    /// Standard D&D 5e armor.
    pub static ref ARMORS: Vec<Armor> = vec![
        // Light Armor
        Armor::new("Padded Armor", ArmorCategory::Light, 11).with_stealth_disadvantage(),
        Armor::new("Leather", ArmorCategory::Light, 11),
        Armor::new("Studded Leather", ArmorCategory::Light, 12),

        // Medium Armor
        Armor::new("Hide", ArmorCategory::Medium, 12),
        Armor::new("Chain Shirt", ArmorCategory::Medium, 13),
        Armor::new("Scale Mail", ArmorCategory::Medium, 14).with_stealth_disadvantage(),
        Armor::new("Breastplate", ArmorCategory::Medium, 14),
        Armor::new("Half Plate", ArmorCategory::Medium, 15).with_stealth_disadvantage(),

        // Heavy Armor
        Armor::new("Ring Mail", ArmorCategory::Heavy, 14).with_stealth_disadvantage(),
        Armor::new("Chain Mail", ArmorCategory::Heavy, 16)
            .with_strength_requirement(13)
            .with_stealth_disadvantage(),
        Armor::new("Splint", ArmorCategory::Heavy, 17)
            .with_strength_requirement(15)
            .with_stealth_disadvantage(),
        Armor::new("Plate", ArmorCategory::Heavy, 18)
            .with_strength_requirement(15)
            .with_stealth_disadvantage(),

        // Shield
        Armor::new("Shield", ArmorCategory::Shield, 2),
    ];
}
