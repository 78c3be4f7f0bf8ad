//! Armor class derivation.
//!
//! AC is a pure function of a character snapshot. Callers store the result
//! (see [`Character::refresh_armor_class`]).

use crate::character::{Ability, Character, EquipSlot, FightingStyle, UnarmoredDefense};
use crate::items::{AcFormula, Armor, ArmorCategory};
use std::collections::HashMap;
use tracing::trace;

/// AC with nothing worn and nothing known.
pub const DEFAULT_AC: i32 = 10;

/// Flat bonus of a shield without AC data.
const DEFAULT_SHIELD_BONUS: i32 = 2;

/// How much of the DEX modifier a piece of armor admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DexPolicy {
    Full,
    Capped(i32),
    None,
}

impl DexPolicy {
    fn for_category(category: ArmorCategory) -> Self {
        match category {
            ArmorCategory::Light => DexPolicy::Full,
            ArmorCategory::Medium => DexPolicy::Capped(2),
            ArmorCategory::Heavy | ArmorCategory::Shield => DexPolicy::None,
        }
    }

    fn for_formula(formula: &AcFormula, category: ArmorCategory) -> Self {
        if !formula.dex_applies {
            return DexPolicy::None;
        }
        match formula.max_dex_bonus {
            Some(cap) if cap > 0 => DexPolicy::Capped(cap),
            _ if category == ArmorCategory::Medium => DexPolicy::Capped(2),
            _ if category == ArmorCategory::Heavy => DexPolicy::None,
            _ => DexPolicy::Full,
        }
    }

    fn apply(self, dex_mod: i32) -> i32 {
        match self {
            DexPolicy::Full => dex_mod,
            DexPolicy::Capped(cap) => dex_mod.min(cap),
            DexPolicy::None => 0,
        }
    }
}

lazy_static::lazy_static! {
    /// Base AC and DEX policy for armor loaded without structured AC data.
    static ref FALLBACK_ARMOR: HashMap<&'static str, (i32, DexPolicy)> = {
        let mut m = HashMap::new();
        m.insert("padded", (11, DexPolicy::Full));
        m.insert("padded_armor", (11, DexPolicy::Full));
        m.insert("leather", (11, DexPolicy::Full));
        m.insert("leather_armor", (11, DexPolicy::Full));
        m.insert("studded_leather", (12, DexPolicy::Full));
        m.insert("hide", (12, DexPolicy::Capped(2)));
        m.insert("hide_armor", (12, DexPolicy::Capped(2)));
        m.insert("chain_shirt", (13, DexPolicy::Capped(2)));
        m.insert("scale_mail", (14, DexPolicy::Capped(2)));
        m.insert("breastplate", (14, DexPolicy::Capped(2)));
        m.insert("half_plate", (15, DexPolicy::Capped(2)));
        m.insert("ring_mail", (14, DexPolicy::None));
        m.insert("chain_mail", (16, DexPolicy::None));
        m.insert("splint", (17, DexPolicy::None));
        m.insert("plate", (18, DexPolicy::None));
        m
    };
}

fn body_armor_ac(armor: &Armor, dex_mod: i32) -> i32 {
    let (base, policy) = match &armor.ac {
        Some(formula) => (formula.base, DexPolicy::for_formula(formula, armor.category)),
        None => FALLBACK_ARMOR
            .get(armor.key.as_str())
            .copied()
            .unwrap_or((DEFAULT_AC, DexPolicy::for_category(armor.category))),
    };
    base + policy.apply(dex_mod)
}

fn shield_bonus(armor: &Armor) -> i32 {
    armor.ac.map_or(DEFAULT_SHIELD_BONUS, |f| f.base)
}

/// Calculate armor class. `None` yields [`DEFAULT_AC`].
pub fn calculate_ac(character: Option<&Character>) -> i32 {
    let Some(character) = character else {
        return DEFAULT_AC;
    };

    let dex_mod = character.ability_modifier(Ability::Dexterity);
    let body_armor = character
        .equipment
        .body
        .as_ref()
        .and_then(|item| item.as_armor())
        .filter(|armor| !armor.is_shield());

    let base = match body_armor {
        Some(armor) => body_armor_ac(armor, dex_mod),
        None => match character.unarmored_defense() {
            Some(UnarmoredDefense::Monk) => {
                DEFAULT_AC + dex_mod + character.ability_modifier(Ability::Wisdom)
            }
            Some(UnarmoredDefense::Barbarian) => {
                DEFAULT_AC + dex_mod + character.ability_modifier(Ability::Constitution)
            }
            None => DEFAULT_AC + dex_mod,
        },
    };

    let shields: i32 = character
        .equipment
        .iter()
        .filter(|(slot, _)| *slot != EquipSlot::Body)
        .filter_map(|(_, item)| item.as_armor())
        .filter(|armor| armor.is_shield())
        .map(shield_bonus)
        .sum();

    let defense_style = match (body_armor, character.fighting_style()) {
        (Some(_), Some(FightingStyle::Defense)) => 1,
        _ => 0,
    };

    let effects = character.resources.total_ac_bonus();
    let total = base + shields + defense_style + effects;
    trace!(
        character = %character.name,
        base,
        shields,
        defense_style,
        effects,
        total,
        "armor class calculated"
    );
    total
}
