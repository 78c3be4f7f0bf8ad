//! D&D 5e combat and character rules engine.
//!
//! This crate provides:
//! - Character resources: hit points, hit dice, spell slots, tracked
//!   abilities and rests
//! - Status effects with concentration and aggregate modifiers
//! - Armor class derivation and weapon/unarmed attack resolution
//! - An encounter turn engine with initiative, rounds and a combat log
//! - A copy-on-read character store and JSON persistence
//!
//! The engine is synchronous and never rolls dice on its own: every
//! operation that needs randomness takes a [`DiceRoller`].
//!
//! # Quick Start
//!
//! ```ignore
//! use dnd_rules::{resolve_attack, AttackOptions, RandomRoller, RulesConfig};
//! use dnd_rules::testing::sample_fighter;
//!
//! let mut fighter = sample_fighter();
//! let mut roller = RandomRoller::new();
//! let results = resolve_attack(
//!     &mut fighter,
//!     &AttackOptions::new().against(15),
//!     &RulesConfig::default(),
//!     &mut roller,
//! )?;
//! for strike in &results {
//!     println!("{}: {} damage", strike.weapon_name, strike.damage_total);
//! }
//! ```
//!
//! Logging goes through `tracing`; install a subscriber to see it.

pub mod armor_class;
pub mod attack;
pub mod character;
pub mod config;
pub mod creation;
pub mod dice;
pub mod effects;
pub mod encounter;
pub mod items;
pub mod persist;
pub mod resources;
pub mod store;
pub mod testing;

// Primary public API
pub use armor_class::calculate_ac;
pub use attack::{resolve_attack, AttackOptions, AttackResult, Hand};
pub use character::{
    Ability, AbilityScores, Character, CharacterClass, CharacterId, EquipError, EquipSlot,
    Feature, FightingStyle, Proficiencies, RaceType, Skill, UnarmoredDefense,
};
pub use config::{ConfigError, RulesConfig};
pub use creation::{CreationDraft, CreationError, CreationStep};
pub use dice::{Advantage, DiceFormula, DiceRoller, DieType, RandomRoller, Roll, RollError};
pub use effects::{ActiveEffect, AttackKind, DamageType, DurationType, Modifier};
pub use encounter::{
    Combatant, CombatantId, CombatantKind, Encounter, EncounterError, EncounterStatus, Side,
};
pub use items::{Armor, ArmorCategory, Equipment, Weapon, WeaponCategory};
pub use persist::{PersistError, SavedCharacter, SavedTable};
pub use resources::{ResourceLedger, SlotSource};
pub use store::{CharacterStore, SharedCharacter, StoreError};
