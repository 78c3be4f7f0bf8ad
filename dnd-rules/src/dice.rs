//! Dice notation and random sources.
//!
//! The engine never rolls dice on its own. Every operation that needs
//! randomness takes a [`DiceRoller`], so callers can plug in a seeded
//! generator for live play or a scripted one for tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for dice notation parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiceError {
    #[error("Invalid dice notation: {0}")]
    InvalidNotation(String),
    #[error("Invalid die size: {0}")]
    InvalidDieSize(u32),
    #[error("No dice specified")]
    NoDice,
}

/// Failure of the underlying random source.
///
/// This is the only error class the rules engine treats as fatal to the
/// current operation; it is propagated to the caller unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RollError {
    #[error("Cannot roll a die with {0} sides")]
    InvalidDieSize(u32),
    #[error("Dice source exhausted")]
    Exhausted,
    #[error("Dice source failed: {0}")]
    Source(String),
}

/// Advantage state for d20 rolls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Advantage {
    #[default]
    Normal,
    Advantage,
    Disadvantage,
}

impl Advantage {
    /// Combine two advantage states (advantage + disadvantage = normal).
    pub fn combine(self, other: Advantage) -> Advantage {
        match (self, other) {
            (Advantage::Normal, x) | (x, Advantage::Normal) => x,
            (Advantage::Advantage, Advantage::Disadvantage) => Advantage::Normal,
            (Advantage::Disadvantage, Advantage::Advantage) => Advantage::Normal,
            (Advantage::Advantage, Advantage::Advantage) => Advantage::Advantage,
            (Advantage::Disadvantage, Advantage::Disadvantage) => Advantage::Disadvantage,
        }
    }
}

/// Standard D&D die types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DieType {
    D4,
    D6,
    D8,
    D10,
    D12,
    D20,
    D100,
}

impl DieType {
    pub fn sides(&self) -> u32 {
        match self {
            DieType::D4 => 4,
            DieType::D6 => 6,
            DieType::D8 => 8,
            DieType::D10 => 10,
            DieType::D12 => 12,
            DieType::D20 => 20,
            DieType::D100 => 100,
        }
    }

    pub fn from_sides(sides: u32) -> Option<DieType> {
        match sides {
            4 => Some(DieType::D4),
            6 => Some(DieType::D6),
            8 => Some(DieType::D8),
            10 => Some(DieType::D10),
            12 => Some(DieType::D12),
            20 => Some(DieType::D20),
            100 => Some(DieType::D100),
            _ => None,
        }
    }
}

impl fmt::Display for DieType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.sides())
    }
}

/// A single-die-type formula such as `2d6+3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceFormula {
    pub count: u32,
    pub die: DieType,
    pub bonus: i32,
}

impl DiceFormula {
    pub fn new(count: u32, die: DieType) -> Self {
        Self {
            count,
            die,
            bonus: 0,
        }
    }

    pub fn with_bonus(mut self, bonus: i32) -> Self {
        self.bonus = bonus;
        self
    }

    /// Parse `XdY`, `dY`, `XdY+Z` or `XdY-Z`.
    pub fn parse(notation: &str) -> Result<Self, DiceError> {
        let notation: String = notation
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        if notation.is_empty() {
            return Err(DiceError::NoDice);
        }

        let d_pos = notation
            .find('d')
            .ok_or_else(|| DiceError::InvalidNotation(notation.clone()))?;
        let count_str = &notation[..d_pos];
        let rest = &notation[d_pos + 1..];

        let count: u32 = if count_str.is_empty() {
            1
        } else {
            count_str
                .parse()
                .map_err(|_| DiceError::InvalidNotation(notation.clone()))?
        };

        let (sides_str, bonus) = match rest.find(['+', '-']) {
            Some(sign_pos) => {
                let value: i32 = rest[sign_pos + 1..]
                    .parse()
                    .map_err(|_| DiceError::InvalidNotation(notation.clone()))?;
                let sign = if rest.as_bytes()[sign_pos] == b'-' { -1 } else { 1 };
                (&rest[..sign_pos], sign * value)
            }
            None => (rest, 0),
        };

        let sides: u32 = sides_str
            .parse()
            .map_err(|_| DiceError::InvalidNotation(notation.clone()))?;
        let die = DieType::from_sides(sides).ok_or(DiceError::InvalidDieSize(sides))?;

        Ok(Self { count, die, bonus })
    }

    /// Roll this formula through the given source.
    pub fn roll(&self, roller: &mut dyn DiceRoller) -> Result<Roll, RollError> {
        roller.roll(self.count, self.die.sides(), self.bonus)
    }
}

impl FromStr for DiceFormula {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiceFormula::parse(s)
    }
}

impl fmt::Display for DiceFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.count, self.die)?;
        match self.bonus {
            0 => Ok(()),
            b if b > 0 => write!(f, "+{b}"),
            b => write!(f, "-{}", b.abs()),
        }
    }
}

/// Result of rolling `count` dice plus a flat bonus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roll {
    pub total: i32,
    pub results: Vec<u32>,
}

impl Roll {
    /// Sum of the dice alone, without the flat bonus.
    pub fn dice_total(&self) -> i32 {
        self.results.iter().map(|r| *r as i32).sum()
    }
}

impl fmt::Display for Roll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let faces: Vec<String> = self.results.iter().map(|r| r.to_string()).collect();
        write!(f, "[{}] = {}", faces.join(", "), self.total)
    }
}

/// A d20 roll, possibly made with advantage or disadvantage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct D20Roll {
    /// The die that counts.
    pub natural: u32,
    /// Every die rolled, in order (two with advantage/disadvantage).
    pub rolls: Vec<u32>,
}

impl D20Roll {
    pub fn is_critical(&self) -> bool {
        self.natural == 20
    }

    pub fn is_fumble(&self) -> bool {
        self.natural == 1
    }
}

/// Capability producing dice rolls.
///
/// Implementations must return exactly `count` individual results and a
/// total equal to their sum plus `bonus`.
pub trait DiceRoller {
    fn roll(&mut self, count: u32, sides: u32, bonus: i32) -> Result<Roll, RollError>;

    /// Roll a single d20, honouring advantage or disadvantage.
    fn roll_d20(&mut self, advantage: Advantage) -> Result<D20Roll, RollError> {
        match advantage {
            Advantage::Normal => {
                let roll = self.roll(1, 20, 0)?;
                let natural = roll.results.first().copied().ok_or(RollError::Exhausted)?;
                Ok(D20Roll {
                    natural,
                    rolls: vec![natural],
                })
            }
            Advantage::Advantage | Advantage::Disadvantage => {
                let roll = self.roll(2, 20, 0)?;
                let (first, second) = match roll.results.as_slice() {
                    [a, b] => (*a, *b),
                    _ => return Err(RollError::Exhausted),
                };
                let natural = if advantage == Advantage::Advantage {
                    first.max(second)
                } else {
                    first.min(second)
                };
                Ok(D20Roll {
                    natural,
                    rolls: vec![first, second],
                })
            }
        }
    }
}

/// Dice source backed by a pseudo-random generator.
#[derive(Debug, Clone)]
pub struct RandomRoller<R = StdRng> {
    rng: R,
}

impl RandomRoller<StdRng> {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic roller for reproducible simulations.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomRoller<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> RandomRoller<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> DiceRoller for RandomRoller<R> {
    fn roll(&mut self, count: u32, sides: u32, bonus: i32) -> Result<Roll, RollError> {
        if sides == 0 {
            return Err(RollError::InvalidDieSize(sides));
        }
        let results: Vec<u32> = (0..count)
            .map(|_| self.rng.gen_range(1..=sides))
            .collect();
        let total = results.iter().map(|r| *r as i32).sum::<i32>() + bonus;
        Ok(Roll { total, results })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let formula = DiceFormula::parse("1d20").unwrap();
        assert_eq!(formula.count, 1);
        assert_eq!(formula.die, DieType::D20);
        assert_eq!(formula.bonus, 0);
    }

    #[test]
    fn test_parse_with_modifier() {
        assert_eq!(DiceFormula::parse("1d8+5").unwrap().bonus, 5);
        assert_eq!(DiceFormula::parse("2d6-2").unwrap().bonus, -2);
        assert_eq!(DiceFormula::parse("d4").unwrap().count, 1);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(DiceFormula::parse(""), Err(DiceError::NoDice));
        assert_eq!(DiceFormula::parse("1d7"), Err(DiceError::InvalidDieSize(7)));
        assert!(matches!(
            DiceFormula::parse("banana"),
            Err(DiceError::InvalidNotation(_))
        ));
    }

    #[test]
    fn test_formula_display() {
        assert_eq!(DiceFormula::new(2, DieType::D6).to_string(), "2d6");
        assert_eq!(
            DiceFormula::new(1, DieType::D8).with_bonus(-1).to_string(),
            "1d8-1"
        );
    }

    #[test]
    fn test_random_roll_range() {
        let mut roller = RandomRoller::seeded(7);
        for _ in 0..100 {
            let roll = roller.roll(2, 6, 3).unwrap();
            assert_eq!(roll.results.len(), 2);
            assert!(roll.total >= 5 && roll.total <= 15);
            assert_eq!(roll.total, roll.dice_total() + 3);
        }
    }

    #[test]
    fn test_zero_sided_die_is_rejected() {
        let mut roller = RandomRoller::seeded(1);
        assert_eq!(roller.roll(1, 0, 0), Err(RollError::InvalidDieSize(0)));
    }

    #[test]
    fn test_seeded_rollers_agree() {
        let mut a = RandomRoller::seeded(42);
        let mut b = RandomRoller::seeded(42);
        for _ in 0..10 {
            assert_eq!(a.roll(1, 20, 0), b.roll(1, 20, 0));
        }
    }

    #[test]
    fn test_advantage_combine() {
        assert_eq!(
            Advantage::Normal.combine(Advantage::Advantage),
            Advantage::Advantage
        );
        assert_eq!(
            Advantage::Advantage.combine(Advantage::Disadvantage),
            Advantage::Normal
        );
        assert_eq!(
            Advantage::Advantage.combine(Advantage::Advantage),
            Advantage::Advantage
        );
    }

    #[test]
    fn test_d20_advantage_keeps_higher() {
        let mut roller = RandomRoller::seeded(3);
        for _ in 0..50 {
            let roll = roller.roll_d20(Advantage::Advantage).unwrap();
            assert_eq!(roll.rolls.len(), 2);
            assert_eq!(roll.natural, *roll.rolls.iter().max().unwrap());
        }
    }
}
