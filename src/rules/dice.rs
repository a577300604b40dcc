use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rules::validation::RawValue;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RollMode {
    #[default]
    Single,
    Same,
    Mixed,
}

impl RollMode {
    pub fn all() -> [RollMode; 3] {
        [RollMode::Single, RollMode::Same, RollMode::Mixed]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RollMode::Single => "single",
            RollMode::Same => "same",
            RollMode::Mixed => "mixed",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().into_iter().find(|mode| mode.as_str() == name)
    }
}

/// How a single d20 is rolled. Only meaningful when the die has 20 sides.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Advantage {
    #[default]
    #[serde(rename = "normal")]
    Normal,
    #[serde(rename = "adv")]
    Advantage,
    #[serde(rename = "dis")]
    Disadvantage,
}

impl Advantage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Advantage::Normal => "normal",
            Advantage::Advantage => "adv",
            Advantage::Disadvantage => "dis",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "normal" => Some(Advantage::Normal),
            "adv" => Some(Advantage::Advantage),
            "dis" => Some(Advantage::Disadvantage),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Keep {
    High,
    Low,
}

/// Which of the two advantage/disadvantage d20s counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeepMeta {
    pub keep: Keep,
    pub kept: u32,
    pub dropped: u32,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, From, Into, Serialize, Deserialize,
)]
pub struct RollId(pub Uuid);

impl RollId {
    pub fn fresh() -> Self {
        RollId(Uuid::new_v4())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, From, Into, Serialize, Deserialize,
)]
pub struct RowId(pub Uuid);

impl RowId {
    pub fn fresh() -> Self {
        RowId(Uuid::new_v4())
    }
}

/// One die type in a mixed pool, with the count and sides still unvalidated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolRow {
    pub id: RowId,
    pub count: RawValue,
    pub sides: RawValue,
}

impl PoolRow {
    /// Builds a row under a freshly minted id.
    pub fn new(count: impl Into<RawValue>, sides: impl Into<RawValue>) -> Self {
        Self {
            id: RowId::fresh(),
            count: count.into(),
            sides: sides.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceGroup {
    pub sides: u32,
    pub results: Vec<u32>,
}

impl DiceGroup {
    pub fn sum(&self) -> i64 {
        self.results.iter().map(|&r| i64::from(r)).sum()
    }

    pub fn is_d20(&self) -> bool {
        self.sides == 20
    }

    pub fn pretty_print(&self, f: &mut impl std::fmt::Write) -> std::fmt::Result {
        write!(f, "d{}: [", self.sides)?;
        for (i, roll) in self.results.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match (self.is_d20(), roll) {
                (true, 20) => write!(f, "*20*")?,
                (true, 1) => write!(f, "!1!")?,
                _ => write!(f, "{}", roll)?,
            }
        }
        write!(f, "]")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollResult {
    pub id: RollId,
    pub timestamp: String,
    pub label: String,
    pub dice: Vec<DiceGroup>,
    pub subtotal: i64,
    pub modifier: i64,
    pub total: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<KeepMeta>,
}

impl RollResult {
    /// A d20 in the roll came up 20.
    pub fn has_natural_20(&self) -> bool {
        self.dice
            .iter()
            .any(|group| group.is_d20() && group.results.contains(&20))
    }

    /// A d20 in the roll came up 1.
    pub fn has_natural_1(&self) -> bool {
        self.dice
            .iter()
            .any(|group| group.is_d20() && group.results.contains(&1))
    }

    pub fn dice_count(&self) -> usize {
        self.dice.iter().map(|group| group.results.len()).sum()
    }

    pub fn pretty_print(&self, f: &mut impl std::fmt::Write) -> std::fmt::Result {
        write!(f, "Rolled {}: ", self.label)?;
        for (i, group) in self.dice.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            group.pretty_print(f)?;
        }
        write!(f, " = {}", self.subtotal)?;
        if self.modifier != 0 {
            write!(f, " {:+} = {}", self.modifier, self.total)?;
        }
        if let Some(meta) = &self.meta {
            let which = match meta.keep {
                Keep::High => "highest",
                Keep::Low => "lowest",
            };
            write!(f, " (kept {which}: {}, dropped {})", meta.kept, meta.dropped)?;
        }
        if self.has_natural_20() {
            write!(f, " (Crit 20)")?;
        }
        if self.has_natural_1() {
            write!(f, " (Nat 1)")?;
        }
        Ok(())
    }
}

/// Local wall-clock time formatted for display next to a roll.
pub fn now_stamp() -> String {
    chrono::Local::now()
        .format("%-m/%-d/%Y, %-I:%M:%S %p")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with(dice: Vec<DiceGroup>, modifier: i64, meta: Option<KeepMeta>) -> RollResult {
        let subtotal = dice.iter().map(DiceGroup::sum).sum();
        RollResult {
            id: RollId::fresh(),
            timestamp: now_stamp(),
            label: "test".to_string(),
            dice,
            subtotal,
            modifier,
            total: subtotal + modifier,
            meta,
        }
    }

    #[test]
    fn test_natural_flags_only_count_d20s() {
        let result = result_with(
            vec![
                DiceGroup {
                    sides: 20,
                    results: vec![20, 7],
                },
                DiceGroup {
                    sides: 8,
                    results: vec![1],
                },
            ],
            0,
            None,
        );
        assert!(result.has_natural_20());
        assert!(!result.has_natural_1());
        assert_eq!(result.dice_count(), 3);

        let result = result_with(
            vec![DiceGroup {
                sides: 100,
                results: vec![20],
            }],
            0,
            None,
        );
        assert!(!result.has_natural_20());

        let result = result_with(
            vec![DiceGroup {
                sides: 20,
                results: vec![1, 12],
            }],
            4,
            None,
        );
        assert!(result.has_natural_1());
        assert!(!result.has_natural_20());
        let mut buf = String::new();
        result.pretty_print(&mut buf).unwrap();
        assert_eq!(buf, "Rolled test: d20: [!1!, 12] = 13 +4 = 17 (Nat 1)");
    }

    #[test]
    fn test_pretty_print() {
        let result = result_with(
            vec![DiceGroup {
                sides: 20,
                results: vec![20, 3],
            }],
            -2,
            Some(KeepMeta {
                keep: Keep::Low,
                kept: 3,
                dropped: 20,
            }),
        );
        let result = RollResult {
            subtotal: 3,
            total: 1,
            ..result
        };
        let mut buf = String::new();
        result.pretty_print(&mut buf).unwrap();
        assert_eq!(
            buf,
            "Rolled test: d20: [*20*, 3] = 3 -2 = 1 (kept lowest: 3, dropped 20) (Crit 20)"
        );
    }

    #[test]
    fn test_mode_and_advantage_names() {
        for mode in RollMode::all() {
            assert_eq!(RollMode::from_name(mode.as_str()), Some(mode));
        }
        assert_eq!(RollMode::from_name("chaos"), None);
        assert_eq!(Advantage::from_name("adv"), Some(Advantage::Advantage));
        assert_eq!(Advantage::from_name("advantage"), None);
        assert_eq!(
            serde_json::to_string(&Advantage::Disadvantage).unwrap(),
            "\"dis\""
        );
    }

    #[test]
    fn test_pool_rows_get_distinct_ids() {
        let a = PoolRow::new(1, 6);
        let b = PoolRow::new(1, 6);
        assert_ne!(a.id, b.id);
        assert_eq!(a.count, b.count);
    }
}
