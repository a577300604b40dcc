use serde::{Deserialize, Serialize};

use crate::{
    rules::{
        dice::{
            Advantage, DiceGroup, Keep, KeepMeta, PoolRow, RollId, RollMode, RollResult, now_stamp,
        },
        validation::{
            MAX_DICE, RawValue, ValidationError, validate_count, validate_modifier,
            validate_sides,
        },
    },
    statistics::roller::DieSampler,
};

/// The dice half of a roll request, one variant per roll mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RollKind {
    Single { sides: RawValue, advantage: Advantage },
    Same { count: RawValue, sides: RawValue },
    Mixed { pool: Vec<PoolRow> },
}

impl RollKind {
    pub fn single(sides: impl Into<RawValue>, advantage: Advantage) -> Self {
        RollKind::Single {
            sides: sides.into(),
            advantage,
        }
    }

    pub fn same(count: impl Into<RawValue>, sides: impl Into<RawValue>) -> Self {
        RollKind::Same {
            count: count.into(),
            sides: sides.into(),
        }
    }
}

/// Everything needed to perform one roll. Fields are raw, validation happens
/// when the plan is rolled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollPlan {
    pub modifier: RawValue,
    pub kind: RollKind,
}

/// A validated mixed-pool row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DieSpec {
    count: u32,
    sides: u32,
}

struct Outcome {
    label: String,
    dice: Vec<DiceGroup>,
    subtotal: i64,
    meta: Option<KeepMeta>,
}

impl RollPlan {
    pub fn new(modifier: impl Into<RawValue>, kind: RollKind) -> Self {
        Self {
            modifier: modifier.into(),
            kind,
        }
    }

    pub fn mode(&self) -> RollMode {
        match self.kind {
            RollKind::Single { .. } => RollMode::Single,
            RollKind::Same { .. } => RollMode::Same,
            RollKind::Mixed { .. } => RollMode::Mixed,
        }
    }

    /// Validates the plan and rolls it.
    ///
    /// The modifier is checked first, then the mode's own fields. No die is
    /// sampled until every check has passed, so a failure leaves nothing
    /// behind.
    pub fn roll<S: DieSampler + ?Sized>(
        &self,
        sampler: &mut S,
    ) -> Result<RollResult, ValidationError> {
        let modifier = validate_modifier(&self.modifier)?;

        let outcome = match &self.kind {
            RollKind::Single { sides, advantage } => {
                let sides = validate_sides(sides)?;
                roll_single(sides, *advantage, sampler)
            }
            RollKind::Same { count, sides } => {
                let count = validate_count(count)?;
                let sides = validate_sides(sides)?;
                roll_same(count, sides, sampler)
            }
            RollKind::Mixed { pool } => {
                let specs = validate_pool(pool)?;
                roll_pool(&specs, sampler)
            }
        };

        let result = RollResult {
            id: RollId::fresh(),
            timestamp: now_stamp(),
            label: outcome.label,
            dice: outcome.dice,
            subtotal: outcome.subtotal,
            modifier,
            total: outcome.subtotal + modifier,
            meta: outcome.meta,
        };
        log::debug!(
            "{} roll {}: subtotal {} total {}",
            self.mode().as_str(),
            result.label,
            result.subtotal,
            result.total
        );
        Ok(result)
    }
}

/// Rolls `plan` with `sampler`; see [`RollPlan::roll`].
pub fn execute_roll<S: DieSampler + ?Sized>(
    plan: &RollPlan,
    sampler: &mut S,
) -> Result<RollResult, ValidationError> {
    plan.roll(sampler)
}

fn roll_single<S: DieSampler + ?Sized>(
    sides: u32,
    advantage: Advantage,
    sampler: &mut S,
) -> Outcome {
    let keep = match advantage {
        // advantage only exists for d20s
        _ if sides != 20 => None,
        Advantage::Normal => None,
        Advantage::Advantage => Some(Keep::High),
        Advantage::Disadvantage => Some(Keep::Low),
    };

    let Some(keep) = keep else {
        let result = sampler.sample(sides);
        return Outcome {
            label: format!("1d{sides}"),
            dice: vec![DiceGroup {
                sides,
                results: vec![result],
            }],
            subtotal: i64::from(result),
            meta: None,
        };
    };

    let a = sampler.sample(20);
    let b = sampler.sample(20);
    let (kept, dropped, label) = match keep {
        Keep::High => (a.max(b), a.min(b), "2d20 (Advantage)"),
        Keep::Low => (a.min(b), a.max(b), "2d20 (Disadvantage)"),
    };

    Outcome {
        label: label.to_string(),
        dice: vec![DiceGroup {
            sides: 20,
            results: vec![a, b],
        }],
        subtotal: i64::from(kept),
        meta: Some(KeepMeta {
            keep,
            kept,
            dropped,
        }),
    }
}

fn roll_same<S: DieSampler + ?Sized>(count: u32, sides: u32, sampler: &mut S) -> Outcome {
    let group = DiceGroup {
        sides,
        results: sampler.sample_many(sides, count),
    };
    Outcome {
        label: format!("{count}d{sides}"),
        subtotal: group.sum(),
        dice: vec![group],
        meta: None,
    }
}

fn validate_pool(pool: &[PoolRow]) -> Result<Vec<DieSpec>, ValidationError> {
    let specs = pool
        .iter()
        .map(|row| {
            let count = validate_count(&row.count)
                .map_err(|e| ValidationError::RowCount(Box::new(e)))?;
            let sides = validate_sides(&row.sides)
                .map_err(|e| ValidationError::RowSides(Box::new(e)))?;
            Ok(DieSpec { count, sides })
        })
        .collect::<Result<Vec<_>, ValidationError>>()?;

    let total_dice: u64 = specs.iter().map(|spec| u64::from(spec.count)).sum();
    if total_dice < 2 {
        return Err(ValidationError::PoolTooSmall);
    }
    if total_dice > u64::from(MAX_DICE) {
        return Err(ValidationError::PoolTooLarge);
    }
    Ok(specs)
}

fn roll_pool<S: DieSampler + ?Sized>(specs: &[DieSpec], sampler: &mut S) -> Outcome {
    let dice: Vec<DiceGroup> = specs
        .iter()
        .map(|spec| DiceGroup {
            sides: spec.sides,
            results: sampler.sample_many(spec.sides, spec.count),
        })
        .collect();

    let label = specs
        .iter()
        .map(|spec| format!("{}d{}", spec.count, spec.sides))
        .collect::<Vec<_>>()
        .join(" + ");

    Outcome {
        label,
        subtotal: dice.iter().map(DiceGroup::sum).sum(),
        dice,
        meta: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statistics::roller::{Roller, ScriptedRoller};

    #[test]
    fn test_advantage_keeps_highest() -> anyhow::Result<()> {
        let plan = RollPlan::new(3, RollKind::single(20, Advantage::Advantage));
        let mut rng = ScriptedRoller::new([7, 15]);
        let result = plan.roll(&mut rng)?;

        assert_eq!(result.label, "2d20 (Advantage)");
        assert_eq!(
            result.dice,
            vec![DiceGroup {
                sides: 20,
                results: vec![7, 15]
            }]
        );
        assert_eq!(result.subtotal, 15);
        assert_eq!(result.total, 18);
        assert_eq!(
            result.meta,
            Some(KeepMeta {
                keep: Keep::High,
                kept: 15,
                dropped: 7
            })
        );
        Ok(())
    }

    #[test]
    fn test_disadvantage_keeps_lowest() -> anyhow::Result<()> {
        let plan = RollPlan::new(-1, RollKind::single(20, Advantage::Disadvantage));
        let mut rng = ScriptedRoller::new([12, 4]);
        let result = plan.roll(&mut rng)?;

        assert_eq!(result.label, "2d20 (Disadvantage)");
        assert_eq!(result.subtotal, 4);
        assert_eq!(result.total, 3);
        let meta = result.meta.unwrap();
        assert_eq!(meta.keep, Keep::Low);
        assert_eq!((meta.kept, meta.dropped), (4, 12));
        Ok(())
    }

    #[test]
    fn test_advantage_tie() -> anyhow::Result<()> {
        let plan = RollPlan::new(0, RollKind::single(20, Advantage::Advantage));
        let result = plan.roll(&mut ScriptedRoller::new([9, 9]))?;
        let meta = result.meta.unwrap();
        assert_eq!((meta.kept, meta.dropped), (9, 9));
        assert_eq!(result.subtotal, 9);
        Ok(())
    }

    #[test]
    fn test_advantage_random_invariants() -> anyhow::Result<()> {
        let plan = RollPlan::new(3, RollKind::single(20, Advantage::Advantage));
        let mut rng = Roller::test_rng();
        for _ in 0..1000 {
            let result = plan.roll(&mut rng)?;
            assert_eq!(result.dice.len(), 1);
            let results = &result.dice[0].results;
            assert_eq!(results.len(), 2);
            let high = *results.iter().max().unwrap();
            let low = *results.iter().min().unwrap();
            assert_eq!(result.subtotal, i64::from(high));
            let meta = result.meta.unwrap();
            assert_eq!(i64::from(meta.kept), result.subtotal);
            assert_eq!(meta.dropped, low);
            assert_eq!(result.total, result.subtotal + 3);
        }
        Ok(())
    }

    #[test]
    fn test_advantage_ignored_off_d20() -> anyhow::Result<()> {
        let plan = RollPlan::new(0, RollKind::single(6, Advantage::Advantage));
        let mut rng = ScriptedRoller::new([5]);
        let result = plan.roll(&mut rng)?;

        assert_eq!(result.label, "1d6");
        assert_eq!(
            result.dice,
            vec![DiceGroup {
                sides: 6,
                results: vec![5]
            }]
        );
        assert_eq!(result.meta, None);
        assert_eq!(rng.calls, vec![6]);
        Ok(())
    }

    #[test]
    fn test_single_normal() -> anyhow::Result<()> {
        let plan = RollPlan::new("2", RollKind::single("12", Advantage::Normal));
        let result = plan.roll(&mut ScriptedRoller::new([11]))?;
        assert_eq!(result.label, "1d12");
        assert_eq!(result.subtotal, 11);
        assert_eq!(result.modifier, 2);
        assert_eq!(result.total, 13);
        Ok(())
    }

    #[test]
    fn test_same_sums_every_die() -> anyhow::Result<()> {
        let plan = RollPlan::new(2, RollKind::same(5, 6));
        let mut rng = ScriptedRoller::new([1, 6, 3, 3, 2]);
        let result = plan.roll(&mut rng)?;

        assert_eq!(result.label, "5d6");
        assert_eq!(result.dice.len(), 1);
        assert_eq!(result.dice[0].results, vec![1, 6, 3, 3, 2]);
        assert_eq!(result.subtotal, 15);
        assert_eq!(result.total, 17);
        Ok(())
    }

    #[test]
    fn test_same_random_bounds() -> anyhow::Result<()> {
        let plan = RollPlan::new(2, RollKind::same(5, 6));
        let mut rng = Roller::test_rng();
        for _ in 0..1000 {
            let result = plan.roll(&mut rng)?;
            let results = &result.dice[0].results;
            assert_eq!(results.len(), 5);
            assert!(results.iter().all(|r| (1..=6).contains(r)));
            let sum: i64 = results.iter().map(|&r| i64::from(r)).sum();
            assert_eq!(result.subtotal, sum);
            assert_eq!(result.total, result.subtotal + 2);
        }
        Ok(())
    }

    #[test]
    fn test_mixed_pool() -> anyhow::Result<()> {
        let pool = vec![PoolRow::new(2, 20), PoolRow::new(1, 8)];
        let plan = RollPlan::new(0, RollKind::Mixed { pool });
        let mut rng = ScriptedRoller::new([20, 4, 8]);
        let result = plan.roll(&mut rng)?;

        assert_eq!(result.label, "2d20 + 1d8");
        assert_eq!(
            result.dice,
            vec![
                DiceGroup {
                    sides: 20,
                    results: vec![20, 4]
                },
                DiceGroup {
                    sides: 8,
                    results: vec![8]
                },
            ]
        );
        assert_eq!(result.subtotal, 32);
        assert_eq!(result.total, 32);
        assert_eq!(result.dice_count(), 3);
        assert!(result.has_natural_20());
        assert_eq!(rng.calls, vec![20, 20, 8]);
        Ok(())
    }

    #[test]
    fn test_mixed_pool_needs_two_dice() {
        let plan = RollPlan::new(
            0,
            RollKind::Mixed {
                pool: vec![PoolRow::new(1, 6)],
            },
        );
        let mut rng = ScriptedRoller::default();
        assert_eq!(plan.roll(&mut rng), Err(ValidationError::PoolTooSmall));
        assert!(rng.calls.is_empty());
    }

    #[test]
    fn test_mixed_pool_cap() {
        let plan = RollPlan::new(
            0,
            RollKind::Mixed {
                pool: vec![PoolRow::new(150, 6), PoolRow::new(51, 4)],
            },
        );
        let err = plan.roll(&mut ScriptedRoller::default()).unwrap_err();
        assert_eq!(err, ValidationError::PoolTooLarge);
        assert_eq!(err.to_string(), "Total dice in pool cannot exceed 200.");
    }

    #[test]
    fn test_mixed_pool_reports_first_bad_row() {
        let plan = RollPlan::new(
            0,
            RollKind::Mixed {
                pool: vec![
                    PoolRow::new(2, 6),
                    PoolRow::new(3, 1),
                    PoolRow::new(0, 6),
                ],
            },
        );
        let err = plan.roll(&mut ScriptedRoller::default()).unwrap_err();
        assert_eq!(err.to_string(), "Row sides error: Sides must be at least 2.");

        let plan = RollPlan::new(
            0,
            RollKind::Mixed {
                pool: vec![PoolRow::new("lots", 6), PoolRow::new(3, 1)],
            },
        );
        let err = plan.roll(&mut ScriptedRoller::default()).unwrap_err();
        assert_eq!(err.to_string(), "Row count error: Count must be a number.");
    }

    #[test]
    fn test_modifier_checked_first() {
        let plan = RollPlan::new(2_000_000, RollKind::same(0, 1));
        let mut rng = ScriptedRoller::default();
        assert_eq!(plan.roll(&mut rng), Err(ValidationError::ModifierOutOfRange));
        assert!(rng.calls.is_empty());
    }

    #[test]
    fn test_same_checks_count_before_sides() {
        let plan = RollPlan::new(0, RollKind::same(201, 1));
        assert_eq!(
            execute_roll(&plan, &mut ScriptedRoller::default()),
            Err(ValidationError::CountTooLarge)
        );
    }

    #[test]
    fn test_results_get_unique_ids() -> anyhow::Result<()> {
        let plan = RollPlan::new(0, RollKind::single(20, Advantage::Normal));
        let mut rng = Roller::test_rng();
        let a = plan.roll(&mut rng)?;
        let b = plan.roll(&mut rng)?;
        assert_ne!(a.id, b.id);
        assert!(!a.timestamp.is_empty());
        Ok(())
    }
}
