use serde::{Deserialize, Serialize};

use crate::{
    rules::{
        dice::{Advantage, PoolRow, RollMode, RowId},
        engine::{RollKind, RollPlan},
        validation::{RawValue, coerce_integer},
    },
    share::{MixedShare, PoolShare, SameShare, SharePatch, ShareState, SingleShare},
};

const DEFAULT_SINGLE_SIDES: i64 = 20;
const DEFAULT_SAME_COUNT: i64 = 2;
const DEFAULT_SAME_SIDES: i64 = 6;
const DEFAULT_ROW_COUNT: i64 = 1;
const DEFAULT_ROW_SIDES: i64 = 6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleConfig {
    pub sides: RawValue,
    pub advantage: Advantage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SameConfig {
    pub count: RawValue,
    pub sides: RawValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixedConfig {
    pub pool: Vec<PoolRow>,
}

/// The live roll configuration, holding field values as they were entered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollConfig {
    pub mode: RollMode,
    pub modifier: RawValue,
    pub single: SingleConfig,
    pub same: SameConfig,
    pub mixed: MixedConfig,
}

impl Default for RollConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RollConfig {
    pub fn new() -> Self {
        Self {
            mode: RollMode::Single,
            modifier: RawValue::from(0i64),
            single: SingleConfig {
                sides: RawValue::from(DEFAULT_SINGLE_SIDES),
                advantage: Advantage::Normal,
            },
            same: SameConfig {
                count: RawValue::from(DEFAULT_SAME_COUNT),
                sides: RawValue::from(DEFAULT_SAME_SIDES),
            },
            mixed: MixedConfig {
                pool: vec![PoolRow::new(2, 20), PoolRow::new(1, 8)],
            },
        }
    }

    /// Whether the single-die sides currently read as a d20.
    pub fn single_is_d20(&self) -> bool {
        coerce_integer(&self.single.sides).unwrap_or(DEFAULT_SINGLE_SIDES) == 20
    }

    /// The plan for the current mode.
    ///
    /// Advantage and disadvantage are dropped here unless the single die reads
    /// as a d20, so the plan never asks for them on other dice.
    pub fn plan(&self) -> RollPlan {
        let kind = match self.mode {
            RollMode::Single => RollKind::Single {
                sides: self.single.sides.clone(),
                advantage: if self.single_is_d20() {
                    self.single.advantage
                } else {
                    Advantage::Normal
                },
            },
            RollMode::Same => RollKind::Same {
                count: self.same.count.clone(),
                sides: self.same.sides.clone(),
            },
            RollMode::Mixed => RollKind::Mixed {
                pool: self.mixed.pool.clone(),
            },
        };
        RollPlan {
            modifier: self.modifier.clone(),
            kind,
        }
    }

    /// Loads a plan into the fields of its mode and switches to that mode.
    /// Fields belonging to the other modes keep their values.
    pub fn load_plan(&mut self, plan: RollPlan) {
        self.mode = plan.mode();
        self.modifier = plan.modifier;
        match plan.kind {
            RollKind::Single { sides, advantage } => {
                self.single = SingleConfig { sides, advantage };
            }
            RollKind::Same { count, sides } => {
                self.same = SameConfig { count, sides };
            }
            RollKind::Mixed { pool } => {
                self.mixed = MixedConfig { pool };
            }
        }
    }

    /// Snapshot for sharing. Fields that do not read as numbers fall back to
    /// their defaults.
    pub fn share_state(&self) -> ShareState {
        ShareState {
            mode: self.mode,
            modifier: coerce_integer(&self.modifier).unwrap_or(0),
            single: SingleShare {
                sides: coerce_integer(&self.single.sides).unwrap_or(DEFAULT_SINGLE_SIDES),
                roll_type: self.single.advantage,
            },
            same: SameShare {
                count: coerce_integer(&self.same.count).unwrap_or(DEFAULT_SAME_COUNT),
                sides: coerce_integer(&self.same.sides).unwrap_or(DEFAULT_SAME_SIDES),
            },
            mixed: MixedShare {
                pool: self
                    .mixed
                    .pool
                    .iter()
                    .map(|row| PoolShare {
                        count: coerce_integer(&row.count).unwrap_or(DEFAULT_ROW_COUNT),
                        sides: coerce_integer(&row.sides).unwrap_or(DEFAULT_ROW_SIDES),
                    })
                    .collect(),
            },
        }
    }

    /// Applies every field the patch carries and leaves the rest untouched.
    pub fn apply(&mut self, patch: SharePatch) {
        if let Some(mode) = patch.mode {
            self.mode = mode;
        }
        if let Some(modifier) = patch.modifier {
            self.modifier = modifier.into();
        }
        if let Some(single) = patch.single {
            if let Some(sides) = single.sides {
                self.single.sides = sides.into();
            }
            if let Some(advantage) = single.roll_type {
                self.single.advantage = advantage;
            }
        }
        if let Some(same) = patch.same {
            if let Some(count) = same.count {
                self.same.count = count.into();
            }
            if let Some(sides) = same.sides {
                self.same.sides = sides.into();
            }
        }
        if let Some(pool) = patch.pool {
            self.mixed.pool = pool;
        }
    }

    /// Appends a fresh 1d6 row and returns its id.
    pub fn add_row(&mut self) -> RowId {
        let row = PoolRow::new(DEFAULT_ROW_COUNT, DEFAULT_ROW_SIDES);
        let id = row.id;
        self.mixed.pool.push(row);
        id
    }

    /// Removes a row. The last remaining row cannot be removed.
    pub fn remove_row(&mut self, id: RowId) -> bool {
        if self.mixed.pool.len() <= 1 {
            return false;
        }
        let before = self.mixed.pool.len();
        self.mixed.pool.retain(|row| row.id != id);
        self.mixed.pool.len() != before
    }

    pub fn update_row(
        &mut self,
        id: RowId,
        count: Option<RawValue>,
        sides: Option<RawValue>,
    ) -> bool {
        let Some(row) = self.mixed.pool.iter_mut().find(|row| row.id == id) else {
            return false;
        };
        if let Some(count) = count {
            row.count = count;
        }
        if let Some(sides) = sides {
            row.sides = sides;
        }
        true
    }

    /// Dice across the pool, counting rows whose count is not a number as zero.
    /// Saturates instead of overflowing on absurd counts.
    pub fn total_pool_dice(&self) -> i64 {
        self.mixed
            .pool
            .iter()
            .map(|row| coerce_integer(&row.count).unwrap_or(0))
            .fold(0i64, |acc, n| acc.saturating_add(n))
    }

    pub fn roll_button_label(&self) -> String {
        match self.mode {
            RollMode::Single => {
                let sides = coerce_integer(&self.single.sides).unwrap_or(DEFAULT_SINGLE_SIDES);
                match (sides, self.single.advantage) {
                    (20, Advantage::Advantage) => "Roll Advantage".to_string(),
                    (20, Advantage::Disadvantage) => "Roll Disadvantage".to_string(),
                    _ => format!("Roll 1d{sides}"),
                }
            }
            RollMode::Same => format!("Roll {}d{}", self.same.count, self.same.sides),
            RollMode::Mixed => "Roll Pool".to_string(),
        }
    }
}
