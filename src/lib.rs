pub mod roll_parser;
pub mod rules;
pub mod session;
pub mod share;
pub mod statistics;

pub mod prelude {
    pub use crate::{
        roll_parser::parse_roll,
        rules::{
            dice::{Advantage, DiceGroup, Keep, KeepMeta, PoolRow, RollMode, RollResult},
            engine::{RollKind, RollPlan, execute_roll},
            validation::{
                MAX_DICE, RawValue, ValidationError, coerce_integer, validate_count,
                validate_modifier, validate_sides,
            },
        },
        session::{Session, config::RollConfig, history::History},
        share::{DecodeError, SharePatch, ShareState, decode, decode_link, encode},
        statistics::roller::{DieSampler, Roller, roll_die},
    };
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test]
    fn test_demo() -> anyhow::Result<()> {
        let mut table = Session::new(Roller::from_seed(7));
        table.config.load_plan(parse_roll("2d20 + 1d8 + 3")?);

        for _ in 0..10 {
            let result = table.roll()?;
            assert_eq!(result.label, "2d20 + 1d8");
            assert_eq!(result.total, result.subtotal + 3);
            assert!((6..=51).contains(&result.total));
        }

        let token = table.share_token()?;
        let mut other = Session::new(Roller::from_seed(8));
        other.restore(&token)?;
        assert_eq!(other.config.share_state(), table.config.share_state());
        assert_eq!(other.config.plan().mode(), RollMode::Mixed);

        let mut buf = String::new();
        table.history.pretty_print(&mut buf)?;
        println!("{buf}");
        assert_eq!(table.history.len(), 10);

        Ok(())
    }
}
