use crate::rules::{
    dice::{Advantage, PoolRow},
    engine::{RollKind, RollPlan},
};
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit1, space0, space1},
    combinator::{all_consuming, map, map_res, opt},
    multi::many0,
    sequence::{pair, preceded},
};

/// Parses dice notation into a roll plan.
///
/// One die (`d20`, `1d20 adv`) becomes a single roll, several dice of one kind
/// (`4d6+2`) a uniform roll, and terms joined with `+` (`2d20 + 1d8 - 1`) a
/// mixed pool. Counts and sides are not range-checked here; that happens when
/// the plan is rolled.
pub fn parse_roll(input: &str) -> anyhow::Result<RollPlan> {
    let res = all_consuming(roll_notation).parse(input.trim());

    let Ok((_, (terms, modifier, advantage))) = res else {
        anyhow::bail!("Failed to parse roll notation: {input:?}");
    };

    let kind = match terms.as_slice() {
        [(1, sides)] => RollKind::single(*sides, advantage.unwrap_or_default()),
        _ if advantage.is_some() => {
            anyhow::bail!("Advantage and disadvantage only apply to a single d20")
        }
        [(count, sides)] => RollKind::same(*count, *sides),
        _ => RollKind::Mixed {
            pool: terms
                .iter()
                .map(|&(count, sides)| PoolRow::new(count, sides))
                .collect(),
        },
    };

    Ok(RollPlan::new(modifier.unwrap_or(0), kind))
}

type Notation = (Vec<(u32, u32)>, Option<i64>, Option<Advantage>);

fn roll_notation(input: &str) -> IResult<&str, Notation> {
    let (input, (first, rest, modifier, advantage)) = (
        dice_term,
        many0(preceded((space0, char('+'), space0), dice_term)),
        opt(preceded(space0, modifier)),
        opt(preceded(space1, advantage)),
    )
        .parse(input)?;

    let mut terms = vec![first];
    terms.extend(rest);

    Ok((input, (terms, modifier, advantage)))
}

fn dice_term(input: &str) -> IResult<&str, (u32, u32)> {
    map(
        pair(
            opt(map_res(digit1, |s: &str| s.parse::<u32>())),
            preceded(
                alt((char('d'), char('D'))),
                map_res(digit1, |s: &str| s.parse::<u32>()),
            ),
        ),
        |(count, sides)| (count.unwrap_or(1), sides),
    )
    .parse(input)
}

fn modifier(input: &str) -> IResult<&str, i64> {
    map(
        pair(
            alt((char('+'), char('-'))),
            preceded(space0, map_res(digit1, |s: &str| s.parse::<i64>())),
        ),
        |(sign, value)| if sign == '-' { -value } else { value },
    )
    .parse(input)
}

fn advantage(input: &str) -> IResult<&str, Advantage> {
    alt((
        map(tag("adv"), |_| Advantage::Advantage),
        map(tag("dis"), |_| Advantage::Disadvantage),
    ))
    .parse(input)
}
