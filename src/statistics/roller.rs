use rand::{Rng, SeedableRng, rngs::StdRng};

/// A source of die results: one uniform sample in `[1, sides]` per call.
///
/// The roll engine takes its randomness through this trait so that tests can
/// script exact results.
pub trait DieSampler {
    fn sample(&mut self, sides: u32) -> u32;

    fn sample_many(&mut self, sides: u32, count: u32) -> Vec<u32> {
        (0..count).map(|_| self.sample(sides)).collect()
    }
}

#[derive(Debug)]
pub struct Roller {
    rng: StdRng,
}

impl Roller {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let rng = StdRng::from_os_rng();
        Roller { rng }
    }

    pub fn from_seed(seed: u64) -> Self {
        let rng = StdRng::seed_from_u64(seed);
        Roller { rng }
    }

    pub fn d(&mut self, die_size: u32) -> u32 {
        self.rng.random_range(1..=die_size)
    }

    #[cfg(test)]
    pub fn test_rng() -> Self {
        Self::from_seed(42)
    }
}

impl DieSampler for Roller {
    fn sample(&mut self, sides: u32) -> u32 {
        self.d(sides)
    }
}

/// Rolls one die on the thread-local generator. `sides` must be at least 1.
pub fn roll_die(sides: u32) -> u32 {
    rand::rng().random_range(1..=sides)
}

/// Replays a fixed sequence of results, in order.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct ScriptedRoller {
    values: std::collections::VecDeque<u32>,
    pub calls: Vec<u32>,
}

#[cfg(test)]
impl ScriptedRoller {
    pub fn new(values: impl IntoIterator<Item = u32>) -> Self {
        Self {
            values: values.into_iter().collect(),
            calls: Vec::new(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

#[cfg(test)]
impl DieSampler for ScriptedRoller {
    fn sample(&mut self, sides: u32) -> u32 {
        let value = self
            .values
            .pop_front()
            .expect("scripted roller ran out of values");
        assert!(
            (1..=sides).contains(&value),
            "scripted value {value} does not fit a d{sides}"
        );
        self.calls.push(sides);
        value
    }
}
