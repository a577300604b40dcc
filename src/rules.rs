pub mod dice;
pub mod engine;
pub mod validation;
