pub mod config;
pub mod history;

use crate::{
    rules::{
        dice::{RollMode, RollResult},
        validation::ValidationError,
    },
    session::{config::RollConfig, history::History},
    share::{self, DecodeError},
    statistics::roller::DieSampler,
};

/// One user's dice table: the configuration being edited, the roll history,
/// and the most recent result.
pub struct Session<S: DieSampler = crate::statistics::roller::Roller> {
    pub roller: S,
    pub config: RollConfig,
    pub history: History,
    last_roll: Option<RollResult>,
}

impl<S: DieSampler> Session<S> {
    pub fn new(roller: S) -> Self {
        Self {
            roller,
            config: RollConfig::new(),
            history: History::new(),
            last_roll: None,
        }
    }

    /// Rolls the current configuration and records the result.
    ///
    /// A failed validation records nothing and leaves the last roll in place.
    pub fn roll(&mut self) -> Result<&RollResult, ValidationError> {
        let result = self.config.plan().roll(&mut self.roller)?;
        self.history.record(result.clone());
        Ok(self.last_roll.insert(result))
    }

    pub fn last_roll(&self) -> Option<&RollResult> {
        self.last_roll.as_ref()
    }

    pub fn set_mode(&mut self, mode: RollMode) {
        self.config.mode = mode;
    }

    pub fn clear_last_roll(&mut self) {
        self.last_roll = None;
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn clear_all(&mut self) {
        self.clear_last_roll();
        self.clear_history();
    }

    pub fn share_token(&self) -> Result<String, serde_json::Error> {
        share::encode(&self.config.share_state())
    }

    /// Restores the configuration from a share token, or from a query string
    /// carrying one.
    ///
    /// An unreadable token changes nothing. The caller is expected to drop
    /// the token afterwards rather than try it again.
    pub fn restore(&mut self, token_or_query: &str) -> Result<(), DecodeError> {
        match share::decode_link(token_or_query) {
            Ok(patch) => {
                log::info!("Restoring shared configuration");
                self.config.apply(patch);
                Ok(())
            }
            Err(e) => {
                log::warn!("Discarding share token: {e}");
                Err(e)
            }
        }
    }
}
