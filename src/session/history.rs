use std::collections::VecDeque;

use derive_more::IntoIterator;
use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthStr;

use crate::rules::dice::RollResult;

pub const HISTORY_CAP: usize = 50;

/// Past rolls, newest first, never more than [`HISTORY_CAP`] of them.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize, IntoIterator)]
#[serde(transparent)]
pub struct History {
    entries: VecDeque<RollResult>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entry: RollResult) {
        let mut buf = String::new();
        buf.push_str(&format_emoji(roll_emoji(&entry), 2));
        buf.push(' ');
        entry.pretty_print(&mut buf).ok();
        log::debug!("{}", buf);

        self.entries.push_front(entry);
        self.entries.truncate(HISTORY_CAP);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn latest(&self) -> Option<&RollResult> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RollResult> {
        self.entries.iter()
    }

    /// One line per entry, newest first, with the labels padded into a column.
    pub fn pretty_print(&self, f: &mut impl std::fmt::Write) -> std::fmt::Result {
        let label_cells = self
            .entries
            .iter()
            .map(|entry| entry.label.width())
            .max()
            .unwrap_or(0);

        writeln!(f, "History ({}/{})", self.len(), HISTORY_CAP)?;
        for entry in &self.entries {
            let emoji = format_emoji(roll_emoji(entry), 2);
            let label = pad_cells(&entry.label, label_cells);
            write!(f, "{emoji} {label}  subtotal {}", entry.subtotal)?;
            if entry.modifier != 0 {
                write!(f, " {:+}", entry.modifier)?;
            }
            writeln!(f, " = {}  [{}]", entry.total, entry.timestamp)?;
        }
        Ok(())
    }
}

fn roll_emoji(entry: &RollResult) -> &'static str {
    if entry.has_natural_20() {
        "💥"
    } else if entry.has_natural_1() {
        "💀"
    } else {
        "🎲"
    }
}

fn emoji_emoji_presentation(s: &str) -> String {
    if s.chars().any(|c| c == '\u{FE0F}' || c == '\u{200D}') {
        s.to_string()
    } else {
        format!("{s}\u{FE0F}")
    }
}

fn pad_cells(s: &str, field_cells: usize) -> String {
    let w = s.width();
    let pad = field_cells.saturating_sub(w);
    format!("{s}{}", " ".repeat(pad))
}

fn format_emoji(emoji: &str, field_cells: usize) -> String {
    let e = emoji_emoji_presentation(emoji);
    pad_cells(&e, field_cells)
}
