use serde::{Deserialize, Serialize};

/// Most dice a single roll may throw, in one group or across a mixed pool.
pub const MAX_DICE: u32 = 200;
pub const MAX_SIDES: i64 = 1_000_000;
pub const MAX_MODIFIER: i64 = 1_000_000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Sides must be a number.")]
    SidesNotANumber,
    #[error("Sides must be at least 2.")]
    SidesTooSmall,
    #[error("Sides is too large.")]
    SidesTooLarge,
    #[error("Count must be a number.")]
    CountNotANumber,
    #[error("Count must be at least 1.")]
    CountTooSmall,
    #[error("Count cannot exceed {}.", MAX_DICE)]
    CountTooLarge,
    #[error("Modifier must be a number.")]
    ModifierNotANumber,
    #[error("Modifier is too large.")]
    ModifierOutOfRange,
    #[error("Row count error: {0}")]
    RowCount(Box<ValidationError>),
    #[error("Row sides error: {0}")]
    RowSides(Box<ValidationError>),
    #[error("Mixed pool must roll at least 2 dice.")]
    PoolTooSmall,
    #[error("Total dice in pool cannot exceed {}.", MAX_DICE)]
    PoolTooLarge,
}

/// A field value exactly as the user typed it, before any validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl Default for RawValue {
    fn default() -> Self {
        RawValue::Number(0.0)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Number(value as f64)
    }
}

impl From<i32> for RawValue {
    fn from(value: i32) -> Self {
        RawValue::Number(value.into())
    }
}

impl From<u32> for RawValue {
    fn from(value: u32) -> Self {
        RawValue::Number(value.into())
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl std::fmt::Display for RawValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            RawValue::Number(n) => write!(f, "{n}"),
            RawValue::Text(text) => write!(f, "{text}"),
        }
    }
}

/// Anything that can be read as a number the way a browser number field would.
pub trait AsNumber {
    fn as_number(&self) -> Option<f64>;
}

impl AsNumber for str {
    fn as_number(&self) -> Option<f64> {
        parse_numeric_text(self)
    }
}

impl AsNumber for String {
    fn as_number(&self) -> Option<f64> {
        parse_numeric_text(self)
    }
}

impl AsNumber for f64 {
    fn as_number(&self) -> Option<f64> {
        Some(*self)
    }
}

macro_rules! impl_as_number_for_int {
    ($($ty:ty),*) => {
        $(
            impl AsNumber for $ty {
                fn as_number(&self) -> Option<f64> {
                    Some(*self as f64)
                }
            }
        )*
    };
}

impl_as_number_for_int!(i32, i64, u32, u64, usize);

impl AsNumber for RawValue {
    fn as_number(&self) -> Option<f64> {
        match self {
            RawValue::Number(n) => Some(*n),
            RawValue::Text(text) => parse_numeric_text(text),
        }
    }
}

impl AsNumber for serde_json::Value {
    fn as_number(&self) -> Option<f64> {
        match self {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(text) => parse_numeric_text(text),
            serde_json::Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            serde_json::Value::Null => Some(0.0),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
        }
    }
}

impl<T: AsNumber + ?Sized> AsNumber for &T {
    fn as_number(&self) -> Option<f64> {
        (**self).as_number()
    }
}

const RADIX_PREFIXES: [(&str, u32); 6] = [
    ("0x", 16),
    ("0X", 16),
    ("0o", 8),
    ("0O", 8),
    ("0b", 2),
    ("0B", 2),
];

fn parse_numeric_text(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }

    for (prefix, radix) in RADIX_PREFIXES {
        if let Some(digits) = trimmed.strip_prefix(prefix) {
            if digits.starts_with(['+', '-']) {
                return None;
            }
            return u64::from_str_radix(digits, radix).ok().map(|v| v as f64);
        }
    }

    // `f64::from_str` also takes "inf" and "nan" spellings, which a number field never does
    if trimmed
        .chars()
        .any(|c| c.is_ascii_alphabetic() && !matches!(c, 'e' | 'E'))
    {
        return None;
    }

    trimmed.parse::<f64>().ok()
}

/// Reads `value` as a number and truncates it toward zero.
///
/// Returns `None` when the value is not a finite number. Magnitudes beyond the
/// `i64` range saturate, so the bound checks downstream still reject them.
pub fn coerce_integer<T: AsNumber + ?Sized>(value: &T) -> Option<i64> {
    value
        .as_number()
        .filter(|n| n.is_finite())
        .map(|n| n.trunc() as i64)
}

pub fn validate_sides<T: AsNumber + ?Sized>(raw: &T) -> Result<u32, ValidationError> {
    let sides = coerce_integer(raw).ok_or(ValidationError::SidesNotANumber)?;
    if sides < 2 {
        return Err(ValidationError::SidesTooSmall);
    }
    if sides > MAX_SIDES {
        return Err(ValidationError::SidesTooLarge);
    }
    Ok(sides as u32)
}

pub fn validate_count<T: AsNumber + ?Sized>(raw: &T) -> Result<u32, ValidationError> {
    let count = coerce_integer(raw).ok_or(ValidationError::CountNotANumber)?;
    if count < 1 {
        return Err(ValidationError::CountTooSmall);
    }
    if count > i64::from(MAX_DICE) {
        return Err(ValidationError::CountTooLarge);
    }
    Ok(count as u32)
}

pub fn validate_modifier<T: AsNumber + ?Sized>(raw: &T) -> Result<i64, ValidationError> {
    let modifier = coerce_integer(raw).ok_or(ValidationError::ModifierNotANumber)?;
    if !(-MAX_MODIFIER..=MAX_MODIFIER).contains(&modifier) {
        return Err(ValidationError::ModifierOutOfRange);
    }
    Ok(modifier)
}
