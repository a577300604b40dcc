//! Share tokens: a roll configuration packed into a URL-safe string.
//!
//! A token is the compact JSON form of a [`ShareState`] run through base64
//! with the URL alphabet and no padding. Decoding is defensive: every field of
//! the payload is checked on its own, and only the well-formed ones make it
//! into the resulting [`SharePatch`].

use base64::{
    Engine as _,
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::rules::{
    dice::{Advantage, PoolRow, RollMode},
    validation::coerce_integer,
};

/// Query parameter that carries the token in a share link.
pub const SHARE_PARAM: &str = "s";

/// Count and sides given to a decoded pool row whose own values are unusable.
const FALLBACK_ROW_COUNT: i64 = 1;
const FALLBACK_ROW_SIDES: i64 = 6;

const TOKEN_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("share token is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("share token is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("share token is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("share token does not hold an object")]
    NotAnObject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleShare {
    pub sides: i64,
    pub roll_type: Advantage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SameShare {
    pub count: i64,
    pub sides: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolShare {
    pub count: i64,
    pub sides: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MixedShare {
    pub pool: Vec<PoolShare>,
}

/// The serializable snapshot of a roll configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareState {
    pub mode: RollMode,
    pub modifier: i64,
    pub single: SingleShare,
    pub same: SameShare,
    pub mixed: MixedShare,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SinglePatch {
    pub sides: Option<i64>,
    pub roll_type: Option<Advantage>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SamePatch {
    pub count: Option<i64>,
    pub sides: Option<i64>,
}

/// The usable parts of a decoded token. Absent fields were missing or
/// malformed in the payload and must be left alone when applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SharePatch {
    pub mode: Option<RollMode>,
    pub modifier: Option<i64>,
    pub single: Option<SinglePatch>,
    pub same: Option<SamePatch>,
    pub pool: Option<Vec<PoolRow>>,
}

impl SharePatch {
    pub fn is_empty(&self) -> bool {
        self.mode.is_none()
            && self.modifier.is_none()
            && self.single.is_none()
            && self.same.is_none()
            && self.pool.is_none()
    }

    fn from_object(object: &Map<String, Value>) -> Self {
        let mode = object
            .get("mode")
            .and_then(Value::as_str)
            .and_then(RollMode::from_name);

        let modifier = object
            .get("modifier")
            .filter(|v| v.is_number())
            .and_then(coerce_integer);

        let single = object
            .get("single")
            .and_then(Value::as_object)
            .map(|single| SinglePatch {
                sides: present_integer(single, "sides"),
                roll_type: single
                    .get("rollType")
                    .and_then(Value::as_str)
                    .and_then(Advantage::from_name),
            });

        let same = object
            .get("same")
            .and_then(Value::as_object)
            .map(|same| SamePatch {
                count: present_integer(same, "count"),
                sides: present_integer(same, "sides"),
            });

        let pool = object
            .get("mixed")
            .and_then(Value::as_object)
            .and_then(|mixed| mixed.get("pool"))
            .and_then(Value::as_array)
            .map(|rows| rows.iter().map(pool_row_from_value).collect());

        Self {
            mode,
            modifier,
            single,
            same,
            pool,
        }
    }
}

fn present_integer(object: &Map<String, Value>, key: &str) -> Option<i64> {
    object
        .get(key)
        .filter(|v| !v.is_null())
        .and_then(coerce_integer)
}

/// Rows never carry their id through a token, every decoded row gets a new one.
fn pool_row_from_value(value: &Value) -> PoolRow {
    let field = |key: &str| value.get(key).and_then(coerce_integer);
    PoolRow::new(
        field("count").unwrap_or(FALLBACK_ROW_COUNT),
        field("sides").unwrap_or(FALLBACK_ROW_SIDES),
    )
}

pub fn encode(state: &ShareState) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(state)?;
    Ok(TOKEN_ENGINE.encode(json))
}

pub fn decode(token: &str) -> Result<SharePatch, DecodeError> {
    let bytes = TOKEN_ENGINE.decode(token.trim())?;
    let text = String::from_utf8(bytes)?;
    let value: Value = serde_json::from_str(&text)?;
    let object = value.as_object().ok_or(DecodeError::NotAnObject)?;
    Ok(SharePatch::from_object(object))
}

/// Decodes either a bare token or a query string / link carrying one.
pub fn decode_link(token_or_query: &str) -> Result<SharePatch, DecodeError> {
    decode(token_from_query(token_or_query).unwrap_or(token_or_query))
}

/// Builds the `s=<token>` query pair for a share link.
pub fn share_query(token: &str) -> String {
    format!("{SHARE_PARAM}={token}")
}

/// Picks the token out of a query string such as `?s=abc&x=1`. A bare token
/// without any `=` is returned as is.
pub fn token_from_query(query: &str) -> Option<&str> {
    let query = query.rsplit_once('?').map_or(query, |(_, q)| q);
    if !query.contains('=') {
        return Some(query).filter(|q| !q.is_empty());
    }
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == SHARE_PARAM)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}
