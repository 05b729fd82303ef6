use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;

/// Timestamp layout written into every new entry (local time).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A leaderboard value as found on disk.
///
/// Older files stored the value as an integer score or as a string; current
/// code always writes `Float` seconds. All three read back without error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScoreValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl ScoreValue {
    /// Numeric value in seconds, if this value has one.
    pub fn as_seconds(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v).filter(|v| v.is_finite()),
            Self::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        }
    }

    fn as_text(&self) -> Cow<'_, str> {
        match self {
            Self::Text(s) => Cow::Borrowed(s),
            other => Cow::Owned(other.to_string()),
        }
    }

    /// Ordering used for ranking, smaller (faster) first.
    ///
    /// Values with a numeric reading compare numerically whatever their
    /// stored shape. Values without one compare as strings and rank after
    /// every numeric value, which keeps the order total.
    pub fn tolerant_cmp(&self, other: &Self) -> Ordering {
        match (self.as_seconds(), other.as_seconds()) {
            (Some(a), Some(b)) => a.total_cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.as_text().cmp(&other.as_text()),
        }
    }
}

impl fmt::Display for ScoreValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for ScoreValue {
    fn from(seconds: f64) -> Self {
        Self::Float(seconds)
    }
}

/// One leaderboard document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    #[serde(default, alias = "Score", alias = "score")]
    pub value: Option<ScoreValue>,
    #[serde(default, alias = "Timestamp", deserialize_with = "null_as_empty")]
    pub timestamp: String,
    /// Only present in older files; carried through rewrites untouched.
    #[serde(default, alias = "PlayerName", skip_serializing_if = "Option::is_none")]
    pub player_name: Option<String>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl ScoreEntry {
    /// A new entry for a completion time, stamped with the current local time.
    pub fn now(seconds: f64) -> Self {
        Self {
            value: Some(ScoreValue::Float(seconds)),
            timestamp: chrono::Local::now().format(TIMESTAMP_FORMAT).to_string(),
            player_name: None,
        }
    }

    pub fn seconds(&self) -> Option<f64> {
        self.value.as_ref().and_then(ScoreValue::as_seconds)
    }
}

/// Ranking order for entries: by [`ScoreValue::tolerant_cmp`], entries with
/// no value last.
pub fn compare_entries(a: &ScoreEntry, b: &ScoreEntry) -> Ordering {
    match (&a.value, &b.value) {
        (Some(a), Some(b)) => a.tolerant_cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
