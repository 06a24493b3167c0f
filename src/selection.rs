//! Normalization of stored pick selections and the "did this pick win" rule.
//!
//! Older pick rows carry an untyped `selection` column that may hold a team
//! abbreviation, a full team name, or a Python-style dict literal such as
//! `{'name': 'Buffalo Bills', 'abbreviation': 'BUF'}`. Everything that scores a
//! pick goes through [`normalize`] and [`is_correct`] so there is a single
//! definition of correctness.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TeamSelection {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub abbreviation: String,
}

impl TeamSelection {
    pub fn new(name: impl Into<String>, abbreviation: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            abbreviation: abbreviation.into(),
        }
    }

    /// A plain string stands for both the name and the abbreviation.
    pub fn literal(raw: &str) -> Self {
        Self::new(raw, raw)
    }
}

/// A selection as it comes out of storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionValue {
    Mapping(TeamSelection),
    Text(String),
}

pub fn normalize(value: &SelectionValue) -> TeamSelection {
    match value {
        SelectionValue::Mapping(team) => team.clone(),
        SelectionValue::Text(raw) => normalize_str(raw),
    }
}

pub fn normalize_str(raw: &str) -> TeamSelection {
    if looks_like_mapping(raw) {
        return parse_mapping(raw).unwrap_or_else(|| TeamSelection::literal(raw));
    }
    TeamSelection::literal(raw)
}

/// Exact, case-sensitive match of the pick's abbreviation or name against the
/// stored winner. "Kansas City Chiefs" does not match a winner of "KC".
pub fn is_correct(pick: &TeamSelection, winner: &str) -> bool {
    if winner.is_empty() {
        return false;
    }
    (!pick.abbreviation.is_empty() && pick.abbreviation == winner)
        || (!pick.name.is_empty() && pick.name == winner)
}

fn looks_like_mapping(raw: &str) -> bool {
    raw.starts_with('{') && raw.ends_with('}')
}

fn parse_mapping(raw: &str) -> Option<TeamSelection> {
    let json = raw.replace('\'', "\"");
    let map: Map<String, Value> = serde_json::from_str(&json).ok()?;
    Some(TeamSelection {
        name: string_field(&map, "name"),
        abbreviation: string_field(&map, "abbreviation"),
    })
}

fn string_field(map: &Map<String, Value>, key: &str) -> String {
    match map.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
