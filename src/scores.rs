use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

/// Competition years the data job publishes. 2021 had no official season.
pub const SUPPORTED_YEARS: &[u16] = &[
    2000, 2001, 2002, 2003, 2004, 2005, 2006, 2007, 2008, 2009, 2010, 2011, 2012, 2013, 2014,
    2015, 2016, 2017, 2018, 2019, 2020, 2022, 2023, 2024,
];

pub const DEFAULT_YEAR: u16 = 2024;

pub const MATCH_URL_BASE: &str = "https://www.thebluealliance.com/match";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum YearError {
    #[error("year {0} is not a supported competition year")]
    Unsupported(u16),
    #[error("invalid year: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Year(u16);

impl Year {
    pub fn new(year: u16) -> Result<Self, YearError> {
        if SUPPORTED_YEARS.contains(&year) {
            Ok(Self(year))
        } else {
            Err(YearError::Unsupported(year))
        }
    }

    pub fn get(self) -> u16 {
        self.0
    }

    pub fn all() -> impl DoubleEndedIterator<Item = Year> {
        SUPPORTED_YEARS.iter().map(|y| Year(*y))
    }

    fn position(self) -> usize {
        SUPPORTED_YEARS
            .iter()
            .position(|y| *y == self.0)
            .unwrap_or(SUPPORTED_YEARS.len() - 1)
    }

    /// Next newer supported year, saturating at the newest.
    pub fn next(self) -> Self {
        let idx = (self.position() + 1).min(SUPPORTED_YEARS.len() - 1);
        Self(SUPPORTED_YEARS[idx])
    }

    /// Next older supported year, saturating at the oldest.
    pub fn prev(self) -> Self {
        Self(SUPPORTED_YEARS[self.position().saturating_sub(1)])
    }
}

impl Default for Year {
    fn default() -> Self {
        Self(DEFAULT_YEAR)
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Year {
    type Err = YearError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let year = raw
            .parse::<u16>()
            .map_err(|_| YearError::Invalid(raw.to_string()))?;
        Year::new(year)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllianceColor {
    Red,
    Blue,
}

impl AllianceColor {
    pub fn opposite(self) -> Self {
        match self {
            AllianceColor::Red => AllianceColor::Blue,
            AllianceColor::Blue => AllianceColor::Red,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FirstOccurrence {
    pub key: String,
    #[serde(default, deserialize_with = "de_epoch_secs")]
    pub actual_time: Option<i64>,
    #[serde(default, deserialize_with = "de_team_list")]
    pub winning_alliance: Vec<u32>,
    #[serde(default, deserialize_with = "de_team_list")]
    pub losing_alliance: Vec<u32>,
    pub winning_color: AllianceColor,
}

impl FirstOccurrence {
    pub fn losing_color(&self) -> AllianceColor {
        self.winning_color.opposite()
    }

    pub fn match_url(&self) -> String {
        match_url(&self.key)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScoreRecord {
    pub count: u32,
    pub winning_score: u32,
    pub losing_score: u32,
    pub first: FirstOccurrence,
}

impl ScoreRecord {
    /// Unordered score pair normalized as (high, low).
    pub fn pair(&self) -> (u32, u32) {
        normalize_pair(self.winning_score, self.losing_score)
    }

    pub fn score_label(&self) -> String {
        format!("{} - {}", self.winning_score, self.losing_score)
    }
}

pub fn normalize_pair(a: u32, b: u32) -> (u32, u32) {
    if a >= b { (a, b) } else { (b, a) }
}

pub fn match_url(key: &str) -> String {
    format!("{MATCH_URL_BASE}/{key}")
}

pub fn roster_label(teams: &[u32]) -> String {
    teams
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatasetError {
    #[error("duplicate score pair {high}-{low} at rows {first} and {second}")]
    DuplicatePair {
        high: u32,
        low: u32,
        first: usize,
        second: usize,
    },
}

/// Score records for one year, at most one per unordered score pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<ScoreRecord>,
    last_updated: Option<String>,
}

impl Dataset {
    pub fn new(records: Vec<ScoreRecord>) -> Result<Self, DatasetError> {
        let mut seen: HashMap<(u32, u32), usize> = HashMap::with_capacity(records.len());
        for (idx, record) in records.iter().enumerate() {
            let pair = record.pair();
            if let Some(first) = seen.insert(pair, idx) {
                return Err(DatasetError::DuplicatePair {
                    high: pair.0,
                    low: pair.1,
                    first,
                    second: idx,
                });
            }
        }
        Ok(Self {
            records,
            last_updated: None,
        })
    }

    pub fn with_last_updated(mut self, stamp: Option<String>) -> Self {
        self.last_updated = stamp.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn records(&self) -> &[ScoreRecord] {
        &self.records
    }

    pub fn last_updated(&self) -> Option<&str> {
        self.last_updated.as_deref()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct ScoresEnvelope {
    #[serde(default)]
    data: Vec<ScoreRecord>,
    #[serde(default)]
    last_updated: Option<String>,
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid scores json: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] DatasetError),
}

pub fn parse_scores_json(raw: &str) -> Result<Dataset, ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Dataset::default());
    }
    let envelope: ScoresEnvelope = serde_json::from_str(trimmed)?;
    Ok(Dataset::new(envelope.data)?.with_last_updated(envelope.last_updated))
}

fn de_epoch_secs<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(secs) => Ok(Some(secs)),
            None => n
                .as_f64()
                .filter(|f| f.is_finite() && (i64::MIN as f64..=i64::MAX as f64).contains(f))
                .map(|f| Some(f as i64))
                .ok_or_else(|| serde::de::Error::custom(format!("invalid actual_time: {n}"))),
        },
        Some(other) => Err(serde::de::Error::custom(format!(
            "actual_time must be a number or null, got {other}"
        ))),
    }
}

fn de_team_list<'de, D>(deserializer: D) -> Result<Vec<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    let mut teams = Vec::with_capacity(values.len());
    for value in values {
        let team = match &value {
            Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            Value::String(s) => s.trim().trim_start_matches("frc").parse::<u32>().ok(),
            _ => None,
        };
        match team {
            Some(team) => teams.push(team),
            None => {
                return Err(serde::de::Error::custom(format!(
                    "invalid team number: {value}"
                )));
            }
        }
    }
    Ok(teams)
}
