use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::HubError;

pub type Keywords = BTreeMap<String, String>;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    S1A,
    S1B,
    S2A,
    S2B,
    S3A,
    S3B,
}

impl Platform {
    pub fn as_token(self) -> &'static str {
        match self {
            Platform::S1A => "S1A*",
            Platform::S1B => "S1B*",
            Platform::S2A => "S2A*",
            Platform::S2B => "S2B*",
            Platform::S3A => "S3A*",
            Platform::S3B => "S3B*",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_token())
    }
}

impl FromStr for Platform {
    type Err = HubError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_uppercase();
        match normalized.trim_end_matches('*') {
            "S1A" => Ok(Platform::S1A),
            "S1B" => Ok(Platform::S1B),
            "S2A" => Ok(Platform::S2A),
            "S2B" => Ok(Platform::S2B),
            "S3A" => Ok(Platform::S3A),
            "S3B" => Ok(Platform::S3B),
            _ => Err(HubError::InvalidPlatform(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateField {
    #[default]
    BeginPosition,
    EndPosition,
    IngestionDate,
}

impl DateField {
    pub fn as_str(self) -> &'static str {
        match self {
            DateField::BeginPosition => "beginPosition",
            DateField::EndPosition => "endPosition",
            DateField::IngestionDate => "ingestionDate",
        }
    }
}

impl fmt::Display for DateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DateField {
    type Err = HubError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "beginposition" => Ok(DateField::BeginPosition),
            "endposition" => Ok(DateField::EndPosition),
            "ingestiondate" => Ok(DateField::IngestionDate),
            _ => Err(HubError::InvalidDateField(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateInput {
    Calendar(NaiveDate),
    Timestamp(DateTime<Utc>),
}

impl DateInput {
    fn as_start(self) -> Result<DateTime<Utc>, HubError> {
        match self {
            DateInput::Calendar(date) => date
                .and_hms_opt(0, 0, 0)
                .map(|value| value.and_utc())
                .ok_or_else(|| HubError::InvalidDate(date.to_string())),
            DateInput::Timestamp(value) => Ok(value),
        }
    }

    fn as_end(self) -> Result<DateTime<Utc>, HubError> {
        match self {
            DateInput::Calendar(date) => date
                .and_hms_milli_opt(23, 59, 59, 999)
                .map(|value| value.and_utc())
                .ok_or_else(|| HubError::InvalidDate(date.to_string())),
            DateInput::Timestamp(value) => Ok(value),
        }
    }
}

impl FromStr for DateInput {
    type Err = HubError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            return Ok(DateInput::Calendar(date));
        }
        if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(DateInput::Timestamp(timestamp.with_timezone(&Utc)));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
            return Ok(DateInput::Timestamp(naive.and_utc()));
        }
        Err(HubError::InvalidDate(value.to_string()))
    }
}

impl From<NaiveDate> for DateInput {
    fn from(value: NaiveDate) -> Self {
        DateInput::Calendar(value)
    }
}

impl From<DateTime<Utc>> for DateInput {
    fn from(value: DateTime<Utc>) -> Self {
        DateInput::Timestamp(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFilter {
    pub field: DateField,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateFilter {
    pub fn resolve(
        start: Option<DateInput>,
        end: Option<DateInput>,
        field: DateField,
    ) -> Result<Option<Self>, HubError> {
        Self::resolve_at(start, end, field, Utc::now())
    }

    pub fn resolve_at(
        start: Option<DateInput>,
        end: Option<DateInput>,
        field: DateField,
        now: DateTime<Utc>,
    ) -> Result<Option<Self>, HubError> {
        let start = match (start, end) {
            (None, None) => return Ok(None),
            (None, Some(_)) => return Err(HubError::MissingStartDate),
            (Some(start), _) => start.as_start()?,
        };
        let end = match end {
            Some(end) => end.as_end()?,
            None => now,
        };
        Ok(Some(Self { field, start, end }))
    }

    pub fn clause(&self) -> String {
        format!(
            " AND {}:[{} TO {}]",
            self.field,
            format_timestamp(&self.start),
            format_timestamp(&self.end)
        )
    }
}

pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_keyword(value: &str) -> Result<(String, String), HubError> {
    let (key, val) = value
        .split_once('=')
        .ok_or_else(|| HubError::InvalidKeyword(value.to_string()))?;
    let key = key.trim();
    if key.is_empty() || val.trim().is_empty() {
        return Err(HubError::InvalidKeyword(value.to_string()));
    }
    Ok((key.to_string(), val.trim().to_string()))
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}
