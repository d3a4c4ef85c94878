use crate::utils::error::{GatePassError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 放行單類型：RGP（可返還）或 NRGP（不可返還）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PassType {
    #[serde(rename = "RGP")]
    Returnable,
    #[serde(rename = "NRGP")]
    NonReturnable,
}

impl PassType {
    pub fn from_returnable(is_returnable: bool) -> Self {
        if is_returnable {
            Self::Returnable
        } else {
            Self::NonReturnable
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Returnable => "RGP",
            Self::NonReturnable => "NRGP",
        }
    }
}

impl fmt::Display for PassType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for PassType {
    type Err = GatePassError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "RGP" => Ok(Self::Returnable),
            "NRGP" => Ok(Self::NonReturnable),
            other => Err(GatePassError::validation(
                "pass_type",
                format!("'{}' is not a pass type, expected RGP or NRGP", other),
            )),
        }
    }
}

/// April-to-March financial year, identified by the last two digits of its
/// start year. Displays as "YYXX", e.g. `2526` for April 2025 - March 2026.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FinancialYear {
    start: u8,
}

impl FinancialYear {
    /// `start_year` is a full calendar year; only its last two digits are kept.
    pub fn starting_in(start_year: i32) -> Self {
        Self {
            start: start_year.rem_euclid(100) as u8,
        }
    }

    pub fn start_digits(&self) -> u8 {
        self.start
    }

    pub fn end_digits(&self) -> u8 {
        (self.start + 1) % 100
    }

    pub fn code(&self) -> String {
        format!("{:02}{:02}", self.start, self.end_digits())
    }
}

impl fmt::Display for FinancialYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}{:02}", self.start, self.end_digits())
    }
}

impl FromStr for FinancialYear {
    type Err = GatePassError;

    fn from_str(s: &str) -> Result<Self> {
        if s.len() != 4 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(GatePassError::validation(
                "financial_year",
                format!("'{}' must be four digits, e.g. 2526", s),
            ));
        }

        let start: u8 = s[..2]
            .parse()
            .map_err(|_| GatePassError::validation("financial_year", "invalid start year"))?;
        let end: u8 = s[2..]
            .parse()
            .map_err(|_| GatePassError::validation("financial_year", "invalid end year"))?;

        let year = Self { start };
        if year.end_digits() != end {
            return Err(GatePassError::validation(
                "financial_year",
                format!("'{}' does not span consecutive years", s),
            ));
        }
        Ok(year)
    }
}

impl Serialize for FinancialYear {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.code())
    }
}

impl<'de> Deserialize<'de> for FinancialYear {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// 持久化的計數器列
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceCounter {
    pub id: i64,
    pub financial_year: FinancialYear,
    pub pass_type: PassType,
    pub current_sequence: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Per-year view returned to non-admin callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearSequence {
    pub pass_type: PassType,
    pub current_sequence: u32,
}

impl From<SequenceCounter> for YearSequence {
    fn from(counter: SequenceCounter) -> Self {
        Self {
            pass_type: counter.pass_type,
            current_sequence: counter.current_sequence,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatePassNumber {
    pub pass_type: PassType,
    pub financial_year: FinancialYear,
    pub sequence: u32,
}

/// Result of a successful allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocatedGatePass {
    pub gate_pass_number: String,
    pub financial_year: FinancialYear,
    pub pass_type: PassType,
    pub sequence_number: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatePassGenerateRequest {
    #[serde(default)]
    pub is_returnable: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SequenceUpdate {
    pub current_sequence: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Employee,
    Manager,
    Security,
    Logistics,
    Admin,
}

impl Role {
    pub fn is_privileged(&self) -> bool {
        matches!(self, Self::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Employee => "employee",
            Self::Manager => "manager",
            Self::Security => "security",
            Self::Logistics => "logistics",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = GatePassError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "employee" => Ok(Self::Employee),
            "manager" => Ok(Self::Manager),
            "security" => Ok(Self::Security),
            "logistics" => Ok(Self::Logistics),
            "admin" => Ok(Self::Admin),
            other => Err(GatePassError::validation("role", format!("unknown role '{}'", other))),
        }
    }
}
