use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{ExamIdError, UnsupportedFormat};

/// Numeric exam identifier accepted by the crawler backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExamId(String);

impl ExamId {
    /// Trims surrounding whitespace and requires a non-empty run of ASCII digits.
    pub fn parse(raw: &str) -> Result<Self, ExamIdError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ExamIdError::Empty);
        }
        if !is_all_digits(trimmed) {
            return Err(ExamIdError::NotNumeric(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ExamId {
    type Error = ExamIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ExamId> for String {
    fn from(value: ExamId) -> Self {
        value.0
    }
}

/// Whether the exam id input box should be flagged while the user is typing.
///
/// Empty input is not flagged; anything non-empty that is not purely digits is.
/// The raw value is checked untrimmed, so stray whitespace is flagged too.
pub fn exam_id_input_flagged(value: &str) -> bool {
    !value.is_empty() && !is_all_digits(value)
}

fn is_all_digits(value: &str) -> bool {
    value.chars().all(|c| c.is_ascii_digit())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    #[default]
    Csv,
    Xlsx,
    Json,
    Xml,
}

impl FileFormat {
    pub const ALL: [FileFormat; 4] = [Self::Csv, Self::Xlsx, Self::Json, Self::Xml];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
            Self::Json => "json",
            Self::Xml => "xml",
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileFormat {
    type Err = UnsupportedFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| format.as_str() == lowered)
            .ok_or_else(|| UnsupportedFormat(s.trim().to_string()))
    }
}

/// Opaque token the backend hands out for one crawl run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
