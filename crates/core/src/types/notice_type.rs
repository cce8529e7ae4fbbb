//! Notice severity

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

/// Severity of a notice, used by the presentation layer to pick a style
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeType {
    Info,
    Success,
    #[default]
    Warning,
    Error,
}

impl NoticeType {
    pub const ALL: [NoticeType; 4] = [
        NoticeType::Info,
        NoticeType::Success,
        NoticeType::Warning,
        NoticeType::Error,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            NoticeType::Info => "info",
            NoticeType::Success => "success",
            NoticeType::Warning => "warning",
            NoticeType::Error => "error",
        }
    }

    /// Interpret a stored value, falling back to `Warning` for anything unknown or missing
    #[must_use]
    pub fn normalize(raw: Option<&str>) -> Self {
        raw.and_then(|value| value.parse().ok()).unwrap_or_default()
    }
}

impl Display for NoticeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoticeType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| {
                Error::validation(
                    "type",
                    format!("'{trimmed}' is not one of info, success, warning, error"),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_strict() {
        assert_eq!("success".parse::<NoticeType>().unwrap(), NoticeType::Success);
        assert_eq!(" ERROR ".parse::<NoticeType>().unwrap(), NoticeType::Error);
        assert!(matches!(
            "critical".parse::<NoticeType>(),
            Err(Error::Validation { .. })
        ));
    }

    #[test]
    fn test_normalize_defaults_to_warning() {
        assert_eq!(NoticeType::normalize(None), NoticeType::Warning);
        assert_eq!(NoticeType::normalize(Some("")), NoticeType::Warning);
        assert_eq!(NoticeType::normalize(Some("bogus")), NoticeType::Warning);
        assert_eq!(NoticeType::normalize(Some("info")), NoticeType::Info);
    }

    #[test]
    fn test_serde_uses_lowercase_names() {
        let json = serde_json::to_string(&NoticeType::Success).unwrap();
        assert_eq!(json, "\"success\"");
    }
}
