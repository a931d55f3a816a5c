use std::{fmt, ops::Deref, str::FromStr, sync::LazyLock};

use non_empty_string::NonEmptyString;
use regex::Regex;
use serde::{Deserialize, Serialize};

static CODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("code pattern is valid"));

/// A stable, per-form identifier for a form item.
///
/// Codes are used as path segments when one question addresses another, so
/// they must be valid XML element names: a letter or underscore followed by
/// letters, digits or underscores.
///
/// Examples: `q7`, `grp12`, `household_size`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Code(NonEmptyString);

impl Code {
    /// Creates a new `Code` from a string.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCodeError`] if the string is empty or is not a valid
    /// element name.
    pub fn new(s: String) -> Result<Self, InvalidCodeError> {
        if !CODE_PATTERN.is_match(&s) {
            return Err(InvalidCodeError(s));
        }
        let non_empty = NonEmptyString::new(s).map_err(InvalidCodeError)?;
        Ok(Self(non_empty))
    }

    /// Returns the string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for Code {
    type Error = InvalidCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Code {
    type Error = InvalidCodeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value.to_string())
    }
}

impl From<Code> for String {
    fn from(code: Code) -> Self {
        code.0.as_str().to_string()
    }
}

impl AsRef<str> for Code {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl Deref for Code {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.0.as_str()
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Code {
    type Err = InvalidCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

/// Error returned when a string is not a usable item code.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error(
    "Invalid code '{0}': must start with a letter or underscore and contain only letters, digits \
     and underscores"
)]
pub struct InvalidCodeError(String);

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("q7"; "question code")]
    #[test_case("grp12"; "group code")]
    #[test_case("_hidden"; "leading underscore")]
    #[test_case("household_size_2"; "underscores and digits")]
    fn accepts_valid_codes(raw: &str) {
        let code = Code::try_from(raw).unwrap();
        assert_eq!(code.as_str(), raw);
    }

    #[test_case(""; "empty")]
    #[test_case("7q"; "leading digit")]
    #[test_case("q 7"; "whitespace")]
    #[test_case("q/7"; "path separator")]
    #[test_case("q'7"; "quote")]
    fn rejects_invalid_codes(raw: &str) {
        assert_eq!(
            Code::try_from(raw).unwrap_err(),
            InvalidCodeError(raw.to_string())
        );
    }

    #[test]
    fn deserializes_with_validation() {
        let code: Code = serde_json::from_str("\"q1\"").unwrap();
        assert_eq!(code.as_str(), "q1");
        assert!(serde_json::from_str::<Code>("\"1q\"").is_err());
    }
}
