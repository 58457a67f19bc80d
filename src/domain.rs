//! Validated domain names.

use crate::error::Error;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;

lazy_static! {
    // Labels are alphanumeric with internal hyphens. At least two labels, and the last one
    // starts with a letter.
    static ref DOMAIN_RE: Regex = Regex::new(
        r"^[a-zA-Z0-9]([a-zA-Z0-9-]*[a-zA-Z0-9])?(\.[a-zA-Z0-9]([a-zA-Z0-9-]*[a-zA-Z0-9])?)*\.[a-zA-Z]([a-zA-Z0-9-]*[a-zA-Z0-9])?$"
    )
    .unwrap();
}

/// A domain name that satisfies the hostname grammar.
///
/// The text is kept as given: no case folding and no trailing dot handling, since
/// the value is substituted verbatim into configuration files.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Domain(String);

impl Domain {
    /// Validate `s` and wrap it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDomain`] if `s` doesn't match the hostname grammar.
    pub fn parse(s: &str) -> Result<Self, Error> {
        if DOMAIN_RE.is_match(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(Error::InvalidDomain(s.to_string()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Domain {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Domain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Domain {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Domain::parse(&s).map_err(serde::de::Error::custom)
    }
}
