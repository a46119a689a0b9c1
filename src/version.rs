use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Semantic version: `MAJOR.MINOR.PATCH[-prerelease][+build]`
///
/// Ordering follows semver precedence. Build metadata is kept for display but ignored
/// for equality and ordering.
#[derive(Debug, Clone, Default)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub prerelease: Vec<String>,
    pub build: Vec<String>,
}

impl Version {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            prerelease: Vec::new(),
            build: Vec::new(),
        }
    }

    pub fn with_prerelease<I, S>(mut self, identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prerelease = identifiers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_build<I, S>(mut self, identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.build = identifiers.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_prerelease(&self) -> bool {
        !self.prerelease.is_empty()
    }
}

fn identifiers(part: &str, original: &str) -> Result<Vec<String>> {
    let identifiers: Vec<String> = part.split('.').map(str::to_string).collect();
    if identifiers.iter().any(|identifier| identifier.is_empty()) {
        return Err(Error::InvalidVersion(original.to_string()));
    }
    Ok(identifiers)
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidVersion(s.to_string());

        let (rest, build) = match s.split_once('+') {
            Some((rest, build)) => (rest, identifiers(build, s)?),
            None => (s, Vec::new()),
        };
        let (core, prerelease) = match rest.split_once('-') {
            Some((core, prerelease)) => (core, identifiers(prerelease, s)?),
            None => (rest, Vec::new()),
        };

        let numbers = core
            .split('.')
            .map(|part| part.parse::<u64>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>>>()?;
        let [major, minor, patch] = numbers[..] else {
            return Err(invalid());
        };

        Ok(Self {
            major,
            minor,
            patch,
            prerelease,
            build,
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if !self.prerelease.is_empty() {
            write!(f, "-{}", self.prerelease.join("."))?;
        }
        if !self.build.is_empty() {
            write!(f, "+{}", self.build.join("."))?;
        }
        Ok(())
    }
}

fn compare_identifiers(lhs: &str, rhs: &str) -> Ordering {
    match (lhs.parse::<u64>(), rhs.parse::<u64>()) {
        (Ok(lhs), Ok(rhs)) => lhs.cmp(&rhs),
        // numeric identifiers have lower precedence than alphanumeric ones
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => lhs.cmp(rhs),
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (self.is_prerelease(), other.is_prerelease()) {
                (false, false) => Ordering::Equal,
                (false, true) => Ordering::Greater,
                (true, false) => Ordering::Less,
                (true, true) => self
                    .prerelease
                    .iter()
                    .zip(&other.prerelease)
                    .map(|(lhs, rhs)| compare_identifiers(lhs, rhs))
                    .find(|ordering| ordering.is_ne())
                    .unwrap_or_else(|| self.prerelease.len().cmp(&other.prerelease.len())),
            })
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}
