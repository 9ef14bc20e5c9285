//! Release - Version comparison and release-gated features
//!
//! Template releases are version strings such as "10.5" or "1.25.4". They are
//! parsed leniently into semantic versions, missing components being zero.
//! A [`Feature`] is available on a release when the release falls inside
//! one of its [`ReleaseSpan`]s.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use semver::Version;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{0}' is not a valid release")]
pub struct InvalidRelease(pub String);

/// A feature is not available on a release
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{feature} is not available on release {release}")]
pub struct IncompatibleRelease {
    pub feature: String,
    pub release: String,
}

/// A parsed release
///
/// Equality and ordering look at the version only, so "10.5" equals "10.5.0".
#[derive(Debug, Clone)]
pub struct Release {
    version: Version,
    original: String,
}

impl Release {
    pub fn parse(s: &str) -> Result<Self, InvalidRelease> {
        let trimmed = s.trim().trim_start_matches('v');
        let (core, rest) = match trimmed.find(['-', '+']) {
            Some(pos) => trimmed.split_at(pos),
            None => (trimmed, ""),
        };
        let mut parts: Vec<&str> = core.split('.').collect();
        if parts.is_empty() || parts.len() > 3 || parts.iter().any(|p| p.is_empty()) {
            return Err(InvalidRelease(s.to_string()));
        }
        while parts.len() < 3 {
            parts.push("0");
        }
        let normalized = format!("{}{}", parts.join("."), rest);
        let version = Version::parse(&normalized).map_err(|_| InvalidRelease(s.to_string()))?;
        Ok(Self {
            version,
            original: s.to_string(),
        })
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Strictly newer than `other`
    pub fn check_if_ahead(&self, other: &Release) -> bool {
        self.version > other.version
    }

    /// Strictly older than `other`
    pub fn check_if_behind(&self, other: &Release) -> bool {
        self.version < other.version
    }

    pub fn check_if_equal(&self, other: &Release) -> bool {
        self.version == other.version
    }

    /// Whether `feature` is available on this release
    pub fn check(&self, feature: &Feature) -> Result<(), IncompatibleRelease> {
        if feature.spans.iter().any(|span| span.contains(self)) {
            Ok(())
        } else {
            Err(IncompatibleRelease {
                feature: feature.description.clone(),
                release: self.original.clone(),
            })
        }
    }
}

impl FromStr for Release {
    type Err = InvalidRelease;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Release::parse(s)
    }
}

impl fmt::Display for Release {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl PartialEq for Release {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
    }
}

impl Eq for Release {}

impl std::hash::Hash for Release {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.version.hash(state);
    }
}

impl PartialOrd for Release {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Release {
    fn cmp(&self, other: &Self) -> Ordering {
        self.version.cmp(&other.version)
    }
}

/// A range of releases; `end == None` is open-ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseSpan {
    start: Release,
    end: Option<Release>,
}

impl ReleaseSpan {
    /// # Panics
    ///
    /// Panics when `start` is ahead of `end`.
    pub fn new(start: Release, end: Option<Release>) -> Self {
        if let Some(end) = &end {
            assert!(
                !start.check_if_ahead(end),
                "release span start {} is ahead of its end {}",
                start,
                end
            );
        }
        Self { start, end }
    }

    pub fn contains(&self, release: &Release) -> bool {
        if release.check_if_equal(&self.start) {
            return true;
        }
        if let Some(end) = &self.end
            && release.check_if_equal(end)
        {
            return true;
        }
        release.check_if_ahead(&self.start)
            && self.end.as_ref().is_none_or(|end| release.check_if_behind(end))
    }
}

/// A capability available on a set of release spans
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    pub description: String,
    spans: Vec<ReleaseSpan>,
}

impl Feature {
    /// # Panics
    ///
    /// Panics when `spans` is empty.
    pub fn new(description: impl Into<String>, spans: Vec<ReleaseSpan>) -> Self {
        assert!(!spans.is_empty(), "a feature needs at least one release span");
        Self {
            description: description.into(),
            spans,
        }
    }

    /// Feature available from `start` onwards
    ///
    /// # Panics
    ///
    /// Panics when `start` is not a valid release literal.
    pub fn since(description: impl Into<String>, start: &str) -> Self {
        let start = Release::parse(start).unwrap_or_else(|e| panic!("{}", e));
        Self::new(description, vec![ReleaseSpan::new(start, None)])
    }
}
