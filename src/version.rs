//! Normalization of user supplied Java version strings into semver ranges.
//!
//! Accepted input is loose: `8`, `1.8`, `11.x`, `17.0.2`, `14-ea`, or any
//! range expression such as `>=11 <17`. The normalized form is what the rest
//! of the pipeline (cache lookup, catalog narrowing, resolution) works with.

use crate::error::SetupError;
use regex::Regex;
use semver::{Comparator, Op, Version, VersionReq};
use std::fmt;
use std::sync::OnceLock;

const EA_SUFFIX: &str = "-ea";

/// A validated version range.
///
/// Alternatives joined with `||` are kept as separate requirements; a version
/// matches when any alternative matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSpec {
    raw: String,
    alternatives: Vec<VersionReq>,
}

impl VersionSpec {
    pub fn normalize(input: &str) -> Result<Self, SetupError> {
        let invalid = |reason: &str| SetupError::InvalidVersionSpec {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let mut version = input.trim().to_string();

        if let Some(rest) = version.strip_prefix("1.") {
            // 1.8 is the legacy spelling of 8
            if rest.is_empty() {
                return Err(invalid("'1.' is not a valid version"));
            }
            version = rest.to_string();
        }

        if let Some(base) = version.strip_suffix(EA_SUFFIX) {
            if !version.contains('.') {
                version = format!("{}.0.0{}", base, EA_SUFFIX);
            }
            // pre-release identifiers never match wildcards, so widen to a lower bound
            if version.starts_with(|c: char| c.is_ascii_digit()) {
                version = format!(">={}", version);
            }
        } else if version.split('.').count() < 3 && !version.ends_with('x') {
            version.push_str(".x");
        }

        let alternatives = parse_range(&version).map_err(|e| invalid(&e))?;
        Ok(Self {
            raw: version,
            alternatives,
        })
    }

    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|req| req.matches(version))
    }

    /// Matches a version string as published by a catalog or found in the cache.
    /// Strings that are not strict semver never match.
    pub fn matches_str(&self, version: &str) -> bool {
        parse_version(version).is_some_and(|v| self.matches(&v))
    }

    /// The single version this spec pins, when it is written as an exact match.
    pub fn exact_version(&self) -> Option<Version> {
        match self.alternatives.as_slice() {
            [req] => match req.comparators.as_slice() {
                [c] if c.op == Op::Exact => full_version(c),
                _ => None,
            },
            _ => None,
        }
    }

    /// The major version every matching release must have, if there is one.
    pub fn fixed_major(&self) -> Option<u64> {
        let [req] = self.alternatives.as_slice() else {
            return None;
        };
        let mut majors = req.comparators.iter().map(|c| match c.op {
            Op::Exact | Op::Tilde | Op::Wildcard => Some(c.major),
            Op::Caret if c.major > 0 => Some(c.major),
            _ => None,
        });
        let first = majors.next()??;
        majors.all(|m| m == Some(first)).then_some(first)
    }

    /// Whether the range was written against an early-access build.
    pub fn is_prerelease(&self) -> bool {
        self.alternatives
            .iter()
            .flat_map(|req| req.comparators.iter())
            .any(|c| !c.pre.is_empty())
    }

    /// The major of an early-access lower bound such as `>=14.0.0-ea`.
    pub fn early_access_major(&self) -> Option<u64> {
        match self.alternatives.as_slice() {
            [req] => match req.comparators.as_slice() {
                [c] if c.op == Op::GreaterEq && !c.pre.is_empty() => Some(c.major),
                _ => None,
            },
            _ => None,
        }
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn full_version(c: &Comparator) -> Option<Version> {
    Some(Version {
        major: c.major,
        minor: c.minor?,
        patch: c.patch?,
        pre: c.pre.clone(),
        build: semver::BuildMetadata::EMPTY,
    })
}

/// Parses a node-style range. Comparators may be separated by whitespace, and a
/// bare full version means "exactly this version" rather than cargo's caret.
fn parse_range(expression: &str) -> Result<Vec<VersionReq>, String> {
    expression
        .split("||")
        .map(|alternative| {
            let comparators: Vec<String> = alternative
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|token| !token.is_empty())
                .map(to_cargo_comparator)
                .collect();
            if comparators.is_empty() {
                return Err("empty range".to_string());
            }
            VersionReq::parse(&comparators.join(", ")).map_err(|e| e.to_string())
        })
        .collect()
}

fn to_cargo_comparator(token: &str) -> String {
    let token = match token.strip_prefix('v') {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => rest,
        _ => token,
    };
    if let Ok(mut version) = Version::parse(token) {
        version.build = semver::BuildMetadata::EMPTY;
        return format!("={}", version);
    }
    // `<17.x` is `<17` in cargo syntax, which rejects wildcards after an operator
    if token.starts_with(['<', '>', '=', '~', '^']) {
        let mut trimmed = token;
        while let Some(rest) = [".x", ".X", ".*"]
            .iter()
            .find_map(|suffix| trimmed.strip_suffix(suffix))
        {
            trimmed = rest;
        }
        return trimmed.to_string();
    }
    token.to_string()
}

/// Parses a version as published by a vendor, tolerating a leading `v`.
pub fn parse_version(version: &str) -> Option<Version> {
    let version = version.trim();
    Version::parse(version.strip_prefix('v').unwrap_or(version)).ok()
}

/// Drops build metadata, so `11.0.2+9` and `11.0.2` name the same release.
/// Strings that are not strict semver are returned trimmed.
pub fn clean_version(version: &str) -> String {
    match parse_version(version) {
        Some(mut parsed) => {
            parsed.build = semver::BuildMetadata::EMPTY;
            parsed.to_string()
        }
        None => version.trim().to_string(),
    }
}

/// Pulls the first `major[.minor[.patch]]` run out of arbitrary text.
pub fn coerce(text: &str) -> Option<Version> {
    static COERCE: OnceLock<Regex> = OnceLock::new();
    let re = COERCE.get_or_init(|| {
        Regex::new(r"(\d+)(?:\.(\d+))?(?:\.(\d+))?").expect("static regex is valid")
    });

    let caps = re.captures(text)?;
    let part = |i: usize| -> Option<u64> {
        caps.get(i).map_or(Some(0), |m| m.as_str().parse().ok())
    };
    Some(Version::new(part(1)?, part(2)?, part(3)?))
}
