//! Client semver comparison for the version gate.
//!
//! Deliberately hand-rolled rather than pulled from the `semver` crate: the
//! gate only ever needs to compare three-part `major.minor.patch` tuples
//! lexicographically, exactly the algorithm the policy describes, and no
//! pre-release/build-metadata parsing is in scope.

use std::cmp::Ordering;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClientVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("\"{0}\" is not a valid major.minor.patch version")]
pub struct ParseVersionError(String);

impl ClientVersion {
    /// Parse a `major.minor.patch` string. Anything trailing the patch
    /// component (a pre-release tag, build metadata) is ignored rather than
    /// rejected, since clients are free to report it and the gate only cares
    /// about the three leading numeric components.
    pub fn parse(raw: &str) -> Result<Self, ParseVersionError> {
        let mut parts = raw.splitn(3, '.');
        let major = parts
            .next()
            .ok_or_else(|| ParseVersionError(raw.to_string()))?;
        let minor = parts.next().unwrap_or("0");
        let patch_raw = parts.next().unwrap_or("0");
        // Strip anything after the patch number that isn't a digit (e.g. "3-beta.1").
        let patch = patch_raw
            .split(|c: char| !c.is_ascii_digit())
            .next()
            .unwrap_or("0");

        let major: u64 = major
            .parse()
            .map_err(|_| ParseVersionError(raw.to_string()))?;
        let minor: u64 = minor
            .parse()
            .map_err(|_| ParseVersionError(raw.to_string()))?;
        let patch: u64 = patch
            .parse()
            .map_err(|_| ParseVersionError(raw.to_string()))?;

        Ok(Self {
            major,
            minor,
            patch,
        })
    }

    #[must_use]
    pub fn satisfies_minimum(&self, minimum: &Self) -> bool {
        self.cmp(minimum) != Ordering::Less
    }
}

impl fmt::Display for ClientVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_three_part_version() {
        let v = ClientVersion::parse("1.4.2").unwrap();
        assert_eq!(
            v,
            ClientVersion {
                major: 1,
                minor: 4,
                patch: 2
            }
        );
    }

    #[test]
    fn missing_components_default_to_zero() {
        assert_eq!(
            ClientVersion::parse("2").unwrap(),
            ClientVersion {
                major: 2,
                minor: 0,
                patch: 0
            }
        );
        assert_eq!(
            ClientVersion::parse("2.5").unwrap(),
            ClientVersion {
                major: 2,
                minor: 5,
                patch: 0
            }
        );
    }

    #[test]
    fn pre_release_suffix_is_ignored() {
        let v = ClientVersion::parse("1.2.3-beta.1").unwrap();
        assert_eq!(v, ClientVersion::parse("1.2.3").unwrap());
    }

    #[test]
    fn rejects_non_numeric_major() {
        assert!(ClientVersion::parse("v1.2.3").is_err());
    }

    #[test]
    fn satisfies_minimum_is_lexicographic() {
        let minimum = ClientVersion::parse("1.4.0").unwrap();
        assert!(ClientVersion::parse("1.4.0").unwrap().satisfies_minimum(&minimum));
        assert!(ClientVersion::parse("1.4.1").unwrap().satisfies_minimum(&minimum));
        assert!(ClientVersion::parse("2.0.0").unwrap().satisfies_minimum(&minimum));
        assert!(!ClientVersion::parse("1.3.9").unwrap().satisfies_minimum(&minimum));
    }

    #[test]
    fn display_round_trips_through_parse() {
        let v = ClientVersion::parse("3.0.1").unwrap();
        assert_eq!(ClientVersion::parse(&v.to_string()).unwrap(), v);
    }
}
