use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::FetchError;

/// Extension shared by every remote archive and every transient local archive.
pub const ARCHIVE_EXT: &str = "zip";

static RESOURCE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").unwrap());

/// Name of one benchmark archive. Used verbatim as a URL segment and as a path
/// component under the output root, so it never contains separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceName(String);

impl ResourceName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn archive_file_name(&self) -> String {
        format!("{}.{ARCHIVE_EXT}", self.0)
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ResourceName {
    type Err = FetchError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        if !RESOURCE_NAME_RE.is_match(normalized) {
            return Err(FetchError::InvalidResourceName(value.to_string()));
        }
        Ok(Self(normalized.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_benchmark_names() {
        for name in ["mapf-map", "mapf-scen-random", "dao", "wc3maps512", "bg_512.v2"] {
            let parsed: ResourceName = name.parse().unwrap();
            assert_eq!(parsed.as_str(), name);
        }
    }

    #[test]
    fn rejects_names_that_escape_the_output_root() {
        for name in ["", "   ", "../etc", "a/b", "a\\b", ".hidden", "name with space"] {
            assert!(name.parse::<ResourceName>().is_err(), "accepted {name:?}");
        }
    }

    #[test]
    fn archive_file_name_uses_zip_extension() {
        let name: ResourceName = "alpha".parse().unwrap();
        assert_eq!(name.archive_file_name(), "alpha.zip");
    }
}
