use lazy_static::lazy_static;
use regex::Regex;
use schemars::JsonSchema;
use serde::{de::Error as SerdeError, Deserialize, Serialize};
use std::fmt;

lazy_static! {
    static ref VERSION_RE: Regex =
        Regex::new(r"^(\d+)\.(\d+)\.(\d+)(?:-([0-9A-Za-z.-]+))?$").unwrap();
}

/// SemanticVersion wraps a `MAJOR.MINOR.PATCH[-tag]` string and compares
/// structurally rather than lexically.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SemanticVersion {
    raw: String,
    major: u64,
    minor: u64,
    patch: u64,
    tag: Option<String>,
}

impl SemanticVersion {
    pub fn parse(s: impl Into<String>) -> Result<Self, String> {
        let raw = s.into();
        let caps = VERSION_RE
            .captures(&raw)
            .ok_or_else(|| format!("'{raw}' is not a valid MAJOR.MINOR.PATCH[-tag] version"))?;

        Ok(SemanticVersion {
            major: caps[1].parse().unwrap(),
            minor: caps[2].parse().unwrap(),
            patch: caps[3].parse().unwrap(),
            tag: caps.get(4).map(|m| m.as_str().to_string()),
            raw,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl PartialOrd for SemanticVersion {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SemanticVersion {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.major, self.minor, self.patch).cmp(&(other.major, other.minor, other.patch))
    }
}

impl Serialize for SemanticVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SemanticVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        SemanticVersion::parse(raw).map_err(D::Error::custom)
    }
}

/// Hand-written rather than derived since `SemanticVersion` round-trips
/// through a plain string, not its field layout.
impl JsonSchema for SemanticVersion {
    fn schema_name() -> String {
        "SemanticVersion".to_string()
    }

    fn json_schema(_gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        serde_json::from_value(serde_json::json!({
            "type": "string",
            "pattern": r"^\d+\.\d+\.\d+(-[0-9A-Za-z.-]+)?$",
        }))
        .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_version() {
        let v = SemanticVersion::parse("1.2.3").unwrap();
        assert_eq!(v.major, 1);
        assert_eq!(v.minor, 2);
        assert_eq!(v.patch, 3);
        assert_eq!(v.tag, None);
    }

    #[test]
    fn parses_tagged_version() {
        let v = SemanticVersion::parse("1.2.3-beta.1").unwrap();
        assert_eq!(v.tag.as_deref(), Some("beta.1"));
    }

    #[test]
    fn rejects_malformed_version() {
        assert!(SemanticVersion::parse("1.2").is_err());
        assert!(SemanticVersion::parse("v1.2.3").is_err());
    }

    #[test]
    fn orders_structurally_not_lexically() {
        let a = SemanticVersion::parse("1.9.0").unwrap();
        let b = SemanticVersion::parse("1.10.0").unwrap();
        assert!(a < b);
    }
}
