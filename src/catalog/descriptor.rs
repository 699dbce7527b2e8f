//! Feature descriptor data structures.
//!
//! This module defines the read-only metadata a device profile publishes for
//! each feature:
//! - `FeatureId`: stringified integer identifier used as the catalog key
//! - `Access`: read/write permission of a feature
//! - `FeatureDescriptor`: display name, access, enumeration and range

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Marker that separates program features from every other feature.
///
/// Program names look like `Dishcare.Dishwasher.Program.Eco50` or
/// `BSH.Common.Program.Favorite.001`.
pub const PROGRAM_MARKER: &str = ".Program.";

/// Feature identifier, always the stringified form of an integer uid.
///
/// Device profiles key their feature tables by the decimal text of the uid
/// while frames carry the uid as a JSON integer. Every lookup goes through
/// this type so the two forms are never compared directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureId(String);

impl FeatureId {
    /// Create from an integer uid
    pub fn from_int(uid: i64) -> Self {
        Self(uid.to_string())
    }

    /// Create from a JSON uid, accepting integers and numeric text.
    ///
    /// Inbound value reports are trusted to carry integer uids; anything
    /// else is stringified as-is so unknown ids still produce a key.
    pub fn from_json(value: &Value) -> Self {
        Self(json_to_key(value))
    }

    /// Create from an integer-typed JSON uid only.
    pub fn from_json_int(value: &Value) -> Option<Self> {
        if value.is_i64() || value.is_u64() {
            Some(Self(value.to_string()))
        } else {
            None
        }
    }

    /// Get the stringified id
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for FeatureId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for FeatureId {
    fn from(uid: i64) -> Self {
        Self::from_int(uid)
    }
}

/// Stringify a JSON scalar the way device profiles write enumeration keys.
pub(crate) fn json_to_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Access level declared for a feature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// Readable only
    Read,
    /// Writable only, legacy spelling
    Write,
    /// Readable and writable
    ReadWrite,
    /// Writable, never reported
    WriteOnly,
    /// Explicitly inaccessible
    None,
    /// Anything else, kept verbatim
    Other(String),
}

impl Access {
    /// Parse an access level, ignoring case (`readWrite`, `ReadWrite`, ...)
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "read" => Access::Read,
            "write" => Access::Write,
            "readwrite" => Access::ReadWrite,
            "writeonly" => Access::WriteOnly,
            "none" => Access::None,
            _ => Access::Other(s.to_string()),
        }
    }

    /// Only `readwrite` and `writeonly` features accept writes.
    pub fn is_writable(&self) -> bool {
        matches!(self, Access::ReadWrite | Access::WriteOnly)
    }

    /// Canonical text for this access level
    pub fn as_str(&self) -> &str {
        match self {
            Access::Read => "read",
            Access::Write => "write",
            Access::ReadWrite => "readwrite",
            Access::WriteOnly => "writeonly",
            Access::None => "none",
            Access::Other(s) => s,
        }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Access {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Access {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Access::parse(&raw))
    }
}

/// Metadata for one device feature.
///
/// Immutable once the catalog is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureDescriptor {
    /// Catalog key, filled in by the catalog from the map key
    #[serde(skip)]
    pub id: Option<FeatureId>,
    /// Dotted path, last segment is the display name
    pub name: String,
    /// Access level (absent on some read-only status features)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<Access>,
    /// Raw value -> label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<BTreeMap<String, String>>,
    /// Inclusive lower bound
    #[serde(
        default,
        deserialize_with = "de_opt_int",
        skip_serializing_if = "Option::is_none"
    )]
    pub min: Option<i64>,
    /// Inclusive upper bound
    #[serde(
        default,
        deserialize_with = "de_opt_int",
        skip_serializing_if = "Option::is_none"
    )]
    pub max: Option<i64>,
}

impl FeatureDescriptor {
    /// Create a descriptor with a name and nothing else
    pub fn new(name: &str) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            access: None,
            values: None,
            min: None,
            max: None,
        }
    }

    /// Set access level
    pub fn with_access(mut self, access: Access) -> Self {
        self.access = Some(access);
        self
    }

    /// Add an enumerated value
    pub fn with_value(mut self, raw: &str, label: &str) -> Self {
        self.values
            .get_or_insert_with(BTreeMap::new)
            .insert(raw.to_string(), label.to_string());
        self
    }

    /// Set the inclusive range
    pub fn with_range(mut self, min: i64, max: i64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    /// Final segment of the dotted name.
    pub fn display_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Whether the name sits in a program namespace
    pub fn is_program(&self) -> bool {
        self.name.contains(PROGRAM_MARKER)
    }

    /// Label for a stringified raw value, if enumerated
    pub fn label(&self, raw: &str) -> Option<&str> {
        self.values
            .as_ref()
            .and_then(|values| values.get(raw))
            .map(String::as_str)
    }

    /// Whether a range constraint is declared
    pub fn has_range(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }
}

/// Accept bounds written as numbers or numeric text (`"0"`, `"100"`).
fn de_opt_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let raw = Option::<Value>::deserialize(deserializer)?;
    match raw {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => number_to_int(n.as_i64(), n.as_f64())
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("bound {n} is not an integer"))),
        Some(Value::String(s)) => {
            let s = s.trim();
            if let Ok(v) = s.parse::<i64>() {
                return Ok(Some(v));
            }
            number_to_int(None, s.parse::<f64>().ok())
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("bound {s:?} is not an integer")))
        },
        Some(other) => Err(serde::de::Error::custom(format!(
            "bound {other} is not an integer"
        ))),
    }
}

#[allow(clippy::cast_precision_loss)]
fn number_to_int(int: Option<i64>, float: Option<f64>) -> Option<i64> {
    if int.is_some() {
        return int;
    }
    float
        .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
        .map(|f| f as i64)
}
