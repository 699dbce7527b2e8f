//! Feature catalog for device profiles.
//!
//! The catalog maps each feature uid to its descriptor. It is supplied once,
//! fully populated, when a device handler is built and is never mutated by
//! the protocol core.
//!
//! # Example
//! ```
//! use hcdev::catalog::{Access, FeatureCatalog, FeatureDescriptor};
//!
//! let catalog = FeatureCatalog::from_json(r#"{
//!     "539": {"name": "BSH.Common.Setting.PowerState", "access": "readWrite",
//!             "values": {"1": "Off", "2": "On"}}
//! }"#).unwrap();
//!
//! let power = catalog.get("539").unwrap();
//! assert_eq!(power.display_name(), "PowerState");
//! assert_eq!(power.access, Some(Access::ReadWrite));
//! ```

mod descriptor;

pub use descriptor::{Access, FeatureDescriptor, FeatureId, PROGRAM_MARKER};
pub(crate) use descriptor::json_to_key;

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{HcError, Result};

/// Read-only uid -> descriptor mapping
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "HashMap<FeatureId, FeatureDescriptor>")]
pub struct FeatureCatalog {
    features: HashMap<FeatureId, FeatureDescriptor>,
}

impl From<HashMap<FeatureId, FeatureDescriptor>> for FeatureCatalog {
    fn from(mut features: HashMap<FeatureId, FeatureDescriptor>) -> Self {
        for (id, desc) in &mut features {
            desc.id = Some(id.clone());
        }
        Self { features }
    }
}

impl FromIterator<(FeatureId, FeatureDescriptor)> for FeatureCatalog {
    fn from_iter<I: IntoIterator<Item = (FeatureId, FeatureDescriptor)>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<HashMap<_, _>>())
    }
}

impl FeatureCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a descriptor (builder style, for construction only)
    pub fn with_feature(mut self, uid: i64, mut desc: FeatureDescriptor) -> Self {
        let id = FeatureId::from_int(uid);
        desc.id = Some(id.clone());
        self.features.insert(id, desc);
        self
    }

    /// Parse the JSON feature table of a device profile
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load the JSON feature table from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            HcError::Config(format!(
                "Failed to read feature catalog {}: {e}",
                path.display()
            ))
        })?;
        let catalog = Self::from_json(&content)?;
        tracing::debug!(
            path = %path.display(),
            features = catalog.len(),
            "Loaded feature catalog"
        );
        Ok(catalog)
    }

    /// Look up a descriptor by stringified uid
    pub fn get(&self, id: &str) -> Option<&FeatureDescriptor> {
        self.features.get(id)
    }

    /// Whether the uid is known
    pub fn contains(&self, id: &str) -> bool {
        self.features.contains_key(id)
    }

    /// Number of features
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Iterate over all descriptors
    pub fn iter(&self) -> impl Iterator<Item = (&FeatureId, &FeatureDescriptor)> {
        self.features.iter()
    }
}
