//! Resource manifest, shell list and the deployment that bundles them.
//!
//! The build step emits a flat map from resource key to a 32-character hex
//! fingerprint plus the ordered list of shell keys needed to boot the app:
//!
//! ```json
//! {
//!   "resources": { "index.html": "87d3ef166ea445aeea314e5b96ca64da", "/": "87d3..." },
//!   "shell": ["main.dart.js", "index.html"]
//! }
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};

/// Synthetic key for the application entry document.
pub const ROOT_KEY: &str = "/";

/// Length of a fingerprint in hex characters.
pub const FINGERPRINT_LEN: usize = 32;

/// Mapping from resource key to content fingerprint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, String>",
    into = "BTreeMap<String, String>"
)]
pub struct ResourceManifest {
    resources: BTreeMap<String, String>,
}

impl ResourceManifest {
    /// Build a manifest, rejecting empty keys and malformed fingerprints.
    pub fn new(resources: BTreeMap<String, String>) -> SyncResult<Self> {
        for (key, fingerprint) in &resources {
            if key.is_empty() {
                return Err(SyncError::Manifest {
                    message: "empty resource key".to_string(),
                });
            }
            if !is_fingerprint(fingerprint) {
                return Err(SyncError::Manifest {
                    message: format!("bad fingerprint for {}: {:?}", key, fingerprint),
                });
            }
        }
        Ok(Self { resources })
    }

    pub fn from_json(json: &str) -> SyncResult<Self> {
        Self::from_slice(json.as_bytes())
    }

    pub fn from_slice(bytes: &[u8]) -> SyncResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| SyncError::Manifest {
            message: format!("failed to parse manifest: {}", e),
        })
    }

    pub fn to_json(&self) -> SyncResult<String> {
        serde_json::to_string(&self.resources).map_err(|e| SyncError::Manifest {
            message: format!("failed to serialize manifest: {}", e),
        })
    }

    pub fn fingerprint(&self, key: &str) -> Option<&str> {
        self.resources.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.resources.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Whether content cached under `previous` is still the version this
    /// manifest names for `key`.
    ///
    /// False when the key was dropped from this manifest or its fingerprint
    /// changed (including keys `previous` never knew).
    pub fn is_current(&self, key: &str, previous: &ResourceManifest) -> bool {
        match self.fingerprint(key) {
            Some(current) => previous.fingerprint(key) == Some(current),
            None => false,
        }
    }

    /// Manifest keys not in `present`, in manifest order.
    pub fn missing_from(&self, present: &HashSet<String>) -> Vec<String> {
        self.resources
            .keys()
            .filter(|key| !present.contains(key.as_str()))
            .cloned()
            .collect()
    }
}

impl TryFrom<BTreeMap<String, String>> for ResourceManifest {
    type Error = SyncError;

    fn try_from(resources: BTreeMap<String, String>) -> SyncResult<Self> {
        Self::new(resources)
    }
}

impl From<ResourceManifest> for BTreeMap<String, String> {
    fn from(manifest: ResourceManifest) -> Self {
        manifest.resources
    }
}

fn is_fingerprint(value: &str) -> bool {
    value.len() == FINGERPRINT_LEN && value.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Ordered list of resource keys that must be present to boot the app.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShellList(Vec<String>);

impl ShellList {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(keys.into_iter().map(Into::into).collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Manifest plus shell list, as emitted by the build step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub resources: ResourceManifest,
    pub shell: ShellList,
}

impl Deployment {
    pub fn new(resources: ResourceManifest, shell: ShellList) -> SyncResult<Self> {
        let deployment = Self { resources, shell };
        deployment.validate()?;
        Ok(deployment)
    }

    pub fn from_json(json: &str) -> SyncResult<Self> {
        let deployment: Self = serde_json::from_str(json).map_err(|e| SyncError::Deployment {
            message: format!("failed to parse deployment: {}", e),
        })?;
        deployment.validate()?;
        Ok(deployment)
    }

    /// Read and validate a deployment file.
    pub async fn load(path: &Path) -> SyncResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SyncError::Deployment {
                message: format!("failed to read {}: {}", path.display(), e),
            })?;
        Self::from_json(&content)
    }

    /// Every shell key must be a known resource.
    pub fn validate(&self) -> SyncResult<()> {
        let unknown: Vec<&str> = self
            .shell
            .iter()
            .filter(|key| !self.resources.contains(key))
            .collect();
        if !unknown.is_empty() {
            return Err(SyncError::Deployment {
                message: format!("shell keys missing from manifest: {}", unknown.join(", ")),
            });
        }
        Ok(())
    }
}
