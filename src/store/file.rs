//! File-backed population store.
//!
//! One JSON artifact per key under a root directory:
//!
//! ```text
//! <root>/usa_washington_seattle_metro_5000_<key hash>.json
//! <root>/usa_washington_seattle_metro_5000_ltcf20_tgr_<key hash>.json
//! ```
//!
//! The readable stem is lossy; the trailing key hash keeps names distinct
//! per key.
//!
//! Each artifact carries a manifest (key, schema version, creation time,
//! SHA-256 of the body) and a body of people plus canonical edge lists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use uuid::Uuid;

use crate::canonical::to_canonical_bytes;
use crate::types::{ContactEdge, Layer, Person, Population, PopulationParams, PopulationSource};
use crate::POPULATION_SCHEMA_VERSION;
use super::{LoadError, PopulationKey, PopulationStore, SaveError};

/// Manifest of a population artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactManifest {
    /// Unique identifier of this artifact.
    pub artifact_id: Uuid,
    /// Schema version of the artifact layout.
    pub schema_version: String,
    /// Key the artifact was saved under.
    pub key: PopulationKey,
    /// Number of people in the body.
    pub person_count: usize,
    /// When the artifact was written.
    pub created_at: DateTime<Utc>,
    /// Hex SHA-256 of the canonical body bytes.
    pub checksum: String,
}

/// People and contacts of a population artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactBody {
    /// People, ascending by identifier.
    pub people: Vec<Person>,
    /// Canonical edge list per layer.
    pub layers: BTreeMap<Layer, Vec<ContactEdge>>,
}

impl ArtifactBody {
    fn checksum(&self) -> String {
        hex::encode(Sha256::digest(to_canonical_bytes(self)))
    }
}

/// A complete on-disk population artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationArtifact {
    /// Manifest.
    pub manifest: ArtifactManifest,
    /// Body.
    pub body: ArtifactBody,
}

impl PopulationArtifact {
    /// Package a population for storage under `key`.
    pub fn from_population(key: &PopulationKey, population: &Population) -> Self {
        let body = ArtifactBody {
            people: population.people().cloned().collect(),
            layers: population.edge_lists(),
        };
        let manifest = ArtifactManifest {
            artifact_id: Uuid::new_v4(),
            schema_version: POPULATION_SCHEMA_VERSION.to_string(),
            key: key.clone(),
            person_count: body.people.len(),
            created_at: Utc::now(),
            checksum: body.checksum(),
        };
        Self { manifest, body }
    }

    /// Check the manifest against `key` and the body against the checksum,
    /// then rebuild the population.
    pub fn into_population(self, key: &PopulationKey) -> Result<Population, LoadError> {
        let manifest = self.manifest;
        if manifest.schema_version != POPULATION_SCHEMA_VERSION {
            return Err(LoadError::Incompatible {
                reason: format!(
                    "schema version {} (expected {})",
                    manifest.schema_version, POPULATION_SCHEMA_VERSION
                ),
            });
        }
        if &manifest.key != key {
            return Err(LoadError::Incompatible {
                reason: format!("artifact built for {}, requested {}", manifest.key, key),
            });
        }
        let checksum = self.body.checksum();
        if checksum != manifest.checksum {
            return Err(LoadError::Malformed {
                reason: format!("checksum mismatch: manifest {}, body {}", manifest.checksum, checksum),
            });
        }
        if manifest.person_count != self.body.people.len() {
            return Err(LoadError::Malformed {
                reason: format!(
                    "manifest lists {} people, body has {}",
                    manifest.person_count,
                    self.body.people.len()
                ),
            });
        }

        let params = PopulationParams::new(key.size, key.location.clone(), PopulationSource::Cache);
        Population::from_parts(params, self.body.people, self.body.layers)
            .map_err(|e| LoadError::Malformed { reason: e.to_string() })
    }
}

/// Population store reading JSON artifacts from a directory.
#[derive(Debug, Clone)]
pub struct FilePopulationStore {
    root: PathBuf,
}

impl FilePopulationStore {
    /// Create a store rooted at `root`. The directory need not exist yet.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the artifact for `key`.
    pub fn artifact_path(&self, key: &PopulationKey) -> PathBuf {
        self.root.join(artifact_file_name(key))
    }

    /// Write `population` as the artifact for `key`.
    ///
    /// Writes to a temporary file first and renames it into place, so a
    /// concurrent reader never sees a partial artifact.
    pub fn save(&self, key: &PopulationKey, population: &Population) -> Result<PathBuf, SaveError> {
        let path = self.artifact_path(key);
        let io_err = |source| SaveError::Io { path: path.clone(), source };

        std::fs::create_dir_all(&self.root).map_err(io_err)?;
        let artifact = PopulationArtifact::from_population(key, population);
        let bytes = serde_json::to_vec(&artifact)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, bytes).map_err(io_err)?;
        std::fs::rename(&tmp, &path).map_err(io_err)?;

        tracing::info!(
            path = %path.display(),
            people = population.len(),
            key_hash = %key.key_hash(),
            "Saved population artifact"
        );
        Ok(path)
    }
}

impl PopulationStore for FilePopulationStore {
    fn load(&self, key: &PopulationKey) -> Result<Population, LoadError> {
        let path = self.artifact_path(key);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LoadError::NotFound { key: key.clone() });
            }
            Err(source) => return Err(LoadError::Io { path, source }),
        };
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Read population artifact");

        let artifact: PopulationArtifact = serde_json::from_slice(&bytes)
            .map_err(|e| LoadError::Malformed { reason: format!("{}: {}", path.display(), e) })?;
        artifact.into_population(key)
    }
}

/// File name for a key: a readable stem (lowercase, non-alphanumerics
/// collapsed to `_`) followed by the key hash.
pub fn artifact_file_name(key: &PopulationKey) -> String {
    let options = &key.options;
    let mut stem = format!(
        "{}_{}_{}_{}",
        key.location.country, key.location.state, key.location.location, key.size
    );
    if !options.use_microstructure {
        stem.push_str("_nomicro");
    }
    if options.use_industry_code {
        stem.push_str("_industry");
    }
    if options.use_long_term_care_facilities {
        stem.push_str(&format!("_ltcf{}", options.average_ltcf_degree));
        if options.use_two_group_reduction {
            stem.push_str("_tgr");
        }
    }
    format!("{}_{}.json", sanitize(&stem), key.key_hash())
}

fn sanitize(stem: &str) -> String {
    static UNSAFE: OnceLock<regex_lite::Regex> = OnceLock::new();
    let re = UNSAFE.get_or_init(|| {
        regex_lite::Regex::new(r"[^a-z0-9_]+").expect("static regex is valid")
    });
    re.replace_all(&stem.to_lowercase(), "_").to_string()
}
