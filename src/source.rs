use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use crate::models::{Candidate, LogicalAsset};

/// A resolved download location: either fully pre-authenticated, or a URL
/// plus headers to merge into the request.
#[derive(Debug, Clone)]
pub struct Locator {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

/// The metadata/authentication collaborator boundary. The orchestrator
/// only ever sees candidates and locators; where they come from is this
/// trait's business.
pub trait MetadataSource {
    fn assets(&self) -> Vec<LogicalAsset>;
    fn fetch_candidates(&self, asset_id: &str) -> Result<Vec<Candidate>>;
    fn resolve_locator(&self, candidate_id: &str) -> Result<Locator>;
}

#[derive(Debug, Deserialize)]
struct Manifest {
    versions: Vec<VersionRecord>,
}

#[derive(Debug, Deserialize)]
struct VersionRecord {
    id: String,
    parent: String,
    name: String,
    version: u32,
    components: Vec<ComponentRecord>,
}

#[derive(Debug, Deserialize)]
struct ComponentRecord {
    id: String,
    name: String,
    #[serde(default)]
    file_type: Option<String>,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    canonical: bool,
    url: String,
    #[serde(default)]
    headers: HashMap<String, String>,
}

/// Manifest-backed metadata source: a JSON file listing versions and their
/// downloadable components.
pub struct ManifestSource {
    assets: Vec<LogicalAsset>,
    candidates: HashMap<String, Vec<Candidate>>,
    locators: HashMap<String, Locator>,
}

impl ManifestSource {
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            return Err(anyhow!("Manifest file not found: {}", path));
        }
        let content = fs::read_to_string(path).context("Failed to read manifest file")?;
        Self::parse(&content)
    }

    fn parse(content: &str) -> Result<Self> {
        let manifest: Manifest =
            serde_json::from_str(content).context("Failed to parse manifest file")?;

        let mut assets = Vec::new();
        let mut candidates: HashMap<String, Vec<Candidate>> = HashMap::new();
        let mut locators = HashMap::new();

        for record in manifest.versions {
            let asset = LogicalAsset {
                id: record.id.clone(),
                parent_name: record.parent,
                name: record.name,
                version: record.version,
            };

            let mut owned = Vec::with_capacity(record.components.len());
            for component in record.components {
                owned.push(Candidate {
                    id: component.id.clone(),
                    name: component.name,
                    file_type: component.file_type,
                    size: component.size,
                    asset_id: record.id.clone(),
                    canonical: component.canonical,
                });
                locators.insert(
                    component.id,
                    Locator {
                        url: component.url,
                        headers: component.headers.into_iter().collect(),
                    },
                );
            }

            candidates.insert(record.id.clone(), owned);
            assets.push(asset);
        }

        Ok(Self {
            assets,
            candidates,
            locators,
        })
    }
}

impl MetadataSource for ManifestSource {
    fn assets(&self) -> Vec<LogicalAsset> {
        self.assets.clone()
    }

    fn fetch_candidates(&self, asset_id: &str) -> Result<Vec<Candidate>> {
        self.candidates
            .get(asset_id)
            .cloned()
            .ok_or_else(|| anyhow!("Unknown version id: {}", asset_id))
    }

    fn resolve_locator(&self, candidate_id: &str) -> Result<Locator> {
        self.locators
            .get(candidate_id)
            .cloned()
            .ok_or_else(|| anyhow!("Unknown component id: {}", candidate_id))
    }
}
