//! Per-variant settings resolution.
//!
//! An [`UploadSettings`] file holds project-wide defaults plus override
//! tables keyed by application id, variant name and flavor name. Each field
//! of a [`ReleaseConfiguration`] is resolved independently: the first
//! present, non-blank value in the order applicationId → variant → flavor →
//! default wins.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::types::{ApiToken, DebugSymbols, ReleaseConfiguration};

fn default_notify_testers() -> bool {
    true
}

fn default_testers() -> Vec<String> {
    vec!["collaborators".into()]
}

fn default_max_retries() -> u32 {
    3
}

/// Settings file contents.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UploadSettings {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub app_owner: Option<String>,
    #[serde(default = "default_notify_testers")]
    pub notify_testers: bool,
    #[serde(default = "default_testers")]
    pub testers: Vec<String>,
    #[serde(default)]
    pub release_notes: Option<String>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default)]
    pub application_ids: HashMap<String, VariantOverride>,
    #[serde(default)]
    pub variants: HashMap<String, VariantOverride>,
    #[serde(default)]
    pub flavors: HashMap<String, VariantOverride>,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            app_owner: None,
            notify_testers: default_notify_testers(),
            testers: default_testers(),
            release_notes: None,
            max_retries: default_max_retries(),
            application_ids: HashMap::new(),
            variants: HashMap::new(),
            flavors: HashMap::new(),
        }
    }
}

/// Values one override table entry may set.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariantOverride {
    pub app_name: Option<String>,
    pub app_owner: Option<String>,
    pub notify_testers: Option<bool>,
    pub testers: Option<Vec<String>>,
    pub release_notes: Option<String>,
}

/// A build variant as reported by the build system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildVariant {
    pub application_id: String,
    pub name: String,
    pub flavor: String,
    pub version_code: u64,
    pub version_name: String,
    pub artifact: PathBuf,
    pub mapping_file: Option<PathBuf>,
}

impl BuildVariant {
    /// Debug symbols for this build, if a mapping file is configured.
    pub fn debug_symbols(&self) -> Option<DebugSymbols> {
        self.mapping_file.as_ref().map(|path| {
            DebugSymbols::new(path, self.version_code.to_string(), &self.version_name)
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

impl UploadSettings {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Overrides for `variant`, highest priority first.
    fn chain<'a>(&'a self, variant: &BuildVariant) -> Vec<&'a VariantOverride> {
        [
            self.application_ids.get(&variant.application_id),
            self.variants.get(&variant.name),
            self.flavors.get(&variant.flavor),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Resolves the release configuration for `variant`.
    ///
    /// Returns `Ok(None)` when no app name maps to the variant; such
    /// variants are not uploaded.
    pub fn resolve(
        &self,
        variant: &BuildVariant,
    ) -> Result<Option<ReleaseConfiguration>, ConfigError> {
        let chain = self.chain(variant);

        let Some(app_name) = chain.iter().find_map(|o| non_blank(&o.app_name)) else {
            return Ok(None);
        };

        let api_key = non_blank(&self.api_key).ok_or_else(|| ConfigError::MissingFieldForVariant {
            field: "apiKey",
            variant: variant.name.clone(),
        })?;

        let owner = chain
            .iter()
            .find_map(|o| non_blank(&o.app_owner))
            .or_else(|| non_blank(&self.app_owner))
            .ok_or_else(|| ConfigError::MissingFieldForVariant {
                field: "appOwner",
                variant: variant.name.clone(),
            })?;

        let notify_testers = chain
            .iter()
            .find_map(|o| o.notify_testers)
            .unwrap_or(self.notify_testers);

        let release_notes = chain
            .iter()
            .find_map(|o| non_blank(&o.release_notes))
            .or_else(|| non_blank(&self.release_notes))
            .map(str::to_string);

        let testers: Vec<String> = chain
            .iter()
            .find_map(|o| o.testers.as_ref())
            .unwrap_or(&self.testers)
            .iter()
            .filter(|t| !t.trim().is_empty())
            .cloned()
            .collect();
        if testers.is_empty() {
            return Err(ConfigError::NoDistributionTargets {
                variant: variant.name.clone(),
            });
        }

        Ok(Some(ReleaseConfiguration {
            owner: owner.to_string(),
            app_name: app_name.to_string(),
            api_token: ApiToken::new(api_key),
            distribution_targets: testers,
            notify_testers,
            release_notes,
            max_retries: self.max_retries,
        }))
    }
}
