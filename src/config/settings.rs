use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{
    InclusionRules, RelcountConfig, WeighByProperty, DEFAULT_COMPACTION_THRESHOLD, DEFAULT_PREFIX,
};
use crate::cache::DegreeCachingStrategy;
use crate::error::{RelcountError, Result};

/// File-level settings for a relationship count cache.
///
/// ```toml
/// threshold = 20
/// prefix = "_GA_FRC_"
/// weigh_by = "weight"
/// exclude_types = ["_INTERNAL"]
/// exclude_properties = ["timestamp"]
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RelcountSettings {
    /// Maximum number of distinct cached entries per node.
    pub threshold: usize,
    /// Storage key prefix.
    pub prefix: String,
    /// Integer property used as relationship weight.
    pub weigh_by: Option<String>,
    /// Relationship types that are never counted.
    pub exclude_types: Vec<String>,
    /// Property keys that never appear in descriptions.
    pub exclude_properties: Vec<String>,
}

impl Default for RelcountSettings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_COMPACTION_THRESHOLD,
            prefix: DEFAULT_PREFIX.to_owned(),
            weigh_by: None,
            exclude_types: Vec::new(),
            exclude_properties: Vec::new(),
        }
    }
}

impl RelcountSettings {
    /// Reads settings from `path`, falling back to defaults when it is missing.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).map_err(|source| RelcountError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Self = toml::from_str(&contents).map_err(|source| RelcountError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parses settings from a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let settings: Self = toml::from_str(contents).map_err(|source| RelcountError::ConfigParse {
            path: PathBuf::new(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Default location of the settings file.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|base| base.join("relcount").join("relcount.toml"))
    }

    /// Rejects values the cache cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.threshold == 0 {
            return Err(RelcountError::invalid("compaction threshold must be positive"));
        }
        if self.prefix.is_empty() {
            return Err(RelcountError::invalid("prefix must not be empty"));
        }
        if matches!(self.weigh_by.as_deref(), Some("")) {
            return Err(RelcountError::invalid("weigh_by must name a property"));
        }
        Ok(())
    }

    /// Builds a runtime configuration storing degrees through `caching`.
    pub fn into_config(self, caching: Arc<dyn DegreeCachingStrategy>) -> Result<RelcountConfig> {
        self.validate()?;
        let mut config = RelcountConfig::new(caching)
            .with_threshold(self.threshold)
            .prefix(self.prefix);
        if let Some(key) = self.weigh_by {
            config = config.weighing(Arc::new(WeighByProperty::new(key)));
        }
        if !self.exclude_types.is_empty() || !self.exclude_properties.is_empty() {
            let rules = self
                .exclude_types
                .into_iter()
                .fold(InclusionRules::new(), InclusionRules::exclude_type);
            let rules = self
                .exclude_properties
                .into_iter()
                .fold(rules, InclusionRules::exclude_property);
            config = config.inclusion(Arc::new(rules));
        }
        Ok(config)
    }
}
