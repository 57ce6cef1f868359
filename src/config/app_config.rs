use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::errors::{DecryptPdfError, Result};
use crate::core::models::backend_result::BackendId;

/// Per-backend timeout when neither the CLI nor the config sets one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Optional user configuration, read from `--config` or [`AppConfig::default_path`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub defaults: DefaultsSection,
    #[serde(default)]
    pub tools: ToolsSection,
}

impl AppConfig {
    /// Load `explicit` if given (it must exist), otherwise the default
    /// location if present, otherwise built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => {
                if !path.is_file() {
                    return Err(DecryptPdfError::InvalidConfig {
                        path: path.to_path_buf(),
                        detail: "file not found".into(),
                    });
                }
                Self::load_from(path)
            }
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::load_from(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content).map_err(|detail| DecryptPdfError::InvalidConfig {
            path: path.to_path_buf(),
            detail,
        })
    }

    fn parse(content: &str) -> std::result::Result<Self, String> {
        let config: Self = toml::from_str(content).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    /// `$XDG_CONFIG_HOME/decrypt-pdf/config.toml` or the platform equivalent.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("decrypt-pdf").join("config.toml"))
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(names) = &self.defaults.backends {
            if names.is_empty() {
                return Err("defaults.backends must name at least one backend".into());
            }
            let mut seen = Vec::new();
            for name in names {
                let id: BackendId = name.parse()?;
                if seen.contains(&id) {
                    return Err(format!("defaults.backends lists '{id}' more than once"));
                }
                seen.push(id);
            }
        }
        if self.defaults.timeout_secs == Some(0) {
            return Err("defaults.timeout_secs must be at least 1".into());
        }
        Ok(())
    }

    /// Cascade order from the config, if it sets one.
    pub fn backend_order(&self) -> Option<Vec<BackendId>> {
        self.defaults
            .backends
            .as_ref()
            .map(|names| names.iter().filter_map(|n| n.parse().ok()).collect())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.defaults.timeout_secs.map(Duration::from_secs)
    }
}

/// The `[defaults]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefaultsSection {
    pub backends: Option<Vec<String>>,
    pub timeout_secs: Option<u64>,
}

/// The `[tools]` section: executable overrides per backend.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolsSection {
    pub qpdf: Option<PathBuf>,
    pub mutool: Option<PathBuf>,
    pub ghostscript: Option<PathBuf>,
}

impl ToolsSection {
    pub fn program(&self, id: BackendId) -> Option<PathBuf> {
        match id {
            BackendId::Qpdf => self.qpdf.clone(),
            BackendId::Mutool => self.mutool.clone(),
            BackendId::Ghostscript => self.ghostscript.clone(),
        }
    }
}
