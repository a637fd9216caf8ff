use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Config, CoreError};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
///
/// The LLM API key is deliberately absent: it only comes from the
/// environment or the command line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub llm: Option<LlmConfig>,
    pub verification: Option<VerificationConfig>,
    pub endpoints: Option<EndpointsConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub max_text_chars: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerificationConfig {
    pub link_timeout_secs: Option<u64>,
    pub crossref_mailto: Option<String>,
    pub user_agent: Option<String>,
    pub disabled: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndpointsConfig {
    pub crossref: Option<String>,
    pub google_books: Option<String>,
    pub openalex: Option<String>,
}

/// Platform config directory path: `<config_dir>/refcheck/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("refcheck").join("config.toml"))
}

/// Load config by cascading CWD `.refcheck.toml` over platform config.
/// CWD values override platform values. Missing files are not an error,
/// malformed ones are.
pub fn load_config() -> Result<ConfigFile, CoreError> {
    let platform = match config_path() {
        Some(p) => load_from_path(&p)?,
        None => None,
    };
    let cwd = load_from_path(Path::new(".refcheck.toml"))?;

    Ok(match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    })
}

/// Load a config from a specific path. Returns `Ok(None)` if the file
/// doesn't exist.
pub fn load_from_path(path: &Path) -> Result<Option<ConfigFile>, CoreError> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let parsed = toml::from_str(&content).map_err(|e| CoreError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    tracing::debug!(path = %path.display(), "loaded config file");
    Ok(Some(parsed))
}

fn pick<S, T: Clone>(
    overlay: &Option<S>,
    base: &Option<S>,
    field: impl Fn(&S) -> Option<T>,
) -> Option<T> {
    overlay
        .as_ref()
        .and_then(&field)
        .or_else(|| base.as_ref().and_then(&field))
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        llm: Some(LlmConfig {
            endpoint: pick(&overlay.llm, &base.llm, |l| l.endpoint.clone()),
            model: pick(&overlay.llm, &base.llm, |l| l.model.clone()),
            max_text_chars: pick(&overlay.llm, &base.llm, |l| l.max_text_chars),
        }),
        verification: Some(VerificationConfig {
            link_timeout_secs: pick(&overlay.verification, &base.verification, |v| {
                v.link_timeout_secs
            }),
            crossref_mailto: pick(&overlay.verification, &base.verification, |v| {
                v.crossref_mailto.clone()
            }),
            user_agent: pick(&overlay.verification, &base.verification, |v| {
                v.user_agent.clone()
            }),
            disabled: pick(&overlay.verification, &base.verification, |v| {
                v.disabled.clone()
            }),
        }),
        endpoints: Some(EndpointsConfig {
            crossref: pick(&overlay.endpoints, &base.endpoints, |e| e.crossref.clone()),
            google_books: pick(&overlay.endpoints, &base.endpoints, |e| {
                e.google_books.clone()
            }),
            openalex: pick(&overlay.endpoints, &base.endpoints, |e| e.openalex.clone()),
        }),
    }
}

impl ConfigFile {
    /// Write every value present in the file over `config`.
    pub fn apply(&self, config: &mut Config) {
        if let Some(llm) = &self.llm {
            if let Some(endpoint) = &llm.endpoint {
                config.llm_endpoint = endpoint.clone();
            }
            if let Some(model) = &llm.model {
                config.llm_model = model.clone();
            }
            if let Some(max) = llm.max_text_chars {
                config.max_text_chars = max;
            }
        }
        if let Some(v) = &self.verification {
            if let Some(secs) = v.link_timeout_secs {
                config.link_timeout_secs = secs;
            }
            if let Some(mailto) = &v.crossref_mailto {
                config.crossref_mailto = Some(mailto.clone());
            }
            if let Some(ua) = &v.user_agent {
                config.user_agent = ua.clone();
            }
            if let Some(disabled) = &v.disabled {
                config.disabled_dbs = disabled.clone();
            }
        }
        if let Some(e) = &self.endpoints {
            if let Some(url) = &e.crossref {
                config.endpoints.crossref = url.clone();
            }
            if let Some(url) = &e.google_books {
                config.endpoints.google_books = url.clone();
            }
            if let Some(url) = &e.openalex {
                config.endpoints.openalex = url.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_parses() {
        let toml_str = "[verification]\nlink_timeout_secs = 10\n";
        let parsed: ConfigFile = toml::from_str(toml_str).unwrap();
        assert!(parsed.llm.is_none());
        assert_eq!(parsed.verification.unwrap().link_timeout_secs, Some(10));
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_from_path(&dir.path().join("absent.toml")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[verification\nlink_timeout_secs = ").unwrap();
        let err = load_from_path(&path).unwrap_err();
        assert!(matches!(err, CoreError::Config { .. }));
    }

    #[test]
    fn written_file_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = ConfigFile {
            endpoints: Some(EndpointsConfig {
                crossref: Some("http://127.0.0.1:9000".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        std::fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();
        assert_eq!(load_from_path(&path).unwrap(), Some(config));
    }

    #[test]
    fn merge_overlay_wins() {
        let base = ConfigFile {
            verification: Some(VerificationConfig {
                link_timeout_secs: Some(5),
                crossref_mailto: Some("base@example.org".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let overlay = ConfigFile {
            verification: Some(VerificationConfig {
                link_timeout_secs: Some(8),
                ..Default::default()
            }),
            ..Default::default()
        };
        let merged = merge(base, overlay).verification.unwrap();
        assert_eq!(merged.link_timeout_secs, Some(8));
        assert_eq!(merged.crossref_mailto.as_deref(), Some("base@example.org"));
    }

    #[test]
    fn apply_overrides_only_present_values() {
        let file = ConfigFile {
            llm: Some(LlmConfig {
                model: Some("some/model".into()),
                ..Default::default()
            }),
            verification: Some(VerificationConfig {
                disabled: Some(vec!["OpenAlex".into()]),
                ..Default::default()
            }),
            ..Default::default()
        };
        let mut config = Config::default();
        file.apply(&mut config);
        assert_eq!(config.llm_model, "some/model");
        assert_eq!(config.llm_endpoint, crate::DEFAULT_LLM_ENDPOINT);
        assert_eq!(config.link_timeout_secs, 5);
        assert!(config.is_disabled("OpenAlex"));
    }
}
