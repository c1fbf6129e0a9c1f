//! Project configuration discovery, parsing and caching.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::CclintConfig;
use crate::error::{ConfigError, LinterError, ScriptError};
use crate::script::{self, ScriptLimits};
use crate::security;

/// Loads and memoizes `CclintConfig` per canonical project root.
///
/// The cache lock is held for the whole load, so concurrent callers asking
/// for the same root wait for the first load instead of repeating it.
pub struct ConfigLoader {
    cache: Mutex<HashMap<PathBuf, Option<Arc<CclintConfig>>>>,
    allow_scripts: bool,
    verbose: bool,
    limits: ScriptLimits,
}

impl ConfigLoader {
    /// Configuration file names in precedence order. The first existing file wins.
    pub const CONFIG_FILES: &'static [&'static str] = &[
        ".cclintrc.json",
        ".cclintrc.jsonc",
        ".cclintrc.yaml",
        ".cclintrc.yml",
        "cclint.config.json",
        "package.json",
        "cclint.config.cclint",
        ".cclintrc.cclint",
    ];

    /// The only file names evaluated as scripts.
    pub const SCRIPT_FILES: &'static [&'static str] = &["cclint.config.cclint", ".cclintrc.cclint"];

    pub fn new() -> Self {
        Self {
            cache: Mutex::new(HashMap::new()),
            allow_scripts: true,
            verbose: false,
            limits: ScriptLimits::default(),
        }
    }

    /// Disables script configuration formats when `false`.
    pub fn allow_scripts(mut self, allow: bool) -> Self {
        self.allow_scripts = allow;
        self
    }

    /// Reports rejected configuration files at `warn` instead of `debug`.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn script_limits(mut self, limits: ScriptLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Returns the configuration for `project_root`, or `None` if there is none
    /// or it could not be used.
    ///
    /// Only an invalid project root is an error.
    pub fn load(&self, project_root: &Path) -> Result<Option<Arc<CclintConfig>>, LinterError> {
        let root = security::resolve_project_root(project_root)?;

        let mut cache = self.cache.lock();
        if let Some(cached) = cache.get(&root) {
            debug!("Using cached configuration for {}", root.display());
            return Ok(cached.clone());
        }

        let loaded = self.find_and_load(&root).map(Arc::new);
        cache.insert(root, loaded.clone());
        Ok(loaded)
    }

    /// Forgets every cached configuration.
    pub fn clear_cache(&self) {
        self.cache.lock().clear();
    }

    fn find_and_load(&self, root: &Path) -> Option<CclintConfig> {
        for &name in Self::CONFIG_FILES {
            let is_script = Self::SCRIPT_FILES.contains(&name);
            if is_script && !self.allow_scripts {
                continue;
            }

            let path = root.join(name);
            if fs::symlink_metadata(&path).is_err() {
                continue;
            }

            let result = if is_script {
                self.load_script(root, &path)
            } else {
                load_data_file(&path, name)
            };

            match result {
                Ok(Some(mut config)) => {
                    info!("Loaded configuration from {}", path.display());
                    config.source = Some(path);
                    return Some(config);
                }
                Ok(None) => continue,
                Err(e) => {
                    self.report(&e);
                    return None;
                }
            }
        }

        debug!("No configuration file found in {}", root.display());
        None
    }

    fn load_script(&self, root: &Path, path: &Path) -> Result<Option<CclintConfig>, ConfigError> {
        let real = security::resolve_secure(path, root)
            .map_err(|_| ConfigError::OutsideProject(path.to_path_buf()))?;

        let file_name = real
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        if !Self::SCRIPT_FILES.contains(&file_name.as_str()) {
            return Err(ConfigError::FilenameNotAllowed(file_name));
        }

        let source = fs::read_to_string(&real).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(violation) = script::find_violation(&source) {
            return Err(ConfigError::ForbiddenPattern {
                path: path.to_path_buf(),
                pattern: violation.pattern,
                description: violation.description.to_string(),
            });
        }

        script::load_config(&source, self.limits)
            .map(Some)
            .map_err(|e| match e {
                ScriptError::Timeout(millis) => ConfigError::Timeout {
                    path: path.to_path_buf(),
                    millis,
                },
                other => ConfigError::Script {
                    path: path.to_path_buf(),
                    source: other,
                },
            })
    }

    fn report(&self, error: &ConfigError) {
        if self.verbose {
            warn!("Ignoring configuration: {}", error);
        } else {
            debug!("Ignoring configuration: {}", error);
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses a structured configuration file. `Ok(None)` means the file does not
/// carry a configuration (a `package.json` without a `cclint` key).
fn load_data_file(path: &Path, name: &str) -> Result<Option<CclintConfig>, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parse_error = |message: String| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let value = match name {
        "package.json" => {
            let package: Value =
                serde_json::from_str(&content).map_err(|e| parse_error(e.to_string()))?;
            match package.get("cclint") {
                Some(section) => section.clone(),
                None => return Ok(None),
            }
        }
        n if n.ends_with(".jsonc") => {
            jsonc_parser::parse_to_serde_value(&content, &jsonc_parser::ParseOptions::default())
                .map_err(|e| parse_error(e.to_string()))?
                .unwrap_or(Value::Null)
        }
        n if n.ends_with(".yaml") || n.ends_with(".yml") => {
            let yaml: serde_yaml::Value =
                serde_yaml::from_str(&content).map_err(|e| parse_error(e.to_string()))?;
            serde_json::to_value(yaml).map_err(|e| parse_error(e.to_string()))?
        }
        _ => serde_json::from_str(&content).map_err(|e| parse_error(e.to_string()))?,
    };

    if !value.is_object() {
        return Err(ConfigError::NotAnObject(path.to_path_buf()));
    }

    CclintConfig::from_value(&value)
        .map(Some)
        .map_err(parse_error)
}

/// The process-wide loader used by the free functions of this crate.
pub fn default_loader() -> &'static ConfigLoader {
    shared_loader(true, false)
}

/// A process-wide loader for one combination of loader settings. Each
/// combination keeps its own cache, so a data-only run never sees a
/// configuration that was loaded from a script.
pub fn shared_loader(allow_scripts: bool, verbose: bool) -> &'static ConfigLoader {
    static LOADERS: [OnceLock<ConfigLoader>; 4] = [const { OnceLock::new() }; 4];
    let slot = usize::from(allow_scripts) * 2 + usize::from(verbose);
    LOADERS[slot].get_or_init(|| {
        ConfigLoader::new()
            .allow_scripts(allow_scripts)
            .verbose(verbose)
    })
}

/// Loads the configuration of `project_root` (default: the current directory)
/// through the process-wide loader.
pub fn load_project_config(
    project_root: Option<&Path>,
) -> Result<Option<Arc<CclintConfig>>, LinterError> {
    let root = match project_root {
        Some(root) => root.to_path_buf(),
        None => std::env::current_dir()?,
    };
    default_loader().load(&root)
}
