//! Reads one explicit workflow config file and resolves it.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::{LoadedConfig, TemplateConfig, WorkflowConfig};
use crate::errors::ConfigError;
use crate::resolver::EnvSource;
use crate::serde_utils::{from_json_str, from_yaml_str};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Warn when the token variable is unset.
    pub validate_token: bool,
    /// Resolve relative template files against the config file's directory.
    pub resolve_paths: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            validate_token: true,
            resolve_paths: true,
        }
    }
}

impl LoadOptions {
    /// Options for syntax checks: the token is not looked at.
    pub fn syntax_only() -> Self {
        Self {
            validate_token: false,
            ..Self::default()
        }
    }
}

/// Loads `path` (JSON, or YAML for `.yaml`/`.yml`) and resolves it against `env`.
pub fn load_config<E: EnvSource + ?Sized>(
    path: impl AsRef<Path>,
    options: &LoadOptions,
    env: &E,
) -> Result<LoadedConfig, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let parsed = if is_yaml(path) {
        from_yaml_str::<WorkflowConfig>(&content)
    } else {
        from_json_str::<WorkflowConfig>(&content)
    };
    let mut config = parsed.map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;

    if options.resolve_paths {
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.templates = resolve_template_paths(config.templates, base);
    }

    let loaded = config.resolve(env, options.validate_token)?;
    debug!(
        path = %path.display(),
        workflow = %loaded.config.workflow.name,
        warnings = loaded.warnings.len(),
        "workflow config loaded"
    );
    Ok(loaded)
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    )
}

fn resolve_template_paths(templates: Vec<TemplateConfig>, base: &Path) -> Vec<TemplateConfig> {
    templates
        .into_iter()
        .map(|mut template| {
            if let Some(file) = template.file.as_deref() {
                let candidate = PathBuf::from(file);
                if candidate.is_relative() {
                    template.file = Some(base.join(candidate).to_string_lossy().into_owned());
                }
            }
            template
        })
        .collect()
}
