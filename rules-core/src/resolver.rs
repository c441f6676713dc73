//! `${VAR}` substitution against an injected environment.

use std::collections::HashMap;
use std::env;
use std::sync::OnceLock;

use regex::{Captures, Regex};

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"))
}

/// Source of environment variables used during config resolution.
pub trait EnvSource {
    fn var(&self, name: &str) -> Option<String>;
}

/// Reads the process environment, after loading a `.env` file if present.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl ProcessEnv {
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        ProcessEnv
    }
}

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        env::var(name).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl<E: EnvSource + ?Sized> EnvSource for &E {
    fn var(&self, name: &str) -> Option<String> {
        (**self).var(name)
    }
}

/// Outcome of substituting variables in one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub value: String,
    /// Variables referenced but not set, in order of appearance.
    pub missing: Vec<String>,
}

pub fn has_env_vars(value: &str) -> bool {
    env_var_pattern().is_match(value)
}

pub fn env_var_names(value: &str) -> Vec<String> {
    env_var_pattern()
        .captures_iter(value)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Replaces every `${NAME}` with its value; unknown references are kept verbatim.
pub fn resolve_env_vars<E: EnvSource + ?Sized>(value: &str, env: &E) -> Substitution {
    let mut missing = Vec::new();
    let resolved = env_var_pattern().replace_all(value, |caps: &Captures<'_>| {
        let name = &caps[1];
        match env.var(name) {
            Some(found) => found,
            None => {
                missing.push(name.to_string());
                caps[0].to_string()
            }
        }
    });

    Substitution {
        value: resolved.into_owned(),
        missing,
    }
}
