//! Core shared library for the foundry rules workspace.
//!
//! This crate exposes the pieces every other member depends on: the
//! workflow configuration model and its explicit resolution step, the
//! config file loader, common errors, JSON/YAML helpers and logging setup.

pub mod config;
pub mod errors;
pub mod loader;
pub mod logging;
pub mod resolver;
pub mod secret;
pub mod serde_utils;

pub use config::{
    ActionConfig, ArchetypeConfig, ConventionConfig, FoundryConnection, LoadedConfig,
    ObjectTypeConfig, OutputConfig, OutputParameterConfig, PropertyDefinition, PropertyType,
    ResolvedConfig, ResolvedFoundryConnection, SdkConfig, TemplateConfig, ValidationConfig,
    WorkflowConfig, WorkflowDefinition,
};
pub use errors::{ConfigError, CoreError, Result as CoreResult};
pub use loader::{load_config, LoadOptions};
pub use resolver::{EnvSource, ProcessEnv};
pub use secret::Secret;
