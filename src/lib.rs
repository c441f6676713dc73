//! foundry-rules: config-driven tooling for rule proposal documents.
//!
//! The workspace is split into layers, leaves first:
//!
//! * [`protocol`]: filter tree and rule logic wire types
//! * [`core`]: workflow configuration, loading and resolution, logging setup
//! * [`logic`]: template builder, extractor, validator and compressor
//! * [`sdk`]: proposal workflows over an injected actions API
//!
//! The most common entry points are re-exported at the crate root.

pub use rules_core as core;
pub use rules_logic as logic;
pub use rules_protocol as protocol;
pub use rules_sdk as sdk;

pub use rules_core::{load_config, ConfigError, LoadOptions, LoadedConfig, ResolvedConfig};
pub use rules_logic::{
    build_from_template, builtin_templates, compress, compression_stats, decompress,
    get_compressed_value, validate_filter_types, validate_ignore_whitespace, validate_properties,
    validate_proposal, validate_rule_logic, wrap_compressed_value, ProposalInput,
    ProposalValidation,
};
pub use rules_protocol::filter::FilterTree;
pub use rules_protocol::logic::RuleLogic;
pub use rules_sdk::{ActionError, ActionsApi, ProposalError, ProposalService};

/// Version of the rule logic grammar produced by the template builder.
pub const GRAMMAR_VERSION: &str = rules_protocol::logic::DEFAULT_GRAMMAR_VERSION;
