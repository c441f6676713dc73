//! Rule logic processing for proposals.
//!
//! Template parameters are turned into filter trees, checked against the
//! workflow's declared schema and operator lists, and compressed for
//! transport. Every function here is synchronous and pure over its inputs.

pub mod compression;
mod error;
pub mod extract;
pub mod pipeline;
pub mod template;
pub mod validate;

pub use compression::{
    compress, compression_stats, decompress, get_compressed_value, wrap_compressed_value,
    CompressionStats,
};
pub use error::{BuildError, CompressionError};
pub use extract::{
    filter_summary, filter_view, logic_filter_types, logic_properties, property_summary,
    tree_filter_types, tree_properties, view_filter_types, view_properties, FilterSummary,
    PropertySummary, UsedFilters,
};
pub use pipeline::{
    prepare_proposal, validate_proposal, Issue, IssueKind, PreparedProposal, ProposalInput,
    ProposalValidation,
};
pub use template::{
    build_from_template, builtin_templates, precheck_template_params, template_info, Template,
    TemplateInfo,
};
pub use validate::{
    validate_filter_types, validate_ignore_whitespace, validate_object_type, validate_properties,
    validate_property_types, validate_rule_logic, validate_workflow_rid, FilterValidation,
    PropertyValidation, ValidationResult,
};
