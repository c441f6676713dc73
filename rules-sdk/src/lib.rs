//! Proposal workflows for the rules platform.
//!
//! [`ProposalService`] validates and compresses rule logic, generates ids
//! and timestamps, and hands the result to an [`ActionsApi`]
//! implementation. The transport behind that trait is supplied by the caller.

mod api;
mod error;
mod proposal;

pub use api::{ActionError, ActionsApi};
pub use error::ProposalError;
pub use proposal::{
    BulkRejectResult, CreateProposalResult, EditProposalInput, EditProposalResult,
    ProposalOutcome, ProposalService,
};
