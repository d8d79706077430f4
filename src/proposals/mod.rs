//! Funding proposals — submission and lifecycle.

pub mod model;
pub mod routes;

pub use model::{
    FinancialInfo, FundingGoals, PersonalInfo, Proposal, ProposalStatus, ProposalSubmission,
    SupportingDocument,
};
pub use routes::proposal_routes;
