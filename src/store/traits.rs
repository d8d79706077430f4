//! Backend-agnostic `Database` trait — single async interface for all
//! persistence: user profiles, role onboarding records, and proposals.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::onboarding::model::{
    InvestorOnboarding, OnboardingPayload, Role, StudentOnboarding, UserProfile,
};
use crate::proposals::model::{Proposal, ProposalStatus};

#[async_trait]
pub trait Database: Send + Sync {
    // ── Profiles & onboarding ───────────────────────────────────────

    /// Look up the profile for an external identity.
    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, DatabaseError>;

    /// Record an onboarding submission as one atomic unit:
    /// find-or-create/update the `UserProfile`, then upsert the
    /// role-matching onboarding row keyed by external identity. Either
    /// both writes land or neither does.
    ///
    /// Returns the profile as written.
    async fn submit_onboarding(
        &self,
        user_id: &str,
        role: Role,
        payload: &OnboardingPayload,
        raw: &serde_json::Value,
    ) -> Result<UserProfile, DatabaseError>;

    /// Fetch the investor onboarding record for an identity.
    async fn get_investor_onboarding(
        &self,
        user_id: &str,
    ) -> Result<Option<InvestorOnboarding>, DatabaseError>;

    /// Fetch the student onboarding record for an identity.
    async fn get_student_onboarding(
        &self,
        user_id: &str,
    ) -> Result<Option<StudentOnboarding>, DatabaseError>;

    // ── Proposals ───────────────────────────────────────────────────

    /// Insert a new proposal.
    async fn insert_proposal(&self, proposal: &Proposal) -> Result<(), DatabaseError>;

    /// Get a proposal by id.
    async fn get_proposal(&self, id: Uuid) -> Result<Option<Proposal>, DatabaseError>;

    /// List proposals linked to a profile, most recent first.
    async fn list_proposals_for_profile(
        &self,
        profile_id: Uuid,
    ) -> Result<Vec<Proposal>, DatabaseError>;

    /// Move a proposal from `from` to `to`, refreshing `updated_at`.
    ///
    /// The update is conditional on the current status still being `from`;
    /// returns false if the row was not in that state (or does not exist),
    /// so concurrent reviewers cannot double-apply a transition.
    async fn update_proposal_status(
        &self,
        id: Uuid,
        from: ProposalStatus,
        to: ProposalStatus,
    ) -> Result<bool, DatabaseError>;
}
