//! Funding proposal data model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a proposal.
///
/// Created as `Submitted`; moves through review to a terminal state. The
/// review process itself lives outside this service — it only enforces
/// which transitions are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Submitted,
    UnderReview,
    Approved,
    Rejected,
    Withdrawn,
}

impl ProposalStatus {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: ProposalStatus) -> bool {
        use ProposalStatus::*;
        matches!(
            (self, target),
            (Submitted, UnderReview)
                | (Submitted, Withdrawn)
                | (UnderReview, Approved)
                | (UnderReview, Rejected)
                | (UnderReview, Withdrawn)
        )
    }

    /// Whether this status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected | Self::Withdrawn)
    }
}

impl Default for ProposalStatus {
    fn default() -> Self {
        Self::Submitted
    }
}

impl std::fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Submitted => "submitted",
            Self::UnderReview => "under_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Withdrawn => "withdrawn",
        };
        write!(f, "{s}")
    }
}

/// Applicant contact details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// What the applicant is asking for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingGoals {
    pub amount_requested: Decimal,
    /// e.g. "Tuition Fees", "Living Expenses", "Course Materials".
    pub purpose: String,
    pub course_name: String,
    pub institution_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study_duration_months: Option<u32>,
}

/// Optional financial background.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_income: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_collateral: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_score: Option<u16>,
}

/// A reference to an uploaded supporting document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportingDocument {
    /// e.g. "ID Proof", "Admission Letter", "Income Statement".
    pub document_type: String,
    pub url: String,
}

/// Client-submitted proposal body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalSubmission {
    pub personal_info: PersonalInfo,
    pub funding_goals: FundingGoals,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financial_info: Option<FinancialInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub essay_or_statement: Option<String>,
    #[serde(default)]
    pub supporting_documents: Vec<SupportingDocument>,
}

/// A stored funding proposal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub id: Uuid,
    /// Internal id of the submitter's `UserProfile`, when one exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<Uuid>,
    pub personal_info: PersonalInfo,
    pub funding_goals: FundingGoals,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financial_info: Option<FinancialInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub essay_or_statement: Option<String>,
    #[serde(default)]
    pub supporting_documents: Vec<SupportingDocument>,
    pub status: ProposalStatus,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Proposal {
    /// New proposal from a submission, status `Submitted`.
    pub fn from_submission(submission: ProposalSubmission, profile_id: Option<Uuid>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            profile_id,
            personal_info: submission.personal_info,
            funding_goals: submission.funding_goals,
            financial_info: submission.financial_info,
            essay_or_statement: submission.essay_or_statement,
            supporting_documents: submission.supporting_documents,
            status: ProposalStatus::Submitted,
            submitted_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn submission() -> ProposalSubmission {
        serde_json::from_value(serde_json::json!({
            "personalInfo": {
                "firstName": "Ada",
                "lastName": "Obi",
                "email": "ada@example.com"
            },
            "fundingGoals": {
                "amountRequested": "12500.00",
                "purpose": "Tuition Fees",
                "courseName": "Data Engineering",
                "institutionName": "State University",
                "studyDurationMonths": 18
            },
            "supportingDocuments": [
                {"documentType": "Admission Letter", "url": "https://docs/abc"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn submission_deserializes_camel_case() {
        let s = submission();
        assert_eq!(s.personal_info.first_name, "Ada");
        assert_eq!(s.funding_goals.amount_requested, dec!(12500.00));
        assert_eq!(s.funding_goals.study_duration_months, Some(18));
        assert_eq!(s.supporting_documents.len(), 1);
        assert!(s.financial_info.is_none());
    }

    #[test]
    fn new_proposal_starts_submitted() {
        let p = Proposal::from_submission(submission(), None);
        assert_eq!(p.status, ProposalStatus::Submitted);
        assert_eq!(p.submitted_at, p.updated_at);
        assert!(p.profile_id.is_none());
    }

    #[test]
    fn valid_transitions() {
        use ProposalStatus::*;
        let transitions = [
            (Submitted, UnderReview),
            (Submitted, Withdrawn),
            (UnderReview, Approved),
            (UnderReview, Rejected),
            (UnderReview, Withdrawn),
        ];
        for (from, to) in transitions {
            assert!(from.can_transition_to(to), "{from} should transition to {to}");
        }
    }

    #[test]
    fn invalid_transitions() {
        use ProposalStatus::*;
        // Skip review
        assert!(!Submitted.can_transition_to(Approved));
        assert!(!Submitted.can_transition_to(Rejected));
        // Backward
        assert!(!UnderReview.can_transition_to(Submitted));
        // Out of terminal states
        assert!(!Approved.can_transition_to(UnderReview));
        assert!(!Rejected.can_transition_to(Submitted));
        assert!(!Withdrawn.can_transition_to(UnderReview));
        // Self-transition
        assert!(!UnderReview.can_transition_to(UnderReview));
    }

    #[test]
    fn terminal_states() {
        use ProposalStatus::*;
        assert!(Approved.is_terminal());
        assert!(Rejected.is_terminal());
        assert!(Withdrawn.is_terminal());
        assert!(!Submitted.is_terminal());
        assert!(!UnderReview.is_terminal());
    }

    #[test]
    fn display_matches_serde() {
        use ProposalStatus::*;
        for status in [Submitted, UnderReview, Approved, Rejected, Withdrawn] {
            let display = format!("{status}");
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(format!("\"{display}\""), json);
        }
    }

    #[test]
    fn proposal_serde_roundtrip() {
        let p = Proposal::from_submission(submission(), Some(Uuid::new_v4()));
        let json = serde_json::to_string(&p).unwrap();
        let parsed: Proposal = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, p.id);
        assert_eq!(parsed.funding_goals, p.funding_goals);
        assert_eq!(parsed.status, ProposalStatus::Submitted);
    }
}
