//! User profile and onboarding data models.
//!
//! Wire format is camelCase JSON (the frontend submits `personalDetails`,
//! `gradYear`, ...). Nested profile sections are stored as JSON documents,
//! one column per top-level section.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The two onboarding roles the platform recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Investor,
}

impl Role {
    /// Parse the `role` discriminant from a payload. Anything other than
    /// the two recognized values is rejected.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "student" => Some(Self::Student),
            "investor" => Some(Self::Investor),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Student => write!(f, "student"),
            Self::Investor => write!(f, "investor"),
        }
    }
}

/// `personalDetails` section of the shared profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

/// `education` section of the shared profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grad_year: Option<String>,
}

/// `skills` section of the shared profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skills {
    #[serde(default)]
    pub selected_skills: Vec<String>,
    #[serde(default)]
    pub interests: Vec<String>,
}

/// `career` section of the shared profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Career {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goals: Option<String>,
    #[serde(default)]
    pub preferred_industries: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary_expectation: Option<String>,
}

/// Canonical user profile — exactly one per external identity.
///
/// Created lazily on first onboarding submission, mutated in place
/// thereafter, never deleted by this flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Internal id, used as the back-reference from role records.
    pub id: Uuid,
    /// External identity issued by the auth provider.
    pub user_id: String,
    pub personal_details: PersonalDetails,
    pub education: Education,
    pub skills: Skills,
    pub career: Career,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Fresh profile for a first-time submitter. Missing payload sections
    /// default to empty structures.
    pub fn from_payload(user_id: &str, payload: &OnboardingPayload) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            personal_details: payload.personal_details.clone().unwrap_or_default(),
            education: payload.education.clone().unwrap_or_default(),
            skills: payload.skills.clone().unwrap_or_default(),
            career: payload.career.clone().unwrap_or_default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite each section wholesale when the payload supplies it;
    /// absent sections keep their stored value. This is a full-object
    /// replace-if-present per section, not a deep merge.
    pub fn apply_payload(&mut self, payload: &OnboardingPayload) {
        if let Some(ref pd) = payload.personal_details {
            self.personal_details = pd.clone();
        }
        if let Some(ref edu) = payload.education {
            self.education = edu.clone();
        }
        if let Some(ref skills) = payload.skills {
            self.skills = skills.clone();
        }
        if let Some(ref career) = payload.career {
            self.career = career.clone();
        }
        self.updated_at = Utc::now();
    }
}

/// Typed view of the submitted onboarding body.
///
/// Everything is optional: the handler validates only the `role`
/// discriminant, and the raw JSON is stored verbatim alongside these
/// fields for forward compatibility.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    // Shared profile sections
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal_details: Option<PersonalDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education: Option<Education>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<Skills>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub career: Option<Career>,

    // Investor-specific
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub investment_focus: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_stages: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portfolio_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_in_company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_appetite: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_in_profile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accreditation_status: Option<String>,

    // Student-specific
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub educational_goals: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub career_aspirations: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_learning_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills_to_develop: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub funding_need_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
}

/// Investor onboarding record — at most one per external identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestorOnboarding {
    /// External identity (upsert key).
    pub user_id: String,
    /// Internal id of the owning `UserProfile`.
    pub profile_id: Uuid,
    pub investment_focus: Option<String>,
    pub preferred_stages: Option<Vec<String>>,
    pub portfolio_size: Option<String>,
    pub company_name: Option<String>,
    pub role_in_company: Option<String>,
    pub risk_appetite: Option<String>,
    pub linked_in_profile: Option<String>,
    pub website: Option<String>,
    pub accreditation_status: Option<String>,
    /// Raw submitted payload, stored verbatim for forward compatibility.
    pub onboarding_data: serde_json::Value,
    pub completed_at: DateTime<Utc>,
}

impl InvestorOnboarding {
    /// Build the record for an upsert. All role fields come from the
    /// current payload; fields the payload omits are stored as NULL.
    pub fn from_payload(
        user_id: &str,
        profile_id: Uuid,
        payload: &OnboardingPayload,
        raw: serde_json::Value,
    ) -> Self {
        Self {
            user_id: user_id.to_string(),
            profile_id,
            investment_focus: payload.investment_focus.clone(),
            preferred_stages: payload.preferred_stages.clone(),
            portfolio_size: payload.portfolio_size.clone(),
            company_name: payload.company_name.clone(),
            role_in_company: payload.role_in_company.clone(),
            risk_appetite: payload.risk_appetite.clone(),
            linked_in_profile: payload.linked_in_profile.clone(),
            website: payload.website.clone(),
            accreditation_status: payload.accreditation_status.clone(),
            onboarding_data: raw,
            completed_at: Utc::now(),
        }
    }
}

/// Student onboarding record — at most one per external identity.
///
/// `location`, `current_education_level`, and `field_of_study` are derived
/// from the shared profile sections of the same payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentOnboarding {
    /// External identity (upsert key).
    pub user_id: String,
    /// Internal id of the owning `UserProfile`.
    pub profile_id: Uuid,
    pub educational_goals: Option<String>,
    pub career_aspirations: Option<String>,
    pub preferred_learning_style: Option<String>,
    pub skills_to_develop: Option<Vec<String>>,
    pub funding_need_reason: Option<String>,
    pub location: Option<String>,
    pub date_of_birth: Option<String>,
    pub current_education_level: Option<String>,
    pub field_of_study: Option<String>,
    /// Raw submitted payload, stored verbatim for forward compatibility.
    pub onboarding_data: serde_json::Value,
    pub completed_at: DateTime<Utc>,
}

impl StudentOnboarding {
    pub fn from_payload(
        user_id: &str,
        profile_id: Uuid,
        payload: &OnboardingPayload,
        raw: serde_json::Value,
    ) -> Self {
        Self {
            user_id: user_id.to_string(),
            profile_id,
            educational_goals: payload.educational_goals.clone(),
            career_aspirations: payload.career_aspirations.clone(),
            preferred_learning_style: payload.preferred_learning_style.clone(),
            skills_to_develop: payload.skills_to_develop.clone(),
            funding_need_reason: payload.funding_need_reason.clone(),
            location: payload
                .personal_details
                .as_ref()
                .and_then(|pd| pd.location.clone()),
            date_of_birth: payload.date_of_birth.clone(),
            current_education_level: payload
                .education
                .as_ref()
                .and_then(|edu| edu.level.clone()),
            field_of_study: payload.education.as_ref().and_then(|edu| edu.major.clone()),
            onboarding_data: raw,
            completed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload_json(json: serde_json::Value) -> OnboardingPayload {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn role_parse_recognizes_both_roles() {
        assert_eq!(Role::parse("student"), Some(Role::Student));
        assert_eq!(Role::parse("investor"), Some(Role::Investor));
        assert_eq!(Role::parse("other"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn payload_deserializes_camel_case() {
        let payload = payload_json(serde_json::json!({
            "role": "student",
            "personalDetails": {"name": "A", "location": "Lagos"},
            "education": {"level": "BSc", "gradYear": "2026"},
            "skillsToDevelop": ["rust", "sql"]
        }));
        assert_eq!(payload.role.as_deref(), Some("student"));
        let pd = payload.personal_details.as_ref().unwrap();
        assert_eq!(pd.name.as_deref(), Some("A"));
        assert_eq!(
            payload.education.as_ref().unwrap().grad_year.as_deref(),
            Some("2026")
        );
        assert_eq!(payload.skills_to_develop.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn fresh_profile_defaults_missing_sections() {
        let payload = payload_json(serde_json::json!({
            "role": "student",
            "personalDetails": {"name": "A"}
        }));
        let profile = UserProfile::from_payload("user_1", &payload);
        assert_eq!(profile.user_id, "user_1");
        assert_eq!(profile.personal_details.name.as_deref(), Some("A"));
        assert_eq!(profile.education, Education::default());
        assert_eq!(profile.skills, Skills::default());
        assert_eq!(profile.career, Career::default());
    }

    #[test]
    fn apply_payload_replaces_supplied_sections_only() {
        let first = payload_json(serde_json::json!({
            "personalDetails": {"name": "A", "bio": "hello"},
            "education": {"level": "BSc"}
        }));
        let mut profile = UserProfile::from_payload("user_1", &first);
        let before_update = profile.updated_at;

        // Second submission replaces personalDetails wholesale (bio gone)
        // but leaves education untouched.
        let second = payload_json(serde_json::json!({
            "personalDetails": {"name": "B"}
        }));
        profile.apply_payload(&second);

        assert_eq!(profile.personal_details.name.as_deref(), Some("B"));
        assert!(profile.personal_details.bio.is_none());
        assert_eq!(profile.education.level.as_deref(), Some("BSc"));
        assert!(profile.updated_at >= before_update);
    }

    #[test]
    fn student_record_derives_shared_fields() {
        let raw = serde_json::json!({
            "role": "student",
            "personalDetails": {"location": "Nairobi"},
            "education": {"level": "MSc", "major": "CS"},
            "educationalGoals": "finish degree"
        });
        let payload = payload_json(raw.clone());
        let record = StudentOnboarding::from_payload("user_1", Uuid::new_v4(), &payload, raw);
        assert_eq!(record.location.as_deref(), Some("Nairobi"));
        assert_eq!(record.current_education_level.as_deref(), Some("MSc"));
        assert_eq!(record.field_of_study.as_deref(), Some("CS"));
        assert_eq!(record.educational_goals.as_deref(), Some("finish degree"));
        assert_eq!(record.onboarding_data["role"], "student");
    }

    #[test]
    fn investor_record_keeps_raw_payload_verbatim() {
        let raw = serde_json::json!({
            "role": "investor",
            "investmentFocus": "edtech",
            "futureField": "not in the schema yet"
        });
        let payload = payload_json(raw.clone());
        let record = InvestorOnboarding::from_payload("user_2", Uuid::new_v4(), &payload, raw);
        assert_eq!(record.investment_focus.as_deref(), Some("edtech"));
        // Unknown fields survive in the verbatim copy.
        assert_eq!(record.onboarding_data["futureField"], "not in the schema yet");
    }

    #[test]
    fn profile_serde_roundtrip() {
        let payload = payload_json(serde_json::json!({
            "personalDetails": {"name": "A"},
            "skills": {"selectedSkills": ["rust"]}
        }));
        let profile = UserProfile::from_payload("user_1", &payload);
        let json = serde_json::to_string(&profile).unwrap();
        let parsed: UserProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, profile.id);
        assert_eq!(parsed.skills.selected_skills, vec!["rust".to_string()]);
    }
}
