//! Onboarding — role-specific signup flow.
//!
//! One POST endpoint serves both roles by branching on the `role`
//! discriminant in the payload. The handler finds-or-creates the shared
//! `UserProfile` and upserts the role-specific record in a single store
//! transaction.

pub mod model;
pub mod routes;

pub use model::{
    Career, Education, InvestorOnboarding, OnboardingPayload, PersonalDetails, Role, Skills,
    StudentOnboarding, UserProfile,
};
pub use routes::onboarding_routes;
