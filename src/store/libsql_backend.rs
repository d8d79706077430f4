//! libSQL backend — async `Database` trait implementation.
//!
//! Supports local file and in-memory databases. Nested document sections
//! (profile sections, proposal sub-objects, raw onboarding payloads) are
//! stored as JSON text columns.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::onboarding::model::{
    InvestorOnboarding, OnboardingPayload, Role, StudentOnboarding, UserProfile,
};
use crate::proposals::model::{Proposal, ProposalStatus};
use crate::store::migrations;
use crate::store::traits::Database;

/// libSQL database backend.
///
/// Holds a single connection reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use,
/// but SQLite allows only one open transaction per connection, so every
/// write acquires `write_lock` first. This keeps a second submission from
/// hitting `BEGIN` inside another task's transaction, and keeps
/// single-statement writes from silently joining (and rolling back with)
/// a transaction they were never part of. Reads stay lock-free.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
    write_lock: Mutex<()>,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Connection(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Connection(format!("Failed to open database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Connection(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
            write_lock: Mutex::new(()),
        };
        migrations::run_migrations(&backend.conn).await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Connection(format!("Failed to create in-memory database: {e}"))
            })?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Connection(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
            write_lock: Mutex::new(()),
        };
        migrations::run_migrations(&backend.conn).await?;
        Ok(backend)
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 datetime string (our canonical write format).
fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn parse_uuid(s: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(s).map_err(|e| DatabaseError::Serialization(format!("Invalid UUID {s}: {e}")))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, DatabaseError> {
    serde_json::to_string(value).map_err(|e| DatabaseError::Serialization(e.to_string()))
}

fn from_json<T: DeserializeOwned>(s: &str) -> Result<T, DatabaseError> {
    serde_json::from_str(s).map_err(|e| DatabaseError::Serialization(e.to_string()))
}

/// Serialize an optional string list to a JSON column (NULL when absent).
fn opt_list_to_json(list: &Option<Vec<String>>) -> Result<Option<String>, DatabaseError> {
    list.as_ref().map(to_json).transpose()
}

fn opt_list_from_json(s: Option<String>) -> Result<Option<Vec<String>>, DatabaseError> {
    s.as_deref().map(from_json).transpose()
}

fn status_to_str(status: &ProposalStatus) -> &'static str {
    match status {
        ProposalStatus::Submitted => "submitted",
        ProposalStatus::UnderReview => "under_review",
        ProposalStatus::Approved => "approved",
        ProposalStatus::Rejected => "rejected",
        ProposalStatus::Withdrawn => "withdrawn",
    }
}

fn str_to_status(s: &str) -> ProposalStatus {
    match s {
        "under_review" => ProposalStatus::UnderReview,
        "approved" => ProposalStatus::Approved,
        "rejected" => ProposalStatus::Rejected,
        "withdrawn" => ProposalStatus::Withdrawn,
        _ => ProposalStatus::Submitted,
    }
}

/// Map a libsql Row to a UserProfile.
///
/// Column order: 0:id, 1:user_id, 2:personal_details, 3:education,
/// 4:skills, 5:career, 6:created_at, 7:updated_at
fn row_to_profile(row: &libsql::Row) -> Result<UserProfile, DatabaseError> {
    let read = |i: i32| -> Result<String, DatabaseError> {
        row.get::<String>(i)
            .map_err(|e| DatabaseError::Query(format!("profile column {i}: {e}")))
    };
    Ok(UserProfile {
        id: parse_uuid(&read(0)?)?,
        user_id: read(1)?,
        personal_details: from_json(&read(2)?)?,
        education: from_json(&read(3)?)?,
        skills: from_json(&read(4)?)?,
        career: from_json(&read(5)?)?,
        created_at: parse_datetime(&read(6)?),
        updated_at: parse_datetime(&read(7)?),
    })
}

/// Column order: 0:user_id, 1:profile_id, 2:investment_focus,
/// 3:preferred_stages, 4:portfolio_size, 5:company_name,
/// 6:role_in_company, 7:risk_appetite, 8:linkedin_profile, 9:website,
/// 10:accreditation_status, 11:onboarding_data, 12:completed_at
fn row_to_investor(row: &libsql::Row) -> Result<InvestorOnboarding, DatabaseError> {
    let raw: String = row
        .get(11)
        .map_err(|e| DatabaseError::Query(format!("investor onboarding_data: {e}")))?;
    Ok(InvestorOnboarding {
        user_id: row
            .get(0)
            .map_err(|e| DatabaseError::Query(format!("investor user_id: {e}")))?,
        profile_id: parse_uuid(
            &row.get::<String>(1)
                .map_err(|e| DatabaseError::Query(format!("investor profile_id: {e}")))?,
        )?,
        investment_focus: row.get(2).ok(),
        preferred_stages: opt_list_from_json(row.get(3).ok())?,
        portfolio_size: row.get(4).ok(),
        company_name: row.get(5).ok(),
        role_in_company: row.get(6).ok(),
        risk_appetite: row.get(7).ok(),
        linked_in_profile: row.get(8).ok(),
        website: row.get(9).ok(),
        accreditation_status: row.get(10).ok(),
        onboarding_data: from_json(&raw)?,
        completed_at: parse_datetime(
            &row.get::<String>(12)
                .map_err(|e| DatabaseError::Query(format!("investor completed_at: {e}")))?,
        ),
    })
}

/// Column order: 0:user_id, 1:profile_id, 2:educational_goals,
/// 3:career_aspirations, 4:preferred_learning_style, 5:skills_to_develop,
/// 6:funding_need_reason, 7:location, 8:date_of_birth,
/// 9:current_education_level, 10:field_of_study, 11:onboarding_data,
/// 12:completed_at
fn row_to_student(row: &libsql::Row) -> Result<StudentOnboarding, DatabaseError> {
    let raw: String = row
        .get(11)
        .map_err(|e| DatabaseError::Query(format!("student onboarding_data: {e}")))?;
    Ok(StudentOnboarding {
        user_id: row
            .get(0)
            .map_err(|e| DatabaseError::Query(format!("student user_id: {e}")))?,
        profile_id: parse_uuid(
            &row.get::<String>(1)
                .map_err(|e| DatabaseError::Query(format!("student profile_id: {e}")))?,
        )?,
        educational_goals: row.get(2).ok(),
        career_aspirations: row.get(3).ok(),
        preferred_learning_style: row.get(4).ok(),
        skills_to_develop: opt_list_from_json(row.get(5).ok())?,
        funding_need_reason: row.get(6).ok(),
        location: row.get(7).ok(),
        date_of_birth: row.get(8).ok(),
        current_education_level: row.get(9).ok(),
        field_of_study: row.get(10).ok(),
        onboarding_data: from_json(&raw)?,
        completed_at: parse_datetime(
            &row.get::<String>(12)
                .map_err(|e| DatabaseError::Query(format!("student completed_at: {e}")))?,
        ),
    })
}

/// Column order: 0:id, 1:profile_id, 2:personal_info, 3:funding_goals,
/// 4:financial_info, 5:essay_or_statement, 6:supporting_documents,
/// 7:status, 8:submitted_at, 9:updated_at
fn row_to_proposal(row: &libsql::Row) -> Result<Proposal, DatabaseError> {
    let read = |i: i32| -> Result<String, DatabaseError> {
        row.get::<String>(i)
            .map_err(|e| DatabaseError::Query(format!("proposal column {i}: {e}")))
    };
    let financial_info = match row.get::<String>(4).ok() {
        Some(s) => Some(from_json(&s)?),
        None => None,
    };
    Ok(Proposal {
        id: parse_uuid(&read(0)?)?,
        profile_id: match row.get::<String>(1).ok() {
            Some(s) => Some(parse_uuid(&s)?),
            None => None,
        },
        personal_info: from_json(&read(2)?)?,
        funding_goals: from_json(&read(3)?)?,
        financial_info,
        essay_or_statement: row.get(5).ok(),
        supporting_documents: from_json(&read(6)?)?,
        status: str_to_status(&read(7)?),
        submitted_at: parse_datetime(&read(8)?),
        updated_at: parse_datetime(&read(9)?),
    })
}

const PROFILE_COLUMNS: &str =
    "id, user_id, personal_details, education, skills, career, created_at, updated_at";

const INVESTOR_COLUMNS: &str = "user_id, profile_id, investment_focus, preferred_stages, \
     portfolio_size, company_name, role_in_company, risk_appetite, linkedin_profile, \
     website, accreditation_status, onboarding_data, completed_at";

const STUDENT_COLUMNS: &str = "user_id, profile_id, educational_goals, career_aspirations, \
     preferred_learning_style, skills_to_develop, funding_need_reason, location, \
     date_of_birth, current_education_level, field_of_study, onboarding_data, completed_at";

const PROPOSAL_COLUMNS: &str = "id, profile_id, personal_info, funding_goals, financial_info, \
     essay_or_statement, supporting_documents, status, submitted_at, updated_at";

/// Find a profile by external identity on any connection-like handle.
async fn query_profile(
    conn: &Connection,
    user_id: &str,
) -> Result<Option<UserProfile>, DatabaseError> {
    let mut rows = conn
        .query(
            &format!("SELECT {PROFILE_COLUMNS} FROM user_profiles WHERE user_id = ?1"),
            params![user_id],
        )
        .await
        .map_err(|e| DatabaseError::Query(format!("get_profile: {e}")))?;

    match rows
        .next()
        .await
        .map_err(|e| DatabaseError::Query(format!("get_profile: {e}")))?
    {
        Some(row) => Ok(Some(row_to_profile(&row)?)),
        None => Ok(None),
    }
}

/// Write the full profile row, inserting or replacing all sections.
async fn write_profile(conn: &Connection, profile: &UserProfile) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO user_profiles \
             (id, user_id, personal_details, education, skills, career, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
         ON CONFLICT (user_id) DO UPDATE SET \
             personal_details = ?3, education = ?4, skills = ?5, career = ?6, updated_at = ?8",
        params![
            profile.id.to_string(),
            profile.user_id.as_str(),
            to_json(&profile.personal_details)?,
            to_json(&profile.education)?,
            to_json(&profile.skills)?,
            to_json(&profile.career)?,
            profile.created_at.to_rfc3339(),
            profile.updated_at.to_rfc3339(),
        ],
    )
    .await
    .map_err(|e| DatabaseError::Query(format!("write_profile: {e}")))?;
    Ok(())
}

async fn upsert_investor(
    conn: &Connection,
    record: &InvestorOnboarding,
) -> Result<(), DatabaseError> {
    conn.execute(
        &format!(
            "INSERT INTO investor_onboarding ({INVESTOR_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13) \
             ON CONFLICT (user_id) DO UPDATE SET \
                 profile_id = ?2, investment_focus = ?3, preferred_stages = ?4, \
                 portfolio_size = ?5, company_name = ?6, role_in_company = ?7, \
                 risk_appetite = ?8, linkedin_profile = ?9, website = ?10, \
                 accreditation_status = ?11, onboarding_data = ?12, completed_at = ?13"
        ),
        params![
            record.user_id.as_str(),
            record.profile_id.to_string(),
            record.investment_focus.clone(),
            opt_list_to_json(&record.preferred_stages)?,
            record.portfolio_size.clone(),
            record.company_name.clone(),
            record.role_in_company.clone(),
            record.risk_appetite.clone(),
            record.linked_in_profile.clone(),
            record.website.clone(),
            record.accreditation_status.clone(),
            to_json(&record.onboarding_data)?,
            record.completed_at.to_rfc3339(),
        ],
    )
    .await
    .map_err(|e| DatabaseError::Query(format!("upsert_investor: {e}")))?;
    Ok(())
}

async fn upsert_student(
    conn: &Connection,
    record: &StudentOnboarding,
) -> Result<(), DatabaseError> {
    conn.execute(
        &format!(
            "INSERT INTO student_onboarding ({STUDENT_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13) \
             ON CONFLICT (user_id) DO UPDATE SET \
                 profile_id = ?2, educational_goals = ?3, career_aspirations = ?4, \
                 preferred_learning_style = ?5, skills_to_develop = ?6, \
                 funding_need_reason = ?7, location = ?8, date_of_birth = ?9, \
                 current_education_level = ?10, field_of_study = ?11, \
                 onboarding_data = ?12, completed_at = ?13"
        ),
        params![
            record.user_id.as_str(),
            record.profile_id.to_string(),
            record.educational_goals.clone(),
            record.career_aspirations.clone(),
            record.preferred_learning_style.clone(),
            opt_list_to_json(&record.skills_to_develop)?,
            record.funding_need_reason.clone(),
            record.location.clone(),
            record.date_of_birth.clone(),
            record.current_education_level.clone(),
            record.field_of_study.clone(),
            to_json(&record.onboarding_data)?,
            record.completed_at.to_rfc3339(),
        ],
    )
    .await
    .map_err(|e| DatabaseError::Query(format!("upsert_student: {e}")))?;
    Ok(())
}

#[async_trait]
impl Database for LibSqlBackend {
    async fn get_profile(&self, user_id: &str) -> Result<Option<UserProfile>, DatabaseError> {
        query_profile(self.conn(), user_id).await
    }

    async fn submit_onboarding(
        &self,
        user_id: &str,
        role: Role,
        payload: &OnboardingPayload,
        raw: &serde_json::Value,
    ) -> Result<UserProfile, DatabaseError> {
        // Exclusive use of the connection for the whole BEGIN..COMMIT window.
        let _guard = self.write_lock.lock().await;

        let tx = self
            .conn
            .transaction()
            .await
            .map_err(|e| DatabaseError::Transaction(format!("begin: {e}")))?;

        // Find-or-create the shared profile. Existing profiles get each
        // section replaced wholesale only when the payload supplies it.
        let profile = match query_profile(&tx, user_id).await? {
            Some(mut existing) => {
                existing.apply_payload(payload);
                existing
            }
            None => UserProfile::from_payload(user_id, payload),
        };
        write_profile(&tx, &profile).await?;

        // Role upsert: all role fields come from this payload; omitted
        // fields overwrite with NULL.
        match role {
            Role::Investor => {
                let record =
                    InvestorOnboarding::from_payload(user_id, profile.id, payload, raw.clone());
                upsert_investor(&tx, &record).await?;
            }
            Role::Student => {
                let record =
                    StudentOnboarding::from_payload(user_id, profile.id, payload, raw.clone());
                upsert_student(&tx, &record).await?;
            }
        }

        tx.commit()
            .await
            .map_err(|e| DatabaseError::Transaction(format!("commit: {e}")))?;

        debug!(user_id, %role, "Onboarding submission recorded");
        Ok(profile)
    }

    async fn get_investor_onboarding(
        &self,
        user_id: &str,
    ) -> Result<Option<InvestorOnboarding>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {INVESTOR_COLUMNS} FROM investor_onboarding WHERE user_id = ?1"),
                params![user_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_investor_onboarding: {e}")))?;

        match rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("get_investor_onboarding: {e}")))?
        {
            Some(row) => Ok(Some(row_to_investor(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_student_onboarding(
        &self,
        user_id: &str,
    ) -> Result<Option<StudentOnboarding>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {STUDENT_COLUMNS} FROM student_onboarding WHERE user_id = ?1"),
                params![user_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_student_onboarding: {e}")))?;

        match rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("get_student_onboarding: {e}")))?
        {
            Some(row) => Ok(Some(row_to_student(&row)?)),
            None => Ok(None),
        }
    }

    async fn insert_proposal(&self, proposal: &Proposal) -> Result<(), DatabaseError> {
        let _guard = self.write_lock.lock().await;
        self.conn()
            .execute(
                &format!(
                    "INSERT INTO proposals ({PROPOSAL_COLUMNS}) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
                ),
                params![
                    proposal.id.to_string(),
                    proposal.profile_id.map(|id| id.to_string()),
                    to_json(&proposal.personal_info)?,
                    to_json(&proposal.funding_goals)?,
                    proposal
                        .financial_info
                        .as_ref()
                        .map(to_json)
                        .transpose()?,
                    proposal.essay_or_statement.clone(),
                    to_json(&proposal.supporting_documents)?,
                    status_to_str(&proposal.status),
                    proposal.submitted_at.to_rfc3339(),
                    proposal.updated_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("insert_proposal: {e}")))?;
        Ok(())
    }

    async fn get_proposal(&self, id: Uuid) -> Result<Option<Proposal>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {PROPOSAL_COLUMNS} FROM proposals WHERE id = ?1"),
                params![id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_proposal: {e}")))?;

        match rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("get_proposal: {e}")))?
        {
            Some(row) => Ok(Some(row_to_proposal(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_proposals_for_profile(
        &self,
        profile_id: Uuid,
    ) -> Result<Vec<Proposal>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {PROPOSAL_COLUMNS} FROM proposals \
                     WHERE profile_id = ?1 ORDER BY submitted_at DESC"
                ),
                params![profile_id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_proposals: {e}")))?;

        let mut proposals = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("list_proposals: {e}")))?
        {
            proposals.push(row_to_proposal(&row)?);
        }
        Ok(proposals)
    }

    async fn update_proposal_status(
        &self,
        id: Uuid,
        from: ProposalStatus,
        to: ProposalStatus,
    ) -> Result<bool, DatabaseError> {
        let _guard = self.write_lock.lock().await;
        let affected = self
            .conn()
            .execute(
                "UPDATE proposals SET status = ?1, updated_at = ?2 \
                 WHERE id = ?3 AND status = ?4",
                params![
                    status_to_str(&to),
                    Utc::now().to_rfc3339(),
                    id.to_string(),
                    status_to_str(&from),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("update_proposal_status: {e}")))?;
        Ok(affected > 0)
    }
}
