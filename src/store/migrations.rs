//! Version-tracked database migrations for the libSQL backend.
//!
//! Each migration has a version number and SQL. `run_migrations()` checks
//! the current version and applies only the new ones sequentially. Schema
//! changes ship as new versions at deployment time; there is no runtime
//! schema invalidation.

use libsql::Connection;
use tracing::info;

use crate::error::DatabaseError;

/// A single migration step.
struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

/// All migrations in order. Add new versions to the end.
static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "onboarding_schema",
        sql: r#"
            CREATE TABLE IF NOT EXISTS user_profiles (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL UNIQUE,
                personal_details TEXT NOT NULL DEFAULT '{}',
                education TEXT NOT NULL DEFAULT '{}',
                skills TEXT NOT NULL DEFAULT '{}',
                career TEXT NOT NULL DEFAULT '{}',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_user_profiles_user ON user_profiles(user_id);

            CREATE TABLE IF NOT EXISTS investor_onboarding (
                user_id TEXT PRIMARY KEY,
                profile_id TEXT NOT NULL REFERENCES user_profiles(id),
                investment_focus TEXT,
                preferred_stages TEXT,
                portfolio_size TEXT,
                company_name TEXT,
                role_in_company TEXT,
                risk_appetite TEXT,
                linkedin_profile TEXT,
                website TEXT,
                accreditation_status TEXT,
                onboarding_data TEXT NOT NULL,
                completed_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS student_onboarding (
                user_id TEXT PRIMARY KEY,
                profile_id TEXT NOT NULL REFERENCES user_profiles(id),
                educational_goals TEXT,
                career_aspirations TEXT,
                preferred_learning_style TEXT,
                skills_to_develop TEXT,
                funding_need_reason TEXT,
                location TEXT,
                date_of_birth TEXT,
                current_education_level TEXT,
                field_of_study TEXT,
                onboarding_data TEXT NOT NULL,
                completed_at TEXT NOT NULL
            );
        "#,
    },
    Migration {
        version: 2,
        name: "proposals",
        sql: r#"
            CREATE TABLE IF NOT EXISTS proposals (
                id TEXT PRIMARY KEY,
                profile_id TEXT REFERENCES user_profiles(id),
                personal_info TEXT NOT NULL,
                funding_goals TEXT NOT NULL,
                financial_info TEXT,
                essay_or_statement TEXT,
                supporting_documents TEXT NOT NULL DEFAULT '[]',
                status TEXT NOT NULL DEFAULT 'submitted',
                submitted_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_proposals_profile ON proposals(profile_id);
            CREATE INDEX IF NOT EXISTS idx_proposals_status ON proposals(status);
        "#,
    },
];

/// Apply all pending migrations.
pub async fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        (),
    )
    .await
    .map_err(|e| DatabaseError::Migration(format!("Failed to create _migrations table: {e}")))?;

    let current_version = get_current_version(conn).await?;

    for migration in MIGRATIONS.iter().filter(|m| m.version > current_version) {
        conn.execute_batch(migration.sql).await.map_err(|e| {
            DatabaseError::Migration(format!(
                "Migration V{} ({}) failed: {e}",
                migration.version, migration.name
            ))
        })?;

        conn.execute(
            "INSERT INTO _migrations (version, name) VALUES (?1, ?2)",
            libsql::params![migration.version, migration.name],
        )
        .await
        .map_err(|e| {
            DatabaseError::Migration(format!(
                "Failed to record migration V{}: {e}",
                migration.version
            ))
        })?;

        info!(version = migration.version, name = migration.name, "Applied migration");
    }

    Ok(())
}

/// Get the highest applied migration version (0 if none).
async fn get_current_version(conn: &Connection) -> Result<i64, DatabaseError> {
    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM _migrations", ())
        .await
        .map_err(|e| DatabaseError::Migration(format!("Failed to read migration version: {e}")))?;

    match rows
        .next()
        .await
        .map_err(|e| DatabaseError::Migration(format!("Failed to read migration version: {e}")))?
    {
        Some(row) => Ok(row.get::<i64>(0).unwrap_or(0)),
        None => Ok(0),
    }
}
