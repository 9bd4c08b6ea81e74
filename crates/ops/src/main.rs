//! One-shot operator tooling for HabitDesk.
//!
//! Each subcommand authenticates with the database directly (service
//! credential) and performs a simple batch operation:
//!
//! - `set-admin`: grant the admin role to a user and revoke their sessions
//! - `sync-users`: mirror an exported identity list into the users table
//! - `seed-data`: load therapist types and starter task templates

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

use domain::models::UserRole;
use persistence::db::{create_pool, DatabaseConfig};
use persistence::repositories::{
    task_template::NewTaskTemplate, SessionRepository, TaskTemplateRepository,
    TherapistTypeRepository, UserRepository,
};

#[derive(Parser)]
#[command(
    name = "habitdesk-ops",
    about = "HabitDesk operator tooling — role grants, user sync and seed data",
    version
)]
struct Cli {
    /// Database connection string
    #[arg(long, global = true, env = "HD_OPS_DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grant the admin role to a user
    SetAdmin {
        /// The user's id
        #[arg(long, env = "HD_OPS_ADMIN_UID")]
        uid: Uuid,
    },

    /// Mirror an exported identity list (JSON array) into the users table
    SyncUsers {
        /// Path to the export file
        #[arg(long)]
        file: PathBuf,
    },

    /// Load therapist types and starter task templates
    SeedData {
        /// Path to the seed file (JSON)
        #[arg(long)]
        file: PathBuf,
    },
}

/// One record of an identity export.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportedIdentity {
    uid: Uuid,
    email: String,
    #[serde(default)]
    display_name: String,
    role: Option<String>,
}

/// Seed file shape.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeedFile {
    #[serde(default)]
    therapist_types: Vec<SeedTherapistType>,
    #[serde(default)]
    task_templates: Vec<SeedTaskTemplate>,
}

#[derive(Debug, serde::Deserialize)]
struct SeedTherapistType {
    id: String,
    name: String,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeedTaskTemplate {
    title: String,
    task_type: String,
    #[serde(default = "default_icon")]
    icon: String,
    description: Option<String>,
    #[serde(default = "default_visibility")]
    visibility: String,
    config: Option<serde_json::Value>,
    evidence_config: Option<serde_json::Value>,
    #[serde(default)]
    roles: Vec<String>,
    #[serde(default)]
    therapist_types: Vec<String>,
    #[serde(default = "default_scope")]
    scope: String,
    #[serde(default)]
    is_published: bool,
}

fn default_icon() -> String {
    "assignment".to_string()
}

fn default_visibility() -> String {
    "visibleToPatients".to_string()
}

fn default_scope() -> String {
    "global".to_string()
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_target(false).init();

    let cli = Cli::parse();

    let url = cli
        .database_url
        .or_else(|| std::env::var("HD__DATABASE__URL").ok())
        .context("Set --database-url or HD_OPS_DATABASE_URL")?;

    let pool = create_pool(&DatabaseConfig {
        url,
        max_connections: 5,
        min_connections: 1,
        connect_timeout_secs: 10,
        idle_timeout_secs: 60,
    })
    .await
    .context("Failed to connect to database")?;

    match cli.command {
        Commands::SetAdmin { uid } => set_admin(&pool, uid).await,
        Commands::SyncUsers { file } => sync_users(&pool, &file).await,
        Commands::SeedData { file } => seed_data(&pool, &file).await,
    }
}

/// Grants the admin role and revokes the user's sessions so the new claim
/// takes effect on next login.
async fn set_admin(pool: &sqlx::PgPool, uid: Uuid) -> Result<()> {
    let users = UserRepository::new(pool.clone());
    let sessions = SessionRepository::new(pool.clone());

    if !users.set_role(uid, UserRole::Admin).await? {
        bail!("No user with id {uid}");
    }
    let revoked = sessions.revoke_all_for_user(uid).await?;

    println!("Granted admin role to {uid} ({revoked} session(s) revoked)");
    Ok(())
}

/// Upserts profile rows for every exported identity. Existing roles are
/// kept unless the export carries one.
async fn sync_users(pool: &sqlx::PgPool, file: &PathBuf) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let identities: Vec<ExportedIdentity> =
        serde_json::from_str(&raw).context("Export file is not a JSON identity array")?;

    if identities.is_empty() {
        println!("No identities in export, nothing to sync.");
        return Ok(());
    }

    let users = UserRepository::new(pool.clone());

    for identity in &identities {
        let role = identity
            .role
            .as_deref()
            .and_then(|r| r.parse::<UserRole>().ok());
        let display_name = if identity.display_name.is_empty() {
            identity.email.split('@').next().unwrap_or("User")
        } else {
            &identity.display_name
        };
        users
            .upsert_profile(identity.uid, &identity.email, display_name, role)
            .await
            .with_context(|| format!("Failed to sync user {}", identity.uid))?;
    }

    println!("Synchronized {} user(s)", identities.len());
    Ok(())
}

/// Loads therapist types and starter templates from a seed file. Types that
/// already exist are skipped; templates are inserted as new rows.
async fn seed_data(pool: &sqlx::PgPool, file: &PathBuf) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let seed: SeedFile = serde_json::from_str(&raw).context("Seed file is malformed")?;

    let types = TherapistTypeRepository::new(pool.clone());
    let templates = TaskTemplateRepository::new(pool.clone());

    let mut created_types = 0;
    for entry in &seed.therapist_types {
        if types.find_by_id(&entry.id).await?.is_none() {
            types.create(&entry.id, &entry.name).await?;
            created_types += 1;
        }
    }

    let mut created_templates = 0;
    for entry in &seed.task_templates {
        templates
            .create(&NewTaskTemplate {
                title: entry.title.clone(),
                task_type: entry.task_type.clone(),
                icon: entry.icon.clone(),
                description: entry.description.clone(),
                visibility: entry.visibility.clone(),
                config: entry.config.clone(),
                evidence_config: entry.evidence_config.clone(),
                roles: entry.roles.clone(),
                therapist_types: entry.therapist_types.clone(),
                scope: entry.scope.clone(),
                owner_id: None,
                is_published: entry.is_published,
            })
            .await
            .with_context(|| format!("Failed to seed template '{}'", entry.title))?;
        created_templates += 1;
    }

    println!(
        "Seeded {} therapist type(s) and {} task template(s)",
        created_types, created_templates
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exported_identity_parses_minimal_record() {
        let json = r#"{"uid":"7f0b1f60-0f4a-4a3c-9b8f-0f8d7b1f2a3c","email":"a@example.com"}"#;
        let identity: ExportedIdentity = serde_json::from_str(json).unwrap();
        assert_eq!(identity.email, "a@example.com");
        assert!(identity.role.is_none());
        assert!(identity.display_name.is_empty());
    }

    #[test]
    fn test_seed_file_defaults() {
        let json = r#"{
            "therapistTypes": [{"id": "physiotherapie", "name": "Physiotherapie"}],
            "taskTemplates": [{"title": "Journal", "taskType": "textInput"}]
        }"#;
        let seed: SeedFile = serde_json::from_str(json).unwrap();
        assert_eq!(seed.therapist_types.len(), 1);
        assert_eq!(seed.task_templates[0].scope, "global");
        assert_eq!(seed.task_templates[0].visibility, "visibleToPatients");
        assert!(!seed.task_templates[0].is_published);
    }

    #[test]
    fn test_empty_seed_file() {
        let seed: SeedFile = serde_json::from_str("{}").unwrap();
        assert!(seed.therapist_types.is_empty());
        assert!(seed.task_templates.is_empty());
    }
}
