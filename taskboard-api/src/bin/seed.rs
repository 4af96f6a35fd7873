//! # Taskboard Seeder
//!
//! Loads demo data into the configured database, replacing whatever is there.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p taskboard-api --bin taskboard-seed        # wipe and load
//! cargo run -p taskboard-api --bin taskboard-seed -- -d  # wipe only
//! ```
//!
//! Demo accounts: `admin@example.com` (system admin) and `dev@example.com`,
//! both with password `taskboard1`.

use anyhow::Context;
use taskboard_api::config::Config;
use taskboard_shared::{
    auth::password::hash_password,
    db::{
        migrations::{ensure_database_exists, run_migrations, wipe_data},
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    models::{
        column::NewColumn,
        project::{NewProject, ProjectRole},
        task::{NewTask, TaskPriority},
        user::{CreateUser, UserRole},
    },
    store::Stores,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

const DEMO_PASSWORD: &str = "taskboard1";
const PROJECT_COUNT: usize = 10;

const SEED_COLUMNS: [(&str, &str, i32); 4] = [
    ("todo", "To Do", 1),
    ("in-progress", "In Progress", 2),
    ("testing", "Testing", 3),
    ("done", "Done", 4),
];

const SEED_TASKS: [(&str, &str, TaskPriority); 3] = [
    ("Write acceptance criteria", "todo", TaskPriority::High),
    ("Implement first slice", "in-progress", TaskPriority::Medium),
    ("Review release notes", "testing", TaskPriority::Low),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskboard_seed=info,taskboard_shared=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let destroy_only = std::env::args().skip(1).any(|arg| arg == "-d");
    let config = Config::from_env()?;

    ensure_database_exists(&config.database.url).await?;
    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: 2,
        ..Default::default()
    })
    .await
    .context("connecting to database")?;
    run_migrations(&pool).await?;

    wipe_data(&pool).await.context("wiping data")?;
    tracing::info!("Data destroyed");

    if !destroy_only {
        let stores = Stores::postgres(pool.clone());
        load_demo_data(&stores).await?;
    }

    close_pool(pool).await;
    Ok(())
}

async fn load_demo_data(stores: &Stores) -> anyhow::Result<()> {
    let password_hash = hash_password(DEMO_PASSWORD)?;

    let admin = stores
        .users
        .create_user(CreateUser {
            name: "Admin User".to_string(),
            email: "admin@example.com".to_string(),
            password_hash: password_hash.clone(),
            role: UserRole::Admin,
        })
        .await?;

    let dev = stores
        .users
        .create_user(CreateUser {
            name: "Dev User".to_string(),
            email: "dev@example.com".to_string(),
            password_hash,
            role: UserRole::Member,
        })
        .await?;

    for n in 1..=PROJECT_COUNT {
        // Alternate ownership so both accounts see owned and joined projects
        let (owner, member) = if n % 2 == 0 {
            (admin.id, dev.id)
        } else {
            (dev.id, admin.id)
        };

        let project = stores
            .projects
            .create_project(NewProject {
                owner_id: owner,
                name: format!("Demo Project {}", n),
                description: Some(format!("Sample board number {}", n)),
            })
            .await?;
        stores
            .projects
            .add_member(project.id, member, ProjectRole::Editor)
            .await?;

        let columns: Vec<NewColumn> = SEED_COLUMNS
            .iter()
            .map(|(key, title, position)| NewColumn {
                project_id: project.id,
                column_key: key.to_string(),
                title: title.to_string(),
                position: *position,
            })
            .collect();
        stores.boards.insert_columns(&columns).await?;

        seed_tasks(stores, project.id, member).await?;
    }

    tracing::info!(
        users = 2,
        projects = PROJECT_COUNT,
        "Demo data imported"
    );
    Ok(())
}

async fn seed_tasks(stores: &Stores, project_id: Uuid, assignee: Uuid) -> anyhow::Result<()> {
    for (i, (title, status, priority)) in SEED_TASKS.iter().enumerate() {
        stores
            .boards
            .create_task(NewTask {
                project_id,
                title: title.to_string(),
                description: None,
                status: status.to_string(),
                assigned_to: (i == 0).then_some(assignee),
                priority: *priority,
                due_date: None,
            })
            .await?;
    }

    Ok(())
}
