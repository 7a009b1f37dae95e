//! Standalone migration runner: applies all pending migrations against the
//! configured database and exits.

use migration::Migrator;
use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use util::config;

#[tokio::main]
async fn main() {
    let path_or_url = config::database_path();
    let url = if path_or_url.starts_with("sqlite:")
        || path_or_url.starts_with("postgres://")
        || path_or_url.starts_with("mysql://")
    {
        path_or_url
    } else {
        if let Some(parent) = std::path::Path::new(&path_or_url).parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        format!("sqlite://{path_or_url}?mode=rwc")
    };

    let db = Database::connect(&url)
        .await
        .expect("Failed to connect to database");

    Migrator::up(&db, None).await.expect("Migration failed");

    println!("Migrations applied to {url}");
}
