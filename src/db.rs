use anyhow::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use crate::migrator::Migrator;

pub type OrmConn = DatabaseConnection;

/// Create a SeaORM connection.
///
/// SQLite in-memory databases exist per connection, so those get a pool of
/// exactly one; everything else uses the pool defaults.
pub async fn create_orm_conn(database_url: &str) -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(database_url.to_owned());
    if database_url.starts_with("sqlite") {
        options.max_connections(1);
    }
    let conn = Database::connect(options).await?;
    Ok(conn)
}

pub async fn run_migrations(conn: &DatabaseConnection) -> Result<()> {
    Migrator::up(conn, None).await?;
    Ok(())
}
