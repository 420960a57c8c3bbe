use anyhow::Result;
use sea_orm::sqlx::{Sqlite, pool::PoolOptions, sqlite::SqliteConnectOptions};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, SqlxSqliteConnector};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::user::UserRepository;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");

        if !in_memory {
            let path_str = db_url.trim_start_matches("sqlite:").trim_start_matches("//");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        // Every pooled connection to an in-memory database must be the same
        // connection, otherwise writers see SQLITE_LOCKED instead of constraint errors.
        let (max_connections, min_connections) = if in_memory {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        let conn = if in_memory {
            connect_in_memory(opt).await?
        } else {
            opt.idle_timeout(Duration::from_secs(300))
                .max_lifetime(Duration::from_secs(600));
            Database::connect(opt).await?
        };

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    #[must_use]
    pub fn user_repo(&self) -> UserRepository {
        UserRepository::new(self.conn.clone())
    }
}

/// Pool settings for an in-memory database. The single connection must never
/// be retired, since a replacement would open a new, empty database.
fn in_memory_pool_options(opt: ConnectOptions) -> PoolOptions<Sqlite> {
    opt.sqlx_pool_options::<Sqlite>()
        .idle_timeout(None)
        .max_lifetime(None)
}

async fn connect_in_memory(opt: ConnectOptions) -> Result<DatabaseConnection> {
    use sea_orm::sqlx::ConnectOptions as _;

    let sqlite_opts = opt
        .get_url()
        .parse::<SqliteConnectOptions>()?
        .disable_statement_logging();

    let pool = in_memory_pool_options(opt)
        .connect_with(sqlite_opts)
        .await?;

    Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
}
