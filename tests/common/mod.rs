//! Shared fixtures for integration tests.

use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use leadflow_crm::db::{DbPool, PoolSettings, establish_connection_pool};
use leadflow_crm::repository::DieselRepository;
use tempfile::TempDir;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Migrated SQLite database living in a temporary directory.
pub struct TestDb {
    // Dropped last; removes the database files.
    _dir: TempDir,
    pool: DbPool,
}

impl TestDb {
    pub fn new(file_name: &str) -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join(file_name);
        let pool = establish_connection_pool(
            path.to_str().expect("utf-8 path"),
            PoolSettings::default(),
        )
        .expect("create pool");

        let mut conn = pool.get().expect("get connection");
        conn.run_pending_migrations(MIGRATIONS)
            .expect("run migrations");

        Self { _dir: dir, pool }
    }

    pub fn pool(&self) -> DbPool {
        self.pool.clone()
    }

    pub fn repo(&self) -> DieselRepository {
        DieselRepository::new(self.pool())
    }
}
