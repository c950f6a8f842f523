//! Shared fixtures for `PostgreSQL` integration tests.
//!
//! A template database is migrated once per cluster; each test clones it
//! into a throwaway database that a [`CleanupGuard`] drops afterwards.

use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use mockable::DefaultClock;
use pg_embedded_setup_unpriv::TestCluster;
use taskboard::task::{
    adapters::postgres::PostgresStore,
    domain::{NewTaskData, Task, TaskId, TaskTitle, TeamId, UserId},
};
use tokio::runtime::Runtime;

/// SQL creating the task, follower, and history tables.
const CREATE_SCHEMA_SQL: &str =
    include_str!("../../migrations/2026-08-01-000000_create_task_tables/up.sql");

/// Template database name holding the pre-migrated schema.
const TEMPLATE_DB: &str = "taskboard_test_template";

/// Boxed error type returned by the fixture helpers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Creates a tokio runtime for async operations in tests.
pub fn test_runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to create test runtime")
}

/// Ensures the template database exists with the schema applied.
pub fn ensure_template(cluster: &TestCluster) -> Result<(), BoxError> {
    cluster
        .ensure_template_exists(TEMPLATE_DB, |db_name| {
            let url = cluster.connection().database_url(db_name);
            let mut conn = PgConnection::establish(&url).map_err(|e| eyre::eyre!("{e}"))?;
            execute_sql_statements(&mut conn, CREATE_SCHEMA_SQL)?;
            Ok(())
        })
        .map_err(|e| Box::new(e) as BoxError)?;
    Ok(())
}

/// Executes multiple SQL statements from a single string.
///
/// Splits on semicolons and executes each non-empty statement individually
/// since `diesel::sql_query` cannot execute multiple statements in one call.
fn execute_sql_statements(conn: &mut PgConnection, sql: &str) -> eyre::Result<()> {
    for statement in sql.split(';') {
        let trimmed = statement.trim();
        if trimmed.is_empty() || trimmed.lines().all(|line| line.trim().starts_with("--")) {
            continue;
        }
        diesel::sql_query(trimmed)
            .execute(conn)
            .map_err(|e| eyre::eyre!("SQL error: {e}\nStatement: {trimmed}"))?;
    }
    Ok(())
}

/// Creates a test database from the template and returns a store over it.
pub fn setup_store(cluster: &TestCluster, db_name: &str) -> Result<PostgresStore, BoxError> {
    cluster
        .create_database_from_template(db_name, TEMPLATE_DB)
        .map_err(|e| Box::new(e) as BoxError)?;
    let url = cluster.connection().database_url(db_name);
    let manager = ConnectionManager::<PgConnection>::new(url);
    // Pool size of 1 for test isolation and deterministic behaviour
    let pool = Pool::builder()
        .max_size(1)
        .build(manager)
        .map_err(|e| Box::new(e) as BoxError)?;
    Ok(PostgresStore::new(pool))
}

/// Builds a plain top-level task for the given team and creator.
pub fn build_task(title: &str, team_id: TeamId, creator_id: UserId) -> Task {
    Task::new(
        NewTaskData {
            title: TaskTitle::new(title).expect("valid test title"),
            description: None,
            status: None,
            priority: None,
            team_id,
            parent_task_id: None,
            creator_id,
            assignee_id: None,
            start_time: None,
            due_time: None,
        },
        &DefaultClock,
    )
}

/// Builds a subtask of `parent_id` for the given team and creator.
pub fn build_subtask(title: &str, team_id: TeamId, creator_id: UserId, parent_id: TaskId) -> Task {
    Task::new(
        NewTaskData {
            title: TaskTitle::new(title).expect("valid test title"),
            description: None,
            status: None,
            priority: None,
            team_id,
            parent_task_id: Some(parent_id),
            creator_id,
            assignee_id: None,
            start_time: None,
            due_time: None,
        },
        &DefaultClock,
    )
}

/// Cleans up a test database.
fn cleanup_database(cluster: &TestCluster, db_name: &str) {
    if let Err(e) = cluster.drop_database(db_name) {
        eprintln!("Warning: failed to drop test database {db_name}: {e}");
    }
}

/// Guard that ensures test database cleanup runs even if the test panics.
pub struct CleanupGuard<'a> {
    cluster: &'a TestCluster,
    db_name: String,
}

impl<'a> CleanupGuard<'a> {
    /// Registers `db_name` for removal when the guard drops.
    pub const fn new(cluster: &'a TestCluster, db_name: String) -> Self {
        Self { cluster, db_name }
    }
}

impl Drop for CleanupGuard<'_> {
    fn drop(&mut self) {
        cleanup_database(self.cluster, &self.db_name);
    }
}
