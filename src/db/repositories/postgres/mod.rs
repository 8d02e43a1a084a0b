//! Postgres repository implementation using Diesel.
//!
//! Implements the repository traits against Postgres. The partial unique
//! index `uq_registrations_live` on (candidate_id, entity_id, entity_kind)
//! over live rows is the store-level serialization point that upholds the
//! one-live-registration invariant under concurrent attempts; violations
//! surface as `RepositoryError::Conflict` carrying the constraint name.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures
//! - Connection health monitoring
//! - Automatic migration execution
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::task;

use crate::api::{CandidateId, EntityId, EntityKind, RegistrationCode};
use crate::db::repository::{
    DirectoryRepository, EntityRepository, ErrorContext, FullRepository, RegistrationRepository,
    RepositoryError, RepositoryResult, ResultRepository,
};
use crate::models::{
    ExamResult, NewRegistration, PriorRegistration, Registration, SchedulableEntity,
};

mod models;
mod schema;

use models::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let max_pool_size = std::env::var("PG_POOL_MAX")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);

        let min_pool_size = std::env::var("PG_POOL_MIN")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(1);

        let connection_timeout_sec = std::env::var("PG_CONN_TIMEOUT_SEC")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);

        let idle_timeout_sec = std::env::var("PG_IDLE_TIMEOUT_SEC")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(600);

        let max_retries = std::env::var("PG_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(3);

        let retry_delay_ms = std::env::var("PG_RETRY_DELAY_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(100);

        Ok(Self {
            database_url,
            max_pool_size,
            min_pool_size,
            connection_timeout_sec,
            idle_timeout_sec,
            max_retries,
            retry_delay_ms,
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Pool health statistics.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Number of connections currently in use
    pub connections_in_use: u32,
    /// Number of idle connections
    pub idle_connections: u32,
    /// Total number of connections in the pool
    pub total_connections: u32,
    /// Maximum pool size
    pub max_size: u32,
    /// Total successful queries executed
    pub total_queries: u64,
    /// Total failed queries
    pub failed_queries: u64,
    /// Total retried operations
    pub retried_operations: u64,
}

/// Diesel-backed repository for Postgres.
///
/// This repository implementation provides:
/// - Connection pooling with configurable limits
/// - Automatic retry for transient failures
/// - Health monitoring and statistics
/// - Automatic schema migrations
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
    // Metrics counters
    total_queries: std::sync::Arc<AtomicU64>,
    failed_queries: std::sync::Arc<AtomicU64>,
    retried_operations: std::sync::Arc<AtomicU64>,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true) // Validate connections before use
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        // Run migrations once during initialization
        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }

        Ok(Self {
            pool,
            config,
            total_queries: std::sync::Arc::new(AtomicU64::new(0)),
            failed_queries: std::sync::Arc::new(AtomicU64::new(0)),
            retried_operations: std::sync::Arc::new(AtomicU64::new(0)),
        })
    }

    /// Run pending database migrations.
    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;

        Ok(())
    }

    /// Execute a database operation with automatic retry for transient failures.
    ///
    /// The operation is retried up to `max_retries` times when a retryable
    /// error occurs (connection errors, timeouts, serialization failures).
    /// Conflicts are never retried here; the issuer owns that decision.
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;
        let total_queries = self.total_queries.clone();
        let failed_queries = self.failed_queries.clone();
        let retried_operations = self.retried_operations.clone();

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    retried_operations.fetch_add(1, Ordering::Relaxed);
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2; // Exponential backoff
                }

                // Get connection
                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new("get_connection")
                                .with_details(format!("attempt={}", attempt + 1))
                                .retryable(),
                        );
                        if attempt < max_retries {
                            last_error = Some(err);
                            continue;
                        }
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(err);
                    }
                };

                // Execute the operation
                total_queries.fetch_add(1, Ordering::Relaxed);
                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => {
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(e);
                    }
                }
            }

            failed_queries.fetch_add(1, Ordering::Relaxed);
            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }

    /// Get pool health statistics.
    pub fn get_pool_stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats {
            connections_in_use: state.connections - state.idle_connections,
            idle_connections: state.idle_connections,
            total_connections: state.connections,
            max_size: self.config.max_pool_size,
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            retried_operations: self.retried_operations.load(Ordering::Relaxed),
        }
    }

    /// Check if the database connection is healthy.
    pub async fn is_healthy(&self) -> bool {
        self.health_check().await.unwrap_or(false)
    }

    /// Get detailed health information.
    ///
    /// Returns a tuple of (is_healthy, latency_ms, error_message).
    pub async fn health_check_detailed(&self) -> (bool, Option<u64>, Option<String>) {
        let start = Instant::now();
        match self.health_check().await {
            Ok(true) => (true, Some(start.elapsed().as_millis() as u64), None),
            Ok(false) => (
                false,
                Some(start.elapsed().as_millis() as u64),
                Some("Health check returned false".to_string()),
            ),
            Err(e) => (
                false,
                Some(start.elapsed().as_millis() as u64),
                Some(e.to_string()),
            ),
        }
    }
}

#[async_trait]
impl EntityRepository for PostgresRepository {
    async fn store_entity(&self, entity: &SchedulableEntity) -> RepositoryResult<EntityId> {
        entity.validate_window().map_err(|msg| {
            RepositoryError::validation_with_context(
                msg,
                ErrorContext::new("store_entity").with_entity("entity"),
            )
        })?;

        let new_row = NewEntityRow::from_domain(entity);
        let id: i64 = self
            .with_conn(move |conn| {
                diesel::insert_into(schema::entities::table)
                    .values(&new_row)
                    .returning(schema::entities::entity_id)
                    .get_result(conn)
                    .map_err(RepositoryError::from)
            })
            .await
            .map_err(|e| e.with_operation("store_entity"))?;

        Ok(EntityId::new(id))
    }

    async fn fetch_entity(
        &self,
        kind: EntityKind,
        id: EntityId,
    ) -> RepositoryResult<Option<SchedulableEntity>> {
        use schema::entities::dsl;

        let kind_tag = kind.as_str().to_string();
        let entity_id = id.value();
        let row: Option<EntityRow> = self
            .with_conn(move |conn| {
                dsl::entities
                    .filter(dsl::entity_id.eq(entity_id))
                    .filter(dsl::kind.eq(kind_tag.clone()))
                    .select(EntityRow::as_select())
                    .first(conn)
                    .optional()
                    .map_err(RepositoryError::from)
            })
            .await
            .map_err(|e| e.with_operation("fetch_entity"))?;

        row.map(EntityRow::into_domain).transpose()
    }

    async fn list_entities(&self, kind: EntityKind) -> RepositoryResult<Vec<SchedulableEntity>> {
        use schema::entities::dsl;

        let kind_tag = kind.as_str().to_string();
        let rows: Vec<EntityRow> = self
            .with_conn(move |conn| {
                dsl::entities
                    .filter(dsl::kind.eq(kind_tag.clone()))
                    .order(dsl::entity_id.asc())
                    .select(EntityRow::as_select())
                    .load(conn)
                    .map_err(RepositoryError::from)
            })
            .await
            .map_err(|e| e.with_operation("list_entities"))?;

        rows.into_iter().map(EntityRow::into_domain).collect()
    }

    async fn deactivate_entity(&self, kind: EntityKind, id: EntityId) -> RepositoryResult<bool> {
        use schema::entities::dsl;

        let kind_tag = kind.as_str().to_string();
        let entity_id = id.value();
        let updated = self
            .with_conn(move |conn| {
                diesel::update(
                    dsl::entities
                        .filter(dsl::entity_id.eq(entity_id))
                        .filter(dsl::kind.eq(kind_tag.clone())),
                )
                .set(dsl::is_active.eq(false))
                .execute(conn)
                .map_err(RepositoryError::from)
            })
            .await
            .map_err(|e| e.with_operation("deactivate_entity"))?;

        Ok(updated > 0)
    }
}

#[async_trait]
impl RegistrationRepository for PostgresRepository {
    async fn insert_registration(&self, new: &NewRegistration) -> RepositoryResult<Registration> {
        use schema::registrations::dsl;

        let row = RegistrationRow {
            registration_code: new.code.as_str().to_string(),
            candidate_id: new.candidate_id.value(),
            entity_id: new.entity_id.value(),
            entity_kind: new.kind.as_str().to_string(),
            organization_id: new.organization_id.value(),
            superseded: false,
            created_at: new.created_at,
        };
        let supersedes = new.supersedes.as_ref().map(|c| c.as_str().to_string());

        let inserted: RegistrationRow = self
            .with_conn(move |conn| {
                // Supersede + insert as one transaction; the partial unique
                // index rejects any second live row for the triple.
                conn.transaction(|conn| {
                    if let Some(code) = &supersedes {
                        diesel::update(dsl::registrations.filter(dsl::registration_code.eq(code)))
                            .set(dsl::superseded.eq(true))
                            .execute(conn)?;
                    }

                    diesel::insert_into(dsl::registrations)
                        .values(&row)
                        .returning(RegistrationRow::as_returning())
                        .get_result(conn)
                })
                .map_err(RepositoryError::from)
            })
            .await
            .map_err(|e| e.with_operation("insert_registration"))?;

        inserted.into_domain()
    }

    async fn registrations_for(
        &self,
        candidate: CandidateId,
        kind: EntityKind,
        entity: EntityId,
    ) -> RepositoryResult<Vec<PriorRegistration>> {
        use schema::exam_results;
        use schema::registrations::dsl;

        let candidate_id = candidate.value();
        let kind_tag = kind.as_str().to_string();
        let entity_id = entity.value();
        let rows: Vec<(RegistrationRow, Option<ExamResultRow>)> = self
            .with_conn(move |conn| {
                dsl::registrations
                    .left_join(exam_results::table)
                    .filter(dsl::candidate_id.eq(candidate_id))
                    .filter(dsl::entity_kind.eq(kind_tag.clone()))
                    .filter(dsl::entity_id.eq(entity_id))
                    .filter(dsl::superseded.eq(false))
                    .order((dsl::created_at.asc(), dsl::registration_code.asc()))
                    .select((
                        RegistrationRow::as_select(),
                        Option::<ExamResultRow>::as_select(),
                    ))
                    .load(conn)
                    .map_err(RepositoryError::from)
            })
            .await
            .map_err(|e| e.with_operation("registrations_for"))?;

        rows.into_iter()
            .map(|(registration, result)| {
                Ok(PriorRegistration {
                    registration: registration.into_domain()?,
                    result: result.map(ExamResultRow::into_domain),
                })
            })
            .collect()
    }

    async fn find_registration(
        &self,
        code: &RegistrationCode,
    ) -> RepositoryResult<Option<Registration>> {
        use schema::registrations::dsl;

        let code = code.as_str().to_string();
        let row: Option<RegistrationRow> = self
            .with_conn(move |conn| {
                dsl::registrations
                    .filter(dsl::registration_code.eq(code.clone()))
                    .select(RegistrationRow::as_select())
                    .first(conn)
                    .optional()
                    .map_err(RepositoryError::from)
            })
            .await
            .map_err(|e| e.with_operation("find_registration"))?;

        row.map(RegistrationRow::into_domain).transpose()
    }

    async fn delete_registration(&self, code: &RegistrationCode) -> RepositoryResult<bool> {
        use schema::registrations::dsl;

        let code = code.as_str().to_string();
        let deleted = self
            .with_conn(move |conn| {
                diesel::delete(dsl::registrations.filter(dsl::registration_code.eq(code.clone())))
                    .execute(conn)
                    .map_err(RepositoryError::from)
            })
            .await
            .map_err(|e| e.with_operation("delete_registration"))?;

        Ok(deleted > 0)
    }

    async fn registration_code_exists(&self, code: &RegistrationCode) -> RepositoryResult<bool> {
        use diesel::dsl::count_star;
        use schema::registrations::dsl;

        let code = code.as_str().to_string();
        let count: i64 = self
            .with_conn(move |conn| {
                dsl::registrations
                    .filter(dsl::registration_code.eq(code.clone()))
                    .select(count_star())
                    .first(conn)
                    .map_err(RepositoryError::from)
            })
            .await
            .map_err(|e| e.with_operation("registration_code_exists"))?;

        Ok(count > 0)
    }
}

#[async_trait]
impl ResultRepository for PostgresRepository {
    async fn store_result(&self, result: &ExamResult) -> RepositoryResult<()> {
        use schema::exam_results::dsl;

        let row = ExamResultRow::from_domain(result);
        self.with_conn(move |conn| {
            diesel::insert_into(dsl::exam_results)
                .values(&row)
                .on_conflict(dsl::registration_code)
                .do_update()
                .set((
                    dsl::score.eq(row.score),
                    dsl::passing_score.eq(row.passing_score),
                ))
                .execute(conn)
                .map_err(RepositoryError::from)
        })
        .await
        .map_err(|e| e.with_operation("store_result"))?;

        Ok(())
    }

    async fn result_for(&self, code: &RegistrationCode) -> RepositoryResult<Option<ExamResult>> {
        use schema::exam_results::dsl;

        let code = code.as_str().to_string();
        let row: Option<ExamResultRow> = self
            .with_conn(move |conn| {
                dsl::exam_results
                    .filter(dsl::registration_code.eq(code.clone()))
                    .select(ExamResultRow::as_select())
                    .first(conn)
                    .optional()
                    .map_err(RepositoryError::from)
            })
            .await
            .map_err(|e| e.with_operation("result_for"))?;

        Ok(row.map(ExamResultRow::into_domain))
    }
}

#[async_trait]
impl DirectoryRepository for PostgresRepository {
    async fn assign_teacher(
        &self,
        teacher: CandidateId,
        student: CandidateId,
    ) -> RepositoryResult<()> {
        use schema::teacher_assignments::dsl;

        let row = TeacherAssignmentRow {
            teacher_id: teacher.value(),
            student_id: student.value(),
            created_at: chrono::Utc::now(),
        };
        self.with_conn(move |conn| {
            diesel::insert_into(dsl::teacher_assignments)
                .values(&row)
                .on_conflict_do_nothing()
                .execute(conn)
                .map_err(RepositoryError::from)
        })
        .await
        .map_err(|e| e.with_operation("assign_teacher"))?;

        Ok(())
    }

    async fn is_teacher_assigned(
        &self,
        teacher: CandidateId,
        student: CandidateId,
    ) -> RepositoryResult<bool> {
        use diesel::dsl::count_star;
        use schema::teacher_assignments::dsl;

        let teacher_id = teacher.value();
        let student_id = student.value();
        let count: i64 = self
            .with_conn(move |conn| {
                dsl::teacher_assignments
                    .filter(dsl::teacher_id.eq(teacher_id))
                    .filter(dsl::student_id.eq(student_id))
                    .select(count_star())
                    .first(conn)
                    .map_err(RepositoryError::from)
            })
            .await
            .map_err(|e| e.with_operation("is_teacher_assigned"))?;

        Ok(count > 0)
    }
}

#[async_trait]
impl FullRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(|conn| {
            diesel::sql_query("SELECT 1")
                .execute(conn)
                .map_err(RepositoryError::from)
        })
        .await
        .map(|_| true)
        .map_err(|e| e.with_operation("health_check"))
    }
}
