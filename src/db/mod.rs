//! Storage layer for registration data.
//!
//! This module provides abstractions for database operations via the Repository pattern,
//! allowing different storage backends to be swapped easily.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Application Layer (REST API)                           │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Engine Layer (crate::engine) - Business Logic          │
//! │  - Window evaluation and duplicate policy                │
//! │  - Registration issuance and cancellation                │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository Traits (repository/) - Abstract Interface   │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────┴──────────────┐
//!     │  Local (in-memory)           │
//!     │  Postgres (Diesel + r2d2)    │
//!     └──────────────────────────────┘
//! ```
//!
//! The module includes:
//! - `repository`: Trait definitions and the shared error type
//! - `repositories::postgres`: Postgres implementation with Diesel ORM
//! - `repositories::local`: In-memory implementation for unit testing and local development
//! - `factory`: Factory for creating repository instances
//! - `repo_config`: TOML backend selection file
//!
//! Uniqueness of registration codes and of live (candidate, entity) pairs is
//! enforced at this layer; both backends report violations as
//! [`RepositoryError::Conflict`] carrying the constraint name.

// Feature flag priority: postgres > local
// When multiple features are enabled (e.g., --all-features), postgres takes precedence.
#[cfg(not(any(feature = "postgres-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;

// Postgres config is colocated with the repository implementation.
#[cfg(feature = "postgres-repo")]
pub use repositories::postgres::{PoolStats, PostgresConfig};
#[cfg(not(feature = "postgres-repo"))]
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    _private: (),
}
#[cfg(not(feature = "postgres-repo"))]
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    _private: (),
}

pub use repo_config::RepositoryConfig;

// Repository traits and implementations
pub use factory::{RepositoryBuilder, RepositoryFactory, RepositoryType};
pub use repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use repositories::PostgresRepository;
pub use repository::{
    DirectoryRepository, EntityRepository, ErrorContext, FullRepository, RegistrationRepository,
    RepositoryError, RepositoryResult, ResultRepository, CODE_CONSTRAINT, LIVE_PAIR_CONSTRAINT,
};

