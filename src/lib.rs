//! # Education Registration Management System
//!
//! Backend engine for course, exam, and program registration.
//!
//! This crate decides whether a candidate may register for a schedulable
//! entity and, when the answer is yes, issues a unique registration code as
//! proof. The decision pipeline evaluates the entity's registration window,
//! applies the duplicate and re-application policy against the candidate's
//! history, and performs an atomic, conflict-checked insert. The backend
//! exposes a REST API via Axum.
//!
//! ## Features
//!
//! - **Window Evaluation**: OPEN / NOT_YET_OPEN / CLOSED as of a single clock sample
//! - **Duplicate Policy**: deny repeat attempts, allow re-application after a failed result
//! - **Code Issuance**: random 10-character codes with bounded collision retries
//! - **Lifecycle**: ownership-checked cancellation, receipt projection
//! - **HTTP API**: RESTful endpoints with gateway-supplied caller identity
//!
//! ## Architecture
//!
//! The crate is organized into several logical modules:
//!
//! - [`api`]: Identifier newtypes and shared wire-visible enums
//! - [`models`]: Domain types (entities, registrations, results, callers)
//! - [`engine`]: Business rules (window, policy, issuer, lifecycle, receipts)
//! - [`db`]: Repository pattern and persistence layer
//! - [`http`]: Axum-based HTTP server and request handlers

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod api;

pub mod db;
pub mod engine;
pub mod models;

#[cfg(feature = "http-server")]
pub mod http;
