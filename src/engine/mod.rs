//! Registration engine: the business-rule core.
//!
//! One generic decision pipeline parameterized by [`crate::api::EntityKind`]
//! replaces per-kind registration flows. Control flow for one attempt:
//!
//! ```text
//! resolved caller
//!     → window evaluator   (OPEN / NOT_YET_OPEN / CLOSED)
//!     → dedup policy       (ALLOW / already applied / already passed)
//!     → issuer             (code allocation + atomic insert)
//! ```
//!
//! Window evaluation strictly precedes the policy, which strictly precedes
//! the write; each step short-circuits on denial. All functions take the
//! repository as an explicit `&dyn FullRepository` argument; the engine
//! holds no global state of its own.

pub mod error;
pub mod issuer;
pub mod lifecycle;
pub mod policy;
pub mod receipt;
pub mod window;

pub use error::{DuplicateReason, EngineError, EngineResult};
pub use issuer::{generate_code, issue, MAX_CODE_ATTEMPTS};
pub(crate) use issuer::fetch_registrable_entity;
pub use lifecycle::cancel;
pub use policy::{decide, PolicyDecision};
pub use receipt::{receipt, Receipt};
pub use window::evaluate_window;
