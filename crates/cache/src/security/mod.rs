//! Audit and authorization collaborators
//!
//! The registry consults an [`Authorizer`] before every mutation and reports
//! lock traffic and mutations to an [`AuditSink`]. Both are traits so that a
//! host can plug in its own policy and log pipeline.

pub mod audit;
pub mod authorization;

pub use audit::{
    AuditEvent, AuditRecord, AuditSink, JsonlAuditSink, LockOutcome, MemoryAuditSink,
    MutationOutcome, NullAuditSink, TracingAuditSink,
};
pub use authorization::{
    AllowAll, Authorization, Authorizer, CallerContext, CallerSource, OperationAllowList,
    ReadOnly, RegistryOperation,
};
