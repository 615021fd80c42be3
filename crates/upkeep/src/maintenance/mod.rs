//! Maintenance-request intake, classification, and vendor directory.
//!
//! The pipeline runs one classification per incoming request: fetch the
//! active vendor snapshots, ask the backend to categorize the request and
//! recommend a vendor, clamp the reply against the closed taxonomy, persist
//! the merged record, and append the decision to the audit log.

pub mod audit;
pub mod classifier;
pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use audit::{AuditLogEntry, ClassificationAuditLog, DEFAULT_RECENT_LIMIT};
pub use classifier::{CompletionBackend, CompletionError, OpenAiBackend, RequestClassifier};
pub use domain::{
    ClassificationResult, MaintenanceCategory, MaintenanceRequest, NewMaintenanceRequest,
    NewVendor, Page, PageParams, Priority, RequestFilters, RequestId, RequestStatus,
    RequestUpdate, Vendor, VendorFilters, VendorId, VendorSummary, VendorUpdate,
};
pub use repository::{RepositoryError, RequestRepository, VendorRepository};
pub use router::maintenance_router;
pub use service::{IntakeOutcome, MaintenanceService, MaintenanceServiceError};
