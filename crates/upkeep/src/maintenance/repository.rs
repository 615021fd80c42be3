use super::domain::{
    MaintenanceRequest, Page, PageParams, RequestFilters, RequestId, Vendor, VendorFilters,
    VendorId, VendorSummary,
};

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Storage contract for maintenance requests. The persistence collaborator is
/// assumed to serialize per-row writes; no extra coordination happens here.
pub trait RequestRepository: Send + Sync {
    fn insert(&self, record: MaintenanceRequest) -> Result<MaintenanceRequest, RepositoryError>;
    /// Matching records sorted by creation time descending.
    fn list(
        &self,
        filters: &RequestFilters,
        params: PageParams,
    ) -> Result<Page<MaintenanceRequest>, RepositoryError>;
    fn fetch(&self, id: &RequestId) -> Result<Option<MaintenanceRequest>, RepositoryError>;
    fn update(&self, record: MaintenanceRequest) -> Result<(), RepositoryError>;
    fn delete(&self, id: &RequestId) -> Result<(), RepositoryError>;
    /// Clear `assigned_vendor_id` on every request referencing the vendor,
    /// returning how many records changed. Used by the vendor-delete cascade.
    fn clear_vendor(&self, vendor_id: &VendorId) -> Result<usize, RepositoryError>;
}

/// Storage contract for the vendor directory.
pub trait VendorRepository: Send + Sync {
    fn insert(&self, record: Vendor) -> Result<Vendor, RepositoryError>;
    /// Matching vendors sorted by name ascending.
    fn list(
        &self,
        filters: &VendorFilters,
        params: PageParams,
    ) -> Result<Page<Vendor>, RepositoryError>;
    fn fetch(&self, id: &VendorId) -> Result<Option<Vendor>, RepositoryError>;
    fn update(&self, record: Vendor) -> Result<(), RepositoryError>;
    fn delete(&self, id: &VendorId) -> Result<(), RepositoryError>;
    /// Snapshots of every active vendor, the candidate set for one
    /// classification call.
    fn list_active(&self) -> Result<Vec<VendorSummary>, RepositoryError>;
}
