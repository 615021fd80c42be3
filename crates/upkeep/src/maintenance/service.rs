use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use super::audit::{AuditLogEntry, ClassificationAuditLog};
use super::classifier::{CompletionBackend, RequestClassifier};
use super::domain::{
    MaintenanceRequest, NewMaintenanceRequest, NewVendor, Page, PageParams, RequestFilters,
    RequestId, RequestStatus, RequestUpdate, Vendor, VendorFilters, VendorId, VendorUpdate,
};
use super::repository::{RepositoryError, RequestRepository, VendorRepository};

static REQUEST_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static VENDOR_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_request_id() -> RequestId {
    let id = REQUEST_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    RequestId(format!("req-{id:06}"))
}

fn next_vendor_id() -> VendorId {
    let id = VENDOR_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    VendorId(format!("ven-{id:06}"))
}

/// Result of one intake call: the persisted request plus the classification
/// that informed it, returned together for immediate display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeOutcome {
    pub request: MaintenanceRequest,
    pub ai_classification: super::domain::ClassificationResult,
}

/// Service composing the vendor directory, the classifier, the audit log, and
/// the request store.
pub struct MaintenanceService<R, V, B> {
    requests: Arc<R>,
    vendors: Arc<V>,
    classifier: Arc<RequestClassifier<B>>,
    audit: Arc<ClassificationAuditLog>,
}

impl<R, V, B> MaintenanceService<R, V, B>
where
    R: RequestRepository + 'static,
    V: VendorRepository + 'static,
    B: CompletionBackend + 'static,
{
    pub fn new(
        requests: Arc<R>,
        vendors: Arc<V>,
        classifier: Arc<RequestClassifier<B>>,
        audit: Arc<ClassificationAuditLog>,
    ) -> Self {
        Self {
            requests,
            vendors,
            classifier,
            audit,
        }
    }

    /// Intake pipeline: fetch active vendors, classify, merge user overrides,
    /// persist, and record the decision.
    ///
    /// Classification failure never fails intake; the request is persisted
    /// with the degraded fallback result. Persistence failure fails the whole
    /// operation, so there is no partial state either way.
    pub async fn create_request(
        &self,
        input: NewMaintenanceRequest,
    ) -> Result<IntakeOutcome, MaintenanceServiceError> {
        let candidates = self.vendors.list_active()?;

        let classification = self
            .classifier
            .classify(
                &input.title,
                &input.description,
                &input.property_address,
                &candidates,
            )
            .await;

        self.audit.append(AuditLogEntry {
            timestamp: Utc::now(),
            request_title: input.title.clone(),
            request_description: input.description.clone(),
            classification: classification.clone(),
            available_vendors: candidates,
        });

        let now = Utc::now();
        let record = MaintenanceRequest {
            id: next_request_id(),
            title: input.title,
            description: input.description,
            property_address: input.property_address,
            // User override wins for the effective fields; the raw AI
            // suggestion is kept alongside regardless.
            category: Some(input.category.unwrap_or(classification.category)),
            priority: Some(input.priority.unwrap_or(classification.priority)),
            ai_category: Some(classification.category),
            ai_priority: Some(classification.priority),
            // Vendor assignment always follows the AI until changed via update.
            assigned_vendor_id: classification.vendor_id.clone(),
            status: RequestStatus::Pending,
            estimated_cost: None,
            actual_cost: None,
            scheduled_date: None,
            completed_date: None,
            user_id: input.user_id,
            created_at: now,
            updated_at: now,
        };

        let request = self.requests.insert(record)?;
        info!(
            request_id = %request.id.0,
            category = ?request.category,
            priority = ?request.priority,
            confidence = classification.confidence,
            "maintenance request created"
        );

        Ok(IntakeOutcome {
            request,
            ai_classification: classification,
        })
    }

    pub fn list_requests(
        &self,
        filters: &RequestFilters,
        params: PageParams,
    ) -> Result<Page<MaintenanceRequest>, MaintenanceServiceError> {
        Ok(self.requests.list(filters, params)?)
    }

    pub fn get_request(&self, id: &RequestId) -> Result<MaintenanceRequest, MaintenanceServiceError> {
        let record = self
            .requests
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    /// Plain field replacement; status transitions are unconstrained.
    pub fn update_request(
        &self,
        id: &RequestId,
        update: RequestUpdate,
    ) -> Result<MaintenanceRequest, MaintenanceServiceError> {
        let mut record = self
            .requests
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;

        if let Some(title) = update.title {
            record.title = title;
        }
        if let Some(description) = update.description {
            record.description = description;
        }
        if let Some(category) = update.category {
            record.category = Some(category);
        }
        if let Some(priority) = update.priority {
            record.priority = Some(priority);
        }
        if let Some(status) = update.status {
            record.status = status;
        }
        if let Some(assigned) = update.assigned_vendor_id {
            record.assigned_vendor_id = assigned;
        }
        if let Some(estimated_cost) = update.estimated_cost {
            record.estimated_cost = Some(estimated_cost);
        }
        if let Some(actual_cost) = update.actual_cost {
            record.actual_cost = Some(actual_cost);
        }
        if let Some(scheduled_date) = update.scheduled_date {
            record.scheduled_date = Some(scheduled_date);
        }
        if let Some(completed_date) = update.completed_date {
            record.completed_date = Some(completed_date);
        }
        record.updated_at = Utc::now();

        self.requests.update(record.clone())?;
        Ok(record)
    }

    pub fn delete_request(&self, id: &RequestId) -> Result<(), MaintenanceServiceError> {
        Ok(self.requests.delete(id)?)
    }

    pub fn create_vendor(&self, input: NewVendor) -> Result<Vendor, MaintenanceServiceError> {
        let now = Utc::now();
        let record = Vendor {
            id: next_vendor_id(),
            name: input.name,
            category: input.category,
            contact_name: input.contact_name,
            email: input.email,
            phone: input.phone,
            address: input.address,
            rating: input.rating,
            notes: input.notes,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        Ok(self.vendors.insert(record)?)
    }

    pub fn list_vendors(
        &self,
        filters: &VendorFilters,
        params: PageParams,
    ) -> Result<Page<Vendor>, MaintenanceServiceError> {
        Ok(self.vendors.list(filters, params)?)
    }

    pub fn get_vendor(&self, id: &VendorId) -> Result<Vendor, MaintenanceServiceError> {
        let record = self.vendors.fetch(id)?.ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    pub fn update_vendor(
        &self,
        id: &VendorId,
        update: VendorUpdate,
    ) -> Result<Vendor, MaintenanceServiceError> {
        let mut record = self.vendors.fetch(id)?.ok_or(RepositoryError::NotFound)?;

        if let Some(name) = update.name {
            record.name = name;
        }
        if let Some(category) = update.category {
            record.category = category;
        }
        if let Some(contact_name) = update.contact_name {
            record.contact_name = Some(contact_name);
        }
        if let Some(email) = update.email {
            record.email = Some(email);
        }
        if let Some(phone) = update.phone {
            record.phone = phone;
        }
        if let Some(address) = update.address {
            record.address = Some(address);
        }
        if let Some(rating) = update.rating {
            record.rating = Some(rating);
        }
        if let Some(notes) = update.notes {
            record.notes = Some(notes);
        }
        if let Some(is_active) = update.is_active {
            record.is_active = is_active;
        }
        record.updated_at = Utc::now();

        self.vendors.update(record.clone())?;
        Ok(record)
    }

    /// Delete a vendor, first clearing the assignment on every request that
    /// references it so no dangling foreign reference survives.
    pub fn delete_vendor(&self, id: &VendorId) -> Result<(), MaintenanceServiceError> {
        if self.vendors.fetch(id)?.is_none() {
            return Err(RepositoryError::NotFound.into());
        }

        let cleared = self.requests.clear_vendor(id)?;
        if cleared > 0 {
            info!(vendor_id = %id.0, cleared, "unassigned requests before vendor delete");
        }
        Ok(self.vendors.delete(id)?)
    }

    pub fn audit_log(&self, limit: usize) -> Vec<AuditLogEntry> {
        self.audit.recent(limit)
    }
}

/// Error raised by the maintenance service.
#[derive(Debug, thiserror::Error)]
pub enum MaintenanceServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
