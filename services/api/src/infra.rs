use chrono::Utc;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use upkeep::maintenance::{
    MaintenanceCategory, MaintenanceRequest, Page, PageParams, RepositoryError, RequestFilters,
    RequestId, RequestRepository, Vendor, VendorFilters, VendorId, VendorRepository, VendorSummary,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Mutex-guarded map standing in for the relational store. The real
/// persistence engine sits behind the same repository traits.
#[derive(Default, Clone)]
pub(crate) struct InMemoryRequestRepository {
    records: Arc<Mutex<HashMap<RequestId, MaintenanceRequest>>>,
}

impl RequestRepository for InMemoryRequestRepository {
    fn insert(&self, record: MaintenanceRequest) -> Result<MaintenanceRequest, RepositoryError> {
        let mut guard = self.records.lock().expect("request repository mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn list(
        &self,
        filters: &RequestFilters,
        params: PageParams,
    ) -> Result<Page<MaintenanceRequest>, RepositoryError> {
        let guard = self.records.lock().expect("request repository mutex poisoned");
        let mut matching: Vec<_> = guard
            .values()
            .filter(|record| filters.matches(record))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.0.cmp(&a.id.0)));
        Ok(Page::slice(matching, params))
    }

    fn fetch(&self, id: &RequestId) -> Result<Option<MaintenanceRequest>, RepositoryError> {
        let guard = self.records.lock().expect("request repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn update(&self, record: MaintenanceRequest) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("request repository mutex poisoned");
        if guard.contains_key(&record.id) {
            guard.insert(record.id.clone(), record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn delete(&self, id: &RequestId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("request repository mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }

    fn clear_vendor(&self, vendor_id: &VendorId) -> Result<usize, RepositoryError> {
        let mut guard = self.records.lock().expect("request repository mutex poisoned");
        let mut cleared = 0;
        for record in guard.values_mut() {
            if record.assigned_vendor_id.as_ref() == Some(vendor_id) {
                record.assigned_vendor_id = None;
                cleared += 1;
            }
        }
        Ok(cleared)
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryVendorRepository {
    records: Arc<Mutex<HashMap<VendorId, Vendor>>>,
}

impl VendorRepository for InMemoryVendorRepository {
    fn insert(&self, record: Vendor) -> Result<Vendor, RepositoryError> {
        let mut guard = self.records.lock().expect("vendor repository mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn list(
        &self,
        filters: &VendorFilters,
        params: PageParams,
    ) -> Result<Page<Vendor>, RepositoryError> {
        let guard = self.records.lock().expect("vendor repository mutex poisoned");
        let mut matching: Vec<_> = guard
            .values()
            .filter(|record| filters.matches(record))
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(Page::slice(matching, params))
    }

    fn fetch(&self, id: &VendorId) -> Result<Option<Vendor>, RepositoryError> {
        let guard = self.records.lock().expect("vendor repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn update(&self, record: Vendor) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("vendor repository mutex poisoned");
        if guard.contains_key(&record.id) {
            guard.insert(record.id.clone(), record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn delete(&self, id: &VendorId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("vendor repository mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }

    fn list_active(&self) -> Result<Vec<VendorSummary>, RepositoryError> {
        let guard = self.records.lock().expect("vendor repository mutex poisoned");
        let mut active: Vec<_> = guard
            .values()
            .filter(|vendor| vendor.is_active)
            .map(Vendor::summary)
            .collect();
        active.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(active)
    }
}

/// Starter vendor directory so a fresh process (and the demo command) has a
/// realistic candidate set before anyone registers vendors over the API.
pub(crate) fn seed_vendors(repository: &InMemoryVendorRepository) {
    let seeds = [
        (
            "v1",
            "Quick Fix Plumbing",
            MaintenanceCategory::Plumbing,
            "515-555-0134",
            Some(4.5),
        ),
        (
            "v2",
            "Bright Spark Electric",
            MaintenanceCategory::Electrical,
            "515-555-0190",
            Some(4.8),
        ),
        (
            "v3",
            "Climate Control Co",
            MaintenanceCategory::Hvac,
            "515-555-0147",
            Some(4.2),
        ),
    ];

    let now = Utc::now();
    for (id, name, category, phone, rating) in seeds {
        let record = Vendor {
            id: VendorId(id.to_string()),
            name: name.to_string(),
            category,
            contact_name: None,
            email: None,
            phone: phone.to_string(),
            address: None,
            rating,
            notes: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        // Conflict only happens if seeding runs twice; either way the
        // directory is populated.
        let _ = repository.insert(record);
    }
}
