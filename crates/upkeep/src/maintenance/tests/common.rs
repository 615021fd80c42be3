use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;

use crate::maintenance::audit::ClassificationAuditLog;
use crate::maintenance::classifier::{CompletionBackend, CompletionError, RequestClassifier};
use crate::maintenance::domain::{
    MaintenanceCategory, MaintenanceRequest, NewMaintenanceRequest, Page, PageParams,
    RequestFilters, RequestId, Vendor, VendorFilters, VendorId, VendorSummary,
};
use crate::maintenance::repository::{
    RepositoryError, RequestRepository, VendorRepository,
};
use crate::maintenance::service::MaintenanceService;

/// Backend that replays scripted replies in order and reports an empty
/// response once exhausted.
#[derive(Default)]
pub(super) struct ScriptedBackend {
    replies: Mutex<VecDeque<String>>,
}

impl ScriptedBackend {
    pub(super) fn with_replies(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|reply| reply.to_string()).collect()),
        }
    }

    pub(super) fn with_reply(reply: &str) -> Self {
        Self::with_replies(&[reply])
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String, CompletionError> {
        self.replies
            .lock()
            .expect("scripted backend mutex poisoned")
            .pop_front()
            .ok_or(CompletionError::Empty)
    }
}

/// Backend that always fails at the transport layer.
pub(super) struct FailingBackend;

#[async_trait]
impl CompletionBackend for FailingBackend {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String, CompletionError> {
        Err(CompletionError::Transport("connection refused".to_string()))
    }
}

/// Backend that never answers within any reasonable deadline.
pub(super) struct StalledBackend;

#[async_trait]
impl CompletionBackend for StalledBackend {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String, CompletionError> {
        tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        Err(CompletionError::Empty)
    }
}

#[derive(Default)]
pub(super) struct MemoryRequestRepository {
    pub(super) records: Arc<Mutex<HashMap<RequestId, MaintenanceRequest>>>,
}

impl RequestRepository for MemoryRequestRepository {
    fn insert(&self, record: MaintenanceRequest) -> Result<MaintenanceRequest, RepositoryError> {
        let mut guard = self.records.lock().expect("request mutex poisoned");
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
        let guard = self.records.lock().expect("request mutex poisoned");
        let mut matching: Vec<_> = guard
            .values()
            .filter(|record| filters.matches(record))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.0.cmp(&a.id.0)));
        Ok(Page::slice(matching, params))
    }

    fn fetch(&self, id: &RequestId) -> Result<Option<MaintenanceRequest>, RepositoryError> {
        let guard = self.records.lock().expect("request mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn update(&self, record: MaintenanceRequest) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("request mutex poisoned");
        if guard.contains_key(&record.id) {
            guard.insert(record.id.clone(), record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn delete(&self, id: &RequestId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("request mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }

    fn clear_vendor(&self, vendor_id: &VendorId) -> Result<usize, RepositoryError> {
        let mut guard = self.records.lock().expect("request mutex poisoned");
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

#[derive(Default)]
pub(super) struct MemoryVendorRepository {
    pub(super) records: Arc<Mutex<HashMap<VendorId, Vendor>>>,
}

impl VendorRepository for MemoryVendorRepository {
    fn insert(&self, record: Vendor) -> Result<Vendor, RepositoryError> {
        let mut guard = self.records.lock().expect("vendor mutex poisoned");
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
        let guard = self.records.lock().expect("vendor mutex poisoned");
        let mut matching: Vec<_> = guard
            .values()
            .filter(|record| filters.matches(record))
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(Page::slice(matching, params))
    }

    fn fetch(&self, id: &VendorId) -> Result<Option<Vendor>, RepositoryError> {
        let guard = self.records.lock().expect("vendor mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn update(&self, record: Vendor) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("vendor mutex poisoned");
        if guard.contains_key(&record.id) {
            guard.insert(record.id.clone(), record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn delete(&self, id: &VendorId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("vendor mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }

    fn list_active(&self) -> Result<Vec<VendorSummary>, RepositoryError> {
        let guard = self.records.lock().expect("vendor mutex poisoned");
        let mut active: Vec<_> = guard
            .values()
            .filter(|vendor| vendor.is_active)
            .map(Vendor::summary)
            .collect();
        active.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(active)
    }
}

/// Request repository that is always offline, for persistence-failure paths.
pub(super) struct UnavailableRequestRepository;

impl RequestRepository for UnavailableRequestRepository {
    fn insert(&self, _record: MaintenanceRequest) -> Result<MaintenanceRequest, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(
        &self,
        _filters: &RequestFilters,
        _params: PageParams,
    ) -> Result<Page<MaintenanceRequest>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &RequestId) -> Result<Option<MaintenanceRequest>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: MaintenanceRequest) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete(&self, _id: &RequestId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn clear_vendor(&self, _vendor_id: &VendorId) -> Result<usize, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) type TestService<B> =
    MaintenanceService<MemoryRequestRepository, MemoryVendorRepository, B>;

pub(super) fn build_service<B>(
    backend: B,
) -> (
    Arc<TestService<B>>,
    Arc<MemoryRequestRepository>,
    Arc<MemoryVendorRepository>,
    Arc<ClassificationAuditLog>,
)
where
    B: CompletionBackend + 'static,
{
    let requests = Arc::new(MemoryRequestRepository::default());
    let vendors = Arc::new(MemoryVendorRepository::default());
    let audit = Arc::new(ClassificationAuditLog::default());
    let classifier = Arc::new(RequestClassifier::new(Arc::new(backend)));
    let service = Arc::new(MaintenanceService::new(
        requests.clone(),
        vendors.clone(),
        classifier,
        audit.clone(),
    ));
    (service, requests, vendors, audit)
}

pub(super) fn plumbing_vendor(id: &str) -> Vendor {
    let now = chrono::Utc::now();
    Vendor {
        id: VendorId(id.to_string()),
        name: "Quick Fix Plumbing".to_string(),
        category: MaintenanceCategory::Plumbing,
        contact_name: Some("Dana Reyes".to_string()),
        email: Some("dispatch@quickfixplumbing.example".to_string()),
        phone: "515-555-0134".to_string(),
        address: None,
        rating: Some(4.5),
        notes: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

pub(super) fn candidate(id: &str) -> VendorSummary {
    plumbing_vendor(id).summary()
}

pub(super) fn leaking_pipe_request() -> NewMaintenanceRequest {
    NewMaintenanceRequest {
        title: "Leaking pipe under sink".to_string(),
        description: "Water pooling under kitchen sink for two days".to_string(),
        property_address: "12 Elm St".to_string(),
        category: None,
        priority: None,
        user_id: None,
    }
}

pub(super) const PLUMBING_REPLY: &str = r#"{"category":"PLUMBING","priority":"HIGH","vendorId":"v1","reasoning":"Active leak risks water damage","confidence":0.9}"#;

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
