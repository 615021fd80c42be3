use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for persisted maintenance requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub String);

/// Identifier wrapper for vendor records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VendorId(pub String);

/// Closed taxonomy of maintenance work. Labels outside the set collapse to
/// `Other` rather than guessing a closer match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaintenanceCategory {
    Plumbing,
    Electrical,
    Hvac,
    Appliances,
    Landscaping,
    PestControl,
    Painting,
    Roofing,
    Structural,
    Other,
}

impl MaintenanceCategory {
    pub const ALL: [MaintenanceCategory; 10] = [
        MaintenanceCategory::Plumbing,
        MaintenanceCategory::Electrical,
        MaintenanceCategory::Hvac,
        MaintenanceCategory::Appliances,
        MaintenanceCategory::Landscaping,
        MaintenanceCategory::PestControl,
        MaintenanceCategory::Painting,
        MaintenanceCategory::Roofing,
        MaintenanceCategory::Structural,
        MaintenanceCategory::Other,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            MaintenanceCategory::Plumbing => "PLUMBING",
            MaintenanceCategory::Electrical => "ELECTRICAL",
            MaintenanceCategory::Hvac => "HVAC",
            MaintenanceCategory::Appliances => "APPLIANCES",
            MaintenanceCategory::Landscaping => "LANDSCAPING",
            MaintenanceCategory::PestControl => "PEST_CONTROL",
            MaintenanceCategory::Painting => "PAINTING",
            MaintenanceCategory::Roofing => "ROOFING",
            MaintenanceCategory::Structural => "STRUCTURAL",
            MaintenanceCategory::Other => "OTHER",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.label() == label.trim())
    }

    /// Clamp an untrusted label into the taxonomy.
    pub fn clamp_label(label: &str) -> Self {
        Self::from_label(label).unwrap_or(MaintenanceCategory::Other)
    }
}

/// Urgency of a request, ordered from least to most urgent. Labels outside
/// the set collapse to `Medium`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Urgent,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
            Priority::Urgent => "URGENT",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|priority| priority.label() == label.trim())
    }

    pub fn clamp_label(label: &str) -> Self {
        Self::from_label(label).unwrap_or(Priority::Medium)
    }
}

/// Lifecycle of a maintenance request. Transitions are unconstrained: any
/// status may move to any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

/// Read-only vendor snapshot handed to a single classification call. Never
/// cached across calls; the candidate set scopes vendor-id validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorSummary {
    pub id: VendorId,
    pub name: String,
    pub category: MaintenanceCategory,
    pub rating: Option<f64>,
}

/// Validated output of one classification call. Immutable once returned.
///
/// Field names are wire-stable: stored audit data and the original API both
/// use this exact camelCase shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub category: MaintenanceCategory,
    pub priority: Priority,
    pub vendor_id: Option<VendorId>,
    pub reasoning: String,
    pub confidence: f64,
}

impl ClassificationResult {
    /// Degraded-mode result used whenever the external reasoning service is
    /// unusable. Intake availability takes priority over accuracy.
    pub fn fallback() -> Self {
        Self {
            category: MaintenanceCategory::Other,
            priority: Priority::Medium,
            vendor_id: None,
            reasoning: "Unable to classify automatically. Manual review required.".to_string(),
            confidence: 0.0,
        }
    }
}

/// Persisted maintenance request. `category`/`priority` hold the effective
/// values (user override wins); `ai_category`/`ai_priority` always retain the
/// raw AI suggestion for later comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceRequest {
    pub id: RequestId,
    pub title: String,
    pub description: String,
    pub property_address: String,
    pub category: Option<MaintenanceCategory>,
    pub priority: Option<Priority>,
    pub ai_category: Option<MaintenanceCategory>,
    pub ai_priority: Option<Priority>,
    pub assigned_vendor_id: Option<VendorId>,
    pub status: RequestStatus,
    pub estimated_cost: Option<f64>,
    pub actual_cost: Option<f64>,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub completed_date: Option<DateTime<Utc>>,
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Intake payload for a new maintenance request. Category and priority are
/// optional user overrides; absent fields defer to the classifier.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMaintenanceRequest {
    pub title: String,
    pub description: String,
    pub property_address: String,
    #[serde(default)]
    pub category: Option<MaintenanceCategory>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Partial update applied to a stored request. Plain field replacement; no
/// guarded status transitions.
///
/// `assigned_vendor_id` distinguishes "absent" from "explicit null" so a
/// vendor assignment can be cleared without touching the other fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<MaintenanceCategory>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub status: Option<RequestStatus>,
    #[serde(default, deserialize_with = "double_option")]
    pub assigned_vendor_id: Option<Option<VendorId>>,
    #[serde(default)]
    pub estimated_cost: Option<f64>,
    #[serde(default)]
    pub actual_cost: Option<f64>,
    #[serde(default)]
    pub scheduled_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_date: Option<DateTime<Utc>>,
}

/// Vendor record owned by the vendor directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vendor {
    pub id: VendorId,
    pub name: String,
    pub category: MaintenanceCategory,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: String,
    pub address: Option<String>,
    pub rating: Option<f64>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Vendor {
    pub fn summary(&self) -> VendorSummary {
        VendorSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            category: self.category,
            rating: self.rating,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVendor {
    pub name: String,
    pub category: MaintenanceCategory,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub phone: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<MaintenanceCategory>,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Filters for the request listing. All present filters must match.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestFilters {
    #[serde(default)]
    pub status: Option<RequestStatus>,
    #[serde(default)]
    pub category: Option<MaintenanceCategory>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub assigned_vendor_id: Option<VendorId>,
}

impl RequestFilters {
    pub fn matches(&self, request: &MaintenanceRequest) -> bool {
        self.status.map_or(true, |status| request.status == status)
            && self
                .category
                .map_or(true, |category| request.category == Some(category))
            && self
                .priority
                .map_or(true, |priority| request.priority == Some(priority))
            && self.assigned_vendor_id.as_ref().map_or(true, |vendor_id| {
                request.assigned_vendor_id.as_ref() == Some(vendor_id)
            })
    }
}

/// Filters for the vendor listing. `search` is a case-insensitive substring
/// match over name, contact name, and email.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorFilters {
    #[serde(default)]
    pub category: Option<MaintenanceCategory>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub search: Option<String>,
}

impl VendorFilters {
    pub fn matches(&self, vendor: &Vendor) -> bool {
        let search_hit = match &self.search {
            Some(needle) if !needle.trim().is_empty() => {
                let needle = needle.trim().to_lowercase();
                let field_hit = |field: &str| field.to_lowercase().contains(&needle);
                field_hit(&vendor.name)
                    || vendor.contact_name.as_deref().is_some_and(field_hit)
                    || vendor.email.as_deref().is_some_and(field_hit)
            }
            _ => true,
        };

        search_hit
            && self
                .category
                .map_or(true, |category| vendor.category == category)
            && self
                .is_active
                .map_or(true, |is_active| vendor.is_active == is_active)
    }
}

/// Pagination inputs. Out-of-range values are normalized rather than
/// rejected: page floors at 1, limit at 1.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_page() -> usize {
    1
}

fn default_limit() -> usize {
    20
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl PageParams {
    pub fn normalized(self) -> Self {
        Self {
            page: self.page.max(1),
            limit: self.limit.max(1),
        }
    }
}

/// One page of a listing plus the pagination envelope the API exposes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    /// Slice an already filtered and sorted collection into one page.
    pub fn slice(items: Vec<T>, params: PageParams) -> Self {
        let params = params.normalized();
        let total = items.len();
        let total_pages = total.div_ceil(params.limit);
        let items = items
            .into_iter()
            .skip((params.page - 1) * params.limit)
            .take(params.limit)
            .collect();

        Self {
            items,
            page: params.page,
            limit: params.limit,
            total,
            total_pages,
        }
    }
}

/// Deserializer that keeps the missing-vs-null distinction for updates:
/// an absent field maps to `None`, an explicit `null` to `Some(None)`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}
