//! AI-backed classification of maintenance requests.
//!
//! The classifier renders a structured prompt from the request and the
//! candidate vendor list, asks the backend for a JSON-only reply, and clamps
//! whatever comes back against the fixed taxonomy. It never raises: every
//! failure mode (transport error, timeout, prose-wrapped garbage, missing
//! fields) collapses to the same fallback result so ticket intake stays
//! available when the reasoning service is not.

pub mod openai;

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::domain::{ClassificationResult, MaintenanceCategory, Priority, VendorSummary};

pub use openai::OpenAiBackend;

const SYSTEM_PROMPT: &str =
    "You are a maintenance request classification assistant. Always respond with valid JSON only.";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Error raised by a completion backend. Stays inside the classifier; callers
/// of [`RequestClassifier::classify`] only ever see the fallback result.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("backend returned status {status}: {body}")]
    Api { status: u16, body: String },
    #[error("backend returned no content")]
    Empty,
    #[error("missing API credentials")]
    Credentials,
}

/// Seam for the external text-generation service. Injected at construction so
/// tests can script replies without any import-order side effects.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String, CompletionError>;
}

/// Classifier over a completion backend.
pub struct RequestClassifier<B> {
    backend: Arc<B>,
    timeout: Duration,
}

impl<B> RequestClassifier<B>
where
    B: CompletionBackend + 'static,
{
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Classify a request against the supplied candidate vendors.
    ///
    /// The returned `vendor_id`, when present, always references one of
    /// `candidate_vendors`; anything else the model names is nulled out.
    pub async fn classify(
        &self,
        title: &str,
        description: &str,
        property_address: &str,
        candidate_vendors: &[VendorSummary],
    ) -> ClassificationResult {
        let prompt = render_prompt(title, description, property_address, candidate_vendors);

        let reply = match tokio::time::timeout(
            self.timeout,
            self.backend.complete(SYSTEM_PROMPT, &prompt),
        )
        .await
        {
            Ok(Ok(reply)) => reply,
            Ok(Err(err)) => {
                warn!(%err, "classification backend failed, using fallback");
                return ClassificationResult::fallback();
            }
            Err(_) => {
                warn!(timeout = ?self.timeout, "classification call timed out, using fallback");
                return ClassificationResult::fallback();
            }
        };

        match parse_classification(&reply, candidate_vendors) {
            Some(result) => {
                debug!(
                    category = result.category.label(),
                    priority = result.priority.label(),
                    confidence = result.confidence,
                    "classified maintenance request"
                );
                result
            }
            None => {
                warn!("classification reply was not parseable JSON, using fallback");
                ClassificationResult::fallback()
            }
        }
    }
}

/// Raw reply shape before clamping. Category and priority arrive as free
/// strings; everything else is optional so a sparse reply still parses.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawClassification {
    category: String,
    priority: String,
    #[serde(default)]
    vendor_id: Option<String>,
    #[serde(default)]
    reasoning: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
}

/// Parse and clamp a backend reply. Returns `None` when no balanced JSON
/// object can be extracted or required fields are missing, which the caller
/// treats identically to an empty response.
pub(crate) fn parse_classification(
    reply: &str,
    candidate_vendors: &[VendorSummary],
) -> Option<ClassificationResult> {
    let span = extract_json_object(reply)?;
    let raw: RawClassification = serde_json::from_str(span).ok()?;

    let vendor_id = raw
        .vendor_id
        .filter(|id| candidate_vendors.iter().any(|vendor| vendor.id.0 == *id))
        .map(super::domain::VendorId);

    Some(ClassificationResult {
        category: MaintenanceCategory::clamp_label(&raw.category),
        priority: Priority::clamp_label(&raw.priority),
        vendor_id,
        reasoning: raw.reasoning.unwrap_or_default(),
        confidence: raw.confidence.unwrap_or(0.0).clamp(0.0, 1.0),
    })
}

/// Find the first balanced `{...}` span in possibly prose-wrapped text.
///
/// The backend is prompted for JSON-only output but routinely ignores that,
/// so we scan for the first object while respecting string literals and
/// escape sequences instead of reaching for a regex.
pub(crate) fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Render the user prompt for one classification call.
pub(crate) fn render_prompt(
    title: &str,
    description: &str,
    property_address: &str,
    candidate_vendors: &[VendorSummary],
) -> String {
    let categories = MaintenanceCategory::ALL
        .iter()
        .map(|category| category.label())
        .collect::<Vec<_>>()
        .join(", ");

    let vendor_list = if candidate_vendors.is_empty() {
        "No vendors available".to_string()
    } else {
        let mut lines = String::new();
        for vendor in candidate_vendors {
            let rating = vendor
                .rating
                .map(|rating| rating.to_string())
                .unwrap_or_else(|| "N/A".to_string());
            let _ = writeln!(
                lines,
                "- {} (ID: {}, Category: {}, Rating: {})",
                vendor.name,
                vendor.id.0,
                vendor.category.label(),
                rating
            );
        }
        lines.trim_end().to_string()
    };

    format!(
        "You are an AI assistant for a property management company. Analyze this maintenance request and provide classification.\n\
         \n\
         ## Maintenance Request\n\
         Title: {title}\n\
         Description: {description}\n\
         Property: {property_address}\n\
         \n\
         ## Available Categories\n\
         {categories}\n\
         \n\
         ## Priority Levels\n\
         - LOW: Can be addressed within 1-2 weeks, no immediate impact on habitability\n\
         - MEDIUM: Should be addressed within a few days, minor inconvenience\n\
         - HIGH: Should be addressed within 24-48 hours, significant inconvenience or potential damage\n\
         - URGENT: Requires immediate attention, safety hazard or major damage in progress\n\
         \n\
         ## Available Vendors\n\
         {vendor_list}\n\
         \n\
         ## Instructions\n\
         1. Classify this request into the most appropriate category\n\
         2. Assign a priority level based on urgency and impact\n\
         3. Recommend the best vendor based on category match and rating\n\
         4. Provide brief reasoning for your decisions\n\
         5. Rate your confidence from 0 to 1\n\
         \n\
         Respond with a JSON object only, no additional text:\n\
         {{\n\
           \"category\": \"CATEGORY_NAME\",\n\
           \"priority\": \"PRIORITY_LEVEL\",\n\
           \"vendorId\": \"vendor_id_or_null\",\n\
           \"reasoning\": \"Brief explanation of classification and vendor selection\",\n\
           \"confidence\": 0.95\n\
         }}"
    )
}
