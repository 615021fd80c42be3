use crate::infra::{seed_vendors, InMemoryRequestRepository, InMemoryVendorRepository};
use async_trait::async_trait;
use clap::Args;
use std::sync::Arc;
use std::sync::Mutex;
use upkeep::error::AppError;
use upkeep::maintenance::{
    ClassificationAuditLog, CompletionBackend, CompletionError, MaintenanceService,
    NewMaintenanceRequest, PageParams, RequestClassifier, RequestFilters,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Only run the classification step; skip the follow-up listing output.
    #[arg(long)]
    pub(crate) classification_only: bool,
}

/// Replays a fixed set of assistant replies so the demo works without
/// network access or an API key. The second intake deliberately runs the
/// backend dry to show the fallback path.
#[derive(Default)]
struct CannedBackend {
    replies: Mutex<Vec<String>>,
}

impl CannedBackend {
    fn with_replies(replies: Vec<String>) -> Self {
        let mut replies = replies;
        replies.reverse();
        Self {
            replies: Mutex::new(replies),
        }
    }
}

#[async_trait]
impl CompletionBackend for CannedBackend {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String, CompletionError> {
        let mut guard = self.replies.lock().expect("demo backend mutex poisoned");
        guard.pop().ok_or(CompletionError::Empty)
    }
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        classification_only,
    } = args;

    println!("Maintenance intake demo (offline, canned classifier replies)");

    let requests = Arc::new(InMemoryRequestRepository::default());
    let vendors = Arc::new(InMemoryVendorRepository::default());
    seed_vendors(&vendors);

    let backend = Arc::new(CannedBackend::with_replies(vec![String::from(
        r#"{"category":"PLUMBING","priority":"HIGH","vendorId":"v1","reasoning":"Active leak under the kitchen sink needs a licensed plumber quickly.","confidence":0.92}"#,
    )]));
    let classifier = Arc::new(RequestClassifier::new(backend));
    let audit = Arc::new(ClassificationAuditLog::default());
    let service = Arc::new(MaintenanceService::new(
        requests,
        vendors,
        classifier,
        audit.clone(),
    ));

    let outcome = service
        .create_request(NewMaintenanceRequest {
            title: "Leaking kitchen sink".to_string(),
            description: "Water is pooling under the kitchen sink and the cabinet floor is soaked."
                .to_string(),
            property_address: "412 Maple Street, Unit 2".to_string(),
            category: None,
            priority: None,
            user_id: Some("demo-user".to_string()),
        })
        .await?;

    println!("\nIntake 1: leak report classified by the assistant");
    match serde_json::to_string_pretty(&outcome) {
        Ok(json) => println!("{}", json),
        Err(err) => println!("  payload unavailable: {}", err),
    }

    let fallback_outcome = service
        .create_request(NewMaintenanceRequest {
            title: "Strange smell in hallway".to_string(),
            description: "Tenants report an odd smell near the stairwell on the third floor."
                .to_string(),
            property_address: "412 Maple Street, common area".to_string(),
            category: None,
            priority: None,
            user_id: Some("demo-user".to_string()),
        })
        .await?;

    println!("\nIntake 2: backend exhausted, deterministic fallback applied");
    println!(
        "- category {} | priority {} | reasoning: {}",
        fallback_outcome.ai_classification.category.label(),
        fallback_outcome.ai_classification.priority.label(),
        fallback_outcome.ai_classification.reasoning
    );

    println!("\nClassification audit log (newest first):");
    for entry in audit.recent(10) {
        println!(
            "- {} -> {} / {} (confidence {:.2})",
            entry.request_title,
            entry.classification.category.label(),
            entry.classification.priority.label(),
            entry.classification.confidence
        );
    }

    if classification_only {
        return Ok(());
    }

    let page = service.list_requests(&RequestFilters::default(), PageParams::default())?;
    println!(
        "\nOpen requests ({} total, page {} of {}):",
        page.total, page.page, page.total_pages
    );
    for record in &page.items {
        println!(
            "- {} [{:?}] {} at {} -> vendor {:?}",
            record.id.0,
            record.status,
            record.title,
            record.property_address,
            record.assigned_vendor_id.as_ref().map(|id| id.0.as_str())
        );
    }

    Ok(())
}
