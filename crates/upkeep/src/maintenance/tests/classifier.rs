use std::sync::Arc;
use std::time::Duration;

use super::common::*;
use crate::maintenance::classifier::{
    extract_json_object, parse_classification, render_prompt, RequestClassifier,
};
use crate::maintenance::domain::{
    ClassificationResult, MaintenanceCategory, Priority, VendorId, VendorSummary,
};

fn candidates() -> Vec<VendorSummary> {
    vec![candidate("v1")]
}

#[test]
fn parses_well_formed_reply() {
    let result = parse_classification(PLUMBING_REPLY, &candidates()).expect("parses");

    assert_eq!(result.category, MaintenanceCategory::Plumbing);
    assert_eq!(result.priority, Priority::High);
    assert_eq!(result.vendor_id, Some(VendorId("v1".to_string())));
    assert_eq!(result.reasoning, "Active leak risks water damage");
    assert_eq!(result.confidence, 0.9);
}

#[test]
fn clamps_unknown_category_priority_and_foreign_vendor() {
    let reply = r#"{"category":"UNKNOWN_X","priority":"CRITICAL","vendorId":"v99","reasoning":"...","confidence":0.9}"#;
    let result = parse_classification(reply, &candidates()).expect("parses");

    assert_eq!(result.category, MaintenanceCategory::Other);
    assert_eq!(result.priority, Priority::Medium);
    assert_eq!(result.vendor_id, None);
    assert_eq!(result.confidence, 0.9);
}

#[test]
fn clamps_out_of_range_confidence() {
    let reply = r#"{"category":"HVAC","priority":"LOW","confidence":3.5}"#;
    let result = parse_classification(reply, &candidates()).expect("parses");
    assert_eq!(result.confidence, 1.0);

    let reply = r#"{"category":"HVAC","priority":"LOW","confidence":-0.2}"#;
    let result = parse_classification(reply, &candidates()).expect("parses");
    assert_eq!(result.confidence, 0.0);
}

#[test]
fn tolerates_prose_wrapped_json() {
    let reply = format!("Sure, here is the classification you asked for:\n{PLUMBING_REPLY}\nLet me know if you need anything else!");
    let result = parse_classification(&reply, &candidates()).expect("parses");
    assert_eq!(result.category, MaintenanceCategory::Plumbing);
}

#[test]
fn missing_required_fields_do_not_parse() {
    assert!(parse_classification(r#"{"priority":"HIGH"}"#, &candidates()).is_none());
    assert!(parse_classification("no json here", &candidates()).is_none());
    assert!(parse_classification("", &candidates()).is_none());
}

#[test]
fn extract_json_object_finds_first_balanced_span() {
    assert_eq!(extract_json_object(r#"{"a":1}"#), Some(r#"{"a":1}"#));
    assert_eq!(
        extract_json_object(r#"prefix {"a":{"b":2}} suffix {"c":3}"#),
        Some(r#"{"a":{"b":2}}"#)
    );
    // Braces inside string literals must not affect nesting depth.
    assert_eq!(
        extract_json_object(r#"{"text":"closing } inside"}"#),
        Some(r#"{"text":"closing } inside"}"#)
    );
    assert_eq!(
        extract_json_object(r#"{"text":"escaped \" quote }"}"#),
        Some(r#"{"text":"escaped \" quote }"}"#)
    );
    assert_eq!(extract_json_object("no braces"), None);
    assert_eq!(extract_json_object(r#"{"unterminated": true"#), None);
}

#[test]
fn prompt_includes_request_fields_and_vendor_lines() {
    let prompt = render_prompt(
        "Leaking pipe under sink",
        "Water pooling under kitchen sink for two days",
        "12 Elm St",
        &candidates(),
    );

    assert!(prompt.contains("Title: Leaking pipe under sink"));
    assert!(prompt.contains("Property: 12 Elm St"));
    assert!(prompt.contains("- Quick Fix Plumbing (ID: v1, Category: PLUMBING, Rating: 4.5)"));
    assert!(prompt.contains("PEST_CONTROL"));
    assert!(prompt.contains("URGENT: Requires immediate attention"));
}

#[test]
fn prompt_marks_missing_rating_and_empty_vendor_list() {
    let mut unrated = candidate("v2");
    unrated.rating = None;
    let prompt = render_prompt("t", "d", "a", &[unrated]);
    assert!(prompt.contains("Rating: N/A"));

    let prompt = render_prompt("t", "d", "a", &[]);
    assert!(prompt.contains("No vendors available"));
}

#[tokio::test]
async fn classify_returns_validated_result() {
    let classifier = RequestClassifier::new(Arc::new(ScriptedBackend::with_reply(PLUMBING_REPLY)));
    let result = classifier
        .classify(
            "Leaking pipe under sink",
            "Water pooling under kitchen sink for two days",
            "12 Elm St",
            &candidates(),
        )
        .await;

    assert_eq!(result.category, MaintenanceCategory::Plumbing);
    assert_eq!(result.priority, Priority::High);
    assert_eq!(result.vendor_id, Some(VendorId("v1".to_string())));
}

#[tokio::test]
async fn classify_is_deterministic_for_identical_inputs() {
    let classifier = RequestClassifier::new(Arc::new(ScriptedBackend::with_replies(&[
        PLUMBING_REPLY,
        PLUMBING_REPLY,
    ])));

    let first = classifier.classify("t", "d", "a", &candidates()).await;
    let second = classifier.classify("t", "d", "a", &candidates()).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn backend_failure_yields_exact_fallback() {
    let classifier = RequestClassifier::new(Arc::new(FailingBackend));
    let result = classifier.classify("t", "d", "a", &candidates()).await;
    assert_eq!(result, ClassificationResult::fallback());
    assert_eq!(result.category, MaintenanceCategory::Other);
    assert_eq!(result.priority, Priority::Medium);
    assert_eq!(result.vendor_id, None);
    assert_eq!(result.confidence, 0.0);
}

#[tokio::test]
async fn non_json_reply_yields_fallback() {
    let classifier = RequestClassifier::new(Arc::new(ScriptedBackend::with_reply(
        "I'm sorry, I cannot classify this request.",
    )));
    let result = classifier.classify("t", "d", "a", &candidates()).await;
    assert_eq!(result, ClassificationResult::fallback());
}

#[tokio::test]
async fn timeout_yields_fallback() {
    let classifier = RequestClassifier::new(Arc::new(StalledBackend))
        .with_timeout(Duration::from_millis(20));
    let result = classifier.classify("t", "d", "a", &candidates()).await;
    assert_eq!(result, ClassificationResult::fallback());
}
