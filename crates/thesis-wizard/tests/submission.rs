mod helpers;

use helpers::{abstract_of, complete_to_review, test_wizard, wizard_with, MockGateway};
use std::time::Duration;
use thesis_core::models::{DocumentReference, DraftField, DraftPatch, SupervisorId};
use thesis_core::{ErrorMetadata, GatewayError, WizardConfig, WizardError};
use thesis_wizard::{PhaseView, WizardPhase};

#[tokio::test]
async fn test_round_trip_sends_one_payload_and_resets_draft() {
    let t = test_wizard();
    let reference = complete_to_review(&t.wizard).await;
    assert_eq!(reference, DocumentReference::new("doc://proposal.pdf"));

    let record = t.wizard.submit().await.unwrap();
    assert_eq!(record.id, "prop-1");

    let calls = t.gateway.calls();
    assert_eq!(calls.len(), 1);
    let payload = &calls[0];
    assert_eq!(payload.title, "Thesis X");
    assert_eq!(payload.abstract_text, abstract_of(600));
    assert_eq!(payload.document_reference, reference);
    assert_eq!(payload.primary_supervisor_id, SupervisorId::new("T1"));

    let json = serde_json::to_value(payload).unwrap();
    assert_eq!(json["title"], "Thesis X");
    assert_eq!(json["documentReference"], "doc://proposal.pdf");
    assert_eq!(json["primarySupervisorId"], "T1");
    assert_eq!(json["abstract"].as_str().map(str::len), Some(600));

    assert!(t.wizard.draft().await.is_empty());
    assert_eq!(t.wizard.current_step().await, 0);
    assert_eq!(t.wizard.phase().await, WizardPhase::Submitted(record.clone()));

    let snapshot = t.wizard.snapshot().await.unwrap();
    assert_eq!(snapshot.phase, PhaseView::Submitted { record });
}

#[tokio::test]
async fn test_concurrent_submit_calls_gateway_once() {
    let (gateway, release) = MockGateway::gated();
    let t = wizard_with(gateway, WizardConfig::default());
    complete_to_review(&t.wizard).await;

    let wizard = t.wizard.clone();
    let first = tokio::spawn(async move { wizard.submit().await });

    while t.wizard.phase().await != WizardPhase::Submitting {
        tokio::task::yield_now().await;
    }

    assert_eq!(t.wizard.submit().await, Err(WizardError::Busy));
    assert_eq!(t.wizard.submit().await, Err(WizardError::Busy));
    assert_eq!(
        t.wizard.set(DraftPatch::new().title("changed")).await,
        Err(WizardError::Busy)
    );
    assert_eq!(t.wizard.previous().await, Err(WizardError::Busy));

    release.notify_one();
    assert!(first.await.unwrap().is_ok());
    assert_eq!(t.gateway.call_count(), 1);
}

#[tokio::test]
async fn test_failure_preserves_draft_and_allows_retry() {
    let t = test_wizard();
    complete_to_review(&t.wizard).await;
    let before = t.wizard.draft().await;

    t.gateway.respond_with(Err(GatewayError::Server {
        status: 503,
        message: "maintenance".to_string(),
    }));

    let err = t.wizard.submit().await.unwrap_err();
    assert!(matches!(
        err,
        WizardError::Submission(GatewayError::Server { status: 503, .. })
    ));
    assert!(err.is_recoverable());
    assert_eq!(t.wizard.draft().await, before);
    assert_eq!(t.wizard.current_step().await, 5);
    assert_eq!(t.wizard.phase().await, WizardPhase::Failed(err.clone()));

    let snapshot = t.wizard.snapshot().await.unwrap();
    let PhaseView::Failed { error } = snapshot.phase else {
        panic!("expected failed phase");
    };
    assert_eq!(error.code, "SUBMISSION_FAILED");

    // Nothing was retried behind the user's back.
    assert_eq!(t.gateway.call_count(), 1);

    let record = t.wizard.submit().await.unwrap();
    assert_eq!(record.id, "prop-2");
    assert_eq!(t.gateway.call_count(), 2);
    assert_eq!(t.gateway.calls()[0], t.gateway.calls()[1]);
}

#[tokio::test]
async fn test_revalidation_returns_to_first_invalid_step() {
    let t = test_wizard();
    complete_to_review(&t.wizard).await;

    t.wizard.set(DraftPatch::new().title("")).await.unwrap();

    let err = t.wizard.submit().await.unwrap_err();
    let WizardError::Validation(result) = &err else {
        panic!("expected validation error, got {:?}", err);
    };
    assert_eq!(result.step_index(), 0);
    assert_eq!(
        result.errors_for(DraftField::Title),
        ["Title is required".to_string()]
    );
    assert_eq!(t.wizard.current_step().await, 0);
    assert_eq!(t.gateway.call_count(), 0);
}

#[tokio::test]
async fn test_submit_requires_last_step() {
    let t = test_wizard();
    complete_to_review(&t.wizard).await;
    t.wizard.previous().await.unwrap();

    assert!(matches!(
        t.wizard.submit().await,
        Err(WizardError::InvalidState(_))
    ));
    assert_eq!(t.gateway.call_count(), 0);
}

#[tokio::test]
async fn test_server_validation_error_returns_to_owning_step() {
    let t = test_wizard();
    complete_to_review(&t.wizard).await;
    let before = t.wizard.draft().await;

    t.gateway.respond_with(Err(GatewayError::Validation {
        message: "Supervisor is no longer available".to_string(),
        field: Some("primarySupervisorId".to_string()),
    }));

    let err = t.wizard.submit().await.unwrap_err();
    assert_eq!(err.error_code(), "SUBMISSION_REJECTED");
    assert_eq!(err.client_message(), "Supervisor is no longer available");
    assert_eq!(t.wizard.current_step().await, 3);
    assert_eq!(t.wizard.draft().await, before);

    t.wizard
        .set(DraftPatch::new().primary_supervisor(Some(SupervisorId::new("T9"))))
        .await
        .unwrap();
    t.wizard.go_to_step(5).await.unwrap();
    assert_eq!(t.wizard.phase().await, WizardPhase::Editing);

    t.wizard.submit().await.unwrap();
    assert_eq!(
        t.gateway.calls()[1].primary_supervisor_id,
        SupervisorId::new("T9")
    );
}

#[tokio::test]
async fn test_unnamed_server_validation_keeps_step() {
    let t = test_wizard();
    complete_to_review(&t.wizard).await;

    t.gateway.respond_with(Err(GatewayError::Validation {
        message: "Duplicate proposal".to_string(),
        field: None,
    }));

    assert!(t.wizard.submit().await.is_err());
    assert_eq!(t.wizard.current_step().await, 5);
}

#[tokio::test]
async fn test_gateway_timeout_is_retryable_failure() {
    let config = WizardConfig {
        submission_timeout: Duration::from_millis(50),
        ..WizardConfig::default()
    };
    let t = wizard_with(MockGateway::slow(Duration::from_secs(5)), config);
    complete_to_review(&t.wizard).await;
    let before = t.wizard.draft().await;

    let err = t.wizard.submit().await.unwrap_err();
    assert_eq!(err, WizardError::Submission(GatewayError::Timeout));
    assert!(err.is_recoverable());
    assert_eq!(t.wizard.draft().await, before);
    assert_eq!(t.gateway.call_count(), 1);
}

#[tokio::test]
async fn test_close_during_submission_discards_outcome() {
    let (gateway, release) = MockGateway::gated();
    let t = wizard_with(gateway, WizardConfig::default());
    complete_to_review(&t.wizard).await;

    let wizard = t.wizard.clone();
    let pending = tokio::spawn(async move { wizard.submit().await });
    while t.wizard.phase().await != WizardPhase::Submitting {
        tokio::task::yield_now().await;
    }

    t.wizard.close().await;
    release.notify_one();

    assert_eq!(pending.await.unwrap(), Err(WizardError::Closed));
    assert!(t.wizard.draft().await.is_empty());
    assert_eq!(t.wizard.phase().await, WizardPhase::Editing);
}

#[tokio::test]
async fn test_submitted_session_is_terminal_until_cancelled() {
    let t = test_wizard();
    complete_to_review(&t.wizard).await;
    t.wizard.submit().await.unwrap();

    assert!(matches!(
        t.wizard.submit().await,
        Err(WizardError::InvalidState(_))
    ));
    assert!(matches!(
        t.wizard.set(DraftPatch::new().title("Next")).await,
        Err(WizardError::InvalidState(_))
    ));

    t.wizard.cancel().await.unwrap();
    assert_eq!(t.wizard.phase().await, WizardPhase::Editing);
    t.wizard
        .set(DraftPatch::new().title("Next"))
        .await
        .unwrap();
    assert_eq!(t.gateway.call_count(), 1);
}
