mod helpers;

use futures::StreamExt;
use helpers::{pdf, test_wizard, valid_fields};
use thesis_core::models::{DocumentReference, FileUpload, UploadStatus};
use thesis_core::{ErrorMetadata, FileValidationError, UploadError, WizardError};
use thesis_wizard::UploadEvent;

#[tokio::test]
async fn test_successful_upload_sets_reference() {
    let t = test_wizard();

    let reference = t
        .wizard
        .upload_document(pdf("proposal.pdf", 2048))
        .await
        .unwrap();

    assert_eq!(reference, DocumentReference::new("doc://proposal.pdf"));
    assert_eq!(t.wizard.draft().await.document_reference, Some(reference));

    let snapshot = t.wizard.snapshot().await.unwrap();
    assert_eq!(snapshot.upload.status(), UploadStatus::Succeeded);
    assert_eq!(snapshot.upload.progress_percent(), 100);
    assert_eq!(t.storage.call_count(), 1);
}

#[tokio::test]
async fn test_oversized_file_rejected_without_network_call() {
    let t = test_wizard();

    let file = pdf("proposal.pdf", 15 * 1000 * 1000);
    let err = t.wizard.upload_document(file).await.unwrap_err();

    assert!(matches!(
        err,
        WizardError::InvalidFile(FileValidationError::FileTooLarge { .. })
    ));
    assert_eq!(err.error_code(), "INVALID_FILE");
    assert_eq!(t.storage.call_count(), 0);
    assert_eq!(t.wizard.draft().await.document_reference, None);
    assert_eq!(
        t.wizard.snapshot().await.unwrap().upload.status(),
        UploadStatus::Idle
    );
}

#[tokio::test]
async fn test_understated_size_rejected_without_network_call() {
    let t = test_wizard();

    let mut file = pdf("proposal.pdf", 15 * 1000 * 1000);
    file.descriptor.size = 1024;
    let err = t.wizard.upload_document(file).await.unwrap_err();

    assert!(matches!(
        err,
        WizardError::InvalidFile(FileValidationError::SizeMismatch {
            declared: 1024,
            actual: 15_000_000
        })
    ));
    assert_eq!(t.storage.call_count(), 0);
    assert_eq!(t.wizard.draft().await.document_reference, None);
}

#[tokio::test]
async fn test_wrong_type_rejected() {
    let t = test_wizard();
    let file = FileUpload::new("proposal.docx", "application/msword", vec![1u8; 128]);

    let err = t.wizard.upload_document(file).await.unwrap_err();
    assert!(matches!(err, WizardError::InvalidFile(_)));
    assert_eq!(t.storage.call_count(), 0);
}

#[tokio::test]
async fn test_failed_upload_leaves_reference_unset_and_is_retryable() {
    let t = test_wizard();
    t.storage.reject("broken.pdf", 500);

    let err = t
        .wizard
        .upload_document(pdf("broken.pdf", 512))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WizardError::Upload(UploadError::Rejected { status: 500, .. })
    ));
    assert!(err.is_recoverable());
    assert_eq!(t.wizard.draft().await.document_reference, None);
    assert_eq!(
        t.wizard.snapshot().await.unwrap().upload.status(),
        UploadStatus::Failed
    );

    // Documentation step reports the failed upload.
    let validation = t.wizard.validate_step(4).await.unwrap();
    assert!(validation.summary().contains("upload the file again"));

    let reference = t
        .wizard
        .upload_document(pdf("proposal.pdf", 512))
        .await
        .unwrap();
    assert_eq!(t.wizard.draft().await.document_reference, Some(reference));
}

#[tokio::test]
async fn test_late_result_of_superseded_attempt_is_discarded() {
    let t = test_wizard();
    let release_first = t.storage.hold("first.pdf");

    let mut first = t.wizard.begin_upload(pdf("first.pdf", 1000)).await.unwrap();
    let first_attempt = first.attempt();

    // Wait until the first transfer is under way.
    assert_eq!(first.next().await, Some(UploadEvent::Progress(50)));
    assert!(t
        .wizard
        .apply_upload_event(first_attempt, &UploadEvent::Progress(50))
        .await
        .unwrap());

    let second = t
        .wizard
        .upload_document(pdf("second.pdf", 1000))
        .await
        .unwrap();
    assert_eq!(second, DocumentReference::new("doc://second.pdf"));

    release_first.notify_one();
    let mut applied = Vec::new();
    while let Some(event) = first.next().await {
        applied.push(
            t.wizard
                .apply_upload_event(first_attempt, &event)
                .await
                .unwrap(),
        );
    }

    assert!(applied.iter().all(|a| !a));
    assert_eq!(
        t.wizard.draft().await.document_reference,
        Some(DocumentReference::new("doc://second.pdf"))
    );
}

#[tokio::test]
async fn test_new_selection_invalidates_previous_reference() {
    let t = test_wizard();
    t.wizard.set(valid_fields()).await.unwrap();
    t.wizard
        .upload_document(pdf("proposal.pdf", 1024))
        .await
        .unwrap();
    t.wizard.go_to_step(4).await.unwrap();
    assert!(t.wizard.validate_step(4).await.unwrap().is_valid());

    let _hold = t.storage.hold("revised.pdf");
    let pending = t
        .wizard
        .begin_upload(pdf("revised.pdf", 1024))
        .await
        .unwrap();

    assert_eq!(t.wizard.draft().await.document_reference, None);
    let validation = t.wizard.validate_step(4).await.unwrap();
    assert!(!validation.is_valid());
    assert!(validation.summary().contains("still in progress"));
    assert!(t.wizard.advance().await.is_err());

    drop(pending);
}

#[tokio::test]
async fn test_upload_document_interrupted_by_newer_upload() {
    let t = test_wizard();
    let release_first = t.storage.hold("first.pdf");

    let wizard = t.wizard.clone();
    let first = tokio::spawn(async move { wizard.upload_document(pdf("first.pdf", 1000)).await });

    // Let the first upload start and stall.
    while t.wizard.snapshot().await.unwrap().upload.progress_percent() < 50 {
        tokio::task::yield_now().await;
    }

    t.wizard
        .upload_document(pdf("second.pdf", 1000))
        .await
        .unwrap();
    release_first.notify_one();

    let result = first.await.unwrap();
    assert_eq!(result, Err(WizardError::Upload(UploadError::Interrupted)));
    assert_eq!(
        t.wizard.draft().await.document_reference,
        Some(DocumentReference::new("doc://second.pdf"))
    );
}

#[tokio::test]
async fn test_upload_after_close_is_rejected() {
    let t = test_wizard();
    t.wizard.close().await;
    assert!(matches!(
        t.wizard.upload_document(pdf("proposal.pdf", 10)).await,
        Err(WizardError::Closed)
    ));
    assert_eq!(t.storage.call_count(), 0);
}
