//! Document lifecycle: creation, access lists, history, restore, deletion.

mod common;

use std::sync::Arc;

use bytes::Bytes;
use chrono::{Duration, Utc};
use surveydoc_core::error::ErrorKind;
use surveydoc_core::traits::storage::BlobStore;
use surveydoc_entity::document::NewDocument;
use surveydoc_service::{
    BlobSweeper, CreateDocument, DocumentService, DocumentUpdate, RequestContext,
};

use common::{Harness, alice, bob, key};

fn documents(h: &Harness) -> DocumentService {
    DocumentService::new(
        h.documents.clone(),
        h.blobs.clone(),
        Arc::new(h.service.clone()),
        "text/html",
    )
}

fn new_doc(content: Option<&'static str>) -> CreateDocument {
    CreateDocument {
        document: NewDocument {
            file_name: "Site survey".into(),
            file_type: None,
            editors: vec!["bob".into()],
            viewers: vec!["carol".into()],
        },
        content: content.map(Bytes::from),
    }
}

#[tokio::test]
async fn create_with_content_starts_at_version_one() {
    let h = Harness::new(10);
    let svc = documents(&h);
    let doc = key("created");

    let meta = svc
        .create_document(&alice(), &doc, new_doc(Some("<h1>Survey</h1>")))
        .await
        .unwrap();

    assert_eq!(meta.current_version, 1);
    assert_eq!(meta.owner, "alice");
    assert_eq!(meta.file_type, "text/html");
    let versions = svc.list_versions(&alice(), &doc).await.unwrap();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].change_type, "create");
    let content = svc.read_content(&alice(), &doc, None).await.unwrap();
    assert_eq!(content.data, Bytes::from("<h1>Survey</h1>"));
}

#[tokio::test]
async fn empty_document_has_no_content() {
    let h = Harness::new(10);
    let svc = documents(&h);
    let doc = key("empty");
    svc.create_document(&alice(), &doc, new_doc(None))
        .await
        .unwrap();

    let err = svc.read_content(&alice(), &doc, None).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn duplicate_create_is_conflict() {
    let h = Harness::new(10);
    let svc = documents(&h);
    let doc = key("dup");
    svc.create_document(&alice(), &doc, new_doc(None))
        .await
        .unwrap();

    let err = svc
        .create_document(&bob(), &doc, new_doc(Some("x")))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Conflict);
    // The rejected initial content was discarded.
    assert!(!h.blobs.exists("documents/acme/dup/v1.html").await.unwrap());
}

#[tokio::test]
async fn create_replaces_stale_leftover_content() {
    let h = Harness::new(10);
    let svc = documents(&h);
    let doc = key("reborn");
    // Content of an earlier document with the same key.
    h.blobs.inner.insert_at(
        "documents/acme/reborn/v1.html",
        Bytes::from("previous life"),
        "text/html",
        Utc::now() - Duration::hours(3),
    );

    let meta = svc
        .create_document(&alice(), &doc, new_doc(Some("fresh start")))
        .await
        .unwrap();

    assert_eq!(meta.current_version, 1);
    let content = svc.read_content(&alice(), &doc, None).await.unwrap();
    assert_eq!(content.data, Bytes::from("fresh start"));
}

#[tokio::test]
async fn create_over_recent_leftover_is_conflict() {
    let h = Harness::new(10);
    let svc = documents(&h);
    let doc = key("busy");
    h.blobs
        .put("documents/acme/busy/v1.html", Bytes::from("in flight"), "text/html")
        .await
        .unwrap();

    let err = svc
        .create_document(&alice(), &doc, new_doc(Some("mine")))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Conflict);
    assert_eq!(
        h.blobs.get("documents/acme/busy/v1.html").await.unwrap(),
        Bytes::from("in flight")
    );
    let err = svc.get_document(&alice(), &doc).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn blank_file_name_is_rejected() {
    let h = Harness::new(10);
    let svc = documents(&h);
    let mut req = new_doc(None);
    req.document.file_name = "  ".into();

    let err = svc
        .create_document(&alice(), &key("blank"), req)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn access_lists_gate_reads_and_writes() {
    let h = Harness::new(10);
    let svc = documents(&h);
    let doc = key("acl");
    svc.create_document(&alice(), &doc, new_doc(Some("v1")))
        .await
        .unwrap();
    let carol = RequestContext::new("carol", None);
    let mallory = RequestContext::new("mallory", None);

    svc.get_document(&carol, &doc).await.unwrap();
    let err = svc
        .update_content(&carol, &doc, DocumentUpdate::new("v2"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);

    let err = svc.get_document(&mallory, &doc).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);

    let meta = svc
        .update_content(&bob(), &doc, DocumentUpdate::new("v2"))
        .await
        .unwrap();
    assert_eq!(meta.current_version, 2);

    svc.get_document(&RequestContext::system(), &doc)
        .await
        .unwrap();
}

#[tokio::test]
async fn history_is_newest_first_and_old_content_readable() {
    let h = Harness::new(10);
    let svc = documents(&h);
    let doc = key("history");
    svc.create_document(&alice(), &doc, new_doc(Some("one")))
        .await
        .unwrap();
    svc.update_content(&bob(), &doc, DocumentUpdate::new("two"))
        .await
        .unwrap();

    let versions: Vec<i64> = svc
        .list_versions(&alice(), &doc)
        .await
        .unwrap()
        .iter()
        .map(|v| v.version)
        .collect();
    assert_eq!(versions, vec![2, 1]);

    let old = svc.read_content(&alice(), &doc, Some(1)).await.unwrap();
    assert_eq!(old.data, Bytes::from("one"));
    let err = svc.read_content(&alice(), &doc, Some(7)).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn restore_writes_old_content_as_new_version() {
    let h = Harness::new(10);
    let svc = documents(&h);
    let doc = key("restore");
    svc.create_document(&alice(), &doc, new_doc(Some("original")))
        .await
        .unwrap();
    svc.update_content(&alice(), &doc, DocumentUpdate::new("mistake"))
        .await
        .unwrap();

    let meta = svc.restore_version(&bob(), &doc, 1).await.unwrap();

    assert_eq!(meta.current_version, 3);
    let current = svc.read_content(&alice(), &doc, None).await.unwrap();
    assert_eq!(current.data, Bytes::from("original"));
    let newest = &svc.list_versions(&alice(), &doc).await.unwrap()[0];
    assert_eq!(newest.change_type, "restore");
    assert_eq!(newest.author, "bob");
}

#[tokio::test]
async fn delete_is_owner_only_and_removes_content() {
    let h = Harness::new(10);
    let svc = documents(&h);
    let doc = key("delete");
    svc.create_document(&alice(), &doc, new_doc(Some("v1")))
        .await
        .unwrap();
    svc.update_content(&bob(), &doc, DocumentUpdate::new("v2"))
        .await
        .unwrap();

    let err = svc.delete_document(&bob(), &doc).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);

    svc.delete_document(&alice(), &doc).await.unwrap();
    assert!(h.blobs.list(&doc.blob_prefix()).await.unwrap().is_empty());
    let err = svc.get_document(&alice(), &doc).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn delete_succeeds_when_blob_listing_fails() {
    let h = Harness::new(10);
    let svc = documents(&h);
    let doc = key("unlisted");
    svc.create_document(&alice(), &doc, new_doc(Some("v1")))
        .await
        .unwrap();
    h.blobs.fail_lists(true);

    svc.delete_document(&alice(), &doc).await.unwrap();

    let err = svc.get_document(&alice(), &doc).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert!(h.blobs.inner.get("documents/acme/unlisted/v1.html").await.is_ok());

    // The leftover is the sweeper's once the listing works again.
    h.blobs.fail_lists(false);
    h.blobs.inner.insert_at(
        "documents/acme/unlisted/v1.html",
        Bytes::from("v1"),
        "text/html",
        Utc::now() - Duration::hours(2),
    );
    let sweeper = BlobSweeper::new(h.documents.clone(), h.blobs.clone(), 3600);
    let report = sweeper.sweep_tenant("acme").await.unwrap();
    assert_eq!(report.deleted, 1);
    assert!(h.blobs.inner.is_empty());
}

#[tokio::test]
async fn sweep_reclaims_pruned_content() {
    let h = Harness::new(2);
    let svc = documents(&h);
    let doc = key("sweep");
    svc.create_document(&alice(), &doc, new_doc(Some("v1")))
        .await
        .unwrap();
    for n in 2..=4 {
        svc.update_content(&alice(), &doc, DocumentUpdate::new(format!("v{n}")))
            .await
            .unwrap();
    }
    assert_eq!(h.blobs.inner.len(), 4);

    let sweeper = BlobSweeper::new(h.documents.clone(), h.blobs.clone(), 3600);
    let report = sweeper.sweep_tenant("acme").await.unwrap();

    assert_eq!(report.deleted, 2);
    assert_eq!(h.version_numbers(&doc).await, vec![3, 4]);
    for n in [3, 4] {
        let path = format!("documents/acme/sweep/v{n}.html");
        assert!(h.blobs.exists(&path).await.unwrap());
    }
}
