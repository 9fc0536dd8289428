//! Contract Test: Zone Synchronizer
//!
//! Verifies the plan/apply/retry behavior of the synchronizer against an
//! in-memory provider.
//!
//! Constraints verified:
//! - Validation happens before the provider is contacted
//! - Applying a plan converges the remote zone to the desired zone
//! - A second sync of the same zone is a no-op
//! - Transient failures are retried by re-planning, never by replaying
//! - Non-transient failures are not retried
//! - Dry-run never applies

mod common;

use common::*;
use std::sync::Arc;
use zonesync_core::{
    CaaValue, Error, Record, RecordData, RecordType, SyncEvent, SyncOutcome, ZoneSynchronizer,
};

#[tokio::test]
async fn sync_creates_missing_zone_and_converges() {
    let provider = InMemoryProvider::new();
    let (sync, _events) =
        ZoneSynchronizer::new(Arc::new(provider.clone()), fast_retry_config(0)).unwrap();

    let desired = zone_with(
        "example.com.",
        vec![a_record("www", "1.2.3.4"), a_record("", "1.2.3.5")],
    );

    match sync.sync(&desired).await.unwrap() {
        SyncOutcome::Applied(report) => {
            assert_eq!(report.changes, 2);
            assert!(report.zone_created);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    assert_eq!(provider.zone("example.com.").unwrap(), desired);

    // Same desired state again: nothing to do
    let again = sync.sync(&desired).await.unwrap();
    assert!(matches!(again, SyncOutcome::NoChanges));
    assert_eq!(provider.apply_calls(), 1);
}

#[tokio::test]
async fn single_new_record_is_a_single_create() {
    let provider = InMemoryProvider::new();
    provider.insert_zone(zone_with("example.com.", vec![]));
    let (sync, _events) =
        ZoneSynchronizer::new(Arc::new(provider.clone()), fast_retry_config(0)).unwrap();

    let desired = zone_with("example.com.", vec![a_record("www", "1.2.3.4")]);
    let plan = sync.plan(desired).await.unwrap();

    assert!(plan.exists);
    assert_eq!(plan.counts(), (1, 0, 0));
}

#[tokio::test]
async fn validation_failure_makes_no_provider_calls() {
    let provider = InMemoryProvider::new();
    let (sync, _events) =
        ZoneSynchronizer::new(Arc::new(provider.clone()), fast_retry_config(3)).unwrap();

    let bad_caa = Record::new(
        "",
        3600,
        RecordData::Caa {
            values: vec![CaaValue {
                flags: 0,
                tag: "not valid!".to_string(),
                value: "ca.example.net".to_string(),
            }],
        },
    );
    let desired = zone_with("example.com.", vec![bad_caa]);

    let err = sync.sync(&desired).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert!(err.to_string().contains("example.com."));
    assert_eq!(provider.populate_calls(), 0);
    assert_eq!(provider.apply_calls(), 0);
}

#[tokio::test]
async fn transient_partial_apply_is_replanned() {
    let provider = InMemoryProvider::new();
    provider.fail_next(&[Failure::PartialTransient]);
    let (sync, mut events) =
        ZoneSynchronizer::new(Arc::new(provider.clone()), fast_retry_config(2)).unwrap();

    let desired = zone_with(
        "example.com.",
        vec![
            a_record("a", "10.0.0.1"),
            a_record("b", "10.0.0.2"),
            a_record("c", "10.0.0.3"),
        ],
    );

    let outcome = sync.sync(&desired).await.unwrap();
    assert!(matches!(outcome, SyncOutcome::Applied(_)));
    assert_eq!(provider.zone("example.com.").unwrap(), desired);

    // The retry only carried what the failed attempt had not committed
    assert_eq!(provider.applied_change_counts(), vec![3, 2]);

    let mut saw_retryable_failure = false;
    while let Ok(event) = events.try_recv() {
        if let SyncEvent::ApplyFailed { will_retry, attempt, .. } = event {
            assert_eq!(attempt, 0);
            saw_retryable_failure = will_retry;
        }
    }
    assert!(saw_retryable_failure);
}

#[tokio::test]
async fn unauthorized_is_not_retried() {
    let provider = InMemoryProvider::new();
    provider.fail_next(&[Failure::Unauthorized]);
    let (sync, _events) =
        ZoneSynchronizer::new(Arc::new(provider.clone()), fast_retry_config(3)).unwrap();

    let desired = zone_with("example.com.", vec![a_record("www", "1.2.3.4")]);
    let err = sync.sync(&desired).await.unwrap_err();

    assert!(matches!(err, Error::Unauthorized));
    assert_eq!(provider.apply_calls(), 1);
}

#[tokio::test]
async fn retries_are_bounded() {
    let provider = InMemoryProvider::new();
    provider.fail_next(&[Failure::PartialTransient; 4]);
    let (sync, _events) =
        ZoneSynchronizer::new(Arc::new(provider.clone()), fast_retry_config(1)).unwrap();

    let desired = zone_with(
        "example.com.",
        (1..=5)
            .map(|i| a_record(&format!("www{}", i), &format!("10.0.0.{}", i)))
            .collect(),
    );

    let err = sync.sync(&desired).await.unwrap_err();
    assert!(matches!(err, Error::PartialApply { .. }));
    assert!(err.is_transient());
    // First attempt plus one retry
    assert_eq!(provider.apply_calls(), 2);
    assert_eq!(provider.zone("example.com.").unwrap().len(), 2);
}

#[tokio::test]
async fn dry_run_plans_without_applying() {
    let provider = InMemoryProvider::new();
    let mut config = fast_retry_config(0);
    config.dry_run = true;
    let (sync, mut events) = ZoneSynchronizer::new(Arc::new(provider.clone()), config).unwrap();

    let desired = zone_with("example.com.", vec![a_record("www", "1.2.3.4")]);
    match sync.sync(&desired).await.unwrap() {
        SyncOutcome::Planned(plan) => assert_eq!(plan.changes.len(), 1),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(provider.apply_calls(), 0);

    let mut dry_run_events = 0;
    while let Ok(event) = events.try_recv() {
        if matches!(event, SyncEvent::DryRun { changes: 1, .. }) {
            dry_run_events += 1;
        }
    }
    assert_eq!(dry_run_events, 1);
}

#[tokio::test]
async fn unsupported_records_are_left_out_of_plans() {
    let provider = InMemoryProvider::new().without_support_for(RecordType::Txt);
    let (sync, _events) =
        ZoneSynchronizer::new(Arc::new(provider.clone()), fast_retry_config(0)).unwrap();

    let txt = Record::new(
        "txt",
        600,
        RecordData::Txt {
            values: vec!["hello".to_string()],
        },
    );
    let desired = zone_with("example.com.", vec![a_record("www", "1.2.3.4"), txt]);

    let plan = sync.plan(desired).await.unwrap();
    assert_eq!(plan.changes.len(), 1);
    assert_eq!(plan.changes[0].record_type(), RecordType::A);
    assert!(plan.desired.get("txt", RecordType::Txt).is_none());
}

#[tokio::test]
async fn independent_zones_sync_concurrently() {
    let provider = InMemoryProvider::new();
    let (sync, _events) =
        ZoneSynchronizer::new(Arc::new(provider.clone()), fast_retry_config(0)).unwrap();
    let sync = Arc::new(sync);

    let first = zone_with("one.example.", vec![a_record("www", "1.1.1.1")]);
    let second = zone_with("two.example.", vec![a_record("www", "2.2.2.2")]);

    let (a, b) = tokio::join!(sync.sync(&first), sync.sync(&second));
    assert!(a.is_ok());
    assert!(b.is_ok());

    assert_eq!(provider.zone("one.example.").unwrap(), first);
    assert_eq!(provider.zone("two.example.").unwrap(), second);
}
