//! Job lifecycle: submission through terminal status.

use crate::prelude::*;
use dn_core::{ChunkStrategy, JobStatus};
use std::sync::Arc;

#[tokio::test]
async fn a_worker_fleet_scans_a_job_to_completion() {
    let cluster = Cluster::new();
    let words = corpus_with_needle(40, 23, "hunter2");
    cluster.source.add_corpus("s3://lists/common", &as_refs(&words));

    let job_id = cluster
        .submit(needle_spec(
            "common-scan",
            "s3://lists/common",
            "hunter2",
            ChunkStrategy::lines(4),
        ))
        .await;
    assert_eq!(cluster.status(&job_id).await, JobStatus::Running);

    let workers = (0..3)
        .map(|i| cluster.worker(&format!("w{i}"), Arc::new(NeedleTester)))
        .collect();
    cluster.drain_all(workers).await;

    let view = cluster.registry.get_job(&job_id).await.unwrap();
    assert_eq!(view.record.status, JobStatus::CompletedFound);
    assert_eq!(view.record.total_chunks, Some(10));
    assert_eq!(view.stats.chunks_processed, 10);
    assert_eq!(view.stats.results_found, 1);
    assert_eq!(view.completion_pct, Some(100.0));

    let page = cluster.aggregator.results_page(&job_id, 0, 10).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.findings[0].value, "hunter2");
}

#[tokio::test]
async fn a_job_with_no_matches_completes_exhausted() {
    let cluster = Cluster::new();
    let words = corpus_with_needle(12, 3, "nothing-special");
    cluster.source.add_corpus("s3://lists/common", &as_refs(&words));

    let job_id = cluster
        .submit(needle_spec(
            "miss-scan",
            "s3://lists/common",
            "not-in-the-list",
            ChunkStrategy::lines(5),
        ))
        .await;
    cluster.drain(&cluster.worker("w0", Arc::new(NeedleTester))).await;

    let view = cluster.registry.get_job(&job_id).await.unwrap();
    assert_eq!(view.record.status, JobStatus::CompletedExhausted);
    assert_eq!(view.stats.results_found, 0);
    assert_eq!(view.stats.chunks_processed, 3);
}

#[tokio::test]
async fn an_empty_corpus_completes_before_any_worker_runs() {
    let cluster = Cluster::new();
    cluster.source.add_corpus("s3://lists/empty", &[]);

    let job_id = cluster
        .submit(needle_spec(
            "empty-scan",
            "s3://lists/empty",
            "anything",
            ChunkStrategy::lines(10),
        ))
        .await;

    let view = cluster.registry.get_job(&job_id).await.unwrap();
    assert_eq!(view.record.status, JobStatus::CompletedExhausted);
    assert_eq!(view.record.total_chunks, Some(0));
    assert_eq!(view.completion_pct, Some(100.0));
}

#[tokio::test]
async fn an_unreachable_input_fails_planning() {
    let cluster = Cluster::new();
    cluster.source.fail_probe(
        "s3://lists/missing",
        dn_engine::ProbeError::Unreachable("bucket does not exist".to_string()),
    );

    let job_id = cluster
        .submit(needle_spec(
            "doomed-scan",
            "s3://lists/missing",
            "anything",
            ChunkStrategy::lines(10),
        ))
        .await;

    let view = cluster.registry.get_job(&job_id).await.unwrap();
    assert_eq!(view.record.status, JobStatus::PlanningFailed);
    assert!(view
        .record
        .error
        .as_deref()
        .unwrap()
        .contains("bucket does not exist"));
    // Planning failure leaves nothing for workers.
    assert_eq!(cluster.dispatcher.pending_len(&job_id).await.unwrap(), 0);
}

#[tokio::test]
async fn status_reports_partial_progress_mid_run() {
    let cluster = Cluster::new();
    let words = corpus_with_needle(8, 7, "zzz");
    cluster.source.add_corpus("s3://lists/common", &as_refs(&words));

    let job_id = cluster
        .submit(needle_spec(
            "slow-scan",
            "s3://lists/common",
            "absent",
            ChunkStrategy::lines(2),
        ))
        .await;

    let worker = cluster.worker("w0", Arc::new(NeedleTester));
    assert!(worker.poll_once().await.unwrap());
    assert!(worker.poll_once().await.unwrap());

    let view = cluster.registry.get_job(&job_id).await.unwrap();
    assert_eq!(view.record.status, JobStatus::Running);
    assert_eq!(view.stats.chunks_processed, 2);
    assert_eq!(view.completion_pct, Some(50.0));
}
