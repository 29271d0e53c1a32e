//! Pause, resume, and cancel from the operator's point of view.

use crate::prelude::*;
use dn_core::{ChunkStrategy, JobStatus};
use dn_engine::EngineError;
use std::sync::Arc;

#[tokio::test]
async fn pause_preserves_progress_and_resume_drains_the_rest() {
    let cluster = Cluster::new();
    let words = corpus_with_needle(8, 7, "hunter2");
    cluster.source.add_corpus("s3://lists/common", &as_refs(&words));

    let job_id = cluster
        .submit(needle_spec(
            "pausable-scan",
            "s3://lists/common",
            "hunter2",
            ChunkStrategy::lines(2),
        ))
        .await;

    let worker = cluster.worker("w0", Arc::new(NeedleTester));
    assert!(worker.poll_once().await.unwrap());
    assert!(worker.poll_once().await.unwrap());

    cluster.registry.pause(&job_id).await.unwrap();
    assert_eq!(cluster.status(&job_id).await, JobStatus::Paused);

    // A paused job dispenses no work, and no progress is lost.
    assert!(!worker.poll_once().await.unwrap());
    let view = cluster.registry.get_job(&job_id).await.unwrap();
    assert_eq!(view.stats.chunks_processed, 2);
    assert_eq!(cluster.dispatcher.pending_len(&job_id).await.unwrap(), 2);

    cluster.registry.resume(&job_id).await.unwrap();
    cluster.drain(&worker).await;

    let view = cluster.registry.get_job(&job_id).await.unwrap();
    assert_eq!(view.record.status, JobStatus::CompletedFound);
    assert_eq!(view.stats.chunks_processed, 4);
}

#[tokio::test]
async fn cancel_stops_dispatch_immediately() {
    let cluster = Cluster::new();
    let words = corpus_with_needle(10, 9, "hunter2");
    cluster.source.add_corpus("s3://lists/common", &as_refs(&words));

    let job_id = cluster
        .submit(needle_spec(
            "cancelled-scan",
            "s3://lists/common",
            "hunter2",
            ChunkStrategy::lines(1),
        ))
        .await;

    let worker = cluster.worker("w0", Arc::new(NeedleTester));
    assert!(worker.poll_once().await.unwrap());

    cluster.registry.cancel(&job_id).await.unwrap();
    assert_eq!(cluster.status(&job_id).await, JobStatus::Cancelled);

    assert!(!worker.poll_once().await.unwrap());
    assert_eq!(cluster.dispatcher.pending_len(&job_id).await.unwrap(), 9);
}

#[tokio::test]
async fn terminal_jobs_reject_control_calls() {
    let cluster = Cluster::new();
    cluster.source.add_corpus("s3://lists/empty", &[]);
    let job_id = cluster
        .submit(needle_spec(
            "finished-scan",
            "s3://lists/empty",
            "anything",
            ChunkStrategy::lines(1),
        ))
        .await;
    assert_eq!(cluster.status(&job_id).await, JobStatus::CompletedExhausted);

    for result in [
        cluster.registry.pause(&job_id).await,
        cluster.registry.resume(&job_id).await,
        cluster.registry.cancel(&job_id).await,
    ] {
        assert!(matches!(result.unwrap_err(), EngineError::Conflict(_)));
    }
}

#[tokio::test]
async fn resume_requires_a_paused_job() {
    let cluster = Cluster::new();
    let words = corpus_with_needle(2, 0, "x");
    cluster.source.add_corpus("s3://lists/common", &as_refs(&words));
    let job_id = cluster
        .submit(needle_spec(
            "running-scan",
            "s3://lists/common",
            "absent",
            ChunkStrategy::lines(1),
        ))
        .await;

    let err = cluster.registry.resume(&job_id).await.unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
    assert_eq!(cluster.status(&job_id).await, JobStatus::Running);
}
