//! Recovery from worker loss: stale claims are requeued and redelivered
//! without losing or double-counting work.

use crate::prelude::*;
use dn_core::{ChunkStrategy, JobStatus, WorkerId};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn a_crashed_workers_chunk_is_requeued_and_finished_elsewhere() {
    let cluster = Cluster::new();
    cluster
        .source
        .add_corpus("s3://lists/common", &["aaa", "hunter2", "ccc"]);

    let job_id = cluster
        .submit(needle_spec(
            "recoverable-scan",
            "s3://lists/common",
            "hunter2",
            ChunkStrategy::lines(1),
        ))
        .await;

    // A worker claims the chunk holding the needle, then dies without
    // settling it.
    let orphaned = cluster
        .dispatcher
        .pull(&job_id, Duration::ZERO)
        .await
        .unwrap()
        .unwrap();
    let orphaned_two = cluster
        .dispatcher
        .pull(&job_id, Duration::ZERO)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(orphaned.task.index, 0);
    assert_eq!(orphaned_two.task.index, 1);
    drop((orphaned, orphaned_two));

    cluster.advance_past_task_timeout();
    assert_eq!(cluster.reclaimer().tick().await.unwrap(), 2);

    // A healthy worker picks up everything, including the redelivery.
    cluster.drain(&cluster.worker("w1", Arc::new(NeedleTester))).await;

    let view = cluster.registry.get_job(&job_id).await.unwrap();
    assert_eq!(view.record.status, JobStatus::CompletedFound);
    assert_eq!(view.stats.chunks_processed, 3);
    assert_eq!(view.stats.chunks_timedout, 2);
    assert_eq!(view.stats.chunks_failed, 0);
    assert_eq!(view.stats.results_found, 1);
}

#[tokio::test]
async fn a_zombie_completion_after_reclaim_changes_nothing() {
    let cluster = Cluster::new();
    cluster
        .source
        .add_corpus("s3://lists/common", &["aaa", "bbb"]);

    let job_id = cluster
        .submit(needle_spec(
            "zombie-scan",
            "s3://lists/common",
            "absent",
            ChunkStrategy::lines(1),
        ))
        .await;

    let zombie_claim = cluster
        .dispatcher
        .pull(&job_id, Duration::ZERO)
        .await
        .unwrap()
        .unwrap();

    cluster.advance_past_task_timeout();
    assert_eq!(cluster.reclaimer().tick().await.unwrap(), 1);
    cluster.drain(&cluster.worker("w1", Arc::new(NeedleTester))).await;

    let before = cluster.registry.get_job(&job_id).await.unwrap();
    assert_eq!(before.record.status, JobStatus::CompletedExhausted);
    assert_eq!(before.stats.chunks_processed, 2);

    // The presumed-dead worker wakes up and reports its chunk done.
    assert!(!cluster.dispatcher.complete(&zombie_claim).await.unwrap());

    let after = cluster.registry.get_job(&job_id).await.unwrap();
    assert_eq!(after.stats.chunks_processed, 2);
    assert_eq!(after.record.status, JobStatus::CompletedExhausted);
}

#[tokio::test]
async fn a_match_recorded_before_the_crash_is_not_duplicated_on_redelivery() {
    let cluster = Cluster::new();
    cluster
        .source
        .add_corpus("s3://lists/common", &["hunter2", "bbb"]);

    let job_id = cluster
        .submit(needle_spec(
            "dedup-scan",
            "s3://lists/common",
            "hunter2",
            ChunkStrategy::lines(1),
        ))
        .await;

    // The first worker records the match but dies before settling.
    let claim = cluster
        .dispatcher
        .pull(&job_id, Duration::ZERO)
        .await
        .unwrap()
        .unwrap();
    assert!(cluster
        .aggregator
        .record_match(&job_id, claim.task.index, &WorkerId::new("w0"), "hunter2")
        .await
        .unwrap());
    drop(claim);

    cluster.advance_past_task_timeout();
    cluster.reclaimer().tick().await.unwrap();
    cluster.drain(&cluster.worker("w1", Arc::new(NeedleTester))).await;

    let view = cluster.registry.get_job(&job_id).await.unwrap();
    assert_eq!(view.record.status, JobStatus::CompletedFound);
    assert_eq!(view.stats.results_found, 1);
    assert_eq!(
        cluster.aggregator.results_page(&job_id, 0, 10).await.unwrap().total,
        1
    );
}

#[tokio::test]
async fn reclaim_is_idempotent_across_cycles() {
    let cluster = Cluster::new();
    cluster.source.add_corpus("s3://lists/common", &["aaa"]);
    let job_id = cluster
        .submit(needle_spec(
            "idempotent-scan",
            "s3://lists/common",
            "absent",
            ChunkStrategy::lines(1),
        ))
        .await;

    cluster
        .dispatcher
        .pull(&job_id, Duration::ZERO)
        .await
        .unwrap()
        .unwrap();
    cluster.advance_past_task_timeout();

    let reclaimer = cluster.reclaimer();
    assert_eq!(reclaimer.tick().await.unwrap(), 1);
    // Nothing left to reclaim on the next cycle.
    assert_eq!(reclaimer.tick().await.unwrap(), 0);
    assert_eq!(
        cluster.registry.stats(&job_id).await.unwrap().chunks_timedout,
        1
    );
}
