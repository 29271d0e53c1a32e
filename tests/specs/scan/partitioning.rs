//! Corpus partitioning guarantees: every item is scanned exactly once,
//! whether chunk boundaries fall on item boundaries or not.

use crate::prelude::*;
use dn_core::{ChunkStrategy, JobStatus};
use dn_engine::CandidateTester;
use std::sync::Arc;

#[tokio::test]
async fn line_chunks_cover_the_corpus_exactly_once_across_workers() {
    let cluster = Cluster::new();
    let words = corpus_with_needle(50, 17, "needle-0017");
    cluster.source.add_corpus("s3://lists/common", &as_refs(&words));
    cluster
        .submit(needle_spec(
            "line-coverage-scan",
            "s3://lists/common",
            "unused",
            ChunkStrategy::lines(7),
        ))
        .await;

    let tester = Arc::new(RecordingTester::default());
    let workers = (0..3)
        .map(|i| cluster.worker(&format!("w{i}"), tester.clone() as Arc<dyn CandidateTester>))
        .collect();
    cluster.drain_all(workers).await;

    let mut expected = words.clone();
    expected.sort();
    assert_eq!(tester.sorted_seen(), expected);
}

#[tokio::test]
async fn byte_chunks_cover_the_corpus_exactly_once_across_workers() {
    let cluster = Cluster::new();
    let words = corpus_with_needle(50, 17, "needle-0017");
    let mut raw = words.join("\n").into_bytes();
    raw.push(b'\n');
    cluster.source.add_raw("s3://lists/raw", &raw);

    // 16-byte chunks cut nearly every item in half.
    cluster
        .submit(needle_spec(
            "byte-coverage-scan",
            "s3://lists/raw",
            "unused",
            ChunkStrategy::bytes(16),
        ))
        .await;

    let tester = Arc::new(RecordingTester::default());
    let workers = (0..2)
        .map(|i| cluster.worker(&format!("w{i}"), tester.clone() as Arc<dyn CandidateTester>))
        .collect();
    cluster.drain_all(workers).await;

    let mut expected = words.clone();
    expected.sort();
    assert_eq!(tester.sorted_seen(), expected);
}

#[tokio::test]
async fn a_needle_split_across_a_byte_boundary_is_still_found() {
    let cluster = Cluster::new();
    // "hunter2" spans the boundary between the first and second 8-byte
    // chunks.
    cluster.source.add_raw("s3://lists/raw", b"abcde\nhunter2\nxyz\n");

    let job_id = cluster
        .submit(needle_spec(
            "split-needle-scan",
            "s3://lists/raw",
            "hunter2",
            ChunkStrategy::bytes(8),
        ))
        .await;
    cluster.drain(&cluster.worker("w0", Arc::new(NeedleTester))).await;

    let view = cluster.registry.get_job(&job_id).await.unwrap();
    assert_eq!(view.record.status, JobStatus::CompletedFound);
    assert_eq!(view.stats.results_found, 1);

    let page = cluster.aggregator.results_page(&job_id, 0, 10).await.unwrap();
    assert_eq!(page.findings[0].value, "hunter2");
    // The item starts at byte 6, so it belongs to the first chunk.
    assert_eq!(page.findings[0].chunk_index, 0);
}
