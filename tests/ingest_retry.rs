// tests/ingest_retry.rs
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use news_harvester::{parse_feed, with_retries, FeedDocument, IngestError, RetryPolicy};

const RSS: &str = include_str!("fixtures/sample_rss.xml");

#[tokio::test]
async fn third_attempt_succeeds_after_two_failures() {
    let calls = Arc::new(AtomicU32::new(0));
    let seen = calls.clone();
    let policy = RetryPolicy::immediate(3);

    let doc = with_retries(&policy, move || {
        let calls = seen.clone();
        async move {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n < 3 {
                Err(IngestError::Parse(format!("transient failure {n}")))
            } else {
                parse_feed(RSS)
            }
        }
    })
    .await
    .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(doc.items.len(), 3);
}

#[tokio::test]
async fn exhausted_attempts_report_count_and_last_error() {
    let calls = Arc::new(AtomicU32::new(0));
    let seen = calls.clone();
    let policy = RetryPolicy::immediate(3);

    let err = with_retries::<FeedDocument, _, _>(&policy, move || {
        let calls = seen.clone();
        async move {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            Err(IngestError::Parse(format!("attempt {n} failed")))
        }
    })
    .await
    .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    match err {
        IngestError::FetchFailed { attempts, last } => {
            assert_eq!(attempts, 3);
            assert!(last.to_string().contains("attempt 3 failed"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test(start_paused = true)]
async fn linear_backoff_waits_one_then_two_units() {
    let t0 = tokio::time::Instant::now();
    let policy = RetryPolicy {
        max_attempts: 3,
        backoff_unit: Duration::from_secs(1),
    };

    let err = with_retries::<(), _, _>(&policy, || async {
        Err(IngestError::Parse("always fails".into()))
    })
    .await
    .unwrap_err();

    assert!(matches!(err, IngestError::FetchFailed { attempts: 3, .. }));
    // 1s after the first failure, 2s after the second
    assert_eq!(t0.elapsed(), Duration::from_secs(3));
}
