use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::{Duration, Instant},
};

use muzikant::spotify::{RateGovernor, SpotifyError};

#[tokio::test]
async fn test_gated_runs_call_immediately_without_deadline() {
    let governor = RateGovernor::new(1);
    assert_eq!(governor.retry_after_epoch_ms(), 0);

    let start = Instant::now();
    let value = governor.gated(|| async { Ok::<_, SpotifyError>(42) }).await.unwrap();

    assert_eq!(value, 42);
    assert!(start.elapsed() < Duration::from_millis(500));
}

#[tokio::test]
async fn test_gated_waits_for_backoff_deadline() {
    let governor = RateGovernor::new(1);
    let deadline = governor.note_retry_after(1);
    assert_eq!(governor.retry_after_epoch_ms(), deadline);

    let start = Instant::now();
    governor.gated(|| async { Ok::<_, SpotifyError>(()) }).await.unwrap();

    assert!(start.elapsed() >= Duration::from_millis(990));
}

#[tokio::test]
async fn test_later_retry_after_overwrites_deadline() {
    let governor = RateGovernor::new(1);
    let long = governor.note_retry_after(30);
    let short = governor.note_retry_after(1);

    assert!(short < long);
    assert_eq!(governor.retry_after_epoch_ms(), short);
}

#[tokio::test]
async fn test_permit_released_on_error() {
    let governor = RateGovernor::new(1);

    let err = governor
        .gated(|| async { Err::<(), _>(SpotifyError::RateLimited) })
        .await
        .unwrap_err();
    assert!(matches!(err, SpotifyError::RateLimited));
    assert_eq!(governor.available_permits(), 1);

    // The next caller still gets through
    governor.gated(|| async { Ok::<_, SpotifyError>(()) }).await.unwrap();
}

#[tokio::test]
async fn test_permit_released_when_call_is_cancelled() {
    let governor = Arc::new(RateGovernor::new(1));

    let pending = {
        let governor = Arc::clone(&governor);
        tokio::spawn(async move {
            governor
                .gated(|| async {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok::<_, SpotifyError>(())
                })
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(governor.available_permits(), 0);

    pending.abort();
    let _ = pending.await;

    assert_eq!(governor.available_permits(), 1);
}

#[tokio::test]
async fn test_closed_governor_is_unavailable() {
    let governor = RateGovernor::new(1);
    governor.close();

    let ran = AtomicUsize::new(0);
    let err = governor
        .gated(|| async {
            ran.fetch_add(1, Ordering::SeqCst);
            Ok::<_, SpotifyError>(())
        })
        .await
        .unwrap_err();

    assert!(matches!(err, SpotifyError::Unavailable));
    assert_eq!(ran.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_permits_cap_concurrency() {
    let governor = Arc::new(RateGovernor::new(2));
    let in_flight = Arc::new(AtomicUsize::new(0));
    let max_in_flight = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..6 {
        let governor = Arc::clone(&governor);
        let in_flight = Arc::clone(&in_flight);
        let max_in_flight = Arc::clone(&max_in_flight);
        handles.push(tokio::spawn(async move {
            governor
                .gated(|| async {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    max_in_flight.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok::<_, SpotifyError>(())
                })
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(max_in_flight.load(Ordering::SeqCst), 2);
}

#[test]
fn test_zero_capacity_is_one() {
    let governor = RateGovernor::new(0);
    assert_eq!(governor.available_permits(), 1);
}

#[test]
fn test_oversized_capacity_is_capped() {
    let governor = RateGovernor::new(usize::MAX);
    assert_eq!(
        governor.available_permits(),
        tokio::sync::Semaphore::MAX_PERMITS
    );
}
