/*!
 * Tests for the retry policy and versioned reconnects
 */

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use recordgate::database::{Bindings, RetryOutcome, RetryPolicy};
use recordgate::errors::ConnectionError;
use tokio::sync::Barrier;

use crate::common;

/// Two tasks failing on the same handle must share one reconnect
#[tokio::test]
async fn test_concurrentFailures_onSameGeneration_shouldReconnectOnce() {
    common::init_logging();
    let (connector, manager) = common::connected_manager().await;
    let barrier = Arc::new(Barrier::new(2));
    let policy = RetryPolicy::default();

    let runs = (0..2).map(|_| {
        let barrier = Arc::clone(&barrier);
        let manager = Arc::clone(&manager);
        let mut first = true;
        async move {
            policy
                .run(&manager, move |handle| {
                    let fail = std::mem::replace(&mut first, false);
                    let barrier = Arc::clone(&barrier);
                    async move {
                        if fail {
                            // Both tasks hold generation 1 before either fails
                            barrier.wait().await;
                            Err(ConnectionError::Closed)
                        } else {
                            Ok(handle.generation())
                        }
                    }
                })
                .await
        }
    });

    let outcomes = join_all(runs).await;

    assert_eq!(outcomes, vec![RetryOutcome::Completed(2), RetryOutcome::Completed(2)]);
    assert_eq!(connector.opens(), 2);
    assert_eq!(connector.closes(), 1);
}

/// An in-flight query on a replaced handle fails and retries on the new one
#[tokio::test]
async fn test_queryOnReplacedHandle_shouldRetryOnNewHandle() {
    let (connector, manager) = common::connected_manager().await;
    let mut first = true;

    let outcome = RetryPolicy::default()
        .run(&manager, |handle| {
            let interrupted = std::mem::replace(&mut first, false);
            let manager = Arc::clone(&manager);
            async move {
                if interrupted {
                    // Another task reconnects while this query is in flight
                    manager.reconnect().await.expect("mock reconnect");
                }
                handle
                    .query("RETURN 1", &Bindings::new())
                    .await
                    .map(|_| handle.generation())
            }
        })
        .await;

    // Generation 1 fails with Closed; generation 2 is already newer, so no extra reconnect
    assert_eq!(outcome, RetryOutcome::Completed(2));
    assert_eq!(connector.opens(), 2);
    assert_eq!(connector.queries(), 1);
}

/// The configured delay is applied between attempts only
#[tokio::test]
async fn test_delay_shouldApplyBetweenAttempts() {
    let (_connector, manager) = common::connected_manager().await;
    let policy = RetryPolicy::new(3, Duration::from_millis(20));

    let started = Instant::now();
    let outcome: RetryOutcome<()> = policy
        .run(&manager, |_| async { Err(ConnectionError::Closed) })
        .await;

    assert!(matches!(outcome, RetryOutcome::Exhausted { attempts: 3, .. }));
    assert!(started.elapsed() >= Duration::from_millis(40));
}

/// Reconnect failures are absorbed and reported through exhaustion
#[tokio::test]
async fn test_unreachableEngine_shouldExhaustWithoutPanicking() {
    let (connector, manager) = common::connected_manager().await;
    connector.fail_opens(true);

    let outcome: RetryOutcome<()> = RetryPolicy::default()
        .run(&manager, |_| async { Err(ConnectionError::Unreachable("reset".to_string())) })
        .await;

    match outcome {
        RetryOutcome::Exhausted { attempts, last_error } => {
            assert_eq!(attempts, 3);
            // After the failed reconnect there is no handle left to try
            assert_eq!(last_error, ConnectionError::NotConnected);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(connector.opens(), 1);
}
