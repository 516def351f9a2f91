use std::future::Future;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use llamaload_core::{FailureCause, ScenarioSpec, TargetConfig, TaskResult};
use tokio::sync::Semaphore;
use tracing::{debug, instrument};

use crate::ollama::OllamaClient;
use crate::task::run_task;

/// Launch `concurrency` tasks at once and wait for every one of them.
///
/// Results come back in completion order; a panicking task is reported as a
/// [`FailureCause::Panicked`] failure so the batch always has exactly
/// `concurrency` entries.
pub async fn run_batch<F, Fut>(concurrency: usize, make_task: F) -> Vec<TaskResult>
where
    F: Fn(usize) -> Fut,
    Fut: Future<Output = TaskResult> + Send + 'static,
{
    run_batch_bounded(concurrency, concurrency, make_task).await
}

/// Run `tasks` tasks with at most `limit` of them in flight at any moment.
///
/// Every task is spawned up front and waits for a permit before it starts.
/// A `limit` of 0 is treated as 1.
pub async fn run_batch_bounded<F, Fut>(tasks: usize, limit: usize, make_task: F) -> Vec<TaskResult>
where
    F: Fn(usize) -> Fut,
    Fut: Future<Output = TaskResult> + Send + 'static,
{
    let permits = Arc::new(Semaphore::new(limit.max(1)));
    let mut pending = FuturesUnordered::new();

    for task_id in 0..tasks {
        let permits = Arc::clone(&permits);
        let task = make_task(task_id);
        let handle = tokio::spawn(async move {
            let _permit = permits.acquire().await;
            task.await
        });
        pending.push(async move { (task_id, handle.await) });
    }

    let mut results = Vec::with_capacity(tasks);
    while let Some((task_id, joined)) = pending.next().await {
        let result = match joined {
            Ok(result) => result,
            Err(e) => TaskResult::failure(task_id, FailureCause::Panicked, e.to_string()),
        };
        debug!(
            task_id,
            success = result.is_success(),
            "Task complete ({}/{})",
            results.len() + 1,
            tasks
        );
        results.push(result);
    }

    results
}

/// Fan `scenario` out to `concurrency` simultaneous users of `target`.
#[instrument(skip_all, fields(model = %target.model, scenario = %scenario.name, users = concurrency))]
pub async fn run_scenario(
    client: &OllamaClient,
    target: Arc<TargetConfig>,
    scenario: Arc<ScenarioSpec>,
    concurrency: usize,
) -> Vec<TaskResult> {
    debug!("Submitting {} concurrent requests", concurrency);
    run_batch(concurrency, |task_id| {
        let client = client.clone();
        let target = Arc::clone(&target);
        let scenario = Arc::clone(&scenario);
        async move { run_task(&client, &target, &scenario, task_id).await }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use llamaload_core::MetricsRecord;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn ok(task_id: usize) -> TaskResult {
        TaskResult::Success {
            task_id,
            metrics: MetricsRecord::default(),
        }
    }

    #[tokio::test]
    async fn test_returns_one_result_per_task() {
        let results = run_batch(16, |task_id| async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            ok(task_id)
        })
        .await;

        assert_eq!(results.len(), 16);
        let mut ids: Vec<usize> = results.iter().map(TaskResult::task_id).collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..16).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_results_arrive_in_completion_order() {
        let results = run_batch(3, |task_id| async move {
            // task 0 is slowest, task 2 fastest
            tokio::time::sleep(Duration::from_millis(150 - 60 * task_id as u64)).await;
            ok(task_id)
        })
        .await;

        let ids: Vec<usize> = results.iter().map(TaskResult::task_id).collect();
        assert_eq!(ids, vec![2, 1, 0]);
    }

    async fn track_in_flight(tasks: usize, limit: usize) -> (Vec<TaskResult>, usize) {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let high_water = Arc::new(AtomicUsize::new(0));

        let results = run_batch_bounded(tasks, limit, |task_id| {
            let in_flight = Arc::clone(&in_flight);
            let high_water = Arc::clone(&high_water);
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                high_water.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(30)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                ok(task_id)
            }
        })
        .await;

        assert_eq!(in_flight.load(Ordering::SeqCst), 0);
        (results, high_water.load(Ordering::SeqCst))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_in_flight_never_exceeds_limit() {
        let (results, high_water) = track_in_flight(12, 4).await;

        assert_eq!(results.len(), 12);
        assert_eq!(high_water, 4);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_limit_of_one_serializes() {
        let (results, high_water) = track_in_flight(5, 1).await;

        assert_eq!(results.len(), 5);
        assert_eq!(high_water, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_full_batch_runs_all_at_once() {
        let (results, high_water) = track_in_flight(8, 8).await;

        assert_eq!(results.len(), 8);
        assert_eq!(high_water, 8);
    }

    #[tokio::test]
    async fn test_failures_do_not_cancel_siblings() {
        let results = run_batch(4, |task_id| async move {
            if task_id % 2 == 0 {
                TaskResult::failure(task_id, FailureCause::Transport, "connection refused")
            } else {
                tokio::time::sleep(Duration::from_millis(20)).await;
                ok(task_id)
            }
        })
        .await;

        assert_eq!(results.len(), 4);
        assert_eq!(results.iter().filter(|r| r.is_success()).count(), 2);
    }

    #[tokio::test]
    async fn test_panicking_task_becomes_failure() {
        let results = run_batch(3, |task_id| async move {
            if task_id == 1 {
                panic!("boom");
            }
            ok(task_id)
        })
        .await;

        assert_eq!(results.len(), 3);
        let failed: Vec<&TaskResult> = results.iter().filter(|r| !r.is_success()).collect();
        assert_eq!(failed.len(), 1);
        match failed[0] {
            TaskResult::Failure(e) => {
                assert_eq!(e.task_id, 1);
                assert_eq!(e.cause, FailureCause::Panicked);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_zero_concurrency_is_empty() {
        let results = run_batch(0, |task_id| async move { ok(task_id) }).await;
        assert!(results.is_empty());
    }
}
