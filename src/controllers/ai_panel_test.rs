use super::*;
use crate::controllers::test_support::FakeDeskApi;
use crate::error::ClientError;
use crate::net::types::JobStatusResponse;
use crate::state::job::Recommendation;
use std::time::Duration;

fn settings() -> AiPanelSettings {
    AiPanelSettings {
        debounce: Duration::from_millis(1000),
        poll_interval: Duration::from_millis(1500),
        poll_deadline: None,
    }
}

fn inputs(task_id: &str, context_time_ms: i64) -> AiPanelInputs {
    AiPanelInputs {
        desk_id: "desk-1".to_owned(),
        task_id: task_id.to_owned(),
        description: format!("description at {context_time_ms}"),
        stack: vec!["rust".to_owned()],
        context_time_ms: Some(context_time_ms),
    }
}

fn controller(api: &Arc<FakeDeskApi>) -> AiPanelController {
    AiPanelController::new(Arc::clone(api) as Arc<dyn DeskApi>, settings())
}

fn drain(rx: &mut mpsc::UnboundedReceiver<AsyncJobState>) -> Vec<AsyncJobState> {
    let mut out = Vec::new();
    while let Ok(state) = rx.try_recv() {
        out.push(state);
    }
    out
}

async fn sleep_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

// =============================================================
// Debounce
// =============================================================

#[tokio::test(start_paused = true)]
async fn rapid_input_changes_fire_one_request_with_last_values() {
    let api = Arc::new(FakeDeskApi::with_ai_responses(vec![Ok(JobStatusResponse::success("ok"))]));
    let mut panel = controller(&api);

    for ts in 1..=6 {
        panel.set_inputs(inputs("task-1", ts), true);
        sleep_ms(150).await;
    }
    assert_eq!(api.ai_call_count(), 0);

    sleep_ms(5_000).await;
    let calls = api.ai_calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].task_id, "task-1");
    assert_eq!(calls[0].context_time_ms, Some(6));
    assert!(matches!(panel.snapshot().job, AsyncJobState::Succeeded(_)));
}

#[tokio::test(start_paused = true)]
async fn identical_inputs_do_not_restart_the_cycle() {
    let api = Arc::new(FakeDeskApi::with_ai_responses(vec![Ok(JobStatusResponse::success("ok"))]));
    let mut panel = controller(&api);

    panel.set_inputs(inputs("task-1", 1), true);
    sleep_ms(1_200).await;
    panel.set_inputs(inputs("task-1", 1), true);
    sleep_ms(5_000).await;

    assert_eq!(api.ai_call_count(), 1);
    assert_eq!(panel.snapshot().job.result().map(|r| r.text.as_str()), Some("ok"));
}

// =============================================================
// Polling
// =============================================================

#[tokio::test(start_paused = true)]
async fn waiting_k_times_then_success_issues_k_plus_one_requests() {
    let k = 3;
    let mut responses: Vec<_> = (0..k).map(|_| Ok(JobStatusResponse::waiting())).collect();
    responses.push(Ok(JobStatusResponse::success("Split the component")));
    let api = Arc::new(FakeDeskApi::with_ai_responses(responses));
    let mut panel = controller(&api);

    panel.set_inputs(inputs("task-1", 1), true);
    sleep_ms(20_000).await;

    assert_eq!(api.ai_call_count(), k + 1);
    let view = panel.snapshot();
    assert_eq!(view.job, AsyncJobState::Succeeded(Recommendation { text: "Split the component".into() }));
    assert!(!view.is_polling);
    assert!(!panel.is_active());
}

#[tokio::test(start_paused = true)]
async fn transitions_follow_waiting_waiting_success_script() {
    let api = Arc::new(FakeDeskApi::with_ai_responses(vec![
        Ok(JobStatusResponse::waiting()),
        Ok(JobStatusResponse::waiting()),
        Ok(JobStatusResponse::success("Use memoization")),
    ]));
    let mut panel = controller(&api);
    let mut rx = panel.subscribe();

    panel.set_inputs(inputs("task-1", 1), true);
    sleep_ms(10_000).await;

    assert_eq!(
        drain(&mut rx),
        vec![
            AsyncJobState::Requesting,
            AsyncJobState::Pending,
            AsyncJobState::Requesting,
            AsyncJobState::Pending,
            AsyncJobState::Requesting,
            AsyncJobState::Succeeded(Recommendation { text: "Use memoization".into() }),
        ]
    );
    assert_eq!(panel.snapshot().job.result().unwrap().text, "Use memoization");
}

#[tokio::test(start_paused = true)]
async fn is_polling_is_set_while_pending() {
    let api = Arc::new(FakeDeskApi::default());
    let mut panel = controller(&api);

    panel.set_inputs(inputs("task-1", 1), true);
    sleep_ms(1_100).await;

    let view = panel.snapshot();
    assert_eq!(view.job, AsyncJobState::Pending);
    assert!(view.is_polling);
}

#[tokio::test(start_paused = true)]
async fn server_error_without_text_uses_generic_message() {
    let api = Arc::new(FakeDeskApi::with_ai_responses(vec![Ok(JobStatusResponse::error(None))]));
    let mut panel = controller(&api);

    panel.set_inputs(inputs("task-1", 1), true);
    sleep_ms(2_000).await;

    assert_eq!(
        panel.snapshot().job.error_message(),
        Some(crate::util::poller::JOB_FAILED_MESSAGE)
    );
    assert_eq!(api.ai_call_count(), 1);
}

// =============================================================
// Cancellation
// =============================================================

#[tokio::test(start_paused = true)]
async fn teardown_while_pending_stops_all_requests() {
    let api = Arc::new(FakeDeskApi::default());
    let mut panel = controller(&api);

    panel.set_inputs(inputs("task-1", 1), true);
    sleep_ms(3_000).await;
    assert_eq!(panel.snapshot().job, AsyncJobState::Pending);
    let calls_at_teardown = api.ai_call_count();
    assert!(calls_at_teardown >= 1);

    panel.teardown();
    sleep_ms(60_000).await;

    assert_eq!(api.ai_call_count(), calls_at_teardown);
    assert_eq!(panel.snapshot().job, AsyncJobState::Idle);
    assert!(!panel.is_active());
}

#[tokio::test(start_paused = true)]
async fn same_inputs_after_teardown_start_a_fresh_cycle() {
    let api = Arc::new(FakeDeskApi::with_ai_responses(vec![
        Ok(JobStatusResponse::success("first mount")),
        Ok(JobStatusResponse::success("second mount")),
    ]));
    let mut panel = controller(&api);

    panel.set_inputs(inputs("task-1", 1), true);
    sleep_ms(2_000).await;
    assert_eq!(api.ai_call_count(), 1);

    panel.teardown();
    assert_eq!(panel.snapshot(), AiPanelView::default());

    panel.set_inputs(inputs("task-1", 1), true);
    sleep_ms(3_000).await;

    assert_eq!(api.ai_call_count(), 2);
    assert_eq!(panel.snapshot().job.result().map(|r| r.text.as_str()), Some("second mount"));
}

#[tokio::test(start_paused = true)]
async fn dropping_controller_stops_polling() {
    let api = Arc::new(FakeDeskApi::default());
    let mut panel = controller(&api);

    panel.set_inputs(inputs("task-1", 1), true);
    sleep_ms(3_000).await;
    let calls_at_drop = api.ai_call_count();
    drop(panel);
    sleep_ms(60_000).await;

    assert_eq!(api.ai_call_count(), calls_at_drop);
}

#[tokio::test(start_paused = true)]
async fn revoking_permission_resets_to_idle_and_cancels_polling() {
    let api = Arc::new(FakeDeskApi::default());
    let mut panel = controller(&api);

    panel.set_inputs(inputs("task-1", 1), true);
    sleep_ms(3_000).await;
    let calls = api.ai_call_count();

    panel.set_inputs(inputs("task-1", 1), false);
    let view = panel.snapshot();
    assert_eq!(view.job, AsyncJobState::Idle);
    assert!(!view.is_polling);
    assert!(!view.can_request);

    sleep_ms(30_000).await;
    assert_eq!(api.ai_call_count(), calls);
}

#[tokio::test(start_paused = true)]
async fn without_permission_nothing_is_requested() {
    let api = Arc::new(FakeDeskApi::default());
    let mut panel = controller(&api);

    panel.set_inputs(inputs("task-1", 1), false);
    sleep_ms(10_000).await;

    assert_eq!(api.ai_call_count(), 0);
    assert_eq!(panel.snapshot().job, AsyncJobState::Idle);
}

#[tokio::test(start_paused = true)]
async fn input_change_during_request_discards_stale_response() {
    let api = Arc::new(FakeDeskApi {
        ai_delay: Duration::from_millis(500),
        ..FakeDeskApi::with_ai_responses(vec![
            Ok(JobStatusResponse::success("for task-1")),
            Ok(JobStatusResponse::success("for task-2")),
        ])
    });
    let mut panel = controller(&api);
    let mut rx = panel.subscribe();

    panel.set_inputs(inputs("task-1", 1), true);
    // debounce elapsed, first request still in flight
    sleep_ms(1_200).await;
    assert_eq!(panel.snapshot().job, AsyncJobState::Requesting);

    panel.set_inputs(inputs("task-2", 2), true);
    sleep_ms(5_000).await;

    let seen = drain(&mut rx);
    assert!(!seen.iter().any(|s| s.result().is_some_and(|r| r.text == "for task-1")));
    let view = panel.snapshot();
    assert_eq!(view.inputs.unwrap().task_id, "task-2");
    assert_eq!(view.job.result().map(|r| r.text.as_str()), Some("for task-2"));
}

// =============================================================
// Retry
// =============================================================

#[tokio::test(start_paused = true)]
async fn retry_after_transport_failure_requests_immediately() {
    let api = Arc::new(FakeDeskApi::with_ai_responses(vec![
        Err(ClientError::Transport("connection reset".into())),
        Ok(JobStatusResponse::success("second time lucky")),
    ]));
    let mut panel = controller(&api);

    panel.set_inputs(inputs("task-1", 1), true);
    sleep_ms(2_000).await;
    assert_eq!(
        panel.snapshot().job,
        AsyncJobState::Failed(crate::error::NETWORK_FAILURE_MESSAGE.to_owned())
    );

    assert!(panel.retry());
    sleep_ms(10).await;

    assert_eq!(api.ai_call_count(), 2);
    assert_eq!(panel.snapshot().job.result().unwrap().text, "second time lucky");
}

#[tokio::test(start_paused = true)]
async fn retry_is_refused_unless_failed() {
    let api = Arc::new(FakeDeskApi::with_ai_responses(vec![Ok(JobStatusResponse::success("ok"))]));
    let mut panel = controller(&api);
    assert!(!panel.retry());

    panel.set_inputs(inputs("task-1", 1), true);
    sleep_ms(2_000).await;
    assert!(!panel.retry());
    assert_eq!(api.ai_call_count(), 1);
}
