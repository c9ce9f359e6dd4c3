mod common;

use common::{
    widget_repo, AllWidgets, CountWidgets, ExplodingCommand, FindWidgetById, InsertWidget,
    WidgetSummaries,
};
use magrathea_core::{Repository, TaskError};
use rusqlite::ErrorCode;

#[tokio::test]
async fn execute_async_has_the_same_effect_as_execute() {
    let sync_repo = widget_repo();
    let async_repo = widget_repo();

    sync_repo.execute(&InsertWidget::new(1, "A")).unwrap();
    async_repo
        .execute_async(InsertWidget::new(1, "A"))
        .await
        .unwrap();

    assert_eq!(
        sync_repo.find(&AllWidgets).unwrap(),
        async_repo.find(&AllWidgets).unwrap()
    );
}

#[tokio::test]
async fn find_scalar_async_matches_sync_result() {
    let repo = widget_repo();
    repo.execute(&InsertWidget::new(7, "cog")).unwrap();

    let sync = repo.find_scalar(&FindWidgetById(7)).unwrap();
    let from_async = repo.find_scalar_async(FindWidgetById(7)).await.unwrap();
    assert_eq!(sync, from_async);

    assert_eq!(repo.find_scalar_async(CountWidgets).await.unwrap(), 1);
}

#[tokio::test]
async fn find_async_yields_equal_sequences() {
    let repo = widget_repo();
    for id in 1..=3 {
        repo.execute(&InsertWidget::new(id, &format!("w{id}")))
            .unwrap();
    }

    let sync = repo.find(&AllWidgets).unwrap();
    let from_async = repo.find_async(AllWidgets).await.unwrap();
    assert_eq!(sync, from_async);

    let projected = repo.find_projected_async(WidgetSummaries).await.unwrap();
    assert_eq!(projected, repo.find_projected(&WidgetSummaries).unwrap());
}

#[tokio::test]
async fn constraint_violation_resolves_through_the_future() {
    let repo = widget_repo();
    repo.execute(&InsertWidget::new(1, "first")).unwrap();

    // Scheduling must not fail at the call site.
    let pending = repo.execute_async(InsertWidget::new(1, "duplicate"));

    let err = pending
        .await
        .unwrap_err()
        .into_operation()
        .expect("operation error expected");
    assert_eq!(err.sqlite_error_code(), Some(ErrorCode::ConstraintViolation));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn panicking_operation_resolves_to_join_error_and_context_stays_usable() {
    let repo = widget_repo();

    let result = repo.execute_async(ExplodingCommand).await;
    match result {
        Err(TaskError::Join(err)) => assert!(err.is_panic()),
        other => panic!("unexpected result: {:?}", other.map_err(|err| err.to_string())),
    }

    repo.execute_async(InsertWidget::new(1, "after"))
        .await
        .unwrap();
    assert_eq!(repo.find_scalar(&CountWidgets).unwrap(), 1);
}

#[test]
fn dispatch_outside_runtime_resolves_to_no_runtime() {
    let repo = widget_repo();
    let pending = repo.find_async(AllWidgets);
    assert!(pending.is_finished());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let result = runtime.block_on(pending);
    assert!(matches!(result, Err(TaskError::NoRuntime)));
}
