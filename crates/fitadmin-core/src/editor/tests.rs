use std::sync::Arc;

use futures::FutureExt;
use pretty_assertions::assert_eq;
use serde_json::Value;

use super::*;
use crate::auth::{AuthContext, MemoryCredentialStore};
use crate::models::{
    ContentKind, ContentStep, ExerciseBlock, ExerciseStep, ExerciseStepPatch, ImageFile, Meal,
    MealStepPatch, StepId,
};
use crate::reconcile::StepImageSync;
use crate::notify::RecordingNotifier;
use crate::repository::ContentStore;
use crate::routes::{guard, Route, RouteDecision};
use crate::test_support::{stale_token, Call, Op, StubBackend};

fn store_with(backend: StubBackend) -> (ContentStore<StubBackend>, Arc<StubBackend>, Arc<RecordingNotifier>) {
    let backend = Arc::new(backend);
    let notifier = Arc::new(RecordingNotifier::new());
    let store = ContentStore::new(Arc::clone(&backend), notifier.clone());
    (store, backend, notifier)
}

fn seeded_block() -> ExerciseBlock {
    ExerciseBlock {
        id: Some("b1".to_string()),
        name: "Morning legs".to_string(),
        description: "Squats and lunges to start the day".to_string(),
        steps: vec![
            ExerciseStep {
                name: "Squat".to_string(),
                ..ExerciseStep::placeholder(StepId::server("e1"), &[])
            },
            ExerciseStep {
                name: "Lunge".to_string(),
                ..ExerciseStep::placeholder(StepId::server("e2"), &[])
            },
        ],
        ..ExerciseBlock::default()
    }
}

async fn editing_block(
    backend: StubBackend,
) -> (
    EditorSession<ExerciseBlock, StubBackend>,
    Arc<StubBackend>,
    Arc<RecordingNotifier>,
) {
    backend.seed(seeded_block());
    let (store, backend, notifier) = store_with(backend);
    let session = EditorSession::edit(store.repository(), "b1").await.unwrap();
    backend.clear_calls();
    (session, backend, notifier)
}

fn rename(name: &str) -> ExerciseStepPatch {
    ExerciseStepPatch {
        name: Some(name.to_string()),
        ..ExerciseStepPatch::default()
    }
}

fn body_of(backend: &StubBackend, call: &Call) -> Value {
    backend
        .requests()
        .into_iter()
        .find(|request| &request.call == call)
        .and_then(|request| request.body)
        .unwrap()
}

#[tokio::test(flavor = "current_thread")]
async fn meal_create_embeds_steps_in_one_call() {
    let (store, backend, _) = store_with(StubBackend::new());
    let mut session = EditorSession::create(store.repository::<Meal>());
    assert_eq!(session.state(), EditorState::Empty);

    session
        .update_form(|meal| {
            meal.name = "Test Meal".to_string();
            meal.description = "Quick oats with fruit".to_string();
        })
        .unwrap();
    let first = session.add_step().await.unwrap();
    let second = session.add_step().await.unwrap();
    for (id, title) in [(&first, "Boil"), (&second, "Serve")] {
        session
            .edit_step(
                id,
                &MealStepPatch {
                    title: Some(title.to_string()),
                    ..MealStepPatch::default()
                },
            )
            .unwrap();
    }
    assert!(backend.calls().is_empty());

    let report = session.submit().await.unwrap();

    assert_eq!(backend.calls(), vec![Call::Create(ContentKind::Meal)]);
    let body = body_of(&backend, &Call::Create(ContentKind::Meal));
    assert_eq!(body["food_name"], "Test Meal");
    let steps = body["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[0]["title"], "Boil");
    assert_eq!(steps[0]["step_number"], 1);
    assert_eq!(steps[1]["title"], "Serve");
    assert_eq!(steps[1]["step_number"], 2);
    assert!(steps.iter().all(|step| step.get("id").is_none()));

    assert_eq!(report.navigate_to, Some(Route::ContentList));
    assert!(report.is_complete());
    assert_eq!(session.state(), EditorState::Succeeded);
    assert!(session
        .steps()
        .iter()
        .all(|step| session.reconciler().is_server_known(&step.id)));
    assert_eq!(store.cache().all::<Meal>().len(), 1);
}

#[tokio::test(flavor = "current_thread")]
async fn block_edit_sends_one_update_and_one_step_create() {
    let (mut session, backend, _) = editing_block(StubBackend::new()).await;
    assert_eq!(session.state(), EditorState::Populated);
    assert_eq!(session.reconciler().server_steps().len(), 2);

    session
        .update_form(|block| block.description = "Squats, lunges and a plank".to_string())
        .unwrap();
    session.add_step().await.unwrap();
    let report = session.submit().await.unwrap();

    assert_eq!(
        backend.calls(),
        vec![
            Call::CreateStep("b1".to_string()),
            Call::Update("b1".to_string())
        ]
    );
    assert_eq!(report.step_updates.attempted, 0);
    assert_eq!(report.navigate_to, Some(Route::ContentList));
    let body = body_of(&backend, &Call::Update("b1".to_string()));
    assert_eq!(body["description"], "Squats, lunges and a plank");
    assert_eq!(body["exercises"].as_array().unwrap().len(), 3);
}

#[tokio::test(flavor = "current_thread")]
async fn edit_submit_batches_exactly_the_modified_steps() {
    let (mut session, backend, _) = editing_block(StubBackend::new()).await;
    session.edit_step(&StepId::server("e2"), &rename("Walking lunge")).unwrap();
    session.edit_step(&StepId::server("e2"), &rename("Reverse lunge")).unwrap();
    assert_eq!(session.reconciler().modified_steps().len(), 1);

    let report = session.submit().await.unwrap();

    let calls = backend.calls();
    let updates = calls.iter().filter(|call| matches!(call, Call::Update(_))).count();
    let step_updates: Vec<&Call> = calls
        .iter()
        .filter(|call| matches!(call, Call::UpdateStep(_)))
        .collect();
    assert_eq!(updates, 1);
    assert_eq!(step_updates, vec![&Call::UpdateStep("e2".to_string())]);
    assert_eq!(report.step_updates.attempted, 1);
    assert!(session.reconciler().modified_steps().is_empty());
}

#[tokio::test(flavor = "current_thread")]
async fn removed_step_is_left_out_of_the_update() {
    let (mut session, backend, _) = editing_block(StubBackend::new()).await;
    let e1 = StepId::server("e1");
    session
        .attach_step_image(&e1, ImageFile::new("squat.png", "image/png", vec![1]))
        .await
        .unwrap();
    assert!(session.reconciler().step_image(&e1).is_some());

    session.remove_step(&e1).unwrap();
    assert!(session.reconciler().step_image(&e1).is_none());
    session.submit().await.unwrap();

    let body = body_of(&backend, &Call::Update("b1".to_string()));
    let ids: Vec<&str> = body["exercises"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|step| step["id"].as_str())
        .collect();
    assert_eq!(ids, vec!["e2"]);
    assert!(!backend
        .calls()
        .iter()
        .any(|call| matches!(call, Call::UpdateStep(id) if id == "e1")));
}

#[tokio::test(flavor = "current_thread")]
async fn invalid_form_sends_nothing() {
    let (store, backend, notifier) = store_with(StubBackend::new());
    let mut session = EditorSession::create(store.repository::<Meal>());
    session
        .update_form(|meal| {
            meal.name = "Ok".to_string();
            meal.calories = "-5".to_string();
        })
        .unwrap();

    let error = session.submit().await.unwrap_err();
    let errors = match error {
        EditorError::Invalid(errors) => errors,
        other => panic!("expected validation errors, got {other:?}"),
    };
    assert!(errors.has_field("name"));
    assert!(errors.has_field("calories"));
    assert!(errors.has_field("description"));
    assert!(backend.calls().is_empty());
    assert!(notifier.notices().is_empty());
    assert_eq!(session.state(), EditorState::Editing);
}

#[tokio::test(flavor = "current_thread")]
async fn failed_parent_update_still_runs_other_stages() {
    let (mut session, backend, notifier) = editing_block(StubBackend::new()).await;
    session.edit_step(&StepId::server("e1"), &rename("Front squat")).unwrap();
    backend.fail(Op::Update);

    let report = session.submit().await.unwrap();

    assert!(!report.persisted);
    assert_eq!(report.navigate_to, None);
    assert_eq!(report.step_updates.succeeded, vec![StepId::server("e1")]);
    assert_eq!(session.state(), EditorState::Editing);
    assert_eq!(notifier.errors().len(), 1);
    assert_eq!(
        session
            .repository()
            .cache()
            .get::<ExerciseBlock>("b1")
            .unwrap()
            .steps[0]
            .name,
        "Front squat"
    );
}

#[tokio::test(flavor = "current_thread")]
async fn failed_create_can_be_retried() {
    let (store, backend, _) = store_with(StubBackend::new());
    let mut session = EditorSession::create(store.repository::<ExerciseBlock>());
    session
        .update_form(|block| {
            block.name = "Cardio".to_string();
            block.description = "Twenty minutes of intervals".to_string();
        })
        .unwrap();

    backend.fail(Op::Create);
    let report = session.submit().await.unwrap();
    assert_eq!(report, SubmitReport::default());
    assert_eq!(session.state(), EditorState::Editing);
    assert!(store.cache().all::<ExerciseBlock>().is_empty());

    backend.recover(Op::Create);
    let report = session.submit().await.unwrap();
    assert!(report.persisted);
    assert_eq!(session.state(), EditorState::Succeeded);
    assert!(matches!(
        session.submit().await,
        Err(EditorError::InvalidState(EditorState::Succeeded))
    ));
}

#[tokio::test(flavor = "current_thread")]
async fn demo_mode_create_navigates_without_uploads() {
    let (store, backend, _) = store_with(StubBackend::new());
    backend.fail(Op::Create);
    let mut session = EditorSession::create(store.with_offline_demo(true).repository::<ExerciseBlock>());
    session
        .update_form(|block| {
            block.name = "Cardio".to_string();
            block.description = "Twenty minutes of intervals".to_string();
        })
        .unwrap();
    session
        .select_image(ImageFile::new("cover.png", "image/png", vec![1]))
        .await
        .unwrap();

    let report = session.submit().await.unwrap();
    assert!(!report.persisted);
    assert_eq!(report.navigate_to, Some(Route::ContentList));
    assert!(report.id.unwrap().starts_with("local-"));
    assert_eq!(backend.calls(), vec![Call::Create(ContentKind::Exercise)]);
}

#[tokio::test(flavor = "current_thread")]
async fn create_mode_uploads_held_images_after_create() {
    let (store, backend, _) = store_with(StubBackend::new());
    let mut session = EditorSession::create(store.repository::<ExerciseBlock>());
    session
        .update_form(|block| {
            block.name = "Core".to_string();
            block.description = "Planks and crunches".to_string();
        })
        .unwrap();
    let step = session.add_step().await.unwrap();
    let held = session
        .attach_step_image(&step, ImageFile::new("plank.png", "image/png", vec![1]))
        .await
        .unwrap();
    assert_eq!(held, StepImageSync::Pending);
    let selection = session
        .select_image(ImageFile::new("cover.png", "image/png", vec![2]))
        .await
        .unwrap();
    assert_eq!(selection, ImageSelection::Held);
    assert!(backend.calls().is_empty());

    let report = session.submit().await.unwrap();
    assert!(report.is_complete());
    let id = report.id.unwrap();
    let step_id = session.steps()[0].id.to_string();
    assert_eq!(
        backend.calls(),
        vec![
            Call::Create(ContentKind::Exercise),
            Call::UploadStepImage(id.clone(), step_id),
            Call::UploadImage(id.clone()),
        ]
    );
    assert!(session.draft().image_url.is_some());
    assert!(session.steps()[0].image_url.is_some());
}

#[tokio::test(flavor = "current_thread")]
async fn edit_mode_image_selection_uploads_immediately() {
    let (mut session, backend, _) = editing_block(StubBackend::new()).await;
    let selection = session
        .select_image(ImageFile::new("cover.jpg", "image/jpeg", vec![1]))
        .await
        .unwrap();
    assert!(matches!(selection, ImageSelection::Uploaded(Some(_))));
    assert_eq!(backend.calls(), vec![Call::UploadImage("b1".to_string())]);

    let cleared = session.select_image(ImageFile::empty()).await.unwrap();
    assert_eq!(cleared, ImageSelection::Cleared);
    assert_eq!(session.draft().image_url, None);
    assert_eq!(backend.calls().len(), 1);
}

#[tokio::test(flavor = "current_thread")]
async fn dropped_submit_returns_to_editing() {
    let (mut session, backend, _) = editing_block(StubBackend::new()).await;
    session
        .update_form(|block| block.name = "Evening legs".to_string())
        .unwrap();

    assert!(session.submit().now_or_never().is_none());
    assert_eq!(session.state(), EditorState::Editing);
    assert_eq!(backend.calls(), vec![Call::Update("b1".to_string())]);
}

#[tokio::test(flavor = "current_thread")]
async fn apply_document_reconciles_steps_by_id() {
    let (mut session, backend, _) = editing_block(StubBackend::new()).await;
    let mut document = seeded_block();
    document.name = "Leg day".to_string();
    document.steps.remove(0);
    document.steps[0].name = "Reverse lunge".to_string();
    document.steps.insert(
        0,
        ExerciseStep {
            name: "Jumping jacks".to_string(),
            ..ExerciseStep::placeholder(StepId::local(), &[])
        },
    );

    session.apply_document(document).await.unwrap();

    let names: Vec<&str> = session.steps().iter().map(|step| step.name.as_str()).collect();
    assert_eq!(names, vec!["Jumping jacks", "Reverse lunge"]);
    assert_eq!(session.draft().name, "Leg day");
    assert_eq!(session.draft().id.as_deref(), Some("b1"));
    assert!(!session.reconciler().is_server_known(&StepId::server("e1")));
    assert_eq!(backend.calls(), vec![Call::CreateStep("b1".to_string())]);

    let modified = session.reconciler().modified_steps();
    assert_eq!(modified.len(), 2);
    assert!(modified.contains(&StepId::server("e2")));
}

#[tokio::test(flavor = "current_thread")]
async fn kind_switch_resets_create_state_only() {
    let (store, _backend, _) = store_with(StubBackend::new());
    let mut editor = ContentEditor::create(store.clone(), ContentKind::Meal);
    editor.add_step().await.unwrap();
    editor
        .select_image(ImageFile::new("soup.png", "image/png", vec![1]))
        .await
        .unwrap();

    editor.switch_kind(ContentKind::Exercise).unwrap();
    assert_eq!(editor.kind(), ContentKind::Exercise);
    assert_eq!(editor.state(), EditorState::Empty);
    let ActiveSession::Exercise(session) = editor.session() else {
        panic!("expected an exercise session");
    };
    assert!(session.steps().is_empty());
    assert!(session.pending_image().is_none());

    store.cache().write::<ExerciseBlock, _>(|blocks| blocks.append(seeded_block()));
    let mut editing = ContentEditor::edit(store, ContentKind::Exercise, "b1").await.unwrap();
    assert_eq!(editing.switch_kind(ContentKind::Meal), Err(EditorError::KindLocked));
    assert_eq!(editing.kind(), ContentKind::Exercise);
}

#[tokio::test(flavor = "current_thread")]
async fn missing_entity_cannot_be_edited() {
    let (store, _backend, notifier) = store_with(StubBackend::new());
    let result = EditorSession::<Meal, _>::edit(store.repository(), "404").await;
    assert!(matches!(result, Err(EditorError::NotFound { .. })));
    assert_eq!(notifier.errors().len(), 1);
}

#[tokio::test(flavor = "current_thread")]
async fn expired_token_blocks_edit_page_before_any_fetch() {
    let auth = AuthContext::restore(Arc::new(MemoryCredentialStore::with_token(stale_token()))).unwrap();
    let (_store, backend, _) = store_with(StubBackend::new().with_auth(auth.clone()));

    let route = Route::parse("/edit-exercise/b1");
    assert_eq!(guard(route, &auth), RouteDecision::Redirect(Route::Login));
    assert!(backend.calls().is_empty());
}
