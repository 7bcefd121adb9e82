use fitadmin_core::api::ContentBackend;
use fitadmin_core::editor::{ActiveSession, ContentEditor, EditorSession, SubmitReport};
use fitadmin_core::models::{ContentEntity, ContentStep, StepId};
use fitadmin_core::routes::Route;
use fitadmin_core::ContentKind;

use crate::cli::DocumentArgs;
use crate::commands::common::{
    fill_and_submit, finish_submit, parse_document, render_document, resolve_document, Console,
};
use crate::error::CliError;

pub async fn run_create(
    console: &Console,
    kind: ContentKind,
    input: &DocumentArgs,
) -> Result<(), CliError> {
    console.enter(Route::CreateContent { kind: Some(kind) })?;
    let mut editor = ContentEditor::create(console.store()?, kind);

    let report = match editor.session_mut() {
        ActiveSession::Exercise(session) => create_with(session, input).await?,
        ActiveSession::Meal(session) => create_with(session, input).await?,
    };
    finish_submit(kind, &report)
}

async fn create_with<E, B>(
    session: &mut EditorSession<E, B>,
    input: &DocumentArgs,
) -> Result<SubmitReport, CliError>
where
    E: ContentEntity,
    B: ContentBackend<E>,
{
    let template = render_document(&document_template::<E>())?;
    let raw = resolve_document(input.file.as_deref(), &template)?;
    let document = parse_document::<E>(&raw)?;
    fill_and_submit(session, Some(document), input, false).await
}

/// Empty form with one blank step, the starting point in `$EDITOR`.
pub fn document_template<E: ContentEntity>() -> E {
    let mut template = E::default();
    let step = E::Step::placeholder(StepId::local(), template.steps());
    template.steps_mut().push(step);
    template
}
