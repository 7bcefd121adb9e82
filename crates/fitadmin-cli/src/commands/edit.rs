use fitadmin_core::api::ContentBackend;
use fitadmin_core::editor::{ActiveSession, ContentEditor, EditorSession, SubmitReport};
use fitadmin_core::models::ContentEntity;
use fitadmin_core::routes::Route;
use fitadmin_core::ContentKind;

use crate::cli::DocumentArgs;
use crate::commands::common::{
    fill_and_submit, finish_submit, normalize_identifier, parse_document, render_document,
    resolve_document, Console,
};
use crate::error::CliError;

pub async fn run_edit(
    console: &Console,
    kind: ContentKind,
    id: &str,
    input: &DocumentArgs,
    clear_image: bool,
) -> Result<(), CliError> {
    let id = normalize_identifier(id)?;
    console.enter(Route::EditContent {
        kind,
        id: id.clone(),
    })?;
    let mut editor = ContentEditor::edit(console.store()?, kind, &id).await?;

    let report = match editor.session_mut() {
        ActiveSession::Exercise(session) => edit_with(session, input, clear_image).await?,
        ActiveSession::Meal(session) => edit_with(session, input, clear_image).await?,
    };

    match report {
        Some(report) => finish_submit(kind, &report),
        None => {
            println!("{id} (no changes)");
            Ok(())
        }
    }
}

/// `None` when the document came back from the editor untouched.
async fn edit_with<E, B>(
    session: &mut EditorSession<E, B>,
    input: &DocumentArgs,
    clear_image: bool,
) -> Result<Option<SubmitReport>, CliError>
where
    E: ContentEntity,
    B: ContentBackend<E>,
{
    let touches_images = clear_image || input.image.is_some() || !input.step_images.is_empty();

    let document = if input.file.is_none() && touches_images {
        None
    } else {
        let current = render_document(session.draft())?;
        let raw = resolve_document(input.file.as_deref(), &current)?;
        if raw == current.trim() && !touches_images {
            return Ok(None);
        }
        Some(parse_document::<E>(&raw)?)
    };

    Ok(Some(
        fill_and_submit(session, document, input, clear_image).await?,
    ))
}
