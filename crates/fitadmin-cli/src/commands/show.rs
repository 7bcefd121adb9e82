use fitadmin_core::api::HttpContentBackend;
use fitadmin_core::models::ContentEntity;
use fitadmin_core::routes::Route;
use fitadmin_core::{ContentKind, ContentRepository, ExerciseBlock, Meal};

use crate::commands::common::{normalize_identifier, render_document, Console};
use crate::error::CliError;

pub async fn run_show(console: &Console, kind: ContentKind, id: &str) -> Result<(), CliError> {
    let id = normalize_identifier(id)?;
    console.enter(Route::EditContent {
        kind,
        id: id.clone(),
    })?;
    let store = console.store()?;

    let document = match kind {
        ContentKind::Exercise => render_entity(&store.repository::<ExerciseBlock>(), &id).await?,
        ContentKind::Meal => render_entity(&store.repository::<Meal>(), &id).await?,
    };
    println!("{document}");
    Ok(())
}

async fn render_entity<E: ContentEntity>(
    repo: &ContentRepository<E, HttpContentBackend>,
    id: &str,
) -> Result<String, CliError> {
    let entity = repo.get_by_id(id).await.ok_or_else(|| CliError::NotFound {
        kind: E::KIND,
        id: id.to_string(),
    })?;
    render_document(&entity)
}
