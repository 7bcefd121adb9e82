use fitadmin_core::listing::delete_content;
use fitadmin_core::routes::Route;
use fitadmin_core::ContentKind;

use crate::commands::common::{normalize_identifier, Console};
use crate::error::CliError;

pub async fn run_delete(console: &Console, kind: ContentKind, id: &str) -> Result<(), CliError> {
    let id = normalize_identifier(id)?;
    console.enter(Route::ContentList)?;
    let store = console.store()?;

    let outcome = delete_content(&store, kind, &id).await;
    if !outcome.persisted {
        return Err(CliError::Incomplete(format!(
            "Failed to delete {} {id}",
            kind.label()
        )));
    }
    println!("{id}");
    Ok(())
}
