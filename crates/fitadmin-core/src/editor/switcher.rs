//! One editor that can hold either content kind.

use super::{EditorError, EditorMode, EditorSession, EditorState, ImageSelection, SubmitReport};
use crate::api::ContentBackend;
use crate::models::{ContentKind, ExerciseBlock, ImageFile, Meal, StepId};
use crate::reconcile::StepImageSync;
use crate::repository::ContentStore;
use crate::validation::ValidationErrors;

pub enum ActiveSession<B> {
    Exercise(EditorSession<ExerciseBlock, B>),
    Meal(EditorSession<Meal, B>),
}

/// The add/edit page: a session of the selected kind over one store.
///
/// In create mode the kind can be switched, which starts over with a fresh
/// session. An edit session is tied to its entity's kind.
pub struct ContentEditor<B> {
    store: ContentStore<B>,
    session: ActiveSession<B>,
}

macro_rules! with_session {
    ($session:expr, $inner:ident => $body:expr) => {
        match $session {
            ActiveSession::Exercise($inner) => $body,
            ActiveSession::Meal($inner) => $body,
        }
    };
}

impl<B> ContentEditor<B>
where
    B: ContentBackend<ExerciseBlock> + ContentBackend<Meal>,
{
    #[must_use]
    pub fn create(store: ContentStore<B>, kind: ContentKind) -> Self {
        let session = fresh_session(&store, kind);
        Self { store, session }
    }

    pub async fn edit(store: ContentStore<B>, kind: ContentKind, id: &str) -> Result<Self, EditorError> {
        let session = match kind {
            ContentKind::Exercise => {
                ActiveSession::Exercise(EditorSession::edit(store.repository(), id).await?)
            }
            ContentKind::Meal => ActiveSession::Meal(EditorSession::edit(store.repository(), id).await?),
        };
        Ok(Self { store, session })
    }

    #[must_use]
    pub const fn kind(&self) -> ContentKind {
        match self.session {
            ActiveSession::Exercise(_) => ContentKind::Exercise,
            ActiveSession::Meal(_) => ContentKind::Meal,
        }
    }

    #[must_use]
    pub fn mode(&self) -> &EditorMode {
        with_session!(&self.session, session => session.mode())
    }

    #[must_use]
    pub fn state(&self) -> EditorState {
        with_session!(&self.session, session => session.state())
    }

    #[must_use]
    pub const fn session(&self) -> &ActiveSession<B> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut ActiveSession<B> {
        &mut self.session
    }

    /// Select another kind in create mode, dropping the form, steps and
    /// images entered so far.
    pub fn switch_kind(&mut self, kind: ContentKind) -> Result<(), EditorError> {
        if self.mode().is_edit() {
            return Err(EditorError::KindLocked);
        }
        if kind != self.kind() {
            tracing::debug!(from = %self.kind(), to = %kind, "switching editor kind");
            self.session = fresh_session(&self.store, kind);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        with_session!(&self.session, session => session.validate())
    }

    pub async fn add_step(&mut self) -> Result<StepId, EditorError> {
        with_session!(&mut self.session, session => session.add_step().await)
    }

    pub fn remove_step(&mut self, id: &StepId) -> Result<(), EditorError> {
        with_session!(&mut self.session, session => session.remove_step(id))
    }

    pub async fn attach_step_image(
        &mut self,
        id: &StepId,
        file: ImageFile,
    ) -> Result<StepImageSync, EditorError> {
        with_session!(&mut self.session, session => session.attach_step_image(id, file).await)
    }

    pub async fn select_image(&mut self, file: ImageFile) -> Result<ImageSelection, EditorError> {
        with_session!(&mut self.session, session => session.select_image(file).await)
    }

    pub async fn submit(&mut self) -> Result<SubmitReport, EditorError> {
        with_session!(&mut self.session, session => session.submit().await)
    }
}

fn fresh_session<B>(store: &ContentStore<B>, kind: ContentKind) -> ActiveSession<B>
where
    B: ContentBackend<ExerciseBlock> + ContentBackend<Meal>,
{
    match kind {
        ContentKind::Exercise => ActiveSession::Exercise(EditorSession::create(store.repository())),
        ContentKind::Meal => ActiveSession::Meal(EditorSession::create(store.repository())),
    }
}
