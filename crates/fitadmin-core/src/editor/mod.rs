//! Create/edit workflow for one content entity.
//!
//! An [`EditorSession`] owns the draft entity and its [`StepReconciler`].
//! Create mode submits the whole entity in one `create` call; edit mode
//! runs four independent stages (parent update, new steps, step batch,
//! pending images) and never rolls a completed stage back.

mod switcher;

use std::fmt;
use std::mem;

use thiserror::Error;

use crate::api::ContentBackend;
use crate::models::{ContentEntity, ContentKind, ContentStep, ImageFile, StepId};
use crate::reconcile::{BatchReport, ReconcileError, StepImageSync, StepReconciler};
use crate::repository::{ContentRepository, SyncOutcome};
use crate::routes::Route;
use crate::validation::ValidationErrors;

pub use switcher::{ActiveSession, ContentEditor};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorMode {
    Create,
    Edit { id: String },
}

impl EditorMode {
    #[must_use]
    pub const fn is_edit(&self) -> bool {
        matches!(self, Self::Edit { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    Uninitialized,
    /// Fresh create-mode form
    Empty,
    Loading,
    /// Edit-mode form filled from the loaded entity
    Populated,
    Editing,
    Submitting,
    Succeeded,
}

impl EditorState {
    const fn accepts_edits(self) -> bool {
        matches!(self, Self::Empty | Self::Populated | Self::Editing)
    }
}

impl fmt::Display for EditorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Empty => "empty",
            Self::Loading => "loading",
            Self::Populated => "populated",
            Self::Editing => "editing",
            Self::Submitting => "submitting",
            Self::Succeeded => "succeeded",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    #[error("Please fix the highlighted fields: {0}")]
    Invalid(#[from] ValidationErrors),
    #[error("{kind} {id} could not be loaded")]
    NotFound { kind: ContentKind, id: String },
    #[error("Editor cannot do that while {0}")]
    InvalidState(EditorState),
    #[error(transparent)]
    Step(#[from] ReconcileError),
    #[error("The content kind cannot change while editing an existing entry")]
    KindLocked,
}

/// What a main-image selection did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSelection {
    /// Create mode: uploaded once the entity exists
    Held,
    Uploaded(Option<String>),
    Cleared,
    Failed,
}

/// Result of one save
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitReport {
    pub id: Option<String>,
    /// The backend confirmed the parent create or update
    pub persisted: bool,
    pub steps_created: usize,
    pub step_create_failures: usize,
    pub step_updates: BatchReport,
    pub upload_failures: usize,
    /// Set when the save finished and the console should leave the editor
    pub navigate_to: Option<Route>,
}

impl SubmitReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.persisted
            && self.step_create_failures == 0
            && self.step_updates.is_success()
            && self.upload_failures == 0
    }
}

pub struct EditorSession<E, B> {
    repo: ContentRepository<E, B>,
    mode: EditorMode,
    state: EditorState,
    draft: E,
    reconciler: StepReconciler<E>,
    pending_image: Option<ImageFile>,
}

impl<E, B> EditorSession<E, B>
where
    E: ContentEntity,
    B: ContentBackend<E>,
{
    #[must_use]
    pub fn new(repo: ContentRepository<E, B>) -> Self {
        Self {
            repo,
            mode: EditorMode::Create,
            state: EditorState::Uninitialized,
            draft: E::default(),
            reconciler: StepReconciler::for_create(),
            pending_image: None,
        }
    }

    /// A session with an empty create-mode form
    #[must_use]
    pub fn create(repo: ContentRepository<E, B>) -> Self {
        let mut session = Self::new(repo);
        session.start_create();
        session
    }

    /// A session editing entity `id`
    pub async fn edit(repo: ContentRepository<E, B>, id: &str) -> Result<Self, EditorError> {
        let mut session = Self::new(repo);
        session.start_edit(id).await?;
        Ok(session)
    }

    /// Reset to an empty form with no steps
    pub fn start_create(&mut self) {
        self.mode = EditorMode::Create;
        self.draft = E::default();
        self.reconciler = StepReconciler::for_create();
        self.pending_image = None;
        self.state = EditorState::Empty;
    }

    /// Load `id` from the cache, or from the backend when it is not cached.
    pub async fn start_edit(&mut self, id: &str) -> Result<(), EditorError> {
        self.state = EditorState::Loading;
        let cached = self.repo.cache().get::<E>(id);
        let loaded = match cached {
            Some(entity) => Some(entity),
            None => self.repo.get_by_id(id).await,
        };
        let Some(mut entity) = loaded else {
            self.state = EditorState::Uninitialized;
            return Err(EditorError::NotFound {
                kind: E::KIND,
                id: id.to_string(),
            });
        };
        entity.set_id(id.to_string());
        self.reconciler = StepReconciler::for_edit(id, entity.steps());
        self.draft = entity;
        self.mode = EditorMode::Edit { id: id.to_string() };
        self.pending_image = None;
        self.state = EditorState::Populated;
        tracing::debug!(kind = %E::KIND, id, "editor populated");
        Ok(())
    }

    #[must_use]
    pub const fn mode(&self) -> &EditorMode {
        &self.mode
    }

    #[must_use]
    pub const fn state(&self) -> EditorState {
        self.state
    }

    #[must_use]
    pub const fn draft(&self) -> &E {
        &self.draft
    }

    #[must_use]
    pub fn steps(&self) -> &[E::Step] {
        self.draft.steps()
    }

    #[must_use]
    pub const fn reconciler(&self) -> &StepReconciler<E> {
        &self.reconciler
    }

    #[must_use]
    pub const fn repository(&self) -> &ContentRepository<E, B> {
        &self.repo
    }

    /// Main image waiting for the entity to be created
    #[must_use]
    pub const fn pending_image(&self) -> Option<&ImageFile> {
        self.pending_image.as_ref()
    }

    /// Check the form without submitting
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        self.draft.validate()
    }

    /// Edit the form fields. Id and steps are kept; steps change through
    /// the step operations.
    pub fn update_form(&mut self, edit: impl FnOnce(&mut E)) -> Result<(), EditorError> {
        self.begin_edit()?;
        let steps = mem::take(self.draft.steps_mut());
        let id = self.draft.id().map(str::to_string);
        edit(&mut self.draft);
        *self.draft.steps_mut() = steps;
        match id {
            Some(id) => self.draft.set_id(id),
            None => self.draft.clear_id(),
        }
        Ok(())
    }

    pub async fn add_step(&mut self) -> Result<StepId, EditorError> {
        self.begin_edit()?;
        Ok(self
            .reconciler
            .add_step(&self.repo, self.draft.steps_mut())
            .await)
    }

    pub fn edit_step(
        &mut self,
        id: &StepId,
        patch: &<E::Step as ContentStep>::Patch,
    ) -> Result<(), EditorError> {
        self.begin_edit()?;
        if self.reconciler.edit_step(self.draft.steps_mut(), id, patch) {
            Ok(())
        } else {
            Err(ReconcileError::UnknownStep(id.clone()).into())
        }
    }

    pub fn remove_step(&mut self, id: &StepId) -> Result<(), EditorError> {
        self.begin_edit()?;
        if self.reconciler.remove_step(self.draft.steps_mut(), id) {
            Ok(())
        } else {
            Err(ReconcileError::UnknownStep(id.clone()).into())
        }
    }

    pub async fn attach_step_image(
        &mut self,
        id: &StepId,
        file: ImageFile,
    ) -> Result<StepImageSync, EditorError> {
        self.begin_edit()?;
        Ok(self
            .reconciler
            .attach_image(&self.repo, self.draft.steps_mut(), id, file)
            .await?)
    }

    /// Choose (or clear, with an empty file) the main image.
    ///
    /// Edit mode uploads right away; create mode holds the file until the
    /// entity exists.
    pub async fn select_image(&mut self, file: ImageFile) -> Result<ImageSelection, EditorError> {
        self.begin_edit()?;
        let EditorMode::Edit { id } = &self.mode else {
            if file.is_empty() {
                self.pending_image = None;
                self.draft.set_image_url(None);
                return Ok(ImageSelection::Cleared);
            }
            self.pending_image = Some(file);
            return Ok(ImageSelection::Held);
        };

        let outcome = self.repo.upload_image(id, &file).await;
        Ok(if file.is_empty() {
            self.draft.set_image_url(None);
            ImageSelection::Cleared
        } else if outcome.persisted {
            if outcome.value.is_some() {
                self.draft.set_image_url(outcome.value.clone());
            }
            ImageSelection::Uploaded(outcome.value)
        } else {
            ImageSelection::Failed
        })
    }

    /// Replace the whole form with `document`, steps included.
    ///
    /// Steps are matched by id: known ones are overwritten, missing ones
    /// removed and the rest added, ending in the document's order.
    pub async fn apply_document(&mut self, mut document: E) -> Result<(), EditorError> {
        let incoming = mem::take(document.steps_mut());
        self.update_form(|draft| *draft = document)?;

        let keep: Vec<StepId> = self
            .draft
            .steps()
            .iter()
            .map(|step| step.id().clone())
            .filter(|id| incoming.iter().any(|step| step.id() == id))
            .collect();
        let dropped: Vec<StepId> = self
            .draft
            .steps()
            .iter()
            .map(|step| step.id().clone())
            .filter(|id| !keep.contains(id))
            .collect();
        for id in &dropped {
            self.reconciler.remove_step(self.draft.steps_mut(), id);
        }

        let mut order = Vec::with_capacity(incoming.len());
        for step in incoming {
            let id = if keep.contains(step.id()) {
                step.id().clone()
            } else {
                self.reconciler
                    .add_step(&self.repo, self.draft.steps_mut())
                    .await
            };
            self.reconciler
                .replace_step(self.draft.steps_mut(), &id, step);
            order.push(id);
        }
        self.draft.steps_mut().sort_by_key(|step| {
            order
                .iter()
                .position(|id| id == step.id())
                .unwrap_or(usize::MAX)
        });
        Ok(())
    }

    /// Validate and save.
    ///
    /// Validation errors come back before any request. Network failures are
    /// reported through the notifier and summarised in the report; the
    /// session returns to `Editing` unless the save finished.
    pub async fn submit(&mut self) -> Result<SubmitReport, EditorError> {
        if !self.state.accepts_edits() {
            return Err(EditorError::InvalidState(self.state));
        }
        self.draft.validate()?;

        let Self {
            repo,
            mode,
            state,
            draft,
            reconciler,
            pending_image,
        } = self;
        let mut guard = SubmitGuard::enter(state);
        let report = match mode {
            EditorMode::Create => submit_create(repo, draft, reconciler, pending_image).await,
            EditorMode::Edit { id } => submit_edit(repo, id, draft, reconciler).await,
        };
        guard.finish(if report.navigate_to.is_some() {
            EditorState::Succeeded
        } else {
            EditorState::Editing
        });
        Ok(report)
    }

    fn begin_edit(&mut self) -> Result<(), EditorError> {
        if !self.state.accepts_edits() {
            return Err(EditorError::InvalidState(self.state));
        }
        self.state = EditorState::Editing;
        Ok(())
    }
}

/// Holds `Submitting` for the duration of a save and puts the session
/// back into `Editing` if the save future is dropped part way.
struct SubmitGuard<'a> {
    state: &'a mut EditorState,
    outcome: Option<EditorState>,
}

impl<'a> SubmitGuard<'a> {
    fn enter(state: &'a mut EditorState) -> Self {
        *state = EditorState::Submitting;
        Self {
            state,
            outcome: None,
        }
    }

    fn finish(&mut self, outcome: EditorState) {
        self.outcome = Some(outcome);
    }
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        *self.state = self.outcome.unwrap_or(EditorState::Editing);
    }
}

async fn submit_create<E, B>(
    repo: &ContentRepository<E, B>,
    draft: &mut E,
    reconciler: &mut StepReconciler<E>,
    pending_image: &mut Option<ImageFile>,
) -> SubmitReport
where
    E: ContentEntity,
    B: ContentBackend<E>,
{
    let outcome = repo.create(draft).await;
    if !outcome.applied_to_cache {
        return SubmitReport::default();
    }
    let SyncOutcome {
        value: created,
        persisted,
        ..
    } = outcome;
    let mut report = SubmitReport {
        id: created.id().map(str::to_string),
        persisted,
        navigate_to: Some(Route::ContentList),
        ..SubmitReport::default()
    };
    let Some(id) = created.id().map(str::to_string) else {
        return report;
    };
    draft.set_id(id.clone());
    if !persisted {
        tracing::warn!(kind = %E::KIND, %id, "draft kept locally, skipping uploads");
        return report;
    }

    reconciler.set_parent_id(id.as_str());
    reconciler.adopt_created_ids(draft.steps_mut(), created.steps());
    report.steps_created = created.steps().len();

    let flush = reconciler.flush_pending(repo, draft.steps_mut()).await;
    report.upload_failures += flush.failed + flush.waiting;

    if let Some(file) = pending_image.take() {
        let upload = repo.upload_image(&id, &file).await;
        if upload.persisted {
            if upload.value.is_some() {
                draft.set_image_url(upload.value);
            }
        } else {
            report.upload_failures += 1;
        }
    }
    report
}

async fn submit_edit<E, B>(
    repo: &ContentRepository<E, B>,
    id: &str,
    draft: &mut E,
    reconciler: &mut StepReconciler<E>,
) -> SubmitReport
where
    E: ContentEntity,
    B: ContentBackend<E>,
{
    let mut parent = draft.clone();
    *parent.steps_mut() = reconciler.server_known(draft.steps());
    let updated = repo.update(id, &parent).await;

    let created = reconciler.create_local_steps(repo, draft.steps_mut()).await;
    let step_updates = reconciler.sync_modified(repo, draft.steps()).await;
    let flush = reconciler.flush_pending(repo, draft.steps_mut()).await;

    let mut report = SubmitReport {
        id: Some(id.to_string()),
        persisted: updated.persisted,
        steps_created: created.created,
        step_create_failures: created.failed,
        step_updates,
        upload_failures: flush.failed + flush.waiting,
        navigate_to: None,
    };
    if report.is_complete() {
        report.navigate_to = Some(Route::ContentList);
    } else {
        tracing::warn!(kind = %E::KIND, id, "save finished with failures");
    }
    report
}

#[cfg(test)]
mod tests;
