//! Step bookkeeping for one editor session.
//!
//! The reconciler tracks which steps the backend already knows, which of
//! those were edited since loading, the image URL of each step and images
//! still waiting for their step to exist remotely. It never owns the step
//! list itself; the editor passes its draft's steps in.
//!
//! Field edits stay local until [`StepReconciler::sync_modified`] sends them
//! as one concurrent batch. Removing a step is local too: the backend learns
//! about it from the next whole-list parent update.

use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;

use futures::future::join_all;
use thiserror::Error;

use crate::api::ContentBackend;
use crate::models::{ContentEntity, ContentKind, ContentStep, ImageFile, StepId};
use crate::notify::Notice;
use crate::repository::ContentRepository;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("No step with id {0}")]
    UnknownStep(StepId),
    #[error("{0} steps do not take images")]
    ImagesUnsupported(ContentKind),
}

/// What happened to an attached step image
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepImageSync {
    /// Uploaded right away; carries the URL the backend returned
    Uploaded(Option<String>),
    /// Held until the step exists remotely (or a retry succeeds)
    Pending,
    Cleared,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpload {
    pub step_id: StepId,
    pub file: ImageFile,
}

/// Outcome of one batched step update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub attempted: usize,
    pub succeeded: Vec<StepId>,
    pub failed: Vec<StepId>,
}

impl BatchReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepCreationReport {
    pub created: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub uploaded: usize,
    pub failed: usize,
    /// Still waiting for their step or parent to be created
    pub waiting: usize,
}

pub struct StepReconciler<E> {
    parent_id: Option<String>,
    server_steps: HashSet<StepId>,
    modified_steps: Vec<StepId>,
    step_images: HashMap<StepId, String>,
    pending_uploads: Vec<PendingUpload>,
    kind: PhantomData<fn() -> E>,
}

impl<E> std::fmt::Debug for StepReconciler<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepReconciler")
            .field("parent_id", &self.parent_id)
            .field("server_steps", &self.server_steps)
            .field("modified_steps", &self.modified_steps)
            .field("pending_uploads", &self.pending_uploads.len())
            .finish_non_exhaustive()
    }
}

impl<E: ContentEntity> Default for StepReconciler<E> {
    fn default() -> Self {
        Self::for_create()
    }
}

impl<E: ContentEntity> StepReconciler<E> {
    /// Bookkeeping for an entity that does not exist remotely yet
    #[must_use]
    pub fn for_create() -> Self {
        Self {
            parent_id: None,
            server_steps: HashSet::new(),
            modified_steps: Vec::new(),
            step_images: HashMap::new(),
            pending_uploads: Vec::new(),
            kind: PhantomData,
        }
    }

    /// Bookkeeping for a loaded entity; every loaded step is server-known.
    #[must_use]
    pub fn for_edit(parent_id: impl Into<String>, steps: &[E::Step]) -> Self {
        let mut reconciler = Self::for_create();
        reconciler.parent_id = Some(parent_id.into());
        reconciler.mark_loaded(steps);
        reconciler
    }

    pub fn mark_loaded(&mut self, steps: &[E::Step]) {
        for step in steps {
            if step.id().is_local() {
                continue;
            }
            self.server_steps.insert(step.id().clone());
            if let Some(url) = step.image_url() {
                self.step_images.insert(step.id().clone(), url.to_string());
            }
        }
    }

    #[must_use]
    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    /// Record the id the backend gave the parent on create
    pub fn set_parent_id(&mut self, id: impl Into<String>) {
        self.parent_id = Some(id.into());
    }

    #[must_use]
    pub fn is_server_known(&self, id: &StepId) -> bool {
        self.server_steps.contains(id)
    }

    #[must_use]
    pub const fn server_steps(&self) -> &HashSet<StepId> {
        &self.server_steps
    }

    /// Server-known steps edited since loading, in edit order
    #[must_use]
    pub fn modified_steps(&self) -> &[StepId] {
        &self.modified_steps
    }

    #[must_use]
    pub fn step_image(&self, id: &StepId) -> Option<&str> {
        self.step_images.get(id).map(String::as_str)
    }

    #[must_use]
    pub fn pending_uploads(&self) -> &[PendingUpload] {
        &self.pending_uploads
    }

    /// The steps the backend already knows, in list order
    #[must_use]
    pub fn server_known(&self, steps: &[E::Step]) -> Vec<E::Step> {
        steps
            .iter()
            .filter(|step| self.is_server_known(step.id()))
            .cloned()
            .collect()
    }

    /// Append a step with default fields.
    ///
    /// With a persisted parent the step is created remotely right away. If
    /// that fails it is kept under a local id and created at the next save.
    pub async fn add_step<B>(
        &mut self,
        repo: &ContentRepository<E, B>,
        steps: &mut Vec<E::Step>,
    ) -> StepId
    where
        B: ContentBackend<E>,
    {
        let placeholder = E::Step::placeholder(StepId::local(), steps);
        let Some(parent_id) = self.parent_id.clone() else {
            let id = placeholder.id().clone();
            steps.push(placeholder);
            return id;
        };

        match repo.create_step(&parent_id, &placeholder).await {
            Some(created) if !created.id().is_local() => {
                let id = created.id().clone();
                tracing::debug!(kind = %E::KIND, step = %id, "step created");
                self.server_steps.insert(id.clone());
                steps.push(created);
                id
            }
            _ => {
                let id = placeholder.id().clone();
                tracing::warn!(kind = %E::KIND, step = %id, "keeping step locally until next save");
                steps.push(placeholder);
                id
            }
        }
    }

    /// Apply a field edit locally. Returns `false` for an unknown step.
    pub fn edit_step(
        &mut self,
        steps: &mut [E::Step],
        id: &StepId,
        patch: &<E::Step as ContentStep>::Patch,
    ) -> bool {
        let Some(step) = steps.iter_mut().find(|step| step.id() == id) else {
            return false;
        };
        step.apply(patch);
        if self.server_steps.contains(id) && !self.modified_steps.contains(id) {
            self.modified_steps.push(id.clone());
        }
        true
    }

    /// Overwrite a step's fields, keeping its id and image.
    ///
    /// Counts as an edit only when something actually changed.
    pub fn replace_step(&mut self, steps: &mut [E::Step], id: &StepId, mut fields: E::Step) -> bool {
        let Some(step) = steps.iter_mut().find(|step| step.id() == id) else {
            return false;
        };
        fields.set_id(id.clone());
        fields.set_image_url(step.image_url().map(str::to_string));
        if *step == fields {
            return true;
        }
        *step = fields;
        if self.server_steps.contains(id) && !self.modified_steps.contains(id) {
            self.modified_steps.push(id.clone());
        }
        true
    }

    /// Drop a step and everything tracked for it. No network call.
    pub fn remove_step(&mut self, steps: &mut Vec<E::Step>, id: &StepId) -> bool {
        let Some(index) = steps.iter().position(|step| step.id() == id) else {
            return false;
        };
        steps.remove(index);
        self.server_steps.remove(id);
        self.modified_steps.retain(|modified| modified != id);
        self.step_images.remove(id);
        self.pending_uploads.retain(|pending| &pending.step_id != id);
        true
    }

    /// Attach, replace or clear (empty file) one step's image.
    pub async fn attach_image<B>(
        &mut self,
        repo: &ContentRepository<E, B>,
        steps: &mut [E::Step],
        id: &StepId,
        file: ImageFile,
    ) -> Result<StepImageSync, ReconcileError>
    where
        B: ContentBackend<E>,
    {
        if !E::Step::SUPPORTS_IMAGES {
            return Err(ReconcileError::ImagesUnsupported(E::KIND));
        }
        let step = steps
            .iter_mut()
            .find(|step| step.id() == id)
            .ok_or_else(|| ReconcileError::UnknownStep(id.clone()))?;
        self.pending_uploads.retain(|pending| &pending.step_id != id);

        if file.is_empty() {
            self.step_images.remove(id);
            step.set_image_url(None);
            return Ok(StepImageSync::Cleared);
        }

        let target = self
            .parent_id
            .clone()
            .zip(id.server_id().map(str::to_string))
            .filter(|_| self.server_steps.contains(id));
        let Some((parent_id, step_id)) = target else {
            self.pending_uploads.push(PendingUpload {
                step_id: id.clone(),
                file,
            });
            return Ok(StepImageSync::Pending);
        };

        let outcome = repo.upload_step_image(&parent_id, &step_id, &file).await;
        if !outcome.persisted {
            self.pending_uploads.push(PendingUpload {
                step_id: id.clone(),
                file,
            });
            return Ok(StepImageSync::Pending);
        }
        if let Some(url) = &outcome.value {
            self.step_images.insert(id.clone(), url.clone());
            step.set_image_url(Some(url.clone()));
        }
        Ok(StepImageSync::Uploaded(outcome.value))
    }

    /// Send every modified step as one concurrent batch.
    ///
    /// Succeeded ids leave `modified_steps`; failed ones stay for the next
    /// save. Any failure yields a single aggregate notice.
    pub async fn sync_modified<B>(
        &mut self,
        repo: &ContentRepository<E, B>,
        steps: &[E::Step],
    ) -> BatchReport
    where
        B: ContentBackend<E>,
    {
        let Some(parent_id) = self.parent_id.clone() else {
            return BatchReport::default();
        };
        let batch: Vec<(StepId, String, E::Step)> = self
            .modified_steps
            .iter()
            .filter_map(|id| {
                let step = steps.iter().find(|step| step.id() == id)?;
                let server_id = id.server_id()?;
                Some((id.clone(), server_id.to_string(), step.clone()))
            })
            .collect();
        if batch.is_empty() {
            return BatchReport::default();
        }

        let results = join_all(
            batch
                .iter()
                .map(|(_, server_id, step)| repo.try_update_step(&parent_id, server_id, step)),
        )
        .await;

        let mut report = BatchReport {
            attempted: batch.len(),
            ..BatchReport::default()
        };
        for ((id, _, _), result) in batch.into_iter().zip(results) {
            match result {
                Ok(_) => report.succeeded.push(id),
                Err(error) => {
                    tracing::warn!(kind = %E::KIND, step = %id, "step update failed: {error}");
                    report.failed.push(id);
                }
            }
        }
        self.modified_steps
            .retain(|id| !report.succeeded.contains(id));

        if report.is_success() {
            tracing::debug!(kind = %E::KIND, count = report.attempted, "step batch saved");
        } else {
            repo.notify(Notice::error(format!(
                "Failed to update {} of {} steps",
                report.failed.len(),
                report.attempted
            )));
        }
        report
    }

    /// Create every still-local step under the persisted parent, in order.
    pub async fn create_local_steps<B>(
        &mut self,
        repo: &ContentRepository<E, B>,
        steps: &mut [E::Step],
    ) -> StepCreationReport
    where
        B: ContentBackend<E>,
    {
        let mut report = StepCreationReport::default();
        let Some(parent_id) = self.parent_id.clone() else {
            return report;
        };
        for step in steps.iter_mut().filter(|step| step.id().is_local()) {
            match repo.create_step(&parent_id, step).await {
                Some(created) if !created.id().is_local() => {
                    let old = step.id().clone();
                    let new = created.id().clone();
                    step.set_id(new.clone());
                    self.server_steps.insert(new.clone());
                    self.rekey(&old, &new);
                    report.created += 1;
                }
                _ => report.failed += 1,
            }
        }
        report
    }

    /// Take the ids of the steps a parent create returned, matched by position.
    pub fn adopt_created_ids(&mut self, steps: &mut [E::Step], created: &[E::Step]) {
        for (step, remote) in steps.iter_mut().zip(created) {
            if remote.id().is_local() || step.id() == remote.id() {
                continue;
            }
            let old = step.id().clone();
            let new = remote.id().clone();
            step.set_id(new.clone());
            self.server_steps.insert(new.clone());
            self.rekey(&old, &new);
        }
    }

    /// Upload held step images whose step now exists remotely.
    pub async fn flush_pending<B>(
        &mut self,
        repo: &ContentRepository<E, B>,
        steps: &mut [E::Step],
    ) -> FlushReport
    where
        B: ContentBackend<E>,
    {
        let mut report = FlushReport::default();
        let pending = std::mem::take(&mut self.pending_uploads);
        let Some(parent_id) = self.parent_id.clone() else {
            report.waiting = pending.len();
            self.pending_uploads = pending;
            return report;
        };

        for upload in pending {
            let Some(step_id) = upload.step_id.server_id().map(str::to_string) else {
                report.waiting += 1;
                self.pending_uploads.push(upload);
                continue;
            };
            let outcome = repo
                .upload_step_image(&parent_id, &step_id, &upload.file)
                .await;
            if !outcome.persisted {
                report.failed += 1;
                self.pending_uploads.push(upload);
                continue;
            }
            report.uploaded += 1;
            if let Some(url) = outcome.value {
                if let Some(step) = steps.iter_mut().find(|step| *step.id() == upload.step_id) {
                    step.set_image_url(Some(url.clone()));
                }
                self.step_images.insert(upload.step_id, url);
            }
        }
        report
    }

    fn rekey(&mut self, old: &StepId, new: &StepId) {
        for pending in &mut self.pending_uploads {
            if &pending.step_id == old {
                pending.step_id = new.clone();
            }
        }
        if let Some(url) = self.step_images.remove(old) {
            self.step_images.insert(new.clone(), url);
        }
    }
}
