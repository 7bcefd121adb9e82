//! Never-throw content operations over a [`ContentBackend`].
//!
//! Every operation catches its own failure, reports it through the
//! [`Notifier`], keeps the [`SharedCache`] consistent and hands the caller a
//! safe value. [`SyncOutcome`] tells a local-only change apart from one the
//! server confirmed.

use std::marker::PhantomData;
use std::sync::Arc;

use uuid::Uuid;

use crate::api::{ApiError, ApiResult, ContentBackend};
use crate::cache::{Collection, SharedCache};
use crate::models::{ContentEntity, ContentStep, ImageFile, StepId};
use crate::notify::{Notice, Notifier};
use crate::util::unix_millis_now;

/// Result of a cache-backed write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome<T> {
    pub value: T,
    /// The session cache reflects the change
    pub applied_to_cache: bool,
    /// The backend confirmed the change
    pub persisted: bool,
}

impl<T> SyncOutcome<T> {
    pub const fn confirmed(value: T) -> Self {
        Self {
            value,
            applied_to_cache: true,
            persisted: true,
        }
    }

    pub const fn local_only(value: T) -> Self {
        Self {
            value,
            applied_to_cache: true,
            persisted: false,
        }
    }

    pub const fn failed(value: T) -> Self {
        Self {
            value,
            applied_to_cache: false,
            persisted: false,
        }
    }

    pub fn map<U>(self, map: impl FnOnce(T) -> U) -> SyncOutcome<U> {
        SyncOutcome {
            value: map(self.value),
            applied_to_cache: self.applied_to_cache,
            persisted: self.persisted,
        }
    }
}

/// Everything one console session shares: backend, cache and notifier.
pub struct ContentStore<B> {
    backend: Arc<B>,
    cache: SharedCache,
    notifier: Arc<dyn Notifier>,
    offline_demo: bool,
}

impl<B> Clone for ContentStore<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            cache: self.cache.clone(),
            notifier: Arc::clone(&self.notifier),
            offline_demo: self.offline_demo,
        }
    }
}

impl<B> ContentStore<B> {
    pub fn new(backend: Arc<B>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            backend,
            cache: SharedCache::new(),
            notifier,
            offline_demo: false,
        }
    }

    #[must_use]
    pub fn with_offline_demo(mut self, offline_demo: bool) -> Self {
        self.offline_demo = offline_demo;
        self
    }

    #[must_use]
    pub fn with_cache(mut self, cache: SharedCache) -> Self {
        self.cache = cache;
        self
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[must_use]
    pub const fn cache(&self) -> &SharedCache {
        &self.cache
    }

    #[must_use]
    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    /// Repository for one content kind over this session's shared state.
    #[must_use]
    pub fn repository<E>(&self) -> ContentRepository<E, B>
    where
        E: ContentEntity,
        B: ContentBackend<E>,
    {
        ContentRepository {
            store: self.clone(),
            kind: PhantomData,
        }
    }
}

/// The remote store adapter for one content kind.
pub struct ContentRepository<E, B> {
    store: ContentStore<B>,
    kind: PhantomData<fn() -> E>,
}

impl<E, B> Clone for ContentRepository<E, B> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            kind: PhantomData,
        }
    }
}

impl<E, B> ContentRepository<E, B>
where
    E: ContentEntity,
    B: ContentBackend<E>,
{
    #[must_use]
    pub const fn store(&self) -> &ContentStore<B> {
        &self.store
    }

    #[must_use]
    pub const fn cache(&self) -> &SharedCache {
        &self.store.cache
    }

    pub fn notify(&self, notice: Notice) {
        self.store.notifier.notify(notice);
    }

    /// Cached copy of the collection, no network
    #[must_use]
    pub fn cached(&self) -> Vec<E> {
        self.cache().all::<E>()
    }

    /// Fetch the collection and make it the cached one.
    ///
    /// On failure the stale cached collection is returned when there is one,
    /// otherwise the demo samples or nothing.
    pub async fn list(&self) -> Vec<E> {
        match self.store.backend.list().await {
            Ok(entities) => {
                tracing::debug!(kind = %E::KIND, count = entities.len(), "listed content");
                self.cache()
                    .write(|collection: &mut Collection<E>| collection.replace_all(entities.clone()));
                entities
            }
            Err(error) => {
                self.report(&format!("Failed to load {} list", E::KIND.label()), &error);
                let stale = self.cached();
                if !stale.is_empty() {
                    return stale;
                }
                if self.store.offline_demo {
                    let samples = E::samples();
                    self.cache()
                        .write(|collection: &mut Collection<E>| collection.replace_all(samples.clone()));
                    return samples;
                }
                Vec::new()
            }
        }
    }

    /// `None` when the entity is missing or the backend is unreachable.
    pub async fn get_by_id(&self, id: &str) -> Option<E> {
        match self.store.backend.get(id).await {
            Ok(entity) => {
                self.cache()
                    .write(|collection: &mut Collection<E>| collection.upsert(id, entity.clone()));
                Some(entity)
            }
            Err(error) => {
                self.report(&format!("Failed to load {} {id}", E::KIND.label()), &error);
                None
            }
        }
    }

    /// Create `draft` remotely and append the server copy to the cache once.
    ///
    /// With offline demo mode on, a failed create appends the draft under a
    /// fabricated `local-<millis>-<uuid>` id and reports it as not persisted.
    pub async fn create(&self, draft: &E) -> SyncOutcome<E> {
        match self.store.backend.create(draft).await {
            Ok(created) => {
                if let Some(id) = created.id() {
                    let id = id.to_string();
                    self.cache()
                        .write(|collection: &mut Collection<E>| collection.upsert(&id, created.clone()));
                    self.notify(Notice::success(format!("{} created", capitalized(E::KIND.label()))));
                    SyncOutcome::confirmed(created)
                } else {
                    self.report(
                        &format!("Failed to create {}", E::KIND.label()),
                        &ApiError::Decode("response did not include an id".to_string()),
                    );
                    SyncOutcome::failed(draft.clone())
                }
            }
            Err(error) => {
                self.report(&format!("Failed to create {}", E::KIND.label()), &error);
                if self.store.offline_demo && !error.is_auth() {
                    let mut fabricated = draft.clone();
                    fabricated.set_id(fabricated_id());
                    tracing::warn!(kind = %E::KIND, "keeping unsaved draft in offline demo mode");
                    self.cache()
                        .write(|collection: &mut Collection<E>| collection.append(fabricated.clone()));
                    SyncOutcome::local_only(fabricated)
                } else {
                    SyncOutcome::failed(draft.clone())
                }
            }
        }
    }

    /// Apply `entity` to the cache, then persist it.
    ///
    /// The local edit stays cached when the backend rejects it.
    pub async fn update(&self, id: &str, entity: &E) -> SyncOutcome<E> {
        let mut local = entity.clone();
        local.set_id(id.to_string());
        let applied = self
            .cache()
            .write(|collection: &mut Collection<E>| collection.replace(id, local.clone()));

        match self.store.backend.update(id, &local).await {
            Ok(mut saved) => {
                if saved.id().is_none() {
                    saved.set_id(id.to_string());
                }
                self.cache()
                    .write(|collection: &mut Collection<E>| collection.upsert(id, saved.clone()));
                self.notify(Notice::success(format!("{} updated", capitalized(E::KIND.label()))));
                SyncOutcome::confirmed(saved)
            }
            Err(error) => {
                self.report(&format!("Failed to update {} {id}", E::KIND.label()), &error);
                SyncOutcome {
                    value: local,
                    applied_to_cache: applied,
                    persisted: false,
                }
            }
        }
    }

    /// Delete remotely; the cache entry is dropped whatever the outcome.
    pub async fn delete(&self, id: &str) -> SyncOutcome<()> {
        let result = self.store.backend.delete(id).await;
        let removed = self
            .cache()
            .write(|collection: &mut Collection<E>| collection.remove(id))
            .is_some();
        let persisted = match result {
            Ok(()) => {
                self.notify(Notice::success(format!("{} deleted", capitalized(E::KIND.label()))));
                true
            }
            Err(error) => {
                self.report(&format!("Failed to delete {} {id}", E::KIND.label()), &error);
                false
            }
        };
        SyncOutcome {
            value: (),
            applied_to_cache: removed,
            persisted,
        }
    }

    /// Upload the main image, or clear it when `file` is empty.
    ///
    /// Clearing is local only; the backend sees it with the next update.
    pub async fn upload_image(&self, id: &str, file: &ImageFile) -> SyncOutcome<Option<String>> {
        if file.is_empty() {
            let applied = self
                .cache()
                .write(|collection: &mut Collection<E>| collection.patch(id, |entity| entity.set_image_url(None)));
            return SyncOutcome {
                value: None,
                applied_to_cache: applied,
                persisted: false,
            };
        }

        match self.store.backend.upload_image(id, file).await {
            Ok(url) => {
                let applied = url.as_ref().is_some_and(|url| {
                    self.cache().write(|collection: &mut Collection<E>| {
                        collection.patch(id, |entity| entity.set_image_url(Some(url.clone())))
                    })
                });
                self.notify(Notice::success("Image uploaded"));
                SyncOutcome {
                    value: url,
                    applied_to_cache: applied,
                    persisted: true,
                }
            }
            Err(error) => {
                self.report(&format!("Failed to upload image for {} {id}", E::KIND.label()), &error);
                SyncOutcome::failed(None)
            }
        }
    }

    /// Create one step under a persisted parent.
    pub async fn create_step(&self, parent_id: &str, step: &E::Step) -> Option<E::Step> {
        match self.try_create_step(parent_id, step).await {
            Ok(created) => Some(created),
            Err(error) => {
                self.report("Failed to add step", &error);
                None
            }
        }
    }

    /// Persist one step's fields. Returns whether the backend accepted them.
    pub async fn update_step(&self, parent_id: &str, step_id: &str, step: &E::Step) -> bool {
        match self.try_update_step(parent_id, step_id, step).await {
            Ok(_) => true,
            Err(error) => {
                self.report(&format!("Failed to update step {step_id}"), &error);
                false
            }
        }
    }

    /// Upload one step's image. `persisted` is `false` on failure.
    pub async fn upload_step_image(
        &self,
        parent_id: &str,
        step_id: &str,
        file: &ImageFile,
    ) -> SyncOutcome<Option<String>> {
        match self.store.backend.upload_step_image(parent_id, step_id, file).await {
            Ok(url) => {
                let applied = url.as_ref().is_some_and(|url| {
                    self.cache().write(|collection: &mut Collection<E>| {
                        collection.patch_step(parent_id, &StepId::server(step_id), |step| {
                            step.set_image_url(Some(url.clone()));
                        })
                    })
                });
                SyncOutcome {
                    value: url,
                    applied_to_cache: applied,
                    persisted: true,
                }
            }
            Err(error) => {
                self.report(&format!("Failed to upload image for step {step_id}"), &error);
                SyncOutcome::failed(None)
            }
        }
    }

    pub(crate) async fn try_create_step(
        &self,
        parent_id: &str,
        step: &E::Step,
    ) -> ApiResult<E::Step> {
        let created = self.store.backend.create_step(parent_id, step).await?;
        self.cache().write(|collection: &mut Collection<E>| {
            collection.patch(parent_id, |entity| entity.steps_mut().push(created.clone()))
        });
        Ok(created)
    }

    /// Step update without a notice; batch callers report in aggregate.
    pub(crate) async fn try_update_step(
        &self,
        parent_id: &str,
        step_id: &str,
        step: &E::Step,
    ) -> ApiResult<E::Step> {
        let saved = self
            .store
            .backend
            .update_step(parent_id, step_id, step)
            .await?;
        let cached = step.clone();
        self.cache().write(|collection: &mut Collection<E>| {
            collection.patch_step(parent_id, &StepId::server(step_id), |slot| *slot = cached)
        });
        Ok(saved)
    }

    fn report(&self, context: &str, error: &ApiError) {
        tracing::warn!(kind = %E::KIND, "{context}: {error}");
        self.notify(Notice::error(format!("{context}: {error}")));
    }
}

fn capitalized(label: &str) -> String {
    let mut chars = label.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Unique even for drafts fabricated within the same millisecond.
fn fabricated_id() -> String {
    format!("local-{}-{}", unix_millis_now(), Uuid::now_v7().simple())
}
