//! In-memory collections of the content the console has seen this session.
//!
//! Membership is "believed server state plus unsynced local edits". Every
//! mutation is synchronous and immediately visible to every holder of the
//! [`SharedCache`].

use std::sync::{Arc, Mutex, PoisonError};

use crate::models::{ContentEntity, ContentStep, ExerciseBlock, Meal, StepId};

/// Insertion-ordered entities of one kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<E> {
    items: Vec<E>,
}

impl<E> Default for Collection<E> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<E: ContentEntity> Collection<E> {
    #[must_use]
    pub fn all(&self) -> &[E] {
        &self.items
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&E> {
        self.items.iter().find(|item| item.id() == Some(id))
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn append(&mut self, entity: E) {
        self.items.push(entity);
    }

    /// Replace the entity with `id` in place. Returns `false` when absent.
    pub fn replace(&mut self, id: &str, entity: E) -> bool {
        match self.items.iter_mut().find(|item| item.id() == Some(id)) {
            Some(slot) => {
                *slot = entity;
                true
            }
            None => false,
        }
    }

    /// Replace in place, or append when the id is not cached yet.
    pub fn upsert(&mut self, id: &str, entity: E) {
        if !self.replace(id, entity.clone()) {
            self.append(entity);
        }
    }

    pub fn replace_all(&mut self, entities: Vec<E>) {
        self.items = entities;
    }

    pub fn remove(&mut self, id: &str) -> Option<E> {
        let index = self.items.iter().position(|item| item.id() == Some(id))?;
        Some(self.items.remove(index))
    }

    /// Mutate one entity in place. Returns `false` when absent.
    pub fn patch(&mut self, id: &str, edit: impl FnOnce(&mut E)) -> bool {
        match self.items.iter_mut().find(|item| item.id() == Some(id)) {
            Some(entity) => {
                edit(entity);
                true
            }
            None => false,
        }
    }

    /// Mutate one step of one entity in place.
    pub fn patch_step(
        &mut self,
        id: &str,
        step_id: &StepId,
        edit: impl FnOnce(&mut E::Step),
    ) -> bool {
        let mut found = false;
        self.patch(id, |entity| {
            if let Some(step) = entity
                .steps_mut()
                .iter_mut()
                .find(|step| step.id() == step_id)
            {
                edit(step);
                found = true;
            }
        });
        found
    }
}

/// Both content collections
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionCache {
    pub exercises: Collection<ExerciseBlock>,
    pub meals: Collection<Meal>,
}

/// Handle to the session's [`CollectionCache`].
///
/// Access goes through closures so the lock is never held across an await.
#[derive(Debug, Clone, Default)]
pub struct SharedCache {
    inner: Arc<Mutex<CollectionCache>>,
}

impl SharedCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read<E: ContentEntity, R>(&self, read: impl FnOnce(&Collection<E>) -> R) -> R {
        let guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        read(E::collection(&guard))
    }

    pub fn write<E: ContentEntity, R>(&self, write: impl FnOnce(&mut Collection<E>) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        write(E::collection_mut(&mut guard))
    }

    #[must_use]
    pub fn all<E: ContentEntity>(&self) -> Vec<E> {
        self.read(|collection: &Collection<E>| collection.all().to_vec())
    }

    #[must_use]
    pub fn get<E: ContentEntity>(&self, id: &str) -> Option<E> {
        self.read(|collection: &Collection<E>| collection.get(id).cloned())
    }

    /// Copy of both collections
    #[must_use]
    pub fn snapshot(&self) -> CollectionCache {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
