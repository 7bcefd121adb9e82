//! Behaviour shared by both content kinds and their steps.
//!
//! The adapter, cache, reconciler and editor are written once against these
//! traits; `ExerciseBlock` and `Meal` provide the per-kind field tables.

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::{Collection, CollectionCache};
use crate::models::{ContentKind, StepId};
use crate::validation::ValidationErrors;

/// A top-level content entity with an ordered list of steps
pub trait ContentEntity:
    Clone + Debug + Default + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    type Step: ContentStep;
    /// Backend JSON shape
    type Wire: Serialize + DeserializeOwned + Debug + Send;

    const KIND: ContentKind;

    /// Server-assigned id, `None` until the entity has been persisted
    fn id(&self) -> Option<&str>;
    fn set_id(&mut self, id: String);
    fn clear_id(&mut self);

    /// Display name
    fn name(&self) -> &str;

    fn image_url(&self) -> Option<&str>;
    fn set_image_url(&mut self, url: Option<String>);

    fn steps(&self) -> &[Self::Step];
    fn steps_mut(&mut self) -> &mut Vec<Self::Step>;

    fn to_wire(&self) -> Self::Wire;
    fn from_wire(wire: Self::Wire) -> Self;

    /// Field name the backend uses for this kind's image URL
    fn wire_image_field() -> &'static str;

    /// Form schema check run before any submission
    fn validate(&self) -> Result<(), ValidationErrors>;

    /// This kind's slot in the session cache
    fn collection(cache: &CollectionCache) -> &Collection<Self>;
    fn collection_mut(cache: &mut CollectionCache) -> &mut Collection<Self>;

    /// Entities shown when the backend is unreachable in offline demo mode
    fn samples() -> Vec<Self>;
}

/// A step owned by exactly one content entity
pub trait ContentStep:
    Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Partial field edit applied by the editor
    type Patch: Clone + Debug + Default + Serialize + DeserializeOwned + Send + Sync;
    type Wire: Serialize + DeserializeOwned + Debug + Send;

    const SUPPORTS_IMAGES: bool;

    fn id(&self) -> &StepId;
    fn set_id(&mut self, id: StepId);

    /// A new step with default field values, placed after `siblings`
    fn placeholder(id: StepId, siblings: &[Self]) -> Self;

    fn apply(&mut self, patch: &Self::Patch);

    fn image_url(&self) -> Option<&str> {
        None
    }

    fn set_image_url(&mut self, _url: Option<String>) {}

    fn to_wire(&self) -> Self::Wire;
    fn from_wire(wire: Self::Wire) -> Self;
}
