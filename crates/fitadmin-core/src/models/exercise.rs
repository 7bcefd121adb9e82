//! Exercise block model

use serde::{Deserialize, Serialize};

use crate::cache::{Collection, CollectionCache};
use crate::models::{ContentEntity, ContentKind, ContentStep, StepId};
use crate::validation::ValidationErrors;
use crate::wire::{self, ExerciseBlockWire, ExerciseStepWire};

/// Duration label given to freshly added exercise steps
pub const DEFAULT_STEP_DURATION: &str = "5 - 10 daqiqa";

/// Default block duration in minutes
pub const DEFAULT_BLOCK_DURATION: u32 = 40;

/// A workout block made of ordered exercise steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExerciseBlock {
    pub id: Option<String>,
    pub name: String,
    pub description: String,
    pub video_url: Option<String>,
    pub image_url: Option<String>,
    /// Total duration in minutes
    pub duration: u32,
    /// Kept as the text the backend sent, fractions included
    pub calories: String,
    /// Recommended water intake in millilitres
    pub water_intake: String,
    pub steps: Vec<ExerciseStep>,
}

impl Default for ExerciseBlock {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            description: String::new(),
            video_url: None,
            image_url: None,
            duration: DEFAULT_BLOCK_DURATION,
            calories: "0".to_string(),
            water_intake: "0".to_string(),
            steps: Vec::new(),
        }
    }
}

/// One exercise inside a block; its list position is its order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseStep {
    #[serde(default)]
    pub id: StepId,
    #[serde(default)]
    pub name: String,
    /// Free-form duration label such as "5 - 10 daqiqa"
    #[serde(default = "default_step_duration")]
    pub duration: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

fn default_step_duration() -> String {
    DEFAULT_STEP_DURATION.to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExerciseStepPatch {
    pub name: Option<String>,
    pub duration: Option<String>,
    pub description: Option<String>,
}

impl ContentEntity for ExerciseBlock {
    type Step = ExerciseStep;
    type Wire = ExerciseBlockWire;

    const KIND: ContentKind = ContentKind::Exercise;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }

    fn clear_id(&mut self) {
        self.id = None;
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    fn set_image_url(&mut self, url: Option<String>) {
        self.image_url = url;
    }

    fn steps(&self) -> &[ExerciseStep] {
        &self.steps
    }

    fn steps_mut(&mut self) -> &mut Vec<ExerciseStep> {
        &mut self.steps
    }

    fn to_wire(&self) -> ExerciseBlockWire {
        wire::exercise_block_to_wire(self)
    }

    fn from_wire(wire: ExerciseBlockWire) -> Self {
        wire::exercise_block_from_wire(wire)
    }

    fn wire_image_field() -> &'static str {
        "block_image"
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_min_chars("name", &self.name, 3);
        errors.require_min_chars("description", &self.description, 10);
        errors.into_result()
    }

    fn collection(cache: &CollectionCache) -> &Collection<Self> {
        &cache.exercises
    }

    fn collection_mut(cache: &mut CollectionCache) -> &mut Collection<Self> {
        &mut cache.exercises
    }

    fn samples() -> Vec<Self> {
        crate::samples::exercise_blocks()
    }
}

impl ContentStep for ExerciseStep {
    type Patch = ExerciseStepPatch;
    type Wire = ExerciseStepWire;

    const SUPPORTS_IMAGES: bool = true;

    fn id(&self) -> &StepId {
        &self.id
    }

    fn set_id(&mut self, id: StepId) {
        self.id = id;
    }

    fn placeholder(id: StepId, _siblings: &[Self]) -> Self {
        Self {
            id,
            name: String::new(),
            duration: default_step_duration(),
            description: String::new(),
            image_url: None,
        }
    }

    fn apply(&mut self, patch: &ExerciseStepPatch) {
        if let Some(name) = &patch.name {
            self.name.clone_from(name);
        }
        if let Some(duration) = &patch.duration {
            self.duration.clone_from(duration);
        }
        if let Some(description) = &patch.description {
            self.description.clone_from(description);
        }
    }

    fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    fn set_image_url(&mut self, url: Option<String>) {
        self.image_url = url;
    }

    fn to_wire(&self) -> ExerciseStepWire {
        wire::exercise_step_to_wire(self)
    }

    fn from_wire(wire: ExerciseStepWire) -> Self {
        wire::exercise_step_from_wire(wire)
    }
}
