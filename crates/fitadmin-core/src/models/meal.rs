//! Meal model

use serde::{Deserialize, Serialize};

use crate::cache::{Collection, CollectionCache};
use crate::models::{ContentEntity, ContentKind, ContentStep, MealType, StepId};
use crate::validation::ValidationErrors;
use crate::wire::{self, MealStepWire, MealWire};

/// Step time given to freshly added preparation steps
pub const DEFAULT_STEP_TIME: &str = "5";

/// Default preparation time in minutes
pub const DEFAULT_PREPARATION_TIME: u32 = 20;

/// A meal with ordered preparation steps.
///
/// Calories and water intake are kept as the strings the form edits; the
/// backend also expects strings for both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Meal {
    pub id: Option<String>,
    pub name: String,
    pub description: String,
    pub video_url: Option<String>,
    pub image_url: Option<String>,
    pub calories: String,
    pub water_intake: String,
    /// Preparation time in minutes
    pub preparation_time: u32,
    pub meal_type: MealType,
    pub steps: Vec<MealStep>,
}

impl Default for Meal {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            description: String::new(),
            video_url: None,
            image_url: None,
            calories: "0".to_string(),
            water_intake: "0".to_string(),
            preparation_time: DEFAULT_PREPARATION_TIME,
            meal_type: MealType::default(),
            steps: Vec::new(),
        }
    }
}

/// One preparation step; `step_number` defines serving order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealStep {
    #[serde(default)]
    pub id: StepId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_step_time")]
    pub step_time: String,
    #[serde(default)]
    pub step_number: u32,
}

fn default_step_time() -> String {
    DEFAULT_STEP_TIME.to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MealStepPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub step_time: Option<String>,
    pub step_number: Option<u32>,
}

impl Meal {
    /// Steps sorted by `step_number`, the order they are served in
    #[must_use]
    pub fn ordered_steps(&self) -> Vec<&MealStep> {
        let mut steps = self.steps.iter().collect::<Vec<_>>();
        steps.sort_by_key(|step| step.step_number);
        steps
    }
}

impl ContentEntity for Meal {
    type Step = MealStep;
    type Wire = MealWire;

    const KIND: ContentKind = ContentKind::Meal;

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

    fn steps(&self) -> &[MealStep] {
        &self.steps
    }

    fn steps_mut(&mut self) -> &mut Vec<MealStep> {
        &mut self.steps
    }

    fn to_wire(&self) -> MealWire {
        wire::meal_to_wire(self)
    }

    fn from_wire(wire: MealWire) -> Self {
        wire::meal_from_wire(wire)
    }

    fn wire_image_field() -> &'static str {
        "food_photo_url"
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_min_chars("name", self.name.trim(), 3);
        errors.require_non_negative_number("calories", &self.calories);
        errors.require_non_negative_number("water_intake", &self.water_intake);
        if self.preparation_time < 1 {
            errors.push("preparation_time", "must be at least 1 minute");
        }
        errors.require_min_chars("description", self.description.trim(), 10);
        errors.into_result()
    }

    fn collection(cache: &CollectionCache) -> &Collection<Self> {
        &cache.meals
    }

    fn collection_mut(cache: &mut CollectionCache) -> &mut Collection<Self> {
        &mut cache.meals
    }

    fn samples() -> Vec<Self> {
        crate::samples::meals()
    }
}

impl ContentStep for MealStep {
    type Patch = MealStepPatch;
    type Wire = MealStepWire;

    const SUPPORTS_IMAGES: bool = false;

    fn id(&self) -> &StepId {
        &self.id
    }

    fn set_id(&mut self, id: StepId) {
        self.id = id;
    }

    fn placeholder(id: StepId, siblings: &[Self]) -> Self {
        let step_number = siblings
            .iter()
            .map(|step| step.step_number)
            .max()
            .unwrap_or(0)
            .saturating_add(1);
        Self {
            id,
            title: String::new(),
            description: String::new(),
            step_time: default_step_time(),
            step_number,
        }
    }

    fn apply(&mut self, patch: &MealStepPatch) {
        if let Some(title) = &patch.title {
            self.title.clone_from(title);
        }
        if let Some(description) = &patch.description {
            self.description.clone_from(description);
        }
        if let Some(step_time) = &patch.step_time {
            self.step_time.clone_from(step_time);
        }
        if let Some(step_number) = patch.step_number {
            self.step_number = step_number;
        }
    }

    fn to_wire(&self) -> MealStepWire {
        wire::meal_step_to_wire(self)
    }

    fn from_wire(wire: MealStepWire) -> Self {
        wire::meal_step_from_wire(wire)
    }
}
