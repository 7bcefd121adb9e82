use serde::{Deserialize, Serialize};

use super::{non_empty, nullable_string, wire_id, WireCount, WireId, WireNumber};
use crate::models::{Meal, MealStep, MealType, StepId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<WireId>,
    #[serde(default, deserialize_with = "nullable_string")]
    pub food_name: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub description: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub video_url: String,
    #[serde(default)]
    pub food_photo_url: Option<String>,
    #[serde(default)]
    pub total_calories: WireNumber,
    #[serde(default)]
    pub water_content: WireNumber,
    #[serde(default)]
    pub preparation_time: WireCount,
    #[serde(default)]
    pub meal_type: MealType,
    #[serde(default)]
    pub steps: Vec<MealStepWire>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealStepWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<WireId>,
    #[serde(default, deserialize_with = "nullable_string")]
    pub title: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub description: String,
    #[serde(default)]
    pub step_time: WireNumber,
    #[serde(default)]
    pub step_number: WireCount,
}

pub fn meal_to_wire(meal: &Meal) -> MealWire {
    MealWire {
        id: wire_id(meal.id.as_deref()),
        food_name: meal.name.clone(),
        description: meal.description.clone(),
        video_url: meal.video_url.clone().unwrap_or_default(),
        food_photo_url: meal.image_url.clone(),
        total_calories: WireNumber::new(meal.calories.clone()),
        water_content: WireNumber::new(meal.water_intake.clone()),
        preparation_time: WireCount::new(meal.preparation_time),
        meal_type: meal.meal_type,
        steps: meal.steps.iter().map(meal_step_to_wire).collect(),
    }
}

pub fn meal_from_wire(wire: MealWire) -> Meal {
    Meal {
        id: wire.id.map(WireId::into_string),
        name: wire.food_name,
        description: wire.description,
        video_url: non_empty(Some(wire.video_url)),
        image_url: non_empty(wire.food_photo_url),
        calories: wire.total_calories.into(),
        water_intake: wire.water_content.into(),
        preparation_time: wire.preparation_time.get(),
        meal_type: wire.meal_type,
        steps: wire.steps.into_iter().map(meal_step_from_wire).collect(),
    }
}

/// Local placeholder ids are dropped; the backend assigns one on create.
pub fn meal_step_to_wire(step: &MealStep) -> MealStepWire {
    MealStepWire {
        id: wire_id(step.id.server_id()),
        title: step.title.clone(),
        description: step.description.clone(),
        step_time: WireNumber::new(step.step_time.clone()),
        step_number: WireCount::new(step.step_number),
    }
}

pub fn meal_step_from_wire(wire: MealStepWire) -> MealStep {
    MealStep {
        id: wire
            .id
            .map_or_else(StepId::local, |id| StepId::server(id.into_string())),
        title: wire.title,
        description: wire.description,
        step_time: wire.step_time.into(),
        step_number: wire.step_number.get(),
    }
}
