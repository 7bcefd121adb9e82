use serde::{Deserialize, Serialize};

use super::{non_empty, nullable_string, wire_id, WireCount, WireId, WireNumber};
use crate::models::{ExerciseBlock, ExerciseStep, StepId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseBlockWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<WireId>,
    #[serde(default, deserialize_with = "nullable_string")]
    pub block_name: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub description: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub video_url: String,
    #[serde(default)]
    pub block_image: Option<String>,
    #[serde(default)]
    pub duration: WireCount,
    #[serde(default)]
    pub calories: WireNumber,
    #[serde(default)]
    pub water_intake: WireNumber,
    #[serde(default)]
    pub exercises: Vec<ExerciseStepWire>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseStepWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<WireId>,
    #[serde(default, deserialize_with = "nullable_string")]
    pub exercise_name: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub duration: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
}

pub fn exercise_block_to_wire(block: &ExerciseBlock) -> ExerciseBlockWire {
    ExerciseBlockWire {
        id: wire_id(block.id.as_deref()),
        block_name: block.name.clone(),
        description: block.description.clone(),
        video_url: block.video_url.clone().unwrap_or_default(),
        block_image: block.image_url.clone(),
        duration: WireCount::new(block.duration),
        calories: WireNumber::new(block.calories.clone()),
        water_intake: WireNumber::new(block.water_intake.clone()),
        exercises: block.steps.iter().map(exercise_step_to_wire).collect(),
    }
}

pub fn exercise_block_from_wire(wire: ExerciseBlockWire) -> ExerciseBlock {
    ExerciseBlock {
        id: wire.id.map(WireId::into_string),
        name: wire.block_name,
        description: wire.description,
        video_url: non_empty(Some(wire.video_url)),
        image_url: non_empty(wire.block_image),
        duration: wire.duration.get(),
        calories: wire.calories.into(),
        water_intake: wire.water_intake.into(),
        steps: wire
            .exercises
            .into_iter()
            .map(exercise_step_from_wire)
            .collect(),
    }
}

/// Local placeholder ids are dropped; the backend assigns one on create.
pub fn exercise_step_to_wire(step: &ExerciseStep) -> ExerciseStepWire {
    ExerciseStepWire {
        id: wire_id(step.id.server_id()),
        exercise_name: step.name.clone(),
        duration: step.duration.clone(),
        description: step.description.clone(),
        image: step.image_url.clone(),
    }
}

/// A step arriving without an id gets a local placeholder.
pub fn exercise_step_from_wire(wire: ExerciseStepWire) -> ExerciseStep {
    ExerciseStep {
        id: wire
            .id
            .map_or_else(StepId::local, |id| StepId::server(id.into_string())),
        name: wire.exercise_name,
        duration: wire.duration,
        description: wire.description,
        image_url: non_empty(wire.image),
    }
}
