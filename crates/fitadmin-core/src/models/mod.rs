//! Data models for fitadmin

mod entity;
mod exercise;
mod image;
mod kind;
mod meal;
mod step_id;

pub use entity::{ContentEntity, ContentStep};
pub use exercise::{
    ExerciseBlock, ExerciseStep, ExerciseStepPatch, DEFAULT_BLOCK_DURATION, DEFAULT_STEP_DURATION,
};
pub use image::ImageFile;
pub use kind::{ContentKind, MealType};
pub use meal::{Meal, MealStep, MealStepPatch, DEFAULT_PREPARATION_TIME, DEFAULT_STEP_TIME};
pub use step_id::StepId;
