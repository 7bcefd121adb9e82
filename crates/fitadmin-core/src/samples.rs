//! Built-in content for offline demo mode.

use crate::models::{ExerciseBlock, ExerciseStep, Meal, MealStep, MealType, StepId};

#[must_use]
pub fn exercise_blocks() -> Vec<ExerciseBlock> {
    vec![ExerciseBlock {
        id: Some("1".to_string()),
        name: "Yurish mashqlari".to_string(),
        description: "Yengil yurish yoki jogging uchun mashqlar".to_string(),
        video_url: None,
        image_url: None,
        duration: 30,
        calories: "150".to_string(),
        water_intake: "500".to_string(),
        steps: vec![
            ExerciseStep {
                id: StepId::server("1"),
                name: "Isitish".to_string(),
                duration: "5 - 10 daqiqa".to_string(),
                description: "Yengil yurish bilan tanani qizdiring".to_string(),
                image_url: None,
            },
            ExerciseStep {
                id: StepId::server("2"),
                name: "Asosiy mashq".to_string(),
                duration: "5 - 10 daqiqa".to_string(),
                description: "Qorin va bel mushaklarini ishlating".to_string(),
                image_url: None,
            },
        ],
    }]
}

#[must_use]
pub fn meals() -> Vec<Meal> {
    vec![Meal {
        id: Some("1".to_string()),
        name: "Avokado va tuxumli buterbrod".to_string(),
        description: "Bu yengil taomning tavsifi".to_string(),
        video_url: None,
        image_url: None,
        calories: "1800".to_string(),
        water_intake: "300".to_string(),
        preparation_time: 20,
        meal_type: MealType::Breakfast,
        steps: vec![
            MealStep {
                id: StepId::server("1"),
                title: "Tuxum".to_string(),
                description: "Tuxumlarni suvda qaynating".to_string(),
                step_time: "10".to_string(),
                step_number: 1,
            },
            MealStep {
                id: StepId::server("2"),
                title: "Aralashtirish".to_string(),
                description: "Tuz va murch bilan aralashtiring".to_string(),
                step_time: "5".to_string(),
                step_number: 2,
            },
        ],
    }]
}
