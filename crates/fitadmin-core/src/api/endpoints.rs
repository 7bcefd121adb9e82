use crate::models::ContentKind;

/// Backend routes for one content kind, relative to the API base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoints {
    collection: &'static str,
    image_upload: &'static str,
    step_collection: &'static str,
    step_resource: &'static str,
    step_image_upload: Option<&'static str>,
}

const EXERCISE: Endpoints = Endpoints {
    collection: "/api/exercise/api/exerciseblocks",
    image_upload: "upload-block-image",
    step_collection: "exercises",
    step_resource: "/api/exercise/api/exercises",
    step_image_upload: Some("upload-exercise-image"),
};

const MEAL: Endpoints = Endpoints {
    collection: "/api/food/api/meals",
    image_upload: "upload-photo",
    step_collection: "steps",
    step_resource: "/api/food/api/meal-steps",
    step_image_upload: None,
};

impl Endpoints {
    #[must_use]
    pub const fn for_kind(kind: ContentKind) -> Self {
        match kind {
            ContentKind::Exercise => EXERCISE,
            ContentKind::Meal => MEAL,
        }
    }

    #[must_use]
    pub fn collection(&self) -> String {
        format!("{}/", self.collection)
    }

    #[must_use]
    pub fn resource(&self, id: &str) -> String {
        format!("{}/{}/", self.collection, segment(id))
    }

    #[must_use]
    pub fn image_upload(&self, id: &str) -> String {
        format!("{}/{}/{}/", self.collection, segment(id), self.image_upload)
    }

    #[must_use]
    pub fn step_collection(&self, parent_id: &str) -> String {
        format!(
            "{}/{}/{}/",
            self.collection,
            segment(parent_id),
            self.step_collection
        )
    }

    #[must_use]
    pub fn step_resource(&self, step_id: &str) -> String {
        format!("{}/{}/", self.step_resource, segment(step_id))
    }

    /// `None` when the kind has no per-step images
    #[must_use]
    pub fn step_image_upload(&self, parent_id: &str, step_id: &str) -> Option<String> {
        self.step_image_upload.map(|route| {
            format!(
                "{}/{}/{route}/{}/",
                self.collection,
                segment(parent_id),
                segment(step_id)
            )
        })
    }
}

fn segment(id: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(id)
}
