//! reqwest implementation of [`ContentBackend`].

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{parse_api_error, ApiError, ApiResult, ContentBackend, Endpoints};
use crate::auth::AuthContext;
use crate::config::ClientConfig;
use crate::models::{ContentEntity, ContentStep, ImageFile};
use crate::util::{compact_text, normalize_text_option};

/// Multipart field carrying image bytes on every upload route
const IMAGE_FIELD: &str = "image";

/// Authenticated HTTP client for the content backend.
///
/// Every request checks the injected [`AuthContext`] first; a missing or
/// expired token fails without touching the network.
#[derive(Debug, Clone)]
pub struct HttpContentBackend {
    base_url: String,
    client: Client,
    auth: AuthContext,
}

impl HttpContentBackend {
    pub fn new(config: &ClientConfig, auth: AuthContext) -> ApiResult<Self> {
        let base_url = config
            .base_url()
            .map_err(|error| ApiError::InvalidConfiguration(error.to_string()))?;
        let client = Client::builder().timeout(config.request_timeout()).build()?;
        Ok(Self {
            base_url,
            client,
            auth,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub const fn auth(&self) -> &AuthContext {
        &self.auth
    }

    /// Authenticated GET decoding a JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let request = self.authorized(Method::GET, path)?;
        read_json(self.send(request).await?).await
    }

    fn authorized(&self, method: Method, path: &str) -> ApiResult<RequestBuilder> {
        let token = self.auth.bearer_token()?;
        tracing::debug!(%method, path, "backend request");
        Ok(self
            .client
            .request(method, format!("{}{path}", self.base_url))
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "application/json"))
    }

    async fn send(&self, request: RequestBuilder) -> ApiResult<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::UNAUTHORIZED => {
                tracing::warn!("Backend rejected the admin token");
                self.auth.invalidate();
                Err(ApiError::Unauthorized)
            }
            StatusCode::NOT_FOUND => Err(ApiError::NotFound(parse_api_error(status, &body))),
            _ => Err(ApiError::Api(parse_api_error(status, &body))),
        }
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.authorized(method, path)?.json(body);
        read_json(self.send(request).await?).await
    }

    async fn upload(
        &self,
        path: &str,
        file: &ImageFile,
        url_fields: &[&str],
    ) -> ApiResult<Option<String>> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)?;
        let form = Form::new().part(IMAGE_FIELD, part);
        let request = self.authorized(Method::POST, path)?.multipart(form);
        let response = self.send(request).await?;

        let body = response.text().await?;
        let Ok(payload) = serde_json::from_str::<Value>(&body) else {
            return Ok(None);
        };
        Ok(url_fields
            .iter()
            .find_map(|field| payload.get(*field).and_then(Value::as_str))
            .and_then(|url| normalize_text_option(Some(url.to_string()))))
    }
}

impl<E: ContentEntity> ContentBackend<E> for HttpContentBackend {
    async fn list(&self) -> ApiResult<Vec<E>> {
        let path = Endpoints::for_kind(E::KIND).collection();
        let payload: ListPayload<E::Wire> = self.get_json(&path).await?;
        Ok(payload.into_items().into_iter().map(E::from_wire).collect())
    }

    async fn get(&self, id: &str) -> ApiResult<E> {
        let path = Endpoints::for_kind(E::KIND).resource(id);
        let wire: E::Wire = self.get_json(&path).await?;
        Ok(E::from_wire(wire))
    }

    async fn create(&self, draft: &E) -> ApiResult<E> {
        let path = Endpoints::for_kind(E::KIND).collection();
        let wire: E::Wire = self.send_json(Method::POST, &path, &draft.to_wire()).await?;
        Ok(E::from_wire(wire))
    }

    async fn update(&self, id: &str, entity: &E) -> ApiResult<E> {
        let path = Endpoints::for_kind(E::KIND).resource(id);
        let wire: E::Wire = self.send_json(Method::PUT, &path, &entity.to_wire()).await?;
        Ok(E::from_wire(wire))
    }

    async fn delete(&self, id: &str) -> ApiResult<()> {
        let path = Endpoints::for_kind(E::KIND).resource(id);
        let request = self.authorized(Method::DELETE, &path)?;
        self.send(request).await?;
        Ok(())
    }

    async fn upload_image(&self, id: &str, file: &ImageFile) -> ApiResult<Option<String>> {
        let path = Endpoints::for_kind(E::KIND).image_upload(id);
        self.upload(&path, file, &[E::wire_image_field(), "image_url", "url"])
            .await
    }

    async fn create_step(&self, parent_id: &str, step: &E::Step) -> ApiResult<E::Step> {
        let path = Endpoints::for_kind(E::KIND).step_collection(parent_id);
        let wire: <E::Step as ContentStep>::Wire =
            self.send_json(Method::POST, &path, &step.to_wire()).await?;
        Ok(E::Step::from_wire(wire))
    }

    async fn update_step(
        &self,
        _parent_id: &str,
        step_id: &str,
        step: &E::Step,
    ) -> ApiResult<E::Step> {
        let path = Endpoints::for_kind(E::KIND).step_resource(step_id);
        let wire: <E::Step as ContentStep>::Wire =
            self.send_json(Method::PUT, &path, &step.to_wire()).await?;
        Ok(E::Step::from_wire(wire))
    }

    async fn upload_step_image(
        &self,
        parent_id: &str,
        step_id: &str,
        file: &ImageFile,
    ) -> ApiResult<Option<String>> {
        let path = Endpoints::for_kind(E::KIND)
            .step_image_upload(parent_id, step_id)
            .ok_or(ApiError::Unsupported("this content kind has no step images"))?;
        self.upload(&path, file, &["image", "image_url", "url"]).await
    }
}

/// List routes answer with a bare array or a paginated envelope
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListPayload<W> {
    Plain(Vec<W>),
    Paged { results: Vec<W> },
}

impl<W> ListPayload<W> {
    fn into_items(self) -> Vec<W> {
        match self {
            Self::Plain(items) | Self::Paged { results: items } => items,
        }
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let body = response.text().await?;
    serde_json::from_str(&body)
        .map_err(|error| ApiError::Decode(format!("{error}: {}", compact_text(&body))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthContext, CredentialStore, MemoryCredentialStore};
    use crate::models::{ExerciseBlock, ExerciseStep, Meal, StepId};
    use crate::test_support::{fresh_token, stale_token};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{body_partial_json, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend_for(server: &MockServer, auth: AuthContext) -> HttpContentBackend {
        let config = ClientConfig {
            api_base_url: server.uri(),
            ..ClientConfig::default()
        };
        HttpContentBackend::new(&config, auth).unwrap()
    }

    #[tokio::test(flavor = "current_thread")]
    async fn list_meals_sends_bearer_token_and_maps_wire_fields() {
        let server = MockServer::start().await;
        let token = fresh_token();
        Mock::given(method("GET"))
            .and(path("/api/food/api/meals/"))
            .and(header("authorization", format!("Bearer {token}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "food_name": "Oatmeal", "total_calories": 300, "water_content": "200",
                 "preparation_time": 10, "meal_type": "breakfast", "steps": []}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let backend = backend_for(&server, AuthContext::with_token(token));
        let meals: Vec<Meal> = ContentBackend::<Meal>::list(&backend).await.unwrap();

        assert_eq!(meals.len(), 1);
        assert_eq!(meals[0].id.as_deref(), Some("1"));
        assert_eq!(meals[0].name, "Oatmeal");
        assert_eq!(meals[0].calories, "300");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn list_accepts_paginated_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/exercise/api/exerciseblocks/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 1,
                "results": [{"id": "b1", "block_name": "Cardio"}]
            })))
            .mount(&server)
            .await;

        let backend = backend_for(&server, AuthContext::with_token(fresh_token()));
        let blocks: Vec<ExerciseBlock> = ContentBackend::<ExerciseBlock>::list(&backend)
            .await
            .unwrap();
        assert_eq!(blocks[0].name, "Cardio");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn expired_token_sends_nothing_and_clears_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryCredentialStore::with_token(stale_token()));
        let auth = AuthContext::restore(store.clone()).unwrap();
        let backend = backend_for(&server, auth);

        let error = ContentBackend::<Meal>::list(&backend).await.unwrap_err();
        assert!(matches!(error, ApiError::Unauthenticated(_)));
        assert_eq!(store.load_token().unwrap(), None);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn unauthorized_response_clears_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/food/api/meals/m1/"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "detail": "Given token not valid"
            })))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryCredentialStore::with_token(fresh_token()));
        let auth = AuthContext::restore(store.clone()).unwrap();
        let backend = backend_for(&server, auth.clone());

        let error = ContentBackend::<Meal>::get(&backend, "m1").await.unwrap_err();
        assert!(matches!(error, ApiError::Unauthorized));
        assert!(!auth.is_authenticated());
        assert_eq!(store.load_token().unwrap(), None);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn create_block_posts_wire_payload_without_local_step_ids() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/exercise/api/exerciseblocks/"))
            .and(body_partial_json(json!({
                "block_name": "Morning run",
                "exercises": [{"exercise_name": "Jog"}]
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 55,
                "block_name": "Morning run",
                "exercises": [{"id": 900, "exercise_name": "Jog"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let backend = backend_for(&server, AuthContext::with_token(fresh_token()));
        let draft = ExerciseBlock {
            name: "Morning run".to_string(),
            steps: vec![ExerciseStep {
                name: "Jog".to_string(),
                ..ExerciseStep::placeholder(StepId::local(), &[])
            }],
            ..ExerciseBlock::default()
        };
        let created = ContentBackend::<ExerciseBlock>::create(&backend, &draft)
            .await
            .unwrap();

        assert_eq!(created.id.as_deref(), Some("55"));
        assert_eq!(created.steps[0].id, StepId::server("900"));

        let requests = server.received_requests().await.unwrap();
        let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert!(sent["exercises"][0].get("id").is_none());
        assert!(sent.get("id").is_none());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn update_step_puts_to_step_resource() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/food/api/meal-steps/12/"))
            .and(body_partial_json(json!({"id": "12", "title": "Stir"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 12, "title": "Stir", "step_time": "3", "step_number": 2
            })))
            .expect(1)
            .mount(&server)
            .await;

        let backend = backend_for(&server, AuthContext::with_token(fresh_token()));
        let step = crate::models::MealStep {
            id: StepId::server("12"),
            title: "Stir".to_string(),
            description: String::new(),
            step_time: "3".to_string(),
            step_number: 2,
        };
        let updated = ContentBackend::<Meal>::update_step(&backend, "m1", "12", &step)
            .await
            .unwrap();
        assert_eq!(updated, step);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn upload_image_posts_multipart_and_reads_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/exercise/api/exerciseblocks/7/upload-block-image/"))
            .and(header_exists("content-type"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "block_image": "https://cdn.owntrainer.uz/blocks/7.png"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let backend = backend_for(&server, AuthContext::with_token(fresh_token()));
        let file = ImageFile::new("7.png", "image/png", vec![1, 2, 3]);
        let url = ContentBackend::<ExerciseBlock>::upload_image(&backend, "7", &file)
            .await
            .unwrap();
        assert_eq!(url.as_deref(), Some("https://cdn.owntrainer.uz/blocks/7.png"));

        let requests = server.received_requests().await.unwrap();
        let content_type = requests[0]
            .headers
            .get("content-type")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(content_type.starts_with("multipart/form-data"));
        let body = String::from_utf8_lossy(&requests[0].body);
        assert!(body.contains("name=\"image\""));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn meal_step_images_are_unsupported() {
        let server = MockServer::start().await;
        let backend = backend_for(&server, AuthContext::with_token(fresh_token()));
        let file = ImageFile::new("s.png", "image/png", vec![1]);
        let error = ContentBackend::<Meal>::upload_step_image(&backend, "m1", "4", &file)
            .await
            .unwrap_err();
        assert!(matches!(error, ApiError::Unsupported(_)));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn field_errors_surface_in_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/food/api/meals/m1/"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "food_name": ["This field may not be blank."]
            })))
            .mount(&server)
            .await;

        let backend = backend_for(&server, AuthContext::with_token(fresh_token()));
        let error = ContentBackend::<Meal>::update(&backend, "m1", &Meal::default())
            .await
            .unwrap_err();
        assert!(error.to_string().contains("food_name: This field may not be blank."));
    }
}
