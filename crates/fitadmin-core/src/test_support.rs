//! Shared fixtures for unit tests: JWT builders and an in-memory backend.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::Value;

use crate::api::{ApiError, ApiResult, ContentBackend};
use crate::auth::AuthContext;
use crate::cache::CollectionCache;
use crate::models::{ContentEntity, ContentKind, ContentStep, ImageFile, StepId};
use crate::util::unix_timestamp_now;

pub fn token_with_exp(exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::json!({"exp": exp, "user_id": 1}).to_string());
    format!("{header}.{payload}.signature")
}

pub fn fresh_token() -> String {
    token_with_exp(unix_timestamp_now() + 3_600)
}

pub fn stale_token() -> String {
    token_with_exp(unix_timestamp_now() - 3_600)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    List,
    Get,
    Create,
    Update,
    Delete,
    UploadImage,
    CreateStep,
    UpdateStep,
    UploadStepImage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List(ContentKind),
    Get(String),
    Create(ContentKind),
    Update(String),
    Delete(String),
    UploadImage(String),
    CreateStep(String),
    UpdateStep(String),
    UploadStepImage(String, String),
}

/// One request as the backend saw it, with its wire body
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub call: Call,
    pub body: Option<Value>,
}

#[derive(Default)]
struct StubState {
    content: CollectionCache,
    requests: Vec<Recorded>,
    failing: HashSet<Op>,
    failing_steps: HashSet<String>,
    next_id: u64,
    in_flight: usize,
    max_in_flight: usize,
}

/// In-memory backend that records every request and can be told to fail.
///
/// Ids it issues look like `srv-<n>` for entities and `step-<n>` for steps.
#[derive(Default)]
pub struct StubBackend {
    state: Mutex<StubState>,
    auth: Option<AuthContext>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gate every call on `auth` like the HTTP backend does
    pub fn with_auth(mut self, auth: AuthContext) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Store an entity server-side without recording a request
    pub fn seed<E: ContentEntity>(&self, entity: E) {
        E::collection_mut(&mut self.lock().content).append(entity);
    }

    pub fn entity<E: ContentEntity>(&self, id: &str) -> Option<E> {
        E::collection(&self.lock().content).get(id).cloned()
    }

    pub fn fail(&self, op: Op) {
        self.lock().failing.insert(op);
    }

    pub fn recover(&self, op: Op) {
        self.lock().failing.remove(&op);
    }

    /// Fail updates of one step only
    pub fn fail_step_update(&self, step_id: &str) {
        self.lock().failing_steps.insert(step_id.to_string());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock()
            .requests
            .iter()
            .map(|request| request.call.clone())
            .collect()
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.lock().requests.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().requests.clear();
    }

    /// Most requests that were awaiting a response at the same time
    pub fn max_in_flight(&self) -> usize {
        self.lock().max_in_flight
    }

    fn lock(&self) -> MutexGuard<'_, StubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self, call: Call, body: Option<Value>, op: Op, step_id: Option<&str>) -> ApiResult<()> {
        if let Some(auth) = &self.auth {
            auth.bearer_token()?;
        }
        let mut state = self.lock();
        state.requests.push(Recorded { call, body });
        let step_fails = step_id.is_some_and(|id| state.failing_steps.contains(id));
        if state.failing.contains(&op) || step_fails {
            return Err(ApiError::Api("stubbed failure (500)".to_string()));
        }
        Ok(())
    }

    async fn round_trip(&self) {
        {
            let mut state = self.lock();
            state.in_flight += 1;
            state.max_in_flight = state.max_in_flight.max(state.in_flight);
        }
        tokio::task::yield_now().await;
        self.lock().in_flight -= 1;
    }

    fn next_id(&self, prefix: &str) -> String {
        let mut state = self.lock();
        state.next_id += 1;
        format!("{prefix}-{}", state.next_id)
    }

    fn assign_step_ids<E: ContentEntity>(&self, entity: &mut E) {
        for step in entity.steps_mut() {
            if step.id().is_local() {
                step.set_id(StepId::server(self.next_id("step")));
            }
        }
    }
}

fn wire_body<W: serde::Serialize>(wire: &W) -> Option<Value> {
    serde_json::to_value(wire).ok()
}

fn not_found(id: &str) -> ApiError {
    ApiError::NotFound(format!("{id} (404)"))
}

impl<E: ContentEntity> ContentBackend<E> for StubBackend {
    async fn list(&self) -> ApiResult<Vec<E>> {
        self.begin(Call::List(E::KIND), None, Op::List, None)?;
        self.round_trip().await;
        Ok(E::collection(&self.lock().content).all().to_vec())
    }

    async fn get(&self, id: &str) -> ApiResult<E> {
        self.begin(Call::Get(id.to_string()), None, Op::Get, None)?;
        self.round_trip().await;
        self.entity(id).ok_or_else(|| not_found(id))
    }

    async fn create(&self, draft: &E) -> ApiResult<E> {
        let body = wire_body(&draft.to_wire());
        self.begin(Call::Create(E::KIND), body, Op::Create, None)?;
        self.round_trip().await;
        let mut created = draft.clone();
        created.set_id(self.next_id("srv"));
        self.assign_step_ids(&mut created);
        self.seed(created.clone());
        Ok(created)
    }

    async fn update(&self, id: &str, entity: &E) -> ApiResult<E> {
        let body = wire_body(&entity.to_wire());
        self.begin(Call::Update(id.to_string()), body, Op::Update, None)?;
        self.round_trip().await;
        let mut saved = entity.clone();
        saved.set_id(id.to_string());
        self.assign_step_ids(&mut saved);
        let replaced = E::collection_mut(&mut self.lock().content).replace(id, saved.clone());
        if replaced {
            Ok(saved)
        } else {
            Err(not_found(id))
        }
    }

    async fn delete(&self, id: &str) -> ApiResult<()> {
        self.begin(Call::Delete(id.to_string()), None, Op::Delete, None)?;
        self.round_trip().await;
        let removed = E::collection_mut(&mut self.lock().content).remove(id);
        removed.map(|_| ()).ok_or_else(|| not_found(id))
    }

    async fn upload_image(&self, id: &str, file: &ImageFile) -> ApiResult<Option<String>> {
        self.begin(Call::UploadImage(id.to_string()), None, Op::UploadImage, None)?;
        self.round_trip().await;
        let url = format!("https://cdn.test/{}/{id}/{}", E::KIND, file.file_name);
        let patched = E::collection_mut(&mut self.lock().content)
            .patch(id, |entity| entity.set_image_url(Some(url.clone())));
        if patched {
            Ok(Some(url))
        } else {
            Err(not_found(id))
        }
    }

    async fn create_step(&self, parent_id: &str, step: &E::Step) -> ApiResult<E::Step> {
        let body = wire_body(&step.to_wire());
        self.begin(
            Call::CreateStep(parent_id.to_string()),
            body,
            Op::CreateStep,
            None,
        )?;
        self.round_trip().await;
        let mut created = step.clone();
        created.set_id(StepId::server(self.next_id("step")));
        let stored = created.clone();
        let patched = E::collection_mut(&mut self.lock().content)
            .patch(parent_id, |entity| entity.steps_mut().push(stored));
        if patched {
            Ok(created)
        } else {
            Err(not_found(parent_id))
        }
    }

    async fn update_step(
        &self,
        parent_id: &str,
        step_id: &str,
        step: &E::Step,
    ) -> ApiResult<E::Step> {
        let body = wire_body(&step.to_wire());
        self.begin(
            Call::UpdateStep(step_id.to_string()),
            body,
            Op::UpdateStep,
            Some(step_id),
        )?;
        self.round_trip().await;
        let stored = step.clone();
        let patched = E::collection_mut(&mut self.lock().content).patch_step(
            parent_id,
            &StepId::server(step_id),
            |slot| *slot = stored,
        );
        if patched {
            Ok(step.clone())
        } else {
            Err(not_found(step_id))
        }
    }

    async fn upload_step_image(
        &self,
        parent_id: &str,
        step_id: &str,
        file: &ImageFile,
    ) -> ApiResult<Option<String>> {
        if !E::Step::SUPPORTS_IMAGES {
            return Err(ApiError::Unsupported("this content kind has no step images"));
        }
        self.begin(
            Call::UploadStepImage(parent_id.to_string(), step_id.to_string()),
            None,
            Op::UploadStepImage,
            None,
        )?;
        self.round_trip().await;
        let url = format!("https://cdn.test/steps/{step_id}/{}", file.file_name);
        let patched = E::collection_mut(&mut self.lock().content).patch_step(
            parent_id,
            &StepId::server(step_id),
            |step| step.set_image_url(Some(url.clone())),
        );
        if patched {
            Ok(Some(url))
        } else {
            Err(not_found(step_id))
        }
    }
}
