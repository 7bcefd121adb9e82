//! Console navigation surface and the protected-route guard.

use std::fmt;

use crate::auth::AuthContext;
use crate::models::ContentKind;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Root,
    Login,
    Dashboard,
    ContentList,
    /// `/add-content`, optionally pre-selecting a kind with `?type=`
    CreateContent { kind: Option<ContentKind> },
    EditContent { kind: ContentKind, id: String },
    NotFound(String),
}

impl Route {
    /// Parse a console path such as `/edit-meal/12` or `/add-content?type=meal`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let (path, query) = raw.split_once('?').unwrap_or((raw, ""));
        let path = path.trim_end_matches('/');
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Self::Root,
            ["login"] => Self::Login,
            ["dashboard"] => Self::Dashboard,
            ["content"] => Self::ContentList,
            ["add-content"] => Self::CreateContent {
                kind: query_param(query, "type").and_then(|kind| kind.parse().ok()),
            },
            [page, id] => match page.strip_prefix("edit-").map(str::parse::<ContentKind>) {
                Some(Ok(kind)) => Self::EditContent {
                    kind,
                    id: urlencoding::decode(id)
                        .map_or_else(|_| (*id).to_string(), |id| id.into_owned()),
                },
                _ => Self::NotFound(raw.to_string()),
            },
            _ => Self::NotFound(raw.to_string()),
        }
    }

    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Root => "/".to_string(),
            Self::Login => "/login".to_string(),
            Self::Dashboard => "/dashboard".to_string(),
            Self::ContentList => "/content".to_string(),
            Self::CreateContent { kind: None } => "/add-content".to_string(),
            Self::CreateContent { kind: Some(kind) } => format!("/add-content?type={kind}"),
            Self::EditContent { kind, id } => {
                format!("/edit-{kind}/{}", urlencoding::encode(id))
            }
            Self::NotFound(path) => path.clone(),
        }
    }

    /// Every page but login needs a valid token
    #[must_use]
    pub const fn is_protected(&self) -> bool {
        !matches!(self, Self::Login)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

fn query_param<'a>(query: &'a str, name: &str) -> Option<&'a str> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Render the page and run its data fetches
    Allow(Route),
    /// Go here instead; nothing for the original page was fetched
    Redirect(Route),
}

/// Decide whether `route` may be shown.
///
/// A protected route with a missing or expired token clears the stored
/// credentials and redirects to login before the page loads anything.
pub fn guard(route: Route, auth: &AuthContext) -> RouteDecision {
    let from_root = route == Route::Root;
    let target = if from_root { Route::Dashboard } else { route };
    if target.is_protected() {
        if let Err(error) = auth.bearer_token() {
            tracing::info!(route = %target, "redirecting to login: {error}");
            return RouteDecision::Redirect(Route::Login);
        }
    }
    if from_root {
        RouteDecision::Redirect(target)
    } else {
        RouteDecision::Allow(target)
    }
}
