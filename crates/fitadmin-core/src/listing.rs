//! The combined content list: both kinds, filtered and paginated.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::api::ContentBackend;
use crate::models::{ContentEntity, ContentKind, ExerciseBlock, Meal};
use crate::repository::{ContentStore, SyncOutcome};
use crate::routes::Route;

pub const PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentFilter {
    #[default]
    All,
    Exercise,
    Meal,
}

impl ContentFilter {
    #[must_use]
    pub const fn includes(self, kind: ContentKind) -> bool {
        match self {
            Self::All => true,
            Self::Exercise => matches!(kind, ContentKind::Exercise),
            Self::Meal => matches!(kind, ContentKind::Meal),
        }
    }
}

impl From<ContentKind> for ContentFilter {
    fn from(kind: ContentKind) -> Self {
        match kind {
            ContentKind::Exercise => Self::Exercise,
            ContentKind::Meal => Self::Meal,
        }
    }
}

impl FromStr for ContentFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        s.parse::<ContentKind>().map(Self::from)
    }
}

impl fmt::Display for ContentFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Exercise => f.write_str("exercise"),
            Self::Meal => f.write_str("meal"),
        }
    }
}

/// One line of the content table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentRow {
    /// 1-based position across the whole filtered list
    pub index: usize,
    pub id: Option<String>,
    pub name: String,
    pub kind: ContentKind,
    pub image_url: Option<String>,
    pub step_count: usize,
}

impl ContentRow {
    fn from_entity<E: ContentEntity>(entity: &E) -> Self {
        Self {
            index: 0,
            id: entity.id().map(str::to_string),
            name: entity.name().to_string(),
            kind: E::KIND,
            image_url: entity.image_url().map(str::to_string),
            step_count: entity.steps().len(),
        }
    }

    /// Where the edit action leads; unsaved rows have none
    #[must_use]
    pub fn edit_route(&self) -> Option<Route> {
        self.id.as_ref().map(|id| Route::EditContent {
            kind: self.kind,
            id: id.clone(),
        })
    }
}

/// Exercise blocks first, then meals, numbered in that order.
#[must_use]
pub fn content_rows(blocks: &[ExerciseBlock], meals: &[Meal], filter: ContentFilter) -> Vec<ContentRow> {
    let mut rows = Vec::new();
    if filter.includes(ContentKind::Exercise) {
        rows.extend(blocks.iter().map(ContentRow::from_entity));
    }
    if filter.includes(ContentKind::Meal) {
        rows.extend(meals.iter().map(ContentRow::from_entity));
    }
    for (position, row) in rows.iter_mut().enumerate() {
        row.index = position + 1;
    }
    rows
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

impl<T> Page<T> {
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 1
    }
}

/// Slice out one page, clamping `page` into range.
#[must_use]
pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> Page<T> {
    let per_page = per_page.max(1);
    let total_pages = items.len().div_ceil(per_page);
    let page = page.clamp(1, total_pages.max(1));
    let start = (page - 1) * per_page;
    let end = (start + per_page).min(items.len());
    Page {
        items: items.get(start..end).unwrap_or_default().to_vec(),
        page,
        total_pages,
        total_items: items.len(),
    }
}

/// Refresh the collections the filter shows and build its rows.
///
/// Both kinds are fetched concurrently; a failed fetch degrades the way
/// [`crate::repository::ContentRepository::list`] does.
pub async fn load_content_rows<B>(store: &ContentStore<B>, filter: ContentFilter) -> Vec<ContentRow>
where
    B: ContentBackend<ExerciseBlock> + ContentBackend<Meal>,
{
    let blocks_repo = store.repository::<ExerciseBlock>();
    let meals_repo = store.repository::<Meal>();
    let (blocks, meals) = futures::join!(
        async {
            if filter.includes(ContentKind::Exercise) {
                blocks_repo.list().await
            } else {
                Vec::new()
            }
        },
        async {
            if filter.includes(ContentKind::Meal) {
                meals_repo.list().await
            } else {
                Vec::new()
            }
        }
    );
    content_rows(&blocks, &meals, filter)
}

/// Delete one row's entity by kind.
pub async fn delete_content<B>(store: &ContentStore<B>, kind: ContentKind, id: &str) -> SyncOutcome<()>
where
    B: ContentBackend<ExerciseBlock> + ContentBackend<Meal>,
{
    match kind {
        ContentKind::Exercise => store.repository::<ExerciseBlock>().delete(id).await,
        ContentKind::Meal => store.repository::<Meal>().delete(id).await,
    }
}
