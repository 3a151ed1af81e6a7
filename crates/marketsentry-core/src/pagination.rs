//! # Paginated Resources
//!
//! Query builders for the list endpoints, the page/metadata pair they return,
//! and [`PagedResource`], a loader that keeps the last page and skips the
//! request when asked for the same parameters again.
//!
//! ```text
//! Idle --load--> Loading --ok--> Loaded --load(same)--> Loaded (no request)
//!                   |                  \--load(other)/invalidate--> Loading
//!                   \--err--> Failed
//! ```

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::AssetType;
use crate::envelope::PageMeta;
use crate::{ApiError, ValidationError};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Query pairs in the shape [`crate::http_client::append_query`] accepts.
pub type QueryPairs = Vec<(&'static str, Option<String>)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl Display for SortOrder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(ValidationError::InvalidSortOrder {
                value: value.to_owned(),
            }),
        }
    }
}

/// Sort, order, page and page size shared by every list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageQuery {
    sort: Option<String>,
    order: Option<SortOrder>,
    page: u32,
    paging: u32,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            sort: None,
            order: None,
            page: 1,
            paging: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageQuery {
    pub fn new(page: u32, paging: u32) -> Result<Self, ValidationError> {
        if page == 0 {
            return Err(ValidationError::InvalidPage);
        }
        if paging == 0 || paging > MAX_PAGE_SIZE {
            return Err(ValidationError::InvalidPageSize {
                value: paging,
                max: MAX_PAGE_SIZE,
            });
        }

        Ok(Self {
            page,
            paging,
            ..Self::default()
        })
    }

    pub fn sorted_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        let field = field.into();
        self.sort = (!field.trim().is_empty()).then_some(field);
        self.order = Some(order);
        self
    }

    pub fn sort(&self) -> Option<&str> {
        self.sort.as_deref()
    }

    pub const fn order(&self) -> Option<SortOrder> {
        self.order
    }

    pub const fn page(&self) -> u32 {
        self.page
    }

    pub const fn paging(&self) -> u32 {
        self.paging
    }

    pub fn pairs(&self) -> QueryPairs {
        vec![
            ("sort", self.sort.clone()),
            ("order", self.order.map(|order| order.as_str().to_owned())),
            ("page", Some(self.page.to_string())),
            ("paging", Some(self.paging.to_string())),
        ]
    }
}

/// Asset list filters on top of [`PageQuery`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AssetQuery {
    pub page: PageQuery,
    pub asset_type: Option<AssetType>,
    pub q: Option<String>,
    pub category: Option<String>,
}

impl AssetQuery {
    pub fn new(page: PageQuery) -> Self {
        Self {
            page,
            ..Self::default()
        }
    }

    pub fn with_type(mut self, asset_type: AssetType) -> Self {
        self.asset_type = Some(asset_type);
        self
    }

    pub fn with_search(mut self, q: impl Into<String>) -> Self {
        self.q = non_blank(q.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = non_blank(category.into());
        self
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// A query that can be moved to another page.
pub trait PagedQuery: Clone + PartialEq + Send + Sync {
    fn page_number(&self) -> u32;
    fn at_page(&self, page: u32) -> Self;
    fn to_pairs(&self) -> QueryPairs;
}

impl PagedQuery for PageQuery {
    fn page_number(&self) -> u32 {
        self.page
    }

    fn at_page(&self, page: u32) -> Self {
        Self {
            page: page.max(1),
            ..self.clone()
        }
    }

    fn to_pairs(&self) -> QueryPairs {
        self.pairs()
    }
}

impl PagedQuery for AssetQuery {
    fn page_number(&self) -> u32 {
        self.page.page
    }

    fn at_page(&self, page: u32) -> Self {
        Self {
            page: self.page.at_page(page),
            ..self.clone()
        }
    }

    fn to_pairs(&self) -> QueryPairs {
        let mut pairs = self.page.pairs();
        pairs.push(("type", self.asset_type.map(|kind| kind.as_str().to_owned())));
        pairs.push(("q", self.q.clone()));
        pairs.push(("category", self.category.clone()));
        pairs
    }
}

/// One page of records plus whatever pagination metadata the server sent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: Option<PageMeta>,
}

impl<T> Page<T> {
    pub fn controls(&self) -> PaginationControls {
        PaginationControls::from_meta(self.meta.as_ref())
    }
}

/// Enabled state of the previous/next buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationControls {
    pub current_page: u32,
    pub total_pages: u32,
    pub has_previous: bool,
    pub has_next: bool,
}

impl PaginationControls {
    /// Without metadata there is exactly one page.
    pub fn from_meta(meta: Option<&PageMeta>) -> Self {
        match meta {
            Some(meta) => Self {
                current_page: meta.current_page,
                total_pages: meta.total_pages,
                has_previous: !meta.is_first(),
                has_next: !meta.is_last(),
            },
            None => Self {
                current_page: 1,
                total_pages: 1,
                has_previous: false,
                has_next: false,
            },
        }
    }
}

pub type PageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<Page<T>, ApiError>> + Send + 'a>>;

/// Anything that can fetch a page for a query.
pub trait PageSource: Send + Sync {
    type Query: PagedQuery;
    type Item: Clone + Send;

    fn fetch_page<'a>(&'a self, query: &'a Self::Query) -> PageFuture<'a, Self::Item>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Idle,
    Loading,
    Loaded(Page<T>),
    Failed(ApiError),
}

/// Page loader with parameter de-duplication and explicit invalidation.
pub struct PagedResource<S: PageSource> {
    source: S,
    query: Option<S::Query>,
    state: LoadState<S::Item>,
}

impl<S: PageSource> PagedResource<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            query: None,
            state: LoadState::Idle,
        }
    }

    pub fn state(&self) -> &LoadState<S::Item> {
        &self.state
    }

    pub fn query(&self) -> Option<&S::Query> {
        self.query.as_ref()
    }

    pub fn page(&self) -> Option<&Page<S::Item>> {
        match &self.state {
            LoadState::Loaded(page) => Some(page),
            _ => None,
        }
    }

    pub fn controls(&self) -> PaginationControls {
        PaginationControls::from_meta(self.page().and_then(|page| page.meta.as_ref()))
    }

    /// Loads `query`, reusing the held page when the parameters are unchanged.
    pub async fn load(&mut self, query: S::Query) -> Result<Page<S::Item>, ApiError> {
        if let (Some(current), LoadState::Loaded(page)) = (&self.query, &self.state) {
            if *current == query {
                debug!("page parameters unchanged; reusing loaded page");
                return Ok(page.clone());
            }
        }

        self.query = Some(query.clone());
        self.state = LoadState::Loading;

        match self.source.fetch_page(&query).await {
            Ok(page) => {
                self.state = LoadState::Loaded(page.clone());
                Ok(page)
            }
            Err(error) => {
                self.state = LoadState::Failed(error.clone());
                Err(error)
            }
        }
    }

    /// Refetches the current query even if it is already loaded.
    pub async fn reload(&mut self) -> Result<Page<S::Item>, ApiError> {
        let query = self.current_query()?;
        self.invalidate();
        self.load(query).await
    }

    /// Drops the held page; the next load goes to the server.
    pub fn invalidate(&mut self) {
        if !matches!(self.state, LoadState::Idle) {
            self.state = LoadState::Idle;
        }
    }

    /// Moves forward one page; `None` when already on the last page.
    pub async fn next_page(&mut self) -> Option<Result<Page<S::Item>, ApiError>> {
        if !self.controls().has_next {
            return None;
        }
        let query = self.query.as_ref()?;
        let target = query.at_page(query.page_number().saturating_add(1));
        Some(self.load(target).await)
    }

    /// Moves back one page; `None` on the first page.
    pub async fn previous_page(&mut self) -> Option<Result<Page<S::Item>, ApiError>> {
        if !self.controls().has_previous {
            return None;
        }
        let query = self.query.as_ref()?;
        let target = query.at_page(query.page_number().saturating_sub(1));
        Some(self.load(target).await)
    }

    fn current_query(&self) -> Result<S::Query, ApiError> {
        self.query
            .clone()
            .ok_or_else(|| ApiError::invalid_request("nothing has been loaded yet"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(current_page: u32, total_pages: u32) -> PageMeta {
        PageMeta {
            current_page,
            next_page: (current_page < total_pages).then_some(current_page + 1),
            prev_page: (current_page > 1).then(|| current_page - 1),
            total_pages,
            total_count: u64::from(total_pages) * 20,
        }
    }

    #[test]
    fn page_query_rejects_zero_page_and_oversized_pages() {
        assert_eq!(PageQuery::new(0, 20), Err(ValidationError::InvalidPage));
        assert!(matches!(
            PageQuery::new(1, 500),
            Err(ValidationError::InvalidPageSize { value: 500, .. })
        ));
    }

    #[test]
    fn asset_query_pairs_skip_unset_filters() {
        let query = AssetQuery::new(
            PageQuery::new(2, 10)
                .expect("valid")
                .sorted_by("createdAt", SortOrder::Asc),
        )
        .with_type(AssetType::Crypto)
        .with_search("  ");

        let pairs = query.to_pairs();
        assert!(pairs.contains(&("type", Some(String::from("CRYPTO")))));
        assert!(pairs.contains(&("order", Some(String::from("asc")))));
        assert!(pairs.contains(&("q", None)));
        assert!(pairs.contains(&("page", Some(String::from("2")))));
    }

    #[test]
    fn previous_disabled_on_first_page_next_disabled_on_last() {
        let first = PaginationControls::from_meta(Some(&meta(1, 3)));
        assert!(!first.has_previous);
        assert!(first.has_next);

        let last = PaginationControls::from_meta(Some(&meta(3, 3)));
        assert!(last.has_previous);
        assert!(!last.has_next);

        let single = PaginationControls::from_meta(None);
        assert!(!single.has_previous && !single.has_next);
    }

    #[test]
    fn sort_order_parses_case_insensitively() {
        assert_eq!("DESC".parse::<SortOrder>(), Ok(SortOrder::Desc));
        assert!("sideways".parse::<SortOrder>().is_err());
    }
}
