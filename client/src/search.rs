//! Keyword search: submit a search, then page through its results.
//!
//! A submission mints a `search_id`; every later page fetch, page-size change
//! and narrowing category change reuses it. Only a category change that needs
//! tags the submission never asked for triggers a fresh search.

use std::collections::BTreeSet;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::decode as wire;
use crate::http::{segment, ApiClient};
use crate::models::{Category, DataType, Paginated, ResearchItem, ResultPage, SearchHit, SearchRequest};
use crate::pagination::first_index;
use crate::{Error, Result};

/// Ordered, de-duplicated keywords for one search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordList {
    keywords: Vec<String>,
    min_len: usize,
}

impl KeywordList {
    pub fn new(min_len: usize) -> Self {
        Self {
            keywords: Vec::new(),
            min_len,
        }
    }

    /// Add a keyword. On rejection the list is left unchanged.
    pub fn add(&mut self, keyword: &str) -> Result<()> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(Error::Validation("Keyword cannot be empty".to_string()));
        }
        if keyword.chars().count() < self.min_len {
            return Err(Error::Validation(format!(
                "Keyword must be at least {} characters",
                self.min_len
            )));
        }
        if self.contains(keyword) {
            return Err(Error::Validation(format!("'{}' is already in the list", keyword)));
        }
        self.keywords.push(keyword.to_string());
        Ok(())
    }

    pub fn remove(&mut self, keyword: &str) -> bool {
        let before = self.keywords.len();
        self.keywords
            .retain(|k| !k.eq_ignore_ascii_case(keyword.trim()));
        self.keywords.len() != before
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.keywords
            .iter()
            .any(|k| k.eq_ignore_ascii_case(keyword.trim()))
    }

    pub fn clear(&mut self) {
        self.keywords.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.keywords
    }
}

/// Backend tags selected through UI categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySelection {
    tags: BTreeSet<DataType>,
}

impl CategorySelection {
    pub fn all() -> Self {
        Self {
            tags: DataType::ALL.into_iter().collect(),
        }
    }

    /// `All`, or nothing at all, selects every tag.
    pub fn from_categories(categories: &[Category]) -> Self {
        if categories.is_empty() || categories.contains(&Category::All) {
            return Self::all();
        }
        Self {
            tags: categories.iter().filter_map(|c| c.data_type()).collect(),
        }
    }

    /// Tags in wire order.
    pub fn tags(&self) -> Vec<DataType> {
        self.tags.iter().copied().collect()
    }

    /// `data_type` filter for the results fetch: only for a single tag.
    pub fn result_filter(&self) -> Option<DataType> {
        match self.tags.len() {
            1 => self.tags.iter().next().copied(),
            _ => None,
        }
    }

    pub fn is_subset(&self, other: &CategorySelection) -> bool {
        self.tags.is_subset(&other.tags)
    }
}

impl Default for CategorySelection {
    fn default() -> Self {
        Self::all()
    }
}

/// `search_<unix millis>_<7 hex chars>`.
pub fn generate_search_id() -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("search_{}_{}", Utc::now().timestamp_millis(), &random[..7])
}

/// Stateless search endpoints.
#[derive(Clone)]
pub struct SearchClient {
    api: ApiClient,
}

impl SearchClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// `POST /api/get-data`; returns the acknowledged search id.
    pub async fn submit(&self, request: &SearchRequest) -> Result<String> {
        let body = self.api.post_json("/api/get-data", request).await?;
        let ack = wire::search_ack(body, &request.search_id)?;
        info!(
            search_id = %ack.search_id,
            keywords = request.keywords.len(),
            tags = ?request.data_type,
            reply = ack.message.as_deref().unwrap_or(""),
            "search submitted"
        );
        Ok(ack.search_id)
    }

    /// `GET /api/search-results/{search_id}` for one page.
    pub async fn fetch_page(
        &self,
        search_id: &str,
        selection: &CategorySelection,
        page: u32,
        page_size: u32,
    ) -> Result<ResultPage> {
        let path = format!("/api/search-results/{}", segment(search_id));
        let mut query = vec![("page", page.to_string()), ("page_size", page_size.to_string())];
        if let Some(tag) = selection.result_filter() {
            query.push(("data_type", tag.as_str().to_string()));
        }

        let body = self.api.get_json(&path, &query).await?;
        let raw = wire::result_page(body)?;
        Ok(to_result_page(search_id, raw, page, page_size))
    }
}

/// Number each item by its position across pages.
fn to_result_page(
    search_id: &str,
    raw: Paginated<ResearchItem>,
    requested_page: u32,
    page_size: u32,
) -> ResultPage {
    let page = if raw.page == 0 { requested_page } else { raw.page };
    let first = first_index(page, page_size);
    let items = raw
        .items
        .into_iter()
        .take(page_size as usize)
        .enumerate()
        .map(|(i, item)| SearchHit {
            index: first + i as u64,
            title: item.topic,
            description: item.summary,
            link: item.link,
            category: item.data_type.category(),
            data_type: item.data_type,
        })
        .collect();

    ResultPage {
        search_id: search_id.to_string(),
        items,
        total: raw.total,
        page,
        page_size,
        total_pages: match raw.total_pages {
            0 => crate::pagination::total_pages(raw.total, page_size),
            n => n,
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    Idle,
    Initiating,
    Fetching,
    Complete,
    Failed,
}

/// The search the orchestrator is currently paging through.
#[derive(Debug, Clone)]
struct ActiveSearch {
    search_id: String,
    keywords: Vec<String>,
    submitted: CategorySelection,
    selection: CategorySelection,
}

/// Drives one search view: submit, fetch, paginate, filter.
pub struct SearchOrchestrator {
    client: SearchClient,
    page_size: u32,
    phase: SearchPhase,
    active: Option<ActiveSearch>,
    results: Option<ResultPage>,
    message: Option<String>,
}

impl SearchOrchestrator {
    pub fn new(client: SearchClient, page_size: u32) -> Self {
        Self {
            client,
            page_size: page_size.max(1),
            phase: SearchPhase::Idle,
            active: None,
            results: None,
            message: None,
        }
    }

    pub fn phase(&self) -> SearchPhase {
        self.phase
    }

    pub fn results(&self) -> Option<&ResultPage> {
        self.results.as_ref()
    }

    /// Last user-facing error, cleared by the next successful step.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn search_id(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.search_id.as_str())
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Submit a new search and load its first page.
    pub async fn search(
        &mut self,
        keywords: &KeywordList,
        categories: &[Category],
    ) -> Result<&ResultPage> {
        if keywords.is_empty() {
            return self.fail(Error::Validation("Enter at least one keyword".to_string()));
        }
        let selection = CategorySelection::from_categories(categories);
        self.start(keywords.as_slice().to_vec(), selection).await
    }

    pub async fn go_to_page(&mut self, page: u32) -> Result<&ResultPage> {
        let total_pages = self.results.as_ref().map(|r| r.total_pages).unwrap_or(0);
        if page < 1 || page > total_pages {
            return Err(Error::Validation(format!(
                "Page {} is out of range (1-{})",
                page, total_pages
            )));
        }
        self.load(page).await
    }

    pub async fn next_page(&mut self) -> Result<&ResultPage> {
        let current = self.results.as_ref().map(|r| r.page).unwrap_or(0);
        self.go_to_page(current + 1).await
    }

    pub async fn previous_page(&mut self) -> Result<&ResultPage> {
        let current = self.results.as_ref().map(|r| r.page).unwrap_or(0);
        self.go_to_page(current.saturating_sub(1)).await
    }

    /// New page size, same search id, back to page 1.
    pub async fn change_page_size(&mut self, page_size: u32) -> Result<&ResultPage> {
        if page_size == 0 {
            return Err(Error::Validation("Page size must be at least 1".to_string()));
        }
        self.page_size = page_size;
        self.load(1).await
    }

    /// Narrowing within the submitted tags reuses the search id; widening
    /// beyond them submits a new search with the same keywords.
    pub async fn change_categories(&mut self, categories: &[Category]) -> Result<&ResultPage> {
        let selection = CategorySelection::from_categories(categories);
        let Some(active) = self.active.as_mut() else {
            return Err(Error::Validation("Run a search first".to_string()));
        };

        if selection.is_subset(&active.submitted) {
            active.selection = selection;
            return self.load(1).await;
        }

        let keywords = active.keywords.clone();
        info!(
            previous = %active.search_id,
            "category change widens the search, submitting again"
        );
        self.start(keywords, selection).await
    }

    /// Back to idle with nothing loaded.
    pub fn reset(&mut self) {
        self.phase = SearchPhase::Idle;
        self.active = None;
        self.results = None;
        self.message = None;
    }

    async fn start(&mut self, keywords: Vec<String>, selection: CategorySelection) -> Result<&ResultPage> {
        self.phase = SearchPhase::Initiating;
        self.results = None;

        let request = SearchRequest {
            search_id: generate_search_id(),
            keywords,
            data_type: selection.tags(),
        };

        let search_id = match self.client.submit(&request).await {
            Ok(id) => id,
            Err(e) => {
                self.active = None;
                return self.fail(e);
            }
        };

        self.active = Some(ActiveSearch {
            search_id,
            keywords: request.keywords,
            submitted: selection.clone(),
            selection,
        });
        self.load(1).await
    }

    async fn load(&mut self, page: u32) -> Result<&ResultPage> {
        let Some(active) = self.active.clone() else {
            return Err(Error::Validation("Run a search first".to_string()));
        };

        self.phase = SearchPhase::Fetching;
        match self
            .client
            .fetch_page(&active.search_id, &active.selection, page, self.page_size)
            .await
        {
            Ok(results) => {
                info!(
                    search_id = %active.search_id,
                    page = results.page,
                    items = results.items.len(),
                    total = results.total,
                    "results loaded"
                );
                self.phase = SearchPhase::Complete;
                self.message = None;
                Ok(self.results.insert(results))
            }
            Err(e) => self.fail(e),
        }
    }

    fn fail<T>(&mut self, error: Error) -> Result<T> {
        warn!(error = %error, "search failed");
        self.phase = SearchPhase::Failed;
        self.results = None;
        self.message = Some(error.to_string());
        Err(error)
    }
}
