//! Shared data models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

/// UI-facing result category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    All,
    News,
    Articles,
    Papers,
}

impl Category {
    /// Backend tag for a concrete category; `None` for `All`.
    pub fn data_type(self) -> Option<DataType> {
        match self {
            Category::All => None,
            Category::News => Some(DataType::News),
            Category::Articles => Some(DataType::Article),
            Category::Papers => Some(DataType::Research),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Category::All => "All",
            Category::News => "News",
            Category::Articles => "Articles",
            Category::Papers => "Papers",
        };
        f.write_str(label)
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Category::All),
            "news" => Ok(Category::News),
            "articles" | "article" => Ok(Category::Articles),
            "papers" | "paper" | "research" => Ok(Category::Papers),
            other => Err(Error::Validation(format!("Unknown category '{}'", other))),
        }
    }
}

/// Backend category tag. Declaration order is the order tags are sent in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    News,
    Article,
    Research,
}

impl DataType {
    pub const ALL: [DataType; 3] = [DataType::News, DataType::Article, DataType::Research];

    pub fn as_str(self) -> &'static str {
        match self {
            DataType::News => "news",
            DataType::Article => "article",
            DataType::Research => "research",
        }
    }

    pub fn category(self) -> Category {
        match self {
            DataType::News => Category::News,
            DataType::Article => Category::Articles,
            DataType::Research => Category::Papers,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "news" => Ok(DataType::News),
            "article" => Ok(DataType::Article),
            "research" => Ok(DataType::Research),
            other => Err(Error::Decode(format!("Unknown data_type '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

impl FromStr for UserRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(UserRole::User),
            "admin" => Ok(UserRole::Admin),
            other => Err(Error::Decode(format!("Unknown role '{}'", other))),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
}

impl UserStatus {
    pub fn toggled(self) -> Self {
        match self {
            UserStatus::Active => UserStatus::Inactive,
            UserStatus::Inactive => UserStatus::Active,
        }
    }
}

impl FromStr for UserStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(UserStatus::Active),
            "inactive" => Ok(UserStatus::Inactive),
            other => Err(Error::Decode(format!("Unknown status '{}'", other))),
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UserStatus::Active => "active",
            UserStatus::Inactive => "inactive",
        })
    }
}

/// Profile of the logged-in user, kept alongside the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub status: UserStatus,
}

/// Bearer token plus the profile it was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub profile: UserProfile,
}

/// Where a freshly logged-in user lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Search,
    Admin,
}

impl From<UserRole> for View {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::Admin => View::Admin,
            UserRole::User => View::Search,
        }
    }
}

/// Account as listed on the user management screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserAccount {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub reports_count: u64,
    pub created_at: Option<DateTime<Utc>>,
}

/// Body of `POST /api/get-data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchRequest {
    pub search_id: String,
    pub keywords: Vec<String>,
    pub data_type: Vec<DataType>,
}

/// One rendered search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    /// 1-based position across all pages
    pub index: u64,
    pub title: String,
    pub description: String,
    pub link: String,
    pub category: Category,
    pub data_type: DataType,
}

/// Search result as the backend returns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResearchItem {
    pub topic: String,
    pub summary: String,
    pub link: String,
    pub data_type: DataType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

/// Displayable page of results for one search id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultPage {
    pub search_id: String,
    pub items: Vec<SearchHit>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

impl ResultPage {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// "Showing A to B of N results" footer text.
    pub fn summary(&self) -> String {
        crate::pagination::showing_range(self.page, self.page_size, self.total)
    }
}

/// A generated report summarising one search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub id: String,
    pub date: NaiveDate,
    pub keywords: Vec<String>,
    pub user: String,
    pub user_id: Option<String>,
    pub categories: Vec<DataType>,
    pub report_id: Option<String>,
    pub report_link: Option<String>,
}

/// Aggregate counters shown above the reports table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Analytics {
    pub total_reports: u64,
    pub total_users: u64,
}

/// Outcome of an operation whose failures are reported, never raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ActionResult<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl<T> From<crate::Result<T>> for ActionResult<T> {
    fn from(result: crate::Result<T>) -> Self {
        match result {
            Ok(data) => ActionResult::success(data),
            Err(e) => ActionResult::error(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_tag_mapping() {
        assert_eq!(Category::News.data_type(), Some(DataType::News));
        assert_eq!(Category::Articles.data_type(), Some(DataType::Article));
        assert_eq!(Category::Papers.data_type(), Some(DataType::Research));
        assert_eq!(Category::All.data_type(), None);
        for tag in DataType::ALL {
            assert_eq!(tag.category().data_type(), Some(tag));
        }
    }

    #[test]
    fn data_type_serializes_lowercase() {
        let json = serde_json::to_string(&DataType::ALL).unwrap();
        assert_eq!(json, r#"["news","article","research"]"#);
    }

    #[test]
    fn parse_labels() {
        assert_eq!("papers".parse::<Category>().unwrap(), Category::Papers);
        assert_eq!("All".parse::<Category>().unwrap(), Category::All);
        assert!("blogs".parse::<Category>().is_err());
        assert!(matches!("video".parse::<DataType>(), Err(Error::Decode(_))));
    }

    #[test]
    fn role_decides_landing_view() {
        assert_eq!(View::from(UserRole::Admin), View::Admin);
        assert_eq!(View::from(UserRole::User), View::Search);
    }

    #[test]
    fn action_result_from_result() {
        let ok: ActionResult<u32> = Ok(3).into();
        assert!(ok.success);
        assert_eq!(ok.data, Some(3));

        let failed: ActionResult<u32> = Err(Error::Validation("Invalid email format".into())).into();
        assert!(!failed.success);
        assert_eq!(failed.message.as_deref(), Some("Invalid email format"));
    }
}
