//! Report listings, analytics and PDF retrieval.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{info, warn};

use crate::decode as wire;
use crate::http::{segment, ApiClient};
use crate::models::{Analytics, Report, UserAccount, UserRole};
use crate::{Error, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Whose reports to list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UserFilter {
    #[default]
    All,
    User(String),
}

impl UserFilter {
    fn as_query(&self) -> &str {
        match self {
            UserFilter::All => "all",
            UserFilter::User(id) => id,
        }
    }
}

/// Filters for the admin report table. Date bounds are inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportQuery {
    pub user: UserFilter,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub page: u32,
    pub page_size: u32,
}

impl ReportQuery {
    pub fn new(page_size: u32) -> Self {
        Self {
            user: UserFilter::All,
            from: None,
            to: None,
            page: 1,
            page_size,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(Error::Validation(
                    "From date must not be after to date".to_string(),
                ));
            }
        }
        if self.page == 0 || self.page_size == 0 {
            return Err(Error::Validation("Page and page size start at 1".to_string()));
        }
        Ok(())
    }
}

/// One page of the admin report table plus the headline counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportListing {
    pub reports: Vec<Report>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub analytics: Analytics,
}

/// Reports gathered user by user; failed users are listed, not fatal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllUsersReports {
    pub reports: Vec<Report>,
    pub skipped: Vec<String>,
}

#[derive(Serialize)]
struct AnalyticsBody {
    date_filter: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    from_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    to_date: Option<String>,
}

#[derive(Clone)]
pub struct ReportClient {
    api: ApiClient,
    concurrency: usize,
}

impl ReportClient {
    pub fn new(api: ApiClient, concurrency: usize) -> Self {
        Self {
            api,
            concurrency: concurrency.max(1),
        }
    }

    /// Report page and analytics counters for the admin dashboard.
    pub async fn get_reports(&self, query: &ReportQuery) -> Result<ReportListing> {
        query.validate()?;

        let mut params = vec![
            ("page", query.page.to_string()),
            ("page_size", query.page_size.to_string()),
            ("user_id", query.user.as_query().to_string()),
        ];
        if let Some(from) = query.from {
            params.push(("from_date", from.format(DATE_FORMAT).to_string()));
        }
        if let Some(to) = query.to {
            params.push(("to_date", to.format(DATE_FORMAT).to_string()));
        }

        let body = self.api.get_json("/api/admin/search-results", &params).await?;
        let page = wire::report_page(body)?;
        let analytics = self.analytics(query.from, query.to).await?;

        info!(
            user = query.user.as_query(),
            page = page.page,
            reports = page.items.len(),
            total = page.total,
            "report listing loaded"
        );

        Ok(ReportListing {
            reports: page.items,
            total: page.total,
            page: page.page,
            page_size: if page.page_size == 0 { query.page_size } else { page.page_size },
            total_pages: page.total_pages,
            analytics,
        })
    }

    /// `POST /api/admin/analytics`
    pub async fn analytics(&self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<Analytics> {
        let body = AnalyticsBody {
            date_filter: if from.is_some() || to.is_some() { "custom" } else { "all" },
            from_date: from.map(|d| d.format(DATE_FORMAT).to_string()),
            to_date: to.map(|d| d.format(DATE_FORMAT).to_string()),
        };
        let reply = self.api.post_json("/api/admin/analytics", &body).await?;
        wire::analytics(reply)
    }

    /// Reports owned by the logged-in user.
    pub async fn my_reports(&self) -> Result<Vec<Report>> {
        let body = self.api.get_json("/api/reports", &[]).await?;
        wire::report_list(body)
    }

    /// Reports for one user (admin only).
    pub async fn user_reports(&self, user_id: &str) -> Result<Vec<Report>> {
        let user_id = required(user_id, "User ID is missing.")?;
        let path = format!("/api/admin/reports/{}", segment(user_id));
        let body = self.api.get_json(&path, &[]).await?;
        wire::report_list(body)
    }

    /// Reports for every non-admin account. A user whose request fails is
    /// recorded in `skipped` and the rest continue.
    pub async fn reports_for_all_users(&self, users: &[UserAccount]) -> AllUsersReports {
        let targets: Vec<&UserAccount> = users.iter().filter(|u| u.role == UserRole::User).collect();

        let results: Vec<(String, Result<Vec<Report>>)> = stream::iter(targets)
            .map(|user| async move { (user.id.clone(), self.user_reports(&user.id).await) })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut collected = AllUsersReports::default();
        for (user_id, result) in results {
            match result {
                Ok(mut reports) => collected.reports.append(&mut reports),
                Err(e) => {
                    warn!(user_id = %user_id, error = %e, "skipping user reports");
                    collected.skipped.push(user_id);
                }
            }
        }
        collected
    }

    /// PDF bytes for in-place preview.
    pub async fn fetch_report_blob(&self, report_id: &str) -> Result<Bytes> {
        let report_id = required(report_id, "Report ID is missing.")?;
        let path = format!("/api/download-report/{}", segment(report_id));
        let bytes = self.api.get_bytes(&path).await?;
        if bytes.is_empty() {
            return Err(Error::Decode(format!("Report {} is empty", report_id)));
        }
        Ok(bytes)
    }

    /// Save the report PDF into `dir` and return the written path.
    pub async fn download_report(&self, report_id: &str, dir: &Path) -> Result<PathBuf> {
        let bytes = self.fetch_report_blob(report_id).await?;
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(file_name(report_id.trim()));
        tokio::fs::write(&path, &bytes).await?;
        info!(report_id = %report_id.trim(), path = %path.display(), bytes = bytes.len(), "report downloaded");
        Ok(path)
    }
}

fn required<'a>(id: &'a str, message: &str) -> Result<&'a str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(Error::MissingIdentifier(message.to_string()));
    }
    Ok(id)
}

/// `report_<id>.pdf` with anything unsafe for a filename replaced.
fn file_name(report_id: &str) -> String {
    let safe: String = report_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("report_{}.pdf", safe)
}
