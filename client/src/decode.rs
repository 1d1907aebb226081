//! Response decoding at the network boundary.
//!
//! The backend is loose about field names and shapes. Each public function
//! here takes one response body and returns a strict record or
//! [`Error::Decode`]; nothing past this module inspects raw JSON.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::models::{
    Analytics, Category, DataType, Paginated, Report, ResearchItem, UserAccount, UserRole,
    UserStatus,
};
use crate::{Error, Result};

/// Reply to `POST /api/login`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginReply {
    pub success: bool,
    pub role: Option<UserRole>,
    pub token: Option<String>,
    pub message: Option<String>,
}

/// Reply to `POST /api/get-data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchAck {
    pub search_id: String,
    pub message: Option<String>,
}

pub fn login(body: Value) -> Result<LoginReply> {
    let obj = object(&body, "login response")?;
    let f = Fields(obj);
    let status = f.text(&["status"]);
    let token = f.text(&["token", "access_token"]).filter(|t| !t.trim().is_empty());
    let role = f.text(&["role"]).map(|r| r.parse()).transpose()?;

    Ok(LoginReply {
        success: status.as_deref().map(is_success).unwrap_or(false) && token.is_some(),
        role,
        token,
        message: f.text(&["message", "detail"]),
    })
}

pub fn search_ack(body: Value, sent_id: &str) -> Result<SearchAck> {
    let obj = object(&body, "search response")?;
    let f = Fields(obj);
    let message = f.text(&["message"]);
    match f.text(&["status"]) {
        Some(status) if is_success(&status) => Ok(SearchAck {
            search_id: f.id(&["search_id"]).unwrap_or_else(|| sent_id.to_string()),
            message,
        }),
        _ => Err(Error::Api {
            status: 200,
            message: message.unwrap_or_else(|| "Failed to initiate search".to_string()),
        }),
    }
}

#[derive(Deserialize)]
struct RawResearchItem {
    topic: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    link: String,
    data_type: String,
}

pub fn result_page(body: Value) -> Result<Paginated<ResearchItem>> {
    let obj = object(&body, "search results")?;
    let raw_items = array(obj, &["data", "results"], "search results")?;

    let mut items = Vec::with_capacity(raw_items.len());
    for raw in raw_items {
        let raw: RawResearchItem = serde_json::from_value(raw.clone())
            .map_err(|e| Error::Decode(format!("Invalid search result: {}", e)))?;
        items.push(ResearchItem {
            topic: raw.topic,
            summary: raw.summary,
            link: raw.link,
            data_type: raw.data_type.parse()?,
        });
    }

    paginate(obj, items)
}

pub fn report_page(body: Value) -> Result<Paginated<Report>> {
    let obj = object(&body, "report listing")?;
    let reports = array(obj, &["searches", "reports", "data"], "report listing")?
        .iter()
        .map(report)
        .collect::<Result<Vec<_>>>()?;
    paginate(obj, reports)
}

/// Accepts a bare array or an envelope with `reports`/`searches`/`data`.
pub fn report_list(body: Value) -> Result<Vec<Report>> {
    let items = match &body {
        Value::Array(items) => items,
        Value::Object(obj) => array(obj, &["reports", "searches", "data"], "report list")?,
        _ => return Err(Error::Decode("Report list must be an array or object".to_string())),
    };
    items.iter().map(report).collect()
}

pub fn analytics(body: Value) -> Result<Analytics> {
    let obj = object(&body, "analytics")?;
    let f = Fields(obj);
    Ok(Analytics {
        total_reports: f.count(&["total_reports", "reports_generated", "reportsGenerated"])?,
        total_users: f.count(&["total_users", "totalUsers"])?,
    })
}

pub fn user_list(body: Value) -> Result<Vec<UserAccount>> {
    let items = match &body {
        Value::Array(items) => items,
        Value::Object(obj) => array(obj, &["users", "data"], "user list")?,
        _ => return Err(Error::Decode("User list must be an array or object".to_string())),
    };
    items.iter().map(user).collect()
}

/// Generic `{status, message}` acknowledgement; a non-success status is an error.
pub fn action_ack(body: Value) -> Result<Option<String>> {
    let obj = match &body {
        Value::Object(obj) => obj,
        Value::Null => return Ok(None),
        _ => return Err(Error::Decode("Acknowledgement must be an object".to_string())),
    };
    let f = Fields(obj);
    let message = f.text(&["message", "detail"]);
    match f.text(&["status"]) {
        Some(status) if !is_success(&status) => Err(Error::Api {
            status: 200,
            message: message.unwrap_or_else(|| "Request failed".to_string()),
        }),
        _ => Ok(message),
    }
}

fn report(value: &Value) -> Result<Report> {
    let obj = object(value, "report")?;
    let f = Fields(obj);

    let id = f
        .id(&["id", "search_id", "searchId"])
        .ok_or_else(|| Error::Decode("Report is missing an id".to_string()))?;
    let raw_date = f
        .text(&["date", "created_at", "createdAt", "timestamp"])
        .ok_or_else(|| Error::Decode(format!("Report {} is missing a date", id)))?;

    let categories = f
        .list(&["categories", "data_type", "data_types"])
        .iter()
        .map(|label| tag(label))
        .collect::<Result<Vec<_>>>()?;

    Ok(Report {
        date: date(&raw_date)?,
        keywords: f.list(&["keywords"]),
        user: f
            .text(&["user", "username", "email", "user_email"])
            .unwrap_or_default(),
        user_id: f.id(&["user_id", "userId"]),
        categories,
        report_id: f.id(&["report_id", "reportId"]),
        report_link: f.text(&["report_link", "reportLink", "download_url"]),
        id,
    })
}

fn user(value: &Value) -> Result<UserAccount> {
    let obj = object(value, "user")?;
    let f = Fields(obj);

    let id = f
        .id(&["id", "user_id", "_id"])
        .ok_or_else(|| Error::Decode("User is missing an id".to_string()))?;
    let email = f.text(&["email"]).unwrap_or_default();
    let username = f
        .text(&["username", "name"])
        .or_else(|| email.split('@').next().map(str::to_string))
        .unwrap_or_default();

    let status = match (f.text(&["status"]), obj.get("is_active").and_then(Value::as_bool)) {
        (Some(status), _) => status.parse()?,
        (None, Some(true)) | (None, None) => UserStatus::Active,
        (None, Some(false)) => UserStatus::Inactive,
    };

    let created_at = f
        .text(&["created_at", "createdAt"])
        .map(|raw| timestamp(&raw))
        .transpose()?;

    Ok(UserAccount {
        role: f
            .text(&["role"])
            .map(|r| r.parse())
            .transpose()?
            .unwrap_or(UserRole::User),
        reports_count: f.count(&["reports_count", "reportsCount", "report_count"])?,
        id,
        username,
        email,
        status,
        created_at,
    })
}

fn paginate<T>(obj: &Map<String, Value>, items: Vec<T>) -> Result<Paginated<T>> {
    let f = Fields(obj);
    let total = f.count(&["total"])?;
    let page = f.count(&["page"])?.max(1) as u32;
    let page_size = f.count(&["page_size", "pageSize"])? as u32;
    let total_pages = match f.count(&["total_pages", "totalPages"])? as u32 {
        0 => crate::pagination::total_pages(total, page_size),
        n => n,
    };
    Ok(Paginated {
        items,
        total,
        page,
        page_size,
        total_pages,
    })
}

/// Report categories arrive either as backend tags or UI labels.
fn tag(label: &str) -> Result<DataType> {
    label
        .parse::<DataType>()
        .ok()
        .or_else(|| label.parse::<Category>().ok().and_then(Category::data_type))
        .ok_or_else(|| Error::Decode(format!("Unknown category '{}'", label)))
}

fn date(raw: &str) -> Result<NaiveDate> {
    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(day);
    }
    timestamp(raw)
        .map(|t| t.date_naive())
        .map_err(|_| Error::Decode(format!("Invalid date '{}'", raw)))
}

fn timestamp(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Ok(t.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|t| t.and_utc())
        .map_err(|_| Error::Decode(format!("Invalid timestamp '{}'", raw)))
}

fn is_success(status: &str) -> bool {
    matches!(status.to_ascii_lowercase().as_str(), "success" | "ok")
}

fn object<'a>(value: &'a Value, what: &str) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| Error::Decode(format!("Expected {} to be an object", what)))
}

fn array<'a>(obj: &'a Map<String, Value>, keys: &[&str], what: &str) -> Result<&'a Vec<Value>> {
    match Fields(obj).first(keys) {
        Some(Value::Array(items)) => Ok(items),
        Some(Value::Null) | None => Err(Error::Decode(format!("{} has no items array", what))),
        Some(_) => Err(Error::Decode(format!("{} items must be an array", what))),
    }
}

/// First-present-key lookups over one JSON object.
struct Fields<'a>(&'a Map<String, Value>);

impl<'a> Fields<'a> {
    fn first(&self, keys: &[&str]) -> Option<&'a Value> {
        keys.iter()
            .filter_map(|k| self.0.get(*k))
            .find(|v| !v.is_null())
    }

    fn text(&self, keys: &[&str]) -> Option<String> {
        self.first(keys).and_then(Value::as_str).map(str::to_string)
    }

    /// Ids come as numbers or strings.
    fn id(&self, keys: &[&str]) -> Option<String> {
        match self.first(keys)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    fn count(&self, keys: &[&str]) -> Result<u64> {
        match self.first(keys) {
            None => Ok(0),
            Some(Value::Number(n)) => n
                .as_u64()
                .ok_or_else(|| Error::Decode(format!("{} must be a non-negative integer", keys[0]))),
            Some(Value::String(s)) => s
                .trim()
                .parse()
                .map_err(|_| Error::Decode(format!("{} must be a non-negative integer", keys[0]))),
            Some(_) => Err(Error::Decode(format!("{} must be a number", keys[0]))),
        }
    }

    /// Arrays of strings, or a comma separated string.
    fn list(&self, keys: &[&str]) -> Vec<String> {
        match self.first(keys) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            Some(Value::String(s)) => s
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn login_requires_success_and_token() {
        let reply = login(json!({"status": "success", "role": "admin", "token": "t"})).unwrap();
        assert!(reply.success);
        assert_eq!(reply.role, Some(UserRole::Admin));

        let reply = login(json!({"status": "success", "token": ""})).unwrap();
        assert!(!reply.success);

        let reply = login(json!({"status": "error", "message": "Invalid username or password"}))
            .unwrap();
        assert!(!reply.success);
        assert_eq!(reply.message.as_deref(), Some("Invalid username or password"));
    }

    #[test]
    fn search_ack_rejects_failure_status() {
        let ack = search_ack(json!({"status": "success", "search_id": "s1"}), "s0").unwrap();
        assert_eq!(ack.search_id, "s1");

        let err = search_ack(json!({"status": "error", "message": "quota"}), "s0").unwrap_err();
        assert!(err.to_string().contains("quota"));
    }

    #[test]
    fn result_page_decodes_and_rejects_unknown_tags() {
        let page = result_page(json!({
            "status": "success",
            "data": [{"topic": "AI", "summary": "s", "link": "http://x", "data_type": "research"}],
            "total": 10, "page": 1, "page_size": 4, "total_pages": 3
        }))
        .unwrap();
        assert_eq!(page.items[0].data_type, DataType::Research);
        assert_eq!((page.total, page.total_pages), (10, 3));

        let err = result_page(json!({
            "data": [{"topic": "AI", "data_type": "video"}], "total": 1
        }))
        .unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn missing_total_pages_is_derived() {
        let page = result_page(json!({"data": [], "total": 9, "page": 1, "page_size": 4})).unwrap();
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn report_fields_are_normalised() {
        let reports = report_list(json!([
            {
                "id": 7, "created_at": "2025-03-02T10:15:00", "keywords": "ai, robotics",
                "username": "alice", "data_type": ["news", "Papers"], "reportId": "r-7"
            },
            {
                "search_id": "abc", "date": "2025-03-01", "keywords": ["quantum"],
                "user": "bob", "report_id": 12
            }
        ]))
        .unwrap();

        assert_eq!(reports[0].id, "7");
        assert_eq!(reports[0].date, NaiveDate::from_ymd_opt(2025, 3, 2).unwrap());
        assert_eq!(reports[0].keywords, vec!["ai", "robotics"]);
        assert_eq!(reports[0].categories, vec![DataType::News, DataType::Research]);
        assert_eq!(reports[0].report_id.as_deref(), Some("r-7"));
        assert_eq!(reports[1].id, "abc");
        assert_eq!(reports[1].report_id.as_deref(), Some("12"));
    }

    #[test]
    fn report_envelope_and_missing_date() {
        let reports = report_list(json!({"reports": []})).unwrap();
        assert!(reports.is_empty());

        let err = report_list(json!([{"id": 1}])).unwrap_err();
        assert!(err.to_string().contains("missing a date"));
    }

    #[test]
    fn users_decode_with_alternate_names() {
        let users = user_list(json!({"users": [
            {"id": 3, "username": "alice", "email": "alice@example.com", "role": "user",
             "status": "inactive", "reportsCount": 4, "createdAt": "2025-01-01T00:00:00Z"},
            {"_id": "u9", "email": "bob@example.com", "is_active": true}
        ]}))
        .unwrap();
        assert_eq!(users[0].id, "3");
        assert_eq!(users[0].status, UserStatus::Inactive);
        assert_eq!(users[0].reports_count, 4);
        assert!(users[0].created_at.is_some());
        assert_eq!(users[1].username, "bob");
        assert_eq!(users[1].role, UserRole::User);
        assert_eq!(users[1].status, UserStatus::Active);
    }

    #[test]
    fn analytics_counts() {
        let a = analytics(json!({"total_reports": 12, "total_users": "3"})).unwrap();
        assert_eq!(a, Analytics { total_reports: 12, total_users: 3 });
        assert!(analytics(json!({"total_reports": -1})).is_err());
    }

    #[test]
    fn action_ack_status() {
        assert_eq!(
            action_ack(json!({"status": "success", "message": "User created"})).unwrap(),
            Some("User created".to_string())
        );
        assert!(action_ack(json!({"status": "error", "message": "Email already exists"})).is_err());
        assert_eq!(action_ack(Value::Null).unwrap(), None);
    }
}
