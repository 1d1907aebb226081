//! Client library for the research portal backend.
//!
//! This crate provides the authenticated HTTP wrapper, session storage and the
//! auth, search, report and user-admin clients used by the console binaries.

pub mod auth;
pub mod config;
pub mod decode;
pub mod error;
pub mod http;
pub mod models;
pub mod pagination;
pub mod portal;
pub mod reports;
pub mod search;
pub mod session;
pub mod store;
pub mod users;
pub mod validation;

pub use auth::{AuthClient, LoginOutcome};
pub use config::Config;
pub use error::{Error, Result};
pub use http::{ApiClient, HttpRequest, HttpResponse, Method, ReqwestTransport, Transport};
pub use models::{
    ActionResult, Analytics, Category, DataType, Report, ResultPage, SearchHit, Session,
    UserAccount, UserProfile, UserRole, UserStatus, View,
};
pub use pagination::{page_numbers, PageMarker};
pub use portal::Portal;
pub use reports::{AllUsersReports, ReportClient, ReportListing, ReportQuery, UserFilter};
pub use search::{CategorySelection, KeywordList, SearchOrchestrator, SearchPhase};
pub use session::SessionStore;
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use users::{NewUser, UserAdminClient, UserUpdate};
