//! Composition root: one session store shared by every client.

use std::sync::Arc;

use crate::auth::AuthClient;
use crate::config::Config;
use crate::http::{ApiClient, ReqwestTransport, Transport};
use crate::reports::ReportClient;
use crate::search::{KeywordList, SearchClient, SearchOrchestrator};
use crate::session::SessionStore;
use crate::store::{FileStore, KeyValueStore};
use crate::users::UserAdminClient;
use crate::Result;

pub struct Portal {
    config: Config,
    api: ApiClient,
}

impl Portal {
    pub fn new(config: Config, transport: Arc<dyn Transport>, store: Arc<dyn KeyValueStore>) -> Self {
        let api = ApiClient::new(transport, SessionStore::new(store));
        Self { config, api }
    }

    /// Production wiring: reqwest transport and an on-disk session.
    pub fn from_config(config: Config) -> Result<Self> {
        let session_file = match &config.session_file {
            Some(path) => path.clone(),
            None => FileStore::default_path()?,
        };
        let transport = Arc::new(ReqwestTransport::new(config.api_base_url.clone()));
        let store = Arc::new(FileStore::new(session_file));
        Ok(Self::new(config, transport, store))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> &SessionStore {
        self.api.session()
    }

    pub fn auth(&self) -> AuthClient {
        AuthClient::new(self.api.clone())
    }

    pub fn search(&self) -> SearchOrchestrator {
        self.search_with_page_size(self.config.page_size)
    }

    /// Orchestrator that pages at `page_size` instead of the configured size.
    pub fn search_with_page_size(&self, page_size: u32) -> SearchOrchestrator {
        SearchOrchestrator::new(SearchClient::new(self.api.clone()), page_size)
    }

    pub fn keywords(&self) -> KeywordList {
        KeywordList::new(self.config.min_keyword_len)
    }

    pub fn reports(&self) -> ReportClient {
        ReportClient::new(self.api.clone(), self.config.report_fetch_concurrency)
    }

    pub fn users(&self) -> UserAdminClient {
        UserAdminClient::new(self.api.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::{ok, FakeTransport};
    use crate::models::Category;
    use crate::store::MemoryStore;
    use serde_json::json;

    #[tokio::test]
    async fn clients_share_one_session() {
        let transport = FakeTransport::new(|req| match req.path.as_str() {
            "/api/login" => ok(json!({"status": "success", "role": "user", "token": "tok"})),
            "/api/get-data" => ok(json!({"status": "success", "search_id": "s-1"})),
            _ => ok(json!({"data": [], "total": 0, "page": 1, "page_size": 4, "total_pages": 0})),
        });
        let portal = Portal::new(Config::default(), transport.clone(), Arc::new(MemoryStore::new()));

        assert!(portal.auth().login("user", "User@123").await.success);

        let mut keywords = portal.keywords();
        keywords.add("robotics").unwrap();
        let mut search = portal.search();
        let page = search.search(&keywords, &[Category::News]).await.unwrap();
        assert!(page.is_empty());

        let sent = transport.sent();
        assert_eq!(sent[1].header_value("Authorization"), Some("Bearer tok"));
        assert_eq!(sent[2].path, "/api/search-results/s-1");
        assert_eq!(sent[2].query_value("data_type"), Some("news"));
    }

    #[tokio::test]
    async fn page_size_override_fetches_once() {
        let transport = FakeTransport::new(|req| match req.path.as_str() {
            "/api/get-data" => ok(json!({"status": "success", "search_id": "s-2"})),
            _ => ok(json!({"data": [], "total": 0, "page": 1, "page_size": 10, "total_pages": 0})),
        });
        let portal = Portal::new(Config::default(), transport.clone(), Arc::new(MemoryStore::new()));

        let mut keywords = portal.keywords();
        keywords.add("robotics").unwrap();
        let mut search = portal.search_with_page_size(10);
        search.search(&keywords, &[Category::All]).await.unwrap();

        let sent = transport.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].query_value("page_size"), Some("10"));
        assert_eq!(search.page_size(), 10);
    }
}
