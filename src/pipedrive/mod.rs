use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde_json::json;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;
use crate::model::ContactMatch;
use crate::pipedrive::model::{CreateNoteResp, PersonSearchResp};

pub mod model;

/// Outbound calls get a bounded timeout so a stalled CRM cannot block an
/// event indefinitely.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// CRM failure classes. A `Status`/`Transport` error during search is folded
/// into "not found" by the pipeline but stays distinguishable here from a
/// genuine zero-result response (`Ok(None)`).
#[derive(Debug, Error)]
pub enum CrmError {
    #[error("failed to reach Pipedrive: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Pipedrive returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("Pipedrive rejected the request: {0}")]
    Rejected(String),
    #[error("invalid Pipedrive response JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The two CRM operations the pipeline needs. Abstracted as a trait so tests
/// can substitute a recording fake.
#[async_trait]
pub trait CrmService: Send + Sync {
    /// Exact-match search on the email field. `Ok(None)` means the CRM
    /// confirmed there is no such person; a loose match never produces a
    /// `ContactMatch`.
    async fn find_person_by_email(&self, email: &str) -> Result<Option<ContactMatch>, CrmError>;

    /// Attach one note to a person. Non-2xx responses and an explicit
    /// `success: false` body both count as failure.
    async fn add_note(&self, person_id: i64, content: &str) -> Result<(), CrmError>;
}

#[derive(Clone)]
pub struct PipedriveClient {
    http: Client,
    search_url: Url,
    notes_url: Url,
    api_token: String,
}

impl fmt::Debug for PipedriveClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipedriveClient")
            .field("search_url", &self.search_url)
            .finish_non_exhaustive()
    }
}

impl PipedriveClient {
    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        Self::new(&cfg.pipedrive.company_domain, cfg.pipedrive.api_token.clone())
    }

    pub fn new(company_domain: &str, api_token: String) -> anyhow::Result<Self> {
        let base_url = Url::parse(&format!("https://{company_domain}.pipedrive.com/"))
            .map_err(|e| anyhow::anyhow!("invalid Pipedrive company domain: {e}"))?;
        Self::with_base_url(base_url, api_token)
    }

    pub fn with_base_url(base_url: Url, api_token: String) -> anyhow::Result<Self> {
        let http = Client::builder()
            .user_agent("fathom-bridge/0.1")
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client");
        let search_url = base_url
            .join("v1/persons/search")
            .map_err(|e| anyhow::anyhow!("invalid Pipedrive base URL: {e}"))?;
        let notes_url = base_url
            .join("v1/notes")
            .map_err(|e| anyhow::anyhow!("invalid Pipedrive base URL: {e}"))?;
        Ok(Self {
            http,
            search_url,
            notes_url,
            api_token,
        })
    }

    pub fn build_search_request(&self, email: &str) -> Result<reqwest::Request, CrmError> {
        Ok(self
            .http
            .get(self.search_url.clone())
            .query(&[
                ("term", email),
                ("fields", "email"),
                ("exact_match", "true"),
                ("api_token", self.api_token.as_str()),
            ])
            .build()?)
    }

    pub fn build_note_request(
        &self,
        person_id: i64,
        content: &str,
    ) -> Result<reqwest::Request, CrmError> {
        Ok(self
            .http
            .post(self.notes_url.clone())
            .query(&[("api_token", self.api_token.as_str())])
            .json(&json!({ "content": content, "person_id": person_id }))
            .build()?)
    }
}

#[async_trait]
impl CrmService for PipedriveClient {
    async fn find_person_by_email(&self, email: &str) -> Result<Option<ContactMatch>, CrmError> {
        info!(email, "searching Pipedrive for person");
        let request = self.build_search_request(email)?;
        let res = self.http.execute(request).await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            warn!(%status, body = %body, "Pipedrive search failed");
            return Err(CrmError::Status { status, body });
        }

        let body = res.text().await?;
        let resp: PersonSearchResp = serde_json::from_str(&body)?;
        let person = match resp.data.and_then(|d| d.items.into_iter().next()) {
            Some(item) => item.item,
            None => return Ok(None),
        };
        match person.id {
            Some(id) => {
                let name = person.name.unwrap_or_default();
                info!(id, name = %name, "found person in Pipedrive");
                Ok(Some(ContactMatch {
                    id,
                    name,
                    email: email.to_string(),
                }))
            }
            // An item without an id is not a usable match.
            None => Ok(None),
        }
    }

    async fn add_note(&self, person_id: i64, content: &str) -> Result<(), CrmError> {
        info!(person_id, "adding note to Pipedrive person");
        let request = self.build_note_request(person_id, content)?;
        let res = self.http.execute(request).await?;
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        if !status.is_success() {
            warn!(%status, body = %body, "Pipedrive note creation failed");
            return Err(CrmError::Status { status, body });
        }

        let resp: CreateNoteResp = serde_json::from_str(&body)?;
        if !resp.success {
            warn!(person_id, body = %body, "Pipedrive reported note creation failure");
            return Err(CrmError::Rejected(body));
        }
        info!(person_id, "note added");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> PipedriveClient {
        PipedriveClient::new("testco", "token".into()).unwrap()
    }

    #[test]
    fn search_request_asks_for_exact_match() {
        let request = client().build_search_request("alice@ext.com").unwrap();
        assert_eq!(request.method(), reqwest::Method::GET);
        let url = request.url();
        assert_eq!(url.host_str(), Some("testco.pipedrive.com"));
        assert_eq!(url.path(), "/v1/persons/search");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&("term".into(), "alice@ext.com".into())));
        assert!(pairs.contains(&("fields".into(), "email".into())));
        assert!(pairs.contains(&("exact_match".into(), "true".into())));
        assert!(pairs.contains(&("api_token".into(), "token".into())));
    }

    #[test]
    fn note_request_posts_json_body() {
        let request = client().build_note_request(42, "<h2>Sync</h2>").unwrap();
        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(request.url().path(), "/v1/notes");
        assert_eq!(
            request.url().query_pairs().next().map(|(k, _)| k.into_owned()),
            Some("api_token".to_string())
        );
        let body = request.body().and_then(|b| b.as_bytes()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(body).unwrap();
        assert_eq!(value, json!({ "content": "<h2>Sync</h2>", "person_id": 42 }));
    }

    #[test]
    fn invalid_company_domain_is_rejected() {
        assert!(PipedriveClient::new("bad domain", "token".into()).is_err());
    }

    #[test]
    fn search_response_with_items_parses() {
        let resp: PersonSearchResp = serde_json::from_value(json!({
            "success": true,
            "data": { "items": [ { "item": { "id": 42, "name": "Alice" } } ] }
        }))
        .unwrap();
        let item = resp.data.unwrap().items.into_iter().next().unwrap().item;
        assert_eq!(item.id, Some(42));
        assert_eq!(item.name.as_deref(), Some("Alice"));
    }

    #[test]
    fn search_response_with_null_data_parses_to_empty() {
        let resp: PersonSearchResp =
            serde_json::from_value(json!({ "success": true, "data": null })).unwrap();
        assert!(resp.data.is_none());
    }

    #[test]
    fn note_response_reports_success_flag() {
        let resp: CreateNoteResp = serde_json::from_value(json!({ "success": false })).unwrap();
        assert!(!resp.success);
        let resp: CreateNoteResp = serde_json::from_value(json!({ "success": true })).unwrap();
        assert!(resp.success);
    }
}
