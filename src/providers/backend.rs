//! REST client for the favorites and history backend.

use crate::core::favorites::{FavoritePair, FavoritesStore};
use crate::core::history::{HistoryChange, HistoryEntry, HistoryStore};
use crate::providers::util::{join_url, with_retry};
use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use futures::future::try_join_all;
use reqwest::{Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, instrument};

pub struct BackendClient {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct DataResponse<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct NewFavorite<'a> {
    from_currency: &'a str,
    to_currency: &'a str,
}

#[derive(Debug, Serialize)]
struct NewHistoryRow<'a> {
    from_amount: &'a str,
    from_currency: &'a str,
    to_amount: &'a str,
    to_currency: &'a str,
    rate: f64,
    description: Option<&'a str>,
    timestamp: Option<i64>,
}

impl<'a> NewHistoryRow<'a> {
    /// Checks the fields the backend requires before anything is sent.
    fn validated(entry: &'a HistoryEntry) -> Result<Self> {
        let required = [
            ("from_amount", &entry.from_amount),
            ("from_currency", &entry.from_currency),
            ("to_amount", &entry.to_amount),
            ("to_currency", &entry.to_currency),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            bail!("Missing required fields: {}", missing.join(", "));
        }
        if !(entry.rate.is_finite() && entry.rate > 0.0) {
            bail!("Invalid rate: {}", entry.rate);
        }

        Ok(NewHistoryRow {
            from_amount: &entry.from_amount,
            from_currency: &entry.from_currency,
            to_amount: &entry.to_amount,
            to_currency: &entry.to_currency,
            rate: entry.rate,
            description: entry.description.as_deref(),
            timestamp: entry.created_millis(),
        })
    }
}

impl BackendClient {
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("xfx/1.0")
            .build()
            .context("Failed to build HTTP client")?;
        Ok(BackendClient {
            base_url: base_url.to_string(),
            token: token.map(str::to_string),
            client,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, join_url(&self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Turns a non-success response into an error carrying the backend's
    /// `error` message when there is one.
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&text)
            .map(|e| e.error)
            .unwrap_or(text);
        Err(anyhow!("Backend error ({}): {}", status, message))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = with_retry(|| self.request(Method::GET, path).send(), 3, 500).await?;
        let body: DataResponse<T> = Self::check(response)
            .await?
            .json()
            .await
            .with_context(|| format!("Failed to parse response for {path}"))?;
        Ok(body.data)
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let response = self.request(Method::POST, path).json(body).send().await?;
        let body: DataResponse<T> = Self::check(response)
            .await?
            .json()
            .await
            .with_context(|| format!("Failed to parse response for {path}"))?;
        Ok(body.data)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let response = self.request(Method::DELETE, path).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn delete_history(&self, entries: &[HistoryEntry]) -> Result<()> {
        let paths: Vec<String> = entries
            .iter()
            .map(|entry| format!("/history/{}", entry.id))
            .collect();
        try_join_all(paths.iter().map(|path| self.delete(path))).await?;
        debug!("Deleted {} history entries", paths.len());
        Ok(())
    }
}

#[async_trait]
impl FavoritesStore for BackendClient {
    #[instrument(name = "BackendFavoritesList", skip(self))]
    async fn list(&self) -> Result<Vec<FavoritePair>> {
        let pairs: Vec<FavoritePair> = self.get("/favorites").await?;
        debug!("Fetched {} favorites", pairs.len());
        Ok(pairs)
    }

    #[instrument(name = "BackendFavoritesAdd", skip(self))]
    async fn add(&self, from_currency: &str, to_currency: &str) -> Result<FavoritePair> {
        let rows: Vec<FavoritePair> = self
            .post(
                "/favorites",
                &NewFavorite {
                    from_currency,
                    to_currency,
                },
            )
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| anyhow!("Backend returned no row for favorite {from_currency}/{to_currency}"))
    }

    #[instrument(name = "BackendFavoritesRemove", skip(self))]
    async fn remove(&self, id: &str) -> Result<()> {
        self.delete(&format!("/favorites/{id}")).await
    }
}

#[async_trait]
impl HistoryStore for BackendClient {
    #[instrument(name = "BackendHistoryLoad", skip(self))]
    async fn load(&self) -> Result<Vec<HistoryEntry>> {
        let entries: Vec<HistoryEntry> = self.get("/history").await?;
        debug!("Fetched {} history entries", entries.len());
        Ok(entries)
    }

    async fn persist(&self, change: HistoryChange<'_>, _snapshot: &[HistoryEntry]) -> Result<()> {
        match change {
            HistoryChange::Added { entry, removed } => {
                let row = NewHistoryRow::validated(entry)?;
                let _: Vec<HistoryEntry> = self.post("/history", &row).await?;
                self.delete_history(removed).await
            }
            HistoryChange::Updated(entry) => {
                bail!("The backend cannot update history entry {}", entry.id)
            }
            HistoryChange::Removed(entries) => self.delete_history(entries).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn entry() -> HistoryEntry {
        let mut entry =
            HistoryEntry::new("100", "USD", "90", "EUR", 0.9, Some("rent".to_string()));
        entry.timestamp = Some(1_700_000_000_000);
        entry
    }

    #[tokio::test]
    async fn test_list_favorites_sends_token() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/favorites"))
            .and(header("authorization", "Bearer anon"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"data": [
                    {"id": 1, "from_currency": "USD", "to_currency": "EUR", "created_at": "2025-01-01T00:00:00Z"},
                    {"id": "2", "from_currency": "INR", "to_currency": "USD"}
                ]}"#,
            ))
            .mount(&mock_server)
            .await;

        let client = BackendClient::new(&mock_server.uri(), Some("anon")).unwrap();
        let pairs = FavoritesStore::list(&client).await.unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].id, "1");
        assert!(pairs[0].created_at.is_some());
        assert!(pairs[1].is_pair("INR", "USD"));
    }

    #[tokio::test]
    async fn test_add_favorite_returns_server_row() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/favorites"))
            .and(body_json(serde_json::json!({
                "from_currency": "GBP",
                "to_currency": "JPY"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"data": [{"id": 42, "from_currency": "GBP", "to_currency": "JPY"}]}"#,
            ))
            .mount(&mock_server)
            .await;

        let client = BackendClient::new(&mock_server.uri(), None).unwrap();
        let pair = client.add("GBP", "JPY").await.unwrap();
        assert_eq!(pair.id, "42");
    }

    #[tokio::test]
    async fn test_backend_error_message() {
        let mock_server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/favorites/7"))
            .respond_with(
                ResponseTemplate::new(500).set_body_string(r#"{"error": "relation missing"}"#),
            )
            .mount(&mock_server)
            .await;

        let client = BackendClient::new(&mock_server.uri(), None).unwrap();
        let err = FavoritesStore::remove(&client, "7").await.unwrap_err();
        assert!(err.to_string().contains("relation missing"));
    }

    #[tokio::test]
    async fn test_history_added_posts_and_deletes_evicted() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/history"))
            .and(body_json(serde_json::json!({
                "from_amount": "100",
                "from_currency": "USD",
                "to_amount": "90",
                "to_currency": "EUR",
                "rate": 0.9,
                "description": "rent",
                "timestamp": 1_700_000_000_000i64
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"data": [{"id": 99, "from_amount": "100", "from_currency": "USD",
                    "to_amount": "90", "to_currency": "EUR", "rate": "0.9000"}]}"#,
            ))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/history/5"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"success": true}"#))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = BackendClient::new(&mock_server.uri(), None).unwrap();
        let new_entry = entry();
        let mut old = entry();
        old.id = "5".to_string();

        client
            .persist(
                HistoryChange::Added {
                    entry: &new_entry,
                    removed: std::slice::from_ref(&old),
                },
                &[],
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_history_validation_blocks_request() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/history"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let client = BackendClient::new(&mock_server.uri(), None).unwrap();
        let mut bad = entry();
        bad.to_currency = String::new();
        bad.rate = 0.0;

        let err = client
            .persist(
                HistoryChange::Added {
                    entry: &bad,
                    removed: &[],
                },
                &[],
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing required fields: to_currency");
    }

    #[tokio::test]
    async fn test_history_update_is_unsupported() {
        let client = BackendClient::new("http://localhost", None).unwrap();
        let e = entry();
        assert!(client.persist(HistoryChange::Updated(&e), &[]).await.is_err());
    }

    #[tokio::test]
    async fn test_load_history() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/history"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"data": [{"id": 3, "from_amount": "1", "from_currency": "USD",
                    "to_amount": "0.9", "to_currency": "EUR", "rate": 0.9,
                    "description": null, "timestamp": 1700000000000,
                    "created_at": "2023-11-14T22:13:20Z"}]}"#,
            ))
            .mount(&mock_server)
            .await;

        let client = BackendClient::new(&mock_server.uri(), None).unwrap();
        let entries = HistoryStore::load(&client).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "3");
        assert_eq!(entries[0].created_millis(), Some(1_700_000_000_000));
    }
}
