//! HTTP implementation of [`ResourceFetcher`] backed by `reqwest`.

use std::time::Duration;

use ecoe_model::ResourceKind;
use ecoe_model::reference::API_PREFIX;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder, Response, Url};

use crate::config::ClientConfig;
use crate::error::{RequestError, Result};
use crate::fetcher::{Record, ResourceFetcher};
use crate::query::Query;

/// Talks to a Potion-style resource API over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    per_page: Option<u32>,
}

impl HttpFetcher {
    /// Build a fetcher from configuration.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RequestError::Client(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            per_page: config.per_page,
        })
    }

    /// Absolute URL for a resource URI (`/api/...`) or a bare route
    /// (`question`, `qblock/4/questions`).
    pub fn url_for(&self, target: &str) -> Result<Url> {
        let path = if target.starts_with(API_PREFIX) {
            target.to_string()
        } else {
            format!("{API_PREFIX}/{}", target.trim_start_matches('/'))
        };
        Url::parse(&format!("{}{path}", self.base_url))
            .map_err(|e| RequestError::Client(format!("invalid URL for `{target}`: {e}")))
    }

    /// Listing URL for `kind` with the query's `where`/`sort` parameters.
    pub fn listing_url(&self, kind: ResourceKind, query: &Query) -> Result<Url> {
        let mut url = self.url_for(kind.route())?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(clause) = query.where_clause() {
                pairs.append_pair("where", &clause);
            }
            if let Some(clause) = query.sort_clause() {
                pairs.append_pair("sort", &clause);
            }
            if let Some(per_page) = self.per_page {
                pairs.append_pair("per_page", &per_page.to_string());
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(
        &self,
        builder: RequestBuilder,
        method: &'static str,
        target: &str,
    ) -> Result<Response> {
        tracing::debug!(method, target, "sending request");
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(method, target, status = status.as_u16(), "request failed");
        Err(RequestError::Status {
            method,
            target: target.to_string(),
            status: status.as_u16(),
            body,
        })
    }
}

impl ResourceFetcher for HttpFetcher {
    async fn get_resources(&self, kind: ResourceKind, query: &Query) -> Result<Vec<Record>> {
        let url = self.listing_url(kind, query)?;
        let target = url.to_string();
        let response = self.send(self.request(Method::GET, url), "GET", &target).await?;
        Ok(response.json().await?)
    }

    async fn create_resource(&self, route: &str, body: Record) -> Result<Record> {
        let url = self.url_for(route)?;
        let response = self
            .send(self.request(Method::POST, url).json(&body), "POST", route)
            .await?;
        Ok(response.json().await?)
    }

    async fn update_resource(&self, uri: &str, body: Record) -> Result<Record> {
        let url = self.url_for(uri)?;
        let response = self
            .send(self.request(Method::PATCH, url).json(&body), "PATCH", uri)
            .await?;
        Ok(response.json().await?)
    }

    async fn delete_resource(&self, uri: &str) -> Result<()> {
        let url = self.url_for(uri)?;
        self.send(self.request(Method::DELETE, url), "DELETE", uri)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher(per_page: Option<u32>) -> HttpFetcher {
        HttpFetcher::new(&ClientConfig {
            base_url: "https://ecoe.test/".to_string(),
            per_page,
            ..ClientConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_url_for_uri_and_route() {
        let fetcher = fetcher(None);
        assert_eq!(
            fetcher.url_for("/api/question/5").unwrap().as_str(),
            "https://ecoe.test/api/question/5"
        );
        assert_eq!(
            fetcher.url_for("qblock/4/questions").unwrap().as_str(),
            "https://ecoe.test/api/qblock/4/questions"
        );
    }

    #[test]
    fn test_listing_url_encodes_query() {
        let fetcher = fetcher(Some(100));
        let query = Query::all().equals("question", 8).sort_by("order", false);
        let url = fetcher.listing_url(ResourceKind::Option, &query).unwrap();

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("where".to_string(), r#"{"question":8}"#.to_string()),
                ("sort".to_string(), r#"{"order":false}"#.to_string()),
                ("per_page".to_string(), "100".to_string()),
            ]
        );
    }

    #[test]
    fn test_unfiltered_listing_has_no_query() {
        let url = fetcher(None)
            .listing_url(ResourceKind::Question, &Query::all())
            .unwrap();
        assert_eq!(url.as_str(), "https://ecoe.test/api/question");
    }
}
