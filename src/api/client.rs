use crate::api::error::{ApiError, extract_error_message};
use crate::config::ClientConfig;
use crate::models::{
    Bid, BidCreateRequest, BidSubcontractor, BidSubcontractorCreateRequest, Organization,
    OrganizationCreateRequest, Subcontractor, SubcontractorDirectory, ValidationResponse,
};
use crate::services::participation::ParticipationSubmitter;
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// HTTP client for the bid-management REST API.
#[derive(Debug, Clone)]
pub struct ComplyFormClient {
    http: reqwest::Client,
    base: Url,
}

impl ComplyFormClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let base = Url::parse(config.api_base.trim())?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(format!(
                "{} cannot be used as an API base",
                base
            )));
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &str {
        self.base.as_str().trim_end_matches('/')
    }

    /// Appends `segments` to the base path, percent-encoding each one.
    /// A trailing `""` segment yields a trailing slash. `.` and `..` are
    /// rejected since they would be dropped from the path.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        if let Some(dot) = segments.iter().find(|s| matches!(**s, "." | "..")) {
            return Err(ApiError::InvalidUrl(format!(
                "'{}' is not a valid path segment",
                dot
            )));
        }

        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ApiError> {
        let url = self.endpoint(segments)?;
        tracing::info!("{} {}", method, url.path());
        Ok(self.http.request(method, url))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        fallback: &str,
    ) -> Result<T, ApiError> {
        let response = check_status(builder.send().await?, fallback).await?;
        Ok(response.json::<T>().await?)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        fallback: &str,
    ) -> Result<T, ApiError> {
        let builder = self.request(Method::GET, segments)?;
        self.send_json(builder, fallback).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
        fallback: &str,
    ) -> Result<T, ApiError> {
        let builder = self.request(Method::POST, segments)?.json(body);
        self.send_json(builder, fallback).await
    }

    // Organizations

    pub async fn list_organizations(&self) -> Result<Vec<Organization>, ApiError> {
        self.get_json(&["organizations"], "Failed to load organizations")
            .await
    }

    pub async fn get_organization(&self, id: &str) -> Result<Organization, ApiError> {
        self.get_json(&["organizations", id], "Failed to load organization")
            .await
    }

    pub async fn create_organization(
        &self,
        request: &OrganizationCreateRequest,
    ) -> Result<Organization, ApiError> {
        self.post_json(&["organizations", ""], request, "Failed to create organization")
            .await
    }

    // Subcontractors

    pub async fn list_subcontractors(&self) -> Result<Vec<Subcontractor>, ApiError> {
        self.get_json(&["subcontractors", ""], "Failed to load subcontractors")
            .await
    }

    pub async fn get_subcontractor(&self, id: &str) -> Result<Subcontractor, ApiError> {
        self.get_json(&["subcontractors", id], "Failed to load subcontractor")
            .await
    }

    /// Searches by name; `is_mbe` narrows to (non-)MBE firms when set.
    pub async fn search_subcontractors(
        &self,
        query: Option<&str>,
        is_mbe: Option<bool>,
    ) -> Result<Vec<Subcontractor>, ApiError> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(q) = query.filter(|q| !q.is_empty()) {
            params.push(("q", q.to_string()));
        }
        if let Some(flag) = is_mbe {
            params.push(("is_mbe", flag.to_string()));
        }
        let builder = self
            .request(Method::GET, &["subcontractors", "search"])?
            .query(&params);
        self.send_json(builder, "Search failed").await
    }

    // Bids

    pub async fn list_bids(&self) -> Result<Vec<Bid>, ApiError> {
        self.get_json(&["bids", ""], "Failed to load bids").await
    }

    pub async fn get_bid(&self, id: &str) -> Result<Bid, ApiError> {
        self.get_json(&["bids", id], "Failed to load bid")
            .await
    }

    pub async fn create_bid(&self, request: &BidCreateRequest) -> Result<Bid, ApiError> {
        self.post_json(&["bids", ""], request, "Failed to create bid")
            .await
    }

    pub async fn add_subcontractor(
        &self,
        bid_id: &str,
        request: &BidSubcontractorCreateRequest,
    ) -> Result<BidSubcontractor, ApiError> {
        self.post_json(
            &["bids", bid_id, "subcontractors"],
            request,
            "Failed to add subcontractor",
        )
        .await
    }

    pub async fn remove_subcontractor(&self, bid_id: &str, bid_sub_id: &str) -> Result<(), ApiError> {
        let builder = self.request(
            Method::DELETE,
            &["bids", bid_id, "subcontractors", bid_sub_id],
        )?;
        check_status(builder.send().await?, "Failed to remove subcontractor").await?;
        Ok(())
    }

    /// Runs the server-side compliance rules for a bid.
    pub async fn validate_bid(&self, bid_id: &str) -> Result<ValidationResponse, ApiError> {
        self.get_json(&["bids", bid_id, "validate"], "Validation failed")
            .await
    }

    // Directory

    pub async fn list_directory(&self, skip: u32, limit: u32) -> Result<Vec<SubcontractorDirectory>, ApiError> {
        let builder = self
            .request(Method::GET, &["directory", ""])?
            .query(&[("skip", skip), ("limit", limit)]);
        self.send_json(builder, "Failed to load directory").await
    }

    pub async fn search_directory(&self, query: &str) -> Result<Vec<SubcontractorDirectory>, ApiError> {
        let builder = self
            .request(Method::GET, &["directory", "search"])?
            .query(&[("q", query)]);
        self.send_json(builder, "Search failed").await
    }
}

#[async_trait]
impl ParticipationSubmitter for ComplyFormClient {
    async fn submit_participation(
        &self,
        bid_id: &str,
        request: &BidSubcontractorCreateRequest,
    ) -> Result<BidSubcontractor, ApiError> {
        self.add_subcontractor(bid_id, request).await
    }
}

/// Turns a non-success response into [`ApiError::Server`].
async fn check_status(response: Response, fallback: &str) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str(&body)
        .map(|value| extract_error_message(&value, fallback))
        .unwrap_or_else(|_| fallback.to_string());

    tracing::warn!("Server responded {}: {}", status, message);
    Err(ApiError::Server {
        status: status.as_u16(),
        message,
    })
}
