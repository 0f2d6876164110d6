use crate::{
    config::ServiceConfig,
    error::{FlyerError, Result},
    models::{
        EditRequest, GenerateBody, GenerationRequest, ImagesPayload, RegenerateBody,
        ResultContext, ServiceReply, TaskReply,
    },
    service::traits::GenerationService,
};
use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE},
    Client, Response, StatusCode, Url,
};
use serde::{de::DeserializeOwned, Serialize};

#[derive(Clone)]
pub struct HttpGenerationService {
    client: Client,
    base_url: String,
    base: Url,
}

impl HttpGenerationService {
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let base_url = config.validated_base_url()?;
        let base = Url::parse(&base_url)
            .map_err(|e| FlyerError::Config(format!("Invalid base URL {}: {}", base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(FlyerError::Config(format!("Invalid base URL {}", base_url)));
        }
        let client = Client::builder()
            .timeout(config.request_timeout)
            .default_headers(Self::build_headers())
            .build()
            .map_err(|e| FlyerError::Config(format!("Failed to build HTTP client: {}", e)))?;

        log::info!("Generation service client ready at {}", base_url);
        Ok(Self {
            client,
            base_url,
            base,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    /// Appends each segment percent-encoded, so ids cannot add path, query
    /// or fragment parts.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn post_json<B, T>(&self, segments: &[&str], body: &B) -> Result<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments);
        let path = url.path().to_string();
        log::debug!("POST {}", url);

        let response = self
            .client
            .post(url.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| {
                log::error!("Request to {} failed: {}", url, e);
                FlyerError::service(format!("Request to {} failed: {}", path, e))
            })?;

        Self::decode(&path, response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let url = self.endpoint(segments);
        let path = url.path().to_string();
        log::debug!("GET {}", url);

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            log::error!("Request to {} failed: {}", url, e);
            FlyerError::service(format!("Request to {} failed: {}", path, e))
        })?;

        Self::decode(&path, response).await
    }

    async fn decode<T: DeserializeOwned>(path: &str, response: Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = classify_failure(status, &body);
            log::warn!("{} returned {}: {}", path, status, err);
            return Err(err);
        }

        let text = response
            .text()
            .await
            .map_err(|e| FlyerError::service(format!("Failed to read {} body: {}", path, e)))?;
        log::debug!("{} response: {}", path, text);

        serde_json::from_str(&text)
            .map_err(|e| FlyerError::Response(format!("Unexpected {} payload: {}", path, e)))
    }
}

/// Maps a non-success reply onto the error taxonomy. 429, or any client
/// error that talks about a limit, is quota exhaustion.
pub fn classify_failure(status: StatusCode, body: &str) -> FlyerError {
    let mentions_limit = body.to_ascii_lowercase().contains("limit");
    if status == StatusCode::TOO_MANY_REQUESTS || (status.is_client_error() && mentions_limit) {
        let message = if body.trim().is_empty() {
            "Generation limit reached".to_string()
        } else {
            body.trim().to_string()
        };
        return FlyerError::Quota(message);
    }

    FlyerError::Service {
        status: Some(status.as_u16()),
        message: if body.trim().is_empty() {
            status
                .canonical_reason()
                .unwrap_or("request rejected")
                .to_string()
        } else {
            body.trim().to_string()
        },
    }
}

#[async_trait]
impl GenerationService for HttpGenerationService {
    async fn submit(&self, request: &GenerationRequest) -> Result<TaskReply> {
        self.post_json(&["generate", "modify"], &GenerateBody { message: request })
            .await
    }

    async fn check_status(&self, task_id: &str) -> Result<TaskReply> {
        if matches!(task_id, "" | "." | "..") {
            return Err(FlyerError::Validation(format!(
                "Invalid task identifier: {:?}",
                task_id
            )));
        }
        self.get_json(&["check-image-status", task_id]).await
    }

    async fn edit(&self, request: &EditRequest) -> Result<ImagesPayload> {
        let reply: ServiceReply = self.post_json(&["edit"], request).await?;
        reply.images()
    }

    async fn regenerate(&self, context: &ResultContext) -> Result<ImagesPayload> {
        let reply: ServiceReply = self
            .post_json(&["re-generate"], &RegenerateBody { message: context })
            .await?;
        reply.images()
    }
}
