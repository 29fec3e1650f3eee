use crate::scan::{DirectoryTree, ProjectInfo};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

mod error;

pub use error::SummaryError;

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const MAX_RETRIES: u32 = 3;
const INITIAL_RETRY_DELAY: u64 = 1000; // milliseconds
const MAX_RETRY_DELAY: u64 = 10000; // 10 seconds max delay

#[derive(Debug)]
struct RetryConfig {
    max_retries: u32,
    initial_delay: u64,
    max_delay: u64,
}

impl RetryConfig {
    fn new() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            initial_delay: INITIAL_RETRY_DELAY,
            max_delay: MAX_RETRY_DELAY,
        }
    }

    // Auth, parse and plain API failures won't get better on a retry;
    // the poll interval is the retry for those.
    fn should_retry(&self, error: &SummaryError) -> bool {
        matches!(
            error,
            SummaryError::RateLimitError(_) | SummaryError::NetworkError(_)
        )
    }

    fn get_delay(&self, attempt: u32) -> Duration {
        let delay = self.initial_delay * 2u64.pow(attempt);
        Duration::from_millis(delay.min(self.max_delay))
    }
}

async fn with_retries<T, F, Fut>(config: &RetryConfig, f: F) -> Result<T, SummaryError>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, SummaryError>>,
{
    let mut attempt = 0;
    let mut last_error = None;

    while attempt < config.max_retries {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if config.should_retry(&e) {
                    let delay = config.get_delay(attempt);
                    tracing::debug!("Summary request failed: {}. Retrying in {:?}", e, delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    last_error = Some(e);
                    continue;
                } else {
                    return Err(e);
                }
            }
        }
    }

    Err(last_error.unwrap_or_else(|| SummaryError::NetworkError("Max retries exceeded".to_string())))
}

/// Client for the optional project-overview call. Constructed only when
/// a credential is present; every failure degrades to an empty summary.
pub struct SummaryClient {
    client: reqwest::Client,
    api_key: String,
    api_url: String,
    model: String,
}

impl SummaryClient {
    pub fn new(api_key: String, api_url: String) -> Result<Self, SummaryError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SummaryError::NetworkError(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            api_url,
            model: DEFAULT_MODEL.to_string(),
        })
    }

    /// `None` when no credential is configured; the pipeline then runs
    /// with the generic overview.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty())?;
        match Self::new(api_key, DEFAULT_API_URL.to_string()) {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!("Summary client disabled: {}", e);
                None
            }
        }
    }

    /// Produce a short prose overview of the project. Never fails: any
    /// network, auth, quota or parse problem logs a warning and yields
    /// an empty string.
    pub async fn summarize(&self, project: &ProjectInfo, tree: &DirectoryTree) -> String {
        let prompt = build_prompt(project, tree);
        let retry_config = RetryConfig::new();

        match with_retries(&retry_config, || self.request_summary(&prompt)).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Project summary unavailable: {}", e);
                String::new()
            }
        }
    }

    async fn request_summary(&self, prompt: &str) -> Result<String, SummaryError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.api_url, self.model, self.api_key
        );

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let response = self
            .client
            .post(&url)
            .headers(headers)
            .json(&json!({
                "contents": [
                    {
                        "parts": [{ "text": prompt }]
                    }
                ],
                "generationConfig": {
                    "temperature": 0.7,
                    "maxOutputTokens": 1024
                }
            }))
            .send()
            .await
            .map_err(|e| SummaryError::NetworkError(e.to_string()))?;

        match response.status() {
            StatusCode::OK => (),
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(SummaryError::RateLimitError(
                    "Rate limit exceeded".to_string(),
                ));
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(SummaryError::AuthenticationError(
                    "Invalid API key".to_string(),
                ));
            }
            status => {
                let error_body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Could not read error response".to_string());
                return Err(SummaryError::ApiError(format!(
                    "Unexpected status code: {} - Response: {}",
                    status, error_body
                )));
            }
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| SummaryError::NetworkError(format!("Failed to read response body: {}", e)))?;

        #[derive(Debug, Deserialize)]
        struct GenerateResponse {
            #[serde(default)]
            candidates: Vec<Candidate>,
        }

        #[derive(Debug, Deserialize)]
        struct Candidate {
            #[serde(default)]
            content: CandidateContent,
        }

        #[derive(Debug, Deserialize, Default)]
        struct CandidateContent {
            #[serde(default)]
            parts: Vec<Part>,
        }

        #[derive(Debug, Deserialize)]
        struct Part {
            #[serde(default)]
            text: String,
        }

        let parsed: GenerateResponse = serde_json::from_str(&response_text).map_err(|e| {
            SummaryError::ParseError(format!(
                "Failed to parse response: {} - Raw response: {}",
                e, response_text
            ))
        })?;

        let text = parsed
            .candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(SummaryError::ParseError(format!(
                "Empty response: {}",
                response_text
            )));
        }

        Ok(text.trim().to_string())
    }
}

fn build_prompt(project: &ProjectInfo, tree: &DirectoryTree) -> String {
    let files = tree.files();

    let mut busiest: Vec<_> = files.iter().filter(|f| !f.functions.is_empty()).collect();
    busiest.sort_by(|a, b| b.functions.len().cmp(&a.functions.len()));
    let file_lines: Vec<String> = busiest
        .iter()
        .take(10)
        .map(|f| format!("- {} ({} functions)", f.path.display(), f.functions.len()))
        .collect();

    format!(
        "Describe this project in 2-3 sentences, focusing on its purpose and main components.\n\
         \n\
         Name: {}\n\
         Type: {}\n\
         Total files: {}\n\
         Key files:\n{}\n\
         \n\
         Return plain prose only, no headings or lists.",
        project.name,
        project.kind.description(),
        files.len(),
        file_lines.join("\n")
    )
}
