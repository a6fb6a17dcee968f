use std::time::Duration;

use url::Url;

use crate::types::ErrorBody;
use crate::{BoxFuture, Error, SynthesisRequest, SynthesisResponse, Synthesizer};

const TTS_PATH: &str = "api/tts";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Default)]
pub struct SynthesisClientBuilder {
    api_base: Option<String>,
    timeout: Option<Duration>,
}

impl SynthesisClientBuilder {
    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<SynthesisClient, Error> {
        let mut raw = self
            .api_base
            .unwrap_or_else(|| "http://127.0.0.1:12000".to_string());
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let api_base = Url::parse(&raw)?;

        let http = reqwest::Client::builder()
            .timeout(
                self.timeout
                    .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            )
            .build()?;

        Ok(SynthesisClient { http, api_base })
    }
}

/// HTTP client for the speech service (`POST /api/tts`, static resources
/// under the same origin).
#[derive(Clone)]
pub struct SynthesisClient {
    http: reqwest::Client,
    api_base: Url,
}

impl SynthesisClient {
    pub fn builder() -> SynthesisClientBuilder {
        SynthesisClientBuilder::default()
    }

    /// Resolve a reference returned by the service against the base URL.
    /// Absolute URLs pass through unchanged.
    pub fn resolve(&self, reference: &str) -> Result<Url, Error> {
        Ok(self.api_base.join(reference)?)
    }

    pub async fn synthesize(
        &self,
        request: &SynthesisRequest,
    ) -> Result<SynthesisResponse, Error> {
        let url = self.resolve(TTS_PATH)?;
        tracing::debug!(chars = request.text.len(), voice = %request.voice, "synthesis_request");

        let response = self.http.post(url).json(request).send().await?;
        let text = check_status(response).await?.text().await?;
        let body: SynthesisResponse = serde_json::from_str(&text)?;

        Ok(SynthesisResponse {
            audio_url: self.resolve(&body.audio_url)?.to_string(),
            subtitle_url: self.resolve(&body.subtitle_url)?.to_string(),
        })
    }

    pub async fn fetch_text(&self, reference: &str) -> Result<String, Error> {
        let response = self.http.get(self.resolve(reference)?).send().await?;
        Ok(check_status(response).await?.text().await?)
    }

    pub async fn fetch_bytes(&self, reference: &str) -> Result<Vec<u8>, Error> {
        let response = self.http.get(self.resolve(reference)?).send().await?;
        Ok(check_status(response).await?.bytes().await?.to_vec())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|b| b.error)
        .unwrap_or(body);

    Err(Error::Status {
        status: status.as_u16(),
        message,
    })
}

impl Synthesizer for SynthesisClient {
    fn synthesize<'a>(
        &'a self,
        request: &'a SynthesisRequest,
    ) -> BoxFuture<'a, Result<SynthesisResponse, Error>> {
        Box::pin(SynthesisClient::synthesize(self, request))
    }

    fn fetch_transcript<'a>(&'a self, subtitle_ref: &'a str) -> BoxFuture<'a, Result<String, Error>> {
        Box::pin(self.fetch_text(subtitle_ref))
    }
}
