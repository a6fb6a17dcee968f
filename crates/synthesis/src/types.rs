#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SynthesisRequest {
    pub text: String,
    pub voice: String,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>, voice: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice: voice.into(),
        }
    }
}

/// References to the synthesized resources. The service may answer with
/// paths relative to its own origin; [`crate::SynthesisClient`] resolves
/// them before handing them out.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SynthesisResponse {
    pub audio_url: String,
    pub subtitle_url: String,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}
