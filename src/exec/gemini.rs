// src/exec/gemini.rs

//! Collaborator adapter over the Gemini `generateContent` REST API.
//!
//! One client serves all three roles: narrative generator (text model with a
//! JSON response schema), artwork renderer (image model, inline image data)
//! and credential probe (model metadata lookup). It also runs the optional
//! hero analysis before launch.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, info, instrument};

use crate::config::RenderSettings;
use crate::errors::{GenerationError, InkflowError, Result};
use crate::exec::analysis::{parse_analysis, HeroAnalysis};
use crate::exec::collaborators::{
    ArtworkRenderer, ArtworkRequest, AuthProbe, BoxFuture, NarrativeGenerator, NarrativeRequest,
};
use crate::exec::prompts;
use crate::types::{Beat, ImageArtifact, PersonaReference};

/// Environment variables searched for the API key, in order.
pub const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    fn image(image: &ImageArtifact) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: image.mime_type.clone(),
                data: image.to_base64(),
            }),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_config: Option<ImageConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig {
    aspect_ratio: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_size: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

impl GenerateContentResponse {
    fn parts(&self) -> impl Iterator<Item = &Part> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .into_iter()
            .flat_map(|c| c.parts.iter())
    }

    fn text(&self) -> String {
        self.parts()
            .filter_map(|p| p.text.as_deref())
            .collect::<Vec<_>>()
            .join("")
    }

    fn first_image(&self) -> Option<&InlineData> {
        self.parts().find_map(|p| p.inline_data.as_ref())
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// JSON schema the text model must answer with.
fn beat_schema() -> serde_json::Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "caption": { "type": "STRING" },
            "dialogue": { "type": "STRING" },
            "scene": { "type": "STRING" },
            "focus_char": { "type": "STRING", "enum": ["hero", "friend", "other"] }
        },
        "required": ["caption", "scene", "focus_char"]
    })
}

/// Gemini REST client.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    api_base: String,
    text_model: String,
    image_model: String,
    vision_model: String,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, render: &RenderSettings, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| InkflowError::Other(e.into()))?;

        debug!(base = %render.api_base, text_model = %render.text_model, image_model = %render.image_model, "creating Gemini client");
        Ok(Self {
            client,
            api_key: api_key.into(),
            api_base: render.api_base.clone(),
            text_model: render.text_model.clone(),
            image_model: render.image_model.clone(),
            vision_model: render.vision_model.clone(),
            timeout,
        })
    }

    /// Build a client with the key from `GEMINI_API_KEY` (or `API_KEY`).
    pub fn from_env(render: &RenderSettings, timeout: Duration) -> Result<Self> {
        let key = API_KEY_VARS
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                InkflowError::ConfigError(format!(
                    "no API key found; set one of {}",
                    API_KEY_VARS.join(", ")
                ))
            })?;
        Self::new(key.trim(), render, timeout)
    }

    fn model_url(&self, model: &str) -> String {
        format!("{}/models/{}", self.api_base, model)
    }

    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> std::result::Result<GenerateContentResponse, GenerationError> {
        let url = format!("{}:generateContent", self.model_url(model));
        debug!(%model, "sending generateContent request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let response = check_status(response).await?;
        response.json::<GenerateContentResponse>().await.map_err(|e| {
            error!(error = %e, "failed to decode generateContent response");
            GenerationError::Malformed(format!("undecodable response: {e}"))
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> GenerationError {
        if e.is_timeout() {
            GenerationError::Timeout(self.timeout)
        } else {
            error!(error = %e, "request to Gemini failed");
            GenerationError::Transport(e.to_string())
        }
    }

    #[instrument(skip(self, request), fields(page = request.page))]
    async fn script(&self, request: NarrativeRequest) -> std::result::Result<Beat, GenerationError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part::text(prompts::narrative_prompt(&request))],
            }],
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(beat_schema()),
                ..GenerationConfig::default()
            }),
        };

        let response = self.generate_content(&self.text_model, &body).await?;
        Beat::from_json(&response.text())
    }

    #[instrument(skip(self, request), fields(page = request.page))]
    async fn ink(&self, request: ArtworkRequest) -> std::result::Result<ImageArtifact, GenerationError> {
        let mut parts = Vec::with_capacity(request.references.len() * 2 + 1);
        for reference in &request.references {
            parts.push(Part::text(prompts::reference_caption(reference)));
            parts.push(Part::image(&reference.image));
        }
        parts.push(Part::text(prompts::artwork_prompt(&request)));

        let body = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            generation_config: Some(GenerationConfig {
                image_config: Some(ImageConfig {
                    aspect_ratio: request.aspect_ratio.clone(),
                    image_size: request.image_size.clone(),
                }),
                ..GenerationConfig::default()
            }),
        };

        let response = self.generate_content(&self.image_model, &body).await?;
        let image = response.first_image().ok_or(GenerationError::MissingImage)?;
        ImageArtifact::from_base64(image.mime_type.clone(), &image.data)
    }

    /// Ask the vision model for a premise and style matching the hero.
    #[instrument(skip(self, hero), fields(hero = %hero.name))]
    pub async fn analyze_hero(
        &self,
        hero: &PersonaReference,
        genre: &str,
    ) -> std::result::Result<HeroAnalysis, GenerationError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part::image(&hero.image), Part::text(prompts::analysis_prompt(genre))],
            }],
            generation_config: None,
        };

        let response = self.generate_content(&self.vision_model, &body).await?;
        let analysis = parse_analysis(&response.text());
        info!(
            premise = analysis.premise.is_some(),
            style = analysis.style.is_some(),
            "hero analysis finished"
        );
        Ok(analysis)
    }

    /// `true` when the image model answers a metadata lookup with the
    /// current key.
    async fn check_credentials(&self) -> bool {
        let url = self.model_url(&self.image_model);
        let result = self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                info!(status = %response.status(), model = %self.image_model, "credential probe rejected");
                false
            }
            Err(e) => {
                error!(error = %e, "credential probe failed");
                false
            }
        }
    }
}

/// Turn a non-success HTTP response into a classified generation error.
async fn check_status(response: Response) -> std::result::Result<Response, GenerationError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => match envelope.error.status {
            Some(code) => format!("{code}: {}", envelope.error.message),
            None => envelope.error.message,
        },
        Err(_) => body,
    };

    error!(status = %status, message = %message, "Gemini returned an error");
    Err(GenerationError::classify(Some(status.as_u16()), message))
}

impl NarrativeGenerator for GeminiClient {
    fn generate(&self, request: NarrativeRequest) -> BoxFuture<'_, std::result::Result<Beat, GenerationError>> {
        Box::pin(self.script(request))
    }
}

impl ArtworkRenderer for GeminiClient {
    fn render(
        &self,
        request: ArtworkRequest,
    ) -> BoxFuture<'_, std::result::Result<ImageArtifact, GenerationError>> {
        Box::pin(self.ink(request))
    }
}

impl AuthProbe for GeminiClient {
    fn probe(&self) -> BoxFuture<'_, bool> {
        Box::pin(self.check_credentials())
    }
}
