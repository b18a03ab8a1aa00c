use std::time::Duration;

use anyhow::{Context, Result};
use base64::Engine;
use thiserror::Error;
use tracing::{info, warn};

use super::messages::{
    AnalysisResult, AnalyzeRequest, CoachMessageReply, CoachMessageRequest, CoachOpenReply,
    CoachOpenRequest, Outline, OutlineRequest, TopicReply, TopicRequest,
};
use crate::media::RecordingBlob;
use crate::session::{SessionMode, SkillLevel};

/// Topic returned when the remote generator is unreachable.
pub const FALLBACK_TOPIC: &str = "A lesson you learned the hard way";

const TOPIC_SUBJECT: &str = "analysis.topic.generate";
const OUTLINE_SUBJECT: &str = "analysis.outline.generate";
const ANALYZE_SUBJECT: &str = "analysis.speech.analyze";
const COACH_OPEN_SUBJECT: &str = "coach.chat.open";
const COACH_MESSAGE_SUBJECT: &str = "coach.chat.message";

/// The one error family the session state machine must catch and convert
/// into a transition; everything else the analyzer does degrades in place.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("analysis service disabled: no API credential configured")]
    Disabled,

    #[error("analysis request failed: {0}")]
    Transport(String),

    #[error("analysis reply not parsable: {0}")]
    Malformed(String),
}

/// Remote analysis/coaching service boundary.
///
/// Topic and outline generation degrade to fixed fallbacks on failure;
/// `analyze_speech` is the single propagated failure path.
#[async_trait::async_trait]
pub trait Analyzer: Send + Sync {
    async fn generate_topic(
        &self,
        interests: &[String],
        language: &str,
        mode: SessionMode,
        level: SkillLevel,
    ) -> String;

    async fn generate_outline(&self, topic: &str, language: &str) -> Outline;

    async fn analyze_speech(
        &self,
        audio: &RecordingBlob,
        topic: &str,
        duration_seconds: f64,
        mode: SessionMode,
        language: &str,
        level: SkillLevel,
    ) -> Result<AnalysisResult, AnalyzerError>;

    async fn create_coach(
        &self,
        result: &AnalysisResult,
        topic: &str,
        mode: SessionMode,
        language: &str,
    ) -> Result<Box<dyn CoachChat>, AnalyzerError>;
}

/// One stateful coaching conversation; every `send` is a suspension point.
#[async_trait::async_trait]
pub trait CoachChat: Send + Sync {
    async fn send(&mut self, message: &str) -> Result<String, AnalyzerError>;
}

/// Degraded outline used when generation fails.
pub fn placeholder_outline(topic: &str) -> Outline {
    Outline {
        central_idea: format!("Share your own perspective on {topic}"),
        points: vec![
            "Open with why this matters to you".to_string(),
            "Give one concrete example from your experience".to_string(),
            "Close by restating your main point".to_string(),
        ],
    }
}

/// Analyzer client over the service bus.
pub struct NatsAnalyzer {
    client: async_nats::Client,
    token: String,
    request_timeout: Duration,
}

impl NatsAnalyzer {
    /// Connect to the analysis service bus.
    pub async fn connect(url: &str, token: String, request_timeout: Duration) -> Result<Self> {
        info!("Connecting to analysis service at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to analysis service")?;

        info!("Connected to analysis service");

        Ok(Self {
            client,
            token,
            request_timeout,
        })
    }

    async fn request(&self, subject: &'static str, payload: Vec<u8>) -> Result<Vec<u8>, AnalyzerError> {
        let response = tokio::time::timeout(
            self.request_timeout,
            self.client.request(subject, payload.into()),
        )
        .await
        .map_err(|_| AnalyzerError::Transport(format!("request to {subject} timed out")))?
        .map_err(|e| AnalyzerError::Transport(e.to_string()))?;

        Ok(response.payload.to_vec())
    }
}

#[async_trait::async_trait]
impl Analyzer for NatsAnalyzer {
    async fn generate_topic(
        &self,
        interests: &[String],
        language: &str,
        mode: SessionMode,
        level: SkillLevel,
    ) -> String {
        let request = TopicRequest {
            token: self.token.clone(),
            interests: interests.to_vec(),
            language: language.to_string(),
            mode,
            level,
        };

        let payload = match serde_json::to_vec(&request) {
            Ok(p) => p,
            Err(e) => {
                warn!("Failed to encode topic request: {}", e);
                return FALLBACK_TOPIC.to_string();
            }
        };

        match self.request(TOPIC_SUBJECT, payload).await {
            Ok(reply) => match serde_json::from_slice::<TopicReply>(&reply) {
                Ok(parsed) if !parsed.topic.trim().is_empty() => parsed.topic,
                Ok(_) => FALLBACK_TOPIC.to_string(),
                Err(e) => {
                    warn!("Topic reply not parsable, using fallback: {}", e);
                    FALLBACK_TOPIC.to_string()
                }
            },
            Err(e) => {
                warn!("Topic generation failed, using fallback: {}", e);
                FALLBACK_TOPIC.to_string()
            }
        }
    }

    async fn generate_outline(&self, topic: &str, language: &str) -> Outline {
        let request = OutlineRequest {
            token: self.token.clone(),
            topic: topic.to_string(),
            language: language.to_string(),
        };

        let payload = match serde_json::to_vec(&request) {
            Ok(p) => p,
            Err(e) => {
                warn!("Failed to encode outline request: {}", e);
                return placeholder_outline(topic);
            }
        };

        match self.request(OUTLINE_SUBJECT, payload).await {
            Ok(reply) => match serde_json::from_slice::<Outline>(&reply) {
                Ok(outline) if outline.points.len() == 3 => outline,
                Ok(_) | Err(_) => {
                    warn!("Outline reply degraded to placeholder");
                    placeholder_outline(topic)
                }
            },
            Err(e) => {
                warn!("Outline generation failed, using placeholder: {}", e);
                placeholder_outline(topic)
            }
        }
    }

    async fn analyze_speech(
        &self,
        audio: &RecordingBlob,
        topic: &str,
        duration_seconds: f64,
        mode: SessionMode,
        language: &str,
        level: SkillLevel,
    ) -> Result<AnalysisResult, AnalyzerError> {
        let request_id = uuid::Uuid::new_v4().to_string();
        let request = AnalyzeRequest {
            token: self.token.clone(),
            request_id: request_id.clone(),
            audio: base64::engine::general_purpose::STANDARD.encode(&audio.data),
            mime_type: audio.mime_type.clone(),
            topic: topic.to_string(),
            duration_seconds,
            mode,
            language: language.to_string(),
            level,
        };

        let payload =
            serde_json::to_vec(&request).map_err(|e| AnalyzerError::Malformed(e.to_string()))?;

        info!(
            "Submitting {} bytes of {} for analysis (request {})",
            audio.len(),
            audio.mime_type,
            request_id
        );

        let reply = self.request(ANALYZE_SUBJECT, payload).await?;

        serde_json::from_slice::<AnalysisResult>(&reply)
            .map_err(|e| AnalyzerError::Malformed(e.to_string()))
    }

    async fn create_coach(
        &self,
        result: &AnalysisResult,
        topic: &str,
        mode: SessionMode,
        language: &str,
    ) -> Result<Box<dyn CoachChat>, AnalyzerError> {
        let request = CoachOpenRequest {
            token: self.token.clone(),
            request_id: uuid::Uuid::new_v4().to_string(),
            topic: topic.to_string(),
            mode,
            language: language.to_string(),
            result: result.clone(),
        };

        let payload =
            serde_json::to_vec(&request).map_err(|e| AnalyzerError::Malformed(e.to_string()))?;

        let reply = self.request(COACH_OPEN_SUBJECT, payload).await?;
        let opened = serde_json::from_slice::<CoachOpenReply>(&reply)
            .map_err(|e| AnalyzerError::Malformed(e.to_string()))?;

        info!("Coach conversation opened: {}", opened.conversation_id);

        Ok(Box::new(NatsCoach {
            client: self.client.clone(),
            token: self.token.clone(),
            conversation_id: opened.conversation_id,
            request_timeout: self.request_timeout,
        }))
    }
}

/// Coach conversation bound to one opened remote chat.
struct NatsCoach {
    client: async_nats::Client,
    token: String,
    conversation_id: String,
    request_timeout: Duration,
}

#[async_trait::async_trait]
impl CoachChat for NatsCoach {
    async fn send(&mut self, message: &str) -> Result<String, AnalyzerError> {
        let request = CoachMessageRequest {
            token: self.token.clone(),
            conversation_id: self.conversation_id.clone(),
            message: message.to_string(),
        };

        let payload =
            serde_json::to_vec(&request).map_err(|e| AnalyzerError::Malformed(e.to_string()))?;

        let response = tokio::time::timeout(
            self.request_timeout,
            self.client.request(COACH_MESSAGE_SUBJECT, payload.into()),
        )
        .await
        .map_err(|_| AnalyzerError::Transport("coach request timed out".to_string()))?
        .map_err(|e| AnalyzerError::Transport(e.to_string()))?;

        let reply = serde_json::from_slice::<CoachMessageReply>(&response.payload)
            .map_err(|e| AnalyzerError::Malformed(e.to_string()))?;

        Ok(reply.reply)
    }
}

/// Stand-in used when no API credential is configured. Generation degrades
/// to its fixed fallbacks; analysis and coaching report the service as
/// disabled.
pub struct DisabledAnalyzer;

#[async_trait::async_trait]
impl Analyzer for DisabledAnalyzer {
    async fn generate_topic(
        &self,
        _interests: &[String],
        _language: &str,
        _mode: SessionMode,
        _level: SkillLevel,
    ) -> String {
        FALLBACK_TOPIC.to_string()
    }

    async fn generate_outline(&self, topic: &str, _language: &str) -> Outline {
        placeholder_outline(topic)
    }

    async fn analyze_speech(
        &self,
        _audio: &RecordingBlob,
        _topic: &str,
        _duration_seconds: f64,
        _mode: SessionMode,
        _language: &str,
        _level: SkillLevel,
    ) -> Result<AnalysisResult, AnalyzerError> {
        Err(AnalyzerError::Disabled)
    }

    async fn create_coach(
        &self,
        _result: &AnalysisResult,
        _topic: &str,
        _mode: SessionMode,
        _language: &str,
    ) -> Result<Box<dyn CoachChat>, AnalyzerError> {
        Err(AnalyzerError::Disabled)
    }
}
