use serde::{Deserialize, Serialize};

use crate::session::{SessionMode, SkillLevel};

/// Per-dimension scores, each in [0, 100].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubScores {
    pub logic: u8,
    pub delivery: u8,
    pub structure: u8,
    pub vocabulary: u8,
    pub emotion: u8,
}

/// PREP-structure assessment (Point, Reason, Example, Point restated).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureAnalysis {
    pub is_prep: bool,
    pub point: String,
    pub reason: String,
    pub example: String,
    pub point_restated: String,
    pub feedback: String,
}

/// One step of a suggested speech framework.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameworkStep {
    pub name: String,
    pub description: String,
    pub polished_script: String,
}

/// One grammar correction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrammarFix {
    pub original: String,
    pub correction: String,
    pub reason: String,
}

/// Structured feedback for one recorded speech.
///
/// Produced exactly once per completed recording and immutable afterwards.
/// `wpm` is recomputed locally from the transcript after the reply arrives,
/// overriding whatever pace the remote supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub overall_score: u8,
    pub sub_scores: SubScores,
    pub transcript: String,
    pub wpm: u32,
    pub filler_word_count: u32,
    pub structure: StructureAnalysis,
    pub sentiment: String,
    pub speech_framework: Vec<FrameworkStep>,
    pub grammar_analysis: Vec<GrammarFix>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
}

/// Generated speech outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outline {
    pub central_idea: String,
    /// Exactly three supporting points
    pub points: Vec<String>,
}

// ============================================================================
// Request/Reply payloads (JSON over the service bus)
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicRequest {
    pub token: String,
    pub interests: Vec<String>,
    pub language: String,
    pub mode: SessionMode,
    pub level: SkillLevel,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicReply {
    pub topic: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlineRequest {
    pub token: String,
    pub topic: String,
    pub language: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub token: String,
    /// Correlation id for tracing one analysis through the service logs
    pub request_id: String,
    /// Base64-encoded recording
    pub audio: String,
    /// Mime type the recording was encoded with
    pub mime_type: String,
    pub topic: String,
    pub duration_seconds: f64,
    pub mode: SessionMode,
    pub language: String,
    pub level: SkillLevel,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachOpenRequest {
    pub token: String,
    pub request_id: String,
    pub topic: String,
    pub mode: SessionMode,
    pub language: String,
    /// Analysis context the coach persona is primed with
    pub result: AnalysisResult,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachOpenReply {
    pub conversation_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachMessageRequest {
    pub token: String,
    pub conversation_id: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachMessageReply {
    pub reply: String,
}
