//! Remote analysis and coaching service boundary
//!
//! Typed request/reply client for the generative service that turns a
//! recorded speech into structured feedback, generates topics and outlines,
//! and hosts the follow-up coaching conversation. The transport is the
//! service bus; payloads are JSON with recordings carried base64-encoded.

mod client;
mod messages;
mod pace;

pub use client::{
    placeholder_outline, Analyzer, AnalyzerError, CoachChat, DisabledAnalyzer, NatsAnalyzer,
    FALLBACK_TOPIC,
};
pub use messages::{
    AnalysisResult, AnalyzeRequest, FrameworkStep, GrammarFix, Outline, StructureAnalysis,
    SubScores,
};
pub use pace::{is_character_counted, pace_for_transcript};
