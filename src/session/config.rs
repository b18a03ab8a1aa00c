use serde::{Deserialize, Serialize};

/// Practice format for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    Speech,
    Express,
    Comedy,
    Debate,
}

impl std::fmt::Display for SessionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SessionMode::Speech => "speech",
            SessionMode::Express => "express",
            SessionMode::Comedy => "comedy",
            SessionMode::Debate => "debate",
        };
        f.write_str(label)
    }
}

/// Speaker experience level, used to calibrate analysis strictness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    Beginner,
    Advanced,
    Expert,
}

impl std::fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SkillLevel::Beginner => "beginner",
            SkillLevel::Advanced => "advanced",
            SkillLevel::Expert => "expert",
        };
        f.write_str(label)
    }
}

/// Configuration for one practice session.
///
/// Immutable once a recording starts; owned by the session state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// What the user will speak about
    pub topic: String,

    /// Recording countdown length in seconds
    pub duration_seconds: u32,

    /// BCP-47 style language tag (e.g. "en-US", "zh-CN")
    pub language: String,

    /// Practice format
    pub mode: SessionMode,

    /// Speaker experience level
    pub level: SkillLevel,

    /// Preparation countdown length in seconds (0 skips prep entirely)
    pub prep_time_seconds: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            topic: "General".to_string(),
            duration_seconds: 120,
            language: "en-US".to_string(),
            mode: SessionMode::Speech,
            level: SkillLevel::Beginner,
            prep_time_seconds: 15,
        }
    }
}

/// Preferences collected during onboarding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingProfile {
    /// Interest areas used to seed topic generation (never empty)
    pub topics: Vec<String>,

    /// Mode the user wants to practice first
    pub preferred_mode: SessionMode,
}

impl OnboardingProfile {
    /// Build a profile, defaulting to a single "General" interest when the
    /// user picked none.
    pub fn new(topics: Vec<String>, preferred_mode: SessionMode) -> Self {
        let topics = if topics.is_empty() {
            vec!["General".to_string()]
        } else {
            topics
        };
        Self {
            topics,
            preferred_mode,
        }
    }
}
