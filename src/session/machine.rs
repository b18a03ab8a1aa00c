use std::sync::Arc;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use super::config::{OnboardingProfile, SessionConfig, SessionMode};
use super::progress::AnalysisProgress;
use crate::analyzer::{pace_for_transcript, AnalysisResult, Analyzer, AnalyzerError, CoachChat};
use crate::history::{HistoryItem, HistoryStore};
use crate::media::RecordingBlob;

/// Top-level application stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppStage {
    Onboarding,
    Setup,
    Stage,
    Analysis,
}

/// Everything the analysis task needs after the machine lock is released.
pub struct AnalysisTicket {
    pub analyzer: Arc<dyn Analyzer>,
    pub config: SessionConfig,
    pub blob: RecordingBlob,
}

/// The top-level session controller.
///
/// Owns the session configuration and the (at most one, immutable) analysis
/// result, sequences onboarding -> setup -> stage -> analysis, and converts
/// analyzer failures into a setup transition plus a user-visible notice.
pub struct SessionStateMachine {
    stage: AppStage,
    profile: Option<OnboardingProfile>,
    config: Option<SessionConfig>,
    result: Option<AnalysisResult>,
    audio_blob: Option<RecordingBlob>,
    recorded_duration: f64,
    analyzing: bool,
    progress: Option<AnalysisProgress>,
    notice: Option<String>,
    coach: Option<Box<dyn CoachChat>>,
    analyzer: Arc<dyn Analyzer>,
    history: Arc<HistoryStore>,
}

impl SessionStateMachine {
    pub fn new(analyzer: Arc<dyn Analyzer>, history: Arc<HistoryStore>) -> Self {
        Self {
            stage: AppStage::Onboarding,
            profile: None,
            config: None,
            result: None,
            audio_blob: None,
            recorded_duration: 0.0,
            analyzing: false,
            progress: None,
            notice: None,
            coach: None,
            analyzer,
            history,
        }
    }

    pub fn stage(&self) -> AppStage {
        self.stage
    }

    pub fn is_analyzing(&self) -> bool {
        self.analyzing
    }

    pub fn profile(&self) -> Option<&OnboardingProfile> {
        self.profile.as_ref()
    }

    pub fn config(&self) -> Option<&SessionConfig> {
        self.config.as_ref()
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn audio_blob(&self) -> Option<&RecordingBlob> {
        self.audio_blob.as_ref()
    }

    pub fn recorded_duration(&self) -> f64 {
        self.recorded_duration
    }

    /// Simulated progress and the tip currently on display, while analyzing.
    pub fn progress(&self) -> Option<(f32, &'static str)> {
        self.progress.as_ref().map(|p| (p.percent(), p.current_tip()))
    }

    /// Take the pending user-visible notice, clearing it.
    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn analyzer(&self) -> Arc<dyn Analyzer> {
        Arc::clone(&self.analyzer)
    }

    /// Onboarding -> Setup, seeding the session mode with the user's
    /// preference. An empty interest list defaults to "General".
    pub fn complete_onboarding(
        &mut self,
        topics: Vec<String>,
        preferred_mode: SessionMode,
    ) -> Result<()> {
        if self.stage != AppStage::Onboarding {
            bail!("onboarding can only complete from the onboarding stage");
        }

        let profile = OnboardingProfile::new(topics, preferred_mode);
        info!(
            "Onboarding complete: {} interests, preferred mode {}",
            profile.topics.len(),
            profile.preferred_mode
        );

        self.profile = Some(profile);
        self.stage = AppStage::Setup;
        Ok(())
    }

    /// Explicit back navigation from Setup.
    pub fn back_to_onboarding(&mut self) -> Result<()> {
        if self.stage != AppStage::Setup {
            bail!("back navigation is only valid from setup");
        }
        self.stage = AppStage::Onboarding;
        Ok(())
    }

    /// Setup -> Stage with a fully specified config. Any previous result is
    /// cleared: the stage never opens with a stale result visible.
    pub fn start_stage(&mut self, config: SessionConfig) -> Result<()> {
        if self.stage != AppStage::Setup {
            bail!("a recording stage can only start from setup");
        }
        if config.topic.trim().is_empty() {
            bail!("session topic must not be empty");
        }
        if config.duration_seconds == 0 {
            bail!("session duration must be positive");
        }

        self.result = None;
        self.audio_blob = None;
        self.recorded_duration = 0.0;
        self.coach = None;

        info!(
            "Stage starting: '{}' ({}, {}s + {}s prep)",
            config.topic, config.mode, config.duration_seconds, config.prep_time_seconds
        );

        self.config = Some(config);
        self.stage = AppStage::Stage;
        Ok(())
    }

    /// Post a user-visible notice without changing stage (recoverable
    /// conditions, e.g. an encoder start failure the user may retry).
    pub fn notify(&mut self, message: impl Into<String>) {
        self.notice = Some(message.into());
    }

    /// The stage ended without a recording (user cancelled).
    pub fn stage_cancelled(&mut self) {
        if self.stage == AppStage::Stage {
            info!("Stage cancelled, returning to setup");
            self.stage = AppStage::Setup;
        }
    }

    /// The stage failed (capture acquisition or recording error). Fatal to
    /// the stage: notify and return to setup.
    pub fn stage_failed(&mut self, message: impl Into<String>) {
        let message = message.into();
        error!("Stage failed: {}", message);
        self.notice = Some(message);
        if self.stage == AppStage::Stage {
            self.stage = AppStage::Setup;
        }
    }

    /// Enter the analyzing sub-state: hold the recording, start the progress
    /// simulation, and hand back what the analysis task needs.
    pub fn begin_analysis(
        &mut self,
        blob: RecordingBlob,
        duration_seconds: f64,
    ) -> Result<AnalysisTicket> {
        if self.stage != AppStage::Stage {
            bail!("analysis can only begin from the stage");
        }
        if self.analyzing {
            bail!("an analysis is already in flight");
        }
        let config = match &self.config {
            Some(config) => config.clone(),
            None => bail!("no session config attached"),
        };

        self.analyzing = true;
        self.progress = Some(AnalysisProgress::start());
        self.audio_blob = Some(blob.clone());
        self.recorded_duration = duration_seconds;

        Ok(AnalysisTicket {
            analyzer: Arc::clone(&self.analyzer),
            config,
            blob,
        })
    }

    /// Attach the finished result, archive it, and move to Analysis.
    pub fn finish_analysis_success(&mut self, result: AnalysisResult) {
        self.dismiss_progress();

        if let Some(config) = &self.config {
            self.history
                .append(HistoryItem::from_result(&config.topic, config.mode, result.clone()));
        }

        info!(
            "Analysis complete: overall score {}, {} wpm",
            result.overall_score, result.wpm
        );

        self.result = Some(result);
        self.stage = AppStage::Analysis;
    }

    /// Convert an analyzer failure into a notice and a setup transition.
    /// The recorded blob is discarded, never retained for retry.
    pub fn finish_analysis_failure(&mut self, error: &AnalyzerError) {
        self.dismiss_progress();

        warn!("Analysis failed: {}", error);

        self.audio_blob = None;
        self.recorded_duration = 0.0;
        self.result = None;
        self.notice = Some(format!("Analysis failed: {error}"));
        self.stage = AppStage::Setup;
    }

    fn dismiss_progress(&mut self) {
        if let Some(progress) = self.progress.take() {
            progress.cancel();
        }
        self.analyzing = false;
    }

    /// Run one recording through analysis. Must be called without holding
    /// the machine lock; the lock is only taken around the transitions so
    /// progress stays observable while the remote call is in flight.
    pub async fn analyze(
        machine: Arc<Mutex<SessionStateMachine>>,
        blob: RecordingBlob,
        duration_seconds: f64,
    ) {
        let ticket = {
            let mut machine = machine.lock().await;
            match machine.begin_analysis(blob, duration_seconds) {
                Ok(ticket) => ticket,
                Err(e) => {
                    warn!("Recording dropped: {}", e);
                    return;
                }
            }
        };

        let outcome = ticket
            .analyzer
            .analyze_speech(
                &ticket.blob,
                &ticket.config.topic,
                duration_seconds,
                ticket.config.mode,
                &ticket.config.language,
                ticket.config.level,
            )
            .await;

        let mut machine = machine.lock().await;
        match outcome {
            Ok(mut result) => {
                // Local pace always overrides the remote figure.
                result.wpm = pace_for_transcript(
                    &result.transcript,
                    &ticket.config.language,
                    duration_seconds,
                );
                machine.finish_analysis_success(result);
            }
            Err(e) => machine.finish_analysis_failure(&e),
        }
    }

    /// Analysis -> Setup, clearing the result and any held recording.
    pub fn restart(&mut self) -> Result<()> {
        if self.stage != AppStage::Analysis {
            bail!("restart is only valid from the analysis stage");
        }

        self.result = None;
        self.audio_blob = None;
        self.recorded_duration = 0.0;
        self.coach = None;
        self.stage = AppStage::Setup;

        info!("Session restarted");
        Ok(())
    }

    /// Load an archived result, bypassing recording entirely: no audio
    /// artifact, zero recorded duration, and a synthetic config carrying
    /// only the original topic and mode.
    pub fn load_history(&mut self, id: &str) -> Result<()> {
        if self.stage != AppStage::Setup {
            bail!("history can only be loaded from setup");
        }

        let item = match self.history.find(id) {
            Some(item) => item,
            None => bail!("no archived session with id {id}"),
        };

        info!("Loading archived session {} ('{}')", item.id, item.topic);

        self.config = Some(SessionConfig {
            topic: item.topic.clone(),
            mode: item.mode,
            ..SessionConfig::default()
        });
        self.result = Some(item.full_result);
        self.audio_blob = None;
        self.recorded_duration = 0.0;
        self.coach = None;
        self.stage = AppStage::Analysis;
        Ok(())
    }

    /// Send one message to the coaching conversation, opening it on first
    /// use. Requires an attached result.
    pub async fn coach_message(&mut self, message: &str) -> Result<String, AnalyzerError> {
        if self.coach.is_none() {
            let (result, config) = match (&self.result, &self.config) {
                (Some(result), Some(config)) => (result, config),
                _ => {
                    return Err(AnalyzerError::Transport(
                        "no analysis result to coach on".to_string(),
                    ))
                }
            };
            let coach = self
                .analyzer
                .create_coach(result, &config.topic, config.mode, &config.language)
                .await?;
            self.coach = Some(coach);
        }

        match self.coach.as_mut() {
            Some(coach) => coach.send(message).await,
            None => Err(AnalyzerError::Transport("coach unavailable".to_string())),
        }
    }
}
