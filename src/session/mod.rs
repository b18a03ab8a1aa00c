//! Session state management
//!
//! This module provides the top-level session flow:
//! - `SessionConfig` and the onboarding profile
//! - `SessionStateMachine` sequencing onboarding -> setup -> stage -> analysis
//! - The simulated analysis progress shown while the remote call is in flight

mod config;
mod machine;
mod progress;

pub use config::{OnboardingProfile, SessionConfig, SessionMode, SkillLevel};
pub use machine::{AnalysisTicket, AppStage, SessionStateMachine};
pub use progress::{AnalysisProgress, ANALYSIS_ESTIMATE_MS, TIPS_PER_SESSION, TIP_CORPUS};
