// Tests for the analyzer boundary: the disabled fallback implementation,
// degraded outputs, and the wire shape of the analysis result.

use podium::analyzer::{
    placeholder_outline, AnalysisResult, Analyzer, AnalyzerError, DisabledAnalyzer,
    FALLBACK_TOPIC,
};
use podium::media::RecordingBlob;
use podium::session::{SessionMode, SkillLevel};

#[tokio::test]
async fn disabled_analyzer_falls_back_for_generation() {
    let analyzer = DisabledAnalyzer;

    let topic = analyzer
        .generate_topic(
            &["Science".to_string()],
            "en-US",
            SessionMode::Speech,
            SkillLevel::Beginner,
        )
        .await;
    assert_eq!(topic, FALLBACK_TOPIC);

    let outline = analyzer.generate_outline("My topic", "en-US").await;
    assert!(outline.central_idea.contains("My topic"));
    assert_eq!(outline.points.len(), 3);
}

#[tokio::test]
async fn disabled_analyzer_propagates_for_analysis() {
    let analyzer = DisabledAnalyzer;
    let blob = RecordingBlob {
        data: vec![1, 2, 3],
        mime_type: "audio/wav".to_string(),
    };

    let err = analyzer
        .analyze_speech(
            &blob,
            "topic",
            10.0,
            SessionMode::Speech,
            "en-US",
            SkillLevel::Beginner,
        )
        .await
        .expect_err("analysis must fail when disabled");
    assert!(matches!(err, AnalyzerError::Disabled));
}

#[test]
fn placeholder_outline_echoes_the_topic_with_three_points() {
    let outline = placeholder_outline("Public speaking");
    assert!(outline.central_idea.contains("Public speaking"));
    assert_eq!(outline.points.len(), 3);
}

#[test]
fn analysis_result_parses_the_remote_wire_shape() {
    let payload = r#"{
        "overallScore": 88,
        "subScores": {
            "logic": 90, "delivery": 85, "structure": 88,
            "vocabulary": 80, "emotion": 82
        },
        "transcript": "hello everyone",
        "wpm": 120,
        "fillerWordCount": 3,
        "structure": {
            "isPrep": true,
            "point": "p", "reason": "r", "example": "e",
            "pointRestated": "pr", "feedback": "f"
        },
        "sentiment": "positive",
        "speechFramework": [
            {"name": "Hook", "description": "d", "polishedScript": "s"}
        ],
        "grammarAnalysis": [
            {"original": "o", "correction": "c", "reason": "r"}
        ],
        "strengths": ["clear"],
        "weaknesses": ["short"]
    }"#;

    let result: AnalysisResult = serde_json::from_str(payload).unwrap();
    assert_eq!(result.overall_score, 88);
    assert_eq!(result.sub_scores.logic, 90);
    assert_eq!(result.filler_word_count, 3);
    assert!(result.structure.is_prep);
    assert_eq!(result.structure.point_restated, "pr");
    assert_eq!(result.speech_framework[0].polished_script, "s");

    // Round trip keeps the camelCase wire names.
    let encoded = serde_json::to_string(&result).unwrap();
    assert!(encoded.contains("overallScore"));
    assert!(encoded.contains("fillerWordCount"));
    assert!(encoded.contains("polishedScript"));
}

#[test]
fn unparsable_replies_surface_as_malformed() {
    let err = serde_json::from_str::<AnalysisResult>("{\"nope\": true}")
        .map_err(|e| AnalyzerError::Malformed(e.to_string()))
        .expect_err("shape mismatch must fail");
    assert!(matches!(err, AnalyzerError::Malformed(_)));
}
