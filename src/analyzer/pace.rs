// Local pace (wpm) recomputation.
//
// The remote analysis may include its own pace figure; the value shown to the
// user is always recomputed here from the transcript and the measured
// recording duration, and overrides the remote one.

/// Whether the language tag counts pace in characters rather than words.
pub fn is_character_counted(language: &str) -> bool {
    let tag = language.to_ascii_lowercase();
    tag.starts_with("zh") || tag.starts_with("ja")
}

/// Words (or content characters, for Chinese/Japanese tags) per minute,
/// rounded. Zero when the duration is not positive.
pub fn pace_for_transcript(transcript: &str, language: &str, duration_seconds: f64) -> u32 {
    if duration_seconds <= 0.0 {
        return 0;
    }

    let count = if is_character_counted(language) {
        // Content characters only: punctuation and whitespace stripped.
        transcript.chars().filter(|c| c.is_alphanumeric()).count()
    } else {
        transcript.split_whitespace().count()
    };

    let minutes = duration_seconds / 60.0;
    (count as f64 / minutes).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin_transcripts_count_words() {
        assert_eq!(
            pace_for_transcript("the quick brown fox jumps", "en-US", 10.0),
            30
        );
    }

    #[test]
    fn cjk_transcripts_count_content_characters() {
        let transcript = "今天天气好，我们一起去公园散步。大家都很开心！";
        let content = transcript.chars().filter(|c| c.is_alphanumeric()).count();
        assert_eq!(content, 20);
        assert_eq!(pace_for_transcript(transcript, "zh-CN", 60.0), 20);
    }

    #[test]
    fn zero_duration_yields_zero_pace() {
        assert_eq!(pace_for_transcript("hello there", "en-US", 0.0), 0);
    }

    #[test]
    fn language_tag_prefixes_select_the_counter() {
        assert!(is_character_counted("zh-TW"));
        assert!(is_character_counted("ja-JP"));
        assert!(!is_character_counted("en-GB"));
        assert!(!is_character_counted("de"));
    }
}
