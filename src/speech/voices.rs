//! Voice selection by persona gender
//!
//! Installed voice names vary wildly between platforms, so selection walks a
//! preference-ordered list of name patterns and degrades gracefully down to
//! the platform default voice.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceGender {
    #[default]
    Female,
    Male,
}

impl std::fmt::Display for VoiceGender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VoiceGender::Female => write!(f, "female"),
            VoiceGender::Male => write!(f, "male"),
        }
    }
}

/// A voice offered by a synthesizer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceInfo {
    pub name: String,
    /// BCP 47 tag, e.g. `en-US`
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub gender: Option<VoiceGender>,
    /// Speaker index for multi-speaker models
    #[serde(default)]
    pub speaker_id: Option<i32>,
}

fn default_language() -> String {
    "en-US".to_string()
}

impl VoiceInfo {
    pub fn new(name: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            language: language.into(),
            gender: None,
            speaker_id: None,
        }
    }

    pub fn with_gender(mut self, gender: VoiceGender) -> Self {
        self.gender = Some(gender);
        self
    }

    pub fn with_speaker_id(mut self, speaker_id: i32) -> Self {
        self.speaker_id = Some(speaker_id);
        self
    }

    fn is_english(&self) -> bool {
        self.language.to_ascii_lowercase().starts_with("en")
    }

    /// All patterns must appear in the name (case-insensitive)
    fn name_matches(&self, patterns: &[&str]) -> bool {
        let name = self.name.to_ascii_lowercase();
        patterns
            .iter()
            .all(|p| name.contains(&p.to_ascii_lowercase()))
    }
}

/// Name patterns tried in order for a gender
pub fn preference_list(gender: VoiceGender) -> &'static [&'static [&'static str]] {
    match gender {
        VoiceGender::Female => &[
            &["Natural", "English"],
            &["Google US English"],
            &["Female"],
            &["Samantha"],
            &["Zira"],
        ],
        VoiceGender::Male => &[
            &["Natural", "English", "Male"],
            &["Google UK English Male"],
            &["Male"],
            &["Daniel"],
            &["David"],
        ],
    }
}

/// Pick a voice for the persona, or `None` for the platform default
pub fn select_voice(
    voices: &[VoiceInfo],
    gender: VoiceGender,
    preferred_name: Option<&str>,
) -> Option<VoiceInfo> {
    if let Some(name) = preferred_name {
        if let Some(voice) = voices.iter().find(|v| v.name.eq_ignore_ascii_case(name)) {
            return Some(voice.clone());
        }
    }

    for patterns in preference_list(gender) {
        // "Female" also matches inside other names, so respect explicit tags
        if let Some(voice) = voices.iter().find(|v| {
            v.name_matches(patterns) && v.gender.map_or(true, |g| g == gender)
        }) {
            return Some(voice.clone());
        }
    }

    voices
        .iter()
        .find(|v| v.gender == Some(gender))
        .or_else(|| voices.iter().find(|v| v.is_english()))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voices() -> Vec<VoiceInfo> {
        vec![
            VoiceInfo::new("Microsoft David", "en-US").with_gender(VoiceGender::Male),
            VoiceInfo::new("Google US English", "en-US"),
            VoiceInfo::new("Microsoft Aria Online (Natural) - English (United States)", "en-US")
                .with_gender(VoiceGender::Female),
            VoiceInfo::new("Thomas", "fr-FR").with_gender(VoiceGender::Male),
        ]
    }

    #[test]
    fn test_female_prefers_natural_english() {
        let voice = select_voice(&voices(), VoiceGender::Female, None).unwrap();
        assert!(voice.name.contains("Aria"));
    }

    #[test]
    fn test_male_falls_back_through_list() {
        let voice = select_voice(&voices(), VoiceGender::Male, None).unwrap();
        assert_eq!(voice.name, "Microsoft David");
    }

    #[test]
    fn test_preferred_name_wins() {
        let voice = select_voice(&voices(), VoiceGender::Female, Some("google us english")).unwrap();
        assert_eq!(voice.name, "Google US English");
    }

    #[test]
    fn test_unknown_preferred_name_is_ignored() {
        let voice = select_voice(&voices(), VoiceGender::Female, Some("Zephyr")).unwrap();
        assert!(voice.name.contains("Aria"));
    }

    #[test]
    fn test_fallback_to_any_english_voice() {
        let only = vec![
            VoiceInfo::new("Hortense", "fr-FR"),
            VoiceInfo::new("Karen", "en-AU"),
        ];
        let voice = select_voice(&only, VoiceGender::Male, None).unwrap();
        assert_eq!(voice.name, "Karen");
    }

    #[test]
    fn test_no_voices_uses_platform_default() {
        assert_eq!(select_voice(&[], VoiceGender::Female, None), None);
    }

    #[test]
    fn test_gender_roundtrips_through_toml_names() {
        let gender: VoiceGender = serde_json::from_str("\"male\"").unwrap();
        assert_eq!(gender, VoiceGender::Male);
        assert_eq!(VoiceGender::Female.to_string(), "female");
    }
}
