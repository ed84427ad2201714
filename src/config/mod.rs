//! Deployment configuration for the pitch deck
//!
//! One `DeckConfig` re-skins the whole experience: client branding, ROI
//! assumptions, the voice agent persona and the booking link. It is loaded
//! from TOML and every section falls back to the Kerr Design Build defaults.
//!
//! Credentials never live in this file. The generation endpoint key is read
//! from the environment variable named by `generation.api_key_env`.

mod presets;

pub use presets::{Niche, DEFAULT_SYSTEM_INSTRUCTION};

use crate::speech::{VoiceGender, VoiceInfo};
use crate::{PitchError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Environment variable that points at an alternative config file
pub const CONFIG_PATH_ENV: &str = "PITCHDECK_CONFIG";

/// Default environment variable holding the generation API key
pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Complete deployment configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckConfig {
    pub client: ClientConfig,
    pub metrics: MetricsConfig,
    pub agent: AgentPersona,
    pub hero: HeroCopy,
    pub session: SessionConfig,
    pub generation: GenerationConfig,
    pub scheduling: SchedulingConfig,
    pub speech: SpeechConfig,
}

/// Branding of the prospect the deck is pitched to
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub name: String,
    pub website: String,
    pub industry: String,
    /// Accent color as `#RRGGBB`
    pub theme_color: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            name: "Kerr Design Build".to_string(),
            website: "https://kerrdesign.build/".to_string(),
            industry: "Home Renovation & Custom Builds".to_string(),
            theme_color: "#D4AF37".to_string(),
        }
    }
}

/// Starting values for the ROI calculator
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub avg_job_value: u32,
    pub default_leads: u32,
    /// Fraction of leads that reach voicemail (0.0 - 1.0)
    pub default_missed_rate: f64,
    /// Fraction of answered leads that close (0.0 - 1.0)
    pub default_close_rate: f64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            avg_job_value: 120_000,
            default_leads: 40,
            default_missed_rate: 0.30,
            default_close_rate: 0.15,
        }
    }
}

/// The simulated agent: who it is, how it sounds, what it says first
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentPersona {
    pub name: String,
    /// Role shown under the name on the demo card
    pub title: String,
    pub voice_gender: VoiceGender,
    /// Preferred voice name, tried before the gender preference list
    pub voice_name: Option<String>,
    pub first_message: String,
    pub system_instruction: String,
}

impl Default for AgentPersona {
    fn default() -> Self {
        Self {
            name: "Sarah".to_string(),
            title: "AI Project Evaluator".to_string(),
            voice_gender: VoiceGender::Female,
            voice_name: Some("Zephyr".to_string()),
            first_message: "Yeah, hey! Thanks for calling Kerr Design Build. This is Sarah... uh. How can I help you out today?".to_string(),
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
        }
    }
}

/// Headline copy on the Solution slide
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct HeroCopy {
    pub headline: String,
    pub highlight: String,
    pub subtitle: String,
}

impl Default for HeroCopy {
    fn default() -> Self {
        Self {
            headline: "Meet Your New 24/7".to_string(),
            highlight: "Home Renovation & Custom Builds Coordinator".to_string(),
            subtitle: "Experience the Kerr Design Build difference. She never sleeps, never misses a call, and converts leads into appointments instantly.".to_string(),
        }
    }
}

/// Turn-taking parameters of the voice session
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Recognition language tag
    pub language: String,
    /// Level below which the microphone counts as silent
    pub silence_threshold_db: f32,
    /// How long silence must last after recognized text to end an utterance
    pub silence_hold_ms: u64,
    /// Pause between the end of synthesis and listening again
    pub guard_delay_ms: u64,
    /// Delay before restarting a recognizer that ended on its own
    pub restart_delay_ms: u64,
    /// Utterances shorter than this (after trimming) are ignored
    pub min_utterance_chars: usize,
    pub speech_rate: f32,
    pub generation_timeout_ms: u64,
    pub resolve_timeout_ms: u64,
    /// Spoken when a generation call times out; never added to the transcript
    pub fallback_reply: String,
    pub channel_buffer_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            silence_threshold_db: -50.0,
            silence_hold_ms: 1500,
            guard_delay_ms: 400,
            restart_delay_ms: 100,
            min_utterance_chars: 2,
            speech_rate: 0.95,
            generation_timeout_ms: 12_000,
            resolve_timeout_ms: 10_000,
            fallback_reply: "Sorry, I didn't catch that. Could you say that again?".to_string(),
            channel_buffer_size: 64,
        }
    }
}

impl SessionConfig {
    pub fn silence_hold(&self) -> Duration {
        Duration::from_millis(self.silence_hold_ms)
    }

    pub fn guard_delay(&self) -> Duration {
        Duration::from_millis(self.guard_delay_ms)
    }

    pub fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_millis(self.generation_timeout_ms)
    }

    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_millis(self.resolve_timeout_ms)
    }

    /// Set the silence hold time
    pub fn with_silence_hold_ms(mut self, ms: u64) -> Self {
        self.silence_hold_ms = ms;
        self
    }

    /// Set the post-synthesis guard delay
    pub fn with_guard_delay_ms(mut self, ms: u64) -> Self {
        self.guard_delay_ms = ms;
        self
    }

    /// Set the generation timeout
    pub fn with_generation_timeout_ms(mut self, ms: u64) -> Self {
        self.generation_timeout_ms = ms;
        self
    }

    /// Set the recognizer restart delay
    pub fn with_restart_delay_ms(mut self, ms: u64) -> Self {
        self.restart_delay_ms = ms;
        self
    }
}

/// Hosted text-generation endpoint
///
/// Unknown fields are rejected, so a literal `api_key` in the file fails to load.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationConfig {
    pub base_url: String,
    /// Model to use when the endpoint lists it; otherwise the first usable one
    pub preferred_model: Option<String>,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            preferred_model: None,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
        }
    }
}

impl GenerationConfig {
    /// Read the API key from the environment
    pub fn api_key(&self) -> Result<String> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            _ => Err(PitchError::MissingCredential(format!(
                "environment variable {} is not set",
                self.api_key_env
            ))),
        }
    }

    /// Check whether a key is present without reading it into the caller
    pub fn has_api_key(&self) -> bool {
        self.api_key().is_ok()
    }
}

/// Embedded booking calendar
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingConfig {
    pub booking_url: String,
    pub background_color: String,
    pub text_color: String,
    /// Defaults to the client theme color when unset
    pub primary_color: Option<String>,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            booking_url: "https://calendly.com/nelson-ndoventures/one-on-one".to_string(),
            background_color: "#1a1a1a".to_string(),
            text_color: "#ffffff".to_string(),
            primary_color: None,
        }
    }
}

/// Native speech backends
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Path to a ggml Whisper model
    pub whisper_model: Option<PathBuf>,
    /// Directory with a VITS model, tokens and espeak data
    pub tts_model_dir: Option<PathBuf>,
    /// Voices the installed TTS model provides
    pub voices: Vec<VoiceInfo>,
}

impl DeckConfig {
    /// Configuration for one of the built-in niches
    pub fn for_niche(niche: Niche) -> Self {
        niche.apply(Self::default())
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: DeckConfig = toml::from_str(&content).map_err(|e| {
            PitchError::ConfigError(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        info!("Loaded deck config from {}", path.display());
        Ok(config)
    }

    /// Load from `PITCHDECK_CONFIG` or the user config dir, falling back to defaults
    pub fn load_or_default() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load(path),
            Some(path) => {
                debug!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            None => {
                warn!("Could not determine config directory, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Location of the config file
    pub fn config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|dir| dir.join("pitchdeck").join("deck.toml"))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.client.name.trim().is_empty() {
            return Err(PitchError::ConfigError("client.name must not be empty".into()));
        }
        parse_hex_color(&self.client.theme_color).ok_or_else(|| {
            PitchError::ConfigError(format!(
                "client.theme_color '{}' is not a #RRGGBB color",
                self.client.theme_color
            ))
        })?;
        for (field, value) in [
            ("scheduling.background_color", &self.scheduling.background_color),
            ("scheduling.text_color", &self.scheduling.text_color),
        ] {
            if parse_hex_color(value).is_none() {
                return Err(PitchError::ConfigError(format!(
                    "{} '{}' is not a #RRGGBB color",
                    field, value
                )));
            }
        }
        if let Some(primary) = &self.scheduling.primary_color {
            if parse_hex_color(primary).is_none() {
                return Err(PitchError::ConfigError(format!(
                    "scheduling.primary_color '{}' is not a #RRGGBB color",
                    primary
                )));
            }
        }

        let rates = [
            ("metrics.default_missed_rate", self.metrics.default_missed_rate),
            ("metrics.default_close_rate", self.metrics.default_close_rate),
        ];
        for (field, rate) in rates {
            if !(0.0..=1.0).contains(&rate) {
                return Err(PitchError::ConfigError(format!(
                    "{} must be between 0 and 1, got {}",
                    field, rate
                )));
            }
        }

        if self.agent.first_message.trim().is_empty() {
            return Err(PitchError::ConfigError(
                "agent.first_message must not be empty".into(),
            ));
        }
        if self.session.speech_rate <= 0.0 {
            return Err(PitchError::ConfigError(
                "session.speech_rate must be positive".into(),
            ));
        }
        if self.session.silence_hold_ms == 0 || self.session.generation_timeout_ms == 0 {
            return Err(PitchError::ConfigError(
                "session timings must be greater than 0".into(),
            ));
        }
        if self.session.channel_buffer_size == 0 {
            return Err(PitchError::ConfigError(
                "session.channel_buffer_size must be at least 1".into(),
            ));
        }
        if self.generation.api_key_env.trim().is_empty() {
            return Err(PitchError::ConfigError(
                "generation.api_key_env must name an environment variable".into(),
            ));
        }
        Ok(())
    }

    /// Set the client branding
    pub fn with_client(mut self, client: ClientConfig) -> Self {
        self.client = client;
        self
    }

    /// Set the agent persona
    pub fn with_agent(mut self, agent: AgentPersona) -> Self {
        self.agent = agent;
        self
    }

    /// Set the session tuning
    pub fn with_session(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }

    /// Set the generation endpoint
    pub fn with_generation(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    /// Booking color, falling back to the theme
    pub fn booking_primary_color(&self) -> &str {
        self.scheduling
            .primary_color
            .as_deref()
            .unwrap_or(&self.client.theme_color)
    }
}

/// Parse `#RRGGBB` (leading `#` optional) into RGB bytes
pub fn parse_hex_color(hex: &str) -> Option<[u8; 3]> {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = DeckConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.client.name, "Kerr Design Build");
        assert_eq!(config.agent.name, "Sarah");
        assert_eq!(config.metrics.avg_job_value, 120_000);
        assert_eq!(config.session.silence_hold_ms, 1500);
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#D4AF37"), Some([0xD4, 0xAF, 0x37]));
        assert_eq!(parse_hex_color("1a1a1a"), Some([0x1a, 0x1a, 0x1a]));
        assert_eq!(parse_hex_color("#FFF"), None);
        assert_eq!(parse_hex_color("#GG0000"), None);
    }

    #[test]
    fn test_invalid_theme_color_rejected() {
        let mut config = DeckConfig::default();
        config.client.theme_color = "gold".into();
        assert!(matches!(config.validate(), Err(PitchError::ConfigError(_))));
    }

    #[test]
    fn test_zero_channel_buffer_rejected() {
        let mut config = DeckConfig::default();
        config.session.channel_buffer_size = 0;
        assert!(matches!(config.validate(), Err(PitchError::ConfigError(_))));

        config.session.channel_buffer_size = 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rate_out_of_range_rejected() {
        let mut config = DeckConfig::default();
        config.metrics.default_close_rate = 15.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r##"
[client]
name = "Bright Smile Dental"
theme_color = "#3B82F6"

[agent]
name = "Jessica"
voice_gender = "female"
first_message = "Hello! This is Bright Smile Dental."
"##
        )
        .unwrap();

        let config = DeckConfig::load(file.path()).unwrap();
        assert_eq!(config.client.name, "Bright Smile Dental");
        assert_eq!(config.agent.name, "Jessica");
        // untouched sections keep their defaults
        assert_eq!(config.metrics.default_leads, 40);
        assert_eq!(config.session.language, "en-US");
    }

    #[test]
    fn test_literal_api_key_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[generation]
api_key = "AIza-not-allowed"
"#
        )
        .unwrap();

        assert!(matches!(
            DeckConfig::load(file.path()),
            Err(PitchError::ConfigError(_))
        ));
    }

    #[test]
    fn test_missing_api_key_env() {
        let generation = GenerationConfig {
            api_key_env: "PITCHDECK_TEST_KEY_THAT_IS_NEVER_SET".into(),
            ..Default::default()
        };
        assert!(!generation.has_api_key());
        assert!(matches!(
            generation.api_key(),
            Err(PitchError::MissingCredential(_))
        ));
    }

    #[test]
    fn test_booking_color_defaults_to_theme() {
        let mut config = DeckConfig::default();
        assert_eq!(config.booking_primary_color(), "#D4AF37");
        config.scheduling.primary_color = Some("#22c55e".into());
        assert_eq!(config.booking_primary_color(), "#22c55e");
    }

    #[test]
    fn test_session_builder() {
        let session = SessionConfig::default()
            .with_silence_hold_ms(1200)
            .with_guard_delay_ms(0)
            .with_generation_timeout_ms(50);
        assert_eq!(session.silence_hold(), Duration::from_millis(1200));
        assert_eq!(session.guard_delay(), Duration::ZERO);
        assert_eq!(session.generation_timeout(), Duration::from_millis(50));
    }
}
