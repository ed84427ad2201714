//! Booking calendar link
//!
//! The calendar is a third-party page; we only build its URL with branding
//! colors and hand it to the system browser.

use crate::config::{DeckConfig, SchedulingConfig};
use crate::{PitchError, Result};
use reqwest::Url;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookingLink {
    base_url: String,
    background_color: String,
    text_color: String,
    primary_color: String,
}

impl BookingLink {
    pub fn new(
        base_url: impl Into<String>,
        background_color: &str,
        text_color: &str,
        primary_color: &str,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            background_color: query_color(background_color),
            text_color: query_color(text_color),
            primary_color: query_color(primary_color),
        }
    }

    pub fn from_scheduling(scheduling: &SchedulingConfig, theme_color: &str) -> Self {
        Self::new(
            scheduling.booking_url.clone(),
            &scheduling.background_color,
            &scheduling.text_color,
            scheduling.primary_color.as_deref().unwrap_or(theme_color),
        )
    }

    pub fn from_config(config: &DeckConfig) -> Self {
        Self::from_scheduling(&config.scheduling, &config.client.theme_color)
    }

    /// Full booking URL with color query parameters
    pub fn url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            PitchError::ConfigError(format!("Invalid booking url '{}': {}", self.base_url, e))
        })?;
        url.query_pairs_mut()
            .append_pair("background_color", &self.background_color)
            .append_pair("text_color", &self.text_color)
            .append_pair("primary_color", &self.primary_color);
        Ok(url)
    }
}

/// Calendly expects colors as lowercase hex without the `#`
fn query_color(color: &str) -> String {
    color.trim().trim_start_matches('#').to_ascii_lowercase()
}
