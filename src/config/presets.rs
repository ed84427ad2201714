//! Built-in niche presets

use super::{AgentPersona, DeckConfig, HeroCopy};
use crate::speech::VoiceGender;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const DEFAULT_SYSTEM_INSTRUCTION: &str = r#"Role: You are Sarah, the lead coordinator for Kerr Design Build.

VOICE STYLE:
1. Be imperfect. You are speaking over the phone, not writing an essay.
2. Use occasional fillers ("um", "uh", "you know") sparingly, mostly when thinking or changing topic.
3. Vary your pace: short bursts, slower for important details.
4. Short and punchy. No monologues.
5. Casual professional. Use contractions ("I'll", "it's", "Yeah, hey!").
6. If the caller pauses, give a quick "mhm" or "got it".

OBJECTIVE:
Pre-qualify the caller to make sure they are serious and motivated. If they are, book a "Free Project Evaluation".
Never quote prices over the phone. You sell the appointment.

QUALIFICATION (ask one or two naturally):
- When were you hoping to start the project?
- Roughly how big is it? A whole home or a single room?
- What's the main reason you're looking to do this now?

CONTACT DETAILS (required before offering times):
Full name, property address, email for the confirmation, best phone number.

IF ASKED "ARE YOU REAL?":
You're an AI assistant that makes sure callers get immediate service without waiting on hold, and you can book an expert right away.

IF ASKED ABOUT PRICE:
Every project is unique. The best way to get an exact price is a free evaluation. Offer to find a time.

AFTER HOURS:
The office is closed but you're here 24/7 to get them on the schedule first thing.

URGENCY:
If they mention a leak, water or a burst pipe, check whether water is coming in right now."#;

/// A named configuration preset
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Niche {
    #[default]
    Renovation,
    Dentist,
    Coach,
}

impl Niche {
    pub const ALL: [Niche; 3] = [Niche::Renovation, Niche::Dentist, Niche::Coach];

    /// Persona for this niche
    pub fn persona(&self) -> AgentPersona {
        match self {
            Niche::Renovation => AgentPersona::default(),
            Niche::Dentist => AgentPersona {
                name: "Jessica".to_string(),
                title: "AI Booking Assistant".to_string(),
                voice_gender: VoiceGender::Female,
                voice_name: None,
                first_message: "Hello! This is Bright Smile Dental. Are you calling for a check-up or an emergency?".to_string(),
                system_instruction: "You are Jessica, a friendly receptionist for Bright Smile Dental. Your goal is to schedule a check-up. Be soothing and brief (1 sentence max).".to_string(),
            },
            Niche::Coach => AgentPersona {
                name: "Alex".to_string(),
                title: "AI Strategy Coach".to_string(),
                voice_gender: VoiceGender::Male,
                voice_name: None,
                first_message: "Hey there! Ready to crush your goals? What's on your mind today?".to_string(),
                system_instruction: "You are Alex, a high-performance life coach. You are energetic, direct, and motivating. Your goal is to get the user to book a strategy call. Keep it punchy.".to_string(),
            },
        }
    }

    /// Solution slide copy for this niche
    pub fn hero(&self) -> HeroCopy {
        match self {
            Niche::Renovation => HeroCopy {
                headline: "Meet Your New".to_string(),
                highlight: "Home Coordinator".to_string(),
                subtitle: "She never sleeps, never misses a call, and books appointments instantly.".to_string(),
            },
            Niche::Dentist => HeroCopy {
                headline: "24/7 Dental".to_string(),
                highlight: "Booking Assistant".to_string(),
                subtitle: "Book your cleaning or emergency exam without waiting on hold.".to_string(),
            },
            Niche::Coach => HeroCopy {
                headline: "High-Performance".to_string(),
                highlight: "Life Coach AI".to_string(),
                subtitle: "Get immediate feedback and book your strategy session.".to_string(),
            },
        }
    }

    /// Accent color for this niche
    pub fn theme_color(&self) -> &'static str {
        match self {
            Niche::Renovation => "#D4AF37",
            Niche::Dentist => "#3B82F6",
            Niche::Coach => "#22C55E",
        }
    }

    /// Overlay this niche onto a base configuration
    pub fn apply(&self, mut config: DeckConfig) -> DeckConfig {
        config.agent = self.persona();
        config.hero = self.hero();
        config.client.theme_color = self.theme_color().to_string();
        config
    }
}

impl FromStr for Niche {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "renovation" => Ok(Niche::Renovation),
            "dentist" => Ok(Niche::Dentist),
            "coach" => Ok(Niche::Coach),
            other => Err(format!("unknown niche '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_niche_produces_valid_config() {
        for niche in Niche::ALL {
            let config = DeckConfig::for_niche(niche);
            assert!(config.validate().is_ok(), "{:?} is invalid", niche);
        }
    }

    #[test]
    fn test_niche_switches_persona() {
        let coach = DeckConfig::for_niche(Niche::Coach);
        assert_eq!(coach.agent.name, "Alex");
        assert_eq!(coach.agent.voice_gender, VoiceGender::Male);
        assert_eq!(coach.client.theme_color, "#22C55E");

        let dentist = DeckConfig::for_niche(Niche::Dentist);
        assert_eq!(dentist.agent.name, "Jessica");
        assert!(dentist.agent.first_message.contains("Bright Smile Dental"));
    }

    #[test]
    fn test_parse_niche() {
        assert_eq!("Dentist".parse::<Niche>(), Ok(Niche::Dentist));
        assert_eq!(" coach ".parse::<Niche>(), Ok(Niche::Coach));
        assert!("plumber".parse::<Niche>().is_err());
    }
}
