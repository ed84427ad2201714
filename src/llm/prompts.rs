//! Persona prompt composition

use crate::config::{AgentPersona, ClientConfig};

/// Rules every voice persona follows regardless of niche
pub const VOICE_RULES: &str = r#"## Voice Rules

1. Your replies are spoken aloud over the phone. Plain sentences only.
2. No lists, markdown, emojis, URLs or stage directions.
3. One or two short sentences per reply unless the caller asks for detail.
4. Never claim to have booked anything you cannot see confirmed."#;

/// Build the instruction that opens every transcript
pub fn build_system_prompt(persona: &AgentPersona, client: &ClientConfig) -> String {
    let mut prompt = persona.system_instruction.trim().to_string();

    if prompt.is_empty() {
        prompt = format!(
            "You are {}, a warm and professional coordinator for {}.",
            persona.name, client.name
        );
    }

    prompt.push_str(&format!(
        "\n\n## Context\n\nYou answer calls for {} ({}). Your name is {}.",
        client.name, client.industry, persona.name
    ));
    prompt.push_str("\n\n");
    prompt.push_str(VOICE_RULES);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeckConfig;

    #[test]
    fn test_prompt_includes_persona_and_client() {
        let config = DeckConfig::default();
        let prompt = build_system_prompt(&config.agent, &config.client);
        assert!(prompt.starts_with("Role: You are Sarah"));
        assert!(prompt.contains("Kerr Design Build (Home Renovation & Custom Builds)"));
        assert!(prompt.contains("## Voice Rules"));
    }

    #[test]
    fn test_empty_instruction_gets_default_opening() {
        let config = DeckConfig::default();
        let mut persona = config.agent.clone();
        persona.system_instruction = "   ".into();
        let prompt = build_system_prompt(&persona, &config.client);
        assert!(prompt.starts_with("You are Sarah, a warm and professional coordinator for Kerr Design Build."));
    }
}
