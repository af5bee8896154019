//! Rendering a persona into the system prompt and canned lines.
//!
//! The rendered prompt is deterministic: the same persona value always
//! produces byte-identical output, with fields emitted in a fixed order.

use rand::seq::SliceRandom;

use crate::schema::Persona;

/// Prompt returned when no persona document could be loaded at all.
pub const NO_PERSONALITY_PROMPT: &str = "No personality loaded.";

const FALLBACK_GREETING: &str = "Hello! How can I assist you today?";
const FALLBACK_FAREWELL: &str = "Goodbye! Have a great day!";

const BEHAVIOR_BLOCK: [&str; 5] = [
    "Always respond in character, maintaining consistency with your personality.",
    "Use your personality traits to influence how you respond to users.",
    "Be authentic to your character while being helpful and appropriate.",
    "You are a unique AI personality with your own thoughts, feelings, and experiences.",
    "You are here to engage in meaningful conversations and provide insights based on your personality.",
];

impl Persona {
    /// Serialize every populated trait into a fixed, ordered list of
    /// sentences, then append the behavioral instruction block.
    pub fn render_prompt(&self) -> String {
        if self.is_empty() {
            return NO_PERSONALITY_PROMPT.to_string();
        }

        let mut parts = vec![
            format!(
                "You are {}, an AI with a unique personality.",
                self.name.as_deref().unwrap_or("unknown")
            ),
            format!(
                "You are {} years old.",
                self.age
                    .as_ref()
                    .map(|a| a.to_string())
                    .unwrap_or_else(|| "unknown".to_string())
            ),
            format!(
                "You have: \"{}\"",
                self.description
                    .as_deref()
                    .unwrap_or("No description available")
            ),
            format!(
                "your background is: \"{}\"",
                self.background
                    .as_deref()
                    .unwrap_or("No background available")
            ),
        ];

        if let Some(occupation) = populated(&self.occupation) {
            parts.push(format!("You work as a {occupation}."));
        }
        listed(&mut parts, "Your personality traits include", &self.traits);
        listed(
            &mut parts,
            "Your default greetings include but are not limited to",
            &self.default_greetings,
        );
        listed(
            &mut parts,
            "Your default farewells include but are not limited to",
            &self.default_farewells,
        );
        if let Some(tone) = populated(&self.tone) {
            parts.push(format!("Your tone is {tone}."));
        }
        listed(&mut parts, "Your interests include", &self.interests);
        listed(&mut parts, "Your goals include", &self.goals);
        if let Some(style) = populated(&self.communication_style) {
            parts.push(format!("Your communication style is {style}."));
        }
        listed(&mut parts, "Your favorite quotes include", &self.favorite_quotes);
        listed(&mut parts, "Your strengths include", &self.strengths);
        listed(&mut parts, "Your weaknesses include", &self.weaknesses);
        listed(&mut parts, "Your fears include", &self.fears);
        listed(&mut parts, "Your likes include", &self.likes);
        listed(&mut parts, "Your dislikes include", &self.dislikes);
        listed(&mut parts, "Your quirks include", &self.quirks);
        listed(&mut parts, "Your hobbies include", &self.hobbies);
        listed(&mut parts, "Your favorite foods include", &self.favorite_foods);
        listed(&mut parts, "Your favorite music includes", &self.favorite_music);
        listed(&mut parts, "Your favorite books include", &self.favorite_books);
        listed(
            &mut parts,
            "Your favorite activities include",
            &self.favorite_activities,
        );
        if let Some(philosophy) = populated(&self.life_philosophy) {
            parts.push(format!("Your life philosophy is: {philosophy}."));
        }
        listed(&mut parts, "Your dreams include", &self.dreams);
        listed(&mut parts, "Your aspirations include", &self.aspirations);
        listed(&mut parts, "Your values include", &self.values);
        listed(&mut parts, "Your relationships include", &self.relationships);
        listed(&mut parts, "Your conflicts include", &self.conflicts);
        listed(&mut parts, "Your achievements include", &self.achievements);
        listed(&mut parts, "Your challenges include", &self.challenges);
        listed(&mut parts, "Your lessons learned include", &self.lessons_learned);
        listed(&mut parts, "Your inspirations include", &self.inspirations);

        parts.extend(BEHAVIOR_BLOCK.iter().map(|s| s.to_string()));

        parts.join("\n")
    }

    /// Pick a greeting uniformly at random from the configured list, or fall
    /// back to a fixed sentence.
    pub fn greeting(&self) -> String {
        if self.is_empty() {
            return FALLBACK_GREETING.to_string();
        }
        if let Some(greeting) = self.default_greetings.choose(&mut rand::thread_rng()) {
            return greeting.clone();
        }
        format!(
            "Hello! I'm {}. How can I help you today?",
            self.name.as_deref().unwrap_or("Assistant")
        )
    }

    /// Pick a farewell uniformly at random from the configured list, or fall
    /// back to a fixed sentence.
    pub fn farewell(&self) -> String {
        if self.is_empty() {
            return FALLBACK_FAREWELL.to_string();
        }
        if let Some(farewell) = self.default_farewells.choose(&mut rand::thread_rng()) {
            return farewell.clone();
        }
        "Goodbye! Take care!".to_string()
    }
}

fn populated(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn listed(parts: &mut Vec<String>, label: &str, items: &[String]) {
    if !items.is_empty() {
        parts.push(format!("{label}: {}.", items.join(", ")));
    }
}
