use std::fmt;

use serde::{Deserialize, Serialize};

/// Age as written in persona documents — some use a number, some a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AgeValue {
    Number(u32),
    Text(String),
}

impl fmt::Display for AgeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgeValue::Number(n) => write!(f, "{n}"),
            AgeValue::Text(s) => write!(f, "{s}"),
        }
    }
}

/// A named bundle of descriptive traits, loaded from a JSON document.
///
/// Every field is optional; absent or empty fields are simply omitted from
/// the rendered prompt. A `Persona` is a plain value: loading one does not
/// install any process-wide state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Persona {
    pub name: Option<String>,
    pub age: Option<AgeValue>,
    pub gender: Option<String>,
    pub sexuality: Option<String>,
    pub description: Option<String>,
    pub background: Option<String>,
    pub occupation: Option<String>,
    pub traits: Vec<String>,
    pub default_greetings: Vec<String>,
    pub default_farewells: Vec<String>,
    pub tone: Option<String>,
    pub interests: Vec<String>,
    pub goals: Vec<String>,
    pub communication_style: Option<String>,
    pub favorite_quotes: Vec<String>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub fears: Vec<String>,
    pub likes: Vec<String>,
    pub dislikes: Vec<String>,
    pub quirks: Vec<String>,
    pub hobbies: Vec<String>,
    pub favorite_foods: Vec<String>,
    pub favorite_music: Vec<String>,
    pub favorite_books: Vec<String>,
    pub favorite_activities: Vec<String>,
    pub life_philosophy: Option<String>,
    pub dreams: Vec<String>,
    pub aspirations: Vec<String>,
    pub values: Vec<String>,
    pub relationships: Vec<String>,
    pub conflicts: Vec<String>,
    pub achievements: Vec<String>,
    pub challenges: Vec<String>,
    pub lessons_learned: Vec<String>,
    pub inspirations: Vec<String>,
}

/// On-disk document shape: the persona lives under a top-level
/// `personality` key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaDocument {
    pub personality: Persona,
}

/// Summary subset exposed to UIs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaInfo {
    pub name: Option<String>,
    pub age: Option<AgeValue>,
    pub gender: Option<String>,
    pub sexuality: Option<String>,
    pub description: Option<String>,
    pub background: Option<String>,
    pub occupation: Option<String>,
    pub traits: Vec<String>,
    pub interests: Vec<String>,
    pub goals: Vec<String>,
    pub communication_style: Option<String>,
}

impl Persona {
    /// The empty persona: every trait lookup yields fallback text.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A persona with no populated fields renders the sentinel prompt.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn info(&self) -> PersonaInfo {
        PersonaInfo {
            name: self.name.clone(),
            age: self.age.clone(),
            gender: self.gender.clone(),
            sexuality: self.sexuality.clone(),
            description: self.description.clone(),
            background: self.background.clone(),
            occupation: self.occupation.clone(),
            traits: self.traits.clone(),
            interests: self.interests.clone(),
            goals: self.goals.clone(),
            communication_style: self.communication_style.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_document_with_numeric_age() {
        let raw = r#"{"personality": {"name": "Bliss", "age": 24, "traits": ["curious"]}}"#;
        let doc: PersonaDocument = serde_json::from_str(raw).unwrap();
        assert_eq!(doc.personality.name.as_deref(), Some("Bliss"));
        assert_eq!(doc.personality.age, Some(AgeValue::Number(24)));
        assert_eq!(doc.personality.traits, vec!["curious"]);
    }

    #[test]
    fn test_parses_document_with_string_age() {
        let raw = r#"{"personality": {"age": "timeless"}}"#;
        let doc: PersonaDocument = serde_json::from_str(raw).unwrap();
        assert_eq!(doc.personality.age, Some(AgeValue::Text("timeless".into())));
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let raw = r#"{"personality": {"name": "Bliss", "shoe_size": 9}}"#;
        let doc: PersonaDocument = serde_json::from_str(raw).unwrap();
        assert_eq!(doc.personality.name.as_deref(), Some("Bliss"));
    }

    #[test]
    fn test_empty_persona() {
        assert!(Persona::empty().is_empty());
        let named = Persona {
            name: Some("Bliss".into()),
            ..Persona::default()
        };
        assert!(!named.is_empty());
    }
}
