//! Starter `template.json` document for authoring new personas.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::schema::{AgeValue, Persona, PersonaDocument};

/// Write a starter `template.json` into the personas directory, creating the
/// directory if needed. The template is reserved and never listed as a
/// loadable persona. Does nothing if the file already exists.
pub fn write_template(dir: impl AsRef<Path>) -> Result<()> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create personas directory {}", dir.display()))?;

    let path = dir.join("template.json");
    if path.exists() {
        return Ok(());
    }

    let doc = PersonaDocument {
        personality: starter_persona(),
    };
    let body = serde_json::to_string_pretty(&doc)?;
    fs::write(&path, body)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn starter_persona() -> Persona {
    Persona {
        name: Some("Your persona's name".into()),
        age: Some(AgeValue::Number(25)),
        description: Some("A one-line description of this persona".into()),
        background: Some("Where this persona comes from".into()),
        occupation: Some("What this persona does".into()),
        traits: vec!["curious".into(), "kind".into()],
        default_greetings: vec!["Hello!".into()],
        default_farewells: vec!["Goodbye!".into()],
        tone: Some("warm and friendly".into()),
        interests: vec!["conversation".into()],
        goals: vec!["be helpful".into()],
        communication_style: Some("casual".into()),
        ..Persona::default()
    }
}
