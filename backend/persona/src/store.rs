//! Loading persona documents from a directory of JSON files.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::warn;

use crate::schema::{Persona, PersonaDocument};

/// Name of the document used when a requested persona cannot be loaded.
const DEFAULT_PERSONA: &str = "default";

/// Reserved document excluded from listings.
const TEMPLATE_PERSONA: &str = "template";

/// Loads persona documents from `<dir>/<name>.json`.
///
/// Loading fails closed: a missing or malformed document degrades to the
/// `default` document, and if that is also unavailable, to the empty persona.
/// `load` never returns an error past this boundary.
pub struct PersonaStore {
    dir: PathBuf,
}

impl PersonaStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load the named persona, degrading to `default` and then to the empty
    /// persona on failure.
    pub fn load(&self, name: &str) -> Persona {
        match self.read_document(name) {
            Ok(persona) => persona,
            Err(err) => {
                warn!(persona = name, error = %err, "failed to load persona, falling back");
                if name != DEFAULT_PERSONA {
                    if let Ok(persona) = self.read_document(DEFAULT_PERSONA) {
                        return persona;
                    }
                }
                warn!("default persona unavailable, using empty persona");
                Persona::empty()
            }
        }
    }

    /// Every persona name in the directory except the reserved template,
    /// sorted, derived from file stems.
    pub fn list_available(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(dir = %self.dir.display(), error = %err, "personas directory unreadable");
                return Vec::new();
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .filter(|name| name != TEMPLATE_PERSONA)
            .collect();
        names.sort();
        names
    }

    fn read_document(&self, name: &str) -> Result<Persona> {
        let path = self.dir.join(format!("{name}.json"));
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let doc: PersonaDocument = serde_json::from_str(&raw)
            .map_err(|err| anyhow!("invalid persona document {}: {err}", path.display()))?;
        Ok(doc.personality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::NO_PERSONALITY_PROMPT;

    fn write_persona(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(format!("{name}.json")), body).unwrap();
    }

    #[test]
    fn test_load_named_persona() {
        let dir = tempfile::tempdir().unwrap();
        write_persona(dir.path(), "luna", r#"{"personality": {"name": "Luna"}}"#);

        let store = PersonaStore::new(dir.path());
        let persona = store.load("luna");
        assert_eq!(persona.name.as_deref(), Some("Luna"));
    }

    #[test]
    fn test_missing_persona_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        write_persona(dir.path(), "default", r#"{"personality": {"name": "Default"}}"#);

        let store = PersonaStore::new(dir.path());
        let persona = store.load("nope");
        assert_eq!(persona.name.as_deref(), Some("Default"));
    }

    #[test]
    fn test_malformed_persona_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        write_persona(dir.path(), "broken", "{not json");
        write_persona(dir.path(), "default", r#"{"personality": {"name": "Default"}}"#);

        let store = PersonaStore::new(dir.path());
        let persona = store.load("broken");
        assert_eq!(persona.name.as_deref(), Some("Default"));
    }

    #[test]
    fn test_missing_personality_key_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        write_persona(dir.path(), "bare", r#"{"name": "not nested"}"#);
        write_persona(dir.path(), "default", r#"{"personality": {"name": "Default"}}"#);

        let store = PersonaStore::new(dir.path());
        let persona = store.load("bare");
        assert_eq!(persona.name.as_deref(), Some("Default"));
    }

    #[test]
    fn test_no_default_yields_empty_persona() {
        let dir = tempfile::tempdir().unwrap();

        let store = PersonaStore::new(dir.path());
        let persona = store.load("nope");
        assert!(persona.is_empty());
        assert_eq!(persona.render_prompt(), NO_PERSONALITY_PROMPT);
    }

    #[test]
    fn test_list_excludes_template_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        write_persona(dir.path(), "zoe", r#"{"personality": {}}"#);
        write_persona(dir.path(), "ana", r#"{"personality": {}}"#);
        write_persona(dir.path(), "template", r#"{"personality": {}}"#);
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let store = PersonaStore::new(dir.path());
        assert_eq!(store.list_available(), vec!["ana", "zoe"]);
    }

    #[test]
    fn test_list_on_missing_directory() {
        let store = PersonaStore::new("/definitely/not/here");
        assert!(store.list_available().is_empty());
    }
}
