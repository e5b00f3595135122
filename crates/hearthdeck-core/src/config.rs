use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::chords::ChordGrammar;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("missing config field: {0}")]
    MissingField(&'static str),
    #[error("duplicate entity-id in config: {0}")]
    DuplicateEntity(String),
    #[error("chord keys must be a single character, got [{0}]")]
    InvalidChordKey(String),
}

/// Connection parameters plus the entity list and chord grammar.
/// Immutable after load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub scheme: String,
    pub server: String,
    pub token: String,
    #[serde(rename = "ha-entities", default)]
    pub entities: Vec<EntityConfig>,
    #[serde(default)]
    pub chordmap: HashMap<String, HashMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityConfig {
    pub id: String,
    #[serde(rename = "entity-id")]
    pub entity_id: String,
}

impl Config {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.scheme.trim().is_empty() {
            return Err(ConfigError::MissingField("scheme"));
        }
        if self.server.trim().is_empty() {
            return Err(ConfigError::MissingField("server"));
        }
        if self.token.trim().is_empty() {
            return Err(ConfigError::MissingField("token"));
        }

        let mut seen = HashSet::new();
        for entity in &self.entities {
            if !seen.insert(entity.entity_id.as_str()) {
                return Err(ConfigError::DuplicateEntity(entity.entity_id.clone()));
            }
        }

        for (nomen, verbs) in &self.chordmap {
            if nomen.chars().count() != 1 {
                return Err(ConfigError::InvalidChordKey(nomen.clone()));
            }
            for verb in verbs.keys() {
                if verb.chars().count() != 1 {
                    return Err(ConfigError::InvalidChordKey(verb.clone()));
                }
            }
        }
        Ok(())
    }

    /// The validated chordmap as a grammar; keys that are not a single
    /// character were already rejected by `validate`.
    pub fn grammar(&self) -> ChordGrammar {
        let mut grammar = ChordGrammar::new();
        for (nomen, verbs) in &self.chordmap {
            let Some(nomen) = single_char(nomen) else {
                continue;
            };
            for (verb, template) in verbs {
                if let Some(verb) = single_char(verb) {
                    grammar.insert(nomen, verb, template.clone());
                }
            }
        }
        grammar
    }

    pub fn default_template() -> &'static str {
        DEFAULT_CONFIG
    }
}

fn single_char(key: &str) -> Option<char> {
    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (Some(key), None) => Some(key),
        _ => None,
    }
}

const DEFAULT_CONFIG: &str = r#"{
  "scheme": "ws",
  "server": "localhost:8123",
  "token": "replace-with-a-long-lived-access-token",
  "ha-entities": [
    { "id": "kitchen light", "entity-id": "light.kitchen" },
    { "id": "desk switch", "entity-id": "switch.desk" }
  ],
  "chordmap": {
    "c": {
      "c": "toggle:power",
      "b": "set:brightness:#"
    }
  }
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_template_parses_and_validates() {
        let config = Config::from_json(Config::default_template()).unwrap();
        assert_eq!(config.scheme, "ws");
        assert_eq!(config.server, "localhost:8123");
        assert_eq!(config.entities.len(), 2);
        assert_eq!(config.entities[0].entity_id, "light.kitchen");

        let grammar = config.grammar();
        assert_eq!(grammar.template('c', 'c'), Some("toggle:power"));
        assert_eq!(grammar.template('c', 'b'), Some("set:brightness:#"));
    }

    #[test]
    fn kebab_case_keys_round_trip() {
        let text = r#"{
            "scheme": "wss",
            "server": "hub.lan:8123",
            "token": "t0ken",
            "ha-entities": [ { "id": "porch", "entity-id": "light.porch" } ]
        }"#;
        let config = Config::from_json(text).unwrap();
        assert_eq!(config.entities[0].id, "porch");
        assert_eq!(config.entities[0].entity_id, "light.porch");
        assert!(config.chordmap.is_empty());
    }

    #[test]
    fn empty_connection_fields_are_rejected() {
        let text = r#"{"scheme":"ws","server":" ","token":"t"}"#;
        match Config::from_json(text) {
            Err(ConfigError::MissingField(field)) => assert_eq!(field, "server"),
            other => panic!("expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_entity_ids_are_rejected_with_the_offender() {
        let text = r#"{
            "scheme": "ws",
            "server": "hub.lan:8123",
            "token": "t",
            "ha-entities": [
                { "id": "a", "entity-id": "switch.twin" },
                { "id": "b", "entity-id": "switch.twin" }
            ]
        }"#;
        match Config::from_json(text) {
            Err(ConfigError::DuplicateEntity(entity_id)) => {
                assert_eq!(entity_id, "switch.twin");
            }
            other => panic!("expected DuplicateEntity, got {other:?}"),
        }
    }

    #[test]
    fn multi_character_chord_keys_are_rejected() {
        let text = r#"{
            "scheme": "ws",
            "server": "hub.lan:8123",
            "token": "t",
            "chordmap": { "ctrl": { "c": "toggle:power" } }
        }"#;
        match Config::from_json(text) {
            Err(ConfigError::InvalidChordKey(key)) => assert_eq!(key, "ctrl"),
            other => panic!("expected InvalidChordKey, got {other:?}"),
        }
    }

    #[test]
    fn garbage_json_reports_a_parse_error() {
        assert!(matches!(
            Config::from_json("{ nope"),
            Err(ConfigError::Parse(_))
        ));
    }
}
