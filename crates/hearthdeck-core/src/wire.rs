//! Typed commands and events plus their JSON wire forms.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    CallService,
    GetStates,
}

impl CommandKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::CallService => "call_service",
            CommandKind::GetStates => "get_states",
        }
    }
}

/// An outbound instruction for the hub. Produced by the UI, consumed
/// exactly once by the hub client, which stamps the message id at send
/// time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub entity_id: String,
    pub service: String,
    pub kind: CommandKind,
    pub include_domain: bool,
}

impl Command {
    pub fn call_service(entity_id: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            service: service.into(),
            kind: CommandKind::CallService,
            include_domain: true,
        }
    }

    pub fn toggle(entity_id: impl Into<String>) -> Self {
        Self::call_service(entity_id, "toggle")
    }

    pub fn get_states() -> Self {
        Self {
            entity_id: String::new(),
            service: String::new(),
            kind: CommandKind::GetStates,
            include_domain: false,
        }
    }
}

/// The domain is the entity id's prefix before the first dot, so
/// `switch.kitchen` belongs to the `switch` domain.
pub fn domain_of(entity_id: &str) -> &str {
    entity_id.split('.').next().unwrap_or("")
}

pub fn encode_command(command: &Command, id: u64) -> String {
    let mut message = Map::new();
    message.insert("id".to_string(), json!(id));
    message.insert("type".to_string(), json!(command.kind.as_str()));
    if !command.service.is_empty() {
        message.insert("service".to_string(), json!(command.service));
    }
    if command.include_domain {
        message.insert("domain".to_string(), json!(domain_of(&command.entity_id)));
    }
    if !command.entity_id.is_empty() {
        message.insert(
            "target".to_string(),
            json!({ "entity_id": command.entity_id }),
        );
    }
    Value::Object(message).to_string()
}

pub fn auth_message(token: &str) -> String {
    json!({ "type": "auth", "access_token": token }).to_string()
}

pub fn subscribe_message(id: u64) -> String {
    json!({ "id": id, "type": "subscribe_events" }).to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityState {
    pub entity_id: String,
    pub state: String,
}

/// Parsed form of one inbound hub message. Unrecognized or malformed
/// payloads become `Other` so the log still sees every message.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    StateChanged {
        entity_id: String,
        new_state: String,
        old_state: String,
    },
    StatesResult(Vec<EntityState>),
    Other(Value),
}

#[derive(Deserialize)]
struct EventMessage {
    event: EventBody,
}

#[derive(Deserialize)]
struct EventBody {
    event_type: String,
    data: EventData,
}

#[derive(Deserialize)]
struct EventData {
    entity_id: String,
    new_state: WireState,
    #[serde(default)]
    old_state: Option<WireState>,
}

#[derive(Deserialize)]
struct WireState {
    state: String,
}

#[derive(Deserialize)]
struct ResultMessage {
    result: Vec<EntityState>,
}

pub fn parse_event(text: &str) -> Event {
    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(_) => return Event::Other(Value::String(text.to_string())),
    };

    match value.get("type").and_then(Value::as_str) {
        Some("event") => match serde_json::from_value::<EventMessage>(value.clone()) {
            Ok(message) if message.event.event_type == "state_changed" => Event::StateChanged {
                entity_id: message.event.data.entity_id,
                new_state: message.event.data.new_state.state,
                old_state: message
                    .event
                    .data
                    .old_state
                    .map(|state| state.state)
                    .unwrap_or_default(),
            },
            _ => Event::Other(value),
        },
        Some("result") if value.get("result").map_or(false, Value::is_array) => {
            match serde_json::from_value::<ResultMessage>(value.clone()) {
                Ok(message) => Event::StatesResult(message.result),
                Err(_) => Event::Other(value),
            }
        }
        _ => Event::Other(value),
    }
}

/// Pretty-prints a raw message for the log view; non-JSON text passes
/// through untouched.
pub fn pretty(text: &str) -> String {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|_| text.to_string()),
        Err(_) => text.to_string(),
    }
}
