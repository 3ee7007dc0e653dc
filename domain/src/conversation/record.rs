//! Persisted conversation record.
//!
//! The JSON projection of a [`Conversation`] written to object storage or the
//! local filesystem. Records are always written and read whole.
//!
//! ```json
//! {
//!   "messages": [
//!     { "role": "user", "content": "2+2?", "timestamp": "2024-05-01T10:00:00Z" },
//!     { "role": "assistant", "content": "4", "timestamp": "...", "thinking": "add" }
//!   ],
//!   "system_prompt": "You are Claude.",
//!   "force_thinking": true,
//!   "settings": { "temperature": 0.7, "max_tokens": 1000 },
//!   "created_at": "2024-05-01T09:59:00Z"
//! }
//! ```

use super::entities::{Conversation, Role, SamplingSettings, Turn};
use crate::core::error::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Key prefix shared by every stored conversation.
pub const RECORD_PREFIX: &str = "conversations/";

const RECORD_SUFFIX: &str = ".json";

/// Storage key for a conversation name: `conversations/<name>.json`.
pub fn record_key(name: &str) -> String {
    format!("{RECORD_PREFIX}{name}{RECORD_SUFFIX}")
}

/// Recover the conversation name from a storage key.
///
/// Returns `None` for keys that are not JSON records.
pub fn name_from_key(key: &str) -> Option<&str> {
    let file = key.rsplit('/').next()?;
    let name = file.strip_suffix(RECORD_SUFFIX)?;
    (!name.is_empty()).then_some(name)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub role: Role,
    pub content: String,
    /// `None` when the stored value is missing or not RFC 3339; the turn
    /// then takes the record's `created_at`.
    #[serde(default, deserialize_with = "rfc3339_or_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SettingsRecord {
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for SettingsRecord {
    fn default() -> Self {
        SamplingSettings::default().into()
    }
}

impl From<SamplingSettings> for SettingsRecord {
    fn from(settings: SamplingSettings) -> Self {
        Self {
            temperature: settings.temperature,
            max_tokens: settings.max_output_tokens,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub messages: Vec<MessageRecord>,
    #[serde(default)]
    pub system_prompt: String,
    #[serde(default)]
    pub force_thinking: bool,
    #[serde(default)]
    pub settings: SettingsRecord,
    #[serde(default = "Utc::now", deserialize_with = "rfc3339_or_now")]
    pub created_at: DateTime<Utc>,
}

fn parse_rfc3339(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|at| at.with_timezone(&Utc))
}

// Older records carry wall-clock strings such as "10:05 AM".
fn rfc3339_or_none<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_rfc3339))
}

fn rfc3339_or_now<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_rfc3339).unwrap_or_else(Utc::now))
}

impl ConversationRecord {
    pub fn from_conversation(conversation: &Conversation) -> Self {
        Self {
            messages: conversation
                .turns()
                .iter()
                .map(|turn| MessageRecord {
                    role: turn.role,
                    content: turn.text.clone(),
                    timestamp: Some(turn.created_at),
                    thinking: turn.reasoning.clone(),
                })
                .collect(),
            system_prompt: conversation.system_prompt().to_string(),
            force_thinking: conversation.force_reasoning(),
            settings: conversation.sampling().into(),
            created_at: conversation.created_at(),
        }
    }

    /// Rebuild the conversation stored under `name`.
    pub fn into_conversation(self, name: &str) -> Result<Conversation, DomainError> {
        let created_at = self.created_at;
        let turns = self
            .messages
            .into_iter()
            .map(|message| Turn {
                role: message.role,
                text: message.content,
                reasoning: message.thinking,
                created_at: message.timestamp.unwrap_or(created_at),
            })
            .collect();
        let sampling = SamplingSettings {
            temperature: self.settings.temperature,
            max_output_tokens: self.settings.max_tokens,
        };
        Conversation::from_parts(
            name,
            turns,
            self.system_prompt,
            self.force_thinking,
            sampling,
            created_at,
        )
    }

    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Conversation {
        let mut conversation = Conversation::new("maths").unwrap();
        conversation.set_system_prompt("Answer tersely.");
        conversation.set_force_reasoning(true);
        conversation
            .set_sampling(SamplingSettings::new(0.25, 2048).unwrap())
            .unwrap();
        conversation.append_turn(Turn::user("2+2?"));
        conversation.append_turn(Turn::assistant("4", Some("add the numbers".to_string())));
        conversation.append_turn(Turn::assistant("again", Some(String::new())));
        conversation.append_turn(Turn::tool("exit code 0"));
        conversation
    }

    #[test]
    fn test_record_round_trip_reproduces_conversation() {
        let original = sample();
        let bytes = ConversationRecord::from_conversation(&original)
            .to_json()
            .unwrap();
        let restored = ConversationRecord::from_json(&bytes)
            .unwrap()
            .into_conversation("maths")
            .unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_record_field_names() {
        let value: serde_json::Value = serde_json::from_slice(
            &ConversationRecord::from_conversation(&sample())
                .to_json()
                .unwrap(),
        )
        .unwrap();

        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "2+2?");
        assert!(value["messages"][0].get("thinking").is_none());
        assert_eq!(value["messages"][1]["thinking"], "add the numbers");
        assert_eq!(value["messages"][2]["thinking"], "");
        assert_eq!(value["messages"][3]["role"], "tool_response");
        assert_eq!(value["system_prompt"], "Answer tersely.");
        assert_eq!(value["force_thinking"], true);
        assert_eq!(value["settings"]["temperature"], 0.25);
        assert_eq!(value["settings"]["max_tokens"], 2048);
        assert!(value["created_at"].is_string());
        assert!(value["messages"][0]["timestamp"].is_string());
    }

    #[test]
    fn test_minimal_record_uses_defaults() {
        let json = br#"{ "messages": [] }"#;
        let conversation = ConversationRecord::from_json(json)
            .unwrap()
            .into_conversation("bare")
            .unwrap();
        assert!(conversation.is_empty());
        assert_eq!(conversation.system_prompt(), "");
        assert!(!conversation.force_reasoning());
        assert_eq!(conversation.sampling(), SamplingSettings::default());
    }

    #[test]
    fn test_wall_clock_timestamps_fall_back_to_created_at() {
        let json = br#"{
            "messages": [
                {"role": "user", "content": "hi", "timestamp": "10:05 AM"},
                {"role": "assistant", "content": "hello", "timestamp": "10:05 AM", "thinking": "greet"}
            ],
            "system_prompt": "Be brief.",
            "created_at": "2024-05-01T09:59:00Z"
        }"#;
        let conversation = ConversationRecord::from_json(json)
            .unwrap()
            .into_conversation("legacy")
            .unwrap();

        let created_at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 59, 0).unwrap();
        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation.created_at(), created_at);
        assert!(conversation.turns().iter().all(|t| t.created_at == created_at));
        assert_eq!(conversation.turns()[1].reasoning.as_deref(), Some("greet"));
    }

    #[test]
    fn test_unparseable_created_at_still_loads() {
        let json = br#"{
            "messages": [{"role": "user", "content": "hi", "timestamp": "2024-05-01T10:00:00.250+02:00"}],
            "created_at": "yesterday"
        }"#;
        let conversation = ConversationRecord::from_json(json)
            .unwrap()
            .into_conversation("legacy")
            .unwrap();

        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
            + chrono::Duration::milliseconds(250);
        assert_eq!(conversation.turns()[0].created_at, expected);
    }

    #[test]
    fn test_invalid_settings_rejected_on_load() {
        let json = br#"{ "messages": [], "settings": { "temperature": 3.0, "max_tokens": 10 } }"#;
        let err = ConversationRecord::from_json(json)
            .unwrap()
            .into_conversation("bad")
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidSampling(_)));
    }

    #[test]
    fn test_record_key_and_name_from_key() {
        assert_eq!(record_key("Default"), "conversations/Default.json");
        assert_eq!(name_from_key("conversations/Default.json"), Some("Default"));
        assert_eq!(name_from_key("conversations/nested/x.json"), Some("x"));
        assert_eq!(name_from_key("conversations/readme.txt"), None);
        assert_eq!(name_from_key("conversations/.json"), None);
    }
}
