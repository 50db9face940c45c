//! Dictionary form (JSON object)
//!
//! ```json
//! {
//!   "user_input": "...",
//!   "story": {"text": "...", "word_count": 120},
//!   "analysis": {...},
//!   "metadata": {...},
//!   "timestamps": {
//!     "service_b_story_analyzer": {
//!       "service_name": "service_b_story_analyzer",
//!       "received": "2025-01-01T10:00:00.000000+01:00",
//!       "received_timestamp": 1735722000.0,
//!       "duration_ms": 1.23
//!     }
//!   },
//!   "total_duration_ms": 12.5
//! }
//! ```

use contracts::{Message, TimestampRecord};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use timeline::format_rfc3339;

use super::round2;

fn insert_field<T: Serialize>(dict: &mut Map<String, Value>, key: &str, value: Option<&T>) {
    if let Some(value) = value.and_then(|v| serde_json::to_value(v).ok()) {
        dict.insert(key.to_string(), value);
    }
}

/// Encode a message into its dictionary form
pub fn to_dict(message: &Message) -> Value {
    let mut dict = Map::new();
    dict.insert("user_input".into(), json!(message.user_input));

    // empty text is encoded as no story; decoders treat "" as absent too
    if let Some(text) = message.story_text.as_deref().filter(|t| !t.is_empty()) {
        dict.insert(
            "story".into(),
            json!({ "text": text, "word_count": message.story_word_count() }),
        );
    }

    insert_field(&mut dict, "analysis", message.analysis.as_ref());
    insert_field(&mut dict, "image_concept", message.image_concept.as_ref());
    insert_field(&mut dict, "audio_script", message.audio_script.as_ref());
    insert_field(&mut dict, "translations", message.translations.as_ref());
    insert_field(&mut dict, "formatted_output", message.formatted_output.as_ref());
    insert_field(&mut dict, "metadata", Some(&message.metadata));
    dict.insert("timestamps".into(), timestamps_to_dict(&message.timestamps));

    if let Some(total) = message.total_duration_ms() {
        dict.insert("total_duration_ms".into(), json!(round2(total)));
    }

    Value::Object(dict)
}

fn timestamp_to_dict(ts: &TimestampRecord) -> Value {
    let mut entry = Map::new();
    entry.insert("service_name".into(), json!(ts.stage_name));

    for (label, instant) in [
        ("received", ts.received_at),
        ("started", ts.started_at),
        ("completed", ts.completed_at),
    ] {
        if let Some(at) = instant {
            entry.insert(label.to_string(), json!(format_rfc3339(at)));
            entry.insert(format!("{label}_timestamp"), json!(at));
        }
    }

    if let Some(duration) = ts.duration_ms() {
        entry.insert("duration_ms".into(), json!(round2(duration)));
    }

    Value::Object(entry)
}

/// Encode timestamp records into their wire objects
pub fn timestamps_to_dict(timestamps: &BTreeMap<String, TimestampRecord>) -> Value {
    Value::Object(
        timestamps
            .iter()
            .map(|(name, ts)| (name.clone(), timestamp_to_dict(ts)))
            .collect(),
    )
}

/// Absent, or present and numeric; `None` means the entry is malformed
fn instant(entry: &Map<String, Value>, key: &str) -> Option<Option<f64>> {
    match entry.get(key) {
        None | Some(Value::Null) => Some(None),
        Some(value) => value.as_f64().map(Some),
    }
}

fn timestamp_from_entry(name: &str, entry: &Value) -> Option<TimestampRecord> {
    let entry = entry.as_object()?;
    Some(TimestampRecord {
        stage_name: name.to_string(),
        received_at: instant(entry, "received_timestamp")?,
        started_at: instant(entry, "started_timestamp")?,
        completed_at: instant(entry, "completed_timestamp")?,
    })
}

/// Rebuild timestamp records from their wire objects.
///
/// Only the `*_timestamp` numbers are read; malformed entries are skipped.
pub fn timestamps_from_value(value: &Value) -> BTreeMap<String, TimestampRecord> {
    let Some(entries) = value.as_object() else {
        return BTreeMap::new();
    };

    entries
        .iter()
        .filter_map(|(name, entry)| {
            timestamp_from_entry(name, entry).map(|record| (name.clone(), record))
        })
        .collect()
}

fn typed<T: DeserializeOwned>(value: Option<&Value>) -> Option<T> {
    value
        .filter(|v| !v.is_null())
        .and_then(|v| serde_json::from_value(v.clone()).ok())
}

/// String value, with "" read as absent
fn non_empty(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Decode a message from its dictionary form.
///
/// Accepts `story_text` or the nested `story.text`. Fields that are missing
/// or do not parse come back as `None`; a non-object input yields an empty
/// message.
pub fn from_dict(value: &Value) -> Message {
    let Some(dict) = value.as_object() else {
        return Message::default();
    };

    let user_input = dict
        .get("user_input")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let mut message = Message::new(user_input);
    message.story_text = non_empty(dict.get("story_text"))
        .or_else(|| non_empty(dict.get("story").and_then(|s| s.get("text"))));
    message.analysis = typed(dict.get("analysis"));
    message.image_concept = typed(dict.get("image_concept"));
    message.audio_script = typed(dict.get("audio_script"));
    message.translations = typed(dict.get("translations"));
    message.formatted_output = typed(dict.get("formatted_output"));
    message.metadata = typed(dict.get("metadata")).unwrap_or_default();
    message.timestamps = dict
        .get("timestamps")
        .map(timestamps_from_value)
        .unwrap_or_default();

    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Analysis, Sentiment};

    fn sample() -> Message {
        let mut msg = Message::new("A space adventure about robots");
        msg.story_text = Some("Rover woke up. The stars were bright.".to_string());
        msg.analysis = Some(Analysis {
            word_count: 7,
            sentence_count: 2,
            paragraph_count: 1,
            sentiment: Sentiment::Positive,
            keywords: vec!["rover".into(), "stars".into()],
            characters: vec!["Rover".into()],
            avg_word_length: 4.25,
            extra: Map::new(),
        });
        msg.translations = Some(BTreeMap::from([("spanish".into(), "Hola".into())]));
        msg.metadata.insert("theme".into(), json!("space"));
        msg.timestamps.insert(
            "service_a_story_generator".into(),
            TimestampRecord {
                stage_name: "service_a_story_generator".into(),
                received_at: Some(1_700_000_000.0),
                started_at: Some(1_700_000_000.25),
                completed_at: Some(1_700_000_000.5),
            },
        );
        msg
    }

    #[test]
    fn test_dict_layout() {
        let dict = to_dict(&sample());

        assert_eq!(dict["story"]["word_count"], 7);
        assert_eq!(dict["analysis"]["sentiment"], "positive");
        assert!(dict.get("image_concept").is_none());

        let ts = &dict["timestamps"]["service_a_story_generator"];
        assert_eq!(ts["service_name"], "service_a_story_generator");
        assert_eq!(ts["started_timestamp"], 1_700_000_000.25);
        assert_eq!(ts["duration_ms"], 250.0);
        assert!(ts["completed"].as_str().unwrap().contains('T'));
        assert_eq!(dict["total_duration_ms"], 250.0);
    }

    #[test]
    fn test_round_trip_preserves_message() {
        let original = sample();
        assert_eq!(from_dict(&to_dict(&original)), original);
    }

    #[test]
    fn test_legacy_story_and_story_text() {
        let legacy = from_dict(&json!({"user_input": "x", "story": {"text": "Once"}}));
        assert_eq!(legacy.story_text.as_deref(), Some("Once"));

        let flat = from_dict(&json!({"user_input": "x", "story_text": "Twice"}));
        assert_eq!(flat.story_text.as_deref(), Some("Twice"));

        let empty = from_dict(&json!({"user_input": "x", "story": {"text": ""}}));
        assert_eq!(empty.story_text, None);
    }

    #[test]
    fn test_empty_story_is_absent_on_the_wire() {
        let mut msg = Message::new("x");
        msg.story_text = Some(String::new());

        let dict = to_dict(&msg);
        assert!(dict.get("story").is_none());
        assert_eq!(from_dict(&dict).story_text, None);
    }

    #[test]
    fn test_unparseable_fields_become_absent() {
        let msg = from_dict(&json!({
            "user_input": "x",
            "analysis": "not an object",
            "translations": {"spanish": 3},
            "audio_script": null,
            "metadata": [1, 2]
        }));

        assert_eq!(msg.analysis, None);
        assert_eq!(msg.translations, None);
        assert_eq!(msg.audio_script, None);
        assert!(msg.metadata.is_empty());
    }

    #[test]
    fn test_malformed_timestamp_entries_skipped() {
        let msg = from_dict(&json!({
            "user_input": "x",
            "timestamps": {
                "good": {"started_timestamp": 1.0, "completed_timestamp": 2.0},
                "bad_value": {"started_timestamp": "yesterday"},
                "not_object": 42,
                "human_only": {"started": "2025-01-01T00:00:00"}
            }
        }));

        assert_eq!(msg.timestamps.len(), 2);
        assert_eq!(msg.timestamps["good"].duration_ms(), Some(1000.0));
        assert_eq!(msg.timestamps["human_only"].started_at, None);
    }

    #[test]
    fn test_non_object_input() {
        assert_eq!(from_dict(&json!("hello")), Message::default());
    }
}
