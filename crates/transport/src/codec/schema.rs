//! Binary-schema form (prost message with JSON slots)

use contracts::Message;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::dict::{timestamps_from_value, timestamps_to_dict};
use crate::proto::PipelineMessage;

fn safe_dumps<T: Serialize>(value: Option<&T>) -> String {
    value
        .and_then(|v| serde_json::to_string(v).ok())
        .unwrap_or_default()
}

fn safe_loads<T: DeserializeOwned>(raw: &str) -> Option<T> {
    if raw.is_empty() {
        return None;
    }
    serde_json::from_str(raw).ok()
}

/// Encode a message into the wire struct
pub fn to_proto(message: &Message) -> PipelineMessage {
    PipelineMessage {
        user_input: message.user_input.clone(),
        story_text: message.story_text.clone().unwrap_or_default(),
        analysis_json: safe_dumps(message.analysis.as_ref()),
        image_concept_json: safe_dumps(message.image_concept.as_ref()),
        audio_script_json: safe_dumps(message.audio_script.as_ref()),
        translations_json: safe_dumps(message.translations.as_ref()),
        formatted_output_json: safe_dumps(message.formatted_output.as_ref()),
        metadata_json: safe_dumps(Some(&message.metadata)),
        timestamps_json: safe_dumps(Some(&timestamps_to_dict(&message.timestamps))),
    }
}

/// Decode a message from the wire struct; bad slots become absent fields
pub fn from_proto(proto: PipelineMessage) -> Message {
    let mut message = Message::new(proto.user_input);
    // the slot cannot tell "" from unset, so both decode as absent
    message.story_text = Some(proto.story_text).filter(|s| !s.is_empty());
    message.analysis = safe_loads(&proto.analysis_json);
    message.image_concept = safe_loads(&proto.image_concept_json);
    message.audio_script = safe_loads(&proto.audio_script_json);
    message.translations = safe_loads(&proto.translations_json);
    message.formatted_output = safe_loads(&proto.formatted_output_json);
    message.metadata = safe_loads(&proto.metadata_json).unwrap_or_default();
    message.timestamps = safe_loads::<Value>(&proto.timestamps_json)
        .map(|v| timestamps_from_value(&v))
        .unwrap_or_default();
    message
}
