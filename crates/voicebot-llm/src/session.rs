use crate::tools::{tool_definitions, ToolDefinition};
use serde::{Deserialize, Serialize};

const AUDIO_FORMAT: &str = "pcm16";
const TRANSCRIPTION_MODEL: &str = "whisper-1";

/// Payload of the `session.update` event sent right after connecting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub voice: String,
    pub instructions: String,
    pub modalities: Vec<String>,
    pub input_audio_format: String,
    pub output_audio_format: String,
    pub input_audio_transcription: TranscriptionConfig,
    pub turn_detection: TurnDetection,
    pub tools: Vec<ToolDefinition>,
    pub tool_choice: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    pub model: String,
}

/// Server-side voice activity detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnDetection {
    #[serde(rename = "type")]
    pub kind: String,
    pub threshold: f32,
    pub prefix_padding_ms: u32,
    pub silence_duration_ms: u32,
    pub create_response: bool,
    pub interrupt_response: bool,
}

impl Default for TurnDetection {
    fn default() -> Self {
        Self {
            kind: "server_vad".to_string(),
            threshold: 0.6,
            prefix_padding_ms: 1000,
            silence_duration_ms: 2000,
            create_response: true,
            interrupt_response: true,
        }
    }
}

impl SessionConfig {
    /// Audio+text session with the collection tools enabled.
    pub fn new(voice: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self {
            voice: voice.into(),
            instructions: instructions.into(),
            modalities: vec!["audio".to_string(), "text".to_string()],
            input_audio_format: AUDIO_FORMAT.to_string(),
            output_audio_format: AUDIO_FORMAT.to_string(),
            input_audio_transcription: TranscriptionConfig {
                model: TRANSCRIPTION_MODEL.to_string(),
            },
            turn_detection: TurnDetection::default(),
            tools: tool_definitions(),
            tool_choice: "auto".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn session_update_payload() {
        let session = SessionConfig::new("alloy", "be polite");
        let value = serde_json::to_value(&session).unwrap();

        assert_eq!(value["voice"], "alloy");
        assert_eq!(value["instructions"], "be polite");
        assert_eq!(value["modalities"], json!(["audio", "text"]));
        assert_eq!(value["input_audio_format"], "pcm16");
        assert_eq!(value["output_audio_format"], "pcm16");
        assert_eq!(value["input_audio_transcription"]["model"], "whisper-1");
        assert_eq!(value["turn_detection"]["type"], "server_vad");
        assert_eq!(value["turn_detection"]["prefix_padding_ms"], 1000);
        assert_eq!(value["turn_detection"]["silence_duration_ms"], 2000);
        assert_eq!(value["turn_detection"]["interrupt_response"], true);
        assert_eq!(value["tool_choice"], "auto");
        assert_eq!(value["tools"][0]["name"], "check_payment_status");
    }
}
