//! services/api/src/adapters/sst.rs
//!
//! This module contains the adapter for OpenAI's Speech-to-Text (Whisper) service.
//! It implements the `SpeechToTextService` port from the `core` crate.
//!
//! Uploaded recordings in a known container format are forwarded as they are. Anything
//! else is treated as raw little-endian 16-bit mono PCM and wrapped in a WAV header.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::audio::{AudioInput, CreateTranscriptionRequest},
    Client,
};
use async_trait::async_trait;
use hound::{WavSpec, WavWriter};
use tracing::debug;
use tutor_core::ports::{PortError, PortResult, SpeechToTextService};

/// Sample rate assumed for raw PCM uploads.
pub const PCM_SAMPLE_RATE: u32 = 48_000;

/// Raw PCM shorter than this is not worth a provider call.
const MIN_PCM_BYTES: usize = (PCM_SAMPLE_RATE as usize / 10) * 2;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `SpeechToTextService` port using the OpenAI Whisper API.
#[derive(Clone)]
pub struct OpenAiSstAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiSstAdapter {
    /// Creates a new `OpenAiSstAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

/// The upload file name for audio in a recognised container, `None` for raw PCM.
pub fn container_file_name(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(b"RIFF") && data.get(8..12) == Some(&b"WAVE"[..]) {
        Some("speech.wav")
    } else if data.starts_with(b"ID3") || data.starts_with(&[0xFF, 0xFB]) {
        Some("speech.mp3")
    } else if data.starts_with(b"OggS") {
        Some("speech.ogg")
    } else if data.starts_with(b"fLaC") {
        Some("speech.flac")
    } else if data.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
        Some("speech.webm")
    } else if data.get(4..8) == Some(&b"ftyp"[..]) {
        Some("speech.m4a")
    } else {
        None
    }
}

pub fn pcm16_to_wav(pcm_data: &[u8], sample_rate: u32) -> Result<Vec<u8>, hound::Error> {
    let mut cursor = std::io::Cursor::new(Vec::new());

    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = WavWriter::new(&mut cursor, spec)?;
    for chunk in pcm_data.chunks_exact(2) {
        let sample = i16::from_le_bytes([chunk[0], chunk[1]]);
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(cursor.into_inner())
}

//=========================================================================================
// `SpeechToTextService` Trait Implementation
//=========================================================================================

#[async_trait]
impl SpeechToTextService for OpenAiSstAdapter {
    /// Transcribes audio with the configured Whisper model. `language` may be empty.
    async fn transcribe_audio(&self, audio_data: &[u8], language: &str) -> PortResult<String> {
        let (file_name, payload) = match container_file_name(audio_data) {
            Some(name) => (name, audio_data.to_vec()),
            None => {
                if audio_data.len() < MIN_PCM_BYTES {
                    debug!(bytes = audio_data.len(), "Raw audio too short, skipping transcription");
                    return Ok(String::new());
                }
                let wav = pcm16_to_wav(audio_data, PCM_SAMPLE_RATE)
                    .map_err(|e| PortError::Unexpected(format!("Failed to encode WAV: {}", e)))?;
                ("speech.wav", wav)
            }
        };

        let request = CreateTranscriptionRequest {
            file: AudioInput::from_vec_u8(file_name.into(), payload),
            model: self.model.clone(),
            language: (!language.is_empty()).then(|| language.to_string()),
            ..Default::default()
        };

        // Call the API and manually map the error, which respects the orphan rule.
        let response = self
            .client
            .audio()
            .transcription()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Provider(e.to_string()))?;

        Ok(response.text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_common_containers() {
        let wav = pcm16_to_wav(&[0, 0, 1, 0], 16_000).unwrap();
        assert_eq!(container_file_name(&wav), Some("speech.wav"));
        assert_eq!(container_file_name(b"ID3\x04rest"), Some("speech.mp3"));
        assert_eq!(container_file_name(b"OggS\x00\x02"), Some("speech.ogg"));
        assert_eq!(container_file_name(b"\x00\x00\x00\x18ftypM4A "), Some("speech.m4a"));
        assert_eq!(container_file_name(&[0x01, 0x02, 0x03, 0x04]), None);
    }

    #[test]
    fn pcm_is_wrapped_with_one_sample_per_two_bytes() {
        let pcm: Vec<u8> = (0..100i16).flat_map(|s| s.to_le_bytes()).collect();
        let wav = pcm16_to_wav(&pcm, PCM_SAMPLE_RATE).unwrap();

        let reader = hound::WavReader::new(std::io::Cursor::new(wav)).unwrap();
        assert_eq!(reader.spec().sample_rate, PCM_SAMPLE_RATE);
        assert_eq!(reader.len(), 100);
    }

    #[tokio::test]
    async fn short_raw_audio_is_not_sent() {
        let adapter = OpenAiSstAdapter::new(
            Client::with_config(OpenAIConfig::new().with_api_key("unused")),
            "whisper-1".to_string(),
        );
        let text = adapter.transcribe_audio(&[0u8; 200], "en").await.unwrap();
        assert!(text.is_empty());
    }
}
