//! Speech Handlers
//!
//! POST 用于前端 fetch，GET 用于 `<audio src>` 直接播放，两者契约相同

use axum::{
    body::Body,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::{header, HeaderValue, StatusCode},
    response::Response,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use crate::application::{AudioBody, SpeechAudio, SynthesizeSpeechCommand};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 缓存状态响应头：`hit` 或 `miss`
pub const AUDIO_CACHE_HEADER: &str = "x-audio-cache";
/// 缓存 key 响应头
pub const AUDIO_KEY_HEADER: &str = "x-audio-key";

#[derive(Debug, Default, Deserialize)]
pub struct TtsRequest {
    #[serde(default)]
    pub text: String,
    pub voice1: Option<String>,
    pub voice2: Option<String>,
    #[serde(alias = "questionId")]
    pub question_id: Option<i64>,
}

impl From<TtsRequest> for SynthesizeSpeechCommand {
    fn from(req: TtsRequest) -> Self {
        Self {
            text: req.text,
            voice1: req.voice1,
            voice2: req.voice2,
            question_id: req.question_id,
        }
    }
}

/// POST /api/tts
pub async fn synthesize_speech(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TtsRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    respond(&state, req).await
}

/// GET /api/tts
pub async fn stream_speech(
    State(state): State<Arc<AppState>>,
    query: Result<Query<TtsRequest>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(req) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    respond(&state, req).await
}

async fn respond(state: &AppState, req: TtsRequest) -> Result<Response, ApiError> {
    let audio = state.synthesize_handler.handle(req.into()).await?;
    audio_response(audio)
}

fn audio_response(audio: SpeechAudio) -> Result<Response, ApiError> {
    let key = HeaderValue::from_str(audio.key.as_str())
        .map_err(|e| ApiError::Internal(format!("Invalid cache key header: {}", e)))?;

    let body = match audio.body {
        AudioBody::Stream(stream) => Body::from_stream(ReaderStream::new(stream.reader)),
        AudioBody::Bytes(bytes) => Body::from(bytes),
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, audio.content_type)
        .header(header::CONTENT_LENGTH, audio.content_length)
        .header(header::CACHE_CONTROL, "no-cache")
        .header(AUDIO_CACHE_HEADER, audio.cache.as_str())
        .header(AUDIO_KEY_HEADER, key)
        .body(body)
        .map_err(|e| ApiError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::BlobStream;
    use crate::domain::speech::{CacheKey, QuestionId};
    use axum::body::to_bytes;

    #[tokio::test]
    async fn test_fresh_audio_response() {
        let key = CacheKey::entity(QuestionId::new(2).unwrap(), 77);
        let response = audio_response(SpeechAudio::fresh(key, vec![1, 2, 3])).unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "audio/wav");
        assert_eq!(headers[header::CONTENT_LENGTH], "3");
        assert_eq!(headers[AUDIO_CACHE_HEADER], "miss");
        assert_eq!(headers[AUDIO_KEY_HEADER], "entity_2_77");

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], &[1u8, 2, 3]);
    }

    #[tokio::test]
    async fn test_cached_audio_is_streamed() {
        let key = CacheKey::entity(QuestionId::new(2).unwrap(), 78);
        let data: &'static [u8] = b"RIFF-cached";
        let stream = BlobStream {
            reader: Box::pin(data),
            size: data.len() as u64,
        };

        let response = audio_response(SpeechAudio::cached(key, stream)).unwrap();
        assert_eq!(response.headers()[AUDIO_CACHE_HEADER], "hit");
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "11");

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], data);
    }

    #[test]
    fn test_request_accepts_camel_case_question_id() {
        let req: TtsRequest =
            serde_json::from_str(r#"{"text":"hi","questionId":5}"#).unwrap();
        assert_eq!(req.question_id, Some(5));
        assert_eq!(req.voice1, None);

        let cmd: SynthesizeSpeechCommand = req.into();
        assert_eq!(cmd.text, "hi");
        assert_eq!(cmd.question_id, Some(5));
    }
}
