//! Wire protocol between the supervisor and the engine daemon
//!
//! One JSON object per line. Requests are tagged by `call`, responses by
//! `result`.

use serde::{Deserialize, Serialize};

use crate::application::ports::RecorderService;
use crate::domain::recording::RecordingSession;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum EngineRequest {
    Start {
        phone_number: String,
        creation_time: i64,
    },
    Stop,
    IsRecording,
    GetActive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum EngineResponse {
    Started { ok: bool },
    Stopped { session: Option<RecordingSession> },
    Recording { active: bool },
    Active { session: Option<RecordingSession> },
    Error { message: String },
}

/// Serialize a message as one protocol line
pub fn encode_line<T: Serialize>(message: &T) -> Result<String, serde_json::Error> {
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    Ok(line)
}

pub fn decode_request(line: &str) -> Result<EngineRequest, serde_json::Error> {
    serde_json::from_str(line.trim())
}

pub fn decode_response(line: &str) -> Result<EngineResponse, serde_json::Error> {
    serde_json::from_str(line.trim())
}

/// Run one request against the engine
pub async fn dispatch(service: &dyn RecorderService, request: EngineRequest) -> EngineResponse {
    let result = match request {
        EngineRequest::Start {
            phone_number,
            creation_time,
        } => service
            .start(&phone_number, creation_time)
            .await
            .map(|ok| EngineResponse::Started { ok }),
        EngineRequest::Stop => service
            .stop()
            .await
            .map(|session| EngineResponse::Stopped { session }),
        EngineRequest::IsRecording => service
            .is_recording()
            .await
            .map(|active| EngineResponse::Recording { active }),
        EngineRequest::GetActive => service
            .get_active()
            .await
            .map(|session| EngineResponse::Active { session }),
    };

    result.unwrap_or_else(|e| EngineResponse::Error {
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_request_wire_shape() {
        let line = encode_line(&EngineRequest::Start {
            phone_number: "+15551234".to_string(),
            creation_time: 42,
        })
        .unwrap();

        assert!(line.ends_with('\n'));
        assert_eq!(
            line.trim(),
            r#"{"call":"start","phone_number":"+15551234","creation_time":42}"#
        );
    }

    #[test]
    fn unit_requests_are_tagged() {
        assert_eq!(decode_request(r#"{"call":"stop"}"#).unwrap(), EngineRequest::Stop);
        assert_eq!(
            decode_request(r#"{"call":"is_recording"}"#).unwrap(),
            EngineRequest::IsRecording
        );
        assert_eq!(
            decode_request(" {\"call\":\"get_active\"}\n").unwrap(),
            EngineRequest::GetActive
        );
    }

    #[test]
    fn unknown_call_is_rejected() {
        assert!(decode_request(r#"{"call":"toggle"}"#).is_err());
        assert!(decode_request("status").is_err());
    }

    #[test]
    fn empty_session_decodes_as_none() {
        let response = decode_response(r#"{"result":"active","session":null}"#).unwrap();
        assert_eq!(response, EngineResponse::Active { session: None });
    }
}
