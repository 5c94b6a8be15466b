//! Conversion between the JSON wire representation and typed envelopes.
//!
//! Decoding is total over well-formed frames: a recognized tag yields the
//! matching [`ServerEnvelope`] variant, an unrecognized tag yields
//! [`ServerEnvelope::Unknown`], and only structurally broken input (not
//! JSON, no `type` tag, payload of the wrong shape) produces a
//! [`DecodeError`]. Callers log and drop failed frames; a decode failure
//! must never take the connection down.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use super::envelope::{ClientEnvelope, ServerEnvelope};
use super::{ChatMessage, ChatRoomInfo, Notification, PaymentAgreement};

/// Errors produced while decoding an inbound frame.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The frame is not valid JSON
    #[error("malformed frame: {0}")]
    Malformed(String),

    /// The frame is JSON but carries no string `type` tag
    #[error("frame has no message type tag")]
    MissingType,

    /// The tag is known but the payload does not match its shape
    #[error("invalid payload for '{message_type}': {detail}")]
    InvalidPayload {
        message_type: String,
        detail: String,
    },
}

/// Serialize an outbound envelope to wire text.
///
/// Total function: serialization of the fixed outbound vocabulary cannot
/// fail, the envelope variants contain only JSON-representable fields.
pub fn encode(envelope: &ClientEnvelope) -> String {
    serde_json::to_string(envelope).expect("client envelope serializes to JSON")
}

/// Parse wire text into a typed envelope.
pub fn decode(raw: &str) -> Result<ServerEnvelope, DecodeError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| DecodeError::Malformed(e.to_string()))?;
    decode_value(value)
}

/// Decode an already-parsed JSON value into a typed envelope.
pub fn decode_value(value: Value) -> Result<ServerEnvelope, DecodeError> {
    let message_type = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(DecodeError::MissingType)?
        .to_string();

    match message_type.as_str() {
        "auth_success" => Ok(ServerEnvelope::AuthSuccess),
        "new_message" => {
            let payload: NewMessagePayload = parse_payload(&message_type, value)?;
            Ok(ServerEnvelope::NewMessage {
                message: payload.message,
            })
        }
        "message_read" => {
            let payload: MessageReadPayload = parse_payload(&message_type, value)?;
            Ok(ServerEnvelope::MessageRead {
                message_id: payload.message_id,
            })
        }
        "payment_agreement" => {
            let payload: PaymentAgreementPayload = parse_payload(&message_type, value)?;
            Ok(ServerEnvelope::PaymentAgreement {
                agreement: payload.agreement,
            })
        }
        // The backend emits both spellings depending on the code path
        "notification" | "new_notification" => {
            let payload: NotificationPayload = parse_payload(&message_type, value)?;
            Ok(ServerEnvelope::Notification { data: payload.data })
        }
        "initial_notifications" => {
            let payload: InitialNotificationsPayload = parse_payload(&message_type, value)?;
            Ok(ServerEnvelope::InitialNotifications { data: payload.data })
        }
        "interest_accepted" => {
            let payload: InterestAcceptedPayload = parse_payload(&message_type, value)?;
            Ok(ServerEnvelope::InterestAccepted {
                request_id: payload.request_id,
            })
        }
        "chat_room_created" => {
            let payload: ChatRoomCreatedPayload = parse_payload(&message_type, value)?;
            Ok(ServerEnvelope::ChatRoomCreated {
                chat_room: payload.chat_room,
            })
        }
        _ => Ok(ServerEnvelope::Unknown { message_type }),
    }
}

fn parse_payload<T: DeserializeOwned>(
    message_type: &str,
    value: Value,
) -> Result<T, DecodeError> {
    serde_json::from_value(value).map_err(|e| DecodeError::InvalidPayload {
        message_type: message_type.to_string(),
        detail: e.to_string(),
    })
}

#[derive(Deserialize)]
struct NewMessagePayload {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct MessageReadPayload {
    #[serde(rename = "messageId")]
    message_id: i64,
}

#[derive(Deserialize)]
struct PaymentAgreementPayload {
    agreement: PaymentAgreement,
}

#[derive(Deserialize)]
struct NotificationPayload {
    data: Notification,
}

#[derive(Deserialize)]
struct InitialNotificationsPayload {
    data: Vec<Notification>,
}

#[derive(Deserialize)]
struct InterestAcceptedPayload {
    #[serde(rename = "requestId")]
    request_id: i64,
}

#[derive(Deserialize)]
struct ChatRoomCreatedPayload {
    #[serde(rename = "chatRoom")]
    chat_room: ChatRoomInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_auth_success() {
        // テスト項目: auth_success フレームが AuthSuccess にデコードされる
        // given (前提条件):
        let raw = r#"{"type":"auth_success"}"#;

        // when (操作):
        let result = decode(raw).unwrap();

        // then (期待する結果):
        assert_eq!(result, ServerEnvelope::AuthSuccess);
    }

    #[test]
    fn test_decode_new_message() {
        // テスト項目: new_message フレームがチャットメッセージ付きでデコードされる
        // given (前提条件):
        let raw = r#"{
            "type": "new_message",
            "message": {
                "id": 42,
                "content": "Hello!",
                "createdAt": "2024-05-01T12:00:00Z",
                "read": false,
                "senderId": 7
            }
        }"#;

        // when (操作):
        let result = decode(raw).unwrap();

        // then (期待する結果):
        match result {
            ServerEnvelope::NewMessage { message } => {
                assert_eq!(message.id, 42);
                assert_eq!(message.content, "Hello!");
                assert_eq!(message.sender_id, 7);
                assert!(!message.read);
            }
            other => panic!("unexpected envelope: {:?}", other),
        }
    }

    #[test]
    fn test_decode_message_read() {
        // テスト項目: message_read フレームから messageId が取り出される
        // given (前提条件):
        let raw = r#"{"type":"message_read","messageId":42}"#;

        // when (操作):
        let result = decode(raw).unwrap();

        // then (期待する結果):
        assert_eq!(result, ServerEnvelope::MessageRead { message_id: 42 });
    }

    #[test]
    fn test_decode_notification_accepts_both_tags() {
        // テスト項目: notification と new_notification の両方のタグが受理される
        // given (前提条件):
        let pushed = r#"{
            "type": "new_notification",
            "data": {
                "id": 1,
                "title": "New order",
                "message": "You received an order",
                "isRead": false,
                "createdAt": "2024-05-01T12:00:00Z"
            }
        }"#;
        let legacy = r#"{
            "type": "notification",
            "data": {
                "id": 1,
                "title": "New order",
                "message": "You received an order",
                "isRead": false,
                "createdAt": "2024-05-01T12:00:00Z"
            }
        }"#;

        // when (操作):
        let from_pushed = decode(pushed).unwrap();
        let from_legacy = decode(legacy).unwrap();

        // then (期待する結果):
        assert_eq!(from_pushed, from_legacy);
        match from_pushed {
            ServerEnvelope::Notification { data } => {
                assert_eq!(data.id, 1);
                assert_eq!(data.title, "New order");
                assert!(!data.is_read);
            }
            other => panic!("unexpected envelope: {:?}", other),
        }
    }

    #[test]
    fn test_decode_initial_notifications() {
        // テスト項目: initial_notifications フレームが通知のリストにデコードされる
        // given (前提条件):
        let raw = r#"{
            "type": "initial_notifications",
            "data": [
                {"id": 1, "title": "a", "message": "m1", "isRead": true, "createdAt": "2024-05-01T12:00:00Z"},
                {"id": 2, "title": "b", "message": "m2", "isRead": false, "createdAt": "2024-05-01T13:00:00Z"}
            ]
        }"#;

        // when (操作):
        let result = decode(raw).unwrap();

        // then (期待する結果):
        match result {
            ServerEnvelope::InitialNotifications { data } => {
                assert_eq!(data.len(), 2);
                assert_eq!(data[0].id, 1);
                assert!(data[0].is_read);
                assert_eq!(data[1].id, 2);
            }
            other => panic!("unexpected envelope: {:?}", other),
        }
    }

    #[test]
    fn test_decode_payment_agreement() {
        // テスト項目: payment_agreement フレームが合意内容付きでデコードされる
        // given (前提条件):
        let raw = r#"{
            "type": "payment_agreement",
            "agreement": {"id": 9, "status": "accepted", "amount": 120.5, "description": "Garden work"}
        }"#;

        // when (操作):
        let result = decode(raw).unwrap();

        // then (期待する結果):
        match result {
            ServerEnvelope::PaymentAgreement { agreement } => {
                assert_eq!(agreement.id, 9);
                assert_eq!(agreement.status, "accepted");
                assert_eq!(agreement.amount, 120.5);
            }
            other => panic!("unexpected envelope: {:?}", other),
        }
    }

    #[test]
    fn test_decode_unknown_type_is_not_an_error() {
        // テスト項目: 未知のタグはエラーにならず Unknown として返される
        // given (前提条件):
        let raw = r#"{"type":"server_maintenance","data":{"until":"soon"}}"#;

        // when (操作):
        let result = decode(raw).unwrap();

        // then (期待する結果):
        assert_eq!(
            result,
            ServerEnvelope::Unknown {
                message_type: "server_maintenance".to_string()
            }
        );
    }

    #[test]
    fn test_decode_rejects_invalid_json() {
        // テスト項目: JSON として壊れたフレームは Malformed エラーになる
        // given (前提条件):
        let raw = "not json at all {{{";

        // when (操作):
        let result = decode(raw);

        // then (期待する結果):
        assert!(matches!(result, Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn test_decode_rejects_missing_type_tag() {
        // テスト項目: type タグのない JSON は MissingType エラーになる
        // given (前提条件):
        let raw = r#"{"data":{"id":1}}"#;

        // when (操作):
        let result = decode(raw);

        // then (期待する結果):
        assert!(matches!(result, Err(DecodeError::MissingType)));
    }

    #[test]
    fn test_decode_rejects_wrong_payload_shape() {
        // テスト項目: 既知のタグでもペイロードの形が違う場合はエラーになる
        // given (前提条件):
        let raw = r#"{"type":"message_read","messageId":"not-a-number"}"#;

        // when (操作):
        let result = decode(raw);

        // then (期待する結果):
        match result {
            Err(DecodeError::InvalidPayload { message_type, .. }) => {
                assert_eq!(message_type, "message_read");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_decode_value_passes_through_structured_input() {
        // テスト項目: パース済みの JSON 値をそのままデコードできる
        // given (前提条件):
        let value = serde_json::json!({"type": "interest_accepted", "requestId": 31});

        // when (操作):
        let result = decode_value(value).unwrap();

        // then (期待する結果):
        assert_eq!(result, ServerEnvelope::InterestAccepted { request_id: 31 });
    }

    #[test]
    fn test_encode_auth_envelope() {
        // テスト項目: auth エンベロープが type タグ付きの JSON になる
        // given (前提条件):
        let envelope = ClientEnvelope::Auth {
            token: "secret-token".to_string(),
        };

        // when (操作):
        let encoded = encode(&envelope);

        // then (期待する結果):
        let value: Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(value["type"], "auth");
        assert_eq!(value["token"], "secret-token");
    }

    #[test]
    fn test_encode_mark_as_read_uses_camel_case_field() {
        // テスト項目: mark_as_read の通知 ID が camelCase で書き出される
        // given (前提条件):
        let envelope = ClientEnvelope::MarkAsRead {
            notification_id: 55,
        };

        // when (操作):
        let encoded = encode(&envelope);

        // then (期待する結果):
        let value: Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(value["type"], "mark_as_read");
        assert_eq!(value["notificationId"], 55);
    }

    #[test]
    fn test_encode_unit_variants() {
        // テスト項目: ペイロードのないエンベロープはタグのみの JSON になる
        // given (前提条件):
        let ping = ClientEnvelope::Ping;
        let mark_all = ClientEnvelope::MarkAllRead;

        // when (操作):
        let ping_value: Value = serde_json::from_str(&encode(&ping)).unwrap();
        let mark_all_value: Value = serde_json::from_str(&encode(&mark_all)).unwrap();

        // then (期待する結果):
        assert_eq!(ping_value, serde_json::json!({"type": "ping"}));
        assert_eq!(mark_all_value, serde_json::json!({"type": "mark_all_read"}));
    }
}
