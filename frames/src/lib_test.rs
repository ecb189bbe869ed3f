use super::*;

const NOW: i64 = 1_700_000_000_000;

#[test]
fn decode_history_frame_keeps_order_and_skips_invalid_items() {
    let text = r#"{
        "type": "history",
        "messages": [
            {"id": "m1", "userId": "u1", "userName": "Ahmed B.", "message": "salam", "timestamp": 1000},
            {"userId": "u2", "message": "no id"},
            {"id": "m2", "userId": "u2", "userName": "Fatima Z.", "message": "150 DA", "timestamp": "2024-01-01T00:00:00Z"}
        ]
    }"#;
    let frame = decode_inbound(text, NOW).expect("decode").expect("frame");
    let InboundFrame::History(messages) = frame else {
        panic!("expected history frame");
    };
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].id, "m1");
    assert_eq!(messages[0].timestamp, 1000);
    assert_eq!(messages[1].id, "m2");
    assert_eq!(messages[1].timestamp, 1_704_067_200_000);
}

#[test]
fn decode_history_without_messages_is_empty_history() {
    let frame = decode_inbound(r#"{"type":"history"}"#, NOW).expect("decode");
    assert_eq!(frame, Some(InboundFrame::History(Vec::new())));
}

#[test]
fn decode_message_frame_normalizes_missing_fields() {
    let text = r#"{"type":"message","message":{"id":42,"text":"hello"}}"#;
    let frame = decode_inbound(text, NOW).expect("decode").expect("frame");
    let InboundFrame::Message(msg) = frame else {
        panic!("expected message frame");
    };
    assert_eq!(msg.id, "42");
    assert_eq!(msg.message, "hello");
    assert_eq!(msg.user_id, "unknown");
    assert_eq!(msg.user_name, "Anonyme");
    assert_eq!(msg.timestamp, NOW);
}

#[test]
fn decode_message_frame_without_payload_is_ignored() {
    assert_eq!(decode_inbound(r#"{"type":"message"}"#, NOW).expect("decode"), None);
}

#[test]
fn decode_message_frame_without_id_is_an_error() {
    let err = decode_inbound(r#"{"type":"message","message":{"message":"x"}}"#, NOW).expect_err("missing id");
    assert!(matches!(err, WireError::MissingField("id")));
}

#[test]
fn decode_error_frame_surfaces_text() {
    let frame = decode_inbound(r#"{"type":"error","message":"rate limited"}"#, NOW).expect("decode");
    assert_eq!(frame, Some(InboundFrame::Error("rate limited".to_owned())));
}

#[test]
fn decode_unknown_type_is_ignored() {
    assert_eq!(decode_inbound(r#"{"type":"presence","count":3}"#, NOW).expect("decode"), None);
}

#[test]
fn decode_rejects_non_json() {
    assert!(matches!(decode_inbound("not json", NOW), Err(WireError::Decode(_))));
}

#[test]
fn encode_outbound_message_and_delete_shapes() {
    let msg = encode_outbound(&OutboundFrame::Message { text: "bonjour".to_owned() }).expect("encode");
    let value: serde_json::Value = serde_json::from_str(&msg).expect("json");
    assert_eq!(value, serde_json::json!({"type": "message", "text": "bonjour"}));

    let del = encode_outbound(&OutboundFrame::Delete { message_id: "m7".to_owned() }).expect("encode");
    let value: serde_json::Value = serde_json::from_str(&del).expect("json");
    assert_eq!(value, serde_json::json!({"type": "delete", "messageId": "m7"}));
}

#[test]
fn format_rfc3339_whole_seconds() {
    assert_eq!(format_rfc3339(0), "1970-01-01T00:00:00Z");
    assert_eq!(parse_rfc3339("1970-01-01T00:00:01Z").expect("parse"), 1000);
}

#[test]
fn parse_rfc3339_rejects_garbage() {
    assert!(matches!(parse_rfc3339("yesterday"), Err(WireError::InvalidTimestamp(_))));
}

#[test]
fn parse_auth_response_reads_user_and_token() {
    let body = serde_json::json!({
        "token": "jwt-abc",
        "user": {"id": "user-1", "email": "karim@example.dz", "isAnonymous": false, "createdAt": 5}
    });
    let session = parse_auth_response(&body, NOW).expect("auth");
    assert_eq!(session.token.as_deref(), Some("jwt-abc"));
    assert_eq!(session.user.id, "user-1");
    assert_eq!(session.user.name, "karim");
    assert_eq!(session.user.created_at, 5);
}

#[test]
fn parse_auth_response_accepts_bare_user() {
    let body = serde_json::json!({"id": 9, "name": "Amina"});
    let session = parse_auth_response(&body, NOW).expect("auth");
    assert!(session.token.is_none());
    assert_eq!(session.user.id, "9");
    assert_eq!(session.user.name, "Amina");
    assert_eq!(session.user.created_at, NOW);
}
