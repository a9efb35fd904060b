//! Message-type decoding
//!
//! A TikTok `msg.content` column holds a JSON payload whose shape depends on
//! the numeric `msg.type` tag. Two independent tables are keyed on that tag:
//!
//! - [`subject_label`] maps it to a coarse category and never fails.
//! - [`decode_body`] pulls a readable body out of the payload and fails when
//!   the payload does not have the shape the tag promises.
//!
//! Both are pure functions; nothing here touches a database.

use serde_json::Value;

use crate::error::{ExtractError, Result};

/// Rule for turning one payload shape into a body string
#[derive(Debug, Clone, Copy)]
struct BodyRule {
    /// JSON pointer to the scalar the body is built from
    pointer: &'static str,
    /// Prepended to the scalar; empty for verbatim fields
    prefix: &'static str,
}

const BODY_RULES: &[(i64, BodyRule)] = &[
    (7, BodyRule { pointer: "/text", prefix: "" }),
    (8, BodyRule { pointer: "/itemId", prefix: "https://www.tiktok.com/@tiktok/video/" }),
    (5, BodyRule { pointer: "/url/url_list/0", prefix: "" }),
    (15, BodyRule { pointer: "/joker_stickers/0/static_url/url_list/0", prefix: "" }),
    (22, BodyRule { pointer: "/music_id", prefix: "https://www.tiktok.com/music/tiktok-" }),
    (25, BodyRule { pointer: "/desc", prefix: "https://www.tiktok.com/@" }),
    (19, BodyRule { pointer: "/push_detail", prefix: "" }),
];

const SUBJECT_LABELS: &[(i64, &str)] = &[
    (7, "text"),
    (8, "video"),
    (5, "gif"),
    (15, "gif"),
    (22, "audio"),
    (25, "profile"),
    (19, "hashtag"),
];

/// Subject used for type tags missing from the table
pub const UNKNOWN_SUBJECT: &str = "unknown";

/// Coarse category for a message type tag.
#[must_use]
pub fn subject_label(message_type: i64) -> &'static str {
    SUBJECT_LABELS
        .iter()
        .find(|(tag, _)| *tag == message_type)
        .map_or(UNKNOWN_SUBJECT, |(_, label)| *label)
}

/// Whether the decoder has a dedicated rule for this type tag.
#[must_use]
pub fn is_known_type(message_type: i64) -> bool {
    BODY_RULES.iter().any(|(tag, _)| *tag == message_type)
}

/// Human-readable body for a parsed payload.
///
/// Unknown type tags render the whole payload as compact JSON. Known tags
/// fail with [`ExtractError::Decode`] when the expected field is missing,
/// null, or not a scalar.
pub fn decode_body(message_type: i64, payload: &Value) -> Result<String> {
    let Some((_, rule)) = BODY_RULES.iter().find(|(tag, _)| *tag == message_type) else {
        return Ok(payload.to_string());
    };

    let value = payload.pointer(rule.pointer).ok_or_else(|| {
        ExtractError::Decode(format!(
            "type {message_type} payload has no value at {}",
            rule.pointer
        ))
    })?;

    let text = scalar_text(value).ok_or_else(|| {
        ExtractError::Decode(format!(
            "type {message_type} payload value at {} is not a scalar",
            rule.pointer
        ))
    })?;

    Ok(format!("{}{}", rule.prefix, text))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_is_verbatim() {
        assert_eq!(decode_body(7, &json!({"text": "hi"})).unwrap(), "hi");
    }

    #[test]
    fn test_url_templates() {
        assert_eq!(
            decode_body(8, &json!({"itemId": "123"})).unwrap(),
            "https://www.tiktok.com/@tiktok/video/123"
        );
        assert_eq!(
            decode_body(22, &json!({"music_id": "42"})).unwrap(),
            "https://www.tiktok.com/music/tiktok-42"
        );
        assert_eq!(
            decode_body(25, &json!({"desc": "someone"})).unwrap(),
            "https://www.tiktok.com/@someone"
        );
    }

    #[test]
    fn test_numeric_ids_render_without_quotes() {
        assert_eq!(
            decode_body(8, &json!({"itemId": 6_789_012_345_u64})).unwrap(),
            "https://www.tiktok.com/@tiktok/video/6789012345"
        );
    }

    #[test]
    fn test_gif_paths() {
        let legacy = json!({"url": {"url_list": ["https://a/1.gif", "https://a/2.gif"]}});
        assert_eq!(decode_body(5, &legacy).unwrap(), "https://a/1.gif");

        let sticker = json!({
            "joker_stickers": [
                {"static_url": {"url_list": ["https://s/1.png"]}},
                {"static_url": {"url_list": ["https://s/2.png"]}}
            ]
        });
        assert_eq!(decode_body(15, &sticker).unwrap(), "https://s/1.png");
    }

    #[test]
    fn test_hashtag_push_detail() {
        let payload = json!({"push_detail": "#dance", "other": 1});
        assert_eq!(decode_body(19, &payload).unwrap(), "#dance");
    }

    #[test]
    fn test_unknown_type_renders_payload() {
        let payload = json!({"a": 1});
        assert_eq!(decode_body(999, &payload).unwrap(), payload.to_string());
    }

    #[test]
    fn test_malformed_payloads_fail() {
        assert!(decode_body(7, &json!({"txt": "hi"})).is_err());
        assert!(decode_body(7, &json!({"text": null})).is_err());
        assert!(decode_body(5, &json!({"url": {"url_list": []}})).is_err());
        assert!(decode_body(15, &json!({"joker_stickers": {}})).is_err());
        assert!(decode_body(8, &json!("just a string")).is_err());
        assert!(decode_body(19, &json!({"push_detail": {"nested": true}})).is_err());
    }

    #[test]
    fn test_subject_labels() {
        assert_eq!(subject_label(5), "gif");
        assert_eq!(subject_label(15), "gif");
        assert_eq!(subject_label(7), "text");
        assert_eq!(subject_label(19), "hashtag");
        assert_eq!(subject_label(999), UNKNOWN_SUBJECT);
    }

    #[test]
    fn test_tables_cover_the_same_tags() {
        for (tag, _) in SUBJECT_LABELS {
            assert!(is_known_type(*tag), "no body rule for {tag}");
        }
        assert_eq!(SUBJECT_LABELS.len(), BODY_RULES.len());
    }
}
