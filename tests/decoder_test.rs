//! Payload decoding tests

use proptest::prelude::*;
use serde_json::{json, Value};

use tiktok_im_extractor::decoder::{decode_body, is_known_type, subject_label, UNKNOWN_SUBJECT};
use tiktok_im_extractor::mappers::MessageMapper;
use tiktok_im_extractor::ExtractError;

#[test]
fn test_every_known_type_has_a_subject() {
    for tag in [5, 7, 8, 15, 19, 22, 25] {
        assert!(is_known_type(tag));
        assert_ne!(subject_label(tag), UNKNOWN_SUBJECT, "tag {tag}");
    }
    assert_eq!(subject_label(5), "gif");
    assert_eq!(subject_label(15), "gif");
    assert_eq!(subject_label(19), "hashtag");
}

#[test]
fn test_sticker_and_gif_bodies() {
    let gif = json!({"url": {"url_list": ["https://a/1.gif", "https://a/2.gif"]}});
    assert_eq!(decode_body(5, &gif).unwrap(), "https://a/1.gif");

    let sticker = json!({
        "joker_stickers": [{"static_url": {"url_list": ["https://s/1.png"]}}]
    });
    assert_eq!(decode_body(15, &sticker).unwrap(), "https://s/1.png");
}

#[test]
fn test_numeric_item_id_is_rendered() {
    let body = decode_body(8, &json!({"itemId": 7012345678901234567_i64})).unwrap();
    assert_eq!(body, "https://www.tiktok.com/@tiktok/video/7012345678901234567");
}

#[test]
fn test_missing_field_is_a_decode_error() {
    let err = decode_body(7, &json!({"aweType": 700})).unwrap_err();
    assert!(matches!(err, ExtractError::Decode(_)));

    let err = decode_body(5, &json!({"url": {"url_list": []}})).unwrap_err();
    assert!(matches!(err, ExtractError::Decode(_)));

    let err = decode_body(7, &json!({"text": null})).unwrap_err();
    assert!(matches!(err, ExtractError::Decode(_)));
}

#[test]
fn test_unparseable_content_is_an_error() {
    let err = MessageMapper::decode_content(7, "{not json").unwrap_err();
    assert!(matches!(err, ExtractError::Json(_)));
}

#[test]
fn test_unknown_type_renders_payload() {
    let payload = json!({"a": 1});
    assert_eq!(decode_body(999, &payload).unwrap(), r#"{"a":1}"#);
    assert_eq!(subject_label(999), UNKNOWN_SUBJECT);
}

proptest! {
    #[test]
    fn unknown_types_render_payload_verbatim(
        tag in any::<i64>().prop_filter("known tag", |t| !is_known_type(*t)),
        key in "[a-z]{1,8}",
        value in any::<i32>(),
    ) {
        let payload: Value = json!({ key: value });
        prop_assert_eq!(decode_body(tag, &payload).unwrap(), payload.to_string());
        prop_assert_eq!(subject_label(tag), UNKNOWN_SUBJECT);
    }

    #[test]
    fn text_bodies_are_verbatim(text in ".*") {
        let payload = json!({ "text": text.clone() });
        prop_assert_eq!(decode_body(7, &payload).unwrap(), text);
    }
}
