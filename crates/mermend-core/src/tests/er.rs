use crate::repair::er::{canonical_entity_name, canonicalize_entities, repair_er, strip_attribute_comments};
use crate::*;
use serde_json::json;
use std::borrow::Cow;

#[test]
fn comment_after_key_marker_is_stripped() {
    let text = "erDiagram\n    USER {\n        email string UNIQUE \"primary login\"\n    }\n";
    assert_eq!(
        strip_attribute_comments(text),
        "erDiagram\n    USER {\n        email string UNIQUE\n    }\n"
    );
}

#[test]
fn comment_after_key_list_is_stripped() {
    let text = "erDiagram\nfoo {\n  string title PK, FK \"comment\"\n  int id PK,FK \"x\"\n}\n";
    assert_eq!(
        strip_attribute_comments(text),
        "erDiagram\nfoo {\n  string title PK, FK\n  int id PK,FK\n}\n"
    );
}

#[test]
fn comment_without_key_marker_is_stripped() {
    let text = "erDiagram\nfoo {\n  varchar(255) name \"full name\"\n  string[] tags \"\"\n}\n";
    assert_eq!(
        strip_attribute_comments(text),
        "erDiagram\nfoo {\n  varchar(255) name\n  string[] tags\n}\n"
    );
}

#[test]
fn attribute_without_comment_is_untouched() {
    let text = "erDiagram\nfoo {\n  string id PK\n  string email\n}\n";
    assert!(matches!(strip_attribute_comments(text), Cow::Borrowed(_)));
}

#[test]
fn crlf_attribute_lines_keep_their_terminator() {
    let text = "erDiagram\r\nfoo {\r\n  string id PK \"key\"\r\n}\r\n";
    assert_eq!(
        strip_attribute_comments(text),
        "erDiagram\r\nfoo {\r\n  string id PK\r\n}\r\n"
    );
}

#[test]
fn canonical_entity_names() {
    assert_eq!(canonical_entity_name("VOICE_MODEL"), "VoiceModel");
    assert_eq!(canonical_entity_name("ORDER_V2_ITEM"), "OrderV2Item");
    assert_eq!(canonical_entity_name("AUTH_2FA_CODE"), "Auth2faCode");
    assert_eq!(canonical_entity_name("A_B"), "AB");
}

#[test]
fn non_upper_snake_names_are_borrowed() {
    for name in ["USER", "VoiceModel", "Voice_Model", "voice_model", "_FOO", "FOO_", "FOO__BAR", "1_A"] {
        assert!(
            matches!(canonical_entity_name(name), Cow::Borrowed(n) if n == name),
            "{name} should be left alone"
        );
    }
}

#[test]
fn header_and_relationship_use_the_same_name() {
    let text = r#"erDiagram
    USER ||--o{ VOICE_MODEL : owns
    VOICE_MODEL {
        string id PK
    }
    CUSTOMER_ACCOUNT["Customer Account"] {
        string id
    }
    ORDER_ITEM
    CUSTOMER_ACCOUNT one or more to zero or many ORDER_ITEM : places
"#;
    let expected = r#"erDiagram
    USER ||--o{ VoiceModel : owns
    VoiceModel {
        string id PK
    }
    CustomerAccount["Customer Account"] {
        string id
    }
    OrderItem
    CustomerAccount one or more to zero or many OrderItem : places
"#;
    assert_eq!(canonicalize_entities(text), expected);
}

#[test]
fn relationship_without_spaces_matches_the_header() {
    let text = "erDiagram\n    VOICE_MODEL {\n        string id PK\n    }\n    USER_ACCOUNT||--o{VOICE_MODEL : owns\n    LINE_ITEM }|..|{ ORDER_V2 : in\n";
    assert_eq!(
        canonicalize_entities(text),
        "erDiagram\n    VoiceModel {\n        string id PK\n    }\n    UserAccount||--o{VoiceModel : owns\n    LineItem }|..|{ OrderV2 : in\n"
    );
}

#[test]
fn bracketed_comment_is_still_stripped() {
    let text = "erDiagram\n    LINK {\n        string url \"see docs[v1/api]\"\n    }\n";
    assert_eq!(
        normalize(text),
        "erDiagram\n    LINK {\n        string url\n    }\n"
    );
}

#[test]
fn dotted_and_mixed_relationships_are_canonicalized() {
    let text = "erDiagram\n  LINE_ITEM }|..|{ DELIVERY_ADDRESS : uses\n  Person |o--o| PASS_PORT : holds\n";
    assert_eq!(
        canonicalize_entities(text),
        "erDiagram\n  LineItem }|..|{ DeliveryAddress : uses\n  Person |o--o| PassPort : holds\n"
    );
}

#[test]
fn attribute_lines_are_not_taken_for_headers() {
    let text = "erDiagram\nfoo {\n  VARCHAR_255 name\n}\n";
    assert!(matches!(canonicalize_entities(text), Cow::Borrowed(_)));
}

#[test]
fn repair_er_respects_sub_switches() {
    let text = "erDiagram\nVOICE_MODEL {\n  string id PK \"key\"\n}\n";

    let mut keep_comments = NormalizeConfig::default();
    keep_comments.set_value("er.stripComments", json!(false));
    assert_eq!(
        repair_er(text, &keep_comments),
        "erDiagram\nVoiceModel {\n  string id PK \"key\"\n}\n"
    );

    let mut keep_names = NormalizeConfig::default();
    keep_names.set_value("er.canonicalizeEntities", json!(false));
    assert_eq!(
        repair_er(text, &keep_names),
        "erDiagram\nVOICE_MODEL {\n  string id PK\n}\n"
    );
}

#[test]
fn repair_er_is_idempotent() {
    let text = "erDiagram\nVOICE_MODEL {\n  string id PK \"key\"\n  string name \"n\"\n}\nUSER ||--o{ VOICE_MODEL : owns\n";
    let cfg = NormalizeConfig::default();
    let once = repair_er(text, &cfg).into_owned();
    assert!(matches!(repair_er(&once, &cfg), Cow::Borrowed(_)));
}
