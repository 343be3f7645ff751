use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        GiftbeatError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        GiftbeatError::decode("x")
            .to_string()
            .contains("decode error:")
    );
    assert!(
        GiftbeatError::encode("x")
            .to_string()
            .contains("encode error:")
    );
    assert!(
        GiftbeatError::evaluation("x")
            .to_string()
            .contains("evaluation error:")
    );
    assert!(
        GiftbeatError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = GiftbeatError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn json_errors_map_to_serde() {
    let parse = serde_json::from_str::<u32>("nope").unwrap_err();
    let detail = parse.to_string();
    let err: GiftbeatError = parse.into();
    assert!(matches!(&err, GiftbeatError::Serde(msg) if *msg == detail));
    assert_eq!(err.to_string(), GiftbeatError::serde(detail).to_string());
    assert!(!err.is_decode());
    assert!(GiftbeatError::decode("x").is_decode());
}
