//! Property tests for the compact token codec.
//!
//! Covers the two laws the gates rely on: every validly shaped token survives
//! an encode/decode round trip unchanged, and nothing shaped like fewer than
//! two segments is ever accepted.

use idp_core::token::Claims;
use idp_core::{decode, encode, MalformedToken};
use proptest::prelude::*;
use serde_json::Value;

fn json_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[a-zA-Z0-9 :_.-]{0,24}".prop_map(Value::String),
    ]
}

fn json_value() -> impl Strategy<Value = Value> {
    json_leaf().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z_]{1,8}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

fn claims() -> impl Strategy<Value = Claims> {
    prop::collection::btree_map("[a-z_]{1,12}", json_value(), 0..6)
        .prop_map(|m| m.into_iter().collect())
}

proptest! {
    #[test]
    fn encode_then_decode_returns_same_maps(header in claims(), payload in claims()) {
        let compact = encode(&header, &payload);
        let decoded = decode(&compact).unwrap();
        prop_assert_eq!(decoded.header(), &header);
        prop_assert_eq!(decoded.payload(), &payload);
    }

    #[test]
    fn decode_is_idempotent(header in claims(), payload in claims()) {
        let compact = encode(&header, &payload);
        prop_assert_eq!(decode(&compact).unwrap(), decode(&compact).unwrap());
    }

    #[test]
    fn scheme_prefix_does_not_change_result(header in claims(), payload in claims()) {
        let compact = encode(&header, &payload);
        prop_assert_eq!(
            decode(&format!("Bearer {compact}")).unwrap(),
            decode(&compact).unwrap()
        );
    }

    #[test]
    fn single_segment_input_is_always_rejected(raw in "[A-Za-z0-9_-]{1,64}") {
        let err = decode(&raw).unwrap_err();
        prop_assert!(matches!(err, MalformedToken::MissingSegments { found: 1 }), "unexpected error: {:?}", err);
    }

    #[test]
    fn segments_outside_the_alphabet_are_rejected(raw in "[!*$%]{1,16}") {
        let compact = format!("{raw}.{raw}");
        prop_assert!(decode(&compact).is_err());
    }
}
