//! Wire round-trip coverage for representative EDM values.

use odata_edm::{EdmType, PrimitiveCodec};
use serde_json::json;

#[test]
fn primitive_wire_round_trips() {
    let cases = [
        (EdmType::Guid, json!("01234567-89ab-cdef-0123-456789abcdef")),
        (EdmType::Duration, json!("P2Y1M1W12DT23H59M59.999999999999S")),
        (EdmType::Binary, json!("T0RhdGE=")),
        (EdmType::Date, json!("2024-02-29")),
        (EdmType::TimeOfDay, json!("23:59:59.999")),
        (EdmType::DateTimeOffset, json!("2024-01-01T12:00:00.000Z")),
        (EdmType::Boolean, json!(true)),
        (EdmType::Int32, json!(-42)),
        (EdmType::Double, json!("INF")),
        (EdmType::String, json!("O'Data")),
    ];
    for (ty, wire) in cases {
        let codec = PrimitiveCodec::new(ty);
        let value = codec
            .deserialize(&wire)
            .unwrap_or_else(|e| panic!("deserialize {wire}: {e}"));
        let back = codec
            .serialize(&value)
            .unwrap_or_else(|e| panic!("serialize {wire}: {e}"));
        assert_eq!(back, wire, "round-trip of {} value {wire}", ty.name());
    }
}

#[test]
fn collections_round_trip_element_wise() {
    let codec = PrimitiveCodec::new(EdmType::Guid);
    let wire = json!([
        "01234567-89ab-cdef-0123-456789abcdef",
        "89abcdef-0123-4567-89ab-cdef01234567"
    ]);
    let value = codec.deserialize(&wire).unwrap();
    assert_eq!(codec.serialize(&value).unwrap(), wire);
}
