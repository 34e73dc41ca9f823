use super::*;
use crate::logic::features::SensorRecord;

#[test]
fn test_decode_well_formed_line() {
    let record = decode(b"{\"Temperature\":25.0,\"Humidity\":60.0,\"Gas\":100}\r\n").unwrap();
    assert_eq!(record, SensorRecord::new(25.0, 60.0, 100));
}

#[test]
fn test_decode_is_keyed_not_positional() {
    let a = decode(br#"{"Temperature":31.5,"Humidity":44.0,"Gas":212}"#).unwrap();
    let b = decode(br#"{"Gas":212,"Temperature":31.5,"Humidity":44.0}"#).unwrap();
    let c = decode(br#"{"Humidity":44.0,"Gas":212,"Temperature":31.5}"#).unwrap();
    assert_eq!(a, b);
    assert_eq!(b, c);
}

#[test]
fn test_decode_ignores_extra_keys() {
    let record = decode(br#"{"Temperature":20,"Humidity":50,"Gas":90,"Battery":3.7}"#).unwrap();
    assert_eq!(record, SensorRecord::new(20.0, 50.0, 90));
}

#[test]
fn test_decode_accepts_numeric_strings() {
    let record = decode(br#"{"Temperature":"26.4","Humidity":" 55 ","Gas":"120"}"#).unwrap();
    assert_eq!(record, SensorRecord::new(26.4, 55.0, 120));
}

#[test]
fn test_decode_accepts_integral_float_gas() {
    let record = decode(br#"{"Temperature":20.0,"Humidity":50.0,"Gas":100.0}"#).unwrap();
    assert_eq!(record.gas, 100);
}

#[test]
fn test_non_json_line_is_malformed() {
    let err = decode(b"Temp: 25.0 Hum: 60").unwrap_err();
    assert_eq!(err.kind(), DecodeErrorKind::Malformed);
    assert_eq!(err.raw(), "Temp: 25.0 Hum: 60");
}

#[test]
fn test_non_object_json_is_malformed() {
    let err = decode(b"[25.0, 60.0, 100]").unwrap_err();
    assert_eq!(err.kind(), DecodeErrorKind::Malformed);
}

#[test]
fn test_invalid_utf8_is_malformed() {
    let err = decode(&[0xff, 0xfe, b'{', b'}']).unwrap_err();
    assert_eq!(err.kind(), DecodeErrorKind::Malformed);
}

#[test]
fn test_missing_gas_is_incomplete() {
    let err = decode(br#"{"Temperature":25.0,"Humidity":60.0}"#).unwrap_err();
    match err {
        DecodeError::IncompleteFrame { field, .. } => assert_eq!(field, "Gas"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_missing_key_reported_before_bad_value() {
    let err = decode(br#"{"Temperature":"abc","Humidity":60.0}"#).unwrap_err();
    assert_eq!(err.kind(), DecodeErrorKind::Incomplete);
}

#[test]
fn test_non_numeric_temperature_is_type_mismatch() {
    let err = decode(br#"{"Temperature":"abc","Humidity":60.0,"Gas":100}"#).unwrap_err();
    match err {
        DecodeError::TypeMismatch { field, value, .. } => {
            assert_eq!(field, "Temperature");
            assert_eq!(value, "\"abc\"");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_fractional_gas_is_type_mismatch() {
    let err = decode(br#"{"Temperature":25.0,"Humidity":60.0,"Gas":100.5}"#).unwrap_err();
    assert_eq!(err.kind(), DecodeErrorKind::TypeMismatch);
}

#[test]
fn test_non_finite_and_non_numeric_values_rejected() {
    for line in [
        br#"{"Temperature":"NaN","Humidity":60.0,"Gas":100}"#.as_slice(),
        br#"{"Temperature":"inf","Humidity":60.0,"Gas":100}"#.as_slice(),
        br#"{"Temperature":true,"Humidity":60.0,"Gas":100}"#.as_slice(),
        br#"{"Temperature":null,"Humidity":60.0,"Gas":100}"#.as_slice(),
        br#"{"Temperature":25.0,"Humidity":[60.0],"Gas":100}"#.as_slice(),
    ] {
        let err = decode(line).unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::TypeMismatch, "line: {}", String::from_utf8_lossy(line));
    }
}

#[test]
fn test_custom_schema_keys() {
    let decoder = FrameDecoder::new(FrameSchema::with_keys(["temp_c", "rh", "mq2"]));
    let record = decoder.decode(br#"{"temp_c":22.5,"rh":41.0,"mq2":140}"#).unwrap();
    assert_eq!(record, SensorRecord::new(22.5, 41.0, 140));

    let err = decoder.decode(br#"{"Temperature":22.5,"Humidity":41.0,"Gas":140}"#).unwrap_err();
    match err {
        DecodeError::IncompleteFrame { field, .. } => assert_eq!(field, "temp_c"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_default_schema_uses_layout_names() {
    let schema = FrameSchema::default();
    let keys: Vec<&str> = schema.fields().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["Temperature", "Humidity", "Gas"]);
    assert_eq!(schema.key(2), Some("Gas"));
}
