use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use bytes::Bytes;

use super::*;
use crate::bencode_record;

#[derive(Debug, Default, PartialEq)]
struct Sample {
    sf: String,
    ffgd: i64,
    hhd: String,
    xxyh: u32,
}

bencode_record! {
    Sample {
        sf: "sf",
        ffgd: "ffgd",
        hhd: "hhd,omitempty",
        xxyh: "-",
    }
}

#[derive(Debug, Default, PartialEq)]
struct Outer {
    s1: Option<Box<Sample>>,
    ss3: bool,
}

bencode_record! {
    Outer {
        s1: "s1",
        ss3: "",
    }
}

#[derive(Debug, Default, PartialEq)]
struct Wrapper {
    ggg: String,
    iface: Option<Value>,
}

bencode_record! {
    Wrapper {
        ggg: "",
        iface: "iface",
    }
}

#[derive(Debug, Default, PartialEq)]
struct Colliding {
    a: i64,
    b: i64,
}

bencode_record! {
    Colliding {
        a: "x",
        b: "x",
    }
}

fn roundtrip<T>(value: T, bytes: &[u8])
where
    T: Encodable + Decodable + PartialEq + std::fmt::Debug,
{
    assert_eq!(marshal(&value).unwrap(), bytes);
    let decoded: T = unmarshal(bytes).unwrap();
    assert_eq!(decoded, value);
}

#[test]
fn test_roundtrip_integers() {
    roundtrip(23i64, b"i23e");
    roundtrip(-422i64, b"i-422e");
    roundtrip(0i64, b"i0e");
    roundtrip(99u32, b"i99e");
    roundtrip(i64::MAX, b"i9223372036854775807e");
}

#[test]
fn test_roundtrip_booleans() {
    roundtrip(true, b"i1e");
    roundtrip(false, b"i0e");
}

#[test]
fn test_roundtrip_strings() {
    roundtrip(String::from("abc"), b"3:abc");
    roundtrip(String::new(), b"0:");
    roundtrip(String::from("3242434te"), b"9:3242434te");
}

#[test]
fn test_roundtrip_raw_bytes() {
    roundtrip(Bytes::from_static(&[0xff, 0x00, 0x7f]), b"3:\xff\x00\x7f");
}

#[test]
fn test_roundtrip_lists() {
    roundtrip(vec![1i64, 2, 3, 4, 5], b"li1ei2ei3ei4ei5ee");
    roundtrip(
        vec![String::from("aa"), String::from("b"), String::from("ccc")],
        b"l2:aa1:b3:ccce",
    );
    roundtrip(Vec::<i64>::new(), b"le");
}

#[test]
fn test_roundtrip_mixed_value_list() {
    roundtrip(
        Value::List(vec![
            Value::string("aa"),
            Value::string("b"),
            Value::Integer(33),
            Value::Integer(-23),
            Value::string("XX"),
        ]),
        b"l2:aa1:bi33ei-23e2:XXe",
    );
}

#[test]
fn test_roundtrip_maps() {
    let mut map: HashMap<String, i64> = HashMap::new();
    map.insert("aa".into(), 43);
    map.insert("bbbfe".into(), -544);
    map.insert("".into(), 0);
    roundtrip(map, b"d0:i0e2:aai43e5:bbbfei-544ee");

    let mut sorted: BTreeMap<String, i64> = BTreeMap::new();
    sorted.insert("b".into(), 2);
    sorted.insert("a".into(), 1);
    roundtrip(sorted, b"d1:ai1e1:bi2ee");
}

#[test]
fn test_encode_array() {
    assert_eq!(marshal(&[1i64, 3, 5]).unwrap(), b"li1ei3ei5ee");
}

#[test]
fn test_encode_unsigned_beyond_i64() {
    assert_eq!(marshal(&u64::MAX).unwrap(), b"i18446744073709551615e");
}

#[test]
fn test_encode_none_fails() {
    let err = marshal(&Option::<i64>::None).unwrap_err();
    assert!(matches!(err, BencodeError::UnsupportedKind("none")));
}

#[test]
fn test_record_encode() {
    let sample = Sample {
        sf: "xxx".into(),
        ffgd: 2,
        hhd: String::new(),
        xxyh: 556,
    };
    // hhd is empty and omitempty, xxyh is excluded.
    assert_eq!(marshal(&sample).unwrap(), b"d4:ffgdi2e2:sf3:xxxe");

    let sample = Sample {
        sf: "xxx".into(),
        ffgd: 2,
        hhd: "66".into(),
        xxyh: 556,
    };
    assert_eq!(marshal(&sample).unwrap(), b"d4:ffgdi2e3:hhd2:662:sf3:xxxe");
}

#[test]
fn test_record_decode() {
    let sample: Sample = unmarshal(b"d4:ffgdi2e2:sf3:xxxe").unwrap();
    assert_eq!(
        sample,
        Sample {
            sf: "xxx".into(),
            ffgd: 2,
            hhd: String::new(),
            xxyh: 0,
        }
    );
}

#[test]
fn test_record_decode_ignores_excluded_field() {
    // The wire carries the excluded field's name; its value is parsed and
    // discarded, and the slot keeps its default.
    let sample: Sample = unmarshal(b"d4:XXYhi556e4:ffgdi2e3:hhd2:662:sf3:xxxe").unwrap();
    assert_eq!(
        sample,
        Sample {
            sf: "xxx".into(),
            ffgd: 2,
            hhd: "66".into(),
            xxyh: 0,
        }
    );
}

#[test]
fn test_record_decode_skips_unknown_keys() {
    let sample: Sample = unmarshal(b"d7:unknownd1:xli1ei2eee2:sf3:abce").unwrap();
    assert_eq!(sample.sf, "abc");
    assert_eq!(sample.ffgd, 0);
}

#[test]
fn test_record_nested_through_option_box() {
    let outer = Outer {
        s1: Some(Box::new(Sample {
            sf: "gjc".into(),
            ffgd: 87,
            hhd: String::new(),
            xxyh: 0,
        })),
        ss3: true,
    };
    roundtrip(outer, b"d2:s1d4:ffgdi87e2:sf3:gjce3:ss3i1ee");
}

#[test]
fn test_record_dynamic_field() {
    let wrapper = Wrapper {
        ggg: "gggee".into(),
        iface: Some(Value::List(vec![Value::Integer(4), Value::Integer(6)])),
    };
    roundtrip(wrapper, b"d3:ggg5:gggee5:ifaceli4ei6eee");

    let mut dict = BTreeMap::new();
    dict.insert(Bytes::from_static(b"gds"), Value::Integer(8));
    dict.insert(Bytes::from_static(b"353"), Value::Integer(-45));
    let wrapper = Wrapper {
        ggg: "gggee".into(),
        iface: Some(Value::Dict(dict)),
    };
    roundtrip(wrapper, b"d3:ggg5:gggee5:ifaced3:353i-45e3:gdsi8eee");
}

#[test]
fn test_record_all_zero_omitempty() {
    #[derive(Debug, Default, PartialEq)]
    struct Sparse {
        v: Option<i64>,
        n: i64,
    }

    bencode_record! {
        Sparse {
            v: "v,omitempty",
            n: "n,omitempty",
        }
    }

    assert_eq!(marshal(&Sparse::default()).unwrap(), b"de");
    assert_eq!(
        marshal(&Sparse { v: Some(0), n: 7 }).unwrap(),
        b"d1:ni7e1:vi0ee"
    );
}

#[test]
fn test_duplicate_field_name_rejected() {
    let err = marshal(&Colliding::default()).unwrap_err();
    assert!(matches!(err, BencodeError::DuplicateFieldName("x")));
}

#[test]
fn test_decode_integer_accepts_leading_zeros() {
    // Any digit run is read; leading zeros carry no meaning.
    assert_eq!(unmarshal::<i64>(b"i03e").unwrap(), 3);
    assert_eq!(unmarshal::<i64>(b"ie").unwrap(), 0);
}

#[test]
fn test_decode_minus_zero_rejected() {
    assert!(matches!(
        unmarshal::<i64>(b"i-0e"),
        Err(BencodeError::MinusZero)
    ));
    assert!(matches!(
        unmarshal::<i64>(b"i-e"),
        Err(BencodeError::MinusZero)
    ));
    assert_eq!(unmarshal::<i64>(b"i0e").unwrap(), 0);
}

#[test]
fn test_decode_integer_overflow() {
    // One past i64::MAX.
    assert!(matches!(
        unmarshal::<i64>(b"i9223372036854775808e"),
        Err(BencodeError::IntegerOverflow)
    ));
    assert!(matches!(
        unmarshal::<Value>(b"i18446744073709551615e"),
        Err(BencodeError::IntegerOverflow)
    ));
    // The magnitude of i64::MIN is not readable either.
    assert!(matches!(
        unmarshal::<i64>(b"i-9223372036854775808e"),
        Err(BencodeError::IntegerOverflow)
    ));
}

#[test]
fn test_decode_narrowing_overflow() {
    assert!(matches!(
        unmarshal::<u8>(b"i256e"),
        Err(BencodeError::IntegerOverflow)
    ));
    assert!(matches!(
        unmarshal::<u64>(b"i-5e"),
        Err(BencodeError::IntegerOverflow)
    ));
}

#[test]
fn test_decode_bool_nonzero() {
    assert!(unmarshal::<bool>(b"i5e").unwrap());
    assert!(!unmarshal::<bool>(b"i0e").unwrap());
}

#[test]
fn test_decode_type_mismatch() {
    assert!(matches!(
        unmarshal::<i64>(b"3:abc"),
        Err(BencodeError::TypeMismatch {
            expected: "integer",
            found: "byte string",
        })
    ));
    assert!(matches!(
        unmarshal::<String>(b"li1ee"),
        Err(BencodeError::TypeMismatch { .. })
    ));
    assert!(matches!(
        unmarshal::<Vec<i64>>(b"i3e"),
        Err(BencodeError::TypeMismatch { .. })
    ));
    assert!(matches!(
        unmarshal::<Sample>(b"i3e"),
        Err(BencodeError::TypeMismatch { .. })
    ));
}

#[test]
fn test_decode_syntax_errors() {
    assert!(matches!(
        unmarshal::<Value>(b""),
        Err(BencodeError::UnexpectedEof)
    ));
    assert!(matches!(
        unmarshal::<Value>(b"x"),
        Err(BencodeError::UnexpectedChar('x'))
    ));
    assert!(matches!(
        unmarshal::<Value>(b"-1:x"),
        Err(BencodeError::UnexpectedChar('-'))
    ));
    assert!(matches!(
        unmarshal::<Value>(b"i42x"),
        Err(BencodeError::UnexpectedByte {
            expected: 'e',
            found: 'x',
        })
    ));
}

#[test]
fn test_decode_truncated_input() {
    assert!(matches!(
        unmarshal::<Value>(b"i42"),
        Err(BencodeError::UnexpectedEof)
    ));
    assert!(matches!(
        unmarshal::<Value>(b"4:ab"),
        Err(BencodeError::UnexpectedEof)
    ));
    assert!(matches!(
        unmarshal::<Value>(b"l"),
        Err(BencodeError::UnexpectedEof)
    ));
    assert!(matches!(
        unmarshal::<Value>(b"d2:ab"),
        Err(BencodeError::UnexpectedEof)
    ));
}

#[test]
fn test_decode_negative_string_length() {
    assert!(matches!(
        unmarshal::<Value>(b"d-1:xe"),
        Err(BencodeError::NegativeLength)
    ));
}

#[test]
fn test_decode_key_not_string() {
    assert!(matches!(
        unmarshal::<Value>(b"di1ei2ee"),
        Err(BencodeError::KeyNotString("integer"))
    ));
    assert!(matches!(
        unmarshal::<HashMap<String, i64>>(b"dlei2ee"),
        Err(BencodeError::KeyNotString("list"))
    ));
}

#[test]
fn test_decode_invalid_utf8_string_target() {
    assert!(matches!(
        unmarshal::<String>(b"2:\xff\xfe"),
        Err(BencodeError::InvalidUtf8)
    ));
    // Bytes targets take the payload verbatim.
    assert_eq!(
        unmarshal::<Bytes>(b"2:\xff\xfe").unwrap(),
        Bytes::from_static(&[0xff, 0xfe])
    );
}

#[test]
fn test_decode_trailing_bytes_ignored() {
    assert_eq!(unmarshal::<i64>(b"i42etail").unwrap(), 42);
}

#[test]
fn test_decode_duplicate_keys_last_wins() {
    let value: Value = unmarshal(b"d1:ai1e1:ai2ee").unwrap();
    assert_eq!(value.get(b"a"), Some(&Value::Integer(2)));
}

#[test]
fn test_decode_empty_containers() {
    assert_eq!(unmarshal::<Value>(b"le").unwrap(), Value::List(vec![]));
    assert_eq!(
        unmarshal::<Value>(b"de").unwrap(),
        Value::Dict(BTreeMap::new())
    );
}

#[test]
fn test_canonical_reencode_sorts_keys() {
    // Non-canonical wire order decodes fine and re-encodes sorted.
    let value: Value = unmarshal(b"d1:bi2e1:ai1ee").unwrap();
    assert_eq!(marshal(&value).unwrap(), b"d1:ai1e1:bi2ee");
}

#[test]
fn test_canonical_input_is_idempotent() {
    let canonical: &[u8] =
        b"d8:announce15:http://test.com4:infod4:name4:test12:piece lengthi16384eee";
    let value: Value = unmarshal(canonical).unwrap();
    assert_eq!(marshal(&value).unwrap(), canonical);
}

#[test]
fn test_profile_resolution() {
    let profile = TypeProfile::resolve(<Sample as Record>::FIELDS).unwrap();
    let names: Vec<_> = profile.fields().iter().map(|f| f.name).collect();
    assert_eq!(names, ["ffgd", "hhd", "sf"]);
    assert!(profile.field("hhd").unwrap().omit_empty);
    assert!(!profile.field("sf").unwrap().omit_empty);
    // The excluded field never makes it into the profile.
    assert!(profile.field("xxyh").is_none());
    assert!(profile.field("XXYh").is_none());
}

#[test]
fn test_profile_cache_returns_same_instance() {
    let cache = ProfileCache::new();
    let first = cache.profile_for::<Sample>().unwrap();
    let second = cache.profile_for::<Sample>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_profile_cache_concurrent_warmup() {
    let cache = ProfileCache::new();
    std::thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                let profile = cache.profile_for::<Sample>().unwrap();
                assert_eq!(profile.fields().len(), 3);
            });
        }
    });
}

#[test]
fn test_concurrent_marshal() {
    let sample = Sample {
        sf: "xxx".into(),
        ffgd: 2,
        hhd: String::new(),
        xxyh: 0,
    };
    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                assert_eq!(marshal(&sample).unwrap(), b"d4:ffgdi2e2:sf3:xxxe");
            });
        }
    });
}

#[test]
fn test_manual_encoder_decoder() {
    let mut enc = Encoder::new();
    enc.begin_list();
    enc.integer(1).unwrap();
    enc.byte_string(b"two").unwrap();
    enc.end();
    let bytes = enc.into_bytes();
    assert_eq!(bytes, b"li1e3:twoe");

    let mut dec = Decoder::new(&bytes);
    let value = Value::decode(&mut dec).unwrap();
    assert_eq!(dec.remaining(), 0);
    assert_eq!(
        value,
        Value::List(vec![Value::Integer(1), Value::string("two")])
    );
}
