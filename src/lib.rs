//! Bencode encoding and decoding ([BEP-3]) with type-directed marshalling.
//!
//! Bencode is the serialization format used throughout BitTorrent for
//! storing and transmitting structured data, including `.torrent` files and
//! tracker responses.
//!
//! # Data Types
//!
//! Bencode supports four data types:
//!
//! | Type | Format | Example |
//! |------|--------|---------|
//! | Integer | `i<number>e` | `i42e` → 42 |
//! | Byte String | `<length>:<data>` | `4:spam` → "spam" |
//! | List | `l<items>e` | `l4:spami42ee` → ["spam", 42] |
//! | Dictionary | `d<key><value>...e` | `d3:foo3:bare` → {"foo": "bar"} |
//!
//! Encoded output is canonical: dictionary keys are emitted in ascending
//! byte order with exact length prefixes and no extra bytes, so equal
//! logical values always produce identical bytes. Decoding accepts any
//! conforming input regardless of key order.
//!
//! # Marshalling
//!
//! [`marshal`] encodes anything implementing [`Encodable`]: integers,
//! booleans, strings, [`Bytes`](bytes::Bytes), sequences, string-keyed
//! maps, records, and the dynamic [`Value`].
//!
//! ```
//! use std::collections::HashMap;
//!
//! assert_eq!(rbenc::marshal(&23i64).unwrap(), b"i23e");
//! assert_eq!(rbenc::marshal("abc").unwrap(), b"3:abc");
//! assert_eq!(rbenc::marshal(&vec![1i64, 2, 3]).unwrap(), b"li1ei2ei3ee");
//!
//! let mut scores: HashMap<String, i64> = HashMap::new();
//! scores.insert("aa".into(), 43);
//! scores.insert("".into(), 0);
//! // Keys come out sorted, whatever order the map holds them in.
//! assert_eq!(rbenc::marshal(&scores).unwrap(), b"d0:i0e2:aai43ee");
//! ```
//!
//! # Unmarshalling
//!
//! [`unmarshal`] decodes into any [`Decodable`] target. Use [`Value`] when
//! the shape of the input is not known up front.
//!
//! ```
//! use rbenc::Value;
//!
//! let n: i64 = rbenc::unmarshal(b"i42e").unwrap();
//! assert_eq!(n, 42);
//!
//! let value: Value = rbenc::unmarshal(b"d3:foo3:bare").unwrap();
//! assert_eq!(value.get(b"foo").and_then(|v| v.as_str()), Some("bar"));
//! ```
//!
//! # Records
//!
//! Struct types map to dictionaries through the [`bencode_record!`] macro.
//! Each field carries a tag: a rename, `omitempty` to skip zero values on
//! encode, or `-` to exclude the field entirely.
//!
//! ```
//! use rbenc::bencode_record;
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Announce {
//!     info_hash: String,
//!     port: i64,
//!     event: String,
//! }
//!
//! bencode_record! {
//!     Announce {
//!         info_hash: "info hash",
//!         port: "",
//!         event: "event,omitempty",
//!     }
//! }
//!
//! let bytes = rbenc::marshal(&Announce {
//!     info_hash: "xx".into(),
//!     port: 6881,
//!     event: String::new(),
//! }).unwrap();
//! assert_eq!(bytes, b"d9:info hash2:xx4:porti6881ee");
//!
//! let back: Announce = rbenc::unmarshal(&bytes).unwrap();
//! assert_eq!(back.port, 6881);
//! ```
//!
//! # Error Handling
//!
//! Both directions fail fast with a typed [`BencodeError`]; malformed input
//! never panics. Decoding can fail with, among others:
//!
//! - [`BencodeError::UnexpectedEof`] - input ended mid-token
//! - [`BencodeError::IntegerOverflow`] - integer outside the `i64` range
//! - [`BencodeError::MinusZero`] - the literal `i-0e`
//! - [`BencodeError::TypeMismatch`] - wire kind does not fit the target
//!
//! [BEP-3]: http://bittorrent.org/beps/bep_0003.html

mod decode;
mod encode;
mod error;
mod profile;
mod record;
mod value;

pub use decode::{Decodable, Decoder};
pub use encode::{Encodable, Encoder};
pub use error::BencodeError;
pub use profile::{FieldDescriptor, ProfileCache, TypeProfile};
pub use record::{FieldDef, Record};
pub use value::Value;

/// Encodes a value to canonical bencode bytes.
///
/// # Errors
///
/// Fails with [`BencodeError::UnsupportedKind`] when the value has no wire
/// representation (a `None` anywhere in the structure), or with
/// [`BencodeError::DuplicateFieldName`] when a record type's tags collide.
///
/// # Examples
///
/// ```
/// assert_eq!(rbenc::marshal(&-422i64).unwrap(), b"i-422e");
/// assert_eq!(rbenc::marshal("").unwrap(), b"0:");
/// ```
pub fn marshal<T: Encodable + ?Sized>(value: &T) -> Result<Vec<u8>, BencodeError> {
    let mut enc = Encoder::new();
    value.encode(&mut enc)?;
    Ok(enc.into_bytes())
}

/// Decodes one bencode value from `data` into a `T`.
///
/// Bytes after the first complete value are ignored. Record targets start
/// from their [`Default`] value; fields absent from the wire keep it.
///
/// # Errors
///
/// Fails per the grammar: [`BencodeError::UnexpectedEof`],
/// [`BencodeError::UnexpectedChar`], [`BencodeError::IntegerOverflow`],
/// [`BencodeError::MinusZero`], [`BencodeError::NegativeLength`], or
/// [`BencodeError::TypeMismatch`] when the wire kind does not fit `T`.
///
/// # Examples
///
/// ```
/// let items: Vec<String> = rbenc::unmarshal(b"l2:aa1:b3:ccce").unwrap();
/// assert_eq!(items, ["aa", "b", "ccc"]);
/// ```
pub fn unmarshal<T: Decodable>(data: &[u8]) -> Result<T, BencodeError> {
    let mut dec = Decoder::new(data);
    T::decode(&mut dec)
}

#[cfg(test)]
mod tests;
