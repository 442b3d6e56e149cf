//! Struct support for the marshalling engine.
//!
//! A record type declares its fields together with a tag string per field;
//! the profile resolver (see [`crate::TypeProfile`]) turns that declaration
//! into the external key set that drives dictionary encoding and decoding.

use crate::decode::Decoder;
use crate::encode::Encoder;
use crate::error::BencodeError;

/// One declared field of a [`Record`] type: the Rust field name plus its
/// tag string.
///
/// The tag mini-language follows struct-tag conventions: `""` keeps the
/// declared field name as the dictionary key, `"name"` renames the key,
/// `"name,omitempty"` additionally drops the field on encode when its value
/// is zero, and `"-"` excludes the field from both directions.
#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    /// Declared (Rust) field name.
    pub name: &'static str,
    /// Tag string consumed by the profile resolver.
    pub tag: &'static str,
}

/// A struct-like type that encodes to and decodes from a bencode dictionary.
///
/// Implementations are normally generated with [`bencode_record!`]; the
/// trait exposes the declared field table plus per-field hooks addressed by
/// the declared field name.
///
/// [`bencode_record!`]: crate::bencode_record
pub trait Record: 'static {
    /// Declared fields in declaration order.
    const FIELDS: &'static [FieldDef];

    /// Encodes the field `slot` into `enc`.
    fn encode_field(&self, slot: &str, enc: &mut Encoder) -> Result<(), BencodeError>;

    /// Returns true when the field `slot` holds its type's zero value.
    fn field_is_zero(&self, slot: &str) -> bool;

    /// Decodes the next value from `dec` into the field `slot`.
    fn decode_field(&mut self, slot: &str, dec: &mut Decoder<'_>) -> Result<(), BencodeError>;
}

/// Splits a tag string into its name and option parts.
pub(crate) fn parse_tag(tag: &'static str) -> (&'static str, &'static str) {
    match tag.split_once(',') {
        Some((name, option)) => (name, option),
        None => (tag, ""),
    }
}

/// Implements [`Record`], [`Encodable`](crate::Encodable) and
/// [`Decodable`](crate::Decodable) for a struct from a field/tag table.
///
/// The struct must implement [`Default`] (decoding starts from the default
/// value; fields absent from the wire keep it).
///
/// # Examples
///
/// ```
/// use rbenc::bencode_record;
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Handshake {
///     peer_id: String,
///     port: u16,
///     reserved: u64,
/// }
///
/// bencode_record! {
///     Handshake {
///         peer_id: "peer id",
///         port: "port,omitempty",
///         reserved: "-",
///     }
/// }
///
/// let hs = Handshake { peer_id: "ab".into(), port: 6881, reserved: 7 };
/// let bytes = rbenc::marshal(&hs).unwrap();
/// assert_eq!(bytes, b"d7:peer id2:ab4:porti6881ee");
///
/// let back: Handshake = rbenc::unmarshal(&bytes).unwrap();
/// assert_eq!(back.peer_id, "ab");
/// assert_eq!(back.reserved, 0);
/// ```
#[macro_export]
macro_rules! bencode_record {
    ($ty:ident { $($field:ident: $tag:literal),* $(,)? }) => {
        impl $crate::Record for $ty {
            const FIELDS: &'static [$crate::FieldDef] = &[
                $($crate::FieldDef { name: stringify!($field), tag: $tag },)*
            ];

            fn encode_field(
                &self,
                slot: &str,
                enc: &mut $crate::Encoder,
            ) -> Result<(), $crate::BencodeError> {
                match slot {
                    $(stringify!($field) => $crate::Encodable::encode(&self.$field, enc),)*
                    _ => unreachable!("field slot {slot:?} not declared"),
                }
            }

            fn field_is_zero(&self, slot: &str) -> bool {
                match slot {
                    $(stringify!($field) => $crate::Encodable::is_zero(&self.$field),)*
                    _ => unreachable!("field slot {slot:?} not declared"),
                }
            }

            fn decode_field(
                &mut self,
                slot: &str,
                dec: &mut $crate::Decoder<'_>,
            ) -> Result<(), $crate::BencodeError> {
                match slot {
                    $(stringify!($field) => {
                        self.$field = $crate::Decodable::decode(dec)?;
                        Ok(())
                    })*
                    _ => unreachable!("field slot {slot:?} not declared"),
                }
            }
        }

        impl $crate::Encodable for $ty {
            fn encode(&self, enc: &mut $crate::Encoder) -> Result<(), $crate::BencodeError> {
                enc.record(self)
            }

            fn is_zero(&self) -> bool {
                true $(&& $crate::Encodable::is_zero(&self.$field))*
            }
        }

        impl $crate::Decodable for $ty {
            fn decode(dec: &mut $crate::Decoder<'_>) -> Result<Self, $crate::BencodeError> {
                dec.record()
            }
        }
    };
}
