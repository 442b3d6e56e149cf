use crate::error::BencodeError;
use crate::profile;
use crate::record::Record;
use crate::value::Value;
use bytes::Bytes;
use std::collections::{BTreeMap, HashMap};
use std::io::Write;

/// Canonical bencode output buffer.
///
/// The encoder owns the byte buffer and exposes one method per grammar
/// production; [`Encodable`] implementations drive it recursively. Composite
/// productions are bracketed with [`begin_list`](Encoder::begin_list) /
/// [`begin_dict`](Encoder::begin_dict) and [`end`](Encoder::end).
#[derive(Debug, Default)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    /// Creates an encoder with an empty buffer.
    pub fn new() -> Self {
        Encoder { buf: Vec::new() }
    }

    /// Consumes the encoder and returns the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Emits `i<value>e`.
    pub fn integer(&mut self, value: i64) -> Result<(), BencodeError> {
        write!(self.buf, "i{}e", value)?;
        Ok(())
    }

    /// Emits `i<value>e` through the unsigned formatter; values beyond
    /// `i64::MAX` are written digit-for-digit.
    pub fn unsigned(&mut self, value: u64) -> Result<(), BencodeError> {
        write!(self.buf, "i{}e", value)?;
        Ok(())
    }

    /// Emits `i1e` for true, `i0e` for false.
    pub fn boolean(&mut self, value: bool) -> Result<(), BencodeError> {
        self.buf
            .extend_from_slice(if value { b"i1e" } else { b"i0e" });
        Ok(())
    }

    /// Emits `<len>:<bytes>`.
    pub fn byte_string(&mut self, bytes: &[u8]) -> Result<(), BencodeError> {
        write!(self.buf, "{}:", bytes.len())?;
        self.buf.write_all(bytes)?;
        Ok(())
    }

    /// Opens a list; the caller encodes the elements and calls
    /// [`end`](Encoder::end).
    pub fn begin_list(&mut self) {
        self.buf.push(b'l');
    }

    /// Opens a dictionary; keys must be emitted in ascending byte order.
    pub fn begin_dict(&mut self) {
        self.buf.push(b'd');
    }

    /// Closes the innermost list or dictionary.
    pub fn end(&mut self) {
        self.buf.push(b'e');
    }

    /// Encodes a record as a dictionary using its cached
    /// [`TypeProfile`](crate::TypeProfile).
    ///
    /// Fields are emitted in canonical key order; a field tagged `omitempty`
    /// whose value is zero is left out entirely.
    pub fn record<T: Record>(&mut self, record: &T) -> Result<(), BencodeError> {
        let profile = profile::global().profile_for::<T>()?;
        self.begin_dict();
        for field in profile.fields() {
            if field.omit_empty && record.field_is_zero(field.slot) {
                continue;
            }
            self.byte_string(field.name.as_bytes())?;
            record.encode_field(field.slot, self)?;
        }
        self.end();
        Ok(())
    }
}

/// A value that can be encoded as bencode.
pub trait Encodable {
    /// Encodes `self` into `enc`.
    fn encode(&self, enc: &mut Encoder) -> Result<(), BencodeError>;

    /// Returns true when `self` is its type's zero value.
    ///
    /// Drives the `omitempty` tag option: zero is 0 for numbers, false,
    /// the empty string or collection, and `None`. Kinds with no meaningful
    /// zero report false.
    fn is_zero(&self) -> bool {
        false
    }
}

macro_rules! encodable_signed {
    ($($ty:ty),*) => { $(
        impl Encodable for $ty {
            fn encode(&self, enc: &mut Encoder) -> Result<(), BencodeError> {
                enc.integer(*self as i64)
            }

            fn is_zero(&self) -> bool {
                *self == 0
            }
        }
    )* };
}

macro_rules! encodable_unsigned {
    ($($ty:ty),*) => { $(
        impl Encodable for $ty {
            fn encode(&self, enc: &mut Encoder) -> Result<(), BencodeError> {
                enc.unsigned(*self as u64)
            }

            fn is_zero(&self) -> bool {
                *self == 0
            }
        }
    )* };
}

encodable_signed!(i8, i16, i32, i64, isize);
encodable_unsigned!(u8, u16, u32, u64, usize);

impl Encodable for bool {
    fn encode(&self, enc: &mut Encoder) -> Result<(), BencodeError> {
        enc.boolean(*self)
    }

    fn is_zero(&self) -> bool {
        !*self
    }
}

impl Encodable for str {
    fn encode(&self, enc: &mut Encoder) -> Result<(), BencodeError> {
        enc.byte_string(self.as_bytes())
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl Encodable for String {
    fn encode(&self, enc: &mut Encoder) -> Result<(), BencodeError> {
        enc.byte_string(self.as_bytes())
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl Encodable for Bytes {
    fn encode(&self, enc: &mut Encoder) -> Result<(), BencodeError> {
        enc.byte_string(self)
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<T: Encodable> Encodable for [T] {
    fn encode(&self, enc: &mut Encoder) -> Result<(), BencodeError> {
        enc.begin_list();
        for item in self {
            item.encode(enc)?;
        }
        enc.end();
        Ok(())
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<T: Encodable, const N: usize> Encodable for [T; N] {
    fn encode(&self, enc: &mut Encoder) -> Result<(), BencodeError> {
        self.as_slice().encode(enc)
    }

    fn is_zero(&self) -> bool {
        self.iter().all(Encodable::is_zero)
    }
}

impl<T: Encodable> Encodable for Vec<T> {
    fn encode(&self, enc: &mut Encoder) -> Result<(), BencodeError> {
        self.as_slice().encode(enc)
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<T: Encodable> Encodable for BTreeMap<String, T> {
    fn encode(&self, enc: &mut Encoder) -> Result<(), BencodeError> {
        enc.begin_dict();
        for (key, value) in self {
            enc.byte_string(key.as_bytes())?;
            value.encode(enc)?;
        }
        enc.end();
        Ok(())
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<T: Encodable> Encodable for HashMap<String, T> {
    fn encode(&self, enc: &mut Encoder) -> Result<(), BencodeError> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_unstable_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
        enc.begin_dict();
        for (key, value) in entries {
            enc.byte_string(key.as_bytes())?;
            value.encode(enc)?;
        }
        enc.end();
        Ok(())
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<T: Encodable + ?Sized> Encodable for &T {
    fn encode(&self, enc: &mut Encoder) -> Result<(), BencodeError> {
        (**self).encode(enc)
    }

    fn is_zero(&self) -> bool {
        (**self).is_zero()
    }
}

impl<T: Encodable + ?Sized> Encodable for Box<T> {
    fn encode(&self, enc: &mut Encoder) -> Result<(), BencodeError> {
        (**self).encode(enc)
    }

    fn is_zero(&self) -> bool {
        (**self).is_zero()
    }
}

impl<T: Encodable> Encodable for Option<T> {
    /// `Some` unwraps one level and recurses; `None` has no wire
    /// representation and fails.
    fn encode(&self, enc: &mut Encoder) -> Result<(), BencodeError> {
        match self {
            Some(value) => value.encode(enc),
            None => Err(BencodeError::UnsupportedKind("none")),
        }
    }

    fn is_zero(&self) -> bool {
        self.is_none()
    }
}

impl Encodable for Value {
    fn encode(&self, enc: &mut Encoder) -> Result<(), BencodeError> {
        match self {
            Value::Integer(value) => enc.integer(*value),
            Value::Bytes(bytes) => enc.byte_string(bytes),
            Value::List(items) => {
                enc.begin_list();
                for item in items {
                    item.encode(enc)?;
                }
                enc.end();
                Ok(())
            }
            Value::Dict(entries) => {
                enc.begin_dict();
                for (key, value) in entries {
                    enc.byte_string(key)?;
                    value.encode(enc)?;
                }
                enc.end();
                Ok(())
            }
        }
    }
}
