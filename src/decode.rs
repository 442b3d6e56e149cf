use crate::error::BencodeError;
use crate::profile;
use crate::record::Record;
use crate::value::Value;
use bytes::Bytes;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wire {
    Integer,
    ByteString,
    List,
    Dict,
}

impl Wire {
    fn name(self) -> &'static str {
        match self {
            Wire::Integer => "integer",
            Wire::ByteString => "byte string",
            Wire::List => "list",
            Wire::Dict => "dictionary",
        }
    }
}

/// Cursor over a bencode input buffer.
///
/// One byte of lookahead is always enough: every value kind has a
/// distinguishing lead byte. [`Decodable`] implementations drive the cursor
/// recursively; trailing bytes after the decoded value are left unread.
#[derive(Debug)]
pub struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    /// Creates a decoder positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Decoder { data, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn bump(&mut self) -> Result<u8, BencodeError> {
        let byte = self.peek().ok_or(BencodeError::UnexpectedEof)?;
        self.pos += 1;
        Ok(byte)
    }

    fn expect(&mut self, expected: u8) -> Result<(), BencodeError> {
        let found = self.bump()?;
        if found != expected {
            return Err(BencodeError::UnexpectedByte {
                expected: expected as char,
                found: found as char,
            });
        }
        Ok(())
    }

    fn wire_kind(&self) -> Result<Wire, BencodeError> {
        match self.peek().ok_or(BencodeError::UnexpectedEof)? {
            b'i' => Ok(Wire::Integer),
            b'0'..=b'9' => Ok(Wire::ByteString),
            b'l' => Ok(Wire::List),
            b'd' => Ok(Wire::Dict),
            other => Err(BencodeError::UnexpectedChar(other as char)),
        }
    }

    fn expect_kind(&self, expected: Wire) -> Result<(), BencodeError> {
        let found = self.wire_kind()?;
        if found != expected {
            return Err(BencodeError::TypeMismatch {
                expected: expected.name(),
                found: found.name(),
            });
        }
        Ok(())
    }

    // Reads an optionally signed decimal run, without delimiters. Leading
    // zeros carry no meaning; `-0` and magnitudes outside i64 are rejected.
    fn read_digits(&mut self) -> Result<i64, BencodeError> {
        let minus = self.peek() == Some(b'-');
        if minus {
            self.pos += 1;
        }
        let mut magnitude: i64 = 0;
        while let Some(byte) = self.peek() {
            if !byte.is_ascii_digit() {
                break;
            }
            self.pos += 1;
            magnitude = magnitude
                .checked_mul(10)
                .and_then(|m| m.checked_add(i64::from(byte - b'0')))
                .ok_or(BencodeError::IntegerOverflow)?;
        }
        if minus {
            if magnitude == 0 {
                return Err(BencodeError::MinusZero);
            }
            return Ok(-magnitude);
        }
        Ok(magnitude)
    }

    /// Decodes a full `i<digits>e` integer token.
    pub fn read_integer(&mut self) -> Result<i64, BencodeError> {
        self.expect(b'i')?;
        let value = self.read_digits()?;
        self.expect(b'e')?;
        Ok(value)
    }

    /// Decodes a length-prefixed byte string and returns the raw payload,
    /// borrowed from the input.
    pub fn read_byte_string(&mut self) -> Result<&'a [u8], BencodeError> {
        let length = self.read_digits()?;
        if length < 0 {
            return Err(BencodeError::NegativeLength);
        }
        self.expect(b':')?;
        let length = usize::try_from(length).map_err(|_| BencodeError::UnexpectedEof)?;
        if self.remaining() < length {
            return Err(BencodeError::UnexpectedEof);
        }
        let bytes = &self.data[self.pos..self.pos + length];
        self.pos += length;
        Ok(bytes)
    }

    // Dictionary keys are always byte strings on the wire, never dynamic.
    fn read_key(&mut self) -> Result<&'a [u8], BencodeError> {
        match self.peek().ok_or(BencodeError::UnexpectedEof)? {
            b'0'..=b'9' | b'-' => self.read_byte_string(),
            b'i' => Err(BencodeError::KeyNotString("integer")),
            b'l' => Err(BencodeError::KeyNotString("list")),
            b'd' => Err(BencodeError::KeyNotString("dictionary")),
            other => Err(BencodeError::UnexpectedChar(other as char)),
        }
    }

    /// Decodes a dictionary into a record, starting from its default value.
    ///
    /// Keys are matched against the record's cached profile by external
    /// name. An unmatched key is not an error: its value is fully parsed
    /// and discarded, leaving the cursor at the next entry.
    pub fn record<T: Record + Default>(&mut self) -> Result<T, BencodeError> {
        let profile = profile::global().profile_for::<T>()?;
        let mut record = T::default();
        self.expect_kind(Wire::Dict)?;
        self.pos += 1;
        loop {
            match self.peek() {
                Some(b'e') => {
                    self.pos += 1;
                    return Ok(record);
                }
                Some(_) => {
                    let key = self.read_key()?;
                    match std::str::from_utf8(key).ok().and_then(|k| profile.field(k)) {
                        Some(field) => record.decode_field(field.slot, self)?,
                        None => {
                            Value::decode(self)?;
                        }
                    }
                }
                None => return Err(BencodeError::UnexpectedEof),
            }
        }
    }
}

/// A value that can be decoded from bencode.
pub trait Decodable: Sized {
    /// Decodes one value from `dec`.
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, BencodeError>;
}

macro_rules! decodable_int {
    ($($ty:ty),*) => { $(
        impl Decodable for $ty {
            fn decode(dec: &mut Decoder<'_>) -> Result<Self, BencodeError> {
                dec.expect_kind(Wire::Integer)?;
                let value = dec.read_integer()?;
                <$ty>::try_from(value).map_err(|_| BencodeError::IntegerOverflow)
            }
        }
    )* };
}

decodable_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl Decodable for bool {
    // Any nonzero integer decodes to true.
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, BencodeError> {
        dec.expect_kind(Wire::Integer)?;
        Ok(dec.read_integer()? != 0)
    }
}

impl Decodable for String {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, BencodeError> {
        dec.expect_kind(Wire::ByteString)?;
        let bytes = dec.read_byte_string()?;
        String::from_utf8(bytes.to_vec()).map_err(|_| BencodeError::InvalidUtf8)
    }
}

impl Decodable for Bytes {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, BencodeError> {
        dec.expect_kind(Wire::ByteString)?;
        Ok(Bytes::copy_from_slice(dec.read_byte_string()?))
    }
}

impl<T: Decodable> Decodable for Vec<T> {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, BencodeError> {
        dec.expect_kind(Wire::List)?;
        dec.pos += 1;
        let mut items = Vec::new();
        loop {
            match dec.peek() {
                Some(b'e') => {
                    dec.pos += 1;
                    return Ok(items);
                }
                Some(_) => items.push(T::decode(dec)?),
                None => return Err(BencodeError::UnexpectedEof),
            }
        }
    }
}

fn decode_map_entries<T: Decodable>(
    dec: &mut Decoder<'_>,
    mut insert: impl FnMut(String, T),
) -> Result<(), BencodeError> {
    dec.expect_kind(Wire::Dict)?;
    dec.pos += 1;
    loop {
        match dec.peek() {
            Some(b'e') => {
                dec.pos += 1;
                return Ok(());
            }
            Some(_) => {
                let key = dec.read_key()?;
                let key =
                    String::from_utf8(key.to_vec()).map_err(|_| BencodeError::InvalidUtf8)?;
                insert(key, T::decode(dec)?);
            }
            None => return Err(BencodeError::UnexpectedEof),
        }
    }
}

impl<T: Decodable> Decodable for BTreeMap<String, T> {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, BencodeError> {
        let mut map = BTreeMap::new();
        decode_map_entries(dec, |key, value| {
            map.insert(key, value);
        })?;
        Ok(map)
    }
}

impl<T: Decodable> Decodable for HashMap<String, T> {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, BencodeError> {
        let mut map = HashMap::new();
        decode_map_entries(dec, |key, value| {
            map.insert(key, value);
        })?;
        Ok(map)
    }
}

impl<T: Decodable> Decodable for Option<T> {
    // A wrapper target with no current value allocates transparently.
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, BencodeError> {
        Ok(Some(T::decode(dec)?))
    }
}

impl<T: Decodable> Decodable for Box<T> {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, BencodeError> {
        Ok(Box::new(T::decode(dec)?))
    }
}

impl Decodable for Value {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, BencodeError> {
        match dec.wire_kind()? {
            Wire::Integer => Ok(Value::Integer(dec.read_integer()?)),
            Wire::ByteString => Ok(Value::Bytes(Bytes::copy_from_slice(
                dec.read_byte_string()?,
            ))),
            Wire::List => {
                dec.pos += 1;
                let mut items = Vec::new();
                loop {
                    match dec.peek() {
                        Some(b'e') => {
                            dec.pos += 1;
                            return Ok(Value::List(items));
                        }
                        Some(_) => items.push(Value::decode(dec)?),
                        None => return Err(BencodeError::UnexpectedEof),
                    }
                }
            }
            Wire::Dict => {
                dec.pos += 1;
                let mut entries = BTreeMap::new();
                loop {
                    match dec.peek() {
                        Some(b'e') => {
                            dec.pos += 1;
                            return Ok(Value::Dict(entries));
                        }
                        Some(_) => {
                            let key = Bytes::copy_from_slice(dec.read_key()?);
                            // Duplicate wire keys: last write wins.
                            entries.insert(key, Value::decode(dec)?);
                        }
                        None => return Err(BencodeError::UnexpectedEof),
                    }
                }
            }
        }
    }
}
