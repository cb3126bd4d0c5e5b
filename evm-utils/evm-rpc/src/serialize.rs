use primitive_types::{H160, H256, U256};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, LowerHex};
use std::marker::PhantomData;
use std::convert::TryFrom;
use std::str::FromStr;

use crate::error::Error;

#[derive(Debug, Hash, Clone, Copy, Eq, PartialEq)]
pub struct Hex<T>(pub T);
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Bytes(pub Vec<u8>);

fn format_hex_trimmed<T: LowerHex>(val: &T) -> String {
    let hex_str = format!("{:x}", val);
    let trimmed = hex_str.trim_start_matches('0');
    if trimmed.is_empty() {
        "0x0".to_string()
    } else {
        format!("0x{}", trimmed)
    }
}

pub trait FormatHex {
    fn format_hex(&self) -> String;
}

impl FormatHex for usize {
    fn format_hex(&self) -> String {
        format_hex_trimmed(self)
    }
}

impl FormatHex for u32 {
    fn format_hex(&self) -> String {
        format_hex_trimmed(self)
    }
}

impl FormatHex for u64 {
    fn format_hex(&self) -> String {
        format_hex_trimmed(self)
    }
}

impl FormatHex for U256 {
    fn format_hex(&self) -> String {
        format_hex_trimmed(self)
    }
}

impl FormatHex for H256 {
    fn format_hex(&self) -> String {
        format!("0x{:x}", self)
    }
}

impl FormatHex for H160 {
    fn format_hex(&self) -> String {
        format!("0x{:x}", self)
    }
}

/// Signed integer quantity in the Ethereum hex convention.
///
/// The magnitude is kept as `U256`, which covers every balance, gas and height
/// value the native chain produces. Zero is never negative.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash)]
pub struct Quantity {
    negative: bool,
    magnitude: U256,
}

impl Quantity {
    pub fn new(negative: bool, magnitude: U256) -> Self {
        Self {
            negative: negative && !magnitude.is_zero(),
            magnitude,
        }
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn magnitude(&self) -> U256 {
        self.magnitude
    }

    /// Non-negative value, or `None` for negative quantities.
    pub fn unsigned(&self) -> Option<U256> {
        if self.negative {
            None
        } else {
            Some(self.magnitude)
        }
    }
}

impl From<U256> for Quantity {
    fn from(magnitude: U256) -> Self {
        Self::new(false, magnitude)
    }
}

impl From<u64> for Quantity {
    fn from(value: u64) -> Self {
        Self::new(false, value.into())
    }
}

impl From<usize> for Quantity {
    fn from(value: usize) -> Self {
        Self::new(false, value.into())
    }
}

impl From<i64> for Quantity {
    fn from(value: i64) -> Self {
        Self::new(value < 0, U256::from(value.unsigned_abs()))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.magnitude.format_hex();
        if self.negative {
            write!(f, "-{}", hex)
        } else {
            f.write_str(&hex)
        }
    }
}

/// Parses `0x` hex, `-0x` hex, bare decimal and bare hex.
///
/// A bare string made only of decimal digits is read as decimal, a bare string
/// containing `a-f` is read as hex. `"0x"` is zero.
impl FromStr for Quantity {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidQuantity {
            input_data: input.to_string(),
        };
        let lowered = input.trim().to_ascii_lowercase();
        let (negative, unsigned) = match lowered.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, lowered.as_str()),
        };
        let (prefixed, digits) = match unsigned.strip_prefix("0x") {
            Some(rest) => (true, rest),
            None => (false, unsigned),
        };
        if digits.is_empty() {
            return if prefixed {
                Ok(Quantity::default())
            } else {
                Err(invalid())
            };
        }
        let is_decimal = digits.bytes().all(|b| b.is_ascii_digit());
        let is_hex = digits.bytes().all(|b| b.is_ascii_hexdigit());
        let magnitude = if !prefixed && is_decimal {
            U256::from_dec_str(digits).map_err(|_| invalid())?
        } else if is_hex {
            let significant = digits.trim_start_matches('0');
            if significant.is_empty() {
                U256::zero()
            } else if significant.len() > 64 {
                return Err(invalid());
            } else {
                U256::from_str_radix(significant, 16).map_err(|_| invalid())?
            }
        } else {
            return Err(invalid());
        };
        Ok(Quantity::new(negative, magnitude))
    }
}

/// Canonical hex quantity of an integer.
pub fn to_hex<T: Into<Quantity>>(value: T) -> String {
    value.into().to_string()
}

/// Canonical hex quantity of a numeric string, see [`Quantity`] for the
/// accepted forms.
pub fn str_to_hex(value: &str) -> Result<String, Error> {
    Ok(value.parse::<Quantity>()?.to_string())
}

pub fn from_hex(value: &str) -> Result<Quantity, Error> {
    value.parse()
}

/// Unsigned integers that can be read back from a [`Quantity`].
pub trait ParseHex: Sized {
    fn from_quantity(quantity: Quantity) -> Option<Self>;
}

impl ParseHex for U256 {
    fn from_quantity(quantity: Quantity) -> Option<Self> {
        quantity.unsigned()
    }
}

impl ParseHex for u64 {
    fn from_quantity(quantity: Quantity) -> Option<Self> {
        let value = quantity.unsigned()?;
        if value > U256::from(u64::MAX) {
            None
        } else {
            Some(value.low_u64())
        }
    }
}

impl ParseHex for usize {
    fn from_quantity(quantity: Quantity) -> Option<Self> {
        u64::from_quantity(quantity).and_then(|v| usize::try_from(v).ok())
    }
}

impl ParseHex for u32 {
    fn from_quantity(quantity: Quantity) -> Option<Self> {
        u64::from_quantity(quantity).and_then(|v| u32::try_from(v).ok())
    }
}

impl<T: FormatHex> Serialize for Hex<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.format_hex())
    }
}

impl Serialize for Quantity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl Serialize for Bytes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("0x{}", &hex::encode(&self.0)))
    }
}

struct HexVisitor<T> {
    _marker: PhantomData<T>,
}

impl<'de, T: ParseHex> de::Visitor<'de> for HexVisitor<T> {
    type Value = Hex<T>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a hex or decimal quantity")
    }

    fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        s.parse::<Quantity>()
            .ok()
            .and_then(T::from_quantity)
            .map(Hex)
            .ok_or_else(|| de::Error::invalid_value(de::Unexpected::Str(s), &self))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        T::from_quantity(v.into())
            .map(Hex)
            .ok_or_else(|| de::Error::invalid_value(de::Unexpected::Unsigned(v), &self))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        T::from_quantity(v.into())
            .map(Hex)
            .ok_or_else(|| de::Error::invalid_value(de::Unexpected::Signed(v), &self))
    }
}

struct QuantityVisitor;

impl<'de> de::Visitor<'de> for QuantityVisitor {
    type Value = Quantity;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a hex or decimal quantity")
    }

    fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        s.parse()
            .map_err(|_| de::Error::invalid_value(de::Unexpected::Str(s), &self))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(v.into())
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(v.into())
    }
}

struct BytesVisitor;

impl<'de> de::Visitor<'de> for BytesVisitor {
    type Value = Bytes;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("Must be a valid hex string")
    }

    fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        match s.strip_prefix("0x").map(hex::decode) {
            Some(Ok(d)) => Ok(Bytes(d)),
            _ => Err(de::Error::invalid_value(de::Unexpected::Str(s), &self)),
        }
    }
}

impl<'de, T: ParseHex> Deserialize<'de> for Hex<T> {
    fn deserialize<D>(deserializer: D) -> Result<Hex<T>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(HexVisitor {
            _marker: PhantomData,
        })
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D>(deserializer: D) -> Result<Quantity, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(QuantityVisitor)
    }
}

impl<'de> Deserialize<'de> for Bytes {
    fn deserialize<D>(deserializer: D) -> Result<Bytes, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(BytesVisitor)
    }
}

impl FromStr for Bytes {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").ok_or_else(|| Error::InvalidHexPrefix {
            input_data: s.to_string(),
        })?;
        hex::decode(digits)
            .map(Bytes)
            .map_err(|source| Error::HexError {
                input_data: s.to_string(),
                source,
            })
    }
}

impl fmt::Display for Bytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(b: Vec<u8>) -> Self {
        Bytes(b)
    }
}
impl<T: FormatHex> From<T> for Hex<T> {
    fn from(b: T) -> Self {
        Hex(b)
    }
}
