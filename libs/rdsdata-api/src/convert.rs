//! Scalar conversion between native values and wire fields.
//!
//! Outbound, [`to_wire`] encodes a [`Value`] as a [`WireField`] plus an
//! optional [`TypeHint`]. Inbound, [`FromWire`] decodes a field into a
//! concrete target type. Integer transport is always 64-bit signed and
//! narrowing is truncating. Decimal and big-integer values keep their exact
//! textual precision whenever the wire carries text.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use num_bigint::BigInt;
use uuid::Uuid;

use crate::error::MappingError;
use crate::value::Value;
use crate::wire::{TypeHint, WireField, WireValue};

/// `yyyy-MM-dd HH:mm:ss[.SSS]`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
/// `yyyy-MM-dd`
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// `HH:mm:ss[.SSS]`
pub const TIME_FORMAT: &str = "%H:%M:%S%.f";

/// Encodes one native value for the wire.
pub fn to_wire(value: &Value) -> Result<WireValue, MappingError> {
    let encoded = match value {
        Value::Null => WireValue::plain(WireField::Null),
        Value::Int8(v) => WireValue::plain(WireField::Integer(i64::from(*v))),
        Value::Int16(v) => WireValue::plain(WireField::Integer(i64::from(*v))),
        Value::Int32(v) => WireValue::plain(WireField::Integer(i64::from(*v))),
        Value::Int64(v) => WireValue::plain(WireField::Integer(*v)),
        Value::Char(c) => WireValue::plain(WireField::Integer(i64::from(u32::from(*c)))),
        Value::Float32(v) => WireValue::plain(WireField::FloatingPoint(f64::from(*v))),
        Value::Float64(v) => WireValue::plain(WireField::FloatingPoint(*v)),
        Value::String(s) => WireValue::plain(WireField::Text(s.clone())),
        Value::Bool(b) => WireValue::plain(WireField::Boolean(*b)),
        Value::Bytes(b) => WireValue::plain(WireField::Blob(b.clone())),
        Value::Decimal(d) => {
            WireValue::hinted(WireField::Text(d.to_plain_string()), TypeHint::Decimal)
        }
        Value::BigInt(i) => WireValue::hinted(WireField::Text(i.to_string()), TypeHint::Decimal),
        Value::Timestamp(ts) => {
            WireValue::hinted(WireField::Text(format_timestamp(ts)), TypeHint::Timestamp)
        }
        Value::Date(d) => {
            WireValue::hinted(WireField::Text(d.format(DATE_FORMAT).to_string()), TypeHint::Date)
        }
        Value::Time(t) => WireValue::hinted(WireField::Text(format_time(t)), TypeHint::Time),
        Value::Enum(name) => WireValue::plain(WireField::Text(name.clone())),
        Value::Uuid(u) => {
            WireValue::hinted(WireField::Text(u.hyphenated().to_string()), TypeHint::Uuid)
        }
        Value::Array(_) | Value::Opaque(_) => {
            return Err(MappingError::UnsupportedParameterType {
                type_name: value.type_name().to_string(),
            });
        }
    };
    Ok(encoded)
}

/// Milliseconds are written only when non-zero; sub-millisecond precision is dropped.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    if ts.nanosecond() / 1_000_000 == 0 {
        ts.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        ts.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
    }
}

pub fn format_time(t: &NaiveTime) -> String {
    if t.nanosecond() / 1_000_000 == 0 {
        t.format("%H:%M:%S").to_string()
    } else {
        t.format("%H:%M:%S%.3f").to_string()
    }
}

/// Decoding of a wire field into a concrete target type.
///
/// A `Null` field decodes only into `Option<T>`; any other target reports
/// [`MappingError::CannotConvert`]. There is no silent fallback for target
/// types without an implementation: they are rejected at compile time.
pub trait FromWire: Sized {
    fn from_wire(field: &WireField) -> Result<Self, MappingError>;
}

fn mismatch<T>(field: &WireField) -> MappingError {
    MappingError::cannot_convert(field, std::any::type_name::<T>())
}

macro_rules! from_integer_impl {
    ($($ty:ty),*) => {
        $(
            impl FromWire for $ty {
                fn from_wire(field: &WireField) -> Result<Self, MappingError> {
                    match field {
                        WireField::Integer(v) => Ok(*v as $ty),
                        other => Err(mismatch::<$ty>(other)),
                    }
                }
            }
        )*
    };
}

from_integer_impl!(i8, i16, i32, i64, u8, u16, u32);

impl FromWire for char {
    fn from_wire(field: &WireField) -> Result<Self, MappingError> {
        match field {
            WireField::Integer(v) => char::from_u32(*v as u32).ok_or_else(|| mismatch::<char>(field)),
            other => Err(mismatch::<char>(other)),
        }
    }
}

impl FromWire for f64 {
    fn from_wire(field: &WireField) -> Result<Self, MappingError> {
        match field {
            WireField::FloatingPoint(v) => Ok(*v),
            other => Err(mismatch::<f64>(other)),
        }
    }
}

impl FromWire for f32 {
    fn from_wire(field: &WireField) -> Result<Self, MappingError> {
        match field {
            WireField::FloatingPoint(v) => Ok(*v as f32),
            other => Err(mismatch::<f32>(other)),
        }
    }
}

impl FromWire for bool {
    fn from_wire(field: &WireField) -> Result<Self, MappingError> {
        match field {
            WireField::Boolean(v) => Ok(*v),
            other => Err(mismatch::<bool>(other)),
        }
    }
}

impl FromWire for String {
    fn from_wire(field: &WireField) -> Result<Self, MappingError> {
        match field {
            WireField::Text(v) => Ok(v.clone()),
            other => Err(mismatch::<String>(other)),
        }
    }
}

impl FromWire for Vec<u8> {
    fn from_wire(field: &WireField) -> Result<Self, MappingError> {
        match field {
            WireField::Blob(v) => Ok(v.clone()),
            other => Err(mismatch::<Vec<u8>>(other)),
        }
    }
}

impl FromWire for BigDecimal {
    fn from_wire(field: &WireField) -> Result<Self, MappingError> {
        match field {
            WireField::Text(s) => BigDecimal::from_str(s).map_err(|_| mismatch::<BigDecimal>(field)),
            WireField::Integer(v) => Ok(BigDecimal::from(*v)),
            // Shortest decimal form of the double, not its binary expansion.
            WireField::FloatingPoint(v) if v.is_finite() => {
                BigDecimal::from_str(&v.to_string()).map_err(|_| mismatch::<BigDecimal>(field))
            }
            other => Err(mismatch::<BigDecimal>(other)),
        }
    }
}

impl FromWire for BigInt {
    fn from_wire(field: &WireField) -> Result<Self, MappingError> {
        match field {
            WireField::Text(s) => BigInt::from_str(s).map_err(|_| mismatch::<BigInt>(field)),
            WireField::Integer(v) => Ok(BigInt::from(*v)),
            other => Err(mismatch::<BigInt>(other)),
        }
    }
}

impl FromWire for Uuid {
    fn from_wire(field: &WireField) -> Result<Self, MappingError> {
        match field {
            WireField::Text(s) => Uuid::parse_str(s).map_err(|_| mismatch::<Uuid>(field)),
            other => Err(mismatch::<Uuid>(other)),
        }
    }
}

/// A fractional second, when present, must be exactly three digits.
fn millis_fraction(s: &str) -> bool {
    match s.rsplit_once('.') {
        Some((_, fraction)) => fraction.len() == 3 && fraction.bytes().all(|b| b.is_ascii_digit()),
        None => true,
    }
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    if !millis_fraction(s) {
        return None;
    }
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).ok()
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    if !millis_fraction(s) {
        return None;
    }
    NaiveTime::parse_from_str(s, TIME_FORMAT).ok()
}

impl FromWire for NaiveDateTime {
    fn from_wire(field: &WireField) -> Result<Self, MappingError> {
        match field {
            WireField::Text(s) => parse_timestamp(s).ok_or_else(|| mismatch::<NaiveDateTime>(field)),
            other => Err(mismatch::<NaiveDateTime>(other)),
        }
    }
}

// Date and time targets tolerate a full timestamp string.
impl FromWire for NaiveDate {
    fn from_wire(field: &WireField) -> Result<Self, MappingError> {
        match field {
            WireField::Text(s) => parse_timestamp(s)
                .map(|ts| ts.date())
                .or_else(|| NaiveDate::parse_from_str(s, DATE_FORMAT).ok())
                .ok_or_else(|| mismatch::<NaiveDate>(field)),
            other => Err(mismatch::<NaiveDate>(other)),
        }
    }
}

impl FromWire for NaiveTime {
    fn from_wire(field: &WireField) -> Result<Self, MappingError> {
        match field {
            WireField::Text(s) => parse_timestamp(s)
                .map(|ts| ts.time())
                .or_else(|| parse_time(s))
                .ok_or_else(|| mismatch::<NaiveTime>(field)),
            other => Err(mismatch::<NaiveTime>(other)),
        }
    }
}

impl<T: FromWire> FromWire for Option<T> {
    fn from_wire(field: &WireField) -> Result<Self, MappingError> {
        if field.is_null() {
            return Ok(None);
        }
        T::from_wire(field).map(Some)
    }
}

impl FromWire for WireField {
    fn from_wire(field: &WireField) -> Result<Self, MappingError> {
        Ok(field.clone())
    }
}

/// Enumerations carried on the wire by their variant name.
///
/// Usually derived with `#[derive(WireEnum)]`, which also implements
/// [`ToValue`](crate::value::ToValue) and [`FromWire`] in terms of this trait.
pub trait WireEnum: Sized {
    fn variant_name(&self) -> &'static str;
    fn from_variant_name(name: &str) -> Option<Self>;
}

/// Shared decoding path for [`WireEnum`] types.
pub fn enum_from_wire<E: WireEnum>(field: &WireField) -> Result<E, MappingError> {
    match field {
        WireField::Text(name) => {
            E::from_variant_name(name).ok_or_else(|| MappingError::UnknownEnumVariant {
                type_name: std::any::type_name::<E>().to_string(),
                name: name.clone(),
            })
        }
        other => Err(mismatch::<E>(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ToValue;

    fn text(s: &str) -> WireField {
        WireField::Text(s.to_string())
    }

    fn decimal(s: &str) -> BigDecimal {
        s.parse().unwrap()
    }

    #[test]
    fn encodes_integers_and_chars_as_long() {
        assert_eq!(to_wire(&Value::Int8(11)).unwrap().field, WireField::Integer(11));
        assert_eq!(to_wire(&Value::Char('\u{e}')).unwrap().field, WireField::Integer(14));
        assert_eq!(to_wire(&Value::Float32(1.5)).unwrap().field, WireField::FloatingPoint(1.5));
    }

    #[test]
    fn decimal_and_big_integer_carry_decimal_hint() {
        let d = to_wire(&Value::Decimal(decimal("1.5"))).unwrap();
        assert_eq!(d.field, text("1.5"));
        assert_eq!(d.type_hint, Some(TypeHint::Decimal));

        let i = to_wire(&Value::BigInt(BigInt::from(15))).unwrap();
        assert_eq!(i.field, text("15"));
        assert_eq!(i.type_hint, Some(TypeHint::Decimal));
    }

    #[test]
    fn timestamp_millis_only_when_non_zero() {
        let date = NaiveDate::from_ymd_opt(2021, 8, 23).unwrap();
        let whole = date.and_hms_opt(14, 30, 16).unwrap();
        let millis = date.and_hms_milli_opt(14, 30, 16, 223).unwrap();

        let encoded = to_wire(&Value::Timestamp(whole)).unwrap();
        assert_eq!(encoded.field, text("2021-08-23 14:30:16"));
        assert_eq!(encoded.type_hint, Some(TypeHint::Timestamp));

        assert_eq!(
            to_wire(&Value::Timestamp(millis)).unwrap().field,
            text("2021-08-23 14:30:16.223")
        );
        assert_eq!(to_wire(&Value::Date(date)).unwrap().field, text("2021-08-23"));
        assert_eq!(
            to_wire(&Value::Time(millis.time())).unwrap(),
            WireValue::hinted(text("14:30:16.223"), TypeHint::Time)
        );
    }

    #[test]
    fn uuid_is_hyphenated_with_hint() {
        let u = Uuid::from_u128(0x1234_5678_9abc_def0_1234_5678_9abc_def0);
        let encoded = to_wire(&Value::Uuid(u)).unwrap();
        assert_eq!(encoded.field, text("12345678-9abc-def0-1234-56789abcdef0"));
        assert_eq!(encoded.type_hint, Some(TypeHint::Uuid));
        assert_eq!(Uuid::from_wire(&encoded.field).unwrap(), u);
    }

    #[test]
    fn rejects_unsupported_values() {
        let err = to_wire(&Value::Opaque("my::Thing")).unwrap_err();
        assert!(matches!(
            err,
            MappingError::UnsupportedParameterType { ref type_name } if type_name == "my::Thing"
        ));
        assert!(to_wire(&Value::Array(vec![])).is_err());
    }

    #[test]
    fn null_decodes_only_into_option() {
        assert_eq!(Option::<i64>::from_wire(&WireField::Null).unwrap(), None);
        assert_eq!(Option::<String>::from_wire(&text("x")).unwrap(), Some("x".into()));
        assert!(matches!(
            i64::from_wire(&WireField::Null),
            Err(MappingError::CannotConvert { .. })
        ));
    }

    #[test]
    fn narrowing_truncates() {
        assert_eq!(i8::from_wire(&WireField::Integer(300)).unwrap(), 44);
        assert_eq!(char::from_wire(&WireField::Integer(6)).unwrap(), '\u{6}');
        assert_eq!(f32::from_wire(&WireField::FloatingPoint(2.5)).unwrap(), 2.5f32);
    }

    #[test]
    fn decimal_prefers_exact_text() {
        assert_eq!(BigDecimal::from_wire(&text("12.25")).unwrap(), decimal("12.25"));
        assert_eq!(BigDecimal::from_wire(&WireField::Integer(12)).unwrap(), decimal("12"));
        assert_eq!(
            BigDecimal::from_wire(&WireField::FloatingPoint(12.5)).unwrap(),
            decimal("12.5")
        );
        assert_eq!(
            BigDecimal::from_wire(&WireField::FloatingPoint(0.1)).unwrap(),
            decimal("0.1")
        );
        let err = BigDecimal::from_wire(&WireField::Boolean(true)).unwrap_err();
        assert!(
            err.to_string()
                .starts_with("Cannot convert field {booleanValue: true} to type bigdecimal::")
        );
        assert!(BigDecimal::from_wire(&WireField::FloatingPoint(f64::NAN)).is_err());
    }

    #[test]
    fn decimal_is_not_limited_to_28_digits() {
        let wide = "1234567890123456789012345678901.5";
        assert_eq!(BigDecimal::from_wire(&text(wide)).unwrap(), decimal(wide));

        let deep = "0.12345678901234567890123456789012";
        assert_eq!(BigDecimal::from_wire(&text(deep)).unwrap(), decimal(deep));

        assert_eq!(
            BigDecimal::from_wire(&WireField::FloatingPoint(1e30)).unwrap(),
            decimal("1000000000000000000000000000000")
        );

        let encoded = to_wire(&Value::Decimal(decimal(wide))).unwrap();
        assert_eq!(encoded.field, text(wide));
        assert_eq!(BigDecimal::from_wire(&encoded.field).unwrap(), decimal(wide));
    }

    #[test]
    fn big_integer_has_no_float_fallback() {
        assert_eq!(BigInt::from_wire(&text("333")).unwrap(), BigInt::from(333));
        assert_eq!(BigInt::from_wire(&WireField::Integer(444)).unwrap(), BigInt::from(444));
        assert!(BigInt::from_wire(&WireField::FloatingPoint(1.0)).is_err());
        assert!(BigInt::from_wire(&WireField::Boolean(true)).is_err());
    }

    #[test]
    fn temporal_targets_accept_timestamp_text() {
        let full = text("2021-08-23 14:30:16.223");

        assert_eq!(
            NaiveDate::from_wire(&full).unwrap(),
            NaiveDate::from_ymd_opt(2021, 8, 23).unwrap()
        );
        assert_eq!(
            NaiveTime::from_wire(&full).unwrap(),
            NaiveTime::from_hms_milli_opt(14, 30, 16, 223).unwrap()
        );
        assert_eq!(
            NaiveTime::from_wire(&text("14:30:16")).unwrap(),
            NaiveTime::from_hms_opt(14, 30, 16).unwrap()
        );
        assert_eq!(
            NaiveDate::from_wire(&text("2021-08-23")).unwrap(),
            NaiveDate::from_ymd_opt(2021, 8, 23).unwrap()
        );
        assert!(NaiveDate::from_wire(&text("23/08/2021")).is_err());
    }

    #[test]
    fn fractional_seconds_are_exactly_three_digits() {
        assert!(NaiveDateTime::from_wire(&text("2021-08-23 14:30:16.223")).is_ok());
        assert!(NaiveDateTime::from_wire(&text("2021-08-23 14:30:16")).is_ok());
        assert!(NaiveDateTime::from_wire(&text("2021-08-23 14:30:16.2234567")).is_err());
        assert!(NaiveDateTime::from_wire(&text("2021-08-23 14:30:16.2")).is_err());
        assert!(NaiveTime::from_wire(&text("14:30:16.2234567")).is_err());
        assert!(NaiveTime::from_wire(&text("14:30:16.")).is_err());
        assert!(NaiveDate::from_wire(&text("2021-08-23 14:30:16.22")).is_err());
    }

    #[test]
    fn scalars_round_trip() {
        let date = NaiveDate::from_ymd_opt(2020, 2, 29).unwrap();
        let ts = date.and_hms_milli_opt(1, 2, 3, 45).unwrap();

        let field = to_wire(&Value::Timestamp(ts)).unwrap().field;
        assert_eq!(NaiveDateTime::from_wire(&field).unwrap(), ts);

        let field = to_wire(&Value::Decimal(decimal("-12345.6789"))).unwrap().field;
        assert_eq!(BigDecimal::from_wire(&field).unwrap(), decimal("-12345.6789"));

        let big: BigInt = "123456789012345678901234567890".parse().unwrap();
        let field = to_wire(&Value::BigInt(big.clone())).unwrap().field;
        assert_eq!(BigInt::from_wire(&field).unwrap(), big);

        let field = to_wire(&Value::Bytes(vec![1, 2, 3])).unwrap().field;
        assert_eq!(Vec::<u8>::from_wire(&field).unwrap(), vec![1, 2, 3]);
    }

    fn round_trip<T: ToValue + FromWire>(value: &T) -> T {
        let encoded = to_wire(&value.to_value()).unwrap();
        T::from_wire(&encoded.field).unwrap()
    }

    #[test]
    fn primitives_round_trip() {
        assert_eq!(round_trip(&'x'), 'x');
        assert_eq!(round_trip(&'\u{e9}'), '\u{e9}');
        assert!(round_trip(&true));
        assert!(!round_trip(&false));
        assert_eq!(round_trip(&1.25f32), 1.25f32);
        assert_eq!(round_trip(&-3.0e-7f64), -3.0e-7f64);
        assert_eq!(round_trip(&String::from("text value")), "text value");
        assert_eq!(round_trip(&String::new()), "");
    }

    #[derive(Debug, PartialEq)]
    enum Colour {
        Red,
        Green,
    }

    impl WireEnum for Colour {
        fn variant_name(&self) -> &'static str {
            match self {
                Colour::Red => "Red",
                Colour::Green => "Green",
            }
        }

        fn from_variant_name(name: &str) -> Option<Self> {
            match name {
                "Red" => Some(Colour::Red),
                "Green" => Some(Colour::Green),
                _ => None,
            }
        }
    }

    #[test]
    fn enums_round_trip_by_variant_name() {
        let encoded = to_wire(&Value::Enum(Colour::Green.variant_name().to_string())).unwrap();
        assert_eq!(encoded.field, text("Green"));
        assert_eq!(encoded.type_hint, None);
        assert_eq!(enum_from_wire::<Colour>(&encoded.field).unwrap(), Colour::Green);
        assert!(matches!(
            enum_from_wire::<Colour>(&text("Blue")),
            Err(MappingError::UnknownEnumVariant { .. })
        ));
    }

    #[test]
    fn dates_and_times_round_trip() {
        let date = NaiveDate::from_ymd_opt(1999, 12, 31).unwrap();
        assert_eq!(round_trip(&date), date);

        let whole = NaiveTime::from_hms_opt(23, 59, 58).unwrap();
        assert_eq!(round_trip(&whole), whole);

        let millis = NaiveTime::from_hms_milli_opt(14, 30, 16, 223).unwrap();
        assert_eq!(round_trip(&millis), millis);

        let leading_zero = NaiveTime::from_hms_milli_opt(0, 0, 1, 7).unwrap();
        assert_eq!(to_wire(&leading_zero.to_value()).unwrap().field, text("00:00:01.007"));
        assert_eq!(round_trip(&leading_zero), leading_zero);
    }
}
