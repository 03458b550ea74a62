//! Bit layouts for literals whose value fits into the 24-bit payload of an embedded code.
//!
//! A label is only packed if unpacking yields exactly the same label. Non-canonical spellings
//! (`"+42"`, `"042"`, `"1"` for `true`, ...) are therefore never packed and end up in the
//! indexed region, which keeps decoding lossless.

use rdf_pipe_model::vocab::xsd;
use rdf_pipe_model::{
    Boolean, Date, Decimal, Double, Float, GDay, GMonth, GMonthDay, GYear, GYearMonth, Integer,
    NamedNodeRef,
};
use std::str::FromStr;

/// The rule used to pack the value of a datatype.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PackedKind {
    Decimal,
    Integer,
    Double,
    Float,
    Boolean,
    Calendar(CalendarShape),
}

/// The fields a date/time datatype is made of.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CalendarShape {
    DateTime,
    Date,
    Time,
    YearMonth,
    MonthDay,
    Year,
    Month,
    Day,
}

/// The datatypes that may be packed. Their position plus one is their index in the datatype
/// table of every dictionary, and the datatype index stored in embedded codes.
pub(crate) static PACKABLE_DATATYPES: [(NamedNodeRef<'static>, PackedKind); 25] = [
    (xsd::DECIMAL, PackedKind::Decimal),
    (xsd::INTEGER, PackedKind::Integer),
    (xsd::NON_POSITIVE_INTEGER, PackedKind::Integer),
    (xsd::NEGATIVE_INTEGER, PackedKind::Integer),
    (xsd::NON_NEGATIVE_INTEGER, PackedKind::Integer),
    (xsd::POSITIVE_INTEGER, PackedKind::Integer),
    (xsd::LONG, PackedKind::Integer),
    (xsd::INT, PackedKind::Integer),
    (xsd::SHORT, PackedKind::Integer),
    (xsd::BYTE, PackedKind::Integer),
    (xsd::UNSIGNED_LONG, PackedKind::Integer),
    (xsd::UNSIGNED_INT, PackedKind::Integer),
    (xsd::UNSIGNED_SHORT, PackedKind::Integer),
    (xsd::UNSIGNED_BYTE, PackedKind::Integer),
    (xsd::DOUBLE, PackedKind::Double),
    (xsd::FLOAT, PackedKind::Float),
    (xsd::BOOLEAN, PackedKind::Boolean),
    (xsd::DATE_TIME, PackedKind::Calendar(CalendarShape::DateTime)),
    (xsd::DATE, PackedKind::Calendar(CalendarShape::Date)),
    (xsd::TIME, PackedKind::Calendar(CalendarShape::Time)),
    (xsd::G_YEAR_MONTH, PackedKind::Calendar(CalendarShape::YearMonth)),
    (xsd::G_MONTH_DAY, PackedKind::Calendar(CalendarShape::MonthDay)),
    (xsd::G_YEAR, PackedKind::Calendar(CalendarShape::Year)),
    (xsd::G_MONTH, PackedKind::Calendar(CalendarShape::Month)),
    (xsd::G_DAY, PackedKind::Calendar(CalendarShape::Day)),
];

const INTEGER_BIAS: i64 = 1 << 23;
const DECIMAL_UNSCALED_BIAS: i64 = 1 << 18;
const DECIMAL_MAX_SCALE: usize = 15;
const DOUBLE_DROPPED_BITS: u32 = 40;
const YEAR_BIAS: i64 = 1 << 14;

/// Returns the datatype table index and the packing rule of `datatype`.
pub(crate) fn packable_datatype(datatype: NamedNodeRef<'_>) -> Option<(u8, PackedKind)> {
    let position = PACKABLE_DATATYPES
        .iter()
        .position(|(candidate, _)| *candidate == datatype)?;
    let index = u8::try_from(position + 1).ok()?;
    Some((index, PACKABLE_DATATYPES[position].1))
}

/// Returns the datatype and packing rule stored under `index` in embedded codes.
pub(crate) fn datatype_for_index(index: u8) -> Option<(NamedNodeRef<'static>, PackedKind)> {
    let position = usize::from(index).checked_sub(1)?;
    PACKABLE_DATATYPES.get(position).copied()
}

/// Packs `label` into a 24-bit payload, if its value fits and the packing is lossless.
pub(crate) fn pack(kind: PackedKind, label: &str) -> Option<u32> {
    let payload = match kind {
        PackedKind::Decimal => pack_decimal(label),
        PackedKind::Integer => pack_integer(label),
        PackedKind::Double => pack_double(label),
        PackedKind::Float => pack_float(label),
        PackedKind::Boolean => pack_boolean(label),
        PackedKind::Calendar(shape) => pack_calendar(shape, label),
    }?;
    (unpack(kind, payload)? == label).then_some(payload)
}

/// Recovers the label of a packed payload. Returns [None] for payloads no label packs into.
pub(crate) fn unpack(kind: PackedKind, payload: u32) -> Option<String> {
    match kind {
        PackedKind::Decimal => unpack_decimal(payload),
        PackedKind::Integer => Some(Integer::from(i64::from(payload) - INTEGER_BIAS).to_string()),
        PackedKind::Double => {
            let bits = u64::from(payload) << DOUBLE_DROPPED_BITS;
            Some(Double::from(f64::from_bits(bits)).to_string())
        }
        PackedKind::Float => {
            let bits = u64::from(payload) << DOUBLE_DROPPED_BITS;
            #[allow(
                clippy::cast_possible_truncation,
                reason = "Floats are packed widened to f64, so narrowing is exact"
            )]
            let value = f64::from_bits(bits) as f32;
            Some(Float::from(value).to_string())
        }
        PackedKind::Boolean => match payload {
            0 => Some(Boolean::from(false).to_string()),
            1 => Some(Boolean::from(true).to_string()),
            _ => None,
        },
        PackedKind::Calendar(shape) => CalendarFields::unpack(payload).format(shape),
    }
}

fn pack_integer(label: &str) -> Option<u32> {
    let value = i64::from(Integer::from_str(label).ok()?);
    let biased = value.checked_add(INTEGER_BIAS)?;
    u32::try_from(biased).ok().filter(|payload| *payload < 1 << 24)
}

fn pack_decimal(label: &str) -> Option<u32> {
    let canonical = Decimal::from_str(label).ok()?.to_string();
    let (negative, digits) = match canonical.strip_prefix('-') {
        Some(digits) => (true, digits),
        None => (false, canonical.as_str()),
    };
    let (integer_part, fraction_part) = digits.split_once('.').unwrap_or((digits, ""));
    let scale = fraction_part.len();
    if scale > DECIMAL_MAX_SCALE {
        return None;
    }

    let mut unscaled: i64 = 0;
    for digit in integer_part.chars().chain(fraction_part.chars()) {
        unscaled = unscaled
            .checked_mul(10)?
            .checked_add(i64::from(digit.to_digit(10)?))?;
        if unscaled >= DECIMAL_UNSCALED_BIAS {
            return None;
        }
    }
    if negative {
        unscaled = -unscaled;
    }

    let scale = u32::try_from(scale).ok()?;
    let unscaled = u32::try_from(unscaled + DECIMAL_UNSCALED_BIAS).ok()?;
    Some((scale + 16) << 19 | unscaled)
}

fn unpack_decimal(payload: u32) -> Option<String> {
    let scale = usize::try_from((payload >> 19).checked_sub(16)?).ok()?;
    if scale > DECIMAL_MAX_SCALE {
        return None;
    }
    let unscaled = i64::from(payload & 0x7_FFFF) - DECIMAL_UNSCALED_BIAS;

    let mut digits = unscaled.unsigned_abs().to_string();
    if scale > 0 {
        if digits.len() <= scale {
            digits.insert_str(0, &"0".repeat(scale + 1 - digits.len()));
        }
        digits.insert(digits.len() - scale, '.');
    }
    if unscaled < 0 {
        digits.insert(0, '-');
    }
    // Let the decimal type decide on the canonical representation.
    Some(Decimal::from_str(&digits).ok()?.to_string())
}

fn pack_double(label: &str) -> Option<u32> {
    let bits = f64::from(Double::from_str(label).ok()?).to_bits();
    pack_binary64(bits)
}

fn pack_float(label: &str) -> Option<u32> {
    let value = f32::from(Float::from_str(label).ok()?);
    pack_binary64(f64::from(value).to_bits())
}

/// Keeps the sign, exponent and the 12 most significant mantissa bits. Values that would lose
/// precision are not packed.
fn pack_binary64(bits: u64) -> Option<u32> {
    if bits.trailing_zeros() < DOUBLE_DROPPED_BITS {
        return None;
    }
    u32::try_from(bits >> DOUBLE_DROPPED_BITS).ok()
}

fn pack_boolean(label: &str) -> Option<u32> {
    Some(u32::from(bool::from(Boolean::from_str(label).ok()?)))
}

fn pack_calendar(shape: CalendarShape, label: &str) -> Option<u32> {
    let valid = match shape {
        // Values of these types always carry a time of day.
        CalendarShape::DateTime | CalendarShape::Time => false,
        CalendarShape::Date => Date::from_str(label).is_ok(),
        CalendarShape::YearMonth => GYearMonth::from_str(label).is_ok(),
        CalendarShape::MonthDay => GMonthDay::from_str(label).is_ok(),
        CalendarShape::Year => GYear::from_str(label).is_ok(),
        CalendarShape::Month => GMonth::from_str(label).is_ok(),
        CalendarShape::Day => GDay::from_str(label).is_ok(),
    };
    if !valid {
        return None;
    }
    CalendarFields::parse(shape, label)?.pack()
}

/// The date fields of a calendar value. A value with a time zone has no representation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct CalendarFields {
    year: Option<i64>,
    month: Option<u32>,
    day: Option<u32>,
}

impl CalendarFields {
    fn parse(shape: CalendarShape, label: &str) -> Option<Self> {
        let mut fields = Self::default();
        let rest = match shape {
            CalendarShape::DateTime | CalendarShape::Time => return None,
            CalendarShape::Date | CalendarShape::YearMonth | CalendarShape::Year => {
                let (year, rest) = parse_year(label)?;
                fields.year = Some(year);
                rest
            }
            CalendarShape::MonthDay | CalendarShape::Month => label.strip_prefix('-')?,
            CalendarShape::Day => label.strip_prefix("--")?,
        };
        let rest = match shape {
            CalendarShape::Year | CalendarShape::Day => rest,
            _ => {
                let (month, rest) = parse_two_digits(rest.strip_prefix('-')?)?;
                fields.month = Some(month);
                rest
            }
        };
        let rest = match shape {
            CalendarShape::Date | CalendarShape::MonthDay | CalendarShape::Day => {
                let (day, rest) = parse_two_digits(rest.strip_prefix('-')?)?;
                fields.day = Some(day);
                rest
            }
            _ => rest,
        };
        rest.is_empty().then_some(fields)
    }

    fn pack(self) -> Option<u32> {
        let day = self.day.unwrap_or(0);
        let month = self.month.unwrap_or(0);
        if day > 31 || month > 12 {
            return None;
        }
        let year = match self.year {
            Some(year) if year.abs() < YEAR_BIAS => u32::try_from(year + YEAR_BIAS).ok()?,
            Some(_) => return None,
            None => 0,
        };
        Some(day | month << 5 | year << 9)
    }

    fn unpack(payload: u32) -> Self {
        let day = payload & 0x1F;
        let month = (payload >> 5) & 0xF;
        let year = payload >> 9;
        Self {
            year: (year != 0).then(|| i64::from(year) - YEAR_BIAS),
            month: (month != 0).then_some(month),
            day: (day != 0).then_some(day),
        }
    }

    fn format(self, shape: CalendarShape) -> Option<String> {
        match (shape, self.year, self.month, self.day) {
            (CalendarShape::Date, Some(year), Some(month), Some(day)) => {
                Some(format!("{}-{month:02}-{day:02}", format_year(year)))
            }
            (CalendarShape::YearMonth, Some(year), Some(month), None) => {
                Some(format!("{}-{month:02}", format_year(year)))
            }
            (CalendarShape::Year, Some(year), None, None) => Some(format_year(year)),
            (CalendarShape::MonthDay, None, Some(month), Some(day)) => {
                Some(format!("--{month:02}-{day:02}"))
            }
            (CalendarShape::Month, None, Some(month), None) => Some(format!("--{month:02}")),
            (CalendarShape::Day, None, None, Some(day)) => Some(format!("---{day:02}")),
            _ => None,
        }
    }
}

fn parse_year(input: &str) -> Option<(i64, &str)> {
    let (negative, unsigned) = match input.strip_prefix('-') {
        Some(unsigned) => (true, unsigned),
        None => (false, input),
    };
    let digit_count = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    if digit_count < 4 {
        return None;
    }
    let (digits, rest) = unsigned.split_at(digit_count);
    let year = i64::from_str(digits).ok()?;
    Some((if negative { -year } else { year }, rest))
}

fn parse_two_digits(input: &str) -> Option<(u32, &str)> {
    let digits = input.get(..2)?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((u32::from_str(digits).ok()?, &input[2..]))
}

fn format_year(year: i64) -> String {
    if year < 0 {
        format!("-{:04}", -year)
    } else {
        format!("{year:04}")
    }
}
