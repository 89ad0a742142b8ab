//! Scalar codecs (C3): the tag-selection rules for every leaf shape in the
//! data model — integers, longs, and the handful of fixed-shape scalars
//! (byte/short/char/float/double/bigint/bigdecimal/instant/uuid/class/
//! string).
//!
//! Grounded in the teacher's `integer.rs` (smallest-width selection over a
//! literal/MIN/MAX/Fx ladder) and `marker.rs` (one leading tag byte per
//! shape), generalized here to the full M-form/Fx-form ladder spec.md §4.3
//! describes, and deliberately fixing the two bugs spec.md §9 calls out:
//! the M-form payload is the absolute value's bytes, written little-endian
//! (never the degenerate `val -= val` zero), and the `LONG_MF7` boundary
//! check uses the correct 7-byte mask.

use std::rc::Rc;

use bigdecimal::BigDecimal;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use num_bigint::BigInt;

use crate::error::{Error, Result};
use crate::io;
use crate::tag;
use crate::value::Value;

/// Writes `v`'s tag and payload if `v` is one of the scalar shapes this
/// module owns. Returns `false` for anything else (arrays, containers,
/// object arrays, singletons), so `codec.rs` can fall through to the
/// sibling modules.
pub fn write_scalar(buf: &mut Vec<u8>, v: &Value) -> bool {
    match v {
        Value::Null => buf.push(tag::NULL),
        Value::Bool(true) => buf.push(tag::BOOLEAN_TRUE),
        Value::Bool(false) => buf.push(tag::BOOLEAN_FALSE),
        Value::Int(n) => encode_int(buf, *n),
        Value::Long(n) => encode_long(buf, *n),
        Value::Byte(n) => encode_byte(buf, *n),
        Value::Char(n) => encode_char(buf, *n),
        Value::Short(n) => encode_short(buf, *n),
        Value::Float(n) => encode_float(buf, *n),
        Value::Double(n) => encode_double(buf, *n),
        Value::BigInt(n) => encode_bigint(buf, n),
        Value::BigDecimal(n) => encode_bigdecimal(buf, n),
        Value::Str(s) => encode_string(buf, s),
        Value::Instant(ms) => {
            buf.push(tag::DATE);
            io::write_i64(buf, *ms);
        }
        Value::Uuid(u) => {
            buf.push(tag::UUID);
            let (hi, lo) = u.as_u64_pair();
            io::write_u64(buf, hi);
            io::write_u64(buf, lo);
        }
        Value::Class(name) => encode_class(buf, name),
        _ => return false,
    }
    true
}

/// Reads one scalar value given its already-consumed `tag`. Returns `Ok(None)`
/// if `tag` does not belong to this module.
pub fn read_scalar(tag: u8, buf: &mut &[u8]) -> Result<Option<Value>> {
    use crate::tag::*;
    Ok(Some(match tag {
        NULL => Value::Null,
        BOOLEAN_TRUE => Value::Bool(true),
        BOOLEAN_FALSE => Value::Bool(false),
        t if is_int_tag(t) => Value::Int(decode_int(t, buf)?),
        t if is_long_tag(t) => Value::Long(decode_long(t, buf)?),
        BYTE_M1 => Value::Byte(-1),
        BYTE_0 => Value::Byte(0),
        BYTE_1 => Value::Byte(1),
        BYTE => Value::Byte(buf.read_i8()?),
        CHAR_0 => Value::Char(0),
        CHAR_1 => Value::Char(1),
        CHAR_255 => Value::Char(io::read_u8(buf)? as u16),
        CHAR => Value::Char(io::read_u16(buf)?),
        SHORT_M1 => Value::Short(-1),
        SHORT_0 => Value::Short(0),
        SHORT_1 => Value::Short(1),
        SHORT_255 => Value::Short(io::read_u8(buf)? as i16),
        SHORT_M255 => Value::Short(-(io::read_u8(buf)? as i16)),
        SHORT => Value::Short(buf.read_i16::<byteorder::BigEndian>()?),
        FLOAT_M1 => Value::Float(-1.0),
        FLOAT_0 => Value::Float(0.0),
        FLOAT_1 => Value::Float(1.0),
        FLOAT_255 => Value::Float(io::read_u8(buf)? as f32),
        FLOAT_SHORT => Value::Float(buf.read_i16::<byteorder::BigEndian>()? as f32),
        FLOAT => Value::Float(io::read_f32(buf)?),
        DOUBLE_M1 => Value::Double(-1.0),
        DOUBLE_0 => Value::Double(0.0),
        DOUBLE_1 => Value::Double(1.0),
        DOUBLE_255 => Value::Double(io::read_u8(buf)? as f64),
        DOUBLE_SHORT => Value::Double(buf.read_i16::<byteorder::BigEndian>()? as f64),
        DOUBLE_INT => Value::Double(io::read_i32(buf)? as f64),
        DOUBLE => Value::Double(io::read_f64(buf)?),
        BIGINTEGER => Value::BigInt(decode_bigint(buf)?),
        BIGDECIMAL => Value::BigDecimal(decode_bigdecimal(buf)?),
        CLASS => Value::Class(decode_class(buf)?),
        DATE => Value::Instant(io::read_i64(buf)?),
        UUID => {
            let hi = io::read_u64(buf)?;
            let lo = io::read_u64(buf)?;
            Value::Uuid(uuid::Uuid::from_u64_pair(hi, lo))
        }
        STRING_0 => Value::str(""),
        t if crate::tag::string_inline_len(t).is_some() => decode_string(t, buf)?,
        STRING => decode_string(tag, buf)?,
        _ => return Ok(None),
    }))
}

fn is_int_tag(t: u8) -> bool {
    use crate::tag::*;
    (INT_M9..=INT_MAX_LIT).contains(&t) || (INT_MIN..=INT).contains(&t)
}

fn is_long_tag(t: u8) -> bool {
    use crate::tag::*;
    (LONG_M9..=LONG_MAX_LIT).contains(&t) || (LONG_MIN..=LONG).contains(&t)
}

// --- Integer ---------------------------------------------------------

fn encode_int(buf: &mut Vec<u8>, v: i32) {
    if let Some(t) = tag::int_literal_tag(v) {
        buf.push(t);
        return;
    }
    if v == i32::MIN {
        buf.push(tag::INT_MIN);
        return;
    }
    if v == i32::MAX {
        buf.push(tag::INT_MAX);
        return;
    }
    if v < 0 {
        let mag = (-(v as i64)) as u64;
        encode_width_le(buf, mag, &[tag::INT_MF1, tag::INT_MF2, tag::INT_MF3], tag::INT, |buf, v| {
            io::write_i32(buf, v as i32)
        });
    } else {
        let mag = v as u64;
        encode_width_le(buf, mag, &[tag::INT_F1, tag::INT_F2, tag::INT_F3], tag::INT, |buf, v| {
            io::write_i32(buf, v as i32)
        });
    }
}

fn decode_int(t: u8, buf: &mut &[u8]) -> Result<i32> {
    if let Some(v) = tag::int_literal_value(t) {
        return Ok(v);
    }
    if t == tag::INT_MIN {
        return Ok(i32::MIN);
    }
    if t == tag::INT_MAX {
        return Ok(i32::MAX);
    }
    if t == tag::INT {
        return Ok(io::read_i32(buf)?);
    }
    let (width, negate) = match t {
        x if x == tag::INT_F1 => (1, false),
        x if x == tag::INT_MF1 => (1, true),
        x if x == tag::INT_F2 => (2, false),
        x if x == tag::INT_MF2 => (2, true),
        x if x == tag::INT_F3 => (3, false),
        x if x == tag::INT_MF3 => (3, true),
        _ => return Err(Error::UnknownTag(t)),
    };
    let mag = read_width_le(buf, width)?;
    Ok(if negate { -(mag as i64) as i32 } else { mag as i32 })
}

// --- Long --------------------------------------------------------------

fn encode_long(buf: &mut Vec<u8>, v: i64) {
    if let Some(t) = tag::long_literal_tag(v) {
        buf.push(t);
        return;
    }
    if v == i64::MIN {
        buf.push(tag::LONG_MIN);
        return;
    }
    if v == i64::MAX {
        buf.push(tag::LONG_MAX);
        return;
    }
    let f_tags = [
        tag::LONG_F1,
        tag::LONG_F2,
        tag::LONG_F3,
        tag::LONG_F4,
        tag::LONG_F5,
        tag::LONG_F6,
        tag::LONG_F7,
    ];
    let mf_tags = [
        tag::LONG_MF1,
        tag::LONG_MF2,
        tag::LONG_MF3,
        tag::LONG_MF4,
        tag::LONG_MF5,
        tag::LONG_MF6,
        tag::LONG_MF7,
    ];
    if v < 0 {
        // `v == i64::MIN` was handled above, so negation below never overflows.
        let mag = (-v) as u64;
        encode_width_le(buf, mag, &mf_tags, tag::LONG, |buf, v| io::write_i64(buf, v as i64));
    } else {
        let mag = v as u64;
        encode_width_le(buf, mag, &f_tags, tag::LONG, |buf, v| io::write_i64(buf, v as i64));
    }
}

fn decode_long(t: u8, buf: &mut &[u8]) -> Result<i64> {
    if let Some(v) = tag::long_literal_value(t) {
        return Ok(v);
    }
    if t == tag::LONG_MIN {
        return Ok(i64::MIN);
    }
    if t == tag::LONG_MAX {
        return Ok(i64::MAX);
    }
    if t == tag::LONG {
        return Ok(io::read_i64(buf)?);
    }
    // The correct (fixed) guard: 7 bytes, `0x00FF_FFFF_FFFF_FFFF` worth of
    // magnitude, not the 6-byte mask the buggy original used.
    let (width, negate) = match t {
        x if x == tag::LONG_F1 => (1, false),
        x if x == tag::LONG_MF1 => (1, true),
        x if x == tag::LONG_F2 => (2, false),
        x if x == tag::LONG_MF2 => (2, true),
        x if x == tag::LONG_F3 => (3, false),
        x if x == tag::LONG_MF3 => (3, true),
        x if x == tag::LONG_F4 => (4, false),
        x if x == tag::LONG_MF4 => (4, true),
        x if x == tag::LONG_F5 => (5, false),
        x if x == tag::LONG_MF5 => (5, true),
        x if x == tag::LONG_F6 => (6, false),
        x if x == tag::LONG_MF6 => (6, true),
        x if x == tag::LONG_F7 => (7, false),
        x if x == tag::LONG_MF7 => (7, true),
        _ => return Err(Error::UnknownTag(t)),
    };
    let mag = read_width_le(buf, width)?;
    Ok(if negate { -(mag as i128) as i64 } else { mag as i64 })
}

/// Picks the narrowest tag in `width_tags` (1, 2, 3, ... bytes, in order)
/// whose byte width holds `mag`; falls back to `full_tag` with an 8- or
/// 4-byte big-endian payload (`write_full`) if none does.
fn encode_width_le(
    buf: &mut Vec<u8>,
    mag: u64,
    width_tags: &[u8],
    full_tag: u8,
    write_full: impl Fn(&mut Vec<u8>, u64),
) {
    for (i, &t) in width_tags.iter().enumerate() {
        let width = i + 1;
        let max = if width >= 8 { u64::MAX } else { (1u64 << (8 * width)) - 1 };
        if mag <= max {
            buf.push(t);
            buf.write_uint::<LittleEndian>(mag, width)
                .expect("Vec<u8> write is infallible");
            return;
        }
    }
    buf.push(full_tag);
    write_full(buf, mag);
}

fn read_width_le(buf: &mut &[u8], width: usize) -> Result<u64> {
    Ok(buf.read_uint::<LittleEndian>(width)?)
}

// --- Byte / Char / Short -------------------------------------------------

fn encode_byte(buf: &mut Vec<u8>, v: i8) {
    match v {
        -1 => buf.push(tag::BYTE_M1),
        0 => buf.push(tag::BYTE_0),
        1 => buf.push(tag::BYTE_1),
        _ => {
            buf.push(tag::BYTE);
            buf.write_i8(v).expect("Vec<u8> write is infallible");
        }
    }
}

fn encode_char(buf: &mut Vec<u8>, v: u16) {
    match v {
        0 => buf.push(tag::CHAR_0),
        1 => buf.push(tag::CHAR_1),
        2..=255 => {
            buf.push(tag::CHAR_255);
            buf.push(v as u8);
        }
        _ => {
            buf.push(tag::CHAR);
            io::write_u16(buf, v);
        }
    }
}

fn encode_short(buf: &mut Vec<u8>, v: i16) {
    match v {
        -1 => buf.push(tag::SHORT_M1),
        0 => buf.push(tag::SHORT_0),
        1 => buf.push(tag::SHORT_1),
        2..=254 => {
            buf.push(tag::SHORT_255);
            buf.push(v as u8);
        }
        -254..=-2 => {
            buf.push(tag::SHORT_M255);
            buf.push((-v) as u8);
        }
        _ => {
            buf.push(tag::SHORT);
            buf.write_i16::<byteorder::BigEndian>(v)
                .expect("Vec<u8> write is infallible");
        }
    }
}

// --- Float / Double --------------------------------------------------
//
// A compact tag is only used when reconstructing the float from the
// integer candidate reproduces the exact original bit pattern — this is
// what keeps `-0.0`, `NaN`, and the infinities out of the compact forms
// without special-casing them by hand (none of them round-trip through
// an integer cast back to the same bits).

fn encode_float(buf: &mut Vec<u8>, v: f32) {
    if v.to_bits() == (-1.0f32).to_bits() {
        buf.push(tag::FLOAT_M1);
    } else if v.to_bits() == 0.0f32.to_bits() {
        buf.push(tag::FLOAT_0);
    } else if v.to_bits() == 1.0f32.to_bits() {
        buf.push(tag::FLOAT_1);
    } else if let Some(b) = exact_u8(v) {
        buf.push(tag::FLOAT_255);
        buf.push(b);
    } else if let Some(s) = exact_i16(v) {
        buf.push(tag::FLOAT_SHORT);
        buf.write_i16::<byteorder::BigEndian>(s)
            .expect("Vec<u8> write is infallible");
    } else {
        buf.push(tag::FLOAT);
        io::write_f32(buf, v);
    }
}

fn exact_u8(v: f32) -> Option<u8> {
    if !(0.0..=255.0).contains(&v) {
        return None;
    }
    let candidate = v as u32 as u8;
    if (candidate as f32).to_bits() == v.to_bits() {
        Some(candidate)
    } else {
        None
    }
}

fn exact_i16(v: f32) -> Option<i16> {
    if !(i16::MIN as f32..=i16::MAX as f32).contains(&v) {
        return None;
    }
    let candidate = v as i32 as i16;
    if (candidate as f32).to_bits() == v.to_bits() {
        Some(candidate)
    } else {
        None
    }
}

fn encode_double(buf: &mut Vec<u8>, v: f64) {
    if v.to_bits() == (-1.0f64).to_bits() {
        buf.push(tag::DOUBLE_M1);
    } else if v.to_bits() == 0.0f64.to_bits() {
        buf.push(tag::DOUBLE_0);
    } else if v.to_bits() == 1.0f64.to_bits() {
        buf.push(tag::DOUBLE_1);
    } else if let Some(b) = exact_u8_f64(v) {
        buf.push(tag::DOUBLE_255);
        buf.push(b);
    } else if let Some(s) = exact_i16_f64(v) {
        buf.push(tag::DOUBLE_SHORT);
        buf.write_i16::<byteorder::BigEndian>(s)
            .expect("Vec<u8> write is infallible");
    } else if let Some(i) = exact_i32_f64(v) {
        buf.push(tag::DOUBLE_INT);
        io::write_i32(buf, i);
    } else {
        buf.push(tag::DOUBLE);
        io::write_f64(buf, v);
    }
}

fn exact_u8_f64(v: f64) -> Option<u8> {
    if !(0.0..=255.0).contains(&v) {
        return None;
    }
    let candidate = v as u32 as u8;
    if (candidate as f64).to_bits() == v.to_bits() {
        Some(candidate)
    } else {
        None
    }
}

fn exact_i16_f64(v: f64) -> Option<i16> {
    if !(i16::MIN as f64..=i16::MAX as f64).contains(&v) {
        return None;
    }
    let candidate = v as i32 as i16;
    if (candidate as f64).to_bits() == v.to_bits() {
        Some(candidate)
    } else {
        None
    }
}

fn exact_i32_f64(v: f64) -> Option<i32> {
    if !(i32::MIN as f64..=i32::MAX as f64).contains(&v) {
        return None;
    }
    let candidate = v as i64 as i32;
    if (candidate as f64).to_bits() == v.to_bits() {
        Some(candidate)
    } else {
        None
    }
}

// --- BigInt / BigDecimal ------------------------------------------------

fn encode_bigint(buf: &mut Vec<u8>, v: &BigInt) {
    buf.push(tag::BIGINTEGER);
    write_bigint_body(buf, v);
}

fn write_bigint_body(buf: &mut Vec<u8>, v: &BigInt) {
    let bytes = v.to_signed_bytes_be();
    io::write_packed_u32(buf, bytes.len() as u32);
    buf.extend_from_slice(&bytes);
}

fn decode_bigint(buf: &mut &[u8]) -> Result<BigInt> {
    let len = io::read_packed_u32(buf)? as usize;
    let bytes = io::read_fully(buf, len)?;
    Ok(BigInt::from_signed_bytes_be(bytes))
}

fn encode_bigdecimal(buf: &mut Vec<u8>, v: &BigDecimal) {
    buf.push(tag::BIGDECIMAL);
    let (unscaled, scale) = v.as_bigint_and_exponent();
    write_bigint_body(buf, &unscaled);
    let scale = i32::try_from(scale).unwrap_or(if scale > 0 { i32::MAX } else { i32::MIN });
    io::write_packed_i32(buf, scale);
}

fn decode_bigdecimal(buf: &mut &[u8]) -> Result<BigDecimal> {
    let unscaled = decode_bigint(buf)?;
    let scale = io::read_packed_i32(buf)?;
    Ok(BigDecimal::new(unscaled, scale as i64))
}

// --- Class / String ------------------------------------------------------

/// Class tokens carry a qualified name as a length-prefixed UTF-8 string —
/// a simpler shape than [`Value::Str`]'s per-code-unit packing, since a
/// class name is always valid text, never an arbitrary code-unit sequence.
fn encode_class(buf: &mut Vec<u8>, name: &str) {
    buf.push(tag::CLASS);
    let bytes = name.as_bytes();
    io::write_packed_u32(buf, bytes.len() as u32);
    buf.extend_from_slice(bytes);
}

fn decode_class(buf: &mut &[u8]) -> Result<Rc<str>> {
    let len = io::read_packed_u32(buf)? as usize;
    let bytes = io::read_fully(buf, len)?;
    let s = std::str::from_utf8(bytes)
        .map_err(|_| Error::Corrupt("class token is not valid UTF-8".into()))?;
    Ok(Rc::from(s))
}

/// Strings are modeled as a sequence of 16-bit code units (spec.md §3),
/// written unit-by-unit rather than as raw UTF-8 — this is what lets the
/// wire form carry any valid Unicode string exactly, independent of how
/// many UTF-8 bytes it takes. Only well-formed UTF-16 is supported; a
/// Rust `&str` can never produce anything else.
fn encode_string(buf: &mut Vec<u8>, s: &str) {
    let units: Vec<u16> = s.encode_utf16().collect();
    if units.is_empty() {
        buf.push(tag::STRING_0);
        return;
    }
    if let Some(t) = tag::string_inline_tag(units.len()) {
        buf.push(t);
    } else {
        buf.push(tag::STRING);
        io::write_packed_u32(buf, units.len() as u32);
    }
    for unit in units {
        io::write_packed_u32(buf, unit as u32);
    }
}

fn decode_string(t: u8, buf: &mut &[u8]) -> Result<Value> {
    let len = if t == tag::STRING {
        io::read_packed_u32(buf)? as usize
    } else {
        tag::string_inline_len(t).expect("caller already matched an inline STRING tag")
    };
    let mut units = Vec::with_capacity(len);
    for _ in 0..len {
        units.push(io::read_packed_u32(buf)? as u16);
    }
    let s = String::from_utf16(&units)
        .map_err(|_| Error::Corrupt("string is not well-formed UTF-16".into()))?;
    Ok(Value::str(s))
}
