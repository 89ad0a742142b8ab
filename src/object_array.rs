//! Object-array codec (C6): heterogeneous, shared-storage arrays carrying
//! a component-type class token, with three fast paths ahead of the
//! general recursive path (spec.md §4.6).
//!
//! Grounded in the same container-walking shape as [`crate::container`],
//! generalized to carry a component-type token and — for
//! `ARRAY_OBJECT_NO_REFS` — to decode its children without threading the
//! shared [`RefTracker`] through them, per spec.md's note that this tag
//! is reserved for an optimization the host may enable but the core
//! encoder never emits on its own.

use crate::codec::{self, DecodeCtx};
use crate::error::Result;
use crate::io;
use crate::refs::{DepthGuard, RefTracker};
use crate::tag;
use crate::value::{ObjectArray, Value};

pub fn write_object_array(
    buf: &mut Vec<u8>,
    v: &Value,
    tracker: &mut RefTracker,
    depth: &mut u32,
) -> Result<bool> {
    let _guard = DepthGuard::enter(depth)?;
    let Value::ObjectArray(array) = v else {
        return Ok(false);
    };
    let elements = array.elements.borrow();

    if elements.iter().all(|e| *e == Value::Null) {
        buf.push(tag::ARRAY_OBJECT_ALL_NULL);
        io::write_packed_u32(buf, elements.len() as u32);
        write_component_type(buf, &array.component_type);
        return Ok(true);
    }

    if elements.len() <= 255 && elements.iter().all(is_packable_long_slot) {
        buf.push(tag::ARRAY_OBJECT_PACKED_LONG);
        buf.push(elements.len() as u8);
        for e in elements.iter() {
            write_packed_slot(buf, e);
        }
        return Ok(true);
    }

    buf.push(tag::ARRAY_OBJECT);
    io::write_packed_u32(buf, elements.len() as u32);
    write_component_type(buf, &array.component_type);
    for e in elements.iter() {
        codec::encode_value(buf, e, tracker, depth)?;
    }
    Ok(true)
}

pub fn read_object_array(t: u8, buf: &mut &[u8], ctx: &mut DecodeCtx) -> Result<Option<Value>> {
    let _guard = DepthGuard::enter(&mut ctx.depth)?;
    Ok(Some(match t {
        tag::ARRAY_OBJECT_ALL_NULL => {
            let len = io::read_packed_u32(buf)? as usize;
            let component_type = read_component_type(buf)?;
            let v = Value::ObjectArray(ObjectArray {
                component_type: component_type.into(),
                elements: std::rc::Rc::new(std::cell::RefCell::new(vec![Value::Null; len])),
            });
            ctx.tracker.push(v.clone());
            v
        }
        tag::ARRAY_OBJECT_PACKED_LONG => {
            let len = io::read_u8(buf)? as usize;
            let mut elements = Vec::with_capacity(len);
            for _ in 0..len {
                elements.push(read_packed_slot(buf)?);
            }
            let v = Value::object_array("java.lang.Long", elements);
            ctx.tracker.push(v.clone());
            v
        }
        tag::ARRAY_OBJECT_NO_REFS => {
            let len = io::read_packed_u32(buf)? as usize;
            let component_type = read_component_type(buf)?;
            let elements = std::rc::Rc::new(std::cell::RefCell::new(Vec::with_capacity(len)));
            let v = Value::ObjectArray(ObjectArray {
                component_type: component_type.into(),
                elements: elements.clone(),
            });
            ctx.tracker.push(v.clone());
            // Children of a no-refs array skip the shared tracker entirely
            // (spec.md §4.6): they are known to be leaf scalars, so nothing
            // beneath this array can itself need back-reference resolution.
            let mut inner_ctx = DecodeCtx {
                tracker: RefTracker::new(),
                depth: ctx.depth,
                handler: ctx.handler,
            };
            for _ in 0..len {
                let item = codec::decode_value(buf, &mut inner_ctx)?;
                elements.borrow_mut().push(item);
            }
            v
        }
        tag::ARRAY_OBJECT => {
            let len = io::read_packed_u32(buf)? as usize;
            let component_type = read_component_type(buf)?;
            let elements = std::rc::Rc::new(std::cell::RefCell::new(Vec::with_capacity(len)));
            let v = Value::ObjectArray(ObjectArray {
                component_type: component_type.into(),
                elements: elements.clone(),
            });
            ctx.tracker.push(v.clone());
            for _ in 0..len {
                let item = codec::decode_value(buf, ctx)?;
                elements.borrow_mut().push(item);
            }
            v
        }
        _ => return Ok(None),
    }))
}

fn write_component_type(buf: &mut Vec<u8>, name: &str) {
    let bytes = name.as_bytes();
    io::write_packed_u32(buf, bytes.len() as u32);
    buf.extend_from_slice(bytes);
}

fn read_component_type(buf: &mut &[u8]) -> Result<String> {
    let len = io::read_packed_u32(buf)? as usize;
    let bytes = io::read_fully(buf, len)?;
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|_| crate::error::Error::Corrupt("component-type token is not valid UTF-8".into()))
}

fn is_packable_long_slot(v: &Value) -> bool {
    matches!(v, Value::Null) || matches!(v, Value::Long(n) if *n >= 0)
}

fn write_packed_slot(buf: &mut Vec<u8>, v: &Value) {
    let slot = match v {
        Value::Null => 0,
        Value::Long(n) => (*n as u64) + 1,
        _ => unreachable!("is_packable_long_slot already filtered non-null/non-long elements"),
    };
    io::write_packed_u64(buf, slot);
}

fn read_packed_slot(buf: &mut &[u8]) -> Result<Value> {
    let slot = io::read_packed_u64(buf)?;
    Ok(if slot == 0 {
        Value::Null
    } else {
        Value::Long((slot - 1) as i64)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(v: Value) {
        let mut buf = Vec::new();
        let mut tracker = RefTracker::new();
        let mut depth = 0;
        assert!(write_object_array(&mut buf, &v, &mut tracker, &mut depth).unwrap());
        let mut slice = &buf[..];
        let t = io::read_u8(&mut slice).unwrap();
        let mut ctx = DecodeCtx {
            tracker: RefTracker::new(),
            depth: 0,
            handler: None,
        };
        let out = read_object_array(t, &mut slice, &mut ctx).unwrap().unwrap();
        assert_eq!(out, v);
        assert!(slice.is_empty());
    }

    #[test]
    fn all_null_fast_path() {
        let v = Value::object_array("java.lang.Object", vec![Value::Null, Value::Null]);
        let mut buf = Vec::new();
        let mut tracker = RefTracker::new();
        let mut depth = 0;
        write_object_array(&mut buf, &v, &mut tracker, &mut depth).unwrap();
        assert_eq!(buf[0], tag::ARRAY_OBJECT_ALL_NULL);
        roundtrip(v);
    }

    #[test]
    fn packed_long_fast_path() {
        let v = Value::object_array("java.lang.Long", vec![Value::Long(1), Value::Null]);
        let mut buf = Vec::new();
        let mut tracker = RefTracker::new();
        let mut depth = 0;
        write_object_array(&mut buf, &v, &mut tracker, &mut depth).unwrap();
        assert_eq!(buf[0], tag::ARRAY_OBJECT_PACKED_LONG);
        roundtrip(v);
    }

    #[test]
    fn general_path_for_mixed_elements() {
        let v = Value::object_array("java.lang.Object", vec![Value::str("a"), Value::Int(1)]);
        let mut buf = Vec::new();
        let mut tracker = RefTracker::new();
        let mut depth = 0;
        write_object_array(&mut buf, &v, &mut tracker, &mut depth).unwrap();
        assert_eq!(buf[0], tag::ARRAY_OBJECT);
        roundtrip(v);
    }
}
