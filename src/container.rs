//! Container codec (C5): lists, sets, maps, and fixed-arity tuples.
//!
//! Grounded in the teacher's container walkers (the `element.rs`
//! list/map packing loops), generalized to the tag ladder and the
//! tree-comparator / linked-order / packed-long fast-path rules spec.md
//! §4.5 describes. Every element recurses back through
//! [`crate::codec`]'s general dispatcher, sharing the caller's
//! [`RefTracker`] and [`DepthGuard`] budget — containers never walk their
//! own children without going through that shared machinery, since
//! that's what lets identity sharing and cycles survive a round trip.

use crate::codec::{self, DecodeCtx};
use crate::error::{Error, Result};
use crate::io;
use crate::refs::{DepthGuard, RefTracker};
use crate::tag;
use crate::value::{ListKind, MapKind, SetKind, Value};

pub fn write_container(
    buf: &mut Vec<u8>,
    v: &Value,
    tracker: &mut RefTracker,
    depth: &mut u32,
) -> Result<bool> {
    let _guard = DepthGuard::enter(depth)?;
    match v {
        Value::List(ListKind::ArrayList, body) if fast_path_eligible(&body.borrow()) => {
            let items = body.borrow();
            buf.push(tag::ARRAYLIST_PACKED_LONG);
            buf.push(items.len() as u8);
            for item in items.iter() {
                write_packed_long_slot(buf, item);
            }
        }
        Value::List(kind, body) => {
            buf.push(match kind {
                ListKind::ArrayList => tag::ARRAYLIST,
                ListKind::LinkedList => tag::LINKEDLIST,
            });
            let items = body.borrow();
            io::write_packed_u32(buf, items.len() as u32);
            for item in items.iter() {
                codec::encode_value(buf, item, tracker, depth)?;
            }
        }
        Value::Set(kind, body) => {
            buf.push(match kind {
                SetKind::Hash => tag::HASHSET,
                SetKind::Linked => tag::LINKEDHASHSET,
                SetKind::Tree(_) => tag::TREESET,
            });
            let items = body.borrow();
            io::write_packed_u32(buf, items.len() as u32);
            if let SetKind::Tree(cmp) = kind {
                write_comparator(buf, cmp, tracker, depth)?;
            }
            for item in items.iter() {
                codec::encode_value(buf, item, tracker, depth)?;
            }
        }
        Value::Map(kind, body) => {
            buf.push(match kind {
                MapKind::Hash => tag::HASHMAP,
                MapKind::Linked => tag::LINKEDHASHMAP,
                MapKind::Tree(_) => tag::TREEMAP,
                MapKind::Properties => tag::PROPERTIES,
            });
            let entries = body.borrow();
            io::write_packed_u32(buf, entries.len() as u32);
            if let MapKind::Tree(cmp) = kind {
                write_comparator(buf, cmp, tracker, depth)?;
            }
            for (k, val) in entries.iter() {
                codec::encode_value(buf, k, tracker, depth)?;
                codec::encode_value(buf, val, tracker, depth)?;
            }
        }
        Value::Tuple2(fields) => {
            buf.push(tag::TUPLE2);
            let (a, b) = &*fields.borrow();
            codec::encode_value(buf, a, tracker, depth)?;
            codec::encode_value(buf, b, tracker, depth)?;
        }
        Value::Tuple3(fields) => {
            buf.push(tag::TUPLE3);
            let (a, b, c) = &*fields.borrow();
            codec::encode_value(buf, a, tracker, depth)?;
            codec::encode_value(buf, b, tracker, depth)?;
            codec::encode_value(buf, c, tracker, depth)?;
        }
        Value::Tuple4(fields) => {
            buf.push(tag::TUPLE4);
            let (a, b, c, d) = &*fields.borrow();
            codec::encode_value(buf, a, tracker, depth)?;
            codec::encode_value(buf, b, tracker, depth)?;
            codec::encode_value(buf, c, tracker, depth)?;
            codec::encode_value(buf, d, tracker, depth)?;
        }
        _ => return Ok(false),
    }
    Ok(true)
}

pub fn read_container(t: u8, buf: &mut &[u8], ctx: &mut DecodeCtx) -> Result<Option<Value>> {
    let _guard = DepthGuard::enter(&mut ctx.depth)?;
    use crate::tag::*;
    Ok(Some(match t {
        ARRAYLIST_PACKED_LONG => {
            let len = io::read_u8(buf)? as usize;
            let mut items = Vec::with_capacity(len);
            for _ in 0..len {
                items.push(read_packed_long_slot(buf)?);
            }
            let v = Value::list(ListKind::ArrayList, items);
            ctx.tracker.push(v.clone());
            v
        }
        ARRAYLIST | LINKEDLIST => {
            let kind = if t == ARRAYLIST {
                ListKind::ArrayList
            } else {
                ListKind::LinkedList
            };
            let len = io::read_packed_u32(buf)? as usize;
            let body = std::rc::Rc::new(std::cell::RefCell::new(Vec::with_capacity(len)));
            let v = Value::List(kind, body.clone());
            // Registered before the elements are decoded: a self-referential
            // list's own `OBJECT_STACK` element resolves to this same `Rc`.
            ctx.tracker.push(v.clone());
            for _ in 0..len {
                let item = codec::decode_value(buf, ctx)?;
                body.borrow_mut().push(item);
            }
            v
        }
        HASHSET | LINKEDHASHSET | TREESET => {
            let len = io::read_packed_u32(buf)? as usize;
            let cmp = if t == TREESET {
                Some(read_comparator(buf, ctx)?)
            } else {
                None
            };
            let body = std::rc::Rc::new(std::cell::RefCell::new(Vec::with_capacity(len)));
            let kind = match t {
                HASHSET => SetKind::Hash,
                LINKEDHASHSET => SetKind::Linked,
                _ => SetKind::Tree(cmp.flatten().map(Box::new)),
            };
            let v = Value::Set(kind, body.clone());
            ctx.tracker.push(v.clone());
            for _ in 0..len {
                let item = codec::decode_value(buf, ctx)?;
                body.borrow_mut().push(item);
            }
            v
        }
        HASHMAP | LINKEDHASHMAP | TREEMAP | PROPERTIES => {
            let len = io::read_packed_u32(buf)? as usize;
            let cmp = if t == TREEMAP {
                Some(read_comparator(buf, ctx)?)
            } else {
                None
            };
            let body = std::rc::Rc::new(std::cell::RefCell::new(Vec::with_capacity(len)));
            let kind = match t {
                HASHMAP => MapKind::Hash,
                LINKEDHASHMAP => MapKind::Linked,
                PROPERTIES => MapKind::Properties,
                _ => MapKind::Tree(cmp.flatten().map(Box::new)),
            };
            let v = Value::Map(kind, body.clone());
            ctx.tracker.push(v.clone());
            for _ in 0..len {
                let k = codec::decode_value(buf, ctx)?;
                let val = codec::decode_value(buf, ctx)?;
                body.borrow_mut().push((k, val));
            }
            v
        }
        TUPLE2 => {
            let body = std::rc::Rc::new(std::cell::RefCell::new((Value::Null, Value::Null)));
            let v = Value::Tuple2(body.clone());
            ctx.tracker.push(v.clone());
            let a = codec::decode_value(buf, ctx)?;
            body.borrow_mut().0 = a;
            let b = codec::decode_value(buf, ctx)?;
            body.borrow_mut().1 = b;
            v
        }
        TUPLE3 => {
            let body = std::rc::Rc::new(std::cell::RefCell::new((
                Value::Null,
                Value::Null,
                Value::Null,
            )));
            let v = Value::Tuple3(body.clone());
            ctx.tracker.push(v.clone());
            let a = codec::decode_value(buf, ctx)?;
            body.borrow_mut().0 = a;
            let b = codec::decode_value(buf, ctx)?;
            body.borrow_mut().1 = b;
            let c = codec::decode_value(buf, ctx)?;
            body.borrow_mut().2 = c;
            v
        }
        TUPLE4 => {
            let body = std::rc::Rc::new(std::cell::RefCell::new((
                Value::Null,
                Value::Null,
                Value::Null,
                Value::Null,
            )));
            let v = Value::Tuple4(body.clone());
            ctx.tracker.push(v.clone());
            let a = codec::decode_value(buf, ctx)?;
            body.borrow_mut().0 = a;
            let b = codec::decode_value(buf, ctx)?;
            body.borrow_mut().1 = b;
            let c = codec::decode_value(buf, ctx)?;
            body.borrow_mut().2 = c;
            let d = codec::decode_value(buf, ctx)?;
            body.borrow_mut().3 = d;
            v
        }
        TUPLE5 | TUPLE6 | TUPLE7 | TUPLE8 => return Err(Error::UnknownTag(t)),
        _ => return Ok(None),
    }))
}

/// The `ARRAYLIST_PACKED_LONG` fast path (spec.md §4.5): admissible when
/// every element is null or a non-negative long, and the list has fewer
/// than 255 elements.
fn fast_path_eligible(items: &[Value]) -> bool {
    items.len() < 255
        && items.iter().all(|v| match v {
            Value::Null => true,
            Value::Long(n) => *n >= 0,
            _ => false,
        })
}

fn write_packed_long_slot(buf: &mut Vec<u8>, v: &Value) {
    let slot = match v {
        Value::Null => 0,
        Value::Long(n) => (*n as u64) + 1,
        _ => unreachable!("fast_path_eligible already filtered non-null/non-long elements"),
    };
    io::write_packed_u64(buf, slot);
}

fn read_packed_long_slot(buf: &mut &[u8]) -> Result<Value> {
    let slot = io::read_packed_u64(buf)?;
    Ok(if slot == 0 {
        Value::Null
    } else {
        Value::Long((slot - 1) as i64)
    })
}

/// Tree-set/tree-map comparator (spec.md §4.5): written before the
/// elements; `Value::Null` on the wire means "natural ordering".
fn write_comparator(
    buf: &mut Vec<u8>,
    cmp: &Option<Box<Value>>,
    tracker: &mut RefTracker,
    depth: &mut u32,
) -> Result<()> {
    match cmp {
        Some(v) => codec::encode_value(buf, v, tracker, depth),
        None => codec::encode_value(buf, &Value::Null, tracker, depth),
    }
}

fn read_comparator(buf: &mut &[u8], ctx: &mut DecodeCtx) -> Result<Option<Value>> {
    let v = codec::decode_value(buf, ctx)?;
    Ok(if v == Value::Null { None } else { Some(v) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ListKind;

    fn roundtrip(v: Value) {
        let mut buf = Vec::new();
        let mut tracker = RefTracker::new();
        let mut depth = 0;
        assert!(write_container(&mut buf, &v, &mut tracker, &mut depth).unwrap());
        let mut slice = &buf[..];
        let t = io::read_u8(&mut slice).unwrap();
        let mut ctx = DecodeCtx {
            tracker: RefTracker::new(),
            depth: 0,
            handler: None,
        };
        let out = read_container(t, &mut slice, &mut ctx).unwrap().unwrap();
        assert_eq!(out, v);
        assert!(slice.is_empty());
    }

    #[test]
    fn list_set_map_round_trip() {
        roundtrip(Value::list(ListKind::ArrayList, vec![Value::str("a"), Value::Null]));
        roundtrip(Value::list(ListKind::LinkedList, vec![Value::Int(1), Value::Int(2)]));
        roundtrip(Value::set(SetKind::Hash, vec![Value::Int(1), Value::Int(2)]));
        roundtrip(Value::set(SetKind::Tree(None), vec![Value::Int(1), Value::Int(2)]));
        roundtrip(Value::map(
            MapKind::Hash,
            vec![(Value::str("k"), Value::Int(1))],
        ));
        roundtrip(Value::map(MapKind::Tree(None), vec![(Value::Int(1), Value::Int(2))]));
    }

    #[test]
    fn tuples_round_trip() {
        roundtrip(Value::tuple2(Value::str("k"), Value::Long(42)));
        roundtrip(Value::tuple3(Value::Int(1), Value::Int(2), Value::Int(3)));
        roundtrip(Value::tuple4(
            Value::Int(1),
            Value::Int(2),
            Value::Int(3),
            Value::Int(4),
        ));
    }

    #[test]
    fn tuple2_example_matches_spec_vector() {
        let mut buf = Vec::new();
        let mut tracker = RefTracker::new();
        let mut depth = 0;
        write_container(
            &mut buf,
            &Value::tuple2(Value::str("k"), Value::Long(42)),
            &mut tracker,
            &mut depth,
        )
        .unwrap();
        assert_eq!(
            buf,
            vec![tag::TUPLE2, tag::STRING_1, 0x6B, tag::LONG_F1, 0x2A]
        );
    }

    #[test]
    fn packed_long_fast_path_is_chosen_for_eligible_lists() {
        let mut buf = Vec::new();
        let mut tracker = RefTracker::new();
        let mut depth = 0;
        let list = Value::list(ListKind::ArrayList, vec![Value::Long(5), Value::Null]);
        write_container(&mut buf, &list, &mut tracker, &mut depth).unwrap();
        assert_eq!(buf[0], tag::ARRAYLIST_PACKED_LONG);
        roundtrip(list);
    }

    #[test]
    fn ineligible_lists_use_the_general_arraylist_tag() {
        let mut buf = Vec::new();
        let mut tracker = RefTracker::new();
        let mut depth = 0;
        let list = Value::list(ListKind::ArrayList, vec![Value::Long(-1)]);
        write_container(&mut buf, &list, &mut tracker, &mut depth).unwrap();
        assert_eq!(buf[0], tag::ARRAYLIST);
    }
}
