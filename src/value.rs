//! The data model (§3): the closed universe `U` of logical values this
//! codec knows how to encode and decode.
//!
//! Composite shapes (lists, sets, maps, tuples, general object arrays) are
//! `Rc<RefCell<_>>`-backed so that two constructed `Value`s can share the
//! same underlying storage — which is how back-references (C8) and cyclic
//! graphs are represented after a round trip, and how the encoder detects
//! that sharing in the first place (via `Rc::ptr_eq`).

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;

/// Which flavor of ordered list a [`Value::List`] represents. Both encode
/// identically element-for-element; the distinction only affects which tag
/// is chosen and, for `LinkedList`, that insertion order round-trips
/// (both do, in this in-memory model — the distinction matters to a real
/// host because its two list implementations have different mutation
/// costs, not different iteration order).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListKind {
    ArrayList,
    LinkedList,
}

/// Which flavor of set a [`Value::Set`] represents.
#[derive(Clone, Debug, PartialEq)]
pub enum SetKind {
    Hash,
    Linked,
    /// Tree set, with an optional serialized comparator. `None` means
    /// natural ordering.
    Tree(Option<Box<Value>>),
}

/// Which flavor of map a [`Value::Map`] represents.
#[derive(Clone, Debug, PartialEq)]
pub enum MapKind {
    Hash,
    Linked,
    Tree(Option<Box<Value>>),
    /// A string-to-string `Properties` map.
    Properties,
}

pub type ListBody = Rc<RefCell<Vec<Value>>>;
pub type MapBody = Rc<RefCell<Vec<(Value, Value)>>>;

/// An object array: a heterogenous, shared-storage sequence of `Value`
/// carrying a component-type class token (C6).
#[derive(Clone, Debug)]
pub struct ObjectArray {
    pub component_type: Rc<str>,
    pub elements: Rc<RefCell<Vec<Value>>>,
}

/// The closed universe of values this codec knows how to represent
/// (spec.md §3).
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Byte(i8),
    Short(i16),
    /// A 16-bit Unicode code unit, distinct from a plain integer.
    Char(u16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    BigInt(BigInt),
    BigDecimal(BigDecimal),
    /// A finite sequence of 16-bit code units. Not necessarily valid UTF-16
    /// (unpaired surrogates round-trip, since length is a code-unit count
    /// and the wire payload is unit-by-unit, not UTF-8).
    Str(Rc<str>),
    /// Milliseconds since the fixed epoch.
    Instant(i64),
    Uuid(uuid::Uuid),
    /// An opaque class/component-type token (a fully-qualified name is
    /// sufficient).
    Class(Rc<str>),

    ByteArray(Rc<[u8]>),
    BooleanArray(Rc<[bool]>),
    ShortArray(Rc<[i16]>),
    CharArray(Rc<[u16]>),
    FloatArray(Rc<[f32]>),
    DoubleArray(Rc<[f64]>),
    IntArray(Rc<[i32]>),
    LongArray(Rc<[i64]>),

    ObjectArray(ObjectArray),

    List(ListKind, ListBody),
    Set(SetKind, ListBody),
    Map(MapKind, MapBody),

    Tuple2(Rc<RefCell<(Value, Value)>>),
    Tuple3(Rc<RefCell<(Value, Value, Value)>>),
    Tuple4(Rc<RefCell<(Value, Value, Value, Value)>>),

    /// A well-known library singleton, encoded by sub-id (C7).
    Singleton(crate::registry::SingletonId),
}

impl Value {
    pub fn str(s: impl Into<Rc<str>>) -> Value {
        Value::Str(s.into())
    }

    pub fn class(name: impl Into<Rc<str>>) -> Value {
        Value::Class(name.into())
    }

    pub fn list(kind: ListKind, items: Vec<Value>) -> Value {
        Value::List(kind, Rc::new(RefCell::new(items)))
    }

    pub fn set(kind: SetKind, items: Vec<Value>) -> Value {
        Value::Set(kind, Rc::new(RefCell::new(items)))
    }

    pub fn map(kind: MapKind, entries: Vec<(Value, Value)>) -> Value {
        Value::Map(kind, Rc::new(RefCell::new(entries)))
    }

    pub fn tuple2(a: Value, b: Value) -> Value {
        Value::Tuple2(Rc::new(RefCell::new((a, b))))
    }

    pub fn tuple3(a: Value, b: Value, c: Value) -> Value {
        Value::Tuple3(Rc::new(RefCell::new((a, b, c))))
    }

    pub fn tuple4(a: Value, b: Value, c: Value, d: Value) -> Value {
        Value::Tuple4(Rc::new(RefCell::new((a, b, c, d))))
    }

    pub fn object_array(component_type: impl Into<Rc<str>>, elements: Vec<Value>) -> Value {
        Value::ObjectArray(ObjectArray {
            component_type: component_type.into(),
            elements: Rc::new(RefCell::new(elements)),
        })
    }

    /// Human-readable shape name, used in error messages.
    pub fn shape_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Byte(_) => "Byte",
            Value::Short(_) => "Short",
            Value::Char(_) => "Char",
            Value::Int(_) => "Int",
            Value::Long(_) => "Long",
            Value::Float(_) => "Float",
            Value::Double(_) => "Double",
            Value::BigInt(_) => "BigInt",
            Value::BigDecimal(_) => "BigDecimal",
            Value::Str(_) => "Str",
            Value::Instant(_) => "Instant",
            Value::Uuid(_) => "Uuid",
            Value::Class(_) => "Class",
            Value::ByteArray(_) => "ByteArray",
            Value::BooleanArray(_) => "BooleanArray",
            Value::ShortArray(_) => "ShortArray",
            Value::CharArray(_) => "CharArray",
            Value::FloatArray(_) => "FloatArray",
            Value::DoubleArray(_) => "DoubleArray",
            Value::IntArray(_) => "IntArray",
            Value::LongArray(_) => "LongArray",
            Value::ObjectArray(_) => "ObjectArray",
            Value::List(..) => "List",
            Value::Set(..) => "Set",
            Value::Map(..) => "Map",
            Value::Tuple2(_) => "Tuple2",
            Value::Tuple3(_) => "Tuple3",
            Value::Tuple4(_) => "Tuple4",
            Value::Singleton(_) => "Singleton",
        }
    }

    /// Returns a stable identity pointer for the composite shapes that
    /// participate in back-reference tracking (C8). Scalars and primitive
    /// arrays return `None`: the reference tracker may skip them (spec.md
    /// §4.8).
    pub(crate) fn identity(&self) -> Option<*const ()> {
        match self {
            Value::ObjectArray(o) => Some(Rc::as_ptr(&o.elements) as *const ()),
            Value::List(_, body) | Value::Set(_, body) => Some(Rc::as_ptr(body) as *const ()),
            Value::Map(_, body) => Some(Rc::as_ptr(body) as *const ()),
            Value::Tuple2(body) => Some(Rc::as_ptr(body) as *const ()),
            Value::Tuple3(body) => Some(Rc::as_ptr(body) as *const ()),
            Value::Tuple4(body) => Some(Rc::as_ptr(body) as *const ()),
            _ => None,
        }
    }
}

thread_local! {
    /// Identity pointers of composite values currently being formatted,
    /// further up the call stack. Guards `Debug` the same way `value_eq`'s
    /// `seen` stack guards equality: a cyclic or shared graph must be able
    /// to print without recursing forever.
    static DEBUG_VISITING: RefCell<Vec<*const ()>> = RefCell::new(Vec::new());
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Value::*;
        if let Some(id) = self.identity() {
            let already_visiting = DEBUG_VISITING.with(|v| v.borrow().contains(&id));
            if already_visiting {
                return write!(f, "{}(<cycle>)", self.shape_name());
            }
            DEBUG_VISITING.with(|v| v.borrow_mut().push(id));
            let result = self.fmt_composite(f);
            DEBUG_VISITING.with(|v| v.borrow_mut().pop());
            return result;
        }
        match self {
            Null => write!(f, "Null"),
            Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            Byte(v) => f.debug_tuple("Byte").field(v).finish(),
            Short(v) => f.debug_tuple("Short").field(v).finish(),
            Char(v) => f.debug_tuple("Char").field(v).finish(),
            Int(v) => f.debug_tuple("Int").field(v).finish(),
            Long(v) => f.debug_tuple("Long").field(v).finish(),
            Float(v) => f.debug_tuple("Float").field(v).finish(),
            Double(v) => f.debug_tuple("Double").field(v).finish(),
            BigInt(v) => f.debug_tuple("BigInt").field(v).finish(),
            BigDecimal(v) => f.debug_tuple("BigDecimal").field(v).finish(),
            Str(v) => f.debug_tuple("Str").field(v).finish(),
            Instant(v) => f.debug_tuple("Instant").field(v).finish(),
            Uuid(v) => f.debug_tuple("Uuid").field(v).finish(),
            Class(v) => f.debug_tuple("Class").field(v).finish(),
            ByteArray(v) => f.debug_tuple("ByteArray").field(v).finish(),
            BooleanArray(v) => f.debug_tuple("BooleanArray").field(v).finish(),
            ShortArray(v) => f.debug_tuple("ShortArray").field(v).finish(),
            CharArray(v) => f.debug_tuple("CharArray").field(v).finish(),
            FloatArray(v) => f.debug_tuple("FloatArray").field(v).finish(),
            DoubleArray(v) => f.debug_tuple("DoubleArray").field(v).finish(),
            IntArray(v) => f.debug_tuple("IntArray").field(v).finish(),
            LongArray(v) => f.debug_tuple("LongArray").field(v).finish(),
            Singleton(v) => f.debug_tuple("Singleton").field(v).finish(),
            // Composite shapes always have an identity and are handled above.
            ObjectArray(_) | List(..) | Set(..) | Map(..) | Tuple2(_) | Tuple3(_) | Tuple4(_) => {
                unreachable!("composite Value shapes always return Some from identity()")
            }
        }
    }
}

impl Value {
    /// Formats a composite shape's contents. Only called from `Debug::fmt`
    /// after the cycle guard has already admitted this value's identity.
    fn fmt_composite(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::ObjectArray(o) => f
                .debug_struct("ObjectArray")
                .field("component_type", &o.component_type)
                .field("elements", &*o.elements.borrow())
                .finish(),
            Value::List(kind, body) => {
                f.debug_tuple("List").field(kind).field(&*body.borrow()).finish()
            }
            Value::Set(kind, body) => {
                f.debug_tuple("Set").field(kind).field(&*body.borrow()).finish()
            }
            Value::Map(kind, body) => {
                f.debug_tuple("Map").field(kind).field(&*body.borrow()).finish()
            }
            Value::Tuple2(body) => f.debug_tuple("Tuple2").field(&*body.borrow()).finish(),
            Value::Tuple3(body) => f.debug_tuple("Tuple3").field(&*body.borrow()).finish(),
            Value::Tuple4(body) => f.debug_tuple("Tuple4").field(&*body.borrow()).finish(),
            _ => unreachable!("fmt_composite is only called for shapes with an identity"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        value_eq(self, other, &mut Vec::new())
    }
}

/// Identity-pointer pair, used to detect a comparison that has already been
/// started further up the call stack (spec.md §4.8/§8 property 2: cyclic
/// graphs must round-trip, which means they must also be comparable).
type SeenPairs = Vec<(*const (), *const ())>;

/// Structural equality for `Value`, threading a stack of in-progress
/// composite-pair comparisons so that cyclic and shared-reference graphs
/// terminate instead of recursing forever.
///
/// Composite shapes (`List`/`Set`/`Map`/`Tuple*`/`ObjectArray`) are
/// identity-checked before their contents are walked: the same underlying
/// `Rc` compares equal to itself without descending at all, and a pair
/// already in `seen` — meaning a cycle has closed back on a comparison
/// already in flight — is assumed equal rather than re-entered.
fn value_eq(a: &Value, b: &Value, seen: &mut SeenPairs) -> bool {
    use Value::*;
    if let (Some(ia), Some(ib)) = (a.identity(), b.identity()) {
        if ia == ib || seen.contains(&(ia, ib)) {
            return true;
        }
        seen.push((ia, ib));
        let equal = match (a, b) {
            (ObjectArray(x), ObjectArray(y)) => {
                x.component_type == y.component_type
                    && list_eq(&x.elements.borrow(), &y.elements.borrow(), seen)
            }
            (List(ka, x), List(kb, y)) => ka == kb && list_eq(&x.borrow(), &y.borrow(), seen),
            (Set(ka, x), Set(kb, y)) => ka == kb && set_eq(&x.borrow(), &y.borrow(), seen),
            (Map(ka, x), Map(kb, y)) => ka == kb && map_eq(&x.borrow(), &y.borrow(), seen),
            (Tuple2(x), Tuple2(y)) => {
                let (xa, xb) = &*x.borrow();
                let (ya, yb) = &*y.borrow();
                value_eq(xa, ya, seen) && value_eq(xb, yb, seen)
            }
            (Tuple3(x), Tuple3(y)) => {
                let (xa, xb, xc) = &*x.borrow();
                let (ya, yb, yc) = &*y.borrow();
                value_eq(xa, ya, seen) && value_eq(xb, yb, seen) && value_eq(xc, yc, seen)
            }
            (Tuple4(x), Tuple4(y)) => {
                let (xa, xb, xc, xd) = &*x.borrow();
                let (ya, yb, yc, yd) = &*y.borrow();
                value_eq(xa, ya, seen)
                    && value_eq(xb, yb, seen)
                    && value_eq(xc, yc, seen)
                    && value_eq(xd, yd, seen)
            }
            _ => false,
        };
        seen.pop();
        return equal;
    }

    match (a, b) {
        (Null, Null) => true,
        (Bool(x), Bool(y)) => x == y,
        (Byte(x), Byte(y)) => x == y,
        (Short(x), Short(y)) => x == y,
        (Char(x), Char(y)) => x == y,
        (Int(x), Int(y)) => x == y,
        (Long(x), Long(y)) => x == y,
        (Float(x), Float(y)) => x.to_bits() == y.to_bits(),
        (Double(x), Double(y)) => x.to_bits() == y.to_bits(),
        (BigInt(x), BigInt(y)) => x == y,
        (BigDecimal(x), BigDecimal(y)) => x == y,
        (Str(x), Str(y)) => x == y,
        (Instant(x), Instant(y)) => x == y,
        (Uuid(x), Uuid(y)) => x == y,
        (Class(x), Class(y)) => x == y,
        (ByteArray(x), ByteArray(y)) => x == y,
        (BooleanArray(x), BooleanArray(y)) => x == y,
        (ShortArray(x), ShortArray(y)) => x == y,
        (CharArray(x), CharArray(y)) => x == y,
        (FloatArray(x), FloatArray(y)) => {
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(p, q)| p.to_bits() == q.to_bits())
        }
        (DoubleArray(x), DoubleArray(y)) => {
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(p, q)| p.to_bits() == q.to_bits())
        }
        (IntArray(x), IntArray(y)) => x == y,
        (LongArray(x), LongArray(y)) => x == y,
        (Singleton(x), Singleton(y)) => x == y,
        _ => false,
    }
}

fn list_eq(a: &[Value], b: &[Value], seen: &mut SeenPairs) -> bool {
    a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| value_eq(x, y, seen))
}

/// Set equality ignoring order (spec.md §8 property 1: "set equality for
/// unordered sets"). Quadratic, which is fine for the small fixtures this
/// codec is ever handed inside one process.
fn set_eq(a: &[Value], b: &[Value], seen: &mut SeenPairs) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut used = vec![false; b.len()];
    'outer: for x in a {
        for (i, y) in b.iter().enumerate() {
            if !used[i] && value_eq(x, y, seen) {
                used[i] = true;
                continue 'outer;
            }
        }
        return false;
    }
    true
}

fn map_eq(a: &[(Value, Value)], b: &[(Value, Value)], seen: &mut SeenPairs) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut used = vec![false; b.len()];
    'outer: for (ka, va) in a {
        for (i, (kb, vb)) in b.iter().enumerate() {
            if !used[i] && value_eq(ka, kb, seen) && value_eq(va, vb, seen) {
                used[i] = true;
                continue 'outer;
            }
        }
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_equality() {
        assert_eq!(Value::Int(5), Value::Int(5));
        assert_ne!(Value::Int(5), Value::Long(5));
        assert_eq!(Value::str("abc"), Value::str("abc"));
    }

    #[test]
    fn list_equality_is_ordered() {
        let a = Value::list(ListKind::ArrayList, vec![Value::Int(1), Value::Int(2)]);
        let b = Value::list(ListKind::ArrayList, vec![Value::Int(2), Value::Int(1)]);
        assert_ne!(a, b);
    }

    #[test]
    fn set_equality_ignores_order() {
        let a = Value::set(SetKind::Hash, vec![Value::Int(1), Value::Int(2)]);
        let b = Value::set(SetKind::Hash, vec![Value::Int(2), Value::Int(1)]);
        assert_eq!(a, b);
    }

    #[test]
    fn identity_is_shared_for_same_rc() {
        let list = Value::list(ListKind::ArrayList, vec![Value::Int(1)]);
        let clone = list.clone();
        assert_eq!(list.identity(), clone.identity());
        let other = Value::list(ListKind::ArrayList, vec![Value::Int(1)]);
        assert_ne!(list.identity(), other.identity());
    }

    fn self_referential_list() -> Value {
        let body = Rc::new(RefCell::new(Vec::new()));
        let list = Value::List(ListKind::ArrayList, body.clone());
        body.borrow_mut().push(list.clone());
        list
    }

    #[test]
    fn cyclic_value_compares_equal_to_itself_without_overflowing() {
        let list = self_referential_list();
        assert_eq!(list, list.clone());
    }

    #[test]
    fn two_independently_built_cyclic_values_compare_equal() {
        assert_eq!(self_referential_list(), self_referential_list());
    }

    #[test]
    fn cyclic_value_formats_without_overflowing() {
        let list = self_referential_list();
        let formatted = format!("{:?}", list);
        assert!(formatted.contains("<cycle>"));
    }
}
