//! The well-known-singleton registry (C7): a small closed set of
//! identity-compared process-wide helper objects, encoded as
//! `[MAPDB, packUInt(sub_id)]` rather than by value (spec.md §4.7).
//!
//! Grounded in the teacher's pattern of a process-wide, immutable,
//! many-reader-safe table (its crypto `Vault`/key singletons), generalized
//! here to a plain `enum` + exhaustive match rather than a `HashMap`: the
//! registry is closed and small, so a match is both the idiomatic and the
//! fastest dispatch (spec.md §9: "implement as a module-scope immutable
//! table of handle→descriptor pairs; compare by handle, never by
//! structural equality").

use crate::error::{Error, Result};

/// A stable sub-id for one of the fixed well-known singletons (spec.md
/// §4.7). New entries are an additive evolution: existing numbering is
/// never reused or reordered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum SingletonId {
    /// Positive-long B-tree key codec.
    PosLongKeyCodec = 0,
    /// Positive-int B-tree key codec.
    PosIntKeyCodec = 1,
    /// String B-tree key codec.
    StringKeyCodec = 2,
    /// Long scalar codec.
    LongCodec = 3,
    /// Int scalar codec.
    IntCodec = 4,
    /// The codec that always produces/consumes nothing ("empty" codec).
    EmptyCodec = 5,
    /// Strict comparator: rejects null elements.
    ComparableComparator = 6,
    /// Null-permissive comparator.
    ComparableComparatorWithNulls = 7,
    /// A reference to "this codec instance" — used when a container names
    /// its own enclosing codec as a nested serializer.
    ThisSerializer = 8,
    /// Boolean codec.
    BooleanCodec = 9,
    /// Raw byte-array codec.
    ByteArrayCodec = 10,
    /// No-size (length-implicit) string codec.
    StringCodecNoSize = 11,
    /// Basic B-tree key codec, parameterized by the current codec
    /// instance.
    BasicKeyCodec = 12,
    /// Arity-2 tuple key codec. Recursively deserializes its component
    /// comparators and element codecs.
    Tuple2KeyCodec = 13,
    /// Arity-3 tuple key codec.
    Tuple3KeyCodec = 14,
    /// Arity-4 tuple key codec.
    Tuple4KeyCodec = 15,
}

impl SingletonId {
    pub fn sub_id(self) -> u32 {
        self as u32
    }

    pub fn from_sub_id(id: u32) -> Result<SingletonId> {
        use SingletonId::*;
        Ok(match id {
            0 => PosLongKeyCodec,
            1 => PosIntKeyCodec,
            2 => StringKeyCodec,
            3 => LongCodec,
            4 => IntCodec,
            5 => EmptyCodec,
            6 => ComparableComparator,
            7 => ComparableComparatorWithNulls,
            8 => ThisSerializer,
            9 => BooleanCodec,
            10 => ByteArrayCodec,
            11 => StringCodecNoSize,
            12 => BasicKeyCodec,
            13 => Tuple2KeyCodec,
            14 => Tuple3KeyCodec,
            15 => Tuple4KeyCodec,
            other => {
                return Err(Error::Corrupt(format!(
                    "unknown singleton registry sub-id {}",
                    other
                )))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_id_round_trips_through_its_sub_id() {
        let all = [
            SingletonId::PosLongKeyCodec,
            SingletonId::PosIntKeyCodec,
            SingletonId::StringKeyCodec,
            SingletonId::LongCodec,
            SingletonId::IntCodec,
            SingletonId::EmptyCodec,
            SingletonId::ComparableComparator,
            SingletonId::ComparableComparatorWithNulls,
            SingletonId::ThisSerializer,
            SingletonId::BooleanCodec,
            SingletonId::ByteArrayCodec,
            SingletonId::StringCodecNoSize,
            SingletonId::BasicKeyCodec,
            SingletonId::Tuple2KeyCodec,
            SingletonId::Tuple3KeyCodec,
            SingletonId::Tuple4KeyCodec,
        ];
        for id in all {
            assert_eq!(SingletonId::from_sub_id(id.sub_id()).unwrap(), id);
        }
    }

    #[test]
    fn unknown_sub_id_is_corrupt() {
        assert!(SingletonId::from_sub_id(999).is_err());
    }
}
