//! The tag table (C2): a fixed injective mapping from semantic value shape
//! to a single leading byte. Tag `0` is reserved as an uninitialized-memory
//! poison and must never be emitted.

#![allow(non_upper_case_globals, dead_code)]

pub const NULL: u8 = 1;
pub const BOOLEAN_TRUE: u8 = 2;
pub const BOOLEAN_FALSE: u8 = 3;

// --- INT group: literals -9..+16 occupy a contiguous run, then MIN/MAX,
// then the width-adaptive Fx/MFx forms, then a full 4-byte fallback.
pub const INT_M9: u8 = 4; // -9 .. +16 is a 26-value contiguous run
pub const INT_MAX_LIT: u8 = INT_M9 + 25; // 29: the tag for literal value 16
pub const INT_MIN: u8 = INT_M9 + 26; // 30
pub const INT_MAX: u8 = 31;
pub const INT_F1: u8 = 32;
pub const INT_MF1: u8 = 33;
pub const INT_F2: u8 = 34;
pub const INT_MF2: u8 = 35;
pub const INT_F3: u8 = 36;
pub const INT_MF3: u8 = 37;
pub const INT: u8 = 38;

/// Returns the literal INT tag for `v` if `v` is in `-9..=16`.
pub fn int_literal_tag(v: i32) -> Option<u8> {
    if (-9..=16).contains(&v) {
        Some((INT_M9 as i32 + (v + 9)) as u8)
    } else {
        None
    }
}

/// Inverse of [`int_literal_tag`]: recovers the literal value from a tag in
/// the INT literal run.
pub fn int_literal_value(tag: u8) -> Option<i32> {
    if (INT_M9..=INT_MAX_LIT).contains(&tag) {
        Some(tag as i32 - INT_M9 as i32 - 9)
    } else {
        None
    }
}

// --- LONG group: same shape as INT, one-to-one.
pub const LONG_M9: u8 = 39;
pub const LONG_MAX_LIT: u8 = 64;
pub const LONG_MIN: u8 = LONG_M9 + 26; // 65
pub const LONG_MAX: u8 = 66;
pub const LONG_F1: u8 = 67;
pub const LONG_MF1: u8 = 68;
pub const LONG_F2: u8 = 69;
pub const LONG_MF2: u8 = 70;
pub const LONG_F3: u8 = 71;
pub const LONG_MF3: u8 = 72;
pub const LONG_F4: u8 = 73;
pub const LONG_MF4: u8 = 74;
pub const LONG_F5: u8 = 75;
pub const LONG_MF5: u8 = 76;
pub const LONG_F6: u8 = 77;
pub const LONG_MF6: u8 = 78;
pub const LONG_F7: u8 = 79;
pub const LONG_MF7: u8 = 80;
pub const LONG: u8 = 81;

pub fn long_literal_tag(v: i64) -> Option<u8> {
    if (-9..=16).contains(&v) {
        Some((LONG_M9 as i64 + (v + 9)) as u8)
    } else {
        None
    }
}

pub fn long_literal_value(tag: u8) -> Option<i64> {
    if (LONG_M9..=LONG_MAX_LIT).contains(&tag) {
        Some(tag as i64 - LONG_M9 as i64 - 9)
    } else {
        None
    }
}

pub const BYTE_M1: u8 = 82;
pub const BYTE_0: u8 = 83;
pub const BYTE_1: u8 = 84;
pub const BYTE: u8 = 85;

pub const CHAR_0: u8 = 86;
pub const CHAR_1: u8 = 87;
pub const CHAR_255: u8 = 88;
pub const CHAR: u8 = 89;

pub const SHORT_M1: u8 = 90;
pub const SHORT_0: u8 = 91;
pub const SHORT_1: u8 = 92;
pub const SHORT_255: u8 = 93;
pub const SHORT_M255: u8 = 94;
pub const SHORT: u8 = 95;

pub const FLOAT_M1: u8 = 96;
pub const FLOAT_0: u8 = 97;
pub const FLOAT_1: u8 = 98;
pub const FLOAT_255: u8 = 99;
pub const FLOAT_SHORT: u8 = 100;
pub const FLOAT: u8 = 101;

pub const DOUBLE_M1: u8 = 102;
pub const DOUBLE_0: u8 = 103;
pub const DOUBLE_1: u8 = 104;
pub const DOUBLE_255: u8 = 105;
pub const DOUBLE_SHORT: u8 = 106;
pub const DOUBLE_INT: u8 = 107;
pub const DOUBLE: u8 = 108;

pub const ARRAY_BYTE: u8 = 109;
pub const ARRAY_BYTE_ALL_EQUAL: u8 = 110;
pub const ARRAY_BOOLEAN: u8 = 111;
pub const ARRAY_SHORT: u8 = 112;
pub const ARRAY_CHAR: u8 = 113;
pub const ARRAY_FLOAT: u8 = 114;
pub const ARRAY_DOUBLE: u8 = 115;
pub const ARRAY_INT_BYTE: u8 = 116;
pub const ARRAY_INT_SHORT: u8 = 117;
pub const ARRAY_INT_PACKED: u8 = 118;
pub const ARRAY_INT: u8 = 119;
pub const ARRAY_LONG_BYTE: u8 = 120;
pub const ARRAY_LONG_SHORT: u8 = 121;
pub const ARRAY_LONG_PACKED: u8 = 122;
pub const ARRAY_LONG_INT: u8 = 123;
pub const ARRAY_LONG: u8 = 124;

pub const STRING_0: u8 = 125;
// STRING_1 .. STRING_10 occupy a contiguous run of 10 tags.
pub const STRING_1: u8 = 126;
pub const STRING_10: u8 = 135;
pub const STRING: u8 = 136;

/// Returns the inline-length STRING tag for strings of `len` code units
/// (`1..=10`).
pub fn string_inline_tag(len: usize) -> Option<u8> {
    if (1..=10).contains(&len) {
        Some(STRING_1 + (len as u8 - 1))
    } else {
        None
    }
}

pub fn string_inline_len(tag: u8) -> Option<usize> {
    if (STRING_1..=STRING_10).contains(&tag) {
        Some((tag - STRING_1) as usize + 1)
    } else {
        None
    }
}

pub const BIGINTEGER: u8 = 137;
pub const BIGDECIMAL: u8 = 138;
pub const CLASS: u8 = 139;
pub const DATE: u8 = 140;
pub const FUN_HI: u8 = 141;
pub const UUID: u8 = 142;

/// Reserved: `[MAPDB, packUInt(sub_id)]` — the well-known-singleton
/// registry (C7).
pub const MAPDB: u8 = 143;

pub const TUPLE2: u8 = 144;
pub const TUPLE3: u8 = 145;
pub const TUPLE4: u8 = 146;
// TUPLE5..8 reserved, unassigned.
pub const TUPLE5: u8 = 147;
pub const TUPLE6: u8 = 148;
pub const TUPLE7: u8 = 149;
pub const TUPLE8: u8 = 150;

pub const ARRAY_OBJECT: u8 = 151;
pub const ARRAY_OBJECT_PACKED_LONG: u8 = 152;
pub const ARRAY_OBJECT_ALL_NULL: u8 = 153;
pub const ARRAY_OBJECT_NO_REFS: u8 = 154;

pub const ARRAYLIST: u8 = 155;
pub const ARRAYLIST_PACKED_LONG: u8 = 156;
pub const LINKEDLIST: u8 = 157;
pub const TREEMAP: u8 = 158;
pub const HASHMAP: u8 = 159;
pub const LINKEDHASHMAP: u8 = 160;
pub const TREESET: u8 = 161;
pub const HASHSET: u8 = 162;
pub const LINKEDHASHSET: u8 = 163;
pub const PROPERTIES: u8 = 164;

/// Hard-fail sentinel: an alien serialization framework's header. Decoding
/// this tag is always `Error::Corrupt`.
pub const JAVA_SERIALIZATION: u8 = 165;

/// External extension hook. Routed to `UnknownValueHandler::read_unknown`;
/// `Error::Unsupported` if none is installed.
pub const POJO: u8 = 166;

/// Back-reference: payload is `packUInt(index)` into the current
/// reference tracker (C8).
pub const OBJECT_STACK: u8 = 167;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    /// Exhaustive injectivity check (spec.md §3, §8 property 3): every
    /// named constant must occupy a distinct byte, and none may be 0.
    #[test]
    fn tags_are_distinct_and_nonzero() {
        let tags = [
            NULL, BOOLEAN_TRUE, BOOLEAN_FALSE, INT_MIN, INT_MAX, INT_F1, INT_MF1, INT_F2,
            INT_MF2, INT_F3, INT_MF3, INT, LONG_MIN, LONG_MAX, LONG_F1, LONG_MF1, LONG_F2,
            LONG_MF2, LONG_F3, LONG_MF3, LONG_F4, LONG_MF4, LONG_F5, LONG_MF5, LONG_F6,
            LONG_MF6, LONG_F7, LONG_MF7, LONG, BYTE_M1, BYTE_0, BYTE_1, BYTE, CHAR_0, CHAR_1,
            CHAR_255, CHAR, SHORT_M1, SHORT_0, SHORT_1, SHORT_255, SHORT_M255, SHORT,
            FLOAT_M1, FLOAT_0, FLOAT_1, FLOAT_255, FLOAT_SHORT, FLOAT, DOUBLE_M1, DOUBLE_0,
            DOUBLE_1, DOUBLE_255, DOUBLE_SHORT, DOUBLE_INT, DOUBLE, ARRAY_BYTE,
            ARRAY_BYTE_ALL_EQUAL, ARRAY_BOOLEAN, ARRAY_SHORT, ARRAY_CHAR, ARRAY_FLOAT,
            ARRAY_DOUBLE, ARRAY_INT_BYTE, ARRAY_INT_SHORT, ARRAY_INT_PACKED, ARRAY_INT,
            ARRAY_LONG_BYTE, ARRAY_LONG_SHORT, ARRAY_LONG_PACKED, ARRAY_LONG_INT, ARRAY_LONG,
            STRING_0, STRING, BIGINTEGER, BIGDECIMAL, CLASS, DATE, FUN_HI, UUID, MAPDB,
            TUPLE2, TUPLE3, TUPLE4, TUPLE5, TUPLE6, TUPLE7, TUPLE8, ARRAY_OBJECT,
            ARRAY_OBJECT_PACKED_LONG, ARRAY_OBJECT_ALL_NULL, ARRAY_OBJECT_NO_REFS, ARRAYLIST,
            ARRAYLIST_PACKED_LONG, LINKEDLIST, TREEMAP, HASHMAP, LINKEDHASHMAP, TREESET,
            HASHSET, LINKEDHASHSET, PROPERTIES, JAVA_SERIALIZATION, POJO, OBJECT_STACK,
        ];
        let mut seen = HashSet::new();
        for t in tags.iter().chain((STRING_1..=STRING_10).collect::<Vec<_>>().iter()) {
            assert_ne!(*t, 0, "tag 0 is poison and must never be assigned");
            assert!(seen.insert(*t), "duplicate tag byte {}", t);
        }
    }

    #[test]
    fn int_literal_round_trips() {
        for v in -9..=16 {
            let tag = int_literal_tag(v).unwrap();
            assert_eq!(int_literal_value(tag), Some(v));
        }
        assert_eq!(int_literal_tag(17), None);
        assert_eq!(int_literal_tag(-10), None);
    }

    #[test]
    fn string_inline_round_trips() {
        for len in 1..=10 {
            let tag = string_inline_tag(len).unwrap();
            assert_eq!(string_inline_len(tag), Some(len));
        }
        assert_eq!(string_inline_tag(0), None);
        assert_eq!(string_inline_tag(11), None);
    }
}
