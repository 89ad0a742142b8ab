//! Codec error types.
//!
use std::fmt;

/// A codec `Result`, normally returning a codec [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A codec error. Encompasses any issue that can happen while encoding or
/// decoding a value.
#[derive(Debug)]
pub enum Error {
    /// The tag byte (or a length/back-reference index derived from it) did
    /// not describe a legal value: the poison tag `0x00`, an unrecognized
    /// tag, the `JAVA_SERIALIZATION` sentinel, a malformed packed integer,
    /// or an `OBJECT_STACK` index that fell outside the current reference
    /// tracker.
    Corrupt(String),
    /// The input ended in the middle of a value.
    UnexpectedEnd,
    /// A value was handed to the encoder that has no representation in the
    /// codec's universe, and no extension handler claimed it.
    Unserializable(String),
    /// A tag byte the core does not recognize, and no extension handler
    /// claimed it.
    UnknownTag(u8),
    /// The `POJO` tag was encountered but no field-reflective extension
    /// handler is installed.
    Unsupported(&'static str),
    /// Propagated failure from the underlying byte I/O.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Corrupt(msg) => write!(f, "corrupt stream: {}", msg),
            Error::UnexpectedEnd => write!(f, "input ended before value was complete"),
            Error::Unserializable(msg) => write!(f, "value cannot be encoded: {}", msg),
            Error::UnknownTag(tag) => write!(f, "unrecognized tag byte 0x{:02x}", tag),
            Error::Unsupported(what) => write!(f, "unsupported: {}", what),
            Error::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        // A short read surfaces from byteorder/std::io as `UnexpectedEof`;
        // every other I/O failure is wrapped verbatim.
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::UnexpectedEnd
        } else {
            Error::Io(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_mention_kind() {
        assert!(format!("{}", Error::UnexpectedEnd).contains("ended"));
        assert!(format!("{}", Error::UnknownTag(0xab)).contains("ab"));
        assert!(format!("{}", Error::Corrupt("poison tag".into())).contains("poison tag"));
    }

    #[test]
    fn short_read_becomes_unexpected_end() {
        let io_err = std::io::Error::from(std::io::ErrorKind::UnexpectedEof);
        assert!(matches!(Error::from(io_err), Error::UnexpectedEnd));
    }
}
