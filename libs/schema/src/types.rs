//! Primitive type catalog.
//!
//! Every primitive has an exact, fixed byte width; there is no pointer,
//! variant or "any" primitive, and no type carries implementation-defined
//! padding — packing is always byte-tight. Fixed character buffers
//! (`char[N]`) are the one type that needs special per-target treatment in
//! the emitters (fixed array vs. format string vs. `char[N]`); that exception
//! is documented here rather than inferred.

/// A fixed-width primitive type as declared in the schema source.
///
/// `CharBuf` is the element type of a fixed character buffer; the buffer
/// length lives on the member as its repeat count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    CharBuf,
}

impl PrimitiveType {
    /// Exact serialized width of one element, in bytes.
    pub const fn width(self) -> usize {
        match self {
            Self::I8 | Self::U8 | Self::CharBuf => 1,
            Self::I16 | Self::U16 => 2,
            Self::I32 | Self::U32 | Self::F32 => 4,
            Self::I64 | Self::U64 | Self::F64 => 8,
        }
    }

    /// Codec symbol used in compact format descriptors.
    ///
    /// The alphabet follows the classic pack-format convention: `b B h H i I
    /// q Q f d` for scalars and `s` for fixed byte/char buffers (padding runs
    /// render as `x`, but padding is a member property, not a type).
    pub const fn format_code(self) -> char {
        match self {
            Self::I8 => 'b',
            Self::U8 => 'B',
            Self::I16 => 'h',
            Self::U16 => 'H',
            Self::I32 => 'i',
            Self::U32 => 'I',
            Self::I64 => 'q',
            Self::U64 => 'Q',
            Self::F32 => 'f',
            Self::F64 => 'd',
            Self::CharBuf => 's',
        }
    }

    /// Whether this is a fixed-width unsigned integer (the only types allowed
    /// to carry a dynamic blob's length).
    pub const fn is_unsigned_int(self) -> bool {
        matches!(self, Self::U8 | Self::U16 | Self::U32 | Self::U64)
    }

    /// Maximum value representable by an unsigned integer of this width.
    ///
    /// Used by the encoder to reject blobs whose length does not fit the
    /// declared length field. Returns `None` for non-unsigned types.
    pub const fn unsigned_max(self) -> Option<u64> {
        match self {
            Self::U8 => Some(u8::MAX as u64),
            Self::U16 => Some(u16::MAX as u64),
            Self::U32 => Some(u32::MAX as u64),
            Self::U64 => Some(u64::MAX),
            _ => None,
        }
    }

    /// Schema-source spelling of this type ("u32", "char", ...).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::I8 => "i8",
            Self::U8 => "u8",
            Self::I16 => "i16",
            Self::U16 => "u16",
            Self::I32 => "i32",
            Self::U32 => "u32",
            Self::I64 => "i64",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::CharBuf => "char",
        }
    }

    /// Parse a schema type spec into a primitive and an optional inline
    /// repeat count.
    ///
    /// Accepts plain scalars (`"u32"`), byte arrays (`"u8[12]"`) and char
    /// buffers (`"char[256]"`). A bare `"char"` is rejected: buffers require
    /// an explicit count, and that is a schema error at load time, not at
    /// emission time.
    pub fn parse(spec: &str) -> Option<(Self, Option<u32>)> {
        if let Some((base, count)) = split_array_spec(spec) {
            let ty = match base {
                "u8" => Self::U8,
                "char" => Self::CharBuf,
                _ => return None,
            };
            return Some((ty, Some(count)));
        }

        let ty = match spec {
            "i8" => Self::I8,
            "u8" => Self::U8,
            "i16" => Self::I16,
            "u16" => Self::U16,
            "i32" => Self::I32,
            "u32" => Self::U32,
            "i64" => Self::I64,
            "u64" => Self::U64,
            "f32" => Self::F32,
            "f64" => Self::F64,
            _ => return None,
        };
        Some((ty, None))
    }
}

/// Split `"u8[12]"` into `("u8", 12)`. Zero counts are rejected.
fn split_array_spec(spec: &str) -> Option<(&str, u32)> {
    let open = spec.find('[')?;
    let close = spec.strip_suffix(']')?;
    let base = &spec[..open];
    let count: u32 = close[open + 1..].parse().ok()?;
    if count == 0 {
        return None;
    }
    Some((base, count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths_are_exact() {
        assert_eq!(PrimitiveType::I8.width(), 1);
        assert_eq!(PrimitiveType::U16.width(), 2);
        assert_eq!(PrimitiveType::F32.width(), 4);
        assert_eq!(PrimitiveType::I64.width(), 8);
        assert_eq!(PrimitiveType::F64.width(), 8);
        assert_eq!(PrimitiveType::CharBuf.width(), 1);
    }

    #[test]
    fn parse_scalars() {
        assert_eq!(PrimitiveType::parse("u32"), Some((PrimitiveType::U32, None)));
        assert_eq!(PrimitiveType::parse("f64"), Some((PrimitiveType::F64, None)));
        assert_eq!(PrimitiveType::parse("void"), None);
    }

    #[test]
    fn parse_arrays() {
        assert_eq!(
            PrimitiveType::parse("char[256]"),
            Some((PrimitiveType::CharBuf, Some(256)))
        );
        assert_eq!(
            PrimitiveType::parse("u8[12]"),
            Some((PrimitiveType::U8, Some(12)))
        );
        // Bare char buffers and zero-length arrays are malformed.
        assert_eq!(PrimitiveType::parse("char"), None);
        assert_eq!(PrimitiveType::parse("u8[0]"), None);
        assert_eq!(PrimitiveType::parse("f32[4]"), None);
    }

    #[test]
    fn length_field_capacity() {
        assert_eq!(PrimitiveType::U32.unsigned_max(), Some(u32::MAX as u64));
        assert_eq!(PrimitiveType::I32.unsigned_max(), None);
        assert!(PrimitiveType::U16.is_unsigned_int());
        assert!(!PrimitiveType::F32.is_unsigned_int());
    }
}
