//! Sample encodings.
//!
//! [`SampleFormat`] is the closed set of sample representations a raster
//! image may use. Operators dispatch on it with exhaustive matches, so an
//! encoding outside this set is unrepresentable by construction.

/// Sample representation of one band value.
///
/// Complex variants store interleaved real/imaginary component pairs; one
/// complex *sample* is one pair. All samples are stored native-endian.
///
/// This enum is deliberately closed (not `#[non_exhaustive]`): operator
/// kernels rely on exhaustive matches as their encoding-validity check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    /// 8-bit unsigned integer.
    U8,
    /// 8-bit signed integer.
    I8,
    /// 16-bit unsigned integer.
    U16,
    /// 16-bit signed integer.
    I16,
    /// 32-bit unsigned integer.
    U32,
    /// 32-bit signed integer.
    I32,
    /// 32-bit floating point.
    F32,
    /// 64-bit floating point.
    F64,
    /// Complex pair of 32-bit floating point components.
    Complex32,
    /// Complex pair of 64-bit floating point components.
    Complex64,
}

impl SampleFormat {
    /// Every supported format, in width-then-signedness order.
    pub const ALL: [SampleFormat; 10] = [
        Self::U8,
        Self::I8,
        Self::U16,
        Self::I16,
        Self::U32,
        Self::I32,
        Self::F32,
        Self::F64,
        Self::Complex32,
        Self::Complex64,
    ];

    /// Byte size of one sample (the full pair for complex formats).
    #[inline]
    pub const fn bytes_per_sample(self) -> usize {
        match self {
            Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::F64 | Self::Complex32 => 8,
            Self::Complex64 => 16,
        }
    }

    /// Components per sample: 2 for complex pairs, 1 otherwise.
    #[inline]
    pub const fn components_per_sample(self) -> usize {
        match self {
            Self::Complex32 | Self::Complex64 => 2,
            _ => 1,
        }
    }

    /// Byte size of one component.
    #[inline]
    pub const fn component_bytes(self) -> usize {
        self.bytes_per_sample() / self.components_per_sample()
    }

    /// Whether this is an unsigned integer format (any width).
    #[inline]
    pub const fn is_unsigned_int(self) -> bool {
        matches!(self, Self::U8 | Self::U16 | Self::U32)
    }

    /// Whether this is a signed integer format (any width).
    #[inline]
    pub const fn is_signed_int(self) -> bool {
        matches!(self, Self::I8 | Self::I16 | Self::I32)
    }

    /// Whether this is a non-complex floating point format.
    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    /// Whether this is a complex pair format.
    #[inline]
    pub const fn is_complex(self) -> bool {
        matches!(self, Self::Complex32 | Self::Complex64)
    }
}

impl core::fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::U8 => "u8",
            Self::I8 => "i8",
            Self::U16 => "u16",
            Self::I16 => "i16",
            Self::U32 => "u32",
            Self::I32 => "i32",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Complex32 => "complex32",
            Self::Complex64 => "complex64",
        })
    }
}
