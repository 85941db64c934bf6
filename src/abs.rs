//! Absolute value.
//!
//! Finds the absolute value of an image: a copy for unsigned integer
//! formats, negate-and-test for signed integer formats, `abs()` for float
//! formats, and the modulus for complex formats.
//!
//! Signed negation wraps: the minimum value of each integer width maps to
//! itself, matching two's-complement semantics sample for sample. Complex
//! samples come out as `(modulus, 0)` pairs — the format stays complex and
//! every output component is defined.

use crate::encoding::SampleFormat;
use crate::engine::{PipelineError, UnaryOp};
use crate::image::Image;
use crate::operator::OperatorDescriptor;

/// The absolute-value operator, registered as `"abs"`.
pub static ABS: OperatorDescriptor = OperatorDescriptor {
    name: "abs",
    format_table: abs_format,
    shortcut: abs_shortcut,
    kernel: abs_line,
};

/// Compute the absolute value of an image.
///
/// One input, one output, no required configuration. Unsigned integer
/// inputs come back as a structural copy without any kernel work.
///
/// # Errors
///
/// Propagates [`PipelineError`] from evaluation; no partial output is ever
/// returned.
pub fn compute_abs(input: &Image) -> Result<Image, PipelineError> {
    UnaryOp::new(&ABS, input).execute()
}

/// Abs is format-preserving: every encoding maps to itself.
pub fn abs_format(format: SampleFormat) -> SampleFormat {
    format
}

/// Absolute value is the identity for unsigned integers, so evaluation
/// collapses to a copy of the input.
pub fn abs_shortcut(format: SampleFormat) -> bool {
    format.is_unsigned_int()
}

/// Integer abs: test and negate, wrapping on the minimum value.
macro_rules! abs_int {
    ($ty:ty, $out:expr, $src:expr) => {{
        const N: usize = size_of::<$ty>();
        for (o, s) in $out.chunks_exact_mut(N).zip($src.chunks_exact(N)) {
            let mut sample = [0u8; N];
            sample.copy_from_slice(s);
            let v = <$ty>::from_ne_bytes(sample);
            let r = if v < 0 { v.wrapping_neg() } else { v };
            o.copy_from_slice(&r.to_ne_bytes());
        }
    }};
}

/// Float abs: the standard magnitude.
macro_rules! abs_float {
    ($ty:ty, $out:expr, $src:expr) => {{
        const N: usize = size_of::<$ty>();
        for (o, s) in $out.chunks_exact_mut(N).zip($src.chunks_exact(N)) {
            let mut sample = [0u8; N];
            sample.copy_from_slice(s);
            let v = <$ty>::from_ne_bytes(sample);
            o.copy_from_slice(&v.abs().to_ne_bytes());
        }
    }};
}

/// Complex abs: modulus into the real component, zero into the imaginary.
macro_rules! abs_complex {
    ($ty:ty, $out:expr, $src:expr) => {{
        const N: usize = size_of::<$ty>();
        for (o, s) in $out.chunks_exact_mut(2 * N).zip($src.chunks_exact(2 * N)) {
            let mut re = [0u8; N];
            let mut im = [0u8; N];
            re.copy_from_slice(&s[..N]);
            im.copy_from_slice(&s[N..]);
            let m = modulus(
                <$ty>::from_ne_bytes(re) as f64,
                <$ty>::from_ne_bytes(im) as f64,
            ) as $ty;
            let zero: $ty = 0.0;
            o[..N].copy_from_slice(&m.to_ne_bytes());
            o[N..].copy_from_slice(&zero.to_ne_bytes());
        }
    }};
}

/// Overflow-safe complex modulus `sqrt(rp² + ip²)`.
///
/// Scales by the larger magnitude so the squared ratio never overflows:
/// `a·sqrt(1 + (b/a)²)` with `a = max(|rp|, |ip|)`. Both components zero
/// gives zero.
fn modulus(rp: f64, ip: f64) -> f64 {
    let a = rp.abs();
    let b = ip.abs();
    if a == 0.0 && b == 0.0 {
        0.0
    } else if a > b {
        let t = b / a;
        a * (1.0 + t * t).sqrt()
    } else {
        let t = a / b;
        b * (1.0 + t * t).sqrt()
    }
}

/// Scanline kernel: absolute value of one line of samples.
///
/// Unsigned formats normally never get here (the shortcut copies the image
/// instead); the identity arm keeps a forced kernel pass equivalent to the
/// shortcut.
///
/// # Panics
///
/// Panics if `inputs` does not hold exactly one line or if either line's
/// byte length does not match `samples` of `format`.
pub fn abs_line(out: &mut [u8], inputs: &[&[u8]], samples: usize, format: SampleFormat) {
    assert_eq!(inputs.len(), 1, "abs is a unary operator");
    let src = inputs[0];
    let line = samples * format.bytes_per_sample();
    assert_eq!(src.len(), line, "input line is not {samples} {format} samples");
    assert_eq!(out.len(), line, "output line is not {samples} {format} samples");

    match format {
        SampleFormat::U8 | SampleFormat::U16 | SampleFormat::U32 => out.copy_from_slice(src),
        SampleFormat::I8 => abs_int!(i8, out, src),
        SampleFormat::I16 => abs_int!(i16, out, src),
        SampleFormat::I32 => abs_int!(i32, out, src),
        SampleFormat::F32 => abs_float!(f32, out, src),
        SampleFormat::F64 => abs_float!(f64, out, src),
        SampleFormat::Complex32 => abs_complex!(f32, out, src),
        SampleFormat::Complex64 => abs_complex!(f64, out, src),
    }
}
