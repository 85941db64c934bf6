//! Operator descriptors.
//!
//! An elementwise operator plugs into the engine through a static
//! [`OperatorDescriptor`]: a name token for registry lookup, a format table
//! describing the output encoding per input encoding, a shortcut predicate
//! that can replace the whole operation with a structural copy, and the
//! scanline kernel the engine drives during evaluation.

use core::fmt;

use crate::encoding::SampleFormat;

/// Output sample format per input sample format.
///
/// Total over the closed [`SampleFormat`] set; format-preserving operators
/// use the identity.
pub type FormatTable = fn(SampleFormat) -> SampleFormat;

/// Whether the whole operation collapses to a structural copy of the input
/// for the given format. When true, the engine never invokes the kernel.
pub type ShortcutPredicate = fn(SampleFormat) -> bool;

/// Scanline kernel: write `samples` transformed samples into `out` from the
/// input lines. Unary operators receive exactly one input line.
///
/// Kernels must be pure and reentrant: no state beyond the borrowed
/// buffers, no retained references, safe for unsynchronized concurrent
/// invocation on disjoint scanlines.
pub type LineKernel = fn(out: &mut [u8], inputs: &[&[u8]], samples: usize, format: SampleFormat);

/// Static description of one elementwise operator.
///
/// Built once at registration, immutable thereafter. The engine composes
/// the three hooks; the descriptor itself has no behavior.
pub struct OperatorDescriptor {
    /// Stable name token for registry lookup.
    pub name: &'static str,
    /// Output format per input format.
    pub format_table: FormatTable,
    /// Copy-shortcut predicate.
    pub shortcut: ShortcutPredicate,
    /// Per-scanline computation.
    pub kernel: LineKernel,
}

impl OperatorDescriptor {
    /// Output format this operator produces for `input`.
    #[inline]
    pub fn output_format(&self, input: SampleFormat) -> SampleFormat {
        (self.format_table)(input)
    }

    /// Whether evaluation collapses to a copy for `input`.
    #[inline]
    pub fn takes_shortcut(&self, input: SampleFormat) -> bool {
        (self.shortcut)(input)
    }
}

impl fmt::Debug for OperatorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorDescriptor")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn copy_kernel(out: &mut [u8], inputs: &[&[u8]], _samples: usize, _format: SampleFormat) {
        out.copy_from_slice(inputs[0]);
    }

    static COPY: OperatorDescriptor = OperatorDescriptor {
        name: "copy",
        format_table: |f| f,
        shortcut: |_| true,
        kernel: copy_kernel,
    };

    #[test]
    fn descriptor_composes_hooks() {
        assert_eq!(COPY.name, "copy");
        assert_eq!(COPY.output_format(SampleFormat::I16), SampleFormat::I16);
        assert!(COPY.takes_shortcut(SampleFormat::F64));
    }

    #[test]
    fn kernel_is_callable_through_descriptor() {
        let src = [1u8, 2, 3, 4];
        let mut out = [0u8; 4];
        (COPY.kernel)(&mut out, &[&src], 4, SampleFormat::U8);
        assert_eq!(out, src);
    }

    #[test]
    fn debug_shows_name() {
        let s = format!("{COPY:?}");
        assert!(s.contains("copy"));
    }
}
