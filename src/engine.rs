//! Unary operator evaluation.
//!
//! [`UnaryOp`] is the per-operation job that binds an
//! [`OperatorDescriptor`](crate::OperatorDescriptor) to one input image and
//! evaluates it: the shortcut branch returns a structural copy without any
//! kernel work; the generic branch allocates the output through the format
//! table and drives the scanline kernel once per row, in strips. Rows inside
//! a strip are fanned out with `rayon` when parallel evaluation is enabled;
//! the cancellation token is checked between strips.

use core::fmt;

use enough::{Stop, StopReason, Unstoppable};
use log::debug;
use rayon::prelude::*;

use crate::image::{Image, ImageError};
use crate::operator::OperatorDescriptor;

/// Evaluation options.
///
/// All fields are optional behavior switches; the defaults are what
/// production callers want.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Fan rows of a strip out across threads. Default true.
    pub parallel: bool,
    /// Honor operator copy shortcuts. Default true; disabling forces the
    /// kernel path even where a copy would be equivalent.
    pub shortcuts: bool,
    /// Rows evaluated between cancellation checks. Default 64; values
    /// below 1 are treated as 1.
    pub strip_rows: u32,
    /// Reject inputs with more than this many pixels. Default unlimited.
    pub max_pixels: Option<u64>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            shortcuts: true,
            strip_rows: 64,
            max_pixels: None,
        }
    }
}

impl PipelineOptions {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set parallel row evaluation.
    pub fn with_parallel(mut self, v: bool) -> Self {
        self.parallel = v;
        self
    }

    /// Set whether operator copy shortcuts are honored.
    pub fn with_shortcuts(mut self, v: bool) -> Self {
        self.shortcuts = v;
        self
    }

    /// Set the strip height in rows.
    pub fn with_strip_rows(mut self, rows: u32) -> Self {
        self.strip_rows = rows;
        self
    }

    /// Set the pixel-count limit.
    pub fn with_max_pixels(mut self, max: u64) -> Self {
        self.max_pixels = Some(max);
        self
    }
}

/// Errors from operator evaluation.
#[derive(Debug)]
pub enum PipelineError {
    /// Output image construction failed.
    Image(ImageError),
    /// Input exceeds the configured pixel limit.
    PixelLimit {
        /// Actual pixel count.
        actual: u64,
        /// Maximum allowed.
        max: u64,
    },
    /// The cancellation token fired.
    Cancelled(StopReason),
    /// No registered operator has the requested name.
    UnknownOperator(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image(e) => write!(f, "output image construction failed: {e}"),
            Self::PixelLimit { actual, max } => {
                write!(f, "pixel count {actual} exceeds limit {max}")
            }
            Self::Cancelled(reason) => write!(f, "operation cancelled: {reason:?}"),
            Self::UnknownOperator(name) => write!(f, "unknown operator {name:?}"),
        }
    }
}

impl core::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Image(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ImageError> for PipelineError {
    fn from(e: ImageError) -> Self {
        Self::Image(e)
    }
}

/// Per-operation evaluation job for a unary operator.
///
/// Created with [`new`](UnaryOp::new), optionally configured, then consumed
/// by [`execute`](UnaryOp::execute). Borrows the input image and the stop
/// token for the duration of the one call only.
pub struct UnaryOp<'a> {
    desc: &'static OperatorDescriptor,
    input: &'a Image,
    stop: &'a dyn Stop,
    options: PipelineOptions,
}

impl<'a> UnaryOp<'a> {
    /// Bind an operator to an input image with default options.
    pub fn new(desc: &'static OperatorDescriptor, input: &'a Image) -> Self {
        Self {
            desc,
            input,
            stop: &Unstoppable,
            options: PipelineOptions::default(),
        }
    }

    /// Set a cooperative cancellation token. Checked once per strip.
    pub fn with_stop(mut self, stop: &'a dyn Stop) -> Self {
        self.stop = stop;
        self
    }

    /// Override evaluation options.
    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    /// Evaluate the operator and return the output image.
    ///
    /// Either the shortcut branch or the kernel branch runs, never both;
    /// a failed evaluation leaves no partial output visible.
    ///
    /// # Errors
    ///
    /// [`PipelineError::PixelLimit`] if the input exceeds the configured
    /// limit, [`PipelineError::Cancelled`] if the stop token fires,
    /// [`PipelineError::Image`] if output allocation fails.
    pub fn execute(self) -> Result<Image, PipelineError> {
        let input = self.input;
        let format = input.format();

        if let Some(max) = self.options.max_pixels
            && input.pixel_count() > max
        {
            return Err(PipelineError::PixelLimit {
                actual: input.pixel_count(),
                max,
            });
        }
        self.stop.check().map_err(PipelineError::Cancelled)?;

        if self.options.shortcuts && self.desc.takes_shortcut(format) {
            debug!("{}: copy shortcut for {format} input", self.desc.name);
            return Ok(input.write_copy());
        }

        let out_format = self.desc.output_format(format);
        let mut out = Image::new_zeroed(out_format, input.width(), input.height(), input.bands())?;

        let samples = input.samples_per_line();
        let height = input.height();
        debug!(
            "{}: {format} -> {out_format}, {height} rows x {samples} samples",
            self.desc.name
        );

        if samples > 0 {
            let kernel = self.desc.kernel;
            let in_line = input.line_bytes();
            let out_line = out.line_bytes();
            let in_bytes = input.bytes();
            let out_bytes = out.data_mut();
            let strip = self.options.strip_rows.max(1);

            let mut y: u32 = 0;
            while y < height {
                self.stop.check().map_err(PipelineError::Cancelled)?;
                let rows = strip.min(height - y) as usize;
                let in_start = y as usize * in_line;
                let out_start = y as usize * out_line;
                let in_strip = &in_bytes[in_start..in_start + rows * in_line];
                let out_strip = &mut out_bytes[out_start..out_start + rows * out_line];

                if self.options.parallel {
                    out_strip
                        .par_chunks_exact_mut(out_line)
                        .zip(in_strip.par_chunks_exact(in_line))
                        .for_each(|(o, i)| kernel(o, &[i], samples, format));
                } else {
                    for (o, i) in out_strip
                        .chunks_exact_mut(out_line)
                        .zip(in_strip.chunks_exact(in_line))
                    {
                        kernel(o, &[i], samples, format);
                    }
                }
                y += rows as u32;
            }
        }

        Ok(out)
    }
}

impl fmt::Debug for UnaryOp<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnaryOp")
            .field("operator", &self.desc.name)
            .field("input", &self.input)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::SampleFormat;

    fn init_logs() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn add_one_kernel(out: &mut [u8], inputs: &[&[u8]], _samples: usize, _format: SampleFormat) {
        for (o, i) in out.iter_mut().zip(inputs[0]) {
            *o = i.wrapping_add(1);
        }
    }

    fn panic_kernel(_out: &mut [u8], _inputs: &[&[u8]], _samples: usize, _format: SampleFormat) {
        panic!("kernel must not run on the shortcut path");
    }

    static ADD_ONE: OperatorDescriptor = OperatorDescriptor {
        name: "add-one",
        format_table: |f| f,
        shortcut: |_| false,
        kernel: add_one_kernel,
    };

    static ALWAYS_COPY: OperatorDescriptor = OperatorDescriptor {
        name: "always-copy",
        format_table: |f| f,
        shortcut: |_| true,
        kernel: panic_kernel,
    };

    fn gradient_image(width: u32, height: u32, bands: u32) -> Image {
        let len = (width * height * bands) as usize;
        let data: Vec<u8> = (0..len).map(|i| i as u8).collect();
        Image::from_bytes(data, SampleFormat::U8, width, height, bands).unwrap()
    }

    #[test]
    fn generic_path_drives_kernel_per_row() {
        init_logs();
        let input = gradient_image(4, 3, 2);
        let out = UnaryOp::new(&ADD_ONE, &input).execute().unwrap();
        let expected: Vec<u8> = input.bytes().iter().map(|b| b.wrapping_add(1)).collect();
        assert_eq!(out.bytes(), &expected[..]);
        assert_eq!(out.format(), input.format());
        assert_eq!(out.line_bytes(), input.line_bytes());
    }

    #[test]
    fn shortcut_path_copies_without_kernel() {
        init_logs();
        let input = gradient_image(5, 4, 1);
        let out = UnaryOp::new(&ALWAYS_COPY, &input).execute().unwrap();
        assert_eq!(out.bytes(), input.bytes());
    }

    #[test]
    fn shortcuts_can_be_disabled() {
        let input = gradient_image(3, 3, 1);
        let out = UnaryOp::new(&ADD_ONE, &input)
            .with_options(PipelineOptions::new().with_shortcuts(false))
            .execute()
            .unwrap();
        assert_ne!(out.bytes(), input.bytes());
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let input = gradient_image(16, 200, 3);
        let par = UnaryOp::new(&ADD_ONE, &input)
            .with_options(PipelineOptions::new().with_parallel(true).with_strip_rows(7))
            .execute()
            .unwrap();
        let seq = UnaryOp::new(&ADD_ONE, &input)
            .with_options(PipelineOptions::new().with_parallel(false).with_strip_rows(1))
            .execute()
            .unwrap();
        assert_eq!(par.bytes(), seq.bytes());
    }

    #[test]
    fn pixel_limit_rejects_before_evaluation() {
        let input = gradient_image(10, 10, 1);
        let err = UnaryOp::new(&ADD_ONE, &input)
            .with_options(PipelineOptions::new().with_max_pixels(99))
            .execute()
            .unwrap_err();
        match err {
            PipelineError::PixelLimit { actual, max } => {
                assert_eq!(actual, 100);
                assert_eq!(max, 99);
            }
            other => panic!("expected PixelLimit, got {other:?}"),
        }
    }

    #[test]
    fn pixel_limit_applies_to_shortcut_path_too() {
        let input = gradient_image(10, 10, 1);
        let err = UnaryOp::new(&ALWAYS_COPY, &input)
            .with_options(PipelineOptions::new().with_max_pixels(50))
            .execute()
            .unwrap_err();
        assert!(matches!(err, PipelineError::PixelLimit { .. }));
    }

    #[test]
    fn zero_height_image_evaluates_to_empty() {
        let input = Image::new_zeroed(SampleFormat::U8, 4, 0, 1).unwrap();
        let out = UnaryOp::new(&ADD_ONE, &input).execute().unwrap();
        assert_eq!(out.bytes().len(), 0);
    }

    #[test]
    fn zero_width_image_evaluates_to_empty() {
        let input = Image::new_zeroed(SampleFormat::U8, 0, 4, 1).unwrap();
        let out = UnaryOp::new(&ADD_ONE, &input).execute().unwrap();
        assert_eq!(out.bytes().len(), 0);
        assert_eq!(out.height(), 4);
    }

    #[test]
    fn strip_rows_zero_is_clamped() {
        let input = gradient_image(2, 5, 1);
        let out = UnaryOp::new(&ADD_ONE, &input)
            .with_options(PipelineOptions::new().with_strip_rows(0))
            .execute()
            .unwrap();
        assert_eq!(out.bytes().len(), input.bytes().len());
    }

    #[test]
    fn options_defaults() {
        let opts = PipelineOptions::new();
        assert!(opts.parallel);
        assert!(opts.shortcuts);
        assert_eq!(opts.strip_rows, 64);
        assert_eq!(opts.max_pixels, None);
    }

    // Callers wrap PipelineError in their own error types; make sure the
    // Error impl composes.
    #[derive(Debug, thiserror::Error)]
    enum CallerError {
        #[error("evaluation failed: {0}")]
        Pipeline(#[from] PipelineError),
    }

    #[test]
    fn pipeline_error_wraps_into_caller_error() {
        let input = gradient_image(10, 10, 1);
        let result: Result<Image, CallerError> = UnaryOp::new(&ADD_ONE, &input)
            .with_options(PipelineOptions::new().with_max_pixels(1))
            .execute()
            .map_err(CallerError::from);
        let err = result.unwrap_err();
        assert!(format!("{err}").contains("exceeds limit"));
        let source = core::error::Error::source(&err);
        assert!(source.is_some());
    }

    #[test]
    fn error_display() {
        let err = PipelineError::UnknownOperator("nope".into());
        assert_eq!(format!("{err}"), "unknown operator \"nope\"");

        let err = PipelineError::Image(ImageError::InvalidDimensions);
        assert!(format!("{err}").contains("overflow"));
    }
}
