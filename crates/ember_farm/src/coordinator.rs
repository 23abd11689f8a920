//! Merges worker batches into the running image.

use ember_renderer::OutputSize;
use rayon::prelude::*;

use crate::protocol::{ProgressMessage, ProtocolError, ProtocolResult};

/// Running sum of every batch reported by every worker.
///
/// Only the coordinator writes to this buffer; workers send deltas.
pub struct Coordinator {
    output: OutputSize,
    iterations_per_message: u32,
    buffer: Vec<f64>,
    total_iterations: u64,
    messages: u64,
}

impl Coordinator {
    pub fn new(output: OutputSize, iterations_per_message: u32) -> Self {
        Self {
            output,
            iterations_per_message,
            buffer: vec![0.0; output.pixel_count() * 3],
            total_iterations: 0,
            messages: 0,
        }
    }

    pub fn output(&self) -> OutputSize {
        self.output
    }

    /// Samples per pixel merged so far.
    pub fn total_iterations(&self) -> u64 {
        self.total_iterations
    }

    /// Progress messages merged so far.
    pub fn messages(&self) -> u64 {
        self.messages
    }

    /// Flat RGB running sum.
    pub fn buffer(&self) -> &[f64] {
        &self.buffer
    }

    /// Add one worker batch to the running sum.
    ///
    /// A message of the wrong length is rejected and leaves the sum untouched.
    pub fn accumulate(&mut self, message: ProgressMessage) -> ProtocolResult<()> {
        let flat = message.into_flat()?;
        if flat.len() != self.buffer.len() {
            return Err(ProtocolError::BufferLength {
                expected: self.buffer.len(),
                actual: flat.len(),
            });
        }

        self.buffer
            .par_iter_mut()
            .zip(flat.par_iter())
            .for_each(|(sum, delta)| *sum += delta);
        self.total_iterations += u64::from(self.iterations_per_message);
        self.messages += 1;
        Ok(())
    }

    /// Running mean as 8-bit RGBA with opaque alpha.
    ///
    /// Each channel is `sum * 255 / total_iterations`, rounded and clamped
    /// to [0, 255]. Black until the first batch arrives.
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut rgba = vec![0u8; self.output.pixel_count() * 4];
        let scale = if self.total_iterations == 0 {
            0.0
        } else {
            255.0 / self.total_iterations as f64
        };

        rgba.par_chunks_exact_mut(4)
            .zip(self.buffer.par_chunks_exact(3))
            .for_each(|(pixel, rgb)| {
                pixel[0] = to_byte(rgb[0] * scale);
                pixel[1] = to_byte(rgb[1] * scale);
                pixel[2] = to_byte(rgb[2] * scale);
                pixel[3] = 255;
            });

        rgba
    }
}

/// Clamp to a byte the way a clamped byte array stores it (NaN becomes 0).
#[inline]
fn to_byte(value: f64) -> u8 {
    value.round_ties_even().clamp(0.0, 255.0) as u8
}
