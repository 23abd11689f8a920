//! Messages exchanged between the coordinator and render workers.
//!
//! A worker is started with `(width, height, iterations_per_message)`, given
//! either as a native value or as the text `"w,h,n"`. Every progress message
//! afterwards carries the worker's accumulated buffer as a flat RGB sequence,
//! encoded the same way the startup message was.

use ember_math::Color;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors in startup or progress messages.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Startup message needs 3 values (width, height, iterations), got {0}")]
    Arity(usize),

    #[error("Startup value {index} must be a positive integer, got {value}")]
    InvalidValue { index: usize, value: f64 },

    #[error("Progress buffer has {actual} floats, expected {expected}")]
    BufferLength { expected: usize, actual: usize },
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// How progress messages are carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Flat `Vec<f64>`
    #[default]
    Native,
    /// JSON array text
    Json,
}

/// Parameters a worker needs to start rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartupParams {
    pub width: u32,
    pub height: u32,
    pub iterations_per_message: u32,
}

impl StartupParams {
    pub fn new(width: u32, height: u32, iterations_per_message: u32) -> Self {
        Self {
            width,
            height,
            iterations_per_message,
        }
    }

    /// Length of the flat RGB buffer carried by each progress message.
    pub fn flat_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }

    fn validate(self) -> ProtocolResult<Self> {
        let values = [self.width, self.height, self.iterations_per_message];
        match values.iter().position(|&v| v == 0) {
            Some(index) => Err(ProtocolError::InvalidValue { index, value: 0.0 }),
            None => Ok(self),
        }
    }
}

/// First message sent to a worker.
#[derive(Debug, Clone, PartialEq)]
pub enum StartupMessage {
    Native(StartupParams),
    /// Comma separated `"w,h,n"`
    Text(String),
}

impl StartupMessage {
    /// Decode the startup parameters and the encoding to answer with.
    ///
    /// Text messages are parsed as the JSON array `[w,h,n]` and switch the
    /// worker to JSON progress messages.
    pub fn parse(&self) -> ProtocolResult<(StartupParams, Encoding)> {
        match self {
            StartupMessage::Native(params) => Ok((params.validate()?, Encoding::Native)),
            StartupMessage::Text(text) => {
                let values: Vec<f64> = serde_json::from_str(&format!("[{}]", text))?;
                if values.len() != 3 {
                    return Err(ProtocolError::Arity(values.len()));
                }

                let mut parsed = [0u32; 3];
                for (index, (&value, slot)) in values.iter().zip(parsed.iter_mut()).enumerate() {
                    *slot = positive_integer(value)
                        .ok_or(ProtocolError::InvalidValue { index, value })?;
                }

                let params = StartupParams::new(parsed[0], parsed[1], parsed[2]);
                Ok((params, Encoding::Json))
            }
        }
    }
}

fn positive_integer(value: f64) -> Option<u32> {
    if value >= 1.0 && value.fract() == 0.0 && value <= u32::MAX as f64 {
        Some(value as u32)
    } else {
        None
    }
}

/// Accumulated buffer of one worker batch.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressMessage {
    Native(Vec<f64>),
    Json(String),
}

impl ProgressMessage {
    /// Flatten `buffer` and encode it.
    pub fn encode(buffer: &[Color], encoding: Encoding) -> ProtocolResult<Self> {
        let flat = flatten(buffer);
        Ok(match encoding {
            Encoding::Native => ProgressMessage::Native(flat),
            Encoding::Json => ProgressMessage::Json(serde_json::to_string(&flat)?),
        })
    }

    /// Decode back to the flat RGB sequence.
    ///
    /// JSON has no NaN or infinity; such values travel as `null` and come
    /// back as 0.0, so a degenerate sample adds nothing to the total.
    pub fn into_flat(self) -> ProtocolResult<Vec<f64>> {
        match self {
            ProgressMessage::Native(flat) => Ok(flat),
            ProgressMessage::Json(text) => {
                let values: Vec<Option<f64>> = serde_json::from_str(&text)?;
                Ok(values.into_iter().map(|v| v.unwrap_or(0.0)).collect())
            }
        }
    }
}

/// Flatten a colour buffer to `[r, g, b, r, g, b, ...]`.
pub fn flatten(buffer: &[Color]) -> Vec<f64> {
    let mut flat = Vec::with_capacity(buffer.len() * 3);
    for color in buffer {
        flat.extend_from_slice(&[color.x, color.y, color.z]);
    }
    flat
}
