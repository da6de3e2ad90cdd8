//! Time shifts with an explicit fill policy for vacated bars.

use serde::{Deserialize, Serialize};

/// What goes into the bars a shift leaves without a source value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftFill {
    /// Vacated bars are 0.0.
    #[default]
    Zero,
    /// Vacated bars repeat the nearest shifted value. A shift of `len` or
    /// more has no shifted value to hold and falls back to 0.0.
    Hold,
}

impl ShiftFill {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftFill::Zero => "zero",
            ShiftFill::Hold => "hold",
        }
    }
}

/// output[i] = values[i - n]. The first `n` bars are filled.
///
/// With `n >= values.len()` every bar is 0.0 under either policy.
pub fn shift_forward(values: &[f64], n: usize, fill: ShiftFill) -> Vec<f64> {
    let len = values.len();
    if n >= len {
        return vec![0.0; len];
    }
    let pad = match fill {
        ShiftFill::Zero => 0.0,
        ShiftFill::Hold => values[0],
    };
    let mut out = vec![pad; n];
    out.extend_from_slice(&values[..len - n]);
    out
}

/// output[i] = values[i + n]. The last `n` bars are filled.
///
/// With `n >= values.len()` every bar is 0.0 under either policy.
pub fn shift_backward(values: &[f64], n: usize, fill: ShiftFill) -> Vec<f64> {
    let len = values.len();
    if n >= len {
        return vec![0.0; len];
    }
    let pad = match fill {
        ShiftFill::Zero => 0.0,
        ShiftFill::Hold => values[len - 1],
    };
    let mut out = values[n..].to_vec();
    out.resize(len, pad);
    out
}
