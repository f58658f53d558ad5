//! Errors raised by quaternion operations.

use thiserror::Error;

/// Coarse classification of a [`QuaternionError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// An argument had the wrong length or was out of range.
    InvalidArgument,
    /// A required argument was absent.
    MissingReference,
    /// The result of the operation is mathematically undefined.
    Arithmetic,
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum QuaternionError {
    #[error("Expected a vector with 3 components, got {len}")]
    InvalidVectorLength { len: usize },

    #[error("Interpolation parameter {t} is outside [0, 1]")]
    InterpolationParameterOutOfRange { t: f64 },

    #[error("No vector was given to rotate")]
    MissingVector,

    #[error("Logarithm is undefined for a quaternion with norm {norm}")]
    LogarithmOfZero { norm: f64 },

    #[error("Quaternion has zero norm")]
    ZeroNorm,
}

impl QuaternionError {
    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidVectorLength { .. } | Self::InterpolationParameterOutOfRange { .. } => {
                ErrorKind::InvalidArgument
            }
            Self::MissingVector => ErrorKind::MissingReference,
            Self::LogarithmOfZero { .. } | Self::ZeroNorm => ErrorKind::Arithmetic,
        }
    }
}

/// Checks that the given slice holds exactly three components.
pub(crate) fn expect_vector3(vector: &[f64]) -> Result<[f64; 3], QuaternionError> {
    match *vector {
        [x, y, z] => Ok([x, y, z]),
        _ => Err(QuaternionError::InvalidVectorLength { len: vector.len() }),
    }
}
