//! Quaternion arithmetic for rotations in three-dimensional space.
//!
//! The central type is [`Quaternion`], a plain `(x, y, z, w)` value with the
//! usual algebra, conversions to and from axis-angle and Euler angle
//! representations, and linear and spherical interpolation.

#[macro_use]
mod macros;

pub mod angle;
pub mod error;
pub mod matrix;
pub mod quaternion;

pub use angle::{Angle, Degrees, Radians};
pub use error::{ErrorKind, QuaternionError};
pub use matrix::Matrix3;
pub use quaternion::Quaternion;

/// Tolerance used for unit, identity and degeneracy checks.
pub const EPSILON: f64 = 1e-11;
