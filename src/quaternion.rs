//! Quaternions.

use crate::{
    EPSILON,
    angle::{Angle, Degrees, Radians},
    error::{QuaternionError, expect_vector3},
    matrix::Matrix3,
};
use approx::{AbsDiffEq, RelativeEq, UlpsEq};
use bytemuck::{Pod, Zeroable};
use std::{
    f64::consts::TAU,
    fmt,
    hash::{Hash, Hasher},
};

/// Above this cosine of the angle between two rotations, [`Quaternion::slerp`]
/// falls back to normalized linear interpolation.
const SLERP_LINEAR_COS_THRESHOLD: f64 = 1.0 - 1e-6;

const HASH_SEED: u64 = 13;
const HASH_MULTIPLIER: u64 = 31;

/// A quaternion `w + x i + y j + z k`.
///
/// No invariant is enforced on the components: any quaternion, including the
/// zero quaternion, can be represented. When the quaternion has unit norm it
/// represents the rotation `(sin(θ/2) axis, cos(θ/2))`.
///
/// Equality and hashing compare the bit patterns of the components, so two
/// quaternions are equal exactly when every component is bitwise identical.
/// Use [`Self::equals_within`] or the [`approx`] traits for numerical
/// comparison.
///
/// Every operation comes in a pure form returning a new quaternion and a
/// mutating form updating the receiver, and the two produce bitwise
/// identical results for identical inputs.
#[repr(C)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(into = "[f64; 4]", from = "[f64; 4]")
)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[derive(Clone, Copy, Debug, Zeroable, Pod)]
pub struct Quaternion {
    x: f64,
    y: f64,
    z: f64,
    w: f64,
}

impl Quaternion {
    /// Creates a quaternion with the given components. The components are
    /// taken as is.
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// The identity quaternion `(0, 0, 0, 1)`.
    #[inline]
    pub const fn identity() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    #[inline]
    pub const fn from_parts(real: f64, imag: [f64; 3]) -> Self {
        Self::new(imag[0], imag[1], imag[2], real)
    }

    #[inline]
    pub const fn from_real(real: f64) -> Self {
        Self::new(0.0, 0.0, 0.0, real)
    }

    #[inline]
    pub const fn from_imag(imag: [f64; 3]) -> Self {
        Self::from_parts(0.0, imag)
    }

    #[inline]
    pub const fn x(&self) -> f64 {
        self.x
    }

    #[inline]
    pub const fn y(&self) -> f64 {
        self.y
    }

    #[inline]
    pub const fn z(&self) -> f64 {
        self.z
    }

    /// The scalar component. Same as [`Self::scalar_part`].
    #[inline]
    pub const fn w(&self) -> f64 {
        self.w
    }

    #[inline]
    pub const fn vector_part(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    #[inline]
    pub const fn scalar_part(&self) -> f64 {
        self.w
    }

    #[inline]
    pub const fn real(&self) -> f64 {
        self.w
    }

    #[inline]
    pub const fn imag(&self) -> [f64; 3] {
        self.vector_part()
    }

    /// Returns the components in the order `[x, y, z, w]`.
    #[inline]
    pub const fn to_array(self) -> [f64; 4] {
        [self.x, self.y, self.z, self.w]
    }

    #[inline]
    pub fn squared_norm(&self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w
    }

    #[inline]
    pub fn norm(&self) -> f64 {
        self.squared_norm().sqrt()
    }

    /// The four-dimensional dot product of the two quaternions.
    #[inline]
    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    /// Divides every component by the norm.
    ///
    /// The zero quaternion is not guarded against and yields non-finite
    /// components. Use [`Self::try_normalize`] for a checked version.
    pub fn normalize(&mut self) {
        let norm = self.norm();
        if norm == 0.0 {
            log::warn!("Normalizing a zero quaternion, the result will be non-finite");
        }
        self.x /= norm;
        self.y /= norm;
        self.z /= norm;
        self.w /= norm;
    }

    /// Same as [`Self::normalize`].
    #[inline]
    pub fn to_unit(&mut self) {
        self.normalize();
    }

    /// Returns the quaternion divided by its norm. See [`Self::normalize`].
    #[inline]
    pub fn normalized(&self) -> Self {
        let mut result = *self;
        result.normalize();
        result
    }

    /// Like [`Self::normalize`], but leaves the quaternion untouched and
    /// fails if its norm is below [`EPSILON`].
    ///
    /// # Errors
    /// Returns [`QuaternionError::ZeroNorm`] for a (near-)zero quaternion.
    pub fn try_normalize(&mut self) -> Result<(), QuaternionError> {
        self.check_nonzero_norm()?;
        self.normalize();
        Ok(())
    }

    /// Checked version of [`Self::normalized`].
    ///
    /// # Errors
    /// Returns [`QuaternionError::ZeroNorm`] for a (near-)zero quaternion.
    pub fn try_normalized(&self) -> Result<Self, QuaternionError> {
        let mut result = *self;
        result.try_normalize()?;
        Ok(result)
    }

    /// Whether the norm is within [`EPSILON`] of one.
    #[inline]
    pub fn is_unit(&self) -> bool {
        (self.norm() - 1.0).abs() < EPSILON
    }

    /// Whether the quaternion is the identity `(0, 0, 0, 1)` within
    /// [`EPSILON`].
    #[inline]
    pub fn is_identity(&self) -> bool {
        (self.squared_norm() - 1.0).abs() < EPSILON && (self.w - 1.0).abs() < EPSILON
    }

    /// Whether every component differs from the corresponding component of
    /// `other` by strictly less than `threshold`. Returns `false` when
    /// `other` is absent.
    pub fn equals_within(&self, other: Option<&Self>, threshold: f64) -> bool {
        other.is_some_and(|other| {
            self.to_array()
                .into_iter()
                .zip(other.to_array())
                .all(|(a, b)| (a - b).abs() < threshold)
        })
    }

    /// Combines the bit patterns of the components, in the order `x, y, z,
    /// w`, starting from the seed 13 with the multiplier 31.
    pub fn bit_hash(&self) -> u64 {
        self.to_bits().into_iter().fold(HASH_SEED, |hash, bits| {
            hash.wrapping_mul(HASH_MULTIPLIER).wrapping_add(bits)
        })
    }

    /// Returns the conjugate `(-x, -y, -z, w)`.
    #[inline]
    pub fn conjugate(&self) -> Self {
        let mut result = *self;
        result.conjugate_mut();
        result
    }

    /// Replaces the quaternion with its conjugate.
    #[inline]
    pub fn conjugate_mut(&mut self) {
        self.x = -self.x;
        self.y = -self.y;
        self.z = -self.z;
    }

    /// Returns the multiplicative inverse, the conjugate divided by the
    /// squared norm.
    ///
    /// The zero quaternion is not guarded against and yields non-finite
    /// components. Use [`Self::try_inverse`] for a checked version.
    #[inline]
    pub fn inverse(&self) -> Self {
        let mut result = *self;
        result.invert();
        result
    }

    /// Replaces the quaternion with its inverse. See [`Self::inverse`].
    pub fn invert(&mut self) {
        let squared_norm = self.squared_norm();
        if squared_norm == 0.0 {
            log::warn!("Inverting a zero quaternion, the result will be non-finite");
        }
        self.conjugate_mut();
        *self *= 1.0 / squared_norm;
    }

    /// Checked version of [`Self::inverse`].
    ///
    /// # Errors
    /// Returns [`QuaternionError::ZeroNorm`] if the norm is below
    /// [`EPSILON`].
    pub fn try_inverse(&self) -> Result<Self, QuaternionError> {
        let mut result = *self;
        result.try_invert()?;
        Ok(result)
    }

    /// Checked version of [`Self::invert`]. The quaternion is left untouched
    /// on failure.
    ///
    /// # Errors
    /// Returns [`QuaternionError::ZeroNorm`] if the norm is below
    /// [`EPSILON`].
    pub fn try_invert(&mut self) -> Result<(), QuaternionError> {
        self.check_nonzero_norm()?;
        self.invert();
        Ok(())
    }

    /// Computes the quaternion exponential.
    ///
    /// With `v` the vector part and `n = |v|`, the result is
    /// `e^w (v sin(n) / n, cos(n))`. When `n` is below [`EPSILON`] the
    /// direction of `v` is undefined and the result is the real number
    /// `e^w`.
    pub fn exp(&self) -> Self {
        let vector_norm = self.vector_norm();
        let exp_w = self.w.exp();

        if vector_norm < EPSILON {
            log::debug!("Vanishing vector part in quaternion exponential, using real exponential");
            return Self::from_real(exp_w);
        }

        let scale = vector_norm.sin() / vector_norm * exp_w;
        Self::new(
            self.x * scale,
            self.y * scale,
            self.z * scale,
            vector_norm.cos() * exp_w,
        )
    }

    /// Computes the principal quaternion logarithm.
    ///
    /// With `q = |self|`, `v` the vector part and `n = |v|`, the result is
    /// `(v acos(w / q) / n, ln(q))`, with a zero vector part when `n` is below
    /// [`EPSILON`]. This is the inverse of [`Self::exp`] on the principal
    /// branch.
    ///
    /// # Errors
    /// Returns [`QuaternionError::LogarithmOfZero`] if the norm is below
    /// [`EPSILON`].
    pub fn ln(&self) -> Result<Self, QuaternionError> {
        let norm = self.norm();
        if norm < EPSILON {
            return Err(QuaternionError::LogarithmOfZero { norm });
        }

        let real = norm.ln();
        let vector_norm = self.vector_norm();

        if vector_norm < EPSILON {
            log::debug!("Vanishing vector part in quaternion logarithm, using real logarithm");
            return Ok(Self::from_real(real));
        }

        // Rounding can push the ratio marginally outside the domain of acos
        let scale = (self.w / norm).clamp(-1.0, 1.0).acos() / vector_norm;
        Ok(Self::new(
            self.x * scale,
            self.y * scale,
            self.z * scale,
            real,
        ))
    }

    /// Computes the rotation matrix for the quaternion. The quaternion need
    /// not be of unit norm, as every element is divided by the squared norm.
    pub fn rotation_matrix(&self) -> Matrix3 {
        let Self { x, y, z, w } = *self;
        let squared_norm = self.squared_norm();

        Matrix3::from_rows([
            [
                squared_norm - 2.0 * (y * y + z * z),
                2.0 * (x * y - z * w),
                2.0 * (x * z + y * w),
            ],
            [
                2.0 * (x * y + z * w),
                squared_norm - 2.0 * (x * x + z * z),
                2.0 * (y * z - x * w),
            ],
            [
                2.0 * (x * z - y * w),
                2.0 * (y * z + x * w),
                squared_norm - 2.0 * (x * x + y * y),
            ],
        ])
        .mapped(|element| element / squared_norm)
    }

    /// Rotates the given vector by the rotation matrix of the quaternion.
    #[inline]
    pub fn rotate_vector(&self, vector: &[f64; 3]) -> [f64; 3] {
        self.rotation_matrix().mul_vector(vector)
    }

    /// Rotates the given vector, which must have exactly three components.
    ///
    /// # Errors
    /// Returns [`QuaternionError::InvalidVectorLength`] if the slice does not
    /// have three components.
    pub fn rotate(&self, vector: &[f64]) -> Result<[f64; 3], QuaternionError> {
        let vector = expect_vector3(vector)?;
        Ok(self.rotate_vector(&vector))
    }

    /// Like [`Self::rotate`], for callers whose vector may be absent.
    ///
    /// # Errors
    /// Returns [`QuaternionError::MissingVector`] if `vector` is [`None`] and
    /// [`QuaternionError::InvalidVectorLength`] if it does not have three
    /// components.
    pub fn rotate_optional(&self, vector: Option<&[f64]>) -> Result<[f64; 3], QuaternionError> {
        self.rotate(vector.ok_or(QuaternionError::MissingVector)?)
    }

    /// The rotation angle, in `[0, 2π]`, of the normalized quaternion.
    pub fn angle(&self) -> Radians {
        let unit = self.normalized();
        Radians(2.0 * unit.vector_norm().atan2(unit.w))
    }

    /// The rotation angle in degrees. See [`Self::angle`].
    #[inline]
    pub fn angle_in_degrees(&self) -> Degrees {
        self.angle().as_degrees()
    }

    /// The unit axis of rotation.
    ///
    /// A rotation by zero or a full turn has no well-defined axis, in which
    /// case the zero vector is returned.
    pub fn rotation_axis(&self) -> [f64; 3] {
        let angle = self.angle().radians();

        // A full turn is as degenerate as no turn
        if angle.abs() > EPSILON && (TAU - angle).abs() > EPSILON {
            let denominator = self.norm() * (0.5 * angle).sin();
            self.vector_part().map(|component| component / denominator)
        } else {
            log::debug!("Rotation angle {angle} has no well-defined axis");
            [0.0; 3]
        }
    }

    /// Creates the rotation by `angle` about `axis`, which must have exactly
    /// three components. The axis does not need to be normalized, and the
    /// caller's slice is never modified.
    ///
    /// An axis with norm below [`EPSILON`] gives the identity.
    ///
    /// # Errors
    /// Returns [`QuaternionError::InvalidVectorLength`] if the slice does not
    /// have three components.
    pub fn from_axis_angle<A: Angle>(axis: &[f64], angle: A) -> Result<Self, QuaternionError> {
        let [ax, ay, az] = expect_vector3(axis)?;
        let axis_norm = ax.hypot(ay).hypot(az);

        if axis_norm < EPSILON {
            log::debug!("Rotation axis has vanishing norm, using identity rotation");
            return Ok(Self::identity());
        }

        let unit_axis = [ax / axis_norm, ay / axis_norm, az / axis_norm];
        let half_angle = 0.5 * angle.radians();
        let sin_half_angle = half_angle.sin();

        Ok(Self::from_parts(
            half_angle.cos(),
            unit_axis.map(|component| component * sin_half_angle),
        ))
    }

    /// Creates the rotation that first rolls about x, then pitches about y
    /// and finally yaws about z, so that the result equals
    /// `yaw * pitch * roll`. All angles are in radians.
    pub fn from_euler_angles(roll: f64, pitch: f64, yaw: f64) -> Self {
        let (sr, cr) = (0.5 * roll).sin_cos();
        let (sp, cp) = (0.5 * pitch).sin_cos();
        let (sy, cy) = (0.5 * yaw).sin_cos();

        Self::new(
            sr * cp * cy - cr * sp * sy,
            cr * sp * cy + sr * cp * sy,
            cr * cp * sy - sr * sp * cy,
            cr * cp * cy + sr * sp * sy,
        )
    }

    /// Computes the `(roll, pitch, yaw)` angles such that
    /// [`Self::from_euler_angles`] gives the same rotation. The pitch lies in
    /// `[-π/2, π/2]` and the roll and yaw in `[-π, π]`.
    pub fn euler_angles(&self) -> (f64, f64, f64) {
        let Self { x, y, z, w } = *self;
        let squared_norm = self.squared_norm();

        let roll = (2.0 * (w * x + y * z)).atan2(squared_norm - 2.0 * (x * x + y * y));
        let pitch = (2.0 * (w * y - z * x) / squared_norm)
            .clamp(-1.0, 1.0)
            .asin();
        let yaw = (2.0 * (w * z + x * y)).atan2(squared_norm - 2.0 * (y * y + z * z));

        (roll, pitch, yaw)
    }

    /// Interpolates component-wise as `from + (to - from) t`. The result is
    /// not renormalized. At `t = 0` and `t = 1` the respective endpoint is
    /// returned exactly.
    ///
    /// # Errors
    /// Returns [`QuaternionError::InterpolationParameterOutOfRange`] if `t`
    /// is not in `[0, 1]`.
    pub fn lerp(from: &Self, to: &Self, t: f64) -> Result<Self, QuaternionError> {
        check_interpolation_parameter(t)?;

        if t == 0.0 {
            Ok(*from)
        } else if t == 1.0 {
            Ok(*to)
        } else {
            Ok(from + (to - from) * t)
        }
    }

    /// Interpolates along the shortest great arc between the normalized
    /// rotations `from` and `to`, at constant angular velocity in `t`.
    ///
    /// # Errors
    /// Returns [`QuaternionError::InterpolationParameterOutOfRange`] if `t`
    /// is not in `[0, 1]`, and [`QuaternionError::ZeroNorm`] if either input
    /// has a norm below [`EPSILON`].
    pub fn slerp(from: &Self, to: &Self, t: f64) -> Result<Self, QuaternionError> {
        check_interpolation_parameter(t)?;

        let from = from.try_normalized()?;
        let mut to = to.try_normalized()?;

        let mut cos_angle = from.dot(&to);
        if cos_angle < 0.0 {
            to = -to;
            cos_angle = -cos_angle;
        }

        if cos_angle > SLERP_LINEAR_COS_THRESHOLD {
            return Ok((from + (to - from) * t).normalized());
        }

        let angle = cos_angle.acos();
        let sin_angle = angle.sin();
        let from_weight = ((1.0 - t) * angle).sin() / sin_angle;
        let to_weight = (t * angle).sin() / sin_angle;

        Ok(from * from_weight + to * to_weight)
    }

    fn vector_norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    fn to_bits(self) -> [u64; 4] {
        self.to_array().map(f64::to_bits)
    }

    fn check_nonzero_norm(&self) -> Result<(), QuaternionError> {
        if self.norm() < EPSILON {
            Err(QuaternionError::ZeroNorm)
        } else {
            Ok(())
        }
    }
}

fn check_interpolation_parameter(t: f64) -> Result<(), QuaternionError> {
    if (0.0..=1.0).contains(&t) {
        Ok(())
    } else {
        Err(QuaternionError::InterpolationParameterOutOfRange { t })
    }
}

/// Hamilton product `a * b`.
#[inline]
fn hamilton_product(a: &Quaternion, b: &Quaternion) -> Quaternion {
    Quaternion::new(
        a.w * b.x + a.x * b.w + a.y * b.z - a.z * b.y,
        a.w * b.y - a.x * b.z + a.y * b.w + a.z * b.x,
        a.w * b.z + a.x * b.y - a.y * b.x + a.z * b.w,
        a.w * b.w - a.x * b.x - a.y * b.y - a.z * b.z,
    )
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}

impl PartialEq for Quaternion {
    fn eq(&self, other: &Self) -> bool {
        self.to_bits() == other.to_bits()
    }
}

impl Eq for Quaternion {}

impl Hash for Quaternion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_bits().hash(state);
    }
}

impl fmt::Display for Quaternion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Quaternion({:.6}, {:.6}, {:.6}, {:.6})",
            self.x, self.y, self.z, self.w
        )
    }
}

impl From<[f64; 4]> for Quaternion {
    fn from([x, y, z, w]: [f64; 4]) -> Self {
        Self::new(x, y, z, w)
    }
}

impl From<Quaternion> for [f64; 4] {
    fn from(quaternion: Quaternion) -> Self {
        quaternion.to_array()
    }
}

impl_binop!(Add, add, Quaternion, Quaternion, Quaternion, |a, b| {
    let mut result = *a;
    result += b;
    result
});

impl_binop_assign!(AddAssign, add_assign, Quaternion, Quaternion, |a, b| {
    a.x += b.x;
    a.y += b.y;
    a.z += b.z;
    a.w += b.w;
});

impl_binop!(Sub, sub, Quaternion, Quaternion, Quaternion, |a, b| {
    let mut result = *a;
    result -= b;
    result
});

impl_binop_assign!(SubAssign, sub_assign, Quaternion, Quaternion, |a, b| {
    a.x -= b.x;
    a.y -= b.y;
    a.z -= b.z;
    a.w -= b.w;
});

impl_binop!(Mul, mul, Quaternion, Quaternion, Quaternion, |a, b| {
    hamilton_product(a, b)
});

impl_binop_assign!(MulAssign, mul_assign, Quaternion, Quaternion, |a, b| {
    *a = hamilton_product(a, b);
});

impl_binop!(Div, div, Quaternion, Quaternion, Quaternion, |a, b| {
    hamilton_product(a, &b.inverse())
});

impl_binop_assign!(DivAssign, div_assign, Quaternion, Quaternion, |a, b| {
    *a = hamilton_product(a, &b.inverse());
});

impl_scalar_binop!(Mul, mul, Quaternion, |a, s| {
    let mut result = *a;
    result *= s;
    result
});

impl ::std::ops::MulAssign<f64> for Quaternion {
    #[inline]
    fn mul_assign(&mut self, rhs: f64) {
        self.x *= rhs;
        self.y *= rhs;
        self.z *= rhs;
        self.w *= rhs;
    }
}

impl_scalar_binop!(Div, div, Quaternion, |a, s| {
    let mut result = *a;
    result /= s;
    result
});

impl ::std::ops::DivAssign<f64> for Quaternion {
    #[inline]
    fn div_assign(&mut self, rhs: f64) {
        self.x /= rhs;
        self.y /= rhs;
        self.z /= rhs;
        self.w /= rhs;
    }
}

impl_unary_op!(Neg, neg, Quaternion, Quaternion, |a| {
    Quaternion::new(-a.x, -a.y, -a.z, -a.w)
});

impl_abs_diff_eq!(Quaternion, |a, b, epsilon| {
    a.to_array()
        .into_iter()
        .zip(b.to_array())
        .all(|(a, b)| a.abs_diff_eq(&b, epsilon))
});

impl_relative_eq!(Quaternion, |a, b, epsilon, max_relative| {
    a.to_array()
        .into_iter()
        .zip(b.to_array())
        .all(|(a, b)| a.relative_eq(&b, epsilon, max_relative))
});

impl_ulps_eq!(Quaternion, |a, b, epsilon, max_ulps| {
    a.to_array()
        .into_iter()
        .zip(b.to_array())
        .all(|(a, b)| a.ulps_eq(&b, epsilon, max_ulps))
});
