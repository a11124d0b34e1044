//! Oriented frames handed over by the host geometry kernel
//!
//! A pose is an origin plus a right-handed orthonormal frame. Orientation is
//! always relative to the world frame: origin (0,0,0), x = (1,0,0), z "up" = (0,0,1).

use cgmath::{InnerSpace, Matrix3, Point3, Quaternion, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uom::si::f64::Length;
use uom::si::length::{centimeter, inch, meter, millimeter};

/// Axes shorter than this are treated as zero-length
const AXIS_EPSILON: f64 = 1e-9;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("{axis} axis has zero length")]
    DegenerateAxis { axis: &'static str },

    #[error("x and y axes are parallel, frame is undefined")]
    ParallelAxes,

    #[error("quaternion has zero length")]
    DegenerateQuaternion,

    #[error("non-finite {what} in pose input")]
    NonFinite { what: &'static str },
}

/// Oriented frame in 3D space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    origin: Point3<f64>,
    /// Columns are the frame's x, y and z axes in world coordinates
    frame: Matrix3<f64>,
}

impl Pose {
    /// The world reference frame itself
    pub fn world() -> Self {
        Self {
            origin: Point3::new(0.0, 0.0, 0.0),
            frame: Matrix3::from_cols(Vector3::unit_x(), Vector3::unit_y(), Vector3::unit_z()),
        }
    }

    /// Build a pose from an origin and two in-plane axes.
    ///
    /// The y axis only has to be roughly perpendicular to x: it is
    /// re-orthogonalised against x, and z is derived as x × y.
    pub fn from_axes(
        origin: Point3<f64>,
        x_axis: Vector3<f64>,
        y_axis: Vector3<f64>,
    ) -> Result<Self, GeometryError> {
        check_point(origin)?;
        check_vector(x_axis, "axis")?;
        check_vector(y_axis, "axis")?;

        if x_axis.magnitude() < AXIS_EPSILON {
            return Err(GeometryError::DegenerateAxis { axis: "x" });
        }
        if y_axis.magnitude() < AXIS_EPSILON {
            return Err(GeometryError::DegenerateAxis { axis: "y" });
        }

        let x = x_axis.normalize();
        let y_perp = y_axis - x * y_axis.dot(x);
        if y_perp.magnitude() < AXIS_EPSILON * y_axis.magnitude().max(1.0) {
            return Err(GeometryError::ParallelAxes);
        }
        let y = y_perp.normalize();
        let z = x.cross(y);

        Ok(Self {
            origin,
            frame: Matrix3::from_cols(x, y, z),
        })
    }

    /// Build a pose from an origin and a rotation quaternion (w, x, y, z).
    /// The quaternion does not have to be normalised.
    pub fn from_quaternion(origin: Point3<f64>, rotation: Quaternion<f64>) -> Result<Self, GeometryError> {
        check_point(origin)?;
        if !(rotation.s.is_finite() && rotation.v.x.is_finite() && rotation.v.y.is_finite() && rotation.v.z.is_finite()) {
            return Err(GeometryError::NonFinite { what: "quaternion" });
        }
        if rotation.magnitude() < AXIS_EPSILON {
            return Err(GeometryError::DegenerateQuaternion);
        }

        Ok(Self {
            origin,
            frame: Matrix3::from(rotation.normalize()),
        })
    }

    pub fn origin(&self) -> Point3<f64> {
        self.origin
    }

    pub fn x_axis(&self) -> Vector3<f64> {
        self.frame.x
    }

    pub fn y_axis(&self) -> Vector3<f64> {
        self.frame.y
    }

    pub fn z_axis(&self) -> Vector3<f64> {
        self.frame.z
    }

    /// Unit quaternion rotating the world frame onto this pose's frame.
    /// Sign is whatever the matrix conversion yields; callers that need a
    /// canonical sign must normalise it themselves.
    pub fn rotation_from_world(&self) -> Quaternion<f64> {
        Quaternion::from(self.frame).normalize()
    }

    /// Same frame, origin scaled by `factor`. Used for unit conversion.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            origin: Point3::new(self.origin.x * factor, self.origin.y * factor, self.origin.z * factor),
            frame: self.frame,
        }
    }
}

/// Length unit of incoming coordinates. RAPID targets are always millimetres.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum LengthUnit {
    #[serde(rename = "mm", alias = "millimeter", alias = "MM")]
    #[default]
    Millimeter,
    #[serde(rename = "cm", alias = "centimeter", alias = "CM")]
    Centimeter,
    #[serde(rename = "m", alias = "meter", alias = "M")]
    Meter,
    #[serde(rename = "in", alias = "inch", alias = "IN")]
    Inch,
}

impl LengthUnit {
    /// Convert a single coordinate in this unit to millimetres
    pub fn to_millimeters(self, value: f64) -> f64 {
        let length = match self {
            LengthUnit::Millimeter => return value,
            LengthUnit::Centimeter => Length::new::<centimeter>(value),
            LengthUnit::Meter => Length::new::<meter>(value),
            LengthUnit::Inch => Length::new::<inch>(value),
        };
        length.get::<millimeter>()
    }

    /// Re-express a pose given in this unit in millimetres
    pub fn pose_to_millimeters(self, pose: &Pose) -> Pose {
        pose.scaled(self.to_millimeters(1.0))
    }
}

fn check_point(p: Point3<f64>) -> Result<(), GeometryError> {
    if p.x.is_finite() && p.y.is_finite() && p.z.is_finite() {
        Ok(())
    } else {
        Err(GeometryError::NonFinite { what: "origin" })
    }
}

fn check_vector(v: Vector3<f64>, what: &'static str) -> Result<(), GeometryError> {
    if v.x.is_finite() && v.y.is_finite() && v.z.is_finite() {
        Ok(())
    } else {
        Err(GeometryError::NonFinite { what })
    }
}
