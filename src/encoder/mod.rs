//! Pose -> robtarget literal
//!
//! Every target is written inline as
//! `[[x,y,z],[q1,q2,q3,q4],cf,ex]`: position in millimetres with two decimals,
//! orientation as a scalar-first unit quaternion with six decimals. The robot
//! configuration and external axes are never computed here; both fields point
//! at module-level variables declared once by the composer.

use std::fmt;

use thiserror::Error;
use tracing::debug;

use crate::geometry::Pose;

/// Module variable holding the "no active configuration" confdata
pub const CONFIG_VAR: &str = "cf";
/// Module variable holding the "no external axes" extjoint
pub const EXTAX_VAR: &str = "ex";

pub const POSITION_DECIMALS: usize = 2;
pub const ORIENTATION_DECIMALS: usize = 6;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodeError {
    #[error("pose {index}: non-finite {what}, cannot build robtarget")]
    NonFinite { index: usize, what: &'static str },
}

/// Controller-ready representation of one pose
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodedTarget {
    /// x, y, z in millimetres
    pub position: [f64; 3],
    /// q1..q4 = w, x, y, z
    pub orientation: [f64; 4],
}

impl EncodedTarget {
    pub fn position_literal(&self) -> String {
        join_fixed(&self.position, POSITION_DECIMALS)
    }

    pub fn orientation_literal(&self) -> String {
        join_fixed(&self.orientation, ORIENTATION_DECIMALS)
    }
}

impl fmt::Display for EncodedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[[{}],[{}],{},{}]",
            self.position_literal(),
            self.orientation_literal(),
            CONFIG_VAR,
            EXTAX_VAR
        )
    }
}

/// Encode a single pose
pub fn encode(pose: &Pose) -> Result<EncodedTarget, EncodeError> {
    encode_indexed(0, pose)
}

/// Encode a whole path, stopping at the first pose that cannot be encoded
pub fn encode_all(poses: &[Pose]) -> Result<Vec<EncodedTarget>, EncodeError> {
    poses
        .iter()
        .enumerate()
        .map(|(i, pose)| encode_indexed(i, pose))
        .collect()
}

fn encode_indexed(index: usize, pose: &Pose) -> Result<EncodedTarget, EncodeError> {
    let origin = pose.origin();
    let position = [origin.x, origin.y, origin.z];
    if position.iter().any(|v| !v.is_finite()) {
        return Err(EncodeError::NonFinite { index, what: "position" });
    }

    let q = pose.rotation_from_world();
    let orientation = canonical_sign([q.s, q.v.x, q.v.y, q.v.z]);
    if orientation.iter().any(|v| !v.is_finite()) {
        return Err(EncodeError::NonFinite { index, what: "orientation" });
    }

    let target = EncodedTarget { position, orientation };
    debug!(index, target = %target, "encoded pose");
    Ok(target)
}

/// q and -q describe the same rotation. The first component that is non-zero
/// at printed precision must be positive; components that round to zero have
/// no say, so noise like q1 = ±1e-9 cannot flip the whole literal.
fn canonical_sign(q: [f64; 4]) -> [f64; 4] {
    let leading = q
        .iter()
        .copied()
        .find(|c| prints_nonzero(*c, ORIENTATION_DECIMALS))
        .unwrap_or(0.0);
    if leading < 0.0 {
        q.map(|c| -c)
    } else {
        q
    }
}

fn prints_nonzero(value: f64, decimals: usize) -> bool {
    fixed(value, decimals).bytes().any(|b| matches!(b, b'1'..=b'9'))
}

fn join_fixed(values: &[f64], decimals: usize) -> String {
    values
        .iter()
        .map(|v| fixed(*v, decimals))
        .collect::<Vec<_>>()
        .join(",")
}

/// Fixed-point text with a `.` separator. Values that round to zero are
/// written unsigned, the controller has no use for `-0.00`.
pub fn fixed(value: f64, decimals: usize) -> String {
    let text = format!("{:.*}", decimals, value);
    match text.strip_prefix('-') {
        Some(rest) if rest.chars().all(|c| c == '0' || c == '.') => rest.to_string(),
        _ => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Point3, Quaternion, Vector3};

    #[test]
    fn test_world_pose_literal() {
        let target = encode(&Pose::world()).unwrap();
        assert_eq!(
            target.to_string(),
            "[[0.00,0.00,0.00],[1.000000,0.000000,0.000000,0.000000],cf,ex]"
        );
    }

    #[test]
    fn test_position_rounding() {
        let pose = Pose::from_axes(
            Point3::new(1234.5678, -0.004, 10.0),
            Vector3::unit_x(),
            Vector3::unit_y(),
        )
        .unwrap();
        let target = encode(&pose).unwrap();
        assert_eq!(target.position_literal(), "1234.57,0.00,10.00");
    }

    #[test]
    fn test_flipped_tool_orientation() {
        // Tool pointing down: 180 degrees about x
        let pose = Pose::from_axes(
            Point3::new(500.0, 0.0, 300.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, -1.0, 0.0),
        )
        .unwrap();
        let target = encode(&pose).unwrap();
        assert_eq!(
            target.to_string(),
            "[[500.00,0.00,300.00],[0.000000,1.000000,0.000000,0.000000],cf,ex]"
        );
    }

    #[test]
    fn test_quarter_turn_about_z() {
        let half = std::f64::consts::FRAC_1_SQRT_2;
        let pose = Pose::from_axes(Point3::new(0.0, 0.0, 0.0), Vector3::unit_y(), -Vector3::unit_x()).unwrap();
        let target = encode(&pose).unwrap();

        assert!((target.orientation[0] - half).abs() < 1e-12);
        assert!((target.orientation[3] - half).abs() < 1e-12);
        assert_eq!(target.orientation_literal(), "0.707107,0.000000,0.000000,0.707107");
    }

    #[test]
    fn test_sign_is_canonical() {
        // Feeding -q must give the same literal as q
        let q = Quaternion::new(0.5, 0.5, -0.5, 0.5);
        let neg = Quaternion::new(-0.5, -0.5, 0.5, -0.5);
        let a = encode(&Pose::from_quaternion(Point3::new(1.0, 2.0, 3.0), q).unwrap()).unwrap();
        let b = encode(&Pose::from_quaternion(Point3::new(1.0, 2.0, 3.0), neg).unwrap()).unwrap();

        assert_eq!(a.to_string(), b.to_string());
        assert!(a.orientation[0] >= 0.0);
    }

    #[test]
    fn test_sign_ignores_components_below_precision() {
        // Both frames are a half turn about x, q1 differs only by noise
        let a = Pose::from_quaternion(Point3::new(0.0, 0.0, 0.0), Quaternion::new(1e-9, -1.0, 0.0, 0.0)).unwrap();
        let b = Pose::from_quaternion(Point3::new(0.0, 0.0, 0.0), Quaternion::new(-1e-9, -1.0, 0.0, 0.0)).unwrap();

        let a = encode(&a).unwrap().orientation_literal();
        let b = encode(&b).unwrap().orientation_literal();
        assert_eq!(a, "0.000000,1.000000,0.000000,0.000000");
        assert_eq!(a, b);

        assert_eq!(
            canonical_sign([1e-9, -1.0, 0.0, 0.0]).map(|c| fixed(c, ORIENTATION_DECIMALS)),
            ["0.000000", "1.000000", "0.000000", "0.000000"].map(String::from)
        );
    }

    #[test]
    fn test_orientation_is_unit_length() {
        let pose = Pose::from_axes(
            Point3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 0.0),
            Vector3::new(0.0, 0.3, 1.0),
        )
        .unwrap();
        let q = encode(&pose).unwrap().orientation;
        let norm: f64 = q.iter().map(|c| c * c).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_literal_reparses_within_precision() {
        let pose = Pose::from_axes(
            Point3::new(-812.3456, 0.125, 99999.994),
            Vector3::new(0.3, -0.2, 0.9),
            Vector3::new(0.0, 1.0, 0.0),
        )
        .unwrap();
        let target = encode(&pose).unwrap();

        let position: Vec<f64> = target
            .position_literal()
            .split(',')
            .map(|s| s.parse().unwrap())
            .collect();
        for (parsed, source) in position.iter().zip(target.position) {
            assert!((parsed - source).abs() <= 0.005 + 1e-9);
        }

        let orientation: Vec<f64> = target
            .orientation_literal()
            .split(',')
            .map(|s| s.parse().unwrap())
            .collect();
        for (parsed, source) in orientation.iter().zip(target.orientation) {
            assert!((parsed - source).abs() <= 0.0000005 + 1e-12);
        }
    }

    #[test]
    fn test_large_values_stay_fixed_point() {
        assert_eq!(fixed(1.0e12, 2), "1000000000000.00");
        assert_eq!(fixed(1.0e-9, 6), "0.000000");
        assert_eq!(fixed(-1.0e-9, 6), "0.000000");
        assert_eq!(fixed(-0.0, 2), "0.00");
        assert_eq!(fixed(-3.14159, 2), "-3.14");
    }

    #[test]
    fn test_encode_all_preserves_order() {
        let poses: Vec<Pose> = (0..3)
            .map(|i| Pose::from_axes(Point3::new(i as f64, 0.0, 0.0), Vector3::unit_x(), Vector3::unit_y()).unwrap())
            .collect();
        let targets = encode_all(&poses).unwrap();
        let xs: Vec<f64> = targets.iter().map(|t| t.position[0]).collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0]);
    }
}
