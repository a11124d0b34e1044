//! Job file - JSON description of one RAPID module
//!
//! ```json
//! {
//!   "module": "Cut01",
//!   "units": "mm",
//!   "poses": [
//!     { "origin": [0, 0, 100], "x_axis": [1, 0, 0], "y_axis": [0, -1, 0] },
//!     { "origin": [50, 0, 100], "quaternion": [0, 1, 0, 0] }
//!   ],
//!   "speed": ["v200"],
//!   "zone": ["z1"],
//!   "tool": ["tSpindle"],
//!   "work_object": ["wTable"],
//!   "declarations": ["PERS tooldata tSpindle := ..."]
//! }
//! ```

use std::path::Path;

use cgmath::{Point3, Quaternion, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::composer::{ComposeError, MoveParameters, ProgramComposer, RapidProgram};
use crate::geometry::{GeometryError, LengthUnit, Pose};

#[derive(Error, Debug)]
pub enum JobError {
    #[error("failed to read job file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid job file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("pose {index}: {source}")]
    Geometry { index: usize, source: GeometryError },

    #[error(transparent)]
    Compose(#[from] ComposeError),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AxesPose {
    pub origin: [f64; 3],
    pub x_axis: [f64; 3],
    pub y_axis: [f64; 3],
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct QuaternionPose {
    pub origin: [f64; 3],
    /// w, x, y, z
    pub quaternion: [f64; 4],
}

/// One pose as written in the job file. Exactly one orientation form is
/// allowed; a pose carrying both axes and a quaternion matches neither.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum PoseSpec {
    Axes(AxesPose),
    Quaternion(QuaternionPose),
}

impl PoseSpec {
    pub fn to_pose(&self) -> Result<Pose, GeometryError> {
        match self {
            PoseSpec::Axes(axes) => Pose::from_axes(
                Point3::from(axes.origin),
                Vector3::from(axes.x_axis),
                Vector3::from(axes.y_axis),
            ),
            PoseSpec::Quaternion(q) => {
                let [w, x, y, z] = q.quaternion;
                Pose::from_quaternion(Point3::from(q.origin), Quaternion::new(w, x, y, z))
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Job {
    pub module: String,

    /// Unit of every origin in `poses`
    #[serde(default)]
    pub units: LengthUnit,

    pub poses: Vec<PoseSpec>,

    #[serde(default)]
    pub speed: Vec<String>,

    #[serde(default)]
    pub zone: Vec<String>,

    #[serde(default)]
    pub tool: Vec<String>,

    #[serde(default, alias = "wobj")]
    pub work_object: Vec<String>,

    /// Raw module-level lines, copied into the output untouched
    #[serde(default)]
    pub declarations: Vec<String>,
}

impl Job {
    pub fn from_json(source: &str) -> Result<Self, JobError> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, JobError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Build the path in controller millimetres
    pub fn poses(&self) -> Result<Vec<Pose>, JobError> {
        self.poses
            .iter()
            .enumerate()
            .map(|(index, spec)| {
                spec.to_pose()
                    .map(|pose| self.units.pose_to_millimeters(&pose))
                    .map_err(|source| JobError::Geometry { index, source })
            })
            .collect()
    }

    pub fn parameters(&self) -> MoveParameters {
        MoveParameters {
            speed: self.speed.clone(),
            zone: self.zone.clone(),
            tool: self.tool.clone(),
            work_object: self.work_object.clone(),
        }
    }

    pub fn composer(&self) -> ProgramComposer {
        ProgramComposer::new(&self.module, self.parameters()).with_declarations(self.declarations.clone())
    }

    pub fn compose(&self) -> Result<RapidProgram, JobError> {
        let poses = self.poses()?;
        Ok(self.composer().compose(&poses)?)
    }
}
