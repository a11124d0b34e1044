//! Pose paths to ABB RAPID motion modules
//!
//! A path of oriented frames is encoded into inline robtargets and wrapped in a
//! `MODULE ... ENDMODULE` with one `MoveL` per consecutive pose pair.

pub mod composer;
pub mod encoder;
pub mod geometry;
pub mod job;
pub mod validator;

pub use composer::{generate_rapid_file, ComposeError, Fallback, MoveParameters, ProgramComposer, RapidProgram};
pub use encoder::{encode, encode_all, EncodeError, EncodedTarget};
pub use geometry::{GeometryError, LengthUnit, Pose};
pub use job::{Job, JobError};
