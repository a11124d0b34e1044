//! RAPID module composer
//! Resolves per-move parameters and assembles the program text

use std::fmt;

use thiserror::Error;
use tracing::info;

use crate::encoder::{self, EncodeError, EncodedTarget, CONFIG_VAR, EXTAX_VAR};
use crate::geometry::Pose;

pub const MOVE_VERB: &str = "MoveL";
pub const DEFAULT_TOOL: &str = "tool0";
pub const WOBJ_PREFIX: &str = "\\WObj:=";

const PROC_START: &str = "PROC main()";
const PROC_END: &str = "ENDPROC";
const MODULE_END: &str = "ENDMODULE";
/// Robot may not switch arm configuration between linear / joint targets
const CONF_L_OFF: &str = "ConfL \\Off;";
const CONF_J_OFF: &str = "ConfJ \\Off;";

fn config_declaration() -> String {
    format!("VAR confdata {} := [0,-1,-1,0];", CONFIG_VAR)
}

fn extax_declaration() -> String {
    format!("VAR extjoint {} := [9E9,9E9,9E9,9E9,9E9,9E9];", EXTAX_VAR)
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComposeError {
    #[error("{field} list is empty but {moves} move(s) need a value (at least one {field} value is required)")]
    MissingParameter { field: &'static str, moves: usize },

    #[error("empty path: no poses and no {field} value supplied")]
    EmptyPath { field: &'static str },

    #[error("no {field} value for move {index}")]
    Unresolved { field: &'static str, index: usize },

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// What to do for a move index when the caller supplied no value at all
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// Field is mandatory; an empty list is a precondition violation
    Required,
    /// Use this literal
    Default(&'static str),
    /// Leave the field out of the instruction
    Omit,
}

/// Pick the value for move `index`.
///
/// In range -> `values[index]`; past the end -> last value (clamp, no wrap);
/// empty -> the fallback. `Ok(None)` means the field is omitted.
pub fn resolve<'a>(
    values: &'a [String],
    index: usize,
    fallback: Fallback,
    field: &'static str,
) -> Result<Option<&'a str>, ComposeError> {
    match values.get(index).or_else(|| values.last()) {
        Some(value) => Ok(Some(value.as_str())),
        None => match fallback {
            Fallback::Required => Err(ComposeError::Unresolved { field, index }),
            Fallback::Default(literal) => Ok(Some(literal)),
            Fallback::Omit => Ok(None),
        },
    }
}

/// Fields whose fallback never omits must have resolved to a value
fn present<'a>(value: Option<&'a str>, field: &'static str, index: usize) -> Result<&'a str, ComposeError> {
    value.ok_or(ComposeError::Unresolved { field, index })
}

/// Per-move parameter lists. Each may be shorter than the move count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoveParameters {
    pub speed: Vec<String>,
    pub zone: Vec<String>,
    pub tool: Vec<String>,
    pub work_object: Vec<String>,
}

impl MoveParameters {
    /// One speed and one zone for every move, default tool, no work object
    pub fn uniform(speed: &str, zone: &str) -> Self {
        Self {
            speed: vec![speed.to_string()],
            zone: vec![zone.to_string()],
            ..Self::default()
        }
    }

    pub fn with_tool(mut self, tool: &str) -> Self {
        self.tool = vec![tool.to_string()];
        self
    }

    pub fn with_work_object(mut self, work_object: &str) -> Self {
        self.work_object = vec![work_object.to_string()];
        self
    }

    fn fields(&self) -> [(&'static str, &[String], Fallback); 4] {
        [
            ("speed", self.speed.as_slice(), Fallback::Required),
            ("zone", self.zone.as_slice(), Fallback::Required),
            ("tool", self.tool.as_slice(), Fallback::Default(DEFAULT_TOOL)),
            ("work object", self.work_object.as_slice(), Fallback::Omit),
        ]
    }

    /// Fail fast on anything that would make move resolution impossible
    fn check(&self, pose_count: usize) -> Result<(), ComposeError> {
        let moves = pose_count.saturating_sub(1);
        for (field, values, fallback) in self.fields() {
            if fallback != Fallback::Required || !values.is_empty() {
                continue;
            }
            if pose_count == 0 {
                return Err(ComposeError::EmptyPath { field });
            }
            if moves > 0 {
                return Err(ComposeError::MissingParameter { field, moves });
            }
        }
        Ok(())
    }

    /// Build the instruction for move `index` towards `target`
    fn instruction(&self, index: usize, target: &EncodedTarget) -> Result<String, ComposeError> {
        let [speed, zone, tool, wobj] = self
            .fields()
            .map(|(field, values, fallback)| resolve(values, index, fallback, field));

        let speed = present(speed?, "speed", index)?;
        let zone = present(zone?, "zone", index)?;
        let tool = present(tool?, "tool", index)?;
        let wobj = wobj?.map(|w| format!("{}{}", WOBJ_PREFIX, w)).unwrap_or_default();

        Ok(format!("{} {},{},{},{}{};", MOVE_VERB, target, speed, zone, tool, wobj))
    }
}

/// Finished RAPID module, one entry per line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RapidProgram {
    pub lines: Vec<String>,
    moves: usize,
}

impl RapidProgram {
    fn new() -> Self {
        Self::default()
    }

    fn emit(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    fn emit_move(&mut self, line: String) {
        self.lines.push(line);
        self.moves += 1;
    }

    /// Number of move instructions in the module
    pub fn move_count(&self) -> usize {
        self.moves
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

impl fmt::Display for RapidProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lines.join("\n"))
    }
}

/// Builds a RAPID module from a pose path
#[derive(Debug, Clone)]
pub struct ProgramComposer {
    module_name: String,
    parameters: MoveParameters,
    declarations: Vec<String>,
}

impl ProgramComposer {
    pub fn new(module_name: &str, parameters: MoveParameters) -> Self {
        Self {
            module_name: module_name.to_string(),
            parameters,
            declarations: Vec::new(),
        }
    }

    /// Extra module-level lines emitted verbatim after the fixed declarations
    pub fn with_declarations(mut self, declarations: Vec<String>) -> Self {
        self.declarations = declarations;
        self
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    /// Encode every pose, then assemble. Nothing is returned on failure.
    pub fn compose(&self, poses: &[Pose]) -> Result<RapidProgram, ComposeError> {
        self.parameters.check(poses.len())?;
        let targets = encoder::encode_all(poses)?;
        self.assemble(&targets)
    }

    /// Assemble from targets that were already encoded
    pub fn compose_targets(&self, targets: &[EncodedTarget]) -> Result<RapidProgram, ComposeError> {
        self.parameters.check(targets.len())?;
        self.assemble(targets)
    }

    fn assemble(&self, targets: &[EncodedTarget]) -> Result<RapidProgram, ComposeError> {
        let mut program = RapidProgram::new();

        program.emit(format!("MODULE {}", self.module_name));
        program.emit(config_declaration());
        program.emit(extax_declaration());
        for declaration in &self.declarations {
            program.emit(declaration.as_str());
        }

        program.emit(PROC_START);
        program.emit(CONF_L_OFF);
        program.emit(CONF_J_OFF);

        // The last target closes the path and gets no move of its own
        let moves = targets.len().saturating_sub(1);
        for (index, target) in targets.iter().take(moves).enumerate() {
            program.emit_move(self.parameters.instruction(index, target)?);
        }

        program.emit(PROC_END);
        program.emit(MODULE_END);

        info!(
            module = %self.module_name,
            targets = targets.len(),
            moves = program.move_count(),
            "composed RAPID module"
        );
        Ok(program)
    }
}

/// One-shot entry point: name, path, parameters and extra declarations in,
/// complete module out.
pub fn generate_rapid_file(
    module_name: &str,
    poses: &[Pose],
    parameters: &MoveParameters,
    declarations: &[String],
) -> Result<Vec<String>, ComposeError> {
    ProgramComposer::new(module_name, parameters.clone())
        .with_declarations(declarations.to_vec())
        .compose(poses)
        .map(RapidProgram::into_lines)
}
