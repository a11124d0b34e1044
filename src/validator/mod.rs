use thiserror::Error;

use crate::composer::MoveParameters;

/// Longest identifier the RAPID compiler accepts
const MAX_IDENTIFIER_LEN: usize = 32;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("module name {name:?} is not a valid RAPID identifier")]
    ModuleName { name: String },

    #[error("speed #{index} {value:?}: expected v<mm/s>, vmax or a speeddata name")]
    Speed { index: usize, value: String },

    #[error("zone #{index} {value:?}: expected fine, z<mm> or a zonedata name")]
    Zone { index: usize, value: String },

    #[error("tool #{index} {value:?} is not a valid tooldata name")]
    Tool { index: usize, value: String },

    #[error("work object #{index} {value:?} is not a valid wobjdata name")]
    WorkObject { index: usize, value: String },
}

/// Lints a job's tokens. Composition itself never looks at token content;
/// this only exists to catch typos before the controller does.
pub struct Validator {
    max_identifier_len: usize,
}

impl Default for Validator {
    fn default() -> Self {
        Self {
            max_identifier_len: MAX_IDENTIFIER_LEN,
        }
    }
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_identifier_len(max_len: usize) -> Self {
        Self {
            max_identifier_len: max_len,
        }
    }

    pub fn validate(
        &self,
        module_name: &str,
        parameters: &MoveParameters,
    ) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if !self.is_identifier(module_name) {
            errors.push(ValidationError::ModuleName {
                name: module_name.to_string(),
            });
        }

        for (index, value) in parameters.speed.iter().enumerate() {
            if !self.is_speed(value) {
                errors.push(ValidationError::Speed {
                    index,
                    value: value.clone(),
                });
            }
        }

        for (index, value) in parameters.zone.iter().enumerate() {
            if !self.is_zone(value) {
                errors.push(ValidationError::Zone {
                    index,
                    value: value.clone(),
                });
            }
        }

        for (index, value) in parameters.tool.iter().enumerate() {
            if !self.is_identifier(value) {
                errors.push(ValidationError::Tool {
                    index,
                    value: value.clone(),
                });
            }
        }

        for (index, value) in parameters.work_object.iter().enumerate() {
            if !self.is_identifier(value) {
                errors.push(ValidationError::WorkObject {
                    index,
                    value: value.clone(),
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn is_identifier(&self, name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() => {}
            _ => return false,
        }
        name.len() <= self.max_identifier_len
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    // v1000 and vmax are predefined, anything else must name a speeddata
    fn is_speed(&self, value: &str) -> bool {
        self.is_numbered_or_identifier(value, 'v')
    }

    fn is_zone(&self, value: &str) -> bool {
        self.is_numbered_or_identifier(value, 'z')
    }

    /// `<prefix><digits>` must be all digits after the prefix (catches `v10O`),
    /// everything else only has to be an identifier
    fn is_numbered_or_identifier(&self, value: &str, prefix: char) -> bool {
        match value.strip_prefix(prefix) {
            Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => {
                rest.chars().all(|c| c.is_ascii_digit())
            }
            _ => self.is_identifier(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(speed: &[&str], zone: &[&str], tool: &[&str], wobj: &[&str]) -> MoveParameters {
        let owned = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        MoveParameters {
            speed: owned(speed),
            zone: owned(zone),
            tool: owned(tool),
            work_object: owned(wobj),
        }
    }

    #[test]
    fn test_clean_job_passes() {
        let v = Validator::new();
        let p = params(&["v1000", "vmax"], &["z10", "fine"], &["tool0"], &["wobj_table"]);
        assert!(v.validate("Cut_01", &p).is_ok());
    }

    #[test]
    fn test_collects_every_finding() {
        let v = Validator::new();
        let p = params(&["1000"], &["z 10"], &["tool-1"], &["2nd"]);
        let errors = v.validate("my module", &p).unwrap_err();

        assert_eq!(errors.len(), 5);
        assert!(matches!(errors[0], ValidationError::ModuleName { .. }));
        assert_eq!(
            errors[1],
            ValidationError::Speed {
                index: 0,
                value: "1000".to_string()
            }
        );
        assert!(matches!(errors[4], ValidationError::WorkObject { index: 0, .. }));
    }

    #[test]
    fn test_numbered_tokens_must_be_digits() {
        let v = Validator::new();
        let p = params(&["v10O", "v5000"], &["z1x", "z200"], &[], &[]);
        let errors = v.validate("M", &p).unwrap_err();

        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], ValidationError::Speed { index: 0, .. }));
        assert!(matches!(errors[1], ValidationError::Zone { index: 0, .. }));
    }

    #[test]
    fn test_identifier_length_limit() {
        let v = Validator::with_max_identifier_len(4);
        let p = params(&["v10"], &["z1"], &[], &[]);
        assert!(v.validate("Abcd", &p).is_ok());
        assert!(v.validate("Abcde", &p).is_err());
    }

    #[test]
    fn test_error_message() {
        let e = ValidationError::Zone {
            index: 2,
            value: "z-1".to_string(),
        };
        assert_eq!(e.to_string(), "zone #2 \"z-1\": expected fine, z<mm> or a zonedata name");
    }
}
