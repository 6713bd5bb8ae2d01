use thiserror::Error;

use crate::debug_info::DebugInfo;

/// Error raised while evaluating an expression, optionally attributed to a
/// source position.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}{}", .debug_info.as_ref().map(|di| format!(" ({di})")).unwrap_or_default())]
pub struct ScriptError {
    pub message: String,
    pub debug_info: Option<DebugInfo>,
}

impl ScriptError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            debug_info: None,
        }
    }

    /// Attach a position unless one is already present.
    pub fn at(mut self, debug_info: &DebugInfo) -> Self {
        if self.debug_info.is_none() {
            self.debug_info = Some(debug_info.clone());
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_position_when_known() {
        let err = ScriptError::new("boom");
        assert_eq!(err.to_string(), "boom");

        let di = DebugInfo::new("a.yml", 1, 2);
        let err = err.at(&di);
        assert_eq!(err.to_string(), "boom (in a.yml: 1:0-2:0)");

        let other = DebugInfo::new("b.yml", 5, 5);
        assert_eq!(err.at(&other).debug_info, Some(di));
    }
}
