use std::fmt;

use serde::{Deserialize, Serialize};

/// Source position of a configuration declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DebugInfo {
    pub path: String,
    pub first_line: usize,
    pub first_column: usize,
    pub last_line: usize,
    pub last_column: usize,
}

impl DebugInfo {
    pub fn new(path: impl Into<String>, first_line: usize, last_line: usize) -> Self {
        Self {
            path: path.into(),
            first_line,
            first_column: 0,
            last_line,
            last_column: 0,
        }
    }

    pub fn with_columns(mut self, first_column: usize, last_column: usize) -> Self {
        self.first_column = first_column;
        self.last_column = last_column;
        self
    }
}

impl fmt::Display for DebugInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "in {}: {}:{}-{}:{}",
            self.path, self.first_line, self.first_column, self.last_line, self.last_column
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_file_and_range() {
        let di = DebugInfo::new("conf.d/deps.yml", 3, 9).with_columns(0, 14);
        assert_eq!(di.to_string(), "in conf.d/deps.yml: 3:0-9:14");
    }
}
