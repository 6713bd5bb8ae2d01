//! Core [`ConfigLoader`] struct: filesystem-backed configuration loading.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use vigil_core::{DebugInfo, Scope};

use crate::apply::ApplyRuleRegistry;
use crate::schema::{ConfigDocument, DocumentEnvelope};
use crate::store::ObjectStore;

use super::error::{LoadResult, LoadStatus, LoaderError, Result};

/// One `---` separated chunk of a file with its 1-based line range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub first_line: usize,
    pub last_line: usize,
    pub last_column: usize,
    pub text: String,
}

/// A deserialized document and where it was declared.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    pub document: ConfigDocument,
    pub origin: DebugInfo,
}

fn is_blank(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || line.starts_with('#')
}

/// Split `contents` on `---` lines. Chunks holding only blank lines and
/// comments are dropped; line ranges exclude leading and trailing blanks.
pub fn split_documents(contents: &str) -> Vec<SourceDocument> {
    let mut documents = Vec::new();
    let mut chunk: Vec<(usize, &str)> = Vec::new();

    let mut flush = |chunk: &mut Vec<(usize, &str)>| {
        let first = chunk.iter().position(|(_, l)| !is_blank(l));
        let last = chunk.iter().rposition(|(_, l)| !is_blank(l));
        if let (Some(first), Some(last)) = (first, last) {
            let text: Vec<&str> = chunk.iter().map(|(_, l)| *l).collect();
            documents.push(SourceDocument {
                first_line: chunk[first].0,
                last_line: chunk[last].0,
                last_column: chunk[last].1.trim_end().len(),
                text: text.join("\n"),
            });
        }
        chunk.clear();
    };

    for (idx, line) in contents.lines().enumerate() {
        if line.trim_end() == "---" {
            flush(&mut chunk);
        } else {
            chunk.push((idx + 1, line));
        }
    }
    flush(&mut chunk);

    documents
}

/// Filesystem-backed configuration loader.
///
/// Scans a directory (recursively, in path order) for `*.yml` / `*.yaml`
/// files. Each file has its own file scope: `Locals` documents extend it, and
/// every `Apply` document closes over a snapshot of it taken at that point.
pub struct ConfigLoader {
    /// Root directory containing configuration YAML files.
    config_dir: PathBuf,
}

impl ConfigLoader {
    pub fn new(config_dir: PathBuf) -> Self {
        if !config_dir.is_dir() {
            warn!(path = %config_dir.display(), "configuration directory does not exist");
        }
        Self { config_dir }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Recursively scan the configuration directory and load all YAML files.
    ///
    /// Dotfiles and non-YAML files are skipped. Errors are reported per file
    /// and do not abort the scan.
    pub fn load_all<S: ObjectStore + ?Sized>(
        &self,
        rules: &ApplyRuleRegistry,
        store: &S,
    ) -> Result<Vec<LoadResult>> {
        let mut results = Vec::new();
        self.scan_dir_recursive(&self.config_dir, rules, store, &mut results)?;
        Ok(results)
    }

    fn scan_dir_recursive<S: ObjectStore + ?Sized>(
        &self,
        dir: &Path,
        rules: &ApplyRuleRegistry,
        store: &S,
        results: &mut Vec<LoadResult>,
    ) -> Result<()> {
        let entries = match fs::read_dir(dir) {
            Ok(e) => e,
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "failed to read directory");
                return Ok(());
            }
        };

        let mut paths = entries
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        paths.sort();

        for path in paths {
            // Skip dotfiles/dotdirs
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.starts_with('.') {
                    if path.is_file() {
                        results.push(LoadResult {
                            path,
                            status: LoadStatus::Skipped {
                                reason: "dotfile".to_string(),
                            },
                        });
                    }
                    continue;
                }
            }

            if path.is_dir() {
                self.scan_dir_recursive(&path, rules, store, results)?;
                continue;
            }

            let is_yaml = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e == "yml" || e == "yaml")
                .unwrap_or(false);

            if !is_yaml {
                results.push(LoadResult {
                    path,
                    status: LoadStatus::Skipped {
                        reason: "not a YAML file".to_string(),
                    },
                });
                continue;
            }

            let status = match self.load_file(&path, rules, store) {
                Ok(status) => {
                    info!(path = %path.display(), ?status, "loaded config file");
                    status
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load config file");
                    LoadStatus::Failed {
                        error: e.to_string(),
                    }
                }
            };
            results.push(LoadResult { path, status });
        }

        Ok(())
    }

    /// Parse every document of a file without side effects.
    pub fn parse_file(path: &Path) -> Result<Vec<ParsedDocument>> {
        let contents = fs::read_to_string(path)?;
        let file = path.display().to_string();

        split_documents(&contents)
            .into_iter()
            .map(|chunk| {
                let origin = DebugInfo::new(file.as_str(), chunk.first_line, chunk.last_line)
                    .with_columns(1, chunk.last_column);

                // First pass: read `kind`. Second pass: the concrete type.
                let envelope: DocumentEnvelope = serde_yaml::from_str(&chunk.text).map_err(|source| {
                    LoaderError::Parse {
                        origin: origin.clone(),
                        source,
                    }
                })?;
                let document = envelope
                    .parse_full()
                    .map_err(|message| LoaderError::Validation {
                        origin: origin.clone(),
                        message,
                    })?;

                Ok(ParsedDocument { document, origin })
            })
            .collect()
    }

    /// Load one file into `rules` and `store`.
    ///
    /// The whole file is parsed before anything is committed, so a YAML error
    /// leaves no partial state behind. A commit or definition error stops the
    /// file at that document.
    pub fn load_file<S: ObjectStore + ?Sized>(
        &self,
        path: &Path,
        rules: &ApplyRuleRegistry,
        store: &S,
    ) -> Result<LoadStatus> {
        let documents = Self::parse_file(path)?;
        let mut scope = Scope::new();
        let (mut objects, mut rule_count) = (0, 0);

        for ParsedDocument { document, origin } in documents {
            match document {
                ConfigDocument::Locals(def) => {
                    def.apply_to(&mut scope).map_err(|e| e.at(&origin))?;
                }
                ConfigDocument::Object(def) => {
                    let object = def
                        .to_object(origin.clone())
                        .map_err(|message| LoaderError::Validation { origin, message })?;
                    store.commit(object)?;
                    objects += 1;
                }
                ConfigDocument::Apply(def) => {
                    let rule = def.to_rule(scope.clone().freeze(), origin)?;
                    debug!(kind = %def.kind, rule = %rule.name(), origin = %rule.origin(), "registering apply rule");
                    rules.add_rule(def.kind, rule)?;
                    rule_count += 1;
                }
            }
        }

        Ok(LoadStatus::Loaded {
            objects,
            rules: rule_count,
        })
    }
}
