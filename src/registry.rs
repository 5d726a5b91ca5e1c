//! Ordered field registry: which named fields each output record carries, and in which order.
//!
//! The registry is a small CSV file. Only the first column (field name) and the last column
//! (scope) are read; anything in between is free-form documentation.

use std::fs;
use std::path::Path;

use crate::error::ArchiveError;
use crate::fields::Field;

const BUNDLED_REGISTRY: &str = include_str!("../config/game-fields.csv");

/// Output record selected by `read_chesscom(..., scope := ...)`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Scope {
    Main,
    Meta,
    /// Every registry entry, in file order.
    Full,
}

impl Scope {
    pub fn parse(raw: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let normalized = raw.trim();
        if normalized.eq_ignore_ascii_case("main") {
            Ok(Self::Main)
        } else if normalized.eq_ignore_ascii_case("meta") {
            Ok(Self::Meta)
        } else if normalized.eq_ignore_ascii_case("full") {
            Ok(Self::Full)
        } else {
            Err(format!(
                "Invalid scope value '{}'. Supported values: 'main', 'meta', 'full'.",
                normalized
            )
            .into())
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Meta => "meta",
            Self::Full => "full",
        }
    }
}

/// One output column: the registry name and the value it resolves to, if any.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Column {
    pub name: String,
    pub field: Option<Field>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
struct RegistryEntry {
    column: Column,
    /// `None` for entries that only belong to the full record.
    scope: Option<Scope>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FieldRegistry {
    entries: Vec<RegistryEntry>,
}

impl FieldRegistry {
    /// Registry compiled into the extension.
    pub fn bundled() -> Result<Self, ArchiveError> {
        Self::parse(BUNDLED_REGISTRY)
    }

    pub fn load(path: &Path) -> Result<Self, ArchiveError> {
        let text = fs::read_to_string(path).map_err(|e| {
            ArchiveError::new(format!(
                "Failed to read field registry '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&text)
    }

    /// Parses registry CSV text. The first line is a header; blank lines and `#` comments
    /// are ignored.
    pub fn parse(text: &str) -> Result<Self, ArchiveError> {
        let mut entries = Vec::new();

        for (idx, line) in text.lines().enumerate().skip(1) {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let name = line.split(',').next().unwrap_or("").trim();
            if name.is_empty() {
                return Err(ArchiveError::new(format!(
                    "Invalid field registry line {}: missing field name",
                    idx + 1
                )));
            }

            let scope = match line.rsplit_once(',') {
                None => None,
                Some((_, raw)) => match raw.trim().to_ascii_lowercase().as_str() {
                    "" => None,
                    "main" => Some(Scope::Main),
                    "meta" => Some(Scope::Meta),
                    other => {
                        return Err(ArchiveError::new(format!(
                            "Invalid field registry line {}: unknown scope '{}'",
                            idx + 1,
                            other
                        )));
                    }
                },
            };

            entries.push(RegistryEntry {
                column: Column {
                    name: name.to_string(),
                    field: Field::from_name(name),
                },
                scope,
            });
        }

        Ok(Self { entries })
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether any entry names a `main` or `meta` scope.
    pub fn has_scoped_entries(&self) -> bool {
        self.entries.iter().any(|entry| entry.scope.is_some())
    }

    /// Scope used when the caller names none: `main`, or `full` for a registry without
    /// scope values.
    pub fn default_scope(&self) -> Scope {
        if self.has_scoped_entries() {
            Scope::Main
        } else {
            Scope::Full
        }
    }

    /// Columns of `scope`, in registry order. Repeated names are kept.
    pub fn columns(&self, scope: Scope) -> Vec<Column> {
        self.entries
            .iter()
            .filter(|entry| match scope {
                Scope::Full => true,
                _ => entry.scope == Some(scope),
            })
            .map(|entry| entry.column.clone())
            .collect()
    }

    /// Registry names the assembler cannot compute. Each is listed once.
    pub fn unknown_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for entry in &self.entries {
            let name = entry.column.name.as_str();
            if entry.column.field.is_none() && !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}
