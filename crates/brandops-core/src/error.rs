use std::fmt;

/// Machine-readable error codes surfaced by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    CatalogNotFound,
    CatalogParseError,
    ConfigParseError,
    ValidationFailed,
    UnknownAction,
    InvalidFilter,
    ItemNotFound,
    UnknownOperation,
    UndoFailed,
    ExportWriteFailed,
    CatalogWriteFailed,
}

impl ErrorCode {
    pub const ALL: [Self; 11] = [
        Self::CatalogNotFound,
        Self::CatalogParseError,
        Self::ConfigParseError,
        Self::ValidationFailed,
        Self::UnknownAction,
        Self::InvalidFilter,
        Self::ItemNotFound,
        Self::UnknownOperation,
        Self::UndoFailed,
        Self::ExportWriteFailed,
        Self::CatalogWriteFailed,
    ];

    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::CatalogNotFound => "E1001",
            Self::CatalogParseError => "E1002",
            Self::ConfigParseError => "E1003",
            Self::ValidationFailed => "E2001",
            Self::UnknownAction => "E2002",
            Self::InvalidFilter => "E2003",
            Self::ItemNotFound => "E2004",
            Self::UnknownOperation => "E3001",
            Self::UndoFailed => "E3002",
            Self::ExportWriteFailed => "E5001",
            Self::CatalogWriteFailed => "E5002",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::CatalogNotFound => "Catalog file not found",
            Self::CatalogParseError => "Catalog file parse error",
            Self::ConfigParseError => "Config file parse error",
            Self::ValidationFailed => "Bulk request rejected",
            Self::UnknownAction => "Unknown bulk action",
            Self::InvalidFilter => "Invalid selection filter",
            Self::ItemNotFound => "Item not found",
            Self::UnknownOperation => "Unknown or already undone operation",
            Self::UndoFailed => "Undo could not be applied",
            Self::ExportWriteFailed => "Export file write failed",
            Self::CatalogWriteFailed => "Catalog file write failed",
        }
    }

    /// Optional remediation hint for the operator.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::CatalogNotFound => Some("Pass an existing JSON file with --catalog."),
            Self::CatalogParseError => {
                Some("The catalog must be a JSON array of objects with an \"id\" field.")
            }
            Self::ConfigParseError => Some("Fix syntax in .brandops/config.toml and retry."),
            Self::ValidationFailed => {
                Some("Select at least one item and supply the parameter the action needs.")
            }
            Self::UnknownAction => Some("Run `bops actions` to list the supported actions."),
            Self::InvalidFilter => Some("Filters take the form field=value, e.g. status=draft."),
            Self::ItemNotFound => None,
            Self::UnknownOperation => Some("Run `history` to list operations that can be undone."),
            Self::UndoFailed => Some("The operation is still recorded; retry the undo."),
            Self::ExportWriteFailed | Self::CatalogWriteFailed => {
                Some("Check disk space and write permissions.")
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorCode;
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let mut seen = HashSet::new();
        for code in ErrorCode::ALL {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        for code in ErrorCode::ALL {
            let s = code.code();
            assert_eq!(s.len(), 5);
            assert!(s.starts_with('E'));
            assert!(s[1..].chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn display_is_the_code() {
        assert_eq!(ErrorCode::UnknownOperation.to_string(), "E3001");
    }
}
