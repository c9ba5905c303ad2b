//! Application error types for user-facing error handling.
//!
//! This module defines error types that are designed to be displayed to users
//! in error dialogs, with detailed information and recovery options.

use std::path::{Path, PathBuf};
use thiserror::Error;

use super::parser::{ParseError, SUPPORTED_VERSION};

/// File extensions accepted by the viewer.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["json"];

/// Application-level errors that can be displayed to users.
#[derive(Debug, Clone, Error)]
pub enum AppError {
    /// File was not found at the specified path
    #[error("File not found")]
    FileNotFound {
        /// Path to the file that was not found
        path: PathBuf,
    },

    /// File exists but cannot be read (permissions, locked, etc.)
    #[error("Cannot read file")]
    FileReadError {
        /// Path to the file that could not be read
        path: PathBuf,
        /// Reason for the failure
        reason: String,
    },

    /// File format is invalid or corrupted
    #[error("Invalid file format")]
    InvalidFormat {
        /// Path to the file with invalid format
        path: Option<PathBuf>,
        /// Description of what's wrong
        message: String,
        /// Line number where the error occurred (1-indexed)
        line: Option<usize>,
        /// Column where the error occurred
        column: Option<usize>,
    },

    /// File version is not supported
    #[error("Unsupported version")]
    UnsupportedVersion {
        path: Option<PathBuf>,
        found: u32,
        supported: u32,
    },

    /// File extension is not recognized
    #[error("Unsupported file type")]
    UnsupportedFileType {
        path: PathBuf,
        /// Expected file extensions
        expected: Vec<String>,
    },

    /// Settings could not be saved
    #[error("Settings save error")]
    SettingsSaveError {
        /// Description of the failure
        reason: String,
    },
}

impl AppError {
    /// Returns true if the user can dismiss the error and keep working.
    ///
    /// Every current variant is recoverable; the viewer keeps the previously
    /// loaded timeline on failure.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound { .. }
                | Self::FileReadError { .. }
                | Self::InvalidFormat { .. }
                | Self::UnsupportedVersion { .. }
                | Self::UnsupportedFileType { .. }
                | Self::SettingsSaveError { .. }
        )
    }

    /// Returns true if this error supports retry operation.
    ///
    /// Read failures and format errors can be retried after the user fixes
    /// the file on disk.
    pub fn supports_retry(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound { .. }
                | Self::FileReadError { .. }
                | Self::InvalidFormat { path: Some(_), .. }
        )
    }

    /// Get the file path associated with this error, if any.
    pub fn file_path(&self) -> Option<&PathBuf> {
        match self {
            Self::FileNotFound { path } => Some(path),
            Self::FileReadError { path, .. } => Some(path),
            Self::InvalidFormat { path, .. } => path.as_ref(),
            Self::UnsupportedVersion { path, .. } => path.as_ref(),
            Self::UnsupportedFileType { path, .. } => Some(path),
            Self::SettingsSaveError { .. } => None,
        }
    }

    /// Get the title for the error dialog.
    pub fn dialog_title(&self) -> &'static str {
        match self {
            Self::FileNotFound { .. } => "File Not Found",
            Self::FileReadError { .. } => "Cannot Read File",
            Self::InvalidFormat { .. } => "Invalid Event File",
            Self::UnsupportedVersion { .. } => "Unsupported Version",
            Self::UnsupportedFileType { .. } => "Unsupported File Type",
            Self::SettingsSaveError { .. } => "Settings Error",
        }
    }

    /// Get a brief description of the error suitable for display.
    pub fn brief_description(&self) -> String {
        match self {
            Self::FileNotFound { path } => {
                format!("The file '{}' could not be found.", file_name(path))
            }
            Self::FileReadError { path, .. } => {
                format!("Could not read the file '{}'.", file_name(path))
            }
            Self::InvalidFormat { message, .. } => message.clone(),
            Self::UnsupportedVersion {
                found, supported, ..
            } => {
                format!(
                    "File version {} is not supported. This viewer supports version {}.",
                    found, supported
                )
            }
            Self::UnsupportedFileType { expected, .. } => {
                format!(
                    "Please use a file with one of these extensions: {}",
                    expected.join(", ")
                )
            }
            Self::SettingsSaveError { reason } => format!("Could not save settings: {}", reason),
        }
    }

    /// Get detailed error information for bug reports.
    pub fn detailed_info(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Error Type: {}", self.dialog_title()));
        lines.push(format!("Description: {}", self.brief_description()));

        match self {
            Self::FileNotFound { path } => {
                lines.push(format!("Full Path: {}", path.display()));
            }
            Self::FileReadError { path, reason } => {
                lines.push(format!("Full Path: {}", path.display()));
                lines.push(format!("Reason: {}", reason));
            }
            Self::InvalidFormat {
                path,
                message,
                line,
                column,
            } => {
                if let Some(p) = path {
                    lines.push(format!("File: {}", p.display()));
                }
                if let Some(l) = line {
                    lines.push(format!("Line: {}", l));
                }
                if let Some(c) = column {
                    lines.push(format!("Column: {}", c));
                }
                lines.push(format!("Details: {}", message));
            }
            Self::UnsupportedVersion {
                path,
                found,
                supported,
            } => {
                if let Some(p) = path {
                    lines.push(format!("File: {}", p.display()));
                }
                lines.push(format!("Found Version: {}", found));
                lines.push(format!("Supported Version: {}", supported));
            }
            Self::UnsupportedFileType { path, expected } => {
                lines.push(format!("File: {}", path.display()));
                lines.push(format!("Supported Extensions: {}", expected.join(", ")));
            }
            Self::SettingsSaveError { reason } => {
                lines.push(format!("Details: {}", reason));
            }
        }

        lines.join("\n")
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

/// Reject paths whose extension the viewer does not read.
pub fn check_extension(path: &Path) -> Result<(), AppError> {
    let supported = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        });

    if supported {
        Ok(())
    } else {
        Err(AppError::UnsupportedFileType {
            path: path.to_path_buf(),
            expected: SUPPORTED_EXTENSIONS
                .iter()
                .map(|e| format!(".{}", e))
                .collect(),
        })
    }
}

/// Create an AppError from a file path and I/O error.
pub fn from_io_error(path: PathBuf, error: std::io::Error) -> AppError {
    match error.kind() {
        std::io::ErrorKind::NotFound => AppError::FileNotFound { path },
        std::io::ErrorKind::PermissionDenied => AppError::FileReadError {
            path,
            reason: "Permission denied".to_string(),
        },
        _ => AppError::FileReadError {
            path,
            reason: error.to_string(),
        },
    }
}

/// Create an AppError from a parse error with optional path context.
pub fn from_parse_error(path: Option<PathBuf>, error: &ParseError) -> AppError {
    match error {
        ParseError::JsonSyntax(e) => {
            // serde_json reports 0 when the position is not applicable
            let line = Some(e.line()).filter(|&l| l > 0);
            let column = Some(e.column()).filter(|&c| c > 0);
            AppError::InvalidFormat {
                path,
                message: e.to_string(),
                line,
                column,
            }
        }
        ParseError::UnsupportedVersion { version } => AppError::UnsupportedVersion {
            path,
            found: *version,
            supported: SUPPORTED_VERSION,
        },
        ParseError::DuplicateId { .. }
        | ParseError::InvertedRange { .. }
        | ParseError::EndWithoutStart { .. }
        | ParseError::TimeOutOfRange { .. }
        | ParseError::InvalidBaseDate { .. } => AppError::InvalidFormat {
            path,
            message: error.to_string(),
            line: None,
            column: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_not_found_error() {
        let error = AppError::FileNotFound {
            path: PathBuf::from("/path/to/world.json"),
        };
        assert!(error.is_recoverable());
        assert!(error.supports_retry());
        assert_eq!(error.dialog_title(), "File Not Found");
        assert!(error.brief_description().contains("world.json"));
        assert!(error.file_path().is_some());
    }

    #[test]
    fn test_invalid_format_error() {
        let error = AppError::InvalidFormat {
            path: Some(PathBuf::from("/path/to/world.json")),
            message: "Invalid JSON".to_string(),
            line: Some(10),
            column: Some(5),
        };
        assert!(error.is_recoverable());
        assert!(error.supports_retry());
        let details = error.detailed_info();
        assert!(details.contains("Line: 10"));
        assert!(details.contains("Column: 5"));
    }

    #[test]
    fn test_settings_error_not_retryable() {
        let error = AppError::SettingsSaveError {
            reason: "disk full".to_string(),
        };
        assert!(!error.supports_retry());
        assert!(error.file_path().is_none());
        assert!(error.brief_description().contains("disk full"));
    }

    #[test]
    fn test_check_extension() {
        assert!(check_extension(Path::new("/a/world.json")).is_ok());
        assert!(check_extension(Path::new("/a/WORLD.JSON")).is_ok());

        let error = check_extension(Path::new("/a/world.txt")).unwrap_err();
        assert_eq!(error.dialog_title(), "Unsupported File Type");
        assert!(error.brief_description().contains(".json"));
        assert!(check_extension(Path::new("/a/noext")).is_err());
    }

    #[test]
    fn test_from_io_error_not_found() {
        let path = PathBuf::from("/test/world.json");
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");

        match from_io_error(path.clone(), io_error) {
            AppError::FileNotFound { path: p } => assert_eq!(p, path),
            other => panic!("Expected FileNotFound error, got {:?}", other),
        }
    }

    #[test]
    fn test_from_io_error_permission_denied() {
        let path = PathBuf::from("/test/world.json");
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");

        match from_io_error(path.clone(), io_error) {
            AppError::FileReadError { path: p, reason } => {
                assert_eq!(p, path);
                assert!(reason.contains("Permission"));
            }
            other => panic!("Expected FileReadError error, got {:?}", other),
        }
    }

    #[test]
    fn test_from_parse_error_json_position() {
        let parse_error = crate::core::parser::parse_json("{\n  \"version\": ,\n}").unwrap_err();
        match from_parse_error(None, &parse_error) {
            AppError::InvalidFormat { line, column, .. } => {
                assert_eq!(line, Some(2));
                assert!(column.is_some());
            }
            other => panic!("Expected InvalidFormat error, got {:?}", other),
        }
    }

    #[test]
    fn test_from_parse_error_version() {
        let error = from_parse_error(None, &ParseError::UnsupportedVersion { version: 7 });
        match error {
            AppError::UnsupportedVersion { found, supported, .. } => {
                assert_eq!(found, 7);
                assert_eq!(supported, 1);
            }
            other => panic!("Expected UnsupportedVersion error, got {:?}", other),
        }
    }

    #[test]
    fn test_from_parse_error_semantic() {
        let error = from_parse_error(
            Some(PathBuf::from("/w.json")),
            &ParseError::DuplicateId { id: "x".to_string() },
        );
        assert!(error.brief_description().contains("Duplicate event id 'x'"));
    }

    #[test]
    fn test_from_parse_error_time_out_of_range() {
        let error = from_parse_error(
            Some(PathBuf::from("/w.json")),
            &ParseError::TimeOutOfRange {
                id: "dawn".to_string(),
                time: i64::MIN,
            },
        );
        assert!(matches!(error, AppError::InvalidFormat { .. }));
        assert!(error.supports_retry());
        assert!(error.brief_description().contains("dawn"));
    }
}
