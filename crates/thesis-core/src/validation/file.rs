use std::path::Path;
use validator::Validate;

use crate::config::ValidationRules;
use crate::models::{FileDescriptor, FileUpload};

/// Reasons a selected file is refused before any transfer starts
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FileValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Invalid file extension: {extension} (allowed: {allowed:?})")]
    InvalidExtension {
        extension: String,
        allowed: Vec<String>,
    },

    #[error("Invalid content type: {content_type} (allowed: {allowed:?})")]
    InvalidContentType {
        content_type: String,
        allowed: Vec<String>,
    },

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Empty file")]
    EmptyFile,

    #[error("Declared size {declared} bytes does not match content length {actual} bytes")]
    SizeMismatch { declared: u64, actual: u64 },
}

/// Document file validator
///
/// Checks the declared properties of a file against the configured ceiling
/// and allow-lists. Runs before any network call.
#[derive(Debug, Clone)]
pub struct FileValidator {
    max_file_size: u64,
    allowed_extensions: Vec<String>,
    allowed_content_types: Vec<String>,
}

impl FileValidator {
    pub fn new(
        max_file_size: u64,
        allowed_extensions: Vec<String>,
        allowed_content_types: Vec<String>,
    ) -> Self {
        Self {
            max_file_size,
            allowed_extensions,
            allowed_content_types,
        }
    }

    pub fn from_rules(rules: &ValidationRules) -> Self {
        Self::new(
            rules.max_document_size_bytes as u64,
            rules.allowed_document_extensions.clone(),
            rules.allowed_document_content_types.clone(),
        )
    }

    /// Validate file size
    pub fn validate_file_size(&self, size: u64) -> Result<(), FileValidationError> {
        if size == 0 {
            return Err(FileValidationError::EmptyFile);
        }

        if size > self.max_file_size {
            return Err(FileValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    /// Validate file extension
    pub fn validate_extension(&self, filename: &str) -> Result<(), FileValidationError> {
        let extension = extension_of(filename)?;

        if !self.allowed_extensions.contains(&extension) {
            return Err(FileValidationError::InvalidExtension {
                extension,
                allowed: self.allowed_extensions.clone(),
            });
        }

        Ok(())
    }

    /// Validate content type
    pub fn validate_content_type(&self, content_type: &str) -> Result<(), FileValidationError> {
        let normalized = content_type.trim().to_lowercase();

        if !self
            .allowed_content_types
            .iter()
            .any(|ct| ct == &normalized)
        {
            return Err(FileValidationError::InvalidContentType {
                content_type: content_type.to_string(),
                allowed: self.allowed_content_types.clone(),
            });
        }

        Ok(())
    }

    /// Validate that the declared content type matches the file extension,
    /// so a renamed file cannot pass as a document.
    pub fn validate_extension_content_type_match(
        &self,
        filename: &str,
        content_type: &str,
    ) -> Result<(), FileValidationError> {
        let extension = extension_of(filename)?;
        let normalized_content_type = content_type.trim().to_lowercase();

        let expected_content_types: Vec<&str> = match extension.as_str() {
            "pdf" => vec!["application/pdf"],
            "doc" => vec!["application/msword"],
            "docx" => vec!["application/vnd.openxmlformats-officedocument.wordprocessingml.document"],
            "odt" => vec!["application/vnd.oasis.opendocument.text"],
            "rtf" => vec!["application/rtf", "text/rtf"],
            "txt" => vec!["text/plain"],
            "md" => vec!["text/markdown", "text/plain"],
            _ => {
                tracing::debug!(
                    extension = %extension,
                    content_type = %content_type,
                    "Unknown extension, skipping content type/extension cross-validation"
                );
                return Ok(());
            }
        };

        if !expected_content_types
            .iter()
            .any(|ct| *ct == normalized_content_type)
        {
            return Err(FileValidationError::InvalidContentType {
                content_type: format!(
                    "{} (does not match extension '{}'. Expected one of: {})",
                    content_type,
                    extension,
                    expected_content_types.join(", ")
                ),
                allowed: self.allowed_content_types.clone(),
            });
        }

        Ok(())
    }

    /// Validate all aspects of a file
    pub fn validate_all(&self, file: &FileDescriptor) -> Result<(), FileValidationError> {
        file.validate()?;
        self.validate_file_size(file.size)?;
        self.validate_extension(&file.name)?;
        self.validate_content_type(&file.content_type)?;
        self.validate_extension_content_type_match(&file.name, &file.content_type)?;
        Ok(())
    }

    /// Validate a file together with its content. The declared size must
    /// match the bytes actually carried.
    pub fn validate_upload(&self, file: &FileUpload) -> Result<(), FileValidationError> {
        let actual = file.data.len() as u64;
        if file.descriptor.size != actual {
            return Err(FileValidationError::SizeMismatch {
                declared: file.descriptor.size,
                actual,
            });
        }
        self.validate_all(&file.descriptor)
    }
}

fn extension_of(filename: &str) -> Result<String, FileValidationError> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .ok_or_else(|| FileValidationError::InvalidFilename(filename.to_string()))
}
