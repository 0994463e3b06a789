//! Upload intake boundary.
//!
//! Validates `(file name, declared type, content)` before anything reaches
//! the pipeline. Rejections never propagate as hard errors; they become a
//! transient [`IntakeNotice`] that auto-clears.

use crate::error::{InkflowError, InkflowResult};

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const SUCCESS_NOTICE_SECS: f64 = 2.0;
pub const ERROR_NOTICE_SECS: f64 = 3.0;

#[derive(Clone, Debug)]
pub struct Upload {
    pub file_name: String,
    pub content: String,
}

/// Transient intake feedback with its expiry instant.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum IntakeNotice {
    Idle,
    Success { clear_at: f64 },
    Error { message: String, clear_at: f64 },
}

impl IntakeNotice {
    pub fn success(now: f64) -> Self {
        Self::Success {
            clear_at: now + SUCCESS_NOTICE_SECS,
        }
    }

    pub fn error(message: impl Into<String>, now: f64) -> Self {
        Self::Error {
            message: message.into(),
            clear_at: now + ERROR_NOTICE_SECS,
        }
    }

    /// The notice as observed at `now`, reverted to Idle once expired.
    pub fn observed(&self, now: f64) -> IntakeNotice {
        match self {
            Self::Success { clear_at } | Self::Error { clear_at, .. } if *clear_at <= now => {
                Self::Idle
            }
            other => other.clone(),
        }
    }
}

/// Accept or reject an upload. The declared type must indicate SVG and the
/// content must fit the size cap.
pub fn accept(file_name: &str, declared_type: &str, content: &str) -> InkflowResult<Upload> {
    if !declared_type.to_ascii_lowercase().contains("svg") {
        return Err(InkflowError::parse("please upload a valid SVG file"));
    }
    if content.len() > MAX_UPLOAD_BYTES {
        return Err(InkflowError::parse("file exceeds the 10MB upload limit"));
    }
    Ok(Upload {
        file_name: file_name.to_string(),
        content: content.to_string(),
    })
}
