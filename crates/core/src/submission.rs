//! Dub request validation.
//!
//! A [`DubForm`] holds the raw text a user typed; [`DubForm::validate`]
//! turns it into the wire-ready [`DubRequest`] or rejects it before any
//! network call is made.

use serde::Serialize;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Raw, unvalidated submission input.
///
/// Time bounds are kept as text so that "unset" (`None` or blank) stays
/// distinct from an explicit `"0"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DubForm {
    pub source_url: String,
    pub target_language: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

impl DubForm {
    pub fn new(source_url: impl Into<String>, target_language: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            target_language: target_language.into(),
            start_time: None,
            end_time: None,
        }
    }

    pub fn with_start_time(mut self, start_time: impl Into<String>) -> Self {
        self.start_time = Some(start_time.into());
        self
    }

    pub fn with_end_time(mut self, end_time: impl Into<String>) -> Self {
        self.end_time = Some(end_time.into());
        self
    }

    /// Validate the form and build the outbound request body.
    pub fn validate(&self) -> Result<DubRequest, CoreError> {
        let youtube_url = self.source_url.trim();
        if youtube_url.is_empty() {
            return Err(CoreError::MissingField("youtube_url"));
        }
        if !(youtube_url.starts_with("http://") || youtube_url.starts_with("https://")) {
            return Err(CoreError::Validation(format!(
                "Source URL must start with http:// or https://, got '{youtube_url}'"
            )));
        }

        let target_language = self.target_language.trim();
        if target_language.is_empty() {
            return Err(CoreError::MissingField("target_language"));
        }

        let start_time = parse_time_bound("start_time", self.start_time.as_deref())?;
        let end_time = parse_time_bound("end_time", self.end_time.as_deref())?;

        if let (Some(start), Some(end)) = (start_time, end_time) {
            if end <= start {
                return Err(CoreError::Validation(format!(
                    "end_time ({end}) must be greater than start_time ({start})"
                )));
            }
        }

        Ok(DubRequest {
            youtube_url: youtube_url.to_string(),
            target_language: target_language.to_string(),
            start_time,
            end_time,
        })
    }
}

// ---------------------------------------------------------------------------
// Wire body
// ---------------------------------------------------------------------------

/// Body of `POST /api/dub`.
///
/// Unset time bounds are omitted entirely rather than sent as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DubRequest {
    pub youtube_url: String,
    pub target_language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<u32>,
}

/// Parse an optional time bound in whole seconds.
///
/// `None` and blank text both mean "unset".
pub fn parse_time_bound(field: &'static str, raw: Option<&str>) -> Result<Option<u32>, CoreError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    raw.parse::<u32>().map(Some).map_err(|_| {
        CoreError::Validation(format!(
            "{field} must be a non-negative whole number of seconds, got '{raw}'"
        ))
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
