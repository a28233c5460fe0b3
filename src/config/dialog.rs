//! Dialog-flow settings.

use serde::Deserialize;

use super::ValidationError;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DialogConfig {
    /// Consecutive unresolved turns before the conversation ends.
    pub clarification_cap: u8,
    /// Minimum confidence a correction needs to overwrite a captured field.
    pub correction_threshold: f32,
    /// Offset from UTC, in whole hours, used to resolve "today".
    pub timezone_offset_hours: i8,
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            clarification_cap: 3,
            correction_threshold: 0.9,
            timezone_offset_hours: 0,
        }
    }
}

impl DialogConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.clarification_cap == 0 {
            return Err(ValidationError::new(
                "dialog.clarification_cap",
                "must be at least 1",
            ));
        }
        if !(0.0..=1.0).contains(&self.correction_threshold) {
            return Err(ValidationError::new(
                "dialog.correction_threshold",
                "must be between 0.0 and 1.0",
            ));
        }
        if !(-12..=14).contains(&self.timezone_offset_hours) {
            return Err(ValidationError::new(
                "dialog.timezone_offset_hours",
                "must be between -12 and 14",
            ));
        }
        Ok(())
    }
}
