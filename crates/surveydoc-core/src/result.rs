//! Convenience result type alias for SurveyDoc.

use crate::error::AppError;

/// A specialized `Result` type for SurveyDoc operations.
pub type AppResult<T> = Result<T, AppError>;
