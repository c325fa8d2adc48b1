//! Error taxonomy of editor operations.
//!
//! - Input rejections (preconditions unmet) surface as `validation:error`.
//! - Geometric validity failures and degenerate results surface as typed
//!   messages; the tool keeps its state so the user can correct the input.

use serde::Serialize;
use thiserror::Error;

use crate::boolean::MergeError;
use crate::model::FeatureId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EditError {
    // input rejection
    #[error("draw a boundary first")]
    NoBoundary,
    #[error("a boundary already exists")]
    BoundaryExists,
    #[error("already drawing")]
    AlreadyDrawing,
    #[error("{0} is not active")]
    NotActive(&'static str),
    #[error("not available in {0} mode")]
    WrongMode(&'static str),
    #[error("no parcel at index {0}")]
    NoSuchParcel(usize),
    #[error("no feature with id {0}")]
    NoSuchFeature(FeatureId),

    // geometric validity
    #[error("at least {need} points are required, got {got}")]
    TooFewPoints { need: usize, got: usize },
    #[error("the outline crosses itself")]
    SelfIntersecting,
    #[error("the shape must lie inside the boundary")]
    OutsideBoundary,
    #[error("the shape overlaps parcel {0}")]
    OverlapsParcel(FeatureId),
    #[error("select at least one area")]
    EmptySelection,
    #[error("selected areas must form one connected block")]
    NotContiguous,
    #[error("could not merge the selection: {0}")]
    Merge(#[from] MergeError),
    #[error("no reference area here")]
    NoReferenceArea,

    // slice specifics
    #[error("no edge or vertex to cut from here")]
    NoSnapTarget,
    #[error("the cut is too short")]
    DegenerateCut,
    #[error("the cut must run through the inside of the shape")]
    CutOutside,
}

impl EditError {
    /// Input rejections are reported via `validation:error`; everything else is a message.
    pub fn is_input_rejection(&self) -> bool {
        matches!(
            self,
            EditError::NoBoundary
                | EditError::BoundaryExists
                | EditError::AlreadyDrawing
                | EditError::NotActive(_)
                | EditError::WrongMode(_)
                | EditError::NoSuchParcel(_)
                | EditError::NoSuchFeature(_)
        )
    }

    pub fn level(&self) -> MessageLevel {
        match self {
            EditError::NoSnapTarget | EditError::NoReferenceArea => MessageLevel::Info,
            EditError::DegenerateCut | EditError::EmptySelection => MessageLevel::Warning,
            _ => MessageLevel::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(EditError::NoBoundary.is_input_rejection());
        assert!(!EditError::SelfIntersecting.is_input_rejection());
        assert_eq!(EditError::NoSnapTarget.level(), MessageLevel::Info);
        let merged: EditError = MergeError::Hole.into();
        assert_eq!(
            merged.to_string(),
            "could not merge the selection: merged area would contain a hole"
        );
    }
}
