//! Setup error types.

use thiserror::Error;

/// Reasons a setup line is rejected by the parser.
///
/// Each variant has a stable short code, see [`InvalidSetupItem::code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidSetupItem {
    #[error("Incorrect data: not all required fields provided")]
    NotAllRequired,

    #[error("Incorrect data: empty region is not allowed")]
    EmptyRegion,

    #[error("Incorrect data: incorrect category id provided")]
    IncorrectCategory,

    #[error("Incorrect data: empty block name is not allowed")]
    EmptyBlockName,

    #[error("Incorrect data: empty secondary region is not allowed, if repositioning is enabled")]
    EmptySecondRegion,

    #[error("Incorrect data: you should either reposition or add a new block")]
    ConflictReposition,

    #[error("Incorrect data: empty page type pattern is not allowed")]
    EmptyPageTypePattern,
}

impl InvalidSetupItem {
    pub fn code(&self) -> &'static str {
        match self {
            InvalidSetupItem::NotAllRequired => "notallrequired",
            InvalidSetupItem::EmptyRegion => "emptyregion",
            InvalidSetupItem::IncorrectCategory => "incorrectcategory",
            InvalidSetupItem::EmptyBlockName => "emptyblockname",
            InvalidSetupItem::EmptySecondRegion => "emptysecondregion",
            InvalidSetupItem::ConflictReposition => "conflictreposition",
            InvalidSetupItem::EmptyPageTypePattern => "emptypagetypepattern",
        }
    }
}

/// Setup errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A setup line failed validation.
    #[error(transparent)]
    InvalidItem(#[from] InvalidSetupItem),

    /// The site's widget manager does not enforce locking. Fatal for the
    /// whole batch.
    #[error("terminate processing: the locking widget manager is not configured for page {0}")]
    ManagerNotConfigured(String),

    /// A host collaborator failed.
    #[error(transparent)]
    Host(#[from] host::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
