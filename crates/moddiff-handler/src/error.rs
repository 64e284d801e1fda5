use moddiff_patch::PatchError;
use moddiff_types::WireError;
use thiserror::Error;

use crate::resource::ResourceKind;

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("patch error: {0}")]
    Patch(#[from] PatchError),

    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    #[error("resource kind mismatch: expected {expected}, found {found}")]
    KindMismatch {
        expected: ResourceKind,
        found: ResourceKind,
    },

    #[error("text entry not found: {0}")]
    MissingTextEntry(String),

    #[error("diff {position} in chain failed: {source}")]
    Chain {
        position: usize,
        #[source]
        source: Box<HandlerError>,
    },
}

pub type HandlerResult<T> = Result<T, HandlerError>;
