//! Map transfer errors onto retry policy error kinds.

use super::error::TransferError;
use super::policy::ErrorKind;

pub fn classify(e: &TransferError) -> ErrorKind {
    match e {
        TransferError::Transient(_) | TransferError::PartialTransfer { .. } => {
            ErrorKind::Transient
        }
        TransferError::AuthExpired => ErrorKind::AuthExpired,
        TransferError::NotFoundOrForbidden(_) | TransferError::Storage(_) => ErrorKind::Permanent,
        TransferError::Cancelled => ErrorKind::Cancelled,
    }
}
