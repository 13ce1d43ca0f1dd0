use chess::LedgerError;

use crate::converters::ConvertError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReviewError {
    #[error("Illegal move: {0}")]
    IllegalMove(#[from] LedgerError),
    #[error("Not browsing a game")]
    NotBrowsing,
    #[error("No position to play from")]
    NoPosition,
    #[error("Not connected to an analysis session")]
    NotConnected,
    #[error("Invalid analysis data: {0}")]
    Convert(#[from] ConvertError),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Internal error: {0}")]
    Internal(String),
}
