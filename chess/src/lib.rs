pub mod fen;
pub mod ledger;
pub mod pgn;
pub mod score;
pub mod types;
pub mod uci;

pub use fen::{position_key, side_to_move, FenError, START_FEN};
pub use ledger::{piece_value, CaptureTally, GameStage, LedgerError, MoveFacts, PositionLedger};
pub use pgn::{parse_pgn, GameResult, PgnError, PgnGame, PgnMove};
pub use score::{format_pawns, mover_delta, relative_to};
pub use types::{PieceColor, PieceKind};
pub use uci::{format_square, is_uci_shape, parse_square};
