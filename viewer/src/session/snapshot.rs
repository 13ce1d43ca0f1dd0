use std::collections::BTreeMap;
use std::sync::Arc;

use analysis::{Opening, OpeningBook};
use chess::{CaptureTally, GameStage, MoveFacts, PieceColor, PositionLedger};

use crate::commentary::commentary_for;
use crate::move_list::MoveList;
use crate::move_tree::MoveTree;
use crate::navigation::{NavState, PreviewBranch};
use crate::record::MoveRecord;

/// Immutable view of a review, published after every change.
///
/// Index-taking accessors address the active line: the preview while one is
/// open, the mainline otherwise. Out-of-range indices give `None` or empty
/// results.
#[derive(Debug, Clone)]
pub struct ReviewSnapshot {
    pub session_id: Option<String>,
    pub state: NavState,
    pub current_move_index: usize,
    pub preview: Option<PreviewBranch>,
    pub moves: MoveList,
    pub start_fen: String,
    pub progress: f64,
    pub full_analysis_running: bool,
    pub ws_error: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub tree: MoveTree,
    pub book: Arc<OpeningBook>,
}

/// Derived facts about the position after a move.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionFacts {
    pub turn: PieceColor,
    pub in_check: bool,
    pub is_checkmate: bool,
    pub is_stalemate: bool,
    pub is_draw: bool,
    pub stage: GameStage,
    pub last_move: Option<MoveFacts>,
}

impl ReviewSnapshot {
    pub fn is_preview(&self) -> bool {
        self.preview.is_some()
    }

    pub fn active_line(&self) -> &MoveList {
        self.preview.as_ref().map_or(&self.moves, |p| &p.moves)
    }

    pub fn active_index(&self) -> usize {
        self.preview
            .as_ref()
            .map_or(self.current_move_index, |p| p.cursor)
    }

    pub fn current_move(&self) -> Option<&MoveRecord> {
        self.active_line().mainline_at(self.active_index())
    }

    /// Position on the board: after the current move, or the starting
    /// position when there is none.
    pub fn current_fen(&self) -> &str {
        self.current_move()
            .map_or(self.start_fen.as_str(), |r| r.fen.as_str())
    }

    /// Position before the first move of the active line.
    pub fn line_start_fen(&self) -> &str {
        match &self.preview {
            Some(preview) => preview
                .anchor
                .checked_sub(1)
                .and_then(|i| self.moves.mainline_at(i))
                .map_or(self.start_fen.as_str(), |r| r.fen.as_str()),
            None => &self.start_fen,
        }
    }

    fn fen_before(&self, index: usize) -> &str {
        index
            .checked_sub(1)
            .and_then(|i| self.active_line().mainline_at(i))
            .map_or_else(|| self.line_start_fen(), |r| r.fen.as_str())
    }

    pub fn position(&self, index: usize) -> Option<PositionFacts> {
        let record = self.active_line().mainline_at(index)?;
        let ledger = PositionLedger::load(&record.fen).ok()?;
        let last_move = PositionLedger::load(self.fen_before(index))
            .ok()
            .and_then(|before| before.play(&record.uci).ok())
            .map(|(_, facts)| facts);
        Some(PositionFacts {
            turn: ledger.turn(),
            in_check: ledger.in_check(),
            is_checkmate: ledger.is_checkmate(),
            is_stalemate: ledger.is_stalemate(),
            is_draw: ledger.is_draw(),
            stage: record.phase.unwrap_or_else(|| ledger.stage()),
            last_move,
        })
    }

    /// Captured material after the move; the backend's tally when it sent
    /// one, otherwise derived against the game's starting position.
    pub fn captures_at(&self, index: usize) -> Option<CaptureTally> {
        let record = self.active_line().mainline_at(index)?;
        match &record.captured {
            Some(tally) => Some(tally.clone()),
            None => {
                let origin = PositionLedger::load(&self.start_fen).ok()?;
                PositionLedger::load(&record.fen)
                    .ok()
                    .map(|l| l.captured_since(&origin))
            }
        }
    }

    pub fn score_at(&self, index: usize) -> Option<i32> {
        self.active_line().mainline_at(index)?.score
    }

    /// PV1 and PV2 stored next to the move at `index`.
    pub fn pvs_at(&self, index: usize) -> (&[MoveRecord], &[MoveRecord]) {
        let line = self.active_line();
        (line.pv1_at(index), line.pv2_at(index))
    }

    pub fn annotation_at(&self, index: usize) -> Option<&str> {
        self.active_line().mainline_at(index)?.annotation.as_deref()
    }

    pub fn commentary_at(&self, index: usize) -> Vec<String> {
        let line = self.active_line();
        commentary_for(
            &line.mainline_moves(),
            index,
            line.pv1_at(index).first(),
            self.line_start_fen(),
            &self.book,
        )
    }

    /// Deepest book opening along the mainline up to the cursor.
    pub fn opening(&self) -> Option<&Opening> {
        let upto = (self.current_move_index + 1).min(self.moves.len());
        self.book.identify(
            self.moves.slots()[..upto]
                .iter()
                .map(|slot| slot.mainline.fen.as_str()),
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::converters::records_from_pgn;
    use crate::navigation::Navigator;
    use chess::{parse_pgn, PieceKind};

    fn italian() -> Navigator {
        let game = parse_pgn("1. e4 e5 2. Nf3 Nc6 3. Bc4 Nf6 4. Ng5 d5 5. exd5 Nxd5 *").unwrap();
        let mut nav = Navigator::default();
        nav.load_local(records_from_pgn(&game, 0).unwrap(), game.tags);
        nav
    }

    #[test]
    fn opening_is_deepest_book_match_up_to_cursor() {
        let mut nav = italian();
        nav.go_to_move(6);
        assert_eq!(nav.snapshot().opening().unwrap().name, "Italian Game");
        nav.go_to_move(1);
        assert_eq!(nav.snapshot().opening().unwrap().name, "King's Pawn Game");
    }

    #[test]
    fn position_facts_describe_the_move() {
        let snap = italian().snapshot();
        let facts = snap.position(9).unwrap();
        let last = facts.last_move.unwrap();
        assert_eq!(last.san, "Nxd5");
        assert_eq!(last.captured, Some(PieceKind::Pawn));
        assert!(!facts.in_check);

        let tally = snap.captures_at(9).unwrap();
        assert_eq!(tally.by_black.get(&PieceKind::Pawn), Some(&1));
        assert!(snap.position(10).is_none());
        assert!(snap.captures_at(10).is_none());
    }

    #[test]
    fn preview_accessors_read_the_preview_line() {
        let mut nav = italian();
        nav.go_to_move(3);
        nav.play_move("f1b5").unwrap();
        let snap = nav.snapshot();

        assert!(snap.is_preview());
        assert_eq!(snap.active_index(), 0);
        assert_eq!(snap.current_move().unwrap().notation(), "Bb5");
        assert_eq!(snap.line_start_fen(), snap.moves.mainline_at(3).unwrap().fen);
        assert_eq!(snap.position(0).unwrap().last_move.unwrap().san, "Bb5");
        assert_eq!(snap.commentary_at(0)[0], "Book position: Ruy Lopez (C60).");
    }
}
