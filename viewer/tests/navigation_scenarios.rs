use std::collections::BTreeMap;

use analysis_client::{ClientRequest, ServerMessage, WireMove};
use chess::PositionLedger;
use viewer::prelude::*;
use viewer::{MoveList, Navigator};

const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
const AFTER_E5: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2";
const AFTER_NF3: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2";
const AFTER_NC6: &str = "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3";
const AFTER_C5: &str = "rnbqkbnr/pp1ppppp/8/2p5/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2";

fn wire(id: u64, fen: &str, uci: &str) -> WireMove {
    WireMove {
        id: Some(id),
        fen: Some(fen.into()),
        uci: Some(uci.into()),
        ..Default::default()
    }
}

fn analysed(id: u64, fen: &str, uci: &str, score: i32) -> WireMove {
    WireMove {
        score: Some(score),
        is_analyzed: true,
        ..wire(id, fen, uci)
    }
}

/// A connected navigator that has received `moves` as its move list.
fn browsing(moves: Vec<WireMove>) -> Navigator {
    let mut nav = Navigator::default();
    nav.on_connected("s1");
    nav.handle_message(ServerMessage::SessionMetadata {
        headers: BTreeMap::from([("White".to_string(), "Ann".to_string())]),
    });
    nav.handle_message(ServerMessage::MoveList { moves });
    nav.take_requests();
    nav
}

mod classification_tests {
    use super::*;

    const WHITE_TO_MOVE: &str = "8/8/8/8/8/8/8/K6k w - - 0 1";
    const BLACK_TO_MOVE: &str = "8/8/8/8/8/8/8/K6k b - - 0 1";

    fn pair(prev_fen: &str, curr_fen: &str) -> MoveList {
        let mut list = MoveList::new();
        list.append(
            MoveRecord::new(0, 0, prev_fen, "a1a2", LineContext::Mainline).with_score(0),
            vec![],
            vec![],
        );
        list.append(
            MoveRecord::new(1, 1, curr_fen, "h1h2", LineContext::Mainline).with_score(-120),
            vec![],
            vec![],
        );
        list.apply_classification_pass();
        list
    }

    #[test]
    fn white_dropping_120_is_a_blunder() {
        // White moved last: Black is to move in the resulting position.
        let list = pair(WHITE_TO_MOVE, BLACK_TO_MOVE);
        assert_eq!(
            list.mainline_at(1).unwrap().classification,
            Some(MoveClassification::Blunder)
        );
    }

    #[test]
    fn black_improving_by_120_is_not_a_blunder() {
        let list = pair(BLACK_TO_MOVE, WHITE_TO_MOVE);
        let verdict = list.mainline_at(1).unwrap().classification.unwrap();
        assert!(!verdict.is_error());
    }
}

mod preview_tests {
    use super::*;

    #[test]
    fn one_move_game_preview_round_trip() {
        let mut nav = Navigator::default();
        nav.load_local(
            vec![MoveRecord::new(0, 0, AFTER_E4, "e2e4", LineContext::Mainline).with_score(20)],
            BTreeMap::new(),
        );
        assert_eq!(nav.state(), NavState::MainlineBrowsing);

        let reply = MoveRecord::new(nav.next_id(), 0, AFTER_E5, "e7e5", LineContext::Preview);
        assert!(nav.enter_preview_mode_with_move(reply));

        assert!(nav.is_preview());
        assert_eq!(nav.preview().unwrap().moves.len(), 1);
        assert_eq!(nav.current_move_index(), 0);

        assert!(nav.exit_preview_mode());
        assert!(!nav.is_preview());
        assert_eq!(nav.current_move_index(), 0);
        assert!(nav.preview().is_none());
    }

    #[test]
    fn enter_then_exit_restores_cursor_and_mainline() {
        let mut nav = browsing(vec![
            wire(0, AFTER_E4, "e2e4"),
            wire(1, AFTER_E5, "e7e5"),
            wire(2, AFTER_NF3, "g1f3"),
        ]);
        nav.on_analysis_update(
            &analysed(0, AFTER_E4, "e2e4", 30),
            Some(&[wire(10, AFTER_C5, "c7c5")]),
            None,
        )
        .unwrap();
        nav.go_to_move(1);
        let mainline_before = nav.moves().clone();

        assert!(nav.enter_preview_mode(None));
        assert_eq!(nav.state(), NavState::PreviewBrowsing);
        let preview = nav.preview().unwrap();
        assert_eq!(preview.anchor, 1);
        assert_eq!(preview.moves.mainline_at(0).unwrap().id, 10);
        assert_eq!(
            preview.moves.mainline_at(0).unwrap().context,
            LineContext::Preview
        );

        assert!(nav.exit_preview_mode());
        assert_eq!(nav.current_move_index(), 1);
        assert_eq!(nav.moves(), &mainline_before);
    }

    #[test]
    fn entering_with_empty_pv_is_a_silent_no_op() {
        let mut nav = browsing(vec![wire(0, AFTER_E4, "e2e4")]);
        assert!(!nav.enter_preview_mode(Some(0)));
        assert_eq!(nav.state(), NavState::MainlineBrowsing);
        assert!(!nav.exit_preview_mode());
    }

    #[test]
    fn preview_navigation_translates_mainline_indices() {
        let mut nav = browsing(vec![wire(0, AFTER_E4, "e2e4"), wire(1, AFTER_E5, "e7e5")]);
        nav.go_to_move(1);
        let sequence = vec![
            MoveRecord::new(20, 0, AFTER_NF3, "g1f3", LineContext::Pv1),
            MoveRecord::new(21, 1, AFTER_NC6, "b8c6", LineContext::Pv1),
        ];
        assert!(nav.enter_preview_mode_with_pv_sequence(sequence));
        assert_eq!(nav.preview().unwrap().cursor, 1);

        // Anchor is 1, so mainline index 1 is the first preview move.
        nav.go_to_move(1);
        assert_eq!(nav.current_move().unwrap().id, 20);
        nav.go_to_move(99);
        assert_eq!(nav.current_move().unwrap().id, 21);
        assert!(!nav.move_next());
        assert!(nav.go_to_first());
        assert!(!nav.move_prev());
    }

    #[test]
    fn add_pv_sequence_truncates_at_anchor() {
        let mut nav = browsing(vec![wire(0, AFTER_E4, "e2e4")]);
        let first = MoveRecord::new(nav.next_id(), 0, AFTER_E5, "e7e5", LineContext::Preview);
        nav.enter_preview_mode_with_move(first);
        nav.add_preview_move(MoveRecord::new(
            nav.next_id(),
            1,
            AFTER_NF3,
            "g1f3",
            LineContext::Preview,
        ));
        assert_eq!(nav.preview().unwrap().moves.len(), 2);

        let alt = MoveRecord::new(nav.next_id(), 1, AFTER_NF3, "b1c3", LineContext::Pv2);
        assert!(nav.add_pv_sequence_to_preview(vec![alt], 1));

        let preview = nav.preview().unwrap();
        assert_eq!(preview.moves.len(), 2);
        assert_eq!(preview.moves.mainline_at(1).unwrap().uci, "b1c3");
        assert_eq!(preview.cursor, 1);
        assert!(!nav.add_pv_sequence_to_preview(vec![], 0));
    }

    #[test]
    fn playing_moves_follows_known_lines_before_branching() {
        let mut nav = browsing(vec![wire(0, AFTER_E4, "e2e4"), wire(1, AFTER_E5, "e7e5")]);
        nav.on_analysis_update(
            &analysed(0, AFTER_E4, "e2e4", 30),
            Some(&[wire(10, AFTER_C5, "c7c5")]),
            None,
        )
        .unwrap();

        assert_eq!(nav.play_move("e7e5").unwrap(), PlayOutcome::FollowedMainline);
        assert_eq!(nav.current_move_index(), 1);

        nav.go_to_first();
        assert_eq!(nav.play_move("c7c5").unwrap(), PlayOutcome::FollowedPv);
        assert_eq!(nav.current_move().unwrap().id, 10);
        assert_eq!(nav.preview().unwrap().anchor, 1);

        assert_eq!(nav.play_move("g1f3").unwrap(), PlayOutcome::Branched);
        let preview = nav.preview().unwrap();
        assert_eq!(preview.moves.len(), 2);
        assert_eq!(preview.cursor, 1);
        assert_eq!(nav.current_move().unwrap().notation(), "Nf3");
        assert_eq!(nav.current_move_index(), 0);
    }
}

mod update_tests {
    use super::*;

    #[test]
    fn pv_before_mainline_synthesizes_then_heals() {
        let mut nav = browsing(vec![wire(0, AFTER_E4, "e2e4"), wire(1, AFTER_E5, "e7e5")]);

        // Analysis of move 1 carries the engine line starting with slot 2's
        // move, before slot 2 itself exists.
        nav.handle_message(ServerMessage::AnalysisUpdate {
            record: analysed(1, AFTER_E5, "e7e5", 25),
            pv1: Some(vec![wire(2, AFTER_NF3, "g1f3"), wire(3, AFTER_NC6, "b8c6")]),
            pv2: None,
        });
        assert_eq!(nav.moves().len(), 3);
        assert!(nav.moves().is_provisional(2));
        assert_eq!(nav.moves().mainline_at(2).unwrap().uci, "g1f3");

        nav.handle_message(ServerMessage::AnalysisUpdate {
            record: analysed(2, AFTER_NF3, "g1f3", 30),
            pv1: None,
            pv2: None,
        });

        assert_eq!(nav.moves().len(), 3);
        assert!(!nav.moves().is_provisional(2));
        let healed = nav.moves().mainline_at(2).unwrap();
        assert!(healed.is_analyzed);
        assert_eq!(healed.score, Some(30));
        assert_eq!(healed.context, LineContext::Mainline);
    }

    #[test]
    fn later_move_list_replaces_provisional_slot() {
        let mut nav = browsing(vec![wire(0, AFTER_E4, "e2e4"), wire(1, AFTER_E5, "e7e5")]);
        nav.handle_message(ServerMessage::AnalysisUpdate {
            record: analysed(1, AFTER_E5, "e7e5", 25),
            pv1: Some(vec![wire(40, AFTER_NF3, "g1f3")]),
            pv2: None,
        });
        assert!(nav.moves().is_provisional(2));

        nav.handle_message(ServerMessage::MoveList {
            moves: vec![
                wire(0, AFTER_E4, "e2e4"),
                wire(1, AFTER_E5, "e7e5"),
                wire(2, AFTER_NF3, "g1f3"),
            ],
        });

        assert_eq!(nav.moves().len(), 3);
        assert_eq!(nav.moves().mainline_at(2).unwrap().id, 2);
        assert_eq!(nav.moves().pv1_at(2)[0].id, 40);
        assert!(nav.moves().find_by_id(40).is_some());
    }

    #[test]
    fn update_reaches_open_preview() {
        let mut nav = browsing(vec![wire(0, AFTER_E4, "e2e4")]);
        let id = nav.next_id();
        nav.enter_preview_mode_with_move(MoveRecord::new(
            id,
            0,
            AFTER_E5,
            "e7e5",
            LineContext::Preview,
        ));
        let requested = nav.take_requests();
        assert!(requested.iter().any(|r| matches!(
            r,
            ClientRequest::GetDetailedAnalysis { move_id, context, .. }
                if *move_id == id && context == "preview"
        )));

        let applied = nav
            .on_analysis_update(&analysed(id, AFTER_E5, "e7e5", 15), None, None)
            .unwrap();

        assert!(applied);
        let record = nav.current_move().unwrap();
        assert_eq!(record.score, Some(15));
        assert_eq!(record.context, LineContext::Preview);
        assert_eq!(nav.moves().len(), 1);
    }

    #[test]
    fn update_for_discarded_branch_is_stale() {
        let mut nav = browsing(vec![wire(0, AFTER_E4, "e2e4")]);
        let id = nav.next_id();
        nav.enter_preview_mode_with_move(MoveRecord::new(
            id,
            0,
            AFTER_E5,
            "e7e5",
            LineContext::Preview,
        ));
        nav.exit_preview_mode();
        let before = nav.moves().clone();

        let applied = nav
            .on_analysis_update(&analysed(id, AFTER_E5, "e7e5", 15), None, None)
            .unwrap();

        assert!(!applied);
        assert_eq!(nav.moves(), &before);
        assert_eq!(nav.state(), NavState::MainlineBrowsing);
    }

    fn fen_after(moves: &[&str]) -> String {
        let mut ledger = PositionLedger::starting();
        for uci in moves {
            ledger = ledger.play(uci).unwrap().0;
        }
        ledger.fen()
    }

    #[test]
    fn discarded_branch_never_takes_over_provisional_slot() {
        let mut nav = browsing(vec![wire(0, AFTER_E4, "e2e4")]);
        nav.handle_message(ServerMessage::AnalysisUpdate {
            record: analysed(0, AFTER_E4, "e2e4", 20),
            pv1: Some(vec![wire(5, AFTER_E5, "e7e5")]),
            pv2: None,
        });
        assert!(nav.moves().is_provisional(1));

        // The branch move reaches the same position as the provisional slot.
        let id = nav.next_id();
        nav.enter_preview_mode_with_move(MoveRecord::new(
            id,
            0,
            AFTER_E5,
            "e7e5",
            LineContext::Preview,
        ));
        assert!(nav
            .on_analysis_update(&analysed(id, AFTER_E5, "e7e5", 15), None, None)
            .unwrap());
        assert_eq!(nav.current_move().unwrap().score, Some(15));
        assert_eq!(nav.moves().mainline_at(1).unwrap().id, 5);
        assert!(nav.moves().is_provisional(1));

        nav.exit_preview_mode();
        let before = nav.moves().clone();
        let applied = nav
            .on_analysis_update(&analysed(id, AFTER_E5, "e7e5", 15), None, None)
            .unwrap();

        assert!(!applied);
        assert_eq!(nav.moves(), &before);
        assert!(nav.moves().is_provisional(1));
    }

    #[test]
    fn transposed_branch_leaves_provisional_slot_alone() {
        let mainline = ["g1f3", "g8f6", "b1c3"];
        let mut nav = browsing(vec![
            wire(0, &fen_after(&mainline[..1]), "g1f3"),
            wire(1, &fen_after(&mainline[..2]), "g8f6"),
            wire(2, &fen_after(&mainline), "b1c3"),
        ]);
        let provisional_fen = fen_after(&["g1f3", "g8f6", "b1c3", "b8c6"]);
        nav.handle_message(ServerMessage::AnalysisUpdate {
            record: analysed(2, &fen_after(&mainline), "b1c3", 10),
            pv1: Some(vec![wire(10, &provisional_fen, "b8c6")]),
            pv2: None,
        });
        assert!(nav.moves().is_provisional(3));

        // Same position from the first move by another order.
        let transposed = fen_after(&["g1f3", "b8c6", "b1c3", "g8f6"]);
        assert_eq!(transposed, provisional_fen);
        nav.enter_preview_mode_with_pv_sequence(vec![
            MoveRecord::new(20, 0, fen_after(&["g1f3", "b8c6"]), "b8c6", LineContext::Pv1),
            MoveRecord::new(21, 1, fen_after(&["g1f3", "b8c6", "b1c3"]), "b1c3", LineContext::Pv1),
            MoveRecord::new(22, 2, transposed.clone(), "g8f6", LineContext::Pv1),
        ]);

        assert!(nav
            .on_analysis_update(&analysed(22, &transposed, "g8f6", 5), None, None)
            .unwrap());
        assert_eq!(nav.moves().mainline_at(3).unwrap().id, 10);
        assert!(nav.moves().is_provisional(3));

        nav.exit_preview_mode();
        assert!(!nav
            .on_analysis_update(&analysed(22, &transposed, "g8f6", 5), None, None)
            .unwrap());
        assert!(nav.moves().is_provisional(3));

        // The real mainline move at that position still heals the slot.
        assert!(nav
            .on_analysis_update(&analysed(30, &provisional_fen, "b8c6", 12), None, None)
            .unwrap());
        assert!(!nav.moves().is_provisional(3));
        assert_eq!(nav.moves().mainline_at(3).unwrap().id, 30);
    }

    #[test]
    fn preview_update_keeps_the_preview_ply() {
        let mut nav = browsing(vec![wire(0, AFTER_E4, "e2e4")]);
        assert_eq!(nav.play_move("e7e5").unwrap(), PlayOutcome::Branched);
        assert_eq!(nav.play_move("g1f3").unwrap(), PlayOutcome::Branched);
        let current = nav.current_move().unwrap().clone();
        assert_eq!(current.ply, 1);

        let applied = nav
            .on_analysis_update(&analysed(current.id, &current.fen, &current.uci, 30), None, None)
            .unwrap();

        assert!(applied);
        let updated = nav.current_move().unwrap();
        assert_eq!(updated.ply, 1);
        assert_eq!(updated.score, Some(30));
        assert_eq!(updated.context, LineContext::Preview);
        assert_eq!(nav.moves().len(), 1);
    }
}
