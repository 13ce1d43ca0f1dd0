//! Mainline moves with their engine alternatives, indexable by slot.
//!
//! Slot `i` holds mainline move `i` and the two principal variations the
//! engine suggested *instead of* it: continuations from the position after
//! move `i - 1`. That is where an analysis update for move `i - 1` attaches
//! its PVs, so a PV can land before the mainline move it sits next to. When
//! that happens the slot is synthesized from the PV's first move and marked
//! provisional until the real move shows up.
//!
//! Ids are the join key for updates. Lookups that miss are normal (the UI
//! probes ahead of the data) and never fail.

use std::collections::HashMap;

use analysis::classify_move;
use chess::position_key;
use tracing::debug;

use crate::record::{LineContext, MoveId, MoveRecord};

#[derive(Debug, Clone, PartialEq)]
pub struct MoveSlot {
    pub mainline: MoveRecord,
    pub pv1: Vec<MoveRecord>,
    pub pv2: Vec<MoveRecord>,
    /// The mainline record is a stand-in taken from a PV.
    pub provisional: bool,
}

impl MoveSlot {
    fn new(mainline: MoveRecord, pv1: Vec<MoveRecord>, pv2: Vec<MoveRecord>) -> Self {
        Self {
            mainline,
            pv1,
            pv2,
            provisional: false,
        }
    }
}

/// Both engine lines for one position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PvPair {
    pub pv1: Vec<MoveRecord>,
    pub pv2: Vec<MoveRecord>,
}

impl PvPair {
    pub fn new(pv1: Vec<MoveRecord>, pv2: Vec<MoveRecord>) -> Self {
        Self { pv1, pv2 }
    }

    pub fn is_empty(&self) -> bool {
        self.pv1.is_empty() && self.pv2.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Mainline,
    Pv1,
    Pv2,
}

/// Where a record lives: its slot, which line of the slot, and the offset
/// within that line (always 0 for the mainline).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordLocation {
    pub slot: usize,
    pub line: LineKind,
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Applied { slot: usize, line: LineKind },
    /// No record with that id; the list is untouched.
    Stale,
}

impl UpdateOutcome {
    pub fn is_applied(self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveListError {
    #[error("slot {index} out of range (len {len})")]
    OutOfRange { index: usize, len: usize },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoveList {
    slots: Vec<MoveSlot>,
}

impl MoveList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a list from plain mainline records, no PVs.
    pub fn from_records(records: impl IntoIterator<Item = MoveRecord>) -> Self {
        let mut list = Self::new();
        for record in records {
            list.append(record, Vec::new(), Vec::new());
        }
        list
    }

    /// Add a mainline slot. Returns its index.
    pub fn append(&mut self, record: MoveRecord, pv1: Vec<MoveRecord>, pv2: Vec<MoveRecord>) -> usize {
        self.slots.push(MoveSlot::new(record, pv1, pv2));
        self.slots.len() - 1
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, index: usize) -> Option<&MoveSlot> {
        self.slots.get(index)
    }

    pub fn slots(&self) -> &[MoveSlot] {
        &self.slots
    }

    pub fn mainline_at(&self, index: usize) -> Option<&MoveRecord> {
        self.slots.get(index).map(|slot| &slot.mainline)
    }

    pub fn pv1_at(&self, index: usize) -> &[MoveRecord] {
        self.slots.get(index).map_or(&[], |slot| slot.pv1.as_slice())
    }

    pub fn pv2_at(&self, index: usize) -> &[MoveRecord] {
        self.slots.get(index).map_or(&[], |slot| slot.pv2.as_slice())
    }

    /// PV1 followed by PV2.
    pub fn all_pv_at(&self, index: usize) -> Vec<&MoveRecord> {
        self.pv1_at(index).iter().chain(self.pv2_at(index)).collect()
    }

    pub fn is_provisional(&self, index: usize) -> bool {
        self.slots.get(index).is_some_and(|slot| slot.provisional)
    }

    /// Copy of every mainline record in order.
    pub fn mainline_moves(&self) -> Vec<MoveRecord> {
        self.slots.iter().map(|slot| slot.mainline.clone()).collect()
    }

    pub fn replace_mainline_at(&mut self, index: usize, record: MoveRecord) -> Result<(), MoveListError> {
        let slot = self.slot_mut(index)?;
        slot.mainline = record;
        slot.provisional = false;
        Ok(())
    }

    pub fn set_pv1_at(&mut self, index: usize, records: Vec<MoveRecord>) -> Result<(), MoveListError> {
        self.slot_mut(index)?.pv1 = records;
        Ok(())
    }

    pub fn set_pv2_at(&mut self, index: usize, records: Vec<MoveRecord>) -> Result<(), MoveListError> {
        self.slot_mut(index)?.pv2 = records;
        Ok(())
    }

    /// Drop every slot from `len` on.
    pub fn truncate(&mut self, len: usize) {
        self.slots.truncate(len);
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// First record with `id`, searching all mainline records, then all PV1
    /// lines, then all PV2 lines.
    pub fn find_by_id(&self, id: MoveId) -> Option<RecordLocation> {
        if let Some(slot) = self.slots.iter().position(|s| s.mainline.id == id) {
            return Some(RecordLocation {
                slot,
                line: LineKind::Mainline,
                offset: 0,
            });
        }
        for line in [LineKind::Pv1, LineKind::Pv2] {
            for (slot, s) in self.slots.iter().enumerate() {
                let records = match line {
                    LineKind::Pv1 => &s.pv1,
                    _ => &s.pv2,
                };
                if let Some(offset) = records.iter().position(|r| r.id == id) {
                    return Some(RecordLocation { slot, line, offset });
                }
            }
        }
        None
    }

    pub fn get(&self, location: RecordLocation) -> Option<&MoveRecord> {
        let slot = self.slots.get(location.slot)?;
        match location.line {
            LineKind::Mainline => Some(&slot.mainline),
            LineKind::Pv1 => slot.pv1.get(location.offset),
            LineKind::Pv2 => slot.pv2.get(location.offset),
        }
    }

    /// Smallest id above every id in the list; 0 when empty.
    pub fn next_id(&self) -> MoveId {
        self.max_id().map_or(0, |max| max.saturating_add(1))
    }

    pub fn max_id(&self) -> Option<MoveId> {
        self.slots
            .iter()
            .flat_map(|s| std::iter::once(&s.mainline).chain(&s.pv1).chain(&s.pv2))
            .map(|r| r.id)
            .max()
    }

    /// Fold an analysed record into the list.
    ///
    /// A mainline hit overwrites the slot and, when `pvs` is given, attaches
    /// the PVs one slot further on (synthesizing that slot if needed), then
    /// re-runs classification around the slot. A PV hit replaces the PV entry
    /// in place. On a miss, a mainline record whose position matches a
    /// provisional slot takes that slot over; anything else is stale.
    pub fn apply_analysis_update(
        &mut self,
        id: MoveId,
        record: MoveRecord,
        pvs: Option<PvPair>,
    ) -> UpdateOutcome {
        let Some(location) = self.find_by_id(id).or_else(|| self.provisional_match(&record)) else {
            return UpdateOutcome::Stale;
        };

        let slot_index = location.slot;
        let slot = &mut self.slots[slot_index];
        match location.line {
            LineKind::Mainline => {
                slot.mainline = record;
                slot.provisional = false;
            }
            LineKind::Pv1 => slot.pv1[location.offset] = record,
            LineKind::Pv2 => slot.pv2[location.offset] = record,
        }

        if location.line == LineKind::Mainline {
            if let Some(pvs) = pvs {
                self.attach_pvs_after(slot_index, pvs);
            }
            self.reclassify(slot_index);
            self.reclassify(slot_index + 1);
        }

        UpdateOutcome::Applied {
            slot: slot_index,
            line: location.line,
        }
    }

    /// Attach the engine's continuations from the position after mainline
    /// move `index`. They belong to slot `index + 1`; when that slot doesn't
    /// exist yet it is synthesized from the first PV move.
    pub fn attach_pvs_after(&mut self, index: usize, pvs: PvPair) {
        let target = index + 1;
        if let Some(slot) = self.slots.get_mut(target) {
            slot.pv1 = pvs.pv1;
            slot.pv2 = pvs.pv2;
            return;
        }
        if target != self.slots.len() {
            return;
        }
        let Some(seed) = pvs.pv1.first().or(pvs.pv2.first()) else {
            return;
        };
        let mut mainline = seed.clone().with_context(LineContext::Mainline);
        mainline.ply = target as u32;
        debug!(id = mainline.id, slot = target, "Synthesized provisional slot from PV");
        self.slots.push(MoveSlot {
            mainline,
            pv1: pvs.pv1,
            pv2: pvs.pv2,
            provisional: true,
        });
    }

    /// Classify every move that has a predecessor.
    pub fn apply_classification_pass(&mut self) {
        for index in 1..self.slots.len() {
            self.reclassify(index);
        }
    }

    /// Reconcile a full mainline push with what is already here.
    ///
    /// A slot keeps its PVs when the incoming record has the same id or the
    /// slot was provisional. A slot whose id changed starts over without
    /// PVs. Surplus trailing slots are dropped, except provisional ones
    /// directly after the new end.
    pub fn merge_mainline(&mut self, records: Vec<MoveRecord>) {
        let incoming = records.len();
        for (index, record) in records.into_iter().enumerate() {
            match self.slots.get_mut(index) {
                Some(slot) if slot.provisional || slot.mainline.id == record.id => {
                    slot.mainline = record;
                    slot.provisional = false;
                }
                Some(slot) => *slot = MoveSlot::new(record, Vec::new(), Vec::new()),
                None => {
                    self.append(record, Vec::new(), Vec::new());
                }
            }
        }

        let keep = incoming
            + self.slots[incoming.min(self.slots.len())..]
                .iter()
                .take_while(|slot| slot.provisional)
                .count();
        self.slots.truncate(keep);
    }

    /// Replace the whole list, then attach PVs by the id of the mainline
    /// move they follow. PVs for ids not on the new mainline are dropped.
    pub fn replace_all(&mut self, records: Vec<MoveRecord>, pvs: HashMap<MoveId, PvPair>) {
        *self = Self::from_records(records);
        let mut attachments: Vec<(usize, PvPair)> = pvs
            .into_iter()
            .filter_map(|(id, pair)| {
                let slot = self.slots.iter().position(|s| s.mainline.id == id)?;
                Some((slot, pair))
            })
            .collect();
        attachments.sort_by_key(|(slot, _)| *slot);
        for (slot, pair) in attachments {
            self.attach_pvs_after(slot, pair);
        }
    }

    fn slot_mut(&mut self, index: usize) -> Result<&mut MoveSlot, MoveListError> {
        let len = self.slots.len();
        self.slots
            .get_mut(index)
            .ok_or(MoveListError::OutOfRange { index, len })
    }

    /// A provisional slot showing the same position as `record`.
    fn provisional_match(&self, record: &MoveRecord) -> Option<RecordLocation> {
        if record.context != LineContext::Mainline {
            return None;
        }
        let key = position_key(&record.fen);
        let slot = self
            .slots
            .iter()
            .position(|s| s.provisional && position_key(&s.mainline.fen) == key)?;
        Some(RecordLocation {
            slot,
            line: LineKind::Mainline,
            offset: 0,
        })
    }

    /// Classify mainline move `index` against move `index - 1`. Provisional
    /// slots and moves without scores on both sides are left alone.
    fn reclassify(&mut self, index: usize) {
        if index == 0 || index >= self.slots.len() || self.slots[index].provisional {
            return;
        }
        let Some(before) = self.slots[index - 1].mainline.score else {
            return;
        };
        let slot = &self.slots[index];
        let (Some(after), Some(mover)) = (slot.mainline.score, slot.mainline.mover()) else {
            return;
        };
        let alternatives: Vec<i32> = [slot.pv1.first(), slot.pv2.first()]
            .into_iter()
            .flatten()
            .filter(|alt| alt.uci != slot.mainline.uci)
            .filter_map(|alt| alt.score)
            .collect();

        let verdict = classify_move(before, after, mover, &alternatives);
        self.slots[index].mainline.classification = Some(verdict);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis::MoveClassification;

    const AFTER_WHITE: &str = "8/8/8/8/8/8/8/K6k b - - 0 1";
    const AFTER_BLACK: &str = "8/8/8/8/8/8/8/K6k w - - 0 1";

    fn rec(id: MoveId, uci: &str) -> MoveRecord {
        let fen = if id % 2 == 0 { AFTER_WHITE } else { AFTER_BLACK };
        MoveRecord::new(id, id as u32, fen, uci, LineContext::Mainline)
    }

    fn pv(id: MoveId, uci: &str, context: LineContext) -> MoveRecord {
        rec(id, uci).with_context(context)
    }

    fn three_moves() -> MoveList {
        MoveList::from_records([rec(0, "e2e4"), rec(1, "e7e5"), rec(2, "g1f3")])
    }

    #[test]
    fn append_returns_slot_index() {
        let mut list = MoveList::new();
        assert_eq!(list.append(rec(0, "e2e4"), vec![], vec![]), 0);
        assert_eq!(list.append(rec(1, "e7e5"), vec![], vec![]), 1);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn out_of_range_queries_are_empty() {
        let list = three_moves();
        assert!(list.mainline_at(3).is_none());
        assert!(list.pv1_at(99).is_empty());
        assert!(list.pv2_at(99).is_empty());
        assert!(list.all_pv_at(99).is_empty());
        assert!(!list.is_provisional(99));
    }

    #[test]
    fn out_of_range_mutations_fail() {
        let mut list = three_moves();
        assert_eq!(
            list.replace_mainline_at(3, rec(9, "a2a3")),
            Err(MoveListError::OutOfRange { index: 3, len: 3 })
        );
        assert!(list.set_pv1_at(5, vec![]).is_err());
        assert!(list.set_pv2_at(5, vec![]).is_err());
        assert_eq!(list, three_moves());
    }

    #[test]
    fn all_pv_is_pv1_then_pv2() {
        let mut list = three_moves();
        list.set_pv1_at(1, vec![pv(10, "c7c5", LineContext::Pv1)]).unwrap();
        list.set_pv2_at(1, vec![pv(11, "e7e6", LineContext::Pv2)]).unwrap();
        let ids: Vec<MoveId> = list.all_pv_at(1).iter().map(|r| r.id).collect();
        assert_eq!(ids, [10, 11]);
    }

    #[test]
    fn find_by_id_prefers_mainline_then_pv1_then_pv2() {
        let mut list = three_moves();
        list.set_pv2_at(0, vec![pv(7, "d2d4", LineContext::Pv2)]).unwrap();
        list.set_pv1_at(2, vec![pv(8, "b1c3", LineContext::Pv1), pv(7, "d7d5", LineContext::Pv1)])
            .unwrap();

        assert_eq!(
            list.find_by_id(2),
            Some(RecordLocation {
                slot: 2,
                line: LineKind::Mainline,
                offset: 0
            })
        );
        // Id 7 sits in PV2 of slot 0 and PV1 of slot 2: PV1 wins.
        assert_eq!(
            list.find_by_id(7),
            Some(RecordLocation {
                slot: 2,
                line: LineKind::Pv1,
                offset: 1
            })
        );
        assert_eq!(list.find_by_id(42), None);
    }

    #[test]
    fn next_id_covers_pv_records() {
        let mut list = three_moves();
        assert_eq!(list.next_id(), 3);
        list.set_pv2_at(1, vec![pv(40, "c7c5", LineContext::Pv2)]).unwrap();
        assert_eq!(list.next_id(), 41);
        assert_eq!(MoveList::new().next_id(), 0);
    }

    #[test]
    fn mainline_update_overwrites_and_attaches_pvs_to_next_slot() {
        let mut list = three_moves();
        let analysed = rec(1, "e7e5").with_score(20).analyzed();
        let pvs = PvPair::new(
            vec![pv(10, "g1f3", LineContext::Pv1), pv(11, "b8c6", LineContext::Pv1)],
            vec![pv(12, "f1c4", LineContext::Pv2)],
        );

        let outcome = list.apply_analysis_update(1, analysed.clone(), Some(pvs.clone()));

        assert_eq!(
            outcome,
            UpdateOutcome::Applied {
                slot: 1,
                line: LineKind::Mainline
            }
        );
        assert_eq!(list.mainline_at(1), Some(&analysed));
        assert_eq!(list.pv1_at(2), pvs.pv1.as_slice());
        assert_eq!(list.pv2_at(2), pvs.pv2.as_slice());
        assert!(list.pv1_at(1).is_empty());
    }

    #[test]
    fn pv_hit_replaces_in_place() {
        let mut list = three_moves();
        list.set_pv1_at(2, vec![pv(10, "b1c3", LineContext::Pv1)]).unwrap();
        let analysed = pv(10, "b1c3", LineContext::Pv1).with_score(15).analyzed();

        let outcome = list.apply_analysis_update(10, analysed.clone(), None);

        assert_eq!(
            outcome,
            UpdateOutcome::Applied {
                slot: 2,
                line: LineKind::Pv1
            }
        );
        assert_eq!(list.pv1_at(2), [analysed].as_slice());
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn unknown_id_leaves_list_untouched() {
        let mut list = three_moves();
        let before = list.clone();
        let outcome = list.apply_analysis_update(
            99,
            rec(99, "h2h4").with_score(-300),
            Some(PvPair::new(vec![pv(100, "a7a6", LineContext::Pv1)], vec![])),
        );
        assert_eq!(outcome, UpdateOutcome::Stale);
        assert_eq!(list, before);
    }

    #[test]
    fn pv_for_missing_slot_synthesizes_provisional_mainline() {
        let mut list = MoveList::from_records([rec(0, "e2e4"), rec(1, "e7e5")]);
        let pvs = PvPair::new(vec![pv(2, "g1f3", LineContext::Pv1), pv(3, "b8c6", LineContext::Pv1)], vec![]);

        list.apply_analysis_update(1, rec(1, "e7e5").with_score(10), Some(pvs));

        assert_eq!(list.len(), 3);
        assert!(list.is_provisional(2));
        let provisional = list.mainline_at(2).unwrap();
        assert_eq!(provisional.id, 2);
        assert_eq!(provisional.uci, "g1f3");
        assert_eq!(provisional.context, LineContext::Mainline);
        assert_eq!(list.pv1_at(2).len(), 2);

        // The real move arrives under the same id: overwritten, no new slot.
        let real = rec(2, "g1f3").with_score(25).analyzed();
        list.apply_analysis_update(2, real.clone(), None);
        assert_eq!(list.len(), 3);
        assert!(!list.is_provisional(2));
        assert_eq!(list.mainline_at(2), Some(&real));
    }

    #[test]
    fn provisional_slot_is_taken_over_by_position_on_id_miss() {
        let mut list = MoveList::from_records([rec(0, "e2e4"), rec(1, "e7e5")]);
        let seed = pv(20, "g1f3", LineContext::Pv1);
        list.attach_pvs_after(1, PvPair::new(vec![seed.clone()], vec![]));
        assert!(list.is_provisional(2));

        let mut real = MoveRecord::new(2, 2, seed.fen.clone(), "g1f3", LineContext::Mainline);
        real.score = Some(30);
        let outcome = list.apply_analysis_update(2, real.clone(), None);

        assert!(outcome.is_applied());
        assert_eq!(list.len(), 3);
        assert_eq!(list.mainline_at(2), Some(&real));
    }

    #[test]
    fn update_reclassifies_against_predecessor() {
        let mut list = MoveList::from_records([rec(0, "e2e4").with_score(0), rec(1, "f7f6")]);
        // Black's move takes the score from 0 to +150: a blunder for Black.
        list.apply_analysis_update(1, rec(1, "f7f6").with_score(150).analyzed(), None);
        assert_eq!(
            list.mainline_at(1).unwrap().classification,
            Some(MoveClassification::Blunder)
        );

        // Re-analysis softens the verdict retroactively.
        list.apply_analysis_update(1, rec(1, "f7f6").with_score(30).analyzed(), None);
        assert_eq!(
            list.mainline_at(1).unwrap().classification,
            Some(MoveClassification::Inaccuracy)
        );
    }

    #[test]
    fn classification_uses_alternatives_stored_at_the_slot() {
        let mut list = MoveList::from_records([rec(0, "e2e4").with_score(30), rec(1, "c7c5").with_score(20)]);
        // Alternatives to Black's move, both clearly worse for Black.
        list.set_pv1_at(1, vec![pv(10, "a7a6", LineContext::Pv1).with_score(120)]).unwrap();
        list.set_pv2_at(1, vec![pv(11, "g7g5", LineContext::Pv2).with_score(150)]).unwrap();

        list.apply_classification_pass();

        assert_eq!(
            list.mainline_at(1).unwrap().classification,
            Some(MoveClassification::Great)
        );
        assert_eq!(list.mainline_at(0).unwrap().classification, None);
    }

    #[test]
    fn merge_keeps_pvs_for_matching_ids_and_replaces_provisional() {
        let mut list = MoveList::from_records([rec(0, "e2e4"), rec(1, "e7e5")]);
        list.set_pv1_at(1, vec![pv(10, "c7c5", LineContext::Pv1)]).unwrap();
        list.attach_pvs_after(1, PvPair::new(vec![pv(11, "g1f3", LineContext::Pv1)], vec![]));
        assert!(list.is_provisional(2));

        list.merge_mainline(vec![rec(0, "e2e4"), rec(1, "e7e5"), rec(2, "f1c4")]);

        assert_eq!(list.len(), 3);
        assert!(!list.is_provisional(2));
        assert_eq!(list.mainline_at(2).unwrap().uci, "f1c4");
        assert_eq!(list.pv1_at(1)[0].id, 10);
        assert_eq!(list.pv1_at(2)[0].id, 11);
    }

    #[test]
    fn merge_drops_stale_tail_but_keeps_provisional_lookahead() {
        let mut list = three_moves();
        list.merge_mainline(vec![rec(0, "e2e4")]);
        assert_eq!(list.len(), 1);

        let mut list = MoveList::from_records([rec(0, "e2e4")]);
        list.attach_pvs_after(0, PvPair::new(vec![pv(5, "e7e5", LineContext::Pv1)], vec![]));
        list.merge_mainline(vec![rec(0, "e2e4")]);
        assert_eq!(list.len(), 2);
        assert!(list.is_provisional(1));
    }

    #[test]
    fn merge_with_new_id_drops_old_pvs() {
        let mut list = three_moves();
        list.set_pv1_at(1, vec![pv(10, "c7c5", LineContext::Pv1)]).unwrap();
        list.merge_mainline(vec![rec(0, "e2e4"), rec(7, "d7d5"), rec(2, "e4d5")]);
        assert_eq!(list.mainline_at(1).unwrap().id, 7);
        assert!(list.pv1_at(1).is_empty());
    }

    #[test]
    fn replace_all_attaches_pvs_by_parent_id() {
        let mut list = three_moves();
        let mut pvs = HashMap::new();
        pvs.insert(0, PvPair::new(vec![pv(20, "c7c5", LineContext::Pv1)], vec![]));
        pvs.insert(2, PvPair::new(vec![pv(21, "b8c6", LineContext::Pv1)], vec![]));
        pvs.insert(55, PvPair::new(vec![pv(22, "a7a6", LineContext::Pv1)], vec![]));

        list.replace_all(vec![rec(0, "e2e4"), rec(1, "e7e5"), rec(2, "g1f3")], pvs);

        assert_eq!(list.pv1_at(1)[0].id, 20);
        assert_eq!(list.len(), 4);
        assert!(list.is_provisional(3));
        assert_eq!(list.mainline_at(3).unwrap().id, 21);
        assert!(list.find_by_id(22).is_none());
    }
}
