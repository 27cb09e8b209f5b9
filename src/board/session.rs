use chrono::NaiveDate;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use super::render::{BoardView, Renderer};
use super::state::AssignmentState;
use super::types::{find_tile, Badge};
use crate::error::{BoardError, BoardResult};
use crate::headcount::{planned_hc, volume_per_head, Adjustments};
use crate::roster::{ingest, parse_input_date, CsvTable, IngestNotice, RosterFilter, Site};
use crate::rules::{shift_type_label, weekday_index, weekday_name, ShiftKind};
use crate::snapshot::{Snapshot, SnapshotMeta};
use crate::view::{CloseTrigger, Rect, ScrollCapture, ViewModes, Viewport};

/// Parsed CSV inputs plus the form selections of one submission
#[derive(Debug, Clone)]
pub struct Submission {
    pub roster: CsvTable,
    pub swaps: CsvTable,
    pub vet_vto: CsvTable,
    pub labor_share: CsvTable,
    pub date: String,
    pub shift: ShiftKind,
    /// Site code, blank for all sites
    pub site: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitOutcome {
    pub badges: usize,
    pub base_hc: usize,
    pub planned_hc: i64,
    pub adjustments: Adjustments,
    pub notices: Vec<IngestNotice>,
}

/// Result of a manual count edit on a tile
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountEdit {
    pub key: String,
    pub requested: usize,
    pub previous: usize,
    pub current: usize,
    /// Badges that could not be pulled from the pool
    pub shortfall: usize,
}

impl CountEdit {
    pub fn warning(&self) -> Option<String> {
        (self.shortfall > 0).then(|| {
            format!(
                "Only {} badges available for {}; requested {}",
                self.current, self.key, self.requested
            )
        })
    }
}

/// HC figures shown next to the board
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadcountSummary {
    pub date: String,
    pub day: String,
    pub shift: ShiftKind,
    pub site: String,
    pub shift_type: String,
    pub planned_hc: i64,
    pub actual_hc: usize,
    pub volume_per_head: f64,
}

/// The one owner of the board: assignment state, view modes, snapshot meta
/// and the renderer. Every mutation redraws before returning.
pub struct Session {
    state: AssignmentState,
    modes: ViewModes,
    meta: SnapshotMeta,
    renderer: Renderer,
    rng: StdRng,
}

impl Default for Session {
    fn default() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session with a fixed random source, for reproducible assignment
    pub fn with_rng(rng: StdRng) -> Self {
        let mut session = Session {
            state: AssignmentState::new(),
            modes: ViewModes::new(),
            meta: SnapshotMeta::default(),
            renderer: Renderer::new(),
            rng,
        };
        session.redraw();
        session
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn state(&self) -> &AssignmentState {
        &self.state
    }

    pub fn modes(&self) -> &ViewModes {
        &self.modes
    }

    pub fn meta(&self) -> &SnapshotMeta {
        &self.meta
    }

    pub fn view(&self) -> &BoardView {
        self.renderer.view()
    }

    fn redraw(&mut self) -> &BoardView {
        self.renderer.redraw(&self.state, &self.modes)
    }

    /// Builds badges from a submission and replaces the whole board
    pub fn submit(&mut self, submission: &Submission) -> SubmitOutcome {
        let date = parse_input_date(&submission.date);
        let filter = RosterFilter {
            date,
            shift: submission.shift,
            site: Site::parse_filter(&submission.site),
        };
        let ingested = ingest(&submission.roster, &filter);

        let adjustments = Adjustments::from_tables(
            &submission.swaps,
            &submission.vet_vto,
            &submission.labor_share,
        );
        let base_hc = ingested.people.len();
        let planned = planned_hc(base_hc, &adjustments);

        let rng = &mut self.rng;
        let badges: Vec<Badge> = ingested
            .people
            .iter()
            .map(|person| Badge::from_person(person, &mut *rng))
            .collect();
        self.state.replace_all(badges);

        self.meta = SnapshotMeta {
            date: submission.date.trim().to_string(),
            shift: submission.shift,
            site: submission.site.trim().to_string(),
            planned_hc: planned,
        };
        self.redraw();

        info!(
            "roster submitted: {} rows, {} badges, planned HC {}",
            ingested.total_rows, base_hc, planned
        );

        SubmitOutcome {
            badges: self.state.len(),
            base_hc,
            planned_hc: planned,
            adjustments,
            notices: ingested.notices,
        }
    }

    /// Drop of a badge onto a tile (or back onto the pool with `None`)
    pub fn drop_badge(&mut self, payload: &str, key: Option<&str>) -> BoardResult<&BoardView> {
        let id = self
            .state
            .resolve(payload)
            .map(str::to_string)
            .ok_or_else(|| BoardError::UnknownBadge(payload.to_string()))?;
        self.state.move_to_location(&id, key)?;
        Ok(self.redraw())
    }

    /// Manual count edit: grows the tile from the pool or shrinks it back
    pub fn set_tile_count(&mut self, key: &str, target: usize) -> BoardResult<CountEdit> {
        if find_tile(key).is_none() {
            return Err(BoardError::UnknownTile(key.to_string()));
        }

        let previous = self.state.count_at(key);
        let mut shortfall = 0;
        if target > previous {
            let wanted = target - previous;
            let moved = self.state.assign_random(key, wanted, &mut self.rng)?;
            shortfall = wanted - moved;
        } else if target < previous {
            self.state.unassign_from_tile(key, previous - target)?;
        }
        self.redraw();

        let edit = CountEdit {
            key: key.to_string(),
            requested: target,
            previous,
            current: self.state.count_at(key),
            shortfall,
        };
        debug!("count edit {:?}", edit);
        Ok(edit)
    }

    pub fn toggle_presence(&mut self, badge_id: &str) -> BoardResult<bool> {
        let present = self.state.toggle_presence(badge_id)?;
        self.redraw();
        Ok(present)
    }

    pub fn actual_hc(&self) -> usize {
        self.state.present_count()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            badges: self.state.badges().clone(),
            meta: self.meta.clone(),
        }
    }

    /// Replaces the board with a stored snapshot
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.state.replace_all(snapshot.badges.into_values());
        self.meta = snapshot.meta;
        self.redraw();
        info!("snapshot restored, {} badges", self.state.len());
    }

    pub fn expand_unassigned(&mut self, capture: ScrollCapture) -> &BoardView {
        self.modes.open_overlay(capture);
        self.redraw()
    }

    pub fn collapse_unassigned(&mut self, trigger: CloseTrigger) -> Option<ScrollCapture> {
        let restored = self.modes.close_overlay(trigger);
        self.redraw();
        restored
    }

    pub fn handle_key(&mut self, key: &str) -> Option<ScrollCapture> {
        let restored = self.modes.handle_key(key);
        if restored.is_some() {
            self.redraw();
        }
        restored
    }

    pub fn reposition_overlay(&self, viewport: &Viewport, anchor: &Rect) -> Option<Rect> {
        self.modes.reposition(viewport, anchor)
    }

    pub fn publish(&mut self, confirmed: bool) -> BoardResult<Option<ScrollCapture>> {
        let restored = self.modes.enter_publish(confirmed)?;
        self.redraw();
        Ok(restored)
    }

    pub fn unpublish(&mut self) -> &BoardView {
        self.modes.exit_publish();
        self.redraw()
    }

    /// Planned vs actual headcount for the current meta
    pub fn summary(&self, planned_volume: f64) -> HeadcountSummary {
        let date: Option<NaiveDate> = parse_input_date(&self.meta.date);
        let (day, shift_type) = match date {
            Some(d) => (
                weekday_name(d).to_string(),
                shift_type_label(self.meta.shift, weekday_index(d)).to_string(),
            ),
            None => (String::new(), String::new()),
        };
        let actual_hc = self.actual_hc();
        HeadcountSummary {
            date: self.meta.date.clone(),
            day,
            shift: self.meta.shift,
            site: self.meta.site.clone(),
            shift_type,
            planned_hc: self.meta.planned_hc,
            actual_hc,
            volume_per_head: volume_per_head(planned_volume, actual_hc),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::Row;

    fn roster(n: usize) -> CsvTable {
        let rows: Vec<Row> = (0..n)
            .map(|i| {
                [
                    ("Employee Status", "Active".to_string()),
                    ("Department ID", "1211010".to_string()),
                    ("Shift Pattern", "DA-1".to_string()),
                    ("Employee Name", format!("Person {}", i)),
                    ("Employee ID", format!("{}", 100 + i)),
                ]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect()
            })
            .collect();
        CsvTable::from_rows(rows)
    }

    fn submission(n: usize) -> Submission {
        Submission {
            roster: roster(n),
            swaps: CsvTable::default(),
            vet_vto: CsvTable::default(),
            labor_share: CsvTable::default(),
            date: "01/01/2024".to_string(),
            shift: ShiftKind::Day,
            site: "YHM2".to_string(),
        }
    }

    #[test]
    fn submit_populates_unassigned_pool() {
        let mut session = Session::seeded(3);
        let outcome = session.submit(&submission(9));

        assert_eq!(outcome.badges, 9);
        assert_eq!(outcome.planned_hc, 9);
        assert!(session.state().iter().all(|b| b.location.is_unassigned() && !b.present));
        assert_eq!(session.view().unassigned.count, 9);
        assert_eq!(session.meta().site, "YHM2");
    }

    #[test]
    fn resubmission_replaces_every_badge() {
        let mut session = Session::seeded(3);
        session.submit(&submission(4));
        let old_ids: Vec<String> = session.state().iter().map(|b| b.id.clone()).collect();

        session.submit(&submission(2));
        assert_eq!(session.state().len(), 2);
        assert!(old_ids.iter().all(|id| !session.state().contains(id)));
    }

    #[test]
    fn count_edits_grow_and_shrink_tiles() {
        let mut session = Session::seeded(11);
        session.submit(&submission(5));

        let grow = session.set_tile_count("pick", 3).unwrap();
        assert_eq!(grow.current, 3);
        assert_eq!(grow.shortfall, 0);
        assert_eq!(session.view().tile("pick").unwrap().count, 3);

        let shrink = session.set_tile_count("pick", 1).unwrap();
        assert_eq!(shrink.previous, 3);
        assert_eq!(shrink.current, 1);
        assert_eq!(session.view().unassigned.count, 4);
    }

    #[test]
    fn count_edit_reports_shortfall() {
        let mut session = Session::seeded(11);
        session.submit(&submission(2));

        let edit = session.set_tile_count("ship", 5).unwrap();
        assert_eq!(edit.current, 2);
        assert_eq!(edit.shortfall, 3);
        assert_eq!(
            edit.warning().unwrap(),
            "Only 2 badges available for ship; requested 5"
        );
    }

    #[test]
    fn drop_by_employee_id_moves_badge() {
        let mut session = Session::seeded(5);
        session.submit(&submission(3));

        let view = session.drop_badge("101", Some("stow")).unwrap();
        assert_eq!(view.tile("stow").unwrap().cards[0].eid, "101");

        assert!(matches!(
            session.drop_badge("101", Some("moon")),
            Err(BoardError::UnknownTile(_))
        ));
        assert_eq!(session.view().tile("stow").unwrap().count, 1);
    }

    #[test]
    fn presence_drives_actual_hc_only() {
        let mut session = Session::seeded(5);
        session.submit(&submission(3));
        session.drop_badge("100", Some("dock")).unwrap();
        let id = session.state().resolve("100").unwrap().to_string();
        let counts_before = session.view().tile_counts();

        assert!(session.toggle_presence(&id).unwrap());
        assert_eq!(session.view().actual_hc, 1);
        assert_eq!(session.view().tile_counts(), counts_before);
    }

    #[test]
    fn snapshot_restore_reproduces_state() {
        let mut session = Session::seeded(8);
        session.submit(&submission(6));
        session.set_tile_count("pack", 2).unwrap();
        let id = session.state().iter().next().unwrap().id.clone();
        session.toggle_presence(&id).unwrap();
        let saved = session.snapshot();

        let mut other = Session::seeded(9);
        other.restore(Snapshot::from_json(&saved.to_json().unwrap()).unwrap());
        for badge in session.state().iter() {
            let restored = other.state().get(&badge.id).unwrap();
            assert_eq!(restored.location, badge.location);
            assert_eq!(restored.present, badge.present);
        }
        assert_eq!(other.meta(), session.meta());
    }

    #[test]
    fn view_modes_do_not_touch_state() {
        let mut session = Session::seeded(2);
        session.submit(&submission(10));
        let before = session.state().clone();

        let view = session.expand_unassigned(ScrollCapture::default());
        assert_eq!(view.unassigned.cards.len(), 10);
        session.publish(true).unwrap();
        assert!(!session.modes().is_expanded());
        assert_eq!(session.view().unassigned.cards.len(), 6);
        session.unpublish();

        assert_eq!(session.state(), &before);
    }

    #[test]
    fn summary_labels_the_shift() {
        let mut session = Session::seeded(2);
        session.submit(&submission(4));
        let id = session.state().iter().next().unwrap().id.clone();
        session.toggle_presence(&id).unwrap();

        let summary = session.summary(100.0);
        assert_eq!(summary.day, "Monday");
        assert_eq!(summary.shift_type, "FHD");
        assert_eq!(summary.actual_hc, 1);
        assert_eq!(summary.volume_per_head, 100.0);
    }
}
