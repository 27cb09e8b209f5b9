use serde::Serialize;

use crate::roster::{field, CsvTable};

const DIRECTION_ALIASES: &[&str] = &["Direction", "Swap Direction", "LS Direction"];
const VET_TYPE_ALIASES: &[&str] = &["Type", "VET/VTO", "Opportunity Type"];
const ACCEPTANCE_ALIASES: &[&str] = &["Accepted", "Acceptance", "Status"];

/// Adjustment counts pulled from the optional CSV files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Adjustments {
    pub swap_in: i64,
    pub swap_out: i64,
    pub vet: i64,
    pub vto: i64,
    pub labor_share_in: i64,
    pub labor_share_out: i64,
}

impl Adjustments {
    pub fn from_tables(swaps: &CsvTable, vet_vto: &CsvTable, labor_share: &CsvTable) -> Self {
        let (swap_in, swap_out) = count_directions(swaps);
        let (vet, vto) = count_vet_vto(vet_vto);
        let (labor_share_in, labor_share_out) = count_directions(labor_share);
        Adjustments {
            swap_in,
            swap_out,
            vet,
            vto,
            labor_share_in,
            labor_share_out,
        }
    }

    /// Net effect on headcount
    pub fn net(&self) -> i64 {
        self.swap_in - self.swap_out + self.vet - self.vto + self.labor_share_in
            - self.labor_share_out
    }
}

/// Counts `IN` and `OUT` rows (case-insensitive)
fn count_directions(table: &CsvTable) -> (i64, i64) {
    let mut inbound = 0;
    let mut outbound = 0;
    for row in &table.rows {
        let direction = field(row, DIRECTION_ALIASES);
        if direction.eq_ignore_ascii_case("in") {
            inbound += 1;
        } else if direction.eq_ignore_ascii_case("out") {
            outbound += 1;
        }
    }
    (inbound, outbound)
}

/// An offer counts when nobody recorded a decision, or it was accepted
fn is_accepted(value: &str) -> bool {
    value.is_empty() || value.eq_ignore_ascii_case("yes") || value.eq_ignore_ascii_case("accepted")
}

fn count_vet_vto(table: &CsvTable) -> (i64, i64) {
    let mut vet = 0;
    let mut vto = 0;
    for row in &table.rows {
        if !is_accepted(field(row, ACCEPTANCE_ALIASES)) {
            continue;
        }
        let kind = field(row, VET_TYPE_ALIASES);
        if kind.eq_ignore_ascii_case("vet") {
            vet += 1;
        } else if kind.eq_ignore_ascii_case("vto") {
            vto += 1;
        }
    }
    (vet, vto)
}

/// Planned headcount. Not clamped: inconsistent adjustment data can push it
/// below zero and that is shown as-is.
pub fn planned_hc(base_hc: usize, adjustments: &Adjustments) -> i64 {
    base_hc as i64 + adjustments.net()
}

/// Planned volume per present head, `0` when nobody is present
pub fn volume_per_head(planned_volume: f64, actual_hc: usize) -> f64 {
    if actual_hc == 0 {
        0.0
    } else {
        planned_volume / actual_hc as f64
    }
}
