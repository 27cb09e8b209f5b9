use std::fs::File;
use std::io::Write;

use crate::board::{BoardView, HeadcountSummary};
use crate::board::render::Card;

/// Formats a badge card as `name (eid, code)` with a presence marker
pub fn format_card(card: &Card) -> String {
    let marker = if card.present { "*" } else { " " };
    format!("{} {} ({}, {})", marker, card.name, card.eid, card.scode)
}

/// Writes the board in plain text, one tile per block
pub fn write_board<W: Write>(
    out: &mut W,
    view: &BoardView,
    summary: &HeadcountSummary,
) -> std::io::Result<()> {
    writeln!(
        out,
        "** {} {} {} {} **",
        if summary.date.is_empty() { "NA" } else { summary.date.as_str() },
        summary.day,
        summary.shift,
        summary.shift_type
    )?;
    writeln!(
        out,
        "Planned HC: {}  Actual HC: {}  Badges: {}",
        summary.planned_hc, summary.actual_hc, view.total
    )?;

    for tile in &view.tiles {
        writeln!(out, "\n[{}] {}", tile.label, tile.count)?;
        for card in &tile.cards {
            writeln!(out, "  {}", format_card(card))?;
        }
    }

    writeln!(out, "\n[Unassigned] {}", view.unassigned.count)?;
    for card in &view.unassigned.cards {
        writeln!(out, "  {}", format_card(card))?;
    }
    if let Some(more) = &view.unassigned.show_more {
        writeln!(out, "  ... {}", more.label)?;
    }

    if !view.orphans.is_empty() {
        writeln!(out, "\n⚠️  Badges on unknown locations ({}):", view.orphans.len())?;
        for orphan in &view.orphans {
            writeln!(out, "  - {} ({}) -> {}", orphan.name, orphan.badge_id, orphan.location)?;
        }
    }
    Ok(())
}

/// Prints the board to stdout
pub fn print_board(view: &BoardView, summary: &HeadcountSummary) -> std::io::Result<()> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    write_board(&mut handle, view, summary)
}

pub fn write_board_to_file(
    view: &BoardView,
    summary: &HeadcountSummary,
    filename: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut file = File::create(filename)?;
    write_board(&mut file, view, summary)?;
    Ok(())
}
