use std::collections::BTreeMap;

use log::warn;
use serde::Serialize;

use super::state::AssignmentState;
use super::types::{Badge, TileDefinition, TILES, UNASSIGNED_KEY};
use crate::view::ViewModes;

/// Cards shown in the compact unassigned preview
pub const PREVIEW_SIZE: usize = 6;
/// How far each stacked card is pulled up over the previous one
pub const STACK_OVERLAP_PX: i32 = 38;
/// Cards per row inside a tile
pub const TILE_COLUMNS: usize = 3;
pub const CARD_WIDTH_PX: i32 = 96;
pub const CARD_HEIGHT_PX: i32 = 54;
pub const CARD_GAP_PX: i32 = 6;

/// Placement of one badge card inside its container
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Card {
    pub badge_id: String,
    pub eid: String,
    pub name: String,
    pub scode: String,
    pub present: bool,
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Card {
    fn from_badge(badge: &Badge) -> Card {
        Card {
            badge_id: badge.id.clone(),
            eid: badge.eid.clone(),
            name: badge.name.clone(),
            scode: badge.shift_code.clone(),
            present: badge.present,
            x: 0,
            y: 0,
            z: 0,
        }
    }
}

/// The "Show N more" affordance under the compact preview. Its action only
/// switches the view to expanded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShowMore {
    pub remaining: usize,
    pub label: String,
    pub action: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileView {
    pub identifier: &'static str,
    pub key: &'static str,
    pub label: &'static str,
    pub count: usize,
    pub cards: Vec<Card>,
}

impl TileView {
    fn empty(tile: &TileDefinition) -> TileView {
        TileView {
            identifier: tile.identifier,
            key: tile.key,
            label: tile.label,
            count: 0,
            cards: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UnassignedView {
    pub count: usize,
    pub cards: Vec<Card>,
    pub show_more: Option<ShowMore>,
}

/// A badge whose location has no layer on the board
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Orphan {
    pub badge_id: String,
    pub name: String,
    pub location: String,
}

/// Everything the page paints, derived from state and view modes
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BoardView {
    pub tiles: Vec<TileView>,
    pub unassigned: UnassignedView,
    pub orphans: Vec<Orphan>,
    pub total: usize,
    pub actual_hc: usize,
    pub modes: ViewModes,
}

impl BoardView {
    /// Empties every container
    fn clear(&mut self) {
        self.tiles.clear();
        self.unassigned = UnassignedView::default();
        self.orphans.clear();
        self.total = 0;
        self.actual_hc = 0;
    }

    pub fn tile(&self, key: &str) -> Option<&TileView> {
        self.tiles.iter().find(|tile| tile.key == key)
    }

    /// Per-tile counts keyed by tile key
    pub fn tile_counts(&self) -> BTreeMap<&'static str, usize> {
        self.tiles.iter().map(|tile| (tile.key, tile.count)).collect()
    }
}

/// Holds the drawn board and rebuilds it from scratch on every call.
/// There is no partial update path.
#[derive(Debug, Default)]
pub struct Renderer {
    view: BoardView,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> &BoardView {
        &self.view
    }

    pub fn redraw(&mut self, state: &AssignmentState, modes: &ViewModes) -> &BoardView {
        self.view.clear();

        // One layer per catalog tile, in catalog order
        let mut layers: Vec<TileView> = TILES.iter().map(TileView::empty).collect();
        let mut pool: Vec<&Badge> = Vec::new();

        for badge in state.iter() {
            let key = badge.location.key();
            if key == UNASSIGNED_KEY {
                pool.push(badge);
                continue;
            }
            match layers.iter_mut().find(|layer| layer.key == key) {
                Some(layer) => layer.cards.push(Card::from_badge(badge)),
                None => {
                    warn!("badge {} sits on unknown location '{}'", badge.id, key);
                    self.view.orphans.push(Orphan {
                        badge_id: badge.id.clone(),
                        name: badge.name.clone(),
                        location: key.to_string(),
                    });
                }
            }
        }

        let unassigned_count = pool.len();
        let shown = if modes.is_expanded() {
            unassigned_count
        } else {
            unassigned_count.min(PREVIEW_SIZE)
        };
        let mut stack: Vec<Card> = pool.iter().take(shown).map(|b| Card::from_badge(b)).collect();
        let remaining = unassigned_count - shown;
        let show_more = (remaining > 0).then(|| ShowMore {
            remaining,
            label: format!("Show {} more", remaining),
            action: "expand",
        });

        layout_stack(&mut stack);
        for layer in &mut layers {
            layout_flow(&mut layer.cards);
            layer.count = layer.cards.len();
        }

        self.view.unassigned = UnassignedView {
            count: unassigned_count,
            cards: stack,
            show_more,
        };
        self.view.tiles = layers;
        self.view.total = state.len();
        self.view.actual_hc = state.present_count();
        self.view.modes = modes.clone();
        &self.view
    }
}

/// Overlapping vertical fan: each later card sits higher in z and is pulled
/// up over the one before it
fn layout_stack(cards: &mut [Card]) {
    for (idx, card) in cards.iter_mut().enumerate() {
        let idx = idx as i32;
        card.x = 0;
        card.y = idx * (CARD_HEIGHT_PX - STACK_OVERLAP_PX);
        card.z = idx + 1;
    }
}

/// Non-overlapping grid inside a tile
fn layout_flow(cards: &mut [Card]) {
    for (idx, card) in cards.iter_mut().enumerate() {
        let col = (idx % TILE_COLUMNS) as i32;
        let row = (idx / TILE_COLUMNS) as i32;
        card.x = col * (CARD_WIDTH_PX + CARD_GAP_PX);
        card.y = row * (CARD_HEIGHT_PX + CARD_GAP_PX);
        card.z = 0;
    }
}
