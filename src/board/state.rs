use std::collections::BTreeMap;

use log::debug;
use rand::Rng;

use super::types::{find_tile, Badge, Location};
use crate::error::{BoardError, BoardResult};

/// Badge id -> badge. Ordered by id, which is the one enumeration order
/// every operation and the renderer rely on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssignmentState {
    badges: BTreeMap<String, Badge>,
}

impl AssignmentState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_badges<I: IntoIterator<Item = Badge>>(badges: I) -> Self {
        let mut state = Self::new();
        state.replace_all(badges);
        state
    }

    /// Drops every badge and installs the new set
    pub fn replace_all<I: IntoIterator<Item = Badge>>(&mut self, badges: I) {
        self.badges = badges
            .into_iter()
            .map(|badge| (badge.id.clone(), badge))
            .collect();
        debug!("assignment state replaced, {} badges", self.badges.len());
    }

    pub fn len(&self) -> usize {
        self.badges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.badges.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Badge> {
        self.badges.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.badges.contains_key(id)
    }

    /// Badges in id order
    pub fn iter(&self) -> impl Iterator<Item = &Badge> {
        self.badges.values()
    }

    pub fn badges(&self) -> &BTreeMap<String, Badge> {
        &self.badges
    }

    /// Finds the badge a drag payload refers to: a badge id first, then an
    /// employee id. Only state is consulted.
    pub fn resolve(&self, payload: &str) -> Option<&str> {
        let payload = payload.trim();
        if let Some((id, _)) = self.badges.get_key_value(payload) {
            return Some(id.as_str());
        }
        self.badges
            .values()
            .find(|badge| badge.eid == payload)
            .map(|badge| badge.id.as_str())
    }

    /// Moves one badge. An empty key sends it back to the pool; keys outside
    /// the tile catalog are rejected and leave the badge where it was.
    pub fn move_to_location(&mut self, badge_id: &str, key: Option<&str>) -> BoardResult<()> {
        let location = Location::from_key(key);
        if let Location::Tile(tile) = &location {
            if find_tile(tile).is_none() {
                return Err(BoardError::UnknownTile(tile.clone()));
            }
        }

        let badge = self
            .badges
            .get_mut(badge_id)
            .ok_or_else(|| BoardError::UnknownBadge(badge_id.to_string()))?;
        debug!("move {} {} -> {}", badge.id, badge.location, location);
        badge.location = location;
        Ok(())
    }

    /// Moves up to `n` randomly chosen unassigned badges onto `key`.
    /// Returns how many actually moved; the caller reports any shortfall.
    pub fn assign_random<R: Rng + ?Sized>(
        &mut self,
        key: &str,
        n: usize,
        rng: &mut R,
    ) -> BoardResult<usize> {
        if find_tile(key).is_none() {
            return Err(BoardError::UnknownTile(key.to_string()));
        }

        let mut pool: Vec<String> = self
            .badges
            .values()
            .filter(|badge| badge.location.is_unassigned())
            .map(|badge| badge.id.clone())
            .collect();

        let mut moved = 0;
        while moved < n && !pool.is_empty() {
            // draw-and-remove keeps the sample free of repeats
            let idx = rng.gen_range(0..pool.len());
            let id = pool.swap_remove(idx);
            if let Some(badge) = self.badges.get_mut(&id) {
                badge.location = Location::Tile(key.to_string());
                moved += 1;
            }
        }

        debug!("assign_random {}: requested {}, moved {}", key, n, moved);
        Ok(moved)
    }

    /// Sends up to `n` badges on tile `key` back to the pool, taking the
    /// last ones in id order first. Returns how many moved.
    pub fn unassign_from_tile(&mut self, key: &str, n: usize) -> BoardResult<usize> {
        if find_tile(key).is_none() {
            return Err(BoardError::UnknownTile(key.to_string()));
        }

        let on_tile: Vec<String> = self
            .badges
            .values()
            .filter(|badge| badge.location.key() == key && !badge.location.is_unassigned())
            .map(|badge| badge.id.clone())
            .collect();

        let mut moved = 0;
        for id in on_tile.iter().rev().take(n) {
            if let Some(badge) = self.badges.get_mut(id) {
                badge.location = Location::Unassigned;
                moved += 1;
            }
        }

        debug!("unassign_from_tile {}: requested {}, moved {}", key, n, moved);
        Ok(moved)
    }

    /// Flips presence and returns the new value
    pub fn toggle_presence(&mut self, badge_id: &str) -> BoardResult<bool> {
        let badge = self
            .badges
            .get_mut(badge_id)
            .ok_or_else(|| BoardError::UnknownBadge(badge_id.to_string()))?;
        badge.present = !badge.present;
        Ok(badge.present)
    }

    /// Number of badges at a location key (`unassigned` or a tile)
    pub fn count_at(&self, key: &str) -> usize {
        self.badges
            .values()
            .filter(|badge| badge.location.key() == key)
            .count()
    }

    pub fn unassigned_count(&self) -> usize {
        self.badges
            .values()
            .filter(|badge| badge.location.is_unassigned())
            .count()
    }

    /// Badges marked present anywhere on the board
    pub fn present_count(&self) -> usize {
        self.badges.values().filter(|badge| badge.present).count()
    }
}
