use std::fmt;

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::roster::{Person, Site};

pub const UNASSIGNED_KEY: &str = "unassigned";

/// A fixed drop target on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TileDefinition {
    /// Id of the layer element the page draws this tile's badges into
    pub identifier: &'static str,
    pub key: &'static str,
    pub label: &'static str,
}

/// Catalog of work tiles in display order
pub const TILES: &[TileDefinition] = &[
    TileDefinition { identifier: "tile-induct", key: "induct", label: "Induct" },
    TileDefinition { identifier: "tile-stow", key: "stow", label: "Stow" },
    TileDefinition { identifier: "tile-pick", key: "pick", label: "Pick" },
    TileDefinition { identifier: "tile-pack", key: "pack", label: "Pack" },
    TileDefinition { identifier: "tile-dock", key: "dock", label: "Dock" },
    TileDefinition { identifier: "tile-ship", key: "ship", label: "Ship" },
    TileDefinition { identifier: "tile-problem-solve", key: "problem_solve", label: "Problem Solve" },
    TileDefinition { identifier: "tile-learning", key: "learning", label: "Learning" },
];

pub fn find_tile(key: &str) -> Option<&'static TileDefinition> {
    TILES.iter().find(|tile| tile.key == key)
}

/// Where a badge currently sits
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Location {
    Unassigned,
    Tile(String),
}

impl Location {
    /// Empty keys and the literal `unassigned` both mean the pool
    pub fn from_key(key: Option<&str>) -> Location {
        match key.map(str::trim) {
            None | Some("") | Some(UNASSIGNED_KEY) => Location::Unassigned,
            Some(key) => Location::Tile(key.to_string()),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Location::Unassigned => UNASSIGNED_KEY,
            Location::Tile(key) => key,
        }
    }

    pub fn is_unassigned(&self) -> bool {
        matches!(self, Location::Unassigned)
    }

    /// True for the pool and for keys present in the tile catalog
    pub fn is_known(&self) -> bool {
        match self {
            Location::Unassigned => true,
            Location::Tile(key) => find_tile(key).is_some(),
        }
    }
}

impl From<String> for Location {
    fn from(value: String) -> Self {
        Location::from_key(Some(&value))
    }
}

impl From<Location> for String {
    fn from(value: Location) -> Self {
        value.key().to_string()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One employee on the board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Badge {
    pub id: String,
    pub eid: String,
    pub name: String,
    #[serde(rename = "scode")]
    pub shift_code: String,
    pub site: Site,
    #[serde(default)]
    pub barcode: String,
    #[serde(default)]
    pub handle: String,
    #[serde(default)]
    pub photo: String,
    #[serde(rename = "loc")]
    pub location: Location,
    #[serde(default)]
    pub present: bool,
}

impl Badge {
    /// New badge for a person, always starting unassigned and absent
    pub fn from_person<R: Rng + ?Sized>(person: &Person, rng: &mut R) -> Badge {
        Badge {
            id: badge_id(&person.eid, rng),
            eid: person.eid.clone(),
            name: person.name.clone(),
            shift_code: person.shift_code.clone(),
            site: person.site,
            barcode: person.barcode.clone(),
            handle: person.handle.clone(),
            photo: person.photo.clone(),
            location: Location::Unassigned,
            present: false,
        }
    }
}

/// `b_<eid>_<suffix>`: the random suffix keeps ids distinct across submissions
/// and between duplicate employee ids
pub fn badge_id<R: Rng + ?Sized>(eid: &str, rng: &mut R) -> String {
    let clean: String = eid
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    let suffix: String = (0..6).map(|_| char::from(rng.sample(Alphanumeric))).collect();
    format!("b_{}_{}", clean, suffix.to_lowercase())
}
