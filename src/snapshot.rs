use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::board::Badge;
use crate::error::{BoardError, BoardResult};
use crate::rules::ShiftKind;

/// Store key of the last submitted roster
pub const LAST_ROSTER_KEY: &str = "vlab:lastRoster";

/// Form selections and planned headcount saved alongside the badges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub date: String,
    pub shift: ShiftKind,
    #[serde(default)]
    pub site: String,
    #[serde(rename = "plannedHC")]
    pub planned_hc: i64,
}

impl Default for SnapshotMeta {
    fn default() -> Self {
        SnapshotMeta {
            date: String::new(),
            shift: ShiftKind::Day,
            site: String::new(),
            planned_hc: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub badges: BTreeMap<String, Badge>,
    pub meta: SnapshotMeta,
}

impl Snapshot {
    pub fn to_json(&self) -> BoardResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses and checks a stored snapshot. Any structural problem is an
    /// `InvalidSnapshot` error.
    pub fn from_json(text: &str) -> BoardResult<Snapshot> {
        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| BoardError::InvalidSnapshot(format!("not JSON: {}", e)))?;

        if !value.get("badges").map(|b| b.is_object()).unwrap_or(false) {
            return Err(BoardError::InvalidSnapshot("missing badges".to_string()));
        }
        if !value.get("meta").map(|m| m.is_object()).unwrap_or(false) {
            return Err(BoardError::InvalidSnapshot("missing meta".to_string()));
        }

        let snapshot: Snapshot = serde_json::from_value(value)
            .map_err(|e| BoardError::InvalidSnapshot(e.to_string()))?;

        if let Some((key, badge)) = snapshot.badges.iter().find(|(key, badge)| **key != badge.id) {
            return Err(BoardError::InvalidSnapshot(format!(
                "badge stored under '{}' has id '{}'",
                key, badge.id
            )));
        }
        Ok(snapshot)
    }
}

/// Minimal string key-value store, the server-side stand-in for the
/// browser's local storage
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> BoardResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> BoardResult<()>;
    fn remove(&mut self, key: &str) -> BoardResult<()>;
}

/// One JSON file per key inside a data directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        FileStore { dir: dir.as_ref().to_path_buf() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", name))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> BoardResult<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> BoardResult<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        // write-then-rename so a crash never leaves half a snapshot
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> BoardResult<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> BoardResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> BoardResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> BoardResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Best-effort save: failures are logged and otherwise ignored
pub fn save_snapshot(store: &mut dyn KeyValueStore, snapshot: &Snapshot) -> bool {
    let result = snapshot
        .to_json()
        .and_then(|json| store.set(LAST_ROSTER_KEY, &json));
    match result {
        Ok(()) => {
            debug!("snapshot saved, {} badges", snapshot.badges.len());
            true
        }
        Err(e) => {
            warn!("could not save snapshot: {}", e);
            false
        }
    }
}

pub fn load_snapshot(store: &dyn KeyValueStore) -> BoardResult<Snapshot> {
    let text = store
        .get(LAST_ROSTER_KEY)?
        .ok_or_else(|| BoardError::InvalidSnapshot("no saved roster".to_string()))?;
    Snapshot::from_json(&text)
}

pub fn clear_snapshot(store: &mut dyn KeyValueStore) -> BoardResult<()> {
    store.remove(LAST_ROSTER_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Location;
    use crate::roster::Site;

    fn badge(id: &str, location: Location, present: bool) -> Badge {
        Badge {
            id: id.to_string(),
            eid: id.trim_start_matches("b_").to_string(),
            name: "Sam".to_string(),
            shift_code: "NB".to_string(),
            site: Site::Ydd2,
            barcode: "123".to_string(),
            handle: "sam".to_string(),
            photo: String::new(),
            location,
            present,
        }
    }

    fn snapshot() -> Snapshot {
        let badges = vec![
            badge("b_1", Location::Unassigned, false),
            badge("b_2", Location::Tile("pick".into()), true),
            badge("b_3", Location::Tile("ship".into()), false),
        ];
        Snapshot {
            badges: badges.into_iter().map(|b| (b.id.clone(), b)).collect(),
            meta: SnapshotMeta {
                date: "2024-01-01".to_string(),
                shift: ShiftKind::Night,
                site: "YDD2".to_string(),
                planned_hc: -3,
            },
        }
    }

    #[test]
    fn json_uses_the_storage_field_names() {
        let json: serde_json::Value = serde_json::from_str(&snapshot().to_json().unwrap()).unwrap();
        assert_eq!(json["meta"]["plannedHC"], -3);
        assert_eq!(json["meta"]["shift"], "night");
        assert_eq!(json["badges"]["b_2"]["loc"], "pick");
        assert_eq!(json["badges"]["b_2"]["scode"], "NB");
        assert_eq!(json["badges"]["b_2"]["present"], true);
    }

    #[test]
    fn memory_store_round_trip_keeps_location_and_presence() {
        let mut store = MemoryStore::new();
        assert!(save_snapshot(&mut store, &snapshot()));
        let loaded = load_snapshot(&store).unwrap();
        assert_eq!(loaded, snapshot());
    }

    #[test]
    fn rejects_broken_structures() {
        for text in ["", "[]", r#"{"meta":{}}"#, r#"{"badges":{},"meta":3}"#, r#"{"badges":{"x":1},"meta":{"date":"","shift":"day","plannedHC":0}}"#] {
            assert!(
                matches!(Snapshot::from_json(text), Err(BoardError::InvalidSnapshot(_))),
                "accepted {:?}",
                text
            );
        }
    }

    #[test]
    fn rejects_mismatched_badge_keys() {
        let mut snap = snapshot();
        let moved = snap.badges.remove("b_1").unwrap();
        snap.badges.insert("b_9".to_string(), moved);
        let json = snap.to_json().unwrap();
        assert!(matches!(Snapshot::from_json(&json), Err(BoardError::InvalidSnapshot(_))));
    }

    #[test]
    fn loading_without_a_snapshot_fails_and_clear_removes_it() {
        let mut store = MemoryStore::new();
        assert!(load_snapshot(&store).is_err());
        save_snapshot(&mut store, &snapshot());
        clear_snapshot(&mut store).unwrap();
        assert!(store.get(LAST_ROSTER_KEY).unwrap().is_none());
    }
}
