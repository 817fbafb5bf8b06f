use globe_shared::picking;
use globe_shared::protocol::{GlobeSnapshotMsg, NodeWire};
use globe_shared::vec3::Vec3;
use globe_shared::{place, GlobeConfig, PlacedNode, PlayRecord};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Central globe state owned by the globe loop task.
pub struct GlobeState {
    config: GlobeConfig,
    records: Vec<PlayRecord>,
    nodes: Vec<PlacedNode>,
    selected: Option<String>,
    revision: u64,
    /// Present when incoming batches should be shuffled
    shuffle_rng: Option<ChaCha8Rng>,
}

impl GlobeState {
    pub fn new(config: GlobeConfig, shuffle_seed: Option<u64>) -> Self {
        Self {
            config,
            records: Vec::new(),
            nodes: Vec::new(),
            selected: None,
            revision: 0,
            shuffle_rng: shuffle_seed.map(ChaCha8Rng::seed_from_u64),
        }
    }

    pub fn config(&self) -> &GlobeConfig {
        &self.config
    }

    pub fn records(&self) -> &[PlayRecord] {
        &self.records
    }

    pub fn nodes(&self) -> &[PlacedNode] {
        &self.nodes
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Replace the whole history and re-place every node.
    pub fn replace_history(&mut self, records: Vec<PlayRecord>) {
        self.records = self.prepare_batch(records);
        self.refresh();
    }

    /// Add records after the current ones and re-place every node.
    /// Records beyond `max_nodes` are dropped. Returns false, leaving the
    /// globe and its revision untouched, when nothing fits.
    pub fn append_history(&mut self, records: Vec<PlayRecord>) -> bool {
        let room = self.config.max_nodes.saturating_sub(self.records.len());
        if records.len() > room {
            tracing::warn!(
                "Dropping {} of {} appended records, globe holds at most {}",
                records.len() - room,
                records.len(),
                self.config.max_nodes
            );
        }
        if room == 0 || records.is_empty() {
            return false;
        }

        let batch = self.prepare_batch(records);
        self.records.extend(batch);
        self.refresh();
        true
    }

    fn prepare_batch(&mut self, mut records: Vec<PlayRecord>) -> Vec<PlayRecord> {
        records.truncate(self.config.max_nodes);
        if let Some(rng) = self.shuffle_rng.as_mut() {
            records.shuffle(rng);
        }
        records
    }

    fn refresh(&mut self) {
        self.records.truncate(self.config.max_nodes);
        self.nodes = place(&self.records, &self.config);
        self.revision += 1;

        // Node ids are positional, a selection may now point elsewhere or nowhere
        if let Some(id) = &self.selected {
            if self.node(id).is_none() {
                self.selected = None;
            }
        }
    }

    pub fn node(&self, id: &str) -> Option<&PlacedNode> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    /// Select a node. Returns false (and keeps the current selection) if no
    /// node has this id.
    pub fn select(&mut self, id: &str) -> bool {
        if self.node(id).is_none() {
            return false;
        }
        self.selected = Some(id.to_string());
        true
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Hit-test a ray. A hit selects the node, a miss clears the selection.
    pub fn pick_ray(&mut self, origin: Vec3, direction: Vec3) -> Option<String> {
        self.selected = picking::pick_ray(&self.nodes, origin, direction).map(|n| n.id().to_string());
        self.selected.clone()
    }

    /// Hit-test by direction from the globe centre, for clients that only
    /// know where on the globe the user tapped. Same selection rules as
    /// `pick_ray`.
    pub fn pick_direction(&mut self, direction: Vec3, max_angle: f64) -> Option<String> {
        self.selected = picking::pick_direction(&self.nodes, direction, max_angle)
            .map(|n| n.id().to_string());
        self.selected.clone()
    }

    pub fn snapshot(&self) -> GlobeSnapshotMsg {
        GlobeSnapshotMsg {
            revision: self.revision,
            config: self.config.clone(),
            nodes: self.nodes.iter().map(NodeWire::from_node).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use globe_shared::vec3::vec3;
    use globe_shared::PlacementStrategy;

    fn record(track_id: &str) -> PlayRecord {
        PlayRecord {
            track_id: track_id.to_string(),
            track_name: format!("Track {}", track_id),
            artist_name: "Artist".to_string(),
            album_id: "album".to_string(),
            album_name: "Album".to_string(),
            cover_art_url: None,
            genre_tags: Vec::new(),
            played_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            duration_ms: 200_000,
            popularity: 50,
            uri: format!("spotify:track:{}", track_id),
            preview_url: None,
        }
    }

    fn records(n: usize) -> Vec<PlayRecord> {
        (0..n).map(|i| record(&format!("t{}", i))).collect()
    }

    fn test_state() -> GlobeState {
        GlobeState::new(GlobeConfig::default(), None)
    }

    #[test]
    fn starts_empty() {
        let state = test_state();
        assert!(state.nodes().is_empty());
        assert_eq!(state.revision(), 0);
        assert!(state.snapshot().nodes.is_empty());
    }

    #[test]
    fn replace_history_places_every_record_in_order() {
        let mut state = test_state();
        state.replace_history(records(5));
        assert_eq!(state.nodes().len(), 5);
        assert_eq!(state.revision(), 1);
        for (i, node) in state.nodes().iter().enumerate() {
            assert_eq!(node.record().track_id, format!("t{}", i));
        }
    }

    #[test]
    fn history_is_capped_at_max_nodes() {
        let config = GlobeConfig {
            max_nodes: 10,
            ..Default::default()
        };
        let mut state = GlobeState::new(config, None);
        state.replace_history(records(25));
        assert_eq!(state.nodes().len(), 10);
        assert_eq!(state.nodes()[9].record().track_id, "t9");

        assert!(!state.append_history(records(3)));
        assert_eq!(state.records().len(), 10);
        assert_eq!(state.revision(), 1);
    }

    #[test]
    fn append_keeps_what_fits() {
        let config = GlobeConfig {
            max_nodes: 4,
            ..Default::default()
        };
        let mut state = GlobeState::new(config, None);
        state.replace_history(records(3));
        assert!(state.append_history(vec![record("x"), record("y")]));
        assert_eq!(state.nodes().len(), 4);
        assert_eq!(state.nodes()[3].record().track_id, "x");
        assert_eq!(state.revision(), 2);
    }

    #[test]
    fn append_history_replaces_whole_layout() {
        let mut state = test_state();
        state.replace_history(records(2));
        let north = state.nodes()[0].position();
        state.append_history(vec![record("x")]);
        assert_eq!(state.nodes().len(), 3);
        assert_eq!(state.nodes()[2].record().track_id, "x");
        assert_eq!(state.nodes()[0].position(), north);
        assert_eq!(state.revision(), 2);
    }

    #[test]
    fn shuffle_is_seeded() {
        let mut a = GlobeState::new(GlobeConfig::default(), Some(7));
        let mut b = GlobeState::new(GlobeConfig::default(), Some(7));
        a.replace_history(records(30));
        b.replace_history(records(30));
        let ids_a: Vec<_> = a.records().iter().map(|r| r.track_id.clone()).collect();
        let ids_b: Vec<_> = b.records().iter().map(|r| r.track_id.clone()).collect();
        assert_eq!(ids_a, ids_b);

        let unshuffled: Vec<_> = records(30).into_iter().map(|r| r.track_id).collect();
        assert_ne!(ids_a, unshuffled);
        let mut sorted = ids_a.clone();
        sorted.sort();
        let mut expected = unshuffled.clone();
        expected.sort();
        assert_eq!(sorted, expected);
    }

    #[test]
    fn select_unknown_node_keeps_selection() {
        let mut state = test_state();
        state.replace_history(records(3));
        let id = state.nodes()[1].id().to_string();
        assert!(state.select(&id));
        assert!(!state.select("missing"));
        assert_eq!(state.selected(), Some(id.as_str()));
        state.clear_selection();
        assert_eq!(state.selected(), None);
    }

    #[test]
    fn selection_dropped_when_node_disappears() {
        let mut state = test_state();
        state.replace_history(records(3));
        let id = state.nodes()[2].id().to_string();
        state.select(&id);
        state.replace_history(records(2));
        assert_eq!(state.selected(), None);
    }

    #[test]
    fn pick_selects_hit_and_clears_on_miss() {
        let mut state = test_state();
        state.replace_history(records(3));
        let north = state.nodes()[0].id().to_string();

        let hit = state.pick_ray(vec3(0.0, 15.0, 0.0), vec3(0.0, -1.0, 0.0));
        assert_eq!(hit.as_deref(), Some(north.as_str()));
        assert_eq!(state.selected(), Some(north.as_str()));

        let miss = state.pick_ray(vec3(0.0, 15.0, 0.0), vec3(0.0, 1.0, 0.0));
        assert_eq!(miss, None);
        assert_eq!(state.selected(), None);
    }

    #[test]
    fn pick_direction_uses_nearest_node_within_angle() {
        let mut state = test_state();
        state.replace_history(records(3));
        let south = state.nodes()[2].id().to_string();

        let hit = state.pick_direction(vec3(0.05, -1.0, 0.0), 0.2);
        assert_eq!(hit.as_deref(), Some(south.as_str()));

        let miss = state.pick_direction(vec3(1.0, 0.0, 0.0), 0.2);
        assert_eq!(miss, None);
        assert_eq!(state.selected(), None);
    }

    #[test]
    fn snapshot_reflects_strategy_config() {
        let config = GlobeConfig {
            strategy: PlacementStrategy::Timeline,
            ..Default::default()
        };
        let mut state = GlobeState::new(config, None);
        state.replace_history(records(4));
        let snapshot = state.snapshot();
        assert_eq!(snapshot.revision, 1);
        assert_eq!(snapshot.config.strategy, PlacementStrategy::Timeline);
        assert_eq!(snapshot.nodes.len(), 4);
        assert!((snapshot.nodes[0].latitude - 70.0).abs() < 1e-9);
    }
}
