use std::collections::HashMap;

use self::osm::{Coordinate, OsmId, Way, WayHandle};

pub mod border;
pub mod osm;

/// Map data as defined in the .osm file, held for the lifetime of one document.
/// Ways live in an arena and relations refer to them through `WayHandle`s.
#[derive(Debug, Default)]
pub struct OsmMapData {
    nodes: HashMap<OsmId, Coordinate>,
    ways: Vec<Way>,
    way_index: HashMap<OsmId, WayHandle>,
}

impl OsmMapData {
    pub fn insert_node(&mut self, id: OsmId, coordinate: Coordinate) {
        self.nodes.insert(id, coordinate);
    }

    pub fn node(&self, id: OsmId) -> Option<&Coordinate> {
        self.nodes.get(&id)
    }

    /// Seals a way. A later way with the same id shadows the earlier one.
    pub fn insert_way(&mut self, way: Way) -> WayHandle {
        let handle = WayHandle(self.ways.len());
        self.way_index.insert(way.id, handle);
        self.ways.push(way);
        handle
    }

    pub fn way_handle(&self, id: OsmId) -> Option<WayHandle> {
        self.way_index.get(&id).copied()
    }

    pub fn way(&self, handle: WayHandle) -> &Way {
        &self.ways[handle.0]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn way_count(&self) -> usize {
        self.way_index.len()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.ways.clear();
        self.way_index.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_way_lookup_by_id() {
        let mut data = OsmMapData::default();
        let mut way = Way::new(7);
        way.add_node("1 2".into());
        let handle = data.insert_way(way);

        assert_eq!(data.way_handle(7), Some(handle));
        assert_eq!(data.way(handle).nodes, vec![Coordinate::from("1 2")]);
        assert_eq!(data.way_handle(8), None);
    }

    #[test]
    fn test_redefined_way_shadows_previous() {
        let mut data = OsmMapData::default();
        data.insert_way(Way::new(1));
        let mut second = Way::new(1);
        second.add_node("5 5".into());
        data.insert_way(second);

        let handle = data.way_handle(1).unwrap();
        assert_eq!(data.way(handle).nodes.len(), 1);
        assert_eq!(data.way_count(), 1);
    }

    #[test]
    fn test_clear_empties_registries() {
        let mut data = OsmMapData::default();
        data.insert_node(1, Coordinate::new("1", "2"));
        data.insert_way(Way::new(1));
        data.clear();

        assert_eq!(data.node_count(), 0);
        assert_eq!(data.way_count(), 0);
        assert!(data.node(1).is_none());
    }
}
