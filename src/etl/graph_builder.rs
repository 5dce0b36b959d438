use log::{debug, error, warn};

use crate::data::border::Border;
use crate::data::osm::{Coordinate, MemberType, OsmEvent, Relation, Way};
use crate::data::OsmMapData;
use crate::errors::Result;

/// Destination of assembled borders, one record per relation.
pub trait BorderSink {
    fn write_record(&mut self, name: &str, content: &str) -> Result<()>;
}

impl<S: BorderSink + ?Sized> BorderSink for &mut S {
    fn write_record(&mut self, name: &str, content: &str) -> Result<()> {
        (**self).write_record(name, content)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BuildSummary {
    pub relations: usize,
    pub written: usize,
    pub failed: usize,
    pub unnamed: usize,
}

/// Turns the event stream of one document into borders.
///
/// Nodes and ways are registered as they arrive; a relation is assembled and
/// handed to the sink as soon as it closes. References to unknown nodes or
/// ways are skipped without error.
pub struct GraphBuilder<S: BorderSink> {
    data: OsmMapData,
    current_way: Option<Way>,
    current_relation: Option<Relation>,
    sink: S,
    summary: BuildSummary,
}

impl<S: BorderSink> GraphBuilder<S> {
    pub fn new(sink: S) -> Self {
        GraphBuilder {
            data: OsmMapData::default(),
            current_way: None,
            current_relation: None,
            sink,
            summary: BuildSummary::default(),
        }
    }

    pub fn handle(&mut self, event: OsmEvent) {
        match event {
            OsmEvent::Node { id, coordinate } => self.data.insert_node(id, coordinate),
            OsmEvent::WayStart { id } => self.current_way = Some(Way::new(id)),
            OsmEvent::WayNodeRef { node } => {
                if let (Some(way), Some(coordinate)) = (self.current_way.as_mut(), self.data.node(node)) {
                    way.add_node(coordinate.clone());
                }
            },
            OsmEvent::WayEnd => {
                if let Some(way) = self.current_way.take() {
                    self.data.insert_way(way);
                }
            },
            OsmEvent::RelationStart => self.current_relation = Some(Relation::default()),
            OsmEvent::RelationMember { member_type: MemberType::Way, reference } => {
                if let (Some(relation), Some(handle)) = (self.current_relation.as_mut(), self.data.way_handle(reference)) {
                    relation.ways.push(handle);
                }
            },
            OsmEvent::RelationMember { .. } => (),
            OsmEvent::RelationTag { key, value } => {
                if let Some(relation) = self.current_relation.as_mut() {
                    if key == "name" {
                        relation.name = Some(value);
                    }
                }
            },
            OsmEvent::RelationEnd => {
                if let Some(relation) = self.current_relation.take() {
                    self.finish_relation(relation);
                }
            },
        }
    }

    /// Feeds a whole event stream. The first stream error aborts the run.
    pub fn run<I>(&mut self, events: I) -> Result<()>
    where
        I: IntoIterator<Item = Result<OsmEvent>>,
    {
        for event in events {
            self.handle(event?);
        }
        Ok(())
    }

    fn finish_relation(&mut self, relation: Relation) {
        let name = relation.display_name();
        let border = {
            let members: Vec<&[Coordinate]> = relation
                .ways
                .iter()
                .map(|handle| self.data.way(*handle).nodes.as_slice())
                .collect();
            Border::assemble(name, &members)
        };
        if border.is_empty() && !relation.ways.is_empty() {
            warn!(region = name, ways = relation.ways.len(); "No way of the relation could be stitched");
        }
        let content = border.content();

        self.summary.relations += 1;
        if relation.name.is_none() {
            self.summary.unnamed += 1;
            warn!(ways = relation.ways.len(); "Relation has no name");
        }

        // A failed record must not stop the following ones.
        match self.sink.write_record(name, &content) {
            Ok(()) => {
                self.summary.written += 1;
                debug!(bytes = content.len(); "Wrote {}", relation);
            },
            Err(err) => {
                self.summary.failed += 1;
                error!(region = name, err = err.message.as_str(); "Could not write border");
            },
        }
    }

    pub fn summary(&self) -> BuildSummary {
        self.summary
    }

    /// Drops the per-document registries and any half-read element.
    pub fn clear(&mut self) {
        self.current_way = None;
        self.current_relation = None;
        self.data.clear();
    }

    pub fn finish(mut self) -> (S, BuildSummary) {
        debug!(nodes = self.data.node_count(), ways = self.data.way_count(); "Releasing document registries");
        self.clear();
        (self.sink, self.summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        records: Vec<(String, String)>,
        fail_first: bool,
    }

    impl BorderSink for RecordingSink {
        fn write_record(&mut self, name: &str, content: &str) -> Result<()> {
            if self.fail_first {
                self.fail_first = false;
                return Err("disk full".into());
            }
            self.records.push((name.to_string(), content.to_string()));
            Ok(())
        }
    }

    fn node(id: i64, lat: &str, lon: &str) -> OsmEvent {
        OsmEvent::Node { id, coordinate: Coordinate::new(lat, lon) }
    }

    fn way(id: i64, nodes: &[i64]) -> Vec<OsmEvent> {
        let mut events = vec![OsmEvent::WayStart { id }];
        events.extend(nodes.iter().map(|node| OsmEvent::WayNodeRef { node: *node }));
        events.push(OsmEvent::WayEnd);
        events
    }

    fn relation(name: Option<&str>, members: &[(MemberType, i64)]) -> Vec<OsmEvent> {
        let mut events = vec![OsmEvent::RelationStart];
        events.extend(members.iter().map(|(member_type, reference)| OsmEvent::RelationMember {
            member_type: member_type.clone(),
            reference: *reference,
        }));
        if let Some(name) = name {
            events.push(OsmEvent::RelationTag { key: "name".to_string(), value: name.to_string() });
        }
        events.push(OsmEvent::RelationEnd);
        events
    }

    fn build(events: Vec<OsmEvent>, sink: RecordingSink) -> (RecordingSink, BuildSummary) {
        let mut builder = GraphBuilder::new(sink);
        builder.run(events.into_iter().map(Ok)).unwrap();
        builder.finish()
    }

    fn square() -> Vec<OsmEvent> {
        let mut events = vec![
            node(1, "0", "0"),
            node(2, "0", "1"),
            node(3, "1", "1"),
            node(4, "1", "0"),
        ];
        events.extend(way(10, &[1, 2, 3]));
        events.extend(way(11, &[1, 4, 3]));
        events
    }

    #[test]
    fn test_builds_border_from_ways() {
        let mut events = square();
        events.extend(relation(Some("Square"), &[(MemberType::Way, 10), (MemberType::Way, 11)]));

        let (sink, summary) = build(events, RecordingSink::default());
        assert_eq!(
            sink.records,
            vec![("Square".to_string(), "0 0\n0 1\n1 1\n1 1\n1 0\n0 0".to_string())]
        );
        assert_eq!(summary, BuildSummary { relations: 1, written: 1, failed: 0, unnamed: 0 });
    }

    #[test]
    fn test_unknown_references_are_skipped() {
        let mut events = vec![node(1, "0", "0"), node(2, "0", "1")];
        events.extend(way(10, &[1, 99, 2]));
        events.extend(relation(Some("Loose"), &[(MemberType::Way, 10), (MemberType::Way, 404)]));

        let (sink, _) = build(events, RecordingSink::default());
        assert_eq!(sink.records, vec![("Loose".to_string(), "0 0\n0 1".to_string())]);
    }

    #[test]
    fn test_consecutive_node_repeats_are_collapsed() {
        let mut events = vec![node(1, "0", "0"), node(2, "0", "1")];
        events.extend(way(10, &[1, 1, 2, 2, 1]));
        events.extend(relation(Some("Ring"), &[(MemberType::Way, 10)]));

        let (sink, _) = build(events, RecordingSink::default());
        assert_eq!(sink.records[0].1, "0 0\n0 1\n0 0");
    }

    #[test]
    fn test_non_way_members_are_ignored() {
        let mut events = square();
        events.extend(relation(
            Some("Square"),
            &[
                (MemberType::Node, 1),
                (MemberType::Way, 10),
                (MemberType::Relation, 10),
                (MemberType::Way, 11),
            ],
        ));

        let (sink, _) = build(events, RecordingSink::default());
        assert_eq!(sink.records[0].1, "0 0\n0 1\n1 1\n1 1\n1 0\n0 0");
    }

    #[test]
    fn test_unnamed_relation_is_written_with_empty_name() {
        let mut events = square();
        events.extend(relation(None, &[(MemberType::Way, 10)]));

        let (sink, summary) = build(events, RecordingSink::default());
        assert_eq!(sink.records[0].0, "");
        assert_eq!(summary.unnamed, 1);
    }

    #[test]
    fn test_last_name_tag_wins() {
        let mut events = square();
        events.push(OsmEvent::RelationStart);
        events.push(OsmEvent::RelationTag { key: "name".to_string(), value: "First".to_string() });
        events.push(OsmEvent::RelationTag { key: "ref".to_string(), value: "69123".to_string() });
        events.push(OsmEvent::RelationTag { key: "name".to_string(), value: "Second".to_string() });
        events.push(OsmEvent::RelationEnd);

        let (sink, _) = build(events, RecordingSink::default());
        assert_eq!(sink.records, vec![("Second".to_string(), String::new())]);
    }

    #[test]
    fn test_write_failure_does_not_stop_later_relations() {
        let mut events = square();
        events.extend(relation(Some("Lost"), &[(MemberType::Way, 10)]));
        events.extend(relation(Some("Kept"), &[(MemberType::Way, 11)]));

        let sink = RecordingSink { fail_first: true, ..Default::default() };
        let (sink, summary) = build(events, sink);
        assert_eq!(sink.records, vec![("Kept".to_string(), "0 0\n1 0\n1 1".to_string())]);
        assert_eq!(summary, BuildSummary { relations: 2, written: 1, failed: 1, unnamed: 0 });
    }

    #[test]
    fn test_stream_error_aborts_run() {
        let mut builder = GraphBuilder::new(RecordingSink::default());
        let events: Vec<Result<OsmEvent>> = vec![
            Ok(OsmEvent::RelationStart),
            Err("broken document".into()),
            Ok(OsmEvent::RelationEnd),
        ];
        assert!(builder.run(events).is_err());
        assert_eq!(builder.summary().relations, 0);
    }

    #[test]
    fn test_sink_can_be_borrowed() {
        let mut sink = RecordingSink::default();
        let mut events = square();
        events.extend(relation(Some("Square"), &[(MemberType::Way, 11)]));

        let mut builder = GraphBuilder::new(&mut sink);
        builder.run(events.into_iter().map(Ok)).unwrap();
        builder.finish();
        assert_eq!(sink.records.len(), 1);
    }
}
