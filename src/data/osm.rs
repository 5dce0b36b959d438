use std::fmt;

pub type OsmId = i64;

/// One point, kept as the exact `"<lat> <lon>"` text of the source document.
/// Two coordinates are the same point only if their text is identical.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Coordinate(String);

impl Coordinate {
    pub fn new(lat: &str, lon: &str) -> Self {
        Coordinate(format!("{} {}", lat, lon))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Coordinate {
    fn from(value: &str) -> Self {
        Coordinate(value.to_string())
    }
}

impl From<String> for Coordinate {
    fn from(value: String) -> Self {
        Coordinate(value)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub type Polyline = Vec<Coordinate>;

/// Index of a sealed way inside the per-document arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WayHandle(pub(crate) usize);

#[derive(Debug, Clone, Default)]
pub struct Way {
    pub id: OsmId,
    pub nodes: Polyline,
}

impl Way {
    pub fn new(id: OsmId) -> Self {
        Way {
            id,
            nodes: Vec::new(),
        }
    }

    /// Appends a point unless it repeats the previous one.
    pub fn add_node(&mut self, coordinate: Coordinate) {
        if self.nodes.last() == Some(&coordinate) {
            return;
        }
        self.nodes.push(coordinate);
    }
}

#[derive(Debug, Clone, Default)]
pub struct Relation {
    pub name: Option<String>,
    pub ways: Vec<WayHandle>,
}

impl Relation {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}} {} way(s)", self.display_name(), self.ways.len())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberType {
    Way,
    Node,
    Relation,
    Other(String),
}

impl From<&str> for MemberType {
    fn from(value: &str) -> Self {
        match value {
            "way" => MemberType::Way,
            "node" => MemberType::Node,
            "relation" => MemberType::Relation,
            other => MemberType::Other(other.to_string()),
        }
    }
}

/// Elements of an OSM document, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OsmEvent {
    Node { id: OsmId, coordinate: Coordinate },
    WayStart { id: OsmId },
    WayNodeRef { node: OsmId },
    WayEnd,
    RelationStart,
    RelationMember { member_type: MemberType, reference: OsmId },
    RelationTag { key: String, value: String },
    RelationEnd,
}
