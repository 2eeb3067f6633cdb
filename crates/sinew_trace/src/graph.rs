//! Reference graph snapshot.
//!
//! Built by walking references outward from every root, recording each
//! referencer -> referenced pair twice (forward and reverse) together with
//! the properties that produced it.

use crate::object::{ObjectFlags, ObjectId, ObjectUniverse, PropertyId};
use std::collections::{BTreeMap, HashMap, HashSet};

pub(crate) type NodeIndex = usize;

/// Every property seen for one edge, in discovery order. `None` marks a
/// native reference.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct EdgeRecord {
    pub properties: Vec<Option<PropertyId>>,
}

impl EdgeRecord {
    /// The most recently discovered property. Earlier ones for the same
    /// edge are not reported in routes.
    pub fn last_property(&self) -> Option<PropertyId> {
        self.properties.last().copied().flatten()
    }
}

pub(crate) struct GraphNode {
    pub object: ObjectId,
    pub flags: ObjectFlags,
    pub referenced: BTreeMap<NodeIndex, EdgeRecord>,
    pub referencers: BTreeMap<NodeIndex, EdgeRecord>,
}

pub(crate) struct ReferenceGraph {
    nodes: Vec<GraphNode>,
    index: HashMap<ObjectId, NodeIndex>,
    roots: Vec<NodeIndex>,
    keep_flags: ObjectFlags,
}

impl ReferenceGraph {
    pub fn build<U: ObjectUniverse + ?Sized>(
        universe: &U,
        include_transients: bool,
        keep_flags: ObjectFlags,
    ) -> Self {
        let mut graph = Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            roots: Vec::new(),
            keep_flags,
        };
        let excluded =
            |flags: ObjectFlags| !include_transients && flags.contains(ObjectFlags::TRANSIENT);

        let mut to_serialize = Vec::new();
        let mut pending = HashSet::new();
        for object in universe.live_objects() {
            let flags = universe.flags(object);
            if excluded(flags) {
                continue;
            }
            if graph.keeps(flags) {
                let node = graph.node_for(object, flags);
                graph.roots.push(node);
                to_serialize.push(object);
            } else {
                pending.insert(object);
            }
        }

        let mut references = Vec::new();
        let mut cursor = 0;
        while cursor < to_serialize.len() {
            let referencer = to_serialize[cursor];
            cursor += 1;

            references.clear();
            universe.for_each_reference(referencer, &mut |target, property| {
                references.push((target, property))
            });

            let from = graph.node_for(referencer, universe.flags(referencer));
            for &(target, property) in &references {
                let flags = universe.flags(target);
                if excluded(flags) {
                    continue;
                }
                let to = graph.node_for(target, flags);
                graph.add_edge(from, to, property);
                if pending.remove(&target) {
                    to_serialize.push(target);
                }
            }
        }

        tracing::debug!(
            nodes = graph.nodes.len(),
            roots = graph.roots.len(),
            serialized = to_serialize.len(),
            "built reference graph"
        );
        graph
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn node(&self, index: NodeIndex) -> &GraphNode {
        &self.nodes[index]
    }

    #[inline]
    pub fn find(&self, object: ObjectId) -> Option<NodeIndex> {
        self.index.get(&object).copied()
    }

    #[inline]
    pub fn roots(&self) -> &[NodeIndex] {
        &self.roots
    }

    /// Whether the search stops at this node.
    #[inline]
    pub fn is_root(&self, index: NodeIndex) -> bool {
        self.keeps(self.nodes[index].flags)
    }

    fn keeps(&self, flags: ObjectFlags) -> bool {
        flags.is_rooted() || flags.intersects(self.keep_flags)
    }

    fn node_for(&mut self, object: ObjectId, flags: ObjectFlags) -> NodeIndex {
        if let Some(&index) = self.index.get(&object) {
            return index;
        }
        let index = self.nodes.len();
        self.nodes.push(GraphNode {
            object,
            flags,
            referenced: BTreeMap::new(),
            referencers: BTreeMap::new(),
        });
        self.index.insert(object, index);
        index
    }

    fn add_edge(&mut self, from: NodeIndex, to: NodeIndex, property: Option<PropertyId>) {
        self.nodes[from]
            .referenced
            .entry(to)
            .or_default()
            .properties
            .push(property);
        self.nodes[to]
            .referencers
            .entry(from)
            .or_default()
            .properties
            .push(property);
    }
}
