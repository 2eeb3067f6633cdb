use crate::graph::{NodeIndex, ReferenceGraph};
use crate::object::{ObjectFlags, ObjectId, ObjectUniverse, PropertyId};
use std::collections::{HashSet, VecDeque};

const UNREACHED: u32 = u32::MAX;

/// One object on a root path and the property through which it
/// references the next object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RouteHop {
    pub object: ObjectId,
    pub property: Option<PropertyId>,
}

/// Reference chain from a rooted object towards a target, root first.
/// The target itself is not part of the path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RootPath {
    hops: Vec<RouteHop>,
}

impl RootPath {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.hops.len()
    }

    pub fn hops(&self) -> &[RouteHop] {
        &self.hops
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RouteHop> {
        self.hops.iter()
    }

    pub fn objects(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.hops.iter().map(|hop| hop.object)
    }

    pub fn root(&self) -> Option<ObjectId> {
        self.hops.first().map(|hop| hop.object)
    }

    pub fn contains(&self, object: ObjectId) -> bool {
        self.hops.iter().any(|hop| hop.object == object)
    }

    /// Property recorded for `object`, `None` if the object is not on the path.
    pub fn property_of(&self, object: ObjectId) -> Option<Option<PropertyId>> {
        self.hops
            .iter()
            .find(|hop| hop.object == object)
            .map(|hop| hop.property)
    }
}

impl<'a> IntoIterator for &'a RootPath {
    type Item = &'a RouteHop;
    type IntoIter = std::slice::Iter<'a, RouteHop>;

    fn into_iter(self) -> Self::IntoIter {
        self.hops.iter()
    }
}

/// A direct referencer of some object and every property it used.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Referencer {
    pub object: ObjectId,
    pub properties: Vec<Option<PropertyId>>,
}

/// Reference graph snapshot for answering "who keeps this alive".
///
/// The snapshot is taken once in [`TraceRoute::new`]; objects created or
/// destroyed afterwards are not seen. Queries never modify it.
pub struct TraceRoute {
    graph: ReferenceGraph,
}

impl TraceRoute {
    /// Snapshot every object reachable from a root.
    ///
    /// Roots are objects in the root set or carrying any of `keep_flags`.
    /// Transient objects are left out unless `include_transients` is set.
    pub fn new<U: ObjectUniverse + ?Sized>(
        universe: &U,
        include_transients: bool,
        keep_flags: ObjectFlags,
    ) -> Self {
        Self {
            graph: ReferenceGraph::build(universe, include_transients, keep_flags),
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.len()
    }

    /// Shortest chain of references from any root to `target`.
    ///
    /// Empty when no root reaches `target`. When several roots are equally
    /// close, the first one in enumeration order wins.
    ///
    /// # Panics
    ///
    /// If `target` is in the root set: it is trivially alive.
    pub fn shortest_root_path(&self, target: ObjectId) -> RootPath {
        let Some(target_node) = self.graph.find(target) else {
            return RootPath::default();
        };
        assert!(
            !self.graph.node(target_node).flags.is_rooted(),
            "{target:?} is in the root set"
        );

        let depths = self.reference_depths(target_node);

        let mut lowest = UNREACHED;
        let mut closest = None;
        for &root in self.graph.roots() {
            for (&referenced, edge) in &self.graph.node(root).referenced {
                if depths[referenced] < lowest {
                    lowest = depths[referenced];
                    closest = Some((root, referenced, edge.last_property()));
                }
            }
        }
        let Some((root, mut link, property)) = closest else {
            tracing::debug!(?target, "target is not reachable from any root");
            return RootPath::default();
        };

        let mut hops = vec![RouteHop {
            object: self.graph.node(root).object,
            property,
        }];
        while depths[link] > 0 {
            let node = self.graph.node(link);
            let step = node
                .referenced
                .iter()
                .min_by_key(|(referenced, _)| depths[**referenced]);
            let Some((&next, edge)) = step else {
                break;
            };
            if depths[next] >= depths[link] {
                break;
            }
            hops.push(RouteHop {
                object: node.object,
                property: edge.last_property(),
            });
            link = next;
        }

        tracing::debug!(?target, hops = hops.len(), "found root path");
        RootPath { hops }
    }

    /// Every object in the snapshot that references `target` directly.
    pub fn referencers(&self, target: ObjectId) -> Vec<Referencer> {
        let Some(node) = self.graph.find(target) else {
            return Vec::new();
        };
        self.graph
            .node(node)
            .referencers
            .iter()
            .map(|(&index, edge)| Referencer {
                object: self.graph.node(index).object,
                properties: edge.properties.clone(),
            })
            .collect()
    }

    /// Breadth-first distance of every node from `target`, following
    /// referencer edges. Roots get a depth but are not expanded.
    fn reference_depths(&self, target: NodeIndex) -> Vec<u32> {
        let mut depths = vec![UNREACHED; self.graph.len()];
        let mut expanded = HashSet::new();
        let mut queue = VecDeque::from([target]);
        depths[target] = 0;

        while let Some(index) = queue.pop_front() {
            if index != target && self.graph.is_root(index) {
                continue;
            }
            if !expanded.insert(index) {
                continue;
            }
            let next_depth = depths[index] + 1;
            for &referencer in self.graph.node(index).referencers.keys() {
                if depths[referencer] > next_depth {
                    depths[referencer] = next_depth;
                    queue.push_back(referencer);
                }
            }
        }
        depths
    }
}

/// Build a snapshot, answer one query, and discard the snapshot.
pub fn find_shortest_root_path<U: ObjectUniverse + ?Sized>(
    universe: &U,
    target: ObjectId,
    include_transients: bool,
    keep_flags: ObjectFlags,
) -> RootPath {
    TraceRoute::new(universe, include_transients, keep_flags).shortest_root_path(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{NativeObject, ObjectTable, ReflectedObject};

    struct Chain {
        table: ObjectTable,
        root: ObjectId,
        mid: ObjectId,
        target: ObjectId,
        held: PropertyId,
    }

    fn chain() -> Chain {
        let mut table = ObjectTable::new();
        let held = table.add_property("ObjectProperty", "/Script/Core.Holder", "Held");
        let root = table.spawn("Holder", "Root", None, ObjectFlags::STANDALONE);
        let mid = table.spawn("Holder", "Mid", None, ObjectFlags::empty());
        let target = table.spawn("Holder", "Target", None, ObjectFlags::empty());
        table.set_references(root, ReflectedObject::new().with(held, mid));
        table.set_references(mid, ReflectedObject::new().with(held, target));
        Chain {
            table,
            root,
            mid,
            target,
            held,
        }
    }

    #[test]
    fn chain_reports_root_then_mid() {
        let c = chain();
        let path = find_shortest_root_path(&c.table, c.target, true, ObjectFlags::GC_KEEP);
        assert_eq!(path.objects().collect::<Vec<_>>(), vec![c.root, c.mid]);
        assert_eq!(path.property_of(c.root), Some(Some(c.held)));
        assert_eq!(path.property_of(c.mid), Some(Some(c.held)));
        assert!(!path.contains(c.target));
    }

    #[test]
    fn unrooted_target_has_empty_path() {
        let mut c = chain();
        c.table.set_flags(c.root, ObjectFlags::empty());
        let path = find_shortest_root_path(&c.table, c.target, true, ObjectFlags::GC_KEEP);
        assert!(path.is_empty());
    }

    /// Two roots one hop from the target; returns (first spawned, second spawned, target).
    fn equidistant_roots(
        table: &mut ObjectTable,
        names: [&str; 2],
    ) -> (ObjectId, ObjectId, ObjectId) {
        let held = table.add_property("ObjectProperty", "/Script/Core.Holder", "Held");
        let first = table.spawn("Holder", names[0], None, ObjectFlags::ROOT_SET);
        let second = table.spawn("Holder", names[1], None, ObjectFlags::ROOT_SET);
        let target = table.spawn("Holder", "Target", None, ObjectFlags::empty());
        table.set_references(first, ReflectedObject::new().with(held, target));
        table.set_references(second, ReflectedObject::new().with(held, target));
        (first, second, target)
    }

    #[test]
    fn first_enumerated_root_wins_a_tie() {
        let mut table = ObjectTable::new();
        let (first, _, target) = equidistant_roots(&mut table, ["Left", "Right"]);
        let path = find_shortest_root_path(&table, target, true, ObjectFlags::GC_KEEP);
        assert_eq!(path.len(), 1);
        assert_eq!(path.root(), Some(first));
        assert_eq!(table.full_name(first), "Holder Left");

        let mut swapped = ObjectTable::new();
        let (first, _, target) = equidistant_roots(&mut swapped, ["Right", "Left"]);
        let path = find_shortest_root_path(&swapped, target, true, ObjectFlags::GC_KEEP);
        assert_eq!(path.root(), Some(first));
        assert_eq!(swapped.full_name(first), "Holder Right");
    }

    #[test]
    fn shorter_route_wins() {
        let mut c = chain();
        let shortcut = c.table.add_property("ObjectProperty", "/Script/Core.Holder", "Shortcut");
        let other_root = c.table.spawn("Holder", "OtherRoot", None, ObjectFlags::ROOT_SET);
        c.table
            .set_references(other_root, ReflectedObject::new().with(shortcut, c.target));

        let path = find_shortest_root_path(&c.table, c.target, true, ObjectFlags::GC_KEEP);
        assert_eq!(path.len(), 1);
        assert_eq!(path.root(), Some(other_root));
        assert_eq!(path.property_of(other_root), Some(Some(shortcut)));
    }

    #[test]
    fn search_stops_at_intermediate_roots() {
        let mut c = chain();
        // Mid becomes a root itself: the route should start there.
        c.table.set_flags(c.mid, ObjectFlags::NATIVE);
        let path = find_shortest_root_path(&c.table, c.target, true, ObjectFlags::GC_KEEP);
        assert_eq!(path.objects().collect::<Vec<_>>(), vec![c.mid]);
    }

    #[test]
    fn native_references_have_no_property() {
        let mut c = chain();
        c.table.set_references(c.mid, NativeObject::new(vec![c.target]));
        let path = find_shortest_root_path(&c.table, c.target, true, ObjectFlags::GC_KEEP);
        assert_eq!(path.property_of(c.mid), Some(None));
    }

    #[test]
    fn cycles_do_not_hang_the_search() {
        let mut c = chain();
        let back = c.table.add_property("ObjectProperty", "/Script/Core.Holder", "Back");
        c.table.set_references(
            c.target,
            ReflectedObject::new().with(back, c.mid).with(back, c.target),
        );
        let path = find_shortest_root_path(&c.table, c.target, true, ObjectFlags::GC_KEEP);
        assert_eq!(path.objects().collect::<Vec<_>>(), vec![c.root, c.mid]);
    }

    #[test]
    fn referencers_lists_every_property() {
        let mut c = chain();
        let extra = c.table.add_property("ObjectProperty", "/Script/Core.Holder", "Extra");
        c.table.set_references(
            c.mid,
            ReflectedObject::new().with(c.held, c.target).with(extra, c.target),
        );
        let trace = TraceRoute::new(&c.table, true, ObjectFlags::GC_KEEP);
        let referencers = trace.referencers(c.target);
        assert_eq!(
            referencers,
            vec![Referencer {
                object: c.mid,
                properties: vec![Some(c.held), Some(extra)],
            }]
        );
        // Only the last property discovered for the edge makes it into the route.
        let path = trace.shortest_root_path(c.target);
        assert_eq!(path.property_of(c.mid), Some(Some(extra)));
    }

    #[test]
    #[should_panic(expected = "is in the root set")]
    fn rooted_target_is_rejected() {
        let mut c = chain();
        c.table.set_flags(c.target, ObjectFlags::ROOT_SET);
        find_shortest_root_path(&c.table, c.target, true, ObjectFlags::GC_KEEP);
    }
}
