use crate::object::{ObjectFlags, ObjectId, ObjectUniverse, PropertyId, ReferenceVisitor};

/// One reflected field: a single object reference or an array of them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertySlot {
    pub property: PropertyId,
    pub targets: Vec<ObjectId>,
}

/// Object whose references all live in reflected properties.
#[derive(Clone, Debug, Default)]
pub struct ReflectedObject {
    slots: Vec<PropertySlot>,
}

impl ReflectedObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, property: PropertyId, target: ObjectId) -> Self {
        self.slots.push(PropertySlot {
            property,
            targets: vec![target],
        });
        self
    }

    pub fn with_array(mut self, property: PropertyId, targets: Vec<ObjectId>) -> Self {
        self.slots.push(PropertySlot { property, targets });
        self
    }

    pub fn slots(&self) -> &[PropertySlot] {
        &self.slots
    }
}

impl ReferenceVisitor for ReflectedObject {
    fn for_each_reference(&self, visit: &mut dyn FnMut(ObjectId, Option<PropertyId>)) {
        for slot in &self.slots {
            for &target in &slot.targets {
                visit(target, Some(slot.property));
            }
        }
    }
}

/// Object that reports references from native code, with no property.
#[derive(Clone, Debug, Default)]
pub struct NativeObject {
    referenced: Vec<ObjectId>,
}

impl NativeObject {
    pub fn new(referenced: Vec<ObjectId>) -> Self {
        Self { referenced }
    }
}

impl ReferenceVisitor for NativeObject {
    fn for_each_reference(&self, visit: &mut dyn FnMut(ObjectId, Option<PropertyId>)) {
        for &target in &self.referenced {
            visit(target, None);
        }
    }
}

struct ObjectRecord {
    class: String,
    name: String,
    outer: Option<ObjectId>,
    flags: ObjectFlags,
    body: Box<dyn ReferenceVisitor>,
}

struct PropertyRecord {
    class: String,
    owner: String,
    name: String,
}

/// In-memory object universe: named objects nested in outers, each with
/// a reference-visiting body.
#[derive(Default)]
pub struct ObjectTable {
    objects: Vec<Option<ObjectRecord>>,
    properties: Vec<PropertyRecord>,
}

impl ObjectTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a property, e.g. `("ObjectProperty", "/Script/Engine.Actor", "Owner")`.
    pub fn add_property(&mut self, class: &str, owner: &str, name: &str) -> PropertyId {
        let id = PropertyId::from_raw(self.properties.len() as u32);
        self.properties.push(PropertyRecord {
            class: class.to_owned(),
            owner: owner.to_owned(),
            name: name.to_owned(),
        });
        id
    }

    /// Create an object with no references yet.
    pub fn spawn(
        &mut self,
        class: &str,
        name: &str,
        outer: Option<ObjectId>,
        flags: ObjectFlags,
    ) -> ObjectId {
        let id = ObjectId::from_raw(self.objects.len() as u32);
        self.objects.push(Some(ObjectRecord {
            class: class.to_owned(),
            name: name.to_owned(),
            outer,
            flags,
            body: Box::new(NativeObject::default()),
        }));
        id
    }

    /// Replace the reference body of `object`. Returns false for dead ids.
    pub fn set_references(
        &mut self,
        object: ObjectId,
        body: impl ReferenceVisitor + 'static,
    ) -> bool {
        match self.record_mut(object) {
            Some(record) => {
                record.body = Box::new(body);
                true
            }
            None => false,
        }
    }

    pub fn set_flags(&mut self, object: ObjectId, flags: ObjectFlags) -> bool {
        match self.record_mut(object) {
            Some(record) => {
                record.flags = flags;
                true
            }
            None => false,
        }
    }

    /// Remove an object. References to it from other objects are left
    /// dangling, as after a forced destroy.
    pub fn destroy(&mut self, object: ObjectId) -> bool {
        self.objects
            .get_mut(object.raw() as usize)
            .and_then(Option::take)
            .is_some()
    }

    pub fn is_live(&self, object: ObjectId) -> bool {
        self.record(object).is_some()
    }

    pub fn len(&self) -> usize {
        self.objects.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dotted path from the outermost object, e.g. `/Game/Maps/Arena.Arena.PersistentLevel`.
    pub fn path_name(&self, object: ObjectId) -> String {
        let mut parts = Vec::new();
        let mut cursor = Some(object);
        while let Some(id) = cursor {
            match self.record(id) {
                Some(record) => {
                    parts.push(record.name.as_str());
                    cursor = record.outer;
                }
                None => break,
            }
        }
        parts.reverse();
        parts.join(".")
    }

    pub fn find_by_path(&self, path: &str) -> Option<ObjectId> {
        (0..self.objects.len() as u32)
            .map(ObjectId::from_raw)
            .filter(|&id| self.is_live(id))
            .find(|&id| self.path_name(id) == path)
    }

    fn record(&self, object: ObjectId) -> Option<&ObjectRecord> {
        self.objects.get(object.raw() as usize)?.as_ref()
    }

    fn record_mut(&mut self, object: ObjectId) -> Option<&mut ObjectRecord> {
        self.objects.get_mut(object.raw() as usize)?.as_mut()
    }
}

impl ObjectUniverse for ObjectTable {
    fn live_objects(&self) -> Vec<ObjectId> {
        self.objects
            .iter()
            .enumerate()
            .filter(|(_, record)| record.is_some())
            .map(|(index, _)| ObjectId::from_raw(index as u32))
            .collect()
    }

    fn flags(&self, object: ObjectId) -> ObjectFlags {
        self.record(object)
            .map(|record| record.flags)
            .unwrap_or_default()
    }

    fn for_each_reference(
        &self,
        object: ObjectId,
        visit: &mut dyn FnMut(ObjectId, Option<PropertyId>),
    ) {
        if let Some(record) = self.record(object) {
            record.body.for_each_reference(visit);
        }
    }

    fn full_name(&self, object: ObjectId) -> String {
        match self.record(object) {
            Some(record) => format!("{} {}", record.class, self.path_name(object)),
            None => "None".to_owned(),
        }
    }

    fn property_full_name(&self, property: PropertyId) -> String {
        match self.properties.get(property.raw() as usize) {
            Some(record) => format!("{} {}:{}", record.class, record.owner, record.name),
            None => "None".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_follow_the_outer_chain() {
        let mut table = ObjectTable::new();
        let package = table.spawn("Package", "/Game/Maps/Arena", None, ObjectFlags::STANDALONE);
        let world = table.spawn("World", "Arena", Some(package), ObjectFlags::empty());
        let level = table.spawn("Level", "PersistentLevel", Some(world), ObjectFlags::empty());

        assert_eq!(table.path_name(level), "/Game/Maps/Arena.Arena.PersistentLevel");
        assert_eq!(table.full_name(level), "Level /Game/Maps/Arena.Arena.PersistentLevel");
        assert_eq!(table.find_by_path("/Game/Maps/Arena.Arena"), Some(world));
    }

    #[test]
    fn reflected_and_native_bodies_report_references() {
        let mut table = ObjectTable::new();
        let owner = table.add_property("ObjectProperty", "/Script/Engine.Actor", "Owner");
        let a = table.spawn("Actor", "A", None, ObjectFlags::empty());
        let b = table.spawn("Actor", "B", None, ObjectFlags::empty());
        let c = table.spawn("Actor", "C", None, ObjectFlags::empty());
        table.set_references(a, ReflectedObject::new().with(owner, b).with_array(owner, vec![c]));
        table.set_references(b, NativeObject::new(vec![c]));

        let mut seen = Vec::new();
        table.for_each_reference(a, &mut |target, property| seen.push((target, property)));
        table.for_each_reference(b, &mut |target, property| seen.push((target, property)));
        assert_eq!(seen, vec![(b, Some(owner)), (c, Some(owner)), (c, None)]);
        assert_eq!(table.property_full_name(owner), "ObjectProperty /Script/Engine.Actor:Owner");
    }

    #[test]
    fn destroyed_objects_are_not_live() {
        let mut table = ObjectTable::new();
        let a = table.spawn("Actor", "A", None, ObjectFlags::empty());
        let b = table.spawn("Actor", "B", None, ObjectFlags::empty());
        assert!(table.destroy(a));
        assert!(!table.destroy(a));
        assert_eq!(table.live_objects(), vec![b]);
        assert_eq!(table.flags(a), ObjectFlags::empty());
        assert_eq!(table.len(), 1);
    }
}
