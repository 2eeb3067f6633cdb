use bitflags::bitflags;

/// Handle to a live object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u32);

impl ObjectId {
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Handle to a reflected property that can hold object references.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyId(u32);

impl PropertyId {
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ObjectFlags: u32 {
        /// Explicitly added to the root set.
        const ROOT_SET = 1 << 0;
        /// Defined by native code; never collected.
        const NATIVE = 1 << 1;
        /// Kept alive even when unreferenced (assets, packages).
        const STANDALONE = 1 << 2;
        /// Not saved, and skipped by reference tracing unless asked for.
        const TRANSIENT = 1 << 3;

        /// Flags that keep an object alive through garbage collection.
        const GC_KEEP = Self::NATIVE.bits() | Self::STANDALONE.bits();
    }
}

impl ObjectFlags {
    #[inline]
    pub fn is_rooted(self) -> bool {
        self.contains(Self::ROOT_SET)
    }
}

/// Per-object reference enumeration.
///
/// `visit` is called once per stored reference with the property that
/// holds it, or `None` for references reported by native code.
pub trait ReferenceVisitor {
    fn for_each_reference(&self, visit: &mut dyn FnMut(ObjectId, Option<PropertyId>));
}

/// The set of live objects a trace runs over.
pub trait ObjectUniverse {
    /// Every live object, in a stable order.
    fn live_objects(&self) -> Vec<ObjectId>;

    /// Flags of `object`; empty for ids the universe does not know.
    fn flags(&self, object: ObjectId) -> ObjectFlags;

    fn for_each_reference(
        &self,
        object: ObjectId,
        visit: &mut dyn FnMut(ObjectId, Option<PropertyId>),
    );

    /// `"<Class> <Path>"`.
    fn full_name(&self, object: ObjectId) -> String;

    /// `"<PropertyClass> <Owner>:<Name>"`.
    fn property_full_name(&self, property: PropertyId) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gc_keep_covers_native_and_standalone() {
        assert!(ObjectFlags::GC_KEEP.contains(ObjectFlags::NATIVE));
        assert!(ObjectFlags::GC_KEEP.contains(ObjectFlags::STANDALONE));
        assert!(!ObjectFlags::GC_KEEP.intersects(ObjectFlags::ROOT_SET | ObjectFlags::TRANSIENT));
        assert!((ObjectFlags::ROOT_SET | ObjectFlags::NATIVE).is_rooted());
        assert!(!ObjectFlags::NATIVE.is_rooted());
    }
}
