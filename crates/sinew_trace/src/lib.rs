//! Sinew Trace
//!
//! Leak diagnostics for object graphs: answers "why is this object still
//! alive" with the shortest chain of references from a rooted object.
//!
//! ```ignore
//! use sinew_trace::{find_shortest_root_path, print_root_path, ObjectFlags};
//!
//! let path = find_shortest_root_path(&objects, level, true, ObjectFlags::GC_KEEP);
//! let report = print_root_path(&objects, &path, level);
//! tracing::warn!("{} was not collected\r\n{report}", objects.full_name(level));
//! ```

mod graph;
mod object;
mod report;
mod route;
mod table;

pub use object::{ObjectFlags, ObjectId, ObjectUniverse, PropertyId, ReferenceVisitor};
pub use report::{parse_root_path, print_referencers, print_root_path, ParsedHop, NOT_ROOTED};
pub use route::{find_shortest_root_path, Referencer, RootPath, RouteHop, TraceRoute};
pub use table::{NativeObject, ObjectTable, PropertySlot, ReflectedObject};
