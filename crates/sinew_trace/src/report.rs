//! Text rendering of trace results.
//!
//! The root path format is consumed by log scrapers; keep it byte-exact,
//! including the CRLF line endings.

use crate::object::{ObjectFlags, ObjectId, ObjectUniverse};
use crate::route::{Referencer, RootPath};
use std::fmt::Write;

const INDENT: &str = "   ";
const NOT_ROOTED_MESSAGE: &str = "(Object is not currently rooted)";

/// Report for an empty [`RootPath`].
pub const NOT_ROOTED: &str = "   (Object is not currently rooted)\r\n";

fn reachability(flags: ObjectFlags, is_target: bool) -> String {
    let mut out = String::new();
    if is_target {
        out.push_str(" [target]");
    }
    if flags.is_rooted() {
        out.push_str(" (root)");
    }
    if flags.contains(ObjectFlags::NATIVE) {
        out.push_str(" (native)");
    }
    if flags.contains(ObjectFlags::STANDALONE) {
        out.push_str(" (standalone)");
    }
    out
}

/// One line per hop: full name, reachability annotations, and the
/// property that leads to the next hop.
pub fn print_root_path<U: ObjectUniverse + ?Sized>(
    universe: &U,
    path: &RootPath,
    target: ObjectId,
) -> String {
    if path.is_empty() {
        return NOT_ROOTED.to_owned();
    }

    let mut out = String::new();
    for hop in path {
        let mut source = reachability(universe.flags(hop.object), hop.object == target);
        if source.is_empty() {
            source.push(' ');
        }
        if let Some(property) = hop.property {
            let _ = write!(source, " ({})", universe.property_full_name(property));
        }
        let _ = write!(out, "{INDENT}{}{source}\r\n", universe.full_name(hop.object));
    }
    out
}

/// A hop recovered from [`print_root_path`] output.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedHop {
    pub full_name: String,
    pub target: bool,
    pub root: bool,
    pub native: bool,
    pub standalone: bool,
    pub property: Option<String>,
}

/// Parse a root path report. Lines that are not hop lines (log prefixes,
/// headers, the not-rooted marker) are skipped. Object full names are
/// expected to be `"<Class> <Path>"` with no further spaces.
pub fn parse_root_path(text: &str) -> Vec<ParsedHop> {
    text.lines().filter_map(parse_hop_line).collect()
}

fn parse_hop_line(line: &str) -> Option<ParsedHop> {
    let body = line.strip_prefix(INDENT)?;
    if body.is_empty() || body.starts_with(' ') || body == NOT_ROOTED_MESSAGE {
        return None;
    }

    let (class, rest) = body.split_once(' ')?;
    let (path, mut rest) = rest.split_once(' ').unwrap_or((rest, ""));
    let mut hop = ParsedHop {
        full_name: format!("{class} {path}"),
        ..ParsedHop::default()
    };

    loop {
        rest = rest.trim_start();
        if let Some(r) = rest.strip_prefix("[target]") {
            hop.target = true;
            rest = r;
        } else if let Some(r) = rest.strip_prefix("(root)") {
            hop.root = true;
            rest = r;
        } else if let Some(r) = rest.strip_prefix("(native)") {
            hop.native = true;
            rest = r;
        } else if let Some(r) = rest.strip_prefix("(standalone)") {
            hop.standalone = true;
            rest = r;
        } else {
            break;
        }
    }

    hop.property = rest
        .strip_prefix('(')
        .and_then(|r| r.strip_suffix(')'))
        .map(str::to_owned);
    Some(hop)
}

/// Direct referencers of `target`, one block per referencer listing each
/// property that holds the reference.
pub fn print_referencers<U: ObjectUniverse + ?Sized>(
    universe: &U,
    target: ObjectId,
    referencers: &[Referencer],
) -> String {
    let target_name = universe.full_name(target);
    if referencers.is_empty() {
        return format!("{target_name} is not referenced\r\n");
    }

    let mut out = format!("Referencers of {target_name}:\r\n");
    for referencer in referencers {
        let _ = write!(
            out,
            "{INDENT}{}{} ({})\r\n",
            universe.full_name(referencer.object),
            reachability(universe.flags(referencer.object), false),
            referencer.properties.len()
        );
        for (i, property) in referencer.properties.iter().enumerate() {
            match property {
                Some(property) => {
                    let _ = write!(
                        out,
                        "      {i}) {}\r\n",
                        universe.property_full_name(*property)
                    );
                }
                None => {
                    let _ = write!(out, "      {i}) [[native reference]]\r\n");
                }
            }
        }
    }
    out
}
