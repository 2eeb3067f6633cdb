use crate::cli::TraceArgs;
use anyhow::{bail, Result};
use sinew_metrics::{time_scope, ScopeProfiler};
use sinew_services::Settings;
use sinew_trace::{
    print_referencers, print_root_path, NativeObject, ObjectFlags, ObjectTable, ObjectUniverse,
    ReflectedObject, TraceRoute,
};

pub fn run(settings: &Settings, args: &TraceArgs) -> Result<()> {
    let objects = demo_world();
    let Some(target) = objects.find_by_path(&args.object) else {
        bail!("no live object named {}", args.object);
    };
    if objects.flags(target).is_rooted() {
        bail!("{} is in the root set", objects.full_name(target));
    }

    let mut profiler = ScopeProfiler::new();
    let trace = time_scope!(profiler, "build", {
        TraceRoute::new(
            &objects,
            settings.trace.include_transients,
            settings.trace.keep_flags(),
        )
    });
    let path = time_scope!(profiler, "search", { trace.shortest_root_path(target) });

    tracing::info!(
        nodes = trace.node_count(),
        hops = path.len(),
        build_us = profiler.timing("build").as_micros() as u64,
        search_us = profiler.timing("search").as_micros() as u64,
        "traced {}",
        objects.full_name(target)
    );

    print!("Shortest path to {}:\r\n", objects.full_name(target));
    print!("{}", print_root_path(&objects, &path, target));
    if args.referencers {
        print!("{}", print_referencers(&objects, target, &trace.referencers(target)));
    }
    Ok(())
}

/// A map that was travelled away from but is still held through a pawn
/// remembered by a subsystem of the engine.
fn demo_world() -> ObjectTable {
    let mut objects = ObjectTable::new();
    let actors = objects.add_property("ArrayProperty", "/Script/Engine.Level", "Actors");
    let owning_level =
        objects.add_property("ObjectProperty", "/Script/Engine.Actor", "OwningLevel");
    let last_target =
        objects.add_property("ObjectProperty", "/Script/Game.TargetingSubsystem", "LastTarget");
    let current_world =
        objects.add_property("ObjectProperty", "/Script/Engine.GameEngine", "CurrentWorld");
    let persistent_level =
        objects.add_property("ObjectProperty", "/Script/Engine.World", "PersistentLevel");
    let subsystems =
        objects.add_property("ArrayProperty", "/Script/Engine.GameEngine", "Subsystems");

    let engine = objects.spawn(
        "GameEngine",
        "/Engine/Transient.GameEngine_0",
        None,
        ObjectFlags::ROOT_SET | ObjectFlags::NATIVE,
    );
    let subsystem = objects.spawn(
        "TargetingSubsystem",
        "TargetingSubsystem_0",
        Some(engine),
        ObjectFlags::empty(),
    );

    let lobby_package = objects.spawn("Package", "/Game/Maps/Lobby", None, ObjectFlags::STANDALONE);
    let lobby = objects.spawn("World", "Lobby", Some(lobby_package), ObjectFlags::empty());
    let lobby_level = objects.spawn("Level", "PersistentLevel", Some(lobby), ObjectFlags::empty());

    let arena_package = objects.spawn("Package", "/Game/Maps/Arena", None, ObjectFlags::empty());
    let arena_level =
        objects.spawn("Level", "PersistentLevel", Some(arena_package), ObjectFlags::empty());
    let pawn = objects.spawn("Pawn", "Pawn_7", Some(arena_level), ObjectFlags::empty());
    let hud = objects.spawn("Canvas", "Canvas_0", None, ObjectFlags::TRANSIENT);

    objects.set_references(
        engine,
        ReflectedObject::new()
            .with(current_world, lobby)
            .with_array(subsystems, vec![subsystem]),
    );
    objects.set_references(lobby, ReflectedObject::new().with(persistent_level, lobby_level));
    objects.set_references(subsystem, ReflectedObject::new().with(last_target, pawn));
    objects.set_references(arena_level, ReflectedObject::new().with_array(actors, vec![pawn]));
    objects.set_references(pawn, ReflectedObject::new().with(owning_level, arena_level));
    objects.set_references(hud, NativeObject::new(vec![pawn]));
    objects
}
