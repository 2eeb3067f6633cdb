use crate::cli::SkinArgs;
use anyhow::{ensure, Context, Result};
use sinew_core::glam::{Affine3A, Quat, Vec3};
use sinew_core::pool::{try_bucket_index, BufferFactory, HostBufferFactory, MAX_BUCKET_SIZE};
use sinew_core::skin::{BoneTransform, SkinCache, SkinCacheStats, SkinEntryId};
use sinew_core::time::FrameClock;
use sinew_metrics::FrameTimer;
use sinew_render::{RenderContext, WgpuBufferFactory};
use sinew_services::Settings;

const VERTICES_PER_MESH: u32 = 2048;
const CLOTH_VERTICES: usize = 256;

pub fn run(settings: &Settings, args: &SkinArgs) -> Result<()> {
    let stats = if args.gpu {
        let context = RenderContext::request().context("requesting GPU device")?;
        let factory = WgpuBufferFactory::new(&context);
        let stats = simulate(factory.clone(), settings, args)?;
        factory.flush();
        stats
    } else {
        simulate(HostBufferFactory::new(), settings, args)?
    };

    tracing::info!(
        entries = stats.entries,
        used_bytes = stats.used_bytes,
        budget_bytes = stats.budget_bytes,
        "skin cache"
    );
    for (name, pool) in [("bones", &stats.bone_pool), ("cloth", &stats.cloth_pool)] {
        tracing::info!(
            pool = name,
            created = pool.created,
            reused = pool.reused,
            released = pool.released,
            culled = pool.culled,
            free = pool.free,
            pending = pool.pending,
            "buffer pool"
        );
    }
    Ok(())
}

/// Animate `args.meshes` sections for `args.frames` frames. Odd sections
/// carry cloth; every third section pauses its animation on even frames
/// so its skinned output stays resident.
fn simulate<F: BufferFactory + Clone>(
    factory: F,
    settings: &Settings,
    args: &SkinArgs,
) -> Result<SkinCacheStats> {
    let bone_bytes = u64::from(args.bones) * BoneTransform::SIZE as u64;
    ensure!(
        u32::try_from(bone_bytes).ok().and_then(try_bucket_index).is_some(),
        "{} bones need {bone_bytes} bytes, more than the largest pool bucket \
         ({MAX_BUCKET_SIZE} bytes)",
        args.bones
    );

    let mut cache = SkinCache::new(factory, settings.pool, settings.skin_cache);
    let mut clock = FrameClock::new();
    let mut timer = FrameTimer::new(60);

    let mut entries = Vec::new();
    for mesh in 0..args.meshes {
        let vertices = VERTICES_PER_MESH * (mesh % 4 + 1);
        let id = cache
            .register(vertices)
            .with_context(|| format!("registering mesh {mesh} with {vertices} vertices"))?;
        entries.push(id);
    }

    let mut skinned = 0u64;
    let mut reused = 0u64;
    for _ in 0..args.frames {
        timer.begin();
        let frame = clock.advance();
        cache.tick(frame);

        for (mesh, &id) in entries.iter().enumerate() {
            let paused = mesh % 3 == 0 && frame % 2 == 0;
            if !paused {
                animate(&mut cache, id, mesh, args.bones, clock.revision())?;
            }
            let dispatch = cache.dispatch(id)?;
            match dispatch.write_slot {
                Some(_) => skinned += 1,
                None => reused += 1,
            }
        }
        timer.end();
    }

    tracing::info!(
        frames = args.frames,
        skinned,
        reused,
        frame_ms = timer.frame_time_ms(),
        "simulation finished"
    );

    let stats = cache.stats();
    for id in entries {
        cache.unregister(id)?;
    }
    Ok(stats)
}

fn animate<F: BufferFactory + Clone>(
    cache: &mut SkinCache<F>,
    id: SkinEntryId,
    mesh: usize,
    bones: u32,
    revision: u32,
) -> Result<()> {
    let time = revision as f32 / 60.0;
    let transforms: Vec<BoneTransform> = (0..bones)
        .map(|bone| {
            let angle = time + bone as f32 * 0.1;
            Affine3A::from_rotation_translation(
                Quat::from_rotation_y(angle),
                Vec3::new(0.0, bone as f32 * 0.05, 0.0),
            )
            .into()
        })
        .collect();
    cache.update_bones(id, &transforms, revision)?;

    if mesh % 2 == 1 {
        let sway = time.sin() * 0.1;
        let cloth: Vec<[f32; 4]> = (0..CLOTH_VERTICES)
            .map(|i| [sway, -(i as f32) * 0.01, 0.0, 1.0])
            .collect();
        cache.update_cloth(id, &cloth, revision)?;
    }
    Ok(())
}
