//! Headless playback demo
//!
//! Loads a small walking model through the [`SceneManager`], instantiates it
//! twice, and drives the `walk` group of one instance for a few seconds while
//! logging text keys and root motion.
//!
//! Run with `RUST_LOG=debug cargo run -p playback_demo` for loader output.

use std::sync::Arc;

use ember::prelude::*;
use glam::Vec3;

const WALKER: &str = r#"{
    "nodes": [
        { "name": "Root", "children": [1] },
        { "name": "Bip01", "translation": [0, 0, 1], "children": [2],
          "mesh": { "positions": [[0,0,0],[1,0,0],[0,1,0]], "indices": [0,1,2],
                    "texture": "textures/walker.dds" } },
        { "name": "Head", "translation": [0, 0, 0.8] }
    ],
    "text_keys": [
        [0.0, "walk: start"],
        [0.25, "walk: loop start"],
        [0.5, "sound: left foot"],
        [1.0, "sound: right foot"],
        [1.25, "walk: loop stop"],
        [1.5, "walk: stop"]
    ],
    "controllers": [
        { "target": "Bip01", "path": "translation",
          "times": [0.0, 1.5], "values": [[0, 0, 1], [0, 3, 1]] },
        { "target": "Head", "path": "rotation", "interpolation": "linear",
          "times": [0.0, 0.75, 1.5],
          "values": [[0, 0, 0, 1], [0, 0, 0.2588, 0.9659], [0, 0, 0, 1]] }
    ]
}"#;

const SETTINGS: &str = r#"{ "accum_root": "Bip01", "accumulate": [1.0, 1.0, 0.0] }"#;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let vfs = MemoryVfs::new();
    vfs.insert("meshes/walker.json", WALKER);
    let manager = SceneManager::new(Arc::new(vfs));

    let mut scene = Scene::new();
    let walker = manager.create_instance("meshes/walker.json", &mut scene)?;
    let bystander = manager.create_instance("Meshes\\Walker.json", &mut scene)?;
    log::info!(
        "Spawned two instances ({} nodes), {} template(s) cached",
        scene.node_count(),
        manager.cached_template_count()
    );

    let mut anim = Animation::new(AnimationSettings::from_json_str(SETTINGS)?);
    anim.set_object_root(&scene, walker);
    anim.add_anim_source(&manager, "meshes/walker.json")?;

    let moves = anim.play(&scene, "walk", "start", "stop", 0.0, 2)?;
    log::info!("walk started, root motion: {moves}, velocity: {:.2}", anim.velocity());

    let mut on_key = |group: &str, key: &str| {
        log::info!("[{group}] {key}");
        true
    };

    let mut position = Vec3::ZERO;
    let dt = 0.1;
    let mut elapsed = 0.0;
    while anim.is_playing("walk") && elapsed < 10.0 {
        position += anim.advance(&mut scene, dt, &mut on_key);
        elapsed += dt;
    }
    scene.update_world_transforms();

    if let Some(info) = anim.get_info("walk") {
        log::info!(
            "walk finished after {elapsed:.1}s at {:.2} ({:.0}% complete, {} loops left)",
            info.time,
            info.complete * 100.0,
            info.loop_count
        );
    }
    log::info!("Accumulated displacement: {position}");

    anim.disable("walk");
    if let Some(head) = scene.find_node_by_name(bystander, "Head") {
        let rotation = scene.get_node(head).map(|n| n.transform.rotation);
        log::info!("Bystander head rotation untouched: {rotation:?}");
    }

    Ok(())
}
