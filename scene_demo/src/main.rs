//! Scene engine demo
//!
//! Loads a handful of meshes from an in-memory archive, scatters them through
//! the octree scene and prints what a camera frustum sees before and after a
//! node moves out of view.
//!
//! Usage: `scene_demo [config.toml|config.ron]`

use scene_engine::foundation::logging;
use scene_engine::prelude::*;
use scene_engine::resources::payloads::MeshData;
use scene_engine::resources::ArchiveProvider;
use scene_engine::strategy::LodCamera;
use thiserror::Error;

const CUBE: &str = "# unit cube\n\
v -1 -1 -1\nv 1 -1 -1\nv 1 1 -1\nv -1 1 -1\n\
v -1 -1 1\nv 1 -1 1\nv 1 1 1\nv -1 1 1\n\
f 1 2 3 4\nf 5 6 7 8\nf 1 2 6 5\nf 2 3 7 6\nf 3 4 8 7\nf 4 1 5 8\n";

const PYRAMID: &str = "v -1 0 -1\nv 1 0 -1\nv 1 0 1\nv -1 0 1\nv 0 2 0\n\
f 1 2 3 4\nf 1 2 5\nf 2 3 5\nf 3 4 5\nf 4 1 5\n";

const CAPABILITIES: &str = "// demo render system\n\
render_system_capabilities \"Demo\"\n{\n    max_lights 8\n    vertex_program_version vs_5_0\n}\n";

#[derive(Debug, Error)]
enum DemoError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error("Configuration error: {0}")]
    Config(#[from] scene_engine::core::ConfigError),
}

fn load_config() -> Result<EngineConfig, DemoError> {
    match std::env::args().nth(1) {
        Some(path) => {
            let config = EngineConfig::load_from_file(&path)?;
            log::info!("Loaded configuration from {}", path);
            Ok(config)
        }
        None => Ok(EngineConfig::default()),
    }
}

fn load_assets(engine: &Engine) -> Result<Vec<ResourceHandle>, DemoError> {
    let groups = engine.resource_groups();
    groups.add_resource_location(
        DEFAULT_GROUP,
        MemoryArchive::new("demo")
            .with_file("cube.obj", CUBE)
            .with_file("pyramid.obj", PYRAMID)
            .with_file("demo.rendercaps", CAPABILITIES),
    );

    let scripts = groups.initialise_resource_group(DEFAULT_GROUP)?;
    log::info!("Parsed {} script(s)", scripts);
    if let Some(caps) = engine.capabilities().capabilities("Demo") {
        log::info!("Render system 'Demo' supports {} capabilities", caps.len());
    }

    let mut handles = Vec::new();
    for name in groups.find(DEFAULT_GROUP, "*.obj")? {
        let mesh = engine.meshes().create(&name, DEFAULT_GROUP, false, None)?;
        handles.push(mesh.handle());
    }
    groups.load_resource_group(DEFAULT_GROUP)?;

    for handle in &handles {
        if let Some(mesh) = engine.meshes().get_by_handle(*handle) {
            let triangles = mesh.with_payload(|m: &MeshData| m.triangle_count()).unwrap_or(0);
            log::info!("{} {}: {} triangles, {} bytes", handle, mesh.name(), triangles, mesh.size());
        }
    }
    log::info!("Mesh memory in use: {} bytes", engine.meshes().memory_usage());
    Ok(handles)
}

fn build_scene(engine: &mut Engine, meshes: &[ResourceHandle]) -> Result<Vec<NodeId>, DemoError> {
    let scene = engine.scene_mut();
    let root = scene.root();
    let mut nodes = Vec::new();

    for (i, mesh) in meshes.iter().cycle().take(6).enumerate() {
        let name = format!("prop_{}", i);
        let node = scene.create_node(&name);
        scene.add_child(root, node)?;

        let center = Vec3::new(i as f32 * 3.0 - 7.5, 0.0, 10.0 + i as f32 * 5.0);
        let object = MovableObject::new(name, AABB::from_center_extents(center, Vec3::new(1.0, 1.0, 1.0)))
            .with_renderable(Renderable::new(*mesh, PassId((i % 2) as u32)));
        scene.attach_object(node, object)?;
        nodes.push(node);
    }

    log::info!("Scene has {} node(s) in {} octree cell(s)", scene.graph().len(), scene.octree().cell_count());
    Ok(nodes)
}

fn report_visible(engine: &Engine, frustum: &Frustum) {
    let queue = engine.render_queue(frustum, VisibilityFlags::ALL);
    log::info!("{} renderable(s) visible", queue.len());
    for batch in queue.batches_by_pass() {
        log::info!("  pass {}: {} renderable(s)", batch.pass.0, batch.len());
    }
}

fn report_lod(engine: &Engine) {
    let Some(strategy) = engine.lod_strategies().default_strategy() else {
        return;
    };
    let camera = LodCamera {
        position: Vec3::zeros(),
        fov_y: std::f32::consts::FRAC_PI_3,
        viewport_height: 720.0,
    };
    let thresholds: Vec<f32> = [0.0, 15.0, 30.0]
        .iter()
        .map(|value| strategy.transform_user_value(*value))
        .collect();

    let scene = engine.scene();
    for &node in scene.graph().node(scene.root()).map(|root| root.children()).unwrap_or(&[]) {
        if let Some(bounds) = scene.node(node).and_then(|n| n.local_bounds()) {
            let value = strategy.value(&bounds, &camera);
            log::debug!("node {:?}: {} LOD level {}", node, strategy.name(), strategy.index(value, &thresholds));
        }
    }
}

fn run() -> Result<(), DemoError> {
    let config = load_config()?;
    logging::init_with_level(&config.logging.level);

    let mut engine = Engine::new(config)?;
    let meshes = load_assets(&engine)?;
    let nodes = build_scene(&mut engine, &meshes)?;

    // Orthographic box: x, y in [-10, 10] and z in [0, 100]
    let projection = Mat4::new(
        0.1, 0.0, 0.0, 0.0,
        0.0, 0.1, 0.0, 0.0,
        0.0, 0.0, 0.01, 0.0,
        0.0, 0.0, 0.0, 1.0,
    );
    let frustum = Frustum::from_matrix(&projection);
    report_visible(&engine, &frustum);
    report_lod(&engine);

    if let Some(&first) = nodes.first() {
        let moved = AABB::from_center_extents(Vec3::new(250.0, 0.0, 10.0), Vec3::new(1.0, 1.0, 1.0));
        engine.scene_mut().set_object_bounds(first, "prop_0", moved)?;
        log::info!("Moved prop_0 out of view");
        report_visible(&engine, &frustum);
    }

    engine.shutdown();
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        log::error!("Demo failed: {}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
