//! Engine assembly
//!
//! Builds every subsystem from an [`EngineConfig`] and wires them together
//! explicitly. Nothing here is process-global: two engines in one process
//! are fully independent.

use crate::core::{ConfigError, EngineConfig};
use crate::resources::payloads::{MeshData, MeshFactory, ProgramFactory, ProgramSource};
use crate::resources::{CapabilityScriptLoader, ResourceError, ResourceGroupManager, ResourceManager};
use crate::scene::{RenderQueue, VisibilityFlags, VisibilityVolume};
use crate::spatial::{OctreeSceneManager, SceneError};
use crate::strategy::{LodStrategyManager, StrategyError, ZoneFactoryManager};
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by the engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Resource subsystem failure
    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    /// Scene or partitioning failure
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// Strategy lookup failure
    #[error("Strategy error: {0}")]
    Strategy(#[from] StrategyError),
}

/// Top-level owner of the engine subsystems
pub struct Engine {
    config: EngineConfig,
    groups: Arc<ResourceGroupManager>,
    meshes: Arc<ResourceManager>,
    programs: Arc<ResourceManager>,
    capabilities: Arc<CapabilityScriptLoader>,
    lod_strategies: LodStrategyManager,
    zone_factories: ZoneFactoryManager,
    scene: OctreeSceneManager,
    running: bool,
}

impl Engine {
    /// Validate the configuration and build all subsystems
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        log::info!("Initializing engine...");
        config.validate()?;

        let groups = Arc::new(ResourceGroupManager::new());
        let meshes = Arc::new(Self::resource_manager(
            &groups,
            ResourceManager::new(MeshData::RESOURCE_TYPE, Box::new(MeshFactory), &config.resources),
        ));
        let programs = Arc::new(Self::resource_manager(
            &groups,
            ResourceManager::new(ProgramSource::RESOURCE_TYPE, Box::new(ProgramFactory), &config.resources),
        ));
        groups.register_resource_manager(&meshes);
        groups.register_resource_manager(&programs);

        let capabilities = Arc::new(CapabilityScriptLoader::new());
        groups.register_script_loader(capabilities.clone());

        let scene = OctreeSceneManager::new(&config.partition);

        log::info!("Engine initialized");
        Ok(Self {
            config,
            groups,
            meshes,
            programs,
            capabilities,
            lod_strategies: LodStrategyManager::new(),
            zone_factories: ZoneFactoryManager::new(),
            scene,
            running: true,
        })
    }

    fn resource_manager(groups: &Arc<ResourceGroupManager>, manager: ResourceManager) -> ResourceManager {
        manager.with_listener(groups.clone()).with_provider(groups.clone())
    }

    /// Configuration the engine was built from
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resource group manager
    pub fn resource_groups(&self) -> &Arc<ResourceGroupManager> {
        &self.groups
    }

    /// Mesh manager
    pub fn meshes(&self) -> &Arc<ResourceManager> {
        &self.meshes
    }

    /// GPU program manager
    pub fn programs(&self) -> &Arc<ResourceManager> {
        &self.programs
    }

    /// Render system capabilities parsed from `*.rendercaps` scripts
    pub fn capabilities(&self) -> &CapabilityScriptLoader {
        &self.capabilities
    }

    /// LOD strategies
    pub fn lod_strategies(&self) -> &LodStrategyManager {
        &self.lod_strategies
    }

    /// Mutable access to the LOD strategies
    pub fn lod_strategies_mut(&mut self) -> &mut LodStrategyManager {
        &mut self.lod_strategies
    }

    /// Zone factories
    pub fn zone_factories(&self) -> &ZoneFactoryManager {
        &self.zone_factories
    }

    /// Mutable access to the zone factories
    pub fn zone_factories_mut(&mut self) -> &mut ZoneFactoryManager {
        &mut self.zone_factories
    }

    /// Scene manager
    pub fn scene(&self) -> &OctreeSceneManager {
        &self.scene
    }

    /// Mutable access to the scene manager
    pub fn scene_mut(&mut self) -> &mut OctreeSceneManager {
        &mut self.scene
    }

    /// Whether [`shutdown`](Self::shutdown) has not run yet
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Collect the renderables visible through `volume` into a fresh queue
    pub fn render_queue(&self, volume: &dyn VisibilityVolume, mask: VisibilityFlags) -> RenderQueue {
        let mut queue = RenderQueue::new();
        let objects = self.scene.find_visible_objects(volume, mask, &mut queue);
        log::trace!("{} visible object(s), {} queue entries", objects, queue.len());
        queue
    }

    /// Tear everything down in reverse order of construction
    ///
    /// Safe to call more than once.
    pub fn shutdown(&mut self) {
        if !self.running {
            return;
        }
        log::info!("Shutting down engine...");

        self.scene.clear_scene();
        self.zone_factories.registry_mut().remove_all_strategies();
        self.lod_strategies.registry_mut().remove_all_strategies();

        for manager in [&self.programs, &self.meshes] {
            manager.remove_all();
            self.groups.unregister_resource_manager(manager.resource_type());
        }

        self.running = false;
        log::info!("Engine shutdown complete");
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("groups", &self.groups)
            .field("meshes", &self.meshes)
            .field("programs", &self.programs)
            .field("running", &self.running)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PartitionConfig;

    #[test]
    fn test_engine_wires_managers() {
        let engine = Engine::new(EngineConfig::default()).unwrap();

        let mesh_manager = engine.resource_groups().resource_manager("Mesh").unwrap();
        assert!(Arc::ptr_eq(&mesh_manager, engine.meshes()));
        assert!(engine.resource_groups().resource_manager("GpuProgram").is_ok());
        assert!(engine.lod_strategies().default_strategy().is_some());
        assert!(engine.zone_factories().create_zone("default", "world").is_ok());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = EngineConfig::default().with_partition(PartitionConfig::default().with_max_depth(64));
        assert!(matches!(Engine::new(config), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_shutdown_tears_down_everything() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        engine.programs().create("p", "General", true, None).unwrap();
        let node = engine.scene_mut().create_node("n");
        let root = engine.scene().root();
        engine.scene_mut().add_child(root, node).unwrap();

        engine.shutdown();
        engine.shutdown();

        assert!(!engine.is_running());
        assert_eq!(engine.programs().resource_count(), 0);
        assert!(engine.lod_strategies().registry().is_empty());
        assert!(engine.zone_factories().registry().is_empty());
        assert!(engine.scene().graph().is_empty());
        assert!(engine.resource_groups().resource_manager("Mesh").is_err());
    }
}
