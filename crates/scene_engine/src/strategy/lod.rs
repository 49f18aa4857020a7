//! Level-of-detail strategies
//!
//! A strategy turns an object's bounds and the camera into a single LOD
//! value, and maps that value to an index into a list of LOD thresholds.
//! Distance values grow with distance (thresholds ascending); pixel counts
//! shrink with distance (thresholds descending).

use super::{Strategy, StrategyError, StrategyRegistry};
use crate::foundation::math::Vec3;
use crate::scene::AABB;

/// Camera parameters needed to compute LOD values
#[derive(Debug, Clone, Copy)]
pub struct LodCamera {
    /// World-space position
    pub position: Vec3,
    /// Vertical field of view in radians
    pub fov_y: f32,
    /// Viewport height in pixels
    pub viewport_height: f32,
}

/// Interchangeable LOD computation
pub trait LodStrategy: Strategy + Send + Sync {
    /// LOD value of an object seen from `camera`
    fn value(&self, bounds: &AABB, camera: &LodCamera) -> f32;

    /// Value of the full-detail level
    fn base_value(&self) -> f32;

    /// Convert a user-supplied threshold into this strategy's units
    fn transform_user_value(&self, user_value: f32) -> f32 {
        user_value
    }

    /// Index of the LOD level for `value` given the level thresholds
    fn index(&self, value: f32, lod_values: &[f32]) -> usize;
}

/// Index for thresholds sorted ascending
fn index_ascending(value: f32, lod_values: &[f32]) -> usize {
    lod_values
        .iter()
        .position(|threshold| *threshold > value)
        .map_or(lod_values.len().saturating_sub(1), |i| i.saturating_sub(1))
}

/// Index for thresholds sorted descending
fn index_descending(value: f32, lod_values: &[f32]) -> usize {
    lod_values
        .iter()
        .position(|threshold| *threshold < value)
        .map_or(lod_values.len().saturating_sub(1), |i| i.saturating_sub(1))
}

/// Squared camera distance to the bounds center
#[derive(Debug, Default)]
pub struct DistanceLodStrategy;

impl DistanceLodStrategy {
    /// Registered name
    pub const NAME: &'static str = "distance";
}

impl Strategy for DistanceLodStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }
}

impl LodStrategy for DistanceLodStrategy {
    fn value(&self, bounds: &AABB, camera: &LodCamera) -> f32 {
        (bounds.center() - camera.position).norm_squared()
    }

    fn base_value(&self) -> f32 {
        0.0
    }

    fn transform_user_value(&self, user_value: f32) -> f32 {
        user_value * user_value
    }

    fn index(&self, value: f32, lod_values: &[f32]) -> usize {
        index_ascending(value, lod_values)
    }
}

/// Approximate screen area covered by the bounding sphere, in pixels
#[derive(Debug, Default)]
pub struct PixelCountLodStrategy;

impl PixelCountLodStrategy {
    /// Registered name
    pub const NAME: &'static str = "pixel_count";
}

impl Strategy for PixelCountLodStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }
}

impl LodStrategy for PixelCountLodStrategy {
    fn value(&self, bounds: &AABB, camera: &LodCamera) -> f32 {
        let radius = bounds.extents().norm();
        let distance = (bounds.center() - camera.position).norm();
        if distance <= radius {
            return self.base_value();
        }

        let half_fov_tan = (camera.fov_y * 0.5).tan();
        if half_fov_tan <= 0.0 {
            return self.base_value();
        }
        let projected_radius = radius / (distance * half_fov_tan) * camera.viewport_height * 0.5;
        std::f32::consts::PI * projected_radius * projected_radius
    }

    fn base_value(&self) -> f32 {
        f32::MAX
    }

    fn index(&self, value: f32, lod_values: &[f32]) -> usize {
        index_descending(value, lod_values)
    }
}

/// Registry of LOD strategies with a default
#[derive(Debug)]
pub struct LodStrategyManager {
    registry: StrategyRegistry<dyn LodStrategy>,
    default_strategy: String,
}

impl LodStrategyManager {
    /// Create a manager with the built-in strategies; distance is the default
    pub fn new() -> Self {
        let mut registry: StrategyRegistry<dyn LodStrategy> = StrategyRegistry::new("LOD strategy");
        registry.add_strategy(Box::new(DistanceLodStrategy));
        registry.add_strategy(Box::new(PixelCountLodStrategy));

        Self {
            registry,
            default_strategy: DistanceLodStrategy::NAME.to_string(),
        }
    }

    /// Underlying registry
    pub fn registry(&self) -> &StrategyRegistry<dyn LodStrategy> {
        &self.registry
    }

    /// Underlying registry, for adding or removing strategies
    pub fn registry_mut(&mut self) -> &mut StrategyRegistry<dyn LodStrategy> {
        &mut self.registry
    }

    /// Select the default strategy; it must be registered
    pub fn set_default_strategy(&mut self, name: &str) -> Result<(), StrategyError> {
        self.registry.require(name)?;
        self.default_strategy = name.to_string();
        Ok(())
    }

    /// Current default strategy, if it is still registered
    pub fn default_strategy(&self) -> Option<&dyn LodStrategy> {
        self.registry.get_strategy(&self.default_strategy)
    }
}

impl Default for LodStrategyManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn camera() -> LodCamera {
        LodCamera {
            position: Vec3::zeros(),
            fov_y: std::f32::consts::FRAC_PI_2,
            viewport_height: 1000.0,
        }
    }

    fn unit_box_at(z: f32) -> AABB {
        AABB::from_center_extents(Vec3::new(0.0, 0.0, z), Vec3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_distance_strategy() {
        let strategy = DistanceLodStrategy;
        assert_relative_eq!(strategy.value(&unit_box_at(10.0), &camera()), 100.0);
        assert_relative_eq!(strategy.transform_user_value(5.0), 25.0);

        let thresholds = [0.0, 100.0, 400.0];
        assert_eq!(strategy.index(50.0, &thresholds), 0);
        assert_eq!(strategy.index(150.0, &thresholds), 1);
        assert_eq!(strategy.index(1000.0, &thresholds), 2);
    }

    #[test]
    fn test_pixel_count_strategy() {
        let strategy = PixelCountLodStrategy;
        let near = strategy.value(&unit_box_at(10.0), &camera());
        let far = strategy.value(&unit_box_at(100.0), &camera());
        assert!(near > far);
        assert_relative_eq!(near / far, 100.0, max_relative = 1e-3);

        assert_eq!(strategy.value(&unit_box_at(0.5), &camera()), f32::MAX);

        let thresholds = [f32::MAX, 10_000.0, 100.0];
        assert_eq!(strategy.index(50_000.0, &thresholds), 0);
        assert_eq!(strategy.index(5_000.0, &thresholds), 1);
        assert_eq!(strategy.index(1.0, &thresholds), 2);
    }

    #[test]
    fn test_manager_defaults() {
        let mut manager = LodStrategyManager::new();
        assert_eq!(manager.default_strategy().unwrap().name(), "distance");
        assert_eq!(manager.registry().names(), vec!["distance", "pixel_count"]);

        manager.set_default_strategy("pixel_count").unwrap();
        assert_eq!(manager.default_strategy().unwrap().name(), "pixel_count");
        assert!(manager.set_default_strategy("screen_ratio").is_err());

        manager.registry_mut().remove_all_strategies();
        assert!(manager.default_strategy().is_none());
    }
}
