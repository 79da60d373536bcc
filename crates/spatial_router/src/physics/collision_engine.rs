//! Per-frame grabber intersection detection
//!
//! The host drives one cycle per frame:
//!
//! 1. [`CollisionEngine::reset`] clears the active entities (Idle/Resolved -> Accumulating)
//! 2. `add_*` calls register grabbers, grabbable handles, and hooks
//! 3. [`CollisionEngine::update_grabber_intersections`] tests every grabber
//!    against every handle and hook (Accumulating -> Resolved)
//!
//! The pass is O(grabbers x (handles + hooks)) with no broad phase. Results
//! report grabbable ids, not handles, in first-match order.

use std::collections::{HashMap, HashSet};

use super::collision::{Volume, WorldVolume};
use crate::config::CollisionConfig;
use crate::error::CollisionError;
use crate::foundation::math::Mat4;
use crate::ids::GlobalNodeId;
use crate::intersections::GrabberIntersections;

/// Where the engine is in its per-frame cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionPhase {
    /// Constructed, no pass started yet
    Idle,
    /// Accepting entities for the current frame
    Accumulating,
    /// Intersections computed; waiting for the next reset
    Resolved,
}

/// Intersection result for one grabber, ready to publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrabberResult {
    /// Grabber the result belongs to
    pub grabber_id: GlobalNodeId,
    /// Grabbables and hooks touching it this frame
    pub intersections: GrabberIntersections,
}

#[derive(Debug)]
struct ActiveGrabber {
    grabber_id: GlobalNodeId,
    is_pressed: bool,
    volume: WorldVolume,
}

#[derive(Debug)]
struct ActiveHandle {
    grabbable_id: GlobalNodeId,
    volume: WorldVolume,
}

#[derive(Debug)]
struct ActiveHook {
    hook_id: GlobalNodeId,
    volume: WorldVolume,
}

/// Grabber / handle / hook intersection engine
#[derive(Debug)]
pub struct CollisionEngine {
    config: CollisionConfig,
    phase: CollisionPhase,
    grabbers: Vec<ActiveGrabber>,
    handles: Vec<ActiveHandle>,
    hooks: Vec<ActiveHook>,
    /// Last result published per grabber; survives `reset`, pruned to the
    /// grabbers of the latest pass
    published: HashMap<GlobalNodeId, GrabberIntersections>,
}

impl CollisionEngine {
    /// Create an idle engine
    pub fn new(config: CollisionConfig) -> Self {
        Self {
            config,
            phase: CollisionPhase::Idle,
            grabbers: Vec::new(),
            handles: Vec::new(),
            hooks: Vec::new(),
            published: HashMap::new(),
        }
    }

    /// Current cycle phase
    pub const fn phase(&self) -> CollisionPhase {
        self.phase
    }

    /// Clear all active entities and start accumulating a new frame
    pub fn reset(&mut self) {
        self.grabbers.clear();
        self.handles.clear();
        self.hooks.clear();
        self.phase = CollisionPhase::Accumulating;
    }

    fn ensure_accumulating(&self) -> Result<(), CollisionError> {
        if self.phase == CollisionPhase::Accumulating {
            Ok(())
        } else {
            Err(CollisionError::NotAccumulating(self.phase))
        }
    }

    /// Add a grabber with an arbitrary volume
    pub fn add_grabber(
        &mut self,
        grabber_id: GlobalNodeId,
        universe_from_grabber: &Mat4,
        volume: &Volume,
        is_pressed: bool,
    ) -> Result<(), CollisionError> {
        self.ensure_accumulating()?;
        let volume = volume.to_world_space(universe_from_grabber)?;
        self.grabbers.push(ActiveGrabber {
            grabber_id,
            is_pressed,
            volume,
        });
        Ok(())
    }

    /// Add a spherical grabber
    pub fn add_grabber_sphere(
        &mut self,
        grabber_id: GlobalNodeId,
        universe_from_grabber: &Mat4,
        radius: f32,
        is_pressed: bool,
    ) -> Result<(), CollisionError> {
        self.add_grabber(grabber_id, universe_from_grabber, &Volume::sphere(radius), is_pressed)
    }

    /// Add one handle of a grabbable; a grabbable may add several
    pub fn add_grabbable_handle(
        &mut self,
        grabbable_id: GlobalNodeId,
        universe_from_handle: &Mat4,
        volume: &Volume,
    ) -> Result<(), CollisionError> {
        self.ensure_accumulating()?;
        let volume = volume.to_world_space(universe_from_handle)?;
        self.handles.push(ActiveHandle { grabbable_id, volume });
        Ok(())
    }

    /// Add a spherical grabbable handle
    pub fn add_grabbable_handle_sphere(
        &mut self,
        grabbable_id: GlobalNodeId,
        universe_from_handle: &Mat4,
        radius: f32,
    ) -> Result<(), CollisionError> {
        self.add_grabbable_handle(grabbable_id, universe_from_handle, &Volume::sphere(radius))
    }

    /// Add a hook with an arbitrary volume
    pub fn add_hook(&mut self, hook_id: GlobalNodeId, universe_from_hook: &Mat4, volume: &Volume) -> Result<(), CollisionError> {
        self.ensure_accumulating()?;
        let volume = volume.to_world_space(universe_from_hook)?;
        self.hooks.push(ActiveHook { hook_id, volume });
        Ok(())
    }

    /// Add a spherical hook
    pub fn add_hook_sphere(&mut self, hook_id: GlobalNodeId, universe_from_hook: &Mat4, radius: f32) -> Result<(), CollisionError> {
        self.add_hook(hook_id, universe_from_hook, &Volume::sphere(radius))
    }

    /// Number of grabbers, handles, and hooks in the current frame
    pub fn active_counts(&self) -> (usize, usize, usize) {
        (self.grabbers.len(), self.handles.len(), self.hooks.len())
    }

    /// Test every grabber against every handle and hook
    ///
    /// Returns the results that should be published this frame: a grabber's
    /// result is included when it is non-empty or differs from the last
    /// result published for that grabber, or always when
    /// [`CollisionConfig::publish_unchanged`] is set.
    pub fn update_grabber_intersections(&mut self) -> Result<Vec<GrabberResult>, CollisionError> {
        self.ensure_accumulating()?;

        let mut results = Vec::new();
        for grabber in &self.grabbers {
            let grabbables = self
                .handles
                .iter()
                .filter(|handle| {
                    let hit = grabber.volume.intersects(&handle.volume);
                    log::trace!("grabber {} vs handle of {}: {}", grabber.grabber_id, handle.grabbable_id, hit);
                    hit
                })
                .map(|handle| handle.grabbable_id);

            let hooks = self
                .hooks
                .iter()
                .filter(|hook| grabber.volume.intersects(&hook.volume))
                .map(|hook| hook.hook_id);

            let intersections = GrabberIntersections::new(grabber.is_pressed, grabbables, hooks);

            let changed = self.published.get(&grabber.grabber_id) != Some(&intersections);
            if self.config.publish_unchanged || changed || !intersections.is_empty() {
                self.published.insert(grabber.grabber_id, intersections.clone());
                results.push(GrabberResult {
                    grabber_id: grabber.grabber_id,
                    intersections,
                });
            }
        }

        log::debug!(
            "Collision pass: {} grabbers, {} handles, {} hooks, {} results",
            self.grabbers.len(),
            self.handles.len(),
            self.hooks.len(),
            results.len()
        );

        // Grabbers missing from this frame start over if they come back
        let present: HashSet<GlobalNodeId> = self.grabbers.iter().map(|g| g.grabber_id).collect();
        self.published.retain(|id, _| present.contains(id));

        self.phase = CollisionPhase::Resolved;
        Ok(results)
    }
}

impl Default for CollisionEngine {
    fn default() -> Self {
        Self::new(CollisionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Transform, Vec3};
    use crate::ids::AppId;

    fn gid(app: u32, local: u32) -> GlobalNodeId {
        GlobalNodeId::new(AppId::from_raw(app), local)
    }

    fn at(x: f32, y: f32, z: f32) -> Mat4 {
        Transform::from_position(Vec3::new(x, y, z)).to_matrix()
    }

    #[test]
    fn test_phase_cycle() {
        let mut engine = CollisionEngine::default();
        assert_eq!(engine.phase(), CollisionPhase::Idle);
        assert_eq!(
            engine.add_grabber_sphere(gid(1, 1), &at(0.0, 0.0, 0.0), 0.1, false),
            Err(CollisionError::NotAccumulating(CollisionPhase::Idle))
        );

        engine.reset();
        assert_eq!(engine.phase(), CollisionPhase::Accumulating);
        engine.update_grabber_intersections().unwrap();
        assert_eq!(engine.phase(), CollisionPhase::Resolved);
        assert!(matches!(
            engine.update_grabber_intersections(),
            Err(CollisionError::NotAccumulating(CollisionPhase::Resolved))
        ));

        engine.reset();
        assert_eq!(engine.phase(), CollisionPhase::Accumulating);
    }

    #[test]
    fn test_handles_of_one_grabbable_are_deduplicated() {
        let mut engine = CollisionEngine::default();
        engine.reset();
        engine.add_grabber_sphere(gid(1, 1), &at(0.0, 0.0, 0.0), 0.5, true).unwrap();
        engine.add_grabbable_handle_sphere(gid(2, 10), &at(0.3, 0.0, 0.0), 0.1).unwrap();
        engine.add_grabbable_handle_sphere(gid(2, 10), &at(-0.3, 0.0, 0.0), 0.1).unwrap();
        engine.add_grabbable_handle_sphere(gid(2, 12), &at(0.0, 0.3, 0.0), 0.1).unwrap();
        engine.add_grabbable_handle_sphere(gid(2, 13), &at(5.0, 0.0, 0.0), 0.1).unwrap();

        let results = engine.update_grabber_intersections().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].grabber_id, gid(1, 1));
        assert!(results[0].intersections.is_pressed);
        assert_eq!(results[0].intersections.grabbables, vec![gid(2, 10), gid(2, 12)]);
        assert!(results[0].intersections.hooks.is_empty());
    }

    #[test]
    fn test_hooks_are_reported_in_insertion_order() {
        let mut engine = CollisionEngine::default();
        engine.reset();
        engine.add_hook_sphere(gid(3, 9), &at(0.2, 0.0, 0.0), 0.1).unwrap();
        engine.add_hook(gid(3, 4), &at(0.0, 0.0, 0.5), &Volume::cuboid(Vec3::new(0.1, 0.1, 0.1))).unwrap();
        engine.add_grabber_sphere(gid(1, 1), &at(0.0, 0.0, 0.0), 0.45, false).unwrap();

        let results = engine.update_grabber_intersections().unwrap();
        assert_eq!(results[0].intersections.hooks, vec![gid(3, 9), gid(3, 4)]);
    }

    #[test]
    fn test_boundary_contact_counts() {
        let mut engine = CollisionEngine::default();
        engine.reset();
        engine.add_grabber_sphere(gid(1, 1), &at(0.0, 0.0, 0.0), 1.0, false).unwrap();
        engine.add_grabbable_handle_sphere(gid(2, 5), &at(3.0, 0.0, 0.0), 2.0).unwrap();

        let results = engine.update_grabber_intersections().unwrap();
        assert_eq!(results[0].intersections.grabbables, vec![gid(2, 5)]);
    }

    #[test]
    fn test_unchanged_empty_result_is_published_once() {
        let mut engine = CollisionEngine::default();
        for frame in 0..3 {
            engine.reset();
            engine.add_grabber_sphere(gid(1, 1), &at(0.0, 0.0, 0.0), 0.1, false).unwrap();
            let results = engine.update_grabber_intersections().unwrap();
            let expected = usize::from(frame == 0);
            assert_eq!(results.len(), expected, "frame {frame}");
        }

        // Pressing changes the result even with nothing in range
        engine.reset();
        engine.add_grabber_sphere(gid(1, 1), &at(0.0, 0.0, 0.0), 0.1, true).unwrap();
        assert_eq!(engine.update_grabber_intersections().unwrap().len(), 1);
    }

    #[test]
    fn test_non_empty_result_is_published_every_frame() {
        let mut engine = CollisionEngine::default();
        for _ in 0..2 {
            engine.reset();
            engine.add_grabber_sphere(gid(1, 1), &at(0.0, 0.0, 0.0), 0.5, false).unwrap();
            engine.add_grabbable_handle_sphere(gid(2, 10), &at(0.1, 0.0, 0.0), 0.1).unwrap();
            assert_eq!(engine.update_grabber_intersections().unwrap().len(), 1);
        }
    }

    #[test]
    fn test_publish_unchanged_config() {
        let mut engine = CollisionEngine::new(CollisionConfig { publish_unchanged: true });
        for _ in 0..2 {
            engine.reset();
            engine.add_grabber_sphere(gid(1, 1), &at(0.0, 0.0, 0.0), 0.1, false).unwrap();
            assert_eq!(engine.update_grabber_intersections().unwrap().len(), 1);
        }
    }

    #[test]
    fn test_reset_clears_active_entities() {
        let mut engine = CollisionEngine::default();
        engine.reset();
        engine.add_grabber_sphere(gid(1, 1), &at(0.0, 0.0, 0.0), 0.1, false).unwrap();
        engine.add_hook_sphere(gid(1, 2), &at(0.0, 0.0, 0.0), 0.1).unwrap();
        assert_eq!(engine.active_counts(), (1, 0, 1));

        engine.reset();
        assert_eq!(engine.active_counts(), (0, 0, 0));
    }

    #[test]
    fn test_returning_grabber_is_republished() {
        let mut engine = CollisionEngine::default();
        let mut run = |present: bool| {
            engine.reset();
            if present {
                engine.add_grabber_sphere(gid(1, 1), &at(0.0, 0.0, 0.0), 0.1, false).unwrap();
            }
            engine.update_grabber_intersections().unwrap().len()
        };

        assert_eq!(run(true), 1);
        assert_eq!(run(true), 0);
        assert_eq!(run(false), 0);
        assert_eq!(run(true), 1);
    }

    #[test]
    fn test_pruning_only_forgets_absent_grabbers() {
        let mut engine = CollisionEngine::default();
        let mut run = |grabbers: &[u32]| {
            engine.reset();
            for &local in grabbers {
                engine.add_grabber_sphere(gid(1, local), &at(0.0, 0.0, 0.0), 0.1, false).unwrap();
            }
            let mut published: Vec<u32> = engine
                .update_grabber_intersections()
                .unwrap()
                .iter()
                .map(|result| result.grabber_id.local_id())
                .collect();
            published.sort_unstable();
            published
        };

        let all: Vec<u32> = (1..=200).collect();
        assert_eq!(run(&all), all);
        assert!(run(&all).is_empty());

        // Drop grabber 7 for one pass; only it is new again on return
        let without_seven: Vec<u32> = all.iter().copied().filter(|&local| local != 7).collect();
        assert!(run(&without_seven).is_empty());
        assert_eq!(run(&all), vec![7]);
    }

    #[test]
    fn test_invalid_volume_is_rejected_without_adding() {
        let mut engine = CollisionEngine::default();
        engine.reset();
        assert!(engine.add_grabbable_handle_sphere(gid(2, 1), &at(0.0, 0.0, 0.0), -1.0).is_err());
        assert_eq!(engine.active_counts(), (0, 0, 0));
    }
}
