//! Parametric History
//!
//! Manages the ordered list of features that define a CAD model,
//! supporting rollback, rebuild, and editing of historical features.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::feature::{CadBody, Feature, FeatureError, FeatureOutput, FeatureResult};
use crate::kernel::{CadKernel, Solid};
use crate::sketch::Sketch;

/// An entry in the feature history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// The feature
    pub feature: Feature,
    /// Bodies that existed before this feature
    pub prior_bodies: Vec<Uuid>,
    /// Bodies created by this feature
    pub created_bodies: Vec<Uuid>,
    /// Bodies modified by this feature
    pub modified_bodies: Vec<Uuid>,
    /// Bodies deleted by this feature
    pub deleted_bodies: Vec<Uuid>,
    /// Error of the last failed execution
    #[serde(default)]
    pub error: Option<String>,
    /// Result of the last successful execution
    #[serde(skip)]
    output: Option<FeatureOutput>,
}

impl HistoryEntry {
    /// Create a new history entry
    pub fn new(feature: Feature) -> Self {
        Self {
            feature,
            prior_bodies: Vec::new(),
            created_bodies: Vec::new(),
            modified_bodies: Vec::new(),
            deleted_bodies: Vec::new(),
            error: None,
            output: None,
        }
    }

    fn clear_results(&mut self) {
        self.prior_bodies.clear();
        self.created_bodies.clear();
        self.modified_bodies.clear();
        self.deleted_bodies.clear();
        self.error = None;
        self.output = None;
    }

    /// Execute the feature and apply its result to `bodies`
    fn run(
        &mut self,
        kernel: &dyn CadKernel,
        sketches: &HashMap<Uuid, Sketch>,
        bodies: &mut HashMap<Uuid, CadBody>,
    ) -> FeatureResult<Uuid> {
        self.clear_results();
        self.prior_bodies = sorted_ids(bodies);

        let output = self.feature.execute(kernel, sketches, &body_solids(bodies))?;
        let body_id = output.body_id;
        let (created, modified, deleted) = apply_output(bodies, &self.feature, &output);
        self.created_bodies = created;
        self.modified_bodies = modified;
        self.deleted_bodies = deleted;
        self.output = Some(output);
        Ok(body_id)
    }

    /// Execute the feature, logging and recording a failure instead of returning it
    fn run_logged(
        &mut self,
        kernel: &dyn CadKernel,
        sketches: &HashMap<Uuid, Sketch>,
        bodies: &mut HashMap<Uuid, CadBody>,
    ) {
        if let Err(e) = self.run(kernel, sketches, bodies) {
            tracing::warn!("Feature {} failed: {}", self.feature.name(), e);
            self.error = Some(e.to_string());
        }
    }
}

/// Ids of the bodies in a stable order
fn sorted_ids(bodies: &HashMap<Uuid, CadBody>) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = bodies.keys().copied().collect();
    ids.sort();
    ids
}

/// Solid handles of the bodies that have geometry
fn body_solids(bodies: &HashMap<Uuid, CadBody>) -> HashMap<Uuid, Solid> {
    bodies
        .iter()
        .filter_map(|(id, body)| body.solid.clone().map(|s| (*id, s)))
        .collect()
}

/// Apply a feature result to the bodies, returning (created, modified, deleted)
fn apply_output(
    bodies: &mut HashMap<Uuid, CadBody>,
    feature: &Feature,
    output: &FeatureOutput,
) -> (Vec<Uuid>, Vec<Uuid>, Vec<Uuid>) {
    let (mut created, mut modified, mut deleted) = (Vec::new(), Vec::new(), Vec::new());

    for id in &output.consumed {
        if bodies.remove(id).is_some() {
            deleted.push(*id);
        }
    }

    match bodies.get_mut(&output.body_id) {
        Some(body) => {
            body.set_solid(output.solid.clone());
            modified.push(output.body_id);
        }
        None => {
            let mut body = CadBody::new(feature.name());
            body.id = output.body_id;
            body.source_feature = Some(feature.id());
            body.set_solid(output.solid.clone());
            bodies.insert(output.body_id, body);
            created.push(output.body_id);
        }
    }

    (created, modified, deleted)
}

/// Manages the parametric feature history
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureHistory {
    /// Ordered list of features
    entries: Vec<HistoryEntry>,
    /// Current rollback position (None = at end)
    rollback_position: Option<usize>,
    /// All sketches in the model
    sketches: HashMap<Uuid, Sketch>,
    /// All bodies in the model
    #[serde(skip)]
    bodies: HashMap<Uuid, CadBody>,
    /// Kernel solids referenced by bodies or recorded results
    #[serde(skip)]
    held_solids: HashSet<Uuid>,
}

impl FeatureHistory {
    /// Create a new empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of features
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if history is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get a feature by index
    pub fn get(&self, index: usize) -> Option<&Feature> {
        self.entries.get(index).map(|e| &e.feature)
    }

    /// Get a mutable feature by index
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Feature> {
        self.entries.get_mut(index).map(|e| &mut e.feature)
    }

    /// Get a feature by ID
    pub fn get_by_id(&self, id: Uuid) -> Option<&Feature> {
        self.entries
            .iter()
            .find(|e| e.feature.id() == id)
            .map(|e| &e.feature)
    }

    /// Get a mutable feature by ID
    pub fn get_by_id_mut(&mut self, id: Uuid) -> Option<&mut Feature> {
        self.entries
            .iter_mut()
            .find(|e| e.feature.id() == id)
            .map(|e| &mut e.feature)
    }

    /// Get the index of a feature by ID
    pub fn index_of(&self, id: Uuid) -> Option<usize> {
        self.entries.iter().position(|e| e.feature.id() == id)
    }

    /// Drop features hidden by a rollback before appending
    fn truncate_rolled_back(&mut self) {
        if let Some(pos) = self.rollback_position.take() {
            self.entries.truncate(pos);
        }
    }

    /// Add a feature to the history without executing it
    pub fn add_feature(&mut self, feature: Feature) {
        self.truncate_rolled_back();
        self.entries.push(HistoryEntry::new(feature));
    }

    /// Execute a feature against the current bodies and record it
    ///
    /// On failure nothing is recorded and the bodies are left untouched.
    pub fn apply_feature(&mut self, feature: Feature, kernel: &dyn CadKernel) -> FeatureResult<Uuid> {
        self.truncate_rolled_back();

        let mut entry = HistoryEntry::new(feature);
        let mut bodies = self.bodies.clone();
        let body_id = entry.run(kernel, &self.sketches, &mut bodies)?;

        tracing::debug!(
            "Applied {} '{}' to body {}",
            entry.feature.type_name(),
            entry.feature.name(),
            body_id
        );
        self.bodies = bodies;
        self.entries.push(entry);
        self.release_unused(kernel);
        Ok(body_id)
    }

    /// Remove a feature from the history
    pub fn remove_feature(&mut self, id: Uuid) -> Option<Feature> {
        let index = self.index_of(id)?;
        let entry = self.entries.remove(index);
        Some(entry.feature)
    }

    /// Move a feature to a new position
    pub fn move_feature(&mut self, id: Uuid, new_index: usize) -> Result<(), FeatureError> {
        let old_index = self.index_of(id).ok_or(FeatureError::FeatureNotFound(id))?;

        if new_index >= self.entries.len() {
            return Err(FeatureError::InvalidFeature("Invalid new index".into()));
        }

        let entry = self.entries.remove(old_index);
        self.entries.insert(new_index, entry);

        Ok(())
    }

    /// Get all features
    pub fn features(&self) -> impl Iterator<Item = &Feature> {
        self.entries.iter().map(|e| &e.feature)
    }

    /// Get all history entries
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    // ============== Sketch Management ==============

    /// Add a sketch
    pub fn add_sketch(&mut self, sketch: Sketch) -> Uuid {
        let id = sketch.id;
        self.sketches.insert(id, sketch);
        id
    }

    /// Get a sketch by ID
    pub fn get_sketch(&self, id: Uuid) -> Option<&Sketch> {
        self.sketches.get(&id)
    }

    /// Get a mutable sketch by ID
    pub fn get_sketch_mut(&mut self, id: Uuid) -> Option<&mut Sketch> {
        self.sketches.get_mut(&id)
    }

    /// Remove a sketch
    pub fn remove_sketch(&mut self, id: Uuid) -> Option<Sketch> {
        self.sketches.remove(&id)
    }

    /// Get all sketches
    pub fn sketches(&self) -> &HashMap<Uuid, Sketch> {
        &self.sketches
    }

    // ============== Body Management ==============

    /// Get a body by ID
    pub fn get_body(&self, id: Uuid) -> Option<&CadBody> {
        self.bodies.get(&id)
    }

    /// Get a mutable body by ID
    pub fn get_body_mut(&mut self, id: Uuid) -> Option<&mut CadBody> {
        self.bodies.get_mut(&id)
    }

    /// Get all bodies
    pub fn bodies(&self) -> &HashMap<Uuid, CadBody> {
        &self.bodies
    }

    /// Get mutable access to all bodies
    pub fn bodies_mut(&mut self) -> &mut HashMap<Uuid, CadBody> {
        &mut self.bodies
    }

    /// Bodies in the order their creating features appear in the history
    pub fn ordered_bodies(&self) -> Vec<&CadBody> {
        self.entries
            .iter()
            .flat_map(|e| e.created_bodies.iter())
            .filter_map(|id| self.bodies.get(id))
            .collect()
    }

    // ============== Rollback ==============

    /// Roll back to a specific feature (features after it are hidden)
    pub fn rollback_to(&mut self, id: Uuid) -> Result<(), FeatureError> {
        let index = self.index_of(id).ok_or(FeatureError::FeatureNotFound(id))?;

        self.rollback_position = Some(index + 1);
        Ok(())
    }

    /// Roll back to the end (show all features)
    pub fn rollback_to_end(&mut self) {
        self.rollback_position = None;
    }

    /// Get the current rollback position
    pub fn rollback_position(&self) -> Option<usize> {
        self.rollback_position
    }

    /// Get the effective number of features (accounting for rollback)
    pub fn effective_len(&self) -> usize {
        self.rollback_position
            .unwrap_or(self.entries.len())
            .min(self.entries.len())
    }

    /// Iterate over effective features (accounting for rollback)
    pub fn effective_features(&self) -> impl Iterator<Item = &Feature> {
        let end = self.effective_len();
        self.entries[..end].iter().map(|e| &e.feature)
    }

    // ============== Rebuild ==============

    /// Rebuild all geometry from features
    ///
    /// Failed features are logged, recorded on their entry and skipped.
    pub fn rebuild(&mut self, kernel: &dyn CadKernel) -> FeatureResult<()> {
        self.bodies.clear();

        let end = self.effective_len();
        for entry in &mut self.entries[..end] {
            if entry.feature.is_suppressed() {
                entry.clear_results();
                continue;
            }
            entry.run_logged(kernel, &self.sketches, &mut self.bodies);
        }

        self.release_unused(kernel);
        Ok(())
    }

    /// Rebuild a single feature and all dependent features
    ///
    /// Bodies before the feature are restored from the recorded results of
    /// the earlier entries; only the feature and those after it are executed.
    pub fn rebuild_from(&mut self, id: Uuid, kernel: &dyn CadKernel) -> FeatureResult<()> {
        let start_index = self.index_of(id).ok_or(FeatureError::FeatureNotFound(id))?;
        let end = self.effective_len();
        if start_index >= end {
            // Hidden by the rollback
            return Ok(());
        }

        // Earlier entries without a recorded result force a full rebuild
        let replayable = self.entries[..start_index]
            .iter()
            .all(|e| e.feature.is_suppressed() || e.output.is_some() || e.error.is_some());
        if start_index == 0 || !replayable {
            return self.rebuild(kernel);
        }

        self.bodies.clear();
        for entry in &self.entries[..start_index] {
            if entry.feature.is_suppressed() {
                continue;
            }
            if let Some(output) = &entry.output {
                apply_output(&mut self.bodies, &entry.feature, output);
            }
        }

        for entry in &mut self.entries[start_index..end] {
            if entry.feature.is_suppressed() {
                entry.clear_results();
                continue;
            }
            entry.run_logged(kernel, &self.sketches, &mut self.bodies);
        }

        self.release_unused(kernel);
        Ok(())
    }

    /// Release kernel solids that no body or recorded result refers to anymore
    fn release_unused(&mut self, kernel: &dyn CadKernel) {
        let held: HashSet<Uuid> = self
            .entries
            .iter()
            .filter_map(|e| e.output.as_ref().map(|o| o.solid.id))
            .chain(
                self.bodies
                    .values()
                    .filter_map(|b| b.solid.as_ref().map(|s| s.id)),
            )
            .collect();

        let mut released = 0;
        for id in self.held_solids.difference(&held) {
            if kernel.release(&Solid::new(*id)) {
                released += 1;
            }
        }
        if released > 0 {
            tracing::debug!("Released {} unused solids", released);
        }
        self.held_solids = held;
    }
}

/// CAD data that can be stored in a project
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CadData {
    /// Feature history
    pub history: FeatureHistory,
}

impl CadData {
    /// Create new empty CAD data
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if there's any CAD data
    pub fn is_empty(&self) -> bool {
        self.history.is_empty() && self.history.sketches().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{BooleanOp, EdgeSelection, ExtrudeDirection};
    use crate::kernel::LayeredKernel;
    use crate::sketch::SketchPlane;
    use approx::assert_relative_eq;
    use glam::Vec2;

    fn square_sketch(history: &mut FeatureHistory, plane: SketchPlane, half: f32) -> Uuid {
        let mut sketch = Sketch::new("Square", plane);
        sketch
            .add_two_point_rectangle(Vec2::splat(-half), Vec2::splat(half))
            .unwrap();
        history.add_sketch(sketch)
    }

    fn boss_feature(
        history: &mut FeatureHistory,
        name: &str,
        base: f32,
        height: f32,
        body: Uuid,
    ) -> Feature {
        let sketch = square_sketch(history, SketchPlane::xy().offset(base), 1.0);
        Feature::extrude_with_boolean(
            name,
            sketch,
            height,
            ExtrudeDirection::Positive,
            BooleanOp::Join,
            Some(body),
        )
    }

    /// Block of 200, a boss of 12 on top and a second boss of 4 on that
    fn stacked_history(kernel: &LayeredKernel) -> (FeatureHistory, Uuid, [Uuid; 3]) {
        let mut history = FeatureHistory::new();
        let base = square_sketch(&mut history, SketchPlane::xy(), 5.0);
        let body = history
            .apply_feature(
                Feature::extrude("Block", base, 2.0, ExtrudeDirection::Positive),
                kernel,
            )
            .unwrap();
        let first = boss_feature(&mut history, "Boss", 2.0, 3.0, body);
        let second = boss_feature(&mut history, "Boss2", 5.0, 1.0, body);
        let ids = [body, first.id(), second.id()];
        history.apply_feature(first, kernel).unwrap();
        history.apply_feature(second, kernel).unwrap();
        (history, body, ids)
    }

    fn body_volume(history: &FeatureHistory, kernel: &dyn CadKernel, id: Uuid) -> f32 {
        let solid = history.get_body(id).unwrap().solid.clone().unwrap();
        kernel.tessellate(&solid, 0.0).unwrap().volume()
    }

    #[test]
    fn test_add_feature() {
        let mut history = FeatureHistory::new();
        let feature = Feature::extrude("Test", Uuid::new_v4(), 10.0, ExtrudeDirection::Positive);
        let id = feature.id();

        history.add_feature(feature);

        assert_eq!(history.len(), 1);
        assert!(history.get_by_id(id).is_some());
    }

    #[test]
    fn test_rollback() {
        let mut history = FeatureHistory::new();

        let f1 = Feature::extrude("F1", Uuid::new_v4(), 10.0, ExtrudeDirection::Positive);
        let f2 = Feature::extrude("F2", Uuid::new_v4(), 20.0, ExtrudeDirection::Positive);
        let f3 = Feature::extrude("F3", Uuid::new_v4(), 30.0, ExtrudeDirection::Positive);

        let f1_id = f1.id();

        history.add_feature(f1);
        history.add_feature(f2);
        history.add_feature(f3);

        assert_eq!(history.len(), 3);
        assert_eq!(history.effective_len(), 3);

        // Rollback to first feature
        history.rollback_to(f1_id).unwrap();
        assert_eq!(history.effective_len(), 1);
        assert_eq!(history.effective_features().count(), 1);

        // Roll forward
        history.rollback_to_end();
        assert_eq!(history.effective_len(), 3);
    }

    #[test]
    fn test_apply_feature_creates_body_with_feature_id() {
        let kernel = LayeredKernel::new();
        let mut history = FeatureHistory::new();
        let sketch = square_sketch(&mut history, SketchPlane::xy(), 5.0);

        let feature = Feature::extrude("Block", sketch, 2.0, ExtrudeDirection::Positive);
        let feature_id = feature.id();
        let body = history.apply_feature(feature, &kernel).unwrap();

        assert_eq!(body, feature_id);
        assert_eq!(history.entries()[0].created_bodies, vec![body]);
        assert_relative_eq!(body_volume(&history, &kernel, body), 200.0, epsilon = 1e-3);
    }

    #[test]
    fn test_failed_feature_is_not_recorded() {
        let kernel = LayeredKernel::new();
        let mut history = FeatureHistory::new();
        let sketch = square_sketch(&mut history, SketchPlane::xy(), 5.0);
        let body = history
            .apply_feature(
                Feature::extrude("Block", sketch, 2.0, ExtrudeDirection::Positive),
                &kernel,
            )
            .unwrap();
        let before = history.get_body(body).unwrap().solid.clone().unwrap().id;

        let far = square_sketch(&mut history, SketchPlane::xy().offset(50.0), 1.0);
        let cut = Feature::extrude_with_boolean(
            "Cut",
            far,
            1.0,
            ExtrudeDirection::Positive,
            BooleanOp::Cut,
            Some(body),
        );
        assert!(history.apply_feature(cut, &kernel).is_err());

        assert_eq!(history.len(), 1);
        assert_eq!(history.get_body(body).unwrap().solid.as_ref().unwrap().id, before);
        assert_eq!(kernel.solid_count(), 1);
    }

    #[test]
    fn test_rebuild_from_after_edit() {
        let kernel = LayeredKernel::new();
        let mut history = FeatureHistory::new();
        let base = square_sketch(&mut history, SketchPlane::xy(), 5.0);
        let body = history
            .apply_feature(
                Feature::extrude("Block", base, 2.0, ExtrudeDirection::Positive),
                &kernel,
            )
            .unwrap();

        let top = square_sketch(&mut history, SketchPlane::xy().offset(2.0), 1.0);
        let boss = Feature::extrude_with_boolean(
            "Boss",
            top,
            3.0,
            ExtrudeDirection::Positive,
            BooleanOp::Join,
            Some(body),
        );
        let boss_id = boss.id();
        history.apply_feature(boss, &kernel).unwrap();
        assert_relative_eq!(body_volume(&history, &kernel, body), 212.0, epsilon = 1e-3);

        if let Some(Feature::Extrude { distance, .. }) = history.get_by_id_mut(boss_id) {
            *distance = 1.0;
        }
        history.rebuild_from(boss_id, &kernel).unwrap();
        assert_relative_eq!(body_volume(&history, &kernel, body), 204.0, epsilon = 1e-3);
        assert_eq!(history.entries()[1].modified_bodies, vec![body]);
    }

    #[test]
    fn test_rebuild_records_errors() {
        let kernel = LayeredKernel::new();
        let mut history = FeatureHistory::new();
        let sketch = square_sketch(&mut history, SketchPlane::xy(), 5.0);
        let extrude = Feature::extrude("Block", sketch, 2.0, ExtrudeDirection::Positive);
        let body = extrude.id();
        history.add_feature(extrude);
        history.add_feature(Feature::fillet("Fillet", body, EdgeSelection::All, 50.0));

        history.rebuild(&kernel).unwrap();

        assert!(history.entries()[0].error.is_none());
        assert!(history.entries()[1].error.is_some());
        assert_eq!(history.bodies().len(), 1);
        assert_relative_eq!(body_volume(&history, &kernel, body), 200.0, epsilon = 1e-3);
    }

    #[test]
    fn test_boolean_feature_deletes_tool_body() {
        let kernel = LayeredKernel::new();
        let mut history = FeatureHistory::new();
        let a = square_sketch(&mut history, SketchPlane::xy(), 2.0);
        let b = square_sketch(&mut history, SketchPlane::xy().offset(1.0), 1.0);
        let target = history
            .apply_feature(Feature::extrude("A", a, 1.0, ExtrudeDirection::Positive), &kernel)
            .unwrap();
        let tool = history
            .apply_feature(Feature::extrude("B", b, 1.0, ExtrudeDirection::Positive), &kernel)
            .unwrap();
        assert_eq!(history.bodies().len(), 2);

        history
            .apply_feature(
                Feature::boolean("Join", target, tool, BooleanOp::Join),
                &kernel,
            )
            .unwrap();

        assert_eq!(history.bodies().len(), 1);
        assert_eq!(history.entries()[2].deleted_bodies, vec![tool]);
        assert_relative_eq!(body_volume(&history, &kernel, target), 20.0, epsilon = 1e-3);
    }

    #[test]
    fn test_rebuild_from_feature_hidden_by_rollback() {
        let kernel = LayeredKernel::new();
        let (mut history, body, [block, _, boss2]) = stacked_history(&kernel);
        assert_relative_eq!(body_volume(&history, &kernel, body), 216.0, epsilon = 1e-3);

        history.rollback_to(block).unwrap();
        history.rebuild_from(boss2, &kernel).unwrap();

        assert_eq!(history.effective_len(), 1);
        assert_relative_eq!(body_volume(&history, &kernel, body), 216.0, epsilon = 1e-3);
    }

    #[test]
    fn test_rebuild_follows_rollback() {
        let kernel = LayeredKernel::new();
        let (mut history, body, [block, boss, boss2]) = stacked_history(&kernel);

        history.rollback_to(block).unwrap();
        history.rebuild(&kernel).unwrap();
        assert_eq!(history.effective_features().count(), 1);
        assert_eq!(history.bodies().len(), 1);
        assert_relative_eq!(body_volume(&history, &kernel, body), 200.0, epsilon = 1e-3);

        history.rollback_to(boss).unwrap();
        history.rebuild_from(boss, &kernel).unwrap();
        assert_eq!(history.effective_features().count(), 2);
        assert_relative_eq!(body_volume(&history, &kernel, body), 212.0, epsilon = 1e-3);

        history.rollback_to_end();
        history.rebuild_from(boss2, &kernel).unwrap();
        assert_eq!(history.effective_features().count(), 3);
        assert_relative_eq!(body_volume(&history, &kernel, body), 216.0, epsilon = 1e-3);

        // One solid per recorded result, the last one shared with the body
        assert_eq!(kernel.solid_count(), 3);
    }

    #[test]
    fn test_rebuild_does_not_grow_kernel_storage() {
        let kernel = LayeredKernel::new();
        let (mut history, body, _) = stacked_history(&kernel);
        assert_eq!(kernel.solid_count(), 3);

        for _ in 0..3 {
            history.rebuild(&kernel).unwrap();
            assert_eq!(kernel.solid_count(), 3);
        }
        assert_relative_eq!(body_volume(&history, &kernel, body), 216.0, epsilon = 1e-3);
    }

    #[test]
    fn test_rebuild_after_move_feature() {
        let kernel = LayeredKernel::new();
        let mut history = FeatureHistory::new();
        let a = square_sketch(&mut history, SketchPlane::xy(), 2.0);
        let b = square_sketch(&mut history, SketchPlane::xy().offset(10.0), 1.0);
        history
            .apply_feature(Feature::extrude("A", a, 1.0, ExtrudeDirection::Positive), &kernel)
            .unwrap();
        let b_id = history
            .apply_feature(Feature::extrude("B", b, 1.0, ExtrudeDirection::Positive), &kernel)
            .unwrap();

        history.move_feature(b_id, 0).unwrap();
        history.rebuild(&kernel).unwrap();
        history.rebuild(&kernel).unwrap();

        let names: Vec<&str> = history.ordered_bodies().iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
        assert_eq!(kernel.solid_count(), history.bodies().len());
    }

    #[test]
    fn test_moved_join_before_its_target_fails_on_rebuild() {
        let kernel = LayeredKernel::new();
        let (mut history, body, [_, _, boss2]) = stacked_history(&kernel);

        history.move_feature(boss2, 0).unwrap();
        history.rebuild(&kernel).unwrap();

        assert!(history.entries()[0].error.is_some());
        assert_eq!(history.bodies().len(), 1);
        assert_relative_eq!(body_volume(&history, &kernel, body), 212.0, epsilon = 1e-3);
    }
}
