//! Ordered detector list and the first-match resolution policy.

use std::fmt;

use tracing::debug;

use super::heuristics::{NutDetector, PipeDetector, PlateDetector, ScrewDetector, WheelDetector};
use super::{DetectionResult, ShapeDetector};
use crate::config::{ClassifierConfig, DetectorKind};
use crate::mesh::TriMesh;
use crate::scene::SceneNode;

/// Minimum confidence for a detector result to be accepted.
pub const CONF_THRESHOLD: f64 = 0.6;

/// Detectors evaluated strictly in insertion order.
///
/// The first result at or above the threshold wins and evaluation stops
/// there; a later detector is never consulted even if it would report a
/// higher confidence. Reordering the list changes the outcome for any mesh
/// that several rules match.
pub struct DetectorRegistry {
    detectors: Vec<Box<dyn ShapeDetector>>,
    threshold: f64,
}

impl DetectorRegistry {
    /// An empty registry with the given acceptance threshold.
    pub fn empty(threshold: f64) -> Self {
        Self {
            detectors: Vec::new(),
            threshold,
        }
    }

    /// Screw, Plate, Pipe, Nut, Wheel at [`CONF_THRESHOLD`].
    pub fn new() -> Self {
        Self::from_config(&ClassifierConfig::default())
    }

    /// Build the detectors named in `config.order`, each with its section
    /// of the config.
    pub fn from_config(config: &ClassifierConfig) -> Self {
        let mut registry = Self::empty(config.acceptance_threshold);
        for kind in &config.order {
            let detector: Box<dyn ShapeDetector> = match kind {
                DetectorKind::Screw => Box::new(ScrewDetector::with_config(config.screw.clone())),
                DetectorKind::Plate => Box::new(PlateDetector::with_config(config.plate.clone())),
                DetectorKind::Pipe => Box::new(PipeDetector::with_config(config.pipe.clone())),
                DetectorKind::Nut => Box::new(NutDetector::with_config(config.nut.clone())),
                DetectorKind::Wheel => Box::new(WheelDetector::with_config(config.wheel.clone())),
            };
            registry.push(detector);
        }
        registry
    }

    /// Append a detector; it runs after every detector already present.
    pub fn with(mut self, detector: impl ShapeDetector + 'static) -> Self {
        self.push(Box::new(detector));
        self
    }

    pub fn push(&mut self, detector: Box<dyn ShapeDetector>) {
        self.detectors.push(detector);
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    /// Detector names in evaluation order.
    pub fn names(&self) -> Vec<&'static str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    /// First sufficiently confident result, in registry order.
    ///
    /// A detector that fails to evaluate abstains.
    pub fn resolve(&self, mesh: &TriMesh, node: &SceneNode) -> Option<DetectionResult> {
        for detector in &self.detectors {
            match detector.detect(mesh, node) {
                Ok(Some(result)) if result.confidence() >= self.threshold => {
                    return Some(result);
                }
                Ok(Some(result)) => {
                    debug!(
                        node = %node.id,
                        detector = detector.name(),
                        confidence = result.confidence(),
                        "Below acceptance threshold"
                    );
                }
                Ok(None) => {}
                Err(err) => {
                    debug!(
                        node = %node.id,
                        detector = detector.name(),
                        error = %err,
                        "Detector abstained"
                    );
                }
            }
        }
        None
    }

    /// Like [`resolve`](Self::resolve) but only consults name rules.
    pub fn resolve_by_name(&self, node: &SceneNode) -> Option<DetectionResult> {
        self.detectors
            .iter()
            .filter_map(|d| d.detect_by_name(node))
            .find(|result| result.confidence() >= self.threshold)
    }
}

impl Default for DetectorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DetectorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetectorRegistry")
            .field("detectors", &self.names())
            .field("threshold", &self.threshold)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeometryError;
    use crate::shapes::PartType;

    /// Always reports the same verdict.
    struct Fixed(PartType, f64);

    impl ShapeDetector for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn detect(
            &self,
            _mesh: &TriMesh,
            _node: &SceneNode,
        ) -> Result<Option<DetectionResult>, GeometryError> {
            Ok(Some(DetectionResult::new(self.0, self.1, "fixed")))
        }
    }

    /// Always fails to evaluate.
    struct Broken;

    impl ShapeDetector for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn detect(
            &self,
            _mesh: &TriMesh,
            _node: &SceneNode,
        ) -> Result<Option<DetectionResult>, GeometryError> {
            Err(GeometryError::Degenerate("always".to_string()))
        }
    }

    #[test]
    fn default_order() {
        let registry = DetectorRegistry::default();
        assert_eq!(registry.names(), ["screw", "plate", "pipe", "nut", "wheel"]);
        assert_eq!(registry.threshold(), CONF_THRESHOLD);
    }

    #[test]
    fn screw_beats_pipe_when_listed_first() {
        // slender hollow tube: passes both the screw bbox test and the
        // pipe fill test
        let tube = TriMesh::tube(1.0, 0.9, 10.0, 32);
        let node = SceneNode::new("part_7");

        let result = DetectorRegistry::default().resolve(&tube, &node).unwrap();
        assert_eq!(result.label(), PartType::Screw);
        assert_eq!(result.rationale(), "cylinder bbox");

        let pipe_first = DetectorRegistry::empty(CONF_THRESHOLD)
            .with(PipeDetector::new())
            .with(ScrewDetector::new());
        let result = pipe_first.resolve(&tube, &node).unwrap();
        assert_eq!(result.label(), PartType::Pipe);
    }

    #[test]
    fn bolt_label_wins_over_plate_geometry() {
        let plate = TriMesh::cuboid(0.05, 5.0, 1.0);
        let mut node = SceneNode::new("node_3");
        node.label = "Hex_Bolt_M6".to_string();

        let result = DetectorRegistry::default().resolve(&plate, &node).unwrap();
        assert_eq!(result.label(), PartType::Screw);
        assert_eq!(result.confidence(), 0.95);
    }

    #[test]
    fn first_accepted_result_stops_evaluation() {
        let registry = DetectorRegistry::empty(CONF_THRESHOLD)
            .with(Fixed(PartType::Nut, 0.3))
            .with(Fixed(PartType::Plate, 0.6))
            .with(Fixed(PartType::Wheel, 0.99));
        let result = registry
            .resolve(&TriMesh::cuboid(1.0, 1.0, 1.0), &SceneNode::new("x"))
            .unwrap();
        assert_eq!(result.label(), PartType::Plate);
    }

    #[test]
    fn failing_detectors_abstain() {
        let registry = DetectorRegistry::empty(CONF_THRESHOLD)
            .with(Broken)
            .with(Fixed(PartType::Pipe, 0.75));
        let result = registry
            .resolve(&TriMesh::new(), &SceneNode::new("x"))
            .unwrap();
        assert_eq!(result.label(), PartType::Pipe);

        let only_broken = DetectorRegistry::empty(CONF_THRESHOLD).with(Broken);
        assert!(only_broken
            .resolve(&TriMesh::new(), &SceneNode::new("x"))
            .is_none());
    }

    #[test]
    fn cube_matches_nothing() {
        let cube = TriMesh::cuboid(1.0, 1.0, 1.0);
        assert!(DetectorRegistry::default()
            .resolve(&cube, &SceneNode::new("block"))
            .is_none());
    }

    #[test]
    fn name_resolution_follows_order() {
        let registry = DetectorRegistry::default();
        // "nut" and "screw" both match; screw is listed first
        let node = SceneNode::new("screw_nut_set");
        assert_eq!(
            registry.resolve_by_name(&node).unwrap().label(),
            PartType::Screw
        );
        assert!(registry.resolve_by_name(&SceneNode::new("block")).is_none());
    }

    #[test]
    fn registry_follows_configured_order() {
        let config = ClassifierConfig {
            order: vec![DetectorKind::Nut, DetectorKind::Screw],
            ..ClassifierConfig::default()
        };
        let registry = DetectorRegistry::from_config(&config);
        assert_eq!(registry.names(), ["nut", "screw"]);
        assert_eq!(
            registry
                .resolve_by_name(&SceneNode::new("screw_nut_set"))
                .unwrap()
                .label(),
            PartType::Nut
        );
    }
}
