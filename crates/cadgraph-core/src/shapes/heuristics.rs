//! Rule-based detectors: fast bounding-box and keyword tests, no ML.
//!
//! Each detector carries its own config whose `Default` holds the stock
//! thresholds, confidences and keyword lists.

use serde::{Deserialize, Serialize};

use super::{DetectionResult, KeywordRule, PartType, ShapeDetector};
use crate::error::GeometryError;
use crate::geometry::{
    aspect_ratio, bbox_extents, bbox_fill_ratio, flatness, has_hex_symmetry, is_cylinder_like,
    DEFAULT_HEX_TOLERANCE, DEFAULT_MIN_ASPECT,
};
use crate::mesh::TriMesh;
use crate::scene::SceneNode;

// ---------- Screw / Bolt ----------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrewConfig {
    pub keywords: KeywordRule,
    pub min_aspect: f64,
    pub geometry_confidence: f64,
}

impl Default for ScrewConfig {
    fn default() -> Self {
        Self {
            keywords: KeywordRule::new(["screw", "bolt", "thread", "vis", "schraube"], 0.95),
            min_aspect: DEFAULT_MIN_ASPECT,
            geometry_confidence: 0.65,
        }
    }
}

/// Screws and bolts: name first, then a slender round bounding box.
#[derive(Debug, Clone, Default)]
pub struct ScrewDetector {
    config: ScrewConfig,
}

impl ScrewDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ScrewConfig) -> Self {
        Self { config }
    }
}

impl ShapeDetector for ScrewDetector {
    fn name(&self) -> &'static str {
        "screw"
    }

    fn detect(
        &self,
        mesh: &TriMesh,
        node: &SceneNode,
    ) -> Result<Option<DetectionResult>, GeometryError> {
        if let Some(hit) = self.detect_by_name(node) {
            return Ok(Some(hit));
        }
        if is_cylinder_like(mesh, self.config.min_aspect)? {
            return Ok(Some(DetectionResult::new(
                PartType::Screw,
                self.config.geometry_confidence,
                "cylinder bbox",
            )));
        }
        Ok(None)
    }

    fn detect_by_name(&self, node: &SceneNode) -> Option<DetectionResult> {
        self.config.keywords.apply(PartType::Screw, node)
    }
}

// ---------- Plate ----------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlateConfig {
    /// Flatness must be strictly below this.
    pub max_flatness: f64,
    /// Aspect ratio must be strictly above this.
    pub min_aspect: f64,
    pub confidence: f64,
}

impl Default for PlateConfig {
    fn default() -> Self {
        Self {
            max_flatness: 0.08,
            min_aspect: 3.0,
            confidence: 0.8,
        }
    }
}

/// Thin, elongated slabs.
#[derive(Debug, Clone, Default)]
pub struct PlateDetector {
    config: PlateConfig,
}

impl PlateDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PlateConfig) -> Self {
        Self { config }
    }
}

impl ShapeDetector for PlateDetector {
    fn name(&self) -> &'static str {
        "plate"
    }

    fn detect(
        &self,
        mesh: &TriMesh,
        _node: &SceneNode,
    ) -> Result<Option<DetectionResult>, GeometryError> {
        let thin = flatness(mesh)? < self.config.max_flatness;
        if thin && aspect_ratio(mesh)? > self.config.min_aspect {
            return Ok(Some(DetectionResult::new(
                PartType::Plate,
                self.config.confidence,
                "thin flat bbox",
            )));
        }
        Ok(None)
    }
}

// ---------- Pipe / Tube ----------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipeConfig {
    pub min_aspect: f64,
    /// Volume / bbox volume must be strictly below this.
    pub max_fill_ratio: f64,
    pub confidence: f64,
}

impl Default for PipeConfig {
    fn default() -> Self {
        Self {
            min_aspect: 1.5,
            max_fill_ratio: 0.3,
            confidence: 0.75,
        }
    }
}

/// Round, moderately slender parts whose volume is far below their box.
#[derive(Debug, Clone, Default)]
pub struct PipeDetector {
    config: PipeConfig,
}

impl PipeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PipeConfig) -> Self {
        Self { config }
    }
}

impl ShapeDetector for PipeDetector {
    fn name(&self) -> &'static str {
        "pipe"
    }

    fn detect(
        &self,
        mesh: &TriMesh,
        _node: &SceneNode,
    ) -> Result<Option<DetectionResult>, GeometryError> {
        if !is_cylinder_like(mesh, self.config.min_aspect)? {
            return Ok(None);
        }
        if bbox_fill_ratio(mesh)? < self.config.max_fill_ratio {
            return Ok(Some(DetectionResult::new(
                PartType::Pipe,
                self.config.confidence,
                "hollow cylinder",
            )));
        }
        Ok(None)
    }
}

// ---------- Nut ----------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NutConfig {
    pub keywords: KeywordRule,
    pub hex_tolerance: f64,
    pub geometry_confidence: f64,
}

impl Default for NutConfig {
    fn default() -> Self {
        Self {
            keywords: KeywordRule::new(["nut"], 0.9),
            hex_tolerance: DEFAULT_HEX_TOLERANCE,
            geometry_confidence: 0.7,
        }
    }
}

/// Nuts: name first, then the cross-section radius probe.
#[derive(Debug, Clone, Default)]
pub struct NutDetector {
    config: NutConfig,
}

impl NutDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: NutConfig) -> Self {
        Self { config }
    }
}

impl ShapeDetector for NutDetector {
    fn name(&self) -> &'static str {
        "nut"
    }

    fn detect(
        &self,
        mesh: &TriMesh,
        node: &SceneNode,
    ) -> Result<Option<DetectionResult>, GeometryError> {
        if let Some(hit) = self.detect_by_name(node) {
            return Ok(Some(hit));
        }
        if has_hex_symmetry(mesh, self.config.hex_tolerance) {
            return Ok(Some(DetectionResult::new(
                PartType::Nut,
                self.config.geometry_confidence,
                "hexagonal symmetry",
            )));
        }
        Ok(None)
    }

    fn detect_by_name(&self, node: &SceneNode) -> Option<DetectionResult> {
        self.config.keywords.apply(PartType::Nut, node)
    }
}

// ---------- Wheel ----------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WheelConfig {
    pub keywords: KeywordRule,
    /// Inclusive band for middle / smallest extent.
    pub roundness: [f64; 2],
    /// Inclusive band for largest / smallest extent.
    pub thickness: [f64; 2],
    pub geometry_confidence: f64,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            keywords: KeywordRule::new(["wheel", "rad"], 0.9),
            roundness: [0.9, 1.1],
            thickness: [0.2, 0.6],
            geometry_confidence: 0.6,
        }
    }
}

/// Wheels: name first, then a disk-like bounding box.
#[derive(Debug, Clone, Default)]
pub struct WheelDetector {
    config: WheelConfig,
}

impl WheelDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: WheelConfig) -> Self {
        Self { config }
    }
}

impl ShapeDetector for WheelDetector {
    fn name(&self) -> &'static str {
        "wheel"
    }

    fn detect(
        &self,
        mesh: &TriMesh,
        node: &SceneNode,
    ) -> Result<Option<DetectionResult>, GeometryError> {
        if let Some(hit) = self.detect_by_name(node) {
            return Ok(Some(hit));
        }
        let [e0, e1, e2] = bbox_extents(mesh)?;
        let in_band = |value: f64, [lo, hi]: [f64; 2]| lo <= value && value <= hi;
        if in_band(e1 / e0, self.config.roundness) && in_band(e2 / e0, self.config.thickness) {
            return Ok(Some(DetectionResult::new(
                PartType::Wheel,
                self.config.geometry_confidence,
                "disk-like bbox",
            )));
        }
        Ok(None)
    }

    fn detect_by_name(&self, node: &SceneNode) -> Option<DetectionResult> {
        self.config.keywords.apply(PartType::Wheel, node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(label: &str) -> SceneNode {
        SceneNode::new(label)
    }

    fn hit(detector: &dyn ShapeDetector, mesh: &TriMesh, label: &str) -> Option<DetectionResult> {
        detector.detect(mesh, &node(label)).unwrap()
    }

    #[test]
    fn screw_prefers_keywords_over_geometry() {
        let detector = ScrewDetector::new();
        let cube = TriMesh::cuboid(1.0, 1.0, 1.0);

        let by_name = hit(&detector, &cube, "Bolt_M8").unwrap();
        assert_eq!(by_name.label(), PartType::Screw);
        assert_eq!(by_name.confidence(), 0.95);
        assert_eq!(by_name.rationale(), "keyword match");

        let rod = TriMesh::cylinder(0.4, 5.0, 24);
        let by_shape = hit(&detector, &rod, "part_17").unwrap();
        assert_eq!(by_shape.confidence(), 0.65);
        assert_eq!(by_shape.rationale(), "cylinder bbox");

        assert!(hit(&detector, &cube, "part_18").is_none());
    }

    #[test]
    fn plate_needs_thin_and_long() {
        let detector = PlateDetector::new();
        let plate = TriMesh::cuboid(0.05, 5.0, 1.0);
        let result = hit(&detector, &plate, "Body").unwrap();
        assert_eq!(result.label(), PartType::Plate);
        assert_eq!(result.rationale(), "thin flat bbox");

        // thin but square
        let tile = TriMesh::cuboid(0.05, 1.0, 1.0);
        assert!(hit(&detector, &tile, "Tile").is_none());
    }

    #[test]
    fn pipe_needs_hollow_interior() {
        let detector = PipeDetector::new();
        let tube = TriMesh::tube(1.0, 0.9, 4.0, 32);
        let result = hit(&detector, &tube, "part").unwrap();
        assert_eq!(result.label(), PartType::Pipe);
        assert_eq!(result.confidence(), 0.75);

        let rod = TriMesh::cylinder(1.0, 4.0, 32);
        assert!(hit(&detector, &rod, "part").is_none());
    }

    #[test]
    fn nut_matches_name_or_round_section() {
        let detector = NutDetector::new();
        let cube = TriMesh::cuboid(1.0, 1.0, 1.0);
        assert_eq!(
            hit(&detector, &cube, "ISO4032_Nut").unwrap().confidence(),
            0.9
        );

        let washer_like = TriMesh::cylinder(1.0, 0.3, 48);
        let result = hit(&detector, &washer_like, "part").unwrap();
        assert_eq!(result.rationale(), "hexagonal symmetry");
        assert_eq!(result.confidence(), 0.7);

        assert!(hit(&detector, &cube, "part").is_none());
    }

    #[test]
    fn wheel_keywords_include_rad() {
        let detector = WheelDetector::new();
        let cube = TriMesh::cuboid(1.0, 1.0, 1.0);
        assert_eq!(
            hit(&detector, &cube, "Rad_vorne").unwrap().label(),
            PartType::Wheel
        );
        assert!(hit(&detector, &cube, "part").is_none());
    }

    #[test]
    fn wheel_disk_band_is_configurable() {
        // sorted extents keep largest / smallest at or above 1, outside the
        // stock thickness band
        let disk = TriMesh::cylinder(2.0, 0.8, 32);
        let cube = TriMesh::cuboid(1.0, 1.0, 1.0);
        assert!(hit(&WheelDetector::new(), &disk, "part").is_none());
        assert!(hit(&WheelDetector::new(), &cube, "part").is_none());

        let widened = WheelDetector::with_config(WheelConfig {
            thickness: [0.9, 1.1],
            ..WheelConfig::default()
        });
        let result = hit(&widened, &cube, "part").unwrap();
        assert_eq!(result.rationale(), "disk-like bbox");
        assert_eq!(result.confidence(), 0.6);
    }

    #[test]
    fn geometry_rules_error_on_empty_meshes() {
        let empty = TriMesh::new();
        let target = node("part");
        assert!(ScrewDetector::new().detect(&empty, &target).is_err());
        assert!(PlateDetector::new().detect(&empty, &target).is_err());
        assert!(PipeDetector::new().detect(&empty, &target).is_err());
        assert!(WheelDetector::new().detect(&empty, &target).is_err());
        // the hex probe answers false instead of failing
        assert!(NutDetector::new().detect(&empty, &target).unwrap().is_none());
    }

    #[test]
    fn keyword_only_paths_ignore_geometry() {
        assert!(PlateDetector::new().detect_by_name(&node("plate")).is_none());
        assert!(ScrewDetector::new().detect_by_name(&node("thread_rod")).is_some());
    }
}
