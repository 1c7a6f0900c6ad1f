//! Part classification: the detector contract and its heuristics.

pub mod heuristics;
pub mod registry;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GeometryError;
use crate::mesh::TriMesh;
use crate::scene::SceneNode;

pub use heuristics::{NutDetector, PipeDetector, PlateDetector, ScrewDetector, WheelDetector};
pub use registry::{DetectorRegistry, CONF_THRESHOLD};

/// Part categories a node can be tagged with.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PartType {
    Screw,
    Plate,
    Pipe,
    Nut,
    Wheel,
    #[default]
    Unknown,
}

impl PartType {
    pub const ALL: [PartType; 6] = [
        PartType::Screw,
        PartType::Plate,
        PartType::Pipe,
        PartType::Nut,
        PartType::Wheel,
        PartType::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PartType::Screw => "SCREW",
            PartType::Plate => "PLATE",
            PartType::Pipe => "PIPE",
            PartType::Nut => "NUT",
            PartType::Wheel => "WHEEL",
            PartType::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for PartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PartType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PartType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown part type `{s}`"))
    }
}

/// One detector's verdict on one node. Never mutated after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionResult {
    label: PartType,
    confidence: f64,
    rationale: String,
}

impl DetectionResult {
    /// Create a result; confidence is clamped into [0, 1].
    pub fn new(label: PartType, confidence: f64, rationale: impl Into<String>) -> Self {
        Self {
            label,
            confidence: confidence.clamp(0.0, 1.0),
            rationale: rationale.into(),
        }
    }

    pub fn label(&self) -> PartType {
        self.label
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Which rule fired, for audit output only.
    pub fn rationale(&self) -> &str {
        &self.rationale
    }
}

/// A stateless classification rule.
///
/// `detect` returns `Ok(None)` when the detector has no opinion and `Err`
/// when a metric could not be evaluated; the resolver treats both as
/// "no match" and moves on to the next detector.
pub trait ShapeDetector: Send + Sync {
    /// Short identifier used in logs and config.
    fn name(&self) -> &'static str;

    fn detect(
        &self,
        mesh: &TriMesh,
        node: &SceneNode,
    ) -> Result<Option<DetectionResult>, GeometryError>;

    /// Name-only verdict, used when geometry classification is skipped.
    fn detect_by_name(&self, _node: &SceneNode) -> Option<DetectionResult> {
        None
    }
}

/// Case-insensitive substring match of a node label against keywords.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub keywords: Vec<String>,
    pub confidence: f64,
}

impl KeywordRule {
    pub fn new<I, S>(keywords: I, confidence: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
            confidence,
        }
    }

    pub fn matches(&self, label: &str) -> bool {
        let label = label.to_lowercase();
        self.keywords
            .iter()
            .any(|k| !k.is_empty() && label.contains(&k.to_lowercase()))
    }

    pub fn apply(&self, part: PartType, node: &SceneNode) -> Option<DetectionResult> {
        self.matches(&node.label)
            .then(|| DetectionResult::new(part, self.confidence, "keyword match"))
    }
}
