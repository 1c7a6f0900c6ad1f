//! Scalar shape descriptors shared by all detectors.
//!
//! Every function here is a pure function of the mesh. The bounding-box
//! metrics fail with [`GeometryError`] on meshes without vertices; the
//! hex-symmetry probe never fails and answers `false` instead.

use nalgebra::Vector3;

use crate::error::GeometryError;
use crate::mesh::TriMesh;

/// Offset added to every extent so ratios never divide by zero.
pub const EPS: f64 = 1e-6;

/// Default slenderness (largest / middle extent) for a cylinder.
pub const DEFAULT_MIN_ASPECT: f64 = 2.5;

/// Default radius deviation accepted by [`has_hex_symmetry`].
pub const DEFAULT_HEX_TOLERANCE: f64 = 0.05;

/// Near-circular cross-section band for the two smaller extents.
const ROUND_BAND: (f64, f64) = (0.8, 1.25);

/// Bounding-box edge lengths sorted ascending, each offset by [`EPS`].
pub fn bbox_extents(mesh: &TriMesh) -> Result<[f64; 3], GeometryError> {
    let size = mesh.bounds().ok_or(GeometryError::NoBounds)?.size();
    let mut extents = [size.x, size.y, size.z];
    extents.sort_by(f64::total_cmp);
    Ok(extents.map(|e| e + EPS))
}

/// True if the bounding box looks like a long cylinder: the two smaller
/// extents are nearly equal and the largest is at least `min_aspect` times
/// the middle one.
pub fn is_cylinder_like(mesh: &TriMesh, min_aspect: f64) -> Result<bool, GeometryError> {
    let [e0, e1, e2] = bbox_extents(mesh)?;
    let roundness = e1 / e0;
    Ok((ROUND_BAND.0..=ROUND_BAND.1).contains(&roundness) && e2 / e1 >= min_aspect)
}

/// Smallest / largest extent; close to 0 for plates.
pub fn flatness(mesh: &TriMesh) -> Result<f64, GeometryError> {
    let [e0, _, e2] = bbox_extents(mesh)?;
    Ok(e0 / e2)
}

/// Largest / middle extent.
pub fn aspect_ratio(mesh: &TriMesh) -> Result<f64, GeometryError> {
    let [_, e1, e2] = bbox_extents(mesh)?;
    Ok(e2 / e1)
}

/// Enclosed volume over raw bounding-box volume; low values mean a hollow
/// interior.
pub fn bbox_fill_ratio(mesh: &TriMesh) -> Result<f64, GeometryError> {
    let box_volume = mesh.bounds().ok_or(GeometryError::NoBounds)?.volume();
    if box_volume <= 0.0 {
        return Err(GeometryError::Degenerate(
            "bounding box has zero volume".to_string(),
        ));
    }
    Ok(mesh.volume() / box_volume)
}

/// Crude six-fold symmetry probe.
///
/// Slices the mesh through its centroid with a plane normal to +z, then
/// compares the radius of every section point against the mean radius.
/// Near-circular sections pass as well.
pub fn has_hex_symmetry(mesh: &TriMesh, tol: f64) -> bool {
    let Some(centroid) = mesh.centroid() else {
        return false;
    };
    let Some(section) = mesh.section(centroid, Vector3::z()) else {
        return false;
    };

    let planar = section.to_planar();
    if planar.len() < 3 {
        return false;
    }

    let n = planar.len() as f64;
    let (sx, sy) = planar
        .iter()
        .fold((0.0, 0.0), |(sx, sy), [x, y]| (sx + x, sy + y));
    let (cx, cy) = (sx / n, sy / n);

    let radii: Vec<f64> = planar.iter().map(|[x, y]| (x - cx).hypot(y - cy)).collect();
    let mean = radii.iter().sum::<f64>() / n;
    if !mean.is_finite() || mean <= f64::EPSILON {
        return false;
    }

    let max_dev = radii.iter().map(|r| (r - mean).abs()).fold(0.0, f64::max);
    max_dev / mean < tol
}
