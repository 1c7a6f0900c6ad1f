//! Triangle meshes as loaded from an asset.
//!
//! [`TriMesh`] is the read-only surface every metric and detector works
//! on: indexed triangles over `f64` points, with the derived quantities the
//! classifiers need (bounds, enclosed volume, centroid, planar sections).

use nalgebra::{Point3, Vector3};

use crate::error::GeometryError;

/// Tolerance used when joining section segments into contours.
const WELD_EPS: f64 = 1e-6;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl Aabb {
    /// Edge lengths along x, y and z.
    pub fn size(&self) -> Vector3<f64> {
        self.max - self.min
    }

    pub fn volume(&self) -> f64 {
        let size = self.size();
        size.x * size.y * size.z
    }
}

/// An indexed triangle mesh.
///
/// Construction validates every face index, so the accessors can index the
/// vertex list without further checks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriMesh {
    vertices: Vec<Point3<f64>>,
    faces: Vec<[u32; 3]>,
}

impl TriMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mesh from raw parts, rejecting faces that index past the
    /// vertex list.
    pub fn from_parts(
        vertices: Vec<Point3<f64>>,
        faces: Vec<[u32; 3]>,
    ) -> Result<Self, GeometryError> {
        let count = vertices.len();
        for (face, indices) in faces.iter().enumerate() {
            if let Some(&vertex) = indices.iter().find(|&&i| i as usize >= count) {
                return Err(GeometryError::BadIndex { face, vertex });
            }
        }
        Ok(Self { vertices, faces })
    }

    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    pub fn faces(&self) -> &[[u32; 3]] {
        &self.faces
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Iterate the faces as vertex triples.
    pub fn triangles(&self) -> impl Iterator<Item = [Point3<f64>; 3]> + '_ {
        self.faces.iter().map(|&[a, b, c]| {
            [
                self.vertices[a as usize],
                self.vertices[b as usize],
                self.vertices[c as usize],
            ]
        })
    }

    /// Bounding box of all vertices, `None` for a mesh without vertices.
    pub fn bounds(&self) -> Option<Aabb> {
        let first = *self.vertices.first()?;
        let (min, max) = self.vertices.iter().fold((first, first), |(lo, hi), p| {
            (
                Point3::new(lo.x.min(p.x), lo.y.min(p.y), lo.z.min(p.z)),
                Point3::new(hi.x.max(p.x), hi.y.max(p.y), hi.z.max(p.z)),
            )
        });
        Some(Aabb { min, max })
    }

    /// Signed enclosed volume from the divergence theorem.
    ///
    /// Only meaningful for closed meshes; positive when faces wind
    /// counter-clockwise seen from outside.
    pub fn signed_volume(&self) -> f64 {
        self.triangles()
            .map(|[a, b, c]| a.coords.dot(&b.coords.cross(&c.coords)))
            .sum::<f64>()
            / 6.0
    }

    pub fn volume(&self) -> f64 {
        self.signed_volume().abs()
    }

    pub fn surface_area(&self) -> f64 {
        self.triangles().map(|tri| triangle_area(&tri)).sum()
    }

    /// Area-weighted centroid of the surface.
    ///
    /// Falls back to the vertex mean when every face is degenerate.
    pub fn centroid(&self) -> Option<Point3<f64>> {
        if self.vertices.is_empty() {
            return None;
        }

        let mut weighted = Vector3::zeros();
        let mut total_area = 0.0;
        for tri in self.triangles() {
            let area = triangle_area(&tri);
            weighted += (tri[0].coords + tri[1].coords + tri[2].coords) * (area / 3.0);
            total_area += area;
        }

        if total_area > f64::EPSILON {
            return Some(Point3::from(weighted / total_area));
        }

        let sum: Vector3<f64> = self.vertices.iter().map(|p| p.coords).sum();
        Some(Point3::from(sum / self.vertices.len() as f64))
    }

    /// Intersect the mesh with a plane.
    ///
    /// Returns `None` when the plane misses every triangle.
    pub fn section(
        &self,
        plane_origin: Point3<f64>,
        plane_normal: Vector3<f64>,
    ) -> Option<CrossSection> {
        let normal = plane_normal.try_normalize(f64::EPSILON)?;

        let mut segments = Vec::new();
        for [a, b, c] in self.triangles() {
            let hits: Vec<Point3<f64>> = [(a, b), (b, c), (c, a)]
                .into_iter()
                .filter_map(|(p, q)| plane_edge_intersection(plane_origin, normal, p, q))
                .collect();
            if hits.len() == 2 {
                segments.push((hits[0], hits[1]));
            }
        }

        if segments.is_empty() {
            return None;
        }

        let contours = chain_segments(segments);
        Some(CrossSection {
            plane_origin,
            plane_normal: normal,
            contour_count: contours.len(),
            points: contours.into_iter().flatten().collect(),
        })
    }

    /// Axis-aligned box centred on the origin.
    pub fn cuboid(x: f64, y: f64, z: f64) -> Self {
        let (hx, hy, hz) = (x / 2.0, y / 2.0, z / 2.0);
        // Vertex i has bit 0 = +x, bit 1 = +y, bit 2 = +z.
        let vertices = (0..8u32)
            .map(|i| {
                Point3::new(
                    if i & 1 == 0 { -hx } else { hx },
                    if i & 2 == 0 { -hy } else { hy },
                    if i & 4 == 0 { -hz } else { hz },
                )
            })
            .collect();
        let faces = vec![
            [0, 3, 1],
            [0, 2, 3],
            [4, 5, 7],
            [4, 7, 6],
            [0, 1, 5],
            [0, 5, 4],
            [2, 7, 3],
            [2, 6, 7],
            [0, 4, 6],
            [0, 6, 2],
            [1, 3, 7],
            [1, 7, 5],
        ];
        Self { vertices, faces }
    }

    /// Closed prism approximating a cylinder along z, centred on the origin.
    ///
    /// `segments` below 3 is raised to 3; six segments give a hexagonal
    /// prism.
    pub fn cylinder(radius: f64, height: f64, segments: u32) -> Self {
        let n = segments.max(3);
        let hz = height / 2.0;

        let mut vertices = ring(radius, -hz, n);
        vertices.extend(ring(radius, hz, n));
        vertices.push(Point3::new(0.0, 0.0, -hz));
        vertices.push(Point3::new(0.0, 0.0, hz));
        let (bottom_center, top_center) = (2 * n, 2 * n + 1);

        let mut faces = Vec::with_capacity(4 * n as usize);
        for i in 0..n {
            let j = (i + 1) % n;
            let (bi, bj, ti, tj) = (i, j, n + i, n + j);
            faces.push([bi, bj, tj]);
            faces.push([bi, tj, ti]);
            faces.push([bottom_center, bj, bi]);
            faces.push([top_center, ti, tj]);
        }
        Self { vertices, faces }
    }

    /// Closed tube (hollow cylinder) along z, centred on the origin.
    pub fn tube(outer_radius: f64, inner_radius: f64, height: f64, segments: u32) -> Self {
        let n = segments.max(3);
        let hz = height / 2.0;

        let mut vertices = ring(outer_radius, -hz, n);
        vertices.extend(ring(outer_radius, hz, n));
        vertices.extend(ring(inner_radius, -hz, n));
        vertices.extend(ring(inner_radius, hz, n));

        let mut faces = Vec::with_capacity(8 * n as usize);
        for i in 0..n {
            let j = (i + 1) % n;
            let (ob_i, ob_j, ot_i, ot_j) = (i, j, n + i, n + j);
            let (ib_i, ib_j, it_i, it_j) = (2 * n + i, 2 * n + j, 3 * n + i, 3 * n + j);
            // outer wall faces away from the axis
            faces.push([ob_i, ob_j, ot_j]);
            faces.push([ob_i, ot_j, ot_i]);
            // inner wall faces the axis
            faces.push([ib_i, it_j, ib_j]);
            faces.push([ib_i, it_i, it_j]);
            // bottom annulus faces -z
            faces.push([ob_i, ib_j, ob_j]);
            faces.push([ob_i, ib_i, ib_j]);
            // top annulus faces +z
            faces.push([ot_i, ot_j, it_j]);
            faces.push([ot_i, it_j, it_i]);
        }
        Self { vertices, faces }
    }
}

/// The intersection of a mesh with a plane.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossSection {
    pub plane_origin: Point3<f64>,
    /// Unit normal of the cutting plane.
    pub plane_normal: Vector3<f64>,
    /// Boundary points of every contour, each point listed once.
    pub points: Vec<Point3<f64>>,
    pub contour_count: usize,
}

impl CrossSection {
    /// Project the boundary points into the plane's own 2-D frame.
    pub fn to_planar(&self) -> Vec<[f64; 2]> {
        let normal = self.plane_normal;
        let u = if normal.x.abs() < 0.9 {
            Vector3::x().cross(&normal).normalize()
        } else {
            Vector3::y().cross(&normal).normalize()
        };
        let v = normal.cross(&u);

        self.points
            .iter()
            .map(|p| {
                let d = *p - self.plane_origin;
                [d.dot(&u), d.dot(&v)]
            })
            .collect()
    }
}

fn triangle_area([a, b, c]: &[Point3<f64>; 3]) -> f64 {
    (b - a).cross(&(c - a)).norm() / 2.0
}

fn ring(radius: f64, z: f64, segments: u32) -> Vec<Point3<f64>> {
    (0..segments)
        .map(|i| {
            let theta = std::f64::consts::TAU * f64::from(i) / f64::from(segments);
            Point3::new(radius * theta.cos(), radius * theta.sin(), z)
        })
        .collect()
}

fn plane_edge_intersection(
    origin: Point3<f64>,
    normal: Vector3<f64>,
    a: Point3<f64>,
    b: Point3<f64>,
) -> Option<Point3<f64>> {
    let d_a = (a - origin).dot(&normal);
    let d_b = (b - origin).dot(&normal);

    if d_a * d_b > 0.0 || (d_a - d_b).abs() < 1e-12 {
        return None;
    }

    let t = d_a / (d_a - d_b);
    Some(a + (b - a) * t)
}

/// Join loose segments into contours; closed contours drop the repeated
/// start point.
fn chain_segments(mut remaining: Vec<(Point3<f64>, Point3<f64>)>) -> Vec<Vec<Point3<f64>>> {
    let close = |p: &Point3<f64>, q: &Point3<f64>| (*p - *q).norm() < WELD_EPS;
    let mut contours = Vec::new();

    while let Some((start, end)) = remaining.pop() {
        let mut contour = vec![start, end];

        loop {
            let tail = contour[contour.len() - 1];
            let head = contour[0];
            let Some(pos) = remaining.iter().position(|(p, q)| {
                close(p, &tail) || close(q, &tail) || close(p, &head) || close(q, &head)
            }) else {
                break;
            };

            let (p, q) = remaining.swap_remove(pos);
            if close(&p, &tail) {
                contour.push(q);
            } else if close(&q, &tail) {
                contour.push(p);
            } else if close(&p, &head) {
                contour.insert(0, q);
            } else {
                contour.insert(0, p);
            }
        }

        if contour.len() > 2 && close(&contour[0], &contour[contour.len() - 1]) {
            contour.pop();
        }
        contours.push(contour);
    }

    contours
}
