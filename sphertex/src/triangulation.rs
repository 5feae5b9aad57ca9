/////////////////////////////////////////////////////////////////////////////////////////////
//
// Builds spherical Delaunay triangulations via an incremental 3-D convex hull.
//
// Created on: 12 Jun 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Spherical triangulation
//!
//! For points on the unit sphere the Delaunay triangulation coincides with
//! the convex hull of the point set in 3-space, so the triangulation is
//! built by an incremental (beneath-beyond) hull construction: every unit
//! vector is an extreme point, so each insertion removes the faces visible
//! from the new point and re-triangulates the horizon loop against it.
//!
//! Point location projects a query direction centrally (from the origin)
//! onto the hull and reports the containing triangle with barycentric
//! coordinates. Candidates are taken from the triangles incident to the
//! nearest vertex, falling back to a full scan when the query lands outside
//! all of them.

use crate::direction::Direction;
use crate::errors::TriangulationError;
use crate::grid::SphereGrid;

// Plane-side tolerance for visibility and containment tests.
const GEOMETRY_EPS: f64 = 1e-12;

#[derive(Debug, Clone, Copy)]
struct Face {
    vertices: [usize; 3],
    normal: [f64; 3],
    // Signed offset of the face plane from the origin along `normal`.
    offset: f64,
    alive: bool,
}

fn sub(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn dot3(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn cross3(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn det3(a: &[f64; 3], b: &[f64; 3], c: &[f64; 3]) -> f64 {
    dot3(a, &cross3(b, c))
}

fn coords(d: &Direction) -> [f64; 3] {
    [d.x(), d.y(), d.z()]
}

/// A Delaunay triangulation of unique directions on the unit sphere.
///
/// Construction deduplicates the input (first occurrence wins) and requires
/// at least four non-degenerate (non-coplanar) directions; otherwise
/// [`TriangulationError::InsufficientSamples`] is returned.
#[derive(Debug)]
pub struct SphericalTriangulation {
    grid: SphereGrid,
    triangles: Vec<[usize; 3]>,
    incident: Vec<Vec<usize>>,
}

impl SphericalTriangulation {
    pub fn new(directions: &[Direction]) -> Result<Self, TriangulationError> {
        let grid = SphereGrid::new(directions);
        let points: Vec<[f64; 3]> = grid.directions().iter().map(coords).collect();

        let triangles = build_hull(&points)?;

        let mut incident = vec![Vec::new(); points.len()];
        for (t, tri) in triangles.iter().enumerate() {
            for &v in tri {
                incident[v].push(t);
            }
        }

        Ok(Self {
            grid,
            triangles,
            incident,
        })
    }

    /// The unique vertex directions, in insertion order.
    #[inline(always)]
    pub fn vertices(&self) -> &[Direction] {
        self.grid.directions()
    }

    /// Indices of the kept (first-occurrence) input directions.
    #[inline(always)]
    pub fn kept_indices(&self) -> &[usize] {
        self.grid.kept_indices()
    }

    /// Vertex index triples of all triangles, outward oriented.
    #[inline(always)]
    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    /// Median nearest-neighbour angular distance of the vertices.
    #[inline(always)]
    pub fn resolution(&self) -> f64 {
        self.grid.resolution()
    }

    /// The nearest-neighbour index over the vertices.
    #[inline(always)]
    pub fn grid(&self) -> &SphereGrid {
        &self.grid
    }

    /// Unique undirected edges as sorted vertex index pairs.
    pub fn edges(&self) -> Vec<[usize; 2]> {
        let mut edges: Vec<[usize; 2]> = self
            .triangles
            .iter()
            .flat_map(|t| {
                [[t[0], t[1]], [t[1], t[2]], [t[2], t[0]]]
                    .into_iter()
                    .map(|[a, b]| match a < b {
                        true => [a, b],
                        false => [b, a],
                    })
            })
            .collect();
        edges.sort_unstable();
        edges.dedup();
        edges
    }

    /// Triangle indices incident to a vertex.
    pub fn incident_triangles(&self, vertex: usize) -> &[usize] {
        &self.incident[vertex]
    }

    /// Vertex indices adjacent to a vertex (the link of the vertex).
    pub fn vertex_neighbors(&self, vertex: usize) -> Vec<usize> {
        let mut out: Vec<usize> = self.incident[vertex]
            .iter()
            .flat_map(|&t| self.triangles[t])
            .filter(|&v| v != vertex)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Locates the triangle whose central projection contains `target`,
    /// returning its index and the normalized barycentric coordinates of
    /// the query within it.
    ///
    /// Returns `None` when no triangle contains the query (possible when
    /// the samples cover only part of the sphere).
    pub fn locate(&self, target: &Direction) -> Option<(usize, [f64; 3])> {
        let q = coords(target);

        if let Some((nearest, _)) = self.grid.nearest(target) {
            for &t in &self.incident[nearest] {
                if let Some(bary) = self.contains(t, &q) {
                    return Some((t, bary));
                }
            }
        }

        // Full scan fallback for queries outside the candidate fan.
        for t in 0..self.triangles.len() {
            if let Some(bary) = self.contains(t, &q) {
                return Some((t, bary));
            }
        }
        None
    }

    /// Barycentric coordinates of the central projection of `q` onto
    /// triangle `t`, or `None` if the projection falls outside.
    fn contains(&self, t: usize, q: &[f64; 3]) -> Option<[f64; 3]> {
        let [i, j, k] = self.triangles[t];
        let a = coords(&self.vertices()[i]);
        let b = coords(&self.vertices()[j]);
        let c = coords(&self.vertices()[k]);

        let d = det3(&a, &b, &c);
        if d.abs() < GEOMETRY_EPS {
            return None;
        }

        let b0 = det3(q, &b, &c) / d;
        let b1 = det3(&a, q, &c) / d;
        let b2 = det3(&a, &b, q) / d;
        let sum = b0 + b1 + b2;

        // Positive sum keeps the projection on the near side of the hull.
        if sum <= GEOMETRY_EPS {
            return None;
        }
        let bary = [b0 / sum, b1 / sum, b2 / sum];
        match bary.iter().all(|&v| v >= -1e-9) {
            true => Some(bary),
            false => None,
        }
    }
}

/// Finds four affinely independent seed points, returning their indices or
/// the size of the largest independent subset found.
fn find_seed_tetrahedron(points: &[[f64; 3]]) -> Result<[usize; 4], usize> {
    if points.is_empty() {
        return Err(0);
    }

    let i0 = 0;
    let mut found: usize = 1;

    let i1 = (1..points.len())
        .find(|&i| dot3(&sub(&points[i], &points[i0]), &sub(&points[i], &points[i0])) > GEOMETRY_EPS)
        .ok_or(found)?;
    found = 2;

    let e1 = sub(&points[i1], &points[i0]);
    let i2 = (1..points.len())
        .find(|&i| {
            let c = cross3(&e1, &sub(&points[i], &points[i0]));
            dot3(&c, &c) > GEOMETRY_EPS
        })
        .ok_or(found)?;
    found = 3;

    let e2 = sub(&points[i2], &points[i0]);
    let i3 = (1..points.len())
        .find(|&i| det3(&e1, &e2, &sub(&points[i], &points[i0])).abs() > GEOMETRY_EPS)
        .ok_or(found)?;

    Ok([i0, i1, i2, i3])
}

/// Creates a face over the given vertices, oriented away from `interior`.
fn make_face(points: &[[f64; 3]], vertices: [usize; 3], interior: &[f64; 3]) -> Face {
    let [i, j, k] = vertices;
    let mut normal = cross3(
        &sub(&points[j], &points[i]),
        &sub(&points[k], &points[i]),
    );
    let mut verts = vertices;
    if dot3(&normal, &sub(interior, &points[i])) > 0.0 {
        verts = [i, k, j];
        normal = [-normal[0], -normal[1], -normal[2]];
    }
    let offset = dot3(&normal, &points[verts[0]]);
    Face {
        vertices: verts,
        normal,
        offset,
        alive: true,
    }
}

fn build_hull(points: &[[f64; 3]]) -> Result<Vec<[usize; 3]>, TriangulationError> {
    let seed = find_seed_tetrahedron(points).map_err(|got| {
        TriangulationError::InsufficientSamples { required: 4, got }
    })?;

    let interior = {
        let mut c = [0.0; 3];
        for &i in &seed {
            c[0] += points[i][0] / 4.0;
            c[1] += points[i][1] / 4.0;
            c[2] += points[i][2] / 4.0;
        }
        c
    };

    let [a, b, c, d] = seed;
    let mut faces: Vec<Face> = [[a, b, c], [a, b, d], [a, c, d], [b, c, d]]
        .into_iter()
        .map(|v| make_face(points, v, &interior))
        .collect();

    for (p, point) in points.iter().enumerate() {
        if seed.contains(&p) {
            continue;
        }

        // Faces visible from the new point get removed; their boundary (the
        // horizon) is re-triangulated against it.
        let mut visible = Vec::new();
        for (f, face) in faces.iter().enumerate() {
            if face.alive && dot3(&face.normal, point) - face.offset > GEOMETRY_EPS {
                visible.push(f);
            }
        }
        if visible.is_empty() {
            // Coincident with the hull surface (cospherical degeneracy);
            // nothing to do.
            continue;
        }

        let mut edge_counts: std::collections::HashMap<[usize; 2], usize> =
            std::collections::HashMap::new();
        for &f in &visible {
            let [i, j, k] = faces[f].vertices;
            for [u, v] in [[i, j], [j, k], [k, i]] {
                let key = match u < v {
                    true => [u, v],
                    false => [v, u],
                };
                *edge_counts.entry(key).or_insert(0) += 1;
            }
            faces[f].alive = false;
        }

        for ([u, v], count) in edge_counts {
            if count == 1 {
                faces.push(make_face(points, [u, v, p], &interior));
            }
        }
    }

    Ok(faces
        .into_iter()
        .filter(|f| f.alive)
        .map(|f| f.vertices)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::generate_random_directions;

    #[test]
    fn tetrahedron_has_four_faces() {
        let dirs = [
            Direction::new(1.0, 1.0, 1.0),
            Direction::new(1.0, -1.0, -1.0),
            Direction::new(-1.0, 1.0, -1.0),
            Direction::new(-1.0, -1.0, 1.0),
        ];
        let tri = SphericalTriangulation::new(&dirs).unwrap();
        assert_eq!(tri.vertices().len(), 4);
        assert_eq!(tri.triangles().len(), 4);
        assert_eq!(tri.edges().len(), 6);
    }

    #[test]
    fn random_triangulation_satisfies_euler_formula() {
        let dirs = generate_random_directions(200, Some(61));
        let tri = SphericalTriangulation::new(&dirs).unwrap();

        let v = tri.vertices().len() as i64;
        let e = tri.edges().len() as i64;
        let f = tri.triangles().len() as i64;
        assert_eq!(v - e + f, 2);
        // Closed triangulated sphere: F = 2V - 4, E = 3V - 6.
        assert_eq!(f, 2 * v - 4);
        assert_eq!(e, 3 * v - 6);
    }

    #[test]
    fn too_few_points_is_an_error() {
        let dirs = generate_random_directions(3, Some(4));
        let err = SphericalTriangulation::new(&dirs).unwrap_err();
        assert_eq!(
            err,
            TriangulationError::InsufficientSamples {
                required: 4,
                got: 3
            }
        );
    }

    #[test]
    fn coplanar_points_are_degenerate() {
        // Directions on the equator all lie in the z = 0 plane.
        let dirs: Vec<Direction> = (0..12)
            .map(|i| Direction::from_polar(std::f64::consts::FRAC_PI_2, i as f64 * 0.5))
            .collect();
        let err = SphericalTriangulation::new(&dirs).unwrap_err();
        assert!(matches!(
            err,
            TriangulationError::InsufficientSamples { required: 4, .. }
        ));
    }

    #[test]
    fn duplicates_are_removed_before_triangulating() {
        let mut dirs = generate_random_directions(50, Some(9));
        dirs.extend_from_slice(&dirs.clone());
        let tri = SphericalTriangulation::new(&dirs).unwrap();
        assert_eq!(tri.vertices().len(), 50);
        assert_eq!(tri.kept_indices().len(), 50);
    }

    #[test]
    fn locate_at_vertex_returns_unit_barycentric() {
        let dirs = generate_random_directions(100, Some(31));
        let tri = SphericalTriangulation::new(&dirs).unwrap();

        let v = tri.vertices()[10];
        let (t, bary) = tri.locate(&v).unwrap();
        let local = tri.triangles()[t].iter().position(|&i| {
            tri.vertices()[i].angle_to(&v) < 1e-12
        });
        let idx = local.unwrap();
        assert!((bary[idx] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn locate_reconstructs_query_direction() {
        let dirs = generate_random_directions(300, Some(77));
        let tri = SphericalTriangulation::new(&dirs).unwrap();
        let queries = generate_random_directions(50, Some(78));

        for q in &queries {
            let (t, bary) = tri.locate(q).unwrap();
            let [i, j, k] = tri.triangles()[t];
            let (a, b, c) = (tri.vertices()[i], tri.vertices()[j], tri.vertices()[k]);
            let recon = Direction::new(
                bary[0] * a.x() + bary[1] * b.x() + bary[2] * c.x(),
                bary[0] * a.y() + bary[1] * b.y() + bary[2] * c.y(),
                bary[0] * a.z() + bary[1] * b.z() + bary[2] * c.z(),
            );
            assert!(recon.angle_to(q) < 1e-9);
            assert!(bary.iter().all(|&w| w >= -1e-9));
            assert!((bary.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn every_direction_is_covered_by_a_full_sphere_sampling() {
        let dirs = generate_random_directions(150, Some(12));
        let tri = SphericalTriangulation::new(&dirs).unwrap();
        for q in generate_random_directions(200, Some(13)) {
            assert!(tri.locate(&q).is_some());
        }
    }
}
