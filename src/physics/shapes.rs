//! Collision shapes: convex hulls and compounds of them.
//!
//! Both types stay inspectable on the CPU side; the rapier shape is derived
//! from them when a body is registered with the world.

use std::sync::Arc;

use rapier3d::parry::bounding_volume::{Aabb, BoundingVolume};
use rapier3d::parry::shape::RoundShape;
use rapier3d::prelude::{Isometry, Point, Real, SharedShape, Vector};

/// Collision margin a fresh hull starts with, the same default Bullet uses.
pub const DEFAULT_MARGIN: Real = 0.04;

/// Hulls thinner than this share of their bounding cube count as flat.
const FLAT_VOLUME_RATIO: Real = 1e-5;

/// A convex collision volume built from points added one at a time.
///
/// The hull is only usable once a point was added with `last = true`. That
/// point finalizes the shape: the point hull and its bounds are computed once.
/// The margin is applied on top whenever an engine shape is requested, so
/// changing it never recomputes the hull.
#[derive(Clone)]
pub struct ConvexHullShape {
    points: Vec<Point<Real>>,
    margin: Real,
    finalized: bool,
    hull: Option<PointHull>,
}

#[derive(Clone)]
struct PointHull {
    polyhedron: SharedShape,
    aabb: Aabb,
    volume: Real,
}

impl ConvexHullShape {
    pub fn new() -> Self {
        Self {
            points: Vec::new(),
            margin: DEFAULT_MARGIN,
            finalized: false,
            hull: None,
        }
    }

    pub fn add_point(&mut self, point: Point<Real>, last: bool) {
        self.points.push(point);
        if last {
            self.finalize();
        } else {
            self.finalized = false;
            self.hull = None;
        }
    }

    fn finalize(&mut self) {
        self.finalized = true;
        self.hull = point_hull(&self.points);
        if self.hull.is_none() {
            log::debug!(
                "convex hull over {} points spans no volume",
                self.points.len()
            );
        }
    }

    pub fn points(&self) -> &[Point<Real>] {
        &self.points
    }

    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    pub fn margin(&self) -> Real {
        self.margin
    }

    pub fn set_margin(&mut self, margin: Real) {
        self.margin = margin;
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// A hull without an engine shape: too few points, no volume, or never finalized.
    pub fn is_degenerate(&self) -> bool {
        self.hull.is_none()
    }

    /// Bounds of the hull grown by the margin.
    pub fn local_aabb(&self) -> Option<Aabb> {
        self.hull
            .as_ref()
            .map(|hull| hull.aabb.loosened(self.margin.max(0.0)))
    }

    /// Volume enclosed by the points, without the margin.
    pub fn volume(&self) -> Real {
        self.hull.as_ref().map_or(0.0, |hull| hull.volume)
    }

    /// The engine shape: the point hull, rounded by the margin when it is positive.
    pub fn shared_shape(&self) -> Option<SharedShape> {
        let hull = self.hull.as_ref()?;
        if self.margin <= 0.0 {
            return Some(hull.polyhedron.clone());
        }
        let inner_shape = hull.polyhedron.as_convex_polyhedron()?.clone();
        Some(SharedShape::new(RoundShape {
            inner_shape,
            border_radius: self.margin,
        }))
    }

    /// Whether two hulls share the same computed point hull.
    pub fn shares_hull_with(&self, other: &ConvexHullShape) -> bool {
        match (&self.hull, &other.hull) {
            (Some(a), Some(b)) => Arc::ptr_eq(&a.polyhedron.0, &b.polyhedron.0),
            _ => false,
        }
    }
}

impl Default for ConvexHullShape {
    fn default() -> Self {
        Self::new()
    }
}

fn point_hull(points: &[Point<Real>]) -> Option<PointHull> {
    if points.len() < 4 {
        return None;
    }
    // Hull computation needs extent along every axis.
    let mut aabb = Aabb::new_invalid();
    for point in points {
        aabb.take_point(*point);
    }
    let extents = aabb.extents();
    if extents.iter().any(|e| *e <= Real::EPSILON) {
        return None;
    }
    let polyhedron = SharedShape::convex_hull(points)?;
    let (vertices, indices) = polyhedron.as_convex_polyhedron()?.to_trimesh();
    let volume = enclosed_volume(&vertices, &indices);
    // Coplanar points off the axis planes still pass the extent check.
    if volume <= FLAT_VOLUME_RATIO * extents.max().powi(3) {
        return None;
    }
    Some(PointHull {
        polyhedron,
        aabb,
        volume,
    })
}

fn enclosed_volume(vertices: &[Point<Real>], indices: &[[u32; 3]]) -> Real {
    let six_volume: Real = indices
        .iter()
        .map(|[a, b, c]| {
            let a = vertices[*a as usize].coords;
            let b = vertices[*b as usize].coords;
            let c = vertices[*c as usize].coords;
            a.dot(&b.cross(&c))
        })
        .sum();
    six_volume.abs() / 6.0
}

/**
 * Builds a hull from a flat array of xyz triples.
 *
 * The last complete triple is added with the finalizing flag. Fewer than four points,
 * or points without volume, give a degenerate hull instead of failing.
 */
pub fn create_convex_hull_shape(coords: &[f32]) -> ConvexHullShape {
    let mut shape = ConvexHullShape::new();
    let count = coords.len() / 3;
    for (i, xyz) in coords.chunks_exact(3).enumerate() {
        let last_one = i + 1 == count;
        shape.add_point(Point::new(xyz[0], xyz[1], xyz[2]), last_one);
    }
    shape
}

/// An ordered collection of hulls, each placed by a local transform.
#[derive(Clone, Default)]
pub struct CompoundShape {
    children: Vec<(Isometry<Real>, ConvexHullShape)>,
}

impl CompoundShape {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_child_shape(&mut self, transform: Isometry<Real>, shape: ConvexHullShape) {
        self.children.push((transform, shape));
    }

    pub fn num_child_shapes(&self) -> usize {
        self.children.len()
    }

    pub fn child_shape(&self, idx: usize) -> Option<&ConvexHullShape> {
        self.children.get(idx).map(|(_, shape)| shape)
    }

    pub fn child_transform(&self, idx: usize) -> Option<&Isometry<Real>> {
        self.children.get(idx).map(|(transform, _)| transform)
    }

    pub fn children(&self) -> impl Iterator<Item = &(Isometry<Real>, ConvexHullShape)> {
        self.children.iter()
    }

    /// Bounds of all non-degenerate children in the compound's frame.
    pub fn local_aabb(&self) -> Option<Aabb> {
        self.children
            .iter()
            .filter_map(|(transform, shape)| {
                shape.local_aabb().map(|aabb| aabb.transform_by(transform))
            })
            .reduce(|a, b| a.merged(&b))
    }

    /**
     * Inertia of the compound's bounding box for the given mass, like Bullet does it.
     *
     * A zero mass (static and kinematic bodies) always gives zero inertia.
     */
    pub fn calculate_local_inertia(&self, mass: Real) -> Vector<Real> {
        if mass <= 0.0 {
            return Vector::zeros();
        }
        let Some(aabb) = self.local_aabb() else {
            return Vector::zeros();
        };
        let l = aabb.extents();
        Vector::new(
            mass / 12.0 * (l.y * l.y + l.z * l.z),
            mass / 12.0 * (l.x * l.x + l.z * l.z),
            mass / 12.0 * (l.x * l.x + l.y * l.y),
        )
    }

    /// The engine shape made of all non-degenerate children, if there is any.
    pub fn to_shared_shape(&self) -> Option<SharedShape> {
        let parts: Vec<(Isometry<Real>, SharedShape)> = self
            .children
            .iter()
            .filter_map(|(transform, shape)| {
                shape.shared_shape().map(|shared| (*transform, shared))
            })
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(SharedShape::compound(parts))
        }
    }
}
