use crate::geometry::{Axis, BoundingBox, Polygon, Ray, Sphere};

type PolygonF = Polygon<f32>;
type BoxF = BoundingBox<f32>;

const CLASSIFY_EPSILON: f32 = 1.0e-5;

/// Node of an [`AabbTree`]. Only leaves own polygons.
#[derive(Clone, Debug, Default)]
pub struct AabbNode {
    pub bounds: BoxF,
    pub left: Option<Box<AabbNode>>,
    pub right: Option<Box<AabbNode>>,
    pub polygons: Vec<PolygonF>,
}

impl AabbNode {
    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    fn children(&self) -> impl Iterator<Item = &AabbNode> {
        self.left.iter().chain(self.right.iter()).map(|b| b.as_ref())
    }

    fn build(polygons: Vec<PolygonF>) -> Self {
        let bounds = BoundingBox::from_points(polygons.iter().flat_map(|p| p.vertices.iter()))
            .unwrap_or_default();

        let (left_box, right_box) = bounds.cut();
        let axis = bounds.longest_axis();
        let split = axis.component(&left_box.max);

        let count = polygons.len();
        let mut left_polygons = Vec::new();
        let mut right_polygons = Vec::new();

        for polygon in polygons.iter() {
            match Self::classify(polygon, &left_box, &right_box, axis, split) {
                Side::Left => left_polygons.push(*polygon),
                Side::Right => right_polygons.push(*polygon),
            }
        }

        let can_split = |n: usize| n > 0 && n < count;

        if !can_split(left_polygons.len()) && !can_split(right_polygons.len()) {
            return Self {
                bounds,
                polygons,
                ..Default::default()
            };
        }

        // every polygon lands in exactly one bucket, so a shrinking side means both are non empty
        Self {
            bounds,
            left: Some(Box::new(Self::build(left_polygons))),
            right: Some(Box::new(Self::build(right_polygons))),
            polygons: Vec::new(),
        }
    }

    /// The first vertex found inside either half decides the side. Polygons with no vertex
    /// inside either half go to the side holding their center.
    fn classify(polygon: &PolygonF, left: &BoxF, right: &BoxF, axis: Axis, split: f32) -> Side {
        for v in &polygon.vertices {
            if left.contains(v, CLASSIFY_EPSILON) {
                return Side::Left;
            }
            if right.contains(v, CLASSIFY_EPSILON) {
                return Side::Right;
            }
        }

        if axis.component(&polygon.center()) <= split {
            Side::Left
        } else {
            Side::Right
        }
    }

    fn resolve(&self, ray: &Ray<f32>, out: &mut Vec<PolygonF>) -> bool {
        if self.is_leaf() {
            out.extend_from_slice(&self.polygons);
            return true;
        }

        let mut resolved = false;

        for child in self.children() {
            if child.bounds.intersects_ray(ray) {
                resolved |= child.resolve(ray, out);
            }
        }

        resolved
    }

    fn resolve_sphere(&self, sphere: &Sphere<f32>, out: &mut Vec<PolygonF>) -> bool {
        if self.is_leaf() {
            out.extend_from_slice(&self.polygons);
            return true;
        }

        let mut resolved = false;

        for child in self.children() {
            if sphere.intersects_box(&child.bounds) {
                resolved |= child.resolve_sphere(sphere, out);
            }
        }

        resolved
    }
}

enum Side {
    Left,
    Right,
}

/// Bounding volume hierarchy over a polygon soup, built once by [`AabbTree::populate`].
#[derive(Clone, Debug, Default)]
pub struct AabbTree {
    root: Option<AabbNode>,
}

impl AabbTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn populate(polygons: Vec<PolygonF>) -> Self {
        if polygons.is_empty() {
            return Self::default();
        }

        Self {
            root: Some(AabbNode::build(polygons)),
        }
    }

    pub fn root(&self) -> Option<&AabbNode> {
        self.root.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Appends every polygon held by a leaf whose box `ray` crosses.
    ///
    /// The root box itself is not tested, so a single leaf tree always returns all polygons.
    pub fn resolve(&self, ray: &Ray<f32>, out: &mut Vec<PolygonF>) -> bool {
        match &self.root {
            Some(root) => root.resolve(ray, out),
            None => false,
        }
    }

    pub fn resolve_sphere(&self, sphere: &Sphere<f32>, out: &mut Vec<PolygonF>) -> bool {
        match &self.root {
            Some(root) if sphere.intersects_box(&root.bounds) => root.resolve_sphere(sphere, out),
            _ => false,
        }
    }

    /// Candidates from [`resolve`](Self::resolve) narrowed to the polygons `ray` really crosses.
    pub fn hits(&self, ray: &Ray<f32>) -> Vec<PolygonF> {
        let mut candidates = Vec::new();
        self.resolve(ray, &mut candidates);

        candidates.retain(|p| p.intersects_ray(ray));
        candidates
    }

    pub fn leaf_count(&self) -> usize {
        fn count(node: &AabbNode) -> usize {
            if node.is_leaf() {
                1
            } else {
                node.children().map(count).sum()
            }
        }

        self.root.as_ref().map_or(0, count)
    }

    pub fn polygon_count(&self) -> usize {
        fn count(node: &AabbNode) -> usize {
            node.polygons.len() + node.children().map(count).sum::<usize>()
        }

        self.root.as_ref().map_or(0, count)
    }
}

#[cfg(test)]
mod aabb_tree_tests {
    use super::*;
    use crate::geometry::Vector3;

    fn strip(n: usize) -> Vec<PolygonF> {
        (0..n)
            .map(|i| {
                let x = i as f32 * 2.0;
                Polygon::new(
                    Vector3::new(x, 0.0, 0.0),
                    Vector3::new(x + 1.0, 1.0, 0.0),
                    Vector3::new(x, 0.0, 1.0),
                )
            })
            .collect()
    }

    fn sorted_keys(polygons: &[PolygonF]) -> Vec<i32> {
        let mut keys: Vec<i32> = polygons.iter().map(|p| p.vertices[0].x as i32).collect();
        keys.sort();
        keys
    }

    #[test]
    fn test_every_polygon_in_one_leaf() {
        for n in [1, 2, 3, 7, 64, 100] {
            let tree = AabbTree::populate(strip(n));

            assert_eq!(tree.polygon_count(), n);
            assert!(tree.leaf_count() >= 1);
            assert!(tree.root().unwrap().is_leaf() || tree.root().unwrap().polygons.is_empty());
        }
    }

    #[test]
    fn test_ray_through_everything() {
        let polygons = strip(33);
        let tree = AabbTree::populate(polygons.clone());

        let ray = Ray::new(Vector3::new(-10.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0));
        let mut out = Vec::new();

        assert!(tree.resolve(&ray, &mut out));
        assert_eq!(sorted_keys(&out), sorted_keys(&polygons));
    }

    #[test]
    fn test_ray_selects_subset() {
        let tree = AabbTree::populate(strip(16));
        assert!(tree.leaf_count() > 1);

        let ray = Ray::new(Vector3::new(0.5, 0.25, 10.0), Vector3::new(0.0, 0.0, -1.0));
        let mut out = Vec::new();
        tree.resolve(&ray, &mut out);

        assert!(!out.is_empty());
        assert!(out.len() < 16);
        assert!(out.iter().any(|p| p.vertices[0].x == 0.0));
    }

    #[test]
    fn test_hits_and_miss() {
        let tree = AabbTree::populate(strip(8));

        let down = Vector3::new(0.0, -1.0, 0.0);
        let hits = tree.hits(&Ray::new(Vector3::new(4.2, 5.0, 0.1), down));
        assert_eq!(sorted_keys(&hits), vec![4]);

        let mut out = Vec::new();
        let miss = Ray::new(Vector3::new(100.0, 5.0, 0.0), down);
        tree.resolve(&miss, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_identical_polygons_make_a_leaf() {
        let p = strip(1)[0];
        let tree = AabbTree::populate(vec![p; 5]);

        assert_eq!(tree.leaf_count(), 1);
        assert_eq!(tree.polygon_count(), 5);
    }

    #[test]
    fn test_sphere() {
        let tree = AabbTree::populate(strip(8));
        let mut out = Vec::new();

        assert!(tree.resolve_sphere(&Sphere::new(Vector3::new(0.5, 0.5, 0.5), 0.5), &mut out));
        assert!(out.iter().any(|p| p.vertices[0].x == 0.0));
        assert!(!tree.resolve_sphere(&Sphere::new(Vector3::splat(100.0), 1.0), &mut Vec::new()));
    }

    #[test]
    fn test_empty() {
        let tree = AabbTree::populate(Vec::new());
        assert!(tree.is_empty());
        assert!(!tree.resolve(&Ray::new(Vector3::zero(), Vector3::new(1.0, 0.0, 0.0)), &mut Vec::new()));
    }
}
