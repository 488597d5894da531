//! Geometry value types shared across the pipeline
//!
//! Everything in here is plain data: oriented bounding boxes for the pair
//! pre-filter, bounding spheres for vertex clustering, and the float
//! comparison helper used by volume checks.
use nalgebra::{Matrix3, Point3, Vector3};

/// Oriented bounding box
///
/// Axes are stored as the columns of a rotation matrix; `half` holds the
/// half-extent along each axis. An axis-aligned box is the special case
/// where `axes` is the identity.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Obb {
    pub center: Point3<f64>,
    pub half: Vector3<f64>,
    pub axes: Matrix3<f64>,
}

impl Obb {
    /// Builds an axis-aligned box from min/max corners
    pub fn axis_aligned(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self {
            center: nalgebra::center(&min, &max),
            half: (max - min) / 2.0,
            axes: Matrix3::identity(),
        }
    }

    /// Returns a copy inflated symmetrically by `clearance` on every axis
    pub fn enlarged(&self, clearance: f64) -> Self {
        Self {
            half: self.half.add_scalar(clearance),
            ..*self
        }
    }

    /// Separating-axis disjointness test
    ///
    /// Checks the 6 face normals and 9 edge-cross axes; returns `true` when
    /// some axis separates the two boxes, i.e. they cannot intersect.
    pub fn is_out(&self, other: &Obb) -> bool {
        let t = other.center - self.center;

        let mut axes = Vec::with_capacity(15);
        for i in 0..3 {
            axes.push(self.axes.column(i).into_owned());
            axes.push(other.axes.column(i).into_owned());
        }
        for i in 0..3 {
            for j in 0..3 {
                let c = self
                    .axes
                    .column(i)
                    .cross(&other.axes.column(j).into_owned());
                if c.norm_squared() > 1e-12 {
                    axes.push(c);
                }
            }
        }

        for axis in axes {
            let ra: f64 = (0..3)
                .map(|i| (self.axes.column(i).dot(&axis) * self.half[i]).abs())
                .sum();
            let rb: f64 = (0..3)
                .map(|i| (other.axes.column(i).dot(&axis) * other.half[i]).abs())
                .sum();
            if t.dot(&axis).abs() > ra + rb {
                return true;
            }
        }
        false
    }
}

/// Bounding sphere used by the merger's vertex clustering
///
/// `radius` already includes the clustering gap, so two spheres belong to
/// the same cluster exactly when they intersect.
#[derive(Copy, Clone, Debug)]
pub struct BoundingSphere {
    pub center: Point3<f64>,
    pub radius: f64,
}

impl BoundingSphere {
    pub fn new(center: Point3<f64>, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Returns `true` when the two spheres cannot touch
    pub fn is_out(&self, other: &BoundingSphere) -> bool {
        let d = self.radius + other.radius;
        nalgebra::distance_squared(&self.center, &other.center) > d * d
    }
}

/// Are two floats approximately equal?
///
/// Both a relative (`drel`) and an absolute (`dabs`) error bound are
/// applied; at least one must be non-zero.
pub fn vals_close(a: f64, b: f64, drel: f64, dabs: f64) -> bool {
    debug_assert!(drel >= 0.0);
    debug_assert!(dabs >= 0.0);
    debug_assert!(drel > 0.0 || dabs > 0.0);

    let mag = a.abs().max(b.abs());
    (b - a).abs() < drel * mag + dabs
}

#[cfg(test)]
mod test {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        vals_close(a, b, 1e-9, 1e-12)
    }

    #[test]
    fn vals_close_identical() {
        assert!(close(0.0, 0.0));
        assert!(close(1.0, 1.0));
    }

    #[test]
    fn vals_close_nearby() {
        assert!(close(0.0, 1e-15));
        assert!(close(1.0, 1.0 + 1e-15));
    }

    #[test]
    fn vals_close_far() {
        assert!(!close(0.0, 1.0));
        assert!(!close(1.0, 0.0));
        assert!(!close(0.0, 1e-10));
    }

    fn aabb(min: [f64; 3], max: [f64; 3]) -> Obb {
        Obb::axis_aligned(Point3::from(min), Point3::from(max))
    }

    #[test]
    fn obb_disjoint() {
        let a = aabb([0.0; 3], [1.0; 3]);
        let b = aabb([2.0, 0.0, 0.0], [3.0, 1.0, 1.0]);
        assert!(a.is_out(&b));
        assert!(b.is_out(&a));
    }

    #[test]
    fn obb_overlapping() {
        let a = aabb([0.0; 3], [2.0; 3]);
        let b = aabb([1.0; 3], [3.0; 3]);
        assert!(!a.is_out(&b));
    }

    #[test]
    fn obb_touching_counts_as_in() {
        let a = aabb([0.0; 3], [1.0; 3]);
        let b = aabb([1.0, 0.0, 0.0], [2.0, 1.0, 1.0]);
        assert!(!a.is_out(&b));
    }

    #[test]
    fn obb_enlarge_closes_gap() {
        let a = aabb([0.0; 3], [1.0; 3]);
        let b = aabb([1.4, 0.0, 0.0], [2.0, 1.0, 1.0]);
        assert!(a.is_out(&b));
        // each box grows by 0.25, so the 0.4 gap closes
        assert!(!a.enlarged(0.25).is_out(&b.enlarged(0.25)));
    }

    #[test]
    fn obb_rotated() {
        // a thin box rotated 45 degrees about Z pokes into its neighbour
        let rot = nalgebra::Rotation3::from_axis_angle(
            &Vector3::z_axis(),
            std::f64::consts::FRAC_PI_4,
        );
        let a = Obb {
            center: Point3::new(0.0, 0.0, 0.0),
            half: Vector3::new(2.0, 0.1, 0.1),
            axes: *rot.matrix(),
        };
        let b = aabb([1.0, 1.0, -1.0], [3.0, 3.0, 1.0]);
        assert!(!a.is_out(&b));

        let far = aabb([3.0, -1.0, -1.0], [5.0, 1.0, 1.0]);
        assert!(a.is_out(&far));
    }

    #[test]
    fn spheres() {
        let a = BoundingSphere::new(Point3::origin(), 1.0);
        let b = BoundingSphere::new(Point3::new(1.5, 0.0, 0.0), 1.0);
        let c = BoundingSphere::new(Point3::new(3.0, 0.0, 0.0), 0.5);
        assert!(!a.is_out(&b));
        assert!(a.is_out(&c));
        assert!(!b.is_out(&c));
    }
}
