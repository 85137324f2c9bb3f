use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Minimum corner.
    pub min: DVec3,
    /// Maximum corner.
    pub max: DVec3,
}

impl Bounds {
    /// Smallest box containing every point, or `None` if there are none.
    #[must_use]
    pub fn from_points(
        points: impl IntoIterator<Item = DVec3>,
    ) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        Some(iter.fold(Self { min: first, max: first }, |b, p| Self {
            min: b.min.min(p),
            max: b.max.max(p),
        }))
    }

    /// Midpoint of the box.
    #[must_use]
    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// Edge lengths along each axis.
    #[must_use]
    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    /// Whether `p` lies inside or on the box.
    #[must_use]
    pub fn contains(&self, p: DVec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_has_no_bounds() {
        assert_eq!(Bounds::from_points(std::iter::empty()), None);
    }

    #[test]
    fn encloses_all_points() {
        let pts = [
            DVec3::new(1.0, -2.0, 0.0),
            DVec3::new(-3.0, 4.0, 1.0),
            DVec3::new(0.5, 0.5, -6.0),
        ];
        let b = Bounds::from_points(pts).unwrap();
        assert_eq!(b.min, DVec3::new(-3.0, -2.0, -6.0));
        assert_eq!(b.max, DVec3::new(1.0, 4.0, 1.0));
        assert!(pts.iter().all(|&p| b.contains(p)));
        assert_eq!(b.center(), DVec3::new(-1.0, 1.0, -2.5));
        assert_eq!(b.size(), DVec3::new(4.0, 6.0, 7.0));
    }
}
