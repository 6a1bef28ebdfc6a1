//! Spatial include/exclude constraints (C6), expressed in query space.
//!
//! Grounded on the legacy `Excluder` class: a constraint set is a list of
//! exclusion spheres (a transformed molecule point may not fall inside any
//! of them) and a list of inclusion spheres (every one of them must contain
//! at least one transformed molecule point).

use nalgebra::Vector3;

/// A sphere constraint in query space.
#[derive(Debug, Clone, Copy)]
pub struct Sphere {
    /// Sphere center, in query space.
    pub center: Vector3<f64>,
    /// Squared radius, to avoid a sqrt per point-in-sphere test.
    pub radius_sq: f64,
}

impl Sphere {
    /// Builds a sphere from a center and radius.
    #[must_use]
    pub fn new(center: Vector3<f64>, radius: f64) -> Self {
        Self { center, radius_sq: radius * radius }
    }

    fn contains(&self, p: Vector3<f64>) -> bool {
        (p - self.center).norm_squared() <= self.radius_sq
    }
}

/// The full spatial constraint set for a query.
#[derive(Debug, Clone, Default)]
pub struct Excluder {
    exspheres: Vec<Sphere>,
    inspheres: Vec<Sphere>,
}

impl Excluder {
    /// An empty constraint set; `is_defined()` is `false`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an exclusion sphere: any transformed point inside it rejects the
    /// result.
    pub fn add_exclusion_sphere(&mut self, center: Vector3<f64>, radius: f64) {
        self.exspheres.push(Sphere::new(center, radius));
    }

    /// Adds an inclusion sphere: it must contain at least one transformed
    /// point, or the result is rejected.
    pub fn add_inclusion_sphere(&mut self, center: Vector3<f64>, radius: f64) {
        self.inspheres.push(Sphere::new(center, radius));
    }

    /// Whether any constraint has been configured. When `false`, [`Self::passes`]
    /// always accepts without inspecting `points`.
    #[must_use]
    pub fn is_defined(&self) -> bool {
        !self.exspheres.is_empty() || !self.inspheres.is_empty()
    }

    /// Checks every point of the (fully transformed, whole-molecule) point
    /// set against this constraint set.
    #[must_use]
    pub fn passes(&self, points: &[Vector3<f64>]) -> bool {
        if !self.is_defined() {
            return true;
        }
        for sphere in &self.exspheres {
            if points.iter().any(|&p| sphere.contains(p)) {
                return false;
            }
        }
        for sphere in &self.inspheres {
            if !points.iter().any(|&p| sphere.contains(p)) {
                return false;
            }
        }
        true
    }
}
