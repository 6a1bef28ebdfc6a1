//! Post-alignment molecule-level filters (C6): the weight/rotatable-bond
//! window and the spatial include/exclude constraints.

pub mod excluder;

pub use excluder::Excluder;

/// The per-molecule properties the ranker's window filter checks. Computing
/// these (parsing the molecule, counting rotatable bonds) is out of scope
/// for this crate; callers supply them alongside each result.
#[derive(Debug, Clone, Copy)]
pub struct MoleculeProperties {
    /// Molecular weight.
    pub weight: f64,
    /// Rotatable bond count.
    pub rotatable_bonds: u32,
}

/// Molecular-weight and rotatable-bond-count acceptance windows.
#[derive(Debug, Clone, Copy, Default)]
pub struct MoleculeFilter {
    /// Inclusive lower weight bound.
    pub min_weight: Option<f64>,
    /// Inclusive upper weight bound.
    pub max_weight: Option<f64>,
    /// Inclusive lower rotatable-bond bound.
    pub min_rot: Option<u32>,
    /// Inclusive upper rotatable-bond bound.
    pub max_rot: Option<u32>,
}

impl MoleculeFilter {
    /// Checks a molecule's properties against the configured windows. A
    /// bound of `None` imposes no restriction on that side.
    #[must_use]
    pub fn passes(&self, props: MoleculeProperties) -> bool {
        if let Some(min) = self.min_weight {
            if props.weight < min {
                return false;
            }
        }
        if let Some(max) = self.max_weight {
            if props.weight > max {
                return false;
            }
        }
        if let Some(min) = self.min_rot {
            if props.rotatable_bonds < min {
                return false;
            }
        }
        if let Some(max) = self.max_rot {
            if props.rotatable_bonds > max {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(weight: f64, rot: u32) -> MoleculeProperties {
        MoleculeProperties { weight, rotatable_bonds: rot }
    }

    #[test]
    fn no_bounds_pass_everything() {
        assert!(MoleculeFilter::default().passes(props(1000.0, 50)));
    }

    #[test]
    fn weight_window_rejects_outside() {
        let filter = MoleculeFilter { min_weight: Some(100.0), max_weight: Some(500.0), ..Default::default() };
        assert!(!filter.passes(props(50.0, 0)));
        assert!(!filter.passes(props(600.0, 0)));
        assert!(filter.passes(props(300.0, 0)));
    }

    #[test]
    fn rotatable_bond_window_rejects_outside() {
        let filter = MoleculeFilter { min_rot: Some(2), max_rot: Some(8), ..Default::default() };
        assert!(!filter.passes(props(0.0, 1)));
        assert!(!filter.passes(props(0.0, 9)));
        assert!(filter.passes(props(0.0, 5)));
    }
}
