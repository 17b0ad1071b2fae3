use std::collections::HashMap;

use xlalign::ProteinAlignments;

use crate::Crosslink;

/// Structural knowledge about crosslinks, handed to the filter explicitly
pub trait DistanceProvider {
    /// The distance between the linked residues in the structure, if known
    fn distance(&self, crosslink: &Crosslink) -> Option<f64>;

    /// Check if a residue (1-based, in search sequence coordinates) is covered by the structure
    fn residue_covered(&self, protein: &str, residue: usize) -> bool;
}

/// No structure loaded, no distances are known and no residue is covered
#[derive(Clone, Copy, Debug, Default)]
pub struct NoDistances;

impl DistanceProvider for NoDistances {
    fn distance(&self, _crosslink: &Crosslink) -> Option<f64> {
        None
    }

    fn residue_covered(&self, _protein: &str, _residue: usize) -> bool {
        false
    }
}

/// Distances measured on a structure whose chains are aligned onto the proteins. A residue is
/// covered if it falls within an aligned block of any chain of its protein.
#[derive(Clone, Debug)]
pub struct AlignedStructure<'a> {
    distances: HashMap<String, f64>,
    alignments: &'a ProteinAlignments,
}

impl<'a> AlignedStructure<'a> {
    /// Create a new provider from the chain alignments, without any distances
    pub fn new(alignments: &'a ProteinAlignments) -> Self {
        Self {
            distances: HashMap::new(),
            alignments,
        }
    }

    /// Set the distance for a crosslink (by identifier)
    pub fn set_distance(&mut self, crosslink: impl Into<String>, distance: f64) {
        self.distances.insert(crosslink.into(), distance);
    }
}

impl DistanceProvider for AlignedStructure<'_> {
    fn distance(&self, crosslink: &Crosslink) -> Option<f64> {
        self.distances.get(&crosslink.id).copied()
    }

    fn residue_covered(&self, protein: &str, residue: usize) -> bool {
        self.alignments.get(protein).is_some_and(|protein| {
            protein
                .sequences()
                .filter(|model| !model.canonical)
                .any(|model| model.blockify().iter().any(|block| block.contains(residue)))
        })
    }
}
