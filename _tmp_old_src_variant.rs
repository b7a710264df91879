===== src/variant.rs =====
//! The variant identity and decoded-data types shared across the codec and
//! reader facade.

/// A variant's identity: name (rsid), chromosome, 1-based position, and the
/// two alleles. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    pub name: String,
    pub chromosome: String,
    pub position: u32,
    pub allele1: String,
    pub allele2: String,
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "<Variant {} chr{}:{}_{}/{}>",
            self.name, self.chromosome, self.position, self.allele1, self.allele2
        )
    }
}

/// An `(N, 3)` row-major matrix of genotype probabilities: row *i* is
/// `(P(homref), P(het), P(homalt))` for sample *i*. Missing samples carry
/// `NaN` in all three slots.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityMatrix {
    data: Vec<f64>,
    n_samples: usize,
}

impl ProbabilityMatrix {
    pub fn from_rows(rows: Vec<[f64; 3]>) -> Self {
        let n_samples = rows.len();
        let data = rows.into_iter().flatten().collect();
        ProbabilityMatrix { data, n_samples }
    }

    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    pub fn row(&self, i: usize) -> [f64; 3] {
        let base = i * 3;
        [self.data[base], self.data[base + 1], self.data[base + 2]]
    }

    pub fn rows(&self) -> impl Iterator<Item = [f64; 3]> + '_ {
        (0..self.n_samples).map(move |i| self.row(i))
    }
}

/// An `(N,)` vector of dosages in `[0, 2]`, `NaN` for missing or
/// below-threshold samples.
#[derive(Debug, Clone, PartialEq)]
pub struct DosageVector(pub Vec<f64>);

impl DosageVector {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The per-variant decoded payload, selected at open time by the reader's
/// return-mode flag.
#[derive(Debug, Clone, PartialEq)]
pub enum VariantData {
    Probabilities(ProbabilityMatrix),
    Dosage(DosageVector),
}


