//! Sparse matrices in the scipy formats (csr, csc, coo, bsr, lil, dok, dia).
//!
//! Entries are held as canonical triplets (sorted by row, then column,
//! duplicates summed), so converting between formats never changes the
//! value. The format is carried along so it survives a round trip.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SparseFormat {
    Csr,
    Csc,
    Coo,
    Bsr,
    Lil,
    Dok,
    Dia,
}

impl SparseFormat {
    pub const ALL: [SparseFormat; 7] = [
        SparseFormat::Csr,
        SparseFormat::Csc,
        SparseFormat::Coo,
        SparseFormat::Bsr,
        SparseFormat::Lil,
        SparseFormat::Dok,
        SparseFormat::Dia,
    ];

    /// Type name as written to `__DTYPE__`.
    pub fn type_name(self) -> &'static str {
        match self {
            SparseFormat::Csr => "csr_matrix",
            SparseFormat::Csc => "csc_matrix",
            SparseFormat::Coo => "coo_matrix",
            SparseFormat::Bsr => "bsr_matrix",
            SparseFormat::Lil => "lil_matrix",
            SparseFormat::Dok => "dok_matrix",
            SparseFormat::Dia => "dia_matrix",
        }
    }

    fn description(self) -> &'static str {
        match self {
            SparseFormat::Csr => "Compressed Sparse Row",
            SparseFormat::Csc => "Compressed Sparse Column",
            SparseFormat::Coo => "COOrdinate",
            SparseFormat::Bsr => "Block Sparse Row",
            SparseFormat::Lil => "LInked List",
            SparseFormat::Dok => "Dictionary Of Keys",
            SparseFormat::Dia => "DIAgonal",
        }
    }
}

impl FromStr for SparseFormat {
    type Err = String;

    /// Accepts the three-letter format (`csr`) or the type name (`csr_matrix`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.get(..3) {
            Some("csr") => Ok(SparseFormat::Csr),
            Some("csc") => Ok(SparseFormat::Csc),
            Some("coo") => Ok(SparseFormat::Coo),
            Some("bsr") => Ok(SparseFormat::Bsr),
            Some("lil") => Ok(SparseFormat::Lil),
            Some("dok") => Ok(SparseFormat::Dok),
            Some("dia") => Ok(SparseFormat::Dia),
            _ => Err(format!("unknown sparse format {s:?}")),
        }
    }
}

/// The three CSR arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct Csr {
    pub data: Vec<f64>,
    pub indices: Vec<usize>,
    pub indptr: Vec<usize>,
}

/// A two-dimensional sparse matrix of `f64`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SparseMatrix {
    format: SparseFormat,
    shape: (usize, usize),
    entries: Vec<(usize, usize, f64)>,
}

impl SparseMatrix {
    /// Build from `(row, col, value)` triplets. Fails if an index is out of
    /// bounds.
    pub fn from_triplets(
        format: SparseFormat,
        shape: (usize, usize),
        mut entries: Vec<(usize, usize, f64)>,
    ) -> Result<SparseMatrix, String> {
        if let Some(&(r, c, _)) = entries.iter().find(|(r, c, _)| *r >= shape.0 || *c >= shape.1) {
            return Err(format!("entry ({r}, {c}) outside shape {}x{}", shape.0, shape.1));
        }
        entries.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        let mut merged: Vec<(usize, usize, f64)> = Vec::with_capacity(entries.len());
        for (r, c, v) in entries {
            match merged.last_mut() {
                Some(last) if last.0 == r && last.1 == c => last.2 += v,
                _ => merged.push((r, c, v)),
            }
        }
        Ok(SparseMatrix {
            format,
            shape,
            entries: merged,
        })
    }

    /// Build from CSR arrays, validating their consistency.
    pub fn from_csr(
        format: SparseFormat,
        shape: (usize, usize),
        csr: Csr,
    ) -> Result<SparseMatrix, String> {
        let Csr { data, indices, indptr } = csr;
        if indptr.len() != shape.0 + 1 {
            return Err(format!(
                "indptr has {} entries, expected {}",
                indptr.len(),
                shape.0 + 1
            ));
        }
        if data.len() != indices.len() {
            return Err(format!(
                "{} values but {} column indices",
                data.len(),
                indices.len()
            ));
        }
        if indptr.first() != Some(&0) || indptr.last() != Some(&data.len()) {
            return Err("indptr does not span the stored values".into());
        }
        if indptr.windows(2).any(|w| w[0] > w[1]) {
            return Err("indptr is not monotonic".into());
        }
        let mut entries = Vec::with_capacity(data.len());
        for row in 0..shape.0 {
            for k in indptr[row]..indptr[row + 1] {
                entries.push((row, indices[k], data[k]));
            }
        }
        SparseMatrix::from_triplets(format, shape, entries)
    }

    pub fn format(&self) -> SparseFormat {
        self.format
    }

    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub fn triplets(&self) -> &[(usize, usize, f64)] {
        &self.entries
    }

    /// The same matrix in another format.
    pub fn asformat(&self, format: SparseFormat) -> SparseMatrix {
        SparseMatrix {
            format,
            ..self.clone()
        }
    }

    pub fn to_csr(&self) -> Csr {
        let mut indptr = vec![0usize; self.shape.0 + 1];
        for &(r, _, _) in &self.entries {
            indptr[r + 1] += 1;
        }
        for i in 0..self.shape.0 {
            indptr[i + 1] += indptr[i];
        }
        Csr {
            data: self.entries.iter().map(|e| e.2).collect(),
            indices: self.entries.iter().map(|e| e.1).collect(),
            indptr,
        }
    }

    pub fn to_dense(&self) -> ndarray::Array2<f64> {
        let mut dense = ndarray::Array2::zeros(self.shape);
        for &(r, c, v) in &self.entries {
            dense[[r, c]] = v;
        }
        dense
    }
}

impl Ord for SparseMatrix {
    fn cmp(&self, other: &Self) -> Ordering {
        self.format
            .cmp(&other.format)
            .then_with(|| self.shape.cmp(&other.shape))
            .then_with(|| {
                let key = |e: &(usize, usize, f64)| (e.0, e.1);
                for (a, b) in self.entries.iter().zip(&other.entries) {
                    let ord = key(a).cmp(&key(b)).then_with(|| a.2.total_cmp(&b.2));
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                self.entries.len().cmp(&other.entries.len())
            })
    }
}

impl PartialOrd for SparseMatrix {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SparseMatrix {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SparseMatrix {}

impl fmt::Display for SparseMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{}x{} sparse matrix of type 'float64' with {} stored elements in {} format>",
            self.shape.0,
            self.shape.1,
            self.nnz(),
            self.format.description()
        )
    }
}
