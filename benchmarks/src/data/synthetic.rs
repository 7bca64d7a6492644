//! Seeded synthetic CSV tables.
//!
//! Features are uniform in `[-1, 1]`. Classification labels bucket the
//! feature sum, so they are learnable; regression targets are a noisy
//! weighted sum.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt::Write;

/// What the target column of a generated table holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyntheticTarget {
    /// Text labels `class_0 .. class_{n-1}`.
    Classes(usize),
    /// Continuous values with many distinct entries.
    Regression,
}

/// Description of a generated table.
#[derive(Clone, Debug)]
pub struct SyntheticTable {
    pub n_rows: usize,
    pub n_features: usize,
    pub target: SyntheticTarget,
    pub seed: u64,
}

impl SyntheticTable {
    pub fn new(n_rows: usize, n_features: usize, target: SyntheticTarget) -> Self {
        Self {
            n_rows,
            n_features,
            target,
            seed: 42,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// `x1 .. xn`.
    pub fn feature_names(&self) -> Vec<String> {
        (1..=self.n_features).map(|i| format!("x{}", i)).collect()
    }

    pub fn target_name(&self) -> &'static str {
        match self.target {
            SyntheticTarget::Classes(_) => "label",
            SyntheticTarget::Regression => "target",
        }
    }

    /// Render the table as comma-separated text with a header line.
    pub fn to_csv(&self) -> String {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut out = String::with_capacity(self.n_rows * (self.n_features + 1) * 8);

        let mut header = self.feature_names();
        header.push(self.target_name().to_string());
        out.push_str(&header.join(","));
        out.push('\n');

        let mut row = vec![0.0f64; self.n_features];
        for _ in 0..self.n_rows {
            for v in row.iter_mut() {
                *v = rng.gen_range(-1.0..=1.0);
                let _ = write!(out, "{:.6},", v);
            }
            match self.target {
                SyntheticTarget::Classes(n) => {
                    let n = n.max(1);
                    let sum: f64 = row.iter().sum();
                    let scaled = (sum / self.n_features.max(1) as f64 + 1.0) / 2.0;
                    let class = ((scaled * n as f64) as usize).min(n - 1);
                    let _ = writeln!(out, "class_{}", class);
                }
                SyntheticTarget::Regression => {
                    let value: f64 = row
                        .iter()
                        .enumerate()
                        .map(|(j, v)| (j + 1) as f64 * v)
                        .sum::<f64>()
                        + rng.gen_range(-0.05..=0.05);
                    let _ = writeln!(out, "{:.6}", value);
                }
            }
        }
        out
    }
}
