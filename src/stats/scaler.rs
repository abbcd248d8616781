//! Standard Scaler Module
//! Column-wise standardization to zero mean and unit variance.

use crate::data::FeatureMatrix;
use rayon::prelude::*;
use statrs::statistics::Statistics;

/// Location and scale of a single feature column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnStats {
    pub mean: f64,
    /// Population standard deviation (ddof = 0)
    pub std: f64,
}

impl ColumnStats {
    /// Divisor used for scaling. Constant columns scale by 1.
    pub fn scale(&self) -> f64 {
        if self.std > 0.0 && self.std.is_finite() {
            self.std
        } else {
            1.0
        }
    }
}

/// Stateless standard scaler: statistics are recomputed on every call.
pub struct StandardScaler;

impl StandardScaler {
    /// Compute mean and population std of every column in parallel.
    pub fn column_stats(features: &FeatureMatrix) -> Vec<ColumnStats> {
        (0..features.n_cols())
            .into_par_iter()
            .map(|j| {
                let values = features.column(j);
                if values.is_empty() {
                    return ColumnStats {
                        mean: f64::NAN,
                        std: f64::NAN,
                    };
                }
                ColumnStats {
                    mean: values.iter().mean(),
                    std: values.iter().population_std_dev(),
                }
            })
            .collect()
    }

    /// Standardize every column of `features`, returning a new matrix.
    pub fn fit_transform(features: &FeatureMatrix) -> FeatureMatrix {
        let stats = Self::column_stats(features);
        let n_cols = features.n_cols();

        let mut scaled = features.clone();
        if n_cols == 0 {
            return scaled;
        }
        scaled
            .values_mut()
            .par_chunks_exact_mut(n_cols)
            .for_each(|row| {
                for (value, st) in row.iter_mut().zip(&stats) {
                    *value = (*value - st.mean) / st.scale();
                }
            });

        log::debug!(
            "Scaled {} columns over {} rows",
            n_cols,
            features.n_rows()
        );
        scaled
    }
}

/// Standardize a feature matrix to zero mean and unit variance per column.
pub fn scale_data(features: &FeatureMatrix) -> FeatureMatrix {
    StandardScaler::fit_transform(features)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: &[Vec<f64>]) -> FeatureMatrix {
        let names = (0..rows[0].len()).map(|j| format!("f{j}")).collect();
        FeatureMatrix::from_rows(names, rows).unwrap()
    }

    fn mean_std(values: &[f64]) -> (f64, f64) {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        (mean, var.sqrt())
    }

    #[test]
    fn columns_have_zero_mean_unit_std() {
        let features = matrix(&[
            vec![1.0, 100.0, -3.0],
            vec![2.0, 250.0, 7.5],
            vec![3.0, 175.0, 0.25],
            vec![10.0, 90.0, 1.0],
            vec![-4.0, 300.0, 2.0],
        ]);

        let scaled = scale_data(&features);

        for j in 0..scaled.n_cols() {
            let (mean, std) = mean_std(&scaled.column(j));
            assert!(mean.abs() < 1e-12, "column {j} mean {mean}");
            assert!((std - 1.0).abs() < 1e-12, "column {j} std {std}");
        }
    }

    #[test]
    fn constant_column_becomes_zero() {
        let features = matrix(&[vec![5.0, 1.0], vec![5.0, 2.0], vec![5.0, 3.0]]);

        let scaled = scale_data(&features);

        assert_eq!(scaled.column(0), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn uses_population_std() {
        let features = matrix(&[vec![0.0], vec![2.0]]);

        let stats = StandardScaler::column_stats(&features);

        assert!((stats[0].mean - 1.0).abs() < 1e-12);
        assert!((stats[0].std - 1.0).abs() < 1e-12);
        assert_eq!(scale_data(&features).column(0), vec![-1.0, 1.0]);
    }

    #[test]
    fn input_is_not_modified() {
        let features = matrix(&[vec![1.0], vec![3.0]]);
        let before = features.clone();

        let _ = scale_data(&features);

        assert_eq!(features, before);
    }
}
