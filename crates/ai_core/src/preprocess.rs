//! Feature preprocessing
//!
//! Numeric columns go through median imputation and standardization;
//! categorical columns go through most-frequent imputation and one-hot
//! encoding. [`ColumnTransformer`] stacks both paths into one dense matrix
//! (numeric block first) and ignores every other column of the input frame.
//!
//! All statistics are learned in `fit` and frozen afterwards, so the same
//! transformer can be persisted with the model and replayed at inference.

use serde::{Deserialize, Serialize};

use crate::errors::{CoreError, Result};
use crate::frame::DataFrame;
use crate::stats::{mean, median, most_frequent, std_dev};

/// Fills missing numeric cells with the per-column training median.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedianImputer {
    statistics: Vec<f64>,
}

impl MedianImputer {
    /// Learn one median per column. Columns with no observed values impute 0.
    pub fn fit(columns: &[Vec<Option<f64>>]) -> Self {
        let statistics = columns
            .iter()
            .map(|col| {
                let observed: Vec<f64> = col.iter().flatten().copied().collect();
                median(&observed).unwrap_or(0.0)
            })
            .collect();
        Self { statistics }
    }

    pub fn statistics(&self) -> &[f64] {
        &self.statistics
    }

    pub fn transform(&self, column: usize, value: Option<f64>) -> f64 {
        value
            .filter(|v| v.is_finite())
            .unwrap_or(self.statistics[column])
    }
}

/// Centers each column on its training mean and divides by its population
/// standard deviation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(columns: &[Vec<f64>]) -> Self {
        let means = columns
            .iter()
            .map(|col| mean(col).unwrap_or(0.0))
            .collect();
        let scales = columns
            .iter()
            .map(|col| match std_dev(col) {
                Some(s) if s > 0.0 && s.is_finite() => s,
                _ => 1.0,
            })
            .collect();
        Self { means, scales }
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }

    pub fn scales(&self) -> &[f64] {
        &self.scales
    }

    pub fn transform(&self, column: usize, value: f64) -> f64 {
        (value - self.means[column]) / self.scales[column]
    }
}

/// Fills missing categorical cells with the most frequent training value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MostFrequentImputer {
    fills: Vec<String>,
}

impl MostFrequentImputer {
    pub fn fit(columns: &[Vec<Option<String>>]) -> Self {
        let fills = columns
            .iter()
            .map(|col| most_frequent(col.iter().flatten().map(String::as_str)).unwrap_or_default())
            .collect();
        Self { fills }
    }

    pub fn fills(&self) -> &[String] {
        &self.fills
    }

    pub fn transform<'a>(&'a self, column: usize, value: Option<&'a str>) -> &'a str {
        value.unwrap_or(&self.fills[column])
    }
}

/// One-hot encoder over the sorted training categories of each column.
/// Unknown categories encode as an all-zero block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    categories: Vec<Vec<String>>,
}

impl OneHotEncoder {
    pub fn fit(columns: &[Vec<String>]) -> Self {
        let categories = columns
            .iter()
            .map(|col| {
                let mut cats: Vec<String> = col.clone();
                cats.sort();
                cats.dedup();
                cats
            })
            .collect();
        Self { categories }
    }

    pub fn categories(&self) -> &[Vec<String>] {
        &self.categories
    }

    /// Total number of indicator columns
    pub fn width(&self) -> usize {
        self.categories.iter().map(Vec::len).sum()
    }

    /// Append the indicator block for `value` to `out`.
    pub fn encode_into(&self, column: usize, value: &str, out: &mut Vec<f64>) {
        let cats = &self.categories[column];
        let hit = cats.binary_search_by(|c| c.as_str().cmp(value)).ok();
        out.extend((0..cats.len()).map(|i| if Some(i) == hit { 1.0 } else { 0.0 }));
    }
}

/// Numeric path: median imputation then standardization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericPipeline {
    columns: Vec<String>,
    imputer: MedianImputer,
    scaler: StandardScaler,
}

impl NumericPipeline {
    fn fit(frame: &DataFrame, columns: &[String]) -> Result<Self> {
        let raw = numeric_inputs(frame, columns)?;
        let imputer = MedianImputer::fit(&raw);
        let imputed: Vec<Vec<f64>> = raw
            .iter()
            .enumerate()
            .map(|(j, col)| col.iter().map(|v| imputer.transform(j, *v)).collect())
            .collect();
        let scaler = StandardScaler::fit(&imputed);
        Ok(Self {
            columns: columns.to_vec(),
            imputer,
            scaler,
        })
    }

    pub fn imputer(&self) -> &MedianImputer {
        &self.imputer
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }
}

/// Categorical path: most-frequent imputation then one-hot encoding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalPipeline {
    columns: Vec<String>,
    imputer: MostFrequentImputer,
    encoder: OneHotEncoder,
}

impl CategoricalPipeline {
    fn fit(frame: &DataFrame, columns: &[String]) -> Result<Self> {
        let raw = text_inputs(frame, columns)?;
        let imputer = MostFrequentImputer::fit(&raw);
        let imputed: Vec<Vec<String>> = raw
            .iter()
            .enumerate()
            .map(|(j, col)| {
                col.iter()
                    .map(|v| imputer.transform(j, v.as_deref()).to_string())
                    .collect()
            })
            .collect();
        let encoder = OneHotEncoder::fit(&imputed);
        Ok(Self {
            columns: columns.to_vec(),
            imputer,
            encoder,
        })
    }

    pub fn imputer(&self) -> &MostFrequentImputer {
        &self.imputer
    }

    pub fn encoder(&self) -> &OneHotEncoder {
        &self.encoder
    }
}

/// Column-wise transformer producing a dense numeric matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnTransformer {
    numeric: NumericPipeline,
    categorical: CategoricalPipeline,
}

impl ColumnTransformer {
    /// Fit both paths on the training frame.
    pub fn fit(frame: &DataFrame, numeric: &[String], categorical: &[String]) -> Result<Self> {
        if frame.is_empty() {
            return Err(CoreError::EmptyDataset(
                "cannot fit preprocessing on zero rows".to_string(),
            ));
        }
        Ok(Self {
            numeric: NumericPipeline::fit(frame, numeric)?,
            categorical: CategoricalPipeline::fit(frame, categorical)?,
        })
    }

    /// Transform a frame into row-major features. Columns the transformer was
    /// not fitted on are dropped.
    pub fn transform(&self, frame: &DataFrame) -> Result<Vec<Vec<f64>>> {
        let numeric = numeric_inputs(frame, &self.numeric.columns)?;
        let text = text_inputs(frame, &self.categorical.columns)?;

        let width = self.output_width();
        let rows = (0..frame.n_rows())
            .map(|row| {
                let mut out = Vec::with_capacity(width);
                for (j, col) in numeric.iter().enumerate() {
                    let imputed = self.numeric.imputer.transform(j, col[row]);
                    out.push(self.numeric.scaler.transform(j, imputed));
                }
                for (j, col) in text.iter().enumerate() {
                    let imputed = self.categorical.imputer.transform(j, col[row].as_deref());
                    self.categorical.encoder.encode_into(j, imputed, &mut out);
                }
                out
            })
            .collect();
        Ok(rows)
    }

    pub fn fit_transform(
        frame: &DataFrame,
        numeric: &[String],
        categorical: &[String],
    ) -> Result<(Self, Vec<Vec<f64>>)> {
        let transformer = Self::fit(frame, numeric, categorical)?;
        let rows = transformer.transform(frame)?;
        Ok((transformer, rows))
    }

    /// Width of a transformed row
    pub fn output_width(&self) -> usize {
        self.numeric.columns.len() + self.categorical.encoder.width()
    }

    /// Names of the transformed columns, e.g. `num__ndvi`, `cat__soil_type_loam`
    pub fn feature_names_out(&self) -> Vec<String> {
        let numeric = self.numeric.columns.iter().map(|c| format!("num__{c}"));
        let categorical = self
            .categorical
            .columns
            .iter()
            .zip(self.categorical.encoder.categories())
            .flat_map(|(c, cats)| cats.iter().map(move |v| format!("cat__{c}_{v}")));
        numeric.chain(categorical).collect()
    }

    pub fn numeric_columns(&self) -> &[String] {
        &self.numeric.columns
    }

    pub fn categorical_columns(&self) -> &[String] {
        &self.categorical.columns
    }

    /// Input columns in transform order (numeric then categorical)
    pub fn input_columns(&self) -> Vec<String> {
        self.numeric
            .columns
            .iter()
            .chain(self.categorical.columns.iter())
            .cloned()
            .collect()
    }

    pub fn numeric(&self) -> &NumericPipeline {
        &self.numeric
    }

    pub fn categorical(&self) -> &CategoricalPipeline {
        &self.categorical
    }
}

fn numeric_inputs(frame: &DataFrame, columns: &[String]) -> Result<Vec<Vec<Option<f64>>>> {
    columns
        .iter()
        .map(|name| {
            frame
                .column(name)
                .map(|c| c.to_numeric())
                .ok_or_else(|| CoreError::MissingColumn(name.clone()))
        })
        .collect()
}

fn text_inputs(frame: &DataFrame, columns: &[String]) -> Result<Vec<Vec<Option<String>>>> {
    columns
        .iter()
        .map(|name| {
            frame
                .column(name)
                .map(|c| c.to_text())
                .ok_or_else(|| CoreError::MissingColumn(name.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Column;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn training_frame() -> DataFrame {
        DataFrame::new(vec![
            Column::numeric("ndvi", vec![Some(1.0), Some(3.0), None, Some(5.0)]),
            Column::text(
                "soil_type",
                vec![
                    Some("loam".to_string()),
                    Some("clay".to_string()),
                    Some("loam".to_string()),
                    None,
                ],
            ),
            Column::text("farm_id", vec![Some("a".to_string()); 4]),
        ])
        .unwrap()
    }

    #[test]
    fn test_median_imputer() {
        let imputer = MedianImputer::fit(&[vec![Some(1.0), None, Some(3.0)], vec![None]]);
        assert_eq!(imputer.statistics(), &[2.0, 0.0]);
        assert_eq!(imputer.transform(0, None), 2.0);
        assert_eq!(imputer.transform(0, Some(f64::NAN)), 2.0);
        assert_eq!(imputer.transform(0, Some(7.0)), 7.0);
    }

    #[test]
    fn test_scaler_zero_variance_uses_unit_scale() {
        let scaler = StandardScaler::fit(&[vec![4.0, 4.0, 4.0]]);
        assert_eq!(scaler.scales(), &[1.0]);
        assert_eq!(scaler.transform(0, 4.0), 0.0);
    }

    #[test]
    fn test_one_hot_unknown_is_all_zero() {
        let encoder = OneHotEncoder::fit(&[names(&["sand", "clay", "sand"])]);
        assert_eq!(encoder.categories()[0], names(&["clay", "sand"]));

        let mut out = Vec::new();
        encoder.encode_into(0, "sand", &mut out);
        assert_eq!(out, vec![0.0, 1.0]);

        out.clear();
        encoder.encode_into(0, "peat", &mut out);
        assert_eq!(out, vec![0.0, 0.0]);
    }

    #[test]
    fn test_column_transformer_layout() {
        let frame = training_frame();
        let (ct, rows) =
            ColumnTransformer::fit_transform(&frame, &names(&["ndvi"]), &names(&["soil_type"]))
                .unwrap();

        assert_eq!(ct.output_width(), 3);
        assert_eq!(
            ct.feature_names_out(),
            names(&["num__ndvi", "cat__soil_type_clay", "cat__soil_type_loam"])
        );
        // median 3.0 fills row 2; imputed column is [1,3,3,5] with mean 3
        assert_eq!(ct.numeric().imputer().statistics(), &[3.0]);
        assert_eq!(rows[2][0], 0.0);
        // missing soil_type imputes to "loam"
        assert_eq!(&rows[3][1..], &[0.0, 1.0]);
        assert_eq!(&rows[1][1..], &[1.0, 0.0]);
    }

    #[test]
    fn test_transform_requires_fitted_columns() {
        let frame = training_frame();
        let ct = ColumnTransformer::fit(&frame, &names(&["ndvi"]), &names(&["soil_type"])).unwrap();

        let partial = DataFrame::new(vec![Column::numeric("ndvi", vec![Some(2.0)])]).unwrap();
        match ct.transform(&partial) {
            Err(CoreError::MissingColumn(name)) => assert_eq!(name, "soil_type"),
            other => panic!("expected missing column error, got {other:?}"),
        }
    }

    #[test]
    fn test_fit_on_empty_frame_fails() {
        let frame = DataFrame::new(vec![Column::numeric("ndvi", vec![])]).unwrap();
        assert!(ColumnTransformer::fit(&frame, &names(&["ndvi"]), &[]).is_err());
    }
}
