// src/table.rs

use std::fmt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use log::debug;
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, Axis};
use rayon::prelude::*;
use serde::Serialize;

use crate::error::{Result, SpectraError};
use crate::preprocessing::nearest_index;

/// A two-dimensional table of `f64` values with a label for every row and column.
///
/// This is the shape of every derived view produced by [`crate::Pca`]:
/// explained variance (statistic × component), loadings (feature × component)
/// and scores (sample × component).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledTable {
    index: Vec<String>,
    columns: Vec<String>,
    values: Array2<f64>,
}

impl LabeledTable {
    /// Creates a table, checking that there is exactly one label per row and per column.
    pub fn new(index: Vec<String>, columns: Vec<String>, values: Array2<f64>) -> Result<Self> {
        if index.len() != values.nrows() || columns.len() != values.ncols() {
            return Err(SpectraError::invalid(format!(
                "table labels ({} rows, {} columns) do not match values of shape {:?}",
                index.len(),
                columns.len(),
                values.dim()
            )));
        }
        Ok(Self { index, columns, values })
    }

    /// For views whose labels are derived from `values` itself.
    pub(crate) fn from_parts(index: Vec<String>, columns: Vec<String>, values: Array2<f64>) -> Self {
        debug_assert_eq!((index.len(), columns.len()), values.dim());
        Self { index, columns, values }
    }

    /// Row labels, in row order.
    pub fn index(&self) -> &[String] {
        &self.index
    }

    /// Column labels, in column order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    pub fn into_values(self) -> Array2<f64> {
        self.values
    }

    /// `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        self.values.dim()
    }

    /// Value at the given row and column labels, if both exist.
    pub fn get(&self, row: &str, column: &str) -> Option<f64> {
        let i = self.row_position(row)?;
        let j = self.column_position(column)?;
        Some(self.values[[i, j]])
    }

    pub fn row(&self, label: &str) -> Option<ArrayView1<'_, f64>> {
        self.row_position(label).map(|i| self.values.row(i))
    }

    pub fn column(&self, label: &str) -> Option<ArrayView1<'_, f64>> {
        self.column_position(label).map(|j| self.values.column(j))
    }

    fn row_position(&self, label: &str) -> Option<usize> {
        self.index.iter().position(|l| l == label)
    }

    fn column_position(&self, label: &str) -> Option<usize> {
        self.columns.iter().position(|l| l == label)
    }

    /// Writes the table as CSV: a header row (empty corner cell followed by the
    /// column labels) and one record per row, led by its row label.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        let mut header = Vec::with_capacity(self.columns.len() + 1);
        header.push(String::new());
        header.extend(self.columns.iter().cloned());
        csv_writer.write_record(&header)?;

        for (label, row) in self.index.iter().zip(self.values.rows()) {
            let mut record = Vec::with_capacity(row.len() + 1);
            record.push(label.clone());
            record.extend(row.iter().map(|v| v.to_string()));
            csv_writer.write_record(&record)?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

impl fmt::Display for LabeledTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<Vec<String>> = self
            .values
            .rows()
            .into_iter()
            .map(|row| row.iter().map(|v| format!("{:.6}", v)).collect())
            .collect();

        let index_width = self.index.iter().map(String::len).max().unwrap_or(0);
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(j, label)| {
                cells
                    .iter()
                    .map(|row| row[j].len())
                    .chain(std::iter::once(label.len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        write!(f, "{:index_width$}", "")?;
        for (label, width) in self.columns.iter().zip(&widths) {
            write!(f, "  {:>width$}", label, width = *width)?;
        }
        writeln!(f)?;

        for (label, row) in self.index.iter().zip(&cells) {
            write!(f, "{:<index_width$}", label)?;
            for (cell, width) in row.iter().zip(&widths) {
                write!(f, "  {:>width$}", cell, width = *width)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Spectra stored row-wise: one row per sample, one column per position on a
/// shared, ordered feature axis (e.g. Raman shift in cm⁻¹).
///
/// The column order is the feature order used by smoothing, cuts and PCA alike.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpectralTable {
    samples: Vec<String>,
    axis: Array1<f64>,
    data: Array2<f64>,
}

impl SpectralTable {
    /// Creates a table from sample labels, the feature axis and a samples × features matrix.
    ///
    /// # Errors
    /// `InvalidInput` if the number of labels or axis positions does not match `data`.
    pub fn new(samples: Vec<String>, axis: Array1<f64>, data: Array2<f64>) -> Result<Self> {
        if samples.len() != data.nrows() {
            return Err(SpectraError::invalid(format!(
                "{} sample labels given for {} spectra",
                samples.len(),
                data.nrows()
            )));
        }
        if axis.len() != data.ncols() {
            return Err(SpectraError::invalid(format!(
                "feature axis has {} positions but spectra have {} features",
                axis.len(),
                data.ncols()
            )));
        }
        Ok(Self { samples, axis, data })
    }

    /// Reads a table from CSV.
    ///
    /// The header row holds the index name followed by the numeric feature axis;
    /// each record holds a sample label followed by that sample's intensities.
    ///
    /// ```text
    /// sample,200.0,201.5,203.0
    /// A,0.12,0.15,0.11
    /// B,0.10,0.19,0.13
    /// ```
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        if headers.len() < 2 {
            return Err(SpectraError::invalid(
                "CSV needs an index column and at least one feature column",
            ));
        }
        let axis = headers
            .iter()
            .skip(1)
            .enumerate()
            .map(|(j, header)| {
                header.parse::<f64>().map_err(|_| {
                    SpectraError::invalid(format!(
                        "feature header {} ('{}') is not numeric",
                        j + 1,
                        header
                    ))
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        let mut samples = Vec::new();
        let mut values = Vec::new();
        for (i, record) in csv_reader.records().enumerate() {
            let record = record?;
            let label = record.get(0).unwrap_or_default().to_string();
            for (j, cell) in record.iter().skip(1).enumerate() {
                let value = cell.parse::<f64>().map_err(|_| {
                    SpectraError::invalid(format!(
                        "row {} ('{}'), feature {}: '{}' is not a number",
                        i + 1,
                        label,
                        j + 1,
                        cell
                    ))
                })?;
                values.push(value);
            }
            samples.push(label);
        }

        let data = Array2::from_shape_vec((samples.len(), axis.len()), values)?;
        debug!(
            "Read spectral table with {} samples and {} features.",
            data.nrows(),
            data.ncols()
        );
        Self::new(samples, Array1::from(axis), data)
    }

    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_csv_reader(file)
    }

    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn axis(&self) -> ArrayView1<'_, f64> {
        self.axis.view()
    }

    pub fn data(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    pub fn n_samples(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.data.ncols()
    }

    /// True when there are no samples or no features.
    pub fn is_empty(&self) -> bool {
        self.n_samples() == 0 || self.n_features() == 0
    }

    /// Applies `transform` to every spectrum and returns the transformed table.
    ///
    /// Rows are processed in parallel and reassembled in their original order.
    /// The transform must keep the spectrum length, since the feature axis is shared.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use spectral_pca::preprocessing::{smoothing, SmoothingMode};
    /// # fn run(table: &spectral_pca::SpectralTable) -> spectral_pca::Result<()> {
    /// let smoothed = table.map_spectra(|y| smoothing(y, 11, 3, 0, SmoothingMode::Interp))?;
    /// # Ok(()) }
    /// ```
    pub fn map_spectra<F>(&self, transform: F) -> Result<Self>
    where
        F: Fn(ArrayView1<'_, f64>) -> Result<Array1<f64>> + Sync,
    {
        let n_features = self.n_features();
        let rows = self
            .data
            .axis_iter(Axis(0))
            .into_par_iter()
            .map(|row| transform(row))
            .collect::<Result<Vec<Array1<f64>>>>()?;

        let mut data = Array2::zeros((self.n_samples(), n_features));
        for (i, (mut target, row)) in data.rows_mut().into_iter().zip(&rows).enumerate() {
            if row.len() != n_features {
                return Err(SpectraError::invalid(format!(
                    "transform changed the length of spectrum '{}' from {} to {}",
                    self.samples[i],
                    n_features,
                    row.len()
                )));
            }
            target.assign(row);
        }

        Ok(Self {
            samples: self.samples.clone(),
            axis: self.axis.clone(),
            data,
        })
    }

    /// Keeps the features between the axis positions nearest to `start` and `end`
    /// (end exclusive).
    pub fn cut(&self, start: f64, end: f64) -> Result<Self> {
        let lo = nearest_index(self.axis.view(), start)
            .ok_or_else(|| SpectraError::invalid("cannot cut a table with no features"))?;
        let hi = nearest_index(self.axis.view(), end)
            .ok_or_else(|| SpectraError::invalid("cannot cut a table with no features"))?;
        Ok(self.icut(lo, hi))
    }

    /// Keeps features `start..end` by position. Out-of-range bounds are clamped.
    pub fn icut(&self, start: usize, end: usize) -> Self {
        let end = end.min(self.n_features());
        let start = start.min(end);
        Self {
            samples: self.samples.clone(),
            axis: self.axis.slice(s![start..end]).to_owned(),
            data: self.data.slice(s![.., start..end]).to_owned(),
        }
    }

    /// The spectra as a [`LabeledTable`] with the axis positions as column labels.
    pub fn to_table(&self) -> LabeledTable {
        LabeledTable::from_parts(
            self.samples.clone(),
            axis_labels(self.axis.view()),
            self.data.clone(),
        )
    }
}

pub(crate) fn axis_labels(axis: ArrayView1<'_, f64>) -> Vec<String> {
    axis.iter().map(|v| v.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn small_table() -> SpectralTable {
        SpectralTable::new(
            vec!["a".into(), "b".into()],
            array![100.0, 110.0, 120.0, 130.0],
            array![[1.0, 2.0, 3.0, 4.0], [5.0, 6.0, 7.0, 8.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_mismatched_labels() {
        let result = SpectralTable::new(vec!["a".into()], array![1.0, 2.0], array![[1.0, 2.0], [3.0, 4.0]]);
        assert!(matches!(result, Err(SpectraError::InvalidInput(_))));

        let result = SpectralTable::new(vec!["a".into(), "b".into()], array![1.0], array![[1.0, 2.0], [3.0, 4.0]]);
        assert!(matches!(result, Err(SpectraError::InvalidInput(_))));
    }

    #[test]
    fn test_from_csv_reader_parses_axis_and_rows() {
        let text = "sample,200,201.5,203\nA,0.1,0.2,0.3\nB,1.0,2.0,3.0\n";
        let table = SpectralTable::from_csv_reader(text.as_bytes()).unwrap();
        assert_eq!(table.samples(), &["A".to_string(), "B".to_string()]);
        assert_eq!(table.axis(), array![200.0, 201.5, 203.0].view());
        assert_eq!(table.data().row(1), array![1.0, 2.0, 3.0].view());
    }

    #[test]
    fn test_from_csv_reader_rejects_non_numeric_header() {
        let text = "sample,200,abc\nA,0.1,0.2\n";
        let result = SpectralTable::from_csv_reader(text.as_bytes());
        assert!(matches!(result, Err(SpectraError::InvalidInput(_))));
    }

    #[test]
    fn test_from_csv_reader_passes_through_ragged_rows() {
        let text = "sample,200,201\nA,0.1,0.2\nB,0.3\n";
        let result = SpectralTable::from_csv_reader(text.as_bytes());
        assert!(matches!(result, Err(SpectraError::Csv(_))));
    }

    #[test]
    fn test_map_spectra_preserves_order_and_labels() {
        let table = small_table();
        let doubled = table.map_spectra(|row| Ok(row.mapv(|v| v * 2.0))).unwrap();
        assert_eq!(doubled.samples(), table.samples());
        assert_eq!(doubled.axis(), table.axis());
        assert_eq!(doubled.data(), array![[2.0, 4.0, 6.0, 8.0], [10.0, 12.0, 14.0, 16.0]].view());
    }

    #[test]
    fn test_map_spectra_rejects_length_change() {
        let table = small_table();
        let result = table.map_spectra(|row| Ok(row.slice(s![..2]).to_owned()));
        assert!(matches!(result, Err(SpectraError::InvalidInput(_))));
    }

    #[test]
    fn test_cut_and_icut_on_feature_axis() {
        let table = small_table();
        let cut = table.cut(108.0, 131.0).unwrap();
        assert_eq!(cut.axis(), array![110.0, 120.0].view());
        assert_eq!(cut.data(), array![[2.0, 3.0], [6.0, 7.0]].view());

        let clamped = table.icut(2, 99);
        assert_eq!(clamped.axis(), array![120.0, 130.0].view());

        let empty = table.icut(3, 1);
        assert_eq!(empty.n_features(), 0);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_labeled_table_lookup_and_csv() {
        let table = small_table().to_table();
        assert_eq!(table.shape(), (2, 4));
        assert_eq!(table.get("b", "120"), Some(7.0));
        assert_eq!(table.get("c", "120"), None);
        assert_eq!(table.column("110").unwrap(), array![2.0, 6.0].view());

        let mut buffer = Vec::new();
        table.write_csv(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text.lines().next().unwrap(), ",100,110,120,130");
        assert_eq!(text.lines().nth(1).unwrap(), "a,1,2,3,4");
    }

    #[test]
    fn test_labeled_table_display_aligns_columns() {
        let table = LabeledTable::new(
            vec!["x".into(), "longer".into()],
            vec!["PC1".into()],
            array![[1.0], [-2.5]],
        )
        .unwrap();
        let rendered = table.to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("x     "));
        assert!(lines[2].ends_with("-2.500000"));
        assert_eq!(lines[1].len(), lines[2].len());
    }
}
