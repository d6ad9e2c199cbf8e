//! In-memory row mutations and the batch that carries them to the cluster.

use crate::schema::ColumnFamily;

/// Columns to write to one row of one column family.
///
/// Column order is insertion order. Writing a column twice keeps its
/// original position and replaces the value, so the last write wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowMutation {
    column_family: String,
    key: String,
    columns: Vec<(String, String)>,
}

impl RowMutation {
    fn new(column_family: &ColumnFamily, key: String) -> Self {
        RowMutation {
            column_family: column_family.name().to_owned(),
            key,
            columns: Vec::new(),
        }
    }

    /// Adds (or overwrites) a column. Returns `self` so calls can be chained.
    pub fn put_column(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let name = name.into();
        let value = value.into();
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.columns.push((name, value)),
        }
        self
    }

    /// Column family the row belongs to.
    pub fn column_family(&self) -> &str {
        &self.column_family
    }

    /// Row key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Column name/value pairs in insertion order.
    pub fn columns(&self) -> &[(String, String)] {
        &self.columns
    }

    /// True if no column was put.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Row mutations submitted together in a single request.
///
/// Rows are applied independently by the cluster; there is no atomicity
/// across rows.
///
/// # Example
/// ```
/// # use quickstart::mutation::MutationBatch;
/// # use quickstart::schema::ColumnFamily;
/// let cf = ColumnFamily::new_string_family("Standard1").unwrap();
/// let mut batch = MutationBatch::new("Keyspace0");
/// batch
///     .with_row(&cf, "1234")
///     .put_column("Column1", "X")
///     .put_column("Column2", "X");
/// assert_eq!(batch.cell_count(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationBatch {
    keyspace: String,
    rows: Vec<RowMutation>,
}

impl MutationBatch {
    /// Empty batch targeting `keyspace`.
    pub fn new(keyspace: impl Into<String>) -> Self {
        MutationBatch {
            keyspace: keyspace.into(),
            rows: Vec::new(),
        }
    }

    /// Mutation for `key` in `column_family`, created on first use.
    ///
    /// Asking twice for the same row returns the same mutation.
    pub fn with_row(
        &mut self,
        column_family: &ColumnFamily,
        key: impl Into<String>,
    ) -> &mut RowMutation {
        let key = key.into();
        let position = self
            .rows
            .iter()
            .position(|row| row.key == key && row.column_family == column_family.name());

        let index = match position {
            Some(index) => index,
            None => {
                self.rows.push(RowMutation::new(column_family, key));
                self.rows.len() - 1
            }
        };
        &mut self.rows[index]
    }

    /// Target keyspace.
    pub fn keyspace(&self) -> &str {
        &self.keyspace
    }

    /// Row mutations in insertion order.
    pub fn rows(&self) -> &[RowMutation] {
        &self.rows
    }

    /// Number of rows that have at least one column.
    pub fn row_count(&self) -> usize {
        self.rows.iter().filter(|row| !row.is_empty()).count()
    }

    /// Total number of columns across all rows.
    pub fn cell_count(&self) -> usize {
        self.rows.iter().map(|row| row.columns.len()).sum()
    }

    /// True if executing the batch would write nothing.
    pub fn is_empty(&self) -> bool {
        self.cell_count() == 0
    }

    /// Every written cell as `(column family, key, column, value)`.
    pub fn cells(&self) -> impl Iterator<Item = (&str, &str, &str, &str)> {
        self.rows.iter().flat_map(|row| {
            row.columns.iter().map(move |(name, value)| {
                (
                    row.column_family.as_str(),
                    row.key.as_str(),
                    name.as_str(),
                    value.as_str(),
                )
            })
        })
    }
}
