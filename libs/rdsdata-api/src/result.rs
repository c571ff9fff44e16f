use crate::convert::FromWire;
use crate::error::{EmptyResultSetError, MappingError, SingleValueError};
use crate::options::MappingOptions;
use crate::schema::Mapped;
use crate::wire::{ColumnMetadata, Row};
use crate::writer::RowWriter;

/// Columns and rows returned by one remote call.
///
/// Immutable once built. Column identity for mapping is the column label or
/// name, depending on [`MappingOptions::use_label_for_mapping`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultSet {
    columns: Vec<ColumnMetadata>,
    rows: Vec<Row>,
    records_updated: i64,
    options: MappingOptions,
}

impl ResultSet {
    pub fn new(
        columns: Vec<ColumnMetadata>,
        rows: Vec<Row>,
        records_updated: i64,
        options: MappingOptions,
    ) -> Self {
        Self {
            columns,
            rows,
            records_updated,
            options,
        }
    }

    /// Result of a call that returns no rows, such as a batch.
    pub fn empty(records_updated: i64, options: MappingOptions) -> Self {
        Self::new(Vec::new(), Vec::new(), records_updated, options)
    }

    pub fn columns(&self) -> &[ColumnMetadata] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn options(&self) -> MappingOptions {
        self.options
    }

    /// Names used to correlate columns with members, in column order.
    pub fn column_names(&self) -> Vec<String> {
        let use_label = self.options.use_label_for_mapping;
        self.columns
            .iter()
            .map(|c| c.identity(use_label).to_string())
            .collect()
    }

    pub fn number_of_records_updated(&self) -> i64 {
        self.records_updated
    }

    /// Maps the first row.
    pub fn map_to_single<T: Mapped>(&self) -> Result<T, MappingError> {
        let first = self.rows.first().ok_or(MappingError::EmptyResultSet)?;
        RowWriter::new(self.column_names(), self.options).write(first)
    }

    /// Maps every row. An empty result gives an empty list.
    pub fn map_to_list<T: Mapped>(&self) -> Result<Vec<T>, MappingError> {
        RowWriter::new(self.column_names(), self.options).write_all(&self.rows)
    }

    /// Converts the first column of the first row.
    pub fn single_value<T: FromWire>(&self) -> Result<T, SingleValueError> {
        let field = self
            .rows
            .first()
            .and_then(|row| row.get(0))
            .ok_or(EmptyResultSetError)?;
        Ok(T::from_wire(field)?)
    }
}
