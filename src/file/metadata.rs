// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Decoded file, row group and column chunk metadata. The Thrift footer
//! parser is an external collaborator that fills these structs in; this
//! crate only consumes them.

use crate::basic::{Compression, Encoding, Type};
use crate::errors::Result;
use crate::file::statistics::Statistics;
use crate::schema::types::{ColumnPath, SchemaDescPtr};

/// Everything the footer declares about one file.
pub struct ParquetMetaData {
  file_metadata: FileMetaData,
  row_groups: Vec<RowGroupMetaData>
}

impl ParquetMetaData {
  pub fn new(file_metadata: FileMetaData, row_groups: Vec<RowGroupMetaData>) -> Self {
    ParquetMetaData { file_metadata, row_groups }
  }

  pub fn file_metadata(&self) -> &FileMetaData {
    &self.file_metadata
  }

  pub fn num_row_groups(&self) -> usize {
    self.row_groups.len()
  }

  pub fn row_group(&self, i: usize) -> &RowGroupMetaData {
    &self.row_groups[i]
  }

  pub fn row_groups(&self) -> &[RowGroupMetaData] {
    &self.row_groups
  }
}

/// File-level metadata.
pub struct FileMetaData {
  version: i32,
  num_rows: i64,
  created_by: Option<String>,
  schema_descr: SchemaDescPtr
}

impl FileMetaData {
  pub fn new(
    version: i32,
    num_rows: i64,
    created_by: Option<String>,
    schema_descr: SchemaDescPtr
  ) -> Self {
    FileMetaData { version, num_rows, created_by, schema_descr }
  }

  pub fn version(&self) -> i32 {
    self.version
  }

  pub fn num_rows(&self) -> i64 {
    self.num_rows
  }

  pub fn created_by(&self) -> Option<&str> {
    self.created_by.as_deref()
  }

  pub fn schema_descr(&self) -> &SchemaDescPtr {
    &self.schema_descr
  }
}

/// Metadata for one row group.
pub struct RowGroupMetaData {
  columns: Vec<ColumnChunkMetaData>,
  num_rows: i64,
  total_byte_size: i64
}

impl RowGroupMetaData {
  pub fn new(columns: Vec<ColumnChunkMetaData>, num_rows: i64, total_byte_size: i64) -> Self {
    RowGroupMetaData { columns, num_rows, total_byte_size }
  }

  pub fn num_columns(&self) -> usize {
    self.columns.len()
  }

  pub fn column(&self, i: usize) -> &ColumnChunkMetaData {
    &self.columns[i]
  }

  pub fn columns(&self) -> &[ColumnChunkMetaData] {
    &self.columns
  }

  pub fn num_rows(&self) -> i64 {
    self.num_rows
  }

  pub fn total_byte_size(&self) -> i64 {
    self.total_byte_size
  }
}

/// Metadata for one column chunk.
pub struct ColumnChunkMetaData {
  column_type: Type,
  column_path: ColumnPath,
  encodings: Vec<Encoding>,
  file_path: Option<String>,
  num_values: i64,
  compression: Compression,
  total_compressed_size: i64,
  total_uncompressed_size: i64,
  data_page_offset: i64,
  index_page_offset: Option<i64>,
  dictionary_page_offset: Option<i64>,
  statistics: Option<Statistics>
}

impl ColumnChunkMetaData {
  pub fn builder(column_type: Type, column_path: ColumnPath) -> ColumnChunkMetaDataBuilder {
    ColumnChunkMetaDataBuilder::new(column_type, column_path)
  }

  /// Type of this column. Must be primitive.
  pub fn column_type(&self) -> Type {
    self.column_type
  }

  /// Path of this column in the schema.
  pub fn column_path(&self) -> &ColumnPath {
    &self.column_path
  }

  /// All encodings used for this column.
  pub fn encodings(&self) -> &[Encoding] {
    &self.encodings
  }

  /// File where the column chunk is stored, relative to the current file;
  /// when unset the chunk lives in the same file as the metadata.
  pub fn file_path(&self) -> Option<&str> {
    self.file_path.as_deref()
  }

  /// Total number of level slots in this column chunk.
  pub fn num_values(&self) -> i64 {
    self.num_values
  }

  pub fn compression(&self) -> Compression {
    self.compression
  }

  pub fn compressed_size(&self) -> i64 {
    self.total_compressed_size
  }

  pub fn uncompressed_size(&self) -> i64 {
    self.total_uncompressed_size
  }

  /// Offset of the first data page.
  pub fn data_page_offset(&self) -> i64 {
    self.data_page_offset
  }

  pub fn has_index_page(&self) -> bool {
    self.index_page_offset.is_some()
  }

  pub fn index_page_offset(&self) -> Option<i64> {
    self.index_page_offset
  }

  pub fn has_dictionary_page(&self) -> bool {
    self.dictionary_page_offset.is_some()
  }

  pub fn dictionary_page_offset(&self) -> Option<i64> {
    self.dictionary_page_offset
  }

  /// Chunk statistics; absence is not an error.
  pub fn statistics(&self) -> Option<&Statistics> {
    self.statistics.as_ref()
  }

  /// Byte offset where reading this chunk starts: the dictionary page when
  /// it precedes the first data page.
  pub fn start_offset(&self) -> i64 {
    match self.dictionary_page_offset {
      Some(offset) if offset < self.data_page_offset => offset,
      _ => self.data_page_offset
    }
  }
}

/// Builder for [`ColumnChunkMetaData`], the shape the footer collaborator
/// fills in.
pub struct ColumnChunkMetaDataBuilder {
  inner: ColumnChunkMetaData
}

impl ColumnChunkMetaDataBuilder {
  fn new(column_type: Type, column_path: ColumnPath) -> Self {
    Self {
      inner: ColumnChunkMetaData {
        column_type,
        column_path,
        encodings: vec![],
        file_path: None,
        num_values: 0,
        compression: Compression::UNCOMPRESSED,
        total_compressed_size: 0,
        total_uncompressed_size: 0,
        data_page_offset: 0,
        index_page_offset: None,
        dictionary_page_offset: None,
        statistics: None
      }
    }
  }

  pub fn set_encodings(mut self, encodings: Vec<Encoding>) -> Self {
    self.inner.encodings = encodings;
    self
  }

  pub fn set_file_path(mut self, path: String) -> Self {
    self.inner.file_path = Some(path);
    self
  }

  pub fn set_num_values(mut self, num_values: i64) -> Self {
    self.inner.num_values = num_values;
    self
  }

  pub fn set_compression(mut self, compression: Compression) -> Self {
    self.inner.compression = compression;
    self
  }

  pub fn set_total_compressed_size(mut self, size: i64) -> Self {
    self.inner.total_compressed_size = size;
    self
  }

  pub fn set_total_uncompressed_size(mut self, size: i64) -> Self {
    self.inner.total_uncompressed_size = size;
    self
  }

  pub fn set_data_page_offset(mut self, offset: i64) -> Self {
    self.inner.data_page_offset = offset;
    self
  }

  pub fn set_index_page_offset(mut self, offset: i64) -> Self {
    self.inner.index_page_offset = Some(offset);
    self
  }

  pub fn set_dictionary_page_offset(mut self, offset: Option<i64>) -> Self {
    self.inner.dictionary_page_offset = offset;
    self
  }

  pub fn set_statistics(mut self, statistics: Option<Statistics>) -> Self {
    self.inner.statistics = statistics;
    self
  }

  pub fn build(self) -> Result<ColumnChunkMetaData> {
    if self.inner.num_values < 0 {
      return Err(schema_err!(
        "Column {} declares {} values", self.inner.column_path, self.inner.num_values));
    }
    Ok(self.inner)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::basic::{LogicalType, Type as PhysicalType};
  use crate::schema::types::{data_field, message_type, SchemaDescriptor};
  use std::rc::Rc;

  #[test]
  fn test_metadata_accessors() {
    let field = data_field("v", PhysicalType::INT32, LogicalType::NONE, true).unwrap();
    let schema =
      Rc::new(SchemaDescriptor::new(message_type("s", vec![field]).unwrap()));

    let chunk = ColumnChunkMetaData::builder(
      PhysicalType::INT32, ColumnPath::from_dotted("v"))
      .set_encodings(vec![Encoding::RLE, Encoding::PLAIN])
      .set_num_values(10)
      .set_compression(Compression::SNAPPY)
      .set_data_page_offset(100)
      .set_dictionary_page_offset(Some(40))
      .build()
      .unwrap();
    assert_eq!(chunk.column_type(), PhysicalType::INT32);
    assert_eq!(chunk.num_values(), 10);
    assert_eq!(chunk.compression(), Compression::SNAPPY);
    assert!(chunk.has_dictionary_page());
    // the dictionary page precedes the data pages, reading starts there
    assert_eq!(chunk.start_offset(), 40);
    assert!(chunk.statistics().is_none());

    let row_group = RowGroupMetaData::new(vec![chunk], 10, 1024);
    assert_eq!(row_group.num_columns(), 1);
    assert_eq!(row_group.num_rows(), 10);
    assert_eq!(row_group.total_byte_size(), 1024);

    let file = FileMetaData::new(1, 10, Some("parq".to_owned()), schema);
    let metadata = ParquetMetaData::new(file, vec![row_group]);
    assert_eq!(metadata.num_row_groups(), 1);
    assert_eq!(metadata.file_metadata().num_rows(), 10);
    assert_eq!(metadata.file_metadata().created_by(), Some("parq"));
    assert_eq!(metadata.row_group(0).column(0).column_path().string(), "v");
  }
}
