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

//! Row group reading over a page-producing byte source. Physical I/O and
//! page-header framing live behind [`ChunkSource`]; this layer decompresses
//! page payloads, drives the typed column readers and hands out
//! [`DataColumn`]s or assembled records.

use log::debug;

use crate::basic::Compression;
use crate::column::page::{InMemoryPageReader, Page, PageReader};
use crate::column::reader::ColumnReaderImpl;
use crate::column::{DataColumn, ColumnData};
use crate::compression::{create_codec, Codec};
use crate::data_type::*;
use crate::errors::Result;
use crate::file::metadata::ParquetMetaData;
use crate::record::api::{ReaderOptions, Row};
use crate::record::assembler::assemble_row_group;
use crate::schema::types::{ColumnDescPtr, ColumnPath, SchemaDescriptor};
use crate::util::memory::{buffer_pool, ByteBufferPtr};

/// Number of level slots requested from the column reader per call.
const DEFAULT_READ_BATCH_SIZE: usize = 1024;

/// The byte-source collaborator: yields the framed pages of one column
/// chunk, in file order. Implementations must start at the dictionary page
/// offset whenever the chunk metadata places it before the first data page.
pub trait ChunkSource {
  fn chunk_pages(&self, row_group: usize, column: usize) -> Result<Box<dyn PageReader>>;
}

/// A chunk source over pages held in memory, `[row group][column]`.
pub struct InMemoryChunkSource {
  row_groups: Vec<Vec<Vec<Page>>>
}

impl InMemoryChunkSource {
  pub fn new() -> Self {
    Self { row_groups: vec![] }
  }

  pub fn push_row_group(&mut self, chunks: Vec<Vec<Page>>) {
    self.row_groups.push(chunks);
  }
}

impl Default for InMemoryChunkSource {
  fn default() -> Self {
    Self::new()
  }
}

impl ChunkSource for InMemoryChunkSource {
  fn chunk_pages(&self, row_group: usize, column: usize) -> Result<Box<dyn PageReader>> {
    let pages = self
      .row_groups
      .get(row_group)
      .and_then(|chunks| chunks.get(column))
      .ok_or_else(|| {
        schema_err!("No chunk for row group {}, column {}", row_group, column)
      })?;
    Ok(Box::new(InMemoryPageReader::new(pages.clone())))
  }
}

// ----------------------------------------------------------------------
// Page decompression

/// Wraps a page reader, decompressing each payload through the process-wide
/// scratch buffer pool. Buffers are rented for the scope of one page and
/// returned on every exit path.
struct DecompressingPageReader {
  inner: Box<dyn PageReader>,
  codec: Option<Box<dyn Codec>>
}

impl DecompressingPageReader {
  fn new(inner: Box<dyn PageReader>, compression: Compression) -> Result<Self> {
    Ok(Self { inner, codec: create_codec(compression)? })
  }

  fn decompress(&mut self, data: &[u8]) -> Result<Vec<u8>> {
    let codec = self.codec.as_mut().expect("checked by the caller");
    let mut scratch = buffer_pool().rent(data.len() * 2);
    let result = codec.decompress(data, &mut scratch);
    let output = result.map(|written| scratch[..written].to_vec());
    buffer_pool().put_back(scratch);
    output
  }
}

impl PageReader for DecompressingPageReader {
  fn get_next_page(&mut self) -> Result<Option<Page>> {
    let page = match self.inner.get_next_page()? {
      Some(page) => page,
      None => return Ok(None)
    };
    if self.codec.is_none() {
      return Ok(Some(page));
    }
    let page = match page {
      Page::DataPage {
        buf, num_values, encoding, def_level_encoding, rep_level_encoding, statistics
      } => Page::DataPage {
        buf: ByteBufferPtr::new(self.decompress(buf.as_ref())?),
        num_values,
        encoding,
        def_level_encoding,
        rep_level_encoding,
        statistics
      },
      Page::DataPageV2 {
        buf, num_values, encoding, num_nulls, num_rows,
        def_levels_byte_len, rep_levels_byte_len, is_compressed, statistics
      } => {
        if is_compressed {
          // v2 level streams stay uncompressed; only the values follow the
          // chunk codec
          let split = (rep_levels_byte_len + def_levels_byte_len) as usize;
          if split > buf.len() {
            return Err(malformed_err!(
              "Data page v2 level streams of {} bytes exceed the page of {} bytes",
              split, buf.len()));
          }
          let mut output = buf.as_ref()[..split].to_vec();
          output.extend_from_slice(&self.decompress(&buf.as_ref()[split..])?);
          Page::DataPageV2 {
            buf: ByteBufferPtr::new(output),
            num_values,
            encoding,
            num_nulls,
            num_rows,
            def_levels_byte_len,
            rep_levels_byte_len,
            is_compressed: false,
            statistics
          }
        } else {
          Page::DataPageV2 {
            buf, num_values, encoding, num_nulls, num_rows,
            def_levels_byte_len, rep_levels_byte_len, is_compressed, statistics
          }
        }
      }
      Page::DictionaryPage { buf, num_values, encoding, is_sorted } => {
        Page::DictionaryPage {
          buf: ByteBufferPtr::new(self.decompress(buf.as_ref())?),
          num_values,
          encoding,
          is_sorted
        }
      }
    };
    Ok(Some(page))
  }
}

// ----------------------------------------------------------------------
// File reader

/// Reads row groups and columns given decoded metadata and a chunk source.
/// One reader instance is single-threaded; independent readers may run in
/// parallel sharing only the immutable schema.
pub struct FileReader<S: ChunkSource> {
  metadata: ParquetMetaData,
  source: S,
  options: ReaderOptions
}

impl<S: ChunkSource> FileReader<S> {
  pub fn new(metadata: ParquetMetaData, source: S) -> Result<Self> {
    Self::with_options(metadata, source, ReaderOptions::default())
  }

  pub fn with_options(
    metadata: ParquetMetaData,
    source: S,
    options: ReaderOptions
  ) -> Result<Self> {
    let num_leaves = metadata.file_metadata().schema_descr().num_columns();
    for (i, row_group) in metadata.row_groups().iter().enumerate() {
      if row_group.num_columns() != num_leaves {
        return Err(schema_err!(
          "Row group {} has {} column chunks but the schema has {} leaves",
          i, row_group.num_columns(), num_leaves));
      }
    }
    Ok(Self { metadata, source, options })
  }

  pub fn metadata(&self) -> &ParquetMetaData {
    &self.metadata
  }

  pub fn schema(&self) -> &SchemaDescriptor {
    self.metadata.file_metadata().schema_descr()
  }

  pub fn num_row_groups(&self) -> usize {
    self.metadata.num_row_groups()
  }

  /// Read all leaf columns of row group `i`, in document order.
  pub fn read_row_group(&self, i: usize) -> Result<Vec<DataColumn>> {
    self.check_row_group(i)?;
    debug!("reading row group {} with {} columns", i, self.schema().num_columns());
    let mut columns = Vec::with_capacity(self.schema().num_columns());
    for column in 0..self.schema().num_columns() {
      columns.push(self.read_chunk(i, column)?);
    }
    Ok(columns)
  }

  /// Read one leaf column of row group `i` by its path.
  pub fn read_column(&self, i: usize, path: &ColumnPath) -> Result<DataColumn> {
    self.check_row_group(i)?;
    let column = self
      .schema()
      .index_by_path(path)
      .ok_or_else(|| schema_err!("Schema has no leaf at path {}", path))?;
    self.read_chunk(i, column)
  }

  /// Read row group `i` and assemble its records.
  pub fn read_row_group_records(&self, i: usize) -> Result<Vec<Row>> {
    let columns = self.read_row_group(i)?;
    let num_rows = self.metadata.row_group(i).num_rows() as usize;
    assemble_row_group(self.schema(), &columns, num_rows, &self.options)
  }

  fn check_row_group(&self, i: usize) -> Result<()> {
    if i >= self.metadata.num_row_groups() {
      return Err(schema_err!(
        "Row group index {} out of range, the file has {}",
        i, self.metadata.num_row_groups()));
    }
    Ok(())
  }

  fn read_chunk(&self, row_group: usize, column: usize) -> Result<DataColumn> {
    let chunk_meta = self.metadata.row_group(row_group).column(column);
    let descr = self.schema().column(column);
    if chunk_meta.column_type() != descr.physical_type() {
      return Err(type_err!(
        "Chunk for column {} declares {}, the schema says {}",
        descr.path(), chunk_meta.column_type(), descr.physical_type()));
    }

    let pages = self.source.chunk_pages(row_group, column)?;
    let pages: Box<dyn PageReader> =
      Box::new(DecompressingPageReader::new(pages, chunk_meta.compression())?);
    let total_slots = chunk_meta.num_values() as usize;

    match descr.physical_type() {
      crate::basic::Type::BOOLEAN =>
        read_typed_column::<BoolType>(descr, pages, total_slots),
      crate::basic::Type::INT32 =>
        read_typed_column::<Int32Type>(descr, pages, total_slots),
      crate::basic::Type::INT64 =>
        read_typed_column::<Int64Type>(descr, pages, total_slots),
      crate::basic::Type::INT96 =>
        read_typed_column::<Int96Type>(descr, pages, total_slots),
      crate::basic::Type::FLOAT =>
        read_typed_column::<FloatType>(descr, pages, total_slots),
      crate::basic::Type::DOUBLE =>
        read_typed_column::<DoubleType>(descr, pages, total_slots),
      crate::basic::Type::BYTE_ARRAY =>
        read_typed_column::<ByteArrayType>(descr, pages, total_slots),
      crate::basic::Type::FIXED_LEN_BYTE_ARRAY =>
        read_typed_column::<FixedLenByteArrayType>(descr, pages, total_slots)
    }
  }
}

/// Drain one chunk through a typed column reader into a [`DataColumn`].
fn read_typed_column<T: DataType>(
  descr: ColumnDescPtr,
  pages: Box<dyn PageReader>,
  total_slots: usize
) -> Result<DataColumn> {
  let mut reader: ColumnReaderImpl<T> = ColumnReaderImpl::new(descr.clone(), pages);
  let mut values: Vec<T::T> = Vec::new();
  let mut def_levels = if descr.max_def_level() > 0 { Some(Vec::new()) } else { None };
  let mut rep_levels = if descr.max_rep_level() > 0 { Some(Vec::new()) } else { None };

  let mut slots = 0;
  loop {
    let read = reader.read_batch(
      DEFAULT_READ_BATCH_SIZE,
      def_levels.as_mut(),
      rep_levels.as_mut(),
      &mut values
    )?;
    if read == 0 {
      break;
    }
    slots += read;
  }
  if slots != total_slots {
    return Err(malformed_err!(
      "Column {} declares {} values but its pages held {}",
      descr.path(), total_slots, slots));
  }

  let data: ColumnData = T::make_column_data(values);
  DataColumn::new(descr, data, def_levels, rep_levels)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::basic::{Compression, LogicalType, Type as PhysicalType};
  use crate::column::writer::{ColumnWriterImpl, WriterProperties, WrittenChunk};
  use crate::data_type::{ByteArray, FixedLenByteArray};
  use crate::file::metadata::{ColumnChunkMetaData, FileMetaData, RowGroupMetaData};
  use crate::record::api::Row;
  use crate::schema::types::*;
  use std::rc::Rc;

  fn chunk_metadata(
    descr: &ColumnDescPtr,
    chunk: &WrittenChunk,
    compression: Compression,
    with_stats: bool
  ) -> ColumnChunkMetaData {
    let mut builder = ColumnChunkMetaData::builder(
      descr.physical_type(), descr.path().clone())
      .set_num_values(chunk.num_values)
      .set_compression(compression);
    if with_stats {
      builder = builder.set_statistics(chunk.statistics.clone());
    }
    builder.build().unwrap()
  }

  struct TestFile {
    reader: FileReader<InMemoryChunkSource>
  }

  /// Write one row group through the column writers and wrap it in a
  /// reader, as the framing and footer collaborators would.
  fn build_test_file(
    schema: SchemaDescPtr,
    chunks: Vec<WrittenChunk>,
    num_rows: i64,
    compression: Compression,
    with_stats: bool
  ) -> TestFile {
    let mut column_metadata = Vec::new();
    let mut pages = Vec::new();
    for (i, chunk) in chunks.into_iter().enumerate() {
      column_metadata.push(chunk_metadata(
        &schema.column(i), &chunk, compression, with_stats));
      pages.push(chunk.pages);
    }
    let row_group = RowGroupMetaData::new(column_metadata, num_rows, 0);
    let metadata = ParquetMetaData::new(
      FileMetaData::new(2, num_rows, Some("parq test".to_owned()), schema),
      vec![row_group]);
    let mut source = InMemoryChunkSource::new();
    source.push_row_group(pages);
    TestFile { reader: FileReader::new(metadata, source).unwrap() }
  }

  fn writer_props(compression: Compression) -> Rc<WriterProperties> {
    Rc::new(WriterProperties { compression, ..Default::default() })
  }

  #[test]
  fn test_read_row_group_fixed_len_byte_array() {
    // every column's value count must equal the declared row count
    let fields = vec![
      fixed_len_field("flba_field", LogicalType::NONE, false, 4).unwrap(),
      data_field("int_field", PhysicalType::INT64, LogicalType::NONE, false).unwrap()
    ];
    let schema = Rc::new(SchemaDescriptor::new(
      message_type("test_schema", fields).unwrap()));

    let codes: Vec<FixedLenByteArray> = ["aaaa", "bbbb", "cccc", "dddd"]
      .iter()
      .map(|s| FixedLenByteArray::from(*s))
      .collect();
    let mut flba_writer: ColumnWriterImpl<crate::data_type::FixedLenByteArrayType> =
      ColumnWriterImpl::new(schema.column(0), writer_props(Compression::UNCOMPRESSED));
    flba_writer.write_batch(&codes, None, None).unwrap();

    let ints: Vec<i64> = vec![1, 2, 3, 4];
    let mut int_writer: ColumnWriterImpl<crate::data_type::Int64Type> =
      ColumnWriterImpl::new(schema.column(1), writer_props(Compression::UNCOMPRESSED));
    int_writer.write_batch(&ints, None, None).unwrap();

    let file = build_test_file(
      schema,
      vec![flba_writer.close().unwrap(), int_writer.close().unwrap()],
      4,
      Compression::UNCOMPRESSED,
      true);

    let columns = file.reader.read_row_group(0).unwrap();
    assert_eq!(columns.len(), 2);
    for column in &columns {
      assert_eq!(column.values().len(), 4);
      assert_eq!(column.num_rows(), 4);
    }
    assert_eq!(columns[0].fixed_len_byte_array_values().unwrap(), &codes[..]);
    assert_eq!(columns[1].int64_values().unwrap(), &ints[..]);
  }

  #[test]
  fn test_read_date_column_values() {
    let fields = vec![
      data_field("pickup", PhysicalType::INT32, LogicalType::DATE, false).unwrap()
    ];
    let schema = Rc::new(SchemaDescriptor::new(
      message_type("dates", fields).unwrap()));

    // 2017-01-01 and 2017-02-01 as days since the epoch
    let days: Vec<i32> = vec![17167, 17198];
    let mut writer: ColumnWriterImpl<crate::data_type::Int32Type> =
      ColumnWriterImpl::new(schema.column(0), writer_props(Compression::UNCOMPRESSED));
    writer.write_batch(&days, None, None).unwrap();

    let file = build_test_file(
      schema, vec![writer.close().unwrap()], 2, Compression::UNCOMPRESSED, true);
    let records = file.reader.read_row_group_records(0).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(
      records[0],
      Row::Group(vec![("pickup".to_owned(), Row::Date(17167))]));
    assert_eq!(format!("{}", Row::Date(17167)), "2017-01-01 +00:00");
    assert_eq!(format!("{}", Row::Date(17198)), "2017-02-01 +00:00");
  }

  #[test]
  fn test_read_timestamp_column_values() {
    let fields = vec![
      data_field(
        "as_at_date_", PhysicalType::INT64, LogicalType::TIMESTAMP_MILLIS, true).unwrap()
    ];
    let schema = Rc::new(SchemaDescriptor::new(
      message_type("datetimes", fields).unwrap()));

    let millis: Vec<i64> = vec![1544745600000];
    let mut writer: ColumnWriterImpl<crate::data_type::Int64Type> =
      ColumnWriterImpl::new(schema.column(0), writer_props(Compression::UNCOMPRESSED));
    writer.write_batch(&millis, Some(&[1]), None).unwrap();

    let file = build_test_file(
      schema, vec![writer.close().unwrap()], 1, Compression::UNCOMPRESSED, true);
    let records = file.reader.read_row_group_records(0).unwrap();
    // 2018-12-14T00:00:00
    assert_eq!(
      records[0],
      Row::Group(vec![(
        "as_at_date_".to_owned(),
        Row::Timestamp(1544745600000)
      )]));
    assert_eq!(
      format!("{}", Row::Timestamp(1544745600000)),
      "2018-12-14 00:00:00 +00:00");
  }

  #[test]
  fn test_read_optional_values_without_statistics() {
    let fields = vec![
      data_field("id", PhysicalType::INT64, LogicalType::NONE, false).unwrap(),
      data_field("value", PhysicalType::INT64, LogicalType::NONE, true).unwrap()
    ];
    let schema = Rc::new(SchemaDescriptor::new(
      message_type("optionals", fields).unwrap()));

    let ids: Vec<i64> = vec![20908539289, 20908539290];
    let mut id_writer: ColumnWriterImpl<crate::data_type::Int64Type> =
      ColumnWriterImpl::new(schema.column(0), writer_props(Compression::UNCOMPRESSED));
    id_writer.write_batch(&ids, None, None).unwrap();

    // a present zero in row 0, a null in row 1
    let mut value_writer: ColumnWriterImpl<crate::data_type::Int64Type> =
      ColumnWriterImpl::new(schema.column(1), writer_props(Compression::UNCOMPRESSED));
    value_writer.write_batch(&[0], Some(&[1, 0]), None).unwrap();

    // statistics stripped from the metadata entirely
    let file = build_test_file(
      schema,
      vec![id_writer.close().unwrap(), value_writer.close().unwrap()],
      2,
      Compression::UNCOMPRESSED,
      false);

    assert!(file.reader.metadata().row_group(0).column(1).statistics().is_none());
    let records = file.reader.read_row_group_records(0).unwrap();
    assert_eq!(
      records[0],
      Row::Group(vec![
        ("id".to_owned(), Row::Long(20908539289)),
        ("value".to_owned(), Row::Long(0))
      ]));
    assert_eq!(
      records[1],
      Row::Group(vec![
        ("id".to_owned(), Row::Long(20908539290)),
        ("value".to_owned(), Row::Null)
      ]));
  }

  #[test]
  fn test_read_dictionary_utf8_column_snappy() {
    let fields = vec![
      data_field("label", PhysicalType::BYTE_ARRAY, LogicalType::UTF8, true).unwrap()
    ];
    let schema = Rc::new(SchemaDescriptor::new(
      message_type("labels", fields).unwrap()));

    let words = ["MOSTRUÁRIO-000", "plain", "MOSTRUÁRIO-000"];
    let values: Vec<ByteArray> = words.iter().map(|w| ByteArray::from(*w)).collect();
    let def_levels = vec![1i16, 1, 1];
    let mut writer: ColumnWriterImpl<crate::data_type::ByteArrayType> =
      ColumnWriterImpl::new(schema.column(0), writer_props(Compression::SNAPPY));
    writer.write_batch(&values, Some(&def_levels), None).unwrap();
    let chunk = writer.close().unwrap();
    // low cardinality opts into the dictionary encoding
    assert_eq!(chunk.pages[0].page_type(), crate::basic::PageType::DICTIONARY_PAGE);

    let file = build_test_file(
      schema.clone(), vec![chunk], 3, Compression::SNAPPY, true);

    let column = file
      .reader
      .read_column(0, &ColumnPath::from_dotted("label"))
      .unwrap();
    assert_eq!(
      column.byte_array_values().unwrap()[0],
      ByteArray::from("MOSTRUÁRIO-000"));

    let records = file.reader.read_row_group_records(0).unwrap();
    assert_eq!(
      records[0],
      Row::Group(vec![(
        "label".to_owned(),
        Row::Str("MOSTRUÁRIO-000".to_owned())
      )]));
  }

  #[test]
  fn test_read_column_unknown_path() {
    let fields = vec![
      data_field("v", PhysicalType::INT32, LogicalType::NONE, false).unwrap()
    ];
    let schema = Rc::new(SchemaDescriptor::new(
      message_type("s", fields).unwrap()));
    let mut writer: ColumnWriterImpl<crate::data_type::Int32Type> =
      ColumnWriterImpl::new(schema.column(0), writer_props(Compression::UNCOMPRESSED));
    writer.write_batch(&[1], None, None).unwrap();
    let file = build_test_file(
      schema, vec![writer.close().unwrap()], 1, Compression::UNCOMPRESSED, true);

    assert!(file.reader.read_column(0, &ColumnPath::from_dotted("nope")).is_err());
    assert!(file.reader.read_row_group(7).is_err());
  }

  #[test]
  fn test_row_count_mismatch_reported() {
    let fields = vec![
      data_field("v", PhysicalType::INT32, LogicalType::NONE, false).unwrap()
    ];
    let schema = Rc::new(SchemaDescriptor::new(
      message_type("s", fields).unwrap()));
    let mut writer: ColumnWriterImpl<crate::data_type::Int32Type> =
      ColumnWriterImpl::new(schema.column(0), writer_props(Compression::UNCOMPRESSED));
    writer.write_batch(&[1, 2, 3], None, None).unwrap();

    // metadata claims four rows, the chunk holds three
    let file = build_test_file(
      schema, vec![writer.close().unwrap()], 4, Compression::UNCOMPRESSED, true);
    match file.reader.read_row_group_records(0) {
      Err(crate::errors::ParquetError::LevelMismatch(_)) => {}
      other => panic!("Expected level mismatch, got {:?}", other)
    }
  }
}
