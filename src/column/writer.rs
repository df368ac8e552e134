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

//! Typed column chunk writers, the inverse of the reader: given the flat
//! triple of values and levels, encode level streams and value pages and
//! emit the chunk's page sequence.

use std::cmp;
use std::rc::Rc;

use log::debug;

use crate::basic::{Compression, Encoding};
use crate::column::page::Page;
use crate::compression::{create_codec, Codec};
use crate::data_type::*;
use crate::encodings::encoding::{DictEncoder, Encoder, PlainEncoder};
use crate::encodings::levels::LevelEncoder;
use crate::errors::Result;
use crate::file::statistics::{min_max_of, Statistics};
use crate::schema::types::ColumnDescPtr;
use crate::util::memory::ByteBufferPtr;

/// Writer-side configuration.
#[derive(Debug, Clone)]
pub struct WriterProperties {
  /// Distinct-value cap to opt into dictionary encoding; zero disables
  /// dictionaries entirely.
  pub dictionary_index_threshold: usize,

  /// Target uncompressed page size in bytes.
  pub page_size_bytes: usize,

  /// Compression codec for page payloads.
  pub compression: Compression
}

impl Default for WriterProperties {
  fn default() -> Self {
    Self {
      dictionary_index_threshold: 1024,
      page_size_bytes: 1024 * 1024,
      compression: Compression::UNCOMPRESSED
    }
  }
}

pub type WriterPropertiesPtr = Rc<WriterProperties>;

/// Column writers for all physical types.
pub enum ColumnWriter {
  Bool(ColumnWriterImpl<BoolType>),
  Int32(ColumnWriterImpl<Int32Type>),
  Int64(ColumnWriterImpl<Int64Type>),
  Int96(ColumnWriterImpl<Int96Type>),
  Float(ColumnWriterImpl<FloatType>),
  Double(ColumnWriterImpl<DoubleType>),
  ByteArray(ColumnWriterImpl<ByteArrayType>),
  FixedLenByteArray(ColumnWriterImpl<FixedLenByteArrayType>)
}

/// Build a column writer for the leaf described by `descr`.
pub fn get_column_writer(descr: ColumnDescPtr, props: WriterPropertiesPtr) -> ColumnWriter {
  match descr.physical_type() {
    crate::basic::Type::BOOLEAN =>
      ColumnWriter::Bool(ColumnWriterImpl::new(descr, props)),
    crate::basic::Type::INT32 =>
      ColumnWriter::Int32(ColumnWriterImpl::new(descr, props)),
    crate::basic::Type::INT64 =>
      ColumnWriter::Int64(ColumnWriterImpl::new(descr, props)),
    crate::basic::Type::INT96 =>
      ColumnWriter::Int96(ColumnWriterImpl::new(descr, props)),
    crate::basic::Type::FLOAT =>
      ColumnWriter::Float(ColumnWriterImpl::new(descr, props)),
    crate::basic::Type::DOUBLE =>
      ColumnWriter::Double(ColumnWriterImpl::new(descr, props)),
    crate::basic::Type::BYTE_ARRAY =>
      ColumnWriter::ByteArray(ColumnWriterImpl::new(descr, props)),
    crate::basic::Type::FIXED_LEN_BYTE_ARRAY =>
      ColumnWriter::FixedLenByteArray(ColumnWriterImpl::new(descr, props))
  }
}

/// Narrow a [`ColumnWriter`] to the typed writer for `T`.
pub fn get_typed_column_writer<T: DataType>(
  column_writer: ColumnWriter
) -> Result<ColumnWriterImpl<T>> {
  T::get_column_writer(column_writer).ok_or_else(|| {
    type_err!("Cannot write column as {}", T::get_physical_type())
  })
}

/// The finished output of one column chunk.
pub struct WrittenChunk {
  /// Pages in file order; the dictionary page, when used, comes first.
  pub pages: Vec<Page>,

  /// Total number of level slots written.
  pub num_values: i64,

  /// Chunk-level statistics over all written values.
  pub statistics: Option<Statistics>
}

/// A value writer for one column chunk of a primitive column.
pub struct ColumnWriterImpl<T: DataType> {
  descr: ColumnDescPtr,
  props: WriterPropertiesPtr,
  values: Vec<T::T>,
  def_levels: Vec<i16>,
  rep_levels: Vec<i16>
}

impl<T: DataType> ColumnWriterImpl<T> {
  pub fn new(descr: ColumnDescPtr, props: WriterPropertiesPtr) -> Self {
    Self {
      descr,
      props,
      values: vec![],
      def_levels: vec![],
      rep_levels: vec![]
    }
  }

  pub fn descr(&self) -> &ColumnDescPtr {
    &self.descr
  }

  /// Buffer a batch of values with their levels. Returns the number of
  /// level slots consumed.
  pub fn write_batch(
    &mut self,
    values: &[T::T],
    def_levels: Option<&[i16]>,
    rep_levels: Option<&[i16]>
  ) -> Result<usize> {
    let max_def = self.descr.max_def_level();
    let max_rep = self.descr.max_rep_level();

    let slots = match (max_def > 0, def_levels) {
      (true, Some(levels)) => {
        if let Some(&bad) = levels.iter().find(|&&d| d < 0 || d > max_def) {
          return Err(level_err!(
            "Definition level {} outside [0, {}] for column {}",
            bad, max_def, self.descr.path()));
        }
        let present = levels.iter().filter(|&&d| d == max_def).count();
        if present != values.len() {
          return Err(level_err!(
            "Column {}: {} values provided but {} slots reach the max definition level",
            self.descr.path(), values.len(), present));
        }
        levels.len()
      }
      (true, None) => {
        return Err(level_err!(
          "Column {} requires definition levels", self.descr.path()))
      }
      (false, Some(_)) => {
        return Err(level_err!(
          "Column {} must not carry definition levels", self.descr.path()))
      }
      (false, None) => values.len()
    };

    match (max_rep > 0, rep_levels) {
      (true, Some(levels)) => {
        if levels.len() != slots {
          return Err(level_err!(
            "Column {}: {} repetition levels for {} slots",
            self.descr.path(), levels.len(), slots));
        }
        if let Some(&bad) = levels.iter().find(|&&r| r < 0 || r > max_rep) {
          return Err(level_err!(
            "Repetition level {} outside [0, {}] for column {}",
            bad, max_rep, self.descr.path()));
        }
        if self.rep_levels.is_empty() && !levels.is_empty() && levels[0] != 0 {
          return Err(level_err!(
            "Column {}: a chunk must start at a record boundary", self.descr.path()));
        }
        self.rep_levels.extend_from_slice(levels);
      }
      (true, None) => {
        return Err(level_err!(
          "Column {} requires repetition levels", self.descr.path()))
      }
      (false, Some(_)) => {
        return Err(level_err!(
          "Column {} must not carry repetition levels", self.descr.path()))
      }
      (false, None) => {}
    }

    if let Some(levels) = def_levels {
      self.def_levels.extend_from_slice(levels);
    }
    self.values.extend_from_slice(values);
    Ok(slots)
  }

  /// Encode everything buffered into the chunk's page sequence.
  pub fn close(self) -> Result<WrittenChunk> {
    let max_def = self.descr.max_def_level();
    let max_rep = self.descr.max_rep_level();
    let total_slots = if max_def > 0 { self.def_levels.len() } else { self.values.len() };

    // dictionary-encode when the cardinality stays under the cap;
    // booleans never benefit
    let mut dict_encoder = if T::get_physical_type() != crate::basic::Type::BOOLEAN
      && self.props.dictionary_index_threshold > 0
    {
      let mut encoder: DictEncoder<T> = DictEncoder::new(self.descr.clone());
      encoder.put(&self.values)?;
      if encoder.num_entries() <= self.props.dictionary_index_threshold {
        Some(encoder)
      } else {
        None
      }
    } else {
      None
    };

    let statistics = {
      let (min, max) = min_max_of(&self.values);
      let null_count = (total_slots - self.values.len()) as u64;
      Some(T::T::make_statistics(min, max, null_count))
    };

    let value_bytes: u64 = self.values.iter().map(|v| v.dict_encoded_size() as u64).sum();
    let slots_per_page = page_slot_limit(
      total_slots, self.values.len(), value_bytes, self.props.page_size_bytes);

    let mut codec = create_codec(self.props.compression)?;
    let mut pages = Vec::new();

    let all_indices = dict_encoder.as_mut().map(|encoder| encoder.take_indices());
    if let Some(ref encoder) = dict_encoder {
      debug!(
        "column {}: dictionary page with {} entries",
        self.descr.path(), encoder.num_entries());
      pages.push(Page::DictionaryPage {
        buf: compress_buffer(&mut codec, encoder.write_dict()?)?,
        num_values: encoder.num_entries() as u32,
        encoding: Encoding::PLAIN,
        is_sorted: false
      });
    }

    let mut slot_start = 0;
    let mut value_start = 0;
    while slot_start < total_slots {
      let slot_end = self.page_boundary(slot_start, slots_per_page, total_slots);
      let page_def_levels =
        (max_def > 0).then(|| &self.def_levels[slot_start..slot_end]);
      let page_rep_levels =
        (max_rep > 0).then(|| &self.rep_levels[slot_start..slot_end]);
      let present = match page_def_levels {
        Some(levels) => levels.iter().filter(|&&d| d == max_def).count(),
        None => slot_end - slot_start
      };

      let mut buf = Vec::new();
      if let Some(levels) = page_rep_levels {
        buf.extend_from_slice(&encode_level_stream(levels, max_rep)?);
      }
      if let Some(levels) = page_def_levels {
        buf.extend_from_slice(&encode_level_stream(levels, max_def)?);
      }

      let page_values = &self.values[value_start..value_start + present];
      let (encoding, value_buf) = match all_indices {
        Some(ref indices) => {
          let encoder = dict_encoder.as_ref().unwrap();
          let page_indices = &indices[value_start..value_start + present];
          (Encoding::RLE_DICTIONARY, encoder.write_indices(page_indices)?)
        }
        None => {
          let mut encoder: PlainEncoder<T> = PlainEncoder::new(self.descr.clone());
          encoder.put(page_values)?;
          (Encoding::PLAIN, encoder.consume_buffer()?)
        }
      };
      buf.extend_from_slice(value_buf.as_ref());

      let (page_min, page_max) = min_max_of(page_values);
      let page_stats = T::T::make_statistics(
        page_min, page_max, (slot_end - slot_start - present) as u64);

      pages.push(Page::DataPage {
        buf: compress_buffer(&mut codec, ByteBufferPtr::new(buf))?,
        num_values: (slot_end - slot_start) as u32,
        encoding,
        def_level_encoding: Encoding::RLE,
        rep_level_encoding: Encoding::RLE,
        statistics: Some(page_stats)
      });

      slot_start = slot_end;
      value_start += present;
    }

    debug!(
      "column {}: wrote {} pages, {} slots, {} values",
      self.descr.path(), pages.len(), total_slots, self.values.len());

    Ok(WrittenChunk {
      pages,
      num_values: total_slots as i64,
      statistics
    })
  }

  /// End of the page starting at `slot_start`: close to the per-page slot limit,
  /// extended to the next record boundary when repetition levels exist.
  fn page_boundary(&self, slot_start: usize, slots_per_page: usize, total_slots: usize) -> usize {
    let mut end = cmp::min(slot_start + cmp::max(slots_per_page, 1), total_slots);
    if self.descr.max_rep_level() > 0 {
      while end < total_slots && self.rep_levels[end] != 0 {
        end += 1;
      }
    }
    end
  }
}

fn encode_level_stream(levels: &[i16], max_level: i16) -> Result<Vec<u8>> {
  let size = LevelEncoder::max_buffer_size(Encoding::RLE, max_level, levels.len());
  let mut encoder = LevelEncoder::new(Encoding::RLE, max_level, vec![0; size]);
  encoder.put(levels)?;
  encoder.consume()
}

fn compress_buffer(
  codec: &mut Option<Box<dyn Codec>>,
  buf: ByteBufferPtr
) -> Result<ByteBufferPtr> {
  match codec {
    Some(codec) => Ok(ByteBufferPtr::new(codec.compress(buf.as_ref())?)),
    None => Ok(buf)
  }
}

/// Slots per page for the target page size, from the average encoded value
/// width.
fn page_slot_limit(
  total_slots: usize,
  num_values: usize,
  value_bytes: u64,
  page_size_bytes: usize
) -> usize {
  if total_slots == 0 || num_values == 0 || value_bytes == 0 {
    return cmp::max(total_slots, 1);
  }
  let avg = cmp::max(1, value_bytes as usize / num_values);
  cmp::max(1, page_size_bytes / avg)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::column::page::InMemoryPageReader;
  use crate::column::reader::{get_column_reader, get_typed_column_reader};
  use crate::schema::types::test_helpers;

  fn read_back_int32(
    descr: &ColumnDescPtr,
    pages: Vec<Page>,
    with_defs: bool
  ) -> (Vec<i32>, Vec<i16>) {
    let reader = get_column_reader(
      descr.clone(), Box::new(InMemoryPageReader::new(pages)));
    let mut typed = get_typed_column_reader::<Int32Type>(reader).unwrap();
    let mut values = Vec::new();
    let mut defs = Vec::new();
    loop {
      let slots = typed
        .read_batch(64, if with_defs { Some(&mut defs) } else { None }, None, &mut values)
        .unwrap();
      if slots == 0 {
        break;
      }
    }
    (values, defs)
  }

  #[test]
  fn test_write_read_plain_roundtrip() {
    let descr = test_helpers::int32_desc();
    // high-cardinality values with threshold 0 force PLAIN
    let props = Rc::new(WriterProperties {
      dictionary_index_threshold: 0,
      ..Default::default()
    });
    let mut writer: ColumnWriterImpl<Int32Type> =
      ColumnWriterImpl::new(descr.clone(), props);

    let def_levels = vec![1, 1, 0, 1, 0, 1];
    let values = vec![4, 8, 15, 16];
    assert_eq!(
      writer.write_batch(&values, Some(&def_levels), None).unwrap(), 6);

    let chunk = writer.close().unwrap();
    assert_eq!(chunk.num_values, 6);
    assert_eq!(chunk.pages.len(), 1);
    assert_eq!(chunk.pages[0].encoding(), Encoding::PLAIN);
    let stats = chunk.statistics.unwrap();
    assert_eq!(stats.null_count(), 2);
    assert!(stats.has_min_max());

    let (read_values, read_defs) = read_back_int32(&descr, chunk.pages, true);
    assert_eq!(read_values, values);
    assert_eq!(read_defs, def_levels);
  }

  #[test]
  fn test_write_read_dictionary_roundtrip() {
    let descr = test_helpers::int32_desc();
    let props = Rc::new(WriterProperties::default());
    let mut writer: ColumnWriterImpl<Int32Type> =
      ColumnWriterImpl::new(descr.clone(), props);

    let def_levels = vec![1i16; 8];
    let values = vec![7, 7, 3, 7, 3, 3, 7, 7];
    writer.write_batch(&values, Some(&def_levels), None).unwrap();

    let chunk = writer.close().unwrap();
    assert_eq!(chunk.pages.len(), 2);
    assert_eq!(
      chunk.pages[0].page_type(), crate::basic::PageType::DICTIONARY_PAGE);
    assert_eq!(chunk.pages[1].encoding(), Encoding::RLE_DICTIONARY);

    let (read_values, _) = read_back_int32(&descr, chunk.pages, true);
    assert_eq!(read_values, values);
  }

  #[test]
  fn test_write_cuts_pages_by_size() {
    let descr = test_helpers::int32_desc();
    // 4-byte values, 64-byte pages: 16 slots per page
    let props = Rc::new(WriterProperties {
      dictionary_index_threshold: 0,
      page_size_bytes: 64,
      ..Default::default()
    });
    let mut writer: ColumnWriterImpl<Int32Type> =
      ColumnWriterImpl::new(descr.clone(), props);

    let values: Vec<i32> = (0..100).collect();
    let def_levels = vec![1i16; 100];
    writer.write_batch(&values, Some(&def_levels), None).unwrap();

    let chunk = writer.close().unwrap();
    assert_eq!(chunk.pages.len(), 7);
    let (read_values, _) = read_back_int32(&descr, chunk.pages, true);
    assert_eq!(read_values, values);
  }

  #[test]
  fn test_write_snappy_compressed_pages() {
    let descr = test_helpers::int32_desc();
    let props = Rc::new(WriterProperties {
      dictionary_index_threshold: 0,
      compression: Compression::SNAPPY,
      ..Default::default()
    });
    let mut writer: ColumnWriterImpl<Int32Type> =
      ColumnWriterImpl::new(descr.clone(), props);
    let values = vec![1i32; 100];
    let def_levels = vec![1i16; 100];
    writer.write_batch(&values, Some(&def_levels), None).unwrap();

    let chunk = writer.close().unwrap();
    // the payload is compressed; decompression happens at the file level
    let mut codec = create_codec(Compression::SNAPPY).unwrap().unwrap();
    let mut decompressed = Vec::new();
    codec
      .decompress(chunk.pages[0].buffer().as_ref(), &mut decompressed)
      .unwrap();
    assert!(!decompressed.is_empty());
  }

  #[test]
  fn test_write_read_repeated_column() {
    use crate::basic::{LogicalType, Type as PhysicalType};
    use crate::record::api::{ReaderOptions, Row};
    use crate::record::assembler::assemble_column;
    use crate::schema::types::{data_field, list_field, message_type, SchemaDescriptor};

    let element =
      data_field("element", PhysicalType::INT32, LogicalType::NONE, true).unwrap();
    let list = list_field("xs", element).unwrap();
    let descr = SchemaDescriptor::new(
      message_type("s", vec![list]).unwrap()).column(0);

    // rows: [1, 2], [], null, [3]
    let def_levels = vec![3i16, 3, 1, 0, 3];
    let rep_levels = vec![0i16, 1, 0, 0, 0];
    let values = vec![1, 2, 3];

    let props = Rc::new(WriterProperties {
      dictionary_index_threshold: 0,
      ..Default::default()
    });
    let mut writer: ColumnWriterImpl<Int32Type> =
      ColumnWriterImpl::new(descr.clone(), props);
    writer
      .write_batch(&values, Some(&def_levels), Some(&rep_levels))
      .unwrap();
    let chunk = writer.close().unwrap();

    let reader = get_column_reader(
      descr.clone(), Box::new(InMemoryPageReader::new(chunk.pages)));
    let mut typed = get_typed_column_reader::<Int32Type>(reader).unwrap();
    let mut read_values = Vec::new();
    let mut defs = Vec::new();
    let mut reps = Vec::new();
    loop {
      let slots = typed
        .read_batch(64, Some(&mut defs), Some(&mut reps), &mut read_values)
        .unwrap();
      if slots == 0 {
        break;
      }
    }
    assert_eq!(defs, def_levels);
    assert_eq!(reps, rep_levels);
    assert_eq!(read_values, values);

    let column = crate::column::DataColumn::new(
      descr,
      crate::column::ColumnData::Int32(read_values),
      Some(defs),
      Some(reps)
    ).unwrap();
    let rows = assemble_column(&column, 4, &ReaderOptions::default()).unwrap();
    assert_eq!(rows[0], Row::List(vec![Row::Int(1), Row::Int(2)]));
    assert_eq!(rows[1], Row::List(vec![]));
    assert_eq!(rows[2], Row::Null);
    assert_eq!(rows[3], Row::List(vec![Row::Int(3)]));
  }

  #[test]
  fn test_write_batch_level_validation() {
    let descr = test_helpers::int32_desc();
    let props = Rc::new(WriterProperties::default());
    let mut writer: ColumnWriterImpl<Int32Type> =
      ColumnWriterImpl::new(descr, props);

    // missing definition levels for a nullable column
    assert!(writer.write_batch(&[1], None, None).is_err());
    // too many values for the present slots
    assert!(writer.write_batch(&[1, 2], Some(&[1, 0]), None).is_err());
    // level out of range
    assert!(writer.write_batch(&[1], Some(&[2]), None).is_err());
    // repetition levels on a flat column
    assert!(writer.write_batch(&[1], Some(&[1]), Some(&[0])).is_err());
  }
}
