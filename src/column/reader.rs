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

//! Typed column chunk readers: pull pages from a [`PageReader`] and
//! demultiplex them into values, definition levels and repetition levels.

use std::cmp;
use std::collections::HashMap;

use log::debug;

use crate::basic::Encoding;
use crate::data_type::*;
use crate::encodings::decoding::{get_decoder, Decoder, DictDecoder, PlainDecoder};
use crate::encodings::levels::LevelDecoder;
use crate::errors::Result;
use crate::schema::types::ColumnDescPtr;
use crate::util::memory::ByteBufferPtr;

use super::page::{Page, PageReader};

/// Column readers for all physical types.
pub enum ColumnReader {
  Bool(ColumnReaderImpl<BoolType>),
  Int32(ColumnReaderImpl<Int32Type>),
  Int64(ColumnReaderImpl<Int64Type>),
  Int96(ColumnReaderImpl<Int96Type>),
  Float(ColumnReaderImpl<FloatType>),
  Double(ColumnReaderImpl<DoubleType>),
  ByteArray(ColumnReaderImpl<ByteArrayType>),
  FixedLenByteArray(ColumnReaderImpl<FixedLenByteArrayType>)
}

/// Build a column reader for the leaf described by `descr`.
pub fn get_column_reader(
  descr: ColumnDescPtr,
  page_reader: Box<dyn PageReader>
) -> ColumnReader {
  match descr.physical_type() {
    crate::basic::Type::BOOLEAN =>
      ColumnReader::Bool(ColumnReaderImpl::new(descr, page_reader)),
    crate::basic::Type::INT32 =>
      ColumnReader::Int32(ColumnReaderImpl::new(descr, page_reader)),
    crate::basic::Type::INT64 =>
      ColumnReader::Int64(ColumnReaderImpl::new(descr, page_reader)),
    crate::basic::Type::INT96 =>
      ColumnReader::Int96(ColumnReaderImpl::new(descr, page_reader)),
    crate::basic::Type::FLOAT =>
      ColumnReader::Float(ColumnReaderImpl::new(descr, page_reader)),
    crate::basic::Type::DOUBLE =>
      ColumnReader::Double(ColumnReaderImpl::new(descr, page_reader)),
    crate::basic::Type::BYTE_ARRAY =>
      ColumnReader::ByteArray(ColumnReaderImpl::new(descr, page_reader)),
    crate::basic::Type::FIXED_LEN_BYTE_ARRAY =>
      ColumnReader::FixedLenByteArray(ColumnReaderImpl::new(descr, page_reader))
  }
}

/// Narrow a [`ColumnReader`] to the typed reader for `T`.
pub fn get_typed_column_reader<T: DataType>(
  column_reader: ColumnReader
) -> Result<ColumnReaderImpl<T>> {
  T::get_column_reader(column_reader).ok_or_else(|| {
    type_err!(
      "Cannot read column as {}", T::get_physical_type())
  })
}

/// A value reader for one column chunk of a primitive column.
pub struct ColumnReaderImpl<T: DataType> {
  descr: ColumnDescPtr,
  page_reader: Box<dyn PageReader>,

  def_level_decoder: Option<LevelDecoder>,
  rep_level_decoder: Option<LevelDecoder>,

  /// Decoders seen in this chunk, keyed by normalized encoding.
  decoders: HashMap<Encoding, Box<dyn Decoder<T>>>,

  /// Encoding of the page being decoded.
  current_encoding: Option<Encoding>,

  /// Whether the chunk's dictionary page was loaded.
  has_dictionary: bool,

  /// The total number of values stored in the current data page.
  num_buffered_values: u32,

  /// The number of values from the current data page that have been decoded
  /// so far.
  num_decoded_values: u32
}

impl<T: DataType> ColumnReaderImpl<T> {
  pub fn new(descr: ColumnDescPtr, page_reader: Box<dyn PageReader>) -> Self {
    Self {
      descr,
      page_reader,
      def_level_decoder: None,
      rep_level_decoder: None,
      decoders: HashMap::new(),
      current_encoding: None,
      has_dictionary: false,
      num_buffered_values: 0,
      num_decoded_values: 0
    }
  }

  pub fn descr(&self) -> &ColumnDescPtr {
    &self.descr
  }

  /// Read up to `batch_size` level slots, appending decoded levels and
  /// values to the output vectors. Returns the number of slots consumed;
  /// zero means the chunk is exhausted.
  ///
  /// `def_levels` must be provided iff the column is nested in anything
  /// optional or repeated, `rep_levels` iff it is nested in anything
  /// repeated.
  pub fn read_batch(
    &mut self,
    batch_size: usize,
    mut def_levels: Option<&mut Vec<i16>>,
    mut rep_levels: Option<&mut Vec<i16>>,
    values: &mut Vec<T::T>
  ) -> Result<usize> {
    let mut slots_read = 0;

    while slots_read < batch_size {
      if self.num_buffered_values == self.num_decoded_values && !self.read_new_page()? {
        break;
      }

      let to_read = cmp::min(
        batch_size - slots_read,
        (self.num_buffered_values - self.num_decoded_values) as usize);

      // definition levels decide how many slots hold a value
      let values_to_read = if self.descr.max_def_level() > 0 {
        let decoder = self
          .def_level_decoder
          .as_mut()
          .expect("definition level decoder must be set for a nullable column");
        let mut levels = vec![0i16; to_read];
        let decoded = decoder.get(&mut levels)?;
        if decoded != to_read {
          return Err(malformed_err!(
            "Expected {} definition levels in page, decoded {}", to_read, decoded));
        }
        let present = levels
          .iter()
          .filter(|&&level| level == self.descr.max_def_level())
          .count();
        if let Some(out) = def_levels.as_mut() {
          out.extend_from_slice(&levels);
        } else {
          return Err(level_err!(
            "Must request definition levels for column {}", self.descr.path()));
        }
        present
      } else {
        to_read
      };

      if self.descr.max_rep_level() > 0 {
        let decoder = self
          .rep_level_decoder
          .as_mut()
          .expect("repetition level decoder must be set for a repeated column");
        let mut levels = vec![0i16; to_read];
        let decoded = decoder.get(&mut levels)?;
        if decoded != to_read {
          return Err(malformed_err!(
            "Expected {} repetition levels in page, decoded {}", to_read, decoded));
        }
        if let Some(out) = rep_levels.as_mut() {
          out.extend_from_slice(&levels);
        } else {
          return Err(level_err!(
            "Must request repetition levels for column {}", self.descr.path()));
        }
      }

      if values_to_read > 0 {
        let encoding = self
          .current_encoding
          .expect("current encoding must be set after reading a page");
        let decoder = self
          .decoders
          .get_mut(&encoding)
          .expect("decoder must be set after reading a page");
        let mut buffer = vec![T::T::default(); values_to_read];
        let decoded = decoder.get(&mut buffer)?;
        if decoded != values_to_read {
          return Err(malformed_err!(
            "Expected {} values in page, decoded {}", values_to_read, decoded));
        }
        values.extend(buffer);
      }

      self.num_decoded_values += to_read as u32;
      slots_read += to_read;
    }

    Ok(slots_read)
  }

  /// Advance to the next data page, skipping empty ones. Returns false when
  /// the chunk has no page left.
  fn read_new_page(&mut self) -> Result<bool> {
    loop {
      match self.page_reader.get_next_page()? {
        None => return Ok(false),
        Some(page) if page.page_type() == crate::basic::PageType::DICTIONARY_PAGE => {
          self.configure_dictionary(page)?;
        }
        Some(Page::DataPage {
          buf,
          num_values,
          encoding,
          def_level_encoding,
          rep_level_encoding,
          statistics: _
        }) => {
          if num_values == 0 {
            continue;
          }
          debug!(
            "column {}: data page v1, {} values, encoding {}",
            self.descr.path(), num_values, encoding);
          self.num_buffered_values = num_values;
          self.num_decoded_values = 0;

          let mut buffer_ptr = buf;

          // repetition levels come first in a v1 page
          if self.descr.max_rep_level() > 0 {
            let mut rep_decoder =
              LevelDecoder::new(rep_level_encoding, self.descr.max_rep_level());
            let total_bytes = rep_decoder.set_data(buffer_ptr.all())?;
            buffer_ptr = buffer_ptr.start_from(total_bytes);
            self.rep_level_decoder = Some(rep_decoder);
          }

          if self.descr.max_def_level() > 0 {
            let mut def_decoder =
              LevelDecoder::new(def_level_encoding, self.descr.max_def_level());
            let total_bytes = def_decoder.set_data(buffer_ptr.all())?;
            buffer_ptr = buffer_ptr.start_from(total_bytes);
            self.def_level_decoder = Some(def_decoder);
          }

          self.configure_value_decoder(buffer_ptr, num_values as usize, encoding)?;
          return Ok(true);
        }
        Some(Page::DataPageV2 {
          buf,
          num_values,
          encoding,
          num_nulls: _,
          num_rows: _,
          def_levels_byte_len,
          rep_levels_byte_len,
          is_compressed: _,
          statistics: _
        }) => {
          if num_values == 0 {
            continue;
          }
          debug!(
            "column {}: data page v2, {} values, encoding {}",
            self.descr.path(), num_values, encoding);
          self.num_buffered_values = num_values;
          self.num_decoded_values = 0;

          // v2 level streams carry no length prefix; their extents come
          // from the page header
          let rep_len = rep_levels_byte_len as usize;
          let def_len = def_levels_byte_len as usize;

          if self.descr.max_rep_level() > 0 {
            let mut rep_decoder = LevelDecoder::new(Encoding::RLE, self.descr.max_rep_level());
            rep_decoder.set_data_range(&buf, 0, rep_len)?;
            self.rep_level_decoder = Some(rep_decoder);
          }

          if self.descr.max_def_level() > 0 {
            let mut def_decoder = LevelDecoder::new(Encoding::RLE, self.descr.max_def_level());
            def_decoder.set_data_range(&buf, rep_len, def_len)?;
            self.def_level_decoder = Some(def_decoder);
          }

          if rep_len + def_len > buf.len() {
            return Err(malformed_err!(
              "Data page v2 level streams of {} bytes exceed the page of {} bytes",
              rep_len + def_len, buf.len()));
          }
          let values_ptr = buf.start_from(rep_len + def_len);
          self.configure_value_decoder(values_ptr, num_values as usize, encoding)?;
          return Ok(true);
        }
        Some(_) => continue
      }
    }
  }

  fn configure_value_decoder(
    &mut self,
    data: ByteBufferPtr,
    num_values: usize,
    encoding: Encoding
  ) -> Result<()> {
    let encoding = normalize_encoding(encoding);
    if encoding == Encoding::PLAIN_DICTIONARY && !self.has_dictionary {
      return Err(malformed_err!(
        "Column {} uses dictionary encoding but carries no dictionary page",
        self.descr.path()));
    }
    if !self.decoders.contains_key(&encoding) {
      let decoder = get_decoder::<T>(self.descr.clone(), encoding)?;
      self.decoders.insert(encoding, decoder);
    }
    let decoder = self.decoders.get_mut(&encoding).unwrap();
    decoder.set_data(data, num_values)?;
    self.current_encoding = Some(encoding);
    Ok(())
  }

  fn configure_dictionary(&mut self, page: Page) -> Result<()> {
    if self.has_dictionary {
      return Err(malformed_err!(
        "Column {} carries more than one dictionary page", self.descr.path()));
    }
    let (buf, num_values, encoding) = match page {
      Page::DictionaryPage { buf, num_values, encoding, .. } => (buf, num_values, encoding),
      _ => unreachable!("checked by the caller")
    };
    match normalize_encoding(encoding) {
      Encoding::PLAIN | Encoding::PLAIN_DICTIONARY => {}
      e => {
        return Err(unsupported_err!("Dictionary page encoding {} is not supported", e))
      }
    }
    debug!(
      "column {}: dictionary page with {} entries", self.descr.path(), num_values);

    let mut plain: PlainDecoder<T> = PlainDecoder::new(self.descr.type_length());
    plain.set_data(buf, num_values as usize)?;
    let mut dict_decoder: DictDecoder<T> = DictDecoder::new();
    dict_decoder.set_dict(Box::new(plain))?;
    self.decoders.insert(Encoding::PLAIN_DICTIONARY, Box::new(dict_decoder));
    self.has_dictionary = true;
    Ok(())
  }
}

/// Both dictionary encodings name the same index-stream format.
fn normalize_encoding(encoding: Encoding) -> Encoding {
  match encoding {
    Encoding::RLE_DICTIONARY => Encoding::PLAIN_DICTIONARY,
    e => e
  }
}
