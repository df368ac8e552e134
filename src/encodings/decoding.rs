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

//! Value decoders for the page encodings.

use std::cmp;
use std::marker::PhantomData;

use crate::basic::{Encoding, Type};
use crate::data_type::{DataType, ParquetValueType};
use crate::encodings::rle::RleDecoder;
use crate::errors::Result;
use crate::schema::types::ColumnDescPtr;
use crate::util::bit_util::BitReader;
use crate::util::memory::ByteBufferPtr;

// ----------------------------------------------------------------------
// Decoders

pub trait Decoder<T: DataType> {
  /// Set the data to decode to be `data`, which should contain `num_values`
  /// of values to decode.
  fn set_data(&mut self, data: ByteBufferPtr, num_values: usize) -> Result<()>;

  /// Consume values from this decoder and write the results to `buffer`,
  /// filling it up unless fewer values are left. Returns the number of
  /// values written.
  fn get(&mut self, buffer: &mut [T::T]) -> Result<usize>;

  /// Number of values left in this decoder stream.
  fn values_left(&self) -> usize;

  /// The encoding of this decoder.
  fn encoding(&self) -> Encoding;
}

/// Get a decoder for the data type `T` and encoding `encoding`. Dictionary
/// decoders are configured through the dictionary page instead, and the
/// encodings this crate recognizes but does not decode are reported as
/// unsupported.
pub fn get_decoder<T: DataType>(
  descr: ColumnDescPtr,
  encoding: Encoding
) -> Result<Box<dyn Decoder<T>>> {
  let decoder: Box<dyn Decoder<T>> = match encoding {
    Encoding::PLAIN => Box::new(PlainDecoder::new(descr.type_length())),
    Encoding::DELTA_BINARY_PACKED => Box::new(DeltaBitPackDecoder::new()),
    Encoding::DELTA_LENGTH_BYTE_ARRAY => Box::new(DeltaLengthByteArrayDecoder::new()),
    Encoding::DELTA_BYTE_ARRAY => Box::new(DeltaByteArrayDecoder::new()),
    Encoding::RLE_DICTIONARY | Encoding::PLAIN_DICTIONARY => {
      return Err(unsupported_err!(
        "Dictionary encoding is configured through the dictionary page"))
    }
    e => return Err(unsupported_err!("Encoding {} is not supported", e))
  };
  Ok(decoder)
}

// ----------------------------------------------------------------------
// PLAIN decoding

/// Mutable state shared between [`PlainDecoder`] and the per-type decode
/// logic on [`ParquetValueType`].
pub struct PlainDecoderState {
  /// The byte array to decode from. Not set when decoding booleans.
  pub(crate) data: Option<ByteBufferPtr>,

  /// Bit-level reader over `data`. Only set when decoding booleans.
  pub(crate) bit_reader: Option<BitReader>,

  /// Length for FIXED_LEN_BYTE_ARRAY values, from the schema.
  pub(crate) type_length: i32,

  /// Remaining number of values.
  pub(crate) num_values: usize,

  /// Current offset into `data`.
  pub(crate) start: usize
}

pub struct PlainDecoder<T: DataType> {
  state: PlainDecoderState,
  _phantom: PhantomData<T>
}

impl<T: DataType> PlainDecoder<T> {
  pub fn new(type_length: i32) -> Self {
    PlainDecoder {
      state: PlainDecoderState {
        data: None,
        bit_reader: None,
        type_length,
        num_values: 0,
        start: 0
      },
      _phantom: PhantomData
    }
  }
}

impl<T: DataType> Decoder<T> for PlainDecoder<T> {
  #[inline]
  fn set_data(&mut self, data: ByteBufferPtr, num_values: usize) -> Result<()> {
    T::T::init_plain(&mut self.state, data, num_values);
    Ok(())
  }

  #[inline]
  fn get(&mut self, buffer: &mut [T::T]) -> Result<usize> {
    T::T::decode_plain(&mut self.state, buffer)
  }

  #[inline]
  fn values_left(&self) -> usize {
    self.state.num_values
  }

  #[inline]
  fn encoding(&self) -> Encoding {
    Encoding::PLAIN
  }
}

// ----------------------------------------------------------------------
// Dictionary decoding

/// Decoder for dictionary-encoded data pages: the dictionary itself arrives
/// through [`DictDecoder::set_dict`] from the chunk's dictionary page, and
/// each data page carries an index bit width byte followed by a hybrid
/// stream of indices.
pub struct DictDecoder<T: DataType> {
  /// The dictionary, mapping ids to values.
  dictionary: Vec<T::T>,

  /// Whether `dictionary` has been initialized.
  has_dictionary: bool,

  /// The decoder for the value ids.
  rle_decoder: Option<RleDecoder>,

  /// Number of values left in the data stream.
  num_values: usize
}

impl<T: DataType> DictDecoder<T> {
  pub fn new() -> Self {
    Self { dictionary: vec![], has_dictionary: false, rle_decoder: None, num_values: 0 }
  }

  /// Load the dictionary from the decoder over the dictionary page payload.
  pub fn set_dict(&mut self, mut decoder: Box<dyn Decoder<T>>) -> Result<()> {
    let num_values = decoder.values_left();
    self.dictionary.resize(num_values, T::T::default());
    let decoded = decoder.get(&mut self.dictionary)?;
    if decoded != num_values {
      return Err(malformed_err!(
        "Expected {} dictionary entries, decoded {}", num_values, decoded));
    }
    self.has_dictionary = true;
    Ok(())
  }

  /// Number of entries in the dictionary.
  pub fn num_entries(&self) -> usize {
    self.dictionary.len()
  }
}

impl<T: DataType> Default for DictDecoder<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T: DataType> Decoder<T> for DictDecoder<T> {
  fn set_data(&mut self, data: ByteBufferPtr, num_values: usize) -> Result<()> {
    // first byte in `data` is the index bit width
    if data.is_empty() {
      return Err(malformed_err!("Dictionary-encoded page is empty"));
    }
    let bit_width = data.as_ref()[0] as usize;
    let mut rle_decoder = RleDecoder::new(bit_width);
    rle_decoder.set_data(data.start_from(1));
    self.num_values = num_values;
    self.rle_decoder = Some(rle_decoder);
    Ok(())
  }

  fn get(&mut self, buffer: &mut [T::T]) -> Result<usize> {
    assert!(self.has_dictionary, "set_dict() must be called first");
    let rle = self.rle_decoder.as_mut().expect("set_data() must be called first");
    let num_values = cmp::min(buffer.len(), self.num_values);
    let decoded = rle.get_batch_with_dict(&self.dictionary[..], buffer, num_values)?;
    self.num_values -= decoded;
    Ok(decoded)
  }

  fn values_left(&self) -> usize {
    self.num_values
  }

  fn encoding(&self) -> Encoding {
    Encoding::PLAIN_DICTIONARY
  }
}

// ----------------------------------------------------------------------
// DELTA_BINARY_PACKED decoding

/// Decoder for DELTA_BINARY_PACKED integers: a header with block layout and
/// first value, then blocks of zigzag min-delta plus bit-packed mini block
/// deltas. Supports INT32 and INT64 columns.
pub struct DeltaBitPackDecoder<T: DataType> {
  bit_reader: Option<BitReader>,

  // header info
  num_values: usize,
  num_mini_blocks: u64,
  values_per_mini_block: usize,
  first_value: i64,
  first_value_read: bool,

  // per block info
  min_delta: i64,
  delta_bit_widths: Vec<u8>,
  mini_block_idx: usize,
  delta_bit_width: u8,
  values_left_in_mini_block: usize,

  current_value: i64,

  _phantom: PhantomData<T>
}

impl<T: DataType> DeltaBitPackDecoder<T> {
  pub fn new() -> Self {
    Self {
      bit_reader: None,
      num_values: 0,
      num_mini_blocks: 0,
      values_per_mini_block: 0,
      first_value: 0,
      first_value_read: false,
      min_delta: 0,
      delta_bit_widths: vec![],
      mini_block_idx: 0,
      delta_bit_width: 0,
      values_left_in_mini_block: 0,
      current_value: 0,
      _phantom: PhantomData
    }
  }

  /// Byte position after the consumed portion of the stream; used by the
  /// byte-array decoders that embed a delta stream.
  pub fn get_offset(&self) -> usize {
    let reader = self.bit_reader.as_ref().expect("set_data() must be called first");
    reader.get_byte_offset()
  }

  fn init_block(&mut self) -> Result<()> {
    let bit_reader = self.bit_reader.as_mut().unwrap();
    self.min_delta = bit_reader.get_zigzag_vlq_int()?;
    self.delta_bit_widths.clear();
    for _ in 0..self.num_mini_blocks {
      let w = bit_reader.get_aligned::<u8>(1)?;
      if w as usize > 64 {
        return Err(malformed_err!("Invalid delta bit width {}", w));
      }
      self.delta_bit_widths.push(w);
    }
    self.mini_block_idx = 0;
    Ok(())
  }

  fn advance_mini_block(&mut self) -> Result<()> {
    if self.delta_bit_widths.is_empty() {
      self.init_block()?;
    } else {
      self.mini_block_idx += 1;
      if self.mini_block_idx >= self.delta_bit_widths.len() {
        self.init_block()?;
      }
    }
    self.delta_bit_width = self.delta_bit_widths[self.mini_block_idx];
    self.values_left_in_mini_block = self.values_per_mini_block;
    Ok(())
  }
}

impl<T: DataType> Default for DeltaBitPackDecoder<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T: DataType> Decoder<T> for DeltaBitPackDecoder<T> {
  fn set_data(&mut self, data: ByteBufferPtr, _num_values: usize) -> Result<()> {
    match T::get_physical_type() {
      Type::INT32 | Type::INT64 => {}
      t => return Err(unsupported_err!("DELTA_BINARY_PACKED cannot decode {} columns", t))
    }
    let mut bit_reader = BitReader::new(data);
    let block_size = bit_reader.get_vlq_int()?;
    self.num_mini_blocks = bit_reader.get_vlq_int()?;
    self.num_values = bit_reader.get_vlq_int()? as usize;
    self.first_value = bit_reader.get_zigzag_vlq_int()?;
    if self.num_mini_blocks == 0 || block_size % (self.num_mini_blocks * 8) != 0 {
      return Err(malformed_err!(
        "Invalid DELTA_BINARY_PACKED header: block size {}, {} mini blocks",
        block_size, self.num_mini_blocks));
    }
    self.values_per_mini_block = (block_size / self.num_mini_blocks) as usize;
    self.first_value_read = false;
    self.delta_bit_widths.clear();
    self.mini_block_idx = 0;
    self.values_left_in_mini_block = 0;
    self.bit_reader = Some(bit_reader);
    Ok(())
  }

  fn get(&mut self, buffer: &mut [T::T]) -> Result<usize> {
    assert!(self.bit_reader.is_some(), "set_data() must be called first");

    let num_values = cmp::min(buffer.len(), self.num_values);
    for item in buffer.iter_mut().take(num_values) {
      if !self.first_value_read {
        self.current_value = self.first_value;
        self.first_value_read = true;
      } else {
        if self.values_left_in_mini_block == 0 {
          self.advance_mini_block()?;
        }
        let bit_reader = self.bit_reader.as_mut().unwrap();
        let delta: u64 = bit_reader
          .get_value(self.delta_bit_width as usize)
          .ok_or_else(|| malformed_err!("Truncated DELTA_BINARY_PACKED mini block"))?;
        self.current_value = self
          .current_value
          .wrapping_add(self.min_delta)
          .wrapping_add(delta as i64);
        self.values_left_in_mini_block -= 1;
      }
      *item = T::T::try_from_i64(self.current_value)
        .ok_or_else(|| unsupported_err!("DELTA_BINARY_PACKED only supports INT32 and INT64"))?;
    }

    self.num_values -= num_values;
    Ok(num_values)
  }

  fn values_left(&self) -> usize {
    self.num_values
  }

  fn encoding(&self) -> Encoding {
    Encoding::DELTA_BINARY_PACKED
  }
}

// ----------------------------------------------------------------------
// DELTA_LENGTH_BYTE_ARRAY decoding

/// Decoder for DELTA_LENGTH_BYTE_ARRAY: a delta-packed stream of lengths
/// followed by the concatenated byte array data.
pub struct DeltaLengthByteArrayDecoder<T: DataType> {
  /// Lengths for each byte array in `data`.
  lengths: Vec<i64>,

  /// Current index into `lengths`.
  current_idx: usize,

  /// Concatenated byte array data.
  data: Option<ByteBufferPtr>,

  /// Offset into `data`, always at the start of the next byte array.
  offset: usize,

  /// Number of values left in this decoder stream.
  num_values: usize,

  _phantom: PhantomData<T>
}

impl<T: DataType> DeltaLengthByteArrayDecoder<T> {
  pub fn new() -> Self {
    Self {
      lengths: vec![],
      current_idx: 0,
      data: None,
      offset: 0,
      num_values: 0,
      _phantom: PhantomData
    }
  }
}

impl<T: DataType> Default for DeltaLengthByteArrayDecoder<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T: DataType> Decoder<T> for DeltaLengthByteArrayDecoder<T> {
  fn set_data(&mut self, data: ByteBufferPtr, num_values: usize) -> Result<()> {
    if T::get_physical_type() != Type::BYTE_ARRAY {
      return Err(unsupported_err!(
        "DELTA_LENGTH_BYTE_ARRAY cannot decode {} columns", T::get_physical_type()));
    }
    let mut len_decoder = DeltaBitPackDecoder::<crate::data_type::Int64Type>::new();
    len_decoder.set_data(data.all(), num_values)?;
    let num_lengths = len_decoder.values_left();
    self.lengths.resize(num_lengths, 0);
    len_decoder.get(&mut self.lengths[..])?;

    self.data = Some(data.start_from(len_decoder.get_offset()));
    self.offset = 0;
    self.current_idx = 0;
    self.num_values = num_lengths;
    Ok(())
  }

  fn get(&mut self, buffer: &mut [T::T]) -> Result<usize> {
    let data = self.data.as_ref().expect("set_data() must be called first");
    let num_values = cmp::min(buffer.len(), self.num_values);
    for item in buffer.iter_mut().take(num_values) {
      let len = self.lengths[self.current_idx];
      if len < 0 || self.offset + len as usize > data.len() {
        return Err(malformed_err!("Truncated DELTA_LENGTH_BYTE_ARRAY data"));
      }
      item.set_from_bytes(data.range(self.offset, len as usize))?;
      self.offset += len as usize;
      self.current_idx += 1;
    }
    self.num_values -= num_values;
    Ok(num_values)
  }

  fn values_left(&self) -> usize {
    self.num_values
  }

  fn encoding(&self) -> Encoding {
    Encoding::DELTA_LENGTH_BYTE_ARRAY
  }
}

// ----------------------------------------------------------------------
// DELTA_BYTE_ARRAY decoding

/// Decoder for DELTA_BYTE_ARRAY: front-coded byte arrays stored as a
/// delta-packed stream of shared-prefix lengths plus the suffixes in
/// DELTA_LENGTH_BYTE_ARRAY form.
pub struct DeltaByteArrayDecoder<T: DataType> {
  /// Prefix lengths for each byte array.
  prefix_lengths: Vec<i64>,

  /// The current index into `prefix_lengths`.
  current_idx: usize,

  /// Decoder for all the suffixes.
  suffix_decoder: Option<DeltaLengthByteArrayDecoder<crate::data_type::ByteArrayType>>,

  /// The last complete value, used to derive the next prefix.
  previous_value: Vec<u8>,

  /// Number of values left.
  num_values: usize,

  _phantom: PhantomData<T>
}

impl<T: DataType> DeltaByteArrayDecoder<T> {
  pub fn new() -> Self {
    Self {
      prefix_lengths: vec![],
      current_idx: 0,
      suffix_decoder: None,
      previous_value: vec![],
      num_values: 0,
      _phantom: PhantomData
    }
  }
}

impl<T: DataType> Default for DeltaByteArrayDecoder<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T: DataType> Decoder<T> for DeltaByteArrayDecoder<T> {
  fn set_data(&mut self, data: ByteBufferPtr, num_values: usize) -> Result<()> {
    if T::get_physical_type() != Type::BYTE_ARRAY {
      return Err(unsupported_err!(
        "DELTA_BYTE_ARRAY cannot decode {} columns", T::get_physical_type()));
    }
    let mut prefix_len_decoder = DeltaBitPackDecoder::<crate::data_type::Int64Type>::new();
    prefix_len_decoder.set_data(data.all(), num_values)?;
    let num_prefixes = prefix_len_decoder.values_left();
    self.prefix_lengths.resize(num_prefixes, 0);
    prefix_len_decoder.get(&mut self.prefix_lengths[..])?;

    let mut suffix_decoder = DeltaLengthByteArrayDecoder::new();
    suffix_decoder.set_data(data.start_from(prefix_len_decoder.get_offset()), num_values)?;
    self.suffix_decoder = Some(suffix_decoder);
    self.previous_value.clear();
    self.current_idx = 0;
    self.num_values = num_prefixes;
    Ok(())
  }

  fn get(&mut self, buffer: &mut [T::T]) -> Result<usize> {
    let suffix_decoder =
      self.suffix_decoder.as_mut().expect("set_data() must be called first");
    let num_values = cmp::min(buffer.len(), self.num_values);
    let mut suffix = vec![crate::data_type::ByteArray::new(); 1];
    for item in buffer.iter_mut().take(num_values) {
      let prefix_len = self.prefix_lengths[self.current_idx];
      if prefix_len < 0 || prefix_len as usize > self.previous_value.len() {
        return Err(malformed_err!(
          "DELTA_BYTE_ARRAY prefix of {} bytes exceeds the previous value", prefix_len));
      }
      if suffix_decoder.get(&mut suffix[..])? != 1 {
        return Err(malformed_err!("Missing DELTA_BYTE_ARRAY suffix"));
      }

      let mut result = Vec::with_capacity(prefix_len as usize + suffix[0].len());
      result.extend_from_slice(&self.previous_value[..prefix_len as usize]);
      result.extend_from_slice(suffix[0].data());
      self.previous_value = result.clone();
      item.set_from_bytes(ByteBufferPtr::new(result))?;
      self.current_idx += 1;
    }
    self.num_values -= num_values;
    Ok(num_values)
  }

  fn values_left(&self) -> usize {
    self.num_values
  }

  fn encoding(&self) -> Encoding {
    Encoding::DELTA_BYTE_ARRAY
  }
}
