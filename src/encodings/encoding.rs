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

//! Value encoders for the page encodings the writer emits.

use std::mem;

use crate::basic::Encoding;
use crate::data_type::{DataType, ParquetValueType};
use crate::encodings::rle::RleEncoder;
use crate::errors::Result;
use crate::schema::types::ColumnDescPtr;
use crate::util::bit_util::{log2, BitWriter};
use crate::util::hash_util;
use crate::util::memory::{ByteBuffer, ByteBufferPtr};

pub trait Encoder<T: DataType> {
  /// Encode all values in `src`.
  fn put(&mut self, src: &[T::T]) -> Result<()>;

  /// The encoding of this encoder.
  fn encoding(&self) -> Encoding;

  /// Take the encoded bytes accumulated so far, resetting the encoder.
  fn consume_buffer(&mut self) -> Result<ByteBufferPtr>;
}

// ----------------------------------------------------------------------
// PLAIN encoding

pub struct PlainEncoder<T: DataType> {
  out: ByteBuffer,
  bit_writer: BitWriter,
  #[allow(dead_code)]
  descr: ColumnDescPtr,
  _phantom: std::marker::PhantomData<T>
}

impl<T: DataType> PlainEncoder<T> {
  pub fn new(descr: ColumnDescPtr) -> Self {
    Self {
      out: ByteBuffer::new(),
      bit_writer: BitWriter::new(256),
      descr,
      _phantom: std::marker::PhantomData
    }
  }
}

impl<T: DataType> Encoder<T> for PlainEncoder<T> {
  fn put(&mut self, src: &[T::T]) -> Result<()> {
    T::T::encode_plain(src, &mut self.out, &mut self.bit_writer)
  }

  fn encoding(&self) -> Encoding {
    Encoding::PLAIN
  }

  fn consume_buffer(&mut self) -> Result<ByteBufferPtr> {
    // booleans were accumulated bit by bit in the bit writer
    if self.bit_writer.bytes_written() > 0 {
      let bit_writer = mem::replace(&mut self.bit_writer, BitWriter::new(256));
      use std::io::Write;
      self.out.write_all(&bit_writer.consume())?;
    }
    Ok(self.out.consume())
  }
}

// ----------------------------------------------------------------------
// Dictionary encoding

const INITIAL_HASH_TABLE_SIZE: usize = 1024;
const MAX_HASH_LOAD: f32 = 0.7;
const HASH_SLOT_EMPTY: i32 = -1;

/// Dictionary encoder: deduplicates values into a PLAIN-encoded dictionary
/// page and buffers one index per value for the bit-width-prefixed hybrid
/// index stream of the data pages.
pub struct DictEncoder<T: DataType> {
  #[allow(dead_code)]
  descr: ColumnDescPtr,

  /// Size of the hash table. Must be a power of 2.
  hash_table_size: usize,

  /// `hash_table_size - 1`, so that `hash & mod_bitmask` replaces the
  /// modulo.
  mod_bitmask: u64,

  /// Slots mapping (many-to-one) into `uniques` with linear probing;
  /// `HASH_SLOT_EMPTY` marks a free slot.
  hash_slots: Vec<i32>,

  /// Indices buffered and not yet written out by `write_indices()`.
  buffered_indices: Vec<i32>,

  /// The distinct values observed, in first-seen order.
  uniques: Vec<T::T>,

  /// Bytes needed to encode the dictionary page.
  dict_encoded_size: u64
}

impl<T: DataType> DictEncoder<T> {
  pub fn new(descr: ColumnDescPtr) -> Self {
    Self {
      descr,
      hash_table_size: INITIAL_HASH_TABLE_SIZE,
      mod_bitmask: (INITIAL_HASH_TABLE_SIZE - 1) as u64,
      hash_slots: vec![HASH_SLOT_EMPTY; INITIAL_HASH_TABLE_SIZE],
      buffered_indices: vec![],
      uniques: vec![],
      dict_encoded_size: 0
    }
  }

  /// Number of distinct values seen so far.
  pub fn num_entries(&self) -> usize {
    self.uniques.len()
  }

  /// Bytes the dictionary page payload will occupy.
  pub fn dict_encoded_size(&self) -> u64 {
    self.dict_encoded_size
  }

  /// Bit width needed for the index stream.
  pub fn bit_width(&self) -> usize {
    log2(self.uniques.len() as u64)
  }

  /// Take the indices buffered so far, one per encoded value.
  pub fn take_indices(&mut self) -> Vec<i32> {
    mem::take(&mut self.buffered_indices)
  }

  /// Encode the distinct values as a PLAIN dictionary page payload.
  pub fn write_dict(&self) -> Result<ByteBufferPtr> {
    let mut out = ByteBuffer::new_with_cap(self.dict_encoded_size as usize);
    let mut bit_writer = BitWriter::new(64);
    T::T::encode_plain(&self.uniques, &mut out, &mut bit_writer)?;
    if bit_writer.bytes_written() > 0 {
      use std::io::Write;
      out.write_all(&bit_writer.consume())?;
    }
    Ok(out.consume())
  }

  /// Encode `indices` as a data page payload: one bit width byte, then the
  /// hybrid index stream without a length prefix.
  pub fn write_indices(&self, indices: &[i32]) -> Result<ByteBufferPtr> {
    let bit_width = self.bit_width();
    let mut buffer = Vec::with_capacity(1 + RleEncoder::max_buffer_size(bit_width, indices.len()));
    buffer.push(bit_width as u8);
    let mut encoder = RleEncoder::new_from_buf(bit_width, buffer, 1);
    for index in indices {
      encoder.put(*index as u64)?;
    }
    Ok(ByteBufferPtr::new(encoder.consume()))
  }

  fn put_one(&mut self, value: &T::T) {
    let mut j = (hash_util::hash(value, 0) & self.mod_bitmask) as usize;
    let mut index = self.hash_slots[j];

    while index != HASH_SLOT_EMPTY && self.uniques[index as usize] != *value {
      j += 1;
      if j == self.hash_table_size {
        j = 0;
      }
      index = self.hash_slots[j];
    }

    if index == HASH_SLOT_EMPTY {
      index = self.uniques.len() as i32;
      self.hash_slots[j] = index;
      self.dict_encoded_size += value.dict_encoded_size() as u64;
      self.uniques.push(value.clone());

      if self.uniques.len() > (self.hash_table_size as f32 * MAX_HASH_LOAD) as usize {
        self.double_table_size();
      }
    }

    self.buffered_indices.push(index);
  }

  fn double_table_size(&mut self) {
    let new_size = self.hash_table_size * 2;
    let mut new_hash_slots = vec![HASH_SLOT_EMPTY; new_size];
    let new_bitmask = (new_size - 1) as u64;
    for slot in &self.hash_slots {
      let index = *slot;
      if index == HASH_SLOT_EMPTY {
        continue;
      }
      let value = &self.uniques[index as usize];
      let mut j = (hash_util::hash(value, 0) & new_bitmask) as usize;
      while new_hash_slots[j] != HASH_SLOT_EMPTY {
        j += 1;
        if j == new_size {
          j = 0;
        }
      }
      new_hash_slots[j] = index;
    }
    self.hash_table_size = new_size;
    self.mod_bitmask = new_bitmask;
    self.hash_slots = new_hash_slots;
  }
}

impl<T: DataType> Encoder<T> for DictEncoder<T> {
  fn put(&mut self, src: &[T::T]) -> Result<()> {
    for value in src {
      self.put_one(value);
    }
    Ok(())
  }

  fn encoding(&self) -> Encoding {
    Encoding::PLAIN_DICTIONARY
  }

  /// The index stream for everything buffered so far.
  fn consume_buffer(&mut self) -> Result<ByteBufferPtr> {
    let indices = self.take_indices();
    self.write_indices(&indices)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::data_type::*;
  use crate::encodings::decoding::{Decoder, DictDecoder, PlainDecoder};
  use crate::schema::types::test_helpers;

  fn roundtrip_plain<T: DataType>(descr: ColumnDescPtr, values: &[T::T], type_length: i32) {
    let mut encoder: PlainEncoder<T> = PlainEncoder::new(descr);
    encoder.put(values).expect("put() should be OK");
    let encoded = encoder.consume_buffer().expect("consume_buffer() should be OK");

    let mut decoder: PlainDecoder<T> = PlainDecoder::new(type_length);
    decoder.set_data(encoded, values.len()).expect("set_data() should be OK");
    let mut buffer = vec![T::T::default(); values.len()];
    assert_eq!(decoder.get(&mut buffer).unwrap(), values.len());
    assert_eq!(buffer, values);
  }

  #[test]
  fn test_plain_roundtrip_int32() {
    roundtrip_plain::<Int32Type>(
      test_helpers::int32_desc(), &[1, -5, 7, i32::MAX, i32::MIN], -1);
  }

  #[test]
  fn test_plain_roundtrip_double() {
    roundtrip_plain::<DoubleType>(test_helpers::double_desc(), &[0.5, -3.25, 1e300], -1);
  }

  #[test]
  fn test_plain_roundtrip_bool() {
    roundtrip_plain::<BoolType>(
      test_helpers::bool_desc(),
      &[true, false, false, true, true, false, true, false, false],
      -1);
  }

  #[test]
  fn test_plain_roundtrip_byte_array() {
    roundtrip_plain::<ByteArrayType>(
      test_helpers::byte_array_desc(),
      &[ByteArray::from("hello"), ByteArray::from(""), ByteArray::from("parquet")],
      -1);
  }

  #[test]
  fn test_plain_roundtrip_fixed_len_byte_array() {
    roundtrip_plain::<FixedLenByteArrayType>(
      test_helpers::fixed_len_byte_array_desc(4),
      &[FixedLenByteArray::from("abcd"), FixedLenByteArray::from("wxyz")],
      4);
  }

  #[test]
  fn test_dict_roundtrip_int32() {
    let descr = test_helpers::int32_desc();
    let values: Vec<i32> = vec![10, 20, 10, 30, 30, 30, 10, 20];

    let mut encoder: DictEncoder<Int32Type> = DictEncoder::new(descr.clone());
    encoder.put(&values).unwrap();
    assert_eq!(encoder.num_entries(), 3);

    let dict_page = encoder.write_dict().unwrap();
    let index_page = encoder.consume_buffer().unwrap();

    let mut plain: PlainDecoder<Int32Type> = PlainDecoder::new(descr.type_length());
    plain.set_data(dict_page, encoder.num_entries()).unwrap();

    let mut decoder: DictDecoder<Int32Type> = DictDecoder::new();
    decoder.set_dict(Box::new(plain)).unwrap();
    decoder.set_data(index_page, values.len()).unwrap();

    let mut buffer = vec![0i32; values.len()];
    assert_eq!(decoder.get(&mut buffer).unwrap(), values.len());
    assert_eq!(buffer, values);
  }

  #[test]
  fn test_dict_roundtrip_byte_array() {
    let descr = test_helpers::byte_array_desc();
    let words = ["tapir", "capel", "tapir", "okapi", "capel", "tapir"];
    let values: Vec<ByteArray> = words.iter().map(|w| ByteArray::from(*w)).collect();

    let mut encoder: DictEncoder<ByteArrayType> = DictEncoder::new(descr.clone());
    encoder.put(&values).unwrap();
    assert_eq!(encoder.num_entries(), 3);
    // dictionary page stores 4-byte lengths plus the distinct bytes
    assert_eq!(encoder.dict_encoded_size(), 3 * (4 + 5));

    let dict_page = encoder.write_dict().unwrap();
    let index_page = encoder.consume_buffer().unwrap();

    let mut plain: PlainDecoder<ByteArrayType> = PlainDecoder::new(-1);
    plain.set_data(dict_page, encoder.num_entries()).unwrap();
    let mut decoder: DictDecoder<ByteArrayType> = DictDecoder::new();
    decoder.set_dict(Box::new(plain)).unwrap();
    decoder.set_data(index_page, values.len()).unwrap();

    let mut buffer = vec![ByteArray::new(); values.len()];
    assert_eq!(decoder.get(&mut buffer).unwrap(), values.len());
    assert_eq!(buffer, values);
  }

  #[test]
  fn test_dict_single_value_zero_bit_width() {
    let descr = test_helpers::int32_desc();
    let values = vec![42i32; 9];

    let mut encoder: DictEncoder<Int32Type> = DictEncoder::new(descr.clone());
    encoder.put(&values).unwrap();
    assert_eq!(encoder.num_entries(), 1);
    assert_eq!(encoder.bit_width(), 0);

    let dict_page = encoder.write_dict().unwrap();
    let index_page = encoder.consume_buffer().unwrap();

    let mut plain: PlainDecoder<Int32Type> = PlainDecoder::new(-1);
    plain.set_data(dict_page, 1).unwrap();
    let mut decoder: DictDecoder<Int32Type> = DictDecoder::new();
    decoder.set_dict(Box::new(plain)).unwrap();
    decoder.set_data(index_page, values.len()).unwrap();

    let mut buffer = vec![0i32; values.len()];
    assert_eq!(decoder.get(&mut buffer).unwrap(), values.len());
    assert_eq!(buffer, values);
  }

  #[test]
  fn test_dict_many_values_grows_table() {
    let descr = test_helpers::int32_desc();
    let values: Vec<i32> = (0..2000).collect();
    let mut encoder: DictEncoder<Int32Type> = DictEncoder::new(descr);
    encoder.put(&values).unwrap();
    assert_eq!(encoder.num_entries(), 2000);
    assert_eq!(encoder.bit_width(), 11);
  }
}
