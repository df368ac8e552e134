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

//! Connects Parquet physical types with their Rust-native representations.

use std::cmp::Ordering;
use std::fmt;
use std::io::Write;
use std::mem::size_of;

use crate::basic::Type;
use crate::column::reader::{ColumnReader, ColumnReaderImpl};
use crate::column::writer::{ColumnWriter, ColumnWriterImpl};
use crate::column::ColumnData;
use crate::encodings::decoding::PlainDecoderState;
use crate::errors::Result;
use crate::file::statistics::Statistics;
use crate::util::bit_util::BitWriter;
use crate::util::memory::ByteBufferPtr;

// ----------------------------------------------------------------------
// Native value types

/// A 96-bit value, used on disk for legacy nanosecond timestamps. Stored as
/// three little-endian `u32` words, least significant first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Int96 {
  value: Option<Vec<u32>>
}

impl Int96 {
  pub fn new() -> Self {
    Int96 { value: None }
  }

  /// The three words; empty when the value was never set.
  pub fn data(&self) -> &[u32] {
    self.value.as_deref().unwrap_or(&[])
  }

  pub fn set_data(&mut self, v: Vec<u32>) {
    assert_eq!(v.len(), 3);
    self.value = Some(v);
  }
}

impl From<Vec<u32>> for Int96 {
  fn from(v: Vec<u32>) -> Self {
    let mut result = Int96::new();
    result.set_data(v);
    result
  }
}

impl PartialOrd for Int96 {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    if self.value.is_none() || other.value.is_none() {
      return None;
    }
    // most significant word last on disk
    Some(self.data().iter().rev().cmp(other.data().iter().rev()))
  }
}

/// A variable-length byte array backed by a refcounted buffer slice.
#[derive(Clone, Debug, Default)]
pub struct ByteArray {
  data: Option<ByteBufferPtr>
}

impl ByteArray {
  pub fn new() -> Self {
    ByteArray { data: None }
  }

  pub fn len(&self) -> usize {
    self.data().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// The raw bytes; empty when the value was never set.
  pub fn data(&self) -> &[u8] {
    self.data.as_ref().map(|p| p.as_ref()).unwrap_or(&[])
  }

  pub fn set_data(&mut self, data: ByteBufferPtr) {
    self.data = Some(data);
  }

  /// View the bytes as UTF-8 text.
  pub fn as_utf8(&self) -> Result<&str> {
    std::str::from_utf8(self.data())
      .map_err(|e| malformed_err!("Byte array is not valid UTF-8: {}", e))
  }
}

impl From<Vec<u8>> for ByteArray {
  fn from(v: Vec<u8>) -> Self {
    ByteArray { data: Some(ByteBufferPtr::new(v)) }
  }
}

impl From<&str> for ByteArray {
  fn from(s: &str) -> Self {
    ByteArray::from(s.as_bytes().to_vec())
  }
}

impl From<ByteBufferPtr> for ByteArray {
  fn from(p: ByteBufferPtr) -> Self {
    ByteArray { data: Some(p) }
  }
}

impl PartialEq for ByteArray {
  fn eq(&self, other: &ByteArray) -> bool {
    self.data() == other.data()
  }
}

impl PartialOrd for ByteArray {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    // unsigned lexicographic, the Parquet sort order for binary
    Some(self.data().cmp(other.data()))
  }
}

/// A byte array whose length is fixed by the schema rather than stored with
/// each value. Wrapping keeps the PLAIN representations distinct.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FixedLenByteArray(ByteArray);

impl FixedLenByteArray {
  pub fn new(inner: ByteArray) -> Self {
    FixedLenByteArray(inner)
  }

  pub fn into_inner(self) -> ByteArray {
    self.0
  }
}

impl std::ops::Deref for FixedLenByteArray {
  type Target = ByteArray;

  fn deref(&self) -> &ByteArray {
    &self.0
  }
}

impl std::ops::DerefMut for FixedLenByteArray {
  fn deref_mut(&mut self) -> &mut ByteArray {
    &mut self.0
  }
}

impl From<Vec<u8>> for FixedLenByteArray {
  fn from(v: Vec<u8>) -> Self {
    FixedLenByteArray(ByteArray::from(v))
  }
}

impl From<&str> for FixedLenByteArray {
  fn from(s: &str) -> Self {
    FixedLenByteArray(ByteArray::from(s))
  }
}

impl PartialOrd for FixedLenByteArray {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    self.0.partial_cmp(&other.0)
  }
}

// ----------------------------------------------------------------------
// AsBytes

/// View a value as raw bytes, e.g. for hashing.
pub trait AsBytes {
  fn as_bytes(&self) -> &[u8];
}

macro_rules! impl_as_bytes {
  ($($ty:ty),*) => {
    $(
      impl AsBytes for $ty {
        fn as_bytes(&self) -> &[u8] {
          unsafe {
            ::std::slice::from_raw_parts(self as *const $ty as *const u8, size_of::<$ty>())
          }
        }
      }
    )*
  };
}

impl_as_bytes!(bool, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

impl AsBytes for Int96 {
  fn as_bytes(&self) -> &[u8] {
    let words = self.data();
    unsafe {
      ::std::slice::from_raw_parts(words.as_ptr() as *const u8, words.len() * 4)
    }
  }
}

impl AsBytes for ByteArray {
  fn as_bytes(&self) -> &[u8] {
    self.data()
  }
}

impl AsBytes for FixedLenByteArray {
  fn as_bytes(&self) -> &[u8] {
    self.data()
  }
}

impl AsBytes for str {
  fn as_bytes(&self) -> &[u8] {
    self.as_ref()
  }
}

impl AsBytes for String {
  fn as_bytes(&self) -> &[u8] {
    self.as_ref()
  }
}

impl AsBytes for [u8] {
  fn as_bytes(&self) -> &[u8] {
    self
  }
}

impl AsBytes for Vec<u8> {
  fn as_bytes(&self) -> &[u8] {
    self.as_slice()
  }
}

// ----------------------------------------------------------------------
// Native value behavior

/// Behavior every native value type carries: PLAIN encode/decode, dictionary
/// sizing and statistics wrapping. Keeping this on the value type lets the
/// decoders and encoders stay generic over [`DataType`] on stable Rust.
pub trait ParquetValueType:
  PartialEq + PartialOrd + fmt::Debug + Default + Clone + AsBytes + 'static
{
  const PHYSICAL_TYPE: Type;

  /// Append `values` in PLAIN representation. Booleans accumulate in
  /// `bit_writer`; every other type writes to `writer`.
  fn encode_plain<W: Write>(
    values: &[Self],
    writer: &mut W,
    bit_writer: &mut BitWriter
  ) -> Result<()>;

  /// Prepare `state` for decoding `num_values` PLAIN values from `data`.
  fn init_plain(state: &mut PlainDecoderState, data: ByteBufferPtr, num_values: usize);

  /// Decode up to `buffer.len()` PLAIN values from `state` into `buffer`,
  /// returning how many were produced.
  fn decode_plain(state: &mut PlainDecoderState, buffer: &mut [Self]) -> Result<usize>;

  /// Bytes one value occupies on a PLAIN-encoded dictionary page.
  fn dict_encoded_size(&self) -> usize;

  /// Wrap min/max/null-count statistics into the typed enum.
  fn make_statistics(min: Option<Self>, max: Option<Self>, null_count: u64) -> Statistics;

  /// Construct from a delta-decoded 64-bit integer; `None` when the type has
  /// no DELTA_BINARY_PACKED representation.
  fn try_from_i64(_v: i64) -> Option<Self> {
    None
  }

  /// Replace the value with raw bytes, used by the delta byte-array
  /// decoders.
  fn set_from_bytes(&mut self, _data: ByteBufferPtr) -> Result<()> {
    Err(unsupported_err!("This physical type does not carry raw byte data"))
  }
}

fn init_plain_default(state: &mut PlainDecoderState, data: ByteBufferPtr, num_values: usize) {
  state.data = Some(data);
  state.bit_reader = None;
  state.start = 0;
  state.num_values = num_values;
}

macro_rules! impl_numeric_value_type {
  ($ty:ty, $physical_ty:path, $stat_ctor:ident $(, $extra:item)*) => {
    impl ParquetValueType for $ty {
      const PHYSICAL_TYPE: Type = $physical_ty;

      fn encode_plain<W: Write>(
        values: &[Self],
        writer: &mut W,
        _bit_writer: &mut BitWriter
      ) -> Result<()> {
        let raw = unsafe {
          ::std::slice::from_raw_parts(
            values.as_ptr() as *const u8, size_of::<$ty>() * values.len())
        };
        writer.write_all(raw)?;
        Ok(())
      }

      fn init_plain(state: &mut PlainDecoderState, data: ByteBufferPtr, num_values: usize) {
        init_plain_default(state, data, num_values);
      }

      fn decode_plain(state: &mut PlainDecoderState, buffer: &mut [Self]) -> Result<usize> {
        let data = state.data.as_ref().expect("set_data() must be called first");
        let num_values = ::std::cmp::min(buffer.len(), state.num_values);
        let bytes_to_decode = size_of::<$ty>() * num_values;
        if data.len() - state.start < bytes_to_decode {
          return Err(malformed_err!("Not enough bytes to decode"));
        }
        let raw_buffer: &mut [u8] = unsafe {
          ::std::slice::from_raw_parts_mut(buffer.as_mut_ptr() as *mut u8, bytes_to_decode)
        };
        raw_buffer.copy_from_slice(data.range(state.start, bytes_to_decode).as_ref());
        state.start += bytes_to_decode;
        state.num_values -= num_values;
        Ok(num_values)
      }

      fn dict_encoded_size(&self) -> usize {
        size_of::<$ty>()
      }

      fn make_statistics(
        min: Option<Self>,
        max: Option<Self>,
        null_count: u64
      ) -> Statistics {
        Statistics::$stat_ctor(min, max, null_count)
      }

      $($extra)*
    }
  };
}

impl_numeric_value_type!(f32, Type::FLOAT, float);
impl_numeric_value_type!(f64, Type::DOUBLE, double);

impl_numeric_value_type!(
  i32, Type::INT32, int32,
  fn try_from_i64(v: i64) -> Option<Self> {
    Some(v as i32)
  }
);
impl_numeric_value_type!(
  i64, Type::INT64, int64,
  fn try_from_i64(v: i64) -> Option<Self> {
    Some(v)
  }
);

impl ParquetValueType for bool {
  const PHYSICAL_TYPE: Type = Type::BOOLEAN;

  fn encode_plain<W: Write>(
    values: &[Self],
    _writer: &mut W,
    bit_writer: &mut BitWriter
  ) -> Result<()> {
    for v in values {
      bit_writer.put_value(*v as u64, 1);
    }
    Ok(())
  }

  fn init_plain(state: &mut PlainDecoderState, data: ByteBufferPtr, num_values: usize) {
    state.data = None;
    state.bit_reader = Some(crate::util::bit_util::BitReader::new(data));
    state.start = 0;
    state.num_values = num_values;
  }

  fn decode_plain(state: &mut PlainDecoderState, buffer: &mut [Self]) -> Result<usize> {
    let bit_reader = state.bit_reader.as_mut().expect("set_data() must be called first");
    let num_values = ::std::cmp::min(buffer.len(), state.num_values);
    for i in 0..num_values {
      buffer[i] = bit_reader
        .get_value::<bool>(1)
        .ok_or_else(|| malformed_err!("Not enough bytes to decode"))?;
    }
    state.num_values -= num_values;
    Ok(num_values)
  }

  fn dict_encoded_size(&self) -> usize {
    1
  }

  fn make_statistics(min: Option<Self>, max: Option<Self>, null_count: u64) -> Statistics {
    Statistics::boolean(min, max, null_count)
  }
}

impl ParquetValueType for Int96 {
  const PHYSICAL_TYPE: Type = Type::INT96;

  fn encode_plain<W: Write>(
    values: &[Self],
    writer: &mut W,
    _bit_writer: &mut BitWriter
  ) -> Result<()> {
    for v in values {
      let words = v.data();
      if words.len() != 3 {
        return Err(malformed_err!("INT96 value is not initialized"));
      }
      for w in words {
        writer.write_all(&w.to_le_bytes())?;
      }
    }
    Ok(())
  }

  fn init_plain(state: &mut PlainDecoderState, data: ByteBufferPtr, num_values: usize) {
    init_plain_default(state, data, num_values);
  }

  fn decode_plain(state: &mut PlainDecoderState, buffer: &mut [Self]) -> Result<usize> {
    let data = state.data.as_ref().expect("set_data() must be called first");
    let num_values = ::std::cmp::min(buffer.len(), state.num_values);
    if data.len() - state.start < 12 * num_values {
      return Err(malformed_err!("Not enough bytes to decode"));
    }
    for item in buffer.iter_mut().take(num_values) {
      let bytes = data.range(state.start, 12);
      let bytes = bytes.as_ref();
      let mut words = Vec::with_capacity(3);
      for i in 0..3 {
        words.push(read_num_bytes!(u32, 4, bytes[i * 4..]));
      }
      item.set_data(words);
      state.start += 12;
    }
    state.num_values -= num_values;
    Ok(num_values)
  }

  fn dict_encoded_size(&self) -> usize {
    12
  }

  fn make_statistics(min: Option<Self>, max: Option<Self>, null_count: u64) -> Statistics {
    Statistics::int96(min, max, null_count)
  }
}

impl ParquetValueType for ByteArray {
  const PHYSICAL_TYPE: Type = Type::BYTE_ARRAY;

  fn encode_plain<W: Write>(
    values: &[Self],
    writer: &mut W,
    _bit_writer: &mut BitWriter
  ) -> Result<()> {
    for v in values {
      writer.write_all(&(v.len() as u32).to_le_bytes())?;
      writer.write_all(v.data())?;
    }
    Ok(())
  }

  fn init_plain(state: &mut PlainDecoderState, data: ByteBufferPtr, num_values: usize) {
    init_plain_default(state, data, num_values);
  }

  fn decode_plain(state: &mut PlainDecoderState, buffer: &mut [Self]) -> Result<usize> {
    let data = state.data.as_ref().expect("set_data() must be called first");
    let num_values = ::std::cmp::min(buffer.len(), state.num_values);
    for item in buffer.iter_mut().take(num_values) {
      if data.len() - state.start < 4 {
        return Err(malformed_err!("Not enough bytes to decode"));
      }
      let len = read_num_bytes!(u32, 4, data.start_from(state.start).as_ref()) as usize;
      state.start += 4;
      if data.len() - state.start < len {
        return Err(malformed_err!("Not enough bytes to decode"));
      }
      item.set_data(data.range(state.start, len));
      state.start += len;
    }
    state.num_values -= num_values;
    Ok(num_values)
  }

  fn dict_encoded_size(&self) -> usize {
    4 + self.len()
  }

  fn make_statistics(min: Option<Self>, max: Option<Self>, null_count: u64) -> Statistics {
    Statistics::byte_array(min, max, null_count)
  }

  fn set_from_bytes(&mut self, data: ByteBufferPtr) -> Result<()> {
    self.set_data(data);
    Ok(())
  }
}

impl ParquetValueType for FixedLenByteArray {
  const PHYSICAL_TYPE: Type = Type::FIXED_LEN_BYTE_ARRAY;

  fn encode_plain<W: Write>(
    values: &[Self],
    writer: &mut W,
    _bit_writer: &mut BitWriter
  ) -> Result<()> {
    for v in values {
      writer.write_all(v.data())?;
    }
    Ok(())
  }

  fn init_plain(state: &mut PlainDecoderState, data: ByteBufferPtr, num_values: usize) {
    init_plain_default(state, data, num_values);
  }

  fn decode_plain(state: &mut PlainDecoderState, buffer: &mut [Self]) -> Result<usize> {
    // width comes from the schema, not the page
    if state.type_length <= 0 {
      return Err(schema_err!(
        "FIXED_LEN_BYTE_ARRAY length must be positive, got {}", state.type_length));
    }
    let type_length = state.type_length as usize;
    let data = state.data.as_ref().expect("set_data() must be called first");
    let num_values = ::std::cmp::min(buffer.len(), state.num_values);
    if data.len() - state.start < type_length * num_values {
      return Err(malformed_err!("Not enough bytes to decode"));
    }
    for item in buffer.iter_mut().take(num_values) {
      item.set_data(data.range(state.start, type_length));
      state.start += type_length;
    }
    state.num_values -= num_values;
    Ok(num_values)
  }

  fn dict_encoded_size(&self) -> usize {
    self.len()
  }

  fn make_statistics(min: Option<Self>, max: Option<Self>, null_count: u64) -> Statistics {
    Statistics::fixed_len_byte_array(min, max, null_count)
  }
}

// ----------------------------------------------------------------------
// Physical type markers

/// Maps one Parquet physical type to its native representation and to the
/// matching reader/writer variants.
pub trait DataType: 'static {
  type T: ParquetValueType;

  fn get_physical_type() -> Type;

  fn get_type_size() -> usize;

  fn get_column_reader(column_reader: ColumnReader) -> Option<ColumnReaderImpl<Self>>
  where
    Self: Sized;

  fn get_column_writer(column_writer: ColumnWriter) -> Option<ColumnWriterImpl<Self>>
  where
    Self: Sized;

  fn make_column_data(values: Vec<Self::T>) -> ColumnData;
}

macro_rules! make_type {
  ($name:ident, $physical_ty:path, $variant:ident, $native_ty:ty, $size:expr) => {
    pub struct $name {}

    impl DataType for $name {
      type T = $native_ty;

      fn get_physical_type() -> Type {
        $physical_ty
      }

      fn get_type_size() -> usize {
        $size
      }

      fn get_column_reader(column_reader: ColumnReader) -> Option<ColumnReaderImpl<Self>> {
        match column_reader {
          ColumnReader::$variant(r) => Some(r),
          _ => None
        }
      }

      fn get_column_writer(column_writer: ColumnWriter) -> Option<ColumnWriterImpl<Self>> {
        match column_writer {
          ColumnWriter::$variant(w) => Some(w),
          _ => None
        }
      }

      fn make_column_data(values: Vec<Self::T>) -> ColumnData {
        ColumnData::$variant(values)
      }
    }
  };
}

make_type!(BoolType, Type::BOOLEAN, Bool, bool, 1);
make_type!(Int32Type, Type::INT32, Int32, i32, 4);
make_type!(Int64Type, Type::INT64, Int64, i64, 8);
make_type!(Int96Type, Type::INT96, Int96, Int96, 12);
make_type!(FloatType, Type::FLOAT, Float, f32, 4);
make_type!(DoubleType, Type::DOUBLE, Double, f64, 8);
make_type!(ByteArrayType, Type::BYTE_ARRAY, ByteArray, ByteArray, size_of::<ByteArray>());
make_type!(
  FixedLenByteArrayType, Type::FIXED_LEN_BYTE_ARRAY, FixedLenByteArray,
  FixedLenByteArray, size_of::<FixedLenByteArray>());

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_int96_data() {
    let mut value = Int96::new();
    assert_eq!(value.data(), &[] as &[u32]);
    value.set_data(vec![1, 2, 3]);
    assert_eq!(value.data(), &[1, 2, 3]);
    assert_eq!(value, Int96::from(vec![1, 2, 3]));
  }

  #[test]
  fn test_int96_ordering() {
    // the most significant word is the last one
    let small = Int96::from(vec![9, 9, 1]);
    let large = Int96::from(vec![0, 0, 2]);
    assert!(small < large);
    assert!(Int96::new().partial_cmp(&small).is_none());
  }

  #[test]
  fn test_byte_array() {
    let mut value = ByteArray::new();
    assert_eq!(value.len(), 0);
    value.set_data(ByteBufferPtr::new(vec![1, 2, 3]));
    assert_eq!(value.len(), 3);
    assert_eq!(value.data(), &[1, 2, 3]);
    assert_eq!(value, ByteArray::from(vec![1, 2, 3]));
    assert!(ByteArray::from("ab") < ByteArray::from("b"));
  }

  #[test]
  fn test_byte_array_as_utf8() {
    assert_eq!(ByteArray::from("héllo").as_utf8().unwrap(), "héllo");
    assert!(ByteArray::from(vec![0xFF, 0xFE]).as_utf8().is_err());
  }

  #[test]
  fn test_as_bytes() {
    assert_eq!(1u32.as_bytes(), &[1, 0, 0, 0]);
    assert_eq!((-1i16).as_bytes(), &[0xFF, 0xFF]);
    assert_eq!(true.as_bytes(), &[1]);
    assert_eq!("abc".as_bytes(), &[b'a', b'b', b'c']);
    assert_eq!(ByteArray::from("ab").as_bytes(), &[b'a', b'b']);
  }

  #[test]
  fn test_physical_types() {
    assert_eq!(BoolType::get_physical_type(), Type::BOOLEAN);
    assert_eq!(Int32Type::get_physical_type(), Type::INT32);
    assert_eq!(Int64Type::get_physical_type(), Type::INT64);
    assert_eq!(Int96Type::get_physical_type(), Type::INT96);
    assert_eq!(FloatType::get_physical_type(), Type::FLOAT);
    assert_eq!(DoubleType::get_physical_type(), Type::DOUBLE);
    assert_eq!(ByteArrayType::get_physical_type(), Type::BYTE_ARRAY);
    assert_eq!(FixedLenByteArrayType::get_physical_type(), Type::FIXED_LEN_BYTE_ARRAY);
  }

  #[test]
  fn test_type_sizes() {
    assert_eq!(BoolType::get_type_size(), 1);
    assert_eq!(Int32Type::get_type_size(), 4);
    assert_eq!(Int64Type::get_type_size(), 8);
    assert_eq!(Int96Type::get_type_size(), 12);
  }
}
