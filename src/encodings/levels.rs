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

//! Definition/repetition level streams. Thin wrappers over the hybrid codec
//! handling the framing difference between data page versions: v1 embeds the
//! stream behind a 4-byte little-endian length prefix, v2 stores it at a
//! header-declared range with no prefix.

use byteorder::{ByteOrder, LittleEndian};

use crate::basic::Encoding;
use crate::encodings::rle::{RleDecoder, RleEncoder};
use crate::errors::Result;
use crate::util::bit_util::log2;
use crate::util::memory::ByteBufferPtr;

/// Bytes of the v1 length prefix.
const LENGTH_PREFIX_SIZE: usize = 4;

/// An encoder for definition/repetition levels. Currently only the RLE
/// encoding is supported.
pub struct LevelEncoder {
  encoding: Encoding,
  rle_encoder: RleEncoder
}

impl LevelEncoder {
  pub fn new(encoding: Encoding, max_level: i16, byte_buffer: Vec<u8>) -> Self {
    assert!(encoding == Encoding::RLE, "Only RLE level encoding is supported");
    let bit_width = log2(max_level as u64 + 1);
    Self {
      encoding,
      rle_encoder: RleEncoder::new_from_buf(bit_width, byte_buffer, LENGTH_PREFIX_SIZE)
    }
  }

  pub fn encoding(&self) -> Encoding {
    self.encoding
  }

  /// Buffer `levels`, returning how many were consumed.
  pub fn put(&mut self, levels: &[i16]) -> Result<usize> {
    let mut num_encoded = 0;
    for level in levels {
      if !self.rle_encoder.put(*level as u64)? {
        break;
      }
      num_encoded += 1;
    }
    Ok(num_encoded)
  }

  /// Size to pre-allocate for `num_buffered_values` levels, the length
  /// prefix included.
  pub fn max_buffer_size(encoding: Encoding, max_level: i16, num_buffered_values: usize) -> usize {
    let bit_width = log2(max_level as u64 + 1);
    match encoding {
      Encoding::RLE => {
        RleEncoder::max_buffer_size(bit_width, num_buffered_values) + LENGTH_PREFIX_SIZE
      }
      _ => panic!("Unsupported level encoding {}", encoding)
    }
  }

  /// Finalize the stream: flush the encoder and fill in the v1 length
  /// prefix.
  pub fn consume(self) -> Result<Vec<u8>> {
    let mut encoded_data = self.rle_encoder.consume();
    let payload_len = (encoded_data.len() - LENGTH_PREFIX_SIZE) as i32;
    LittleEndian::write_i32(&mut encoded_data[0..LENGTH_PREFIX_SIZE], payload_len);
    Ok(encoded_data)
  }
}

/// A decoder for definition/repetition levels. Currently only the RLE
/// encoding is supported.
pub struct LevelDecoder {
  encoding: Encoding,
  rle_decoder: RleDecoder
}

impl LevelDecoder {
  pub fn new(encoding: Encoding, max_level: i16) -> Self {
    assert!(encoding == Encoding::RLE, "Only RLE level encoding is supported");
    let bit_width = log2(max_level as u64 + 1);
    Self { encoding, rle_decoder: RleDecoder::new(bit_width) }
  }

  pub fn encoding(&self) -> Encoding {
    self.encoding
  }

  /// Consume a v1 length-prefixed stream from the front of `data`. Returns
  /// the total number of bytes this stream occupies, prefix included.
  pub fn set_data(&mut self, data: ByteBufferPtr) -> Result<usize> {
    if data.len() < LENGTH_PREFIX_SIZE {
      return Err(malformed_err!(
        "Level stream too short for its length prefix: {} bytes", data.len()));
    }
    let data_size = LittleEndian::read_i32(&data.as_ref()[0..LENGTH_PREFIX_SIZE]);
    if data_size < 0 || LENGTH_PREFIX_SIZE + data_size as usize > data.len() {
      return Err(malformed_err!(
        "Level stream length {} exceeds the {} remaining bytes",
        data_size, data.len() - LENGTH_PREFIX_SIZE));
    }
    self.rle_decoder.set_data(data.range(LENGTH_PREFIX_SIZE, data_size as usize));
    Ok(LENGTH_PREFIX_SIZE + data_size as usize)
  }

  /// Use `len` bytes at `start` as the stream, for v2 pages where the range
  /// is declared in the page header. Returns the number of bytes consumed.
  pub fn set_data_range(&mut self, data: &ByteBufferPtr, start: usize, len: usize) -> Result<usize> {
    if start + len > data.len() {
      return Err(malformed_err!(
        "Level stream range {}..{} exceeds the buffer of {} bytes",
        start, start + len, data.len()));
    }
    self.rle_decoder.set_data(data.range(start, len));
    Ok(len)
  }

  /// Decode levels into `buffer`, returning how many were produced.
  pub fn get(&mut self, buffer: &mut [i16]) -> Result<usize> {
    self.rle_decoder.get_batch::<i16>(buffer)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn roundtrip(levels: &[i16], max_level: i16) {
    let size = LevelEncoder::max_buffer_size(Encoding::RLE, max_level, levels.len());
    let mut encoder = LevelEncoder::new(Encoding::RLE, max_level, vec![0; size]);
    assert_eq!(encoder.put(levels).expect("put() should be OK"), levels.len());
    let encoded = encoder.consume().expect("consume() should be OK");

    let mut decoder = LevelDecoder::new(Encoding::RLE, max_level);
    let consumed = decoder.set_data(ByteBufferPtr::new(encoded.clone())).unwrap();
    assert_eq!(consumed, encoded.len());
    let mut buffer = vec![0i16; levels.len()];
    let num_decoded = decoder.get(&mut buffer).expect("get() should be OK");
    assert_eq!(num_decoded, levels.len());
    assert_eq!(buffer, levels);
  }

  #[test]
  fn test_roundtrip_one() {
    roundtrip(&[0, 1, 1, 1, 1, 0, 0, 0, 0, 1], 1);
  }

  #[test]
  fn test_roundtrip_wide() {
    roundtrip(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9], 10);
  }

  #[test]
  fn test_roundtrip_empty() {
    roundtrip(&[], 3);
  }

  #[test]
  fn test_decoder_set_data_range() {
    // one shared buffer holding repetition levels then definition levels,
    // both unprefixed, as in a v2 data page
    let max_rep_level = 1;
    let size = LevelEncoder::max_buffer_size(Encoding::RLE, max_rep_level, 6);
    let mut encoder = LevelEncoder::new(Encoding::RLE, max_rep_level, vec![0; size]);
    encoder.put(&[0, 1, 1, 0, 0, 1]).unwrap();
    let rep_bytes = encoder.consume().unwrap()[4..].to_vec();
    let rep_len = rep_bytes.len();

    let max_def_level = 2;
    let size = LevelEncoder::max_buffer_size(Encoding::RLE, max_def_level, 6);
    let mut encoder = LevelEncoder::new(Encoding::RLE, max_def_level, vec![0; size]);
    encoder.put(&[2, 2, 0, 2, 2, 2]).unwrap();
    let def_bytes = encoder.consume().unwrap()[4..].to_vec();

    let mut combined = rep_bytes;
    combined.extend_from_slice(&def_bytes);
    let def_len = combined.len() - rep_len;
    let buffer = ByteBufferPtr::new(combined);

    let mut decoder = LevelDecoder::new(Encoding::RLE, max_rep_level);
    assert_eq!(decoder.set_data_range(&buffer, 0, rep_len).unwrap(), rep_len);
    let mut result = vec![0i16; 6];
    assert_eq!(decoder.get(&mut result).unwrap(), 6);
    assert_eq!(result, vec![0, 1, 1, 0, 0, 1]);

    let mut decoder = LevelDecoder::new(Encoding::RLE, max_def_level);
    assert_eq!(decoder.set_data_range(&buffer, rep_len, def_len).unwrap(), def_len);
    let mut result = vec![0i16; 6];
    assert_eq!(decoder.get(&mut result).unwrap(), 6);
    assert_eq!(result, vec![2, 2, 0, 2, 2, 2]);
  }

  #[test]
  fn test_decoder_truncated_prefix() {
    let mut decoder = LevelDecoder::new(Encoding::RLE, 1);
    assert!(decoder.set_data(ByteBufferPtr::new(vec![1, 0])).is_err());
  }

  #[test]
  fn test_decoder_length_beyond_buffer() {
    // prefix declares 100 payload bytes, only 2 present
    let mut decoder = LevelDecoder::new(Encoding::RLE, 1);
    let data = vec![100, 0, 0, 0, 2, 0];
    assert!(decoder.set_data(ByteBufferPtr::new(data)).is_err());
  }
}
