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

//! RLE/bit-packed hybrid encoding, the Parquet integer stream format used
//! for definition levels, repetition levels and dictionary indices:
//!
//! ```text
//! stream         := <length:int32-LE>? <run>*
//! run            := rle-run | bit-packed-run
//! rle-run        := varint(count << 1)        value:fixed-width(ceil(bit-width / 8))
//! bit-packed-run := varint((groups << 1) | 1) values:bit-packed, 8 * groups values
//! ```
//!
//! The length prefix is handled by the level codec, not here.

use std::cmp;
use std::mem::size_of;

use crate::errors::Result;
use crate::util::bit_util::{self, BitReader, BitWriter, FromBytes};
use crate::util::memory::ByteBufferPtr;

/// Widest value the hybrid codec carries. A width of 32 would overflow the
/// run value masks and is rejected as malformed instead.
pub const MAX_HYBRID_BIT_WIDTH: usize = 31;

/// Longest run a single RLE header may declare.
const MAX_RLE_RUN_LEN: u64 = (i32::MAX >> 1) as u64;

// ----------------------------------------------------------------------
// Decoder

pub struct RleDecoder {
  /// Number of bits used to encode each value.
  bit_width: usize,

  /// Bit reader loaded with the input buffer.
  bit_reader: Option<BitReader>,

  /// Remaining values in the current RLE run.
  rle_left: u64,

  /// Remaining values in the current bit-packed run.
  bit_packed_left: u64,

  /// The repeated value of the current RLE run.
  current_value: u64,

  /// Set once the stream has terminated, by exhaustion, a zero-count run or
  /// a truncated bit-packed tail.
  done: bool
}

impl RleDecoder {
  pub fn new(bit_width: usize) -> Self {
    RleDecoder {
      bit_width,
      bit_reader: None,
      rle_left: 0,
      bit_packed_left: 0,
      current_value: 0,
      done: false
    }
  }

  pub fn set_data(&mut self, data: ByteBufferPtr) {
    match self.bit_reader {
      Some(ref mut bit_reader) => bit_reader.reset(data),
      None => self.bit_reader = Some(BitReader::new(data))
    }
    self.rle_left = 0;
    self.bit_packed_left = 0;
    self.current_value = 0;
    self.done = false;
  }

  /// Decode values into `buffer` until either the stream is exhausted or the
  /// buffer is full, returning the number of values produced.
  pub fn get_batch<T: FromBytes + Clone>(&mut self, buffer: &mut [T]) -> Result<usize> {
    self.check_bit_width()?;
    assert!(self.bit_reader.is_some(), "set_data() must be called first");
    assert!(size_of::<T>() <= 8);

    if self.bit_width == 0 {
      // every run repeats the only representable value
      for item in buffer.iter_mut() {
        *item = T::from_u64(0);
      }
      return Ok(buffer.len());
    }

    let mut values_read = 0;
    while values_read < buffer.len() {
      if self.rle_left > 0 {
        let num_values = cmp::min((buffer.len() - values_read) as u64, self.rle_left) as usize;
        let repeated = T::from_u64(self.current_value);
        for i in 0..num_values {
          buffer[values_read + i] = repeated.clone();
        }
        self.rle_left -= num_values as u64;
        values_read += num_values;
      } else if self.bit_packed_left > 0 {
        let num_values =
          cmp::min((buffer.len() - values_read) as u64, self.bit_packed_left) as usize;
        let bit_reader = self.bit_reader.as_mut().unwrap();
        for i in 0..num_values {
          match bit_reader.get_value::<T>(self.bit_width) {
            Some(v) => buffer[values_read + i] = v,
            None => {
              // the last run of a page is allowed to be cut short
              self.bit_packed_left = 0;
              self.done = true;
              return Ok(values_read + i);
            }
          }
        }
        self.bit_packed_left -= num_values as u64;
        values_read += num_values;
      } else if !self.reload()? {
        break;
      }
    }

    Ok(values_read)
  }

  /// Decode dictionary indices and materialize them against `dict`.
  pub fn get_batch_with_dict<T: Clone>(
    &mut self,
    dict: &[T],
    buffer: &mut [T],
    max_values: usize
  ) -> Result<usize> {
    self.check_bit_width()?;
    assert!(buffer.len() >= max_values);
    assert!(self.bit_reader.is_some(), "set_data() must be called first");

    if self.bit_width == 0 {
      let value = self.dict_value(dict, 0)?;
      for item in buffer.iter_mut().take(max_values) {
        *item = value.clone();
      }
      return Ok(max_values);
    }

    let mut values_read = 0;
    while values_read < max_values {
      if self.rle_left > 0 {
        let num_values = cmp::min((max_values - values_read) as u64, self.rle_left) as usize;
        let value = self.dict_value(dict, self.current_value as usize)?;
        for i in 0..num_values {
          buffer[values_read + i] = value.clone();
        }
        self.rle_left -= num_values as u64;
        values_read += num_values;
      } else if self.bit_packed_left > 0 {
        let num_values =
          cmp::min((max_values - values_read) as u64, self.bit_packed_left) as usize;
        let mut truncated_at = None;
        {
          let bit_reader = self.bit_reader.as_mut().unwrap();
          for i in 0..num_values {
            match bit_reader.get_value::<u32>(self.bit_width) {
              Some(index) if (index as usize) < dict.len() => {
                buffer[values_read + i] = dict[index as usize].clone();
              }
              Some(index) => {
                return Err(malformed_err!(
                  "Dictionary index {} out of bounds for dictionary of {} entries",
                  index, dict.len()));
              }
              None => {
                truncated_at = Some(i);
                break;
              }
            }
          }
        }
        if let Some(read) = truncated_at {
          self.bit_packed_left = 0;
          self.done = true;
          return Ok(values_read + read);
        }
        self.bit_packed_left -= num_values as u64;
        values_read += num_values;
      } else if !self.reload()? {
        break;
      }
    }

    Ok(values_read)
  }

  fn dict_value<'d, T>(&self, dict: &'d [T], index: usize) -> Result<&'d T> {
    dict.get(index).ok_or_else(|| {
      malformed_err!(
        "Dictionary index {} out of bounds for dictionary of {} entries",
        index, dict.len())
    })
  }

  fn check_bit_width(&self) -> Result<()> {
    if self.bit_width > MAX_HYBRID_BIT_WIDTH {
      return Err(malformed_err!(
        "Hybrid stream bit width {} exceeds the maximum of {}",
        self.bit_width, MAX_HYBRID_BIT_WIDTH));
    }
    Ok(())
  }

  /// Read the next run header. Returns false when the stream ends, either by
  /// running out of bytes or through a zero-count RLE run.
  fn reload(&mut self) -> Result<bool> {
    if self.done {
      return Ok(false);
    }
    let bit_reader = self.bit_reader.as_mut().unwrap();
    if bit_reader.bytes_left() == 0 {
      self.done = true;
      return Ok(false);
    }
    let indicator = bit_reader.get_vlq_int()?;
    if indicator > u32::MAX as u64 {
      return Err(malformed_err!("Hybrid run header {} overflows 32 bits", indicator));
    }
    if indicator & 1 == 1 {
      self.bit_packed_left = (indicator >> 1) * 8;
      Ok(true)
    } else {
      let count = indicator >> 1;
      if count == 0 {
        // zero-count run: terminate instead of spinning on corrupt data
        self.done = true;
        return Ok(false);
      }
      self.rle_left = count;
      let value_width = bit_util::ceil(self.bit_width as i64, 8) as usize;
      self.current_value = bit_reader.get_aligned::<u64>(value_width)?;
      Ok(true)
    }
  }
}

// ----------------------------------------------------------------------
// Encoder

/// Encoder for the hybrid stream. Emits RLE runs only, a conformant subset
/// the decoder round-trips exactly; bit-packed output is accepted on decode
/// but never produced.
pub struct RleEncoder {
  /// Number of bits used to encode each value.
  bit_width: usize,

  /// Output writer.
  bit_writer: BitWriter,

  /// Value of the run being accumulated.
  current_value: u64,

  /// Occurrences of `current_value` seen and not yet flushed.
  repeat_count: u64
}

impl RleEncoder {
  pub fn new(bit_width: usize, buffer_len: usize) -> Self {
    Self::new_from_buf(bit_width, Vec::with_capacity(buffer_len), 0)
  }

  /// Initialize the encoder from an existing buffer, leaving the first
  /// `start` bytes untouched for a framing prefix.
  pub fn new_from_buf(bit_width: usize, buffer: Vec<u8>, start: usize) -> Self {
    RleEncoder {
      bit_width,
      bit_writer: BitWriter::new_from_buf(buffer, start),
      current_value: 0,
      repeat_count: 0
    }
  }

  /// Upper bound on the encoded size of `num_values` values.
  pub fn max_buffer_size(bit_width: usize, num_values: usize) -> usize {
    // worst case is a run per value: a one-byte header plus the value
    num_values * (1 + bit_util::ceil(bit_width as i64, 8) as usize)
      + Self::min_buffer_size(bit_width)
  }

  /// Conservative size of a single run.
  pub fn min_buffer_size(bit_width: usize) -> usize {
    bit_util::MAX_VLQ_BYTE_LEN + bit_util::ceil(bit_width as i64, 8) as usize
  }

  /// Buffer one value. The returned flag reports whether the encoder can
  /// accept further values; with a growable buffer it always can.
  pub fn put(&mut self, value: u64) -> Result<bool> {
    if self.bit_width > MAX_HYBRID_BIT_WIDTH {
      return Err(malformed_err!(
        "Hybrid stream bit width {} exceeds the maximum of {}",
        self.bit_width, MAX_HYBRID_BIT_WIDTH));
    }
    if self.repeat_count == 0 {
      self.current_value = value;
      self.repeat_count = 1;
    } else if value == self.current_value {
      self.repeat_count += 1;
      if self.repeat_count >= MAX_RLE_RUN_LEN {
        self.flush_rle_run();
      }
    } else {
      self.flush_rle_run();
      self.current_value = value;
      self.repeat_count = 1;
    }
    Ok(true)
  }

  /// Flush the open run into the output.
  pub fn flush(&mut self) -> Result<()> {
    self.flush_rle_run();
    Ok(())
  }

  /// Number of payload bytes written so far, the open run excluded.
  pub fn len(&self) -> usize {
    self.bit_writer.bytes_written()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0 && self.repeat_count == 0
  }

  /// Flush and return the output buffer, reserved prefix included.
  pub fn consume(mut self) -> Vec<u8> {
    self.flush_rle_run();
    self.bit_writer.consume()
  }

  fn flush_rle_run(&mut self) {
    if self.repeat_count == 0 {
      return;
    }
    self.bit_writer.put_vlq_int(self.repeat_count << 1);
    let value_width = bit_util::ceil(self.bit_width as i64, 8) as usize;
    self.bit_writer.put_aligned(self.current_value, value_width);
    self.repeat_count = 0;
  }
}
