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

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::io::{Result as IoResult, Write};
use std::mem;
use std::rc::Rc;
use std::sync::Mutex;

use once_cell::sync::Lazy;

// ----------------------------------------------------------------------
// Mutable buffer

/// A resize-able byte buffer with `Write` support, used as encoder output.
#[derive(Debug, PartialEq)]
pub struct ByteBuffer {
  data: Vec<u8>
}

impl ByteBuffer {
  pub fn new() -> Self {
    ByteBuffer { data: vec![] }
  }

  pub fn new_with_cap(init_cap: usize) -> Self {
    ByteBuffer { data: Vec::with_capacity(init_cap) }
  }

  pub fn data(&self) -> &[u8] {
    self.data.as_slice()
  }

  pub fn set_data(&mut self, new_data: Vec<u8>) {
    self.data = new_data;
  }

  /// Hands the accumulated bytes over as an immutable buffer, leaving this
  /// buffer empty.
  pub fn consume(&mut self) -> ByteBufferPtr {
    let old_data = mem::take(&mut self.data);
    ByteBufferPtr::new(old_data)
  }

  pub fn capacity(&self) -> usize {
    self.data.capacity()
  }

  pub fn size(&self) -> usize {
    self.data.len()
  }
}

impl Default for ByteBuffer {
  fn default() -> Self {
    ByteBuffer::new()
  }
}

impl Write for ByteBuffer {
  fn write(&mut self, buf: &[u8]) -> IoResult<usize> {
    self.data.extend_from_slice(buf);
    Ok(buf.len())
  }

  fn flush(&mut self) -> IoResult<()> {
    Ok(())
  }
}

// ----------------------------------------------------------------------
// Immutable refcounted buffer

/// A slice of a reference-counted, read-only byte array. Sub-slices can be
/// created without copying; the backing array is released when the last
/// slice is dropped.
#[derive(Clone, Debug, PartialEq)]
pub struct ByteBufferPtr {
  data: Rc<Vec<u8>>,
  start: usize,
  len: usize
}

impl ByteBufferPtr {
  pub fn new(v: Vec<u8>) -> Self {
    let len = v.len();
    Self { data: Rc::new(v), start: 0, len }
  }

  pub fn start(&self) -> usize {
    self.start
  }

  pub fn len(&self) -> usize {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  /// A new slice covering the same range.
  pub fn all(&self) -> ByteBufferPtr {
    self.clone()
  }

  /// A sub-slice starting at `start` within this slice.
  pub fn start_from(&self, start: usize) -> ByteBufferPtr {
    assert!(start <= self.len);
    Self { data: self.data.clone(), start: self.start + start, len: self.len - start }
  }

  /// A sub-slice of `len` bytes starting at `start` within this slice.
  pub fn range(&self, start: usize, len: usize) -> ByteBufferPtr {
    assert!(start + len <= self.len);
    Self { data: self.data.clone(), start: self.start + start, len }
  }
}

impl AsRef<[u8]> for ByteBufferPtr {
  fn as_ref(&self) -> &[u8] {
    &self.data[self.start..self.start + self.len]
  }
}

impl Display for ByteBufferPtr {
  fn fmt(&self, f: &mut Formatter) -> FmtResult {
    write!(f, "{:?}", self.as_ref())
  }
}

impl From<Vec<u8>> for ByteBufferPtr {
  fn from(v: Vec<u8>) -> Self {
    ByteBufferPtr::new(v)
  }
}

// ----------------------------------------------------------------------
// Process-wide buffer pool

/// Upper bound on buffers the pool retains; extra returns are dropped.
const MAX_POOLED_BUFFERS: usize = 16;

/// A process-wide pool of byte buffers backing decompression scratch space.
/// Rent/return pairs are strictly scoped to one page decode; buffers must be
/// returned on error paths as well.
pub struct BufferPool {
  buffers: Mutex<Vec<Vec<u8>>>
}

static BUFFER_POOL: Lazy<BufferPool> = Lazy::new(|| BufferPool {
  buffers: Mutex::new(Vec::new())
});

/// The process-wide pool, initialized on first use and torn down at process
/// exit.
pub fn buffer_pool() -> &'static BufferPool {
  &BUFFER_POOL
}

impl BufferPool {
  /// Takes a cleared buffer with at least `min_capacity` bytes of capacity.
  pub fn rent(&self, min_capacity: usize) -> Vec<u8> {
    let mut buffers = self.buffers.lock().expect("buffer pool lock poisoned");
    let mut buffer = buffers.pop().unwrap_or_default();
    let extra = min_capacity.saturating_sub(buffer.capacity());
    if extra > 0 {
      buffer.reserve(extra);
    }
    buffer
  }

  /// Returns a rented buffer to the pool.
  pub fn put_back(&self, mut buffer: Vec<u8>) {
    buffer.clear();
    let mut buffers = self.buffers.lock().expect("buffer pool lock poisoned");
    if buffers.len() < MAX_POOLED_BUFFERS {
      buffers.push(buffer);
    }
  }

  /// Number of buffers currently parked in the pool.
  pub fn pooled(&self) -> usize {
    self.buffers.lock().expect("buffer pool lock poisoned").len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_byte_buffer() {
    let mut buffer = ByteBuffer::new();
    assert_eq!(buffer.size(), 0);
    assert_eq!(buffer.capacity(), 0);

    let buffer2 = ByteBuffer::new_with_cap(40);
    assert_eq!(buffer2.size(), 0);
    assert_eq!(buffer2.capacity(), 40);

    buffer.set_data((0..5).collect());
    assert_eq!(buffer.size(), 5);
    buffer.set_data((0..20).collect());
    assert_eq!(buffer.size(), 20);

    let expected: Vec<u8> = (0..20).collect();
    assert_eq!(buffer.data(), expected.as_slice());

    let byte_ptr = buffer.consume();
    assert_eq!(buffer.size(), 0);
    assert_eq!(byte_ptr.as_ref(), expected.as_slice());

    let values: Vec<u8> = (0..30).collect();
    buffer.write_all(values.as_slice()).unwrap();
    buffer.flush().unwrap();
    assert_eq!(buffer.data(), values.as_slice());
  }

  #[test]
  fn test_byte_ptr() {
    let values: Vec<u8> = (0..50).collect();
    let ptr = ByteBufferPtr::new(values);
    assert_eq!(ptr.len(), 50);
    assert_eq!(ptr.start(), 0);

    let ptr2 = ptr.all();
    assert_eq!(ptr2.len(), 50);
    assert_eq!(ptr2.start(), 0);

    let ptr3 = ptr.start_from(20);
    assert_eq!(ptr3.len(), 30);
    assert_eq!(ptr3.start(), 20);

    let ptr4 = ptr3.range(10, 10);
    assert_eq!(ptr4.len(), 10);
    assert_eq!(ptr4.start(), 30);

    let expected: Vec<u8> = (30..40).collect();
    assert_eq!(ptr4.as_ref(), expected.as_slice());
  }

  #[test]
  fn test_buffer_pool_reuse() {
    let pool = buffer_pool();
    let mut buffer = pool.rent(1024);
    assert!(buffer.capacity() >= 1024);
    buffer.extend_from_slice(&[1, 2, 3]);
    pool.put_back(buffer);
    assert!(pool.pooled() >= 1);

    let buffer = pool.rent(16);
    // returned buffers come back cleared
    assert!(buffer.is_empty());
    pool.put_back(buffer);
  }
}
