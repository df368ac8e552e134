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

use std::fmt;

// ----------------------------------------------------------------------
// Types mirroring the Parquet format definition. Conversion from the
// Thrift footer structs happens in the metadata collaborator, not here.

/// Physical type of a primitive column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
  BOOLEAN,
  INT32,
  INT64,
  INT96,
  FLOAT,
  DOUBLE,
  BYTE_ARRAY,
  FIXED_LEN_BYTE_ARRAY
}

impl Type {
  /// Whether values of this type can serve as map keys.
  pub fn is_hashable(&self) -> bool {
    !matches!(*self, Type::FLOAT | Type::DOUBLE)
  }
}

/// Logical annotation refining the interpretation of a physical type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalType {
  NONE,
  UTF8,
  MAP,
  MAP_KEY_VALUE,
  LIST,
  ENUM,
  DECIMAL,
  DATE,
  TIME_MILLIS,
  TIME_MICROS,
  TIMESTAMP_MILLIS,
  TIMESTAMP_MICROS,
  UINT_8,
  UINT_16,
  UINT_32,
  UINT_64,
  INT_8,
  INT_16,
  INT_32,
  INT_64,
  JSON,
  BSON,
  INTERVAL
}

/// Repetition of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Repetition {
  REQUIRED,
  OPTIONAL,
  REPEATED
}

/// Page-level encodings. All variants are recognized on read; decoding
/// support is reported per encoding by the decoder layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
  PLAIN,
  PLAIN_DICTIONARY,
  RLE,
  BIT_PACKED,
  DELTA_BINARY_PACKED,
  DELTA_LENGTH_BYTE_ARRAY,
  DELTA_BYTE_ARRAY,
  RLE_DICTIONARY,
  BYTE_STREAM_SPLIT
}

/// Compression codec of a column chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compression {
  UNCOMPRESSED,
  SNAPPY,
  GZIP,
  LZO,
  BROTLI,
  ZSTD
}

/// Page kinds inside a column chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageType {
  DATA_PAGE,
  INDEX_PAGE,
  DICTIONARY_PAGE,
  DATA_PAGE_V2
}

macro_rules! impl_display_via_debug {
  ($($ty:ty),*) => {
    $(
      impl fmt::Display for $ty {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
          write!(f, "{:?}", self)
        }
      }
    )*
  };
}

impl_display_via_debug!(Type, LogicalType, Repetition, Encoding, Compression, PageType);
