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

//! Contains the `Row` enum that represents a nested record in Rust.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::basic::{LogicalType, Type as PhysicalType};
use crate::data_type::{ByteArray, Int96};

/// Reader-side configuration.
#[derive(Debug, Clone)]
pub struct ReaderOptions {
  /// When set, unannotated `BYTE_ARRAY` values that hold valid UTF-8 are
  /// returned as text instead of raw bytes.
  pub treat_byte_array_as_utf8: bool
}

impl Default for ReaderOptions {
  fn default() -> Self {
    Self { treat_byte_array_as_utf8: true }
  }
}

/// One nested value of a record.
#[derive(Clone, Debug, PartialEq)]
pub enum Row {
  /// Null value.
  Null,
  /// Boolean value.
  Bool(bool),
  /// Signed integer INT_8.
  Byte(i8),
  /// Signed integer INT_16.
  Short(i16),
  /// Signed integer INT_32.
  Int(i32),
  /// Signed integer INT_64.
  Long(i64),
  /// IEEE 32-bit floating point value.
  Float(f32),
  /// IEEE 64-bit floating point value.
  Double(f64),
  /// UTF-8 encoded character string.
  Str(String),
  /// General binary value.
  Bytes(ByteArray),
  /// Days since the Unix epoch, 1 January 1970.
  Date(u32),
  /// Milliseconds since the Unix epoch, 1 January 1970.
  Timestamp(u64),

  /// Struct, child elements are tuples of field-value pairs.
  Group(Vec<(String, Row)>),
  /// List of elements.
  List(Vec<Row>),
  /// List of key-value pairs.
  Map(Vec<(Row, Row)>)
}

impl Row {
  /// Converts a BOOLEAN value.
  pub fn convert_bool(
    _physical_type: PhysicalType,
    _logical_type: LogicalType,
    value: bool
  ) -> Self {
    Row::Bool(value)
  }

  /// Converts an INT32 value according to its annotation.
  pub fn convert_int32(
    _physical_type: PhysicalType,
    logical_type: LogicalType,
    value: i32
  ) -> Self {
    match logical_type {
      LogicalType::INT_8 => Row::Byte(value as i8),
      LogicalType::INT_16 => Row::Short(value as i16),
      LogicalType::DATE => Row::Date(value as u32),
      _ => Row::Int(value)
    }
  }

  /// Converts an INT64 value according to its annotation.
  pub fn convert_int64(
    _physical_type: PhysicalType,
    logical_type: LogicalType,
    value: i64
  ) -> Self {
    match logical_type {
      LogicalType::TIMESTAMP_MILLIS => Row::Timestamp(value as u64),
      LogicalType::TIMESTAMP_MICROS => Row::Timestamp((value / 1000) as u64),
      _ => Row::Long(value)
    }
  }

  /// Converts an INT96 legacy nanosecond timestamp into milliseconds since
  /// the epoch.
  pub fn convert_int96(
    _physical_type: PhysicalType,
    _logical_type: LogicalType,
    value: Int96
  ) -> Self {
    const JULIAN_TO_UNIX_EPOCH_DAYS: u64 = 2_440_588;
    const MILLIS_IN_A_DAY: u64 = 86_400_000;
    const NANOS_IN_A_DAY: u64 = MILLIS_IN_A_DAY * 1_000_000;

    let words = value.data();
    if words.len() != 3 {
      return Row::Null;
    }
    let days_since_epoch = (words[2] as u64).saturating_sub(JULIAN_TO_UNIX_EPOCH_DAYS);
    let nanoseconds = ((words[1] as u64) << 32) + words[0] as u64;
    let nanos = days_since_epoch
      .wrapping_mul(NANOS_IN_A_DAY)
      .wrapping_add(nanoseconds);

    Row::Timestamp(nanos / 1_000_000)
  }

  /// Converts a FLOAT value.
  pub fn convert_float(
    _physical_type: PhysicalType,
    _logical_type: LogicalType,
    value: f32
  ) -> Self {
    Row::Float(value)
  }

  /// Converts a DOUBLE value.
  pub fn convert_double(
    _physical_type: PhysicalType,
    _logical_type: LogicalType,
    value: f64
  ) -> Self {
    Row::Double(value)
  }

  /// Converts a BYTE_ARRAY or FIXED_LEN_BYTE_ARRAY value into either a
  /// UTF-8 string or raw bytes. Unannotated byte arrays become text when
  /// `treat_as_utf8` is set and the bytes are valid UTF-8.
  pub fn convert_byte_array(
    physical_type: PhysicalType,
    logical_type: LogicalType,
    value: ByteArray,
    treat_as_utf8: bool
  ) -> Self {
    match (physical_type, logical_type) {
      (PhysicalType::BYTE_ARRAY, LogicalType::UTF8)
      | (PhysicalType::BYTE_ARRAY, LogicalType::ENUM)
      | (PhysicalType::BYTE_ARRAY, LogicalType::JSON) => {
        Row::Str(String::from_utf8_lossy(value.data()).into_owned())
      }
      (PhysicalType::BYTE_ARRAY, LogicalType::NONE) if treat_as_utf8 => {
        match std::str::from_utf8(value.data()) {
          Ok(s) => Row::Str(s.to_owned()),
          Err(_) => Row::Bytes(value)
        }
      }
      _ => Row::Bytes(value)
    }
  }
}

/// Render a date (days since the epoch, UTC) as a string with its offset.
#[inline]
pub fn convert_date_to_string(value: u32) -> String {
  const NUM_SECONDS_IN_DAY: i64 = 60 * 60 * 24;
  match DateTime::<Utc>::from_timestamp(value as i64 * NUM_SECONDS_IN_DAY, 0) {
    Some(dt) => format!("{}", dt.format("%Y-%m-%d %:z")),
    None => format!("{} days since epoch", value)
  }
}

/// Render a timestamp (milliseconds since the epoch, UTC) as a string with
/// its offset.
#[inline]
pub fn convert_timestamp_to_string(value: u64) -> String {
  match DateTime::<Utc>::from_timestamp((value / 1000) as i64, 0) {
    Some(dt) => format!("{}", dt.format("%Y-%m-%d %H:%M:%S %:z")),
    None => format!("{} ms since epoch", value)
  }
}

impl fmt::Display for Row {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match *self {
      Row::Null => write!(f, "null"),
      Row::Bool(value) => write!(f, "{}", value),
      Row::Byte(value) => write!(f, "{}", value),
      Row::Short(value) => write!(f, "{}", value),
      Row::Int(value) => write!(f, "{}", value),
      Row::Long(value) => write!(f, "{}", value),
      Row::Float(value) => write!(f, "{:?}", value),
      Row::Double(value) => write!(f, "{:?}", value),
      Row::Str(ref value) => write!(f, "\"{}\"", value),
      Row::Bytes(ref value) => write!(f, "{:?}", value.data()),
      Row::Date(value) => write!(f, "{}", convert_date_to_string(value)),
      Row::Timestamp(value) => write!(f, "{}", convert_timestamp_to_string(value)),
      Row::Group(ref fields) => {
        write!(f, "{{")?;
        for (i, (key, value)) in fields.iter().enumerate() {
          write!(f, "{}: {}", key, value)?;
          if i < fields.len() - 1 {
            write!(f, ", ")?;
          }
        }
        write!(f, "}}")
      }
      Row::List(ref elements) => {
        write!(f, "[")?;
        for (i, element) in elements.iter().enumerate() {
          element.fmt(f)?;
          if i < elements.len() - 1 {
            write!(f, ", ")?;
          }
        }
        write!(f, "]")
      }
      Row::Map(ref pairs) => {
        write!(f, "{{")?;
        for (i, (key, value)) in pairs.iter().enumerate() {
          write!(f, "{} -> {}", key, value)?;
          if i < pairs.len() - 1 {
            write!(f, ", ")?;
          }
        }
        write!(f, "}}")
      }
    }
  }
}
