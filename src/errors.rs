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

use std::io;
use std::result;

quick_error! {
  #[derive(Debug)]
  pub enum ParquetError {
    /// The byte stream violates the Parquet wire format: varint overflow,
    /// fixed-width value wider than 4 bytes, truncated page, bad magic.
    Malformed(message: String) {
      display("Malformed data: {}", message)
    }
    /// A recognized encoding or codec this build does not decode.
    Unsupported(message: String) {
      display("Unsupported: {}", message)
    }
    /// Schema construction or lookup violated the tree rules, e.g. a list
    /// group carrying two items or duplicate field names in a struct.
    Schema(message: String) {
      display("Schema error: {}", message)
    }
    /// Definition/repetition levels disagree with the declared shape, e.g.
    /// record assembly yields a row count different from the metadata.
    LevelMismatch(message: String) {
      display("Level mismatch: {}", message)
    }
    /// Caller requested column data under a type incompatible with the
    /// column's physical type.
    TypeMismatch(message: String) {
      display("Type mismatch: {}", message)
    }
    /// The underlying byte source failed; the source error is kept verbatim.
    Io(message: String, err: io::Error) {
      from(err: io::Error) -> ("underlying IO error".to_owned(), err)
      display("IO error: {}, {}", message, err)
    }
  }
}

pub type Result<T> = result::Result<T, ParquetError>;

/// Convenient macros to construct each error kind

macro_rules! malformed_err {
  ($fmt:expr) => ($crate::errors::ParquetError::Malformed($fmt.to_owned()));
  ($fmt:expr, $($args:expr),*) => (
    $crate::errors::ParquetError::Malformed(format!($fmt, $($args),*)));
}

macro_rules! unsupported_err {
  ($fmt:expr) => ($crate::errors::ParquetError::Unsupported($fmt.to_owned()));
  ($fmt:expr, $($args:expr),*) => (
    $crate::errors::ParquetError::Unsupported(format!($fmt, $($args),*)));
}

macro_rules! schema_err {
  ($fmt:expr) => ($crate::errors::ParquetError::Schema($fmt.to_owned()));
  ($fmt:expr, $($args:expr),*) => (
    $crate::errors::ParquetError::Schema(format!($fmt, $($args),*)));
}

macro_rules! level_err {
  ($fmt:expr) => ($crate::errors::ParquetError::LevelMismatch($fmt.to_owned()));
  ($fmt:expr, $($args:expr),*) => (
    $crate::errors::ParquetError::LevelMismatch(format!($fmt, $($args),*)));
}

macro_rules! type_err {
  ($fmt:expr) => ($crate::errors::ParquetError::TypeMismatch($fmt.to_owned()));
  ($fmt:expr, $($args:expr),*) => (
    $crate::errors::ParquetError::TypeMismatch(format!($fmt, $($args),*)));
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_display() {
    assert_eq!(
      malformed_err!("unterminated varint").to_string(),
      "Malformed data: unterminated varint");
    assert_eq!(
      unsupported_err!("encoding {}", "BYTE_STREAM_SPLIT").to_string(),
      "Unsupported: encoding BYTE_STREAM_SPLIT");
    assert_eq!(
      schema_err!("list group has {} items", 2).to_string(),
      "Schema error: list group has 2 items");
    assert_eq!(
      level_err!("expected {} rows, assembled {}", 4, 3).to_string(),
      "Level mismatch: expected 4 rows, assembled 3");
    assert_eq!(
      type_err!("INT32 column read as INT64").to_string(),
      "Type mismatch: INT32 column read as INT64");
  }

  #[test]
  fn test_io_conversion() {
    fn fail() -> Result<()> {
      Err(io::Error::new(io::ErrorKind::UnexpectedEof, "eof"))?;
      Ok(())
    }
    match fail() {
      Err(ParquetError::Io(msg, _)) => assert_eq!(msg, "underlying IO error"),
      other => panic!("Expected Io error, got {:?}", other)
    }
  }
}
