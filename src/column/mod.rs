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

//! Column chunk access: pages, typed readers and writers, and the flat
//! `DataColumn` triple of values plus definition/repetition levels that the
//! record assembler consumes.

pub mod page;
pub mod reader;
pub mod writer;

use crate::basic::Type as PhysicalType;
use crate::data_type::{ByteArray, FixedLenByteArray, Int96};
use crate::errors::Result;
use crate::schema::types::ColumnDescPtr;

/// Decoded values of one leaf column, tagged by physical type.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
  Bool(Vec<bool>),
  Int32(Vec<i32>),
  Int64(Vec<i64>),
  Int96(Vec<Int96>),
  Float(Vec<f32>),
  Double(Vec<f64>),
  ByteArray(Vec<ByteArray>),
  FixedLenByteArray(Vec<FixedLenByteArray>)
}

impl ColumnData {
  pub fn len(&self) -> usize {
    match self {
      ColumnData::Bool(v) => v.len(),
      ColumnData::Int32(v) => v.len(),
      ColumnData::Int64(v) => v.len(),
      ColumnData::Int96(v) => v.len(),
      ColumnData::Float(v) => v.len(),
      ColumnData::Double(v) => v.len(),
      ColumnData::ByteArray(v) => v.len(),
      ColumnData::FixedLenByteArray(v) => v.len()
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn physical_type(&self) -> PhysicalType {
    match self {
      ColumnData::Bool(_) => PhysicalType::BOOLEAN,
      ColumnData::Int32(_) => PhysicalType::INT32,
      ColumnData::Int64(_) => PhysicalType::INT64,
      ColumnData::Int96(_) => PhysicalType::INT96,
      ColumnData::Float(_) => PhysicalType::FLOAT,
      ColumnData::Double(_) => PhysicalType::DOUBLE,
      ColumnData::ByteArray(_) => PhysicalType::BYTE_ARRAY,
      ColumnData::FixedLenByteArray(_) => PhysicalType::FIXED_LEN_BYTE_ARRAY
    }
  }
}

/// One fully decoded column chunk: present values only, plus the level
/// arrays needed to reconstruct nesting and nulls.
///
/// Invariants, checked at construction:
/// - definition levels are present iff the column's max definition level is
///   positive, and likewise for repetition levels;
/// - the number of values equals the number of slots whose definition level
///   equals the maximum (only leaf-present slots materialize a value).
pub struct DataColumn {
  descr: ColumnDescPtr,
  values: ColumnData,
  def_levels: Option<Vec<i16>>,
  rep_levels: Option<Vec<i16>>
}

impl DataColumn {
  pub fn new(
    descr: ColumnDescPtr,
    values: ColumnData,
    def_levels: Option<Vec<i16>>,
    rep_levels: Option<Vec<i16>>
  ) -> Result<Self> {
    if descr.physical_type() != values.physical_type() {
      return Err(type_err!(
        "Column {} is {}, got {} values",
        descr.path(), descr.physical_type(), values.physical_type()));
    }
    if (descr.max_def_level() > 0) != def_levels.is_some() {
      return Err(level_err!(
        "Column {} with max definition level {} {} definition levels",
        descr.path(), descr.max_def_level(),
        if def_levels.is_some() { "must not carry" } else { "requires" }));
    }
    if (descr.max_rep_level() > 0) != rep_levels.is_some() {
      return Err(level_err!(
        "Column {} with max repetition level {} {} repetition levels",
        descr.path(), descr.max_rep_level(),
        if rep_levels.is_some() { "must not carry" } else { "requires" }));
    }
    if let (Some(defs), Some(reps)) = (&def_levels, &rep_levels) {
      if defs.len() != reps.len() {
        return Err(level_err!(
          "Column {} has {} definition levels but {} repetition levels",
          descr.path(), defs.len(), reps.len()));
      }
    }
    if let Some(defs) = &def_levels {
      let present = defs.iter().filter(|&&d| d == descr.max_def_level()).count();
      if present != values.len() {
        return Err(level_err!(
          "Column {} has {} values but {} slots at the max definition level",
          descr.path(), values.len(), present));
      }
      if let Some(&bad) = defs.iter().find(|&&d| d < 0 || d > descr.max_def_level()) {
        return Err(level_err!(
          "Column {} definition level {} outside [0, {}]",
          descr.path(), bad, descr.max_def_level()));
      }
    }
    Ok(Self { descr, values, def_levels, rep_levels })
  }

  pub fn descr(&self) -> &ColumnDescPtr {
    &self.descr
  }

  pub fn values(&self) -> &ColumnData {
    &self.values
  }

  pub fn def_levels(&self) -> Option<&[i16]> {
    self.def_levels.as_deref()
  }

  pub fn rep_levels(&self) -> Option<&[i16]> {
    self.rep_levels.as_deref()
  }

  /// Number of level slots, i.e. values including nulls and empty
  /// containers.
  pub fn num_slots(&self) -> usize {
    match &self.def_levels {
      Some(defs) => defs.len(),
      None => self.values.len()
    }
  }

  /// Number of top-level rows this column spans: slots starting a new row.
  pub fn num_rows(&self) -> usize {
    match &self.rep_levels {
      Some(reps) => reps.iter().filter(|&&r| r == 0).count(),
      None => self.num_slots()
    }
  }

  pub fn bool_values(&self) -> Result<&[bool]> {
    match &self.values {
      ColumnData::Bool(v) => Ok(v),
      other => Err(self.type_mismatch(PhysicalType::BOOLEAN, other))
    }
  }

  pub fn int32_values(&self) -> Result<&[i32]> {
    match &self.values {
      ColumnData::Int32(v) => Ok(v),
      other => Err(self.type_mismatch(PhysicalType::INT32, other))
    }
  }

  pub fn int64_values(&self) -> Result<&[i64]> {
    match &self.values {
      ColumnData::Int64(v) => Ok(v),
      other => Err(self.type_mismatch(PhysicalType::INT64, other))
    }
  }

  pub fn int96_values(&self) -> Result<&[Int96]> {
    match &self.values {
      ColumnData::Int96(v) => Ok(v),
      other => Err(self.type_mismatch(PhysicalType::INT96, other))
    }
  }

  pub fn float_values(&self) -> Result<&[f32]> {
    match &self.values {
      ColumnData::Float(v) => Ok(v),
      other => Err(self.type_mismatch(PhysicalType::FLOAT, other))
    }
  }

  pub fn double_values(&self) -> Result<&[f64]> {
    match &self.values {
      ColumnData::Double(v) => Ok(v),
      other => Err(self.type_mismatch(PhysicalType::DOUBLE, other))
    }
  }

  pub fn byte_array_values(&self) -> Result<&[ByteArray]> {
    match &self.values {
      ColumnData::ByteArray(v) => Ok(v),
      other => Err(self.type_mismatch(PhysicalType::BYTE_ARRAY, other))
    }
  }

  pub fn fixed_len_byte_array_values(&self) -> Result<&[FixedLenByteArray]> {
    match &self.values {
      ColumnData::FixedLenByteArray(v) => Ok(v),
      other => Err(self.type_mismatch(PhysicalType::FIXED_LEN_BYTE_ARRAY, other))
    }
  }

  fn type_mismatch(
    &self,
    requested: PhysicalType,
    actual: &ColumnData
  ) -> crate::errors::ParquetError {
    type_err!(
      "Column {} holds {} values, requested {}",
      self.descr.path(), actual.physical_type(), requested)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::schema::types::test_helpers;

  #[test]
  fn test_data_column_invariants() {
    let descr = test_helpers::int32_desc(); // optional leaf, max def 1

    // values must match the slots at max definition level
    let column = DataColumn::new(
      descr.clone(),
      ColumnData::Int32(vec![5, 7]),
      Some(vec![1, 0, 1]),
      None
    ).unwrap();
    assert_eq!(column.num_slots(), 3);
    assert_eq!(column.num_rows(), 3);
    assert_eq!(column.int32_values().unwrap(), &[5, 7]);

    // too few values for the present slots
    let result = DataColumn::new(
      descr.clone(),
      ColumnData::Int32(vec![5]),
      Some(vec![1, 0, 1]),
      None
    );
    assert!(result.is_err());

    // definition levels are required for an optional column
    assert!(DataColumn::new(
      descr.clone(), ColumnData::Int32(vec![1]), None, None).is_err());

    // repetition levels on a flat column are rejected
    assert!(DataColumn::new(
      descr.clone(),
      ColumnData::Int32(vec![1]),
      Some(vec![1]),
      Some(vec![0])
    ).is_err());

    // physical type mismatch
    assert!(DataColumn::new(
      descr, ColumnData::Int64(vec![1]), Some(vec![1]), None).is_err());
  }

  #[test]
  fn test_typed_accessor_mismatch() {
    let descr = test_helpers::int32_desc();
    let column = DataColumn::new(
      descr, ColumnData::Int32(vec![3]), Some(vec![1]), None).unwrap();
    assert!(column.int64_values().is_err());
    assert!(column.bool_values().is_err());
  }
}
