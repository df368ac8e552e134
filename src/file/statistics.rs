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

//! Typed min/max/null-count statistics for pages and column chunks.
//! Statistics are always optional; their absence is never an error.

use crate::basic::Type;
use crate::data_type::{ByteArray, FixedLenByteArray, Int96};

/// Statistics for one native type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedStatistics<T> {
  min: Option<T>,
  max: Option<T>,
  null_count: u64
}

impl<T: Clone> TypedStatistics<T> {
  pub fn new(min: Option<T>, max: Option<T>, null_count: u64) -> Self {
    Self { min, max, null_count }
  }

  pub fn min(&self) -> Option<&T> {
    self.min.as_ref()
  }

  pub fn max(&self) -> Option<&T> {
    self.max.as_ref()
  }

  pub fn null_count(&self) -> u64 {
    self.null_count
  }

  pub fn has_min_max(&self) -> bool {
    self.min.is_some() && self.max.is_some()
  }
}

/// Statistics tagged by physical type.
#[derive(Debug, Clone, PartialEq)]
pub enum Statistics {
  Boolean(TypedStatistics<bool>),
  Int32(TypedStatistics<i32>),
  Int64(TypedStatistics<i64>),
  Int96(TypedStatistics<Int96>),
  Float(TypedStatistics<f32>),
  Double(TypedStatistics<f64>),
  ByteArray(TypedStatistics<ByteArray>),
  FixedLenByteArray(TypedStatistics<FixedLenByteArray>)
}

macro_rules! statistics_ctor {
  ($fn_name:ident, $variant:ident, $native_ty:ty) => {
    pub fn $fn_name(min: Option<$native_ty>, max: Option<$native_ty>, null_count: u64) -> Self {
      Statistics::$variant(TypedStatistics::new(min, max, null_count))
    }
  };
}

impl Statistics {
  statistics_ctor!(boolean, Boolean, bool);
  statistics_ctor!(int32, Int32, i32);
  statistics_ctor!(int64, Int64, i64);
  statistics_ctor!(int96, Int96, Int96);
  statistics_ctor!(float, Float, f32);
  statistics_ctor!(double, Double, f64);
  statistics_ctor!(byte_array, ByteArray, ByteArray);
  statistics_ctor!(fixed_len_byte_array, FixedLenByteArray, FixedLenByteArray);

  pub fn physical_type(&self) -> Type {
    match self {
      Statistics::Boolean(_) => Type::BOOLEAN,
      Statistics::Int32(_) => Type::INT32,
      Statistics::Int64(_) => Type::INT64,
      Statistics::Int96(_) => Type::INT96,
      Statistics::Float(_) => Type::FLOAT,
      Statistics::Double(_) => Type::DOUBLE,
      Statistics::ByteArray(_) => Type::BYTE_ARRAY,
      Statistics::FixedLenByteArray(_) => Type::FIXED_LEN_BYTE_ARRAY
    }
  }

  pub fn null_count(&self) -> u64 {
    match self {
      Statistics::Boolean(s) => s.null_count(),
      Statistics::Int32(s) => s.null_count(),
      Statistics::Int64(s) => s.null_count(),
      Statistics::Int96(s) => s.null_count(),
      Statistics::Float(s) => s.null_count(),
      Statistics::Double(s) => s.null_count(),
      Statistics::ByteArray(s) => s.null_count(),
      Statistics::FixedLenByteArray(s) => s.null_count()
    }
  }

  pub fn has_min_max(&self) -> bool {
    match self {
      Statistics::Boolean(s) => s.has_min_max(),
      Statistics::Int32(s) => s.has_min_max(),
      Statistics::Int64(s) => s.has_min_max(),
      Statistics::Int96(s) => s.has_min_max(),
      Statistics::Float(s) => s.has_min_max(),
      Statistics::Double(s) => s.has_min_max(),
      Statistics::ByteArray(s) => s.has_min_max(),
      Statistics::FixedLenByteArray(s) => s.has_min_max()
    }
  }
}

/// Fold `values` into min/max using the type's comparison order. Values
/// that do not compare to themselves (NaN) never enter the bounds.
pub fn min_max_of<T: PartialOrd + Clone>(values: &[T]) -> (Option<T>, Option<T>) {
  let mut min: Option<T> = None;
  let mut max: Option<T> = None;
  for v in values {
    if v.partial_cmp(v).is_none() {
      continue;
    }
    match min {
      Some(ref m) if !(v < m) => {}
      _ => min = Some(v.clone())
    }
    match max {
      Some(ref m) if !(v > m) => {}
      _ => max = Some(v.clone())
    }
  }
  (min, max)
}
