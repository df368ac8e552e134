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

//! Parquet schema trees: primitive and group nodes, the field builders for
//! flat, list, map and struct columns, and the leaf descriptors carrying
//! maximum definition/repetition levels.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use crate::basic::{LogicalType, Repetition, Type as PhysicalType};
use crate::errors::Result;

pub type TypePtr = Rc<Type>;
pub type SchemaDescPtr = Rc<SchemaDescriptor>;
pub type ColumnDescPtr = Rc<ColumnDescriptor>;

/// Name of the repeated wrapper group inside a three-level list.
pub const LIST_REPEATED_NAME: &str = "list";
/// Name of the repeated pair group inside a map.
pub const MAP_KEY_VALUE_NAME: &str = "key_value";

// ----------------------------------------------------------------------
// Type definitions

/// A node of a Parquet schema. The top-level schema is a `GroupType` whose
/// repetition is `None`.
#[derive(Debug, PartialEq)]
pub enum Type {
  PrimitiveType {
    basic_info: BasicTypeInfo,
    physical_type: PhysicalType,
    type_length: i32,
    scale: i32,
    precision: i32
  },
  GroupType {
    basic_info: BasicTypeInfo,
    fields: Vec<TypePtr>
  }
}

impl Type {
  /// Create a new `PrimitiveType`, validating the logical/physical type
  /// combination.
  pub fn new_primitive_type(
    name: &str,
    repetition: Repetition,
    physical_type: PhysicalType,
    logical_type: LogicalType,
    length: i32,
    precision: i32,
    scale: i32,
    id: Option<i32>
  ) -> Result<Type> {
    let basic_info = BasicTypeInfo {
      name: String::from(name),
      repetition: Some(repetition),
      logical_type,
      id
    };

    match logical_type {
      LogicalType::NONE => {}
      LogicalType::UTF8 | LogicalType::BSON | LogicalType::JSON | LogicalType::ENUM => {
        if physical_type != PhysicalType::BYTE_ARRAY {
          return Err(schema_err!("{} can only annotate BYTE_ARRAY fields", logical_type));
        }
      }
      LogicalType::DECIMAL => {
        match physical_type {
          PhysicalType::INT32 | PhysicalType::INT64 | PhysicalType::BYTE_ARRAY |
          PhysicalType::FIXED_LEN_BYTE_ARRAY => {}
          _ => {
            return Err(schema_err!(
              "DECIMAL can only annotate INT32, INT64, BYTE_ARRAY and FIXED"))
          }
        };
        if precision < 0 {
          return Err(schema_err!("Invalid DECIMAL precision: {}", precision));
        }
        if scale < 0 {
          return Err(schema_err!("Invalid DECIMAL scale: {}", scale));
        }
        if scale > precision {
          return Err(schema_err!(
            "Invalid DECIMAL: scale ({}) cannot be greater than precision ({})",
            scale, precision));
        }
      }
      LogicalType::DATE | LogicalType::TIME_MILLIS | LogicalType::UINT_8 |
      LogicalType::UINT_16 | LogicalType::UINT_32 |
      LogicalType::INT_8 | LogicalType::INT_16 | LogicalType::INT_32 => {
        if physical_type != PhysicalType::INT32 {
          return Err(schema_err!("{} can only annotate INT32", logical_type));
        }
      }
      LogicalType::TIME_MICROS | LogicalType::TIMESTAMP_MILLIS |
      LogicalType::TIMESTAMP_MICROS | LogicalType::UINT_64 | LogicalType::INT_64 => {
        if physical_type != PhysicalType::INT64 {
          return Err(schema_err!("{} can only annotate INT64", logical_type));
        }
      }
      LogicalType::INTERVAL => {
        if physical_type != PhysicalType::FIXED_LEN_BYTE_ARRAY || length != 12 {
          return Err(schema_err!("INTERVAL can only annotate FIXED(12)"));
        }
      }
      _ => {
        return Err(schema_err!("{} cannot be applied to a primitive type", logical_type));
      }
    };
    if physical_type == PhysicalType::FIXED_LEN_BYTE_ARRAY && length <= 0 {
      return Err(schema_err!("Invalid FIXED_LEN_BYTE_ARRAY length: {}", length));
    }
    Ok(Type::PrimitiveType {
      basic_info,
      physical_type,
      type_length: length,
      scale,
      precision
    })
  }

  /// Create a new `GroupType`, validating child-name uniqueness and the
  /// wrapping rules of annotated groups.
  pub fn new_group_type(
    name: &str,
    repetition: Option<Repetition>,
    logical_type: LogicalType,
    fields: Vec<TypePtr>,
    id: Option<i32>
  ) -> Result<Type> {
    let mut names = HashSet::new();
    for field in &fields {
      if !names.insert(field.name().to_owned()) {
        return Err(schema_err!(
          "Group '{}' already has a field named '{}'", name, field.name()));
      }
    }

    match logical_type {
      LogicalType::LIST => {
        // a list wraps exactly one repeated item
        if fields.len() != 1 {
          return Err(schema_err!(
            "List group '{}' must wrap exactly one item, found {}", name, fields.len()));
        }
        if fields[0].get_basic_info().repetition() != Repetition::REPEATED {
          return Err(schema_err!("List item of '{}' must be repeated", name));
        }
      }
      LogicalType::MAP | LogicalType::MAP_KEY_VALUE => {
        if fields.len() != 1 || !fields[0].is_group() {
          return Err(schema_err!(
            "Map group '{}' must wrap exactly one repeated key/value group", name));
        }
        let key_value = &fields[0];
        if key_value.get_basic_info().repetition() != Repetition::REPEATED
          || key_value.get_fields().len() != 2
        {
          return Err(schema_err!(
            "Map group '{}' must wrap a repeated group with key and value", name));
        }
        let key = &key_value.get_fields()[0];
        if key.get_basic_info().repetition() != Repetition::REQUIRED {
          return Err(schema_err!("Map key of '{}' must be required", name));
        }
      }
      _ => {}
    }

    let basic_info = BasicTypeInfo {
      name: String::from(name),
      repetition,
      logical_type,
      id
    };
    Ok(Type::GroupType { basic_info, fields })
  }

  pub fn get_basic_info(&self) -> &BasicTypeInfo {
    match *self {
      Type::PrimitiveType { ref basic_info, .. } => basic_info,
      Type::GroupType { ref basic_info, .. } => basic_info
    }
  }

  pub fn name(&self) -> &str {
    self.get_basic_info().name()
  }

  /// The fields of this group type.
  /// NOTE: this will panic if called on a non-group type.
  pub fn get_fields(&self) -> &[TypePtr] {
    match *self {
      Type::GroupType { ref fields, .. } => &fields[..],
      _ => panic!("Cannot call get_fields() on a non-group type")
    }
  }

  pub fn is_primitive(&self) -> bool {
    matches!(*self, Type::PrimitiveType { .. })
  }

  pub fn is_group(&self) -> bool {
    matches!(*self, Type::GroupType { .. })
  }

  /// Whether this is the top-level schema type (message type).
  pub fn is_schema(&self) -> bool {
    match *self {
      Type::GroupType { ref basic_info, .. } => !basic_info.has_repetition(),
      _ => false
    }
  }
}

/// Basic type info shared by primitive and group nodes.
#[derive(Debug, PartialEq)]
pub struct BasicTypeInfo {
  name: String,
  repetition: Option<Repetition>,
  logical_type: LogicalType,
  id: Option<i32>
}

impl BasicTypeInfo {
  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn has_repetition(&self) -> bool {
    self.repetition.is_some()
  }

  pub fn repetition(&self) -> Repetition {
    assert!(self.repetition.is_some());
    self.repetition.unwrap()
  }

  pub fn logical_type(&self) -> LogicalType {
    self.logical_type
  }

  pub fn has_id(&self) -> bool {
    self.id.is_some()
  }

  pub fn id(&self) -> i32 {
    assert!(self.id.is_some());
    self.id.unwrap()
  }
}

// ----------------------------------------------------------------------
// Field builders

/// A flat data field of the given physical type.
pub fn data_field(
  name: &str,
  physical_type: PhysicalType,
  logical_type: LogicalType,
  nullable: bool
) -> Result<TypePtr> {
  let repetition = if nullable { Repetition::OPTIONAL } else { Repetition::REQUIRED };
  Ok(Rc::new(Type::new_primitive_type(
    name, repetition, physical_type, logical_type, -1, -1, -1, None)?))
}

/// A fixed-length byte array field of `length` bytes.
pub fn fixed_len_field(
  name: &str,
  logical_type: LogicalType,
  nullable: bool,
  length: i32
) -> Result<TypePtr> {
  let repetition = if nullable { Repetition::OPTIONAL } else { Repetition::REQUIRED };
  Ok(Rc::new(Type::new_primitive_type(
    name, repetition, PhysicalType::FIXED_LEN_BYTE_ARRAY, logical_type,
    length, -1, -1, None)?))
}

/// A nullable list of `item`, in the standard three-level encoding:
/// an optional LIST group over a repeated single-child group.
pub fn list_field(name: &str, item: TypePtr) -> Result<TypePtr> {
  let repeated = Type::new_group_type(
    LIST_REPEATED_NAME, Some(Repetition::REPEATED), LogicalType::NONE,
    vec![item], None)?;
  Ok(Rc::new(Type::new_group_type(
    name, Some(Repetition::OPTIONAL), LogicalType::LIST,
    vec![Rc::new(repeated)], None)?))
}

/// A map of `key` to `value`: a required MAP group over a repeated
/// `key_value` group. The key must be a required primitive of a hashable
/// physical type; the value is commonly optional.
pub fn map_field(name: &str, key: TypePtr, value: TypePtr) -> Result<TypePtr> {
  match key.as_ref() {
    Type::PrimitiveType { physical_type, .. } if physical_type.is_hashable() => {}
    Type::PrimitiveType { physical_type, .. } => {
      return Err(schema_err!("Map key type {} is not hashable", physical_type))
    }
    _ => return Err(schema_err!("Map key of '{}' must be a primitive field", name))
  }
  if key.get_basic_info().repetition() != Repetition::REQUIRED {
    return Err(schema_err!("Map key of '{}' must be required", name));
  }
  let key_value = Type::new_group_type(
    MAP_KEY_VALUE_NAME, Some(Repetition::REPEATED), LogicalType::NONE,
    vec![key, value], None)?;
  Ok(Rc::new(Type::new_group_type(
    name, Some(Repetition::REQUIRED), LogicalType::MAP,
    vec![Rc::new(key_value)], None)?))
}

/// A required struct with the given child fields.
pub fn struct_field(name: &str, children: Vec<TypePtr>) -> Result<TypePtr> {
  group_field(name, Repetition::REQUIRED, children)
}

/// A group with an explicit repetition, for optional structs and legacy
/// repeated groups.
pub fn group_field(name: &str, repetition: Repetition, children: Vec<TypePtr>) -> Result<TypePtr> {
  Ok(Rc::new(Type::new_group_type(
    name, Some(repetition), LogicalType::NONE, children, None)?))
}

/// The top-level message type.
pub fn message_type(name: &str, fields: Vec<TypePtr>) -> Result<TypePtr> {
  Ok(Rc::new(Type::new_group_type(name, None, LogicalType::NONE, fields, None)?))
}

// ----------------------------------------------------------------------
// Descriptors

/// A dot-separated path from the schema root to a leaf.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct ColumnPath {
  parts: Vec<String>
}

impl ColumnPath {
  pub fn new(parts: Vec<String>) -> Self {
    ColumnPath { parts }
  }

  pub fn from_dotted(s: &str) -> Self {
    ColumnPath { parts: s.split('.').map(String::from).collect() }
  }

  pub fn parts(&self) -> &[String] {
    &self.parts
  }

  pub fn string(&self) -> String {
    self.parts.join(".")
  }
}

impl fmt::Display for ColumnPath {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}", self.string())
  }
}

/// A descriptor for a leaf primitive column, carrying the maximum
/// definition and repetition levels used to reassemble nested data.
pub struct ColumnDescriptor {
  /// The "leaf" primitive type of this column.
  primitive_type: TypePtr,

  /// The root field this column descends from. For column `a.b.c.d` the
  /// primitive type is `d` while the root is `a`.
  root_type: TypePtr,

  /// The maximum definition level for this column.
  max_def_level: i16,

  /// The maximum repetition level for this column.
  max_rep_level: i16,

  /// The path of this column, e.g. "a.b.c.d".
  path: ColumnPath
}

impl ColumnDescriptor {
  fn new(
    primitive_type: TypePtr,
    root_type: TypePtr,
    max_def_level: i16,
    max_rep_level: i16,
    path: ColumnPath
  ) -> Self {
    Self { primitive_type, root_type, max_def_level, max_rep_level, path }
  }

  pub fn max_def_level(&self) -> i16 {
    self.max_def_level
  }

  pub fn max_rep_level(&self) -> i16 {
    self.max_rep_level
  }

  pub fn path(&self) -> &ColumnPath {
    &self.path
  }

  pub fn root_type(&self) -> &Type {
    self.root_type.as_ref()
  }

  pub fn root_type_ptr(&self) -> TypePtr {
    self.root_type.clone()
  }

  pub fn name(&self) -> &str {
    self.primitive_type.name()
  }

  pub fn logical_type(&self) -> LogicalType {
    self.primitive_type.get_basic_info().logical_type()
  }

  pub fn physical_type(&self) -> PhysicalType {
    match self.primitive_type.as_ref() {
      Type::PrimitiveType { physical_type, .. } => *physical_type,
      _ => panic!("Expected a primitive type")
    }
  }

  pub fn type_length(&self) -> i32 {
    match self.primitive_type.as_ref() {
      Type::PrimitiveType { type_length, .. } => *type_length,
      _ => panic!("Expected a primitive type")
    }
  }

  pub fn type_precision(&self) -> i32 {
    match self.primitive_type.as_ref() {
      Type::PrimitiveType { precision, .. } => *precision,
      _ => panic!("Expected a primitive type")
    }
  }

  pub fn type_scale(&self) -> i32 {
    match self.primitive_type.as_ref() {
      Type::PrimitiveType { scale, .. } => *scale,
      _ => panic!("Expected a primitive type")
    }
  }
}

/// A schema descriptor: the top-level message type plus descriptors for all
/// leaf columns, in document (depth-first) order.
pub struct SchemaDescriptor {
  /// The top-level schema, a `GroupType` without repetition.
  schema: TypePtr,

  /// Descriptors of all primitive columns, in depth-first order.
  leaves: Vec<ColumnDescPtr>,

  /// Mapping from a leaf index to its root field.
  leaf_to_base: HashMap<usize, TypePtr>,

  /// Mapping from a leaf path to its index in `leaves`.
  leaf_to_index: HashMap<ColumnPath, usize>
}

impl SchemaDescriptor {
  pub fn new(tp: TypePtr) -> Self {
    assert!(tp.is_group(), "SchemaDescriptor should take a GroupType");
    let mut leaves = vec![];
    let mut leaf_to_base = HashMap::new();
    let mut path_so_far = vec![];
    for f in tp.get_fields() {
      build_tree(f.clone(), tp.clone(), f.clone(), 0, 0,
                 &mut leaves, &mut leaf_to_base, &mut path_so_far);
    }
    let leaf_to_index = leaves
      .iter()
      .enumerate()
      .map(|(i, leaf)| (leaf.path().clone(), i))
      .collect();
    Self { schema: tp, leaves, leaf_to_base, leaf_to_index }
  }

  pub fn column(&self, i: usize) -> ColumnDescPtr {
    assert!(
      i < self.leaves.len(),
      "Index out of bound: {} not in [0, {})", i, self.leaves.len());
    self.leaves[i].clone()
  }

  pub fn columns(&self) -> &[ColumnDescPtr] {
    &self.leaves
  }

  pub fn num_columns(&self) -> usize {
    self.leaves.len()
  }

  /// Index of the leaf with the given path, if any.
  pub fn index_by_path(&self, path: &ColumnPath) -> Option<usize> {
    self.leaf_to_index.get(path).copied()
  }

  /// The root field that leaf `i` descends from.
  pub fn get_column_root(&self, i: usize) -> &Type {
    assert!(
      i < self.leaves.len(),
      "Index out of bound: {} not in [0, {})", i, self.leaves.len());
    let result = self.leaf_to_base.get(&i);
    assert!(result.is_some(), "No root found for index {}", i);
    result.unwrap().as_ref()
  }

  pub fn root_schema(&self) -> &Type {
    self.schema.as_ref()
  }

  pub fn root_schema_ptr(&self) -> TypePtr {
    self.schema.clone()
  }

  pub fn name(&self) -> &str {
    self.schema.name()
  }
}

impl fmt::Display for SchemaDescriptor {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    let mut s = Vec::new();
    crate::schema::printer::print_schema(&mut s, self.root_schema());
    write!(f, "{}", String::from_utf8_lossy(&s))
  }
}

/// Level propagation, top-down: an OPTIONAL field adds one definition
/// level; a REPEATED field adds one definition and one repetition level.
fn build_tree(
  tp: TypePtr,
  root_tp: TypePtr,
  base_tp: TypePtr,
  mut max_def_level: i16,
  mut max_rep_level: i16,
  leaves: &mut Vec<ColumnDescPtr>,
  leaf_to_base: &mut HashMap<usize, TypePtr>,
  path_so_far: &mut Vec<String>
) {
  assert!(tp.get_basic_info().has_repetition());

  path_so_far.push(String::from(tp.name()));
  match tp.get_basic_info().repetition() {
    Repetition::OPTIONAL => max_def_level += 1,
    Repetition::REPEATED => {
      max_def_level += 1;
      max_rep_level += 1;
    }
    Repetition::REQUIRED => {}
  }

  match tp.as_ref() {
    Type::PrimitiveType { .. } => {
      leaves.push(Rc::new(ColumnDescriptor::new(
        tp.clone(), root_tp, max_def_level, max_rep_level,
        ColumnPath::new(path_so_far.clone()))));
      leaf_to_base.insert(leaves.len() - 1, base_tp);
    }
    Type::GroupType { ref fields, .. } => {
      for f in fields {
        build_tree(f.clone(), root_tp.clone(), base_tp.clone(),
                   max_def_level, max_rep_level, leaves, leaf_to_base, path_so_far);
      }
    }
  }
  path_so_far.pop();
}
