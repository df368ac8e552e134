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

//! Dremel record assembly: rebuild nested rows from the flat
//! (values, definition levels, repetition levels) triples of the leaf
//! columns.
//!
//! A reader tree mirrors the schema: option nodes place nulls at the
//! ancestor depth the definition level proves absent, repeated nodes open
//! and close lists guided by repetition levels, and key/value nodes pair
//! the two map columns. Cursors over the flat arrays advance in lockstep
//! across all leaves of a subtree.

use crate::basic::{LogicalType, Repetition};
use crate::column::{ColumnData, DataColumn};
use crate::errors::Result;
use crate::record::api::{ReaderOptions, Row};
use crate::schema::types::{SchemaDescriptor, Type, TypePtr};

/// Assemble all rows of a row group from its leaf columns, which must be in
/// document (schema leaf) order. Fails with a level mismatch when any leaf
/// does not span exactly `num_rows` rows.
pub fn assemble_row_group(
  schema: &SchemaDescriptor,
  columns: &[DataColumn],
  num_rows: usize,
  options: &ReaderOptions
) -> Result<Vec<Row>> {
  if columns.len() != schema.num_columns() {
    return Err(schema_err!(
      "Schema has {} leaves but {} columns were provided",
      schema.num_columns(), columns.len()));
  }
  for (i, column) in columns.iter().enumerate() {
    if column.descr().path() != schema.column(i).path() {
      return Err(schema_err!(
        "Column {} is {}, expected leaf {}",
        i, column.descr().path(), schema.column(i).path()));
    }
    check_row_count(column, num_rows)?;
  }

  let mut builder = TreeBuilder::new(columns, options);
  let mut root = Vec::with_capacity(schema.root_schema().get_fields().len());
  for field in schema.root_schema().get_fields() {
    root.push((field.name().to_owned(), builder.reader_tree(field, 0, 0)?));
  }
  builder.finish()?;

  let mut records = Vec::with_capacity(num_rows);
  for _ in 0..num_rows {
    let mut entries = Vec::with_capacity(root.len());
    for (name, reader) in root.iter_mut() {
      entries.push((name.clone(), reader.read_field()?));
    }
    records.push(Row::Group(entries));
  }
  for (name, reader) in &root {
    if reader.has_next() {
      return Err(level_err!(
        "Column data under '{}' extends past the declared {} rows", name, num_rows));
    }
  }
  Ok(records)
}

/// Assemble one leaf column into its per-row nested values: one `Row` per
/// top-level row, shaped by the leaf's path through the schema. Map groups
/// along the path degrade to lists of their surviving side.
pub fn assemble_column(
  column: &DataColumn,
  num_rows: usize,
  options: &ReaderOptions
) -> Result<Vec<Row>> {
  check_row_count(column, num_rows)?;

  let root = column.descr().root_type_ptr();
  let pruned = prune_to_path(&root, column.descr().path().parts(), 0)?;
  let columns = std::slice::from_ref(column);
  let mut builder = TreeBuilder::new(columns, options);
  let mut reader = builder.reader_tree(&pruned, 0, 0)?;
  builder.finish()?;

  let mut rows = Vec::with_capacity(num_rows);
  for _ in 0..num_rows {
    rows.push(reader.read_field()?);
  }
  if reader.has_next() {
    return Err(level_err!(
      "Column {} extends past the declared {} rows", column.descr().path(), num_rows));
  }
  Ok(rows)
}

fn check_row_count(column: &DataColumn, num_rows: usize) -> Result<()> {
  if column.num_rows() != num_rows {
    return Err(level_err!(
      "Column {} spans {} rows, expected {}",
      column.descr().path(), column.num_rows(), num_rows));
  }
  Ok(())
}

/// Reduce a root field to the single branch leading to the leaf at `parts`.
/// Annotations whose wrapping rules need the removed siblings are dropped.
fn prune_to_path(field: &TypePtr, parts: &[String], depth: usize) -> Result<TypePtr> {
  if field.is_primitive() {
    return Ok(field.clone());
  }
  if depth + 1 >= parts.len() {
    return Err(schema_err!(
      "Path {} ends inside group '{}'", parts.join("."), field.name()));
  }
  let child = field
    .get_fields()
    .iter()
    .find(|c| c.name() == parts[depth + 1])
    .ok_or_else(|| {
      schema_err!("Group '{}' has no field named '{}'", field.name(), parts[depth + 1])
    })?;
  let pruned_child = prune_to_path(child, parts, depth + 1)?;

  let info = field.get_basic_info();
  let logical_type = match info.logical_type() {
    // a single-sided map no longer satisfies the key/value shape
    LogicalType::MAP | LogicalType::MAP_KEY_VALUE => LogicalType::NONE,
    other => other
  };
  let id = if info.has_id() { Some(info.id()) } else { None };
  Ok(std::rc::Rc::new(Type::new_group_type(
    info.name(),
    Some(info.repetition()),
    logical_type,
    vec![pruned_child],
    id
  )?))
}

// ----------------------------------------------------------------------
// Cursors over flat columns

/// Definition level reported once a cursor ran out of slots.
const EXHAUSTED: i16 = i16::MIN;

/// A cursor over one column's parallel level/value arrays.
struct ColumnCursor<'a> {
  column: &'a DataColumn,
  treat_utf8: bool,
  max_def_level: i16,
  index: usize,
  value_index: usize
}

impl<'a> ColumnCursor<'a> {
  fn new(column: &'a DataColumn, treat_utf8: bool) -> Self {
    Self {
      column,
      treat_utf8,
      max_def_level: column.descr().max_def_level(),
      index: 0,
      value_index: 0
    }
  }

  fn has_next(&self) -> bool {
    self.index < self.column.num_slots()
  }

  fn current_def_level(&self) -> i16 {
    if !self.has_next() {
      return EXHAUSTED;
    }
    match self.column.def_levels() {
      Some(levels) => levels[self.index],
      None => self.max_def_level
    }
  }

  fn current_rep_level(&self) -> i16 {
    if !self.has_next() {
      return 0;
    }
    match self.column.rep_levels() {
      Some(levels) => levels[self.index],
      None => 0
    }
  }

  /// Consume the current slot without producing a value.
  fn advance(&mut self) -> Result<()> {
    if !self.has_next() {
      return Err(level_err!(
        "Column {} is exhausted mid-record", self.column.descr().path()));
    }
    if self.current_def_level() == self.max_def_level {
      self.value_index += 1;
    }
    self.index += 1;
    Ok(())
  }

  /// Consume the current slot, which must hold a value, and convert it.
  fn read_value(&mut self) -> Result<Row> {
    if !self.has_next() {
      return Err(level_err!(
        "Column {} is exhausted mid-record", self.column.descr().path()));
    }
    if self.current_def_level() != self.max_def_level {
      return Err(level_err!(
        "Column {} has definition level {} where a value was expected",
        self.column.descr().path(), self.current_def_level()));
    }
    let row = self.value_at(self.value_index);
    self.value_index += 1;
    self.index += 1;
    Ok(row)
  }

  fn value_at(&self, i: usize) -> Row {
    let physical_type = self.column.descr().physical_type();
    let logical_type = self.column.descr().logical_type();
    match self.column.values() {
      ColumnData::Bool(v) => Row::convert_bool(physical_type, logical_type, v[i]),
      ColumnData::Int32(v) => Row::convert_int32(physical_type, logical_type, v[i]),
      ColumnData::Int64(v) => Row::convert_int64(physical_type, logical_type, v[i]),
      ColumnData::Int96(v) => {
        Row::convert_int96(physical_type, logical_type, v[i].clone())
      }
      ColumnData::Float(v) => Row::convert_float(physical_type, logical_type, v[i]),
      ColumnData::Double(v) => Row::convert_double(physical_type, logical_type, v[i]),
      ColumnData::ByteArray(v) => {
        Row::convert_byte_array(physical_type, logical_type, v[i].clone(), self.treat_utf8)
      }
      ColumnData::FixedLenByteArray(v) => Row::convert_byte_array(
        physical_type, logical_type, v[i].clone().into_inner(), self.treat_utf8)
    }
  }
}

// ----------------------------------------------------------------------
// Reader tree

enum Reader<'a> {
  /// Reads primitive values from one column.
  Primitive { column: ColumnCursor<'a> },

  /// Handles an optional field: values below `def_level` become null.
  Option { def_level: i16, reader: Box<Reader<'a>> },

  /// Reads a struct by zipping its children.
  Group { fields: Vec<(String, Reader<'a>)> },

  /// Reads a list: elements continue while the repetition level stays above
  /// `rep_level`; a definition level of exactly `def_level` closes an empty
  /// list.
  Repeated { def_level: i16, rep_level: i16, reader: Box<Reader<'a>> },

  /// Reads a map by pairing the key and value subtrees per entry.
  KeyValue {
    def_level: i16,
    rep_level: i16,
    keys: Box<Reader<'a>>,
    values: Box<Reader<'a>>
  }
}

impl<'a> Reader<'a> {
  fn read_field(&mut self) -> Result<Row> {
    match self {
      Reader::Primitive { column } => column.read_value(),
      Reader::Option { def_level, reader } => {
        if reader.current_def_level() >= *def_level {
          reader.read_field()
        } else {
          reader.advance()?;
          Ok(Row::Null)
        }
      }
      Reader::Group { fields } => {
        let mut entries = Vec::with_capacity(fields.len());
        for (name, reader) in fields.iter_mut() {
          entries.push((name.clone(), reader.read_field()?));
        }
        Ok(Row::Group(entries))
      }
      Reader::Repeated { def_level, rep_level, reader } => {
        let mut elements = Vec::new();
        loop {
          if reader.current_def_level() > *def_level {
            elements.push(reader.read_field()?);
          } else {
            // the single slot encodes an empty list
            reader.advance()?;
            break;
          }
          if !reader.has_next() || reader.current_rep_level() <= *rep_level {
            break;
          }
        }
        Ok(Row::List(elements))
      }
      Reader::KeyValue { def_level, rep_level, keys, values } => {
        let mut pairs = Vec::new();
        loop {
          if keys.current_def_level() > *def_level {
            pairs.push((keys.read_field()?, values.read_field()?));
          } else {
            // the single slot encodes an empty map
            keys.advance()?;
            values.advance()?;
            break;
          }
          if !keys.has_next() || keys.current_rep_level() <= *rep_level {
            break;
          }
        }
        Ok(Row::Map(pairs))
      }
    }
  }

  fn current_def_level(&self) -> i16 {
    match self {
      Reader::Primitive { column } => column.current_def_level(),
      Reader::Option { reader, .. } => reader.current_def_level(),
      Reader::Group { fields } => fields
        .first()
        .map(|(_, r)| r.current_def_level())
        .unwrap_or(EXHAUSTED),
      Reader::Repeated { reader, .. } => reader.current_def_level(),
      Reader::KeyValue { keys, .. } => keys.current_def_level()
    }
  }

  fn current_rep_level(&self) -> i16 {
    match self {
      Reader::Primitive { column } => column.current_rep_level(),
      Reader::Option { reader, .. } => reader.current_rep_level(),
      Reader::Group { fields } => fields
        .first()
        .map(|(_, r)| r.current_rep_level())
        .unwrap_or(0),
      Reader::Repeated { reader, .. } => reader.current_rep_level(),
      Reader::KeyValue { keys, .. } => keys.current_rep_level()
    }
  }

  fn has_next(&self) -> bool {
    match self {
      Reader::Primitive { column } => column.has_next(),
      Reader::Option { reader, .. } => reader.has_next(),
      Reader::Group { fields } => fields.first().map(|(_, r)| r.has_next()).unwrap_or(false),
      Reader::Repeated { reader, .. } => reader.has_next(),
      Reader::KeyValue { keys, .. } => keys.has_next()
    }
  }

  /// Consume one slot in every column beneath this reader.
  fn advance(&mut self) -> Result<()> {
    match self {
      Reader::Primitive { column } => column.advance(),
      Reader::Option { reader, .. } => reader.advance(),
      Reader::Group { fields } => {
        for (_, reader) in fields.iter_mut() {
          reader.advance()?;
        }
        Ok(())
      }
      Reader::Repeated { reader, .. } => reader.advance(),
      Reader::KeyValue { keys, values, .. } => {
        keys.advance()?;
        values.advance()
      }
    }
  }
}

// ----------------------------------------------------------------------
// Tree construction

struct TreeBuilder<'a> {
  columns: &'a [DataColumn],
  options: &'a ReaderOptions,
  next_leaf: usize
}

impl<'a> TreeBuilder<'a> {
  fn new(columns: &'a [DataColumn], options: &'a ReaderOptions) -> Self {
    Self { columns, options, next_leaf: 0 }
  }

  /// All provided columns must be claimed by a leaf.
  fn finish(&self) -> Result<()> {
    if self.next_leaf != self.columns.len() {
      return Err(schema_err!(
        "{} columns provided but the schema claims {}",
        self.columns.len(), self.next_leaf));
    }
    Ok(())
  }

  fn next_cursor(&mut self, field: &TypePtr) -> Result<ColumnCursor<'a>> {
    let column = self.columns.get(self.next_leaf).ok_or_else(|| {
      schema_err!("No column provided for leaf '{}'", field.name())
    })?;
    if column.descr().name() != field.name() {
      return Err(schema_err!(
        "Expected column for leaf '{}', found '{}'",
        field.name(), column.descr().name()));
    }
    self.next_leaf += 1;
    Ok(ColumnCursor::new(column, self.options.treat_byte_array_as_utf8))
  }

  /// Build the reader for `field`, with `curr_def`/`curr_rep` the maximum
  /// levels of the field's parent.
  fn reader_tree(
    &mut self,
    field: &TypePtr,
    mut curr_def: i16,
    mut curr_rep: i16
  ) -> Result<Reader<'a>> {
    let repetition = field.get_basic_info().repetition();
    match repetition {
      Repetition::OPTIONAL => curr_def += 1,
      Repetition::REPEATED => {
        curr_def += 1;
        curr_rep += 1;
      }
      Repetition::REQUIRED => {}
    }

    let reader = if field.is_primitive() {
      let primitive = Reader::Primitive { column: self.next_cursor(field)? };
      if repetition == Repetition::REPEATED {
        // a bare repeated primitive is a list of values
        Reader::Repeated {
          def_level: curr_def - 1,
          rep_level: curr_rep - 1,
          reader: Box::new(primitive)
        }
      } else {
        primitive
      }
    } else {
      match field.get_basic_info().logical_type() {
        LogicalType::LIST => {
          let repeated_field = &field.get_fields()[0];
          let element = if repeated_field.is_primitive() {
            // two-level list: the repeated primitive is the element
            Reader::Primitive { column: self.next_cursor(repeated_field)? }
          } else if repeated_field.get_fields().len() == 1
            && repeated_field.name() != "array"
            && repeated_field.name() != format!("{}_tuple", field.name())
          {
            // standard three-level list: the repeated group wraps the element
            self.reader_tree(&repeated_field.get_fields()[0], curr_def + 1, curr_rep + 1)?
          } else {
            // legacy two-level list: the repeated group is the element struct
            self.group_tree(repeated_field, curr_def + 1, curr_rep + 1)?
          };
          Reader::Repeated {
            def_level: curr_def,
            rep_level: curr_rep,
            reader: Box::new(element)
          }
        }
        LogicalType::MAP | LogicalType::MAP_KEY_VALUE => {
          let key_value = &field.get_fields()[0];
          if !key_value.is_group() || key_value.get_fields().len() != 2 {
            return Err(schema_err!(
              "Map group '{}' must wrap a repeated group with key and value", field.name()));
          }
          let keys =
            self.reader_tree(&key_value.get_fields()[0], curr_def + 1, curr_rep + 1)?;
          let values =
            self.reader_tree(&key_value.get_fields()[1], curr_def + 1, curr_rep + 1)?;
          Reader::KeyValue {
            def_level: curr_def,
            rep_level: curr_rep,
            keys: Box::new(keys),
            values: Box::new(values)
          }
        }
        _ => {
          let group = self.group_tree(field, curr_def, curr_rep)?;
          if repetition == Repetition::REPEATED {
            // a repeated group is a list of structs
            Reader::Repeated {
              def_level: curr_def - 1,
              rep_level: curr_rep - 1,
              reader: Box::new(group)
            }
          } else {
            group
          }
        }
      }
    };

    if repetition == Repetition::OPTIONAL {
      Ok(Reader::Option { def_level: curr_def, reader: Box::new(reader) })
    } else {
      Ok(reader)
    }
  }

  fn group_tree(&mut self, field: &TypePtr, curr_def: i16, curr_rep: i16) -> Result<Reader<'a>> {
    let mut fields = Vec::with_capacity(field.get_fields().len());
    for child in field.get_fields() {
      fields.push((child.name().to_owned(), self.reader_tree(child, curr_def, curr_rep)?));
    }
    Ok(Reader::Group { fields })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::basic::{LogicalType, Type as PhysicalType};
  use crate::column::ColumnData;
  use crate::schema::types::*;
  use std::rc::Rc;

  fn schema_of(fields: Vec<TypePtr>) -> SchemaDescPtr {
    Rc::new(SchemaDescriptor::new(
      message_type("schema", fields).unwrap()))
  }

  fn column(
    schema: &SchemaDescPtr,
    leaf: usize,
    values: ColumnData,
    def_levels: Option<Vec<i16>>,
    rep_levels: Option<Vec<i16>>
  ) -> DataColumn {
    DataColumn::new(schema.column(leaf), values, def_levels, rep_levels).unwrap()
  }

  fn group(entries: Vec<(&str, Row)>) -> Row {
    Row::Group(entries.into_iter().map(|(n, v)| (n.to_owned(), v)).collect())
  }

  #[test]
  fn test_assemble_flat_required() {
    let fields = vec![
      data_field("id", PhysicalType::INT64, LogicalType::NONE, false).unwrap()
    ];
    let schema = schema_of(fields);
    let col = column(&schema, 0, ColumnData::Int64(vec![1, 2, 3]), None, None);

    let rows = assemble_row_group(
      &schema, std::slice::from_ref(&col), 3, &ReaderOptions::default()).unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0], group(vec![("id", Row::Long(1))]));
    assert_eq!(rows[2], group(vec![("id", Row::Long(3))]));
  }

  #[test]
  fn test_assemble_flat_optional_with_nulls() {
    let fields = vec![
      data_field("v", PhysicalType::INT32, LogicalType::NONE, true).unwrap()
    ];
    let schema = schema_of(fields);
    let col = column(
      &schema, 0,
      ColumnData::Int32(vec![10, 30]),
      Some(vec![1, 0, 1]),
      None);

    let rows = assemble_row_group(
      &schema, std::slice::from_ref(&col), 3, &ReaderOptions::default()).unwrap();
    assert_eq!(rows[0], group(vec![("v", Row::Int(10))]));
    assert_eq!(rows[1], group(vec![("v", Row::Null)]));
    assert_eq!(rows[2], group(vec![("v", Row::Int(30))]));
  }

  #[test]
  fn test_assemble_optional_zero_value_is_not_null() {
    // a present value of zero must stay distinct from null
    let fields = vec![
      data_field("id", PhysicalType::INT64, LogicalType::NONE, false).unwrap(),
      data_field("value", PhysicalType::INT64, LogicalType::NONE, true).unwrap()
    ];
    let schema = schema_of(fields);
    let ids = column(
      &schema, 0, ColumnData::Int64(vec![20908539289, 20908539290]), None, None);
    let values = column(
      &schema, 1, ColumnData::Int64(vec![0]), Some(vec![1, 0]), None);

    let rows = assemble_row_group(
      &schema, &[ids, values], 2, &ReaderOptions::default()).unwrap();
    assert_eq!(
      rows[0],
      group(vec![("id", Row::Long(20908539289)), ("value", Row::Long(0))]));
    assert_eq!(
      rows[1],
      group(vec![("id", Row::Long(20908539290)), ("value", Row::Null)]));
  }

  #[test]
  fn test_assemble_list_null_empty_and_values() {
    // rows: [1, 2], [], null, [3]
    let element =
      data_field("element", PhysicalType::INT32, LogicalType::NONE, true).unwrap();
    let schema = schema_of(vec![list_field("xs", element).unwrap()]);

    let col = column(
      &schema, 0,
      ColumnData::Int32(vec![1, 2, 3]),
      Some(vec![3, 3, 1, 0, 3]),
      Some(vec![0, 1, 0, 0, 0]));

    let rows = assemble_row_group(
      &schema, std::slice::from_ref(&col), 4, &ReaderOptions::default()).unwrap();
    assert_eq!(
      rows[0],
      group(vec![("xs", Row::List(vec![Row::Int(1), Row::Int(2)]))]));
    assert_eq!(rows[1], group(vec![("xs", Row::List(vec![]))]));
    assert_eq!(rows[2], group(vec![("xs", Row::Null)]));
    assert_eq!(rows[3], group(vec![("xs", Row::List(vec![Row::Int(3)]))]));
  }

  #[test]
  fn test_assemble_list_with_null_element() {
    // row: [7, null, 9]
    let element =
      data_field("element", PhysicalType::INT32, LogicalType::NONE, true).unwrap();
    let schema = schema_of(vec![list_field("xs", element).unwrap()]);

    let col = column(
      &schema, 0,
      ColumnData::Int32(vec![7, 9]),
      Some(vec![3, 2, 3]),
      Some(vec![0, 1, 1]));

    let rows = assemble_row_group(
      &schema, std::slice::from_ref(&col), 1, &ReaderOptions::default()).unwrap();
    assert_eq!(
      rows[0],
      group(vec![("xs", Row::List(vec![Row::Int(7), Row::Null, Row::Int(9)]))]));
  }

  #[test]
  fn test_assemble_nested_records() {
    // optional group bag { repeated group records { required int64 a; optional int32 b } }
    let a = data_field("a", PhysicalType::INT64, LogicalType::NONE, false).unwrap();
    let b = data_field("b", PhysicalType::INT32, LogicalType::NONE, true).unwrap();
    let records = group_field("records", Repetition::REPEATED, vec![a, b]).unwrap();
    let bag = group_field("bag", Repetition::OPTIONAL, vec![records]).unwrap();
    let schema = schema_of(vec![bag]);

    // rows:
    //   bag with records [{a: 1, b: 5}, {a: 2, b: null}]
    //   bag with no records
    //   null bag
    let col_a = column(
      &schema, 0,
      ColumnData::Int64(vec![1, 2]),
      Some(vec![2, 2, 1, 0]),
      Some(vec![0, 1, 0, 0]));
    let col_b = column(
      &schema, 1,
      ColumnData::Int32(vec![5]),
      Some(vec![3, 2, 1, 0]),
      Some(vec![0, 1, 0, 0]));

    let rows = assemble_row_group(
      &schema, &[col_a, col_b], 3, &ReaderOptions::default()).unwrap();
    assert_eq!(
      rows[0],
      group(vec![(
        "bag",
        group(vec![(
          "records",
          Row::List(vec![
            group(vec![("a", Row::Long(1)), ("b", Row::Int(5))]),
            group(vec![("a", Row::Long(2)), ("b", Row::Null)])
          ])
        )])
      )]));
    assert_eq!(
      rows[1],
      group(vec![("bag", group(vec![("records", Row::List(vec![]))]))]));
    assert_eq!(rows[2], group(vec![("bag", Row::Null)]));
  }

  #[test]
  fn test_assemble_map() {
    // required map<utf8, optional int32>
    let key = data_field("key", PhysicalType::BYTE_ARRAY, LogicalType::UTF8, false).unwrap();
    let value = data_field("value", PhysicalType::INT32, LogicalType::NONE, true).unwrap();
    let schema = schema_of(vec![map_field("attrs", key, value).unwrap()]);

    // rows: {a -> 1, b -> null}, {}
    let col_keys = column(
      &schema, 0,
      ColumnData::ByteArray(vec![
        crate::data_type::ByteArray::from("a"),
        crate::data_type::ByteArray::from("b")
      ]),
      Some(vec![1, 1, 0]),
      Some(vec![0, 1, 0]));
    let col_values = column(
      &schema, 1,
      ColumnData::Int32(vec![1]),
      Some(vec![2, 1, 0]),
      Some(vec![0, 1, 0]));

    let rows = assemble_row_group(
      &schema, &[col_keys, col_values], 2, &ReaderOptions::default()).unwrap();
    assert_eq!(
      rows[0],
      group(vec![(
        "attrs",
        Row::Map(vec![
          (Row::Str("a".to_owned()), Row::Int(1)),
          (Row::Str("b".to_owned()), Row::Null)
        ])
      )]));
    assert_eq!(rows[1], group(vec![("attrs", Row::Map(vec![]))]));
  }

  #[test]
  fn test_assemble_repeated_primitive() {
    // legacy: repeated int32 directly on the field
    let xs = Rc::new(
      Type::new_primitive_type(
        "xs", Repetition::REPEATED, PhysicalType::INT32,
        LogicalType::NONE, -1, -1, -1, None)
      .unwrap());
    let schema = schema_of(vec![xs]);

    // rows: [4, 5], [], [6]
    let col = column(
      &schema, 0,
      ColumnData::Int32(vec![4, 5, 6]),
      Some(vec![1, 1, 0, 1]),
      Some(vec![0, 1, 0, 0]));

    let rows = assemble_row_group(
      &schema, std::slice::from_ref(&col), 3, &ReaderOptions::default()).unwrap();
    assert_eq!(
      rows[0], group(vec![("xs", Row::List(vec![Row::Int(4), Row::Int(5)]))]));
    assert_eq!(rows[1], group(vec![("xs", Row::List(vec![]))]));
    assert_eq!(rows[2], group(vec![("xs", Row::List(vec![Row::Int(6)]))]));
  }

  #[test]
  fn test_assemble_nested_lists() {
    // optional list of optional list of optional int32
    let inner_element =
      data_field("element", PhysicalType::INT32, LogicalType::NONE, true).unwrap();
    let inner = list_field("element", inner_element).unwrap();
    let outer = list_field("xss", inner).unwrap();
    let schema = schema_of(vec![outer]);
    assert_eq!(schema.column(0).max_def_level(), 5);
    assert_eq!(schema.column(0).max_rep_level(), 2);

    // rows: [[1, 2], [3]], [[], null]
    let col = column(
      &schema, 0,
      ColumnData::Int32(vec![1, 2, 3]),
      Some(vec![5, 5, 5, 3, 2]),
      Some(vec![0, 2, 1, 0, 1]));

    let rows = assemble_row_group(
      &schema, std::slice::from_ref(&col), 2, &ReaderOptions::default()).unwrap();
    assert_eq!(
      rows[0],
      group(vec![(
        "xss",
        Row::List(vec![
          Row::List(vec![Row::Int(1), Row::Int(2)]),
          Row::List(vec![Row::Int(3)])
        ])
      )]));
    assert_eq!(
      rows[1],
      group(vec![("xss", Row::List(vec![Row::List(vec![]), Row::Null]))]));
  }

  #[test]
  fn test_assemble_column_alone() {
    let element =
      data_field("element", PhysicalType::INT32, LogicalType::NONE, true).unwrap();
    let schema = schema_of(vec![list_field("xs", element).unwrap()]);
    let col = column(
      &schema, 0,
      ColumnData::Int32(vec![1, 2, 3]),
      Some(vec![3, 3, 1, 0, 3]),
      Some(vec![0, 1, 0, 0, 0]));

    let rows = assemble_column(&col, 4, &ReaderOptions::default()).unwrap();
    assert_eq!(rows[0], Row::List(vec![Row::Int(1), Row::Int(2)]));
    assert_eq!(rows[1], Row::List(vec![]));
    assert_eq!(rows[2], Row::Null);
    assert_eq!(rows[3], Row::List(vec![Row::Int(3)]));
  }

  #[test]
  fn test_assemble_column_through_map() {
    // the key side alone: the map annotation cannot survive pruning, so
    // the entries come back as a list of single-field groups
    let key = data_field("key", PhysicalType::BYTE_ARRAY, LogicalType::UTF8, false).unwrap();
    let value = data_field("value", PhysicalType::INT32, LogicalType::NONE, true).unwrap();
    let schema = schema_of(vec![map_field("attrs", key, value).unwrap()]);

    // rows: {a -> .., b -> ..}, {}
    let col_keys = column(
      &schema, 0,
      ColumnData::ByteArray(vec![
        crate::data_type::ByteArray::from("a"),
        crate::data_type::ByteArray::from("b")
      ]),
      Some(vec![1, 1, 0]),
      Some(vec![0, 1, 0]));

    let rows = assemble_column(&col_keys, 2, &ReaderOptions::default()).unwrap();
    assert_eq!(
      rows[0],
      group(vec![(
        "key_value",
        Row::List(vec![
          group(vec![("key", Row::Str("a".to_owned()))]),
          group(vec![("key", Row::Str("b".to_owned()))])
        ])
      )]));
    assert_eq!(rows[1], group(vec![("key_value", Row::List(vec![]))]));
  }

  #[test]
  fn test_assemble_row_count_mismatch() {
    let fields = vec![
      data_field("id", PhysicalType::INT64, LogicalType::NONE, false).unwrap()
    ];
    let schema = schema_of(fields);
    let col = column(&schema, 0, ColumnData::Int64(vec![1, 2, 3]), None, None);

    let result = assemble_row_group(
      &schema, std::slice::from_ref(&col), 4, &ReaderOptions::default());
    match result {
      Err(crate::errors::ParquetError::LevelMismatch(_)) => {}
      other => panic!("Expected level mismatch, got {:?}", other)
    }
  }

  #[test]
  fn test_assemble_mismatched_leaf_rows() {
    // two leaves disagreeing on the row count
    let fields = vec![
      data_field("a", PhysicalType::INT64, LogicalType::NONE, false).unwrap(),
      data_field("b", PhysicalType::INT64, LogicalType::NONE, false).unwrap()
    ];
    let schema = schema_of(fields);
    let col_a = column(&schema, 0, ColumnData::Int64(vec![1, 2]), None, None);
    let col_b = column(&schema, 1, ColumnData::Int64(vec![1]), None, None);

    assert!(assemble_row_group(
      &schema, &[col_a, col_b], 2, &ReaderOptions::default()).is_err());
  }
}
