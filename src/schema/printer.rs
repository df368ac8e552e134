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

//! Schema printing in the textual message-type format.

use std::io;

use crate::basic::{LogicalType, Repetition, Type as PhysicalType};
use crate::schema::types::Type;

/// Print `tp` into `out` in message-type format.
pub fn print_schema<W: io::Write>(out: &mut W, tp: &Type) {
  let mut printer = Printer { indent: 0 };
  printer.print(out, tp);
}

const INDENT_WIDTH: usize = 2;

struct Printer {
  indent: usize
}

impl Printer {
  fn print<W: io::Write>(&mut self, out: &mut W, tp: &Type) {
    let _ = self.print_type(out, tp);
  }

  fn write_indent<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
    write!(out, "{:width$}", "", width = self.indent * INDENT_WIDTH)
  }

  fn print_type<W: io::Write>(&mut self, out: &mut W, tp: &Type) -> io::Result<()> {
    match tp {
      Type::PrimitiveType { basic_info, physical_type, type_length, scale, precision } => {
        self.write_indent(out)?;
        write!(
          out,
          "{} {}",
          display_repetition(basic_info.repetition()),
          display_physical(*physical_type, *type_length))?;
        write!(out, " {}", basic_info.name())?;
        match basic_info.logical_type() {
          LogicalType::NONE => {}
          LogicalType::DECIMAL => {
            write!(out, " (DECIMAL({},{}))", precision, scale)?;
          }
          annotation => {
            write!(out, " ({})", annotation)?;
          }
        }
        writeln!(out, ";")
      }
      Type::GroupType { basic_info, fields } => {
        self.write_indent(out)?;
        if basic_info.has_repetition() {
          write!(out, "{} group {}", display_repetition(basic_info.repetition()), basic_info.name())?;
          match basic_info.logical_type() {
            LogicalType::NONE => {}
            annotation => write!(out, " ({})", annotation)?
          }
          writeln!(out, " {{")?;
        } else {
          writeln!(out, "message {} {{", basic_info.name())?;
        }
        self.indent += 1;
        for field in fields {
          self.print_type(out, field)?;
        }
        self.indent -= 1;
        self.write_indent(out)?;
        writeln!(out, "}}")
      }
    }
  }
}

fn display_repetition(repetition: Repetition) -> &'static str {
  match repetition {
    Repetition::REQUIRED => "required",
    Repetition::OPTIONAL => "optional",
    Repetition::REPEATED => "repeated"
  }
}

fn display_physical(physical_type: PhysicalType, type_length: i32) -> String {
  match physical_type {
    PhysicalType::BOOLEAN => "boolean".to_string(),
    PhysicalType::INT32 => "int32".to_string(),
    PhysicalType::INT64 => "int64".to_string(),
    PhysicalType::INT96 => "int96".to_string(),
    PhysicalType::FLOAT => "float".to_string(),
    PhysicalType::DOUBLE => "double".to_string(),
    PhysicalType::BYTE_ARRAY => "byte_array".to_string(),
    PhysicalType::FIXED_LEN_BYTE_ARRAY => {
      format!("fixed_len_byte_array({})", type_length)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::basic::Type as PhysicalType;
  use crate::schema::types::*;

  fn printed(tp: &Type) -> String {
    let mut out = Vec::new();
    print_schema(&mut out, tp);
    String::from_utf8(out).unwrap()
  }

  #[test]
  fn test_print_flat_schema() {
    let fields = vec![
      data_field("id", PhysicalType::INT64, LogicalType::NONE, false).unwrap(),
      data_field("name", PhysicalType::BYTE_ARRAY, LogicalType::UTF8, true).unwrap(),
    ];
    let schema = message_type("spark_schema", fields).unwrap();
    assert_eq!(
      printed(&schema),
      "message spark_schema {\n\
       \x20 required int64 id;\n\
       \x20 optional byte_array name (UTF8);\n\
       }\n");
  }

  #[test]
  fn test_print_nested_schema() {
    let element = data_field("element", PhysicalType::INT32, LogicalType::NONE, true).unwrap();
    let list = list_field("values", element).unwrap();
    let schema = message_type("m", vec![list]).unwrap();
    assert_eq!(
      printed(&schema),
      "message m {\n\
       \x20 optional group values (LIST) {\n\
       \x20   repeated group list {\n\
       \x20     optional int32 element;\n\
       \x20   }\n\
       \x20 }\n\
       }\n");
  }

  #[test]
  fn test_print_fixed_len_and_decimal() {
    let fields = vec![
      fixed_len_field("code", LogicalType::NONE, false, 10).unwrap(),
      std::rc::Rc::new(
        Type::new_primitive_type(
          "price", Repetition::OPTIONAL, PhysicalType::INT32,
          LogicalType::DECIMAL, -1, 9, 2, None)
        .unwrap()),
    ];
    let schema = message_type("m", fields).unwrap();
    assert_eq!(
      printed(&schema),
      "message m {\n\
       \x20 required fixed_len_byte_array(10) code;\n\
       \x20 optional int32 price (DECIMAL(9,2));\n\
       }\n");
  }
}
