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

//! Column encoding core for Parquet-compatible columnar files.
//!
//! This crate covers the storage-layer subsystems of a Parquet reader and
//! writer: the typed schema tree with definition/repetition level bookkeeping,
//! the RLE/bit-packed hybrid integer codec used for levels and dictionary
//! indices, per-page value encodings, and the Dremel record assembly that
//! rebuilds nested rows from flat column data.
//!
//! Footer metadata parsing (Thrift) and physical file access are external
//! collaborators: callers hand over decoded [`file::metadata::ParquetMetaData`]
//! and a [`file::reader::ChunkSource`] yielding framed pages, and get back
//! [`column::DataColumn`]s or assembled [`record::api::Row`]s.

#![allow(non_camel_case_types)]

#[macro_use]
extern crate quick_error;

#[macro_use]
pub mod errors;
pub mod basic;
#[macro_use]
pub mod util;
pub mod data_type;
pub mod compression;
pub mod encodings;
pub mod schema;
pub mod column;
pub mod record;
pub mod file;
