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

use std::collections::VecDeque;

use crate::basic::{Encoding, PageType};
use crate::errors::Result;
use crate::file::statistics::Statistics;
use crate::util::memory::ByteBufferPtr;

/// One page of a column chunk, with its payload already sliced out of the
/// chunk bytes. Page headers are decoded by the framing collaborator; the
/// payload may still be compressed.
#[derive(Debug, Clone)]
pub enum Page {
  DataPage {
    buf: ByteBufferPtr,
    num_values: u32,
    encoding: Encoding,
    def_level_encoding: Encoding,
    rep_level_encoding: Encoding,
    statistics: Option<Statistics>
  },
  DataPageV2 {
    buf: ByteBufferPtr,
    num_values: u32,
    encoding: Encoding,
    num_nulls: u32,
    num_rows: u32,
    def_levels_byte_len: u32,
    rep_levels_byte_len: u32,
    is_compressed: bool,
    statistics: Option<Statistics>
  },
  DictionaryPage {
    buf: ByteBufferPtr,
    num_values: u32,
    encoding: Encoding,
    is_sorted: bool
  }
}

impl Page {
  pub fn page_type(&self) -> PageType {
    match self {
      Page::DataPage { .. } => PageType::DATA_PAGE,
      Page::DataPageV2 { .. } => PageType::DATA_PAGE_V2,
      Page::DictionaryPage { .. } => PageType::DICTIONARY_PAGE
    }
  }

  pub fn buffer(&self) -> &ByteBufferPtr {
    match self {
      Page::DataPage { ref buf, .. } => buf,
      Page::DataPageV2 { ref buf, .. } => buf,
      Page::DictionaryPage { ref buf, .. } => buf
    }
  }

  pub fn num_values(&self) -> u32 {
    match self {
      Page::DataPage { num_values, .. } => *num_values,
      Page::DataPageV2 { num_values, .. } => *num_values,
      Page::DictionaryPage { num_values, .. } => *num_values
    }
  }

  pub fn encoding(&self) -> Encoding {
    match self {
      Page::DataPage { encoding, .. } => *encoding,
      Page::DataPageV2 { encoding, .. } => *encoding,
      Page::DictionaryPage { encoding, .. } => *encoding
    }
  }

  pub fn statistics(&self) -> Option<&Statistics> {
    match self {
      Page::DataPage { ref statistics, .. } => statistics.as_ref(),
      Page::DataPageV2 { ref statistics, .. } => statistics.as_ref(),
      Page::DictionaryPage { .. } => None
    }
  }
}

/// API for reading pages from a column chunk, iterator-like.
pub trait PageReader {
  /// The next page in the column chunk, or `None` when the chunk ends.
  fn get_next_page(&mut self) -> Result<Option<Page>>;
}

/// A page reader over an in-memory page sequence, in file order: the
/// dictionary page, when present, comes first.
pub struct InMemoryPageReader {
  pages: VecDeque<Page>
}

impl InMemoryPageReader {
  pub fn new(pages: Vec<Page>) -> Self {
    Self { pages: pages.into() }
  }
}

impl PageReader for InMemoryPageReader {
  fn get_next_page(&mut self) -> Result<Option<Page>> {
    Ok(self.pages.pop_front())
  }
}
