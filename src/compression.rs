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

use std::io::{Read, Write};

use brotli;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use snap::raw::{decompress_len, Decoder, Encoder};

use crate::basic::Compression as CodecType;
use crate::errors::Result;

pub trait Codec {
  /// Compress data stored in slice `input_buf` and return a new vector with
  /// the compressed data.
  fn compress(&mut self, input_buf: &[u8]) -> Result<Vec<u8>>;

  /// Decompress data stored in slice `input_buf` and write the output to
  /// `output_buf`. Return the total number of bytes written.
  fn decompress(&mut self, input_buf: &[u8], output_buf: &mut Vec<u8>) -> Result<usize>;
}

/// Given the compression type `codec`, return a codec used to compress and
/// decompress bytes for that type. Returns `None` for `UNCOMPRESSED`.
pub fn create_codec(codec: CodecType) -> Result<Option<Box<dyn Codec>>> {
  match codec {
    CodecType::SNAPPY => Ok(Some(Box::new(SnappyCodec::new()))),
    CodecType::GZIP => Ok(Some(Box::new(GZipCodec::new()))),
    CodecType::BROTLI => Ok(Some(Box::new(BrotliCodec::new()))),
    CodecType::ZSTD => Ok(Some(Box::new(ZstdCodec::new()))),
    CodecType::UNCOMPRESSED => Ok(None),
    _ => Err(unsupported_err!("The codec type {} is not supported", codec))
  }
}

pub struct SnappyCodec {
  decoder: Decoder,
  encoder: Encoder
}

impl SnappyCodec {
  fn new() -> Self {
    Self { decoder: Decoder::new(), encoder: Encoder::new() }
  }
}

impl Codec for SnappyCodec {
  fn decompress(&mut self, input_buf: &[u8], output_buf: &mut Vec<u8>) -> Result<usize> {
    let len = decompress_len(input_buf)
      .map_err(|e| malformed_err!("Corrupt Snappy length header: {}", e))?;
    output_buf.resize(len, 0);
    self.decoder
      .decompress(input_buf, output_buf)
      .map_err(|e| malformed_err!("Error when decompressing using Snappy: {}", e))
  }

  fn compress(&mut self, input_buf: &[u8]) -> Result<Vec<u8>> {
    self.encoder
      .compress_vec(input_buf)
      .map_err(|e| malformed_err!("Error when compressing using Snappy: {}", e))
  }
}

pub struct GZipCodec {}

impl GZipCodec {
  fn new() -> Self {
    Self {}
  }
}

impl Codec for GZipCodec {
  fn decompress(&mut self, input_buf: &[u8], output_buf: &mut Vec<u8>) -> Result<usize> {
    let mut decoder = GzDecoder::new(input_buf);
    decoder
      .read_to_end(output_buf)
      .map_err(|e| malformed_err!("Error when decompressing using GZip: {}", e))
  }

  fn compress(&mut self, input_buf: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(input_buf)?;
    encoder
      .finish()
      .map_err(|e| malformed_err!("Error when compressing using GZip: {}", e))
  }
}

const BROTLI_DEFAULT_BUFFER_SIZE: usize = 4096;
const BROTLI_DEFAULT_COMPRESSION_QUALITY: u32 = 9; // supported levels 0-9
const BROTLI_DEFAULT_LG_WINDOW_SIZE: u32 = 22; // recommended between 20-22

pub struct BrotliCodec {}

impl BrotliCodec {
  fn new() -> Self {
    Self {}
  }
}

impl Codec for BrotliCodec {
  fn decompress(&mut self, input_buf: &[u8], output_buf: &mut Vec<u8>) -> Result<usize> {
    brotli::Decompressor::new(input_buf, BROTLI_DEFAULT_BUFFER_SIZE)
      .read_to_end(output_buf)
      .map_err(|e| malformed_err!("Error when decompressing using Brotli: {}", e))
  }

  fn compress(&mut self, input_buf: &[u8]) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut reader = brotli::CompressorReader::new(
      input_buf,
      BROTLI_DEFAULT_BUFFER_SIZE,
      BROTLI_DEFAULT_COMPRESSION_QUALITY,
      BROTLI_DEFAULT_LG_WINDOW_SIZE
    );
    reader.read_to_end(&mut buffer)?;
    Ok(buffer)
  }
}

const ZSTD_DEFAULT_COMPRESSION_LEVEL: i32 = 1;

pub struct ZstdCodec {}

impl ZstdCodec {
  fn new() -> Self {
    Self {}
  }
}

impl Codec for ZstdCodec {
  fn decompress(&mut self, input_buf: &[u8], output_buf: &mut Vec<u8>) -> Result<usize> {
    let mut decoder = zstd::Decoder::new(input_buf)
      .map_err(|e| malformed_err!("Error when decompressing using Zstd: {}", e))?;
    decoder
      .read_to_end(output_buf)
      .map_err(|e| malformed_err!("Error when decompressing using Zstd: {}", e))
  }

  fn compress(&mut self, input_buf: &[u8]) -> Result<Vec<u8>> {
    zstd::encode_all(input_buf, ZSTD_DEFAULT_COMPRESSION_LEVEL)
      .map_err(|e| malformed_err!("Error when compressing using Zstd: {}", e))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::test_common::*;

  fn test_roundtrip(c: CodecType, data: &[u8]) {
    let mut c1 = create_codec(c).unwrap().unwrap();
    let mut c2 = create_codec(c).unwrap().unwrap();

    // compress with c1, decompress with c2
    let compressed = c1.compress(data).expect("compress should be OK");
    let mut decompressed = Vec::new();
    let decompressed_size =
      c2.decompress(compressed.as_slice(), &mut decompressed).expect("decompress should be OK");
    decompressed.truncate(decompressed_size);
    assert_eq!(data, decompressed.as_slice());

    // compress with c2, decompress with c1
    let compressed = c2.compress(data).expect("compress should be OK");
    let mut decompressed = Vec::new();
    let decompressed_size =
      c1.decompress(compressed.as_slice(), &mut decompressed).expect("decompress should be OK");
    decompressed.truncate(decompressed_size);
    assert_eq!(data, decompressed.as_slice());
  }

  fn test_codec(c: CodecType) {
    let sizes = vec![100, 10000, 100000];
    for size in sizes {
      let data = random_bytes(size);
      test_roundtrip(c, &data);
    }
  }

  #[test]
  fn test_codec_snappy() {
    test_codec(CodecType::SNAPPY);
  }

  #[test]
  fn test_codec_gzip() {
    test_codec(CodecType::GZIP);
  }

  #[test]
  fn test_codec_brotli() {
    test_codec(CodecType::BROTLI);
  }

  #[test]
  fn test_codec_zstd() {
    test_codec(CodecType::ZSTD);
  }

  #[test]
  fn test_codec_lzo_unsupported() {
    assert!(create_codec(CodecType::LZO).is_err());
  }

  #[test]
  fn test_codec_uncompressed() {
    assert!(create_codec(CodecType::UNCOMPRESSED).unwrap().is_none());
  }
}
