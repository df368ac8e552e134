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

use crate::data_type::AsBytes;

/// Compute a hash for `data` with seed `seed`, for use by the dictionary
/// encoder's hash table.
pub fn hash<T: AsBytes>(data: &T, seed: u64) -> u64 {
  murmur_hash2_64a(data.as_bytes(), seed)
}

const MURMUR_PRIME: u64 = 0xc6a4a7935bd1e995;
const MURMUR_R: u32 = 47;

/// MurmurHash2, 64-bit version for 64-bit platforms.
fn murmur_hash2_64a(data: &[u8], seed: u64) -> u64 {
  let len = data.len();
  let len_64 = (len / 8) * 8;

  let mut h = seed ^ MURMUR_PRIME.wrapping_mul(len as u64);
  for chunk in data[..len_64].chunks_exact(8) {
    let mut k = u64::from_le_bytes(chunk.try_into().unwrap());
    k = k.wrapping_mul(MURMUR_PRIME);
    k ^= k >> MURMUR_R;
    k = k.wrapping_mul(MURMUR_PRIME);
    h ^= k;
    h = h.wrapping_mul(MURMUR_PRIME);
  }

  let tail = &data[len_64..];
  if !tail.is_empty() {
    for (i, b) in tail.iter().enumerate() {
      h ^= (*b as u64) << (8 * i);
    }
    h = h.wrapping_mul(MURMUR_PRIME);
  }

  h ^= h >> MURMUR_R;
  h = h.wrapping_mul(MURMUR_PRIME);
  h ^= h >> MURMUR_R;
  h
}
