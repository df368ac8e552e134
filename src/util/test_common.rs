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

use rand::distributions::uniform::SampleUniform;
use rand::distributions::{Distribution, Standard};
use rand::{thread_rng, Rng};

pub fn random_bytes(n: usize) -> Vec<u8> {
  let mut rng = thread_rng();
  (0..n).map(|_| rng.gen::<u8>()).collect()
}

pub fn random_bools(n: usize) -> Vec<bool> {
  let mut rng = thread_rng();
  (0..n).map(|_| rng.gen::<bool>()).collect()
}

pub fn random_numbers<T>(n: usize) -> Vec<T>
where
  Standard: Distribution<T>
{
  let mut rng = thread_rng();
  (0..n).map(|_| rng.gen::<T>()).collect()
}

pub fn random_numbers_range<T>(n: usize, low: T, high: T) -> Vec<T>
where
  T: PartialOrd + SampleUniform + Copy
{
  let mut rng = thread_rng();
  (0..n).map(|_| rng.gen_range(low..high)).collect()
}
