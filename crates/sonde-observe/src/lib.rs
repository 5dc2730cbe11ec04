// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! Sonde observe: node-synchronized observation and benchmarking
//!
//! Observation extractors and information functions are attached to a
//! `driver::SearchTreeDriver`, which steps a solver through one episode and
//! calls every probe exactly once per node in registration order, plus once
//! more with `done == true` after the search has finished.
//!
//! Core flow
//! - Register extractors (`observation`) and information functions
//!   (`information`) on a driver.
//! - Call `run_episode` with a freshly created solver state.
//! - Write the resulting `information::InformationRecord` with a
//!   `record::RecordWriter`.
//!
//! Benchmarking
//! - `harness::BenchmarkHarness` wraps every registered extractor in a
//!   `Timed` and a summing `Cumulative`, runs the same trajectory for each
//!   and reports per-extractor latency and node totals.
//!
//! Module map
//! - `observation`: `ObservationExtractor` and the built-in extractors.
//! - `information`: `InformationFunction`, combinators and basic functions.
//! - `driver`: the episode protocol and timing control.
//! - `harness`: extractor registry and benchmark harness.
//! - `clock`: wall and process CPU clocks.
//! - `record`: CSV output of information records.
//! - `error`: `ObserveError`.

pub mod clock;
pub mod driver;
pub mod error;
pub mod harness;
pub mod information;
pub mod observation;
pub mod record;

#[cfg(test)]
pub(crate) mod test_support;
