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

//! Latency of an observation extractor.

use crate::{
    clock::{ClockSelection, Stopwatch, TimerSample},
    error::ObserveError,
    information::InformationFunction,
    observation::{Observation, ObservationExtractor},
};
use sonde_solver::state::SolverState;

/// Times every `extract` call of the wrapped extractor.
///
/// Only the wrapped `extract` call sits between the two clock readings.
/// The observation it returns is kept aside in `last_observation` and never
/// becomes part of the reported `TimerSample`.
#[derive(Clone, Debug)]
pub struct Timed<E> {
    inner: E,
    selection: ClockSelection,
    name: Option<String>,
    last: Option<Observation>,
}

impl<E> Timed<E> {
    /// Reports under the name of the wrapped extractor.
    #[inline]
    pub fn new(inner: E, selection: ClockSelection) -> Self {
        Self {
            inner,
            selection,
            name: None,
            last: None,
        }
    }

    /// Reports under `name` instead of the wrapped extractor's name, so
    /// several wrappers of one extractor type can share a driver.
    #[inline]
    pub fn named<N: Into<String>>(inner: E, selection: ClockSelection, name: N) -> Self {
        Self {
            inner,
            selection,
            name: Some(name.into()),
            last: None,
        }
    }

    #[inline]
    pub fn selection(&self) -> ClockSelection {
        self.selection
    }

    /// The observation returned by the most recent `extract` call.
    #[inline]
    pub fn last_observation(&self) -> Option<&Observation> {
        self.last.as_ref()
    }

    #[inline]
    pub fn take_observation(&mut self) -> Option<Observation> {
        self.last.take()
    }

    #[inline]
    pub fn inner(&self) -> &E {
        &self.inner
    }

    #[inline]
    pub fn into_inner(self) -> E {
        self.inner
    }
}

impl<S, E> InformationFunction<S> for Timed<E>
where
    S: SolverState,
    E: ObservationExtractor<S>,
{
    type Value = TimerSample;

    #[inline]
    fn name(&self) -> &str {
        match &self.name {
            Some(name) => name,
            None => self.inner.name(),
        }
    }

    fn before_reset(&mut self, state: &S) -> Result<(), ObserveError> {
        self.last = None;
        self.inner.before_reset(state)
    }

    fn extract(&mut self, state: &S, done: bool) -> Result<TimerSample, ObserveError> {
        let inner = &mut self.inner;
        let (observation, sample) =
            Stopwatch::measure(self.selection, || inner.extract(state, done))?;
        self.last = observation?;
        Ok(sample)
    }
}
