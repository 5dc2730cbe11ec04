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

//! Wall and process CPU clocks.
//!
//! `Stopwatch` brackets a piece of work with the clocks chosen by a
//! `ClockSelection` and yields a `TimerSample`. Wall time comes from
//! `Instant`; CPU time is the CPU time consumed by the whole process, read
//! with `clock_gettime(CLOCK_PROCESS_CPUTIME_ID)`. Samples never go
//! negative: elapsed times use saturating subtraction.

use std::{
    ops::{Add, AddAssign},
    time::{Duration, Instant},
};

/// Failures of the clocks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    /// Process CPU time is not available on this platform.
    #[error("process CPU time is not supported on this platform")]
    Unsupported,
    /// The operating system rejected the clock query.
    #[error("reading the process CPU clock failed with OS error {code}")]
    Os { code: i32 },
}

/// Which clocks a measurement reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClockSelection {
    Wall,
    Cpu,
    #[default]
    Both,
}

impl ClockSelection {
    #[inline]
    pub fn wall(self) -> bool {
        matches!(self, ClockSelection::Wall | ClockSelection::Both)
    }

    #[inline]
    pub fn cpu(self) -> bool {
        matches!(self, ClockSelection::Cpu | ClockSelection::Both)
    }
}

impl std::fmt::Display for ClockSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClockSelection::Wall => write!(f, "wall"),
            ClockSelection::Cpu => write!(f, "cpu"),
            ClockSelection::Both => write!(f, "wall+cpu"),
        }
    }
}

/// Elapsed time per clock; `None` for clocks that were not read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimerSample {
    pub wall: Option<Duration>,
    pub cpu: Option<Duration>,
}

impl TimerSample {
    /// A sample with both clocks at zero.
    pub const ZERO: TimerSample = TimerSample {
        wall: Some(Duration::ZERO),
        cpu: Some(Duration::ZERO),
    };

    /// A zero sample reading the clocks of `selection`.
    #[inline]
    pub fn zero(selection: ClockSelection) -> Self {
        Self {
            wall: selection.wall().then_some(Duration::ZERO),
            cpu: selection.cpu().then_some(Duration::ZERO),
        }
    }

    /// Divides every present duration by `n`; `n == 0` yields the sample unchanged.
    #[inline]
    pub fn div(self, n: u32) -> Self {
        if n == 0 {
            return self;
        }
        Self {
            wall: self.wall.map(|d| d / n),
            cpu: self.cpu.map(|d| d / n),
        }
    }
}

#[inline]
fn add_optional(a: Option<Duration>, b: Option<Duration>) -> Option<Duration> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.saturating_add(b)),
        (Some(a), None) | (None, Some(a)) => Some(a),
        (None, None) => None,
    }
}

impl Add for TimerSample {
    type Output = TimerSample;

    #[inline]
    fn add(self, rhs: TimerSample) -> TimerSample {
        TimerSample {
            wall: add_optional(self.wall, rhs.wall),
            cpu: add_optional(self.cpu, rhs.cpu),
        }
    }
}

impl AddAssign for TimerSample {
    #[inline]
    fn add_assign(&mut self, rhs: TimerSample) {
        *self = *self + rhs;
    }
}

impl std::fmt::Display for TimerSample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let show = |d: Option<Duration>| d.map_or_else(|| "-".to_string(), |d| format!("{:.2?}", d));
        write!(f, "wall {} / cpu {}", show(self.wall), show(self.cpu))
    }
}

/// Returns the CPU time consumed by the current process.
#[cfg(unix)]
pub fn process_cpu_time() -> Result<Duration, ClockError> {
    // SAFETY: an all-zero `timespec` is a valid value.
    let mut ts: libc::timespec = unsafe { std::mem::zeroed() };
    // SAFETY: `ts` is a valid, writable `timespec` for the duration of the call.
    let rc = unsafe { libc::clock_gettime(libc::CLOCK_PROCESS_CPUTIME_ID, &mut ts) };
    if rc != 0 {
        let code = std::io::Error::last_os_error().raw_os_error().unwrap_or(0);
        return Err(ClockError::Os { code });
    }
    Ok(Duration::new(ts.tv_sec.max(0) as u64, ts.tv_nsec.clamp(0, 999_999_999) as u32))
}

/// Returns the CPU time consumed by the current process.
#[cfg(not(unix))]
pub fn process_cpu_time() -> Result<Duration, ClockError> {
    Err(ClockError::Unsupported)
}

/// A running measurement.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    wall_start: Option<Instant>,
    cpu_start: Option<Duration>,
}

impl Stopwatch {
    /// Starts the clocks of `selection`.
    #[inline]
    pub fn start(selection: ClockSelection) -> Result<Self, ClockError> {
        let cpu_start = if selection.cpu() {
            Some(process_cpu_time()?)
        } else {
            None
        };
        let wall_start = selection.wall().then(Instant::now);
        Ok(Self {
            wall_start,
            cpu_start,
        })
    }

    /// Reads the clocks and returns the elapsed time since `start`.
    #[inline]
    pub fn elapsed(&self) -> Result<TimerSample, ClockError> {
        let wall = self.wall_start.map(|start| start.elapsed());
        let cpu = match self.cpu_start {
            Some(start) => Some(process_cpu_time()?.saturating_sub(start)),
            None => None,
        };
        Ok(TimerSample { wall, cpu })
    }

    /// Runs `work` between two clock readings.
    pub fn measure<R, F>(selection: ClockSelection, work: F) -> Result<(R, TimerSample), ClockError>
    where
        F: FnOnce() -> R,
    {
        let watch = Self::start(selection)?;
        let result = work();
        let sample = watch.elapsed()?;
        Ok((result, sample))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_controls_present_clocks() {
        let ((), wall) = Stopwatch::measure(ClockSelection::Wall, || ()).unwrap();
        assert!(wall.wall.is_some());
        assert!(wall.cpu.is_none());

        if cfg!(unix) {
            let ((), cpu) = Stopwatch::measure(ClockSelection::Cpu, || ()).unwrap();
            assert!(cpu.wall.is_none());
            assert!(cpu.cpu.is_some());
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_cpu_time_is_monotonic() {
        let a = process_cpu_time().unwrap();
        let mut x = 0u64;
        for i in 0..100_000u64 {
            x = x.wrapping_mul(31).wrapping_add(i);
        }
        std::hint::black_box(x);
        let b = process_cpu_time().unwrap();
        assert!(b >= a);
    }

    #[test]
    fn test_samples_add_per_clock() {
        let a = TimerSample {
            wall: Some(Duration::from_millis(3)),
            cpu: None,
        };
        let b = TimerSample {
            wall: Some(Duration::from_millis(4)),
            cpu: Some(Duration::from_millis(1)),
        };
        let sum = a + b;
        assert_eq!(sum.wall, Some(Duration::from_millis(7)));
        assert_eq!(sum.cpu, Some(Duration::from_millis(1)));
        assert_eq!(TimerSample::default() + TimerSample::default(), TimerSample::default());
        assert_eq!(sum.div(7).wall, Some(Duration::from_millis(1)));
        assert_eq!(TimerSample::zero(ClockSelection::Wall).cpu, None);
    }
}
