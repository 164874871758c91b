use serde::Deserialize;
use std::fmt;
use std::ops::Range;

/// Trailing window of days preceding an observation, as `start..end` offsets.
///
/// `(1, 7)` covers offsets 1 through 6, i.e. the six days before the observation.
/// Furthest a window may reach back, in days.
pub const MAX_WINDOW_END: u32 = 366;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    start: u32,
    end: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WindowHelper {
    pub start: u32,
    pub end: u32,
}

#[derive(Debug, PartialEq, Eq)]
pub enum WindowError {
    ZeroStart,
    Empty { start: u32, end: u32 },
    TooLong { end: u32 },
}

impl fmt::Display for WindowError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WindowError::ZeroStart => {
                write!(f, "window start must be at least 1 (offset 0 is the observation day)")
            }
            WindowError::Empty { start, end } => {
                write!(f, "window end ({}) must be greater than start ({})", end, start)
            }
            WindowError::TooLong { end } => {
                write!(f, "window end ({}) exceeds {} days", end, MAX_WINDOW_END)
            }
        }
    }
}

impl std::error::Error for WindowError {}

impl Window {
    pub fn new(start: u32, end: u32) -> Result<Self, WindowError> {
        if start == 0 {
            return Err(WindowError::ZeroStart);
        }
        if end <= start {
            return Err(WindowError::Empty { start, end });
        }
        if end > MAX_WINDOW_END {
            return Err(WindowError::TooLong { end });
        }
        Ok(Self { start, end })
    }

    pub fn offsets(&self) -> Range<u32> {
        self.start..self.end
    }
}
