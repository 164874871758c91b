use crate::config::Window;
use chrono::{Duration, NaiveDate};
use std::ops::Range;

const FILENAME_DATE_FORMAT: &str = "%Y%m%d";

/// Parses the `YYYYMMDD` token at `token_index` of an underscore-delimited file name.
///
/// `clipped_PRISM_tmean_stable_4kmD2_20200101_bil.tif` yields 2020-01-01 at index 5.
pub fn filename_date(file_name: &str, token_index: usize) -> Option<NaiveDate> {
    let token = file_name.split('_').nth(token_index)?;
    if token.len() != 8 || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(token, FILENAME_DATE_FORMAT).ok()
}

/// Dates preceding an observation, one per window offset, oldest last.
pub struct TrailingDates {
    observed: NaiveDate,
    offsets: Range<u32>,
}

impl TrailingDates {
    pub fn new(observed: NaiveDate, window: Window) -> Self {
        Self {
            observed,
            offsets: window.offsets(),
        }
    }
}

impl Iterator for TrailingDates {
    type Item = (u32, NaiveDate);

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.offsets.next()?;
        let date = self
            .observed
            .checked_sub_signed(Duration::days(offset as i64))?;
        Some((offset, date))
    }
}
