use chrono::NaiveDate;
use glob::Pattern;
use log::debug;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::date_gen::filename_date;
use crate::error::{Result, TempError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterEntry {
    pub date: NaiveDate,
    pub path: PathBuf,
}

/// Date to raster lookup built from file names. Read-only once built.
#[derive(Debug, Default)]
pub struct RasterDateIndex {
    entries: BTreeMap<NaiveDate, PathBuf>,
    skipped: usize,
}

impl RasterDateIndex {
    /// Indexes `files` by the date token at `token_index`.
    ///
    /// Names without a parseable date are skipped. When two files share a date the one
    /// later in `files` wins.
    pub fn build<I, P>(files: I, token_index: usize) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut index = RasterDateIndex::default();

        for file in files {
            let path: PathBuf = file.into();
            let date = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(|name| filename_date(name, token_index));

            match date {
                Some(date) => {
                    if let Some(previous) = index.entries.insert(date, path.clone()) {
                        debug!(
                            "{} replaces {} for {}",
                            path.display(),
                            previous.display(),
                            date
                        );
                    }
                }
                None => {
                    debug!("Skipping {}: no date at token {}", path.display(), token_index);
                    index.skipped += 1;
                }
            }
        }

        index
    }

    /// Lists `dir` in file name order and indexes the files matching `pattern`.
    pub fn from_dir(
        dir: &Path,
        pattern: &Pattern,
        token_index: usize,
        recursive: bool,
    ) -> Result<Self> {
        if !dir.is_dir() {
            return Err(TempError::RasterDir(dir.to_path_buf()));
        }

        let files = list_files(dir, pattern, recursive)?;
        Ok(Self::build(files, token_index))
    }

    pub fn get(&self, date: &NaiveDate) -> Option<&Path> {
        self.entries.get(date).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of listed files whose names held no date.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn entries(&self) -> impl Iterator<Item = RasterEntry> + '_ {
        self.entries.iter().map(|(date, path)| RasterEntry {
            date: *date,
            path: path.clone(),
        })
    }

    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.entries.keys().next()?;
        let last = self.entries.keys().next_back()?;
        Some((*first, *last))
    }
}

/// Files under `dir` whose names match `pattern`, sorted by file name.
pub fn list_files(dir: &Path, pattern: &Pattern, recursive: bool) -> Result<Vec<PathBuf>> {
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(if recursive { usize::MAX } else { 1 })
        .sort_by_file_name();

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_file()
            && let Some(file_name) = entry.file_name().to_str()
            && pattern.matches(file_name)
        {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_build_one_entry_per_date() {
        let index = RasterDateIndex::build(
            [
                "clipped_PRISM_tmean_stable_4kmD2_20200101_bil.tif",
                "clipped_PRISM_tmean_stable_4kmD2_20200102_bil.tif",
                "clipped_PRISM_tmean_stable_4kmD2_20200103_bil.tif",
            ],
            5,
        );

        assert_eq!(index.len(), 3);
        assert_eq!(index.skipped(), 0);
        assert_eq!(
            index.get(&date(2020, 1, 2)),
            Some(Path::new("clipped_PRISM_tmean_stable_4kmD2_20200102_bil.tif"))
        );
        assert_eq!(index.get(&date(2020, 1, 4)), None);
        assert_eq!(
            index.date_range(),
            Some((date(2020, 1, 1), date(2020, 1, 3)))
        );
    }

    #[test]
    fn test_build_last_write_wins() {
        let index = RasterDateIndex::build(
            [
                "a/clipped_PRISM_tmean_stable_4kmD2_20200101_bil.tif",
                "b/clipped_PRISM_tmean_provisional_4kmD2_20200101_bil.tif",
            ],
            5,
        );

        assert_eq!(index.len(), 1);
        assert_eq!(
            index.get(&date(2020, 1, 1)),
            Some(Path::new(
                "b/clipped_PRISM_tmean_provisional_4kmD2_20200101_bil.tif"
            ))
        );
    }

    #[test]
    fn test_build_skips_unparseable_names() {
        let index = RasterDateIndex::build(
            [
                "clipped_PRISM_tmean_stable_4kmD2_20200101_bil.tif",
                "readme.tif",
                "clipped_PRISM_tmean_stable_4kmD2_notadate_bil.tif",
            ],
            5,
        );

        assert_eq!(index.len(), 1);
        assert_eq!(index.skipped(), 2);
    }

    #[test]
    fn test_entries_are_date_ordered() {
        let index = RasterDateIndex::build(
            [
                "x_x_x_x_x_20200105_x.tif",
                "x_x_x_x_x_20200101_x.tif",
                "x_x_x_x_x_20200103_x.tif",
            ],
            5,
        );

        let dates: Vec<NaiveDate> = index.entries().map(|e| e.date).collect();
        assert_eq!(
            dates,
            vec![date(2020, 1, 1), date(2020, 1, 3), date(2020, 1, 5)]
        );
    }

    #[test]
    fn test_from_dir_filters_by_pattern() {
        let dir = tempdir().unwrap();
        for name in [
            "clipped_PRISM_tmean_stable_4kmD2_20200101_bil.tif",
            "clipped_PRISM_tmean_stable_4kmD2_20200101_bil.tif.aux.xml",
            "clipped_PRISM_tmean_stable_4kmD2_20200102_bil.tif",
            "notes.txt",
        ] {
            File::create(dir.path().join(name)).unwrap();
        }
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        File::create(
            dir.path()
                .join("nested")
                .join("clipped_PRISM_tmean_stable_4kmD2_20200103_bil.tif"),
        )
        .unwrap();

        let pattern = Pattern::new("*.tif").unwrap();

        let flat = RasterDateIndex::from_dir(dir.path(), &pattern, 5, false).unwrap();
        assert_eq!(flat.len(), 2);

        let deep = RasterDateIndex::from_dir(dir.path(), &pattern, 5, true).unwrap();
        assert_eq!(deep.len(), 3);
    }

    #[test]
    fn test_from_dir_missing_directory_is_fatal() {
        let dir = tempdir().unwrap();
        let pattern = Pattern::new("*.tif").unwrap();
        let result = RasterDateIndex::from_dir(&dir.path().join("nope"), &pattern, 5, false);
        assert!(matches!(result, Err(TempError::RasterDir(_))));
    }
}
