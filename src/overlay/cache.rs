use chrono::NaiveDate;
use log::{debug, error};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::Path;

use crate::readers::{Grid, ReadError, create_reader};

pub trait GridLoader {
    fn load(&self, path: &Path) -> Result<Grid, ReadError>;
}

/// Loads grids from disk, picking the reader from the file extension.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileLoader;

impl GridLoader for FileLoader {
    fn load(&self, path: &Path) -> Result<Grid, ReadError> {
        create_reader(path.to_path_buf()).read_data()
    }
}

/// Grids opened during a run, keyed by date, so that points sharing a date or a trailing
/// window never reopen the same file. Load failures are remembered too.
pub struct RasterCache<L: GridLoader> {
    loader: L,
    grids: HashMap<NaiveDate, Grid>,
    failed: HashMap<NaiveDate, String>,
}

impl<L: GridLoader> RasterCache<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            grids: HashMap::new(),
            failed: HashMap::new(),
        }
    }

    pub fn get(&mut self, date: NaiveDate, path: &Path) -> Result<&Grid, ReadError> {
        if let Some(msg) = self.failed.get(&date) {
            return Err(ReadError::Unavailable(msg.clone()));
        }

        match self.grids.entry(date) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                debug!("Opening raster {} for {}", path.display(), date);
                match self.loader.load(path) {
                    Ok(grid) => Ok(entry.insert(grid)),
                    Err(e) => {
                        error!("Failed to load raster {}: {}", path.display(), e);
                        self.failed
                            .insert(date, format!("{}: {}", path.display(), e));
                        Err(e)
                    }
                }
            }
        }
    }

    pub fn failed(&self) -> usize {
        self.failed.len()
    }

    pub fn len(&self) -> usize {
        self.grids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }
}
