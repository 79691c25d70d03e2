//! # Chunk Repository
//!
//! Persisted chunk storage. The manager asks the repository first and falls
//! back to the generator when nothing is stored.
//!
//! ## File Format
//!
//! [`FileRepository`] keeps one JSON document per chunk, named
//! `chunk_<x>_<y>_<z>.json`:
//!
//! ```text
//! {
//!   "location": [x, y, z],
//!   "size": [sx, sy, sz],
//!   "palette": ["stone", "dirt"],
//!   "cells": [0, 1, 1, 2, ...]
//! }
//! ```
//!
//! `cells` holds one entry per cell in chunk index order
//! (`x + z * sx + y * sx * sz`). `0` is an empty cell, `n` is `palette[n - 1]`.
//! Blocks are stored by name and resolved through the [`BlockRegistry`] on
//! load.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cgmath::{Point3, Vector3};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::ChunkConfig;
use crate::error::{ChunkError, ChunkResult};
use crate::voxels::block::BlockRegistry;
use crate::voxels::chunk::Chunk;

/// Persisted chunk storage. Called from generation workers and the control
/// thread, possibly at the same time for different locations.
pub trait ChunkRepository: Send + Sync {
    /// The stored chunk at `location`, `None` when nothing is stored.
    fn load(&self, location: Point3<i32>) -> ChunkResult<Option<Chunk>>;

    /// Stores the block data of a chunk, replacing any previous record.
    fn save(&self, chunk: &Chunk) -> ChunkResult<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct ChunkRecord {
    location: [i32; 3],
    size: [i32; 3],
    palette: Vec<String>,
    cells: Vec<u16>,
}

/// Stores chunks as JSON files in one directory.
pub struct FileRepository {
    directory: PathBuf,
    registry: Arc<BlockRegistry>,
    config: ChunkConfig,
}

impl FileRepository {
    /// Opens a repository rooted at `directory`, creating it if needed.
    pub fn new(
        directory: impl Into<PathBuf>,
        registry: Arc<BlockRegistry>,
        config: ChunkConfig,
    ) -> ChunkResult<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory)?;
        Ok(FileRepository {
            directory,
            registry,
            config,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn path_for(&self, location: Point3<i32>) -> PathBuf {
        self.directory.join(format!(
            "chunk_{}_{}_{}.json",
            location.x, location.y, location.z
        ))
    }

    fn record_of(chunk: &Chunk) -> ChunkResult<ChunkRecord> {
        let mut palette: Vec<String> = Vec::new();
        let mut palette_index: HashMap<&str, u16> = HashMap::new();
        let mut cells = Vec::with_capacity(chunk.volume());

        for index in 0..chunk.volume() {
            let cell = match chunk.get_block_at_index(index) {
                None => 0,
                Some(block) => match palette_index.get(block.name.as_str()) {
                    Some(&entry) => entry,
                    None => {
                        let entry = u16::try_from(palette.len() + 1).map_err(|_| {
                            ChunkError::RepositoryIo(format!(
                                "chunk {:?} uses more than {} block kinds",
                                chunk.location(),
                                u16::MAX
                            ))
                        })?;
                        palette.push(block.name.clone());
                        palette_index.insert(block.name.as_str(), entry);
                        entry
                    }
                },
            };
            cells.push(cell);
        }

        let location = chunk.location();
        let size = chunk.size();
        Ok(ChunkRecord {
            location: [location.x, location.y, location.z],
            size: [size.x, size.y, size.z],
            palette,
            cells,
        })
    }

    fn chunk_from_record(&self, record: ChunkRecord, location: Point3<i32>) -> ChunkResult<Chunk> {
        let size = Vector3::from(record.size);
        if size != self.config.chunk_size {
            return Err(ChunkError::RepositoryIo(format!(
                "stored chunk {:?} has size {:?}, expected {:?}",
                location, size, self.config.chunk_size
            )));
        }
        if Point3::from(record.location) != location {
            return Err(ChunkError::RepositoryIo(format!(
                "record for {:?} claims location {:?}",
                location, record.location
            )));
        }

        let palette = record
            .palette
            .iter()
            .map(|name| self.registry.require(name))
            .collect::<ChunkResult<Vec<_>>>()?;

        let mut chunk = Chunk::new(location, &self.config);
        if record.cells.len() != chunk.volume() {
            return Err(ChunkError::RepositoryIo(format!(
                "stored chunk {:?} has {} cells, expected {}",
                location,
                record.cells.len(),
                chunk.volume()
            )));
        }

        for (index, &cell) in record.cells.iter().enumerate() {
            if cell == 0 {
                continue;
            }
            let block = palette.get(cell as usize - 1).ok_or_else(|| {
                ChunkError::RepositoryIo(format!(
                    "stored chunk {:?} references palette entry {} of {}",
                    location,
                    cell,
                    palette.len()
                ))
            })?;
            chunk.add_block(chunk.location_of(index), block.clone())?;
        }
        Ok(chunk)
    }
}

impl ChunkRepository for FileRepository {
    fn load(&self, location: Point3<i32>) -> ChunkResult<Option<Chunk>> {
        let path = self.path_for(location);
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let record: ChunkRecord = serde_json::from_str(&json)?;
        let chunk = self.chunk_from_record(record, location)?;
        debug!("Loaded chunk {:?} from {}", location, path.display());
        Ok(Some(chunk))
    }

    fn save(&self, chunk: &Chunk) -> ChunkResult<()> {
        let record = Self::record_of(chunk)?;
        let path = self.path_for(chunk.location());
        let staging = path.with_extension("json.tmp");

        fs::write(&staging, serde_json::to_vec(&record)?)?;
        fs::rename(&staging, &path)?;
        debug!("Saved chunk {:?} to {}", chunk.location(), path.display());
        Ok(())
    }
}
