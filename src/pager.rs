//! # Chunk Pager
//!
//! Keeps a cube of `grid_size³` chunks requested around a moving centre,
//! usually the camera or player position. When the centre crosses into
//! another chunk the pager requests the chunks that entered the grid and
//! removes the ones that left it.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use cgmath::Point3;
//! use voxel_chunks::config::{ChunkConfig, ChunkManagerConfig};
//! use voxel_chunks::manager::ChunkManager;
//! use voxel_chunks::meshing::{FacesMeshGenerator, ShapeRegistry};
//! use voxel_chunks::pager::ChunkPager;
//!
//! let chunk_config = ChunkConfig::default();
//! let mesher = Arc::new(FacesMeshGenerator::new(Arc::new(ShapeRegistry::default()), 1.0));
//! let mut manager = ChunkManager::new(ChunkManagerConfig::default(), chunk_config, mesher);
//! manager.initialize().unwrap();
//!
//! let mut pager = ChunkPager::new(chunk_config);
//! pager.set_centre(&mut manager, Point3::new(0.0, 0.0, 0.0)).unwrap();
//! loop {
//!     manager.update();
//!     # break;
//! }
//! ```

use std::collections::HashSet;

use cgmath::Point3;
use log::debug;

use crate::config::ChunkConfig;
use crate::error::ChunkResult;
use crate::manager::ChunkManager;

pub struct ChunkPager {
    config: ChunkConfig,
    centre: Option<Point3<i32>>,
    paged: HashSet<Point3<i32>>,
}

impl ChunkPager {
    pub fn new(config: ChunkConfig) -> Self {
        ChunkPager {
            config,
            centre: None,
            paged: HashSet::new(),
        }
    }

    /// Chunk location the grid is currently centred on.
    pub fn centre(&self) -> Option<Point3<i32>> {
        self.centre
    }

    /// Locations the pager keeps requested.
    pub fn paged_locations(&self) -> impl Iterator<Item = &Point3<i32>> {
        self.paged.iter()
    }

    pub fn is_paged(&self, location: Point3<i32>) -> bool {
        self.paged.contains(&location)
    }

    /// The chunk locations of the grid centred on a chunk location.
    ///
    /// For an even grid size the extra row lies on the negative side.
    pub fn grid_around(&self, centre: Point3<i32>) -> Vec<Point3<i32>> {
        let size = self.config.grid_size;
        let start = -(size / 2);
        let range = start..start + size;

        let mut locations = Vec::with_capacity(self.config.grid_volume());
        for y in range.clone() {
            for z in range.clone() {
                for x in range.clone() {
                    locations.push(Point3::new(centre.x + x, centre.y + y, centre.z + z));
                }
            }
        }
        locations
    }

    /// Moves the grid to the chunk containing a world position.
    ///
    /// Returns `false` without touching the manager when the position is in
    /// the chunk the grid is already centred on.
    pub fn set_centre(
        &mut self,
        manager: &mut ChunkManager,
        position: Point3<f32>,
    ) -> ChunkResult<bool> {
        let centre = self.config.chunk_location(position);
        if self.centre == Some(centre) {
            return Ok(false);
        }

        let grid: HashSet<Point3<i32>> = self.grid_around(centre).into_iter().collect();
        let left: Vec<Point3<i32>> = self.paged.difference(&grid).copied().collect();
        for location in &left {
            manager.remove_chunk(*location);
        }

        let mut entered = 0;
        for location in self.grid_around(centre) {
            if !self.paged.contains(&location) {
                manager.request_chunk(location)?;
                entered += 1;
            }
        }

        debug!(
            "Pager centred on {:?}: {} chunks entered, {} left",
            centre,
            entered,
            left.len()
        );
        self.centre = Some(centre);
        self.paged = grid;
        Ok(true)
    }

    /// Requests every paged location again.
    ///
    /// Locations still requested are skipped by the manager, so this only
    /// retries chunks whose generation or meshing failed.
    pub fn refresh(&self, manager: &mut ChunkManager) -> ChunkResult<()> {
        for location in &self.paged {
            manager.request_chunk(*location)?;
        }
        Ok(())
    }

    /// Removes every paged chunk from the manager and forgets the centre.
    pub fn clear(&mut self, manager: &mut ChunkManager) {
        for location in self.paged.drain() {
            manager.remove_chunk(location);
        }
        self.centre = None;
    }
}
