use cgmath::Point3;

use crate::config::ChunkConfig;
use crate::error::ChunkResult;
use crate::voxels::block::BlockRef;
use crate::voxels::chunk::Chunk;

use super::ChunkGenerator;

/// Flat ground: `top` at `height - 1`, `filler` for the `filler_depth`
/// layers below it and `base` further down. Heights are world block
/// coordinates, so the ground continues across chunk boundaries.
pub struct FlatTerrainGenerator {
    config: ChunkConfig,
    height: i32,
    filler_depth: i32,
    top: BlockRef,
    filler: BlockRef,
    base: BlockRef,
}

impl FlatTerrainGenerator {
    pub fn new(
        config: ChunkConfig,
        height: i32,
        top: BlockRef,
        filler: BlockRef,
        base: BlockRef,
    ) -> Self {
        FlatTerrainGenerator {
            config,
            height,
            filler_depth: 3,
            top,
            filler,
            base,
        }
    }

    pub fn with_filler_depth(mut self, filler_depth: i32) -> Self {
        self.filler_depth = filler_depth.max(0);
        self
    }

    fn block_at_height(&self, world_y: i32) -> Option<&BlockRef> {
        let depth = self.height - 1 - world_y;
        match depth {
            d if d < 0 => None,
            0 => Some(&self.top),
            d if d <= self.filler_depth => Some(&self.filler),
            _ => Some(&self.base),
        }
    }
}

impl ChunkGenerator for FlatTerrainGenerator {
    fn generate(&self, location: Point3<i32>) -> ChunkResult<Chunk> {
        let mut chunk = Chunk::new(location, &self.config);
        let size = chunk.size();
        let origin = chunk.world_origin();

        for y in 0..size.y {
            let Some(block) = self.block_at_height(origin.y + y) else {
                continue;
            };
            for z in 0..size.z {
                for x in 0..size.x {
                    chunk.add_block(Point3::new(x, y, z), block.clone())?;
                }
            }
        }
        Ok(chunk)
    }
}
