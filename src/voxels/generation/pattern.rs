use cgmath::Point3;

use crate::config::ChunkConfig;
use crate::error::ChunkResult;
use crate::voxels::block::BlockRef;
use crate::voxels::chunk::Chunk;

use super::ChunkGenerator;

/// Test patterns, mostly useful for profiling the mesher.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pattern {
    /// Every cell filled.
    Solid,
    /// Cells filled where the sum of the world block coordinates is even.
    Checkerboard,
    /// Each cell filled with the given probability.
    Random { density: f64, seed: u64 },
}

pub struct PatternGenerator {
    config: ChunkConfig,
    pattern: Pattern,
    block: BlockRef,
}

impl PatternGenerator {
    pub fn new(config: ChunkConfig, pattern: Pattern, block: BlockRef) -> Self {
        PatternGenerator {
            config,
            pattern,
            block,
        }
    }
}

impl ChunkGenerator for PatternGenerator {
    fn generate(&self, location: Point3<i32>) -> ChunkResult<Chunk> {
        let mut chunk = Chunk::new(location, &self.config);
        let mut rng = match self.pattern {
            Pattern::Random { seed, .. } => Some(fastrand::Rng::with_seed(
                seed ^ ((location.x as u64) << 42) ^ ((location.y as u64) << 21) ^ location.z as u64,
            )),
            _ => None,
        };

        for index in 0..chunk.volume() {
            let local = chunk.location_of(index);
            let filled = match self.pattern {
                Pattern::Solid => true,
                Pattern::Checkerboard => {
                    let world = chunk.world_location(local);
                    (world.x + world.y + world.z).rem_euclid(2) == 0
                }
                Pattern::Random { density, .. } => {
                    rng.as_mut().is_some_and(|rng| rng.f64() < density)
                }
            };
            if filled {
                chunk.add_block(local, self.block.clone())?;
            }
        }
        Ok(chunk)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::voxels::block::Block;
    use crate::voxels::block::BlockSide;
    use crate::voxels::chunk::NoNeighbours;

    fn generate(pattern: Pattern, location: Point3<i32>) -> Chunk {
        let mut chunk = PatternGenerator::new(
            ChunkConfig::with_chunk_dimension(4),
            pattern,
            Arc::new(Block::cube("dirt")),
        )
        .generate(location)
        .unwrap();
        chunk.update();
        chunk
    }

    #[test]
    fn solid_fills_every_cell() {
        let chunk = generate(Pattern::Solid, Point3::new(0, 0, 0));
        assert!(chunk.is_full());
    }

    #[test]
    fn checkerboard_has_every_face_visible() {
        let chunk = generate(Pattern::Checkerboard, Point3::new(1, 0, 0));
        assert_eq!(chunk.block_count(), chunk.volume() / 2);
        for (location, _) in chunk.iter_blocks() {
            for side in BlockSide::all() {
                assert!(chunk.is_face_visible(location, side, &NoNeighbours));
            }
        }
    }

    #[test]
    fn random_density_bounds() {
        let empty = generate(Pattern::Random { density: 0.0, seed: 3 }, Point3::new(0, 0, 0));
        let full = generate(Pattern::Random { density: 1.0, seed: 3 }, Point3::new(0, 0, 0));
        assert!(empty.is_empty());
        assert!(full.is_full());
    }
}
