use cgmath::Point3;
use noise::{NoiseFn, Perlin};

use crate::config::ChunkConfig;
use crate::error::{ChunkError, ChunkResult};
use crate::voxels::block::BlockRef;
use crate::voxels::chunk::Chunk;

use super::ChunkGenerator;

/// Threshold above which Perlin noise is considered solid for terrain generation.
pub const PERLIN_POSITIVE_THRESHOLD: f64 = 0.2;
/// Threshold below which Perlin noise is considered solid for terrain generation.
pub const PERLIN_NEGATIVE_THRESHOLD: f64 = -0.2;
/// Scaling factor applied to world coordinates when sampling Perlin noise.
pub const PERLIN_SCALE_FACTOR: f64 = 0.02;

/// Terrain from 3D Perlin noise.
///
/// A cell is solid when the noise sample at its world block location falls
/// outside `[negative_threshold, positive_threshold]`, which produces natural
/// looking terrain with caves and overhangs. Solid cells pick a block from the
/// palette with a generator seeded from the world seed and the chunk location,
/// so a chunk always regenerates identically.
pub struct NoiseTerrainGenerator {
    config: ChunkConfig,
    perlin: Perlin,
    seed: u32,
    scale_factor: f64,
    negative_threshold: f64,
    positive_threshold: f64,
    palette: Vec<BlockRef>,
}

impl NoiseTerrainGenerator {
    pub fn new(config: ChunkConfig, seed: u32, palette: Vec<BlockRef>) -> ChunkResult<Self> {
        if palette.is_empty() {
            return Err(ChunkError::InvalidConfig(
                "noise terrain needs at least one block".to_string(),
            ));
        }
        Ok(NoiseTerrainGenerator {
            config,
            perlin: Perlin::new(seed),
            seed,
            scale_factor: PERLIN_SCALE_FACTOR,
            negative_threshold: PERLIN_NEGATIVE_THRESHOLD,
            positive_threshold: PERLIN_POSITIVE_THRESHOLD,
            palette,
        })
    }

    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    pub fn with_thresholds(mut self, negative: f64, positive: f64) -> Self {
        self.negative_threshold = negative.min(positive);
        self.positive_threshold = positive.max(negative);
        self
    }

    /// Whether the cell at a world block location is solid.
    pub fn is_solid(&self, world: Point3<i32>) -> bool {
        let sample = self.perlin.get(self.to_perlin_pos(world));
        !(self.negative_threshold..=self.positive_threshold).contains(&sample)
    }

    fn to_perlin_pos(&self, pos: Point3<i32>) -> [f64; 3] {
        [
            pos.x as f64 * self.scale_factor,
            pos.y as f64 * self.scale_factor,
            pos.z as f64 * self.scale_factor,
        ]
    }

    fn chunk_seed(&self, location: Point3<i32>) -> u64 {
        let mut seed = self.seed as u64;
        for component in [location.x, location.y, location.z] {
            seed = seed
                .wrapping_mul(0x100_0000_01b3)
                .wrapping_add(component as u32 as u64);
        }
        seed
    }
}

impl ChunkGenerator for NoiseTerrainGenerator {
    fn generate(&self, location: Point3<i32>) -> ChunkResult<Chunk> {
        let mut chunk = Chunk::new(location, &self.config);
        let mut rng = fastrand::Rng::with_seed(self.chunk_seed(location));

        for index in 0..chunk.volume() {
            let local = chunk.location_of(index);
            if self.is_solid(chunk.world_location(local)) {
                let block = &self.palette[rng.usize(..self.palette.len())];
                chunk.add_block(local, block.clone())?;
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

    fn generator(seed: u32) -> NoiseTerrainGenerator {
        NoiseTerrainGenerator::new(
            ChunkConfig::with_chunk_dimension(8),
            seed,
            vec![
                Arc::new(Block::cube("stone")),
                Arc::new(Block::cube("dirt")),
            ],
        )
        .unwrap()
    }

    fn names(chunk: &Chunk) -> Vec<Option<String>> {
        (0..chunk.volume())
            .map(|index| {
                chunk
                    .get_block_at_index(index)
                    .map(|block| block.name.clone())
            })
            .collect()
    }

    #[test]
    fn generation_is_deterministic() {
        let location = Point3::new(3, -1, 7);
        let a = generator(11).generate(location).unwrap();
        let b = generator(11).generate(location).unwrap();
        assert_eq!(names(&a), names(&b));
    }

    #[test]
    fn cells_follow_the_noise_thresholds() {
        let generator = generator(5);
        let chunk = generator.generate(Point3::new(-2, 0, 1)).unwrap();
        for index in 0..chunk.volume() {
            let local = chunk.location_of(index);
            assert_eq!(
                chunk.get_block(local).is_some(),
                generator.is_solid(chunk.world_location(local))
            );
        }
    }

    #[test]
    fn zero_width_band_fills_everything() {
        let generator = generator(1).with_thresholds(0.0, 0.0);
        let mut chunk = generator.generate(Point3::new(0, 0, 0)).unwrap();
        chunk.update();
        // Only samples of exactly zero stay empty, which happens on lattice points.
        assert!(chunk.block_count() > chunk.volume() / 2);
    }

    #[test]
    fn empty_palette_is_rejected() {
        assert!(NoiseTerrainGenerator::new(ChunkConfig::default(), 0, Vec::new()).is_err());
    }
}
