//! # Chunk Generation Task
//!
//! Produces the block data of one chunk on a generation worker: the
//! repository is asked first, then the generator, and when neither is
//! configured the chunk starts out empty.

use std::sync::Arc;

use cgmath::Point3;
use log::{debug, warn};

use crate::config::ChunkConfig;
use crate::error::{ChunkError, ChunkResult};
use crate::task_management::task::Task;
use crate::voxels::chunk::Chunk;
use crate::voxels::generation::ChunkGenerator;
use crate::voxels::repository::ChunkRepository;

/// A task that loads or generates one chunk.
///
/// The chunk is built inside the task and moved out in the output, so no
/// other thread can see it before the control thread stores it.
pub struct ChunkGenerationTask {
    location: Point3<i32>,
    /// Request version the output is checked against.
    ticket: u64,
    config: ChunkConfig,
    generator: Option<Arc<dyn ChunkGenerator>>,
    repository: Option<Arc<dyn ChunkRepository>>,
}

/// Output of a [`ChunkGenerationTask`].
pub struct ChunkGenerationOutput {
    pub location: Point3<i32>,
    pub ticket: u64,
    pub result: ChunkResult<Chunk>,
}

impl ChunkGenerationTask {
    pub fn new(
        location: Point3<i32>,
        ticket: u64,
        config: ChunkConfig,
        generator: Option<Arc<dyn ChunkGenerator>>,
        repository: Option<Arc<dyn ChunkRepository>>,
    ) -> Self {
        ChunkGenerationTask {
            location,
            ticket,
            config,
            generator,
            repository,
        }
    }

    fn generation_failure(&self, reason: impl ToString) -> ChunkError {
        ChunkError::GenerationFailure {
            location: self.location,
            reason: reason.to_string(),
        }
    }

    fn load(&self) -> ChunkResult<Option<Chunk>> {
        let Some(repository) = &self.repository else {
            return Ok(None);
        };
        match repository.load(self.location) {
            Ok(chunk) => Ok(chunk),
            Err(e) if self.generator.is_some() => {
                warn!(
                    "Loading chunk {:?} failed, generating it instead: {}",
                    self.location, e
                );
                Ok(None)
            }
            Err(e) => Err(self.generation_failure(e)),
        }
    }

    fn generate(&self) -> ChunkResult<Chunk> {
        match &self.generator {
            Some(generator) => generator.generate(self.location).map_err(|e| match e {
                ChunkError::GenerationFailure { .. } => e,
                other => self.generation_failure(other),
            }),
            None => Ok(Chunk::new(self.location, &self.config)),
        }
    }

    fn load_or_generate(&self) -> ChunkResult<Chunk> {
        let mut chunk = match self.load()? {
            Some(chunk) => {
                debug!("Chunk {:?} loaded from repository", self.location);
                chunk
            }
            None => self.generate()?,
        };

        if chunk.location() != self.location {
            return Err(self.generation_failure(format!(
                "produced a chunk for {:?}",
                chunk.location()
            )));
        }
        if chunk.size() != self.config.chunk_size {
            return Err(self.generation_failure(format!(
                "produced a chunk of size {:?}, expected {:?}",
                chunk.size(),
                self.config.chunk_size
            )));
        }

        chunk.update();
        Ok(chunk)
    }
}

impl Task for ChunkGenerationTask {
    type Output = ChunkGenerationOutput;

    fn process(&self) -> ChunkGenerationOutput {
        ChunkGenerationOutput {
            location: self.location,
            ticket: self.ticket,
            result: self.load_or_generate(),
        }
    }

    fn fail(&self, reason: String) -> ChunkGenerationOutput {
        ChunkGenerationOutput {
            location: self.location,
            ticket: self.ticket,
            result: Err(self.generation_failure(reason)),
        }
    }
}
