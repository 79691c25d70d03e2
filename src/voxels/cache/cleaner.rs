//! Background release of evicted chunks.

use std::sync::mpsc::{channel, Sender};
use std::thread::{self, JoinHandle};

use log::{debug, error, trace};

use crate::core::MtResource;
use crate::voxels::chunk::Chunk;

/// Releases the heavy fields of evicted chunks on a dedicated thread.
///
/// Dropping a large block array or mesh is not free. The cache hands evicted
/// chunks to the cleaner and returns immediately; the cleaner takes the write
/// lock and calls [`Chunk::release`]. Holders of another handle to the chunk
/// observe the cleared fields afterwards.
///
/// The cleaner is the only party that blocks on a chunk write lock, so a
/// worker reading the same chunk merely delays the release.
pub struct ChunkCleaner {
    sender: Option<Sender<MtResource<Chunk>>>,
    worker: Option<JoinHandle<()>>,
}

impl ChunkCleaner {
    pub fn new() -> Self {
        let (sender, receiver) = channel::<MtResource<Chunk>>();
        let worker = thread::Builder::new()
            .name("chunk-cleaner".to_string())
            .spawn(move || {
                while let Ok(chunk) = receiver.recv() {
                    let mut chunk = chunk.get_mut();
                    trace!("Releasing chunk {:?}", chunk.location());
                    chunk.release();
                }
                debug!("Chunk cleaner stopped");
            });

        match worker {
            Ok(worker) => ChunkCleaner {
                sender: Some(sender),
                worker: Some(worker),
            },
            Err(e) => {
                error!("Failed to spawn chunk cleaner, releasing inline: {}", e);
                ChunkCleaner {
                    sender: None,
                    worker: None,
                }
            }
        }
    }

    /// Schedules the release of a chunk. Never waits for it.
    pub fn release(&self, chunk: MtResource<Chunk>) {
        let unsent = match &self.sender {
            Some(sender) => sender.send(chunk).err().map(|e| e.0),
            None => Some(chunk),
        };
        // No cleaner thread: release here rather than leak the data.
        if let Some(chunk) = unsent {
            chunk.get_mut().release();
        }
    }
}

impl Default for ChunkCleaner {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ChunkCleaner {
    /// Finishes pending releases before returning.
    fn drop(&mut self) {
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("Chunk cleaner panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Point3;

    use super::*;
    use crate::config::ChunkConfig;

    #[test]
    fn drop_flushes_pending_releases() {
        let chunks: Vec<_> = (0..8)
            .map(|x| MtResource::new(Chunk::new(Point3::new(x, 0, 0), &ChunkConfig::with_chunk_dimension(4))))
            .collect();

        let cleaner = ChunkCleaner::new();
        for chunk in &chunks {
            cleaner.release(chunk.clone());
        }
        drop(cleaner);

        assert!(chunks.iter().all(|chunk| chunk.get().is_released()));
    }
}
