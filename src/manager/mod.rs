//! # Chunk Manager
//!
//! Orchestrates the chunk pipeline: a requested location is loaded or
//! generated on the generation pool, stored in the cache, meshed on the mesh
//! pool and finally handed to the listeners.
//!
//! ## Threading
//!
//! The manager is owned by a single control thread that calls [`update`]
//! once per frame or tick. Only that thread touches the cache, the request
//! bookkeeping and the listeners. Workers receive everything they need inside
//! their task and hand their output back over a channel that `update` drains
//! without blocking.
//!
//! A mesh worker read-locks its chunk while it runs. Edit cached chunks
//! through [`try_edit_chunk`], which gives up instead of waiting for that
//! lock. Calling `get_mut()` on a chunk handle from the control thread can
//! block until the worker is done.
//!
//! ## Request Lifecycle
//!
//! ```text
//! Unrequested -> GenerationPending -> Generated -> MeshPending -> Ready
//!                                                      ^            |
//!                                                      +------------+
//!                                                     mesh update request
//! ```
//!
//! Each request carries a ticket from a global counter. Removing a chunk drops
//! its request, so outputs still in flight no longer match and are discarded
//! when they arrive.
//!
//! [`update`]: ChunkManager::update
//! [`try_edit_chunk`]: ChunkManager::try_edit_chunk

use std::collections::HashMap;
use std::sync::Arc;

use cgmath::Point3;
use log::{debug, info, trace, warn};

use crate::config::{ChunkConfig, ChunkManagerConfig, FailurePolicy};
use crate::core::MtResource;
use crate::error::{ChunkError, ChunkResult};
use crate::meshing::tasks::{ChunkMeshGenerationOutput, ChunkMeshGenerationTask};
use crate::meshing::{ChunkMesh, ChunkMeshGenerator, MeshBuffer};
use crate::task_management::TaskManager;
use crate::voxels::block::BlockSide;
use crate::voxels::cache::ChunkCache;
use crate::voxels::chunk::{Chunk, NeighbourChunks};
use crate::voxels::generation::ChunkGenerator;
use crate::voxels::repository::ChunkRepository;
use crate::voxels::tasks::{ChunkGenerationOutput, ChunkGenerationTask};

mod listener;
mod request_state;

pub use listener::ChunkListener;
pub use request_state::ChunkState;

use request_state::RequestState;

/// Meshes that arrived while the chunk lock was taken.
struct PendingAttachment {
    location: Point3<i32>,
    ticket: u64,
    chunk: MtResource<Chunk>,
    mesh: Arc<ChunkMesh>,
    collision_mesh: Arc<MeshBuffer>,
}

/// Snapshot of the manager's workload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkManagerStats {
    pub cached_chunks: usize,
    pub requested_chunks: usize,
    pub generation_pending: usize,
    pub mesh_pending: usize,
    pub ready: usize,
    /// Tasks sent to workers whose outputs were not drained yet.
    pub tasks_in_flight: usize,
    /// Tasks waiting for a free worker.
    pub tasks_queued: usize,
}

/// Turns chunk requests into cached, meshed chunks.
pub struct ChunkManager {
    config: ChunkManagerConfig,
    chunk_config: ChunkConfig,
    mesh_generator: Arc<dyn ChunkMeshGenerator>,
    generator: Option<Arc<dyn ChunkGenerator>>,
    repository: Option<Arc<dyn ChunkRepository>>,
    cache: ChunkCache,
    requests: HashMap<Point3<i32>, RequestState>,
    generation_pool: Option<TaskManager<ChunkGenerationOutput>>,
    mesh_pool: Option<TaskManager<ChunkMeshGenerationOutput>>,
    pending_attachments: Vec<PendingAttachment>,
    listeners: Vec<Arc<dyn ChunkListener>>,
    last_ticket: u64,
}

impl ChunkManager {
    /// Creates a manager. No threads run until [`initialize`](Self::initialize).
    pub fn new(
        config: ChunkManagerConfig,
        chunk_config: ChunkConfig,
        mesh_generator: Arc<dyn ChunkMeshGenerator>,
    ) -> Self {
        let cache = ChunkCache::new(config.resolved_cache_size(&chunk_config));
        ChunkManager {
            config,
            chunk_config,
            mesh_generator,
            generator: None,
            repository: None,
            cache,
            requests: HashMap::new(),
            generation_pool: None,
            mesh_pool: None,
            pending_attachments: Vec::new(),
            listeners: Vec::new(),
            last_ticket: 0,
        }
    }

    /// Procedural source used when the repository has nothing stored.
    pub fn with_generator(mut self, generator: Arc<dyn ChunkGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Persisted storage asked before the generator.
    pub fn with_repository(mut self, repository: Arc<dyn ChunkRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn config(&self) -> &ChunkManagerConfig {
        &self.config
    }

    pub fn chunk_config(&self) -> &ChunkConfig {
        &self.chunk_config
    }

    /// The chunk cache, also usable as a resolver for visibility queries.
    pub fn cache(&self) -> &ChunkCache {
        &self.cache
    }

    /// Starts the generation and mesh pools. Calling it again does nothing.
    pub fn initialize(&mut self) -> ChunkResult<()> {
        if self.is_initialized() {
            return Ok(());
        }
        self.config.validate()?;
        self.chunk_config.validate()?;
        if let Some(scale) = self.mesh_generator.block_scale() {
            if scale != self.chunk_config.block_scale {
                return Err(ChunkError::InvalidConfig(format!(
                    "mesh generator block scale {} differs from chunk block scale {}",
                    scale, self.chunk_config.block_scale
                )));
            }
        }

        self.generation_pool = Some(TaskManager::new(
            "chunk-generation",
            self.config.generation_workers,
            self.config.generation_queue_depth,
        ));
        self.mesh_pool = Some(TaskManager::new(
            "chunk-mesh",
            self.config.mesh_workers,
            self.config.mesh_queue_depth,
        ));
        info!(
            "Chunk manager initialized (chunk size {:?}, cache size {})",
            self.chunk_config.chunk_size,
            self.cache.max_size()
        );
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.generation_pool.is_some() && self.mesh_pool.is_some()
    }

    /// Stops both pools, forgets every request and evicts every chunk.
    ///
    /// Waits for the tasks the workers are running; their outputs are
    /// dropped. The manager can be initialized again afterwards.
    pub fn cleanup(&mut self) {
        if let Some(mut pool) = self.generation_pool.take() {
            pool.shutdown();
        }
        if let Some(mut pool) = self.mesh_pool.take() {
            pool.shutdown();
        }
        self.requests.clear();
        self.pending_attachments.clear();
        self.cache.evict_all();
        info!("Chunk manager cleaned up");
    }

    fn next_ticket(&mut self) -> u64 {
        self.last_ticket += 1;
        self.last_ticket
    }

    /// Requests the chunk at a location.
    ///
    /// Does nothing if the location is already requested. Otherwise a
    /// generation task loads the chunk from the repository, or generates it,
    /// or creates it empty, in that order of preference. A chunk still cached
    /// from a failed mesh run is meshed again without regenerating.
    pub fn request_chunk(&mut self, location: Point3<i32>) -> ChunkResult<()> {
        if !self.is_initialized() {
            return Err(ChunkError::NotInitialized);
        }
        if self.requests.contains_key(&location) {
            trace!("Chunk {:?} already requested", location);
            return Ok(());
        }

        let ticket = self.next_ticket();
        if self.cache.contains(location) {
            self.requests
                .insert(location, RequestState::new(ChunkState::Generated, ticket));
            self.dispatch_mesh(location);
            return Ok(());
        }

        self.requests.insert(
            location,
            RequestState::new(ChunkState::GenerationPending, ticket),
        );
        let task = ChunkGenerationTask::new(
            location,
            ticket,
            self.chunk_config,
            self.generator.clone(),
            self.repository.clone(),
        );
        if let Some(pool) = self.generation_pool.as_mut() {
            pool.publish_task(Box::new(task));
        }
        debug!("Requested chunk {:?} (ticket {})", location, ticket);
        Ok(())
    }

    /// Requests a new mesh for a cached chunk, for instance after its blocks
    /// or a neighbour's blocks were edited.
    ///
    /// Requests arriving while a mesh task for the location is in flight are
    /// coalesced into one follow-up run. Locations that are not cached are
    /// ignored.
    pub fn request_chunk_mesh_update(&mut self, location: Point3<i32>) -> ChunkResult<()> {
        if !self.is_initialized() {
            return Err(ChunkError::NotInitialized);
        }
        self.schedule_mesh_update(location);
        Ok(())
    }

    /// [`request_chunk_mesh_update`](Self::request_chunk_mesh_update) for a chunk handle.
    pub fn request_chunk_mesh_update_for(&mut self, chunk: &MtResource<Chunk>) -> ChunkResult<()> {
        let location = chunk.get().location();
        self.request_chunk_mesh_update(location)
    }

    fn schedule_mesh_update(&mut self, location: Point3<i32>) {
        if !self.cache.contains(location) {
            debug!("Ignoring mesh update for uncached chunk {:?}", location);
            return;
        }
        if !self.requests.contains_key(&location) {
            let ticket = self.next_ticket();
            self.requests
                .insert(location, RequestState::new(ChunkState::Generated, ticket));
        }
        let dispatch = self
            .requests
            .get_mut(&location)
            .is_some_and(RequestState::request_mesh);
        if dispatch {
            self.dispatch_mesh(location);
        }
    }

    /// Publishes a mesh task with a snapshot of the cached neighbours.
    fn dispatch_mesh(&mut self, location: Point3<i32>) {
        let Some(chunk) = self.cache.get(location) else {
            self.requests.remove(&location);
            return;
        };
        let Some(request) = self.requests.get_mut(&location) else {
            return;
        };
        request.state = ChunkState::MeshPending { rerun: false };
        let ticket = request.ticket;

        let neighbours = NeighbourChunks::collect(location, &self.cache);
        let task = ChunkMeshGenerationTask::new(
            location,
            ticket,
            chunk,
            neighbours,
            self.mesh_generator.clone(),
        );
        if let Some(pool) = self.mesh_pool.as_mut() {
            pool.publish_task(Box::new(task));
        }
        trace!("Published mesh task for {:?}", location);
    }

    /// Applies finished work. Call once per frame or tick.
    ///
    /// Drains generation outputs (the chunk is cached and its mesh task
    /// published), drains mesh outputs (meshes are attached and listeners
    /// notified), retries attachments that found the chunk locked, feeds
    /// queued tasks to idle workers and, if configured, trims the cache.
    /// Never waits for a worker.
    pub fn update(&mut self) {
        if !self.is_initialized() {
            return;
        }
        self.process_generation_outputs();
        self.process_mesh_outputs();
        self.attach_pending_meshes();

        if let Some(pool) = self.generation_pool.as_mut() {
            pool.process_queued_tasks();
        }
        if let Some(pool) = self.mesh_pool.as_mut() {
            pool.process_queued_tasks();
        }
        if self.config.maintain_cache_on_update {
            self.maintain_cache();
        }
    }

    /// State of the current request for `location` if `ticket` is its ticket.
    fn current_state(&self, location: Point3<i32>, ticket: u64) -> Option<ChunkState> {
        self.current_request(location, ticket).map(|request| request.state)
    }

    fn current_request(&self, location: Point3<i32>, ticket: u64) -> Option<&RequestState> {
        self.requests
            .get(&location)
            .filter(|request| request.ticket == ticket)
    }

    fn awaits_mesh(&self, location: Point3<i32>, ticket: u64) -> bool {
        self.current_request(location, ticket)
            .is_some_and(RequestState::is_mesh_pending)
    }

    fn process_generation_outputs(&mut self) {
        let outputs = match self.generation_pool.as_mut() {
            Some(pool) => pool.process_completed_tasks(),
            None => return,
        };

        for output in outputs {
            let location = output.location;
            if self.current_state(location, output.ticket) != Some(ChunkState::GenerationPending) {
                debug!("Discarding stale generation output for {:?}", location);
                continue;
            }

            match output.result {
                Ok(chunk) => {
                    self.cache.put(MtResource::new(chunk));
                    if let Some(request) = self.requests.get_mut(&location) {
                        request.state = ChunkState::Generated;
                    }
                    self.dispatch_mesh(location);
                    if self.config.trigger_adjacent_chunk_updates {
                        self.trigger_adjacent_chunk_updates(location);
                    }
                }
                Err(error) => {
                    self.requests.remove(&location);
                    self.report_failure(location, error);
                }
            }
        }
    }

    /// Re-meshes cached neighbours whose boundary faces may have changed.
    fn trigger_adjacent_chunk_updates(&mut self, location: Point3<i32>) {
        for side in BlockSide::all() {
            let neighbour = location + side.vector();
            if self.cache.contains(neighbour) {
                self.schedule_mesh_update(neighbour);
            }
        }
    }

    fn process_mesh_outputs(&mut self) {
        let outputs = match self.mesh_pool.as_mut() {
            Some(pool) => pool.process_completed_tasks(),
            None => return,
        };

        for output in outputs {
            let ChunkMeshGenerationOutput {
                location,
                ticket,
                chunk,
                result,
            } = output;
            if !self.awaits_mesh(location, ticket) {
                debug!("Discarding stale mesh output for {:?}", location);
                continue;
            }

            match result {
                Ok(meshes) => self.pending_attachments.push(PendingAttachment {
                    location,
                    ticket,
                    chunk,
                    mesh: Arc::new(meshes.mesh),
                    collision_mesh: Arc::new(meshes.collision_mesh),
                }),
                Err(error) => {
                    self.requests.remove(&location);
                    self.report_failure(location, error);
                }
            }
        }
    }

    /// Attaches finished meshes. A chunk whose lock is taken keeps its
    /// meshes pending until the next tick; the control thread never waits.
    fn attach_pending_meshes(&mut self) {
        let pending = std::mem::take(&mut self.pending_attachments);
        let mut busy = Vec::new();

        for attachment in pending {
            if !self.awaits_mesh(attachment.location, attachment.ticket) {
                continue;
            }

            let attached = match attachment.chunk.try_get_mut() {
                Some(mut chunk) => {
                    chunk.set_mesh(Some(attachment.mesh.clone()));
                    chunk.set_collision_mesh(Some(attachment.collision_mesh.clone()));
                    true
                }
                None => false,
            };
            if !attached {
                trace!("Chunk {:?} is locked, attaching later", attachment.location);
                busy.push(attachment);
                continue;
            }
            self.finish_mesh(attachment.location, &attachment.chunk);
        }

        self.pending_attachments.extend(busy);
    }

    fn finish_mesh(&mut self, location: Point3<i32>, chunk: &MtResource<Chunk>) {
        let Some(request) = self.requests.get_mut(&location) else {
            return;
        };
        let first = !request.meshed;
        if request.finish_mesh() {
            self.dispatch_mesh(location);
        }

        if first {
            debug!("Chunk {:?} is available", location);
            self.notify(|listener| listener.on_chunk_available(chunk));
        } else {
            self.notify(|listener| listener.on_chunk_updated(chunk));
        }
    }

    fn report_failure(&self, location: Point3<i32>, error: ChunkError) {
        warn!("Chunk {:?} failed: {}", location, error);
        if self.config.failure_policy == FailurePolicy::Notify {
            self.notify(|listener| listener.on_chunk_failed(location, &error));
        }
    }

    fn notify(&self, event: impl Fn(&dyn ChunkListener)) {
        for listener in &self.listeners {
            event(listener.as_ref());
        }
    }

    /// Trims the cache to capacity and forgets the evicted locations.
    pub fn maintain_cache(&mut self) {
        for location in self.cache.maintain() {
            self.requests.remove(&location);
        }
    }

    /// The cached chunk at a location. Never schedules work.
    pub fn get_chunk(&mut self, location: Point3<i32>) -> Option<MtResource<Chunk>> {
        self.cache.get(location)
    }

    /// Edits a cached chunk and schedules a new mesh for it.
    ///
    /// The chunk lock is only tried, never waited for. Returns `Ok(None)`
    /// when the chunk is not cached or a worker holds its lock; try again on
    /// a later tick. Flags are recomputed after a successful edit. An error
    /// from `edit` is returned as is and schedules nothing.
    pub fn try_edit_chunk<R>(
        &mut self,
        location: Point3<i32>,
        edit: impl FnOnce(&mut Chunk) -> ChunkResult<R>,
    ) -> ChunkResult<Option<R>> {
        if !self.is_initialized() {
            return Err(ChunkError::NotInitialized);
        }
        let Some(chunk) = self.cache.peek(location) else {
            return Ok(None);
        };
        let result = match chunk.try_get_mut() {
            Some(mut chunk) => {
                let result = edit(&mut chunk)?;
                chunk.update();
                result
            }
            None => {
                trace!("Chunk {:?} is locked, edit deferred", location);
                return Ok(None);
            }
        };
        self.schedule_mesh_update(location);
        Ok(Some(result))
    }

    /// Pipeline state of a location, `None` when unrequested.
    pub fn chunk_state(&self, location: Point3<i32>) -> Option<ChunkState> {
        self.requests.get(&location).map(|request| request.state)
    }

    /// Evicts a chunk and cancels its request.
    ///
    /// Tasks already running finish, but their outputs are discarded.
    /// Returns whether anything was known about the location.
    pub fn remove_chunk(&mut self, location: Point3<i32>) -> bool {
        let requested = self.requests.remove(&location).is_some();
        self.pending_attachments
            .retain(|attachment| attachment.location != location);
        let cached = self.cache.evict(location);
        if requested || cached {
            debug!("Removed chunk {:?}", location);
        }
        requested || cached
    }

    /// [`remove_chunk`](Self::remove_chunk) for a chunk handle.
    pub fn remove_chunk_for(&mut self, chunk: &MtResource<Chunk>) -> bool {
        let location = chunk.get().location();
        self.remove_chunk(location)
    }

    /// Writes a cached chunk to the repository.
    ///
    /// Returns `false` when the chunk is not cached.
    pub fn save_chunk(&self, location: Point3<i32>) -> ChunkResult<bool> {
        let Some(repository) = &self.repository else {
            return Err(ChunkError::InvalidConfig(
                "no chunk repository configured".to_string(),
            ));
        };
        let Some(chunk) = self.cache.peek(location) else {
            return Ok(false);
        };
        repository.save(&chunk.get())?;
        Ok(true)
    }

    /// Registers a listener. Registering the same listener twice has no effect.
    pub fn add_listener(&mut self, listener: Arc<dyn ChunkListener>) {
        if !self.listeners.iter().any(|known| Arc::ptr_eq(known, &listener)) {
            self.listeners.push(listener);
        }
    }

    /// Unregisters a listener. Returns whether it was registered.
    pub fn remove_listener(&mut self, listener: &Arc<dyn ChunkListener>) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|known| !Arc::ptr_eq(known, listener));
        self.listeners.len() != before
    }

    pub fn stats(&self) -> ChunkManagerStats {
        let mut stats = ChunkManagerStats {
            cached_chunks: self.cache.len(),
            requested_chunks: self.requests.len(),
            ..ChunkManagerStats::default()
        };
        for request in self.requests.values() {
            match request.state {
                ChunkState::GenerationPending => stats.generation_pending += 1,
                ChunkState::Generated | ChunkState::MeshPending { .. } => stats.mesh_pending += 1,
                ChunkState::Ready => stats.ready += 1,
            }
        }
        if let Some(pool) = &self.generation_pool {
            stats.tasks_in_flight += pool.in_flight();
            stats.tasks_queued += pool.queued_len();
        }
        if let Some(pool) = &self.mesh_pool {
            stats.tasks_in_flight += pool.in_flight();
            stats.tasks_queued += pool.queued_len();
        }
        stats
    }
}
