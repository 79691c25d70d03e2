//! Per-location bookkeeping of the chunk manager.

/// Where a requested location is in the pipeline.
///
/// A location without an entry is unrequested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkState {
    /// A generation task is queued or running.
    GenerationPending,
    /// The chunk is cached and waiting for its mesh task to be published.
    Generated,
    /// A mesh task is queued or running, or its meshes wait to be attached.
    /// `rerun` records mesh requests that arrived meanwhile; they are served
    /// by a single follow-up task.
    MeshPending { rerun: bool },
    /// Meshes are attached and nothing is in flight.
    Ready,
}

/// State of one requested location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RequestState {
    pub state: ChunkState,
    /// Version of the request. Outputs carrying another ticket are stale.
    pub ticket: u64,
    /// Whether a mesh was attached at least once.
    pub meshed: bool,
}

impl RequestState {
    pub fn new(state: ChunkState, ticket: u64) -> Self {
        RequestState {
            state,
            ticket,
            meshed: false,
        }
    }

    pub fn is_mesh_pending(&self) -> bool {
        matches!(self.state, ChunkState::MeshPending { .. })
    }

    /// Records a mesh request. Returns `true` when a mesh task should be
    /// published now, `false` when the request is covered by pending work.
    pub fn request_mesh(&mut self) -> bool {
        match &mut self.state {
            ChunkState::GenerationPending => false,
            ChunkState::MeshPending { rerun } => {
                *rerun = true;
                false
            }
            ChunkState::Generated | ChunkState::Ready => true,
        }
    }

    /// Completes a mesh run. Returns `true` when a coalesced request needs
    /// another run.
    pub fn finish_mesh(&mut self) -> bool {
        let rerun = matches!(self.state, ChunkState::MeshPending { rerun: true });
        self.meshed = true;
        self.state = ChunkState::Ready;
        rerun
    }
}
