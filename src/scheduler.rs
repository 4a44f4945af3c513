use serde::{Deserialize, Serialize};

/// How much of the pipeline a frame has to re-run. Each phase includes every lower one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RenderPhase {
    /// Recompute the window and reconcile surfaces.
    Virtualization,
    /// Re-run plugin row processing and resync row identities.
    Rows,
    /// Re-run column setup; every surface re-renders.
    Columns,
    /// Re-merge configuration sources.
    Full,
}

/// Coalesces render requests between frames into the single highest phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderScheduler {
    pending: Option<RenderPhase>,
    frames: u64,
}

impl RenderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&mut self, phase: RenderPhase) {
        self.pending = Some(self.pending.map_or(phase, |p| p.max(phase)));
    }

    pub fn pending(&self) -> Option<RenderPhase> {
        self.pending
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Takes the coalesced phase for the frame being run.
    pub fn begin_frame(&mut self) -> Option<RenderPhase> {
        let phase = self.pending.take();
        if phase.is_some() {
            self.frames += 1;
        }
        phase
    }

    /// Number of frames that ran a render pass.
    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_coalesce_to_the_highest_phase() {
        let mut s = RenderScheduler::new();
        s.request(RenderPhase::Rows);
        s.request(RenderPhase::Virtualization);
        s.request(RenderPhase::Columns);
        s.request(RenderPhase::Rows);
        assert_eq!(s.begin_frame(), Some(RenderPhase::Columns));
        assert_eq!(s.begin_frame(), None);
        assert_eq!(s.frames_rendered(), 1);
    }
}
