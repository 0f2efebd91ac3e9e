use serde::{Deserialize, Serialize};

/// Handle to a requested paint callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameToken(pub u64);

/// The host's "run this before the next paint" facility.
///
/// The host calls [`OverlayDriver::on_frame`](crate::OverlayDriver::on_frame)
/// with the token once the frame fires. A cancelled token must never fire.
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameToken;

    fn cancel_frame(&mut self, token: FrameToken);
}

/// Frame scheduler for hosts without a compositor: tokens queue up until the
/// host drains them with [`take_due`](Self::take_due) at its paint point.
#[derive(Debug, Default)]
pub struct ManualFrameScheduler {
    next_token: u64,
    queued: Vec<FrameToken>,
    requested: usize,
    cancelled: usize,
}

impl ManualFrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokens that would fire at the next paint.
    pub fn pending(&self) -> &[FrameToken] {
        &self.queued
    }

    pub fn take_due(&mut self) -> Vec<FrameToken> {
        std::mem::take(&mut self.queued)
    }

    pub fn requested_count(&self) -> usize {
        self.requested
    }

    pub fn cancelled_count(&self) -> usize {
        self.cancelled
    }
}

impl FrameScheduler for ManualFrameScheduler {
    fn request_frame(&mut self) -> FrameToken {
        let token = FrameToken(self.next_token);
        self.next_token += 1;
        self.requested += 1;
        self.queued.push(token);
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        let before = self.queued.len();
        self.queued.retain(|&t| t != token);
        if self.queued.len() != before {
            self.cancelled += 1;
        }
    }
}
