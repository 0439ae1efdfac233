use video_player_types::{Notice, NoticeKind};

/// User-visible notices, at most one per kind.
#[derive(Debug, Default)]
pub struct NoticeBoard {
    notices: Vec<Notice>,
}

impl NoticeBoard {
    /// Show a notice unless one of the same kind is already up.
    /// Returns `true` when the notice was added.
    pub fn push(&mut self, kind: NoticeKind, message: impl Into<String>) -> bool {
        if self.notices.iter().any(|n| n.kind == kind) {
            return false;
        }
        let message = message.into();
        tracing::info!(?kind, %message, "notice raised");
        self.notices.push(Notice { kind, message });
        true
    }

    pub fn dismiss(&mut self, kind: NoticeKind) {
        self.notices.retain(|n| n.kind != kind);
    }

    pub fn clear(&mut self) {
        self.notices.clear();
    }

    pub fn active(&self) -> &[Notice] {
        &self.notices
    }
}
