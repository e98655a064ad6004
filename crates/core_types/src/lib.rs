/// Identifier handed out by the fetch manager, one per `refresh` call.
///
/// Issued monotonically starting at 1, so a larger id always belongs to a
/// later call on the same manager.
pub type RequestId = u64;

/// Whether a fetch is currently outstanding.
///
/// This is a single flag per manager, not per request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LoadingStatus {
    Loading,
    #[default]
    Idle,
}

impl LoadingStatus {
    #[inline]
    pub fn is_loading(self) -> bool {
        matches!(self, LoadingStatus::Loading)
    }
}
