pub mod block;
pub mod config;

pub use block::Line;
pub use config::{Geometry, ReplacementPolicy};

#[derive(Debug, strum::EnumIter, Clone, Copy, Hash, PartialEq, Eq)]
pub enum RequestStatus {
    HIT = 0,
    MISS,
}

impl RequestStatus {
    #[inline]
    #[must_use]
    pub fn is_hit(self) -> bool {
        self == Self::HIT
    }

    #[inline]
    #[must_use]
    pub fn is_miss(self) -> bool {
        self == Self::MISS
    }
}

impl From<RequestStatus> for stats::cache::RequestStatus {
    fn from(status: RequestStatus) -> Self {
        match status {
            RequestStatus::HIT => Self::HIT,
            RequestStatus::MISS => Self::MISS,
        }
    }
}
