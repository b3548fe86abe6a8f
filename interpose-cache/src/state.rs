/// Where a GET request stands with respect to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheState {
    /// Nothing usable is stored; the request goes out unconditionally.
    #[default]
    Miss,
    /// A stale entry with validators exists; the request goes out with
    /// conditional headers.
    StalePendingRevalidation,
    /// A fresh entry answers the request; the transport is skipped.
    FreshHit,
    /// A full cacheable response is being streamed into the cache.
    WriteThrough,
}

impl CacheState {
    /// Returns the state as a string slice.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            CacheState::Miss => "miss",
            CacheState::StalePendingRevalidation => "stale",
            CacheState::FreshHit => "hit",
            CacheState::WriteThrough => "write-through",
        }
    }
}

impl std::fmt::Display for CacheState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
