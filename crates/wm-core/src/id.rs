use lasso::{Spur, ThreadedRodeo};
use std::fmt;
use std::num::NonZeroU32;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU32, Ordering};

/// Identifier of a marker for the lifetime of the process.
///
/// Marker files store no identity, so ids are never read back from disk:
/// every marker built or deserialized draws the next number. Ids are not
/// reused, which keeps a stale callback from hitting a newer marker.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(NonZeroU32);

impl MarkerId {
    pub fn generate() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(1);
        let n = NEXT.fetch_add(1, Ordering::Relaxed);
        // Wraps only after 2^32 markers in one process
        MarkerId(NonZeroU32::new(n).unwrap_or(NonZeroU32::MIN))
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl Default for MarkerId {
    fn default() -> Self {
        Self::generate()
    }
}

impl fmt::Debug for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "marker#{}", self.0)
    }
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "marker#{}", self.0)
    }
}

static MAP_NAMES: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Identifier of a map, interned. The file store uses it as the map's
/// directory name.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct MapId(Spur);

impl MapId {
    pub fn intern(name: &str) -> Self {
        MapId(MAP_NAMES.get_or_intern(name))
    }

    pub fn as_str(&self) -> &str {
        MAP_NAMES.resolve(&self.0)
    }
}

impl fmt::Debug for MapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "map:{}", self.as_str())
    }
}

impl fmt::Display for MapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
