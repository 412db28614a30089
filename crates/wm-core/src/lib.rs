pub mod id;
pub mod json_store;
pub mod mapper;
pub mod model;
pub mod projection;
pub mod store;

pub use id::{MapId, MarkerId};
pub use json_store::JsonFileStore;
pub use mapper::{CommitOutcome, CoordinateMapper};
pub use model::{GeoPoint, MapInfo, Marker, MarkerFile};
pub use projection::{MercatorProjection, Projection};
pub use store::{MarkerStore, MemoryStore, StoreError};

// Re-export kurbo geometry so downstream crates share one point type
pub use kurbo::{Point, Vec2};
