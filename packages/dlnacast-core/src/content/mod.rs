//! Content model, content index boundary and request path resolution.
//!
//! - `model` - DIDL-equivalent entries, listings and content identifiers
//! - `index` - External content index trait and in-memory implementation
//! - `resolver` - Request path to file resolution with caching

pub mod index;
pub mod model;
pub mod resolver;

pub use index::{ContentIndex, IndexError, IndexRecord, MemoryContentIndex};
pub use model::{
    Container, ContentEntry, ContentId, ContentIdError, ContentListing, Item, MediaKind,
    RenderItem,
};
pub use resolver::{ContentResolver, ResolveError, ServerObject};
