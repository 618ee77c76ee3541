//! Host item collections and the read-side traversal the engine scans them with.
//!
//! The engine never owns a collection. It sees one through [`ItemCollection`],
//! whose single read primitive returns the next slot at or after a position
//! along with a retry/skip signal, and walks it with a [`ScanCursor`].
//!
//! [`ShadowTree`] is the in-tree host collection: an ordered slot map whose
//! readers hold a shared guard for one slot at a time.

mod cursor;
mod namespace;
mod traits;
mod tree;

pub use cursor::ScanCursor;
pub use namespace::{NamespaceId, Namespaces};
pub use traits::{ItemCollection, Slot};
pub use tree::ShadowTree;
