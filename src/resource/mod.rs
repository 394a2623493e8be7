//! String resource documents and the operations on their entries.

mod diff;
mod document;
mod escape;
mod set;

pub use diff::{DiffResult, diff, differing};
pub use document::{Document, Upserted};
pub use escape::escape;
pub use set::{Chunks, DEFAULT_CHUNK_SIZE, ResourceSet};
