//! Interactive value entry.

mod editor;

pub use editor::{decode_newlines, edit_value, encode_newlines};
