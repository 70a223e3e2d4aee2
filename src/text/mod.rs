//! The dual-read text chain: validate two words, extrude each, rotate word B a
//! quarter turn about Y, and fuse both into one triangle mesh.

mod compose;
mod extrude;
mod merge;
mod params;
mod word;

pub use compose::{CompositeSolid, compose, illusion_transform};
pub use extrude::{GlyphError, extrude_word};
pub use merge::{EmptyMergeError, merge, merge_composite};
pub use params::ExtrusionParams;
pub use word::{InputValidationError, MIN_WORD_LEN, WordSpec, normalize_word, validate_word_pair};
