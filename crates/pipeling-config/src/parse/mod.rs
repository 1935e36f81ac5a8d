//! Configuration file parsing: file discovery, YAML block envelopes,
//! expression evaluation and per-kind block decoding.

mod block;
pub mod decode;
mod eval;
mod files;

pub use block::{Block, BlockType, Body, DeclRange, RawBlock, API_VERSION};
pub use eval::{EvalContext, EvalError};
pub use files::{list_files, load_file_data, matches_extension, parse_files, FileData, ListOptions};
