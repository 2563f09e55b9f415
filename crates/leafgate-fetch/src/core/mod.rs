//! Pure transformations applied to content bytes.
//!
//! Nothing here performs I/O: sniffing inspects a prefix, decoding turns
//! compressed chunks into plain chunks.

mod decompress;
mod detect;

pub use decompress::{GzipDecoder, StreamTransform};
pub use detect::{ContentKind, SNIFF_LEN, sniff_content};
