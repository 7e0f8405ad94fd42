mod bitstream;
mod cursor;

pub use bitstream::{BitCursor, BitstreamError};
pub use cursor::{ByteCursor, EndOfBuffer};
