pub mod audio;
pub mod error;
pub mod framing;
pub mod header;
pub mod script;
pub mod tag;
pub mod timestamp;
pub mod video;

pub use error::FlvError;
pub use header::FlvHeader;
pub use tag::{FlvTagType, RawTag, TagStream};
pub use timestamp::TimestampRepairer;
