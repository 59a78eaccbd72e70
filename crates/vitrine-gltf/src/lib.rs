mod fetch;
mod parse;

pub use fetch::{
    CHUNK_SIZE, LoadEvent, LoadHandle, LoadProgress, LoadSender, channel, spawn_load,
    spawn_load_chunked,
};
pub use parse::parse_model;
