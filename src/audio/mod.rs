//! PCM decoding via an external `ffmpeg` process.

mod decoder;

pub use decoder::Decoder;
