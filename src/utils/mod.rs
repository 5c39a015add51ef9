// Shared helpers for byte access and text decoding
pub mod encoding;
pub mod io;
