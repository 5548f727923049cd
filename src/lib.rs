//! # dis86rs - 8086 Decoder Library
//!
//! This is a 16-bit x86 instruction decoder: it turns a raw byte buffer
//! into structured instructions via a declarative table of bit-field
//! encodings, and renders them as nasm-compatible assembly text.
//!
// Define the modules in this library
pub mod decode;
pub mod display;
pub mod format;
pub mod instruction;
pub mod settings;
#[cfg(test)]
mod tests;

// Imports
use anyhow::Result;
use std::fs::File;
use std::fs::OpenOptions;
use std::io::Read;

use crate::decode::MAX_STREAM_BYTES;

/// Takes in a file path string and returns a byte vector containing the
/// contents of the file, capped at the decoder's buffer capacity.
pub fn file_to_byte_vec(input_path: &Option<String>) -> Result<Vec<u8>> {
    // Make sure required args exist
    let mut input_file = match input_path {
        Some(file) => {
            // Get the instruction stream from a file.
            File::open(file)?
        }
        _ => unreachable!(),
    };

    let mut inst_stream: Vec<u8> = vec![];
    input_file.read_to_end(&mut inst_stream)?;
    // Bytes past the buffer capacity are silently not decoded
    inst_stream.truncate(MAX_STREAM_BYTES);
    Ok(inst_stream)
}

/// Takes in an output file path string and returns a File handle
pub fn get_output_file_from_path(output_path: &str, overwrite: bool) -> Result<File> {
    let mut file_options = OpenOptions::new();
    file_options.write(true).create(true);
    if overwrite {
        file_options.truncate(true);
    } else {
        file_options.append(true);
    }
    Ok(file_options.open(output_path)?)
}
