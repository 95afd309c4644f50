//! The raw mode: no wrapper at all, just a bare DEFLATE stream. Useful
//! when the caller already has its own framing (e.g. embedding compressed
//! bodies inside another container format).

use crate::compress::bit_writer::BitWriter;
use crate::compress::block_writer::BlockMode;
use crate::compress::{deflate, CompressOptions};
use crate::decompress_deflate::{libdeflate_deflate_decompress, OutStreamResult};
use crate::{DeflateInput, DeflateOutput, LibdeflateDecodeTables, LibdeflateError};

pub fn raw_decompress<I: DeflateInput, O: DeflateOutput>(
    d: &mut LibdeflateDecodeTables,
    in_stream: &mut I,
    out_stream: &mut O,
) -> Result<OutStreamResult, LibdeflateError> {
    libdeflate_deflate_decompress(d, in_stream, out_stream)?;
    out_stream
        .final_flush()
        .map_err(|_| LibdeflateError::InsufficientSpace)
}

pub fn raw_compress(data: &[u8], options: CompressOptions) -> Result<Vec<u8>, LibdeflateError> {
    let mut out = Vec::with_capacity(data.len() / 2 + 16);
    let mut writer = BitWriter::new(&mut out);
    deflate::compress_into(data, options.level, BlockMode::Auto, &mut writer)?;
    writer.finish()?;
    Ok(out)
}
