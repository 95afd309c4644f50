pub mod bit_writer;
pub mod block_writer;
pub mod deflate;
pub mod huffman_encoder;
pub mod level;
pub mod match_finder;
pub mod options;
pub mod tables;
pub mod token;

use crate::compress::bit_writer::BitWriter;
use crate::compress::block_writer::BlockMode;
use crate::LibdeflateError;
pub use level::Level;
pub use options::{CompressOptions, DecompressOptions};

/// Compress `data` as a raw DEFLATE stream (RFC 1951, no wrapper), the
/// block type chosen per block by estimated size.
pub fn compress(data: &[u8], options: CompressOptions) -> Result<Vec<u8>, LibdeflateError> {
    let mut writer = BitWriter::new(Vec::with_capacity(data.len() / 2 + 64));
    deflate::compress_into(data, options.level, BlockMode::Auto, &mut writer)?;
    writer.finish()
}

/// Compress using only Huffman coding: match search is skipped entirely
/// (every byte is emitted as a literal token) and every block is dynamic,
/// never stored or fixed.
pub fn huffman_compress(data: &[u8], options: CompressOptions) -> Result<Vec<u8>, LibdeflateError> {
    let mut writer = BitWriter::new(Vec::with_capacity(data.len() / 2 + 64));
    deflate::compress_into(data, options.level, BlockMode::HuffmanOnly, &mut writer)?;
    writer.finish()
}

/// Wrap `data` in stored (uncompressed) DEFLATE blocks only.
pub fn store_compress(data: &[u8]) -> Result<Vec<u8>, LibdeflateError> {
    let mut writer = BitWriter::new(Vec::with_capacity(data.len() + 64));
    deflate::compress_into(data, Level::STORE, BlockMode::StoreOnly, &mut writer)?;
    writer.finish()
}
