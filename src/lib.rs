// #![cfg_attr(debug_assertions, deny(warnings))]
pub mod bitstream;

pub mod checksum;
pub mod compress;
pub mod decode_blocks;
pub mod decompress_deflate;
mod decompress_utils;
pub mod deflate_constants;
mod error;
pub mod gzip_constants;
pub mod streams;
pub mod unchecked;
pub mod wrapper;
pub mod zlib_constants;

#[macro_use]
extern crate static_assertions;

use crate::checksum::{Adler32Checksum, Crc32Checksum, NoChecksum};
pub use crate::compress::{DecompressOptions, Level, CompressOptions};
use crate::decompress_deflate::{
    HuffmanDecodeStruct, FAST_TABLESIZE, LITLEN_SUBTABLESIZE, LITLEN_TABLESIZE,
    OFFSET_SUBTABLESIZE, OFFSET_TABLESIZE,
};
pub use crate::decompress_deflate::OutStreamResult;
use crate::decompress_utils::fast_decode_entry::FastDecodeEntry;
use crate::deflate_constants::DEFLATE_MAX_NUM_SYMS;
pub use crate::error::LibdeflateError;
pub use crate::wrapper::WrapperKind;
use crate::streams::deflate_chunked_buffer_input::DeflateChunkedBufferInput;
use crate::streams::deflate_chunked_buffer_output::DeflateChunkedBufferOutput;
use crate::unchecked::UncheckedArray;
use std::mem::size_of;

/*
 * The main DEFLATE decompressor structure.  Since this implementation only
 * supports full buffer decompression, this structure does not store the entire
 * decompression state, but rather only some arrays that are too large to
 * comfortably allocate on the stack.
 */
pub struct LibdeflateDecodeTables {
    pub(crate) huffman_decode: HuffmanDecodeStruct,
    pub(crate) litlen_decode_table: UncheckedArray<FastDecodeEntry, LITLEN_TABLESIZE>,

    pub(crate) offset_decode_table: UncheckedArray<FastDecodeEntry, OFFSET_TABLESIZE>,

    pub(crate) fast_decode_table: UncheckedArray<FastDecodeEntry, FAST_TABLESIZE>,

    pub(crate) litlen_decode_subtable: UncheckedArray<FastDecodeEntry, LITLEN_SUBTABLESIZE>,
    pub(crate) offset_decode_subtable: UncheckedArray<FastDecodeEntry, OFFSET_SUBTABLESIZE>,

    /* used only during build_decode_table() */
    pub(crate) sorted_syms: UncheckedArray<u16, DEFLATE_MAX_NUM_SYMS>,
    pub(crate) static_codes_loaded: bool,
}

pub trait DeflateInput {
    const MAX_LOOK_BACK: usize = size_of::<usize>() * 2;
    const MAX_OVERREAD: usize = size_of::<usize>() * 2;

    unsafe fn get_le_word_no_advance(&mut self) -> usize;
    fn move_stream_pos<const REFILL: bool>(&mut self, amount: isize);
    fn tell_stream_pos(&self) -> usize;
    fn read<const REFILL: bool>(&mut self, out_data: &mut [u8]) -> usize;
    // Ensure that the current buffer has at least `Self::MAX_OVERREAD` elements. this function must never fail
    fn ensure_overread_length(&mut self);
    // Check if the stream buffer has at least Self::MAX_OVERREAD bytes remaining with either valid data or eof data
    fn has_readable_overread(&self) -> bool;
    fn has_valid_bytes_slow(&mut self) -> bool;
    fn read_exact_into<O: DeflateOutput>(&mut self, out_stream: &mut O, length: usize) -> bool;

    #[inline(always)]
    fn read_byte<const REFILL: bool>(&mut self) -> u8 {
        let mut byte = [0];
        self.read::<REFILL>(&mut byte);
        byte[0]
    }

    #[inline(always)]
    fn read_le_u16<const REFILL: bool>(&mut self) -> u16 {
        let mut bytes = [0, 0];
        self.read::<REFILL>(&mut bytes);
        u16::from_le_bytes(bytes)
    }

    #[inline(always)]
    fn read_le_u32<const REFILL: bool>(&mut self) -> u32 {
        let mut bytes = [0, 0, 0, 0];
        self.read::<REFILL>(&mut bytes);
        u32::from_le_bytes(bytes)
    }
}

pub trait DeflateOutput {
    const MAX_LOOK_BACK: usize = 32768;
    const OVERWRITE_MAX: usize = 16;

    fn has_writable_length(&mut self, length: usize) -> bool;
    fn flush_ensure_length(&mut self, length: usize) -> bool;

    fn get_output_ptr(&mut self) -> *mut u8;
    unsafe fn set_output_ptr(&mut self, ptr: *mut u8);

    fn final_flush(&mut self) -> Result<OutStreamResult, ()>;
}

pub fn libdeflate_alloc_decode_tables() -> LibdeflateDecodeTables {
    LibdeflateDecodeTables {
        huffman_decode: HuffmanDecodeStruct {
            lens: UncheckedArray::default(),
            precode_lens: UncheckedArray::default(),
            precode_decode_table: UncheckedArray::default(),
            fast_temp_litlen: Vec::with_capacity(FAST_TABLESIZE),
        },
        litlen_decode_table: UncheckedArray::default(),
        offset_decode_table: UncheckedArray::default(),
        fast_decode_table: UncheckedArray::default(),

        litlen_decode_subtable: UncheckedArray::default(),
        offset_decode_subtable: UncheckedArray::default(),

        sorted_syms: UncheckedArray::default(),
        static_codes_loaded: false,
    }
}

/// Decompress a fully-buffered chunk of wrapped (or raw) DEFLATE data,
/// streaming the result through `func` in `options.buf_size`-byte pieces.
pub fn decompress(
    kind: WrapperKind,
    mut reader: impl std::io::Read,
    func: impl FnMut(&[u8]) -> Result<(), ()>,
    options: DecompressOptions,
) -> Result<OutStreamResult, LibdeflateError> {
    let buf_size = options.buf_size;
    let mut input_stream =
        DeflateChunkedBufferInput::new(|buf| reader.read(buf).unwrap_or(0), buf_size);
    let mut decompressor = libdeflate_alloc_decode_tables();

    match kind {
        WrapperKind::Raw => {
            let mut output_stream = DeflateChunkedBufferOutput::<NoChecksum>::new(func, buf_size);
            input_stream.ensure_overread_length();
            wrapper::raw::raw_decompress(&mut decompressor, &mut input_stream, &mut output_stream)
        }
        WrapperKind::Gzip => {
            let mut output_stream = DeflateChunkedBufferOutput::<Crc32Checksum>::new(func, buf_size);
            input_stream.ensure_overread_length();
            wrapper::gzip::gzip_decompress(&mut decompressor, &mut input_stream, &mut output_stream)
        }
        WrapperKind::Zlib => {
            let mut output_stream =
                DeflateChunkedBufferOutput::<Adler32Checksum>::new(func, buf_size);
            input_stream.ensure_overread_length();
            wrapper::zlib::zlib_decompress(&mut decompressor, &mut input_stream, &mut output_stream)
        }
    }
}

/// A reusable decompressor: holds the (sizeable) decode tables so
/// repeated calls don't re-allocate them.
pub struct Decompressor {
    tables: LibdeflateDecodeTables,
}

impl Decompressor {
    pub fn new() -> Self {
        Self {
            tables: libdeflate_alloc_decode_tables(),
        }
    }

    pub fn decompress(
        &mut self,
        kind: WrapperKind,
        reader: impl std::io::Read,
        func: impl FnMut(&[u8]) -> Result<(), ()>,
        options: DecompressOptions,
    ) -> Result<OutStreamResult, LibdeflateError> {
        let buf_size = options.buf_size;
        let mut reader = reader;
        let mut input_stream =
            DeflateChunkedBufferInput::new(|buf| reader.read(buf).unwrap_or(0), buf_size);
        input_stream.ensure_overread_length();

        match kind {
            WrapperKind::Raw => {
                let mut output_stream = DeflateChunkedBufferOutput::<NoChecksum>::new(func, buf_size);
                wrapper::raw::raw_decompress(&mut self.tables, &mut input_stream, &mut output_stream)
            }
            WrapperKind::Gzip => {
                let mut output_stream = DeflateChunkedBufferOutput::<Crc32Checksum>::new(func, buf_size);
                wrapper::gzip::gzip_decompress(&mut self.tables, &mut input_stream, &mut output_stream)
            }
            WrapperKind::Zlib => {
                let mut output_stream =
                    DeflateChunkedBufferOutput::<Adler32Checksum>::new(func, buf_size);
                wrapper::zlib::zlib_decompress(&mut self.tables, &mut input_stream, &mut output_stream)
            }
        }
    }
}

impl Default for Decompressor {
    fn default() -> Self {
        Self::new()
    }
}

/// One-shot compression of `data` under the chosen wrapper.
pub fn compress(
    kind: WrapperKind,
    data: &[u8],
    options: CompressOptions,
) -> Result<Vec<u8>, LibdeflateError> {
    match kind {
        WrapperKind::Raw => wrapper::raw::raw_compress(data, options),
        WrapperKind::Gzip => wrapper::gzip::gzip_compress(data, options),
        WrapperKind::Zlib => wrapper::zlib::zlib_compress(data, options),
    }
}

/// Compress using only Huffman coding: match search is skipped entirely
/// and every block is emitted as dynamic Huffman, never stored or fixed.
pub fn huffman_compress(data: &[u8], options: CompressOptions) -> Result<Vec<u8>, LibdeflateError> {
    compress::huffman_compress(data, options)
}

/// Wrap `data` in stored (uncompressed) DEFLATE blocks only.
pub fn store_compress(data: &[u8]) -> Result<Vec<u8>, LibdeflateError> {
    compress::store_compress(data)
}

/// A reusable compressor bound to one [`CompressOptions`] (currently
/// stateless beyond the options themselves, since the match finder and
/// token buffer are allocated per call; kept as a type for API parity
/// with [`Decompressor`] and to give future per-call allocation reuse a
/// home without breaking callers).
pub struct Compressor {
    options: CompressOptions,
}

impl Compressor {
    pub fn new(options: CompressOptions) -> Self {
        Self { options }
    }

    pub fn compress(&self, kind: WrapperKind, data: &[u8]) -> Result<Vec<u8>, LibdeflateError> {
        compress(kind, data, self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(kind: WrapperKind, data: &[u8]) {
        let compressed = compress(kind, data, CompressOptions::new()).unwrap();
        let mut out = Vec::new();
        let result = decompress(
            kind,
            compressed.as_slice(),
            |chunk| {
                out.extend_from_slice(chunk);
                Ok(())
            },
            DecompressOptions::new().buffer_size(4096),
        )
        .unwrap();
        assert_eq!(result.written, data.len());
        assert_eq!(out, data);
    }

    #[test]
    fn roundtrips_raw_gzip_zlib() {
        let data = b"Hello world\nHello world\nHello world\n".repeat(50);
        roundtrip(WrapperKind::Raw, &data);
        roundtrip(WrapperKind::Gzip, &data);
        roundtrip(WrapperKind::Zlib, &data);
    }

    #[test]
    fn roundtrips_empty_input() {
        roundtrip(WrapperKind::Raw, b"");
        roundtrip(WrapperKind::Gzip, b"");
        roundtrip(WrapperKind::Zlib, b"");
    }

    #[test]
    fn roundtrips_long_overlapping_run() {
        let data = vec![b'X'; 10_000];
        roundtrip(WrapperKind::Gzip, &data);
    }

    #[test]
    fn store_compress_is_always_decodable() {
        let data = b"not very compressible, or is it?".to_vec();
        let compressed = store_compress(&data).unwrap();
        let mut out = Vec::new();
        let result = decompress(
            WrapperKind::Raw,
            compressed.as_slice(),
            |chunk| {
                out.extend_from_slice(chunk);
                Ok(())
            },
            DecompressOptions::new().buffer_size(4096),
        )
        .unwrap();
        assert_eq!(result.written, data.len());
        assert_eq!(out, data);
    }

    fn decode_raw(bytes: &[u8]) -> Result<Vec<u8>, LibdeflateError> {
        let mut out = Vec::new();
        decompress(
            WrapperKind::Raw,
            bytes,
            |chunk| {
                out.extend_from_slice(chunk);
                Ok(())
            },
            DecompressOptions::new().buffer_size(4096),
        )?;
        Ok(out)
    }

    #[test]
    fn fixed_block_hello_world() {
        let bytes = [
            0xF3, 0x48, 0xCD, 0xC9, 0xC9, 0x57, 0x28, 0xCF, 0x2F, 0xCA, 0x49, 0xE1, 0x02, 0x00,
        ];
        assert_eq!(decode_raw(&bytes).unwrap(), b"Hello world\n");
    }

    #[test]
    fn gzip_wrapped_hello_world() {
        let mut bytes = vec![0x1F, 0x8B, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x04, 0x03];
        bytes.extend_from_slice(&[
            0xF3, 0x48, 0xCD, 0xC9, 0xC9, 0x57, 0x28, 0xCF, 0x2F, 0xCA, 0x49, 0xE1, 0x02, 0x00,
        ]);
        bytes.extend_from_slice(&[0xD5, 0xE0, 0x39, 0xB7, 0x0C, 0x00, 0x00, 0x00]);

        let mut out = Vec::new();
        decompress(
            WrapperKind::Gzip,
            bytes.as_slice(),
            |chunk| {
                out.extend_from_slice(chunk);
                Ok(())
            },
            DecompressOptions::new().buffer_size(4096),
        )
        .unwrap();
        assert_eq!(out, b"Hello world\n");
    }

    #[test]
    fn stored_block_hello_world() {
        let mut bytes = vec![0x01, 0x0C, 0x00, 0xF3, 0xFF];
        bytes.extend_from_slice(b"Hello world\n");
        assert_eq!(decode_raw(&bytes).unwrap(), b"Hello world\n");

        let mut corrupt = bytes.clone();
        corrupt[4] = 0xFE;
        assert!(matches!(decode_raw(&corrupt), Err(LibdeflateError::WrongNlen)));
    }

    #[test]
    fn dynamic_block_abcde() {
        let bytes = [
            0x3D, 0xC6, 0x39, 0x11, 0x00, 0x00, 0x0C, 0x02, 0x30, 0x2B, 0xB5, 0x52, 0x1E, 0xFF,
            0x96, 0x38, 0x16, 0x96, 0x5C, 0x1E, 0x94, 0xCB, 0x6D, 0x01,
        ];
        assert_eq!(decode_raw(&bytes).unwrap(), b"ABCDEABCD ABCDEABCD");
    }

    #[test]
    fn boundary_65535_vs_65536_bytes() {
        let one_block = vec![b'a'; 65535];
        let compressed = store_compress(&one_block).unwrap();
        // BFINAL+BTYPE header, byte-aligned LEN/NLEN, then the raw bytes: a
        // single stored block is exactly 5 header bytes plus the payload.
        assert_eq!(compressed.len(), 5 + one_block.len());

        let two_blocks = vec![b'a'; 65536];
        let compressed = store_compress(&two_blocks).unwrap();
        assert_eq!(compressed.len(), 2 * 5 + two_blocks.len());
        assert_eq!(decode_raw(&compressed).unwrap(), two_blocks);
    }

    #[test]
    fn overlapping_run_past_max_match_length() {
        let data = vec![b'X'; 400];
        let compressed = huffman_compress(&data, CompressOptions::new()).unwrap();
        assert_eq!(decode_raw(&compressed).unwrap(), data);
    }

    #[test]
    fn truncated_stream_never_succeeds_silently() {
        // A prefix of the "Hello world\n" fixed block, cut off before the
        // end-of-block symbol: this must surface as an error, not as a
        // short but otherwise successful decode.
        let bytes = [0xF3, 0x48, 0xCD, 0xC9, 0xC9, 0x57, 0x28, 0xCF];
        assert!(decode_raw(&bytes).is_err());
    }

    #[test]
    fn block_type_three_is_invalid() {
        // BFINAL=1, BTYPE=3 (reserved), packed LSB-first into one byte.
        let bytes = [0x07];
        assert!(matches!(
            decode_raw(&bytes),
            Err(LibdeflateError::InvalidBlockType)
        ));
    }

    #[test]
    fn huffman_only_always_emits_dynamic_block() {
        // Highly repetitive data would normally pick a stored or fixed
        // block; huffman_only must still emit BTYPE == 2 (dynamic).
        let data = vec![b'a'; 1000];
        let compressed = huffman_compress(&data, CompressOptions::new()).unwrap();
        let btype = (compressed[0] >> 1) & 0b11;
        assert_eq!(btype, 2);
        assert_eq!(decode_raw(&compressed).unwrap(), data);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn roundtrip_via(
            kind: WrapperKind,
            data: &[u8],
            options: CompressOptions,
        ) -> Vec<u8> {
            let compressed = compress(kind, data, options).unwrap();
            let mut out = Vec::new();
            decompress(
                kind,
                compressed.as_slice(),
                |chunk| {
                    out.extend_from_slice(chunk);
                    Ok(())
                },
                DecompressOptions::new().buffer_size(4096),
            )
            .unwrap();
            out
        }

        proptest! {
            #[test]
            fn roundtrips_arbitrary_bytes(
                data in proptest::collection::vec(any::<u8>(), 0..2048),
                level in 0u8..=9,
                kind_idx in 0u8..3,
            ) {
                let kind = match kind_idx {
                    0 => WrapperKind::Raw,
                    1 => WrapperKind::Gzip,
                    _ => WrapperKind::Zlib,
                };
                let options = CompressOptions::new().level(Level::new(level));
                let out = roundtrip_via(kind, &data, options);
                prop_assert_eq!(out, data);
            }

            #[test]
            fn huffman_only_roundtrips_arbitrary_bytes(
                data in proptest::collection::vec(any::<u8>(), 0..2048),
            ) {
                let compressed = huffman_compress(&data, CompressOptions::new()).unwrap();
                let mut out = Vec::new();
                decompress(
                    WrapperKind::Raw,
                    compressed.as_slice(),
                    |chunk| {
                        out.extend_from_slice(chunk);
                        Ok(())
                    },
                    DecompressOptions::new().buffer_size(4096),
                )
                .unwrap();
                prop_assert_eq!(out, data);
            }

            #[test]
            fn store_only_roundtrips_arbitrary_bytes(
                data in proptest::collection::vec(any::<u8>(), 0..2048),
            ) {
                let compressed = store_compress(&data).unwrap();
                let mut out = Vec::new();
                decompress(
                    WrapperKind::Raw,
                    compressed.as_slice(),
                    |chunk| {
                        out.extend_from_slice(chunk);
                        Ok(())
                    },
                    DecompressOptions::new().buffer_size(4096),
                )
                .unwrap();
                prop_assert_eq!(out, data);
            }
        }
    }
}
