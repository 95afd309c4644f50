//! The GZIP wrapper (RFC 1952): a 10-byte header with optional extra
//! fields, a raw DEFLATE stream, and an 8-byte footer (CRC-32 + ISIZE).
//! Concatenated members (`cat a.gz b.gz > both.gz`) are accepted on
//! decode as an explicitly allowed extension beyond the single-member
//! baseline.

use crate::checksum::{Checksum, Crc32Checksum};
use crate::compress::bit_writer::BitWriter;
use crate::compress::block_writer::BlockMode;
use crate::compress::{deflate, CompressOptions};
use crate::decompress_deflate::{libdeflate_deflate_decompress, OutStreamResult};
use crate::gzip_constants::*;
use crate::{safety_check, DeflateInput, DeflateOutput, LibdeflateDecodeTables, LibdeflateError};
use tracing::debug;

pub fn gzip_decompress<I: DeflateInput, O: DeflateOutput>(
    d: &mut LibdeflateDecodeTables,
    in_stream: &mut I,
    out_stream: &mut O,
) -> Result<OutStreamResult, LibdeflateError> {
    let mut total_written: usize = 0;
    let mut last_checksum: u32 = 0;

    loop {
        let result = decompress_one_member(d, in_stream, out_stream)?;
        total_written += result.written;
        last_checksum = result.checksum;

        if !in_stream.has_valid_bytes_slow() {
            break;
        }
    }

    Ok(OutStreamResult {
        written: total_written,
        checksum: last_checksum,
    })
}

fn decompress_one_member<I: DeflateInput, O: DeflateOutput>(
    d: &mut LibdeflateDecodeTables,
    in_stream: &mut I,
    out_stream: &mut O,
) -> Result<OutStreamResult, LibdeflateError> {
    if in_stream.read_byte::<true>() != GZIP_ID1 {
        return Err(LibdeflateError::InvalidGzipHeader);
    }
    if in_stream.read_byte::<true>() != GZIP_ID2 {
        return Err(LibdeflateError::InvalidGzipHeader);
    }
    if in_stream.read_byte::<true>() != GZIP_CM_DEFLATE {
        return Err(LibdeflateError::InvalidGzipHeader);
    }
    let flg = in_stream.read_byte::<true>();

    /* MTIME */
    in_stream.move_stream_pos::<true>(4);
    safety_check!(in_stream.has_valid_bytes_slow());
    /* XFL */
    in_stream.move_stream_pos::<true>(1);
    safety_check!(in_stream.has_valid_bytes_slow());
    /* OS */
    in_stream.move_stream_pos::<true>(1);
    safety_check!(in_stream.has_valid_bytes_slow());

    if (flg & GZIP_FRESERVED) != 0 {
        return Err(LibdeflateError::InvalidGzipHeader);
    }

    if (flg & GZIP_FEXTRA) != 0 {
        let xlen = in_stream.read_le_u16::<true>();
        in_stream.move_stream_pos::<true>(xlen as isize);
        safety_check!(in_stream.has_valid_bytes_slow());
    }

    if (flg & GZIP_FNAME) != 0 {
        while in_stream.read_byte::<true>() != 0 {}
    }

    if (flg & GZIP_FCOMMENT) != 0 {
        while in_stream.read_byte::<true>() != 0 {}
    }

    if (flg & GZIP_FHCRC) != 0 {
        in_stream.move_stream_pos::<true>(2);
        safety_check!(in_stream.has_valid_bytes_slow());
    }

    let start = std::time::Instant::now();

    libdeflate_deflate_decompress(d, in_stream, out_stream)?;

    let result = out_stream
        .final_flush()
        .map_err(|_| LibdeflateError::InsufficientSpace)?;

    debug!(
        elapsed = ?start.elapsed(),
        bytes = result.written,
        mb_per_sec = result.written as f64 / 1024.0 / 1024.0 / start.elapsed().as_secs_f64(),
        "gzip member decompressed"
    );

    let gzip_crc = in_stream.read_le_u32::<true>();
    if result.checksum != gzip_crc {
        return Err(LibdeflateError::GzipFooterChecksum);
    }

    let expected_written = in_stream.read_le_u32::<true>();
    if result.written as u32 != expected_written {
        return Err(LibdeflateError::GzipFooterSize);
    }

    Ok(result)
}

/// Encode `data` as a single-member gzip stream.
pub fn gzip_compress(data: &[u8], options: CompressOptions) -> Result<Vec<u8>, LibdeflateError> {
    let mut out = Vec::with_capacity(data.len() / 2 + GZIP_HEADER_SIZE + GZIP_FOOTER_SIZE);

    out.push(GZIP_ID1);
    out.push(GZIP_ID2);
    out.push(GZIP_CM_DEFLATE);
    out.push(0); // FLG: no extra fields, name, comment or header CRC
    out.extend_from_slice(&0u32.to_le_bytes()); // MTIME: not tracked
    out.push(GZIP_XFL_DEFAULT);
    out.push(GZIP_OS_UNIX);

    let mut writer = BitWriter::new(&mut out);
    deflate::compress_into(data, options.level, BlockMode::Auto, &mut writer)?;
    writer.finish()?;

    let mut crc = Crc32Checksum::default();
    crc.update(data);
    out.extend_from_slice(&crc.finalize().to_le_bytes());
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());

    Ok(out)
}
