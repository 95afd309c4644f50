use thiserror::Error;

/// Everything that can go wrong decompressing or compressing a stream.
#[derive(Debug, Error)]
pub enum LibdeflateError {
    /// The bit reader ran out of input before it could satisfy a request,
    /// or a block ended in the middle of a symbol.
    #[error("end of stream reached before the requested bits were available")]
    EndOfStream,

    /// A stored/fixed/dynamic block header declared block type 3, which
    /// DEFLATE reserves and never assigns a meaning to.
    #[error("block type 3 is reserved and invalid")]
    InvalidBlockType,

    /// A stored block's NLEN field was not the one's complement of LEN.
    #[error("stored block NLEN did not match the complement of LEN")]
    WrongNlen,

    /// A fixed-block literal/length code decoded outside [0, 287].
    #[error("fixed-block literal/length code out of range")]
    DeflateInvalidCode,

    /// A Huffman lookup failed, or a structural invariant of the code
    /// tables (code-length repeat with no prior symbol, distance code > 29,
    /// length code > 28) was violated.
    #[error("corrupt deflate stream")]
    CorruptInput,

    /// The gzip member's magic, compression method, or header was malformed
    /// or truncated.
    #[error("invalid or truncated gzip header")]
    InvalidGzipHeader,

    /// The gzip footer's CRC-32 did not match the decompressed data.
    #[error("gzip footer CRC-32 mismatch")]
    GzipFooterChecksum,

    /// The gzip footer's ISIZE did not match the decompressed length mod 2^32.
    #[error("gzip footer size field mismatch")]
    GzipFooterSize,

    /// The zlib CMF/FLG header failed the mod-31 check or used an
    /// unsupported CM/CINFO.
    #[error("invalid zlib header")]
    InvalidZlibHeader,

    /// The zlib footer's Adler-32 did not match the decompressed data.
    #[error("zlib footer Adler-32 mismatch")]
    ZlibFooterChecksum,

    /// `BitWriter::write_bytes` was called while the accumulator held a
    /// partial byte.
    #[error("write_bytes called off a byte boundary")]
    UnfinishedBits,

    /// A null `actual_out_nbytes_ret` was provided, but the data would have
    /// decompressed to fewer than `out_nbytes_avail` bytes.
    #[error("decompressed data shorter than the output buffer")]
    ShortOutput,

    /// The data would decompress to more bytes than the caller's buffer.
    #[error("output buffer too small for decompressed data")]
    InsufficientSpace,

    /// Propagated verbatim from the underlying reader or writer.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
