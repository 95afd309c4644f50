use crate::checksum::Checksum;
use crate::{DeflateOutput, OutStreamResult};
use nightly_quirks::utils::NightlyUtils;

pub struct DeflateChunkedBufferOutput<'a, C: Checksum = crate::checksum::NoChecksum> {
    buffer: Box<[u8]>,
    last_usable_ptr: *mut u8,
    current_ptr: *mut u8,
    checksum: C,
    written: usize,
    func: Box<dyn FnMut(&[u8]) -> Result<(), ()> + 'a>,
}

impl<'a, C: Checksum> DeflateChunkedBufferOutput<'a, C> {
    pub fn new<F: FnMut(&[u8]) -> Result<(), ()> + 'a>(write_func: F, buf_size: usize) -> Self {
        unsafe {
            let mut buffer = NightlyUtils::box_new_uninit_slice_assume_init(
                buf_size + Self::MAX_LOOK_BACK + Self::OVERWRITE_MAX,
            );

            let buffer_start = buffer.as_mut_ptr();

            Self {
                buffer,
                last_usable_ptr: buffer_start.add(buf_size + Self::MAX_LOOK_BACK),
                current_ptr: buffer_start.add(Self::MAX_LOOK_BACK),
                checksum: C::default(),
                written: 0,
                func: Box::new(write_func),
            }
        }
    }

    fn flush_buffer(&mut self) -> bool {
        let last_index = unsafe { self.current_ptr.offset_from(self.buffer.as_ptr()) } as usize;

        self.checksum
            .update(&self.buffer[Self::MAX_LOOK_BACK..last_index]);
        if (self.func)(&self.buffer[Self::MAX_LOOK_BACK..last_index]).is_err() {
            return false;
        }
        self.written += last_index - Self::MAX_LOOK_BACK;

        unsafe {
            std::ptr::copy(
                self.buffer.as_ptr().add(last_index - Self::MAX_LOOK_BACK),
                self.buffer.as_mut_ptr(),
                Self::MAX_LOOK_BACK,
            );
        }
        self.current_ptr = unsafe { self.buffer.as_mut_ptr().add(Self::MAX_LOOK_BACK) };
        true
    }
}

impl<'a, C: Checksum> DeflateOutput for DeflateChunkedBufferOutput<'a, C> {
    #[inline(always)]
    fn has_writable_length(&mut self, length: usize) -> bool {
        unsafe { self.current_ptr.add(length) <= self.last_usable_ptr }
    }

    fn flush_ensure_length(&mut self, length: usize) -> bool {
        if !self.has_writable_length(length) {
            if !self.flush_buffer() {
                return false;
            }
        }
        true
    }

    #[inline(always)]
    fn get_output_ptr(&mut self) -> *mut u8 {
        self.current_ptr
    }

    #[inline(always)]
    unsafe fn set_output_ptr(&mut self, ptr: *mut u8) {
        self.current_ptr = ptr;
    }

    #[inline(always)]
    fn final_flush(&mut self) -> Result<OutStreamResult, ()> {
        self.flush_buffer();
        self.current_ptr = unsafe { self.buffer.as_mut_ptr().add(Self::MAX_LOOK_BACK) };

        let result = OutStreamResult {
            written: self.written,
            checksum: self.checksum.finalize(),
        };

        self.checksum = C::default();
        self.written = 0;
        Ok(result)
    }
}
