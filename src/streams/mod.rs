pub mod deflate_chunked_buffer_input;
pub mod deflate_chunked_buffer_output;
