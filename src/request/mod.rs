//! Turning preset documents into an outbound request.

pub mod assembler;
pub mod curl;
pub mod validation;

pub use assembler::{build, RequestDescriptor};
pub use curl::{export_to_curl, import_from_curl, parse_curl_words, CurlImport};
pub use validation::{validate_request_field, HTTP_METHODS};
