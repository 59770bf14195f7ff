//! The UIDAI RD service wire codec.
//!
//! Builds the outbound `PidOptions` configuration XML and decodes whatever
//! the vendor application sends back. Vendor responses are heterogeneous and
//! occasionally not well-formed, so the response decoding runs a strict XML
//! walk first and a textual field extraction second, over the same logical
//! field set; a capture response is never lost to a parse failure.

#![warn(
    missing_docs,
    clippy::missing_docs_in_private_items,
    clippy::clone_on_ref_ptr
)]

pub mod device_info;
pub mod keys;
pub mod pid_options;
pub mod pid_response;

pub use device_info::parse_device_info;
pub use pid_options::build_pid_options;
pub use pid_response::{decode_pid_header, parse_pid_response, HeaderDecodeError, ResponseContext};
