//! # allow2-voice — C4 VoiceCodeProtocol
//!
//! Six-digit request/approval code encoding and time-bucketed HMAC
//! validation, tolerant of clock drift between parent and child devices.

#![forbid(unsafe_code)]

mod approval;
mod protocol;
mod request;

pub use approval::{bucket_for, generate_approval_code, validate_approval_code};
pub use protocol::validate_and_consume;
pub use request::{generate_request_code, parse, VoiceRequest, VoiceRequestType};
