//! Helpers for HTTP handlers built on the [`http`] types.
//!
//! - [`status`]: one error kind per 4xx/5xx status, the [`HttpError`]
//!   capability trait and the type-erased [`Error`];
//! - [`params`]: typed form, query and path accessors;
//! - [`json`]: bounded JSON decoding and indented JSON responses;
//! - [`respond`]: rendering and recovering handler failures;
//! - [`request`] / [`response`]: request predicates, bearer tokens, the
//!   [`ResponseWriter`] sink and the outgoing wire dump.

pub mod config;
pub mod error;
pub mod json;
pub mod params;
pub mod request;
pub mod respond;
pub mod response;
pub mod status;
pub mod testutil;
mod util;
mod wire;

pub use json::{close_body, must_read_json, read_json, write_json, write_json_with_code};
pub use request::{
    ParamSource, PathParams, bearer_token, dump_request_out, is_get_or_head, is_websocket_upgrade,
    is_xhr, parse_form,
};
pub use respond::{Must, raise, recover_html, recover_json, write_html, write_json_error};
pub use response::{ResponseRecorder, ResponseWriter};
pub use status::{Error, HttpError, InvalidParameterError, MissingParameterError, ParamError};
