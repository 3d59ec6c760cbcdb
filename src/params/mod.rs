//! Typed request parameters.
//!
//! Each source has its own module: [`form`] (url-encoded body, then query),
//! [`query`] (query string only) and [`path`] (routing variables). Every
//! module offers the same matrix of accessors:
//!
//! - `must_*` accessors return [`ParamError::Missing`] when the key is absent
//!   or blank and [`ParamError::Invalid`] when the value does not parse;
//! - `must_time_or` / `must_duration_or` substitute a default for absent keys
//!   but still reject malformed values;
//! - the remaining accessors return the default for absent keys and, for the
//!   form and query sources, for malformed values too.
//!
//! The path source is stricter: its numeric default accessors report a
//! malformed value as [`InvalidParameterError`] instead of defaulting.
//!
//! ```
//! use http::Request;
//! use http_kit::params::query;
//!
//! let req = Request::get("/items?page=2&tags=a,b").body(()).unwrap();
//! assert_eq!(query::must_int(&req, "page").unwrap(), 2);
//! assert_eq!(query::int(&req, "limit", 20), 20);
//! assert_eq!(query::string_array(&req, "tags", Vec::new()), ["a", "b"]);
//! ```

use jiff::SignedDuration;

use crate::{
    status::{InvalidParameterError, ParamError},
    util,
};

/// Types that can be parsed from a single raw parameter value.
pub trait FromParam: Sized {
    fn from_param(raw: &str) -> Option<Self>;
}

impl FromParam for String {
    fn from_param(raw: &str) -> Option<Self> {
        Some(raw.to_owned())
    }
}

impl FromParam for bool {
    fn from_param(raw: &str) -> Option<Self> {
        util::parse_bool(raw)
    }
}

macro_rules! from_param_int {
    ($($t:ty),+) => {
        $(
            impl FromParam for $t {
                fn from_param(raw: &str) -> Option<Self> {
                    raw.parse().ok()
                }
            }
        )+
    };
}

from_param_int!(isize, i32, i64);

macro_rules! from_param_float {
    ($($t:ty),+) => {
        $(
            impl FromParam for $t {
                fn from_param(raw: &str) -> Option<Self> {
                    let value: $t = raw.parse().ok()?;
                    util::finite_or_explicit(value.is_infinite(), raw).then_some(value)
                }
            }
        )+
    };
}

from_param_float!(f32, f64);

impl FromParam for SignedDuration {
    fn from_param(raw: &str) -> Option<Self> {
        util::parse_duration(raw)
    }
}

fn present(raw: Option<&str>) -> Option<&str> {
    raw.filter(|v| !v.is_empty())
}

/// Missing when absent or blank, invalid when `parse` fails.
pub(crate) fn required<T>(
    raw: Option<&str>,
    key: &str,
    parse: impl FnOnce(&str) -> Option<T>,
) -> Result<T, ParamError> {
    let raw = present(raw).ok_or_else(|| ParamError::missing(key))?;
    parse(raw).ok_or_else(|| ParamError::invalid(key))
}

/// `default` when absent or blank, invalid when `parse` fails.
pub(crate) fn or_invalid<T>(
    raw: Option<&str>,
    key: &str,
    default: T,
    parse: impl FnOnce(&str) -> Option<T>,
) -> Result<T, InvalidParameterError> {
    match present(raw) {
        None => Ok(default),
        Some(raw) => parse(raw).ok_or_else(|| InvalidParameterError::new(key)),
    }
}

/// `default` when absent, blank or malformed.
pub(crate) fn or_default<T>(raw: Option<&str>, default: T, parse: impl FnOnce(&str) -> Option<T>) -> T {
    present(raw).and_then(parse).unwrap_or(default)
}

// Accessors shared by every source. `$lookup` is the `ParamSource` method
// reading the raw value.
macro_rules! accessors {
    ($source:literal, $lookup:ident) => {
        use jiff::{SignedDuration, Timestamp};

        use crate::{
            params::{FromParam, or_default, or_invalid, required},
            request::ParamSource,
            status::{InvalidParameterError, ParamError},
            util,
        };

        #[doc = concat!("Returns the ", $source, " value of `key`.")]
        pub fn must_string<R: ParamSource + ?Sized>(request: &R, key: &str) -> Result<String, ParamError> {
            required(request.$lookup(key).as_deref(), key, String::from_param)
        }

        #[doc = concat!("Returns the ", $source, " value of `key` as a bool (`1`, `t`, `true`, `0`, `f`, `false`, ...).")]
        pub fn must_bool<R: ParamSource + ?Sized>(request: &R, key: &str) -> Result<bool, ParamError> {
            required(request.$lookup(key).as_deref(), key, <bool as FromParam>::from_param)
        }

        #[doc = concat!("Returns the ", $source, " value of `key` as a base-10 `isize`.")]
        pub fn must_int<R: ParamSource + ?Sized>(request: &R, key: &str) -> Result<isize, ParamError> {
            required(request.$lookup(key).as_deref(), key, <isize as FromParam>::from_param)
        }

        #[doc = concat!("Returns the ", $source, " value of `key` as a base-10 `i32`.")]
        pub fn must_int32<R: ParamSource + ?Sized>(request: &R, key: &str) -> Result<i32, ParamError> {
            required(request.$lookup(key).as_deref(), key, <i32 as FromParam>::from_param)
        }

        #[doc = concat!("Returns the ", $source, " value of `key` as a base-10 `i64`.")]
        pub fn must_int64<R: ParamSource + ?Sized>(request: &R, key: &str) -> Result<i64, ParamError> {
            required(request.$lookup(key).as_deref(), key, <i64 as FromParam>::from_param)
        }

        #[doc = concat!("Returns the ", $source, " value of `key` as an `f32`.")]
        pub fn must_float32<R: ParamSource + ?Sized>(request: &R, key: &str) -> Result<f32, ParamError> {
            required(request.$lookup(key).as_deref(), key, <f32 as FromParam>::from_param)
        }

        #[doc = concat!("Returns the ", $source, " value of `key` as an `f64`.")]
        pub fn must_float64<R: ParamSource + ?Sized>(request: &R, key: &str) -> Result<f64, ParamError> {
            required(request.$lookup(key).as_deref(), key, <f64 as FromParam>::from_param)
        }

        #[doc = concat!("Returns the ", $source, " value of `key` parsed with the strftime-style `layout`.")]
        pub fn must_time<R: ParamSource + ?Sized>(
            request: &R,
            key: &str,
            layout: &str,
        ) -> Result<Timestamp, ParamError> {
            required(request.$lookup(key).as_deref(), key, |raw| util::parse_time(layout, raw))
        }

        #[doc = concat!("Like [`must_time`], but an absent ", $source, " value yields `default`.")]
        pub fn must_time_or<R: ParamSource + ?Sized>(
            request: &R,
            key: &str,
            layout: &str,
            default: Timestamp,
        ) -> Result<Timestamp, InvalidParameterError> {
            or_invalid(request.$lookup(key).as_deref(), key, default, |raw| {
                util::parse_time(layout, raw)
            })
        }

        #[doc = concat!("Returns the ", $source, " value of `key` as a unit-suffixed duration such as `1m12s`.")]
        pub fn must_duration<R: ParamSource + ?Sized>(
            request: &R,
            key: &str,
        ) -> Result<SignedDuration, ParamError> {
            required(request.$lookup(key).as_deref(), key, SignedDuration::from_param)
        }

        #[doc = concat!("Like [`must_duration`], but an absent ", $source, " value yields `default`.")]
        pub fn must_duration_or<R: ParamSource + ?Sized>(
            request: &R,
            key: &str,
            default: SignedDuration,
        ) -> Result<SignedDuration, InvalidParameterError> {
            or_invalid(request.$lookup(key).as_deref(), key, default, SignedDuration::from_param)
        }

        #[doc = concat!("Returns the ", $source, " value of `key`, or `default` when it is absent or blank.")]
        pub fn string<R: ParamSource + ?Sized>(request: &R, key: &str, default: &str) -> String {
            or_default(request.$lookup(key).as_deref(), default.to_owned(), String::from_param)
        }

        #[doc = concat!("Returns the ", $source, " value of `key` as a bool, or `default`.")]
        pub fn bool<R: ParamSource + ?Sized>(request: &R, key: &str, default: bool) -> bool {
            or_default(request.$lookup(key).as_deref(), default, <bool as FromParam>::from_param)
        }

        #[doc = concat!("Returns the ", $source, " value of `key` parsed with `layout`, or `default`.")]
        pub fn time<R: ParamSource + ?Sized>(
            request: &R,
            key: &str,
            layout: &str,
            default: Timestamp,
        ) -> Timestamp {
            or_default(request.$lookup(key).as_deref(), default, |raw| {
                util::parse_time(layout, raw)
            })
        }

        #[doc = concat!("Returns the ", $source, " value of `key` as a duration, or `default`.")]
        pub fn duration<R: ParamSource + ?Sized>(
            request: &R,
            key: &str,
            default: SignedDuration,
        ) -> SignedDuration {
            or_default(request.$lookup(key).as_deref(), default, SignedDuration::from_param)
        }
    };
}

// Numeric defaults that swallow malformed values.
macro_rules! lenient_numbers {
    ($source:literal, $lookup:ident) => {
        lenient_numbers!(@one $source, $lookup, int, isize);
        lenient_numbers!(@one $source, $lookup, int32, i32);
        lenient_numbers!(@one $source, $lookup, int64, i64);
        lenient_numbers!(@one $source, $lookup, float32, f32);
        lenient_numbers!(@one $source, $lookup, float64, f64);
    };
    (@one $source:literal, $lookup:ident, $name:ident, $t:ty) => {
        #[doc = concat!(
            "Returns the ", $source, " value of `key` as `", stringify!($t),
            "`, or `default` when it is absent, blank or malformed."
        )]
        pub fn $name<R: ParamSource + ?Sized>(request: &R, key: &str, default: $t) -> $t {
            or_default(request.$lookup(key).as_deref(), default, <$t as FromParam>::from_param)
        }
    };
}

// Numeric defaults that reject malformed values.
macro_rules! strict_numbers {
    ($source:literal, $lookup:ident) => {
        strict_numbers!(@one $source, $lookup, int, isize);
        strict_numbers!(@one $source, $lookup, int32, i32);
        strict_numbers!(@one $source, $lookup, int64, i64);
        strict_numbers!(@one $source, $lookup, float32, f32);
        strict_numbers!(@one $source, $lookup, float64, f64);
    };
    (@one $source:literal, $lookup:ident, $name:ident, $t:ty) => {
        #[doc = concat!(
            "Returns the ", $source, " value of `key` as `", stringify!($t),
            "`, or `default` when it is absent or blank. A malformed value is an error."
        )]
        pub fn $name<R: ParamSource + ?Sized>(
            request: &R,
            key: &str,
            default: $t,
        ) -> Result<$t, InvalidParameterError> {
            or_invalid(request.$lookup(key).as_deref(), key, default, <$t as FromParam>::from_param)
        }
    };
}

// Declared after the macros above so they are in textual scope.
pub mod form;
pub mod path;
pub mod query;
