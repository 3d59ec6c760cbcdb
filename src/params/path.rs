//! Accessors over routing variables stored in
//! [`PathParams`](crate::request::PathParams).
//!
//! Unlike the form and query accessors, `int`, `int32`, `int64`, `float32`
//! and `float64` report a present but malformed value as an error instead of
//! returning the default. `string`, `bool`, `time` and `duration` default
//! silently.

accessors!("routing variable", path_value);
strict_numbers!("routing variable", path_value);
