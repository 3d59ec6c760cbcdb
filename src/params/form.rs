//! Accessors over form values: url-encoded body fields stored by
//! [`parse_form`](crate::request::parse_form), then the query string.

accessors!("form", form_value);
lenient_numbers!("form", form_value);

#[cfg(test)]
mod tests {
    use http::{Request, StatusCode, header::CONTENT_TYPE};

    use super::*;
    use crate::{config::FormConfig, request::parse_form, status::HttpError};

    fn form(body: &'static str, query: &str) -> Request<&'static [u8]> {
        let mut req = Request::post(format!("/submit{query}"))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body.as_bytes())
            .unwrap();
        parse_form(&mut req, &FormConfig::default()).unwrap();
        req
    }

    #[test]
    fn must_accessors() {
        let req = form("name=Oliver&age=42&admin=true&ratio=0.5&since=2017-06-01&ttl=1m12s", "");

        assert_eq!(must_string(&req, "name").unwrap(), "Oliver");
        assert_eq!(must_int(&req, "age").unwrap(), 42);
        assert_eq!(must_int32(&req, "age").unwrap(), 42);
        assert_eq!(must_int64(&req, "age").unwrap(), 42);
        assert!(must_bool(&req, "admin").unwrap());
        assert_eq!(must_float32(&req, "ratio").unwrap(), 0.5);
        assert_eq!(must_float64(&req, "ratio").unwrap(), 0.5);
        assert_eq!(
            must_time(&req, "since", "%Y-%m-%d").unwrap().to_string(),
            "2017-06-01T00:00:00Z"
        );
        assert_eq!(must_duration(&req, "ttl").unwrap(), SignedDuration::from_secs(72));
    }

    #[test]
    fn must_accessors_fail_with_parameter_errors() {
        let req = form("name=&age=old", "");

        let err = must_string(&req, "name").unwrap_err();
        assert_eq!(err, ParamError::missing("name"));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), r#"Missing parameter "name""#);

        let err = must_int(&req, "age").unwrap_err();
        assert_eq!(err.to_string(), r#"Invalid parameter "age""#);
        assert_eq!(must_bool(&req, "nope"), Err(ParamError::missing("nope")));
    }

    #[test]
    fn body_takes_precedence_over_query() {
        let req = form("page=1", "?page=2&size=10");
        assert_eq!(must_int(&req, "page").unwrap(), 1);
        assert_eq!(int(&req, "size", 0), 10);
    }

    #[test]
    fn default_accessors_swallow_failures() {
        let req = form("age=old&flag=maybe&ratio=x&since=yesterday&ttl=12", "");

        assert_eq!(string(&req, "name", "anonymous"), "anonymous");
        assert_eq!(int(&req, "age", 7), 7);
        assert_eq!(int32(&req, "age", 7), 7);
        assert_eq!(int64(&req, "age", 7), 7);
        assert_eq!(float32(&req, "ratio", 1.5), 1.5);
        assert_eq!(float64(&req, "ratio", 1.5), 1.5);
        assert!(bool(&req, "flag", true));
        assert_eq!(time(&req, "since", "%Y-%m-%d", Timestamp::UNIX_EPOCH), Timestamp::UNIX_EPOCH);
        assert_eq!(duration(&req, "ttl", SignedDuration::ZERO), SignedDuration::ZERO);
    }

    #[test]
    fn must_with_default_variants() {
        let req = form("since=bad&ttl=5", "");
        let fallback = Timestamp::UNIX_EPOCH;

        assert_eq!(must_time_or(&req, "until", "%Y-%m-%d", fallback), Ok(fallback));
        assert_eq!(
            must_time_or(&req, "since", "%Y-%m-%d", fallback),
            Err(InvalidParameterError::new("since"))
        );
        assert_eq!(
            must_duration_or(&req, "timeout", SignedDuration::from_secs(30)),
            Ok(SignedDuration::from_secs(30))
        );
        assert_eq!(
            must_duration_or(&req, "ttl", SignedDuration::ZERO),
            Err(InvalidParameterError::new("ttl"))
        );
    }
}
