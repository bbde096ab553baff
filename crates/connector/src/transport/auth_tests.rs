// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::http::HeaderValue;

use super::*;

fn headers(auth: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Some(value) = auth {
        if let Ok(value) = HeaderValue::from_str(value) {
            headers.insert("authorization", value);
        }
    }
    headers
}

#[yare::parameterized(
    disabled        = { None, None, true },
    disabled_extra  = { None, Some("Bearer anything"), true },
    valid           = { Some("s3cret"), Some("Bearer s3cret"), true },
    missing         = { Some("s3cret"), None, false },
    wrong_token     = { Some("s3cret"), Some("Bearer s3creT"), false },
    wrong_length    = { Some("s3cret"), Some("Bearer s3cret2"), false },
    wrong_scheme    = { Some("s3cret"), Some("Basic s3cret"), false },
)]
fn bearer_validation(expected: Option<&str>, header: Option<&str>, ok: bool) {
    assert_eq!(validate_bearer(&headers(header), expected).is_ok(), ok);
}

#[test]
fn rejection_is_unauthorized() {
    assert_eq!(validate_bearer(&headers(None), Some("t")), Err(ApiError::Unauthorized));
}

#[yare::parameterized(
    bearer      = { Some("Bearer abc"), Some("abc") },
    empty       = { Some("Bearer "), Some("") },
    lowercase   = { Some("bearer abc"), None },
    basic       = { Some("Basic abc"), None },
    absent      = { None, None },
)]
fn bearer_token_extraction(header: Option<&str>, expected: Option<&str>) {
    assert_eq!(bearer_token(&headers(header)), expected);
}
