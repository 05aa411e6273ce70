use axum::http::StatusCode;
use axum_test::{TestRequest, TestResponse};
use serde_json::Value;

use crate::{database_id::UserId, user::USER_ID_HEADER};

/// Send `request` on behalf of `user_id`.
pub(crate) fn as_user(request: TestRequest, user_id: UserId) -> TestRequest {
    request.add_header(USER_ID_HEADER, user_id.to_string())
}

#[track_caller]
pub(crate) fn assert_error_response(response: &TestResponse, status: StatusCode) {
    response.assert_status(status);

    let body = response.json::<Value>();
    assert!(
        body.get("error").and_then(Value::as_str).is_some(),
        "want an error message in the body, got {body}"
    );
}
