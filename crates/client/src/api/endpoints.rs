// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Request builders for every fallback endpoint the client uses.
//!
//! Delete and check have separate single and batch endpoints; the builders
//! pick one from the number of ids.

use std::time::Duration;

use serde_json::{json, Value};

use super::ApiRequest;

/// Mail checks can run for a long time on the server.
pub const CHECK_TIMEOUT: Duration = Duration::from_secs(60);

pub fn login(username: &str, password: &str) -> ApiRequest {
    ApiRequest::post("/auth/login").with_body(json!({
        "username": username,
        "password": password,
    }))
}

pub fn list_emails() -> ApiRequest {
    ApiRequest::get("/emails")
}

pub fn add_email(account: Value) -> ApiRequest {
    ApiRequest::post("/emails").with_body(account)
}

pub fn update_email(email_id: i64, account: Value) -> ApiRequest {
    ApiRequest::put(format!("/emails/{email_id}")).with_body(account)
}

pub fn delete_emails(email_ids: &[i64]) -> ApiRequest {
    match email_ids {
        [single] => ApiRequest::delete(format!("/emails/{single}")),
        ids => ApiRequest::post("/emails/batch_delete").with_body(json!({ "email_ids": ids })),
    }
}

pub fn check_emails(email_ids: &[i64]) -> ApiRequest {
    let request = match email_ids {
        [single] => ApiRequest::post(format!("/emails/{single}/check")),
        ids => ApiRequest::post("/emails/batch_check").with_body(json!({ "email_ids": ids })),
    };
    request.with_timeout(CHECK_TIMEOUT)
}

pub fn recheck_all(email_id: i64) -> ApiRequest {
    ApiRequest::post(format!("/emails/{email_id}/recheck_all")).with_timeout(CHECK_TIMEOUT)
}

pub fn mail_records(email_id: i64) -> ApiRequest {
    ApiRequest::get(format!("/emails/{email_id}/mail_records"))
}

pub fn mark_read(mail_id: i64) -> ApiRequest {
    ApiRequest::post(format!("/mail_records/{mail_id}/mark-read"))
}

pub fn email_password(email_id: i64) -> ApiRequest {
    ApiRequest::get(format!("/emails/{email_id}/password"))
}

pub fn import_emails(data: &str, mail_type: &str) -> ApiRequest {
    ApiRequest::post("/emails/import").with_body(json!({
        "data": data,
        "mail_type": mail_type,
    }))
}
