//! One constructor per server endpoint.
//!
//! Session endpoints live under `/auth`, data endpoints under `/api`.

use serde_json::json;

use crate::{
    models::{Bucket, ConfigForm},
    request::ApiRequest,
};

#[must_use]
pub fn is_signed_in() -> ApiRequest {
    ApiRequest::get("/auth/is-signed-in")
}

#[must_use]
pub fn sign_out() -> ApiRequest {
    ApiRequest::get("/auth/sign-out")
}

#[must_use]
pub fn sign_in(password: &str) -> ApiRequest {
    ApiRequest::post("/auth/sign-in").form(json!({ "password": password }))
}

#[must_use]
pub fn get_current_key(password: &str) -> ApiRequest {
    ApiRequest::post("/auth/get-current-key").form(json!({ "password": password }))
}

#[must_use]
pub fn gen_new_key(password: &str) -> ApiRequest {
    ApiRequest::post("/auth/gen-new-key").form(json!({ "password": password }))
}

#[must_use]
pub fn change_password(old: &str, new: &str) -> ApiRequest {
    ApiRequest::post("/auth/change-pwd").form(json!({ "oldpwd": old, "newpwd": new }))
}

#[must_use]
pub fn get_config() -> ApiRequest {
    ApiRequest::get("/api/get-config")
}

/// Submit the whole config form as JSON.
///
/// # Errors
///
/// Returns an error when the form cannot be serialized.
pub fn update_config(form: &ConfigForm) -> Result<ApiRequest, serde_json::Error> {
    Ok(ApiRequest::post("/api/update-config").json(serde_json::to_value(form)?))
}

#[must_use]
pub fn add(msg: &str) -> ApiRequest {
    ApiRequest::post("/api/add").form(json!({ "msg": msg }))
}

#[must_use]
pub fn recent_items() -> ApiRequest {
    ApiRequest::get("/api/recent-items")
}

/// Next page of `bucket` after `start`; a `limit` of zero or less lets the
/// server pick its configured page size.
#[must_use]
pub fn more_items(bucket: Bucket, start: &str, limit: i64) -> ApiRequest {
    ApiRequest::post("/api/get-more-items").json(json!({
        "bucket": bucket,
        "start": start,
        "limit": limit,
    }))
}

#[must_use]
pub fn get_by_id(id: &str) -> ApiRequest {
    ApiRequest::post("/api/get-by-id").form(json!({ "id": id }))
}

#[must_use]
pub fn edit(id: &str, alias: &str, msg: &str) -> ApiRequest {
    ApiRequest::post("/api/edit").form(json!({ "id": id, "alias": alias, "msg": msg }))
}

#[must_use]
pub fn delete(id: &str) -> ApiRequest {
    ApiRequest::post("/api/delete").form(json!({ "id": id }))
}

#[must_use]
pub fn toggle_category(id: &str) -> ApiRequest {
    ApiRequest::post("/api/toggle-category").form(json!({ "id": id }))
}

/// Search `buckets` for `keyword`; no buckets means all of them.
#[must_use]
pub fn search(keyword: &str, buckets: &[Bucket]) -> ApiRequest {
    ApiRequest::post("/api/search").json(json!({ "keyword": keyword, "buckets": buckets }))
}

#[must_use]
pub fn all_aliases() -> ApiRequest {
    ApiRequest::get("/api/get-all-aliases")
}
