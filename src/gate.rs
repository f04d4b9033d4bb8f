use actix_web::middleware::Next;
use actix_web::{
    Error, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
};
use chrono::{Datelike, Local, NaiveDate, Weekday};
use serde_json::json;

pub const UNAVAILABLE_MESSAGE: &str =
    "The service is unavailable on Sundays. Please come back tomorrow.";

pub fn closed_on(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Sun
}

/// Short-circuits every route (webhook, report, docs) with 503 on
/// Sundays, before any other processing runs.
pub async fn sunday_gate(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    if closed_on(Local::now().date_naive()) {
        let resp = HttpResponse::ServiceUnavailable().json(json!({
            "message": UNAVAILABLE_MESSAGE
        }));
        return Ok(req.into_response(resp.map_into_boxed_body()));
    }

    next.call(req).await
}
