use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use spot_oracle_common::{ExchangeId, Quote, RaceError};

/// `?details=true` response body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpotDetails {
    pub pair: String,
    pub price: f64,
    pub source: ExchangeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceFormat {
    Plain,
    Detailed,
}

/// Six fixed decimals, e.g. `99999.990000`
pub fn format_plain(price: f64) -> String {
    format!("{:.6}", price)
}

pub fn render_quote(pair: &str, quote: &Quote, format: PriceFormat) -> Response {
    match format {
        PriceFormat::Plain => (
            [(header::CONTENT_TYPE, "text/plain")],
            format_plain(quote.price),
        )
            .into_response(),
        PriceFormat::Detailed => Json(SpotDetails {
            pair: pair.to_string(),
            price: quote.price,
            source: quote.source,
        })
        .into_response(),
    }
}

/// 503 for an ordinary total failure, 504 when every exchange ran out of time
pub fn render_failure(err: &RaceError) -> Response {
    let status = match err {
        RaceError::AllFailed(_) => StatusCode::SERVICE_UNAVAILABLE,
        RaceError::DeadlineExceeded(_) => StatusCode::GATEWAY_TIMEOUT,
    };
    (status, Json(err.failure().clone())).into_response()
}
