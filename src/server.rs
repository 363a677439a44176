//! HTTP surface: scrape a URL, export a batch as a spreadsheet.

use crate::batch::pivot;
use crate::error::Error;
use crate::export::{DOWNLOAD_NAME, XLSX_CONTENT_TYPE, write_workbook};
use crate::renderers::Extractor;
use crate::renderers::browser::BrowserConnector;
use crate::results::{BatchEntry, ExtractedRecord, ExtractionTarget};
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Body of `POST /export-excel`
#[derive(Debug, Default, Deserialize)]
pub struct ExportRequest {
    #[serde(default)]
    pub data: Vec<BatchEntry>,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = if self.is_validation() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(self.to_body())).into_response()
    }
}

/// Routes with permissive CORS for browser-based callers
pub fn router<C: BrowserConnector + 'static>(extractor: Extractor<C>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/scrape", post(scrape::<C>))
        .route("/export-excel", post(export_excel))
        .layer(cors)
        .with_state(Arc::new(extractor))
}

/// Bind `port` on all interfaces and serve until the process exits
pub async fn serve<C: BrowserConnector + 'static>(
    port: u16,
    extractor: Extractor<C>,
) -> Result<(), Error> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    ::log::info!("Listening on http://localhost:{}", port);

    axum::serve(listener, router(extractor)).await?;
    Ok(())
}

async fn health() -> &'static str {
    "headline-scrape is up"
}

async fn scrape<C: BrowserConnector + 'static>(
    State(extractor): State<Arc<Extractor<C>>>,
    payload: Result<Json<ExtractionTarget>, JsonRejection>,
) -> Result<Json<ExtractedRecord>, Error> {
    let target = json_body(payload)?.validated()?;

    match extractor.extract(&target.url).await {
        Ok(record) => Ok(Json(record)),
        Err(e) => {
            ::log::error!("Scrape of {} failed: {}", target.url, e);
            Err(e)
        }
    }
}

async fn export_excel(
    payload: Result<Json<ExportRequest>, JsonRejection>,
) -> Result<Response, Error> {
    let request = json_body(payload)?;
    let grid = pivot(&request.data)?;
    let bytes = write_workbook(&grid)?;
    let disposition = format!("attachment; filename=\"{}\"", DOWNLOAD_NAME);

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

/// Unreadable bodies are reported like any other bad request
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Error> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| Error::Validation(rejection.body_text()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScraperConfig;
    use axum::body::{Body, to_bytes};
    use axum::extract::{FromRequest, Request};

    async fn parse_json<T>(content_type: &str, body: &'static str) -> Result<Json<T>, JsonRejection>
    where
        T: serde::de::DeserializeOwned,
    {
        let request = Request::builder()
            .method(Method::POST)
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap();
        Json::<T>::from_request(request, &()).await
    }

    async fn error_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        assert_eq!(health().await, "headline-scrape is up");
    }

    #[tokio::test]
    async fn test_scrape_without_url_is_bad_request() {
        let extractor = Extractor::from_config(&ScraperConfig::default()).unwrap();
        let result = scrape(
            State(Arc::new(extractor)),
            Ok(Json(ExtractionTarget::default())),
        )
        .await;

        let response = result.unwrap_err().into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_export_empty_is_bad_request() {
        let result = export_excel(Ok(Json(ExportRequest::default()))).await;
        let response = result.unwrap_err().into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_export_body_is_json_bad_request() {
        let payload = parse_json::<ExportRequest>("application/json", "{\"data\": [").await;
        assert!(payload.is_err());

        let response = export_excel(payload).await.unwrap_err().into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );

        let body = error_json(response).await;
        assert_eq!(body["error"], "invalid request");
        assert!(!body["details"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_scrape_without_json_content_type_is_bad_request() {
        let extractor = Extractor::from_config(&ScraperConfig::default()).unwrap();
        let payload = parse_json::<ExtractionTarget>("text/plain", r#"{"url": "https://x.test/"}"#).await;

        let response = scrape(State(Arc::new(extractor)), payload)
            .await
            .unwrap_err()
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = error_json(response).await;
        assert_eq!(body["error"], "invalid request");
    }

    #[tokio::test]
    async fn test_export_returns_workbook() {
        let request: ExportRequest = serde_json::from_str(
            r#"{"data": [
                {"title": "T1", "bajada": "S1", "link": "L1", "image": "I1", "nota": "n1"},
                {"title": "T2", "subtitle": "S2", "link": "L2", "image": "I2", "label": "n2"}
            ]}"#,
        )
        .unwrap();

        let response = export_excel(Ok(Json(request))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            XLSX_CONTENT_TYPE
        );
        assert!(
            response.headers()[header::CONTENT_DISPOSITION]
                .to_str()
                .unwrap()
                .contains("datos.xlsx")
        );
    }
}
