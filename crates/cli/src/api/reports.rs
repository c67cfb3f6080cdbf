//! Analytics, calendar, report and export endpoints

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::str::FromStr;

use super::AppState;
use super::error::{ApiError, ApiResult};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/analytics/:client_id", get(analytics))
        .route("/api/calendar/:client_id", get(calendar))
        .route("/api/reports/:client_id/monthly", get(monthly))
        .route("/api/export/:client_id/posts", get(export))
        .route("/api/dashboard/stats", get(dashboard))
}

#[derive(Debug, Default, Deserialize)]
struct PeriodQuery {
    month: Option<String>,
    year: Option<String>,
}

impl PeriodQuery {
    fn parse(self) -> Result<(Option<u8>, Option<i32>), ApiError> {
        Ok((number("month", self.month)?, number("year", self.year)?))
    }
}

fn number<T: FromStr>(name: &str, raw: Option<String>) -> Result<Option<T>, ApiError> {
    match raw.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|_| ApiError::Validation(vec![format!("Invalid {}: {}", name, s)])),
    }
}

async fn analytics(State(state): State<AppState>, Path(client_id): Path<String>) -> ApiResult {
    let analytics = state.reports.analytics(&client_id).await?;
    Ok(Json(json!({ "success": true, "analytics": analytics })))
}

/// `month` is 0-based
async fn calendar(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
    Query(period): Query<PeriodQuery>,
) -> ApiResult {
    let (month, year) = period.parse()?;
    let calendar = state.reports.calendar(&client_id, month, year).await?;
    Ok(Json(json!({ "success": true, "calendar": calendar })))
}

/// `month` is 1-based
async fn monthly(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
    Query(period): Query<PeriodQuery>,
) -> ApiResult {
    let (month, year) = period.parse()?;
    let report = state.reports.monthly(&client_id, month, year).await?;
    Ok(Json(json!({ "success": true, "report": report })))
}

async fn export(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let csv = state.reports.export_csv(&client_id).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=posts-export.csv",
            ),
        ],
        csv,
    ))
}

async fn dashboard(State(state): State<AppState>) -> ApiResult {
    let stats = state.reports.dashboard().await?;
    Ok(Json(json!({ "success": true, "stats": stats })))
}

#[cfg(test)]
mod tests {
    use super::super::testing::{http, spawn, state};
    use serde_json::{Value, json};

    async fn seeded(base: &str) -> String {
        let created: Value = http()
            .post(format!("{}/api/clients", base))
            .json(&json!({ "name": "Acme", "industry": "coffee" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let id = created["client"]["id"].as_str().unwrap().to_string();

        for (content, at) in [
            ("Launch \"Bold\" blend", "2031-03-05T09:00:00Z"),
            ("Spring menu", "2031-04-01T12:30:00Z"),
        ] {
            let response = http()
                .post(format!("{}/api/posts/schedule", base))
                .json(&json!({
                    "clientId": id,
                    "content": content,
                    "platforms": ["facebook", "instagram"],
                    "scheduledTime": at,
                }))
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), 200);
        }
        id
    }

    async fn get_json(url: String) -> (u16, Value) {
        let response = http().get(url).send().await.unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }

    #[tokio::test]
    async fn test_calendar_groups_by_day_with_zero_based_month() {
        let base = spawn(state()).await;
        let id = seeded(&base).await;

        let (_, body) = get_json(format!("{}/api/calendar/{}", base, id)).await;
        let days: Vec<&String> = body["calendar"].as_object().unwrap().keys().collect();
        assert_eq!(days, ["2031-03-05", "2031-04-01"]);

        let (_, body) = get_json(format!("{}/api/calendar/{}?month=2&year=2031", base, id)).await;
        assert_eq!(body["calendar"].as_object().unwrap().len(), 1);
        assert!(body["calendar"]["2031-03-05"].is_array());

        let (status, _) = get_json(format!("{}/api/calendar/{}?month=march", base, id)).await;
        assert_eq!(status, 400);
    }

    #[tokio::test]
    async fn test_csv_export_headers_and_quoting() {
        let base = spawn(state()).await;
        let id = seeded(&base).await;

        let response = http()
            .get(format!("{}/api/export/{}/posts", base, id))
            .send()
            .await
            .unwrap();
        assert_eq!(response.headers()["content-type"], "text/csv");
        assert_eq!(
            response.headers()["content-disposition"],
            "attachment; filename=posts-export.csv"
        );

        let text = response.text().await.unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("ID,Content,Platforms,Status,Scheduled Time,Published Time")
        );
        let rows: Vec<&str> = lines.collect();
        assert_eq!(rows.len(), 2);
        let launch = rows.iter().find(|r| r.contains("Bold")).unwrap();
        assert!(launch.contains("\"Launch \"\"Bold\"\" blend\""));
        assert!(launch.contains("facebook|instagram"));
        assert!(launch.ends_with("N/A"));
    }

    #[tokio::test]
    async fn test_monthly_report_and_analytics() {
        let base = spawn(state()).await;
        let id = seeded(&base).await;

        let (_, body) =
            get_json(format!("{}/api/reports/{}/monthly?month=3&year=2031", base, id)).await;
        assert_eq!(body["report"]["client"]["industry"], "coffee");
        assert_eq!(body["report"]["period"], json!({ "month": 3, "year": 2031 }));

        let (_, body) = get_json(format!("{}/api/analytics/{}", base, id)).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["analytics"]["overview"]["scheduledPosts"], 2);

        let (status, _) = get_json(format!("{}/api/reports/client_0/monthly", base)).await;
        assert_eq!(status, 404);
    }

    #[tokio::test]
    async fn test_dashboard_counts() {
        let base = spawn(state()).await;
        seeded(&base).await;

        let (_, body) = get_json(format!("{}/api/dashboard/stats", base)).await;
        let stats = &body["stats"];
        assert_eq!(stats["totalClients"], 1);
        assert_eq!(stats["activeClients"], 1);
        assert_eq!(stats["totalScheduledPosts"], 2);
        assert_eq!(stats["totalPublishedPosts"], 0);
        assert_eq!(stats["platformsConnected"]["facebook"], 0);
    }
}
