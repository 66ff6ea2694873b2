use axum::{
    extract::{Query, State},
    Extension, Json,
};
use roimatch_core::Platform;
use roimatch_model::{rank_by_kpis, HistoricalFilter, HistoricalPick};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct TopCampaignsQuery {
    pub campaign_type: Option<String>,
    pub influencer_category: Option<String>,
    pub platform: Option<String>,
    pub min_product_sales: Option<f64>,
    pub min_engagements: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct TopCampaignItem {
    rank: usize,
    kpi_score: f64,
    #[serde(flatten)]
    pick: HistoricalPick,
}

impl TopCampaignsQuery {
    fn filter(&self) -> Result<HistoricalFilter, String> {
        let platform = self
            .platform
            .as_deref()
            .map(str::parse::<Platform>)
            .transpose()
            .map_err(|e| e.to_string())?;
        let min_product_sales = self.min_product_sales.unwrap_or(0.0);
        if !min_product_sales.is_finite() {
            return Err("min_product_sales must be a finite number".to_string());
        }
        Ok(HistoricalFilter {
            campaign_type: self.campaign_type.clone(),
            influencer_category: self.influencer_category.clone(),
            platform,
            min_product_sales,
            min_engagements: self.min_engagements.unwrap_or(0),
        })
    }
}

/// Historical campaigns ranked by weighted engagement, reach, and sales.
pub(super) async fn top_campaigns(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<TopCampaignsQuery>,
) -> Result<Json<ApiResponse<Vec<TopCampaignItem>>>, ApiError> {
    let filter = query
        .filter()
        .map_err(|msg| ApiError::new(req_id.0.clone(), "validation_error", msg))?;

    let records = roimatch_db::list_performance_matching(&state.pool, &filter)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rank_by_kpis(&records, &filter, normalize_limit(query.limit))
        .into_iter()
        .map(|r| TopCampaignItem {
            rank: r.rank,
            kpi_score: r.score,
            pick: r.item,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use roimatch_core::{PerformanceRecord, Platform};
    use tower::ServiceExt;

    use super::super::test_support::{body_json, state_with};
    use super::super::{build_app, default_rate_limit_state, AppState};
    use super::TopCampaignsQuery;
    use crate::middleware::AuthState;

    fn record(id: &str, platform: Platform, engagements: i64, sales: f64) -> PerformanceRecord {
        PerformanceRecord {
            campaign_id: id.to_string(),
            platform,
            influencer_category: "Beauty".to_string(),
            campaign_type: Some("Launch".to_string()),
            start_date: None,
            engagements: Some(engagements),
            estimated_reach: Some(1000),
            product_sales: Some(sales),
            budget: Some(1000),
            duration_days: Some(14),
            end_date: None,
        }
    }

    #[test]
    fn query_with_unknown_platform_is_rejected() {
        let query = TopCampaignsQuery {
            campaign_type: None,
            influencer_category: None,
            platform: Some("Myspace".to_string()),
            min_product_sales: None,
            min_engagements: None,
            limit: None,
        };
        assert!(query.filter().is_err());
    }

    #[test]
    fn query_with_non_finite_sales_threshold_is_rejected() {
        let query = TopCampaignsQuery {
            campaign_type: None,
            influencer_category: None,
            platform: None,
            min_product_sales: Some(f64::NAN),
            min_engagements: None,
            limit: None,
        };
        assert!(query.filter().is_err());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn top_campaigns_ranks_filtered_history(pool: sqlx::PgPool) {
        roimatch_db::replace_performance_records(
            &pool,
            &[
                record("small", Platform::Instagram, 10, 500.0),
                record("big", Platform::Instagram, 5000, 3000.0),
                record("tiktok", Platform::TikTok, 99_999, 99_999.0),
            ],
        )
        .await
        .expect("seed performance");

        let app = build_app(
            AppState {
                pool,
                service: state_with(None, None).service,
            },
            AuthState::disabled(),
            default_rate_limit_state(),
        );
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/performance/top?platform=instagram&limit=5")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let data = json["data"].as_array().expect("data array");
        assert_eq!(data.len(), 2);
        assert_eq!(data[0]["campaign_id"], "big");
        assert_eq!(data[0]["rank"], 1);
        assert_eq!(data[0]["historical_roi"].as_f64(), Some(200.0));
        assert_eq!(data[1]["campaign_id"], "small");
        assert_eq!(data[1]["historical_roi"].as_f64(), Some(-50.0));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/performance/top?min_engagements=100&min_product_sales=1000")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        let json = body_json(response).await;
        let ids: Vec<&str> = json["data"]
            .as_array()
            .expect("data array")
            .iter()
            .filter_map(|item| item["campaign_id"].as_str())
            .collect();
        assert_eq!(ids, vec!["tiktok", "big"]);
    }

    #[tokio::test]
    async fn top_campaigns_rejects_unknown_platform_before_db() {
        let app = build_app(
            state_with(None, None),
            AuthState::disabled(),
            default_rate_limit_state(),
        );
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/performance/top?platform=myspace")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
