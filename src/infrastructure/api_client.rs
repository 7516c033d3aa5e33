// REST client for dashboards and chart data
use crate::application::dashboard_repository::{ChartDataSource, DashboardRepository};
use crate::domain::chart::{DeviceChartData, Granularity, HierarchyChartData};
use crate::domain::layout::{DashboardId, DashboardSummary, LayoutRow, PersistedLayout, WidgetId};
use crate::infrastructure::api_mapper::{
    BulkLayoutsDto, DashboardDto, DeviceChartDto, Envelope, HierarchyChartDto, device_chart_from_dto,
    hierarchy_chart_from_dto, layout_row_from_dto, persisted_layout_to_dto,
};
use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned {status}: {body}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },
    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} reported failure: {message}")]
    Unsuccessful { url: String, message: String },
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str, token: &str) -> (String, reqwest::RequestBuilder) {
        let url = self.url(path);
        let builder = self
            .client
            .request(method, &url)
            .bearer_auth(token)
            .header("Accept", "application/json");
        (url, builder)
    }

    async fn execute(
        &self,
        url: &str,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ApiError> {
        let response = builder.send().await.map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                url: url.to_string(),
                status,
                body,
            });
        }
        Ok(response)
    }

    /// Decode the envelope and insist on `success` with a payload.
    async fn fetch<T: DeserializeOwned>(&self, path: &str, token: &str) -> Result<T, ApiError> {
        let (url, builder) = self.request(Method::GET, path, token);
        let envelope = self
            .execute(&url, builder)
            .await?
            .json::<Envelope<T>>()
            .await
            .map_err(|source| ApiError::Decode {
                url: url.clone(),
                source,
            })?;

        match envelope {
            Envelope {
                success: true,
                data: Some(data),
                ..
            } => Ok(data),
            Envelope { message, .. } => Err(ApiError::Unsuccessful {
                url,
                message: message.unwrap_or_else(|| "no data in response".to_string()),
            }),
        }
    }

    /// For writes only the status and an explicit `success: false` matter.
    async fn write(&self, url: &str, builder: reqwest::RequestBuilder) -> Result<(), ApiError> {
        let text = self
            .execute(url, builder)
            .await?
            .text()
            .await
            .map_err(|source| ApiError::Decode {
                url: url.to_string(),
                source,
            })?;

        if let Ok(Envelope {
            success: false,
            message: Some(message),
            ..
        }) = serde_json::from_str::<Envelope<Value>>(&text)
        {
            return Err(ApiError::Unsuccessful {
                url: url.to_string(),
                message,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DashboardRepository for ApiClient {
    async fn list_dashboards(&self, token: &str) -> Result<Vec<DashboardSummary>> {
        let dashboards = self.fetch::<Vec<DashboardSummary>>("/dashboards", token).await?;
        tracing::debug!(count = dashboards.len(), "Fetched dashboards");
        Ok(dashboards)
    }

    async fn get_dashboard(&self, id: DashboardId, token: &str) -> Result<Vec<LayoutRow>> {
        let dashboard = self
            .fetch::<DashboardDto>(&format!("/dashboards/{}", id), token)
            .await?;
        Ok(dashboard.layouts.into_iter().map(layout_row_from_dto).collect())
    }

    async fn bulk_update_layouts(
        &self,
        id: DashboardId,
        rows: &[PersistedLayout],
        token: &str,
    ) -> Result<()> {
        let body = BulkLayoutsDto {
            layouts: rows.iter().map(persisted_layout_to_dto).collect(),
        };
        let (url, builder) =
            self.request(Method::PUT, &format!("/dashboards/{}/layouts/bulk", id), token);
        self.write(&url, builder.json(&body)).await?;
        Ok(())
    }

    async fn remove_widget(&self, id: WidgetId, token: &str) -> Result<()> {
        let (url, builder) =
            self.request(Method::DELETE, &format!("/dashboards/layouts/{}", id), token);
        self.write(&url, builder).await?;
        Ok(())
    }
}

#[async_trait]
impl ChartDataSource for ApiClient {
    async fn device_chart_data(
        &self,
        device_id: i64,
        granularity: Granularity,
        token: &str,
    ) -> Result<DeviceChartData> {
        let path = format!(
            "/charts/device/{}/enhanced?timeRange={}",
            device_id,
            urlencoding::encode(granularity.as_str())
        );
        let dto = self.fetch::<DeviceChartDto>(&path, token).await?;
        Ok(device_chart_from_dto(dto, device_id))
    }

    async fn hierarchy_chart_data(
        &self,
        hierarchy_id: i64,
        granularity: Granularity,
        token: &str,
    ) -> Result<HierarchyChartData> {
        let path = format!(
            "/charts/hierarchy/{}/enhanced?timeRange={}",
            hierarchy_id,
            urlencoding::encode(granularity.as_str())
        );
        let dto = self.fetch::<HierarchyChartDto>(&path, token).await?;
        Ok(hierarchy_chart_from_dto(dto))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ApiClient::new("http://localhost:5000/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.url("/dashboards"), "http://localhost:5000/api/dashboards");
    }

    #[test]
    fn test_api_error_messages() {
        let err = ApiError::Unsuccessful {
            url: "http://x/dashboards/1".to_string(),
            message: "forbidden".to_string(),
        };
        assert_eq!(err.to_string(), "http://x/dashboards/1 reported failure: forbidden");

        let err = ApiError::Status {
            url: "http://x/dashboards".to_string(),
            status: StatusCode::UNAUTHORIZED,
            body: "expired".to_string(),
        };
        assert!(err.to_string().contains("401"));
        let err: anyhow::Error = err.into();
        assert!(err.downcast_ref::<ApiError>().is_some());
    }
}
