use reqwest::{header, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::instrument;
use url::Url;

use super::error::Error;
use super::types::{HierarchyItem, Job, Project, TimeseriesDataResponse, TimeseriesMetadata};

#[derive(Debug)]
enum Endpoint {
    /// `/api/proxy`-style endpoint taking the API path in `?path=`.
    Proxy(Url),
    Direct {
        base_url: String,
        token: Option<SecretString>,
    },
}

/// Client for the telemetry API, either through the proxy or direct.
#[derive(Debug)]
pub struct TelemetryClient {
    client: reqwest::Client,
    endpoint: Endpoint,
}

impl TelemetryClient {
    /// Sends every request through a proxy endpoint such as
    /// `https://host/api/proxy`. The proxy supplies credentials.
    pub fn via_proxy(proxy_url: &str) -> Result<Self, Error> {
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: Endpoint::Proxy(Url::parse(proxy_url)?),
        })
    }

    /// Talks to the API directly, e.g. `https://production.api.shearstreaming.com/api/v1`.
    pub fn direct(base_url: &str) -> Result<Self, Error> {
        Url::parse(base_url)?;

        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: Endpoint::Direct {
                base_url: base_url.trim_end_matches('/').to_string(),
                token: None,
            },
        })
    }

    /// Replaces the underlying HTTP client, e.g. to set timeouts.
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Bearer token for direct mode. Ignored when going through the proxy.
    pub fn set_auth_token(&mut self, value: impl Into<String>) {
        if let Endpoint::Direct { token, .. } = &mut self.endpoint {
            *token = Some(SecretString::new(value.into().into()));
        }
    }

    pub fn clear_auth_token(&mut self) {
        if let Endpoint::Direct { token, .. } = &mut self.endpoint {
            *token = None;
        }
    }

    fn url(&self, endpoint: &str) -> Result<Url, Error> {
        match &self.endpoint {
            Endpoint::Proxy(proxy_url) => {
                let mut url = proxy_url.clone();
                url.query_pairs_mut()
                    .append_pair("path", endpoint.strip_prefix('/').unwrap_or(endpoint));
                Ok(url)
            }
            Endpoint::Direct { base_url, .. } => {
                Ok(Url::parse(&format!("{}{}", base_url, endpoint))?)
            }
        }
    }

    #[instrument(skip(self))]
    async fn fetch_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, Error> {
        let mut request = self
            .client
            .get(self.url(endpoint)?)
            .header(header::CONTENT_TYPE, "application/json");

        if let Endpoint::Direct {
            token: Some(token), ..
        } = &self.endpoint
        {
            request = request.bearer_auth(token.expose_secret());
        }

        let resp = request.send().await?;

        match resp.status() {
            status if status.is_success() => Ok(resp.json::<T>().await?),
            StatusCode::UNAUTHORIZED => Err(Error::Unauthorized),
            status => Err(Error::Status(status)),
        }
    }

    pub async fn project(&self, project_id: u64) -> Result<Project, Error> {
        #[derive(Deserialize)]
        struct Envelope {
            project: Project,
        }

        let envelope: Envelope = self.fetch_json(&format!("/project/{}", project_id)).await?;
        Ok(envelope.project)
    }

    /// Jobs of a project; empty when the API omits the list.
    pub async fn project_jobs(&self, project_id: u64) -> Result<Vec<Job>, Error> {
        #[derive(Deserialize)]
        struct Envelope {
            #[serde(default)]
            jobs: Option<Vec<Job>>,
        }

        let envelope: Envelope = self
            .fetch_json(&format!("/job/{}/project", project_id))
            .await?;
        Ok(envelope.jobs.unwrap_or_default())
    }

    /// Breadcrumb trail for a project; empty when the API omits it.
    pub async fn project_hierarchy(&self, project_id: u64) -> Result<Vec<HierarchyItem>, Error> {
        #[derive(Deserialize)]
        struct Envelope {
            #[serde(default)]
            hierarchies: Option<Vec<HierarchyItem>>,
        }

        let envelope: Envelope = self
            .fetch_json(&format!("/hierarchy/{}/PROJECT", project_id))
            .await?;
        Ok(envelope.hierarchies.unwrap_or_default())
    }

    pub async fn timeseries_metadata(&self, job_id: u64) -> Result<TimeseriesMetadata, Error> {
        self.fetch_json(&format!("/timeseries/{}/metadata", job_id))
            .await
    }

    pub async fn timeseries_data(
        &self,
        job_id: u64,
        query: &TimeseriesQuery,
    ) -> Result<TimeseriesDataResponse, Error> {
        let params = query.encode()?;

        self.fetch_json(&format!("/timeseries/{}/data?{}", job_id, params))
            .await
    }
}

/// Channels and window for a timeseries request.
#[derive(Debug, Clone, Default)]
pub struct TimeseriesQuery {
    pub channels: Vec<String>,
    /// Epoch milliseconds; `None` or `0` leaves the bound open.
    pub start_timestamp: Option<i64>,
    pub end_timestamp: Option<i64>,
    pub disable_aggregation: bool,
}

impl TimeseriesQuery {
    pub fn new<I, S>(channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            channels: channels.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn between(mut self, start: i64, end: i64) -> Self {
        self.start_timestamp = Some(start);
        self.end_timestamp = Some(end);
        self
    }

    pub fn without_aggregation(mut self) -> Self {
        self.disable_aggregation = true;
        self
    }

    /// `c[]` per channel, then `c[]=timestamp`, the window, and the aggregation flag.
    fn encode(&self) -> Result<String, Error> {
        let mut params: Vec<(&str, String)> = self
            .channels
            .iter()
            .map(|channel| ("c[]", channel.clone()))
            .collect();

        params.push(("c[]", "timestamp".to_string()));

        if let Some(start) = self.start_timestamp.filter(|start| *start != 0) {
            params.push(("startTimestamp", start.to_string()));
        }
        if let Some(end) = self.end_timestamp.filter(|end| *end != 0) {
            params.push(("endTimestamp", end.to_string()));
        }

        params.push(("disableAggregation", self.disable_aggregation.to_string()));

        Ok(serde_urlencoded::to_string(params)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header as header_matcher, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn project_json() -> serde_json::Value {
        json!({
            "project": {
                "id": 413,
                "padId": 12,
                "name": "Pad 7",
                "createdAt": "2025-01-01T00:00:00Z",
                "updatedAt": "2025-01-02T00:00:00Z",
                "updatedBy": "ops",
                "active": true,
                "timezone": "America/Denver",
                "unitSystem": "IMPERIAL",
                "share": false
            }
        })
    }

    #[test]
    fn test_query_encoding() {
        let query = TimeseriesQuery::new(["pressure", "rate"]).between(1000, 2000);

        assert_eq!(
            query.encode().unwrap(),
            "c%5B%5D=pressure&c%5B%5D=rate&c%5B%5D=timestamp&startTimestamp=1000&endTimestamp=2000&disableAggregation=false"
        );
    }

    #[test]
    fn test_query_skips_zero_bounds() {
        let query = TimeseriesQuery::new(["pressure"]).between(0, 0).without_aggregation();

        assert_eq!(
            query.encode().unwrap(),
            "c%5B%5D=pressure&c%5B%5D=timestamp&disableAggregation=true"
        );
    }

    #[test]
    fn test_proxy_url_encodes_path() {
        let client = TelemetryClient::via_proxy("https://dash.example.com/api/proxy").unwrap();
        let url = client.url("/timeseries/7/data?c%5B%5D=timestamp").unwrap();

        let (key, value) = url.query_pairs().next().unwrap();
        assert_eq!(key, "path");
        assert_eq!(value, "timeseries/7/data?c%5B%5D=timestamp");
        assert!(!url.query().unwrap().contains('/'));
    }

    #[tokio::test]
    async fn test_project_via_proxy() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/proxy"))
            .and(query_param("path", "project/413"))
            .respond_with(ResponseTemplate::new(200).set_body_json(project_json()))
            .expect(1)
            .mount(&server)
            .await;

        let client = TelemetryClient::via_proxy(&format!("{}/api/proxy", server.uri())).unwrap();
        let project = client.project(413).await.unwrap();

        assert_eq!(project.id, 413);
        assert_eq!(project.name, "Pad 7");
        assert_eq!(project.unit_system, crate::telemetry::UnitSystem::Imperial);
    }

    #[tokio::test]
    async fn test_direct_mode_sends_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/hierarchy/413/PROJECT"))
            .and(header_matcher("authorization", "Bearer user-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "hierarchies": [
                    { "title": "Pad 7", "to": { "name": "project", "params": { "id": 413 } }, "assetType": "PROJECT" }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut client = TelemetryClient::direct(&format!("{}/api/v1", server.uri())).unwrap();
        client.set_auth_token("user-token");
        let hierarchy = client.project_hierarchy(413).await.unwrap();

        assert_eq!(hierarchy.len(), 1);
        assert_eq!(hierarchy[0].asset_type, "PROJECT");
    }

    #[tokio::test]
    async fn test_missing_jobs_list_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/job/413/project"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let client = TelemetryClient::direct(&format!("{}/api/v1/", server.uri())).unwrap();

        assert!(client.project_jobs(413).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_timeseries_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/timeseries/7/data"))
            .and(query_param("c[]", "pressure"))
            .and(query_param("disableAggregation", "false"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jobId": 7,
                "data": [
                    { "timestamp": 1000, "pressure": 5120.5 },
                    { "timestamp": 2000, "pressure": null }
                ]
            })))
            .mount(&server)
            .await;

        let client = TelemetryClient::direct(&format!("{}/api/v1", server.uri())).unwrap();
        let series = client
            .timeseries_data(7, &TimeseriesQuery::new(["pressure"]))
            .await
            .unwrap();

        assert_eq!(series.job_id, 7);
        assert_eq!(series.data[0].values["pressure"], Some(5120.5));
        assert_eq!(series.data[1].values["pressure"], None);
    }

    #[tokio::test]
    async fn test_unauthorized_and_status_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/timeseries/7/metadata"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/timeseries/8/metadata"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = TelemetryClient::direct(&format!("{}/api/v1", server.uri())).unwrap();

        assert!(matches!(
            client.timeseries_metadata(7).await,
            Err(Error::Unauthorized)
        ));
        assert!(matches!(
            client.timeseries_metadata(8).await,
            Err(Error::Status(StatusCode::SERVICE_UNAVAILABLE))
        ));
    }
}
