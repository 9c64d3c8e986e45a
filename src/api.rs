use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;

use crate::error::ApiError;
use crate::models::{JobDetails, JobSummary, SalaryRange, SearchQuery};

// --- Source trait ---

/// The two operations the UI needs from a job service.
#[async_trait]
pub trait JobSource: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<JobSummary>, ApiError>;
    async fn job_details(&self, id: &str) -> Result<JobDetails, ApiError>;
}

// --- HTTP client ---

#[derive(Debug, Clone)]
pub struct JobApiClient {
    base: Url,
    client: reqwest::Client,
}

impl JobApiClient {
    pub fn new(base: Url, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("jobfinder/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { base, client })
    }

    /// `{base}/jobs?keywords=..&location=..`
    pub fn search_url(&self, query: &SearchQuery) -> Url {
        let mut url = self.endpoint(&["jobs"]);
        let params = query.params();
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        url
    }

    /// `{base}/jobs/{id}`, with the id encoded as a single path segment.
    pub fn details_url(&self, id: &str) -> Url {
        self.endpoint(&["jobs", id])
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_body(&self, url: Url, what: &'static str) -> Result<String, ApiError> {
        tracing::debug!(%url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(ApiError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status { what, status });
        }

        response.text().await.map_err(ApiError::Transport)
    }
}

#[async_trait]
impl JobSource for JobApiClient {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<JobSummary>, ApiError> {
        let body = self.get_body(self.search_url(query), "jobs").await?;
        let payload: SearchPayload = serde_json::from_str(&body).map_err(ApiError::Decode)?;
        if matches!(payload, SearchPayload::Unrecognized(_)) {
            tracing::warn!("search response had no job list; treating as empty");
        }
        Ok(payload.into_jobs())
    }

    async fn job_details(&self, id: &str) -> Result<JobDetails, ApiError> {
        let body = self.get_body(self.details_url(id), "job details").await?;
        decode_details(&body)
    }
}

// --- Wire shapes ---

/// Everything `/jobs` has been seen to return. Entries stay loose so one
/// odd record cannot knock out the whole list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SearchPayload {
    Array(Vec<Value>),
    Wrapped { results: Vec<Value> },
    Unrecognized(#[allow(dead_code)] Value),
}

impl SearchPayload {
    fn into_jobs(self) -> Vec<JobSummary> {
        let entries = match self {
            SearchPayload::Array(entries) | SearchPayload::Wrapped { results: entries } => entries,
            SearchPayload::Unrecognized(_) => Vec::new(),
        };
        entries.iter().filter_map(summary_from_entry).collect()
    }
}

/// Ids arrive as strings from some backends and integers from others.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Number(serde_json::Number),
}

impl WireId {
    fn into_string(self) -> String {
        match self {
            WireId::Text(text) => text,
            WireId::Number(number) => number.to_string(),
        }
    }
}

fn first_text(candidates: [Option<String>; 2]) -> String {
    candidates
        .into_iter()
        .flatten()
        .map(|text| text.trim().to_string())
        .find(|text| !text.is_empty())
        .unwrap_or_default()
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.filter(|text| !text.trim().is_empty())
}

fn wire_id(id: Option<WireId>) -> Option<String> {
    non_blank(id.map(WireId::into_string))
}

// --- Search entries ---

/// A string field, if present, a string, and not blank.
fn entry_text<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .filter(|text| !text.trim().is_empty())
}

fn entry_id(fields: &Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::Number(number) => Some(number.to_string()),
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        _ => None,
    }
}

fn first_entry_text(fields: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|key| entry_text(fields, key))
        .map(|text| text.trim().to_string())
        .unwrap_or_default()
}

/// Fields with an unexpected type count as missing; entries that are not
/// objects are skipped.
fn summary_from_entry(entry: &Value) -> Option<JobSummary> {
    let Some(fields) = entry.as_object() else {
        tracing::debug!(%entry, "skipping search entry that is not an object");
        return None;
    };
    let id = ["id", "link", "jobId"]
        .iter()
        .find_map(|key| entry_id(fields, key));
    let url = ["link", "jobUrl", "externalUrl"]
        .iter()
        .find_map(|key| entry_text(fields, key))
        .map(str::to_string);
    Some(JobSummary {
        id,
        title: first_entry_text(fields, &["title", "jobTitle"]),
        company: first_entry_text(fields, &["company", "employerName"]),
        location: first_entry_text(fields, &["location", "locationName"]),
        description: entry_text(fields, "description").map(str::to_string),
        url,
    })
}

// --- Job details ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireDetails {
    id: Option<WireId>,
    job_id: Option<WireId>,
    link: Option<String>,
    title: Option<String>,
    job_title: Option<String>,
    company: Option<String>,
    employer_name: Option<String>,
    location: Option<String>,
    location_name: Option<String>,
    job_description: Option<String>,
    description: Option<String>,
    minimum_salary: Option<f64>,
    maximum_salary: Option<f64>,
    currency: Option<String>,
    salary_type: Option<String>,
    contract_type: Option<String>,
    job_type: Option<String>,
    external_url: Option<String>,
    job_url: Option<String>,
}

impl From<WireDetails> for JobDetails {
    fn from(wire: WireDetails) -> Self {
        let id = wire_id(wire.id)
            .or(wire_id(wire.job_id))
            .or(non_blank(wire.link.clone()));
        Self {
            id,
            title: first_text([wire.title, wire.job_title]),
            company: first_text([wire.company, wire.employer_name]),
            location: first_text([wire.location, wire.location_name]),
            description: non_blank(wire.job_description).or(non_blank(wire.description)),
            salary: SalaryRange {
                min: wire.minimum_salary,
                max: wire.maximum_salary,
                currency: non_blank(wire.currency),
                period: non_blank(wire.salary_type),
            },
            contract_type: non_blank(wire.contract_type),
            job_type: non_blank(wire.job_type),
            external_url: non_blank(wire.external_url),
            job_url: non_blank(wire.job_url).or(non_blank(wire.link)),
        }
    }
}

fn decode_details(body: &str) -> Result<JobDetails, ApiError> {
    let value: Value = serde_json::from_str(body).map_err(ApiError::Decode)?;
    if !value.is_object() {
        return Err(ApiError::Decode(serde::de::Error::custom(
            "expected a job object",
        )));
    }
    let wire: WireDetails = serde_json::from_value(value).map_err(ApiError::Decode)?;
    Ok(wire.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn decode_search(body: &str) -> Vec<JobSummary> {
        serde_json::from_str::<SearchPayload>(body).unwrap().into_jobs()
    }

    fn client_for(server: &MockServer) -> JobApiClient {
        let base = Url::parse(&format!("{}/api", server.uri())).unwrap();
        JobApiClient::new(base, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_search_url_encodes_query() {
        let base = Url::parse("http://localhost:5000/api").unwrap();
        let client = JobApiClient::new(base, Duration::from_secs(5)).unwrap();

        let url = client.search_url(&SearchQuery::new("Data Analyst", "Mumbai"));
        assert_eq!(
            url.as_str(),
            "http://localhost:5000/api/jobs?keywords=Data+Analyst&location=Mumbai"
        );

        let url = client.search_url(&SearchQuery::new("", " "));
        assert_eq!(url.as_str(), "http://localhost:5000/api/jobs");
    }

    #[test]
    fn test_details_url_escapes_id() {
        let base = Url::parse("http://localhost:5000/api").unwrap();
        let client = JobApiClient::new(base, Duration::from_secs(5)).unwrap();

        assert_eq!(
            client.details_url("42").as_str(),
            "http://localhost:5000/api/jobs/42"
        );
        assert_eq!(
            client.details_url("a/b c").as_str(),
            "http://localhost:5000/api/jobs/a%2Fb%20c"
        );
    }

    #[test]
    fn test_bare_array_keeps_order() {
        let jobs = decode_search(
            r#"[{"title": "A", "company": "X", "location": "Pune", "link": "https://a"},
                {"title": "B", "company": "Y", "location": "Delhi", "link": "https://b"}]"#,
        );
        let titles: Vec<&str> = jobs.iter().map(|j| j.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B"]);
        assert_eq!(jobs[0].id.as_deref(), Some("https://a"));
        assert_eq!(jobs[0].url.as_deref(), Some("https://a"));
    }

    #[test]
    fn test_wrapped_results() {
        let jobs = decode_search(
            r#"{"results": [{"jobId": 1, "jobTitle": "Analyst", "employerName": "Acme", "locationName": "Mumbai"},
                            {"jobId": "2", "jobTitle": "Engineer"}], "totalResults": 2}"#,
        );
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].id.as_deref(), Some("1"));
        assert_eq!(jobs[0].title, "Analyst");
        assert_eq!(jobs[0].company, "Acme");
        assert_eq!(jobs[0].location, "Mumbai");
        assert_eq!(jobs[1].id.as_deref(), Some("2"));
        assert_eq!(jobs[1].company, "");
    }

    #[test]
    fn test_unrecognized_shapes_are_empty() {
        assert!(decode_search("{}").is_empty());
        assert!(decode_search(r#"{"results": "nope"}"#).is_empty());
        assert!(decode_search("42").is_empty());
        assert!(decode_search("null").is_empty());
        assert!(decode_search("[1, 2, 3]").is_empty());
    }

    #[test]
    fn test_odd_field_types_only_affect_their_entry() {
        let jobs = decode_search(
            r#"[{"title": "A", "company": "X", "location": "Pune", "id": "1"},
                {"title": "B", "company": "Y", "location": "Delhi", "id": true},
                {"title": "C", "company": {"name": "Z"}, "location": "Goa", "jobId": 3},
                "not a job"]"#,
        );
        let titles: Vec<&str> = jobs.iter().map(|j| j.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
        assert_eq!(jobs[1].id, None);
        assert_eq!(jobs[1].company, "Y");
        assert_eq!(jobs[2].company, "");
        assert_eq!(jobs[2].id.as_deref(), Some("3"));

        let wrapped = decode_search(r#"{"results": [{"title": "A", "location": 7}, {"title": "B"}]}"#);
        assert_eq!(wrapped.len(), 2);
        assert_eq!(wrapped[0].location, "");
    }

    #[test]
    fn test_blank_id_falls_through_to_next_alias() {
        let jobs = decode_search(r#"[{"id": "", "link": " ", "jobId": "5", "title": "A"}]"#);
        assert_eq!(jobs[0].id.as_deref(), Some("5"));
        assert_eq!(jobs[0].url, None);

        let details = decode_details(r#"{"id": "", "jobId": 5, "title": "A"}"#).unwrap();
        assert_eq!(details.id.as_deref(), Some("5"));
    }

    #[test]
    fn test_summary_without_id_has_none() {
        let jobs = decode_search(r#"[{"title": "Anonymous"}]"#);
        assert_eq!(jobs[0].id, None);
        assert_eq!(jobs[0].key(0), "#1");
    }

    #[test]
    fn test_decode_details_full_record() {
        let details = decode_details(
            &json!({
                "jobId": 55,
                "jobTitle": "Analyst",
                "employerName": "Acme",
                "locationName": "Mumbai",
                "jobDescription": "<p>desc</p>",
                "minimumSalary": 30000.0,
                "maximumSalary": 40000,
                "currency": "GBP",
                "salaryType": "per annum",
                "contractType": "permanent",
                "jobType": "full_time",
                "externalUrl": "https://acme.example/apply",
                "jobUrl": "https://board.example/jobs/55"
            })
            .to_string(),
        )
        .unwrap();

        assert_eq!(details.id.as_deref(), Some("55"));
        assert_eq!(details.title, "Analyst");
        assert_eq!(details.description.as_deref(), Some("<p>desc</p>"));
        assert_eq!(details.salary.min, Some(30000.0));
        assert_eq!(details.salary.max, Some(40000.0));
        assert_eq!(details.contract_type.as_deref(), Some("permanent"));
        assert_eq!(details.apply_url(), Some("https://acme.example/apply"));
    }

    #[test]
    fn test_decode_details_rejects_non_objects() {
        assert!(matches!(decode_details("not json"), Err(ApiError::Decode(_))));
        assert!(matches!(decode_details("[]"), Err(ApiError::Decode(_))));
        assert!(matches!(
            decode_details(r#"{"minimumSalary": "lots"}"#),
            Err(ApiError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_search_issues_one_encoded_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/jobs"))
            .and(query_param("keywords", "Data Analyst"))
            .and(query_param("location", "Mumbai"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"title": "Analyst", "company": "Acme", "location": "Mumbai", "link": "https://x"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let jobs = client
            .search(&SearchQuery::new("Data Analyst", "Mumbai"))
            .await
            .unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].company, "Acme");
    }

    #[tokio::test]
    async fn test_search_non_success_is_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/jobs"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .search(&SearchQuery::new("rust", "Pune"))
            .await
            .unwrap_err();
        assert!(err.is_network());
        assert!(err.to_string().starts_with("Failed to fetch jobs"));
    }

    #[tokio::test]
    async fn test_search_unparseable_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/jobs"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .search(&SearchQuery::new("rust", "Pune"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
        assert_eq!(err.to_string(), "Invalid response from server");
    }

    #[tokio::test]
    async fn test_job_details_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/jobs/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jobTitle": "Analyst",
                "employerName": "Acme",
                "locationName": "Mumbai",
                "jobDescription": "<p>desc</p>",
                "jobUrl": "http://x"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let details = client_for(&server).job_details("1").await.unwrap();
        assert_eq!(details.title, "Analyst");
        assert_eq!(details.apply_url(), Some("http://x"));
    }

    #[tokio::test]
    async fn test_job_details_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/jobs/404"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client_for(&server).job_details("404").await.unwrap_err();
        assert!(matches!(err, ApiError::Status { .. }));
        assert!(err.to_string().starts_with("Failed to fetch job details"));
    }
}
