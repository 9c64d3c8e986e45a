use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchQuery {
    pub keywords: String,
    pub location: String,
}

impl SearchQuery {
    pub fn new(keywords: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            keywords: keywords.into(),
            location: location.into(),
        }
    }

    /// Both fields are required once surrounding whitespace is dropped.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.keywords.trim().is_empty() || self.location.trim().is_empty() {
            return Err(ValidationError::MissingField);
        }
        Ok(())
    }

    /// Query-string pairs for the non-empty fields, trimmed.
    pub fn params(&self) -> Vec<(&'static str, &str)> {
        [("keywords", self.keywords.trim()), ("location", self.location.trim())]
            .into_iter()
            .filter(|(_, value)| !value.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: Option<String>, // from "id", "link" or "jobId"
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: Option<String>, // only present on self-contained results
    pub url: Option<String>,
}

impl JobSummary {
    /// Row key: the id when the backend sent one, otherwise the position.
    pub fn key(&self, index: usize) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => format!("#{}", index + 1),
        }
    }

    pub fn has_description(&self) -> bool {
        self.description
            .as_deref()
            .is_some_and(|text| !text.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalaryRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub currency: Option<String>,
    pub period: Option<String>, // "per annum", "per hour", ...
}

impl SalaryRange {
    pub fn display(&self) -> Option<String> {
        let amount = |value: f64| match self.currency.as_deref() {
            Some(currency) if !currency.is_empty() => format!("{} {}", currency, format_amount(value)),
            _ => format_amount(value),
        };
        let range = match (self.min, self.max) {
            (Some(min), Some(max)) if min == max => amount(min),
            (Some(min), Some(max)) => format!("{} - {}", amount(min), amount(max)),
            (Some(min), None) => format!("{}+", amount(min)),
            (None, Some(max)) => format!("up to {}", amount(max)),
            (None, None) => return None,
        };
        match self.period.as_deref() {
            Some(period) if !period.is_empty() => Some(format!("{} {}", range, period)),
            _ => Some(range),
        }
    }
}

fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobDetails {
    pub id: Option<String>,
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: Option<String>, // plain text or HTML, as sent
    pub salary: SalaryRange,
    pub contract_type: Option<String>,
    pub job_type: Option<String>,
    pub external_url: Option<String>,
    pub job_url: Option<String>,
}

impl JobDetails {
    /// Details for a summary that already carries its description.
    pub fn from_summary(summary: &JobSummary) -> Self {
        Self {
            id: summary.id.clone(),
            title: summary.title.clone(),
            company: summary.company.clone(),
            location: summary.location.clone(),
            description: summary.description.clone(),
            job_url: summary.url.clone(),
            ..Default::default()
        }
    }

    /// Where "apply" points: the employer's own page first, then the listing.
    pub fn apply_url(&self) -> Option<&str> {
        [self.external_url.as_deref(), self.job_url.as_deref()]
            .into_iter()
            .flatten()
            .find(|url| !url.trim().is_empty())
    }
}
