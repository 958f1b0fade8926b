//! HTML and record fixtures.

use chrono::{DateTime, Utc};

use crate::models::{
    JobSummary, Recency, SearchParameters, SearchSession, NOT_AVAILABLE, NOT_SPECIFIED,
};

/// Fields for one search result card.
#[derive(Debug, Clone, Default)]
pub struct CardSpec {
    title: String,
    href: String,
    company: Option<String>,
    location: Option<String>,
    salary: Option<String>,
    recency: Option<String>,
    id: Option<String>,
}

impl CardSpec {
    /// A card with only the required title and link.
    #[must_use]
    pub fn new(title: &str, href: &str) -> Self {
        Self {
            title: title.to_string(),
            href: href.to_string(),
            ..Default::default()
        }
    }

    /// Sets the company.
    #[must_use]
    pub fn company(mut self, company: &str) -> Self {
        self.company = Some(company.to_string());
        self
    }

    /// Sets the location.
    #[must_use]
    pub fn location(mut self, location: &str) -> Self {
        self.location = Some(location.to_string());
        self
    }

    /// Sets the salary.
    #[must_use]
    pub fn salary(mut self, salary: &str) -> Self {
        self.salary = Some(salary.to_string());
        self
    }

    /// Sets the posting age.
    #[must_use]
    pub fn recency(mut self, recency: &str) -> Self {
        self.recency = Some(recency.to_string());
        self
    }

    /// Sets an explicit `data-job-id`.
    #[must_use]
    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }
}

fn optional_span(testid: &str, value: Option<&String>) -> String {
    value
        .map(|v| format!(r#"<span data-testid="{testid}">{v}</span>"#))
        .unwrap_or_default()
}

/// Renders a card in the primary listing markup.
#[must_use]
pub fn listing_card(card: &CardSpec) -> String {
    let id_attr = card
        .id
        .as_ref()
        .map(|id| format!(r#" data-job-id="{id}""#))
        .unwrap_or_default();
    format!(
        r#"<article data-testid="JobCard"{id_attr}>
  <h3><a data-testid="jobTitle" href="{href}">{title}</a></h3>
  {company}{location}{salary}{recency}
</article>"#,
        href = card.href,
        title = card.title,
        company = optional_span("company", card.company.as_ref()),
        location = optional_span("jobDetailLocation", card.location.as_ref()),
        salary = optional_span("jobDetailSalary", card.salary.as_ref()),
        recency = optional_span("jobDetailDateRecency", card.recency.as_ref()),
    )
}

/// Wraps cards in a results page.
#[must_use]
pub fn listing_page(cards: &[String]) -> String {
    format!(
        "<!DOCTYPE html><html><head><title>Jobs</title></head><body>\
         <div id=\"card-scroll-container\">{}</div></body></html>",
        cards.join("\n")
    )
}

/// Fields for a job detail page.
#[derive(Debug, Clone, Default)]
pub struct DetailSpec {
    title: String,
    company: Option<String>,
    location: Option<String>,
    salary: Option<String>,
    job_type: Option<String>,
    requirements: Vec<String>,
    body: String,
}

impl DetailSpec {
    /// A detail page with a title and a short body.
    #[must_use]
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            body: format!("We are hiring a {title}."),
            ..Default::default()
        }
    }

    /// Sets the company.
    #[must_use]
    pub fn company(mut self, company: &str) -> Self {
        self.company = Some(company.to_string());
        self
    }

    /// Sets the location.
    #[must_use]
    pub fn location(mut self, location: &str) -> Self {
        self.location = Some(location.to_string());
        self
    }

    /// Sets the salary.
    #[must_use]
    pub fn salary(mut self, salary: &str) -> Self {
        self.salary = Some(salary.to_string());
        self
    }

    /// Sets the employment type.
    #[must_use]
    pub fn job_type(mut self, job_type: &str) -> Self {
        self.job_type = Some(job_type.to_string());
        self
    }

    /// Adds a requirement bullet.
    #[must_use]
    pub fn requirement(mut self, requirement: &str) -> Self {
        self.requirements.push(requirement.to_string());
        self
    }

    /// Sets the description body.
    #[must_use]
    pub fn body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }
}

/// Renders a detail page: header outside the description container,
/// body and requirements inside it.
#[must_use]
pub fn detail_page(page: &DetailSpec) -> String {
    let requirements = if page.requirements.is_empty() {
        String::new()
    } else {
        let items: String = page
            .requirements
            .iter()
            .map(|r| format!("<li>{r}</li>"))
            .collect();
        format!(r#"<ul data-testid="jobRequirements">{items}</ul>"#)
    };
    format!(
        r#"<!DOCTYPE html><html><body>
<header>
  <h1>{title}</h1>
  {company}{location}{salary}{job_type}
</header>
<div data-testid="job-description"><p>{body}</p>{requirements}</div>
</body></html>"#,
        title = page.title,
        company = optional_span("jobHeaderCompanyName", page.company.as_ref()),
        location = optional_span("jobDetailLocation", page.location.as_ref()),
        salary = optional_span("jobDetailSalary", page.salary.as_ref()),
        job_type = optional_span("jobDetailJobType", page.job_type.as_ref()),
        body = page.body,
    )
}

/// A summary with predictable fields for sequence number `n`.
#[must_use]
pub fn sample_summary(n: u32) -> JobSummary {
    let title = format!("Job {n}");
    let company = format!("Company {n}");
    let location = NOT_AVAILABLE.to_string();
    JobSummary {
        sequence_number: n,
        external_id: Some(format!("job-{n}")),
        description: JobSummary::describe(&title, &company, &location, NOT_SPECIFIED, "today"),
        title,
        company,
        location,
        salary: NOT_SPECIFIED.to_string(),
        recency: "today".to_string(),
        source_url: format!("https://jobs.example.com/job/{n}"),
    }
}

/// A session `id` holding `count` jobs whose external ids are `{id}-job-{n}`.
#[must_use]
pub fn sample_session(id: &str, count: u32, created_at: DateTime<Utc>) -> SearchSession {
    let jobs = (1..=count)
        .map(|n| JobSummary {
            external_id: Some(format!("{id}-job-{n}")),
            source_url: format!("https://jobs.example.com/{id}/job/{n}"),
            ..sample_summary(n)
        })
        .collect();
    SearchSession {
        session_id: id.to_string(),
        created_at,
        parameters: SearchParameters {
            job_title: "sample".to_string(),
            location: "anywhere".to_string(),
            radius_miles: 5,
            recency: Recency::LastWeek,
        },
        search_url: "https://jobs.example.com/search?q=sample".to_string(),
        jobs,
    }
}
