//! Domain types for CircleCI workflows.
//!
//! The query API names fields in kebab-case (`created-at`) while REST v2
//! uses snake_case (`created_at`); both spellings deserialize, and values
//! always serialize in snake_case. Fields the server sends that are not
//! modelled here are kept in `extra` so re-encoding loses nothing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Status of a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Success,
    Running,
    #[serde(alias = "not-run")]
    NotRun,
    Failed,
    Error,
    Failing,
    #[serde(alias = "on-hold")]
    OnHold,
    Canceled,
    Unauthorized,
    #[serde(other)]
    Unknown,
}

/// A workflow and the jobs it ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: Uuid,
    pub name: String,
    pub status: WorkflowStatus,
    #[serde(alias = "created-at")]
    pub created_at: DateTime<Utc>,
    #[serde(default, alias = "stopped-at", skip_serializing_if = "Option::is_none")]
    pub stopped_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "pipeline-id", skip_serializing_if = "Option::is_none")]
    pub pipeline_id: Option<Uuid>,
    #[serde(default, alias = "pipeline-number", skip_serializing_if = "Option::is_none")]
    pub pipeline_number: Option<i64>,
    #[serde(default, alias = "project-slug", skip_serializing_if = "Option::is_none")]
    pub project_slug: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub jobs: Vec<Job>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A job within a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub name: String,
    pub status: String,
    #[serde(default, alias = "job-number", skip_serializing_if = "Option::is_none")]
    pub job_number: Option<i64>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}
