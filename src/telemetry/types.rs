use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UnitSystem {
    Imperial,
    Metric,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: u64,
    pub pad_id: u64,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
    pub updated_by: String,
    pub active: bool,
    pub timezone: String,
    pub unit_system: UnitSystem,
    pub share: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobState {
    Running,
    Completed,
    Paused,
    Stopped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: u64,
    pub project_id: u64,
    pub job: JobDefinition,
    pub created_at: String,
    pub updated_at: String,
    pub updated_by: String,
    pub state: JobState,
    pub job_type: String,
    pub share: bool,
}

/// Acquisition setup of a job: where readings come from and how they are published.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDefinition {
    #[serde(default)]
    pub consumer: Vec<Consumer>,
    pub publisher: Publisher,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consumer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adc: Option<Vec<AdcChannel>>,
    pub device: Device,
    pub transform: Transform,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub pressure_units: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdcChannel {
    #[serde(rename = "in")]
    pub input: String,
    #[serde(rename = "out")]
    pub output: String,
    pub channel: u32,
    pub serial_number: String,
    #[serde(rename = "4mA")]
    pub four_ma: f64,
    #[serde(rename = "20mA")]
    pub twenty_ma: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub baudrate: u32,
    #[serde(rename = "port_name")]
    pub port_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transform {
    pub headers: Vec<String>,
    pub encoding: String,
    pub delimiters: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Publisher {
    pub name: String,
    pub stage: String,
    pub well_name: String,
    pub environment: String,
    pub empty_timeseries_strategy: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyItem {
    pub title: String,
    pub to: HierarchyTarget,
    pub asset_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HierarchyTarget {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<HashMap<String, u64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeseriesChannel {
    pub name: String,
    pub unit: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub y_axis: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeseriesMetadata {
    pub job_id: u64,
    pub channels: Vec<TimeseriesChannel>,
}

/// One sample: a timestamp plus a value per requested channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeseriesDataPoint {
    pub timestamp: i64,
    #[serde(flatten)]
    pub values: HashMap<String, Option<f64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeseriesDataResponse {
    pub job_id: u64,
    pub data: Vec<TimeseriesDataPoint>,
}
