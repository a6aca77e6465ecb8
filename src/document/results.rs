//! Result records attached to a document by downstream analysis stages.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedEntity {
    pub text: String,
    /// PERSON, ORGANIZATION, LOCATION, DATE, ...
    pub label: String,
    pub confidence: f32,
    pub start_pos: usize,
    pub end_pos: usize,
    pub context: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    /// positive, negative or neutral
    pub sentiment: String,
    pub confidence: f32,
    pub scores: BTreeMap<String, f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub short_summary: String,
    pub detailed_summary: String,
    pub key_points: Vec<String>,
    pub topics: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<SentimentResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub model_used: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    pub confidence: f32,
    pub categories: BTreeMap<String, f32>,
    #[serde(default)]
    pub tags: Vec<String>,
}
