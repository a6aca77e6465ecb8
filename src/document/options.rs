use serde::{Deserialize, Serialize};

/// Processing configuration snapshot attached to a document at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingOptions {
    pub enable_ocr: bool,
    pub enable_summarization: bool,
    pub enable_classification: bool,
    pub enable_entity_extraction: bool,
    pub enable_sentiment_analysis: bool,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub max_summary_length: usize,
    pub extract_images: bool,
    pub preserve_layout: bool,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            enable_ocr: true,
            enable_summarization: true,
            enable_classification: true,
            enable_entity_extraction: true,
            enable_sentiment_analysis: true,
            chunk_size: 1000,
            chunk_overlap: 200,
            max_summary_length: 500,
            extract_images: false,
            preserve_layout: true,
        }
    }
}
