use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct InterestsResponse {
    /// Alphabetical.
    pub interests: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct PutInterestsRequest {
    pub interests: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SavedResponse {
    pub saved: usize,
}
