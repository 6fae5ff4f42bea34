use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct DeleteManyRequest {
    #[serde(default)]
    pub ids: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct DeleteManyResponse {
    pub message: String,
    pub deleted: u64,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
