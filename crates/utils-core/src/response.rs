use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Envelope for every API response.
#[derive(Debug, Serialize, Deserialize, TS)]
pub struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            message: Some(message.into()),
        }
    }

    pub fn error(message: &str) -> Self {
        ApiResponse {
            success: false,
            data: None,
            message: Some(message.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ApiResponse;

    #[test]
    fn error_envelope_has_no_data() {
        let value = serde_json::to_value(ApiResponse::<()>::error("Task not found")).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "success": false, "data": null, "message": "Task not found" })
        );
    }

    #[test]
    fn success_envelope_carries_data() {
        let value = serde_json::to_value(ApiResponse::success_with_message(3, "done")).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "success": true, "data": 3, "message": "done" })
        );
    }
}
