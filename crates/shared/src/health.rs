//! # ヘルスチェック

use serde::Serialize;

/// `GET /health` のレスポンス
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status:  String,
    pub version: String,
}

impl HealthResponse {
    /// 稼働中を示すレスポンス
    ///
    /// ```
    /// use courier_shared::HealthResponse;
    ///
    /// let response = HealthResponse::healthy("0.1.0");
    /// assert_eq!(response.status, "healthy");
    /// ```
    pub fn healthy(version: impl Into<String>) -> Self {
        Self {
            status:  "healthy".to_string(),
            version: version.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_healthyはstatusとversionをjsonに出力する() {
        let json = serde_json::to_value(HealthResponse::healthy("1.2.3")).unwrap();

        assert_eq!(json, serde_json::json!({ "status": "healthy", "version": "1.2.3" }));
    }
}
