use serde::Deserialize;
use utoipa::IntoParams;

/// Identifies the owning/subscribing user for a relay endpoint. Missing
/// `userId` is a request-shape error and rejects with 400 before any state
/// is touched.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct UserParams {
    pub user_id: String,
}

/// Query parameters for the recent-events endpoint.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct RecentEventsParams {
    pub user_id: String,
    /// Cursor in milliseconds since the epoch; only events strictly newer
    /// are returned. Defaults to 0 (everything retained).
    #[serde(default)]
    pub since: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_params_use_the_wire_field_name() {
        let params: UserParams = serde_json::from_str(r#"{"userId":"u1"}"#).unwrap();
        assert_eq!(params.user_id, "u1");

        assert!(serde_json::from_str::<UserParams>(r#"{"user_id":"u1"}"#).is_err());
    }

    #[test]
    fn since_defaults_to_zero() {
        let params: RecentEventsParams = serde_json::from_str(r#"{"userId":"u1"}"#).unwrap();
        assert_eq!(params.since, 0);
    }
}
