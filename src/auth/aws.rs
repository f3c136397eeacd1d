//! STS-backed credential exchange

use super::{AssumeRoleRequest, CredentialExchange};
use crate::error::{DiagError, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use serde_json::{json, Value};

/// Assumes roles with the ambient long-lived credentials (environment,
/// shared config, instance profile).
pub struct StsExchange {
    sts: aws_sdk_sts::Client,
}

impl StsExchange {
    pub async fn new(region: Option<&str>, profile: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(aws_config::Region::new(region.to_string()));
        }
        if let Some(profile) = profile {
            loader = loader.profile_name(profile);
        }
        let config = loader.load().await;

        Self {
            sts: aws_sdk_sts::Client::new(&config),
        }
    }
}

#[async_trait]
impl CredentialExchange for StsExchange {
    async fn assume_role(&self, request: &AssumeRoleRequest) -> Result<Value> {
        let response = self
            .sts
            .assume_role()
            .role_arn(&request.role_arn)
            .role_session_name(&request.session_name)
            .duration_seconds(request.duration_secs)
            .send()
            .await
            .map_err(|e| DiagError::Auth(format!("{}: {}", request.role_arn, e.into_service_error())))?;

        let creds = response
            .credentials()
            .ok_or_else(|| DiagError::Auth("STS response contained no credentials".to_string()))?;

        let expiration = chrono::DateTime::from_timestamp(creds.expiration().secs(), 0)
            .ok_or_else(|| DiagError::Auth("STS returned an invalid expiration".to_string()))?;

        let mut doc = json!({
            "Credentials": {
                "AccessKeyId": creds.access_key_id(),
                "SecretAccessKey": creds.secret_access_key(),
                "SessionToken": creds.session_token(),
                "Expiration": expiration.to_rfc3339(),
            }
        });
        if let Some(user) = response.assumed_role_user() {
            doc["AssumedRoleUser"] = json!({
                "AssumedRoleId": user.assumed_role_id(),
                "Arn": user.arn(),
            });
        }

        Ok(doc)
    }
}
