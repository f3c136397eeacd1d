//! AWS implementation of `CloudQuery`
//!
//! SDK responses are converted into JSON documents holding the fields an
//! operator needs for triage.

use super::{with_timeout, CloudQuery};
use crate::auth::CredentialSet;
use crate::error::QueryError;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use serde_json::{json, Value};
use std::time::{Duration, SystemTime};

/// AWS SDK clients used for cloud resource descriptions
pub struct AwsCloudClient {
    eks: aws_sdk_eks::Client,
    rds: aws_sdk_rds::Client,
    efs: aws_sdk_efs::Client,
    elb: aws_sdk_elasticloadbalancingv2::Client,
    timeout: Duration,
}

impl AwsCloudClient {
    /// Build clients from an assumed-role session, or from the ambient
    /// credential chain when there is none.
    pub async fn new(
        session: Option<&CredentialSet>,
        region: Option<&str>,
        profile: Option<&str>,
        timeout: Duration,
    ) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(aws_config::Region::new(region.to_string()));
        }
        if let Some(profile) = profile {
            loader = loader.profile_name(profile);
        }
        if let Some(creds) = session {
            let expiry = SystemTime::UNIX_EPOCH
                + Duration::from_secs(creds.expiration.timestamp().max(0) as u64);
            loader = loader.credentials_provider(Credentials::new(
                creds.access_key_id.clone(),
                creds.secret_access_key.clone(),
                Some(creds.session_token.clone()),
                Some(expiry),
                "dexdiag-session",
            ));
        }
        let config = loader.load().await;

        Self {
            eks: aws_sdk_eks::Client::new(&config),
            rds: aws_sdk_rds::Client::new(&config),
            efs: aws_sdk_efs::Client::new(&config),
            elb: aws_sdk_elasticloadbalancingv2::Client::new(&config),
            timeout,
        }
    }

    async fn describe_cluster(&self, op: &str, params: &Value) -> Result<Value, QueryError> {
        let name = required_str(op, params, "name")?;
        let response = self
            .eks
            .describe_cluster()
            .name(name)
            .send()
            .await
            .map_err(|e| QueryError::cloud(op, e.into_service_error()))?;

        let Some(cluster) = response.cluster() else {
            return Ok(json!({ "cluster": null }));
        };

        Ok(json!({
            "cluster": {
                "name": cluster.name(),
                "arn": cluster.arn(),
                "version": cluster.version(),
                "platformVersion": cluster.platform_version(),
                "status": cluster.status().map(|s| s.as_str()),
                "endpoint": cluster.endpoint(),
                "roleArn": cluster.role_arn(),
                "createdAt": cluster.created_at().map(|t| rfc3339(t.secs())),
                "vpcId": cluster.resources_vpc_config().and_then(|v| v.vpc_id()),
                "endpointPublicAccess": cluster.resources_vpc_config().map(|v| v.endpoint_public_access()),
                "endpointPrivateAccess": cluster.resources_vpc_config().map(|v| v.endpoint_private_access()),
            }
        }))
    }

    async fn describe_db_instances(&self, op: &str, params: &Value) -> Result<Value, QueryError> {
        let mut request = self.rds.describe_db_instances();
        if let Some(id) = params.get("db-instance-identifier").and_then(Value::as_str) {
            request = request.db_instance_identifier(id);
        }
        let response = request
            .send()
            .await
            .map_err(|e| QueryError::cloud(op, e.into_service_error()))?;

        let instances: Vec<Value> = response
            .db_instances()
            .iter()
            .map(|db| {
                json!({
                    "identifier": db.db_instance_identifier(),
                    "class": db.db_instance_class(),
                    "engine": db.engine(),
                    "engineVersion": db.engine_version(),
                    "status": db.db_instance_status(),
                    "endpoint": db.endpoint().and_then(|e| e.address()),
                    "port": db.endpoint().and_then(|e| e.port()),
                    "multiAz": db.multi_az(),
                    "allocatedStorageGb": db.allocated_storage(),
                })
            })
            .collect();

        Ok(json!({ "dbInstances": instances }))
    }

    async fn describe_file_systems(&self, op: &str, params: &Value) -> Result<Value, QueryError> {
        let mut request = self.efs.describe_file_systems();
        if let Some(token) = params.get("creation-token").and_then(Value::as_str) {
            request = request.creation_token(token);
        }
        let response = request
            .send()
            .await
            .map_err(|e| QueryError::cloud(op, e.into_service_error()))?;

        let file_systems: Vec<Value> = response
            .file_systems()
            .iter()
            .map(|fs| {
                json!({
                    "fileSystemId": fs.file_system_id(),
                    "name": fs.name(),
                    "creationToken": fs.creation_token(),
                    "lifeCycleState": fs.life_cycle_state().as_str(),
                    "mountTargets": fs.number_of_mount_targets(),
                    "performanceMode": fs.performance_mode().as_str(),
                    "throughputMode": fs.throughput_mode().map(|m| m.as_str()),
                    "sizeBytes": fs.size_in_bytes().map(|s| s.value()),
                })
            })
            .collect();

        Ok(json!({ "fileSystems": file_systems }))
    }

    async fn describe_load_balancers(&self, op: &str) -> Result<Value, QueryError> {
        let mut load_balancers = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let response = self
                .elb
                .describe_load_balancers()
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|e| QueryError::cloud(op, e.into_service_error()))?;

            for lb in response.load_balancers() {
                load_balancers.push(json!({
                    "loadBalancerArn": lb.load_balancer_arn(),
                    "name": lb.load_balancer_name(),
                    "dnsName": lb.dns_name(),
                    "type": lb.r#type().map(|t| t.as_str()),
                    "scheme": lb.scheme().map(|s| s.as_str()),
                    "state": lb.state().and_then(|s| s.code()).map(|c| c.as_str()),
                    "vpcId": lb.vpc_id(),
                }));
            }

            match response.next_marker() {
                Some(next) if !next.is_empty() => marker = Some(next.to_string()),
                _ => break,
            }
        }

        Ok(json!({ "loadBalancers": load_balancers }))
    }

    async fn describe_tags(&self, op: &str, params: &Value) -> Result<Value, QueryError> {
        let arns = resource_arns(params);

        let mut descriptions = Vec::new();
        for chunk in arns.chunks(TAG_BATCH) {
            let response = self
                .elb
                .describe_tags()
                .set_resource_arns(Some(chunk.to_vec()))
                .send()
                .await
                .map_err(|e| QueryError::cloud(op, e.into_service_error()))?;

            for desc in response.tag_descriptions() {
                let tags: Vec<Value> = desc
                    .tags()
                    .iter()
                    .map(|t| json!({ "key": t.key(), "value": t.value() }))
                    .collect();
                descriptions.push(json!({
                    "resourceArn": desc.resource_arn(),
                    "tags": tags,
                }));
            }
        }

        Ok(json!({ "tagDescriptions": descriptions }))
    }
}

#[async_trait]
impl CloudQuery for AwsCloudClient {
    async fn query(
        &self,
        service: &str,
        operation: &str,
        params: &Value,
    ) -> Result<Value, QueryError> {
        let op = format!("{}:{}", service, operation);
        tracing::debug!(operation = %op, "Cloud query");

        with_timeout(&op, self.timeout, async {
            match (service, operation) {
                ("eks", "describe-cluster") => self.describe_cluster(&op, params).await,
                ("rds", "describe-db-instances") => self.describe_db_instances(&op, params).await,
                ("efs", "describe-file-systems") => self.describe_file_systems(&op, params).await,
                ("elbv2", "describe-load-balancers") => self.describe_load_balancers(&op).await,
                ("elbv2", "describe-tags") => self.describe_tags(&op, params).await,
                _ => Err(QueryError::Unsupported {
                    operation: op.clone(),
                }),
            }
        })
        .await
    }
}

/// The API accepts at most 20 ARNs per describe-tags call
const TAG_BATCH: usize = 20;

fn resource_arns(params: &Value) -> Vec<String> {
    params
        .get("resource-arns")
        .and_then(Value::as_array)
        .map(|a| a.iter().filter_map(Value::as_str).map(String::from).collect())
        .unwrap_or_default()
}

fn required_str<'a>(op: &str, params: &'a Value, key: &str) -> Result<&'a str, QueryError> {
    params
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| QueryError::Malformed {
            operation: op.to_string(),
            message: format!("missing parameter '{}'", key),
        })
}

fn rfc3339(secs: i64) -> Option<String> {
    chrono::DateTime::from_timestamp(secs, 0).map(|t| t.to_rfc3339())
}
