//! AWS cloud-resource status routine
//!
//! Issues a fixed, ordered sequence of cloud queries for the cluster: the
//! EKS cluster, its RDS database, its EFS filesystem and the load balancers
//! tagged as belonging to it.

use crate::context::ClusterContext;
use crate::error::QueryError;
use crate::query::CloudQuery;
use crate::report::CollectionReport;
use serde_json::{json, Value};

/// Tag key prefix marking load balancers owned by a cluster
const CLUSTER_TAG_PREFIX: &str = "kubernetes.io/cluster/";

pub async fn collect_aws_status(
    cloud: &dyn CloudQuery,
    context: &ClusterContext,
    report: &mut CollectionReport,
) {
    let Some(cluster_id) = context.cluster_id() else {
        return;
    };

    report.push_cloud(
        "aws::eks",
        cloud
            .query("eks", "describe-cluster", &json!({ "name": cluster_id }))
            .await,
    );
    report.push_cloud(
        "aws::rds",
        cloud
            .query(
                "rds",
                "describe-db-instances",
                &json!({ "db-instance-identifier": cluster_id }),
            )
            .await,
    );
    report.push_cloud(
        "aws::efs",
        cloud
            .query(
                "efs",
                "describe-file-systems",
                &json!({ "creation-token": cluster_id }),
            )
            .await,
    );

    let owner = context.provisioner_or_cluster_id().unwrap_or(cluster_id);
    report.push_cloud("aws::elb", cluster_load_balancers(cloud, owner).await);
}

/// Load balancers carrying the `kubernetes.io/cluster/{owner}` tag
async fn cluster_load_balancers(cloud: &dyn CloudQuery, owner: &str) -> Result<Value, QueryError> {
    let listing = cloud
        .query("elbv2", "describe-load-balancers", &json!({}))
        .await?;
    let load_balancers: Vec<Value> = listing
        .get("loadBalancers")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let arns: Vec<&str> = load_balancers
        .iter()
        .filter_map(|lb| lb.get("loadBalancerArn").and_then(Value::as_str))
        .collect();
    if arns.is_empty() {
        return Ok(json!({ "loadBalancers": [] }));
    }

    let tags = cloud
        .query("elbv2", "describe-tags", &json!({ "resource-arns": arns }))
        .await?;

    let wanted = format!("{}{}", CLUSTER_TAG_PREFIX, owner);
    let owned: Vec<&str> = tags
        .get("tagDescriptions")
        .and_then(Value::as_array)
        .map(|descs| {
            descs
                .iter()
                .filter(|d| has_tag_key(d, &wanted))
                .filter_map(|d| d.get("resourceArn").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    let matched: Vec<Value> = load_balancers
        .iter()
        .filter(|lb| {
            lb.get("loadBalancerArn")
                .and_then(Value::as_str)
                .is_some_and(|arn| owned.contains(&arn))
        })
        .cloned()
        .collect();

    Ok(json!({ "loadBalancers": matched }))
}

fn has_tag_key(description: &Value, key: &str) -> bool {
    description
        .get("tags")
        .and_then(Value::as_array)
        .is_some_and(|tags| {
            tags.iter()
                .any(|t| t.get("key").and_then(Value::as_str) == Some(key))
        })
}
