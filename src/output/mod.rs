//! Output formatting for cluster resource listings

use crate::config::OutputFormat;
use crate::query::Listing;
use serde_json::Value;

/// Render a listing in the requested format
pub fn render_listing(listing: &Listing, format: OutputFormat) -> String {
    match format {
        OutputFormat::Wide => format_wide(listing),
        OutputFormat::Json => serde_json::to_string_pretty(&listing.items)
            .unwrap_or_else(|e| format!("<unserializable listing: {e}>")),
        OutputFormat::Yaml => {
            if listing.is_empty() {
                return "[]".to_string();
            }
            serde_yaml::to_string(&listing.items)
                .map(|s| s.trim_end().to_string())
                .unwrap_or_else(|e| format!("<unserializable listing: {e}>"))
        }
    }
}

/// Render a cloud document (pretty JSON, or YAML when asked for)
pub fn render_document(doc: &Value, format: OutputFormat) -> String {
    let rendered = match format {
        OutputFormat::Yaml => serde_yaml::to_string(doc).map_err(|e| e.to_string()),
        _ => serde_json::to_string_pretty(doc).map_err(|e| e.to_string()),
    };
    match rendered {
        Ok(s) => s.trim_end().to_string(),
        Err(e) => format!("<unserializable document: {e}>"),
    }
}

/// Wide table with kind-specific columns
pub fn format_wide(listing: &Listing) -> String {
    if listing.is_empty() {
        return "No resources found".to_string();
    }

    let columns = columns_for(&listing.kind);
    let headers: Vec<&str> = columns.iter().map(|(h, _)| *h).collect();
    let rows: Vec<Vec<String>> = listing
        .items
        .iter()
        .map(|item| columns.iter().map(|(_, extract)| extract(item)).collect())
        .collect();

    format_table_raw(&headers, &rows)
}

/// Format raw headers and rows as a table
pub fn format_table_raw(headers: &[&str], rows: &[Vec<String>]) -> String {
    let num_cols = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();

    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < num_cols {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let mut output = String::new();

    let mut header_line = String::new();
    for (i, header) in headers.iter().enumerate() {
        let padding = widths[i].saturating_sub(header.len());
        header_line.push_str(header);
        header_line.push_str(&" ".repeat(padding + 2));
    }
    output.push_str(header_line.trim_end());
    output.push('\n');

    for row in rows {
        let mut line = String::new();
        for (i, cell) in row.iter().enumerate() {
            if i < num_cols {
                let padding = widths[i].saturating_sub(cell.chars().count());
                line.push_str(cell);
                line.push_str(&" ".repeat(padding + 2));
            }
        }
        output.push_str(line.trim_end());
        output.push('\n');
    }

    output.trim_end().to_string()
}

type Extractor = fn(&Value) -> String;

fn col(header: &'static str, extract: Extractor) -> (&'static str, Extractor) {
    (header, extract)
}

fn columns_for(kind: &str) -> Vec<(&'static str, Extractor)> {
    match kind {
        "pods" => vec![
            col("NAME", name),
            col("READY", pod_ready),
            col("STATUS", pod_status),
            col("RESTARTS", pod_restarts),
            col("AGE", age),
            col("IP", |v| str_at(v, "/status/podIP")),
            col("NODE", |v| str_at(v, "/spec/nodeName")),
        ],
        "deployments" | "statefulsets" | "replicasets" => vec![
            col("NAME", name),
            col("READY", |v| {
                format!(
                    "{}/{}",
                    int_at(v, "/status/readyReplicas"),
                    int_at(v, "/spec/replicas")
                )
            }),
            col("AGE", age),
            col("LABELS", labels),
        ],
        "daemonsets" => vec![
            col("NAME", name),
            col("DESIRED", |v| int_at(v, "/status/desiredNumberScheduled").to_string()),
            col("READY", |v| int_at(v, "/status/numberReady").to_string()),
            col("AGE", age),
        ],
        "services" => vec![
            col("NAME", name),
            col("TYPE", |v| str_at(v, "/spec/type")),
            col("CLUSTER-IP", |v| str_at(v, "/spec/clusterIP")),
            col("PORTS", service_ports),
            col("AGE", age),
        ],
        "persistentvolumeclaims" => vec![
            col("NAME", name),
            col("STATUS", |v| str_at(v, "/status/phase")),
            col("VOLUME", |v| str_at(v, "/spec/volumeName")),
            col("CAPACITY", |v| str_at(v, "/status/capacity/storage")),
            col("STORAGECLASS", |v| str_at(v, "/spec/storageClassName")),
            col("AGE", age),
        ],
        "jobs" => vec![
            col("NAME", name),
            col("SUCCEEDED", |v| int_at(v, "/status/succeeded").to_string()),
            col("FAILED", |v| int_at(v, "/status/failed").to_string()),
            col("AGE", age),
        ],
        "events" => vec![
            col("LAST SEEN", |v| str_at(v, "/lastTimestamp")),
            col("TYPE", |v| str_at(v, "/type")),
            col("REASON", |v| str_at(v, "/reason")),
            col("OBJECT", |v| {
                format!(
                    "{}/{}",
                    str_at(v, "/involvedObject/kind").to_lowercase(),
                    str_at(v, "/involvedObject/name")
                )
            }),
            col("MESSAGE", |v| str_at(v, "/message")),
        ],
        "releases" => vec![
            col("NAME", name),
            col("NAMESPACE", |v| str_at(v, "/metadata/namespace")),
            col("REVISION", |v| int_at(v, "/revision").to_string()),
            col("STATUS", |v| str_at(v, "/status")),
            col("UPDATED", |v| str_at(v, "/modifiedAt")),
        ],
        _ => vec![col("NAME", name), col("AGE", age), col("LABELS", labels)],
    }
}

fn str_at(v: &Value, pointer: &str) -> String {
    match v.pointer(pointer) {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => "<none>".to_string(),
    }
}

fn int_at(v: &Value, pointer: &str) -> i64 {
    v.pointer(pointer).and_then(Value::as_i64).unwrap_or(0)
}

fn name(v: &Value) -> String {
    str_at(v, "/metadata/name")
}

fn age(v: &Value) -> String {
    v.pointer("/metadata/creationTimestamp")
        .and_then(Value::as_str)
        .and_then(|ts| chrono::DateTime::parse_from_rfc3339(ts).ok())
        .map(|ts| humanize_duration(ts.with_timezone(&chrono::Utc)))
        .unwrap_or_else(|| "<unknown>".to_string())
}

fn labels(v: &Value) -> String {
    match v.pointer("/metadata/labels").and_then(Value::as_object) {
        Some(map) if !map.is_empty() => map
            .iter()
            .map(|(k, v)| format!("{}={}", k, v.as_str().unwrap_or_default()))
            .collect::<Vec<_>>()
            .join(","),
        _ => "<none>".to_string(),
    }
}

fn container_statuses(v: &Value) -> &[Value] {
    v.pointer("/status/containerStatuses")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn pod_ready(v: &Value) -> String {
    let statuses = container_statuses(v);
    let ready = statuses
        .iter()
        .filter(|s| s.get("ready").and_then(Value::as_bool).unwrap_or(false))
        .count();
    let total = v
        .pointer("/spec/containers")
        .and_then(Value::as_array)
        .map(Vec::len)
        .unwrap_or(statuses.len());
    format!("{}/{}", ready, total)
}

/// Waiting reason of the first stuck container, else the pod phase
fn pod_status(v: &Value) -> String {
    container_statuses(v)
        .iter()
        .find_map(|s| s.pointer("/state/waiting/reason").and_then(Value::as_str))
        .map(String::from)
        .unwrap_or_else(|| str_at(v, "/status/phase"))
}

fn pod_restarts(v: &Value) -> String {
    container_statuses(v)
        .iter()
        .filter_map(|s| s.get("restartCount").and_then(Value::as_i64))
        .sum::<i64>()
        .to_string()
}

fn service_ports(v: &Value) -> String {
    match v.pointer("/spec/ports").and_then(Value::as_array) {
        Some(ports) if !ports.is_empty() => ports
            .iter()
            .map(|p| {
                format!(
                    "{}/{}",
                    int_at(p, "/port"),
                    p.get("protocol").and_then(Value::as_str).unwrap_or("TCP")
                )
            })
            .collect::<Vec<_>>()
            .join(","),
        _ => "<none>".to_string(),
    }
}

/// Convert a chrono DateTime to a human-readable duration string
pub fn humanize_duration(time: chrono::DateTime<chrono::Utc>) -> String {
    let now = chrono::Utc::now();
    let duration = now.signed_duration_since(time);

    if duration.num_days() > 0 {
        format!("{}d", duration.num_days())
    } else if duration.num_hours() > 0 {
        format!("{}h", duration.num_hours())
    } else if duration.num_minutes() > 0 {
        format!("{}m", duration.num_minutes())
    } else {
        format!("{}s", duration.num_seconds().max(0))
    }
}
