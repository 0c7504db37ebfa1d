//! FHIR Bundle normalization and QR-size optimization.
//!
//! Bundles stay untyped (`serde_json::Value`) end to end: the processor
//! validates structure, never profiles or terminology. The optimization
//! rewrite shrinks a Bundle for QR transport by shortening entry URIs to the
//! `resource:N` scheme and pruning fields that carry no clinical meaning,
//! while preserving names, codes, dates, and references.

use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{HealthCardError, Result};

/// Bundle type required for SMART Health Cards.
pub const BUNDLE_TYPE_COLLECTION: &str = "collection";

/// Validates and normalizes FHIR Bundles for health card issuance.
///
/// The processor is stateless; the input Bundle is never mutated. Every
/// operation returns a deep copy.
#[derive(Debug, Clone, Copy, Default)]
pub struct FhirBundleProcessor;

impl FhirBundleProcessor {
    /// Create a new processor.
    pub fn new() -> Self {
        Self
    }

    /// Validate structure, deep-copy, and default `type` to `"collection"`.
    ///
    /// # Errors
    ///
    /// Returns a `FHIR_VALIDATION_ERROR` if the value is not structurally a
    /// SMART Health Cards Bundle.
    pub fn process(&self, bundle: &Value) -> Result<Value> {
        self.validate(bundle)?;

        let mut processed = bundle.clone();
        let obj = processed
            .as_object_mut()
            .expect("validated bundle is an object");
        obj.entry("type")
            .or_insert_with(|| Value::String(BUNDLE_TYPE_COLLECTION.to_string()));
        Ok(processed)
    }

    /// Check the structural invariants of a SMART Health Cards Bundle.
    ///
    /// - `resourceType` must be `"Bundle"`
    /// - `type`, when present, must be `"collection"`
    /// - `entry`, when present, must be an array of objects each carrying a
    ///   `resource` with a non-empty `resourceType`
    ///
    /// # Errors
    ///
    /// Returns a `FHIR_VALIDATION_ERROR` naming the first violated field.
    pub fn validate(&self, bundle: &Value) -> Result<()> {
        let obj = bundle
            .as_object()
            .ok_or_else(|| HealthCardError::fhir_validation("bundle must be a JSON object"))?;

        match obj.get("resourceType").and_then(Value::as_str) {
            Some("Bundle") => {}
            Some(other) => {
                return Err(HealthCardError::fhir_validation(format!(
                    "resourceType must be \"Bundle\", got \"{other}\""
                )));
            }
            None => {
                return Err(HealthCardError::fhir_validation(
                    "resourceType must be \"Bundle\"",
                ));
            }
        }

        if let Some(bundle_type) = obj.get("type") {
            if bundle_type.as_str() != Some(BUNDLE_TYPE_COLLECTION) {
                return Err(HealthCardError::fhir_validation(format!(
                    "bundle type must be \"collection\", got {bundle_type}"
                )));
            }
        }

        if let Some(entry) = obj.get("entry") {
            let entries = entry.as_array().ok_or_else(|| {
                HealthCardError::fhir_validation("entry must be an array")
            })?;
            for (index, item) in entries.iter().enumerate() {
                let resource = item
                    .as_object()
                    .and_then(|e| e.get("resource"))
                    .and_then(Value::as_object)
                    .ok_or_else(|| {
                        HealthCardError::fhir_validation(format!(
                            "entry[{index}] must contain a resource object"
                        ))
                    })?;
                match resource.get("resourceType").and_then(Value::as_str) {
                    Some(rt) if !rt.is_empty() => {}
                    _ => {
                        return Err(HealthCardError::fhir_validation(format!(
                            "entry[{index}].resource must have a resourceType"
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    /// Normalize and apply the QR optimization rewrite.
    ///
    /// The rewrite shortens every non-empty `fullUrl` to `resource:N` (N being
    /// the entry index), rewrites matching `reference` values, and prunes
    /// resource `id`, `meta` (keeping only `meta.security`), narrative `text`,
    /// scalar `display` strings, nulls, and empty arrays. The rewrite is
    /// deterministic and idempotent.
    ///
    /// # Errors
    ///
    /// Returns a `FHIR_VALIDATION_ERROR` if the input fails [`Self::validate`].
    pub fn process_for_qr(&self, bundle: &Value) -> Result<Value> {
        let mut processed = self.process(bundle)?;

        let url_map = rewrite_full_urls(&mut processed);
        debug!(
            shortened_urls = url_map.len(),
            "applying QR optimization rewrite"
        );
        optimize_value(&mut processed, &url_map);
        Ok(processed)
    }
}

/// First pass: shorten entry `fullUrl`s and collect the rewrite map.
fn rewrite_full_urls(bundle: &mut Value) -> HashMap<String, String> {
    let mut url_map = HashMap::new();

    let Some(entries) = bundle
        .as_object_mut()
        .and_then(|obj| obj.get_mut("entry"))
        .and_then(Value::as_array_mut)
    else {
        return url_map;
    };

    for (index, entry) in entries.iter_mut().enumerate() {
        let Some(entry_obj) = entry.as_object_mut() else {
            continue;
        };
        let short = format!("resource:{index}");
        if let Some(full_url) = entry_obj.get("fullUrl").and_then(Value::as_str) {
            if !full_url.is_empty() {
                url_map.insert(full_url.to_string(), short.clone());
                entry_obj.insert("fullUrl".to_string(), Value::String(short));
            }
        }
    }

    url_map
}

/// Depth-first rewrite: references, field pruning, and array cleanup.
fn optimize_value(value: &mut Value, url_map: &HashMap<String, String>) {
    match value {
        Value::Object(obj) => optimize_object(obj, url_map),
        Value::Array(arr) => {
            for element in arr.iter_mut() {
                optimize_value(element, url_map);
            }
            arr.retain(|element| !element.is_null());
        }
        _ => {}
    }
}

fn optimize_object(obj: &mut Map<String, Value>, url_map: &HashMap<String, String>) {
    if let Some(Value::String(reference)) = obj.get("reference") {
        if let Some(short) = url_map.get(reference) {
            obj.insert("reference".to_string(), Value::String(short.clone()));
        }
    }

    // Resource-level pruning applies only to objects that are resources.
    if obj.contains_key("resourceType") {
        obj.remove("id");
        prune_meta(obj);
    }

    if matches!(obj.get("display"), Some(Value::String(_))) {
        obj.remove("display");
    }

    if obj.contains_key("text") && (is_codeable_concept(obj) || is_domain_resource(obj)) {
        obj.remove("text");
    }

    let keys: Vec<String> = obj.keys().cloned().collect();
    for key in keys {
        let Some(child) = obj.get_mut(&key) else {
            continue;
        };
        optimize_value(child, url_map);
        let drop = match obj.get(&key) {
            Some(Value::Null) => true,
            Some(Value::Array(arr)) => arr.is_empty(),
            _ => false,
        };
        if drop {
            obj.remove(&key);
        }
    }
}

/// Drop `meta` unless it carries `security`; if it does, keep only that.
fn prune_meta(resource: &mut Map<String, Value>) {
    let security = resource
        .get("meta")
        .and_then(Value::as_object)
        .and_then(|meta| meta.get("security"))
        .cloned();

    match security {
        Some(security) => {
            let mut kept = Map::new();
            kept.insert("security".to_string(), security);
            resource.insert("meta".to_string(), Value::Object(kept));
        }
        None => {
            resource.remove("meta");
        }
    }
}

fn is_codeable_concept(obj: &Map<String, Value>) -> bool {
    matches!(obj.get("coding"), Some(Value::Array(_)))
}

fn is_domain_resource(obj: &Map<String, Value>) -> bool {
    obj.contains_key("text")
        || obj.contains_key("contained")
        || obj.contains_key("extension")
        || obj.contains_key("modifierExtension")
}
