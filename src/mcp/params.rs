use serde_json::{json, Map, Value};

use crate::crm::object_type::{financial_items_endpoint, financial_parents, type_code};
use crate::crm::{normalize, CrmRequest};
use crate::error::ToolError;

use super::tools::ToolKind;

/// Helper for pulling typed arguments out of a tool call.
struct ToolParams<'a> {
    args: &'a Map<String, Value>,
}

impl<'a> ToolParams<'a> {
    fn new(args: &'a Map<String, Value>) -> Self {
        Self { args }
    }

    fn extract_str(&self, key: &str) -> Result<String, ToolError> {
        match self.args.get(key) {
            None | Some(Value::Null) => Err(ToolError::missing(key)),
            Some(Value::String(s)) if s.trim().is_empty() => Err(ToolError::missing(key)),
            Some(Value::String(s)) => Ok(s.trim().to_string()),
            Some(_) => Err(ToolError::invalid(key, "a string")),
        }
    }

    /// Record ids are strings in Fireberry, but agents often send them as numbers.
    fn extract_id(&self, key: &str) -> Result<String, ToolError> {
        match self.args.get(key) {
            Some(Value::Number(n)) => Ok(n.to_string()),
            _ => self.extract_str(key),
        }
    }

    fn extract_object(&self, key: &str) -> Result<Map<String, Value>, ToolError> {
        match self.args.get(key) {
            None | Some(Value::Null) => Err(ToolError::missing(key)),
            Some(Value::Object(map)) => Ok(map.clone()),
            Some(_) => Err(ToolError::invalid(key, "an object")),
        }
    }

    fn extract_array(&self, key: &str) -> Result<Vec<Value>, ToolError> {
        match self.args.get(key) {
            None | Some(Value::Null) => Err(ToolError::missing(key)),
            Some(Value::Array(items)) => Ok(items.clone()),
            Some(_) => Err(ToolError::invalid(key, "an array")),
        }
    }

    fn extract_records(&self, key: &str) -> Result<Vec<Value>, ToolError> {
        let records = self.extract_array(key)?;
        if records.iter().any(|r| !r.is_object()) {
            return Err(ToolError::invalid(key, "an array of objects"));
        }
        Ok(records)
    }

    fn extract_ids(&self, key: &str) -> Result<Vec<String>, ToolError> {
        self.extract_array(key)?
            .into_iter()
            .map(|id| match id {
                Value::String(s) if !s.trim().is_empty() => Ok(s),
                Value::Number(n) => Ok(n.to_string()),
                _ => Err(ToolError::invalid(key, "an array of record ids")),
            })
            .collect()
    }

    fn optional_page(&self, key: &str) -> Result<Option<u32>, ToolError> {
        match self.args.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value
                .as_u64()
                .filter(|n| *n >= 1)
                .and_then(|n| u32::try_from(n).ok())
                .map(Some)
                .ok_or_else(|| ToolError::invalid(key, "a positive integer")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordAction {
    Create,
    Update,
    Delete,
}

impl RecordAction {
    fn parse(raw: &str) -> Result<Self, ToolError> {
        match raw.to_lowercase().as_str() {
            "create" => Ok(RecordAction::Create),
            "update" => Ok(RecordAction::Update),
            "delete" => Ok(RecordAction::Delete),
            _ => Err(ToolError::Validation(format!(
                "Invalid action: {} (expected create, update or delete)",
                raw
            ))),
        }
    }
}

/// Validated arguments of one tool call.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolRequest {
    GetObjects,
    GetFields {
        object_type: String,
    },
    Query {
        object_type: String,
        query: Map<String, Value>,
    },
    GetRecord {
        object_type: String,
        record_id: String,
    },
    GetAllRecords {
        object_type: String,
        page_size: Option<u32>,
        page_number: Option<u32>,
    },
    GetRelatedRecords {
        object_type: String,
        record_id: String,
        related_object_type: String,
    },
    BatchCreate {
        object_type: String,
        records: Vec<Value>,
    },
    BatchUpdate {
        object_type: String,
        records: Vec<Value>,
    },
    BatchDelete {
        object_type: String,
        record_ids: Vec<String>,
    },
    GetPicklistValues {
        object_type: String,
        field_name: String,
    },
    UploadFile {
        object_type: String,
        record_id: String,
        file: String,
        filename: String,
    },
    GetFinancialItems {
        endpoint: &'static str,
        parent_id: String,
    },
    ManageRecord {
        action: RecordAction,
        object_type: String,
        record_id: Option<String>,
        data: Option<Map<String, Value>>,
    },
}

impl ToolRequest {
    /// Decodes `args` for `kind`. `null` arguments count as an empty object.
    pub fn decode(kind: ToolKind, args: &Value) -> Result<Self, ToolError> {
        let empty = Map::new();
        let args = match args {
            Value::Object(map) => map,
            Value::Null => &empty,
            _ => return Err(ToolError::Validation("Tool arguments must be an object".to_string())),
        };
        let params = ToolParams::new(args);

        let request = match kind {
            ToolKind::GetObjects => ToolRequest::GetObjects,
            ToolKind::GetFields => ToolRequest::GetFields {
                object_type: params.extract_str("objectType")?,
            },
            ToolKind::Query => ToolRequest::Query {
                object_type: params.extract_str("objectType")?,
                query: params.extract_object("query")?,
            },
            ToolKind::GetRecord => ToolRequest::GetRecord {
                object_type: params.extract_str("objectType")?,
                record_id: params.extract_id("recordId")?,
            },
            ToolKind::GetAllRecords => ToolRequest::GetAllRecords {
                object_type: params.extract_str("objectType")?,
                page_size: params.optional_page("pageSize")?,
                page_number: params.optional_page("pageNumber")?,
            },
            ToolKind::GetRelatedRecords => ToolRequest::GetRelatedRecords {
                object_type: params.extract_str("objectType")?,
                record_id: params.extract_id("recordId")?,
                related_object_type: params.extract_str("relatedObjectType")?,
            },
            ToolKind::BatchCreate => ToolRequest::BatchCreate {
                object_type: params.extract_str("objectType")?,
                records: params.extract_records("records")?,
            },
            ToolKind::BatchUpdate => ToolRequest::BatchUpdate {
                object_type: params.extract_str("objectType")?,
                records: params.extract_records("records")?,
            },
            ToolKind::BatchDelete => ToolRequest::BatchDelete {
                object_type: params.extract_str("objectType")?,
                record_ids: params.extract_ids("recordIds")?,
            },
            ToolKind::GetPicklistValues => ToolRequest::GetPicklistValues {
                object_type: params.extract_str("objectType")?,
                field_name: params.extract_str("fieldName")?,
            },
            ToolKind::UploadFile => ToolRequest::UploadFile {
                object_type: params.extract_str("objectType")?,
                record_id: params.extract_id("recordId")?,
                file: params.extract_str("file")?,
                filename: params.extract_str("filename")?,
            },
            ToolKind::GetFinancialItems => {
                let parent = params.extract_str("parentObjectType")?;
                let Some(endpoint) = financial_items_endpoint(&parent) else {
                    return Err(ToolError::Validation(format!(
                        "Unsupported parentObjectType: {} (expected one of {})",
                        parent,
                        financial_parents().collect::<Vec<_>>().join(", ")
                    )));
                };
                ToolRequest::GetFinancialItems {
                    endpoint,
                    parent_id: params.extract_id("parentId")?,
                }
            }
            ToolKind::ManageRecord => {
                let action = RecordAction::parse(&params.extract_str("action")?)?;
                let object_type = params.extract_str("objectType")?;
                let record_id = match action {
                    RecordAction::Create => None,
                    RecordAction::Update | RecordAction::Delete => {
                        Some(params.extract_id("recordId")?)
                    }
                };
                let data = match action {
                    RecordAction::Create | RecordAction::Update => {
                        Some(params.extract_object("data")?)
                    }
                    RecordAction::Delete => None,
                };
                ToolRequest::ManageRecord {
                    action,
                    object_type,
                    record_id,
                    data,
                }
            }
        };

        Ok(request)
    }

    /// Resolves the request into the single CRM call it maps to.
    pub fn into_crm_request(self) -> CrmRequest {
        match self {
            ToolRequest::GetObjects => CrmRequest::get(["v3", "metadata", "objects"]),
            ToolRequest::GetFields { object_type } => CrmRequest::get([
                "v3".to_string(),
                "metadata".into(),
                "fields".into(),
                normalize(&object_type),
            ]),
            ToolRequest::Query { object_type, mut query } => {
                let objecttype = match type_code(&object_type) {
                    Some(code) => json!(code),
                    None => json!(normalize(&object_type)),
                };
                query.insert("objecttype".to_string(), objecttype);
                CrmRequest::post(["query"]).with_body(Value::Object(query))
            }
            ToolRequest::GetRecord {
                object_type,
                record_id,
            } => CrmRequest::get(["record".to_string(), normalize(&object_type), record_id]),
            ToolRequest::GetAllRecords {
                object_type,
                page_size,
                page_number,
            } => {
                let mut request = CrmRequest::get(["record".to_string(), normalize(&object_type)]);
                if let Some(size) = page_size {
                    request = request.with_query("page_size", size);
                }
                if let Some(number) = page_number {
                    request = request.with_query("page_number", number);
                }
                request
            }
            ToolRequest::GetRelatedRecords {
                object_type,
                record_id,
                related_object_type,
            } => CrmRequest::get([
                "record".to_string(),
                "related".to_string(),
                normalize(&object_type),
                record_id,
                normalize(&related_object_type),
            ]),
            ToolRequest::BatchCreate {
                object_type,
                records,
            } => CrmRequest::post(["v3".to_string(), "batch".into(), object_type])
                .with_body(json!({ "records": records })),
            ToolRequest::BatchUpdate {
                object_type,
                records,
            } => CrmRequest::put(["v3".to_string(), "batch".into(), object_type])
                .with_body(json!({ "records": records })),
            ToolRequest::BatchDelete {
                object_type,
                record_ids,
            } => CrmRequest::delete(["v3".to_string(), "batch".into(), object_type])
                .with_body(json!({ "ids": record_ids })),
            ToolRequest::GetPicklistValues {
                object_type,
                field_name,
            } => CrmRequest::get([
                "v3".to_string(),
                "metadata".into(),
                "picklist".into(),
                object_type,
                field_name.to_lowercase(),
            ]),
            ToolRequest::UploadFile {
                object_type,
                record_id,
                file,
                filename,
            } => CrmRequest::post(["files".to_string(), object_type, record_id])
                .with_body(json!({ "file": file, "filename": filename })),
            ToolRequest::GetFinancialItems {
                endpoint,
                parent_id,
            } => CrmRequest::get(["record".to_string(), endpoint.to_string(), parent_id]),
            ToolRequest::ManageRecord {
                action,
                object_type,
                record_id,
                data,
            } => {
                let mut segments = vec!["record".to_string(), normalize(&object_type)];
                segments.extend(record_id);
                let body = data.map(Value::Object);
                let request = match action {
                    RecordAction::Create => CrmRequest::post(segments),
                    RecordAction::Update => CrmRequest::put(segments),
                    RecordAction::Delete => CrmRequest::delete(segments),
                };
                match body {
                    Some(body) => request.with_body(body),
                    None => request,
                }
            }
        }
    }
}
