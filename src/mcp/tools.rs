use crate::protocol::mcp::ToolDefinition;
use serde_json::{json, Value};

/// Every tool the server knows about. Both `tools/list` and dispatch are
/// driven from [`ToolKind::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    GetObjects,
    GetFields,
    Query,
    GetRecord,
    GetAllRecords,
    GetRelatedRecords,
    BatchCreate,
    BatchUpdate,
    BatchDelete,
    GetPicklistValues,
    UploadFile,
    GetFinancialItems,
    ManageRecord,
}

impl ToolKind {
    pub const ALL: [ToolKind; 13] = [
        ToolKind::GetObjects,
        ToolKind::GetFields,
        ToolKind::Query,
        ToolKind::GetRecord,
        ToolKind::GetAllRecords,
        ToolKind::GetRelatedRecords,
        ToolKind::BatchCreate,
        ToolKind::BatchUpdate,
        ToolKind::BatchDelete,
        ToolKind::GetPicklistValues,
        ToolKind::UploadFile,
        ToolKind::GetFinancialItems,
        ToolKind::ManageRecord,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::GetObjects => "get_objects",
            ToolKind::GetFields => "get_fields",
            ToolKind::Query => "query",
            ToolKind::GetRecord => "get_record",
            ToolKind::GetAllRecords => "get_all_records",
            ToolKind::GetRelatedRecords => "get_related_records",
            ToolKind::BatchCreate => "batch_create",
            ToolKind::BatchUpdate => "batch_update",
            ToolKind::BatchDelete => "batch_delete",
            ToolKind::GetPicklistValues => "get_picklist_values",
            ToolKind::UploadFile => "upload_file",
            ToolKind::GetFinancialItems => "get_financial_items",
            ToolKind::ManageRecord => "manage_record",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn definition(self) -> ToolDefinition {
        let (description, input_schema) = match self {
            ToolKind::GetObjects => (
                "Get all CRM objects/modules available in Fireberry",
                json!({ "type": "object", "properties": {} }),
            ),
            ToolKind::GetFields => (
                "Get all fields for a specific CRM object",
                json!({
                    "type": "object",
                    "properties": { "objectType": object_type_property() },
                    "required": ["objectType"]
                }),
            ),
            ToolKind::Query => (
                "Perform an advanced query with filters, sorting, and pagination",
                json!({
                    "type": "object",
                    "properties": {
                        "objectType": object_type_property(),
                        "query": {
                            "type": "object",
                            "description": "Fireberry query object with filter, orderby, fields, pageNumber, pageSize"
                        }
                    },
                    "required": ["objectType", "query"]
                }),
            ),
            ToolKind::GetRecord => (
                "Get a single record by its ID",
                json!({
                    "type": "object",
                    "properties": {
                        "objectType": object_type_property(),
                        "recordId": { "type": "string", "description": "The record ID" }
                    },
                    "required": ["objectType", "recordId"]
                }),
            ),
            ToolKind::GetAllRecords => (
                "List records of an object type, one page at a time",
                json!({
                    "type": "object",
                    "properties": {
                        "objectType": object_type_property(),
                        "pageSize": { "type": "integer", "minimum": 1, "description": "Records per page" },
                        "pageNumber": { "type": "integer", "minimum": 1, "description": "Page number (1-based)" }
                    },
                    "required": ["objectType"]
                }),
            ),
            ToolKind::GetRelatedRecords => (
                "Get records of another object type related to a record",
                json!({
                    "type": "object",
                    "properties": {
                        "objectType": object_type_property(),
                        "recordId": { "type": "string", "description": "The parent record ID" },
                        "relatedObjectType": {
                            "type": "string",
                            "description": "The related object type (e.g., contact)"
                        }
                    },
                    "required": ["objectType", "recordId", "relatedObjectType"]
                }),
            ),
            ToolKind::BatchCreate => (
                "Create multiple records in a single batch operation",
                records_schema(),
            ),
            ToolKind::BatchUpdate => (
                "Update multiple records in a single batch operation",
                records_schema(),
            ),
            ToolKind::BatchDelete => (
                "Delete multiple records in a single batch operation",
                json!({
                    "type": "object",
                    "properties": {
                        "objectType": raw_object_type_property(),
                        "recordIds": {
                            "type": "array",
                            "items": { "type": "string" },
                            "description": "IDs of the records to delete"
                        }
                    },
                    "required": ["objectType", "recordIds"]
                }),
            ),
            ToolKind::GetPicklistValues => (
                "Get the allowed values of a picklist field",
                json!({
                    "type": "object",
                    "properties": {
                        "objectType": raw_object_type_property(),
                        "fieldName": { "type": "string", "description": "The picklist field name" }
                    },
                    "required": ["objectType", "fieldName"]
                }),
            ),
            ToolKind::UploadFile => (
                "Attach a file to a record",
                json!({
                    "type": "object",
                    "properties": {
                        "objectType": raw_object_type_property(),
                        "recordId": { "type": "string", "description": "The record ID" },
                        "file": { "type": "string", "description": "Base64-encoded file content" },
                        "filename": { "type": "string", "description": "File name including extension" }
                    },
                    "required": ["objectType", "recordId", "file", "filename"]
                }),
            ),
            ToolKind::GetFinancialItems => (
                "Get the line items of a financial document (invoice, order, receipt, ...)",
                json!({
                    "type": "object",
                    "properties": {
                        "parentObjectType": {
                            "type": "string",
                            "enum": crate::crm::object_type::financial_parents().collect::<Vec<_>>(),
                            "description": "The financial document type"
                        },
                        "parentId": { "type": "string", "description": "The document record ID" }
                    },
                    "required": ["parentObjectType", "parentId"]
                }),
            ),
            ToolKind::ManageRecord => (
                "Create, Update, or Delete a single record",
                json!({
                    "type": "object",
                    "properties": {
                        "action": { "type": "string", "enum": ["create", "update", "delete"] },
                        "objectType": object_type_property(),
                        "recordId": { "type": "string", "description": "Required for update and delete" },
                        "data": { "type": "object", "description": "The record data, required for create and update" }
                    },
                    "required": ["action", "objectType"]
                }),
            ),
        };

        ToolDefinition {
            name: self.name().to_string(),
            description: description.to_string(),
            input_schema,
        }
    }
}

fn object_type_property() -> Value {
    json!({
        "type": "string",
        "description": "The object type (e.g., account, contact, custom_object_1)"
    })
}

// Batch, picklist and file endpoints take the type exactly as given.
fn raw_object_type_property() -> Value {
    json!({
        "type": "string",
        "description": "The object type as the CRM expects it (e.g., 1, custom_object_1)"
    })
}

fn records_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "objectType": raw_object_type_property(),
            "records": { "type": "array", "items": { "type": "object" } }
        },
        "required": ["objectType", "records"]
    })
}

pub fn get_tools() -> Vec<ToolDefinition> {
    ToolKind::ALL.into_iter().map(ToolKind::definition).collect()
}
