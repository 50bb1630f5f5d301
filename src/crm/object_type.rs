//! Mapping between human object names and Fireberry object type codes.

const OBJECT_TYPE_CODES: &[(&str, &str)] = &[
    ("account", "1"),
    ("contact", "2"),
    ("lead", "3"),
    ("opportunity", "4"),
    ("ticket", "117"),
    ("invoice", "10"),
    ("product", "11"),
    ("project", "101"),
    ("task", "9"),
];

// "reciptinvoice" matches the live endpoint name, do not correct it.
const FINANCIAL_ITEM_ENDPOINTS: &[(&str, &str)] = &[
    ("invoice", "invoiceitems"),
    ("order", "orderitems"),
    ("receipt", "receiptitems"),
    ("invoicecredit", "invoicecredititems"),
    ("invoicedelivery", "invoicedeliveryitems"),
    ("invoicedraft", "invoicedraftitems"),
    ("reciptinvoice", "reciptinvoiceitems"),
];

/// Resolves `token` to a Fireberry object type code.
///
/// Lookup is case-insensitive. Unknown tokens (raw codes, custom objects such
/// as `custom_object_1`) come back exactly as given.
pub fn normalize(token: &str) -> String {
    let key = token.to_lowercase();
    OBJECT_TYPE_CODES
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, code)| code.to_string())
        .unwrap_or_else(|| token.to_string())
}

/// Numeric code for `token`, if it is a known name or already a number.
pub fn type_code(token: &str) -> Option<u32> {
    normalize(token).parse().ok()
}

/// Line-item endpoint for a financial parent document.
pub fn financial_items_endpoint(parent_object_type: &str) -> Option<&'static str> {
    let key = parent_object_type.to_lowercase();
    FINANCIAL_ITEM_ENDPOINTS
        .iter()
        .find(|(parent, _)| *parent == key)
        .map(|(_, endpoint)| *endpoint)
}

pub fn financial_parents() -> impl Iterator<Item = &'static str> {
    FINANCIAL_ITEM_ENDPOINTS.iter().map(|(parent, _)| *parent)
}
