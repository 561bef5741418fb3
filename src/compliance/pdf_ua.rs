//! PDF/UA catalog requirements.

use crate::object::{Dictionary, Object};

/// Add the catalog entries an accessible document needs.
///
/// Title display is forced on and the document is marked as tagged.
pub fn apply_catalog_entries(catalog: &mut Dictionary) {
    catalog.insert(
        "ViewerPreferences".to_string(),
        Object::dict(vec![("DisplayDocTitle", Object::Boolean(true))]),
    );
    catalog.insert(
        "MarkInfo".to_string(),
        Object::dict(vec![("Marked", Object::Boolean(true))]),
    );
}
