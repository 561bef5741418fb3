//! PDF/A output intent synthesis.

use super::icc::{self, SRGB_IDENTIFIER};
use crate::error::Result;
use crate::object::{Object, ObjectRef};
use crate::writer::object_table::ObjectTable;

/// Append the ICC profile stream followed by the output intent that points
/// at it, returning the output intent reference.
///
/// The two objects are always allocated in this order.
pub fn append_output_intent(table: &mut ObjectTable, profile: Option<&[u8]>) -> Result<ObjectRef> {
    let generated;
    let profile = match profile {
        Some(bytes) => bytes,
        None => {
            generated = icc::srgb_profile()?;
            &generated[..]
        },
    };

    let profile_ref = table.create_stream(Object::dict(vec![("N", Object::Integer(3))]), profile);
    table.end(profile_ref)?;

    let intent_ref = table.create(Object::dict(vec![
        ("Type", Object::name("OutputIntent")),
        ("S", Object::name("GTS_PDFA1")),
        ("Info", Object::text(SRGB_IDENTIFIER)),
        ("OutputConditionIdentifier", Object::text(SRGB_IDENTIFIER)),
        ("DestOutputProfile", Object::Reference(profile_ref)),
    ]));
    table.end(intent_ref)?;
    log::debug!("PDF/A output intent {} with profile {}", intent_ref, profile_ref);
    Ok(intent_ref)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::object_serializer::ObjectSerializer;

    #[test]
    fn test_profile_precedes_intent() {
        let mut table = ObjectTable::new();
        table.create(Object::Null);
        let intent = append_output_intent(&mut table, None).unwrap();
        assert_eq!(intent.id, 3);

        let payload = table.get(intent).unwrap().payload();
        let text = ObjectSerializer::new().serialize_to_string(payload).unwrap();
        assert_eq!(
            text,
            "<<\n/Type /OutputIntent\n/S /GTS_PDFA1\n/Info (sRGB IEC61966-2.1)\n\
             /OutputConditionIdentifier (sRGB IEC61966-2.1)\n/DestOutputProfile 2 0 R\n>>"
        );
    }

    #[test]
    fn test_custom_profile_is_used() {
        let mut table = ObjectTable::new();
        append_output_intent(&mut table, Some(b"icc-bytes")).unwrap();
        let profile = table.get(ObjectRef::new(1, 0)).unwrap();
        assert_eq!(profile.stream(), Some(&b"icc-bytes"[..]));
    }
}
