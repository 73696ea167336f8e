//! The metadata record attached to every encoded node.

use chrono::{DateTime, Local};
use h5obj_store::{AttrValue, Attrs};

pub const DTYPE: &str = "__DTYPE__";
pub const NTYPE: &str = "__NTYPE__";
pub const PICKLED: &str = "__PICKLED__";
pub const ITEMTYPES: &str = "__ITEMTYPES__";
pub const DATE: &str = "DATE";
/// Set on the parent group of a stored user object.
pub const MODULE: &str = "__MODULE__";
pub const CLASS: &str = "__CLASS__";

/// Payload of a `None` value node.
pub const NONE_SENTINEL: &str = "__NONE__";
/// Payload of an empty container or array.
pub const EMPTY_SENTINEL: &str = "__EMPTY__";

/// `time.ctime()` layout: `Mon Oct 19 18:44:00 2026`.
pub fn ctime(at: DateTime<Local>) -> String {
    at.format("%a %b %e %H:%M:%S %Y").to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    pub original_type: String,
    /// Tag of the dict key this node is stored under.
    pub name_type: Option<String>,
    pub is_serialized: bool,
    /// Tags of the items of a heterogeneous list or tuple.
    pub item_types: Option<Vec<String>>,
    pub created_at: String,
}

impl Metadata {
    /// A record for a node created now.
    pub fn new(original_type: impl Into<String>) -> Metadata {
        Metadata {
            original_type: original_type.into(),
            name_type: None,
            is_serialized: false,
            item_types: None,
            created_at: ctime(Local::now()),
        }
    }

    pub fn write(&self, attrs: &mut Attrs) {
        attrs.set(DTYPE, self.original_type.as_str());
        attrs.set(PICKLED, self.is_serialized);
        attrs.set(DATE, self.created_at.as_str());
        if let Some(name_type) = &self.name_type {
            attrs.set(NTYPE, name_type.as_str());
        }
        if let Some(items) = &self.item_types {
            attrs.set(ITEMTYPES, items.join(","));
        }
    }

    /// Read the record back. `None` if the node carries no `__DTYPE__`.
    pub fn read(attrs: &Attrs) -> Option<Metadata> {
        let original_type = attrs.get_str(DTYPE)?.to_string();
        Some(Metadata {
            original_type,
            name_type: attrs.get_str(NTYPE).map(str::to_string),
            is_serialized: is_serialized(attrs),
            item_types: attrs
                .get_str(ITEMTYPES)
                .filter(|s| !s.is_empty())
                .map(|s| s.split(',').map(str::to_string).collect()),
            created_at: attrs.get_str(DATE).unwrap_or_default().to_string(),
        })
    }
}

/// `__PICKLED__` is true. Older files store it as an integer.
pub fn is_serialized(attrs: &Attrs) -> bool {
    attrs.get(PICKLED).and_then(AttrValue::as_bool).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn ctime_layout() {
        let at = Local.with_ymd_and_hms(2026, 10, 9, 18, 44, 0).unwrap();
        assert_eq!(ctime(at), "Fri Oct  9 18:44:00 2026");
    }

    #[test]
    fn write_then_read() {
        let mut meta = Metadata::new("tuple");
        meta.item_types = Some(vec!["int".into(), "str".into()]);
        meta.name_type = Some("int".into());
        let mut attrs = Attrs::default();
        meta.write(&mut attrs);
        assert_eq!(Metadata::read(&attrs), Some(meta));
        assert_eq!(attrs.get_str(ITEMTYPES), Some("int,str"));
    }

    #[test]
    fn untagged_node_has_no_record() {
        let mut attrs = Attrs::default();
        attrs.set(PICKLED, 1i64);
        assert!(Metadata::read(&attrs).is_none());
        assert!(is_serialized(&attrs));
    }
}
