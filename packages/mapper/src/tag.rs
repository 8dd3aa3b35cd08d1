//! Field tag parsing.
//!
//! A tag is `"name,option,option"`. The name may be empty (keep the field
//! name), `"-"` (skip the field) or `"__key__"` (the entity key holder).
//! Options are `noindex`, `flatten` and `omitempty`.

/// Property name marking a field as the key holder.
pub const KEY_FIELD: &str = "__key__";

/// Parsed tag options.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldOptions {
    /// Property name override.
    pub name: Option<String>,
    pub skip: bool,
    pub key: bool,
    pub no_index: bool,
    pub flatten: bool,
    pub omit_empty: bool,
}

pub(crate) fn parse_tag(tag: &str) -> Result<FieldOptions, String> {
    let mut options = FieldOptions::default();
    if tag.trim() == "-" {
        options.skip = true;
        return Ok(options);
    }

    let mut parts = tag.split(',');
    let name = parts.next().unwrap_or("").trim();
    if !name.is_empty() {
        if name == KEY_FIELD {
            options.key = true;
        } else if name.split('.').any(str::is_empty) {
            return Err(format!("invalid property name {:?}", name));
        }
        options.name = Some(name.to_string());
    }

    for option in parts {
        match option.trim() {
            "noindex" => options.no_index = true,
            "flatten" => options.flatten = true,
            "omitempty" => options.omit_empty = true,
            "" => {}
            other => return Err(format!("unknown tag option {:?}", other)),
        }
    }
    Ok(options)
}
