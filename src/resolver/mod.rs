//! Schema resolution: turn a dotted-path query into completion candidates.
//!
//! A pure tree walk over the immutable [`Schema`]. Unknown segments and
//! missing keyed assets are never errors; they yield empty or prefix-filtered
//! candidate lists.

use crate::completion::CompletionOption;
use crate::schema::{KeyedAssets, Property, Schema, TypeDef, DEFAULT_KEY, KEY_PLACEHOLDER};

/// Resolve `query` against the no-session root set.
pub fn resolve(schema: &Schema, query: &str, assets: &KeyedAssets) -> Vec<CompletionOption> {
    resolve_from(schema, schema.root_properties(false), query, assets)
}

/// Resolve `query` starting from an explicit root property set.
///
/// Splits the query on `.` and descends through exact key matches. Segments
/// before the last one navigate; the last segment prefix-filters whatever
/// property set the walk ends on. Descent through a keyed type expands its
/// template once per runtime key from `assets`.
pub fn resolve_from(
    schema: &Schema,
    roots: &[Property],
    query: &str,
    assets: &KeyedAssets,
) -> Vec<CompletionOption> {
    let segments: Vec<&str> = query.split('.').collect();
    let mut current: Vec<Property> = roots.to_vec();
    let mut prefix = String::new();

    for segment in &segments[..segments.len() - 1] {
        let matched = current
            .iter()
            .find(|p| p.key != DEFAULT_KEY && p.key == *segment)
            .cloned();
        let children = matched.and_then(|p| descend(schema, &p, assets));
        match children {
            Some(children) => {
                prefix.push_str(segment);
                prefix.push('.');
                current = children;
            }
            None => {
                // No exact match, or a terminal type: filter what we have
                // by this segment and stop descending.
                return filter_candidates(&current, &prefix, segment);
            }
        }
    }

    filter_candidates(&current, &prefix, segments[segments.len() - 1])
}

/// Child property set for descending through `property`, or `None` when its
/// type is terminal.
fn descend(schema: &Schema, property: &Property, assets: &KeyedAssets) -> Option<Vec<Property>> {
    match schema.type_named(&property.type_name)? {
        TypeDef::Fixed { properties, .. } => Some(properties.clone()),
        TypeDef::Keyed {
            name,
            property_template,
            ..
        } => Some(
            assets
                .keys_for(name)
                .iter()
                .map(|key| expand_template(property_template, key))
                .collect(),
        ),
    }
}

fn expand_template(template: &Property, key: &str) -> Property {
    Property {
        key: template.key.replace(KEY_PLACEHOLDER, key),
        help: template.help.replace(KEY_PLACEHOLDER, key),
        type_name: template.type_name.clone(),
    }
}

/// Case-insensitive prefix filter over the current property set.
///
/// The `__default__` property stands for the accumulated path itself and
/// only surfaces when the segment is empty (the user just typed the
/// separator); it renders as the prefix with its trailing separator
/// stripped.
fn filter_candidates(current: &[Property], prefix: &str, segment: &str) -> Vec<CompletionOption> {
    let needle = segment.to_lowercase();
    current
        .iter()
        .filter_map(|p| {
            if p.key == DEFAULT_KEY {
                if segment.is_empty() && !prefix.is_empty() {
                    let name = prefix.trim_end_matches('.').to_string();
                    Some(CompletionOption::property(name, p.help.clone()))
                } else {
                    None
                }
            } else if p.key.to_lowercase().starts_with(&needle) {
                Some(CompletionOption::property(
                    format!("{}{}", prefix, p.key),
                    p.help.clone(),
                ))
            } else {
                None
            }
        })
        .collect()
}
