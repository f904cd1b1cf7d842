//! Browser introspection handlers (§4.4, §4.5): read-only traversal of
//! the static browser tree seeded on [`LiveSet`].

use std::collections::HashMap;

use serde_json::{json, Value};

use mcpbridge_types::BrowserNodeView;

use crate::error::FacadeError;
use crate::params::{i64_param, opt_str_param, required_str};
use crate::state::{BrowserNode, LiveSet};

fn node_view(node: &BrowserNode, depth: usize) -> BrowserNodeView {
    BrowserNodeView {
        name: node.name.clone(),
        uri: node.uri.clone(),
        is_folder: node.is_folder,
        is_device: node.is_device,
        is_loadable: node.is_loadable,
        children: if depth == 0 {
            Vec::new()
        } else {
            node.children.iter().map(|c| node_view(c, depth - 1)).collect()
        },
    }
}

/// Resolve by `uri` first, falling back to a slash-separated, case-
/// insensitive `path` when `uri` is absent or does not match (§4.5).
pub fn get_browser_item(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let uri = opt_str_param(params, "uri");
    let path = opt_str_param(params, "path");

    let node = uri
        .as_deref()
        .and_then(|u| live.find_by_uri(u))
        .or_else(|| path.as_deref().and_then(|p| live.find_by_path(p)))
        .ok_or_else(|| {
            FacadeError::not_found(format!(
                "no browser item at uri={:?} path={:?}",
                uri, path
            ))
        })?;
    Ok(serde_json::to_value(node_view(node, 1)).expect("BrowserNodeView always serializes"))
}

pub fn get_browser_tree(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let category_type = opt_str_param(params, "category_type").filter(|c| c != "all");
    let depth = i64_param(params, "depth", 3).max(0) as usize;

    let root = match &category_type {
        Some(cat) => live
            .find_by_path(cat)
            .ok_or_else(|| FacadeError::not_found(format!("no browser category '{}'", cat)))?,
        None => &live.browser,
    };
    Ok(serde_json::to_value(node_view(root, depth)).expect("BrowserNodeView always serializes"))
}

pub fn get_browser_items_at_path(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let path = opt_str_param(params, "path").unwrap_or_default();
    let items = live
        .items_at_path(&path)
        .ok_or_else(|| FacadeError::not_found(format!("no browser path '{}'", path)))?;
    let views: Vec<BrowserNodeView> = items.iter().map(|n| node_view(n, 0)).collect();
    Ok(json!({"path": path, "items": views}))
}

pub fn list_loadable_devices(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let category = opt_str_param(params, "category");
    let max_items = i64_param(params, "max_items", 50).max(0) as usize;
    let nodes = live.list_loadable_devices(category.as_deref(), max_items);
    let views: Vec<BrowserNodeView> = nodes.into_iter().map(|n| node_view(n, 0)).collect();
    Ok(json!({"devices": views, "count": views.len()}))
}

pub fn search_loadable_devices(params: &HashMap<String, Value>, live: &mut LiveSet) -> Result<Value, FacadeError> {
    let query = required_str(params, "query")?;
    let category = opt_str_param(params, "category");
    let max_items = i64_param(params, "max_items", 20).max(0) as usize;
    let nodes = live.search_loadable_devices(&query, category.as_deref(), max_items);
    let views: Vec<BrowserNodeView> = nodes.into_iter().map(|n| node_view(n, 0)).collect();
    Ok(json!({"devices": views, "count": views.len()}))
}
