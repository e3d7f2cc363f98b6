//! URL codec: `/segment/segment?key=value` <-> (logical path, params).
//!
//! Path segments are route names only, percent-encoded on the way out and
//! decoded on the way in. Each query value is encoded and decoded
//! by the [`ParamKind`](crate::params::ParamKind) of the deepest route level
//! declaring its key, so a malformed value fails exactly like bad in-memory
//! params do.

use std::sync::Arc;

use serde_json::Value;
use url::form_urlencoded;

use crate::error::{NavigationError, Result, ValidationError};
use crate::params::{ParamSpec, Params};
use crate::routes::{RouteDefinition, RouteIndex};
use crate::state::{LogicalPath, NotFoundInfo, parse_logical_path};

/// Decoded form of a URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedUrl {
    pub path: LogicalPath,
    pub params: Params,
}

/// Render `path` and `params` as a URL. Every key must be declared by some
/// level of `path`.
pub fn generate_url(routes: &RouteIndex, path: &[String], params: &Params) -> Result<String> {
    let levels = levels_for(routes, path)?;
    let mut query = form_urlencoded::Serializer::new(String::new());
    let mut encoded = Params::new();
    for (key, value) in params {
        if value.is_null() {
            continue;
        }
        let spec = deepest_spec(&levels, key).ok_or_else(|| {
            ValidationError::new(path, encoded.clone(), format!("param `{key}` is not declared"))
        })?;
        let text = spec
            .kind
            .encode(value)
            .map_err(|reason| ValidationError::new(path, encoded.clone(), format!("param `{key}`: {reason}")))?;
        query.append_pair(key, &text);
        encoded.insert(key.clone(), value.clone());
    }
    Ok(assemble(path, query.finish()))
}

/// Parse a URL (leading slash optional; fragments ignored).
///
/// Query values are decoded against the longest resolvable prefix of the
/// path. Undeclared keys are rejected when the whole path resolves and kept as
/// plain strings otherwise, so a not-found view can still report them.
pub fn parse_url(routes: &RouteIndex, url: &str) -> Result<ParsedUrl> {
    let url = url.split('#').next().unwrap_or_default();
    let (path_text, query) = url.split_once('?').unwrap_or((url, ""));
    let path = decode_segments(path_text)?;

    let levels = routes.resolve_levels(&path)?;
    let fully_resolved = levels.len() == path.len() + 1;
    let resolved_path = &path[..levels.len().saturating_sub(1)];

    let mut params = Params::new();
    for (key, text) in form_urlencoded::parse(query.as_bytes()) {
        let value = match deepest_spec(&levels, &key) {
            Some(spec) => spec.kind.decode(&text).map_err(|reason| {
                ValidationError::new(resolved_path, params.clone(), format!("param `{key}`: {reason}"))
            })?,
            None if fully_resolved => {
                return Err(ValidationError::new(
                    resolved_path,
                    params,
                    format!("param `{key}` is not declared"),
                )
                .into());
            }
            None => Value::String(text.into_owned()),
        };
        params.insert(key.into_owned(), value);
    }
    Ok(ParsedUrl { path, params })
}

/// URL for a request that ended on a not-found view: the original path and
/// params, typed through whatever schemas still resolve and plain text otherwise.
pub fn not_found_url(routes: &RouteIndex, info: &NotFoundInfo) -> Result<String> {
    let levels = routes.resolve_levels(&info.orig_path)?;
    let mut query = form_urlencoded::Serializer::new(String::new());
    for (key, value) in &info.orig_params {
        if value.is_null() {
            continue;
        }
        let text = deepest_spec(&levels, key)
            .and_then(|spec| spec.kind.encode(value).ok())
            .unwrap_or_else(|| plain_text(value));
        query.append_pair(key, &text);
    }
    Ok(assemble(&info.orig_path, query.finish()))
}

fn decode_segments(path_text: &str) -> Result<LogicalPath> {
    parse_logical_path(path_text)
        .iter()
        .map(|segment| {
            urlencoding::decode(segment)
                .map(|decoded| decoded.into_owned())
                .map_err(|err| {
                    NavigationError::from(ValidationError::new(
                        &[],
                        Params::new(),
                        format!("path segment `{segment}`: {err}"),
                    ))
                })
        })
        .collect()
}

fn levels_for(routes: &RouteIndex, path: &[String]) -> Result<Vec<Arc<RouteDefinition>>> {
    (0..=path.len())
        .map(|depth| routes.lookup(&path[..depth]))
        .collect()
}

fn deepest_spec<'a>(levels: &'a [Arc<RouteDefinition>], key: &str) -> Option<&'a ParamSpec> {
    levels
        .iter()
        .rev()
        .find_map(|definition| definition.params().and_then(|schema| schema.spec(key)))
}

fn plain_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn assemble(path: &[String], query: String) -> String {
    let segments: Vec<_> = path
        .iter()
        .map(|segment| urlencoding::encode(segment))
        .collect();
    let mut url = format!("/{}", segments.join("/"));
    if !query.is_empty() {
        url.push('?');
        url.push_str(&query);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{ParamKind, ParamSchema};
    use crate::routes::{ContainerRoute, LeafRoute, RouteTree};
    use serde_json::json;

    fn params(value: Value) -> Params {
        value.as_object().cloned().unwrap_or_default()
    }

    fn routes() -> RouteIndex {
        RouteIndex::new(
            RouteTree::new(
                ContainerRoute::stack()
                    .params(ParamSchema::new().optional("lang", ParamKind::OneOf(vec!["en".into(), "de".into()])))
                    .child("home", LeafRoute::new())
                    .child(
                        "search",
                        LeafRoute::new().params(
                            ParamSchema::new()
                                .required("q", ParamKind::String)
                                .optional("page", ParamKind::Integer)
                                .optional("exact", ParamKind::Boolean),
                        ),
                    ),
            )
            .unwrap(),
        )
    }

    #[test]
    fn generates_sorted_escaped_query() {
        let url = generate_url(
            &routes(),
            &parse_logical_path("search"),
            &params(json!({"q": "rust & go", "page": 2, "lang": "de"})),
        )
        .unwrap();
        assert_eq!(url, "/search?lang=de&page=2&q=rust+%26+go");
    }

    #[test]
    fn root_renders_as_slash() {
        assert_eq!(generate_url(&routes(), &[], &Params::new()).unwrap(), "/");
    }

    #[test]
    fn parse_decodes_typed_values() {
        let parsed = parse_url(&routes(), "search?q=a%20b&page=3&exact=true#top").unwrap();
        assert_eq!(parsed.path, parse_logical_path("search"));
        assert_eq!(parsed.params, params(json!({"q": "a b", "page": 3, "exact": true})));
    }

    #[test]
    fn round_trip() {
        let routes = routes();
        let path = parse_logical_path("search");
        let original = params(json!({"q": "ü/ß?", "page": 10, "exact": false, "lang": "en"}));
        let url = generate_url(&routes, &path, &original).unwrap();
        let parsed = parse_url(&routes, &url).unwrap();
        assert_eq!(parsed, ParsedUrl { path, params: original });
    }

    #[test]
    fn malformed_and_unknown_values_are_validation_errors() {
        let routes = routes();
        let err = parse_url(&routes, "/search?q=x&page=two").unwrap_err();
        assert!(matches!(err, NavigationError::Validation(_)), "{err:?}");
        let err = parse_url(&routes, "/search?q=x&debug=1").unwrap_err();
        assert!(matches!(err, NavigationError::Validation(_)), "{err:?}");
        let err = generate_url(&routes, &parse_logical_path("home"), &params(json!({"q": 1})));
        assert!(matches!(err, Err(NavigationError::Validation(_))));
    }

    #[test]
    fn unresolved_paths_keep_unknown_keys_as_text() {
        let parsed = parse_url(&routes(), "/nowhere/deep?ref=mail&lang=en").unwrap();
        assert_eq!(parsed.path, parse_logical_path("nowhere/deep"));
        assert_eq!(parsed.params, params(json!({"ref": "mail", "lang": "en"})));
    }

    #[test]
    fn not_found_url_renders_requested_location() {
        let info = NotFoundInfo {
            orig_path: parse_logical_path("nowhere"),
            orig_params: params(json!({"n": 5, "lang": "de"})),
        };
        assert_eq!(not_found_url(&routes(), &info).unwrap(), "/nowhere?lang=de&n=5");
    }

    #[test]
    fn path_segments_are_percent_coded() {
        let routes = RouteIndex::new(
            RouteTree::new(
                ContainerRoute::stack()
                    .child("home", LeafRoute::new())
                    .child("über", LeafRoute::new())
                    .child("a+b", LeafRoute::new()),
            )
            .unwrap(),
        );
        let url = generate_url(&routes, &parse_logical_path("über"), &Params::new()).unwrap();
        assert_eq!(url, "/%C3%BCber");
        assert_eq!(parse_url(&routes, &url).unwrap().path, parse_logical_path("über"));
        assert_eq!(parse_url(&routes, "/über").unwrap().path, parse_logical_path("über"));

        let url = generate_url(&routes, &parse_logical_path("a+b"), &Params::new()).unwrap();
        assert_eq!(url, "/a%2Bb");
        assert_eq!(parse_url(&routes, &url).unwrap().path, parse_logical_path("a+b"));

        let err = parse_url(&routes, "/%FF").unwrap_err();
        assert!(matches!(err, NavigationError::Validation(_)), "{err:?}");
    }
}
