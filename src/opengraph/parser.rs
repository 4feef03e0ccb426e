use scraper::{Html, Selector};
use std::sync::LazyLock;
use url::Url;

use super::types::{OpenGraph, StructuredMetadata};

static META: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("meta").expect("meta selector is valid"));
static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("title selector is valid"));

const NAMESPACES: [&str; 2] = ["og", "twitter"];
const URL_VALUED: [&str; 4] = ["image", "video", "audio", "player"];

/// Parse Open Graph / Twitter card `<meta>` tags.
///
/// `ns:name` starts a new entry; `ns:name:prop` attaches to the most recent
/// `ns:name` entry. Media URLs are resolved against `base_url`.
pub fn parse_open_graph(original_url: Url, base_url: &Url, html: &str) -> OpenGraph {
    let document = Html::parse_document(html);
    let mut graph = OpenGraph::empty(original_url);

    graph.document_title = document
        .select(&TITLE)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty());

    for element in document.select(&META) {
        let el = element.value();
        let Some(key) = el.attr("property").or_else(|| el.attr("name")) else {
            continue;
        };
        let Some(content) = el.attr("content") else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let mut parts = key.splitn(3, ':');
        let (Some(ns), Some(name)) = (parts.next(), parts.next()) else {
            continue;
        };
        if !NAMESPACES.contains(&ns) || name.is_empty() {
            continue;
        }

        let root = format!("{ns}:{name}");
        let is_url = URL_VALUED.contains(&name);
        let content = content.trim();

        match parts.next() {
            None => {
                let value = if is_url {
                    resolve(base_url, content)
                } else {
                    content.to_string()
                };
                graph
                    .metadata
                    .entry(root)
                    .or_default()
                    .push(StructuredMetadata::new(name, value));
            }
            Some(property) => {
                let value = if is_url && property.ends_with("url") {
                    resolve(base_url, content)
                } else {
                    content.to_string()
                };
                attach_property(&mut graph, root, name, property, value);
            }
        }
    }

    graph
}

fn attach_property(graph: &mut OpenGraph, root: String, name: &str, property: &str, value: String) {
    let entries = graph.metadata.entry(root).or_default();
    if let Some(last) = entries.last_mut() {
        if property == "url" && last.value.is_empty() {
            last.value.clone_from(&value);
        }
        last.push_property(property, value);
    } else if matches!(property, "url" | "secure_url") {
        entries.push(StructuredMetadata::new(name, value.clone()).with_property(property, value));
    } else {
        tracing::trace!(name, property, "dropping orphan metadata property");
    }
}

fn resolve(base: &Url, raw: &str) -> String {
    base.join(raw)
        .map_or_else(|_| raw.to_string(), |u| u.to_string())
}
