//! Learn requests: asking the data source to publish what a template reads.

use dashstache_ast::{TagId, TagKind, Template};
use indexmap::IndexSet;
use serde::Serialize;

pub const LEARN_COMMAND: &str = "learn";

/// One path a template displays.
///
/// Serializes as `{"name": "hosts.ip", "type": "name", "_subject": "hosts/_all", "_command": "learn"}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LearnRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(rename = "_subject")]
    pub subject: String,
    #[serde(rename = "_command")]
    pub command: &'static str,
}

impl LearnRequest {
    pub fn new(name: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TagKind::Variable.as_str(),
            subject: subject.into(),
            command: LEARN_COMMAND,
        }
    }
}

/// One request per distinct variable path, in document order.
///
/// The name joins the enclosing section names with the tag's own name, so
/// `{{#hosts}}{{ip}}{{/hosts}}` asks for `hosts.ip`.
pub fn learn_requests(template: &Template, subject: &str) -> Vec<LearnRequest> {
    let tree = template.tree();
    let mut requests = IndexSet::new();

    let mut stack: Vec<TagId> = tree.root().children().iter().rev().copied().collect();
    while let Some(id) = stack.pop() {
        let node = &tree[id];
        stack.extend(node.children().iter().rev().copied());
        if node.kind != TagKind::Variable || node.segments().next().is_none() {
            continue;
        }

        let mut segments = tree.ancestor_names(id);
        segments.push(node.name.as_str());
        requests.insert(LearnRequest::new(segments.join("."), subject));
    }

    tracing::debug!(count = requests.len(), subject, "collected learn requests");
    requests.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(source: &str) -> Vec<String> {
        learn_requests(&Template::parse(source), "hosts/_all")
            .into_iter()
            .map(|r| r.name)
            .collect()
    }

    #[test]
    fn test_names_join_enclosing_sections() {
        assert_eq!(
            names("{{title}}{{#hosts}}{{ip}}{{#pins}}{{state}}{{/pins}}{{/hosts}}"),
            vec!["title", "hosts.ip", "hosts.pins.state"]
        );
    }

    #[test]
    fn test_sections_and_dots_are_not_requested() {
        assert_eq!(names("{{#items}}{{.}}{{/items}}{{^flag}}x{{/flag}}"), Vec::<String>::new());
    }

    #[test]
    fn test_duplicates_are_dropped() {
        assert_eq!(names("{{a}} {{b}} {{a}} {{{b}}}"), vec!["a", "b"]);
    }

    #[test]
    fn test_serialized_shape() {
        let request = LearnRequest::new("hosts.ip", "hosts/_all");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "name": "hosts.ip",
                "type": "name",
                "_subject": "hosts/_all",
                "_command": "learn"
            })
        );
    }
}
