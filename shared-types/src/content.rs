//! Page content document: shape, defaults, and the materialize merge.
//!
//! A `ContentDocument` is always an object tree in which every section named
//! by `sectionOrder` exists. It is only ever produced by [`materialize`] or by
//! patching an existing document, so section editors can rely on the default
//! keys being present.

use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::json;
use ts_rs::TS;

use crate::node::{Node, NodeMap};
use crate::patch::{set_path, FieldPatch, FieldPath, PatchError};

pub const SECTION_ORDER_KEY: &str = "sectionOrder";
pub const THEME_KEY: &str = "theme";

pub const DEFAULT_SECTION_ORDER: [&str; 8] = [
    "hero",
    "problemSection",
    "features",
    "socialProof",
    "guarantees",
    "faq",
    "cta",
    "urgency",
];

/// Sections merged field by field over their defaults. Any other section a
/// document supplies replaces its default outright.
pub const MERGED_SECTIONS: [&str; 7] = [
    "business",
    "hero",
    "problemSection",
    "socialProof",
    "guarantees",
    "faq",
    "urgency",
];

/// Fields a generated document must fill before it may be shown.
pub const REQUIRED_FIELDS: [(&str, &str); 3] = [
    ("business", "name"),
    ("hero", "headline"),
    ("hero", "subheadline"),
];

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ContentError {
    #[error("document must be an object, found {0}")]
    NotAnObject(&'static str),

    #[error("section '{section}' must be {expected}, found {found}")]
    WrongKind {
        section: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("required field '{0}' is missing or empty")]
    MissingField(String),

    #[error("malformed content: {0}")]
    Malformed(String),
}

// ============================================================================
// Typed view
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, TS)]
#[ts(export, export_to = "../../bindings/page-editor.ts")]
#[serde(rename_all = "camelCase", default)]
pub struct BusinessInfo {
    pub name: String,
    pub tagline: String,
    pub industry: String,
    pub logo_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, TS)]
#[ts(export, export_to = "../../bindings/page-editor.ts")]
#[serde(rename_all = "camelCase", default)]
pub struct HeroSection {
    pub headline: String,
    pub subheadline: String,
    pub cta_text: String,
    pub cta_link: String,
    pub image_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, TS)]
#[ts(export, export_to = "../../bindings/page-editor.ts")]
#[serde(rename_all = "camelCase", default)]
pub struct ProblemSection {
    pub title: String,
    pub description: String,
    pub pain_points: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, TS)]
#[ts(export, export_to = "../../bindings/page-editor.ts")]
#[serde(rename_all = "camelCase", default)]
pub struct Feature {
    pub title: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, TS)]
#[ts(export, export_to = "../../bindings/page-editor.ts")]
#[serde(rename_all = "camelCase", default)]
pub struct Testimonial {
    pub quote: String,
    pub author: String,
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, TS)]
#[ts(export, export_to = "../../bindings/page-editor.ts")]
#[serde(rename_all = "camelCase", default)]
pub struct Stat {
    /// Generators emit both `"98%"` and `98`.
    #[ts(type = "string | number")]
    pub value: serde_json::Value,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, TS)]
#[ts(export, export_to = "../../bindings/page-editor.ts")]
#[serde(rename_all = "camelCase", default)]
pub struct SocialProofSection {
    pub title: String,
    pub testimonials: Vec<Testimonial>,
    pub stats: Vec<Stat>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, TS)]
#[ts(export, export_to = "../../bindings/page-editor.ts")]
#[serde(rename_all = "camelCase", default)]
pub struct Guarantee {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, TS)]
#[ts(export, export_to = "../../bindings/page-editor.ts")]
#[serde(rename_all = "camelCase", default)]
pub struct GuaranteesSection {
    pub title: String,
    pub items: Vec<Guarantee>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, TS)]
#[ts(export, export_to = "../../bindings/page-editor.ts")]
#[serde(rename_all = "camelCase", default)]
pub struct FaqItem {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, TS)]
#[ts(export, export_to = "../../bindings/page-editor.ts")]
#[serde(rename_all = "camelCase", default)]
pub struct FaqSection {
    pub title: String,
    pub items: Vec<FaqItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, TS)]
#[ts(export, export_to = "../../bindings/page-editor.ts")]
#[serde(rename_all = "camelCase", default)]
pub struct CtaSection {
    pub headline: String,
    pub subheadline: String,
    pub button_text: String,
    pub button_link: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, TS)]
#[ts(export, export_to = "../../bindings/page-editor.ts")]
#[serde(rename_all = "camelCase", default)]
pub struct UrgencySection {
    pub enabled: bool,
    pub message: String,
    pub deadline: Option<String>,
}

/// Typed view of a content document, for renderers and validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, TS)]
#[ts(export, export_to = "../../bindings/page-editor.ts")]
#[serde(rename_all = "camelCase", default)]
pub struct PageContent {
    pub business: BusinessInfo,
    pub hero: HeroSection,
    pub problem_section: ProblemSection,
    pub features: Vec<Feature>,
    pub social_proof: SocialProofSection,
    pub guarantees: GuaranteesSection,
    pub faq: FaqSection,
    pub cta: CtaSection,
    pub urgency: UrgencySection,
    pub section_order: Vec<String>,
}

// ============================================================================
// Document
// ============================================================================

/// The hard-coded structural defaults every loaded document is merged over.
pub fn default_tree() -> serde_json::Value {
    json!({
        "business": {
            "name": "",
            "tagline": "",
            "industry": "",
            "logoUrl": "",
        },
        "hero": {
            "headline": "",
            "subheadline": "",
            "ctaText": "Get Started",
            "ctaLink": "#cta",
            "imageUrl": "",
        },
        "problemSection": {
            "title": "The Problem",
            "description": "",
            "painPoints": [],
        },
        "features": [],
        "socialProof": {
            "title": "What Our Customers Say",
            "testimonials": [],
            "stats": [],
        },
        "guarantees": {
            "title": "Our Guarantee",
            "items": [],
        },
        "faq": {
            "title": "Frequently Asked Questions",
            "items": [],
        },
        "cta": {
            "headline": "Ready to get started?",
            "subheadline": "",
            "buttonText": "Get Started",
            "buttonLink": "#",
        },
        "urgency": {
            "enabled": false,
            "message": "",
            "deadline": null,
        },
        "sectionOrder": DEFAULT_SECTION_ORDER,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentDocument {
    root: Node,
}

impl Default for ContentDocument {
    fn default() -> Self {
        materialize(&Node::Null)
    }
}

/// Merge a partial document over the structural defaults.
///
/// The [`MERGED_SECTIONS`] merge one level deep: supplied fields override,
/// absent fields keep the default. Other sections, arrays and scalars replace
/// the default outright.
/// A supplied value whose kind contradicts an object/array default is
/// ignored. Null counts as absent. Unknown keys pass through untouched.
/// Total over any input.
pub fn materialize(loaded: &Node) -> ContentDocument {
    let defaults = Node::from(default_tree());
    let mut merged: NodeMap = defaults.as_object().cloned().unwrap_or_default();

    if let Some(loaded) = loaded.as_object() {
        for (key, value) in loaded {
            if value.is_null() {
                continue;
            }
            if key == SECTION_ORDER_KEY {
                if let Some(order) = normalize_order(value) {
                    merged.insert(key.clone(), order);
                }
                continue;
            }
            let replacement = match (merged.get(key), value) {
                (Some(Node::Object(base)), Node::Object(over))
                    if MERGED_SECTIONS.contains(&key.as_str()) =>
                {
                    let mut section = (**base).clone();
                    for (field, field_value) in over.iter() {
                        section.insert(field.clone(), field_value.clone());
                    }
                    Some(Node::Object(Arc::new(section)))
                }
                (Some(Node::Object(_)), Node::Object(_)) => Some(value.clone()),
                (Some(Node::Object(_)), _) => None,
                (Some(Node::Array(_)), Node::Array(_)) => Some(value.clone()),
                (Some(Node::Array(_)), _) => None,
                _ => Some(value.clone()),
            };
            if let Some(replacement) = replacement {
                merged.insert(key.clone(), replacement);
            }
        }
    }

    ensure_ordered_sections(&mut merged);
    ContentDocument {
        root: Node::from_map(merged),
    }
}

fn normalize_order(value: &Node) -> Option<Node> {
    let items = value.as_array()?;
    let keys: Vec<Node> = items
        .iter()
        .filter(|item| item.as_str().is_some_and(|s| !s.trim().is_empty()))
        .cloned()
        .collect();
    Some(Node::Array(Arc::new(keys)))
}

/// Keys named by `sectionOrder` that are absent or null.
fn missing_ordered_sections(map: &NodeMap) -> Vec<String> {
    map.get(SECTION_ORDER_KEY)
        .and_then(Node::as_array)
        .map(|order| {
            order
                .iter()
                .filter_map(Node::as_str)
                .filter(|key| map.get(*key).map_or(true, Node::is_null))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Fill every ordered section that is absent or null with its default, or an
/// empty object for sections without one.
fn ensure_ordered_sections(map: &mut NodeMap) {
    let missing = missing_ordered_sections(map);
    if missing.is_empty() {
        return;
    }
    let defaults = default_tree();
    for key in missing {
        let section = defaults
            .get(&key)
            .map(Node::from)
            .unwrap_or_else(Node::empty_object);
        map.insert(key, section);
    }
}

impl ContentDocument {
    pub fn from_value(value: &serde_json::Value) -> Self {
        materialize(&Node::from(value))
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn to_value(&self) -> serde_json::Value {
        self.root.to_value()
    }

    pub fn get(&self, path: &str) -> Option<&Node> {
        self.root.get_path(path.split('.'))
    }

    fn text(&self, section: &str, field: &str) -> &str {
        self.root
            .get_path([section, field])
            .and_then(Node::as_str)
            .unwrap_or("")
    }

    pub fn business_name(&self) -> &str {
        self.text("business", "name")
    }

    pub fn hero_headline(&self) -> &str {
        self.text("hero", "headline")
    }

    pub fn section_order(&self) -> Vec<&str> {
        self.root
            .get(SECTION_ORDER_KEY)
            .and_then(Node::as_array)
            .map(|order| order.iter().filter_map(Node::as_str).collect())
            .unwrap_or_default()
    }

    /// Typed view; fails if a known field holds the wrong kind of value.
    pub fn to_page_content(&self) -> Result<PageContent, ContentError> {
        serde_json::from_value(self.to_value()).map_err(|e| ContentError::Malformed(e.to_string()))
    }

    /// Set one field, returning the new document. `self` is untouched.
    pub fn apply_patch(&self, path: &str, value: serde_json::Value) -> Result<Self, PatchError> {
        let path = FieldPath::parse(path)?;
        let root = set_path(&self.root, &path, Node::from(value))?;
        // Re-establish the section order invariant, copying the top level
        // only when a patch broke it.
        let broken = root
            .as_object()
            .is_some_and(|map| !missing_ordered_sections(map).is_empty());
        let root = if broken {
            let mut map = root.as_object().cloned().unwrap_or_default();
            ensure_ordered_sections(&mut map);
            Node::from_map(map)
        } else {
            root
        };
        Ok(Self { root })
    }

    /// Apply patches in order; all or nothing.
    pub fn apply_patches(&self, patches: &[FieldPatch]) -> Result<Self, PatchError> {
        patches
            .iter()
            .try_fold(self.clone(), |doc, patch| doc.apply_patch(&patch.path, patch.value.clone()))
    }

    /// Flat representation sent to the generator: content keys plus `theme`.
    pub fn with_theme(&self, theme: serde_json::Value) -> serde_json::Value {
        let mut value = self.to_value();
        if let Some(map) = value.as_object_mut() {
            map.insert(THEME_KEY.to_string(), theme);
        }
        value
    }
}

/// `apply_patch` as a free function over a document.
pub fn apply_patch(
    doc: &ContentDocument,
    path: &str,
    value: serde_json::Value,
) -> Result<ContentDocument, PatchError> {
    doc.apply_patch(path, value)
}

/// Validate a flat generated document and split it into content and theme.
///
/// Known sections must have the kind of their default, `sectionOrder` must be
/// a list, and the business name and hero copy must be non-empty. Nothing is
/// materialized unless every check passes.
pub fn split_generated(
    raw: &serde_json::Value,
) -> Result<(ContentDocument, Option<serde_json::Value>), ContentError> {
    let Some(object) = raw.as_object() else {
        return Err(ContentError::NotAnObject(Node::from(raw).kind()));
    };

    let defaults = default_tree();
    for (key, value) in object {
        if value.is_null() || key == THEME_KEY {
            continue;
        }
        let expected = match defaults.get(key) {
            Some(serde_json::Value::Object(_)) => "object",
            Some(serde_json::Value::Array(_)) => "array",
            _ => continue,
        };
        let found = Node::from(value).kind();
        if found != expected {
            return Err(ContentError::WrongKind {
                section: key.clone(),
                expected,
                found,
            });
        }
    }

    for (section, field) in REQUIRED_FIELDS {
        let present = raw
            .get(section)
            .and_then(|s| s.get(field))
            .and_then(serde_json::Value::as_str)
            .is_some_and(|s| !s.trim().is_empty());
        if !present {
            return Err(ContentError::MissingField(format!("{section}.{field}")));
        }
    }

    let mut content = object.clone();
    let theme = content.remove(THEME_KEY).filter(|t| !t.is_null());
    let document = materialize(&Node::from(serde_json::Value::Object(content)));
    document.to_page_content()?;
    Ok((document, theme))
}

impl Serialize for ContentDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.root.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ContentDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Node::deserialize(deserializer).map(|node| materialize(&node))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ContentDocument {
        ContentDocument::from_value(&json!({
            "business": {"name": "Crumb & Co"},
            "hero": {"headline": "Bread daily", "subheadline": "Since 1984"},
            "features": [{"title": "Sourdough"}],
            "faq": {"items": [{"question": "Gluten free?", "answer": "Some"}]},
        }))
    }

    #[test]
    fn test_materialize_empty_is_default() {
        let empty = materialize(&Node::from(json!({})));
        assert_eq!(empty.to_value(), default_tree());
        assert_eq!(empty, ContentDocument::default());
        assert_eq!(materialize(&Node::Null).to_value(), default_tree());
    }

    #[test]
    fn test_materialize_merges_one_level() {
        let doc = materialize(&Node::from(json!({"hero": {"headline": "X"}})));
        let hero = doc.to_value()["hero"].clone();
        assert_eq!(hero["headline"], "X");
        assert_eq!(hero["subheadline"], "");
        assert_eq!(hero["ctaText"], "Get Started");
        assert_eq!(hero["ctaLink"], "#cta");
    }

    #[test]
    fn test_materialize_replaces_unlisted_sections() {
        let doc = materialize(&Node::from(json!({"cta": {"headline": "X"}})));
        assert_eq!(doc.to_value()["cta"], json!({"headline": "X"}));
        assert_eq!(doc.to_page_content().unwrap().cta.button_text, "");

        let doc = materialize(&Node::from(json!({"cta": "nope"})));
        assert_eq!(doc.to_value()["cta"], default_tree()["cta"]);
    }

    #[test]
    fn test_materialize_replaces_arrays() {
        let doc = materialize(&Node::from(json!({
            "problemSection": {"painPoints": ["slow", "pricey"]},
            "features": [{"title": "A"}],
        })));
        let value = doc.to_value();
        assert_eq!(value["problemSection"]["painPoints"], json!(["slow", "pricey"]));
        assert_eq!(value["problemSection"]["title"], "The Problem");
        assert_eq!(value["features"], json!([{"title": "A"}]));
    }

    #[test]
    fn test_materialize_passes_unknown_keys_and_ignores_bad_kinds() {
        let doc = materialize(&Node::from(json!({
            "pricing": {"tiers": 3},
            "hero": "not an object",
            "features": {"title": "wrong"},
            "faq": null,
        })));
        let value = doc.to_value();
        assert_eq!(value["pricing"], json!({"tiers": 3}));
        assert_eq!(value["hero"], default_tree()["hero"]);
        assert_eq!(value["features"], json!([]));
        assert_eq!(value["faq"], default_tree()["faq"]);
    }

    #[test]
    fn test_materialize_section_order_invariant() {
        let doc = materialize(&Node::from(json!({
            "sectionOrder": ["hero", "pricing", 7, ""],
        })));
        assert_eq!(doc.section_order(), vec!["hero", "pricing"]);
        assert!(doc.get("pricing").is_some_and(Node::is_object));
        assert!(doc.get("faq").is_some());
    }

    #[test]
    fn test_apply_patch_does_not_touch_original() {
        let doc = sample();
        let patched = doc.apply_patch("hero.headline", json!("Fresh bread")).unwrap();
        assert_eq!(doc.hero_headline(), "Bread daily");
        assert_eq!(patched.hero_headline(), "Fresh bread");
    }

    #[test]
    fn test_apply_patch_preserves_off_path_fields() {
        let doc = sample();
        let patched = doc.apply_patch("hero.headline", json!("New")).unwrap();
        let mut before = doc.to_value();
        let mut after = patched.to_value();
        before["hero"]["headline"] = json!(null);
        after["hero"]["headline"] = json!(null);
        assert_eq!(before, after);
        assert!(patched
            .get("faq")
            .unwrap()
            .shares_storage_with(doc.get("faq").unwrap()));
        assert!(patched
            .get("business")
            .unwrap()
            .shares_storage_with(doc.get("business").unwrap()));
    }

    #[test]
    fn test_disjoint_patches_commute() {
        let doc = sample();
        let cases = [
            ("hero.headline", json!("A"), "hero.subheadline", json!("B")),
            ("faq.items", json!([]), "business.name", json!("Other")),
            ("pricing.basic", json!(9), "hero.ctaText", json!("Go")),
            ("socialProof.stats", json!([{"value": 98, "label": "happy"}]), "urgency.enabled", json!(true)),
        ];
        for (p1, v1, p2, v2) in cases {
            let ab = doc
                .apply_patch(p1, v1.clone())
                .and_then(|d| d.apply_patch(p2, v2.clone()))
                .unwrap();
            let ba = doc
                .apply_patch(p2, v2)
                .and_then(|d| d.apply_patch(p1, v1))
                .unwrap();
            assert_eq!(ab, ba, "patches {p1} and {p2} should commute");
        }
    }

    #[test]
    fn test_apply_patch_creates_new_section() {
        let doc = sample();
        let patched = doc.apply_patch("pricing.title", json!("Plans")).unwrap();
        assert_eq!(patched.to_value()["pricing"], json!({"title": "Plans"}));
    }

    #[test]
    fn test_section_order_patch_keeps_invariant() {
        let doc = sample();
        let patched = doc
            .apply_patch("sectionOrder", json!(["hero", "gallery", "faq"]))
            .unwrap();
        assert_eq!(patched.section_order(), vec!["hero", "gallery", "faq"]);
        assert_eq!(patched.to_value()["gallery"], json!({}));
    }

    #[test]
    fn test_nulling_an_ordered_section_restores_its_default() {
        let doc = materialize(&Node::Null);
        let patched = doc.apply_patch("faq", json!(null)).unwrap();
        assert!(patched.section_order().contains(&"faq"));
        assert_eq!(patched.to_value()["faq"], default_tree()["faq"]);

        let doc = sample()
            .apply_patch("sectionOrder", json!(["hero", "gallery"]))
            .unwrap();
        let patched = doc.apply_patch("gallery", json!(null)).unwrap();
        assert_eq!(patched.to_value()["gallery"], json!({}));

        // Sections outside the order may be cleared.
        let patched = doc.apply_patch("faq", json!(null)).unwrap();
        assert!(patched.get("faq").is_some_and(Node::is_null));
    }

    #[test]
    fn test_apply_patches_is_all_or_nothing() {
        let doc = sample();
        let err = doc
            .apply_patches(&[
                FieldPatch::new("hero.headline", json!("ok")),
                FieldPatch::new("hero.headline.oops", json!("bad")),
            ])
            .unwrap_err();
        assert!(matches!(err, PatchError::NotAnObject { .. }));
        assert_eq!(doc.hero_headline(), "Bread daily");
    }

    #[test]
    fn test_split_generated_requires_fields() {
        let err = split_generated(&json!({"hero": {"headline": ""}})).unwrap_err();
        assert_eq!(err, ContentError::MissingField("business.name".to_string()));

        let err = split_generated(&json!({
            "business": {"name": "Acme"},
            "hero": {"headline": "Hi"},
        }))
        .unwrap_err();
        assert_eq!(err, ContentError::MissingField("hero.subheadline".to_string()));
    }

    #[test]
    fn test_split_generated_rejects_wrong_kinds() {
        let err = split_generated(&json!({
            "business": {"name": "Acme"},
            "hero": {"headline": "Hi", "subheadline": "There"},
            "features": {"title": "not a list"},
        }))
        .unwrap_err();
        assert!(matches!(err, ContentError::WrongKind { .. }));
        assert!(split_generated(&json!(["nope"])).is_err());
        assert!(split_generated(&json!({
            "business": {"name": "Acme"},
            "hero": {"headline": "Hi", "subheadline": "There"},
            "faq": {"items": "nope"},
        }))
        .is_err());
    }

    #[test]
    fn test_split_generated_separates_theme() {
        let (doc, theme) = split_generated(&json!({
            "business": {"name": "Acme"},
            "hero": {"headline": "Hi", "subheadline": "There"},
            "theme": {"mode": "dark"},
        }))
        .unwrap();
        assert_eq!(theme, Some(json!({"mode": "dark"})));
        assert!(doc.get("theme").is_none());
        assert_eq!(doc.business_name(), "Acme");
        assert_eq!(doc.to_value()["hero"]["ctaText"], "Get Started");
    }

    #[test]
    fn test_deserialize_materializes() {
        let doc: ContentDocument = serde_json::from_value(json!({"business": {"name": "Acme"}})).unwrap();
        assert_eq!(doc.business_name(), "Acme");
        assert_eq!(doc.section_order().len(), DEFAULT_SECTION_ORDER.len());
    }
}
