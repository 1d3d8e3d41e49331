//! Content items pulled from the CMS (products, blog posts, pages)
//!
//! Each full sync replaces a whole collection, so items are plain values:
//! no field is ever patched in place.

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Kind of a content item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Product,
    Post,
    Page,
}

impl ContentKind {
    /// All kinds, in display order
    pub const ALL: [ContentKind; 3] = [ContentKind::Product, ContentKind::Post, ContentKind::Page];

    /// Heading used for the collection of this kind
    pub fn collection_label(self) -> &'static str {
        match self {
            Self::Product => "Products",
            Self::Post => "Blog Posts",
            Self::Page => "Pages",
        }
    }

    /// Parse from a user-supplied string ("product", "posts", "page", ...)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "product" | "products" => Some(Self::Product),
            "post" | "posts" | "blog" | "blogposts" => Some(Self::Post),
            "page" | "pages" => Some(Self::Page),
            _ => None,
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Product => "product",
            Self::Post => "post",
            Self::Page => "page",
        };
        f.write_str(s)
    }
}

/// Kind-specific fields, tagged by the wire `type` field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentDetails {
    Product {
        /// Store price as reported by the CMS (WooCommerce/Shopify send strings)
        #[serde(default, deserialize_with = "price_from_wire")]
        price: Option<String>,
    },
    Post {
        #[serde(default)]
        author: Option<String>,
    },
    Page,
}

impl ContentDetails {
    pub fn kind(&self) -> ContentKind {
        match self {
            Self::Product { .. } => ContentKind::Product,
            Self::Post { .. } => ContentKind::Post,
            Self::Page => ContentKind::Page,
        }
    }
}

/// Accepts `"19.99"`, `19.99` or `null`
fn price_from_wire<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(D::Error::custom(format!("invalid price: {other}"))),
    }
}

/// A single product, post or page of a connected website
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    /// Unique per website
    pub id: String,
    pub title: String,
    /// Path relative to the website domain (e.g. "/products/blue-mug")
    pub url: String,
    pub last_updated: DateTime<Utc>,
    /// AI redirects attributed to this item
    #[serde(default)]
    pub ai_redirects: u64,
    /// Body text (posts/pages)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Short description (products)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    details: ContentDetails,
}

impl ContentItem {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
        last_updated: DateTime<Utc>,
        details: ContentDetails,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: url.into(),
            last_updated,
            ai_redirects: 0,
            content: None,
            description: None,
            details,
        }
    }

    pub fn with_ai_redirects(mut self, ai_redirects: u64) -> Self {
        self.ai_redirects = ai_redirects;
        self
    }

    /// Kind is fixed at construction
    pub fn kind(&self) -> ContentKind {
        self.details.kind()
    }

    pub fn details(&self) -> &ContentDetails {
        &self.details
    }

    pub fn price(&self) -> Option<&str> {
        match &self.details {
            ContentDetails::Product { price } => price.as_deref(),
            _ => None,
        }
    }

    pub fn author(&self) -> Option<&str> {
        match &self.details {
            ContentDetails::Post { author } => author.as_deref(),
            _ => None,
        }
    }

    /// Snippet shown under the title: body text first, then description
    pub fn excerpt(&self) -> Option<&str> {
        self.content.as_deref().or(self.description.as_deref())
    }

    /// Absolute public URL of this item on `domain`
    pub fn public_url(&self, domain: &str) -> String {
        let host = domain
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/');
        if self.url.starts_with('/') {
            format!("https://{}{}", host, self.url)
        } else {
            format!("https://{}/{}", host, self.url)
        }
    }
}

/// The three content collections of a website, keyed by kind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentCollections {
    #[serde(default)]
    pub products: Vec<ContentItem>,
    #[serde(default)]
    pub blog_posts: Vec<ContentItem>,
    #[serde(default)]
    pub pages: Vec<ContentItem>,
}

impl ContentCollections {
    /// Items of the collection for `kind`
    pub fn items(&self, kind: ContentKind) -> &[ContentItem] {
        match kind {
            ContentKind::Product => &self.products,
            ContentKind::Post => &self.blog_posts,
            ContentKind::Page => &self.pages,
        }
    }

    /// All items across collections, products first
    pub fn iter(&self) -> impl Iterator<Item = &ContentItem> {
        self.products
            .iter()
            .chain(self.blog_posts.iter())
            .chain(self.pages.iter())
    }

    pub fn len(&self) -> usize {
        self.products.len() + self.blog_posts.len() + self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Items whose tag disagrees with the collection they arrived in,
    /// paired with the kind the collection expects
    pub fn mismatched(&self) -> Vec<(ContentKind, &ContentItem)> {
        ContentKind::ALL
            .iter()
            .flat_map(|&kind| {
                self.items(kind)
                    .iter()
                    .filter(move |item| item.kind() != kind)
                    .map(move |item| (kind, item))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_deserialize_product_with_string_price() {
        let json = r#"{
            "id": "p1",
            "title": "Blue Mug",
            "url": "/products/blue-mug",
            "type": "product",
            "lastUpdated": "2025-01-15T10:00:00.000Z",
            "aiRedirects": 42,
            "price": "19.99",
            "description": "A mug"
        }"#;

        let item: ContentItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.kind(), ContentKind::Product);
        assert_eq!(item.price(), Some("19.99"));
        assert_eq!(item.ai_redirects, 42);
        assert_eq!(item.excerpt(), Some("A mug"));
        assert_eq!(item.author(), None);
    }

    #[test]
    fn test_deserialize_product_with_numeric_price() {
        let json = r#"{
            "id": "p2",
            "title": "Red Mug",
            "url": "/products/red-mug",
            "type": "product",
            "lastUpdated": "2025-01-15T10:00:00Z",
            "aiRedirects": 0,
            "price": 12.5
        }"#;

        let item: ContentItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.price(), Some("12.5"));
    }

    #[test]
    fn test_deserialize_post_and_page() {
        let post: ContentItem = serde_json::from_str(
            r#"{"id":"b1","title":"Hello","url":"/hello","type":"post",
                "lastUpdated":"2025-01-15T10:00:00Z","aiRedirects":3,"author":"Sam",
                "content":"Body"}"#,
        )
        .unwrap();
        assert_eq!(post.kind(), ContentKind::Post);
        assert_eq!(post.author(), Some("Sam"));
        assert_eq!(post.excerpt(), Some("Body"));

        let page: ContentItem = serde_json::from_str(
            r#"{"id":"pg1","title":"About","url":"/about","type":"page",
                "lastUpdated":"2025-01-15T10:00:00Z","aiRedirects":1}"#,
        )
        .unwrap();
        assert_eq!(page.kind(), ContentKind::Page);
        assert_eq!(page.details(), &ContentDetails::Page);
    }

    #[test]
    fn test_negative_redirects_rejected() {
        let result: Result<ContentItem, _> = serde_json::from_str(
            r#"{"id":"x","title":"X","url":"/x","type":"page",
                "lastUpdated":"2025-01-15T10:00:00Z","aiRedirects":-1}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_type_rejected() {
        let result: Result<ContentItem, _> = serde_json::from_str(
            r#"{"id":"x","title":"X","url":"/x","type":"video",
                "lastUpdated":"2025-01-15T10:00:00Z","aiRedirects":1}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_public_url() {
        let item = ContentItem::new("1", "About", "/about", ts(), ContentDetails::Page);
        assert_eq!(item.public_url("example.com"), "https://example.com/about");
        assert_eq!(
            item.public_url("https://example.com/"),
            "https://example.com/about"
        );

        let relative = ContentItem::new("2", "Faq", "faq", ts(), ContentDetails::Page);
        assert_eq!(relative.public_url("example.com"), "https://example.com/faq");
    }

    #[test]
    fn test_collections_mismatched() {
        let collections = ContentCollections {
            products: vec![
                ContentItem::new("p1", "Mug", "/mug", ts(), ContentDetails::Product { price: None }),
                ContentItem::new("x1", "Stray", "/stray", ts(), ContentDetails::Page),
            ],
            blog_posts: vec![],
            pages: vec![ContentItem::new("pg", "About", "/about", ts(), ContentDetails::Page)],
        };

        assert_eq!(collections.len(), 3);
        let mismatched = collections.mismatched();
        assert_eq!(mismatched.len(), 1);
        assert_eq!(mismatched[0].0, ContentKind::Product);
        assert_eq!(mismatched[0].1.id, "x1");
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(ContentKind::parse("Products"), Some(ContentKind::Product));
        assert_eq!(ContentKind::parse("posts"), Some(ContentKind::Post));
        assert_eq!(ContentKind::parse("page"), Some(ContentKind::Page));
        assert_eq!(ContentKind::parse("video"), None);
    }
}
