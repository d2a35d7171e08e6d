//! # Block Model
//!
//! A block is one content unit of a blog document. The four kinds are a
//! closed set, serialized internally tagged on `"type"`:
//!
//! ```json
//! { "type": "header", "id": "block-1718000000000-k3j9x0a1b", "level": 2, "preset": "red", "content": "Hello" }
//! { "type": "list", "id": "...", "listType": "dl", "items": [{ "term": "A", "definition": "B" }] }
//! ```
//!
//! ## Identity
//!
//! Ids look like `block-<millis>-<random>`. They are assigned once (by
//! `add_block`, or by import/merge code for blocks that arrive without one)
//! and never change afterwards. Uniqueness is probabilistic: two ids minted
//! in the same millisecond collide only if their 9-character random suffixes
//! match, which is an accepted risk.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

use crate::clock::Clock;

/// Stable block identifier. Empty means "not yet assigned".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for BlockId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl PartialEq<str> for BlockId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for BlockId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Mint a fresh block id from the context clock.
pub fn generate_id(clock: &dyn Clock) -> BlockId {
    let random = Uuid::new_v4().simple().to_string();
    BlockId(format!("block-{}-{}", clock.now_millis(), &random[..9]))
}

/// Assign ids to blocks lacking one. Returns how many were assigned.
///
/// Running it again on the result assigns nothing.
pub fn ensure_block_ids(blocks: &mut [Block], clock: &dyn Clock) -> usize {
    let mut assigned = 0;
    for block in blocks.iter_mut() {
        if block.id().is_empty() {
            block.set_id(generate_id(clock));
            assigned += 1;
        }
    }
    assigned
}

/// Re-key later occurrences of an id already seen earlier in `blocks`.
///
/// Also fills in missing ids. Returns how many blocks were re-keyed.
pub fn dedupe_block_ids(blocks: &mut [Block], clock: &dyn Clock) -> usize {
    let mut seen = HashSet::new();
    let mut rekeyed = 0;
    for block in blocks.iter_mut() {
        if block.id().is_empty() || seen.contains(block.id()) {
            let mut fresh = generate_id(clock);
            while seen.contains(&fresh) {
                fresh = generate_id(clock);
            }
            block.set_id(fresh);
            rekeyed += 1;
        }
        seen.insert(block.id().clone());
    }
    rekeyed
}

/// A content block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Block {
    Header(HeaderBlock),
    Paragraph(ParagraphBlock),
    List(ListBlock),
    Card(CardBlock),
}

/// Discriminant of [`Block`] without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Header,
    Paragraph,
    List,
    Card,
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Header => "header",
            BlockKind::Paragraph => "paragraph",
            BlockKind::List => "list",
            BlockKind::Card => "card",
        }
    }
}

impl Block {
    pub fn paragraph(content: impl Into<String>) -> Self {
        Block::Paragraph(ParagraphBlock {
            id: BlockId::default(),
            variant: ParagraphVariant::Normal,
            content: content.into(),
        })
    }

    /// Header block; `level` is clamped into `1..=4`.
    pub fn header(level: u8, content: impl Into<String>) -> Self {
        Block::Header(HeaderBlock {
            id: BlockId::default(),
            level: HeaderLevel::clamped(level as i64),
            preset: HeaderPreset::Default,
            content: content.into(),
        })
    }

    /// List block; items are conformed to `list_type`.
    pub fn list(list_type: ListType, items: Vec<ListItem>) -> Self {
        let mut list = ListBlock {
            id: BlockId::default(),
            list_type,
            items,
        };
        list.conform_items();
        Block::List(list)
    }

    pub fn card(subtype: CardSubtype, cards: Vec<CardItem>) -> Self {
        Block::Card(CardBlock {
            id: BlockId::default(),
            subtype,
            cards,
        })
    }

    /// Builder-style id override, mostly for fixtures.
    pub fn with_id(mut self, id: impl Into<BlockId>) -> Self {
        self.set_id(id.into());
        self
    }

    pub fn id(&self) -> &BlockId {
        match self {
            Block::Header(b) => &b.id,
            Block::Paragraph(b) => &b.id,
            Block::List(b) => &b.id,
            Block::Card(b) => &b.id,
        }
    }

    pub(crate) fn set_id(&mut self, id: BlockId) {
        match self {
            Block::Header(b) => b.id = id,
            Block::Paragraph(b) => b.id = id,
            Block::List(b) => b.id = id,
            Block::Card(b) => b.id = id,
        }
    }

    pub fn kind(&self) -> BlockKind {
        match self {
            Block::Header(_) => BlockKind::Header,
            Block::Paragraph(_) => BlockKind::Paragraph,
            Block::List(_) => BlockKind::List,
            Block::Card(_) => BlockKind::Card,
        }
    }

    /// Heading level for headers, `None` for every other kind.
    pub fn header_level(&self) -> Option<u8> {
        match self {
            Block::Header(h) => Some(h.level.get()),
            _ => None,
        }
    }

    /// Rich-text content for headers and paragraphs.
    pub fn content(&self) -> Option<&str> {
        match self {
            Block::Header(h) => Some(&h.content),
            Block::Paragraph(p) => Some(&p.content),
            _ => None,
        }
    }

    /// True for list blocks with no non-blank item.
    pub fn is_empty_list(&self) -> bool {
        match self {
            Block::List(list) => list.items.iter().all(|item| item.is_blank()),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderBlock {
    #[serde(default)]
    pub id: BlockId,
    #[serde(default)]
    pub level: HeaderLevel,
    #[serde(default)]
    pub preset: HeaderPreset,
    #[serde(default)]
    pub content: String,
}

/// Heading level, always within `1..=4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct HeaderLevel(u8);

impl HeaderLevel {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 4;

    pub fn new(level: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&level).then_some(Self(level))
    }

    /// Clamp any integer into the valid range.
    pub fn clamped(level: i64) -> Self {
        Self(level.clamp(Self::MIN as i64, Self::MAX as i64) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for HeaderLevel {
    fn default() -> Self {
        Self(2)
    }
}

impl TryFrom<u8> for HeaderLevel {
    type Error = String;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        HeaderLevel::new(level).ok_or_else(|| format!("header level {} outside 1..=4", level))
    }
}

impl From<HeaderLevel> for u8 {
    fn from(level: HeaderLevel) -> Self {
        level.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderPreset {
    #[default]
    Default,
    Red,
    Blue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParagraphBlock {
    #[serde(default)]
    pub id: BlockId,
    #[serde(default)]
    pub variant: ParagraphVariant,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParagraphVariant {
    #[default]
    Normal,
    Small,
    SmallGray,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBlock {
    #[serde(default)]
    pub id: BlockId,
    #[serde(default)]
    pub list_type: ListType,
    #[serde(default)]
    pub items: Vec<ListItem>,
}

impl ListBlock {
    /// Rewrite every item into the shape `list_type` expects.
    pub fn conform_items(&mut self) {
        let list_type = self.list_type;
        for item in self.items.iter_mut() {
            *item = item.clone().conform_to(list_type);
        }
    }

    /// True when every item already has the shape `list_type` expects.
    pub fn items_conform(&self) -> bool {
        self.items.iter().all(|item| item.matches(self.list_type))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListType {
    #[default]
    Ul,
    Ol,
    OlTitle,
    Dl,
}

impl ListType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "ul" | "bullet" | "bullets" | "unordered" => Some(ListType::Ul),
            "ol" | "numbered" | "ordered" => Some(ListType::Ol),
            "ol-title" | "ol_title" | "oltitle" => Some(ListType::OlTitle),
            "dl" | "definition" | "definitions" => Some(ListType::Dl),
            _ => None,
        }
    }
}

/// One list entry; the active shape depends on the list's [`ListType`].
///
/// On input the keys present pick the shape (`term`/`definition`, then
/// `title`, else plain) and missing fields read as empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ListItem {
    /// `dl`
    Definition { term: String, definition: String },
    /// `ol-title`
    Titled { title: String, content: String },
    /// `ul` / `ol`
    Plain { content: String },
}

#[derive(Deserialize)]
struct RawListItem {
    term: Option<String>,
    definition: Option<String>,
    title: Option<String>,
    content: Option<String>,
}

impl From<RawListItem> for ListItem {
    fn from(raw: RawListItem) -> Self {
        let RawListItem {
            term,
            definition,
            title,
            content,
        } = raw;

        if term.is_some() || definition.is_some() {
            ListItem::Definition {
                term: term.unwrap_or_default(),
                definition: definition.unwrap_or_default(),
            }
        } else if let Some(title) = title {
            ListItem::Titled {
                title,
                content: content.unwrap_or_default(),
            }
        } else {
            ListItem::Plain {
                content: content.unwrap_or_default(),
            }
        }
    }
}

impl<'de> Deserialize<'de> for ListItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawListItem::deserialize(deserializer).map(ListItem::from)
    }
}

impl ListItem {
    pub fn plain(content: impl Into<String>) -> Self {
        ListItem::Plain {
            content: content.into(),
        }
    }

    pub fn titled(title: impl Into<String>, content: impl Into<String>) -> Self {
        ListItem::Titled {
            title: title.into(),
            content: content.into(),
        }
    }

    pub fn definition(term: impl Into<String>, definition: impl Into<String>) -> Self {
        ListItem::Definition {
            term: term.into(),
            definition: definition.into(),
        }
    }

    pub fn matches(&self, list_type: ListType) -> bool {
        matches!(
            (self, list_type),
            (ListItem::Plain { .. }, ListType::Ul | ListType::Ol)
                | (ListItem::Titled { .. }, ListType::OlTitle)
                | (ListItem::Definition { .. }, ListType::Dl)
        )
    }

    pub fn is_blank(&self) -> bool {
        match self {
            ListItem::Plain { content } => content.trim().is_empty(),
            ListItem::Titled { title, content } => title.trim().is_empty() && content.trim().is_empty(),
            ListItem::Definition { term, definition } => {
                term.trim().is_empty() && definition.trim().is_empty()
            }
        }
    }

    fn conform_to(self, list_type: ListType) -> Self {
        if self.matches(list_type) {
            return self;
        }
        match (self, list_type) {
            (ListItem::Titled { title, content }, ListType::Ul | ListType::Ol) => ListItem::Plain {
                content: if content.is_empty() { title } else { content },
            },
            (ListItem::Definition { term, definition }, ListType::Ul | ListType::Ol) => ListItem::Plain {
                content: if definition.is_empty() { term } else { definition },
            },
            (ListItem::Plain { content }, ListType::OlTitle) => ListItem::Titled {
                title: String::new(),
                content,
            },
            (ListItem::Definition { term, definition }, ListType::OlTitle) => ListItem::Titled {
                title: term,
                content: definition,
            },
            (ListItem::Plain { content }, ListType::Dl) => ListItem::Definition {
                term: content,
                definition: String::new(),
            },
            (ListItem::Titled { title, content }, ListType::Dl) => ListItem::Definition {
                term: title,
                definition: content,
            },
            (item, _) => item,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardBlock {
    #[serde(default)]
    pub id: BlockId,
    #[serde(default)]
    pub subtype: CardSubtype,
    #[serde(default)]
    pub cards: Vec<CardItem>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardSubtype {
    #[default]
    #[serde(rename = "2-col")]
    TwoCol,
    #[serde(rename = "3-col")]
    ThreeCol,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub alt: String,
}
