//! # Draft Normalization
//!
//! Turns loosely shaped JSON (imported files, AI responses) into typed
//! blocks. Every field is read through an ordered alias list; the first
//! alias that is present and non-null wins, even if it holds an empty
//! string. Dotted aliases address nested objects (`data.text`).
//!
//! Coercions:
//! - unknown or missing block type → paragraph
//! - header level from a number, `"2"` or `"h2"`, clamped to 1..=4
//! - unknown enum values → the field's default
//! - list items reshaped to the list type
//! - paragraphs whose lines are mostly bullets/ordinals → list blocks
//!
//! Ids are carried over when present and left empty otherwise; callers
//! assign ids afterwards.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use crate::block::{
    Block, BlockId, CardBlock, CardItem, CardSubtype, HeaderBlock, HeaderLevel, HeaderPreset,
    ListBlock, ListItem, ListType, ParagraphBlock, ParagraphVariant,
};
use crate::clock::Millis;
use crate::document::EditorDocument;

const DOC_TITLE: &[&str] = &["title", "name", "draft.title"];
const DOC_BLOCKS: &[&str] = &["blocks", "draft.blocks"];

const BLOCK_TYPE: &[&str] = &["type", "blockType"];
const BLOCK_TEXT: &[&str] = &["content", "text", "data.text", "data.content"];
const HEADER_LEVEL: &[&str] = &["level", "data.level"];
const HEADER_PRESET: &[&str] = &["preset", "data.preset"];
const PARAGRAPH_VARIANT: &[&str] = &["variant", "data.variant"];

const LIST_TYPE: &[&str] = &["listType", "list_type", "data.listType"];
const LIST_ITEMS: &[&str] = &["items", "data.items"];
const ITEM_TEXT: &[&str] = &["content", "text", "title"];
const ITEM_TITLE: &[&str] = &["title"];
const ITEM_CONTENT: &[&str] = &["content", "text"];
const ITEM_TERM: &[&str] = &["term", "title"];
const ITEM_DEFINITION: &[&str] = &["definition", "content"];

const CARD_SUBTYPE: &[&str] = &["subtype", "layout", "data.subtype"];
const CARD_LIST: &[&str] = &["cards", "items", "data.cards"];
const CARD_TITLE: &[&str] = &["title"];
const CARD_CONTENT: &[&str] = &["content", "text"];
const CARD_IMAGE: &[&str] = &["image", "src"];
const CARD_ALT: &[&str] = &["alt"];

const DRAFT_UPDATED_AT: &[&str] = &["updatedAt", "updated_at"];

/// Share of lines that must carry a list marker before a paragraph becomes a list.
const LIST_LINE_RATIO: f64 = 0.6;

static BULLET_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-*•]\s+(.*)$").expect("valid bullet pattern"));
static ORDINAL_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+[.)]\s+(.*)$").expect("valid ordinal pattern"));
static LINE_BREAK_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid line break pattern"));

/// A draft object read from an import file.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedDraft {
    pub id: Option<String>,
    pub name: Option<String>,
    pub document: EditorDocument,
    pub timestamp: Option<Millis>,
    pub updated_at: Option<Millis>,
}

/// Normalize a whole document. A bare array is read as the block list.
pub fn normalize_document(value: &Value) -> EditorDocument {
    if let Value::Array(_) = value {
        return EditorDocument::new(String::new(), normalize_blocks(value));
    }

    let title = first_string(value, DOC_TITLE).unwrap_or_default();
    let blocks = first_value(value, DOC_BLOCKS)
        .map(normalize_blocks)
        .unwrap_or_default();

    EditorDocument::new(title, blocks)
}

/// Normalize an import-file draft.
pub fn normalize_draft(value: &Value) -> NormalizedDraft {
    let id = first_string(value, &["id"]).filter(|id| !id.trim().is_empty());
    let name = first_string(value, &["name"]);
    let title = first_string(value, &["title"])
        .or_else(|| name.clone())
        .unwrap_or_default();
    let blocks = first_value(value, DOC_BLOCKS)
        .map(normalize_blocks)
        .unwrap_or_default();

    NormalizedDraft {
        id,
        name,
        document: EditorDocument::new(title, blocks),
        timestamp: first_value(value, &["timestamp"]).and_then(Value::as_i64),
        updated_at: first_value(value, DRAFT_UPDATED_AT).and_then(Value::as_i64),
    }
}

/// Normalize a block list; non-array input yields no blocks.
pub fn normalize_blocks(value: &Value) -> Vec<Block> {
    match value {
        Value::Array(items) => items.iter().map(normalize_block).collect(),
        _ => Vec::new(),
    }
}

/// Normalize one block. Bare strings become paragraphs.
pub fn normalize_block(value: &Value) -> Block {
    if let Value::String(text) = value {
        return paragraph_or_list(BlockId::default(), ParagraphVariant::Normal, text.clone());
    }

    let id = first_string(value, &["id"]).map(BlockId::from).unwrap_or_default();
    let kind = first_string(value, BLOCK_TYPE)
        .map(|t| t.trim().to_ascii_lowercase())
        .unwrap_or_default();

    match kind.as_str() {
        "header" | "heading" => Block::Header(HeaderBlock {
            id,
            level: parse_level(first_value(value, HEADER_LEVEL)),
            preset: parse_preset(first_string(value, HEADER_PRESET)),
            content: first_string(value, BLOCK_TEXT).unwrap_or_default(),
        }),
        "list" => Block::List(normalize_list(id, value)),
        "card" | "cards" => Block::Card(normalize_card(id, value)),
        _ => paragraph_or_list(
            id,
            parse_variant(first_string(value, PARAGRAPH_VARIANT)),
            first_string(value, BLOCK_TEXT).unwrap_or_default(),
        ),
    }
}

/// Detect a bullet or numbered list written as plain lines.
///
/// Requires at least two non-empty lines and a clear majority
/// (≥ 60%, strictly more than the other marker kind). Returns the list type
/// and the lines with their markers stripped.
pub fn classify_lines(text: &str) -> Option<(ListType, Vec<String>)> {
    let text = LINE_BREAK_TAG.replace_all(text, "\n");
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    if lines.len() < 2 {
        return None;
    }

    let bullets = lines.iter().filter(|l| BULLET_LINE.is_match(l)).count();
    let ordinals = lines.iter().filter(|l| ORDINAL_LINE.is_match(l)).count();
    let total = lines.len() as f64;
    let bullet_ratio = bullets as f64 / total;
    let ordinal_ratio = ordinals as f64 / total;

    let list_type = if bullet_ratio >= LIST_LINE_RATIO && bullet_ratio > ordinal_ratio {
        ListType::Ul
    } else if ordinal_ratio >= LIST_LINE_RATIO && ordinal_ratio > bullet_ratio {
        ListType::Ol
    } else {
        return None;
    };

    let items = lines
        .iter()
        .map(|line| strip_marker(line).to_string())
        .collect();

    Some((list_type, items))
}

fn strip_marker(line: &str) -> &str {
    for pattern in [&*BULLET_LINE, &*ORDINAL_LINE] {
        if let Some(rest) = pattern.captures(line).and_then(|c| c.get(1)) {
            return rest.as_str();
        }
    }
    line
}

fn paragraph_or_list(id: BlockId, variant: ParagraphVariant, content: String) -> Block {
    match classify_lines(&content) {
        Some((list_type, lines)) => Block::List(ListBlock {
            id,
            list_type,
            items: lines.into_iter().map(ListItem::plain).collect(),
        }),
        None => Block::Paragraph(ParagraphBlock {
            id,
            variant,
            content,
        }),
    }
}

fn normalize_list(id: BlockId, value: &Value) -> ListBlock {
    let list_type = first_string(value, LIST_TYPE)
        .and_then(|t| ListType::parse(&t))
        .unwrap_or_default();

    let items = match first_value(value, LIST_ITEMS) {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| normalize_list_item(item, list_type))
            .collect(),
        _ => first_string(value, BLOCK_TEXT)
            .map(|text| {
                text.lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(|l| ListItem::plain(strip_marker(l)))
                    .collect()
            })
            .unwrap_or_default(),
    };

    let mut list = ListBlock {
        id,
        list_type,
        items,
    };
    list.conform_items();
    list
}

fn normalize_list_item(item: &Value, list_type: ListType) -> ListItem {
    if let Value::String(text) = item {
        return ListItem::plain(text.clone());
    }

    match list_type {
        ListType::Ul | ListType::Ol => ListItem::plain(first_string(item, ITEM_TEXT).unwrap_or_default()),
        ListType::OlTitle => ListItem::titled(
            first_string(item, ITEM_TITLE).unwrap_or_default(),
            first_string(item, ITEM_CONTENT).unwrap_or_default(),
        ),
        ListType::Dl => ListItem::definition(
            first_string(item, ITEM_TERM).unwrap_or_default(),
            first_string(item, ITEM_DEFINITION).unwrap_or_default(),
        ),
    }
}

fn normalize_card(id: BlockId, value: &Value) -> CardBlock {
    let subtype = match first_string(value, CARD_SUBTYPE)
        .map(|s| s.trim().to_ascii_lowercase())
        .as_deref()
    {
        Some("3-col" | "3" | "three") => CardSubtype::ThreeCol,
        _ => CardSubtype::TwoCol,
    };

    let cards = match first_value(value, CARD_LIST) {
        Some(Value::Array(cards)) => cards
            .iter()
            .map(|card| CardItem {
                title: first_string(card, CARD_TITLE).unwrap_or_default(),
                content: first_string(card, CARD_CONTENT).unwrap_or_default(),
                image: first_string(card, CARD_IMAGE).unwrap_or_default(),
                alt: first_string(card, CARD_ALT).unwrap_or_default(),
            })
            .collect(),
        _ => Vec::new(),
    };

    CardBlock { id, subtype, cards }
}

fn parse_level(value: Option<&Value>) -> HeaderLevel {
    let level = match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => s
            .trim()
            .trim_start_matches(['h', 'H'])
            .parse::<i64>()
            .ok(),
        _ => None,
    };
    level.map(HeaderLevel::clamped).unwrap_or_default()
}

fn parse_preset(raw: Option<String>) -> HeaderPreset {
    match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        Some("red") => HeaderPreset::Red,
        Some("blue") => HeaderPreset::Blue,
        _ => HeaderPreset::Default,
    }
}

fn parse_variant(raw: Option<String>) -> ParagraphVariant {
    match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        Some("small") => ParagraphVariant::Small,
        Some("small-gray" | "small_gray" | "smallgray" | "small-grey") => ParagraphVariant::SmallGray,
        _ => ParagraphVariant::Normal,
    }
}

/// Resolve a dotted path inside nested objects.
fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(value, |current, segment| current.get(segment))
        .filter(|v| !v.is_null())
}

fn first_value<'a>(value: &'a Value, aliases: &[&str]) -> Option<&'a Value> {
    aliases.iter().find_map(|alias| lookup(value, alias))
}

/// First present alias rendered as a string. Numbers and booleans are
/// stringified; arrays and objects are skipped.
fn first_string(value: &Value, aliases: &[&str]) -> Option<String> {
    aliases.iter().find_map(|alias| match lookup(value, alias)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}
