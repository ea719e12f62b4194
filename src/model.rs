use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

// ────────────────────────────────────────────────────────────────────────────
// Document
// ────────────────────────────────────────────────────────────────────────────

/// A conversation graph: node identifier → node record.
///
/// Keys keep the order they had in the file. Edges are not stored; they are
/// derived from the `next_node_id` fields of each node (see [`Node::targets`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    nodes: IndexMap<String, Node>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a document from JSON text.
    pub fn from_json_str(s: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Serialize with two-space indentation. Non-ASCII text is written verbatim.
    pub fn to_json_string_pretty(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Position of `id` in document order.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.nodes.get_index_of(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.nodes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Node)> {
        self.nodes.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    /// Node ids in document (file) order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|k| k.as_str())
    }

    /// Node ids sorted lexicographically. This is the drawing order: later
    /// entries are painted on top of earlier ones.
    pub fn sorted_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.ids().collect();
        ids.sort_unstable();
        ids
    }

    /// Insert or replace a node, appending new ids at the end.
    pub fn insert(&mut self, id: impl Into<String>, node: Node) -> Option<Node> {
        self.nodes.insert(id.into(), node)
    }

    /// Insert at a given position in document order (clamped to the length).
    pub fn insert_at(&mut self, index: usize, id: impl Into<String>, node: Node) {
        let index = index.min(self.nodes.len());
        self.nodes.shift_insert(index, id.into(), node);
    }

    /// Remove a node, keeping the order of the others.
    pub fn remove(&mut self, id: &str) -> Option<Node> {
        self.nodes.shift_remove(id)
    }

    /// Directed edges `(source, target)` whose target exists in the document.
    ///
    /// Each target appears at most once per source, in the order returned by
    /// [`Node::targets`]. Dangling references are skipped.
    pub fn edges(&self) -> Vec<(&str, &str)> {
        let mut out = Vec::new();
        for (source, node) in self.iter() {
            let mut seen: Vec<&str> = Vec::new();
            for target in node.targets() {
                if !self.contains(target) || seen.contains(&target) {
                    continue;
                }
                seen.push(target);
                out.push((source, target));
            }
        }
        out
    }

    /// True when any node has no stored `editor_pos`.
    pub fn has_unplaced(&self) -> bool {
        self.nodes.values().any(|n| n.editor_pos.is_none())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Node
// ────────────────────────────────────────────────────────────────────────────

/// World-space position of a node's top-left corner. Stored as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct WorldPos {
    pub x: f64,
    pub y: f64,
}

impl WorldPos {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<[f64; 2]> for WorldPos {
    fn from(v: [f64; 2]) -> Self {
        Self::new(v[0], v[1])
    }
}

impl From<WorldPos> for [f64; 2] {
    fn from(p: WorldPos) -> Self {
        [p.x, p.y]
    }
}

/// Which interaction a node offers the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionKind {
    Choices,
    EntryMode,
}

/// The interaction attached to a node.
///
/// `None` is the state of a freshly created node until the author picks a
/// kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Interaction {
    #[default]
    None,
    Choices(Vec<Choice>),
    EntryMode(EntryMode),
}

impl Interaction {
    pub fn kind(&self) -> Option<InteractionKind> {
        match self {
            Interaction::None => None,
            Interaction::Choices(_) => Some(InteractionKind::Choices),
            Interaction::EntryMode(_) => Some(InteractionKind::EntryMode),
        }
    }
}

/// One dialogue state.
///
/// Attributes this editor does not know about are kept in `extra` and written
/// back unchanged, in their original place. So are known attributes whose
/// value has the wrong type.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "IndexMap<String, Value>")]
pub struct Node {
    pub sprite_text: String,
    pub sprite_image: Option<String>,
    pub editor_pos: Option<WorldPos>,
    pub interaction: Interaction,
    pub extra: IndexMap<String, Value>,
    pub key_order: KeyOrder,
}

impl Node {
    pub fn new(sprite_text: impl Into<String>) -> Self {
        Self {
            sprite_text: sprite_text.into(),
            ..Default::default()
        }
    }

    pub fn with_pos(mut self, x: f64, y: f64) -> Self {
        self.editor_pos = Some(WorldPos::new(x, y));
        self
    }

    pub fn with_interaction(mut self, interaction: Interaction) -> Self {
        self.set_interaction(interaction);
        self
    }

    /// Replace the interaction. Stale `choices` / `entry_mode` values parked in
    /// `extra` are dropped so the written record holds exactly one mode.
    pub fn set_interaction(&mut self, interaction: Interaction) {
        self.extra.shift_remove("choices");
        self.extra.shift_remove("entry_mode");
        self.interaction = interaction;
    }

    pub fn choices(&self) -> Option<&[Choice]> {
        match &self.interaction {
            Interaction::Choices(c) => Some(c),
            _ => None,
        }
    }

    pub fn choices_mut(&mut self) -> Option<&mut Vec<Choice>> {
        match &mut self.interaction {
            Interaction::Choices(c) => Some(c),
            _ => None,
        }
    }

    pub fn entry_mode(&self) -> Option<&EntryMode> {
        match &self.interaction {
            Interaction::EntryMode(e) => Some(e),
            _ => None,
        }
    }

    pub fn entry_mode_mut(&mut self) -> Option<&mut EntryMode> {
        match &mut self.interaction {
            Interaction::EntryMode(e) => Some(e),
            _ => None,
        }
    }

    /// Outgoing references in field order: choices, then secrets, then the
    /// entry-mode default. Empty ids are skipped; duplicates are kept.
    pub fn targets(&self) -> Vec<&str> {
        let mut out = Vec::new();
        match &self.interaction {
            Interaction::None => {}
            Interaction::Choices(choices) => {
                out.extend(choices.iter().map(|c| c.next_node_id.as_str()));
            }
            Interaction::EntryMode(em) => {
                out.extend(em.secrets.iter().map(|s| s.next_node_id.as_str()));
                if let Some(d) = &em.default_next_node_id {
                    out.push(d.as_str());
                }
            }
        }
        out.retain(|t| !t.is_empty());
        out
    }

    /// Whether any outgoing field points at `id`.
    pub fn references(&self, id: &str) -> bool {
        self.targets().contains(&id)
    }

    /// Rewrite every outgoing reference equal to `from`. Returns the number of
    /// fields changed. An empty `to` clears the link: `next_node_id` becomes
    /// `""` and the optional default is removed.
    pub fn retarget(&mut self, from: &str, to: &str) -> usize {
        let mut changed = 0;
        match &mut self.interaction {
            Interaction::None => {}
            Interaction::Choices(choices) => {
                for c in choices.iter_mut().filter(|c| c.next_node_id == from) {
                    c.next_node_id = to.to_string();
                    changed += 1;
                }
            }
            Interaction::EntryMode(em) => {
                for s in em.secrets.iter_mut().filter(|s| s.next_node_id == from) {
                    s.next_node_id = to.to_string();
                    changed += 1;
                }
                if em.default_next_node_id.as_deref() == Some(from) {
                    em.default_next_node_id = (!to.is_empty()).then(|| to.to_string());
                    changed += 1;
                }
            }
        }
        changed
    }
}

/// One selectable answer of a choices node.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "IndexMap<String, Value>")]
pub struct Choice {
    pub text: String,
    pub next_node_id: String,
    pub item: Option<String>,
    pub action: Option<String>,
    pub extra: IndexMap<String, Value>,
    pub key_order: KeyOrder,
}

impl Choice {
    pub fn new(text: impl Into<String>, next_node_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            next_node_id: next_node_id.into(),
            ..Default::default()
        }
    }
}

/// Free-text prompt with a list of accepted secrets.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "IndexMap<String, Value>")]
pub struct EntryMode {
    pub prompt_text: Option<String>,
    pub secrets: Vec<Secret>,
    pub default_next_node_id: Option<String>,
    pub extra: IndexMap<String, Value>,
    pub key_order: KeyOrder,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "IndexMap<String, Value>")]
pub struct Secret {
    pub input: String,
    pub next_node_id: String,
    pub extra: IndexMap<String, Value>,
    pub key_order: KeyOrder,
}

impl Secret {
    pub fn new(input: impl Into<String>, next_node_id: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            next_node_id: next_node_id.into(),
            ..Default::default()
        }
    }
}

/// Key order of a record as it was read from a file.
///
/// Records built in memory have none and are written in field order. The
/// order never makes two records compare unequal.
#[derive(Debug, Clone, Default)]
pub struct KeyOrder(Option<Vec<String>>);

impl KeyOrder {
    fn of(fields: &IndexMap<String, Value>) -> Self {
        Self(Some(fields.keys().cloned().collect()))
    }

    /// Whether a record with this history should carry `key` even when the
    /// value is empty: new records always do, loaded ones only if the file had it.
    fn expects(&self, key: &str) -> bool {
        self.0
            .as_ref()
            .is_none_or(|keys| keys.iter().any(|k| k == key))
    }
}

impl PartialEq for KeyOrder {
    fn eq(&self, _: &Self) -> bool {
        true
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Wire form
// ────────────────────────────────────────────────────────────────────────────
//
// Records are read as raw maps. A known key is taken out only when its value
// has the expected shape; anything else stays in `extra` and is written back
// as it was read, unless the field is given a value of its own.

fn take_text(fields: &mut IndexMap<String, Value>, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::String(_) => match fields.shift_remove(key) {
            Some(Value::String(s)) => Some(s),
            _ => None,
        },
        Value::Null => None,
        other => {
            log::warn!("keeping non-text {key} value {other} as is");
            None
        }
    }
}

fn take_parsed<T: DeserializeOwned>(fields: &mut IndexMap<String, Value>, key: &str) -> Option<T> {
    let value = fields.get(key).filter(|v| !v.is_null())?;
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => {
            fields.shift_remove(key);
            Some(parsed)
        }
        Err(e) => {
            log::warn!("keeping malformed {key} {value} as is: {e}");
            None
        }
    }
}

impl From<IndexMap<String, Value>> for Node {
    fn from(mut fields: IndexMap<String, Value>) -> Self {
        let key_order = KeyOrder::of(&fields);
        let sprite_text = take_text(&mut fields, "sprite_text").unwrap_or_default();
        let sprite_image = take_text(&mut fields, "sprite_image");
        let editor_pos = take_parsed(&mut fields, "editor_pos");
        let interaction = if let Some(choices) = take_parsed(&mut fields, "choices") {
            if fields.get("entry_mode").is_some_and(|v| !v.is_null()) {
                log::warn!("node has both choices and entry_mode; editing choices");
            }
            Interaction::Choices(choices)
        } else if let Some(em) = take_parsed(&mut fields, "entry_mode") {
            Interaction::EntryMode(em)
        } else {
            Interaction::None
        };
        Node {
            sprite_text,
            sprite_image,
            editor_pos,
            interaction,
            extra: fields,
            key_order,
        }
    }
}

impl From<IndexMap<String, Value>> for Choice {
    fn from(mut fields: IndexMap<String, Value>) -> Self {
        let key_order = KeyOrder::of(&fields);
        Choice {
            text: take_text(&mut fields, "text").unwrap_or_default(),
            next_node_id: take_text(&mut fields, "next_node_id").unwrap_or_default(),
            item: take_text(&mut fields, "item"),
            action: take_text(&mut fields, "action"),
            extra: fields,
            key_order,
        }
    }
}

impl From<IndexMap<String, Value>> for EntryMode {
    fn from(mut fields: IndexMap<String, Value>) -> Self {
        let key_order = KeyOrder::of(&fields);
        EntryMode {
            prompt_text: take_text(&mut fields, "prompt_text"),
            secrets: take_parsed(&mut fields, "secrets").unwrap_or_default(),
            default_next_node_id: take_text(&mut fields, "default_next_node_id"),
            extra: fields,
            key_order,
        }
    }
}

impl From<IndexMap<String, Value>> for Secret {
    fn from(mut fields: IndexMap<String, Value>) -> Self {
        let key_order = KeyOrder::of(&fields);
        Secret {
            input: take_text(&mut fields, "input").unwrap_or_default(),
            next_node_id: take_text(&mut fields, "next_node_id").unwrap_or_default(),
            extra: fields,
            key_order,
        }
    }
}

/// Collects the known fields of one record and merges them with `extra` in
/// the record's original key order. Keys the file did not have follow, known
/// fields first.
struct RecordOut<'a> {
    order: &'a KeyOrder,
    extra: &'a IndexMap<String, Value>,
    known: IndexMap<&'static str, Value>,
}

impl<'a> RecordOut<'a> {
    fn new(order: &'a KeyOrder, extra: &'a IndexMap<String, Value>) -> Self {
        Self {
            order,
            extra,
            known: IndexMap::new(),
        }
    }

    /// A field that is written whenever it is set.
    fn optional(&mut self, key: &'static str, value: Option<Value>) {
        if let Some(value) = value {
            self.known.insert(key, value);
        }
    }

    /// A field that is always part of the record. When empty it gives way to
    /// a raw value kept in `extra`, and a loaded record only gets it back if
    /// the file had it.
    fn required(&mut self, key: &'static str, value: Value, empty: bool) {
        if !empty || (!self.extra.contains_key(key) && self.order.expects(key)) {
            self.known.insert(key, value);
        }
    }

    fn text(&mut self, key: &'static str, value: &str) {
        self.required(key, Value::from(value), value.is_empty());
    }

    fn finish<S: Serializer>(self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut out: IndexMap<&str, &Value> =
            IndexMap::with_capacity(self.known.len() + self.extra.len());
        for key in self.order.0.iter().flatten() {
            if let Some(v) = self.known.get(key.as_str()).or_else(|| self.extra.get(key)) {
                out.insert(key.as_str(), v);
            }
        }
        for (key, v) in &self.known {
            out.entry(*key).or_insert(v);
        }
        for (key, v) in self.extra {
            out.entry(key.as_str()).or_insert(v);
        }
        out.serialize(serializer)
    }
}

fn to_value<T: Serialize, E: serde::ser::Error>(value: T) -> Result<Value, E> {
    serde_json::to_value(value).map_err(E::custom)
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut out = RecordOut::new(&self.key_order, &self.extra);
        out.text("sprite_text", &self.sprite_text);
        out.optional("sprite_image", self.sprite_image.as_deref().map(Value::from));
        let editor_pos = self.editor_pos.map(to_value::<_, S::Error>).transpose()?;
        let choices = self.choices().map(to_value::<_, S::Error>).transpose()?;
        let entry_mode = self.entry_mode().map(to_value::<_, S::Error>).transpose()?;
        out.optional("editor_pos", editor_pos);
        out.optional("choices", choices);
        out.optional("entry_mode", entry_mode);
        out.finish(serializer)
    }
}

impl Serialize for Choice {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut out = RecordOut::new(&self.key_order, &self.extra);
        out.text("text", &self.text);
        out.text("next_node_id", &self.next_node_id);
        out.optional("item", self.item.as_deref().map(Value::from));
        out.optional("action", self.action.as_deref().map(Value::from));
        out.finish(serializer)
    }
}

impl Serialize for EntryMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut out = RecordOut::new(&self.key_order, &self.extra);
        out.optional("prompt_text", self.prompt_text.as_deref().map(Value::from));
        let secrets = to_value::<_, S::Error>(&self.secrets)?;
        out.required("secrets", secrets, self.secrets.is_empty());
        out.optional(
            "default_next_node_id",
            self.default_next_node_id.as_deref().map(Value::from),
        );
        out.finish(serializer)
    }
}

impl Serialize for Secret {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut out = RecordOut::new(&self.key_order, &self.extra);
        out.text("input", &self.input);
        out.text("next_node_id", &self.next_node_id);
        out.finish(serializer)
    }
}
