//! Editing operations on a conversation [`Document`].
//!
//! Each operation validates its arguments before touching the document, so an
//! `Err` always leaves the document unchanged. Undo support lives one level up
//! in [`crate::history`].

use anyhow::{Result, anyhow, bail};
use indexmap::IndexMap;

use crate::model::{
    Choice, Document, EntryMode, Interaction, InteractionKind, Node, Secret, WorldPos,
};

// ────────────────────────────────────────────────────────────────────────────
// Field addressing
// ────────────────────────────────────────────────────────────────────────────

/// A single editable text field of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeField {
    SpriteText,
    SpriteImage,
    PromptText,
    DefaultNext,
    ChoiceText(usize),
    ChoiceNext(usize),
    ChoiceItem(usize),
    ChoiceAction(usize),
    SecretInput(usize),
    SecretNext(usize),
}

impl NodeField {
    /// Optional fields are deleted, not stored, when set to `""`.
    pub fn is_optional(self) -> bool {
        matches!(
            self,
            NodeField::SpriteImage
                | NodeField::PromptText
                | NodeField::DefaultNext
                | NodeField::ChoiceItem(_)
                | NodeField::ChoiceAction(_)
        )
    }

    /// Whether the field holds a node reference (an edge).
    pub fn is_link(self) -> bool {
        matches!(
            self,
            NodeField::DefaultNext | NodeField::ChoiceNext(_) | NodeField::SecretNext(_)
        )
    }
}

/// What [`set_field`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldChange {
    /// The stored value differs from before.
    pub changed: bool,
    /// The field is a link, so edges must be re-derived.
    pub link: bool,
}

/// Read a field. `None` means absent (optional field unset, index out of
/// range, or the node has a different interaction).
pub fn get_field(node: &Node, field: NodeField) -> Option<&str> {
    match field {
        NodeField::SpriteText => Some(node.sprite_text.as_str()),
        NodeField::SpriteImage => node.sprite_image.as_deref(),
        NodeField::PromptText => node.entry_mode()?.prompt_text.as_deref(),
        NodeField::DefaultNext => node.entry_mode()?.default_next_node_id.as_deref(),
        NodeField::ChoiceText(i) => Some(node.choices()?.get(i)?.text.as_str()),
        NodeField::ChoiceNext(i) => Some(node.choices()?.get(i)?.next_node_id.as_str()),
        NodeField::ChoiceItem(i) => node.choices()?.get(i)?.item.as_deref(),
        NodeField::ChoiceAction(i) => node.choices()?.get(i)?.action.as_deref(),
        NodeField::SecretInput(i) => Some(node.entry_mode()?.secrets.get(i)?.input.as_str()),
        NodeField::SecretNext(i) => {
            Some(node.entry_mode()?.secrets.get(i)?.next_node_id.as_str())
        }
    }
}

fn field_slot<'a>(node: &'a mut Node, field: NodeField) -> Result<FieldSlot<'a>> {
    let no_choice = |i: usize| anyhow!("no choice #{} on this node", i + 1);
    let no_secret = |i: usize| anyhow!("no secret #{} on this node", i + 1);
    let slot = match field {
        NodeField::SpriteText => FieldSlot {
            value: Typed::Required(&mut node.sprite_text),
            raw: &mut node.extra,
            key: "sprite_text",
        },
        NodeField::SpriteImage => FieldSlot {
            value: Typed::Optional(&mut node.sprite_image),
            raw: &mut node.extra,
            key: "sprite_image",
        },
        NodeField::PromptText | NodeField::DefaultNext => {
            let em = node
                .entry_mode_mut()
                .ok_or_else(|| anyhow!("node is not in entry mode"))?;
            if field == NodeField::PromptText {
                FieldSlot {
                    value: Typed::Optional(&mut em.prompt_text),
                    raw: &mut em.extra,
                    key: "prompt_text",
                }
            } else {
                FieldSlot {
                    value: Typed::Optional(&mut em.default_next_node_id),
                    raw: &mut em.extra,
                    key: "default_next_node_id",
                }
            }
        }
        NodeField::ChoiceText(i)
        | NodeField::ChoiceNext(i)
        | NodeField::ChoiceItem(i)
        | NodeField::ChoiceAction(i) => {
            let choice = node
                .choices_mut()
                .ok_or_else(|| anyhow!("node has no choices"))?
                .get_mut(i)
                .ok_or_else(|| no_choice(i))?;
            let (value, key) = match field {
                NodeField::ChoiceText(_) => (Typed::Required(&mut choice.text), "text"),
                NodeField::ChoiceNext(_) => {
                    (Typed::Required(&mut choice.next_node_id), "next_node_id")
                }
                NodeField::ChoiceItem(_) => (Typed::Optional(&mut choice.item), "item"),
                _ => (Typed::Optional(&mut choice.action), "action"),
            };
            FieldSlot {
                value,
                raw: &mut choice.extra,
                key,
            }
        }
        NodeField::SecretInput(i) | NodeField::SecretNext(i) => {
            let secret = node
                .entry_mode_mut()
                .ok_or_else(|| anyhow!("node is not in entry mode"))?
                .secrets
                .get_mut(i)
                .ok_or_else(|| no_secret(i))?;
            let (value, key) = match field {
                NodeField::SecretInput(_) => (Typed::Required(&mut secret.input), "input"),
                _ => (Typed::Required(&mut secret.next_node_id), "next_node_id"),
            };
            FieldSlot {
                value,
                raw: &mut secret.extra,
                key,
            }
        }
    };
    Ok(slot)
}

/// Where a field lives: its typed value, plus the record's `extra` map, which
/// may still hold a raw value of the wrong type under the same key.
struct FieldSlot<'a> {
    value: Typed<'a>,
    raw: &'a mut IndexMap<String, serde_json::Value>,
    key: &'static str,
}

enum Typed<'a> {
    Required(&'a mut String),
    Optional(&'a mut Option<String>),
}

/// Write a field of node `id`.
///
/// Setting an optional field to `""` removes it. Sprite text is stored
/// without surrounding whitespace. A raw value the file held under the same
/// key is dropped. Nothing is created implicitly: the node must already have
/// the interaction and list entry the field belongs to.
pub fn set_field(doc: &mut Document, id: &str, field: NodeField, value: &str) -> Result<FieldChange> {
    let node = doc
        .get_mut(id)
        .ok_or_else(|| anyhow!("unknown node '{id}'"))?;
    let value = match field {
        NodeField::SpriteText => value.trim(),
        _ => value,
    };
    let slot = field_slot(node, field)?;
    let mut changed = slot.raw.shift_remove(slot.key).is_some();
    match slot.value {
        Typed::Required(s) => {
            if s.as_str() != value {
                *s = value.to_string();
                changed = true;
            }
        }
        Typed::Optional(o) => {
            let new = (!value.is_empty()).then(|| value.to_string());
            if *o != new {
                *o = new;
                changed = true;
            }
        }
    }
    if changed {
        log::debug!("set {field:?} on '{id}'");
    }
    Ok(FieldChange {
        changed,
        link: field.is_link(),
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Node operations
// ────────────────────────────────────────────────────────────────────────────

fn check_new_id(doc: &Document, id: &str) -> Result<()> {
    if id.trim().is_empty() {
        bail!("node ID must not be empty");
    }
    if doc.contains(id) {
        bail!("Node ID '{id}' already exists.");
    }
    Ok(())
}

/// Create a node with placeholder text at `pos`.
pub fn add_node(doc: &mut Document, id: &str, pos: WorldPos) -> Result<()> {
    check_new_id(doc, id)?;
    let mut node = Node::new(format!("Text for {id}"));
    node.editor_pos = Some(pos);
    doc.insert(id, node);
    log::info!("added node '{id}'");
    Ok(())
}

/// Remove a node and blank every reference to it. Returns the number of
/// fields that were cleared.
pub fn delete_node(doc: &mut Document, id: &str) -> Result<usize> {
    if doc.remove(id).is_none() {
        bail!("unknown node '{id}'");
    }
    let cleared: usize = doc.iter_mut().map(|(_, n)| n.retarget(id, "")).sum();
    log::info!("deleted node '{id}', cleared {cleared} reference(s)");
    Ok(cleared)
}

/// Give a node a new identifier, keeping its place in the document and
/// rewriting every reference (including self-references). Returns the
/// number of rewritten fields.
pub fn rename_node(doc: &mut Document, old: &str, new: &str) -> Result<usize> {
    if old == new {
        return Ok(0);
    }
    let index = doc
        .index_of(old)
        .ok_or_else(|| anyhow!("unknown node '{old}'"))?;
    check_new_id(doc, new)?;
    let node = doc
        .remove(old)
        .ok_or_else(|| anyhow!("unknown node '{old}'"))?;
    doc.insert_at(index, new, node);
    let rewritten: usize = doc.iter_mut().map(|(_, n)| n.retarget(old, new)).sum();
    log::info!("renamed '{old}' to '{new}', rewrote {rewritten} reference(s)");
    Ok(rewritten)
}

/// Replace the node's interaction with a fresh one of `kind`.
pub fn convert_node(doc: &mut Document, id: &str, kind: InteractionKind) -> Result<()> {
    let node = doc
        .get_mut(id)
        .ok_or_else(|| anyhow!("unknown node '{id}'"))?;
    let interaction = match kind {
        InteractionKind::Choices => Interaction::Choices(vec![Choice::new("New Choice", "")]),
        InteractionKind::EntryMode => Interaction::EntryMode(EntryMode {
            prompt_text: Some("Enter...".into()),
            secrets: vec![Secret::new("secret", "")],
            ..Default::default()
        }),
    };
    node.set_interaction(interaction);
    log::debug!("converted '{id}' to {kind:?}");
    Ok(())
}

/// Append a choice. A node without choices is converted instead, which
/// leaves it with exactly one new choice.
pub fn add_choice(doc: &mut Document, id: &str) -> Result<()> {
    let node = doc
        .get_mut(id)
        .ok_or_else(|| anyhow!("unknown node '{id}'"))?;
    match node.choices_mut() {
        Some(choices) => {
            choices.push(Choice::new("New Choice", ""));
            Ok(())
        }
        None => convert_node(doc, id, InteractionKind::Choices),
    }
}

/// Append a secret. A node not in entry mode is converted instead.
pub fn add_secret(doc: &mut Document, id: &str) -> Result<()> {
    let node = doc
        .get_mut(id)
        .ok_or_else(|| anyhow!("unknown node '{id}'"))?;
    match node.entry_mode_mut() {
        Some(em) => {
            em.secrets.push(Secret::new("new_secret", ""));
            Ok(())
        }
        None => convert_node(doc, id, InteractionKind::EntryMode),
    }
}

/// Remove choice `index`. Removing the last choice drops the interaction.
pub fn remove_choice(doc: &mut Document, id: &str, index: usize) -> Result<Choice> {
    let node = doc
        .get_mut(id)
        .ok_or_else(|| anyhow!("unknown node '{id}'"))?;
    let choices = node
        .choices_mut()
        .ok_or_else(|| anyhow!("node '{id}' has no choices"))?;
    if index >= choices.len() {
        bail!("no choice #{} on node '{id}'", index + 1);
    }
    let removed = choices.remove(index);
    if choices.is_empty() {
        node.set_interaction(Interaction::None);
    }
    Ok(removed)
}

/// Remove secret `index`. The entry mode itself stays, possibly with no
/// secrets left.
pub fn remove_secret(doc: &mut Document, id: &str, index: usize) -> Result<Secret> {
    let em = doc
        .get_mut(id)
        .ok_or_else(|| anyhow!("unknown node '{id}'"))?
        .entry_mode_mut()
        .ok_or_else(|| anyhow!("node '{id}' is not in entry mode"))?;
    if index >= em.secrets.len() {
        bail!("no secret #{} on node '{id}'", index + 1);
    }
    Ok(em.secrets.remove(index))
}

pub fn move_node(doc: &mut Document, id: &str, pos: WorldPos) -> Result<()> {
    let node = doc
        .get_mut(id)
        .ok_or_else(|| anyhow!("unknown node '{id}'"))?;
    node.editor_pos = Some(pos);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        Document::from_json_str(
            r#"{
              "hub": {"sprite_text": "Hi", "sprite_image": "a.png", "editor_pos": [0, 0],
                      "choices": [{"text": "Go", "next_node_id": "door", "action": "wave"},
                                  {"text": "Stay", "next_node_id": "hub"}]},
              "door": {"sprite_text": "Knock", "editor_pos": [300, 0],
                       "entry_mode": {"prompt_text": "Password", "default_next_node_id": "hub",
                                      "secrets": [{"input": "open", "next_node_id": "hub"}]}},
              "end": {"sprite_text": "Bye", "editor_pos": [600, 0]}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_get_field() {
        let doc = sample();
        let hub = doc.get("hub").unwrap();
        assert_eq!(get_field(hub, NodeField::ChoiceAction(0)), Some("wave"));
        assert_eq!(get_field(hub, NodeField::ChoiceItem(0)), None);
        assert_eq!(get_field(hub, NodeField::ChoiceText(5)), None);
        assert_eq!(get_field(hub, NodeField::PromptText), None);
        let door = doc.get("door").unwrap();
        assert_eq!(get_field(door, NodeField::SecretInput(0)), Some("open"));
        assert_eq!(get_field(door, NodeField::DefaultNext), Some("hub"));
    }

    #[test]
    fn test_set_required_field() {
        let mut doc = sample();
        let ch = set_field(&mut doc, "hub", NodeField::ChoiceText(1), "Linger").unwrap();
        assert_eq!(ch, FieldChange { changed: true, link: false });
        assert_eq!(doc.get("hub").unwrap().choices().unwrap()[1].text, "Linger");
        let ch = set_field(&mut doc, "hub", NodeField::ChoiceText(1), "Linger").unwrap();
        assert!(!ch.changed);
        // required fields store the empty string
        set_field(&mut doc, "hub", NodeField::SpriteText, "").unwrap();
        assert_eq!(doc.get("hub").unwrap().sprite_text, "");
    }

    #[test]
    fn test_clearing_optional_field_deletes_key() {
        let mut doc = sample();
        set_field(&mut doc, "hub", NodeField::SpriteImage, "").unwrap();
        set_field(&mut doc, "hub", NodeField::ChoiceAction(0), "").unwrap();
        set_field(&mut doc, "door", NodeField::PromptText, "").unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&doc.to_json_string_pretty().unwrap()).unwrap();
        assert!(json["hub"].get("sprite_image").is_none());
        assert!(json["hub"]["choices"][0].get("action").is_none());
        assert!(json["door"]["entry_mode"].get("prompt_text").is_none());
        assert_eq!(json["door"]["entry_mode"]["default_next_node_id"], "hub");
    }

    #[test]
    fn test_sprite_text_is_trimmed() {
        let mut doc = sample();
        let ch = set_field(&mut doc, "hub", NodeField::SpriteText, "  Hello there.\n\n").unwrap();
        assert!(ch.changed);
        assert_eq!(doc.get("hub").unwrap().sprite_text, "Hello there.");
        let ch = set_field(&mut doc, "hub", NodeField::SpriteText, "Hello there.\n").unwrap();
        assert!(!ch.changed);
        // other fields keep their whitespace
        set_field(&mut doc, "hub", NodeField::ChoiceText(0), " Go ").unwrap();
        assert_eq!(doc.get("hub").unwrap().choices().unwrap()[0].text, " Go ");
    }

    #[test]
    fn test_writing_a_field_drops_its_raw_value() {
        let mut doc = Document::from_json_str(
            r#"{"n": {"sprite_text": 42, "choices": [{"text": "t", "next_node_id": "n", "item": 3}]}}"#,
        )
        .unwrap();
        let ch = set_field(&mut doc, "n", NodeField::ChoiceItem(0), "").unwrap();
        assert!(ch.changed);
        set_field(&mut doc, "n", NodeField::SpriteText, "Hi").unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&doc.to_json_string_pretty().unwrap()).unwrap();
        assert!(json["n"]["choices"][0].get("item").is_none());
        assert_eq!(json["n"]["sprite_text"], "Hi");
        assert!(doc.get("n").unwrap().extra.is_empty());
    }

    #[test]
    fn test_set_link_field_reports_link() {
        let mut doc = sample();
        let ch = set_field(&mut doc, "door", NodeField::SecretNext(0), "end").unwrap();
        assert!(ch.changed && ch.link);
        assert_eq!(doc.get("door").unwrap().targets(), vec!["end", "hub"]);
    }

    #[test]
    fn test_set_field_never_creates_structure() {
        let mut doc = sample();
        let before = doc.clone();
        assert!(set_field(&mut doc, "end", NodeField::PromptText, "x").is_err());
        assert!(set_field(&mut doc, "hub", NodeField::ChoiceText(2), "x").is_err());
        assert!(set_field(&mut doc, "door", NodeField::SecretInput(3), "x").is_err());
        assert!(set_field(&mut doc, "nobody", NodeField::SpriteText, "x").is_err());
        assert_eq!(doc, before);
    }

    #[test]
    fn test_add_node_rejects_duplicates() {
        let mut doc = sample();
        add_node(&mut doc, "new", WorldPos::new(1.0, 2.0)).unwrap();
        let n = doc.get("new").unwrap();
        assert_eq!(n.sprite_text, "Text for new");
        assert_eq!(n.editor_pos, Some(WorldPos::new(1.0, 2.0)));
        assert!(n.interaction.kind().is_none());
        let err = add_node(&mut doc, "hub", WorldPos::new(0.0, 0.0)).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert!(add_node(&mut doc, "  ", WorldPos::new(0.0, 0.0)).is_err());
    }

    #[test]
    fn test_delete_node_blanks_references() {
        let mut doc = sample();
        let cleared = delete_node(&mut doc, "hub").unwrap();
        assert_eq!(cleared, 2);
        assert!(!doc.contains("hub"));
        let em = doc.get("door").unwrap().entry_mode().unwrap();
        assert_eq!(em.secrets[0].next_node_id, "");
        assert!(em.default_next_node_id.is_none());
        assert!(delete_node(&mut doc, "hub").is_err());
    }

    #[test]
    fn test_rename_rewrites_all_references() {
        let mut doc = sample();
        let n = rename_node(&mut doc, "hub", "lobby").unwrap();
        // two in door, one self-reference
        assert_eq!(n, 3);
        assert_eq!(doc.ids().collect::<Vec<_>>(), vec!["lobby", "door", "end"]);
        let lobby = doc.get("lobby").unwrap();
        assert_eq!(lobby.targets(), vec!["door", "lobby"]);
        assert_eq!(doc.get("door").unwrap().targets(), vec!["lobby", "lobby"]);
        assert!(doc.edges().iter().all(|(s, t)| *s != "hub" && *t != "hub"));
    }

    #[test]
    fn test_rename_errors_leave_document_intact() {
        let mut doc = sample();
        let before = doc.clone();
        assert!(rename_node(&mut doc, "hub", "door").is_err());
        assert!(rename_node(&mut doc, "ghost", "x").is_err());
        assert!(rename_node(&mut doc, "hub", "").is_err());
        assert_eq!(rename_node(&mut doc, "hub", "hub").unwrap(), 0);
        assert_eq!(doc, before);
    }

    #[test]
    fn test_convert_and_add_entries() {
        let mut doc = sample();
        add_choice(&mut doc, "end").unwrap();
        assert_eq!(doc.get("end").unwrap().choices().unwrap().len(), 1);
        add_choice(&mut doc, "end").unwrap();
        assert_eq!(doc.get("end").unwrap().choices().unwrap()[1].text, "New Choice");

        add_secret(&mut doc, "end").unwrap();
        let em = doc.get("end").unwrap().entry_mode().unwrap();
        assert_eq!(em.prompt_text.as_deref(), Some("Enter..."));
        assert_eq!(em.secrets.len(), 1);
        assert_eq!(em.secrets[0].input, "secret");
        add_secret(&mut doc, "end").unwrap();
        assert_eq!(doc.get("end").unwrap().entry_mode().unwrap().secrets[1].input, "new_secret");
        assert!(doc.get("end").unwrap().choices().is_none());
    }

    #[test]
    fn test_remove_last_choice_drops_interaction() {
        let mut doc = sample();
        remove_choice(&mut doc, "hub", 0).unwrap();
        let removed = remove_choice(&mut doc, "hub", 0).unwrap();
        assert_eq!(removed.text, "Stay");
        assert!(doc.get("hub").unwrap().interaction.kind().is_none());
        assert!(remove_choice(&mut doc, "hub", 0).is_err());
    }

    #[test]
    fn test_remove_last_secret_keeps_entry_mode() {
        let mut doc = sample();
        assert!(remove_secret(&mut doc, "door", 1).is_err());
        remove_secret(&mut doc, "door", 0).unwrap();
        let em = doc.get("door").unwrap().entry_mode().unwrap();
        assert!(em.secrets.is_empty());
        let json: serde_json::Value =
            serde_json::from_str(&doc.to_json_string_pretty().unwrap()).unwrap();
        assert_eq!(json["door"]["entry_mode"]["secrets"], serde_json::json!([]));
    }

    #[test]
    fn test_move_node() {
        let mut doc = sample();
        move_node(&mut doc, "end", WorldPos::new(-5.0, 7.5)).unwrap();
        assert_eq!(doc.get("end").unwrap().editor_pos, Some(WorldPos::new(-5.0, 7.5)));
        assert!(move_node(&mut doc, "ghost", WorldPos::new(0.0, 0.0)).is_err());
    }
}
