//! Partial-field reducer
//!
//! Folds field chunks into a draft. The backend sends the whole current
//! value of a field with every chunk (growing prefixes, whole arrays), so
//! the default mode replaces rather than appends. Replacement is
//! idempotent: replaying chunks converges on the last one applied.

use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::stream::event::{FieldChunk, StreamEvent};

/// How a chunk is combined with the field's current value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChunkMode {
    /// Chunk content is the full current value
    #[default]
    Replace,
    /// Chunk content is a delta: strings concatenate, arrays extend
    Append,
}

/// Per-field chunk modes. Fields without an override use `Replace`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkPolicy {
    overrides: HashMap<String, ChunkMode>,
}

impl ChunkPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, field: impl Into<String>, mode: ChunkMode) -> Self {
        self.overrides.insert(field.into(), mode);
        self
    }

    pub fn mode_for(&self, field: &str) -> ChunkMode {
        self.overrides.get(field).copied().unwrap_or_default()
    }
}

/// Draft item: field name -> current (possibly partial) value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Draft {
    fields: Map<String, Value>,
    is_loading: bool,
}

impl Draft {
    /// Empty placeholder waiting for data
    pub fn loading() -> Self {
        Self {
            fields: Map::new(),
            is_loading: true,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    pub fn apply(&mut self, chunk: &FieldChunk) {
        self.apply_with(chunk, ChunkMode::Replace);
    }

    pub fn apply_with(&mut self, chunk: &FieldChunk, mode: ChunkMode) {
        let incoming = chunk.content.clone();

        let merged = match (mode, self.fields.remove(&chunk.field)) {
            (ChunkMode::Append, Some(Value::String(mut current))) => match incoming {
                Value::String(delta) => {
                    current.push_str(&delta);
                    Value::String(current)
                }
                other => other,
            },
            (ChunkMode::Append, Some(Value::Array(mut current))) => match incoming {
                Value::Array(delta) => {
                    current.extend(delta);
                    Value::Array(current)
                }
                other => other,
            },
            _ => incoming,
        };

        self.fields.insert(chunk.field.clone(), merged);
    }

    /// Replace the whole draft with a materialized item
    pub fn replace_with(&mut self, data: Value) {
        self.fields = match data {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        self.is_loading = false;
    }

    /// Overlay final values onto the draft, keeping fields the final
    /// payload does not mention
    pub fn merge(&mut self, data: &Map<String, Value>) {
        for (key, value) in data {
            self.fields.insert(key.clone(), value.clone());
        }
        self.is_loading = false;
    }

    pub fn finish(&mut self) {
        self.is_loading = false;
    }
}

/// Pure form of the reducer: `apply(draft, record) -> draft'`
pub fn reduce(mut draft: Draft, event: &StreamEvent) -> Draft {
    match event {
        StreamEvent::FieldChunk(chunk) => draft.apply(chunk),
        StreamEvent::ItemComplete(item) => draft.replace_with(item.data.clone()),
        _ => {}
    }
    draft
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chunk(field: &str, content: Value) -> FieldChunk {
        FieldChunk {
            item_index: None,
            field: field.to_string(),
            content,
            is_complete: false,
        }
    }

    #[test]
    fn test_cumulative_prefixes_replace() {
        let draft = ["a", "ab", "abc"]
            .into_iter()
            .map(|c| StreamEvent::FieldChunk(chunk("resumo_executivo", json!(c))))
            .fold(Draft::loading(), |draft, event| reduce(draft, &event));

        assert_eq!(draft.text("resumo_executivo"), Some("abc"));
        assert!(draft.is_loading());
    }

    #[test]
    fn test_out_of_order_converges_on_last_chunk() {
        let mut draft = Draft::loading();
        draft.apply(&chunk("resumo_executivo", json!("abc")));
        draft.apply(&chunk("resumo_executivo", json!("a")));
        draft.apply(&chunk("resumo_executivo", json!("abc")));

        assert_eq!(draft.text("resumo_executivo"), Some("abc"));
    }

    #[test]
    fn test_arrays_and_numbers_are_set_wholesale() {
        let mut draft = Draft::loading();
        draft.apply(&chunk("pontos_fortes", json!(["Python"])));
        draft.apply(&chunk("pontos_fortes", json!(["Python", "SQL"])));
        draft.apply(&chunk("nota_geral", json!(64)));
        draft.apply(&chunk("nota_geral", json!(72)));

        assert_eq!(draft.field("pontos_fortes"), Some(&json!(["Python", "SQL"])));
        assert_eq!(draft.field("nota_geral"), Some(&json!(72)));
    }

    #[test]
    fn test_append_policy_for_delta_fields() {
        let policy = ChunkPolicy::new().with_mode("log", ChunkMode::Append);
        let mut draft = Draft::loading();
        for delta in ["a", "b", "c"] {
            draft.apply_with(&chunk("log", json!(delta)), policy.mode_for("log"));
        }
        draft.apply_with(&chunk("title", json!("x")), policy.mode_for("title"));
        draft.apply_with(&chunk("title", json!("xy")), policy.mode_for("title"));

        assert_eq!(draft.text("log"), Some("abc"));
        assert_eq!(draft.text("title"), Some("xy"));
    }

    #[test]
    fn test_item_complete_supersedes_draft() {
        let mut draft = Draft::loading();
        draft.apply(&chunk("title", json!("Corrig")));

        draft.replace_with(json!({"title": "Corrigir bug", "category": "code"}));

        assert!(!draft.is_loading());
        assert_eq!(draft.text("title"), Some("Corrigir bug"));
        assert_eq!(draft.text("category"), Some("code"));
    }

    #[test]
    fn test_merge_keeps_streamed_fields() {
        let mut draft = Draft::loading();
        draft.apply(&chunk("resumo_executivo", json!("O candidato")));

        let final_payload = json!({"nota_geral": 72});
        draft.merge(final_payload.as_object().unwrap());

        assert_eq!(draft.text("resumo_executivo"), Some("O candidato"));
        assert_eq!(draft.field("nota_geral"), Some(&json!(72)));
        assert!(!draft.is_loading());
    }
}
