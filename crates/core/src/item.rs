//! Fragments a message can be built from.
//!
//! Instead of interpolating providers into strings, callers hand
//! [`Message::build`](crate::message::Message::build) an ordered list of
//! fragments. Each fragment is turned into zero or more providers up front.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::message::Message;
use crate::provider::Provider;

#[derive(Debug)]
pub enum MessageItem {
    /// An existing provider, kept by reference.
    Provider(Provider),
    /// Literal text, wrapped in a static text provider.
    Literal(String),
    /// Another message; its providers are absorbed, not nested.
    Message(Message),
    /// A JSON content part or list of parts.
    Json(Value),
    /// Dropped silently.
    Empty,
}

impl MessageItem {
    pub(crate) fn collect_into(self, out: &mut Vec<Provider>) -> Result<()> {
        match self {
            Self::Provider(p) => out.push(p),
            Self::Literal(s) => out.push(Provider::text(s)),
            Self::Message(m) => out.extend(m.into_providers()),
            Self::Json(v) => collect_json(v, out)?,
            Self::Empty => {}
        }
        Ok(())
    }
}

fn collect_json(value: Value, out: &mut Vec<Provider>) -> Result<()> {
    match value {
        Value::Null => Ok(()),
        Value::String(s) => {
            out.push(Provider::text(s));
            Ok(())
        }
        Value::Array(parts) => {
            for part in parts {
                collect_json(part, out)?;
            }
            Ok(())
        }
        Value::Object(map) => {
            let kind = map
                .get("type")
                .and_then(Value::as_str)
                .ok_or_else(|| Error::InvalidItem("content part without a 'type'".into()))?;
            match kind {
                "text" => {
                    let text = map
                        .get("text")
                        .and_then(Value::as_str)
                        .ok_or_else(|| Error::InvalidItem("text part without 'text'".into()))?;
                    out.push(Provider::text(text));
                }
                "image_url" => {
                    let url = match map.get("image_url") {
                        Some(Value::Object(inner)) => inner.get("url").and_then(Value::as_str),
                        Some(Value::String(url)) => Some(url.as_str()),
                        _ => None,
                    }
                    .ok_or_else(|| {
                        Error::InvalidItem("image_url part without 'image_url.url'".into())
                    })?;
                    out.push(Provider::image(url));
                }
                other => return Err(Error::UnsupportedItemType(format!("part type '{other}'"))),
            }
            Ok(())
        }
        Value::Bool(_) => Err(Error::UnsupportedItemType("boolean".into())),
        Value::Number(_) => Err(Error::UnsupportedItemType("number".into())),
    }
}

impl From<Provider> for MessageItem {
    fn from(p: Provider) -> Self {
        Self::Provider(p)
    }
}

impl From<&Provider> for MessageItem {
    fn from(p: &Provider) -> Self {
        Self::Provider(p.clone())
    }
}

impl From<&str> for MessageItem {
    fn from(s: &str) -> Self {
        Self::Literal(s.to_string())
    }
}

impl From<String> for MessageItem {
    fn from(s: String) -> Self {
        Self::Literal(s)
    }
}

impl From<Message> for MessageItem {
    fn from(m: Message) -> Self {
        Self::Message(m)
    }
}

impl From<Value> for MessageItem {
    fn from(v: Value) -> Self {
        Self::Json(v)
    }
}

impl<T: Into<MessageItem>> From<Option<T>> for MessageItem {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Empty, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;
    use serde_json::json;

    #[test]
    fn mixed_fragments_build_in_order() {
        let tools = Provider::tools(vec![json!({"name": "read_file"})]);
        let nested = Message::user([Provider::named_text("inner", "x")]);
        let msg = Message::build(
            Role::User,
            [
                MessageItem::from("Look at "),
                MessageItem::from(&tools),
                MessageItem::from(nested),
                MessageItem::from(json!([
                    {"type": "text", "text": "caption"},
                    {"type": "image_url", "image_url": {"url": "pic.png"}}
                ])),
                MessageItem::from(None::<Provider>),
            ],
        )
        .unwrap();

        let kinds: Vec<_> = msg.providers().iter().map(|p| p.kind()).collect();
        assert_eq!(kinds, ["text", "tools", "text", "text", "image"]);
        assert!(Provider::same(&msg.providers()[1], &tools));
        assert_eq!(msg.providers()[2].name(), "inner");
    }

    #[test]
    fn literal_text_gets_hashed_name() {
        let msg = Message::build(Role::User, ["hi"]).unwrap();
        assert_eq!(msg.providers()[0].name(), Provider::text("hi").name());
    }

    #[test]
    fn unsupported_part_type_fails_fast() {
        let err = Message::build(Role::User, [json!({"type": "audio", "data": "..."})]).unwrap_err();
        assert!(matches!(err, Error::UnsupportedItemType(_)));
    }

    #[test]
    fn scalar_json_is_rejected() {
        assert!(matches!(
            Message::build(Role::User, [json!(42)]).unwrap_err(),
            Error::UnsupportedItemType(_)
        ));
        assert!(matches!(
            Message::build(Role::User, [json!(true)]).unwrap_err(),
            Error::UnsupportedItemType(_)
        ));
    }

    #[test]
    fn malformed_parts_are_invalid() {
        assert!(matches!(
            Message::build(Role::User, [json!({"text": "no type"})]).unwrap_err(),
            Error::InvalidItem(_)
        ));
        assert!(matches!(
            Message::build(Role::User, [json!({"type": "image_url"})]).unwrap_err(),
            Error::InvalidItem(_)
        ));
    }

    #[test]
    fn nulls_are_dropped() {
        let msg = Message::build(Role::User, [json!(null), json!("kept")]).unwrap();
        assert_eq!(msg.len(), 1);
    }
}
