//! Name → (provider, owning message) index for a conversation.
//!
//! Updated only through the conversation's mutation hooks; it is never
//! rebuilt by scanning messages.

use std::collections::{HashMap, HashSet};
use tracing::trace;

use crate::group::ProviderMatch;
use crate::message::{Message, MessageId};
use crate::provider::Provider;

#[derive(Debug, Clone)]
struct IndexEntry {
    provider: Provider,
    owner: MessageId,
}

#[derive(Debug, Default)]
pub(crate) struct ProviderIndex {
    entries: HashMap<String, Vec<IndexEntry>>,
}

impl ProviderIndex {
    pub(crate) fn register(&mut self, provider: &Provider, owner: &MessageId) {
        trace!(provider = provider.name(), owner = %owner, "Index register");
        self.entries
            .entry(provider.name().to_string())
            .or_default()
            .push(IndexEntry {
                provider: provider.clone(),
                owner: owner.clone(),
            });
    }

    /// Remove one entry for this exact provider under `owner`.
    pub(crate) fn deregister(&mut self, provider: &Provider, owner: &MessageId) {
        trace!(provider = provider.name(), owner = %owner, "Index deregister");
        let name = provider.name();
        let Some(list) = self.entries.get_mut(name) else {
            return;
        };
        if let Some(pos) = list
            .iter()
            .position(|e| Provider::same(&e.provider, provider) && &e.owner == owner)
        {
            list.remove(pos);
        }
        if list.is_empty() {
            self.entries.remove(name);
        }
    }

    pub(crate) fn register_message(&mut self, message: &Message) {
        for p in message.providers() {
            self.register(p, message.id());
        }
    }

    pub(crate) fn deregister_message(&mut self, message: &Message) {
        for p in message.providers() {
            self.deregister(p, message.id());
        }
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<ProviderMatch> {
        let list = self.entries.get(name)?;
        ProviderMatch::from_matches(list.iter().map(|e| e.provider.clone()).collect())
    }

    /// Messages that own a provider named `name`.
    pub(crate) fn owners(&self, name: &str) -> Vec<MessageId> {
        self.entries
            .get(name)
            .map(|list| list.iter().map(|e| e.owner.clone()).collect())
            .unwrap_or_default()
    }

    /// Every indexed provider once, even if shared between messages.
    pub(crate) fn providers(&self) -> Vec<Provider> {
        let mut seen = HashSet::new();
        self.entries
            .values()
            .flatten()
            .filter(|entry| seen.insert(entry.provider.identity()))
            .map(|entry| entry.provider.clone())
            .collect()
    }

    pub(crate) fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Total (provider, owner) pairs.
    pub(crate) fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    #[test]
    fn register_and_deregister_exact_provider() {
        let mut index = ProviderIndex::default();
        let msg = Message::user([Provider::named_text("a", "1"), Provider::named_text("a", "2")]);
        index.register_message(&msg);
        assert_eq!(index.len(), 2);
        assert!(index.lookup("a").unwrap().as_group().is_some());

        index.deregister(&msg.providers()[1], msg.id());
        let single = index.lookup("a").unwrap();
        assert!(Provider::same(single.as_single().unwrap(), &msg.providers()[0]));

        index.deregister_message(&msg);
        assert!(index.lookup("a").is_none());
        assert_eq!(index.names().count(), 0);
    }

    #[test]
    fn deregister_ignores_other_owners() {
        let mut index = ProviderIndex::default();
        let shared = Provider::named_text("s", "x");
        let m1 = Message::user([shared.clone()]);
        let m2 = Message::user([shared.clone()]);
        index.register_message(&m1);
        index.register_message(&m2);
        assert_eq!(index.providers().len(), 1);

        index.deregister(&shared, m1.id());
        assert_eq!(index.owners("s"), vec![m2.id().clone()]);
    }

    #[test]
    fn providers_lists_each_instance_once() {
        let mut index = ProviderIndex::default();
        let shared = Provider::named_text("s", "x");
        let distinct: Vec<Provider> = (0..50).map(|i| Provider::named_text("d", i.to_string())).collect();
        let messages: Vec<Message> = (0..20)
            .map(|_| Message::user([shared.clone()]))
            .chain([Message::user(distinct.clone())])
            .collect();
        for msg in &messages {
            index.register_message(msg);
        }
        assert_eq!(index.len(), 70);

        let providers = index.providers();
        assert_eq!(providers.len(), 51);
        assert_eq!(providers.iter().filter(|p| Provider::same(p, &shared)).count(), 1);
        assert!(distinct.iter().all(|d| providers.iter().any(|p| Provider::same(p, d))));
    }
}
