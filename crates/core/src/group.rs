//! Name lookups that may hit more than one provider.

use crate::provider::Provider;

/// Result of looking a provider up by name.
#[derive(Debug, Clone)]
pub enum ProviderMatch {
    Single(Provider),
    Group(ProviderGroup),
}

// A match always holds at least one provider, a group at least two.
#[allow(clippy::len_without_is_empty)]
impl ProviderMatch {
    /// `None` for zero matches, `Single` for one, `Group` otherwise.
    pub(crate) fn from_matches(mut matches: Vec<Provider>) -> Option<Self> {
        match matches.len() {
            0 => None,
            1 => matches.pop().map(Self::Single),
            _ => Some(Self::Group(ProviderGroup { members: matches })),
        }
    }

    /// The single provider, or the first member of a group.
    pub fn first(&self) -> &Provider {
        match self {
            Self::Single(p) => p,
            Self::Group(g) => &g.members[0],
        }
    }

    pub fn as_single(&self) -> Option<&Provider> {
        match self {
            Self::Single(p) => Some(p),
            Self::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&ProviderGroup> {
        match self {
            Self::Single(_) => None,
            Self::Group(g) => Some(g),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Group(g) => g.len(),
        }
    }

    /// Show or hide every matched provider.
    pub fn set_visible(&self, visible: bool) {
        match self {
            Self::Single(p) => p.set_visible(visible),
            Self::Group(g) => g.set_visible(visible),
        }
    }
}

/// An ordered view over same-named providers. Always has two or more members.
#[derive(Debug, Clone)]
pub struct ProviderGroup {
    members: Vec<Provider>,
}

#[allow(clippy::len_without_is_empty)]
impl ProviderGroup {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Positional access; negative indices count from the end.
    pub fn get(&self, index: isize) -> Option<&Provider> {
        resolve_index(index, self.members.len()).map(|i| &self.members[i])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Provider> {
        self.members.iter()
    }

    /// Visibility of each member, in order.
    pub fn visible(&self) -> Vec<bool> {
        self.members.iter().map(Provider::visible).collect()
    }

    pub fn set_visible(&self, visible: bool) {
        for p in &self.members {
            p.set_visible(visible);
        }
    }
}

impl<'a> IntoIterator for &'a ProviderGroup {
    type Item = &'a Provider;
    type IntoIter = std::slice::Iter<'a, Provider>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}

/// Map a possibly-negative index onto `0..len`.
pub(crate) fn resolve_index(index: isize, len: usize) -> Option<usize> {
    let resolved = if index < 0 {
        len.checked_sub(index.unsigned_abs())?
    } else {
        index as usize
    };
    (resolved < len).then_some(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_one_many() {
        assert!(ProviderMatch::from_matches(vec![]).is_none());

        let one = ProviderMatch::from_matches(vec![Provider::named_text("a", "1")]).unwrap();
        assert!(one.as_single().is_some());

        let many = ProviderMatch::from_matches(vec![
            Provider::named_text("a", "1"),
            Provider::named_text("a", "2"),
        ])
        .unwrap();
        assert_eq!(many.as_group().unwrap().len(), 2);
    }

    #[test]
    fn group_bulk_visibility_and_negative_index() {
        let first = Provider::named_text("a", "1");
        let last = Provider::named_text("a", "2");
        let group = match ProviderMatch::from_matches(vec![first.clone(), last.clone()]) {
            Some(ProviderMatch::Group(g)) => g,
            other => panic!("expected group, got {other:?}"),
        };

        group.set_visible(false);
        assert_eq!(group.visible(), vec![false, false]);
        assert!(Provider::same(group.get(-1).unwrap(), &last));
        assert!(Provider::same(group.get(0).unwrap(), &first));
        assert!(group.get(2).is_none());
        assert!(group.get(-3).is_none());
    }

    #[test]
    fn match_len_counts_every_member() {
        let single = ProviderMatch::from_matches(vec![Provider::named_text("a", "1")]).unwrap();
        assert_eq!(single.len(), 1);

        let group = ProviderMatch::from_matches((0..3).map(|i| Provider::named_text("a", i.to_string())).collect())
            .unwrap();
        assert_eq!(group.len(), 3);
        assert_eq!(group.as_group().unwrap().iter().count(), 3);
    }

    #[test]
    fn resolve_index_bounds() {
        assert_eq!(resolve_index(0, 3), Some(0));
        assert_eq!(resolve_index(-1, 3), Some(2));
        assert_eq!(resolve_index(-3, 3), Some(0));
        assert_eq!(resolve_index(-4, 3), None);
        assert_eq!(resolve_index(3, 3), None);
        assert_eq!(resolve_index(0, 0), None);
    }
}
