//! Badge lists carried by the `badges` and `badge-info` tags.

use std::fmt;

/// A single chat badge, e.g. `subscriber/12`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Badge {
    /// Badge set name (`broadcaster`, `subscriber`, ...).
    pub name: String,
    /// Version within the set. Empty when the raw badge had no `/`.
    pub id: String,
}

/// An ordered, read-only list of badges in appearance order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Badges(Vec<Badge>);

impl Badges {
    /// Decode a comma separated `name/id` list.
    pub fn parse(raw: &str) -> Self {
        let badges = raw
            .split(',')
            .filter(|item| !item.is_empty())
            .map(|item| match item.split_once('/') {
                Some((name, id)) => Badge {
                    name: name.to_owned(),
                    id: id.to_owned(),
                },
                None => Badge {
                    name: item.to_owned(),
                    id: String::new(),
                },
            })
            .collect();
        Self(badges)
    }

    /// Whether a badge with this set name is present.
    pub fn has(&self, name: &str) -> bool {
        self.0.iter().any(|b| b.name == name)
    }

    /// First badge with this set name.
    pub fn get(&self, name: &str) -> Option<&Badge> {
        self.0.iter().find(|b| b.name == name)
    }

    pub fn first(&self) -> Option<&Badge> {
        self.0.first()
    }

    pub fn last(&self) -> Option<&Badge> {
        self.0.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Badge> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a Badges {
    type Item = &'a Badge;
    type IntoIter = std::slice::Iter<'a, Badge>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Badges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, badge) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}/{}", badge.name, badge.id)?;
        }
        Ok(())
    }
}
