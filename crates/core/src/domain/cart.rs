use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub food_item: String,
    pub quantity: u32,
}

/// In-progress items for one conversation.
///
/// Keys are unique and keep the position and spelling of their first
/// insertion; writing an existing key replaces its quantity in place. Names are
/// compared after trimming and ignoring case, the same way the menu is looked up.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Builds a cart from paired names and quantities. A name repeated later in
    /// the sequence overwrites the earlier quantity.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        let mut cart = Self::default();
        for (food_item, quantity) in pairs {
            cart.set(food_item, quantity);
        }
        cart
    }

    pub fn set(&mut self, food_item: impl Into<String>, quantity: u32) {
        let food_item = food_item.into();
        match self.lines.iter_mut().find(|line| same_item(&line.food_item, &food_item)) {
            Some(line) => line.quantity = quantity,
            None => self.lines.push(CartLine { food_item, quantity }),
        }
    }

    /// Last-write-wins merge: quantities from `other` replace ours, never add up.
    pub fn merge(&mut self, other: Cart) {
        for line in other.lines {
            self.set(line.food_item, line.quantity);
        }
    }

    pub fn remove(&mut self, food_item: &str) -> Option<u32> {
        let position = self.lines.iter().position(|line| same_item(&line.food_item, food_item))?;
        Some(self.lines.remove(position).quantity)
    }

    pub fn quantity(&self, food_item: &str) -> Option<u32> {
        self.lines
            .iter()
            .find(|line| same_item(&line.food_item, food_item))
            .map(|line| line.quantity)
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Renders `2 pizza, 1 coke and 3 samosa`.
    pub fn summary(&self) -> String {
        let parts = self
            .lines
            .iter()
            .map(|line| format!("{} {}", line.quantity, line.food_item))
            .collect::<Vec<_>>();
        join_readable(&parts)
    }
}

fn same_item(left: &str, right: &str) -> bool {
    left.trim().to_lowercase() == right.trim().to_lowercase()
}

pub fn join_readable<S: AsRef<str>>(items: &[S]) -> String {
    match items {
        [] => String::new(),
        [only] => only.as_ref().to_string(),
        [head @ .., last] => {
            let head = head.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(", ");
            format!("{head} and {}", last.as_ref())
        }
    }
}
