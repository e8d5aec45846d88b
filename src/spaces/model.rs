//! Space records

use crate::printer::Printable;

/// A space from the public room directory, enriched with its children
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Space {
    pub id: String,
    pub name: String,
    pub members: u64,
    pub child_count: usize,
    pub child_rooms: Vec<String>,
}

impl Space {
    pub fn new(id: impl Into<String>, name: impl Into<String>, members: u64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            members,
            child_count: 0,
            child_rooms: Vec::new(),
        }
    }

    /// Fold decoded child relations into this space
    pub fn merge_children(&mut self, children: ChildRelations) {
        self.child_count += children.count;
        self.child_rooms.extend(children.rooms);
    }
}

/// `m.space.child` relations decoded from a room's state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChildRelations {
    pub count: usize,
    pub rooms: Vec<String>,
}

impl Printable for Space {
    fn header() -> Vec<&'static str> {
        vec!["Name", "Members", "Child Count", "Child Rooms"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.members.to_string(),
            self.child_count.to_string(),
            self.child_rooms.join(","),
        ]
    }
}
