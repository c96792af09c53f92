//! Members and projection addresses.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A named member of a result type.
///
/// Two members are the same only if both the declaring type and the name
/// match, so `Customer.Name` and `Order.Name` stay distinct addresses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberInfo {
    /// Type that declares the member.
    pub declaring_type: String,
    /// Member name.
    pub name: String,
}

impl MemberInfo {
    /// Creates a member of `declaring_type`.
    #[must_use]
    pub fn new(declaring_type: impl Into<String>, name: impl Into<String>) -> Self {
        MemberInfo {
            declaring_type: declaring_type.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for MemberInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.declaring_type, self.name)
    }
}

/// Path of members from the root of a shaping tree.
///
/// Addresses are values: [`ProjectionMember::append`] returns a new path and
/// leaves the receiver untouched, so a recursive walk can hand each child its
/// own address without any push/pop bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectionMember {
    members: Vec<MemberInfo>,
}

impl ProjectionMember {
    /// The empty path addressing the tree root.
    #[must_use]
    pub fn root() -> Self {
        ProjectionMember {
            members: Vec::new(),
        }
    }

    /// Builds a path from a member chain.
    #[must_use]
    pub fn from_members(members: impl IntoIterator<Item = MemberInfo>) -> Self {
        ProjectionMember {
            members: members.into_iter().collect(),
        }
    }

    /// Returns this path extended by `member`.
    #[must_use]
    pub fn append(&self, member: MemberInfo) -> Self {
        let mut members = Vec::with_capacity(self.members.len() + 1);
        members.extend(self.members.iter().cloned());
        members.push(member);
        ProjectionMember { members }
    }

    /// Returns true for the root address.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.members.is_empty()
    }

    /// Number of members in the path.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.members.len()
    }
}

impl fmt::Display for ProjectionMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.members.is_empty() {
            return f.write_str("<root>");
        }
        for (i, member) in self.members.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(&member.name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_leaves_parent_untouched() {
        let root = ProjectionMember::root();
        let child = root.append(MemberInfo::new("Anon", "Id"));
        assert!(root.is_root());
        assert_eq!(child.depth(), 1);
        assert_eq!(child.to_string(), "Id");
    }

    #[test]
    fn test_equality_is_by_member_sequence() {
        let a = ProjectionMember::root()
            .append(MemberInfo::new("Order", "Customer"))
            .append(MemberInfo::new("Customer", "Name"));
        let b = ProjectionMember::from_members([
            MemberInfo::new("Order", "Customer"),
            MemberInfo::new("Customer", "Name"),
        ]);
        assert_eq!(a, b);

        let other_type = ProjectionMember::from_members([
            MemberInfo::new("Order", "Customer"),
            MemberInfo::new("Order", "Name"),
        ]);
        assert_ne!(a, other_type);
    }

    #[test]
    fn test_append_and_display() {
        let parent = ProjectionMember::root().append(MemberInfo::new("Order", "Customer"));
        let child = parent.append(MemberInfo::new("Customer", "Name"));
        assert_eq!(child.depth(), 2);
        assert_eq!(child, ProjectionMember::from_members([MemberInfo::new("Order", "Customer"), MemberInfo::new("Customer", "Name")]));
        assert_eq!(child.to_string(), "Customer.Name");
    }
}
