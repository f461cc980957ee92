//! Node capabilities and their permission bits

use serde::{Deserialize, Serialize};

/// A single operation a node's permission mask can grant.
///
/// Each capability occupies one bit of the mask and the bits are
/// independent: holding `View` says nothing about `Modify`.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum Capability {
    /// Read the node and the files under it
    View,
    /// Change the node and its files
    Modify,
    /// Remove the node or its files
    Delete,
    /// Inspect and edit the node's permission mask
    ViewPermissions,
    /// Edit users attached to the node
    ModifyUser,
    /// Manage user assignment on the node
    ManageUser,
}

impl Capability {
    pub const ALL: [Capability; 6] = [
        Capability::View,
        Capability::Modify,
        Capability::Delete,
        Capability::ViewPermissions,
        Capability::ModifyUser,
        Capability::ManageUser,
    ];

    /// The bit this capability occupies in a node's permission mask.
    pub fn bit(self) -> u32 {
        match self {
            Capability::View => 1,
            Capability::Modify => 2,
            Capability::Delete => 4,
            Capability::ViewPermissions => 8,
            Capability::ModifyUser => 16,
            Capability::ManageUser => 32,
        }
    }

    /// Whether `mask` has this capability's bit set.
    pub fn granted_by(self, mask: u32) -> bool {
        mask & self.bit() != 0
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capability::View => write!(f, "view"),
            Capability::Modify => write!(f, "modify"),
            Capability::Delete => write!(f, "delete"),
            Capability::ViewPermissions => write!(f, "view_permissions"),
            Capability::ModifyUser => write!(f, "modify_user"),
            Capability::ManageUser => write!(f, "manage_user"),
        }
    }
}

impl std::str::FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "view" => Ok(Capability::View),
            "modify" => Ok(Capability::Modify),
            "delete" => Ok(Capability::Delete),
            "view_permissions" => Ok(Capability::ViewPermissions),
            "modify_user" => Ok(Capability::ModifyUser),
            "manage_user" => Ok(Capability::ManageUser),
            _ => Err(format!("Unknown capability: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_are_distinct_powers_of_two() {
        let mut seen = 0u32;
        for cap in Capability::ALL {
            let bit = cap.bit();
            assert_eq!(bit.count_ones(), 1);
            assert_eq!(seen & bit, 0);
            seen |= bit;
        }
        assert_eq!(seen, 63);
    }

    #[test]
    fn mask_grants_only_set_bits() {
        // VIEW|DELETE
        let mask = 5;
        assert!(Capability::View.granted_by(mask));
        assert!(Capability::Delete.granted_by(mask));
        assert!(!Capability::Modify.granted_by(mask));
        assert!(!Capability::ViewPermissions.granted_by(mask));
    }

    #[test]
    fn display_and_parse_roundtrip() {
        for cap in Capability::ALL {
            assert_eq!(cap.to_string().parse::<Capability>(), Ok(cap));
        }
        assert!("everything".parse::<Capability>().is_err());
    }
}
