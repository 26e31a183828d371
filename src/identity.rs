use serde::{Deserialize, Serialize};

/// Plan-derived limits on pool size. `None` means unlimited.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entitlement {
    pub max_topics: Option<usize>,
    pub max_subcategories: Option<usize>,
    pub max_questions_per_subcategory: Option<usize>,
}

impl Entitlement {
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn is_restricted(&self) -> bool {
        self.max_topics.is_some()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Premium,
}

impl Plan {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "free" => Some(Plan::Free),
            "premium" => Some(Plan::Premium),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Premium => "premium",
        }
    }

    pub fn entitlement(self) -> Entitlement {
        match self {
            Plan::Free => Entitlement {
                max_topics: Some(3),
                max_subcategories: Some(4),
                max_questions_per_subcategory: Some(10),
            },
            Plan::Premium => Entitlement::unlimited(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub plan: Plan,
}

/// Resolved identity for the running session. The engine never talks to an
/// auth provider; whoever embeds it hands over an already-resolved user.
pub trait IdentityProvider {
    fn current_user(&self) -> Option<User>;

    fn entitlement(&self) -> Entitlement {
        self.current_user()
            .map(|u| u.plan.entitlement())
            .unwrap_or_else(|| Plan::Free.entitlement())
    }

    fn logout(&mut self);
}

/// Device-local identity taken from config or the command line.
pub struct LocalIdentity {
    user: Option<User>,
}

impl LocalIdentity {
    pub fn new(id: impl Into<String>, plan: Plan) -> Self {
        let id = id.into();
        let user = if id.trim().is_empty() {
            None
        } else {
            Some(User { id, plan })
        };
        Self { user }
    }
}

impl IdentityProvider for LocalIdentity {
    fn current_user(&self) -> Option<User> {
        self.user.clone()
    }

    fn logout(&mut self) {
        self.user = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_plan_is_capped_premium_is_not() {
        let free = Plan::Free.entitlement();
        assert!(free.is_restricted());
        assert_eq!(free.max_questions_per_subcategory, Some(10));
        assert!(!Plan::Premium.entitlement().is_restricted());
    }

    #[test]
    fn plan_names_parse_case_insensitively() {
        assert_eq!(Plan::from_name("Premium"), Some(Plan::Premium));
        assert_eq!(Plan::from_name(" free "), Some(Plan::Free));
        assert_eq!(Plan::from_name("gold"), None);
    }

    #[test]
    fn blank_user_id_means_signed_out() {
        let identity = LocalIdentity::new("  ", Plan::Premium);
        assert!(identity.current_user().is_none());
        assert_eq!(identity.entitlement(), Plan::Free.entitlement());
    }

    #[test]
    fn logout_clears_user() {
        let mut identity = LocalIdentity::new("ada", Plan::Premium);
        assert_eq!(identity.entitlement(), Entitlement::unlimited());
        identity.logout();
        assert!(identity.current_user().is_none());
    }
}
