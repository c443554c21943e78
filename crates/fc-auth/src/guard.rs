//! Route Guard
//!
//! Pure decision over a [`SessionState`] snapshot. Re-evaluate whenever the
//! session publishes a new state; the function holds no state of its own.

use fc_common::Role;
use serde::Serialize;

use crate::session::SessionState;

pub const LOGIN_PATH: &str = "/login";

/// What a route demands of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRequest {
    pub path: String,
    pub required_role: Option<Role>,
    pub require_active_company: bool,
}

impl RouteRequest {
    /// Route open to any signed-in identity.
    pub fn authenticated(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            required_role: None,
            require_active_company: false,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.required_role = Some(role);
        self
    }

    pub fn require_active_company(mut self) -> Self {
        self.require_active_company = true;
        self
    }
}

/// Redirect target, optionally remembering where the user was headed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Redirect {
    pub to: String,
    pub from: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
    Inactive,
    CompanyNotFound,
}

impl BlockReason {
    pub fn title(&self) -> &'static str {
        match self {
            BlockReason::Inactive => "Conta Inativa",
            BlockReason::CompanyNotFound => "Empresa não encontrada",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            BlockReason::Inactive => {
                "Sua empresa está inativa. Entre em contato com o suporte para reativar sua conta."
            }
            BlockReason::CompanyNotFound => {
                "Não encontramos uma empresa vinculada à sua conta. Entre em contato com o suporte."
            }
        }
    }

    /// Full text of the blocking screen, including the support contact.
    pub fn screen_text(&self, support_email: &str) -> String {
        format!("{}\n{}\nSuporte: {}", self.title(), self.message(), support_email)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Session not settled yet; show a loading indicator.
    Pending,
    Permitted,
    Denied(Redirect),
    Blocked(BlockReason),
}

impl Decision {
    pub fn is_permitted(&self) -> bool {
        matches!(self, Decision::Permitted)
    }
}

/// Landing page of each role.
pub fn role_home_path(role: Role) -> &'static str {
    match role {
        Role::SuperAdmin => "/superadmin/dashboard",
        Role::CompanyAdmin => "/admin/dashboard",
    }
}

/// Decide whether the session may see the requested route.
pub fn evaluate(state: &SessionState, request: &RouteRequest) -> Decision {
    if !state.initialized || state.loading {
        return Decision::Pending;
    }

    let profile = match (&state.identity, &state.profile) {
        (Some(_), Some(profile)) => profile,
        _ => {
            return Decision::Denied(Redirect {
                to: LOGIN_PATH.to_string(),
                from: Some(request.path.clone()),
            })
        }
    };

    if let Some(required) = request.required_role {
        if required != profile.role {
            return Decision::Denied(Redirect {
                to: role_home_path(profile.role).to_string(),
                from: None,
            });
        }
    }

    match profile.role {
        Role::SuperAdmin => Decision::Permitted,
        Role::CompanyAdmin => match &state.company {
            None => Decision::Blocked(BlockReason::CompanyNotFound),
            Some(company) if request.require_active_company && !company.active => {
                Decision::Blocked(BlockReason::Inactive)
            }
            Some(_) => Decision::Permitted,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use fc_common::{Company, Identity, Profile};

    fn company(active: bool) -> Company {
        Company {
            id: "c-1".to_string(),
            owning_identity_id: "u-2".to_string(),
            name: "Café Aroma".to_string(),
            email: "cafe@aroma.com".to_string(),
            whatsapp: "11912345678".to_string(),
            address: None,
            plan_id: None,
            active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn super_admin() -> SessionState {
        SessionState::signed_in(
            Identity::new("u-1", "root@fidelicard.com.br"),
            Profile::new("u-1", Role::SuperAdmin),
            None,
        )
    }

    fn company_admin(company: Option<Company>) -> SessionState {
        SessionState::signed_in(
            Identity::new("u-2", "cafe@aroma.com"),
            Profile::new("u-2", Role::CompanyAdmin),
            company,
        )
    }

    fn admin_route() -> RouteRequest {
        RouteRequest::authenticated("/admin/cartoes")
            .with_role(Role::CompanyAdmin)
            .require_active_company()
    }

    #[test]
    fn test_pending_until_settled() {
        let request = RouteRequest::authenticated("/superadmin/empresas");
        assert_eq!(evaluate(&SessionState::default(), &request), Decision::Pending);

        let mut state = super_admin();
        state.loading = true;
        assert_eq!(evaluate(&state, &request), Decision::Pending);
    }

    #[test]
    fn test_anonymous_is_sent_to_login() {
        let request = RouteRequest::authenticated("/superadmin/empresas").with_role(Role::SuperAdmin);
        assert_eq!(
            evaluate(&SessionState::signed_out(), &request),
            Decision::Denied(Redirect {
                to: "/login".to_string(),
                from: Some("/superadmin/empresas".to_string()),
            })
        );
    }

    #[test]
    fn test_identity_without_profile_is_sent_to_login() {
        let mut state = SessionState::signed_out();
        state.identity = Some(Identity {
            id: "u-9".to_string(),
            email: None,
        });
        let decision = evaluate(&state, &RouteRequest::authenticated("/admin/dashboard"));
        assert!(matches!(decision, Decision::Denied(Redirect { ref to, .. }) if to == "/login"));
    }

    #[test]
    fn test_wrong_role_goes_home() {
        assert_eq!(
            evaluate(&super_admin(), &admin_route()),
            Decision::Denied(Redirect {
                to: "/superadmin/dashboard".to_string(),
                from: None,
            })
        );

        let request = RouteRequest::authenticated("/superadmin/planos").with_role(Role::SuperAdmin);
        assert_eq!(
            evaluate(&company_admin(Some(company(true))), &request),
            Decision::Denied(Redirect {
                to: "/admin/dashboard".to_string(),
                from: None,
            })
        );
    }

    #[test]
    fn test_inactive_company_is_blocked() {
        let state = company_admin(Some(company(false)));
        assert_eq!(evaluate(&state, &admin_route()), Decision::Blocked(BlockReason::Inactive));

        let lenient = RouteRequest::authenticated("/admin/perfil").with_role(Role::CompanyAdmin);
        assert_eq!(evaluate(&state, &lenient), Decision::Permitted);
    }

    #[test]
    fn test_company_admin_without_company_is_never_permitted() {
        let state = company_admin(None);
        for request in [
            admin_route(),
            RouteRequest::authenticated("/admin/perfil").with_role(Role::CompanyAdmin),
            RouteRequest::authenticated("/"),
        ] {
            assert_eq!(
                evaluate(&state, &request),
                Decision::Blocked(BlockReason::CompanyNotFound)
            );
        }
    }

    #[test]
    fn test_permitted() {
        assert!(evaluate(&company_admin(Some(company(true))), &admin_route()).is_permitted());
        assert!(evaluate(
            &super_admin(),
            &RouteRequest::authenticated("/superadmin/dashboard").with_role(Role::SuperAdmin)
        )
        .is_permitted());
    }

    #[test]
    fn test_block_screen_mentions_support() {
        let text = BlockReason::Inactive.screen_text("suporte@fidelicard.com.br");
        assert!(text.starts_with("Conta Inativa"));
        assert!(text.contains("suporte@fidelicard.com.br"));
    }
}
