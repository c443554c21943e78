//! Portal route table, menus and role permissions

use fc_common::{Profile, Role};

use crate::guard::{evaluate, role_home_path, Decision, Redirect, RouteRequest, LOGIN_PATH};
use crate::session::SessionState;

pub const PUBLIC_HOME: &str = "/";
pub const PASSWORD_RECOVERY_PATH: &str = "/recuperar-senha";
pub const PASSWORD_CHANGE_PATH: &str = "/alterar-senha";

const AUTH_PATHS: &[&str] = &[LOGIN_PATH, PASSWORD_RECOVERY_PATH, PASSWORD_CHANGE_PATH];

const SUPER_ADMIN_PREFIX: &str = "/superadmin";
const COMPANY_ADMIN_PREFIX: &str = "/admin";

/// Where a path lands in the route table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Login and password screens.
    Auth,
    /// Public landing page.
    Public,
    /// Index path that forwards to another route.
    Redirect(&'static str),
    Guarded(RouteRequest),
    NotFound,
}

fn normalize(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    }
}

fn under(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.starts_with('/') && rest.len() > 1)
}

pub fn resolve_route(path: &str) -> Route {
    let path = normalize(path);

    if AUTH_PATHS.contains(&path) {
        return Route::Auth;
    }
    if path == PUBLIC_HOME || path.is_empty() {
        return Route::Public;
    }
    if path == SUPER_ADMIN_PREFIX {
        return Route::Redirect(role_home_path(Role::SuperAdmin));
    }
    if path == COMPANY_ADMIN_PREFIX {
        return Route::Redirect(role_home_path(Role::CompanyAdmin));
    }
    if under(path, SUPER_ADMIN_PREFIX) {
        return Route::Guarded(RouteRequest::authenticated(path).with_role(Role::SuperAdmin));
    }
    if under(path, COMPANY_ADMIN_PREFIX) {
        return Route::Guarded(
            RouteRequest::authenticated(path)
                .with_role(Role::CompanyAdmin)
                .require_active_company(),
        );
    }
    Route::NotFound
}

/// Guard request for a path, if the path is guarded at all.
pub fn route_request_for(path: &str) -> Option<RouteRequest> {
    match resolve_route(path) {
        Route::Guarded(request) => Some(request),
        _ => None,
    }
}

/// Decide what happens when the session navigates to `path`.
pub fn navigate(state: &SessionState, path: &str) -> Decision {
    match resolve_route(path) {
        Route::Public => Decision::Permitted,
        Route::Auth => match (&state.profile, normalize(path)) {
            // A settled, signed-in session has no business on the login form.
            (Some(profile), LOGIN_PATH)
                if state.initialized && !state.loading && state.identity.is_some() =>
            {
                Decision::Denied(Redirect {
                    to: role_home_path(profile.role).to_string(),
                    from: None,
                })
            }
            _ => Decision::Permitted,
        },
        Route::Redirect(to) => Decision::Denied(Redirect {
            to: to.to_string(),
            from: None,
        }),
        Route::Guarded(request) => evaluate(state, &request),
        Route::NotFound => Decision::Denied(Redirect {
            to: PUBLIC_HOME.to_string(),
            from: None,
        }),
    }
}

/// Where to go after a successful login, honouring the remembered path when
/// the role may open it.
pub fn post_login_target(profile: &Profile, from: Option<&str>) -> String {
    let home = role_home_path(profile.role).to_string();
    let Some(from) = from else {
        return home;
    };

    match route_request_for(from) {
        Some(request) if request.required_role.map_or(true, |r| r == profile.role) => {
            normalize(from).to_string()
        }
        _ => home,
    }
}

// ============================================================================
// Menus
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuItem {
    pub label: &'static str,
    pub href: &'static str,
}

const fn item(label: &'static str, href: &'static str) -> MenuItem {
    MenuItem { label, href }
}

const SUPER_ADMIN_MENU: &[MenuItem] = &[
    item("Dashboard", "/superadmin/dashboard"),
    item("Empresas", "/superadmin/empresas"),
    item("Planos", "/superadmin/planos"),
    item("Categorias", "/superadmin/categorias"),
    item("Localização", "/superadmin/localizacao"),
    item("Configurações", "/superadmin/configuracoes"),
];

const COMPANY_ADMIN_MENU: &[MenuItem] = &[
    item("Dashboard", "/admin/dashboard"),
    item("Perfil da Empresa", "/admin/perfil"),
    item("Cartões Fidelidade", "/admin/cartoes"),
    item("Clientes", "/admin/clientes"),
    item("Configurações", "/admin/configuracoes"),
];

pub fn menu_items(role: Role) -> &'static [MenuItem] {
    match role {
        Role::SuperAdmin => SUPER_ADMIN_MENU,
        Role::CompanyAdmin => COMPANY_ADMIN_MENU,
    }
}

/// Highlight rule for menu entries.
pub fn is_active_route(current: &str, href: &str) -> bool {
    current == href
        || current
            .strip_prefix(href)
            .is_some_and(|rest| rest.starts_with('/'))
}

// ============================================================================
// Permissions
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Permissions {
    pub is_super_admin: bool,
    pub is_company_admin: bool,
    pub is_active_company: bool,
}

impl Permissions {
    pub fn from_session(state: &SessionState) -> Self {
        let role = state.role();
        Self {
            is_super_admin: role == Some(Role::SuperAdmin),
            is_company_admin: role == Some(Role::CompanyAdmin),
            is_active_company: state.company.as_ref().is_some_and(|c| c.active),
        }
    }

    pub fn can_access_super_admin(&self) -> bool {
        self.is_super_admin
    }

    pub fn can_access_company_admin(&self) -> bool {
        self.is_company_admin && self.is_active_company
    }

    pub fn can_manage_system(&self) -> bool {
        self.is_super_admin
    }

    pub fn can_manage_own_company(&self) -> bool {
        self.is_company_admin && self.is_active_company
    }
}
