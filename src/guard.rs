//! Navigation guard: pure decisions over route metadata and credential presence.

/// Who may enter a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
  /// Anyone.
  Public,
  /// Only authenticated sessions.
  RequiresAuth,
  /// Only anonymous sessions (login/signup entry points).
  EntryOnly,
}

/// A navigable destination.
#[derive(Debug, Clone)]
pub struct Route {
  pub name: &'static str,
  pub access: RouteAccess,
}

/// All known routes
pub const ROUTES: &[Route] = &[
  Route {
    name: "home",
    access: RouteAccess::Public,
  },
  Route {
    name: "login",
    access: RouteAccess::EntryOnly,
  },
  Route {
    name: "signup",
    access: RouteAccess::EntryOnly,
  },
  Route {
    name: "dashboard",
    access: RouteAccess::RequiresAuth,
  },
  Route {
    name: "invoice-new",
    access: RouteAccess::RequiresAuth,
  },
  Route {
    name: "invoice-detail",
    access: RouteAccess::RequiresAuth,
  },
  Route {
    name: "invoice-edit",
    access: RouteAccess::RequiresAuth,
  },
  Route {
    name: "profile-edit",
    access: RouteAccess::RequiresAuth,
  },
];

/// Outcome of a guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
  /// Proceed to the requested route.
  Allow,
  /// Authentication required but no credential is held.
  RedirectToLogin,
  /// Entry-only route requested while already authenticated.
  RedirectToDashboard,
}

/// Look up a route by name.
pub fn route(name: &str) -> Option<&'static Route> {
  ROUTES.iter().find(|r| r.name == name)
}

/// Decide whether navigation to `route` is allowed for the given credential
/// state. Reads nothing but its arguments and has no side effects.
pub fn check(route: &Route, authenticated: bool) -> GuardDecision {
  match route.access {
    RouteAccess::RequiresAuth if !authenticated => GuardDecision::RedirectToLogin,
    RouteAccess::EntryOnly if authenticated => GuardDecision::RedirectToDashboard,
    _ => GuardDecision::Allow,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_protected_route_redirects_anonymous_to_login() {
    let dashboard = route("dashboard").unwrap();
    assert_eq!(check(dashboard, false), GuardDecision::RedirectToLogin);
  }

  #[test]
  fn test_protected_route_allows_authenticated() {
    let dashboard = route("dashboard").unwrap();
    assert_eq!(check(dashboard, true), GuardDecision::Allow);
  }

  #[test]
  fn test_entry_route_redirects_authenticated_to_dashboard() {
    let login = route("login").unwrap();
    assert_eq!(check(login, true), GuardDecision::RedirectToDashboard);

    let signup = route("signup").unwrap();
    assert_eq!(check(signup, true), GuardDecision::RedirectToDashboard);
  }

  #[test]
  fn test_entry_route_allows_anonymous() {
    let login = route("login").unwrap();
    assert_eq!(check(login, false), GuardDecision::Allow);
  }

  #[test]
  fn test_public_route_always_allowed() {
    let home = route("home").unwrap();
    assert_eq!(check(home, false), GuardDecision::Allow);
    assert_eq!(check(home, true), GuardDecision::Allow);
  }

  #[test]
  fn test_unknown_route_lookup() {
    assert!(route("nonexistent").is_none());
  }
}
