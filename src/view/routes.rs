//! Static route table

use std::fmt;

/// Every screen reachable by path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/`
    Landing,
    /// `/user`
    UserDashboard,
    /// `/user/form`
    ApplicationForm,
    /// `/user/detail/:applicationId`
    UserDetail(String),
    /// `/admin`
    AdminDashboard,
    /// `/admin/detail/:applicationId`
    AdminDetail(String),
}

impl Route {
    /// Match a path against the table. Query strings and trailing slashes are ignored.
    pub fn parse(path: &str) -> Option<Route> {
        let path = path.split(['?', '#']).next().unwrap_or("");
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Some(Route::Landing),
            ["user"] => Some(Route::UserDashboard),
            ["user", "form"] => Some(Route::ApplicationForm),
            ["user", "detail", id] => Some(Route::UserDetail(id.to_string())),
            ["admin"] => Some(Route::AdminDashboard),
            ["admin", "detail", id] => Some(Route::AdminDetail(id.to_string())),
            _ => None,
        }
    }

    /// Whether the screen is only meant for reviewers
    pub fn requires_admin(&self) -> bool {
        matches!(self, Route::AdminDashboard | Route::AdminDetail(_))
    }

    /// Where the back button leads
    pub fn parent(&self) -> Route {
        match self {
            Route::UserDetail(_) | Route::ApplicationForm => Route::UserDashboard,
            Route::AdminDetail(_) => Route::AdminDashboard,
            _ => Route::Landing,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Landing => f.write_str("/"),
            Route::UserDashboard => f.write_str("/user"),
            Route::ApplicationForm => f.write_str("/user/form"),
            Route::UserDetail(id) => write!(f, "/user/detail/{id}"),
            Route::AdminDashboard => f.write_str("/admin"),
            Route::AdminDetail(id) => write!(f, "/admin/detail/{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_parses_back_from_its_path() {
        let routes = [
            Route::Landing,
            Route::UserDashboard,
            Route::ApplicationForm,
            Route::UserDetail("A1".into()),
            Route::AdminDashboard,
            Route::AdminDetail("A1".into()),
        ];
        for route in routes {
            assert_eq!(Route::parse(&route.to_string()), Some(route));
        }
    }

    #[test]
    fn tolerant_of_trailing_slash_and_query() {
        assert_eq!(Route::parse("/admin/"), Some(Route::AdminDashboard));
        assert_eq!(Route::parse("/user?tab=1"), Some(Route::UserDashboard));
        assert_eq!(Route::parse(""), Some(Route::Landing));
    }

    #[test]
    fn unknown_paths_do_not_match() {
        assert_eq!(Route::parse("/admin/detail"), None);
        assert_eq!(Route::parse("/settings"), None);
        assert_eq!(Route::parse("/user/detail/a/b"), None);
    }

    #[test]
    fn admin_routes_and_parents() {
        assert!(Route::AdminDetail("x".into()).requires_admin());
        assert!(!Route::UserDashboard.requires_admin());
        assert_eq!(Route::AdminDetail("x".into()).parent(), Route::AdminDashboard);
        assert_eq!(Route::UserDetail("x".into()).parent(), Route::UserDashboard);
    }
}
