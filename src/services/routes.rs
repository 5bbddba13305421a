//! View routing and access guard

use std::fmt;
use std::str::FromStr;

use super::session::SessionState;

/// Every view of the dashboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Register,
    ForgotPassword,
    Dashboard,
    Courses,
    CourseNew,
    CourseEdit { course_id: i64 },
    Modules { course_id: i64 },
    Lessons { course_id: i64, module_id: i64 },
    Lesson { course_id: i64, module_id: i64, lesson_id: i64 },
    Students,
    NotFound,
}

/// Who may open a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Anyone
    Public,
    /// Only signed-out visitors; signed-in creators go to the dashboard
    PublicOnly,
    /// Only signed-in creators
    Protected,
}

/// Outcome of guarding a route
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// The session is still being restored
    Loading,
    Redirect(Route),
    Render,
}

impl Route {
    pub fn access(&self) -> Access {
        match self {
            Route::Home | Route::Login | Route::Register | Route::ForgotPassword => Access::PublicOnly,
            Route::NotFound => Access::Public,
            _ => Access::Protected,
        }
    }
}

/// Decide whether a route renders for the given session
pub fn guard(state: &SessionState, route: &Route) -> RouteDecision {
    if state.is_loading {
        return RouteDecision::Loading;
    }

    match (route.access(), state.is_authenticated) {
        (Access::Protected, false) => RouteDecision::Redirect(Route::Login),
        (Access::PublicOnly, true) => RouteDecision::Redirect(Route::Dashboard),
        _ => RouteDecision::Render,
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Home => write!(f, "/"),
            Route::Login => write!(f, "/login"),
            Route::Register => write!(f, "/register"),
            Route::ForgotPassword => write!(f, "/forgot-password"),
            Route::Dashboard => write!(f, "/dashboard"),
            Route::Courses => write!(f, "/dashboard/courses"),
            Route::CourseNew => write!(f, "/dashboard/courses/new"),
            Route::CourseEdit { course_id } => write!(f, "/dashboard/courses/{}/edit", course_id),
            Route::Modules { course_id } => write!(f, "/dashboard/courses/{}/modules", course_id),
            Route::Lessons { course_id, module_id } => {
                write!(f, "/dashboard/courses/{}/modules/{}/lessons", course_id, module_id)
            }
            Route::Lesson {
                course_id,
                module_id,
                lesson_id,
            } => write!(
                f,
                "/dashboard/courses/{}/modules/{}/lessons/{}",
                course_id, module_id, lesson_id
            ),
            Route::Students => write!(f, "/dashboard/students"),
            Route::NotFound => write!(f, "/404"),
        }
    }
}

impl FromStr for Route {
    type Err = std::convert::Infallible;

    /// Unknown paths parse as [`Route::NotFound`]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = s.trim_matches('/').split('/').filter(|p| !p.is_empty()).collect();
        let id = |i: usize| segments.get(i).and_then(|v| v.parse::<i64>().ok());

        let route = match segments.as_slice() {
            [] => Route::Home,
            ["login"] => Route::Login,
            ["register"] => Route::Register,
            ["forgot-password"] => Route::ForgotPassword,
            ["dashboard"] => Route::Dashboard,
            ["dashboard", "courses"] => Route::Courses,
            ["dashboard", "courses", "new"] => Route::CourseNew,
            ["dashboard", "students"] => Route::Students,
            ["dashboard", "courses", _, "edit"] => match id(2) {
                Some(course_id) => Route::CourseEdit { course_id },
                None => Route::NotFound,
            },
            ["dashboard", "courses", _, "modules"] => match id(2) {
                Some(course_id) => Route::Modules { course_id },
                None => Route::NotFound,
            },
            ["dashboard", "courses", _, "modules", _, "lessons"] => match (id(2), id(4)) {
                (Some(course_id), Some(module_id)) => Route::Lessons { course_id, module_id },
                _ => Route::NotFound,
            },
            ["dashboard", "courses", _, "modules", _, "lessons", _] => match (id(2), id(4), id(6)) {
                (Some(course_id), Some(module_id), Some(lesson_id)) => Route::Lesson {
                    course_id,
                    module_id,
                    lesson_id,
                },
                _ => Route::NotFound,
            },
            _ => Route::NotFound,
        };

        Ok(route)
    }
}
