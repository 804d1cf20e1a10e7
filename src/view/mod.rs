//! Screens of the Claimd front end, expressed as plain data
//!
//! [`Route`] is the static route table and [`Dashboard`] drives the
//! applicant and reviewer screens for one view lifetime.

mod dashboard;
mod routes;

pub use dashboard::{
    AdminDashboardView, ApplicationRow, Dashboard, DashboardView, DetailView, ReviewNotice,
};
pub use routes::Route;
