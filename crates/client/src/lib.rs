//! Client side of the helpdesk: HTTP access to the REST API, an owned ticket
//! cache, and the view models built on top of it.

pub mod api;
pub mod config;
pub mod store;
pub mod testing;
pub mod views;

pub use api::{ClientError, HelpdeskApi, HttpHelpdeskApi};
pub use config::ClientConfig;
pub use store::ClientTicketStore;
pub use views::{
    DashboardView, FormError, FormMode, ListFilter, SortKey, SortOrder, TicketDetailView,
    TicketForm, TicketListView,
};
