//! The three role dashboards as protected pages.

use crate::client::ApiClient;
use crate::endpoints;
use crate::error::ApiResult;
use crate::guard::ProtectedPage;
use crate::identity::{Identity, Role};
use crate::request::ApiRequest;
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pagination {
    pub total_items: u64,
    pub total_pages: u64,
    pub current_page: u64,
    pub per_page: u64,
}

/// One page of a dashboard listing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DashboardPage {
    #[serde(rename = "data", default)]
    pub items: Vec<serde_json::Value>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

async fn load_listing(client: &ApiClient, path: &str, page: u32, search: &str) -> ApiResult<DashboardPage> {
    let request = ApiRequest::get(path)
        .query("page", page.to_string())
        .query("search", search);
    client.send(request).await?.json()
}

macro_rules! dashboard {
    ($(#[$meta:meta])* $name:ident, $role:expr, $path:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            pub page: u32,
            pub search: String,
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    page: 1,
                    search: String::new(),
                }
            }
        }

        #[async_trait]
        impl ProtectedPage for $name {
            type Data = DashboardPage;

            fn required_role(&self) -> Role {
                $role
            }

            async fn load(&self, client: &ApiClient, _identity: &Identity) -> ApiResult<DashboardPage> {
                load_listing(client, $path, self.page, &self.search).await
            }
        }
    };
}

dashboard!(
    /// Events the participant asked to join.
    ParticipantDashboard,
    Role::Participant,
    endpoints::PARTICIPANT_EVENTS
);
dashboard!(
    /// Events the organizer owns.
    OrganizerDashboard,
    Role::Organizer,
    endpoints::ORGANIZER_EVENTS
);
dashboard!(
    /// All users, for role management.
    SuperAdminDashboard,
    Role::SuperAdmin,
    endpoints::ALL_USERS
);
