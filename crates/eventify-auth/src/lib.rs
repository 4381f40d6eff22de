//! Session client for the Eventify backend.
//!
//! This crate provides:
//! - An HTTP transport that carries the session cookie on every request
//! - A response interceptor that refreshes the session once on HTTP 401 and
//!   replays the original request
//! - A single-flight refresh coordinator shared by all concurrent callers
//! - The auth session store (current identity, loading and refresh flags)
//! - The route guard used by the role-restricted dashboards
//! - Account operations (sign-in with OTP, sign-up, password reset, profile)

mod account;
mod client;
mod dashboards;
pub mod endpoints;
mod error;
mod fsm;
mod guard;
mod identity;
mod navigation;
mod profile;
mod refresh;
mod request;
mod session;
mod store;
mod transport;

#[cfg(test)]
mod test_support;

pub use account::{NewAccount, SignUp};
pub use client::ApiClient;
pub use dashboards::{
    DashboardPage, OrganizerDashboard, Pagination, ParticipantDashboard, SuperAdminDashboard,
};
pub use error::{ApiError, ApiResult, RefreshError};
pub use fsm::{
    guard_machine, request_machine, GuardMachine, GuardMachineInput, GuardMachineState,
    RequestMachine, RequestMachineInput, RequestMachineState,
};
pub use guard::{GuardDecision, GuardOutcome, MountHandle, ProtectedPage, RouteGuard};
pub use identity::{Identity, Role};
pub use navigation::{routes, Navigation, Navigator, RecordingNavigator};
pub use profile::{AvatarUpload, ProfileChanges, ProfileUpdate};
pub use refresh::{RefreshCoordinator, RefreshStats};
pub use request::{ApiRequest, ApiResponse, Attempt, FormPart, FormValue, PendingRequest, RequestBody};
pub use session::SessionService;
pub use store::{AuthStateCallback, AuthStateChangedPayload, AuthStore, SessionSnapshot};
pub use transport::{ReqwestTransport, Transport};
