//! Route guard for role-restricted pages.
//!
//! A page is only loaded once the guard has settled on `Authorized`. Without
//! a session, or with the wrong role, the user is sent back to the landing
//! page before anything protected is fetched.

use crate::client::ApiClient;
use crate::error::{ApiError, ApiResult};
use crate::fsm::{GuardMachine, GuardMachineInput, GuardMachineState};
use crate::identity::{Identity, Role};
use crate::navigation::{routes, Navigator};
use crate::session::SessionService;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// A page that needs a signed-in user with a specific role.
#[async_trait]
pub trait ProtectedPage: Send + Sync {
    type Data: Send;

    fn required_role(&self) -> Role;

    /// Fetch what the page shows. Only called for an authorized user.
    async fn load(&self, client: &ApiClient, identity: &Identity) -> ApiResult<Self::Data>;
}

/// Result of a guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Authorized(Identity),
    Redirected(&'static str),
}

/// Result of mounting a protected page.
#[derive(Debug)]
pub enum GuardOutcome<T> {
    Rendered { identity: Identity, data: T },
    Redirected { to: &'static str },
    /// The page went away before its data arrived; the data was dropped.
    Unmounted,
}

/// Liveness token for a mounted page.
#[derive(Debug, Clone)]
pub struct MountHandle {
    mounted: Arc<AtomicBool>,
}

impl Default for MountHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl MountHandle {
    pub fn new() -> Self {
        Self {
            mounted: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    /// Pass `value` through while the page is mounted; drop it otherwise.
    pub fn apply<T>(&self, value: T) -> Option<T> {
        if self.is_mounted() {
            Some(value)
        } else {
            None
        }
    }
}

pub struct RouteGuard {
    session: Arc<SessionService>,
    required_role: Role,
    machine: GuardMachine,
}

impl RouteGuard {
    pub fn new(session: Arc<SessionService>, required_role: Role) -> Self {
        Self {
            session,
            required_role,
            machine: GuardMachine::new(),
        }
    }

    pub fn for_page<P: ProtectedPage>(session: Arc<SessionService>, page: &P) -> Self {
        Self::new(session, page.required_role())
    }

    pub fn state(&self) -> &GuardMachineState {
        self.machine.state()
    }

    pub fn is_initialized(&self) -> bool {
        matches!(
            self.machine.state(),
            GuardMachineState::Authorized | GuardMachineState::Unauthorized
        )
    }

    fn transition(&mut self, input: GuardMachineInput) -> ApiResult<()> {
        let from = self.machine.state().clone();
        self.machine.consume(&input).map_err(|_| {
            ApiError::InvalidStateTransition(format!(
                "Cannot apply {:?} to route guard in state {:?}",
                input, from
            ))
        })?;
        debug!(
            old_state = ?from,
            new_state = ?self.machine.state(),
            required_role = %self.required_role,
            "Route guard transition"
        );
        Ok(())
    }

    /// Decide whether the current session may see the page.
    ///
    /// Fetches the identity first when the session is empty. Redirects use
    /// `replace` so the back button does not lead to the refused page.
    pub async fn check(&mut self, navigator: &dyn Navigator) -> ApiResult<GuardDecision> {
        let input = match self.machine.state() {
            GuardMachineState::NotInitialized => GuardMachineInput::Mount,
            _ => GuardMachineInput::Remount,
        };
        self.transition(input)?;

        let user = match self.session.current_user() {
            Some(user) => Some(user),
            None => self.session.fetch_identity().await,
        };

        match user {
            Some(identity) if identity.has_role(self.required_role) => {
                self.transition(GuardMachineInput::Grant)?;
                Ok(GuardDecision::Authorized(identity))
            }
            Some(identity) => {
                info!(
                    user_id = %identity.id,
                    role = %identity.role,
                    required_role = %self.required_role,
                    "Role not allowed on this page, redirecting"
                );
                self.transition(GuardMachineInput::Deny)?;
                navigator.replace(routes::LANDING);
                Ok(GuardDecision::Redirected(routes::LANDING))
            }
            None => {
                info!(required_role = %self.required_role, "No session, redirecting");
                self.transition(GuardMachineInput::Deny)?;
                navigator.replace(routes::LANDING);
                Ok(GuardDecision::Redirected(routes::LANDING))
            }
        }
    }

    /// Run the guard, then load the page if allowed.
    pub async fn mount<P: ProtectedPage>(
        &mut self,
        page: &P,
        navigator: &dyn Navigator,
        handle: &MountHandle,
    ) -> ApiResult<GuardOutcome<P::Data>> {
        let identity = match self.check(navigator).await? {
            GuardDecision::Authorized(identity) => identity,
            GuardDecision::Redirected(to) => return Ok(GuardOutcome::Redirected { to }),
        };
        if !handle.is_mounted() {
            return Ok(GuardOutcome::Unmounted);
        }

        let data = page.load(self.session.client(), &identity).await?;
        Ok(match handle.apply(data) {
            Some(data) => GuardOutcome::Rendered { identity, data },
            None => {
                debug!("Discarding page data that arrived after unmount");
                GuardOutcome::Unmounted
            }
        })
    }
}
