//! Ordered, short-circuiting authorization pipelines
//!
//! A [`Pipeline`] is a list of [`Step`]s run strictly in order. Each step
//! receives the [`RequestContext`] built by the steps before it and either
//! passes an enriched context on or aborts the request. The first abort wins
//! and no later step runs.

use std::fmt;

use super::duplicates::{check_no_duplicate, DuplicateCheck};
use super::gate::{require_all, AuthorizationRequirement};
use super::{AuthError, AuthService, Role, SignupCandidate, User};
use crate::error::{Error, Result};

/// Request-scoped state accumulated by pipeline steps
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Raw session token presented by the client
    pub session: Option<String>,
    pub user: Option<User>,
    pub role: Option<Role>,
    pub candidate: Option<SignupCandidate>,
}

impl RequestContext {
    pub fn with_session(session: Option<String>) -> Self {
        Self {
            session,
            ..Self::default()
        }
    }

    pub fn for_signup(candidate: SignupCandidate) -> Self {
        Self {
            candidate: Some(candidate),
            ..Self::default()
        }
    }

    /// Name of the resolved user, for logging
    pub fn username(&self) -> &str {
        self.user
            .as_ref()
            .map(|u| u.username.as_str())
            .unwrap_or("anonymous")
    }
}

/// One check in a pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Session token → user and role
    ResolveIdentity,
    /// Gate the resolved role; every requirement must allow
    Require(Vec<AuthorizationRequirement>),
    /// Reject signups whose username or email is taken
    CheckDuplicates,
    /// Resolve the requested signup role against the allow-list
    ValidateSignupRole,
}

pub enum StepOutcome {
    Continue(RequestContext),
    Abort(Error),
}

impl From<Result<RequestContext>> for StepOutcome {
    fn from(result: Result<RequestContext>) -> Self {
        match result {
            Ok(ctx) => StepOutcome::Continue(ctx),
            Err(err) => StepOutcome::Abort(err),
        }
    }
}

impl Step {
    /// A gate with a single requirement
    pub fn require(requirement: AuthorizationRequirement) -> Self {
        Step::Require(vec![requirement])
    }

    pub async fn apply(&self, auth: &AuthService, ctx: RequestContext) -> StepOutcome {
        let result = match self {
            Step::ResolveIdentity => resolve_identity(auth, ctx).await,
            Step::Require(requirements) => require_role(requirements, ctx),
            Step::CheckDuplicates => check_duplicates(auth, ctx).await,
            Step::ValidateSignupRole => validate_signup_role(auth, ctx).await,
        };
        result.into()
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::ResolveIdentity => write!(f, "resolve-identity"),
            Step::Require(requirements) => {
                let conditions: Vec<String> = requirements.iter().map(|r| r.to_string()).collect();
                write!(f, "require({})", conditions.join(" and "))
            }
            Step::CheckDuplicates => write!(f, "check-duplicates"),
            Step::ValidateSignupRole => write!(f, "validate-signup-role"),
        }
    }
}

async fn resolve_identity(auth: &AuthService, mut ctx: RequestContext) -> Result<RequestContext> {
    let token = ctx.session.as_deref().ok_or(AuthError::MissingSession)?;
    let (user, role) = auth.resolver().resolve(token).await?;
    ctx.user = Some(user);
    ctx.role = Some(role);
    Ok(ctx)
}

fn require_role(
    requirements: &[AuthorizationRequirement],
    ctx: RequestContext,
) -> Result<RequestContext> {
    // A requirement without a resolved identity cannot be satisfied
    let role = ctx.role.as_ref().ok_or(AuthError::MissingSession)?;

    if let Err(denied) = require_all(requirements, role) {
        if let AuthError::Forbidden(reason) = &denied {
            tracing::warn!(
                user = %ctx.username(),
                role = %role,
                reason = %reason,
                "Authorization denied"
            );
        }
        return Err(denied.into());
    }

    Ok(ctx)
}

async fn check_duplicates(auth: &AuthService, ctx: RequestContext) -> Result<RequestContext> {
    let candidate = signup_candidate(&ctx)?;

    if let DuplicateCheck::Conflict(field) = check_no_duplicate(auth.store(), candidate).await? {
        tracing::info!(
            username = %candidate.username,
            field = %field,
            "Signup rejected: duplicate identity"
        );
        return Err(AuthError::Conflict(field).into());
    }

    Ok(ctx)
}

async fn validate_signup_role(auth: &AuthService, mut ctx: RequestContext) -> Result<RequestContext> {
    let role = auth
        .policy()
        .validate(auth.store(), &signup_candidate(&ctx)?.role)
        .await?;
    ctx.role = Some(role);
    Ok(ctx)
}

fn signup_candidate(ctx: &RequestContext) -> Result<&SignupCandidate> {
    ctx.candidate
        .as_ref()
        .ok_or_else(|| Error::Validation("signup details are missing".to_string()))
}

/// A named, ordered list of steps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    name: &'static str,
    steps: Vec<Step>,
}

impl Pipeline {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            steps: Vec::new(),
        }
    }

    /// Append a step
    pub fn then(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Resolve the session, then gate the role
    pub fn write(requirement: AuthorizationRequirement) -> Self {
        Self::new("write")
            .then(Step::ResolveIdentity)
            .then(Step::require(requirement))
    }

    /// Duplicate check, then signup role validation
    pub fn signup() -> Self {
        Self::new("signup")
            .then(Step::CheckDuplicates)
            .then(Step::ValidateSignupRole)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Run every step in order, stopping at the first abort
    pub async fn run(&self, auth: &AuthService, ctx: RequestContext) -> Result<RequestContext> {
        let mut ctx = ctx;

        for step in &self.steps {
            match step.apply(auth, ctx).await {
                StepOutcome::Continue(next) => ctx = next,
                StepOutcome::Abort(err) => {
                    tracing::debug!(
                        pipeline = self.name,
                        step = %step,
                        error = %err,
                        "Pipeline aborted"
                    );
                    return Err(err);
                }
            }
        }

        Ok(ctx)
    }
}
