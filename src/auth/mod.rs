//! Authentication and authorization
//!
//! Requests are checked by [`Pipeline`]s: ordered lists of steps that resolve
//! the session to a user and role, gate that role against declarative
//! [`AuthorizationRequirement`]s, or vet a signup before the account is
//! written.

pub mod duplicates;
mod error;
pub mod gate;
pub mod middleware;
pub mod models;
mod password;
pub mod pipeline;
pub mod resolver;
pub mod service;
pub mod session;
pub mod signup;

pub use duplicates::{check_no_duplicate, DuplicateCheck, DuplicateField};
pub use error::AuthError;
pub use gate::{require, require_all, AuthorizationRequirement, Decision, DenyReason};
pub use middleware::{enforce, RouteGuard, SessionCookie};
pub use models::{Role, SigninRequest, SignupCandidate, SignupRequest, User, UserInfo};
pub use pipeline::{Pipeline, RequestContext, Step, StepOutcome};
pub use resolver::IdentityResolver;
pub use service::{AuthService, SignedIn};
pub use session::{Claims, SessionCodec};
pub use signup::SignupPolicy;
