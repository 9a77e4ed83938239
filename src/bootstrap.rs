//! Page admission: decides whether a page may render for the signed-in user.
//!
//! Every page family runs the same gate on entry: no stored session goes to the login
//! surface, a session for the wrong role goes to that role's landing page, and a dead
//! session is cleared before redirecting. Redirect targets are compared against the current
//! location first, so a browser already sitting on the right surface stays put instead of
//! entering a redirect loop.

// self
use crate::{
	_prelude::*,
	gateway::Gateway,
	http::SessionHttpClient,
	session::{Role, UserProfile},
};

/// Why an [`Admission::Redirect`] was issued.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RedirectReason {
	/// No session is stored locally.
	NoSession,
	/// The stored session failed verification and was cleared.
	SessionExpired,
	/// The session is valid but belongs to a different role.
	RoleMismatch,
}

/// Admission verdict for one page-entry check.
#[derive(Clone, Debug, PartialEq)]
pub enum Admission {
	/// The page may render for this user.
	Admitted {
		/// Verified profile, fresh from the issuer.
		user: UserProfile,
	},
	/// Navigate to `target` before rendering anything.
	Redirect {
		/// Absolute URL of the surface the browser belongs on.
		target: Url,
		/// Why the redirect was issued.
		reason: RedirectReason,
	},
	/// The browser is already on the surface a redirect would target; render in place.
	Stay,
}

/// Role requirement and navigation targets for one page family.
#[derive(Clone, Debug)]
pub struct PagePolicy {
	/// Role this page family requires.
	pub required_role: Role,
	/// Login surface unauthenticated users are sent to.
	pub login_surface: Url,
	landings: HashMap<Role, Url>,
}
impl PagePolicy {
	/// Creates a policy with no per-role landing pages configured.
	pub fn new(required_role: Role, login_surface: Url) -> Self {
		Self { required_role, login_surface, landings: HashMap::new() }
	}

	/// Registers the landing page users of `role` are redirected to on a role mismatch.
	pub fn landing_page(mut self, role: Role, target: Url) -> Self {
		self.landings.insert(role, target);

		self
	}

	/// Landing page for a role, falling back to the login surface when none is configured.
	/// The session is kept either way; the user is signed in, just in the wrong place.
	fn landing_for(&self, role: Role) -> &Url {
		self.landings.get(&role).unwrap_or(&self.login_surface)
	}
}

/// Runs the page-entry gate against a gateway's stored session.
#[derive(Debug)]
pub struct Bootstrapper<'g, C>
where
	C: ?Sized + SessionHttpClient,
{
	gateway: &'g Gateway<C>,
	policy: PagePolicy,
}
impl<'g, C> Bootstrapper<'g, C>
where
	C: ?Sized + SessionHttpClient,
{
	/// Creates a bootstrapper for one page family.
	pub fn new(gateway: &'g Gateway<C>, policy: PagePolicy) -> Self {
		Self { gateway, policy }
	}

	/// Decides whether the page at `current_location` may render.
	///
	/// Verification rides the gateway, so an expired access token is refreshed before the
	/// session is judged dead. Transport and storage failures propagate without a verdict;
	/// an unreachable backend is not evidence the session expired.
	pub async fn admit(&self, current_location: &Url) -> Result<Admission> {
		if self.gateway.read_session().await?.is_none() {
			return Ok(self.to_login(current_location, RedirectReason::NoSession));
		}

		match self.gateway.verify().await {
			Ok(user) if user.role == self.policy.required_role => Ok(Admission::Admitted { user }),
			Ok(user) => {
				let target = self.policy.landing_for(user.role);

				if same_surface(current_location, target) {
					Ok(Admission::Stay)
				} else {
					Ok(Admission::Redirect {
						target: target.clone(),
						reason: RedirectReason::RoleMismatch,
					})
				}
			},
			Err(e) if e.requires_login() => {
				// The gateway clears on terminal failures already; this covers AuthRequired
				// races and is idempotent.
				self.gateway.store.clear().await?;

				Ok(self.to_login(current_location, RedirectReason::SessionExpired))
			},
			Err(e) => Err(e),
		}
	}

	fn to_login(&self, current_location: &Url, reason: RedirectReason) -> Admission {
		if same_surface(current_location, &self.policy.login_surface) {
			Admission::Stay
		} else {
			Admission::Redirect { target: self.policy.login_surface.clone(), reason }
		}
	}
}

/// Compares origin and path only; query and fragment never distinguish surfaces.
fn same_surface(a: &Url, b: &Url) -> bool {
	a.origin() == b.origin() && a.path() == b.path()
}
