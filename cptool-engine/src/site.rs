use crate::gate::Marker;
use crate::service::{Document, Form, Url};
use crate::Result;

/// Site-specific knowledge the session needs to authenticate.
pub trait Site: Send + Sync {
    fn home_url(&self) -> Url;

    fn login_url(&self) -> Url;

    /// Message the site shows instead of the requested content.
    fn notification(&self) -> &Marker;

    /// Present only for an authenticated session; its text is the handle.
    fn identity(&self) -> &Marker;

    /// Present only for an anonymous session.
    fn anonymous(&self) -> &Marker;

    /// The credential form on the login page.
    fn login_form_marker(&self) -> &Marker;

    /// Shown by the login page when the credentials were rejected.
    fn login_rejected(&self) -> &Marker;

    fn login_form(&self, login_page: &Document, user: &str, pass: &str) -> Result<Form>;

    fn logout_url(&self, page: &Document) -> Result<Url>;
}
