pub(crate) mod auth;
pub(crate) mod proxy;
pub(crate) mod router;
