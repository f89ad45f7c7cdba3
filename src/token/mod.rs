pub(crate) mod broker;
pub(crate) mod clock;
pub(crate) mod store;
