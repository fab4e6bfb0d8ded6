pub mod app;
pub mod contactor;
pub mod department;
pub mod group;
pub mod org_perm;
pub mod quota;
