//! Service layer for the member core.
//! - Business rules live here; persistence sits behind repository ports.
//! - SeaORM adapters for the ports are under each module's `repo`.
//! - Every failure resolves to one [`errors::MemberError`] and one [`error_catalog::ErrorKind`].

pub mod error_catalog;
pub mod errors;
pub mod login_log;
pub mod member;
pub mod pagination;
pub mod runtime;
#[cfg(test)]
pub mod test_support;

pub use error_catalog::{ErrorCatalog, ErrorDescriptor, ErrorKind};
pub use errors::{MemberError, RepositoryError};
pub use login_log::LoginLogService;
pub use member::MemberService;
pub use pagination::{PageRequest, Pagination};
pub use runtime::Deadline;
