pub mod users;

pub use users::{PgUserRepository, UserRecord, UserRepository};
