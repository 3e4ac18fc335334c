mod account;
mod init;
mod serve;
mod wait_for_db;

pub use account::{cmd_create_superuser, cmd_set_active};
pub use init::cmd_init;
pub use serve::cmd_serve;
pub use wait_for_db::cmd_wait_for_db;
