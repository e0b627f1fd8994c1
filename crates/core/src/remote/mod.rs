//! Remote source abstraction.

mod remote_model;
mod remote_traits;

pub use remote_model::{RemoteConnectionStatus, RemoteRow};
pub use remote_traits::RemoteTableReader;
