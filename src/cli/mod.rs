mod add;
mod clear;
mod list;
pub mod server;
mod show;

pub use add::*;
pub use clear::*;
pub use list::*;
pub use server::*;
pub use show::*;

use crate::config::Opts;

pub trait SubCommandExtend {
    fn run(&self, opts: &Opts) -> impl std::future::Future<Output = anyhow::Result<()>> + Send;
}
