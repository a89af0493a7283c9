mod app;
mod background;
mod bar;
mod channel;
mod cli;

pub use app::App;
pub use background::Background;
pub use bar::Bar;
pub use channel::LocalChannel;
pub use cli::{Cli, Command, EndpointArgs, EndpointCommand};
