mod channels;
mod loader;

pub use channels::{Channels, LoaderCommand, LoaderEvent};
pub use loader::Loader;
