//! Audio transport backends for hitline.

mod click;
mod cpal_transport;
mod error;

pub use click::{render_click_track, CLICK_SECONDS};
pub use cpal_transport::CpalTransport;
pub use error::AudioError;
