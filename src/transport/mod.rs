//! OSC transport to the cube controller.

mod channel;
mod osc;
mod wire;

pub use channel::{
    MemoryChannel, MessageChannel, OSC_UDP_SCHEME, TransmitError, UdpChannel, parse_endpoint,
};
pub use osc::{OscArg, OscError, OscMessage};
pub use wire::{
    BRIGHT_ADDRESS, DEFAULT_INTER_MESSAGE_DELAY, FILL_ADDRESS, FRAGMENT_HEIGHT, FRAGMENT_PAYLOAD,
    FRAGMENTS_PER_FRAME, Fragment, RASTER_WIDTH, SCREEN_ADDRESS, brightness_message, fill_message,
    fragment, send_frame,
};
