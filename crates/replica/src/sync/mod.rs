mod buffer;
mod cadence;
mod interpolate;
mod receiver;
mod reconstructor;
mod sender;

pub use buffer::{ChannelBuffer, Sample, SharedChannelBuffer};
pub use cadence::SendCadence;
pub use interpolate::{Interpolate, render_value};
pub use receiver::{Delivery, Receiver, ReceiverStats};
pub use reconstructor::{Reconstructor, RenderedTransform, render_timestamp};
pub use sender::{ChannelValues, Sender};
