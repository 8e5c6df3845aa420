//! Host-side bridge for an embedded content frame.
//!
//! Publishes the synthesized guest document as a navigable address, routes
//! guest window messages to host callbacks, relays refreshed tokens into the
//! guest and derives the container's height and ready state.

pub mod config;
pub mod error;
pub mod frame;
pub mod layout;
pub mod message;
pub mod publisher;
pub mod relay;
pub mod router;

pub use config::BridgeConfig;
pub use error::{BridgeError, BridgeResult};
pub use frame::{FrameCore, FrameHandle, FrameProps, FrameSnapshot, HostCallbacks, MessageListener};
pub use layout::{LayoutChange, LayoutController, LayoutPolicy, Readiness, ReadyCause};
pub use message::{GuestEvent, HostMessage, RawMessage};
pub use publisher::{Address, AddressBackend, BlobStore, DataUrlBackend, Publisher};
pub use relay::{push_token, ChannelWindow, GuestWindow};
pub use router::{IgnoreReason, OriginPolicy, Routed, RoutedEvent, Router};

pub use h5pframe_doc::{Mode, Settings};
