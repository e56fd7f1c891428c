//! Application state and input handling.
//!
//! The `App` struct owns the conversation core and its collaborators; the
//! submodules are implementation blocks split by responsibility, plus the
//! state types themselves.

/// `chat` module: query submission and agent event consumption.
mod chat;
/// `credentials` module: the credentials form flow.
mod credentials;
/// `init` module: construction of the `App` state.
mod init;
/// `keyboard` module: all keyboard input routing.
mod keyboard;
/// `models` module: model directory refresh and the picker flow.
mod models;
/// `mouse` module: mouse input (thread scrolling).
mod mouse;
/// `state` module: the `App` struct and the overlay/composer state types.
mod state;
/// `tick` module: periodic draining of background event channels.
mod tick;

pub use state::{
    App, CredentialField, CredentialsFormState, FocusArea, InputComposer, ModelPickerState,
    OverlayState,
};
