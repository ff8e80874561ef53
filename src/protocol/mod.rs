// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The wire protocol: frame codec, auth handshake, value encoding, and typed
//! message payloads shared by the coordinator and worker sides.

pub mod auth;
pub mod codec;
pub mod handshake;
pub mod messages;
pub mod value;

pub use codec::{Command, FrameReader, FrameWriter, ProtocolError, RawFrame};
pub use handshake::{server_handshake, worker_handshake};
pub use value::Value;

/// Default TCP port, matching the original reference deployment.
pub const DEFAULT_PORT: u16 = 11235;

/// Both sides retry a dropped connect this often while still under budget.
pub const CONNECTION_WAIT_TIME: std::time::Duration = std::time::Duration::from_secs(1);
