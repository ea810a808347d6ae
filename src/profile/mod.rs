//! Profile media for the Lif Auth Server.
//!
//! Avatars and banners are stored as PNG files named after the account:
//! ```text
//! {base_path}/
//! ├── pfp/
//! │   └── alice.png
//! └── banner/
//!     └── alice.png
//! ```
//! Images are stored as uploaded; nothing here decodes or resizes them.

mod storage;

pub use storage::{sanitize_username, ImageKind, ImageStore};
