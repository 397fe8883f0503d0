//! Remote storage access
//!
//! WebDAV client for the mirror target, the multistatus codec it uses to
//! read listings, and the error taxonomy shared by both.
//!
//! ## Protocol
//!
//! | Operation | Method     | Success | Notable failures     |
//! |-----------|------------|---------|----------------------|
//! | List      | `PROPFIND` | 207     | 401, 404             |
//! | Upload    | `PUT`      | 201     | anything else        |
//! | Delete    | `DELETE`   | 204     | 404 (already absent) |

pub mod client;
pub mod codec;
mod error;

pub use client::{DeleteOutcome, RemoteClientConfig, RemoteStorage, WebDavClient, DEFAULT_BASE_URL};
pub use error::{RemoteError, RemoteResult};
