//! setup_nasm – pinned NASM releases for CI jobs
//! =============================================
//!
//! Makes a specific [NASM](https://www.nasm.us) release available on the
//! running machine, either by downloading the vendor's prebuilt archive or
//! by downloading the source archive and compiling it, then verifies the
//! executable runs and appends its directory to the process `PATH`.
//!
//! ## Workflow
//!
//! ```text
//! NasmSetup::run()
//!       │
//!       ├─→ Platform::resolve      (host OS → vendor tag, or override)
//!       ├─→ strategy::plan         (fixed-order attempt list; macOS
//!       │                           pre-2.14 releases drop the binary)
//!       ├─→ prebuilt binary        (zip → <destination>/nasm)
//!       ├─→ source build           (zip → configure → patch → make nasm)
//!       ├─→ sanity check           (`nasm -v`, fatal on failure)
//!       └─→ publish                (append <destination> to PATH)
//! ```
//!
//! Per-strategy errors are warnings; the run only fails once every enabled
//! strategy has been exhausted.
//!
//! ```rust,no_run
//! use setup_nasm::NasmSetup;
//!
//! fn main() -> setup_nasm::SetupNasmResult<()> {
//!     let outcome = NasmSetup::new("2.15.05").run()?;
//!     println!("{outcome}");
//!     Ok(())
//! }
//! ```
//!
//! The companion `setup-nasm` binary exposes the same workflow on the
//! command line, reading GitHub-Actions-style `INPUT_*` variables.

#[allow(unused_imports)]
use tracing::{debug, error, info, span, trace, warn, Level};

pub mod error;
pub mod platform;
pub mod setup;

mod exec;
mod fetch;
mod strategy;

pub use error::{SetupNasmError, SetupNasmResult};
pub use platform::Platform;
pub use setup::{publish_search_path, NasmSetup, SetupOutcome, DEFAULT_DESTINATION, NASM_RELEASES_URL};
pub use strategy::AcquireMethod;
