//! Acquisition strategies and the fixed-order fallback plan.

mod binary;
mod source;

use serde::{Deserialize, Serialize};

pub(crate) use self::{binary::install_prebuilt, source::build_from_source};
use crate::platform::{self, Platform};

/// One complete way of obtaining the nasm executable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcquireMethod {
    /// Download the vendor's prebuilt release archive.
    Binary,
    /// Download the source archive and compile it.
    Source,
}

impl std::fmt::Display for AcquireMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AcquireMethod::Binary => write!(f, "prebuilt binary"),
            AcquireMethod::Source => write!(f, "source build"),
        }
    }
}

/// Build the attempt list for one run: binary before source, each only when
/// enabled.
///
/// The macOS gate is decided here, once, before anything is attempted:
/// releases before 2.14 shipped prebuilt macOS binaries the OS refuses to
/// execute, so the binary strategy is dropped entirely whenever a source
/// build is still on the table. With source builds disabled the binary is
/// kept, with a warning.
pub(crate) fn plan(
    platform: Platform,
    version: &str,
    try_binary: bool,
    try_source: bool,
) -> Vec<AcquireMethod> {
    let mut try_binary = try_binary;
    if try_binary && platform == Platform::Macosx && platform::prebuilt_broken_on_macos(version) {
        if try_source {
            crate::info!(
                "NASM {version} has incompatible prebuilt binaries on macOS; \
                 only the source build will be tried"
            );
            try_binary = false;
        } else {
            crate::warn!(
                "NASM {version} has incompatible prebuilt binaries on macOS; \
                 trying them anyway at your own risk"
            );
        }
    }

    let mut methods = Vec::new();
    if try_binary {
        methods.push(AcquireMethod::Binary);
    }
    if try_source {
        methods.push(AcquireMethod::Source);
    }
    methods
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_orders_and_filters() {
        struct Scenario {
            name: &'static str,
            platform: Platform,
            version: &'static str,
            try_binary: bool,
            try_source: bool,
            expected: &'static [AcquireMethod],
        }

        use AcquireMethod::{Binary, Source};
        let scenarios = [
            Scenario {
                name: "both enabled, binary first",
                platform: Platform::Linux,
                version: "2.15.05",
                try_binary: true,
                try_source: true,
                expected: &[Binary, Source],
            },
            Scenario {
                name: "from-source=true drops the binary",
                platform: Platform::Linux,
                version: "2.15.05",
                try_binary: false,
                try_source: true,
                expected: &[Source],
            },
            Scenario {
                name: "from-source=false drops the source build",
                platform: Platform::Macosx,
                version: "2.15.05",
                try_binary: true,
                try_source: false,
                expected: &[Binary],
            },
            Scenario {
                name: "everything disabled",
                platform: Platform::Linux,
                version: "2.15.05",
                try_binary: false,
                try_source: false,
                expected: &[],
            },
            Scenario {
                name: "old macOS release loses the binary pre-emptively",
                platform: Platform::Macosx,
                version: "2.13",
                try_binary: true,
                try_source: true,
                expected: &[Source],
            },
            Scenario {
                name: "old macOS release keeps binary when source is disabled",
                platform: Platform::Macosx,
                version: "2.13",
                try_binary: true,
                try_source: false,
                expected: &[Binary],
            },
            Scenario {
                name: "2.14 on macOS is not gated",
                platform: Platform::Macosx,
                version: "2.14.02",
                try_binary: true,
                try_source: true,
                expected: &[Binary, Source],
            },
            Scenario {
                name: "old release on linux is not gated",
                platform: Platform::Linux,
                version: "2.13",
                try_binary: true,
                try_source: true,
                expected: &[Binary, Source],
            },
        ];

        for s in scenarios {
            let methods = plan(s.platform, s.version, s.try_binary, s.try_source);
            assert_eq!(methods, s.expected, "{}", s.name);
        }
    }
}
