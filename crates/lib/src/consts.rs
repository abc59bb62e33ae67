pub const APP_NAME: &str = "binforge";

/// The component this tool builds.
pub const COMPONENT: &str = "binutils";

/// Version built when no version argument is given.
pub const DEFAULT_VERSION: &str = "2.43";

pub const DEFAULT_SOURCE_URL: &str = "https://ftp.gnu.org/gnu/binutils";

pub const DEFAULT_TOOLCHAIN_URL: &str = "https://github.com/xpack-dev-tools/gcc-xpack/releases/download/v13.2.0-2";

/// The only PATH a sanitized environment starts from.
pub const SANITIZED_PATH: &str = "/usr/local/bin:/usr/bin:/bin:/sbin:/usr/sbin";

/// Exit codes at or above this value mean timeout or user interruption.
pub const INTERRUPT_EXIT_THRESHOLD: u8 = 124;

// Environment variable overrides, read once at startup.
pub const ENV_SOURCE_URL: &str = "BINFORGE_SOURCE_URL";
pub const ENV_TOOLCHAIN_URL: &str = "BINFORGE_TOOLCHAIN_URL";
pub const ENV_TOOLCHAIN_ARCHIVE: &str = "BINFORGE_TOOLCHAIN_ARCHIVE";
pub const ENV_JOBS: &str = "BINFORGE_JOBS";
